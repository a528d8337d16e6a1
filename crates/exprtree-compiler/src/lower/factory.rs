//! Factory call resolution and build-expression helpers.
//!
//! Factory calls are resolved the way the binder resolves any static call:
//! candidates are the overloads of the requested name on the factory type,
//! filtered by arity and argument assignability. An argument with no type
//! matches any parameter. When nothing matches, the member is recorded as
//! missing and a bad node stands in for the call so lowering can carry on
//! and report every missing member at once.

use exprtree_core::bound::*;
use exprtree_core::{
    ConstantValue, FactoryType, FieldId, MethodId, ParamId, Span, SpecialType, TypeId,
    WellKnownType,
};
use tracing::trace;

use super::ExpressionLowering;

impl ExpressionLowering<'_> {
    /// Id of a well-known type, or the error type when it is not declared.
    pub(super) fn known(&self, ty: WellKnownType) -> TypeId {
        self.symbols
            .well_known(ty)
            .unwrap_or_else(|| self.symbols.error_type())
    }

    /// `Factory.Name(args...)`.
    pub(super) fn factory(&mut self, factory: FactoryType, name: &str, args: Vec<BoundExpr>, span: Span) -> BoundExpr {
        self.factory_generic(factory, name, &[], args, span)
    }

    /// `Factory.Name<T...>(args...)`.
    ///
    /// The only generic factory is `Lambda<D>`, whose result is the
    /// expression-tree type of `D`.
    pub(super) fn factory_generic(
        &mut self,
        factory: FactoryType,
        name: &str,
        type_args: &[TypeId],
        args: Vec<BoundExpr>,
        span: Span,
    ) -> BoundExpr {
        let method = self
            .symbols
            .well_known(factory.well_known())
            .and_then(|owner| self.resolve(owner, name, type_args.len(), &args));

        let Some(method) = method else {
            trace!(factory = factory.name(), name, "no matching factory overload");
            self.record_missing(factory.name(), name);
            let error = self.symbols.error_type();
            return BoundExpr::bad(span, args, Some(error));
        };

        let ty = match type_args.first() {
            Some(delegate) => self.symbols.expression_tree_of(*delegate),
            None => self.symbols.method(method).return_type,
        };
        BoundExpr::generic_call(span, None, method, type_args.to_vec(), args, Some(ty))
    }

    fn resolve(&self, owner: TypeId, name: &str, generic_arity: usize, args: &[BoundExpr]) -> Option<MethodId> {
        let symbols = &*self.symbols;
        symbols.find_methods(owner, name).iter().copied().find(|&method| {
            let def = symbols.method(method);
            def.generic_arity as usize == generic_arity
                && def.params.len() == args.len()
                && def.params.iter().zip(args).all(|(param, arg)| match arg.ty {
                    Some(ty) => symbols.is_assignable(ty, symbols.param(*param).ty),
                    None => true,
                })
        })
    }

    // =========================================================================
    // Reflection constants
    // =========================================================================

    pub(super) fn type_of(&self, ty: TypeId, span: Span) -> BoundExpr {
        BoundExpr::type_of(span, ty, self.known(WellKnownType::Type))
    }

    pub(super) fn method_info(&self, method: MethodId, span: Span) -> BoundExpr {
        BoundExpr::method_info(span, method, self.known(WellKnownType::MethodInfo))
    }

    pub(super) fn ctor_info(&self, ctor: MethodId, span: Span) -> BoundExpr {
        BoundExpr::method_info(span, ctor, self.known(WellKnownType::ConstructorInfo))
    }

    pub(super) fn field_info(&self, field: FieldId, span: Span) -> BoundExpr {
        BoundExpr::field_info(span, field, self.known(WellKnownType::FieldInfo))
    }

    pub(super) fn parameter_info(&self, param: ParamId, span: Span) -> BoundExpr {
        BoundExpr::parameter_info(span, param, self.known(WellKnownType::ParameterInfo))
    }

    /// A `MethodInfo`, or a typed null when there is no method.
    pub(super) fn method_info_or_null(&self, method: Option<MethodId>, span: Span) -> BoundExpr {
        match method {
            Some(method) => self.method_info(method, span),
            None => self.null_of(WellKnownType::MethodInfo, span),
        }
    }

    // =========================================================================
    // Literals and arrays
    // =========================================================================

    pub(super) fn string(&self, value: &str, span: Span) -> BoundExpr {
        let ty = self.symbols.special(SpecialType::String);
        BoundExpr::literal(span, ConstantValue::String(value.to_string()), Some(ty))
    }

    pub(super) fn int(&self, value: i64, span: Span) -> BoundExpr {
        let ty = self.symbols.special(SpecialType::Int32);
        BoundExpr::literal(span, ConstantValue::Int(value), Some(ty))
    }

    pub(super) fn boolean(&self, value: bool, span: Span) -> BoundExpr {
        let ty = self.symbols.special(SpecialType::Boolean);
        BoundExpr::literal(span, ConstantValue::Bool(value), Some(ty))
    }

    pub(super) fn null_of(&self, ty: WellKnownType, span: Span) -> BoundExpr {
        BoundExpr::null(span, self.known(ty))
    }

    /// A null `Expression`, used for absent receivers and operands.
    pub(super) fn null_expression(&self, span: Span) -> BoundExpr {
        self.null_of(WellKnownType::Expression, span)
    }

    /// `new T[] { items... }` for a well-known element type.
    pub(super) fn array_of(&mut self, element: WellKnownType, items: Vec<BoundExpr>, span: Span) -> BoundExpr {
        let element = self.known(element);
        self.array_of_type(element, items, span)
    }

    pub(super) fn array_of_type(&mut self, element: TypeId, items: Vec<BoundExpr>, span: Span) -> BoundExpr {
        let array = self.symbols.array_of(element, 1);
        BoundExpr::array(span, array, items)
    }

    pub(super) fn expressions(&mut self, items: Vec<BoundExpr>, span: Span) -> BoundExpr {
        self.array_of(WellKnownType::Expression, items, span)
    }

    pub(super) fn parameters(&mut self, items: Vec<BoundExpr>, span: Span) -> BoundExpr {
        self.array_of(WellKnownType::ParameterExpression, items, span)
    }

    /// Convert `expr` to `object`: identity, boxing or a reference conversion.
    pub(super) fn to_object(&self, expr: BoundExpr) -> BoundExpr {
        let object = self.symbols.special(SpecialType::Object);
        let span = expr.span;
        match expr.ty {
            Some(ty) if ty == object => expr,
            None if expr.is_untyped_null() => BoundExpr::null(span, object),
            Some(ty) if self.symbols.is_value_type(ty) => {
                BoundExpr::convert(span, expr, Conversion::new(ConversionKind::Boxing), object)
            }
            _ => BoundExpr::convert(span, expr, Conversion::new(ConversionKind::ImplicitReference), object),
        }
    }

    // =========================================================================
    // Common factory calls
    // =========================================================================

    /// `Expression.Constant((object)value, typeof(ty))`.
    pub(super) fn constant(&mut self, value: BoundExpr, ty: TypeId, span: Span) -> BoundExpr {
        let value = self.to_object(value);
        let type_of = self.type_of(ty, span);
        self.factory(FactoryType::Expression, "Constant", vec![value, type_of], span)
    }

    pub(super) fn convert_to(&mut self, operand: BoundExpr, ty: TypeId, checked: bool, span: Span) -> BoundExpr {
        let name = if checked { "ConvertChecked" } else { "Convert" };
        let type_of = self.type_of(ty, span);
        self.factory(FactoryType::Expression, name, vec![operand, type_of], span)
    }

    pub(super) fn default_of(&mut self, ty: TypeId, span: Span) -> BoundExpr {
        let type_of = self.type_of(ty, span);
        self.factory(FactoryType::Expression, "Default", vec![type_of], span)
    }

    pub(super) fn empty(&mut self, span: Span) -> BoundExpr {
        self.factory(FactoryType::Expression, "Empty", Vec::new(), span)
    }

    /// `Expression.Block(typeof(ty), variables, expressions)`.
    pub(super) fn block(&mut self, ty: TypeId, variables: Vec<BoundExpr>, exprs: Vec<BoundExpr>, span: Span) -> BoundExpr {
        let type_of = self.type_of(ty, span);
        let variables = self.parameters(variables, span);
        let exprs = self.expressions(exprs, span);
        self.factory(FactoryType::Expression, "Block", vec![type_of, variables, exprs], span)
    }
}
