//! Constructors for synthesized nodes.
//!
//! Lowering assembles build-expressions out of these; they take every type
//! explicitly so this module never needs the symbol table.

use crate::constant::ConstantValue;
use crate::span::Span;
use crate::symbols::{FieldId, LocalId, MethodId, ParamId};
use crate::types::TypeId;

use super::expr::{
    ArrayCreationExpr, AssignmentExpr, BoundArguments, BoundExpr, CallExpr, ConversionExpr, ExprKind,
    FieldAccessExpr, SequenceExpr,
};
use super::operators::Conversion;

impl BoundExpr {
    pub fn literal(span: Span, value: ConstantValue, ty: Option<TypeId>) -> Self {
        Self::new(span, ty, ExprKind::Literal(value))
    }

    pub fn null(span: Span, ty: TypeId) -> Self {
        Self::new(span, Some(ty), ExprKind::Literal(ConstantValue::Null))
    }

    pub fn local(span: Span, id: LocalId, ty: TypeId) -> Self {
        Self::new(span, Some(ty), ExprKind::Local(id))
    }

    pub fn parameter(span: Span, id: ParamId, ty: TypeId) -> Self {
        Self::new(span, Some(ty), ExprKind::Parameter(id))
    }

    /// `typeof(target)`, typed as `System.Type`.
    pub fn type_of(span: Span, target: TypeId, type_type: TypeId) -> Self {
        Self::new(span, Some(type_type), ExprKind::TypeOf(target))
    }

    pub fn method_info(span: Span, method: MethodId, ty: TypeId) -> Self {
        Self::new(span, Some(ty), ExprKind::MethodInfo(method))
    }

    pub fn field_info(span: Span, field: FieldId, ty: TypeId) -> Self {
        Self::new(span, Some(ty), ExprKind::FieldInfo(field))
    }

    pub fn parameter_info(span: Span, param: ParamId, ty: TypeId) -> Self {
        Self::new(span, Some(ty), ExprKind::ParameterInfo(param))
    }

    pub fn static_field(span: Span, field: FieldId, ty: TypeId) -> Self {
        Self::new(
            span,
            Some(ty),
            ExprKind::FieldAccess(Box::new(FieldAccessExpr { receiver: None, field })),
        )
    }

    pub fn call(
        span: Span,
        receiver: Option<BoundExpr>,
        method: MethodId,
        args: Vec<BoundExpr>,
        ty: Option<TypeId>,
    ) -> Self {
        Self::generic_call(span, receiver, method, Vec::new(), args, ty)
    }

    pub fn generic_call(
        span: Span,
        receiver: Option<BoundExpr>,
        method: MethodId,
        type_args: Vec<TypeId>,
        args: Vec<BoundExpr>,
        ty: Option<TypeId>,
    ) -> Self {
        Self::new(
            span,
            ty,
            ExprKind::Call(Box::new(CallExpr {
                receiver,
                method,
                args: BoundArguments::positional(args),
                type_args,
            })),
        )
    }

    /// A single-dimensional array `new T[] { items... }`.
    pub fn array(span: Span, array_ty: TypeId, items: Vec<BoundExpr>) -> Self {
        let init = Self::new(span, None, ExprKind::ArrayInitialization(items));
        Self::new(
            span,
            Some(array_ty),
            ExprKind::ArrayCreation(Box::new(ArrayCreationExpr { bounds: Vec::new(), initializer: Some(init) })),
        )
    }

    pub fn convert(span: Span, operand: BoundExpr, conversion: Conversion, ty: TypeId) -> Self {
        Self::new(
            span,
            Some(ty),
            ExprKind::Conversion(Box::new(ConversionExpr {
                operand,
                conversion,
                checked: false,
                explicit_cast: false,
                constant: None,
            })),
        )
    }

    pub fn assign(span: Span, target: BoundExpr, value: BoundExpr) -> Self {
        let ty = target.ty;
        Self::new(
            span,
            ty,
            ExprKind::Assignment(Box::new(AssignmentExpr { target, value, is_ref: false })),
        )
    }

    pub fn sequence(span: Span, locals: Vec<LocalId>, side_effects: Vec<BoundExpr>, value: BoundExpr) -> Self {
        let ty = value.ty;
        Self::new(span, ty, ExprKind::Sequence(Box::new(SequenceExpr { locals, side_effects, value })))
    }

    pub fn bad(span: Span, children: Vec<BoundExpr>, ty: Option<TypeId>) -> Self {
        Self::new(span, ty, ExprKind::Bad(children))
    }

    #[inline]
    pub fn is_bad(&self) -> bool {
        matches!(self.kind, ExprKind::Bad(_))
    }
}
