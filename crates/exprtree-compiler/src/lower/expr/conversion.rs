//! Conversions, type tests and null coalescing.

use exprtree_core::bound::*;
use exprtree_core::{ConstantValue, FactoryType, Span, TypeId, WellKnownType};

use super::{calls, dynamic, lambda};
use crate::error::{LoweringError, Result};
use crate::lower::{ExpressionLowering, VariableKey};

pub(super) fn lower_conversion(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    conversion: &ConversionExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let target = lowering.type_or_object(expr);
    let kind = conversion.conversion.kind;

    match kind {
        ConversionKind::Identity | ConversionKind::ImplicitReference => {
            let operand = lowering.lower_expr(&conversion.operand)?;
            if conversion.explicit_cast {
                Ok(lowering.convert_to(operand, target, false, span))
            } else {
                Ok(operand)
            }
        }
        ConversionKind::ImplicitNullable | ConversionKind::ExplicitNullable => {
            lower_nullable(lowering, conversion, target, span)
        }
        ConversionKind::NullLiteral => {
            let null = BoundExpr::literal(span, ConstantValue::Null, None);
            Ok(lowering.constant(null, target, span))
        }
        ConversionKind::ImplicitUserDefined | ConversionKind::ExplicitUserDefined | ConversionKind::IntPtr
            if conversion.conversion.method.is_some() =>
        {
            lower_user_defined(lowering, conversion, target, span)
        }
        ConversionKind::MethodGroup => calls::lower_method_group_conversion(lowering, expr, &conversion.operand),
        ConversionKind::AnonymousFunction => match conversion.operand.as_lambda() {
            Some(lambda) => lambda::lower_lambda_as(lowering, span, lambda, expr.ty),
            None => Err(LoweringError::Unhandled { node: "anonymous function conversion", span }),
        },
        ConversionKind::ImplicitDynamic | ConversionKind::ExplicitDynamic => {
            dynamic::lower_dynamic_conversion(lowering, expr, conversion)
        }
        ConversionKind::ImplicitTuple | ConversionKind::ImplicitTupleLiteral | ConversionKind::ExplicitTuple => {
            Err(LoweringError::Unhandled { node: "tuple conversion", span })
        }
        ConversionKind::ImplicitPointer | ConversionKind::ExplicitPointer => {
            Err(LoweringError::Unhandled { node: "pointer conversion", span })
        }
        _ => {
            let operand = lowering.lower_expr(&conversion.operand)?;
            Ok(lowering.convert_to(operand, target, conversion.checked, span))
        }
    }
}

/// `S -> T?`: converts through `T` first when `S` is neither `T` nor nullable.
fn lower_nullable(
    lowering: &mut ExpressionLowering<'_>,
    conversion: &ConversionExpr,
    target: TypeId,
    span: Span,
) -> Result<BoundExpr> {
    let mut operand = lowering.lower_expr(&conversion.operand)?;
    let source = lowering.type_or_object(&conversion.operand);
    if let Some(underlying) = lowering.symbols.nullable_underlying(target) {
        if !lowering.symbols.is_nullable(source) && source != underlying {
            operand = lowering.convert_to(operand, underlying, conversion.checked, span);
        }
    }
    Ok(lowering.convert_to(operand, target, conversion.checked, span))
}

fn lower_user_defined(
    lowering: &mut ExpressionLowering<'_>,
    conversion: &ConversionExpr,
    target: TypeId,
    span: Span,
) -> Result<BoundExpr> {
    let Some(method) = conversion.conversion.method else {
        return Err(LoweringError::Unhandled { node: "user-defined conversion without a method", span });
    };
    let source = lowering.type_or_object(&conversion.operand);
    let (param_ty, return_ty) = {
        let def = lowering.symbols.method(method);
        let param_ty = def
            .params
            .first()
            .map(|p| lowering.symbols.param(*p).ty)
            .unwrap_or(source);
        (param_ty, def.return_type)
    };

    let lifted = lowering.symbols.is_nullable(source) && !lowering.symbols.is_nullable(param_ty);
    let (param_ty, result_ty) = if lifted {
        let result_ty = if lowering.symbols.is_value_type(return_ty) {
            lowering.symbols.nullable_of(return_ty)
        } else {
            return_ty
        };
        (lowering.symbols.nullable_of(param_ty), result_ty)
    } else {
        (param_ty, return_ty)
    };

    let mut operand = lowering.lower_expr(&conversion.operand)?;
    if source != param_ty {
        operand = lowering.convert_to(operand, param_ty, false, span);
    }

    let name = if conversion.checked { "ConvertChecked" } else { "Convert" };
    let type_of = lowering.type_of(result_ty, span);
    let method_info = lowering.method_info(method, span);
    let converted = lowering.factory(FactoryType::Expression, name, vec![operand, type_of, method_info], span);

    if result_ty != target {
        Ok(lowering.convert_to(converted, target, false, span))
    } else {
        Ok(converted)
    }
}

pub(super) fn lower_type_as(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    operand: &BoundExpr,
) -> Result<BoundExpr> {
    let operand = lowering.lower_expr(operand)?;
    let ty = lowering.type_or_object(expr);
    let type_of = lowering.type_of(ty, expr.span);
    Ok(lowering.factory(FactoryType::Expression, "TypeAs", vec![operand, type_of], expr.span))
}

pub(super) fn lower_type_is(lowering: &mut ExpressionLowering<'_>, expr: &BoundExpr, is: &IsExpr) -> Result<BoundExpr> {
    let operand = lowering.lower_expr(&is.operand)?;
    let type_of = lowering.type_of(is.target, expr.span);
    Ok(lowering.factory(FactoryType::Expression, "TypeIs", vec![operand, type_of], expr.span))
}

pub(super) fn lower_coalesce(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    coalesce: &NullCoalescingExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let left = lowering.lower_expr(&coalesce.left)?;
    let right = lowering.lower_expr(&coalesce.right)?;
    let mut args = vec![left, right];

    if coalesce.left_conversion.is_user_defined() {
        let left_ty = lowering.type_or_object(&coalesce.left);
        let from = lowering.symbols.strip_nullable(left_ty);
        let to = lowering.type_or_object(expr);
        args.push(lowering.conversion_lambda(from, coalesce.left_conversion, to, span)?);
    }
    Ok(lowering.factory(FactoryType::Expression, "Coalesce", args, span))
}

impl ExpressionLowering<'_> {
    /// A lambda `p => (to)p` applying `conversion`, as a build-expression.
    ///
    /// The lambda has a single synthesized parameter; its temporary is local
    /// to the returned sequence rather than hoisted into the prologue.
    pub(crate) fn conversion_lambda(
        &mut self,
        from: TypeId,
        conversion: Conversion,
        to: TypeId,
        span: Span,
    ) -> Result<BoundExpr> {
        let param = self.symbols.synthesize_parameter(from, "p");
        let param_ty = self.known(WellKnownType::ParameterExpression);
        let temp = self.symbols.synthesize_local(param_ty, "p");
        let temp_expr = BoundExpr::local(span, temp, param_ty);

        let type_of = self.type_of(from, span);
        let name = self.string("p", span);
        let init = self.factory(FactoryType::Expression, "Parameter", vec![type_of, name], span);

        let body_node = BoundExpr::convert(span, BoundExpr::parameter(span, param, from), conversion, to);
        let bound = temp_expr.clone();
        let body = self.with_scope(|this| {
            this.bindings.bind(VariableKey::Parameter(param), bound);
            this.lower_expr(&body_node)
        })?;

        let params = self.parameters(vec![temp_expr.clone()], span);
        let lambda = self.factory(FactoryType::Expression, "Lambda", vec![body, params], span);
        Ok(BoundExpr::sequence(
            span,
            vec![temp],
            vec![BoundExpr::assign(span, temp_expr, init)],
            lambda,
        ))
    }
}
