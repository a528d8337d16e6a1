//! Member, element and null-conditional access.

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, WellKnownType};

use super::calls;
use crate::error::{LoweringError, Result};
use crate::lower::ExpressionLowering;

/// The hoisted receiver local of the enclosing `?.` access.
pub(super) fn lower_receiver(lowering: &mut ExpressionLowering<'_>, expr: &BoundExpr, id: u32) -> Result<BoundExpr> {
    lowering
        .contexts
        .iter()
        .rev()
        .find_map(|ctx| ctx.receiver(id))
        .cloned()
        .ok_or(LoweringError::Unhandled { node: "conditional receiver outside its access", span: expr.span })
}

pub(super) fn lower_array_access(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    access: &ArrayAccessExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    if access.indices.iter().any(|i| calls::is_from_end_index(lowering, i)) {
        return lower_array_lvalue(lowering, expr, access);
    }

    let array = lowering.lower_expr(&access.array)?;
    let indices = lowering.lower_all(&access.indices)?;
    let index = match <[BoundExpr; 1]>::try_from(indices) {
        Ok([index]) => index,
        Err(indices) => lowering.expressions(indices, span),
    };
    Ok(lowering.factory(FactoryType::Expression, "ArrayIndex", vec![array, index], span))
}

/// `CSharpExpression.ArrayAccess`, which is writable and accepts `Index` values.
pub(super) fn lower_array_lvalue(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    access: &ArrayAccessExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let array = lowering.lower_expr(&access.array)?;
    let indices = lowering.lower_all(&access.indices)?;
    let indices = lowering.expressions(indices, span);
    Ok(lowering.factory(FactoryType::CSharpExpression, "ArrayAccess", vec![array, indices], span))
}

pub(super) fn lower_field(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    access: &FieldAccessExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let receiver = lowering.lower_or_null(access.receiver.as_ref(), span)?;
    let field = lowering.field_info(access.field, span);
    Ok(lowering.factory(FactoryType::Expression, "Field", vec![receiver, field], span))
}

pub(super) fn lower_property(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    access: &PropertyAccessExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let getter = lowering
        .symbols
        .property(access.property)
        .getter
        .ok_or(LoweringError::Unhandled { node: "property without a getter", span })?;
    let receiver = lowering.lower_or_null(access.receiver.as_ref(), span)?;
    let getter = lowering.method_info(getter, span);
    Ok(lowering.factory(FactoryType::Expression, "Property", vec![receiver, getter], span))
}

pub(super) fn lower_indexer(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    access: &IndexerAccessExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let getter = lowering
        .symbols
        .property(access.indexer)
        .getter
        .ok_or(LoweringError::Unhandled { node: "indexer without a getter", span })?;
    let receiver = lowering.lower_expr(&access.receiver)?;
    let (factory, args) = calls::lower_indexer_args(lowering, getter, &access.args, span)?;
    let method = lowering.method_info(getter, span);
    match factory {
        FactoryType::Expression => Ok(lowering.factory(factory, "Call", vec![receiver, method, args], span)),
        _ => Ok(lowering.factory(factory, "Index", vec![receiver, method, args], span)),
    }
}

/// `CSharpExpression.Index`, the writable form of an indexer access.
pub(super) fn lower_indexer_lvalue(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    access: &IndexerAccessExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let property = lowering.symbols.property(access.indexer);
    let accessor = property
        .getter
        .or(property.setter)
        .ok_or(LoweringError::Unhandled { node: "indexer without accessors", span })?;
    let receiver = lowering.lower_expr(&access.receiver)?;
    let bindings = calls::lower_binding_args(lowering, accessor, &access.args, span)?;
    let bindings = lowering.array_of(WellKnownType::ParameterAssignment, bindings, span);
    let method = lowering.method_info(accessor, span);
    Ok(lowering.factory(FactoryType::CSharpExpression, "Index", vec![receiver, method, bindings], span))
}

/// `a?.b` becomes `ConditionalAccess(a, r, b')` where `r` is a receiver
/// placeholder hoisted into the prologue and `b'` reads it in place of `a`.
pub(super) fn lower_conditional_access(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    access: &ConditionalAccessExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let receiver = lowering.lower_expr(&access.receiver)?;

    let receiver_ty = lowering.type_or_object(&access.receiver);
    let receiver_ty = lowering.symbols.strip_nullable(receiver_ty);
    let type_of = lowering.type_of(receiver_ty, span);
    let init = lowering.factory(FactoryType::CSharpExpression, "ConditionalReceiver", vec![type_of], span);
    let placeholder_ty = lowering.known(WellKnownType::ConditionalReceiver);
    let placeholder = lowering.hoist(placeholder_ty, "receiver", init, span)?;

    lowering
        .context(span)?
        .receivers
        .push((access.receiver_id, placeholder.clone()));
    let inner = lowering.lower_expr(&access.access);
    lowering.context(span)?.receivers.pop();
    let inner = inner?;

    Ok(lowering.factory(
        FactoryType::CSharpExpression,
        "ConditionalAccess",
        vec![receiver, placeholder, inner],
        span,
    ))
}

pub(super) fn lower_from_end(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    operand: &BoundExpr,
) -> Result<BoundExpr> {
    let operand = lowering.lower_expr(operand)?;
    Ok(lowering.factory(FactoryType::CSharpExpression, "FromEndIndex", vec![operand], expr.span))
}

/// `a..b`; either end may be absent.
pub(super) fn lower_range(lowering: &mut ExpressionLowering<'_>, expr: &BoundExpr, range: &RangeExpr) -> Result<BoundExpr> {
    let span = expr.span;
    let left = lowering.lower_or_null(range.left.as_ref(), span)?;
    let right = lowering.lower_or_null(range.right.as_ref(), span)?;
    Ok(lowering.factory(FactoryType::CSharpExpression, "Range", vec![left, right], span))
}
