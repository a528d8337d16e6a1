//! Unary and binary operators.
//!
//! Enum operands are promoted before the factory call: both sides are
//! converted to the promoted underlying type (nullable when lifted) and the
//! result converted back whenever the operator's type differs from the
//! promoted one, checked when the operator is. A constant
//! operand is re-emitted as a constant of the promoted type rather than
//! wrapped in a conversion.

use exprtree_core::bound::*;
use exprtree_core::{ConstantValue, FactoryType, Span, TypeId};

use super::dynamic;
use crate::error::{LoweringError, Result};
use crate::lower::ExpressionLowering;

/// Factory name for a binary operator.
pub(super) fn binary_factory_name(kind: BinaryOperatorKind, checked: bool) -> &'static str {
    use BinaryOperatorKind::*;
    match (kind, checked) {
        (Add, false) => "Add",
        (Add, true) => "AddChecked",
        (Subtract, false) => "Subtract",
        (Subtract, true) => "SubtractChecked",
        (Multiply, false) => "Multiply",
        (Multiply, true) => "MultiplyChecked",
        (Divide, _) => "Divide",
        (Remainder, _) => "Modulo",
        (LeftShift, _) => "LeftShift",
        (RightShift, _) => "RightShift",
        (And, _) => "And",
        (Or, _) => "Or",
        (Xor, _) => "ExclusiveOr",
        (LogicalAnd, _) => "AndAlso",
        (LogicalOr, _) => "OrElse",
        (Equal, _) => "Equal",
        (NotEqual, _) => "NotEqual",
        (LessThan, _) => "LessThan",
        (LessThanOrEqual, _) => "LessThanOrEqual",
        (GreaterThan, _) => "GreaterThan",
        (GreaterThanOrEqual, _) => "GreaterThanOrEqual",
    }
}

/// Whether `ty`, ignoring nullability, is an integral special type.
pub(super) fn is_integral(lowering: &ExpressionLowering<'_>, ty: Option<TypeId>) -> bool {
    let Some(ty) = ty else { return false };
    let ty = lowering.symbols.strip_nullable(ty);
    lowering
        .symbols
        .special_type(ty)
        .is_some_and(|special| special.is_integral())
}

pub(super) fn lower_unary(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    unary: &UnaryExpr,
) -> Result<BoundExpr> {
    if unary.op.flags.contains(OperatorFlags::DYNAMIC) {
        return dynamic::lower_dynamic_unary(lowering, expr, unary);
    }

    let span = expr.span;
    let operand = lowering.lower_expr(&unary.operand)?;
    let checked = unary.op.flags.contains(OperatorFlags::CHECKED);

    let name = match unary.op.kind {
        UnaryOperatorKind::Negate if checked && is_integral(lowering, unary.operand.ty) => "NegateChecked",
        UnaryOperatorKind::Negate => "Negate",
        UnaryOperatorKind::Plus => "UnaryPlus",
        UnaryOperatorKind::LogicalNot | UnaryOperatorKind::BitwiseComplement => "Not",
        UnaryOperatorKind::True | UnaryOperatorKind::False => {
            let method = unary.method.ok_or(LoweringError::Unhandled {
                node: "true/false operator without a user-defined method",
                span,
            })?;
            let receiver = lowering.null_expression(span);
            let method = lowering.method_info(method, span);
            let args = lowering.expressions(vec![operand], span);
            return Ok(lowering.factory(FactoryType::Expression, "Call", vec![receiver, method, args], span));
        }
    };

    let mut args = vec![operand];
    if let Some(method) = unary.method {
        args.push(lowering.method_info(method, span));
    }
    Ok(lowering.factory(FactoryType::Expression, name, args, span))
}

pub(super) fn lower_binary(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    binary: &BinaryExpr,
) -> Result<BoundExpr> {
    if binary.op.is_dynamic() {
        return dynamic::lower_dynamic_binary(lowering, expr, binary);
    }

    // Left-nested chains are built bottom-up in a loop so that a long
    // `a + b + c + ...` does not spend the recursion budget.
    let mut spine: Vec<(&BoundExpr, &BinaryExpr)> = vec![(expr, binary)];
    let mut leaf = &binary.left;
    while let ExprKind::Binary(inner) = &leaf.kind {
        if inner.op.is_dynamic() || leaf.constant_value().is_some() {
            break;
        }
        spine.push((leaf, inner.as_ref()));
        leaf = &inner.left;
    }

    let mut left = lowering.lower_expr(leaf)?;
    for (node, binary) in spine.into_iter().rev() {
        left = build_binary(lowering, node, binary, left)?;
    }
    Ok(left)
}

/// One binary node whose left operand is already lowered.
fn build_binary(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    binary: &BinaryExpr,
    left: BoundExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let op = binary.op;
    let mut left = left;
    let mut right = lowering.lower_expr(&binary.right)?;

    // `x == null`: the null takes the other operand's type.
    if binary.left.is_untyped_null() {
        if let Some(ty) = binary.right.ty {
            left = null_constant(lowering, ty, binary.left.span);
        }
    }
    if binary.right.is_untyped_null() {
        if let Some(ty) = binary.left.ty {
            right = null_constant(lowering, ty, binary.right.span);
        }
    }

    let promoted = if op.flags.involves_enum() && binary.method.is_none() {
        enum_promotion(lowering, binary)
    } else {
        None
    };
    if let Some(ty) = promoted {
        left = promote(lowering, &binary.left, left, ty);
        right = promote(lowering, &binary.right, right, ty);
    }

    let operand_ty = promoted.or(binary.left.ty).or(binary.right.ty);
    let checked = op.is_checked() && op.kind.has_checked_form() && is_integral(lowering, operand_ty);
    let name = binary_factory_name(op.kind, checked);

    let mut args = vec![left, right];
    match binary.method {
        Some(method) if op.kind.is_comparison() => {
            let return_type = lowering.symbols.method(method).return_type;
            let lift_to_null = op.is_lifted() && expr.ty != Some(return_type);
            args.push(lowering.boolean(lift_to_null, span));
            args.push(lowering.method_info(method, span));
        }
        Some(method) => args.push(lowering.method_info(method, span)),
        None => {}
    }
    let result = lowering.factory(FactoryType::Expression, name, args, span);

    // Comparisons already yield bool; anything else built against the
    // promoted type is converted back to the operator's result type.
    match (promoted, expr.ty) {
        (Some(promoted), Some(ty)) if !op.kind.is_comparison() && ty != promoted => {
            Ok(lowering.convert_to(result, ty, op.is_checked(), span))
        }
        _ => Ok(result),
    }
}

fn null_constant(lowering: &mut ExpressionLowering<'_>, ty: TypeId, span: Span) -> BoundExpr {
    let null = BoundExpr::literal(span, ConstantValue::Null, None);
    lowering.constant(null, ty, span)
}

/// The type enum operands are promoted to.
fn enum_promotion(lowering: &mut ExpressionLowering<'_>, binary: &BinaryExpr) -> Option<TypeId> {
    let enum_operand = if binary.op.flags.contains(OperatorFlags::UNDERLYING_AND_ENUM) {
        &binary.right
    } else {
        &binary.left
    };
    let symbols = &mut *lowering.symbols;
    let enum_ty = symbols.strip_nullable(enum_operand.ty?);
    let underlying = symbols.enum_underlying(enum_ty)?;
    let promoted = symbols.special(symbols.special_type(underlying)?.promoted());
    Some(if binary.op.is_lifted() { symbols.nullable_of(promoted) } else { promoted })
}

fn promote(lowering: &mut ExpressionLowering<'_>, original: &BoundExpr, lowered: BoundExpr, ty: TypeId) -> BoundExpr {
    if original.ty == Some(ty) {
        return lowered;
    }
    let span = original.span;
    match original.constant_value() {
        Some(value) if !value.is_null() => {
            let retyped = BoundExpr::literal(span, value.clone(), Some(ty));
            lowering.constant(retyped, ty, span)
        }
        _ => lowering.convert_to(lowered, ty, false, span),
    }
}
