//! Late-bound operations on `dynamic` operands.
//!
//! Each operation becomes a `DynamicCSharpExpression` factory call carrying
//! the binder flags as an int constant. Arguments are wrapped individually
//! in `DynamicArgument(e, name, flags)`.

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, RefKind, Span, SpecialType, WellKnownType};

use super::binary::binary_factory_name;
use crate::error::Result;
use crate::lower::ExpressionLowering;

fn unary_operation_name(kind: UnaryOperatorKind) -> &'static str {
    match kind {
        UnaryOperatorKind::Negate => "Negate",
        UnaryOperatorKind::Plus => "UnaryPlus",
        UnaryOperatorKind::LogicalNot => "Not",
        UnaryOperatorKind::BitwiseComplement => "OnesComplement",
        UnaryOperatorKind::True => "IsTrue",
        UnaryOperatorKind::False => "IsFalse",
    }
}

fn checked_flags(checked: bool) -> BinderFlags {
    if checked {
        BinderFlags::CHECKED_CONTEXT
    } else {
        BinderFlags::empty()
    }
}

fn flags(lowering: &ExpressionLowering<'_>, flags: BinderFlags, span: Span) -> BoundExpr {
    lowering.int(i64::from(flags.bits()), span)
}

fn argument_flags(lowering: &ExpressionLowering<'_>, arg: &DynamicArgument) -> ArgumentFlags {
    let mut flags = ArgumentFlags::empty();
    if arg.expr.ty.is_some_and(|t| !lowering.symbols.is_dynamic(t)) {
        flags |= ArgumentFlags::USE_COMPILE_TIME_TYPE;
    }
    if arg.expr.is_literal() {
        flags |= ArgumentFlags::CONSTANT;
    }
    if arg.name.is_some() {
        flags |= ArgumentFlags::NAMED_ARGUMENT;
    }
    match arg.ref_kind {
        RefKind::Ref | RefKind::In => flags |= ArgumentFlags::IS_REF,
        RefKind::Out => flags |= ArgumentFlags::IS_OUT,
        RefKind::None => {}
    }
    flags
}

/// `DynamicCSharpArgument[]` of `DynamicArgument(e, name|null, flags)`.
fn lower_arguments(lowering: &mut ExpressionLowering<'_>, args: &[DynamicArgument], span: Span) -> Result<BoundExpr> {
    let string = lowering.symbols.special(SpecialType::String);
    let mut lowered = Vec::with_capacity(args.len());
    for arg in args {
        let value = if arg.ref_kind == RefKind::None {
            lowering.lower_expr(&arg.expr)?
        } else {
            lowering.lower_lvalue(&arg.expr)?
        };
        let name = match &arg.name {
            Some(name) => lowering.string(name, span),
            None => BoundExpr::null(span, string),
        };
        let arg_flags = lowering.int(i64::from(argument_flags(lowering, arg).bits()), span);
        lowered.push(lowering.factory(
            FactoryType::DynamicCSharpExpression,
            "DynamicArgument",
            vec![value, name, arg_flags],
            span,
        ));
    }
    Ok(lowering.array_of(WellKnownType::DynamicCSharpArgument, lowered, span))
}

pub(super) fn lower_dynamic(lowering: &mut ExpressionLowering<'_>, expr: &BoundExpr, dynamic: &DynamicExpr) -> Result<BoundExpr> {
    let span = expr.span;
    let binder = flags(lowering, dynamic.flags, span);
    let factory = FactoryType::DynamicCSharpExpression;

    match &dynamic.operation {
        DynamicOperation::InvokeMember { receiver, name, args } => {
            let receiver = lowering.lower_expr(receiver)?;
            let name = lowering.string(name, span);
            let args = lower_arguments(lowering, args, span)?;
            Ok(lowering.factory(factory, "DynamicInvokeMember", vec![receiver, name, args, binder], span))
        }
        DynamicOperation::Invoke { receiver, args } => {
            let receiver = lowering.lower_expr(receiver)?;
            let args = lower_arguments(lowering, args, span)?;
            Ok(lowering.factory(factory, "DynamicInvoke", vec![receiver, args, binder], span))
        }
        DynamicOperation::GetMember { receiver, name } => {
            let receiver = lowering.lower_expr(receiver)?;
            let name = lowering.string(name, span);
            Ok(lowering.factory(factory, "DynamicGetMember", vec![receiver, name, binder], span))
        }
        DynamicOperation::GetIndex { receiver, args } => {
            let receiver = lowering.lower_expr(receiver)?;
            let args = lower_arguments(lowering, args, span)?;
            Ok(lowering.factory(factory, "DynamicGetIndex", vec![receiver, args, binder], span))
        }
        DynamicOperation::ObjectCreation { args } => {
            let ty = lowering.type_or_object(expr);
            let type_of = lowering.type_of(ty, span);
            let args = lower_arguments(lowering, args, span)?;
            Ok(lowering.factory(factory, "DynamicInvokeConstructor", vec![type_of, args, binder], span))
        }
    }
}

pub(super) fn lower_dynamic_unary(lowering: &mut ExpressionLowering<'_>, expr: &BoundExpr, unary: &UnaryExpr) -> Result<BoundExpr> {
    let span = expr.span;
    let operand = lowering.lower_expr(&unary.operand)?;
    let name = lowering.string(unary_operation_name(unary.op.kind), span);
    let binder = flags(lowering, checked_flags(unary.op.flags.contains(OperatorFlags::CHECKED)), span);
    Ok(lowering.factory(
        FactoryType::DynamicCSharpExpression,
        "MakeDynamicUnary",
        vec![name, operand, binder],
        span,
    ))
}

pub(super) fn lower_dynamic_binary(lowering: &mut ExpressionLowering<'_>, expr: &BoundExpr, binary: &BinaryExpr) -> Result<BoundExpr> {
    let span = expr.span;
    let left = lowering.lower_expr(&binary.left)?;
    let right = lowering.lower_expr(&binary.right)?;

    let mut binder = checked_flags(binary.op.is_checked());
    if matches!(binary.op.kind, BinaryOperatorKind::LogicalAnd | BinaryOperatorKind::LogicalOr) {
        binder |= BinderFlags::BINARY_OPERATION_LOGICAL;
    }
    let name = lowering.string(binary_factory_name(binary.op.kind, false), span);
    let binder = flags(lowering, binder, span);
    Ok(lowering.factory(
        FactoryType::DynamicCSharpExpression,
        "MakeDynamicBinary",
        vec![name, left, right, binder],
        span,
    ))
}

pub(super) fn lower_dynamic_conversion(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    conversion: &ConversionExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let operand = lowering.lower_expr(&conversion.operand)?;
    let ty = lowering.type_or_object(expr);
    let type_of = lowering.type_of(ty, span);

    let mut binder = checked_flags(conversion.checked);
    if conversion.explicit_cast || conversion.conversion.kind == ConversionKind::ExplicitDynamic {
        binder |= BinderFlags::CONVERT_EXPLICIT;
    }
    let binder = flags(lowering, binder, span);
    Ok(lowering.factory(
        FactoryType::DynamicCSharpExpression,
        "DynamicConvert",
        vec![operand, type_of, binder],
        span,
    ))
}

/// `d op= v` on a dynamic target.
pub(super) fn lower_dynamic_compound(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    compound: &CompoundAssignmentExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let target = lowering.lower_lvalue(&compound.target)?;
    let value = lowering.lower_expr(&compound.value)?;
    let checked = compound.op.is_checked() && compound.op.kind.has_checked_form();
    let operation = format!(
        "{}Assign{}",
        binary_factory_name(compound.op.kind, false),
        if checked { "Checked" } else { "" }
    );
    let name = lowering.string(&operation, span);
    let binder = flags(lowering, checked_flags(compound.op.is_checked()), span);
    Ok(lowering.factory(
        FactoryType::DynamicCSharpExpression,
        "MakeDynamicBinaryAssign",
        vec![name, target, value, binder],
        span,
    ))
}

/// `d++` and friends on a dynamic operand.
pub(super) fn lower_dynamic_increment(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    increment: &IncrementExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let operand = lowering.lower_lvalue(&increment.operand)?;
    let name = lowering.string(increment.kind.factory_name(false), span);
    let binder = flags(lowering, checked_flags(increment.checked), span);
    Ok(lowering.factory(
        FactoryType::DynamicCSharpExpression,
        "MakeDynamicUnaryAssign",
        vec![name, operand, binder],
        span,
    ))
}
