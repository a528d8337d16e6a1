//! Assignments: `=`, `??=`, compound operators and `++`/`--`.
//!
//! All of them need the extended factories, since the core library only
//! has expression-typed assignment for a few operand shapes.

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, WellKnownType};

use super::binary::{binary_factory_name, is_integral};
use super::{access, dynamic};
use crate::error::{LoweringError, Result};
use crate::lower::ExpressionLowering;

impl ExpressionLowering<'_> {
    /// Lower an assignment target, choosing the writable form of element
    /// and indexer accesses.
    pub(crate) fn lower_lvalue(&mut self, target: &BoundExpr) -> Result<BoundExpr> {
        match &target.kind {
            ExprKind::ArrayAccess(a) => access::lower_array_lvalue(self, target, a),
            ExprKind::IndexerAccess(i) => access::lower_indexer_lvalue(self, target, i),
            _ => self.lower_expr(target),
        }
    }
}

pub(super) fn lower_assignment(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    assignment: &AssignmentExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    if assignment.is_ref {
        return Err(LoweringError::Unhandled { node: "ref assignment", span });
    }
    let target = lowering.lower_lvalue(&assignment.target)?;
    let value = lowering.lower_expr(&assignment.value)?;
    Ok(lowering.factory(FactoryType::CSharpStatement, "Assign", vec![target, value], span))
}

pub(super) fn lower_coalesce_assignment(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    assignment: &AssignmentExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let target = lowering.lower_lvalue(&assignment.target)?;
    let value = lowering.lower_expr(&assignment.value)?;
    Ok(lowering.factory(FactoryType::CSharpStatement, "CoalesceAssign", vec![target, value], span))
}

/// `a op= b` becomes `<Op>Assign[Checked](a, b, method, final, left)`.
///
/// `final` converts the operator result back to the target type and is
/// omitted for identity; `left` converts the target to the operator type
/// and is only needed when that conversion is user-defined.
pub(super) fn lower_compound(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    compound: &CompoundAssignmentExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    if compound.op.is_dynamic() || lowering.symbols.is_dynamic(lowering.type_or_object(&compound.target)) {
        return dynamic::lower_dynamic_compound(lowering, expr, compound);
    }

    let target = lowering.lower_lvalue(&compound.target)?;
    let value = lowering.lower_expr(&compound.value)?;
    let kind = compound.op.kind;
    let checked =
        compound.op.is_checked() && kind.has_checked_form() && is_integral(lowering, Some(compound.operator_type));
    let name = format!(
        "{}Assign{}",
        binary_factory_name(kind, false),
        if checked { "Checked" } else { "" }
    );

    let method = lowering.method_info_or_null(compound.method, span);
    let target_ty = lowering.type_or_object(&compound.target);
    let final_conversion = if compound.final_conversion.is_identity() {
        lowering.null_of(WellKnownType::LambdaExpression, span)
    } else {
        lowering.conversion_lambda(compound.operator_type, compound.final_conversion, target_ty, span)?
    };
    let left_conversion = if compound.left_conversion.is_user_defined() {
        lowering.conversion_lambda(target_ty, compound.left_conversion, compound.operator_type, span)?
    } else {
        lowering.null_of(WellKnownType::LambdaExpression, span)
    };

    Ok(lowering.factory(
        FactoryType::CSharpStatement,
        &name,
        vec![target, value, method, final_conversion, left_conversion],
        span,
    ))
}

pub(super) fn lower_increment(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    increment: &IncrementExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let operand_ty = lowering.type_or_object(&increment.operand);
    if lowering.symbols.is_dynamic(operand_ty) {
        return dynamic::lower_dynamic_increment(lowering, expr, increment);
    }

    let operand = lowering.lower_lvalue(&increment.operand)?;
    let checked = increment.checked && is_integral(lowering, Some(operand_ty));
    let method = lowering.method_info_or_null(increment.method, span);
    Ok(lowering.factory(
        FactoryType::CSharpStatement,
        increment.kind.factory_name(checked),
        vec![operand, method],
        span,
    ))
}
