//! Object, collection, anonymous-object and array creation.

use std::collections::VecDeque;

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, Span, SpecialType, WellKnownType};

use super::calls::{self, CallShape};
use crate::error::{LoweringError, Result};
use crate::lower::ExpressionLowering;

pub(super) fn lower_object_creation(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    creation: &ObjectCreationExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let new = match creation.constructor {
        // Parameterless struct construction.
        None => {
            let ty = lowering.type_or_object(expr);
            let type_of = lowering.type_of(ty, span);
            lowering.factory(FactoryType::Expression, "New", vec![type_of], span)
        }
        Some(ctor) => {
            let (factory, args) = match calls::call_shape(lowering, ctor, &creation.args) {
                CallShape::Positional => {
                    let args = calls::lower_positional_args(lowering, ctor, &creation.args, span)?;
                    (FactoryType::Expression, lowering.expressions(args, span))
                }
                CallShape::Binding => {
                    let bindings = calls::lower_binding_args(lowering, ctor, &creation.args, span)?;
                    (
                        FactoryType::CSharpExpression,
                        lowering.array_of(WellKnownType::ParameterAssignment, bindings, span),
                    )
                }
                CallShape::ByRefFromEnd => {
                    let args = calls::lower_by_ref_args(lowering, ctor, &creation.args)?;
                    (FactoryType::CSharpExpression, lowering.expressions(args, span))
                }
            };
            let ctor = lowering.ctor_info(ctor, span);
            lowering.factory(factory, "New", vec![ctor, args], span)
        }
    };

    match &creation.initializer {
        Some(initializer) => lower_initializer(lowering, new, initializer),
        None => Ok(new),
    }
}

pub(super) fn lower_new_type_parameter(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    initializer: Option<&BoundExpr>,
) -> Result<BoundExpr> {
    let span = expr.span;
    let ty = lowering.type_or_object(expr);
    let type_of = lowering.type_of(ty, span);
    let new = lowering.factory(FactoryType::Expression, "New", vec![type_of], span);
    match initializer {
        Some(initializer) => lower_initializer(lowering, new, initializer),
        None => Ok(new),
    }
}

/// `MemberInit(new, bindings)` or `ListInit(new, inits)`.
fn lower_initializer(lowering: &mut ExpressionLowering<'_>, new: BoundExpr, initializer: &BoundExpr) -> Result<BoundExpr> {
    let span = initializer.span;
    match &initializer.kind {
        ExprKind::ObjectInitializer(members) => {
            let bindings = member_bindings(lowering, members)?;
            let bindings = lowering.array_of(WellKnownType::MemberBinding, bindings, span);
            Ok(lowering.factory(FactoryType::Expression, "MemberInit", vec![new, bindings], span))
        }
        ExprKind::CollectionInitializer(elements) => {
            let inits = element_inits(lowering, elements)?;
            let inits = lowering.array_of(WellKnownType::ElementInit, inits, span);
            Ok(lowering.factory(FactoryType::Expression, "ListInit", vec![new, inits], span))
        }
        _ => Err(LoweringError::Unhandled { node: "initializer", span }),
    }
}

fn member_bindings(lowering: &mut ExpressionLowering<'_>, members: &[BoundExpr]) -> Result<Vec<BoundExpr>> {
    let mut bindings = Vec::with_capacity(members.len());
    for member in members {
        let span = member.span;
        let ExprKind::Assignment(assignment) = &member.kind else {
            return Err(LoweringError::Unhandled { node: "object initializer member", span });
        };
        let ExprKind::ObjectInitializerMember(target) = &assignment.target.kind else {
            return Err(LoweringError::Unhandled { node: "object initializer target", span });
        };
        if !target.args.is_empty() {
            return Err(LoweringError::Unhandled { node: "dictionary initializer", span });
        }

        let binding = match &assignment.value.kind {
            ExprKind::ObjectInitializer(nested) => {
                let member = member_info(lowering, target.member, false, span)?;
                let nested = member_bindings(lowering, nested)?;
                let nested = lowering.array_of(WellKnownType::MemberBinding, nested, span);
                lowering.factory(FactoryType::Expression, "MemberBind", vec![member, nested], span)
            }
            ExprKind::CollectionInitializer(elements) => {
                let member = member_info(lowering, target.member, false, span)?;
                let inits = element_inits(lowering, elements)?;
                let inits = lowering.array_of(WellKnownType::ElementInit, inits, span);
                lowering.factory(FactoryType::Expression, "ListBind", vec![member, inits], span)
            }
            _ => {
                let member = member_info(lowering, target.member, true, span)?;
                let value = lowering.lower_expr(&assignment.value)?;
                lowering.factory(FactoryType::Expression, "Bind", vec![member, value], span)
            }
        };
        bindings.push(binding);
    }
    Ok(bindings)
}

/// The member a binding refers to: the field, or the property's setter when
/// assigning and its getter when initializing the existing value.
fn member_info(
    lowering: &mut ExpressionLowering<'_>,
    member: InitializerMember,
    assigning: bool,
    span: Span,
) -> Result<BoundExpr> {
    match member {
        InitializerMember::Field(field) => Ok(lowering.field_info(field, span)),
        InitializerMember::Property(property) => {
            let def = lowering.symbols.property(property);
            let accessor = if assigning { def.setter } else { def.getter };
            let accessor = accessor.ok_or(LoweringError::Unhandled { node: "property without accessor", span })?;
            Ok(lowering.method_info(accessor, span))
        }
    }
}

fn element_inits(lowering: &mut ExpressionLowering<'_>, elements: &[BoundExpr]) -> Result<Vec<BoundExpr>> {
    let mut inits = Vec::with_capacity(elements.len());
    for element in elements {
        let span = element.span;
        let ExprKind::CollectionElementInitializer(init) = &element.kind else {
            return Err(LoweringError::Unhandled { node: "collection initializer element", span });
        };
        let method = lowering.method_info(init.add_method, span);
        let args = lowering.lower_all(&init.args)?;
        let args = lowering.expressions(args, span);
        inits.push(lowering.factory(FactoryType::Expression, "ElementInit", vec![method, args], span));
    }
    Ok(inits)
}

/// `new { A = a, B = b }` becomes `New(ctor, [a, b], [get_A, get_B])`.
pub(super) fn lower_anonymous_object(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    anonymous: &AnonymousObjectExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let args = lowering.lower_all(&anonymous.args)?;
    let args = lowering.expressions(args, span);

    let mut members = Vec::with_capacity(anonymous.properties.len());
    for &property in &anonymous.properties {
        let getter = lowering
            .symbols
            .property(property)
            .getter
            .ok_or(LoweringError::Unhandled { node: "anonymous type property", span })?;
        members.push(lowering.method_info(getter, span));
    }
    let members = lowering.array_of(WellKnownType::MemberInfo, members, span);

    let ctor = lowering.ctor_info(anonymous.constructor, span);
    Ok(lowering.factory(FactoryType::Expression, "New", vec![ctor, args, members], span))
}

pub(super) fn lower_array_creation(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    creation: &ArrayCreationExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let ty = lowering.type_or_object(expr);
    let element = lowering
        .symbols
        .array_element(ty)
        .unwrap_or_else(|| lowering.symbols.special(SpecialType::Object));
    let rank = lowering.symbols.array_rank(ty).unwrap_or(1) as usize;
    let type_of = lowering.type_of(element, span);

    match &creation.initializer {
        None => {
            let bounds = lowering.lower_all(&creation.bounds)?;
            let bounds = lowering.expressions(bounds, span);
            Ok(lowering.factory(FactoryType::Expression, "NewArrayBounds", vec![type_of, bounds], span))
        }
        Some(initializer) if rank == 1 => {
            let ExprKind::ArrayInitialization(items) = &initializer.kind else {
                return Err(LoweringError::Unhandled { node: "array initializer", span });
            };
            let items = lowering.lower_all(items)?;
            let items = lowering.expressions(items, span);
            Ok(lowering.factory(FactoryType::Expression, "NewArrayInit", vec![type_of, items], span))
        }
        Some(initializer) => {
            let (bounds, items) = flatten_initializer(lowering, initializer, rank)?;
            let int = lowering.symbols.special(SpecialType::Int32);
            let bounds: Vec<BoundExpr> = bounds.into_iter().map(|b| lowering.int(b as i64, span)).collect();
            let bounds = lowering.array_of_type(int, bounds, span);
            let items = lowering.expressions(items, span);
            Ok(lowering.factory(
                FactoryType::CSharpExpression,
                "NewMultidimensionalArrayInit",
                vec![type_of, bounds, items],
                span,
            ))
        }
    }
}

/// Breadth-first walk of a rank-`rank` initializer: the length of the first
/// initializer at each depth gives the bounds, the leaves come out in
/// row-major order.
fn flatten_initializer(
    lowering: &mut ExpressionLowering<'_>,
    initializer: &BoundExpr,
    rank: usize,
) -> Result<(Vec<usize>, Vec<BoundExpr>)> {
    let mut bounds = Vec::with_capacity(rank);
    let mut leaves = Vec::new();
    let mut queue = VecDeque::from([(0usize, initializer)]);

    while let Some((depth, node)) = queue.pop_front() {
        match &node.kind {
            ExprKind::ArrayInitialization(items) if depth < rank => {
                if bounds.len() == depth {
                    bounds.push(items.len());
                }
                queue.extend(items.iter().map(|item| (depth + 1, item)));
            }
            _ => leaves.push(lowering.lower_expr(node)?),
        }
    }
    Ok((bounds, leaves))
}
