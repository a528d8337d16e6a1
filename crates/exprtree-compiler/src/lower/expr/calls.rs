//! Calls, invocations and delegate creation.
//!
//! A call takes one of three shapes:
//!
//! - positional: `Expression.Call`/`Invoke`/`New` with an argument array
//! - binding: named, reordered or defaulted arguments become
//!   `CSharpExpression.Bind(parameter, value)` assignments; defaulted
//!   arguments are left for the runtime to fill in
//! - by-ref from end: a by-ref parameter receiving `a[^i]` needs the
//!   extended call so the array access stays writable

use exprtree_core::bound::*;
use exprtree_core::{
    Capability, FactoryType, MethodId, MethodKind, ParamId, RefKind, Span, SpecialType, TypeId, WellKnownType,
};

use super::lambda;
use crate::error::{LoweringError, Result};
use crate::lower::ExpressionLowering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum CallShape {
    Positional,
    Binding,
    ByRefFromEnd,
}

pub(super) fn call_shape(lowering: &ExpressionLowering<'_>, method: MethodId, args: &BoundArguments) -> CallShape {
    let def = lowering.symbols.method(method);
    let by_ref_from_end = args.exprs.iter().enumerate().any(|(i, arg)| {
        let by_ref = def
            .params
            .get(args.parameter_of(i))
            .is_some_and(|p| lowering.symbols.param(*p).ref_kind != RefKind::None);
        by_ref && is_from_end_array_access(lowering, arg)
    });

    if by_ref_from_end {
        CallShape::ByRefFromEnd
    } else if args.has_names() || args.is_reordered() || !args.defaults.is_empty() {
        CallShape::Binding
    } else {
        CallShape::Positional
    }
}

/// An index that counts from the end, either `^i` or a value of type `Index`.
pub(super) fn is_from_end_index(lowering: &ExpressionLowering<'_>, index: &BoundExpr) -> bool {
    matches!(index.kind, ExprKind::FromEndIndex(_))
        || (index.ty.is_some() && index.ty == lowering.symbols.well_known(WellKnownType::Index))
}

fn is_from_end_array_access(lowering: &ExpressionLowering<'_>, arg: &BoundExpr) -> bool {
    match &arg.kind {
        ExprKind::ArrayAccess(access) => access.indices.iter().any(|i| is_from_end_index(lowering, i)),
        _ => false,
    }
}

/// `new T[] { tail... }` for the arguments packed into a `params` parameter.
fn pack_params(
    lowering: &mut ExpressionLowering<'_>,
    params_ty: Option<TypeId>,
    tail: Vec<BoundExpr>,
    span: Span,
) -> BoundExpr {
    let element = params_ty
        .and_then(|t| lowering.symbols.array_element(t))
        .unwrap_or_else(|| lowering.symbols.special(SpecialType::Object));
    let type_of = lowering.type_of(element, span);
    let items = lowering.expressions(tail, span);
    lowering.factory(FactoryType::Expression, "NewArrayInit", vec![type_of, items], span)
}

/// Lower positional arguments, packing an expanded `params` tail.
pub(super) fn lower_positional_args(
    lowering: &mut ExpressionLowering<'_>,
    method: MethodId,
    args: &BoundArguments,
    span: Span,
) -> Result<Vec<BoundExpr>> {
    let param_count = lowering.symbols.method(method).params.len();
    if !args.expanded || param_count == 0 {
        return lowering.lower_all(&args.exprs);
    }

    let fixed = (param_count - 1).min(args.len());
    let mut lowered = lowering.lower_all(&args.exprs[..fixed])?;
    let tail = lowering.lower_all(&args.exprs[fixed..])?;
    let params_ty = lowering.symbols.param_type(method, param_count - 1);
    lowered.push(pack_params(lowering, params_ty, tail, span));
    Ok(lowered)
}

/// Lower arguments as `CSharpExpression.Bind(parameter, value)` assignments.
pub(super) fn lower_binding_args(
    lowering: &mut ExpressionLowering<'_>,
    method: MethodId,
    args: &BoundArguments,
    span: Span,
) -> Result<Vec<BoundExpr>> {
    let params = lowering.symbols.method(method).params.clone();
    let params_index = if args.expanded { params.len().checked_sub(1) } else { None };

    let mut bindings = Vec::with_capacity(args.len());
    let mut tail = Vec::new();
    for (i, arg) in args.exprs.iter().enumerate() {
        if args.is_default(i) {
            continue;
        }
        let ordinal = args.parameter_of(i);
        if params_index.is_some_and(|p| ordinal >= p) {
            tail.push(lowering.lower_expr(arg)?);
            continue;
        }
        let Some(&param) = params.get(ordinal) else {
            return Err(LoweringError::Unhandled { node: "argument with no matching parameter", span: arg.span });
        };
        let value = lowering.lower_expr(arg)?;
        bindings.push(bind(lowering, param, value, arg.span));
    }

    if let Some(index) = params_index {
        let param = params[index];
        let params_ty = Some(lowering.symbols.param(param).ty);
        let packed = pack_params(lowering, params_ty, tail, span);
        bindings.push(bind(lowering, param, packed, span));
    }
    Ok(bindings)
}

fn bind(lowering: &mut ExpressionLowering<'_>, param: ParamId, value: BoundExpr, span: Span) -> BoundExpr {
    let info = lowering.parameter_info(param, span);
    lowering.factory(FactoryType::CSharpExpression, "Bind", vec![info, value], span)
}

/// Lower arguments positionally, keeping by-ref array accesses writable.
pub(super) fn lower_by_ref_args(
    lowering: &mut ExpressionLowering<'_>,
    method: MethodId,
    args: &BoundArguments,
) -> Result<Vec<BoundExpr>> {
    let params = lowering.symbols.method(method).params.clone();
    let mut lowered = Vec::with_capacity(args.len());
    for (i, arg) in args.exprs.iter().enumerate() {
        let by_ref = params
            .get(args.parameter_of(i))
            .is_some_and(|p| lowering.symbols.param(*p).ref_kind != RefKind::None);
        lowered.push(if by_ref { lowering.lower_lvalue(arg)? } else { lowering.lower_expr(arg)? });
    }
    Ok(lowered)
}

pub(super) fn lower_call(lowering: &mut ExpressionLowering<'_>, expr: &BoundExpr, call: &CallExpr) -> Result<BoundExpr> {
    let span = expr.span;
    let invoke = lowering.symbols.method(call.method).kind == MethodKind::DelegateInvoke;
    let receiver = lowering.lower_or_null(call.receiver.as_ref(), span)?;

    let (factory, args) = match call_shape(lowering, call.method, &call.args) {
        CallShape::Positional => {
            let args = lower_positional_args(lowering, call.method, &call.args, span)?;
            (FactoryType::Expression, lowering.expressions(args, span))
        }
        CallShape::Binding => {
            let bindings = lower_binding_args(lowering, call.method, &call.args, span)?;
            (
                FactoryType::CSharpExpression,
                lowering.array_of(WellKnownType::ParameterAssignment, bindings, span),
            )
        }
        CallShape::ByRefFromEnd => {
            let args = lower_by_ref_args(lowering, call.method, &call.args)?;
            (FactoryType::CSharpExpression, lowering.expressions(args, span))
        }
    };

    if invoke {
        Ok(lowering.factory(factory, "Invoke", vec![receiver, args], span))
    } else {
        let method = lowering.method_info(call.method, span);
        Ok(lowering.factory(factory, "Call", vec![receiver, method, args], span))
    }
}

// ============================================================================
// Delegate creation
// ============================================================================

pub(super) fn lower_delegate_creation(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    creation: &DelegateCreationExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let delegate = lowering.type_or_object(expr);
    let argument = &creation.argument;

    match &argument.kind {
        ExprKind::Lambda(lambda) => lambda::lower_lambda_as(lowering, span, lambda, Some(delegate)),
        ExprKind::MethodGroup(group) => {
            let method = creation
                .method
                .or_else(|| group.methods.first().copied())
                .ok_or(LoweringError::Unhandled { node: "empty method group", span })?;
            create_delegate(lowering, span, delegate, group.receiver.as_ref(), method)
        }
        _ => {
            // An existing delegate: bind the new one to its Invoke.
            let method = argument
                .ty
                .and_then(|t| lowering.symbols.delegate_invoke(t))
                .or(creation.method)
                .ok_or(LoweringError::Unhandled { node: "delegate creation from a non-delegate", span })?;
            create_delegate(lowering, span, delegate, Some(argument), method)
        }
    }
}

pub(super) fn lower_method_group_conversion(
    lowering: &mut ExpressionLowering<'_>,
    expr: &BoundExpr,
    operand: &BoundExpr,
) -> Result<BoundExpr> {
    let span = expr.span;
    let ExprKind::MethodGroup(group) = &operand.kind else {
        return Err(LoweringError::Unhandled { node: "method group conversion", span });
    };
    let method = group
        .methods
        .first()
        .copied()
        .ok_or(LoweringError::Unhandled { node: "empty method group", span })?;
    let delegate = lowering.type_or_object(expr);
    create_delegate(lowering, span, delegate, group.receiver.as_ref(), method)
}

/// Rewrite delegate creation as a reflection call and lower that instead:
/// `(D)method.CreateDelegate(typeof(D), target)` when available, otherwise
/// `(D)Delegate.CreateDelegate(typeof(D), target, method)`.
fn create_delegate(
    lowering: &mut ExpressionLowering<'_>,
    span: Span,
    delegate: TypeId,
    receiver: Option<&BoundExpr>,
    method: MethodId,
) -> Result<BoundExpr> {
    let object = lowering.symbols.special(SpecialType::Object);
    let target = match receiver {
        Some(receiver) if !lowering.symbols.method(method).is_static() => lowering.to_object(receiver.clone()),
        _ => BoundExpr::null(span, object),
    };
    let type_of = lowering.type_of(delegate, span);
    let method_node = lowering.method_info(method, span);
    let delegate_base = lowering.known(WellKnownType::Delegate);

    let call = if lowering.caps.has(lowering.symbols, Capability::MethodInfoCreateDelegate) {
        let owner = lowering.known(WellKnownType::MethodInfo);
        match lowering.symbols.find_methods(owner, "CreateDelegate").first().copied() {
            Some(create) => BoundExpr::call(span, Some(method_node), create, vec![type_of, target], Some(delegate_base)),
            None => return Ok(missing(lowering, WellKnownType::MethodInfo, span)),
        }
    } else {
        match lowering.symbols.find_methods(delegate_base, "CreateDelegate").first().copied() {
            Some(create) => BoundExpr::call(span, None, create, vec![type_of, target, method_node], Some(delegate_base)),
            None => return Ok(missing(lowering, WellKnownType::Delegate, span)),
        }
    };

    let mut converted = BoundExpr::convert(span, call, Conversion::new(ConversionKind::ExplicitReference), delegate);
    if let ExprKind::Conversion(c) = &mut converted.kind {
        c.explicit_cast = true;
    }
    lowering.lower_expr(&converted)
}

fn missing(lowering: &mut ExpressionLowering<'_>, owner: WellKnownType, span: Span) -> BoundExpr {
    lowering.record_missing(owner.name(), "CreateDelegate");
    let error = lowering.symbols.error_type();
    BoundExpr::bad(span, Vec::new(), Some(error))
}

pub(super) fn lower_indexer_args(
    lowering: &mut ExpressionLowering<'_>,
    getter: MethodId,
    args: &BoundArguments,
    span: Span,
) -> Result<(FactoryType, BoundExpr)> {
    match call_shape(lowering, getter, args) {
        CallShape::Positional => {
            let args = lower_positional_args(lowering, getter, args, span)?;
            Ok((FactoryType::Expression, lowering.expressions(args, span)))
        }
        CallShape::Binding | CallShape::ByRefFromEnd => {
            let bindings = lower_binding_args(lowering, getter, args, span)?;
            Ok((
                FactoryType::CSharpExpression,
                lowering.array_of(WellKnownType::ParameterAssignment, bindings, span),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exprtree_core::{Capabilities, ConstantValue, MethodFlags, SymbolTable};

    use crate::options::CompilerOptions;

    #[test]
    fn shape_follows_argument_binding() {
        let mut symbols = SymbolTable::new();
        let int = symbols.special(SpecialType::Int32);
        let class = symbols.declare_class("C", None);
        let method = symbols.declare_method("F", Some(class), int, MethodKind::Ordinary, MethodFlags::STATIC);
        symbols.add_parameter(method, "a", int);
        symbols.add_parameter(method, "b", int);

        let caps = Capabilities::new();
        let options = CompilerOptions::default();
        let lowering = ExpressionLowering::new(&mut symbols, &caps, &options);

        let arg = |v| BoundExpr::literal(Span::default(), ConstantValue::Int(v), Some(int));
        let mut args = BoundArguments::positional(vec![arg(1), arg(2)]);
        assert_eq!(call_shape(&lowering, method, &args), CallShape::Positional);

        args.args_to_params = Some(vec![1, 0]);
        assert_eq!(call_shape(&lowering, method, &args), CallShape::Binding);

        args.args_to_params = None;
        args.defaults = vec![1];
        assert_eq!(call_shape(&lowering, method, &args), CallShape::Binding);
    }
}
