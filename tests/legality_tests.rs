//! Integration tests for the legality pass.


use exprtree::core::bound::*;
use exprtree::core::factory_catalog::FactoryGrammar;
use exprtree::core::{
    ConstantValue, MethodFlags, MethodKind, RefKind, SpecialType, TypeFlags, TypeId, WellKnownType,
};
use exprtree::{Capability, CompilerOptions, DiagnosticCode, Severity};
use test_harness::*;

fn conditional(fx: &Fixture, consequence: BoundExpr, alternative: BoundExpr, ty: TypeId) -> BoundExpr {
    BoundExpr::new(
        sp(),
        Some(ty),
        ExprKind::Conditional(Box::new(ConditionalExpr { condition: bool_lit(fx, true), consequence, alternative })),
    )
}

fn tuple(fx: &Fixture, a: i64, b: i64, ty: TypeId) -> BoundExpr {
    BoundExpr::new(sp(), Some(ty), ExprKind::TupleLiteral(vec![int_lit(fx, a), int_lit(fx, b)]))
}

// =============================================================================
// Quoted regions
// =============================================================================

#[test]
fn every_tuple_literal_is_reported() {
    let mut fx = Fixture::new();
    let pair = fx.symbols.declare_struct("ValueTuple`2", TypeFlags::empty());
    let sig = fx.lambda(pair, &[]);
    let body = conditional(&fx, tuple(&fx, 1, 2, pair), tuple(&fx, 3, 4, pair), pair);
    let node = fx.quote_expr(&sig, body);

    let diagnostics = fx.check(&node);
    assert_eq!(diagnostics.count(DiagnosticCode::TupleLiteral), 2);
    assert_eq!(diagnostics.len(), 2);
}

#[test]
fn delegate_lambda_is_not_a_quoted_region() {
    let mut fx = Fixture::new();
    let pair = fx.symbols.declare_struct("ValueTuple`2", TypeFlags::empty());
    let sig = fx.lambda(pair, &[]);
    let body = block(Vec::new(), vec![ret(Some(tuple(&fx, 1, 2, pair)))]);
    let lambda = BoundExpr::new(
        sp(),
        Some(sig.delegate),
        ExprKind::Lambda(Box::new(LambdaExpr {
            symbol: sig.symbol,
            body,
            is_anonymous_method: false,
            is_expression_bodied: true,
        })),
    );

    let diagnostics = fx.check(&lambda);
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics.sorted());
}

#[test]
fn pointer_operations_reported_once_per_region() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let pointer = fx.symbols.pointer_to(int);
    let sig = fx.lambda(int, &[("p", pointer)]);
    let deref = |fx: &Fixture| {
        let operand = param(fx, sig.param(0));
        BoundExpr::new(sp(), Some(int), ExprKind::PointerIndirection(Box::new(operand)))
    };
    let body = conditional(&fx, deref(&fx), deref(&fx), int);
    let node = fx.quote_expr(&sig, body);

    let diagnostics = fx.check(&node);
    assert_eq!(diagnostics.count(DiagnosticCode::PointerOperation), 1);

    let statements = vec![expr_stmt(node.clone()), expr_stmt(node)];
    let diagnostics = fx.check_stmts(statements, CompilerOptions::default(), |_| {});
    assert_eq!(diagnostics.count(DiagnosticCode::PointerOperation), 2);
}

#[test]
fn async_lambda_is_rejected() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let sig = fx.lambda(int, &[]);
    fx.symbols.method_mut(sig.symbol).flags |= MethodFlags::ASYNC;
    let body = int_lit(&fx, 1);
    let node = fx.quote_expr(&sig, body);

    let diagnostics = fx.check(&node);
    assert_eq!(diagnostics.count(DiagnosticCode::AsyncLambda), 1);
}

#[test]
fn by_ref_parameter_is_named() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let sig = fx.lambda(int, &[("value", int)]);
    fx.symbols.param_mut(sig.param(0)).ref_kind = RefKind::Ref;
    let body = param(&fx, sig.param(0));
    let node = fx.quote_expr(&sig, body);

    let diagnostics = fx.check(&node);
    let sorted = diagnostics.into_sorted();
    assert_eq!(sorted.len(), 1);
    assert_eq!(sorted[0].code, DiagnosticCode::ByRefParameter);
    assert_eq!(sorted[0].args, vec!["value".to_string()]);
}

// =============================================================================
// Capabilities
// =============================================================================

#[test]
fn statement_body_follows_extended_capability() {
    let mut fx = Fixture::with_grammar(FactoryGrammar::STANDARD);
    let void = fx.void();
    let sig = fx.lambda(void, &[]);
    let node = fx.quote_block(&sig, block(Vec::new(), vec![stmt(StmtKind::Empty)]));

    let diagnostics = fx.check(&node);
    assert_eq!(diagnostics.count(DiagnosticCode::StatementBody), 1);

    let diagnostics = fx.check_with(&node, |compiler| {
        compiler.capabilities().assume(Capability::ExtendedExpressions, true);
    });
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics.sorted());
}

#[test]
fn named_argument_needs_extended_capability() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let class = fx.symbols.declare_class("Calc", None);
    let method = fx
        .symbols
        .declare_method("Half", Some(class), int, MethodKind::Ordinary, MethodFlags::STATIC);
    fx.symbols.add_parameter(method, "n", int);
    let sig = fx.lambda(int, &[]);
    let mut call = BoundExpr::call(sp(), None, method, vec![int_lit(&fx, 8)], Some(int));
    if let ExprKind::Call(c) = &mut call.kind {
        c.args.names = vec![Some("n".to_string())];
    }
    let node = fx.quote_expr(&sig, call);

    assert!(fx.check(&node).is_empty());

    let diagnostics = fx.check_with(&node, |compiler| {
        compiler.capabilities().assume(Capability::ExtendedExpressions, false);
    });
    assert_eq!(diagnostics.count(DiagnosticCode::NamedArgument), 1);
}

#[test]
fn index_valued_subscript_needs_extended_capability() {
    let mut fx = Fixture::with_grammar(FactoryGrammar::STANDARD);
    let int = fx.int();
    let index = fx.symbols.well_known(WellKnownType::Index).unwrap();
    let numbers = fx.symbols.array_of(int, 1);
    let sig = fx.lambda(int, &[("a", numbers), ("i", index), ("n", int)]);
    let element = |fx: &Fixture, slot: usize| {
        let access = ArrayAccessExpr { array: param(fx, sig.param(0)), indices: vec![param(fx, sig.param(slot))] };
        BoundExpr::new(sp(), Some(int), ExprKind::ArrayAccess(Box::new(access)))
    };

    // a[n] is an ordinary ArrayIndex
    let body = element(&fx, 2);
    let node = fx.quote_expr(&sig, body);
    assert!(fx.check(&node).is_empty());

    // a[i] with `i: System.Index`
    let body = element(&fx, 1);
    let node = fx.quote_expr(&sig, body);
    let diagnostics = fx.check(&node);
    assert_eq!(diagnostics.count(DiagnosticCode::IndexOrRange), 1);
    assert_eq!(diagnostics.len(), 1);

    // Take(ref a[i])
    let class = fx.symbols.declare_class("Slots", None);
    let take = fx
        .symbols
        .declare_method("Take", Some(class), int, MethodKind::Ordinary, MethodFlags::STATIC);
    let slot = fx.symbols.add_parameter(take, "slot", int);
    fx.symbols.param_mut(slot).ref_kind = RefKind::Ref;
    let mut call = BoundExpr::call(sp(), None, take, vec![element(&fx, 1)], Some(int));
    if let ExprKind::Call(c) = &mut call.kind {
        c.args.ref_kinds = vec![RefKind::Ref];
    }
    let node = fx.quote_expr(&sig, call);
    let diagnostics = fx.check(&node);
    assert_eq!(diagnostics.count(DiagnosticCode::IndexOrRange), 1);

    let diagnostics = fx.check_with(&node, |compiler| {
        compiler.capabilities().assume(Capability::ExtendedExpressions, true);
    });
    assert!(diagnostics.is_empty(), "unexpected: {:?}", diagnostics.sorted());
}

#[test]
fn dynamic_conversion_needs_dynamic_capability() {
    let mut fx = Fixture::with_grammar(FactoryGrammar::STANDARD | FactoryGrammar::EXTENDED);
    let int = fx.int();
    let dynamic = fx.symbols.dynamic_type();
    let captured = fx.outer_local("d", dynamic);
    let sig = fx.lambda(int, &[]);
    let body = BoundExpr::convert(
        sp(),
        local(&fx, captured),
        Conversion::new(ConversionKind::ExplicitDynamic),
        int,
    );
    let node = fx.quote_expr(&sig, body);

    let diagnostics = fx.check(&node);
    assert_eq!(diagnostics.count(DiagnosticCode::DynamicOperation), 1);
}

// =============================================================================
// Rules outside quoted regions
// =============================================================================

#[test]
fn self_assignment_warns_outside_regions() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let x = fx.outer_local("x", int);
    let assignment = BoundExpr::assign(sp(), local(&fx, x), local(&fx, x));

    let diagnostics = fx.check(&assignment);
    assert_eq!(diagnostics.count(DiagnosticCode::SelfAssignment), 1);
    assert!(!diagnostics.has_errors());
    assert_eq!(DiagnosticCode::SelfAssignment.severity(), Severity::Warning);

    let options = CompilerOptions::new().with_self_assignment_warning(false);
    let diagnostics = fx.check_stmts(vec![expr_stmt(assignment)], options, |_| {});
    assert!(diagnostics.is_empty());
}

#[test]
fn static_local_function_may_not_capture() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let captured = fx.outer_local("total", int);
    let function = fx.symbols.declare_method(
        "Helper",
        None,
        int,
        MethodKind::LocalFunction,
        MethodFlags::STATIC_LOCAL_FUNCTION,
    );
    fx.symbols.method_mut(function).owner = Some(fx.outer);
    let body = block(Vec::new(), vec![ret(Some(local(&fx, captured)))]);
    let statement = stmt(StmtKind::LocalFunction(Box::new(LocalFunctionStmt { symbol: function, body })));

    let diagnostics = fx.check_stmts(vec![statement], CompilerOptions::default(), |_| {});
    let sorted = diagnostics.into_sorted();
    assert_eq!(sorted.len(), 1);
    assert_eq!(sorted[0].code, DiagnosticCode::StaticLocalFunctionCapturesVariable);
    assert_eq!(sorted[0].args, vec!["total".to_string()]);
}

#[test]
fn deep_nesting_cancels_with_one_diagnostic() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let mut nested = int_lit(&fx, 0);
    for i in 0..64 {
        nested = conditional(&fx, int_lit(&fx, i), nested, int);
    }

    let options = CompilerOptions::new().with_max_recursion_depth(16);
    let diagnostics = fx.check_stmts(vec![expr_stmt(nested)], options, |_| {});
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.count(DiagnosticCode::RecursionTooDeep), 1);
}

#[test]
fn constant_literal_needs_nothing() {
    let mut fx = Fixture::with_grammar(FactoryGrammar::STANDARD);
    let string = fx.ty(SpecialType::String);
    let sig = fx.lambda(string, &[]);
    let body = BoundExpr::literal(sp(), ConstantValue::String("hi".to_string()), Some(string));
    let node = fx.quote_expr(&sig, body);

    assert!(fx.check(&node).is_empty());
}
