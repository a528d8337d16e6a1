//! Integration tests for lowering quoted lambdas into build-expressions.


use exprtree::core::bound::*;
use exprtree::core::factory_catalog::FactoryGrammar;
use exprtree::core::{
    ConstantValue, MethodFlags, MethodId, MethodKind, RefKind, SpecialType, TypeFlags, TypeId, WellKnownType,
};
use exprtree::{Capability, CompilerOptions, DiagnosticCode, LambdaOutcome};
use test_harness::*;

fn int_const(value: i64) -> Vec<Value> {
    vec![Value::Const(ConstantValue::Int(value)), Value::Type("System.Int32".to_string())]
}

fn type_value(name: &str) -> Value {
    Value::Type(name.to_string())
}

fn member(name: &str) -> Value {
    Value::Member(name.to_string())
}

fn string(value: &str) -> Value {
    Value::Const(ConstantValue::String(value.to_string()))
}

fn static_method(fx: &mut Fixture, owner: TypeId, name: &str, ret: TypeId, params: &[(&str, TypeId)]) -> MethodId {
    let method = fx
        .symbols
        .declare_method(name, Some(owner), ret, MethodKind::Ordinary, MethodFlags::STATIC);
    for (param, ty) in params {
        fx.symbols.add_parameter(method, *param, *ty);
    }
    method
}

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn literal_lambda_builds_constant() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let sig = fx.lambda(int, &[]);
    let body = int_lit(&fx, 42);
    let node = fx.quote_expr(&sig, body);

    let built = fx.build(&node);
    assert!(built.temps.is_empty(), "no prologue expected: {:?}", built.temps);
    let body = built.body();
    assert!(body.is("Expression.Constant"));
    assert_eq!(body.args(), int_const(42).as_slice());
    assert_eq!(built.root.arg(1), &Value::Array(Vec::new()));
}

#[test]
fn parameter_is_hoisted_and_shared() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let sig = fx.lambda(int, &[("x", int)]);
    let sum = binary(BinaryOperatorKind::Add, param(&fx, sig.param(0)), int_lit(&fx, 1), int);
    let node = fx.quote_expr(&sig, sum);

    let built = fx.build(&node);
    let params = built.root.arg(1).items();
    assert_eq!(params.len(), 1);
    let x = &params[0];
    assert_eq!(
        built.init(x),
        &Value::Node {
            factory: "Expression.Parameter".to_string(),
            args: vec![Value::Type("System.Int32".to_string()), Value::Const(ConstantValue::String("x".to_string()))],
        }
    );

    let add = built.body();
    assert!(add.is("Expression.Add"));
    assert_eq!(add.arg(0), x);
    assert_eq!(add.arg(1).args(), int_const(1).as_slice());
}

#[test]
fn enum_arithmetic_is_promoted_and_converted_back() {
    let mut fx = Fixture::new();
    let color = fx.symbols.declare_enum("Color", SpecialType::Int32);
    let sig = fx.lambda(color, &[("c", color)]);
    let op = BinaryOperator::with(BinaryOperatorKind::Add, OperatorFlags::ENUM_AND_UNDERLYING);
    let sum = binary_with(op, param(&fx, sig.param(0)), int_lit(&fx, 1), color);
    let node = fx.quote_expr(&sig, sum);

    let built = fx.build(&node);
    let result = built.body();
    assert!(result.is("Expression.Convert"));
    assert_eq!(result.arg(1), &Value::Type("Color".to_string()));

    let add = result.arg(0);
    assert!(add.is("Expression.Add"));
    let left = add.arg(0);
    assert!(left.is("Expression.Convert"));
    assert_eq!(left.arg(1), &Value::Type("System.Int32".to_string()));
    assert!(add.arg(1).is("Expression.Constant"));
}

#[test]
fn enum_literal_is_retyped_not_converted() {
    let mut fx = Fixture::new();
    let color = fx.symbols.declare_enum("Color", SpecialType::Int32);
    let boolean = fx.boolean();
    let sig = fx.lambda(boolean, &[("c", color)]);
    let red = BoundExpr::literal(sp(), ConstantValue::Int(1), Some(color));
    let op = BinaryOperator::with(BinaryOperatorKind::Equal, OperatorFlags::ENUM);
    let test = binary_with(op, param(&fx, sig.param(0)), red, boolean);
    let node = fx.quote_expr(&sig, test);

    let built = fx.build(&node);
    let equal = built.body();
    assert!(equal.is("Expression.Equal"), "comparison result stays bool: {equal:?}");
    assert!(equal.arg(0).is("Expression.Convert"));
    let right = equal.arg(1);
    assert!(right.is("Expression.Constant"));
    assert_eq!(right.args(), int_const(1).as_slice());
}

#[test]
fn enum_difference_converts_back_to_underlying_result() {
    let mut fx = Fixture::new();
    let flags = fx.symbols.declare_enum("Flags", SpecialType::Byte);
    let byte = fx.ty(SpecialType::Byte);
    let sig = fx.lambda(byte, &[("a", flags), ("b", flags)]);
    let op = BinaryOperator::with(BinaryOperatorKind::Subtract, OperatorFlags::ENUM);
    let difference = binary_with(op, param(&fx, sig.param(0)), param(&fx, sig.param(1)), byte);
    let node = fx.quote_expr(&sig, difference);

    let built = fx.build(&node);
    let result = built.body();
    assert!(result.is("Expression.Convert"), "byte result is narrowed from int: {result:?}");
    assert_eq!(result.arg(1), &type_value("System.Byte"));

    let subtract = result.arg(0);
    assert!(subtract.is("Expression.Subtract"));
    for operand in subtract.args() {
        assert!(operand.is("Expression.Convert"));
        assert_eq!(operand.arg(1), &type_value("System.Int32"));
    }
}

#[test]
fn checked_enum_sum_converts_back_checked() {
    let mut fx = Fixture::new();
    let color = fx.symbols.declare_enum("Color", SpecialType::Int32);
    let sig = fx.lambda(color, &[("c", color)]);
    let op = BinaryOperator::with(
        BinaryOperatorKind::Add,
        OperatorFlags::ENUM_AND_UNDERLYING | OperatorFlags::CHECKED,
    );
    let sum = binary_with(op, param(&fx, sig.param(0)), int_lit(&fx, 1), color);
    let node = fx.quote_expr(&sig, sum);

    let built = fx.build(&node);
    let result = built.body();
    assert!(result.is("Expression.ConvertChecked"), "got {result:?}");
    assert_eq!(result.arg(1), &type_value("Color"));
    let add = result.arg(0);
    assert!(add.is("Expression.AddChecked"));
    assert!(add.arg(0).is("Expression.Convert"));
    assert_eq!(add.arg(1).args(), int_const(1).as_slice());
}

#[test]
fn long_left_operator_chain_lowers_within_default_depth() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let sig = fx.lambda(int, &[("x", int)]);
    let mut chain = param(&fx, sig.param(0));
    for i in 0..500 {
        chain = binary(BinaryOperatorKind::Add, chain, int_lit(&fx, i), int);
    }
    let node = fx.quote_expr(&sig, chain);

    let built = fx.build(&node);
    assert_eq!(built.count("Expression.Add"), 500);

    let mut current = built.body();
    let mut terms = Vec::new();
    while current.is("Expression.Add") {
        terms.push(current.arg(1).arg(0).clone());
        current = current.arg(0);
    }
    assert_eq!(current, &built.root.arg(1).items()[0], "innermost operand is x");
    terms.reverse();
    assert_eq!(terms.first(), Some(&Value::Const(ConstantValue::Int(0))));
    assert_eq!(terms.last(), Some(&Value::Const(ConstantValue::Int(499))));
}

#[test]
fn captured_outer_local_is_a_constant() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let captured = fx.outer_local("count", int);
    let sig = fx.lambda(int, &[]);
    let body = local(&fx, captured);
    let node = fx.quote_expr(&sig, body);

    let built = fx.build(&node);
    let constant = built.body();
    assert!(constant.is("Expression.Constant"));
    assert_eq!(constant.arg(0), &Value::Outer("count".to_string()));
}

#[test]
fn conditional_access_reads_the_receiver_placeholder() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let shape = fx.symbols.declare_class("Shape", None);
    let length = fx.symbols.declare_property(shape, "Length", int, false);
    let nullable = fx.symbols.nullable_of(int);
    let sig = fx.lambda(nullable, &[("s", shape)]);

    let placeholder = BoundExpr::new(sp(), Some(shape), ExprKind::ConditionalReceiver { id: 7 });
    let access = BoundExpr::new(
        sp(),
        Some(int),
        ExprKind::PropertyAccess(Box::new(PropertyAccessExpr { receiver: Some(placeholder), property: length })),
    );
    let conditional = BoundExpr::new(
        sp(),
        Some(nullable),
        ExprKind::ConditionalAccess(Box::new(ConditionalAccessExpr {
            receiver: param(&fx, sig.param(0)),
            access,
            receiver_id: 7,
        })),
    );
    let node = fx.quote_expr(&sig, conditional);

    let built = fx.build(&node);
    let access = built.body();
    assert!(access.is("CSharpExpression.ConditionalAccess"));
    let receiver = access.arg(1);
    assert!(built.init(receiver).is("CSharpExpression.ConditionalReceiver"));
    assert_eq!(built.init(receiver).arg(0), &Value::Type("Shape".to_string()));

    let property = access.arg(2);
    assert!(property.is("Expression.Property"));
    assert_eq!(property.arg(0), receiver);
    assert_eq!(property.arg(1), &Value::Member("get_Length".to_string()));
}

#[test]
fn named_arguments_bind_parameters() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let class = fx.symbols.declare_class("Calc", None);
    let method = fx
        .symbols
        .declare_method("Sum", Some(class), int, MethodKind::Ordinary, MethodFlags::STATIC);
    fx.symbols.add_parameter(method, "a", int);
    fx.symbols.add_parameter(method, "b", int);
    let sig = fx.lambda(int, &[]);

    let mut call = BoundExpr::call(sp(), None, method, vec![int_lit(&fx, 2), int_lit(&fx, 1)], Some(int));
    if let ExprKind::Call(c) = &mut call.kind {
        c.args.names = vec![Some("b".to_string()), Some("a".to_string())];
        c.args.args_to_params = Some(vec![1, 0]);
    }
    let node = fx.quote_expr(&sig, call);

    let built = fx.build(&node);
    let call = built.body();
    assert!(call.is("CSharpExpression.Call"));
    assert_eq!(call.arg(0), &Value::Null);
    assert_eq!(call.arg(1), &Value::Member("Sum".to_string()));
    let bindings = call.arg(2).items();
    assert_eq!(bindings.len(), 2);
    assert!(bindings.iter().all(|b| b.is("CSharpExpression.Bind")));
    assert_eq!(bindings[0].arg(0), &Value::Member("b".to_string()));
    assert_eq!(bindings[0].arg(1).args(), int_const(2).as_slice());
    assert_eq!(bindings[1].arg(0), &Value::Member("a".to_string()));
}

#[test]
fn positional_call_uses_standard_factory() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let class = fx.symbols.declare_class("Calc", None);
    let method = fx
        .symbols
        .declare_method("Twice", Some(class), int, MethodKind::Ordinary, MethodFlags::empty());
    fx.symbols.add_parameter(method, "n", int);
    let sig = fx.lambda(int, &[("calc", class)]);

    let call = BoundExpr::call(sp(), Some(param(&fx, sig.param(0))), method, vec![int_lit(&fx, 3)], Some(int));
    let node = fx.quote_expr(&sig, call);

    let built = fx.build(&node);
    let call = built.body();
    assert!(call.is("Expression.Call"));
    assert_eq!(call.arg(0), &built.root.arg(1).items()[0]);
    assert_eq!(call.arg(2).items().len(), 1);
}

#[test]
fn void_expression_lambda_is_the_bare_call() {
    let mut fx = Fixture::new();
    let (int, void) = (fx.int(), fx.void());
    let log = fx.symbols.declare_class("Log", None);
    let write = static_method(&mut fx, log, "Write", void, &[("n", int)]);
    let sig = fx.lambda(void, &[("x", int)]);
    let call = BoundExpr::call(sp(), None, write, vec![param(&fx, sig.param(0))], Some(void));
    let node = fx.quote_void_expr(&sig, call);

    let built = fx.build(&node);
    let call = built.body();
    assert!(call.is("Expression.Call"), "got {call:?}");
    assert_eq!(call.arg(1), &member("Write"));
    assert_eq!(built.count("Expression.Block"), 0);
    assert_eq!(built.count("Expression.Label"), 0);
}

// =============================================================================
// Creation and initializers
// =============================================================================

fn new_object(ty: TypeId, ctor: MethodId, initializer: Option<BoundExpr>) -> BoundExpr {
    BoundExpr::new(
        sp(),
        Some(ty),
        ExprKind::ObjectCreation(Box::new(ObjectCreationExpr {
            constructor: Some(ctor),
            args: BoundArguments::positional(Vec::new()),
            initializer,
        })),
    )
}

fn initialize(member: InitializerMember, ty: TypeId, value: BoundExpr) -> BoundExpr {
    let target = BoundExpr::new(
        sp(),
        Some(ty),
        ExprKind::ObjectInitializerMember(Box::new(InitializerMemberExpr { member, args: Vec::new() })),
    );
    BoundExpr::assign(sp(), target, value)
}

fn add_element(add_method: MethodId, arg: BoundExpr, void: TypeId) -> BoundExpr {
    BoundExpr::new(
        sp(),
        Some(void),
        ExprKind::CollectionElementInitializer(Box::new(CollectionElementExpr { add_method, args: vec![arg] })),
    )
}

#[test]
fn multidimensional_initializer_is_flattened_row_major() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let grid = fx.symbols.array_of(int, 2);
    let sig = fx.lambda(grid, &[("x", int)]);
    let row = |items: Vec<BoundExpr>| BoundExpr::new(sp(), None, ExprKind::ArrayInitialization(items));
    let initializer = row(vec![
        row(vec![param(&fx, sig.param(0)), int_lit(&fx, 1), int_lit(&fx, 2)]),
        row(vec![int_lit(&fx, 3), int_lit(&fx, 4), int_lit(&fx, 5)]),
    ]);
    let creation = BoundExpr::new(
        sp(),
        Some(grid),
        ExprKind::ArrayCreation(Box::new(ArrayCreationExpr {
            bounds: vec![int_lit(&fx, 2), int_lit(&fx, 3)],
            initializer: Some(initializer),
        })),
    );
    let node = fx.quote_expr(&sig, creation);

    let built = fx.build(&node);
    let init = built.body();
    assert!(init.is("CSharpExpression.NewMultidimensionalArrayInit"), "got {init:?}");
    assert_eq!(init.arg(0), &type_value("System.Int32"));
    assert_eq!(
        init.arg(1).items(),
        &[Value::Const(ConstantValue::Int(2)), Value::Const(ConstantValue::Int(3))]
    );

    let items = init.arg(2).items();
    assert_eq!(items.len(), 6);
    assert_eq!(&items[0], &built.root.arg(1).items()[0]);
    for (item, value) in items[1..].iter().zip(1..) {
        assert_eq!(item.args(), int_const(value).as_slice());
    }
}

#[test]
fn object_and_collection_initializers_use_core_bindings() {
    let mut fx = Fixture::with_grammar(FactoryGrammar::STANDARD);
    let (int, void) = (fx.int(), fx.void());
    let tags = fx.symbols.declare_class("TagList", None);
    let tags_ctor = fx
        .symbols
        .declare_method(".ctor", Some(tags), void, MethodKind::Constructor, MethodFlags::empty());
    let add = fx
        .symbols
        .declare_method("Add", Some(tags), void, MethodKind::Ordinary, MethodFlags::empty());
    fx.symbols.add_parameter(add, "tag", int);
    let rect = fx.symbols.declare_class("Rect", None);
    let width = fx.symbols.declare_field(rect, "Width", int, false);
    let widget = fx.symbols.declare_class("Widget", None);
    let ctor = fx
        .symbols
        .declare_method(".ctor", Some(widget), void, MethodKind::Constructor, MethodFlags::empty());
    let count = fx.symbols.declare_field(widget, "Count", int, false);
    let size = fx.symbols.declare_property(widget, "Size", int, true);
    let bounds = fx.symbols.declare_property(widget, "Bounds", rect, false);
    let labels = fx.symbols.declare_property(widget, "Tags", tags, false);
    let sig = fx.lambda(widget, &[("x", int)]);

    // new Widget { Count = x, Size = 2, Bounds = { Width = 3 }, Tags = { x, 4 } }
    let x = param(&fx, sig.param(0));
    let nested = BoundExpr::new(
        sp(),
        Some(rect),
        ExprKind::ObjectInitializer(vec![initialize(InitializerMember::Field(width), int, int_lit(&fx, 3))]),
    );
    let elements = BoundExpr::new(
        sp(),
        Some(tags),
        ExprKind::CollectionInitializer(vec![add_element(add, x.clone(), void), add_element(add, int_lit(&fx, 4), void)]),
    );
    let members = BoundExpr::new(
        sp(),
        Some(widget),
        ExprKind::ObjectInitializer(vec![
            initialize(InitializerMember::Field(count), int, x),
            initialize(InitializerMember::Property(size), int, int_lit(&fx, 2)),
            initialize(InitializerMember::Property(bounds), rect, nested),
            initialize(InitializerMember::Property(labels), tags, elements),
        ]),
    );
    let node = fx.quote_expr(&sig, new_object(widget, ctor, Some(members)));

    let built = fx.build(&node);
    let x = &built.root.arg(1).items()[0];
    let init = built.body();
    assert!(init.is("Expression.MemberInit"), "got {init:?}");
    let new = init.arg(0);
    assert!(new.is("Expression.New"));
    assert_eq!(new.arg(0), &member(".ctor"));

    let bindings = init.arg(1).items();
    assert_eq!(bindings.len(), 4);
    assert!(bindings[0].is("Expression.Bind"));
    assert_eq!(bindings[0].args(), &[member("Count"), x.clone()]);
    assert!(bindings[1].is("Expression.Bind"));
    assert_eq!(bindings[1].arg(0), &member("set_Size"));

    assert!(bindings[2].is("Expression.MemberBind"));
    assert_eq!(bindings[2].arg(0), &member("get_Bounds"));
    let inner = bindings[2].arg(1).items();
    assert!(inner[0].is("Expression.Bind"));
    assert_eq!(inner[0].arg(0), &member("Width"));

    assert!(bindings[3].is("Expression.ListBind"));
    assert_eq!(bindings[3].arg(0), &member("get_Tags"));
    let inits = bindings[3].arg(1).items();
    assert_eq!(inits.len(), 2);
    assert!(inits.iter().all(|i| i.is("Expression.ElementInit") && i.arg(0) == &member("Add")));
    assert_eq!(inits[0].arg(1).items(), std::slice::from_ref(x));

    // new TagList { 1, 2 }
    let sig = fx.lambda(tags, &[]);
    let elements = BoundExpr::new(
        sp(),
        Some(tags),
        ExprKind::CollectionInitializer(vec![
            add_element(add, int_lit(&fx, 1), void),
            add_element(add, int_lit(&fx, 2), void),
        ]),
    );
    let node = fx.quote_expr(&sig, new_object(tags, tags_ctor, Some(elements)));

    let built = fx.build(&node);
    let list = built.body();
    assert!(list.is("Expression.ListInit"), "got {list:?}");
    assert!(list.arg(0).is("Expression.New"));
    let inits = list.arg(1).items();
    assert_eq!(inits.len(), 2);
    assert_eq!(inits[1].arg(1).items()[0].args(), int_const(2).as_slice());
}

// =============================================================================
// Lambdas, calls and conversions
// =============================================================================

#[test]
fn nested_expression_lambda_is_quoted() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let inner = fx.lambda(int, &[("y", int)]);
    let inner_tree = fx.symbols.expression_tree_of(inner.delegate);
    let outer = fx.lambda(inner_tree, &[("x", int)]);
    fx.symbols.method_mut(inner.symbol).owner = Some(outer.symbol);

    // x => y => x + y
    let sum = binary(BinaryOperatorKind::Add, param(&fx, outer.param(0)), param(&fx, inner.param(0)), int);
    let quoted = fx.quote_expr(&inner, sum);
    let node = fx.quote_expr(&outer, quoted);

    let built = fx.build(&node);
    let quote = built.body();
    assert!(quote.is("Expression.Quote"), "got {quote:?}");
    let lambda = quote.arg(0);
    assert!(lambda.is("Expression.Lambda"));

    let x = &built.root.arg(1).items()[0];
    let y = &lambda.arg(1).items()[0];
    assert_ne!(x, y);
    assert_eq!(built.init(y).arg(1), &string("y"));
    let add = lambda.arg(0);
    assert!(add.is("Expression.Add"));
    assert_eq!(add.args(), &[x.clone(), y.clone()]);
}

#[test]
fn by_ref_from_end_argument_uses_single_extended_call() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let index = fx.symbols.well_known(WellKnownType::Index).unwrap();
    let numbers = fx.symbols.array_of(int, 1);
    let slots = fx.symbols.declare_class("Slots", None);
    let take = static_method(&mut fx, slots, "Take", int, &[("slot", int)]);
    let slot = fx.symbols.method(take).params[0];
    fx.symbols.param_mut(slot).ref_kind = RefKind::Ref;
    let sig = fx.lambda(int, &[("a", numbers)]);

    // a => Take(ref a[^1])
    let from_end = BoundExpr::new(sp(), Some(index), ExprKind::FromEndIndex(Box::new(int_lit(&fx, 1))));
    let access = BoundExpr::new(
        sp(),
        Some(int),
        ExprKind::ArrayAccess(Box::new(ArrayAccessExpr { array: param(&fx, sig.param(0)), indices: vec![from_end] })),
    );
    let mut call = BoundExpr::call(sp(), None, take, vec![access], Some(int));
    if let ExprKind::Call(c) = &mut call.kind {
        c.args.ref_kinds = vec![RefKind::Ref];
    }
    let node = fx.quote_expr(&sig, call);

    let built = fx.build(&node);
    let call = built.body();
    assert!(call.is("CSharpExpression.Call"), "got {call:?}");
    assert_eq!(built.count("CSharpExpression.Call"), 1);
    assert_eq!(built.count("Expression.Block"), 0);
    assert_eq!(call.arg(1), &member("Take"));

    let args = call.arg(2).items();
    assert_eq!(args.len(), 1);
    let access = &args[0];
    assert!(access.is("CSharpExpression.ArrayAccess"));
    assert_eq!(access.arg(0), &built.root.arg(1).items()[0]);
    let index = &access.arg(1).items()[0];
    assert!(index.is("CSharpExpression.FromEndIndex"));
    assert_eq!(index.arg(0).args(), int_const(1).as_slice());
}

#[test]
fn user_defined_and_nullable_conversions() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let long = fx.ty(SpecialType::Int64);
    let celsius = fx.symbols.declare_struct("Celsius", TypeFlags::empty());
    let to_int = fx
        .symbols
        .declare_method("op_Implicit", Some(celsius), int, MethodKind::Conversion, MethodFlags::STATIC);
    fx.symbols.add_parameter(to_int, "c", celsius);

    // (Celsius c) => (int)c
    let sig = fx.lambda(int, &[("c", celsius)]);
    let body = BoundExpr::convert(sp(), param(&fx, sig.param(0)), Conversion::user_defined(to_int, false), int);
    let node = fx.quote_expr(&sig, body);
    let built = fx.build(&node);
    let convert = built.body();
    assert!(convert.is("Expression.Convert"));
    assert_eq!(
        convert.args(),
        &[built.root.arg(1).items()[0].clone(), type_value("System.Int32"), member("op_Implicit")]
    );

    // (Celsius? c) => (int?)c, lifted over the nullable operand
    let (nullable_celsius, nullable_int) = (fx.symbols.nullable_of(celsius), fx.symbols.nullable_of(int));
    let sig = fx.lambda(nullable_int, &[("c", nullable_celsius)]);
    let body = BoundExpr::convert(
        sp(),
        param(&fx, sig.param(0)),
        Conversion::user_defined(to_int, false),
        nullable_int,
    );
    let node = fx.quote_expr(&sig, body);
    let built = fx.build(&node);
    let convert = built.body();
    assert!(convert.is("Expression.Convert"));
    assert_eq!(convert.arg(0), &built.root.arg(1).items()[0], "operand is already nullable");
    assert_eq!(convert.arg(1), &type_value("System.Int32?"));
    assert_eq!(convert.arg(2), &member("op_Implicit"));

    // (int x) => (long?)x goes through long first
    let nullable_long = fx.symbols.nullable_of(long);
    let sig = fx.lambda(nullable_long, &[("x", int)]);
    let body = BoundExpr::convert(
        sp(),
        param(&fx, sig.param(0)),
        Conversion::new(ConversionKind::ImplicitNullable),
        nullable_long,
    );
    let node = fx.quote_expr(&sig, body);
    let built = fx.build(&node);
    let outer = built.body();
    assert!(outer.is("Expression.Convert"));
    assert_eq!(outer.arg(1), &type_value("System.Int64?"));
    let inner = outer.arg(0);
    assert!(inner.is("Expression.Convert"));
    assert_eq!(inner.args(), &[built.root.arg(1).items()[0].clone(), type_value("System.Int64")]);
}

#[test]
fn compound_assignment_carries_conversion_lambdas() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let celsius = fx.symbols.declare_struct("Celsius", TypeFlags::empty());
    let to_int = fx
        .symbols
        .declare_method("op_Implicit", Some(celsius), int, MethodKind::Conversion, MethodFlags::STATIC);
    fx.symbols.add_parameter(to_int, "c", celsius);
    let from_int = fx
        .symbols
        .declare_method("op_Explicit", Some(celsius), celsius, MethodKind::Conversion, MethodFlags::STATIC);
    fx.symbols.add_parameter(from_int, "n", int);
    let sig = fx.lambda(celsius, &[("c", celsius), ("x", int)]);

    // (c, x) => c += x, computed in int
    let compound = BoundExpr::new(
        sp(),
        Some(celsius),
        ExprKind::CompoundAssignment(Box::new(CompoundAssignmentExpr {
            op: BinaryOperator::new(BinaryOperatorKind::Add),
            target: param(&fx, sig.param(0)),
            value: param(&fx, sig.param(1)),
            method: None,
            operator_type: int,
            left_conversion: Conversion::user_defined(to_int, false),
            final_conversion: Conversion::user_defined(from_int, true),
        })),
    );
    let node = fx.quote_expr(&sig, compound);

    let built = fx.build(&node);
    let params = built.root.arg(1).items();
    let assign = built.body();
    assert!(assign.is("CSharpStatement.AddAssign"), "got {assign:?}");
    assert_eq!(assign.arg(0), &params[0]);
    assert_eq!(assign.arg(1), &params[1]);
    assert_eq!(assign.arg(2), &Value::Null);

    let check_lambda = |lambda: &Value, from: &str, to: &str, method: &str| {
        assert!(lambda.is("Expression.Lambda"), "got {lambda:?}");
        let p = &lambda.arg(1).items()[0];
        assert_eq!(built.init(p).args(), &[type_value(from), string("p")]);
        let convert = lambda.arg(0);
        assert!(convert.is("Expression.Convert"));
        assert_eq!(convert.args(), &[p.clone(), type_value(to), member(method)]);
    };
    check_lambda(assign.arg(3), "System.Int32", "Celsius", "op_Explicit");
    check_lambda(assign.arg(4), "Celsius", "System.Int32", "op_Implicit");
}

#[test]
fn delegate_creation_prefers_method_info_create_delegate() {
    let grammars = [
        FactoryGrammar::all(),
        FactoryGrammar::STANDARD | FactoryGrammar::EXTENDED | FactoryGrammar::DYNAMIC,
    ];
    for (grammar, on_method_info) in grammars.into_iter().zip([true, false]) {
        let mut fx = Fixture::with_grammar(grammar);
        let (int, void) = (fx.int(), fx.void());
        let notify = fx.symbols.declare_delegate("Notify", void, &[("n", int)]);
        let handlers = fx.symbols.declare_class("Handlers", None);
        let on_tick = static_method(&mut fx, handlers, "OnTick", void, &[("n", int)]);
        let sig = fx.lambda(notify, &[]);

        // () => new Notify(Handlers.OnTick)
        let group = BoundExpr::new(
            sp(),
            None,
            ExprKind::MethodGroup(Box::new(MethodGroupExpr { receiver: None, methods: vec![on_tick] })),
        );
        let creation = BoundExpr::new(
            sp(),
            Some(notify),
            ExprKind::DelegateCreation(Box::new(DelegateCreationExpr { argument: group, method: Some(on_tick) })),
        );
        let node = fx.quote_expr(&sig, creation);

        let built = fx.build(&node);
        let convert = built.body();
        assert!(convert.is("Expression.Convert"));
        assert_eq!(convert.arg(1), &type_value("Notify"));
        let call = convert.arg(0);
        assert!(call.is("Expression.Call"));
        assert_eq!(call.arg(1), &member("CreateDelegate"));

        let method = vec![member("OnTick"), type_value("System.Reflection.MethodInfo")];
        let args = call.arg(2).items();
        assert_eq!(args[0].args(), &[type_value("Notify"), type_value("System.Type")]);
        assert_eq!(args[1].args(), &[Value::Null, type_value("System.Object")]);
        if on_method_info {
            assert_eq!(call.arg(0).args(), method.as_slice());
            assert_eq!(args.len(), 2);
        } else {
            assert_eq!(call.arg(0), &Value::Null);
            assert_eq!(args.len(), 3);
            assert_eq!(args[2].args(), method.as_slice());
        }
    }
}

#[test]
fn dynamic_invocation_flags_each_argument() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let dynamic = fx.symbols.dynamic_type();
    let sig = fx.lambda(dynamic, &[("d", dynamic), ("x", int)]);

    // (d, x) => d.Run(x, count: 3, ref d), in a checked context
    let receiver = param(&fx, sig.param(0));
    let args = vec![
        DynamicArgument::positional(param(&fx, sig.param(1))),
        DynamicArgument { expr: int_lit(&fx, 3), name: Some("count".to_string()), ref_kind: RefKind::None },
        DynamicArgument { expr: param(&fx, sig.param(0)), name: None, ref_kind: RefKind::Ref },
    ];
    let invoke = BoundExpr::new(
        sp(),
        Some(dynamic),
        ExprKind::Dynamic(Box::new(DynamicExpr {
            operation: DynamicOperation::InvokeMember { receiver, name: "Run".to_string(), args },
            flags: BinderFlags::CHECKED_CONTEXT,
        })),
    );
    let node = fx.quote_expr(&sig, invoke);

    let built = fx.build(&node);
    let params = built.root.arg(1).items();
    let invoke = built.body();
    assert!(invoke.is("DynamicCSharpExpression.DynamicInvokeMember"), "got {invoke:?}");
    assert_eq!(invoke.arg(0), &params[0]);
    assert_eq!(invoke.arg(1), &string("Run"));
    assert_eq!(invoke.arg(3), &Value::Const(ConstantValue::Int(1)));

    let args = invoke.arg(2).items();
    assert!(args.iter().all(|a| a.is("DynamicCSharpExpression.DynamicArgument")));
    let flag = |f: ArgumentFlags| Value::Const(ConstantValue::Int(i64::from(f.bits())));

    assert_eq!(args[0].args(), &[params[1].clone(), Value::Null, flag(ArgumentFlags::USE_COMPILE_TIME_TYPE)]);
    assert_eq!(args[1].arg(0).args(), int_const(3).as_slice());
    assert_eq!(args[1].arg(1), &string("count"));
    assert_eq!(
        args[1].arg(2),
        &flag(ArgumentFlags::USE_COMPILE_TIME_TYPE | ArgumentFlags::CONSTANT | ArgumentFlags::NAMED_ARGUMENT)
    );
    assert_eq!(args[2].args(), &[params[0].clone(), Value::Null, flag(ArgumentFlags::IS_REF)]);
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn empty_block_lowers_to_empty() {
    let mut fx = Fixture::new();
    let void = fx.void();
    let sig = fx.lambda(void, &[]);
    let node = fx.quote_block(&sig, block(Vec::new(), Vec::new()));

    let built = fx.build(&node);
    assert!(built.body().is("Expression.Empty"));
}

#[test]
fn sibling_blocks_get_distinct_variables() {
    let mut fx = Fixture::new();
    let (int, void) = (fx.int(), fx.void());
    let sig = fx.lambda(void, &[]);
    let first = fx.local(&sig, "a", int);
    let second = fx.local(&sig, "a", int);
    let body = block(
        Vec::new(),
        vec![
            stmt(StmtKind::Block(block(vec![first], vec![declare(first, int_lit(&fx, 1))]))),
            stmt(StmtKind::Block(block(vec![second], vec![declare(second, int_lit(&fx, 2))]))),
        ],
    );
    let node = fx.quote_block(&sig, body);

    let built = fx.build(&node);
    let outer = built.body();
    assert!(outer.is("Expression.Block"));
    let inner = outer.arg(2).items();
    assert_eq!(inner.len(), 2);

    let mut variables = Vec::new();
    for (block, value) in inner.iter().zip([1, 2]) {
        assert!(block.is("Expression.Block"));
        let variable = &block.arg(1).items()[0];
        assert!(built.init(variable).is("Expression.Variable"));
        let assign = &block.arg(2).items()[0];
        assert!(assign.is("CSharpStatement.Assign"));
        assert_eq!(assign.arg(0), variable);
        assert_eq!(assign.arg(1).args(), int_const(value).as_slice());
        variables.push(variable.temp());
    }
    assert_ne!(variables[0], variables[1]);
}

#[test]
fn goto_and_label_share_one_target() {
    let mut fx = Fixture::new();
    let void = fx.void();
    let sig = fx.lambda(void, &[]);
    let label = fx.label("done");
    let body = block(
        Vec::new(),
        vec![stmt(StmtKind::Goto(label)), stmt(StmtKind::Goto(label)), stmt(StmtKind::Label(label))],
    );
    let node = fx.quote_block(&sig, body);

    let built = fx.build(&node);
    let statements = built.body().arg(2).items();
    assert!(statements[0].is("Expression.Goto"));
    assert!(statements[1].is("Expression.Goto"));
    assert!(statements[2].is("Expression.Label"));
    let target = statements[0].arg(0);
    assert_eq!(statements[1].arg(0), target);
    assert_eq!(statements[2].arg(0), target);

    let creations: Vec<_> = built
        .calls("Expression.Label")
        .into_iter()
        .filter(|call| call.args().len() == 2)
        .collect();
    assert_eq!(creations.len(), 1);
    assert_eq!(
        creations[0].args(),
        &[Value::Type("System.Void".to_string()), Value::Const(ConstantValue::String("done".to_string()))]
    );
}

#[test]
fn early_return_targets_the_return_label() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let sig = fx.lambda(int, &[("x", int)]);
    let condition = binary(BinaryOperatorKind::GreaterThan, param(&fx, sig.param(0)), int_lit(&fx, 0), fx.boolean());
    let body = block(
        Vec::new(),
        vec![
            stmt(StmtKind::If(Box::new(IfStmt {
                condition,
                consequence: ret(Some(int_lit(&fx, 1))),
                alternative: None,
            }))),
            ret(Some(int_lit(&fx, 2))),
        ],
    );
    let node = fx.quote_block(&sig, body);

    let built = fx.build(&node);
    let block = built.body();
    assert_eq!(block.arg(0), &Value::Type("System.Int32".to_string()));
    let statements = block.arg(2).items();
    let early = statements[0].arg(1);
    assert!(early.is("Expression.Return"));
    let end = &statements[statements.len() - 1];
    assert!(end.is("Expression.Label"));
    let target = end.arg(0);
    assert_eq!(early.arg(0), target);
    assert!(built.init(target).is("Expression.Label"));
    assert!(end.arg(1).is("Expression.Default"));
}

#[test]
fn using_declarations_nest_first_outermost() {
    let mut fx = Fixture::new();
    let void = fx.void();
    let resource = fx.symbols.declare_class("Resource", None);
    let sig = fx.lambda(void, &[]);
    let first = fx.local(&sig, "first", resource);
    let second = fx.local(&sig, "second", resource);
    let using = UsingStmt {
        locals: vec![first, second],
        declarations: vec![
            LocalDeclaration { span: sp(), local: first, initializer: Some(BoundExpr::null(sp(), resource)) },
            LocalDeclaration { span: sp(), local: second, initializer: Some(BoundExpr::null(sp(), resource)) },
        ],
        expression: None,
        body: stmt(StmtKind::Empty),
    };
    let node = fx.quote_block(&sig, block(Vec::new(), vec![stmt(StmtKind::Using(Box::new(using)))]));

    let built = fx.build(&node);
    let outer = &built.body().arg(2).items()[0];
    assert!(outer.is("CSharpStatement.Using"));
    assert_eq!(built.init(outer.arg(0)).arg(1), &Value::Const(ConstantValue::String("first".to_string())));

    let inner = outer.arg(2);
    assert!(inner.is("CSharpStatement.Using"));
    assert_eq!(built.init(inner.arg(0)).arg(1), &Value::Const(ConstantValue::String("second".to_string())));
    assert!(inner.arg(2).is("Expression.Empty"));
}

#[test]
fn switch_uses_default_marker_and_shared_break() {
    let mut fx = Fixture::new();
    let (int, void) = (fx.int(), fx.void());
    let sig = fx.lambda(void, &[("x", int)]);
    let switch = SwitchStmt {
        expression: param(&fx, sig.param(0)),
        locals: Vec::new(),
        sections: vec![
            SwitchSection {
                labels: vec![SwitchLabel::Case(int_lit(&fx, 1))],
                locals: Vec::new(),
                statements: vec![stmt(StmtKind::Break)],
            },
            SwitchSection { labels: vec![SwitchLabel::Default], locals: Vec::new(), statements: vec![stmt(StmtKind::Break)] },
        ],
    };
    let node = fx.quote_block(&sig, block(Vec::new(), vec![stmt(StmtKind::Switch(Box::new(switch)))]));

    let built = fx.build(&node);
    let switch = &built.body().arg(2).items()[0];
    assert!(switch.is("CSharpStatement.Switch"));
    let break_label = switch.arg(1);
    assert!(built.init(break_label).is("Expression.Label"));

    let cases = switch.arg(3).items();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0].arg(0).items(), &[Value::Const(ConstantValue::Int(1))]);
    assert_eq!(cases[1].arg(0).items(), &[Value::Member("SwitchCaseDefaultValue".to_string())]);
    for case in cases {
        assert!(case.is("CSharpStatement.SwitchCase"));
        let body = case.arg(1).items();
        assert!(body[0].is("Expression.Break"));
        assert_eq!(body[0].arg(0), break_label);
    }
}

#[test]
fn try_with_type_only_catch_and_lock() {
    let mut fx = Fixture::new();
    let void = fx.void();
    let object = fx.ty(SpecialType::Object);
    let failure = fx.symbols.declare_class("System.InvalidOperationException", None);
    let work = fx.symbols.declare_class("Work", None);
    let run = static_method(&mut fx, work, "Run", void, &[]);
    let recover = static_method(&mut fx, work, "Recover", void, &[]);
    let sig = fx.lambda(void, &[("gate", object)]);
    let call = |method| expr_stmt(BoundExpr::call(sp(), None, method, Vec::new(), Some(void)));

    // try { Run(); } catch (InvalidOperationException) { Recover(); }
    // lock (gate) { Run(); }
    let try_ = TryStmt {
        body: block(Vec::new(), vec![call(run)]),
        catches: vec![CatchClause {
            local: None,
            exception_type: Some(failure),
            filter: None,
            body: block(Vec::new(), vec![call(recover)]),
        }],
        finally: None,
    };
    let lock = LockStmt {
        argument: param(&fx, sig.param(0)),
        body: stmt(StmtKind::Block(block(Vec::new(), vec![call(run)]))),
    };
    let body = block(
        Vec::new(),
        vec![stmt(StmtKind::Try(Box::new(try_))), stmt(StmtKind::Lock(Box::new(lock)))],
    );
    let node = fx.quote_block(&sig, body);

    let built = fx.build(&node);
    let statements = built.body().arg(2).items();
    assert_eq!(statements.len(), 2);

    let try_ = &statements[0];
    assert!(try_.is("Expression.TryCatch"), "got {try_:?}");
    let protected = try_.arg(0);
    assert!(protected.is("Expression.Block"));
    assert_eq!(protected.arg(2).items()[0].arg(1), &member("Run"));
    let catches = try_.arg(1).items();
    assert_eq!(catches.len(), 1);
    let catch = &catches[0];
    assert!(catch.is("Expression.Catch"));
    assert_eq!(catch.args().len(), 2);
    assert_eq!(catch.arg(0), &type_value("System.InvalidOperationException"));
    assert_eq!(catch.arg(1).arg(2).items()[0].arg(1), &member("Recover"));
    assert_eq!(built.count("Expression.Variable"), 0);

    let lock = &statements[1];
    assert!(lock.is("CSharpStatement.Lock"), "got {lock:?}");
    assert_eq!(lock.arg(0), &built.root.arg(1).items()[0]);
    assert!(lock.arg(1).is("Expression.Block"));
}

#[test]
fn loop_without_continue_gets_null_continue_target() {
    let mut fx = Fixture::new();
    let void = fx.void();
    let sig = fx.lambda(void, &[]);
    let loop_ = WhileStmt {
        condition: bool_lit(&fx, true),
        body: stmt(StmtKind::Block(block(Vec::new(), vec![stmt(StmtKind::Break)]))),
    };
    let node = fx.quote_block(&sig, block(Vec::new(), vec![stmt(StmtKind::While(Box::new(loop_)))]));

    let built = fx.build(&node);
    let while_ = &built.body().arg(2).items()[0];
    assert!(while_.is("CSharpStatement.While"));
    assert_eq!(while_.arg(3), &Value::Null);

    let break_label = while_.arg(2);
    let body = while_.arg(1);
    assert!(body.is("Expression.Block"));
    let statements = body.arg(2).items();
    assert!(statements[0].is("Expression.Break"));
    assert_eq!(statements[0].arg(0), break_label);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn deep_right_nesting_fails_with_one_diagnostic() {
    let mut fx = Fixture::new();
    let int = fx.int();
    let sig = fx.lambda(int, &[("x", int)]);
    let mut chain = int_lit(&fx, 0);
    for _ in 0..64 {
        chain = binary(BinaryOperatorKind::Add, param(&fx, sig.param(0)), chain, int);
    }
    let node = fx.quote_expr(&sig, chain);
    let options = CompilerOptions::new().with_max_recursion_depth(16);

    let (lowered, diagnostics) = fx.lower_with(&node, options.clone());
    assert_eq!(lowered, node);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics.count(DiagnosticCode::RecursionTooDeep), 1);

    let (outcome, diagnostics) = fx.compile_with(&node, options, |_| {});
    assert!(matches!(outcome, LambdaOutcome::Rejected(_)), "got {outcome:?}");
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn missing_statement_factory_is_reported() {
    let mut fx = Fixture::with_grammar(FactoryGrammar::STANDARD);
    let (int, void) = (fx.int(), fx.void());
    let sig = fx.lambda(void, &[]);
    let a = fx.local(&sig, "a", int);
    let body = block(vec![a], vec![declare(a, int_lit(&fx, 1))]);
    let node = fx.quote_block(&sig, body);

    let (outcome, diagnostics) = fx.compile_with(&node, CompilerOptions::default(), |compiler| {
        compiler.capabilities().assume(Capability::ExtendedExpressions, true);
    });
    assert!(matches!(outcome, LambdaOutcome::Failed(_)), "got {outcome:?}");
    assert_eq!(outcome.into_expr(), node);
    assert_eq!(diagnostics.count(DiagnosticCode::MissingFactoryMember), 1);
    let diagnostic = diagnostics
        .iter()
        .find(|d| d.code == DiagnosticCode::MissingFactoryMember)
        .unwrap();
    assert_eq!(diagnostic.args, vec!["Microsoft.CSharp.Expressions.CSharpStatement".to_string(), "Assign".to_string()]);
}

#[test]
fn rejected_lambda_is_not_lowered() {
    let mut fx = Fixture::with_grammar(FactoryGrammar::STANDARD);
    let void = fx.void();
    let sig = fx.lambda(void, &[]);
    let label = fx.label("L");
    let node = fx.quote_block(&sig, block(Vec::new(), vec![stmt(StmtKind::Label(label))]));

    let (outcome, diagnostics) = fx.compile(&node);
    assert!(matches!(outcome, LambdaOutcome::Rejected(_)), "got {outcome:?}");
    assert_eq!(diagnostics.count(DiagnosticCode::StatementBody), 1);
}
