//! Installs the expression-tree factory grammar into a symbol table.
//!
//! Lowering resolves every factory call by name against the symbol table, so
//! a compilation that references only part of the grammar simply has fewer
//! overloads to find. [`install`] declares the reflection types, the
//! expression node types and the factory methods for the chosen
//! [`FactoryGrammar`] parts.

use bitflags::bitflags;

use crate::symbols::{MethodFlags, MethodId, MethodKind, SymbolTable};
use crate::types::{SpecialType, TypeFlags, TypeId, TypeKind};
use crate::well_known::{FactoryType, WellKnownType};

bitflags! {
    /// Which parts of the factory grammar to install.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FactoryGrammar: u8 {
        /// Reflection types and the standard `Expression` factory.
        const STANDARD = 1 << 0;
        /// `MethodInfo.CreateDelegate(Type, object)`.
        const METHOD_INFO_CREATE_DELEGATE = 1 << 1;
        /// `CSharpExpression` and `CSharpStatement`.
        const EXTENDED = 1 << 2;
        /// `DynamicCSharpExpression`.
        const DYNAMIC = 1 << 3;
    }
}

impl Default for FactoryGrammar {
    fn default() -> Self {
        FactoryGrammar::STANDARD | FactoryGrammar::METHOD_INFO_CREATE_DELEGATE
    }
}

/// Parameter and return shapes used by the signature table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sig {
    Expr,
    Exprs,
    Param,
    Params,
    Lambda,
    New,
    Label,
    Binding,
    Bindings,
    Init,
    Inits,
    Catch,
    Catches,
    Type,
    Method,
    Ctor,
    Field,
    Member,
    Members,
    ParamInfo,
    Object,
    Objects,
    Bool,
    Int,
    Ints,
    Str,
    Assign,
    Assigns,
    Case,
    Cases,
    Receiver,
    DynArg,
    DynArgs,
    Delegate,
}

type Entry = (&'static str, &'static [Sig], Sig);

use Sig::*;

const BINARY: &[&str] = &[
    "Add", "AddChecked", "Subtract", "SubtractChecked", "Multiply", "MultiplyChecked", "Divide",
    "Modulo", "And", "AndAlso", "Or", "OrElse", "ExclusiveOr", "LeftShift", "RightShift",
];

const COMPARISON: &[&str] = &[
    "Equal", "NotEqual", "LessThan", "LessThanOrEqual", "GreaterThan", "GreaterThanOrEqual",
];

const UNARY: &[&str] = &["Negate", "NegateChecked", "Not", "UnaryPlus", "OnesComplement"];

const EXPRESSION: &[Entry] = &[
    ("Constant", &[Object, Type], Expr),
    ("Default", &[Type], Expr),
    ("Parameter", &[Type, Str], Param),
    ("Variable", &[Type, Str], Param),
    ("Lambda", &[Expr, Params], Lambda),
    ("Quote", &[Expr], Expr),
    ("Convert", &[Expr, Type], Expr),
    ("Convert", &[Expr, Type, Method], Expr),
    ("ConvertChecked", &[Expr, Type], Expr),
    ("ConvertChecked", &[Expr, Type, Method], Expr),
    ("TypeAs", &[Expr, Type], Expr),
    ("TypeIs", &[Expr, Type], Expr),
    ("Coalesce", &[Expr, Expr], Expr),
    ("Coalesce", &[Expr, Expr, Lambda], Expr),
    ("Condition", &[Expr, Expr, Expr], Expr),
    ("Call", &[Expr, Method, Exprs], Expr),
    ("Invoke", &[Expr, Exprs], Expr),
    ("New", &[Ctor, Exprs], New),
    ("New", &[Ctor, Exprs, Members], New),
    ("New", &[Type], New),
    ("Property", &[Expr, Method], Expr),
    ("Field", &[Expr, Field], Expr),
    ("ArrayIndex", &[Expr, Expr], Expr),
    ("ArrayIndex", &[Expr, Exprs], Expr),
    ("ArrayLength", &[Expr], Expr),
    ("MemberInit", &[New, Bindings], Expr),
    ("ListInit", &[New, Inits], Expr),
    ("Bind", &[Member, Expr], Binding),
    ("MemberBind", &[Member, Bindings], Binding),
    ("ListBind", &[Member, Inits], Binding),
    ("ElementInit", &[Method, Exprs], Init),
    ("NewArrayInit", &[Type, Exprs], Expr),
    ("NewArrayBounds", &[Type, Exprs], Expr),
    ("Block", &[Type, Params, Exprs], Expr),
    ("Empty", &[], Expr),
    ("Label", &[Type, Str], Label),
    ("Label", &[Label], Expr),
    ("Label", &[Label, Expr], Expr),
    ("Goto", &[Label], Expr),
    ("Return", &[Label], Expr),
    ("Return", &[Label, Expr], Expr),
    ("Break", &[Label], Expr),
    ("Continue", &[Label], Expr),
    ("IfThen", &[Expr, Expr], Expr),
    ("IfThenElse", &[Expr, Expr, Expr], Expr),
    ("TryCatch", &[Expr, Catches], Expr),
    ("TryFinally", &[Expr, Expr], Expr),
    ("TryCatchFinally", &[Expr, Expr, Catches], Expr),
    ("Catch", &[Param, Expr], Catch),
    ("Catch", &[Type, Expr], Catch),
    ("Catch", &[Param, Expr, Expr], Catch),
    ("Catch", &[Type, Expr, Expr], Catch),
    ("Throw", &[Expr], Expr),
    ("Throw", &[Expr, Type], Expr),
    ("Rethrow", &[], Expr),
];

const CSHARP_EXPRESSION: &[Entry] = &[
    ("Call", &[Expr, Method, Assigns], Expr),
    ("Call", &[Expr, Method, Exprs], Expr),
    ("New", &[Ctor, Assigns], Expr),
    ("New", &[Ctor, Exprs], Expr),
    ("Invoke", &[Expr, Assigns], Expr),
    ("Invoke", &[Expr, Exprs], Expr),
    ("Index", &[Expr, Method, Assigns], Expr),
    ("Bind", &[ParamInfo, Expr], Assign),
    ("NewMultidimensionalArrayInit", &[Type, Ints, Exprs], Expr),
    ("ArrayAccess", &[Expr, Exprs], Expr),
    ("FromEndIndex", &[Expr], Expr),
    ("Range", &[Expr, Expr], Expr),
    ("ConditionalReceiver", &[Type], Receiver),
    ("ConditionalAccess", &[Expr, Receiver, Expr], Expr),
    ("Discard", &[Type], Expr),
];

const ASSIGN_OPERATORS: &[&str] = &[
    "AddAssign", "AddAssignChecked", "SubtractAssign", "SubtractAssignChecked", "MultiplyAssign",
    "MultiplyAssignChecked", "DivideAssign", "ModuloAssign", "AndAssign", "OrAssign",
    "ExclusiveOrAssign", "LeftShiftAssign", "RightShiftAssign",
];

const INCREMENTS: &[&str] = &[
    "PreIncrementAssign", "PreIncrementCheckedAssign", "PostIncrementAssign",
    "PostIncrementCheckedAssign", "PreDecrementAssign", "PreDecrementCheckedAssign",
    "PostDecrementAssign", "PostDecrementCheckedAssign",
];

const CSHARP_STATEMENT: &[Entry] = &[
    ("Assign", &[Expr, Expr], Expr),
    ("CoalesceAssign", &[Expr, Expr], Expr),
    ("While", &[Expr, Expr, Label, Label], Expr),
    ("Do", &[Expr, Expr, Label, Label], Expr),
    ("For", &[Params, Exprs, Expr, Exprs, Expr, Label, Label], Expr),
    ("ForEach", &[Param, Expr, Expr, Label, Label], Expr),
    ("Switch", &[Expr, Label, Params, Cases], Expr),
    ("SwitchCase", &[Objects, Exprs], Case),
    ("Using", &[Param, Expr, Expr], Expr),
    ("Lock", &[Expr, Expr], Expr),
];

const DYNAMIC: &[Entry] = &[
    ("DynamicGetMember", &[Expr, Str, Int], Expr),
    ("DynamicInvokeMember", &[Expr, Str, DynArgs, Int], Expr),
    ("DynamicInvoke", &[Expr, DynArgs, Int], Expr),
    ("DynamicGetIndex", &[Expr, DynArgs, Int], Expr),
    ("DynamicInvokeConstructor", &[Type, DynArgs, Int], Expr),
    ("DynamicConvert", &[Expr, Type, Int], Expr),
    ("MakeDynamicBinary", &[Str, Expr, Expr, Int], Expr),
    ("MakeDynamicUnary", &[Str, Expr, Int], Expr),
    ("MakeDynamicBinaryAssign", &[Str, Expr, Expr, Int], Expr),
    ("MakeDynamicUnaryAssign", &[Str, Expr, Int], Expr),
    ("DynamicArgument", &[Expr, Str, Int], DynArg),
];

/// Declare the factory grammar parts in `grammar`.
///
/// Types already present (for example declared by a test fixture) are reused.
pub fn install(symbols: &mut SymbolTable, grammar: FactoryGrammar) {
    if grammar.contains(FactoryGrammar::STANDARD) {
        install_reflection(symbols, grammar.contains(FactoryGrammar::METHOD_INFO_CREATE_DELEGATE));
        install_expression_types(symbols);
        let factory = factory_type(symbols, FactoryType::Expression);
        declare_all(symbols, factory, EXPRESSION);
        for name in BINARY {
            declare(symbols, factory, name, &[Expr, Expr], Expr, 0);
            declare(symbols, factory, name, &[Expr, Expr, Method], Expr, 0);
        }
        for name in COMPARISON {
            declare(symbols, factory, name, &[Expr, Expr], Expr, 0);
            declare(symbols, factory, name, &[Expr, Expr, Bool, Method], Expr, 0);
        }
        for name in UNARY {
            declare(symbols, factory, name, &[Expr], Expr, 0);
            declare(symbols, factory, name, &[Expr, Method], Expr, 0);
        }
        declare(symbols, factory, "Lambda", &[Expr, Params], Lambda, 1);
    }

    if grammar.contains(FactoryGrammar::EXTENDED) {
        let expression = factory_type(symbols, FactoryType::CSharpExpression);
        for ty in [WellKnownType::ParameterAssignment, WellKnownType::CSharpSwitchCase] {
            ensure_class(symbols, ty, None);
        }
        // The receiver stands in for an expression inside the access.
        let expression_base = symbols.well_known(WellKnownType::Expression);
        ensure_class(symbols, WellKnownType::ConditionalReceiver, expression_base);
        declare_all(symbols, expression, CSHARP_EXPRESSION);

        let statement = factory_type(symbols, FactoryType::CSharpStatement);
        declare_all(symbols, statement, CSHARP_STATEMENT);
        for name in ASSIGN_OPERATORS {
            declare(symbols, statement, name, &[Expr, Expr, Method, Lambda, Lambda], Expr, 0);
        }
        for name in INCREMENTS {
            declare(symbols, statement, name, &[Expr, Method], Expr, 0);
        }
        let object = symbols.special(SpecialType::Object);
        symbols.declare_field(statement, "SwitchCaseDefaultValue", object, true);
    }

    if grammar.contains(FactoryGrammar::DYNAMIC) {
        ensure_class(symbols, WellKnownType::DynamicCSharpArgument, None);
        let dynamic = factory_type(symbols, FactoryType::DynamicCSharpExpression);
        declare_all(symbols, dynamic, DYNAMIC);
    }
}

fn install_reflection(symbols: &mut SymbolTable, create_delegate: bool) {
    ensure_class(symbols, WellKnownType::Type, None);
    let member = ensure_class(symbols, WellKnownType::MemberInfo, None);
    let method_base = ensure_class(symbols, WellKnownType::MethodBase, Some(member));
    let method_info = ensure_class(symbols, WellKnownType::MethodInfo, Some(method_base));
    ensure_class(symbols, WellKnownType::ConstructorInfo, Some(method_base));
    ensure_class(symbols, WellKnownType::FieldInfo, Some(member));
    ensure_class(symbols, WellKnownType::ParameterInfo, None);
    let delegate = ensure_class(symbols, WellKnownType::Delegate, None);
    for ty in [WellKnownType::Index, WellKnownType::Range] {
        if symbols.well_known(ty).is_none() {
            symbols.declare_struct(ty.name(), TypeFlags::empty());
        }
    }

    declare(symbols, delegate, "CreateDelegate", &[Type, Object, Method], Delegate, 0);
    if create_delegate {
        let method = declare(symbols, method_info, "CreateDelegate", &[Type, Object], Delegate, 0);
        if let Some(method) = method {
            symbols.method_mut(method).flags.remove(MethodFlags::STATIC);
        }
    }
}

fn install_expression_types(symbols: &mut SymbolTable) {
    let expression = ensure_class(symbols, WellKnownType::Expression, None);
    ensure_class(symbols, WellKnownType::ParameterExpression, Some(expression));
    ensure_class(symbols, WellKnownType::LambdaExpression, Some(expression));
    ensure_class(symbols, WellKnownType::NewExpression, Some(expression));
    for ty in [
        WellKnownType::LabelTarget,
        WellKnownType::MemberBinding,
        WellKnownType::ElementInit,
        WellKnownType::CatchBlock,
    ] {
        ensure_class(symbols, ty, None);
    }
}

fn ensure_class(symbols: &mut SymbolTable, ty: WellKnownType, base: Option<TypeId>) -> TypeId {
    match symbols.well_known(ty) {
        Some(id) => id,
        None => symbols.declare_class(ty.name(), base),
    }
}

fn factory_type(symbols: &mut SymbolTable, factory: FactoryType) -> TypeId {
    match symbols.well_known(factory.well_known()) {
        Some(id) => id,
        None => {
            let object = symbols.special(SpecialType::Object);
            symbols.declare_type(factory.name(), TypeKind::Class, TypeFlags::STATIC, Some(object))
        }
    }
}

fn declare_all(symbols: &mut SymbolTable, factory: TypeId, entries: &[Entry]) {
    for (name, params, ret) in entries {
        declare(symbols, factory, name, params, *ret, 0);
    }
}

/// Declare one static factory overload. Returns `None` if a shape could not
/// be resolved, which only happens when a grammar part is installed without
/// the standard part it builds on.
fn declare(
    symbols: &mut SymbolTable,
    factory: TypeId,
    name: &str,
    params: &[Sig],
    ret: Sig,
    generic_arity: u8,
) -> Option<MethodId> {
    let return_type = resolve(symbols, ret)?;
    let param_types = params
        .iter()
        .map(|sig| resolve(symbols, *sig))
        .collect::<Option<Vec<_>>>()?;
    let method = symbols.declare_method(name, Some(factory), return_type, MethodKind::Factory, MethodFlags::STATIC);
    symbols.method_mut(method).generic_arity = generic_arity;
    for (i, ty) in param_types.into_iter().enumerate() {
        symbols.add_parameter(method, format!("arg{i}"), ty);
    }
    Some(method)
}

fn resolve(symbols: &mut SymbolTable, sig: Sig) -> Option<TypeId> {
    let known = |symbols: &SymbolTable, ty: WellKnownType| symbols.well_known(ty);
    Some(match sig {
        Expr => known(symbols, WellKnownType::Expression)?,
        Exprs => {
            let element = known(symbols, WellKnownType::Expression)?;
            symbols.array_of(element, 1)
        }
        Param => known(symbols, WellKnownType::ParameterExpression)?,
        Params => {
            let element = known(symbols, WellKnownType::ParameterExpression)?;
            symbols.array_of(element, 1)
        }
        Lambda => known(symbols, WellKnownType::LambdaExpression)?,
        New => known(symbols, WellKnownType::NewExpression)?,
        Label => known(symbols, WellKnownType::LabelTarget)?,
        Binding => known(symbols, WellKnownType::MemberBinding)?,
        Bindings => {
            let element = known(symbols, WellKnownType::MemberBinding)?;
            symbols.array_of(element, 1)
        }
        Init => known(symbols, WellKnownType::ElementInit)?,
        Inits => {
            let element = known(symbols, WellKnownType::ElementInit)?;
            symbols.array_of(element, 1)
        }
        Catch => known(symbols, WellKnownType::CatchBlock)?,
        Catches => {
            let element = known(symbols, WellKnownType::CatchBlock)?;
            symbols.array_of(element, 1)
        }
        Type => known(symbols, WellKnownType::Type)?,
        Method => known(symbols, WellKnownType::MethodInfo)?,
        Ctor => known(symbols, WellKnownType::ConstructorInfo)?,
        Field => known(symbols, WellKnownType::FieldInfo)?,
        Member => known(symbols, WellKnownType::MemberInfo)?,
        Members => {
            let element = known(symbols, WellKnownType::MemberInfo)?;
            symbols.array_of(element, 1)
        }
        ParamInfo => known(symbols, WellKnownType::ParameterInfo)?,
        Object => symbols.special(SpecialType::Object),
        Objects => {
            let element = symbols.special(SpecialType::Object);
            symbols.array_of(element, 1)
        }
        Bool => symbols.special(SpecialType::Boolean),
        Int => symbols.special(SpecialType::Int32),
        Ints => {
            let element = symbols.special(SpecialType::Int32);
            symbols.array_of(element, 1)
        }
        Str => symbols.special(SpecialType::String),
        Assign => known(symbols, WellKnownType::ParameterAssignment)?,
        Assigns => {
            let element = known(symbols, WellKnownType::ParameterAssignment)?;
            symbols.array_of(element, 1)
        }
        Case => known(symbols, WellKnownType::CSharpSwitchCase)?,
        Cases => {
            let element = known(symbols, WellKnownType::CSharpSwitchCase)?;
            symbols.array_of(element, 1)
        }
        Receiver => known(symbols, WellKnownType::ConditionalReceiver)?,
        DynArg => known(symbols, WellKnownType::DynamicCSharpArgument)?,
        DynArgs => {
            let element = known(symbols, WellKnownType::DynamicCSharpArgument)?;
            symbols.array_of(element, 1)
        }
        Delegate => known(symbols, WellKnownType::Delegate)?,
    })
}
