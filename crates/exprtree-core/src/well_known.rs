//! Names of the reflection, expression and factory types lowering targets.

/// A type the passes look up by name rather than by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownType {
    // Reflection
    Type,
    MemberInfo,
    MethodBase,
    MethodInfo,
    ConstructorInfo,
    FieldInfo,
    ParameterInfo,
    Delegate,
    Index,
    Range,

    // Standard expression grammar
    Expression,
    ParameterExpression,
    LambdaExpression,
    NewExpression,
    LabelTarget,
    MemberBinding,
    ElementInit,
    CatchBlock,

    // Extended grammar
    CSharpExpression,
    CSharpStatement,
    ParameterAssignment,
    CSharpSwitchCase,
    ConditionalReceiver,

    // Dynamic grammar
    DynamicCSharpExpression,
    DynamicCSharpArgument,
}

impl WellKnownType {
    pub fn name(self) -> &'static str {
        match self {
            WellKnownType::Type => "System.Type",
            WellKnownType::MemberInfo => "System.Reflection.MemberInfo",
            WellKnownType::MethodBase => "System.Reflection.MethodBase",
            WellKnownType::MethodInfo => "System.Reflection.MethodInfo",
            WellKnownType::ConstructorInfo => "System.Reflection.ConstructorInfo",
            WellKnownType::FieldInfo => "System.Reflection.FieldInfo",
            WellKnownType::ParameterInfo => "System.Reflection.ParameterInfo",
            WellKnownType::Delegate => "System.Delegate",
            WellKnownType::Index => "System.Index",
            WellKnownType::Range => "System.Range",
            WellKnownType::Expression => "System.Linq.Expressions.Expression",
            WellKnownType::ParameterExpression => "System.Linq.Expressions.ParameterExpression",
            WellKnownType::LambdaExpression => "System.Linq.Expressions.LambdaExpression",
            WellKnownType::NewExpression => "System.Linq.Expressions.NewExpression",
            WellKnownType::LabelTarget => "System.Linq.Expressions.LabelTarget",
            WellKnownType::MemberBinding => "System.Linq.Expressions.MemberBinding",
            WellKnownType::ElementInit => "System.Linq.Expressions.ElementInit",
            WellKnownType::CatchBlock => "System.Linq.Expressions.CatchBlock",
            WellKnownType::CSharpExpression => "Microsoft.CSharp.Expressions.CSharpExpression",
            WellKnownType::CSharpStatement => "Microsoft.CSharp.Expressions.CSharpStatement",
            WellKnownType::ParameterAssignment => "Microsoft.CSharp.Expressions.ParameterAssignment",
            WellKnownType::CSharpSwitchCase => "Microsoft.CSharp.Expressions.CSharpSwitchCase",
            WellKnownType::ConditionalReceiver => "Microsoft.CSharp.Expressions.ConditionalReceiver",
            WellKnownType::DynamicCSharpExpression => "Microsoft.CSharp.Expressions.DynamicCSharpExpression",
            WellKnownType::DynamicCSharpArgument => "Microsoft.CSharp.Expressions.DynamicCSharpArgument",
        }
    }
}

/// The static type a factory call is made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FactoryType {
    /// Standard `System.Linq.Expressions.Expression` grammar.
    Expression,
    /// Extended C# expression grammar.
    CSharpExpression,
    /// Extended C# statement grammar.
    CSharpStatement,
    /// Dynamic-operation grammar.
    DynamicCSharpExpression,
}

impl FactoryType {
    pub fn well_known(self) -> WellKnownType {
        match self {
            FactoryType::Expression => WellKnownType::Expression,
            FactoryType::CSharpExpression => WellKnownType::CSharpExpression,
            FactoryType::CSharpStatement => WellKnownType::CSharpStatement,
            FactoryType::DynamicCSharpExpression => WellKnownType::DynamicCSharpExpression,
        }
    }

    #[inline]
    pub fn name(self) -> &'static str {
        self.well_known().name()
    }
}
