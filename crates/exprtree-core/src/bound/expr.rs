//! Bound expression nodes.
//!
//! A [`BoundExpr`] is the binder's fully resolved view of an expression: a
//! source span, a static type (absent for untyped nodes such as method groups
//! and the `null` literal before conversion) and a variant-specific payload.
//! Variants with more than a couple of children box a payload struct so the
//! enum stays small.
//!
//! Lowering produces `BoundExpr` as well: a build-expression is an ordinary
//! tree of calls to factory methods, array creations, locals and sequences.

use bitflags::bitflags;

use crate::constant::ConstantValue;
use crate::span::Span;
use crate::symbols::{FieldId, LocalId, MethodId, ParamId, PropertyId, RefKind};
use crate::types::TypeId;

use super::operators::{BinaryOperator, Conversion, IncrementKind, UnaryOperator};
use super::stmt::BoundBlock;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundExpr {
    pub span: Span,
    pub ty: Option<TypeId>,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // Values known at compile time
    Literal(ConstantValue),
    DefaultValue,
    NameOf(ConstantValue),
    TypeOf(TypeId),
    SizeOf { target: TypeId, constant: Option<ConstantValue> },
    MethodInfo(MethodId),
    FieldInfo(FieldId),
    ParameterInfo(ParamId),

    // Variables and receivers
    This,
    Base,
    Local(LocalId),
    Parameter(ParamId),
    /// Receiver of an object or collection initializer member.
    ImplicitReceiver,
    /// The shared receiver inside a null-conditional access.
    ConditionalReceiver { id: u32 },

    // Operators
    Unary(Box<UnaryExpr>),
    Binary(Box<BinaryExpr>),
    Conversion(Box<ConversionExpr>),
    As(Box<BoundExpr>),
    Is(Box<IsExpr>),
    IsPattern(Box<BoundExpr>),
    Conditional(Box<ConditionalExpr>),
    NullCoalescing(Box<NullCoalescingExpr>),
    NullCoalescingAssignment(Box<AssignmentExpr>),
    Assignment(Box<AssignmentExpr>),
    CompoundAssignment(Box<CompoundAssignmentExpr>),
    IncrementDecrement(Box<IncrementExpr>),
    DeconstructionAssignment(Box<DeconstructionExpr>),

    // Invocation and creation
    Call(Box<CallExpr>),
    ObjectCreation(Box<ObjectCreationExpr>),
    /// `new T()` for a type parameter, with an optional initializer.
    NewTypeParameter(Option<Box<BoundExpr>>),
    AnonymousObjectCreation(Box<AnonymousObjectExpr>),
    DelegateCreation(Box<DelegateCreationExpr>),
    MethodGroup(Box<MethodGroupExpr>),

    // Initializers and arrays
    ObjectInitializer(Vec<BoundExpr>),
    ObjectInitializerMember(Box<InitializerMemberExpr>),
    CollectionInitializer(Vec<BoundExpr>),
    CollectionElementInitializer(Box<CollectionElementExpr>),
    ArrayCreation(Box<ArrayCreationExpr>),
    ArrayInitialization(Vec<BoundExpr>),
    ArrayAccess(Box<ArrayAccessExpr>),
    ArrayLength(Box<BoundExpr>),

    // Member access
    FieldAccess(Box<FieldAccessExpr>),
    PropertyAccess(Box<PropertyAccessExpr>),
    IndexerAccess(Box<IndexerAccessExpr>),
    ConditionalAccess(Box<ConditionalAccessExpr>),
    FromEndIndex(Box<BoundExpr>),
    Range(Box<RangeExpr>),

    // Functions
    Lambda(Box<LambdaExpr>),

    // Newer language constructs
    ThrowExpression(Box<BoundExpr>),
    Discard,
    OutVariableDeclaration(LocalId),
    TupleLiteral(Vec<BoundExpr>),
    TupleBinary(Box<TupleBinaryExpr>),
    SwitchExpression(Box<SwitchExpr>),
    Dynamic(Box<DynamicExpr>),

    // Unsafe code and varargs
    PointerIndirection(Box<BoundExpr>),
    AddressOf(Box<BoundExpr>),
    PointerElementAccess(Box<PointerElementExpr>),
    MakeRef(Box<BoundExpr>),
    RefType(Box<BoundExpr>),
    RefValue(Box<BoundExpr>),
    ArgList,
    ArgListOperator(Vec<BoundExpr>),

    /// Locals, side effects and a value; only produced by lowering.
    Sequence(Box<SequenceExpr>),
    /// Placeholder for an expression that could not be bound or built.
    Bad(Vec<BoundExpr>),
}

// =============================================================================
// Payloads
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOperator,
    pub operand: BoundExpr,
    pub method: Option<MethodId>,
    pub constant: Option<ConstantValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub op: BinaryOperator,
    pub left: BoundExpr,
    pub right: BoundExpr,
    pub method: Option<MethodId>,
    pub constant: Option<ConstantValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConversionExpr {
    pub operand: BoundExpr,
    pub conversion: Conversion,
    pub checked: bool,
    /// Written as a cast in source.
    pub explicit_cast: bool,
    pub constant: Option<ConstantValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IsExpr {
    pub operand: BoundExpr,
    pub target: TypeId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalExpr {
    pub condition: BoundExpr,
    pub consequence: BoundExpr,
    pub alternative: BoundExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NullCoalescingExpr {
    pub left: BoundExpr,
    pub right: BoundExpr,
    /// Conversion applied to the left operand when it is not null.
    pub left_conversion: Conversion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentExpr {
    pub target: BoundExpr,
    pub value: BoundExpr,
    /// `x = ref y`.
    pub is_ref: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompoundAssignmentExpr {
    pub op: BinaryOperator,
    pub target: BoundExpr,
    pub value: BoundExpr,
    pub method: Option<MethodId>,
    /// Type the operator is evaluated in.
    pub operator_type: TypeId,
    /// Applied to the target's value before the operator.
    pub left_conversion: Conversion,
    /// Applied to the operator's result before it is stored.
    pub final_conversion: Conversion,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncrementExpr {
    pub kind: IncrementKind,
    pub operand: BoundExpr,
    pub method: Option<MethodId>,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeconstructionExpr {
    pub targets: Vec<BoundExpr>,
    pub value: BoundExpr,
}

/// Arguments of a call-like construct, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundArguments {
    pub exprs: Vec<BoundExpr>,
    /// Argument names; empty when no argument is named.
    pub names: Vec<Option<String>>,
    /// Ref kinds as written at the call site; empty when all are by value.
    pub ref_kinds: Vec<RefKind>,
    /// Parameter ordinal each argument binds to; `None` means positional.
    pub args_to_params: Option<Vec<usize>>,
    /// Indices of arguments synthesized for omitted optional parameters.
    pub defaults: Vec<usize>,
    /// Trailing arguments were packed into a `params` array.
    pub expanded: bool,
}

impl BoundArguments {
    pub fn positional(exprs: Vec<BoundExpr>) -> Self {
        Self { exprs, ..Default::default() }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.exprs.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.exprs.is_empty()
    }

    pub fn has_names(&self) -> bool {
        self.names.iter().any(Option::is_some)
    }

    pub fn ref_kind(&self, index: usize) -> RefKind {
        self.ref_kinds.get(index).copied().unwrap_or_default()
    }

    /// The parameter ordinal argument `index` binds to.
    pub fn parameter_of(&self, index: usize) -> usize {
        match &self.args_to_params {
            Some(map) => map.get(index).copied().unwrap_or(index),
            None => index,
        }
    }

    /// Whether arguments bind to parameters out of order.
    pub fn is_reordered(&self) -> bool {
        match &self.args_to_params {
            Some(map) => map.iter().enumerate().any(|(i, p)| i != *p),
            None => false,
        }
    }

    #[inline]
    pub fn is_default(&self, index: usize) -> bool {
        self.defaults.contains(&index)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub receiver: Option<BoundExpr>,
    pub method: MethodId,
    pub args: BoundArguments,
    pub type_args: Vec<TypeId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectCreationExpr {
    /// `None` for a value type's parameterless construction.
    pub constructor: Option<MethodId>,
    pub args: BoundArguments,
    pub initializer: Option<BoundExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnonymousObjectExpr {
    pub constructor: MethodId,
    pub args: Vec<BoundExpr>,
    pub properties: Vec<PropertyId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelegateCreationExpr {
    /// Method group, lambda or existing delegate.
    pub argument: BoundExpr,
    pub method: Option<MethodId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodGroupExpr {
    pub receiver: Option<BoundExpr>,
    pub methods: Vec<MethodId>,
}

/// Target of an object-initializer assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializerMember {
    Field(FieldId),
    Property(PropertyId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializerMemberExpr {
    pub member: InitializerMember,
    /// Index arguments of a dictionary-style `[k] = v` initializer.
    pub args: Vec<BoundExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionElementExpr {
    pub add_method: MethodId,
    pub args: Vec<BoundExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayCreationExpr {
    pub bounds: Vec<BoundExpr>,
    /// An `ArrayInitialization`, nested once per extra rank.
    pub initializer: Option<BoundExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrayAccessExpr {
    pub array: BoundExpr,
    pub indices: Vec<BoundExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldAccessExpr {
    pub receiver: Option<BoundExpr>,
    pub field: FieldId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyAccessExpr {
    pub receiver: Option<BoundExpr>,
    pub property: PropertyId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexerAccessExpr {
    pub receiver: BoundExpr,
    pub indexer: PropertyId,
    pub args: BoundArguments,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionalAccessExpr {
    pub receiver: BoundExpr,
    /// Uses `ConditionalReceiver { id: receiver_id }` for the receiver.
    pub access: BoundExpr,
    pub receiver_id: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RangeExpr {
    pub left: Option<BoundExpr>,
    pub right: Option<BoundExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LambdaExpr {
    pub symbol: MethodId,
    pub body: BoundBlock,
    /// `delegate (...) { ... }` rather than `(...) => ...`.
    pub is_anonymous_method: bool,
    pub is_expression_bodied: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TupleBinaryExpr {
    pub left: BoundExpr,
    pub right: BoundExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchExpr {
    pub governing: BoundExpr,
    pub arms: Vec<BoundExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointerElementExpr {
    pub pointer: BoundExpr,
    pub index: BoundExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SequenceExpr {
    pub locals: Vec<LocalId>,
    pub side_effects: Vec<BoundExpr>,
    pub value: BoundExpr,
}

bitflags! {
    /// Binder flags passed to dynamic factory calls.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BinderFlags: u16 {
        const CHECKED_CONTEXT = 1;
        const INVOKE_SIMPLE_NAME = 2;
        const INVOKE_SPECIAL_NAME = 4;
        const BINARY_OPERATION_LOGICAL = 8;
        const CONVERT_EXPLICIT = 16;
        const CONVERT_ARRAY_INDEX = 32;
        const RESULT_INDEXED = 64;
        const VALUE_FROM_COMPOUND_ASSIGNMENT = 128;
        const RESULT_DISCARDED = 256;
    }
}

bitflags! {
    /// Per-argument flags passed to dynamic factory calls.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArgumentFlags: u8 {
        const USE_COMPILE_TIME_TYPE = 1;
        const CONSTANT = 2;
        const NAMED_ARGUMENT = 4;
        const IS_REF = 8;
        const IS_OUT = 16;
        const IS_STATIC_TYPE = 32;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicArgument {
    pub expr: BoundExpr,
    pub name: Option<String>,
    pub ref_kind: RefKind,
}

impl DynamicArgument {
    pub fn positional(expr: BoundExpr) -> Self {
        Self { expr, name: None, ref_kind: RefKind::None }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DynamicOperation {
    InvokeMember { receiver: BoundExpr, name: String, args: Vec<DynamicArgument> },
    Invoke { receiver: BoundExpr, args: Vec<DynamicArgument> },
    GetMember { receiver: BoundExpr, name: String },
    GetIndex { receiver: BoundExpr, args: Vec<DynamicArgument> },
    /// Construction of the node's own type with dynamic arguments.
    ObjectCreation { args: Vec<DynamicArgument> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicExpr {
    pub operation: DynamicOperation,
    pub flags: BinderFlags,
}

// =============================================================================
// Queries
// =============================================================================

impl BoundExpr {
    pub fn new(span: Span, ty: Option<TypeId>, kind: ExprKind) -> Self {
        Self { span, ty, kind }
    }

    /// The compile-time value of this node, if it has one.
    pub fn constant_value(&self) -> Option<&ConstantValue> {
        match &self.kind {
            ExprKind::Literal(value) | ExprKind::NameOf(value) => Some(value),
            ExprKind::SizeOf { constant, .. } => constant.as_ref(),
            ExprKind::Unary(u) => u.constant.as_ref(),
            ExprKind::Binary(b) => b.constant.as_ref(),
            ExprKind::Conversion(c) => c.constant.as_ref(),
            _ => None,
        }
    }

    #[inline]
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Literal(_))
    }

    /// `null` with no type, as written in source before conversion.
    pub fn is_untyped_null(&self) -> bool {
        self.ty.is_none() && matches!(self.kind, ExprKind::Literal(ConstantValue::Null))
    }

    pub fn as_lambda(&self) -> Option<&LambdaExpr> {
        match &self.kind {
            ExprKind::Lambda(lambda) => Some(lambda),
            _ => None,
        }
    }

    /// Whether the node is a local, parameter or `this` reading the same
    /// variable as `other`.
    pub fn same_variable(&self, other: &BoundExpr) -> bool {
        match (&self.kind, &other.kind) {
            (ExprKind::Local(a), ExprKind::Local(b)) => a == b,
            (ExprKind::Parameter(a), ExprKind::Parameter(b)) => a == b,
            (ExprKind::This, ExprKind::This) => true,
            (ExprKind::FieldAccess(a), ExprKind::FieldAccess(b)) => {
                a.field == b.field
                    && match (&a.receiver, &b.receiver) {
                        (None, None) => true,
                        (Some(x), Some(y)) => x.same_variable(y),
                        _ => false,
                    }
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(id: u32) -> BoundExpr {
        BoundExpr::new(Span::default(), None, ExprKind::Local(LocalId(id)))
    }

    #[test]
    fn argument_mapping() {
        let mut args = BoundArguments::positional(vec![local(0), local(1)]);
        assert!(!args.is_reordered());
        args.args_to_params = Some(vec![1, 0]);
        assert!(args.is_reordered());
        assert_eq!(args.parameter_of(0), 1);
    }

    #[test]
    fn same_variable() {
        assert!(local(3).same_variable(&local(3)));
        assert!(!local(3).same_variable(&local(4)));
    }

    #[test]
    fn constant_value_of_literal() {
        let lit = BoundExpr::new(Span::default(), None, ExprKind::Literal(ConstantValue::Int(4)));
        assert_eq!(lit.constant_value(), Some(&ConstantValue::Int(4)));
        assert!(local(0).constant_value().is_none());
    }
}
