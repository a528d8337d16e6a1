//! Operator and conversion descriptors attached to bound nodes.

use bitflags::bitflags;

use crate::symbols::MethodId;

/// Binary operator kinds, independent of operand types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperatorKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Remainder,
    LeftShift,
    RightShift,
    And,
    Or,
    Xor,
    /// Short-circuiting `&&`.
    LogicalAnd,
    /// Short-circuiting `||`.
    LogicalOr,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl BinaryOperatorKind {
    #[inline]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOperatorKind::Equal
                | BinaryOperatorKind::NotEqual
                | BinaryOperatorKind::LessThan
                | BinaryOperatorKind::LessThanOrEqual
                | BinaryOperatorKind::GreaterThan
                | BinaryOperatorKind::GreaterThanOrEqual
        )
    }

    /// Whether the checked variant differs from the unchecked one.
    #[inline]
    pub fn has_checked_form(self) -> bool {
        matches!(
            self,
            BinaryOperatorKind::Add | BinaryOperatorKind::Subtract | BinaryOperatorKind::Multiply
        )
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperatorKind::Add => "+",
            BinaryOperatorKind::Subtract => "-",
            BinaryOperatorKind::Multiply => "*",
            BinaryOperatorKind::Divide => "/",
            BinaryOperatorKind::Remainder => "%",
            BinaryOperatorKind::LeftShift => "<<",
            BinaryOperatorKind::RightShift => ">>",
            BinaryOperatorKind::And => "&",
            BinaryOperatorKind::Or => "|",
            BinaryOperatorKind::Xor => "^",
            BinaryOperatorKind::LogicalAnd => "&&",
            BinaryOperatorKind::LogicalOr => "||",
            BinaryOperatorKind::Equal => "==",
            BinaryOperatorKind::NotEqual => "!=",
            BinaryOperatorKind::LessThan => "<",
            BinaryOperatorKind::LessThanOrEqual => "<=",
            BinaryOperatorKind::GreaterThan => ">",
            BinaryOperatorKind::GreaterThanOrEqual => ">=",
        }
    }
}

bitflags! {
    /// Modifiers on a bound operator.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct OperatorFlags: u8 {
        const CHECKED = 1 << 0;
        /// Operands were lifted to nullable.
        const LIFTED = 1 << 1;
        const DYNAMIC = 1 << 2;
        /// Both operands are the same enum type.
        const ENUM = 1 << 3;
        /// Left is an enum, right is its underlying type.
        const ENUM_AND_UNDERLYING = 1 << 4;
        /// Left is an underlying type, right is the enum.
        const UNDERLYING_AND_ENUM = 1 << 5;
        /// Operands are pointers.
        const POINTER = 1 << 6;
    }
}

impl OperatorFlags {
    /// Whether any operand is an enum.
    #[inline]
    pub fn involves_enum(self) -> bool {
        self.intersects(
            OperatorFlags::ENUM | OperatorFlags::ENUM_AND_UNDERLYING | OperatorFlags::UNDERLYING_AND_ENUM,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BinaryOperator {
    pub kind: BinaryOperatorKind,
    pub flags: OperatorFlags,
}

impl BinaryOperator {
    pub fn new(kind: BinaryOperatorKind) -> Self {
        Self { kind, flags: OperatorFlags::empty() }
    }

    pub fn with(kind: BinaryOperatorKind, flags: OperatorFlags) -> Self {
        Self { kind, flags }
    }

    #[inline]
    pub fn is_checked(self) -> bool {
        self.flags.contains(OperatorFlags::CHECKED)
    }

    #[inline]
    pub fn is_lifted(self) -> bool {
        self.flags.contains(OperatorFlags::LIFTED)
    }

    #[inline]
    pub fn is_dynamic(self) -> bool {
        self.flags.contains(OperatorFlags::DYNAMIC)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperatorKind {
    Negate,
    Plus,
    LogicalNot,
    BitwiseComplement,
    True,
    False,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnaryOperator {
    pub kind: UnaryOperatorKind,
    pub flags: OperatorFlags,
}

impl UnaryOperator {
    pub fn new(kind: UnaryOperatorKind) -> Self {
        Self { kind, flags: OperatorFlags::empty() }
    }

    pub fn with(kind: UnaryOperatorKind, flags: OperatorFlags) -> Self {
        Self { kind, flags }
    }
}

/// `++`/`--` in prefix or postfix position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IncrementKind {
    PreIncrement,
    PostIncrement,
    PreDecrement,
    PostDecrement,
}

impl IncrementKind {
    pub fn factory_name(self, checked: bool) -> &'static str {
        match (self, checked) {
            (IncrementKind::PreIncrement, false) => "PreIncrementAssign",
            (IncrementKind::PreIncrement, true) => "PreIncrementCheckedAssign",
            (IncrementKind::PostIncrement, false) => "PostIncrementAssign",
            (IncrementKind::PostIncrement, true) => "PostIncrementCheckedAssign",
            (IncrementKind::PreDecrement, false) => "PreDecrementAssign",
            (IncrementKind::PreDecrement, true) => "PreDecrementCheckedAssign",
            (IncrementKind::PostDecrement, false) => "PostDecrementAssign",
            (IncrementKind::PostDecrement, true) => "PostDecrementCheckedAssign",
        }
    }
}

/// Classification of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionKind {
    Identity,
    ImplicitNumeric,
    ExplicitNumeric,
    ImplicitEnumeration,
    ExplicitEnumeration,
    ImplicitReference,
    ExplicitReference,
    Boxing,
    Unboxing,
    ImplicitNullable,
    ExplicitNullable,
    NullLiteral,
    ImplicitUserDefined,
    ExplicitUserDefined,
    MethodGroup,
    AnonymousFunction,
    ImplicitDynamic,
    ExplicitDynamic,
    ImplicitTuple,
    ImplicitTupleLiteral,
    ExplicitTuple,
    ImplicitPointer,
    ExplicitPointer,
    IntPtr,
}

impl ConversionKind {
    #[inline]
    pub fn is_user_defined(self) -> bool {
        matches!(self, ConversionKind::ImplicitUserDefined | ConversionKind::ExplicitUserDefined)
    }

    #[inline]
    pub fn is_tuple(self) -> bool {
        matches!(
            self,
            ConversionKind::ImplicitTuple | ConversionKind::ImplicitTupleLiteral | ConversionKind::ExplicitTuple
        )
    }

    #[inline]
    pub fn is_dynamic(self) -> bool {
        matches!(self, ConversionKind::ImplicitDynamic | ConversionKind::ExplicitDynamic)
    }

    #[inline]
    pub fn is_pointer(self) -> bool {
        matches!(self, ConversionKind::ImplicitPointer | ConversionKind::ExplicitPointer)
    }

    #[inline]
    pub fn is_nullable(self) -> bool {
        matches!(self, ConversionKind::ImplicitNullable | ConversionKind::ExplicitNullable)
    }
}

/// A classified conversion and, for user-defined conversions, its method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Conversion {
    pub kind: ConversionKind,
    pub method: Option<MethodId>,
}

impl Conversion {
    pub const IDENTITY: Conversion = Conversion { kind: ConversionKind::Identity, method: None };

    pub fn new(kind: ConversionKind) -> Self {
        Self { kind, method: None }
    }

    pub fn user_defined(method: MethodId, explicit: bool) -> Self {
        let kind = if explicit {
            ConversionKind::ExplicitUserDefined
        } else {
            ConversionKind::ImplicitUserDefined
        };
        Self { kind, method: Some(method) }
    }

    #[inline]
    pub fn is_identity(self) -> bool {
        self.kind == ConversionKind::Identity
    }

    #[inline]
    pub fn is_user_defined(self) -> bool {
        self.kind.is_user_defined()
    }
}

impl Default for Conversion {
    fn default() -> Self {
        Conversion::IDENTITY
    }
}
