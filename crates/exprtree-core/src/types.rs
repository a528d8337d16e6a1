//! The type model bound trees are typed against.
//!
//! Types are stored in the [`SymbolTable`](crate::SymbolTable) arena and
//! referred to by [`TypeId`]. Constructed types (arrays, nullables,
//! expression-tree types) are interned so the same construction always
//! yields the same id.

use bitflags::bitflags;
use std::fmt;

use crate::symbols::MethodId;

/// Arena index of a type definition.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// The built-in types every symbol table starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialType {
    Void,
    Boolean,
    Char,
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Single,
    Double,
    Decimal,
    String,
    Object,
    IntPtr,
    UIntPtr,
}

impl SpecialType {
    pub const ALL: [SpecialType; 18] = [
        SpecialType::Void,
        SpecialType::Boolean,
        SpecialType::Char,
        SpecialType::SByte,
        SpecialType::Byte,
        SpecialType::Int16,
        SpecialType::UInt16,
        SpecialType::Int32,
        SpecialType::UInt32,
        SpecialType::Int64,
        SpecialType::UInt64,
        SpecialType::Single,
        SpecialType::Double,
        SpecialType::Decimal,
        SpecialType::String,
        SpecialType::Object,
        SpecialType::IntPtr,
        SpecialType::UIntPtr,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpecialType::Void => "System.Void",
            SpecialType::Boolean => "System.Boolean",
            SpecialType::Char => "System.Char",
            SpecialType::SByte => "System.SByte",
            SpecialType::Byte => "System.Byte",
            SpecialType::Int16 => "System.Int16",
            SpecialType::UInt16 => "System.UInt16",
            SpecialType::Int32 => "System.Int32",
            SpecialType::UInt32 => "System.UInt32",
            SpecialType::Int64 => "System.Int64",
            SpecialType::UInt64 => "System.UInt64",
            SpecialType::Single => "System.Single",
            SpecialType::Double => "System.Double",
            SpecialType::Decimal => "System.Decimal",
            SpecialType::String => "System.String",
            SpecialType::Object => "System.Object",
            SpecialType::IntPtr => "System.IntPtr",
            SpecialType::UIntPtr => "System.UIntPtr",
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            SpecialType::Char
                | SpecialType::SByte
                | SpecialType::Byte
                | SpecialType::Int16
                | SpecialType::UInt16
                | SpecialType::Int32
                | SpecialType::UInt32
                | SpecialType::Int64
                | SpecialType::UInt64
        )
    }

    pub fn is_value_type(self) -> bool {
        !matches!(self, SpecialType::String | SpecialType::Object | SpecialType::Void)
    }

    /// The type an operand of this type is widened to before arithmetic.
    ///
    /// Types narrower than `int` are widened to `int`; `bool` and everything
    /// else stay as they are.
    pub fn promoted(self) -> SpecialType {
        match self {
            SpecialType::SByte
            | SpecialType::Byte
            | SpecialType::Int16
            | SpecialType::UInt16
            | SpecialType::Char => SpecialType::Int32,
            other => other,
        }
    }
}

/// The shape of a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Special(SpecialType),
    Enum { underlying: TypeId },
    Nullable { underlying: TypeId },
    Array { element: TypeId, rank: u32 },
    Pointer { pointee: TypeId },
    /// A delegate type; `invoke` is attached once the Invoke method exists.
    Delegate { invoke: Option<MethodId> },
    /// `Expression<D>` for a delegate type `D`.
    ExpressionTree { delegate: TypeId },
    Class,
    Struct,
    Interface,
    TypeParameter,
    Dynamic,
    Error,
}

bitflags! {
    /// Additional facts about a type definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        /// Stack-only type (`ref struct`).
        const REF_LIKE = 1 << 0;
        /// Instances are values rather than references.
        const VALUE_TYPE = 1 << 1;
        const STATIC = 1 << 2;
        /// COM interop type; calls may omit `ref` on by-ref arguments.
        const COM_IMPORT = 1 << 3;
        const ABSTRACT = 1 << 4;
    }
}

/// A type definition stored in the symbol table.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Fully qualified name.
    pub name: String,
    pub kind: TypeKind,
    pub flags: TypeFlags,
    /// Base class, if any.
    pub base: Option<TypeId>,
}

impl TypeDef {
    pub fn is_value_type(&self) -> bool {
        match &self.kind {
            TypeKind::Special(s) => s.is_value_type(),
            TypeKind::Enum { .. } | TypeKind::Nullable { .. } | TypeKind::Struct => true,
            TypeKind::Pointer { .. } => true,
            _ => self.flags.contains(TypeFlags::VALUE_TYPE),
        }
    }

    pub fn is_reference_type(&self) -> bool {
        match &self.kind {
            TypeKind::Special(s) => matches!(s, SpecialType::String | SpecialType::Object),
            TypeKind::Array { .. }
            | TypeKind::Delegate { .. }
            | TypeKind::ExpressionTree { .. }
            | TypeKind::Interface
            | TypeKind::Dynamic => true,
            TypeKind::Class => !self.flags.contains(TypeFlags::VALUE_TYPE),
            _ => false,
        }
    }

    pub fn special(&self) -> Option<SpecialType> {
        match self.kind {
            TypeKind::Special(s) => Some(s),
            _ => None,
        }
    }
}
