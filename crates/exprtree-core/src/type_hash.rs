//! Deterministic name hashing for symbol lookup.
//!
//! Symbol identity inside the symbol table is the arena id. Names are only
//! needed for lookup ("is `System.Index` defined?", "which `Add` overloads
//! does `Expression` declare?"), and those lookups are keyed by a
//! [`TypeHash`] so the table never stores a secondary string index.
//!
//! # Examples
//!
//! ```
//! use exprtree_core::TypeHash;
//!
//! let a = TypeHash::from_name("System.Int32");
//! let b = TypeHash::from_name("System.Int32");
//! assert_eq!(a, b);
//! assert_ne!(TypeHash::from_member("Add"), TypeHash::from_name("Add"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants for hash computation.
///
/// Type names and member names live in different domains so that a type
/// called `Add` never collides with a member called `Add`.
pub mod hash_constants {
    /// Domain marker for type hashes
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for member hashes
    pub const MEMBER: u64 = 0x7d3c8b4a92e15f6d;
}

/// A deterministic 64-bit hash of a qualified type name or member name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash a fully qualified type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_constants::TYPE))
    }

    /// Hash a member name (method, field or property).
    #[inline]
    pub fn from_member(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), hash_constants::MEMBER))
    }

    /// Whether this is the empty hash.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}
