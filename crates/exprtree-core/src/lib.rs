//! Expression-tree core model
//!
//! Shared types for the expression-tree passes: the symbol table the bound
//! tree refers into, the bound tree itself, diagnostics, capability probes
//! and the factory grammar catalog.
//!
//! ## Modules
//!
//! - [`bound`]: Bound expressions and statements, operators and conversions
//! - [`capabilities`]: Memoized probes for optional factory grammars
//! - [`constant`]: Compile-time constant values
//! - [`diagnostics`]: Diagnostic codes, diagnostics and the diagnostic bag
//! - [`factory_catalog`]: Installs the factory grammar into a symbol table
//! - [`span`]: Source locations
//! - [`symbols`]: Arena symbol table with typed ids
//! - [`type_hash`]: Deterministic name hashing for lookups
//! - [`types`]: Type definitions and kinds
//! - [`well_known`]: Names of reflection, expression and factory types

pub mod bound;
pub mod capabilities;
pub mod constant;
pub mod diagnostics;
pub mod factory_catalog;
pub mod span;
pub mod symbols;
pub mod type_hash;
pub mod types;
pub mod well_known;

pub use bound::{BoundBlock, BoundExpr, BoundStmt, ExprKind, StmtKind};
pub use capabilities::{Capabilities, Capability};
pub use constant::ConstantValue;
pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCode, Severity};
pub use factory_catalog::FactoryGrammar;
pub use span::Span;
pub use symbols::{
    FieldId, LabelId, LocalId, MethodFlags, MethodId, MethodKind, ParamId, PropertyId, RefKind,
    SymbolTable, TypeProbe,
};
pub use type_hash::TypeHash;
pub use types::{SpecialType, TypeDef, TypeFlags, TypeId, TypeKind};
pub use well_known::{FactoryType, WellKnownType};
