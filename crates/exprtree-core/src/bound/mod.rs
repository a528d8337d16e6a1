//! The bound tree: typed, fully resolved expressions and statements.
//!
//! Both passes consume this model, and lowering produces it again: a
//! build-expression is a bound tree restricted to factory calls, array
//! creation, locals and sequences.

mod build;
pub mod expr;
pub mod operators;
pub mod stmt;

pub use expr::*;
pub use operators::*;
pub use stmt::*;
