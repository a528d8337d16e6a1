//! Expression-tree compiler passes.
//!
//! Two passes over a bound method body:
//!
//! - **Legality**: report every construct inside a quoted lambda that has no
//!   expression-tree form, or needs a factory library that is absent
//! - **Lowering**: turn a legal quoted lambda into a build-expression, the
//!   bound code that constructs the tree at run time through factory calls
//!
//! ## Modules
//!
//! - [`depth`]: recursion-depth guard shared by both walks
//! - [`error`]: internal errors that abort lowering of one lambda
//! - [`legality`]: the legality pass
//! - [`lower`]: the lowering engine
//! - [`options`]: per-compilation tunables

pub mod depth;
pub mod error;
pub mod legality;
pub mod lower;
pub mod options;

pub use depth::DepthGuard;
pub use error::{LoweringError, Result};
pub use legality::LegalityChecker;
pub use lower::{ExpressionLowering, MissingMember};
pub use options::{CompilerOptions, DEFAULT_MAX_RECURSION_DEPTH};
