//! Expression-tree compilation for quoted lambdas.
//!
//! A lambda converted to an expression-tree type is *quoted*: instead of
//! compiling to code, it compiles to code that builds a tree describing the
//! lambda at run time. [`ExpressionTreeCompiler`] runs the two passes that
//! make this happen over bound trees produced by an external binder.
//!
//! ## Architecture
//!
//! ```text
//! bound method body
//!     │
//!     ▼
//! LegalityChecker ──► diagnostics for unrepresentable constructs
//!     │
//!     ▼  (quoted lambdas without errors)
//! ExpressionLowering ──► build-expression
//!                          Sequence(temps, inits, Expression.Lambda<D>(...))
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let mut compiler = ExpressionTreeCompiler::new(&mut symbols, CompilerOptions::default());
//! let mut diagnostics = DiagnosticBag::new();
//! match compiler.compile_lambda(&quoted, &mut diagnostics) {
//!     LambdaOutcome::Lowered(tree) => emit(tree),
//!     outcome => keep(outcome.into_expr()),
//! }
//! ```

pub use exprtree_compiler::{
    CompilerOptions, DepthGuard, ExpressionLowering, LegalityChecker, LoweringError, MissingMember,
};
pub use exprtree_core as core;
pub use exprtree_core::{
    BoundBlock, BoundExpr, BoundStmt, Capabilities, Capability, Diagnostic, DiagnosticBag,
    DiagnosticCode, FactoryGrammar, Severity, Span, SymbolTable,
};

use tracing::{debug, trace};

/// What [`ExpressionTreeCompiler::compile_lambda`] did with a lambda.
#[derive(Debug, Clone, PartialEq)]
pub enum LambdaOutcome {
    /// The build-expression that constructs the tree.
    Lowered(BoundExpr),
    /// The legality pass reported errors; the original node.
    Rejected(BoundExpr),
    /// Lowering failed and reported one diagnostic; the original node.
    Failed(BoundExpr),
}

impl LambdaOutcome {
    #[inline]
    pub fn is_lowered(&self) -> bool {
        matches!(self, LambdaOutcome::Lowered(_))
    }

    pub fn expr(&self) -> &BoundExpr {
        match self {
            LambdaOutcome::Lowered(e) | LambdaOutcome::Rejected(e) | LambdaOutcome::Failed(e) => e,
        }
    }

    pub fn into_expr(self) -> BoundExpr {
        match self {
            LambdaOutcome::Lowered(e) | LambdaOutcome::Rejected(e) | LambdaOutcome::Failed(e) => e,
        }
    }
}

/// Runs the legality pass and lowering for one compilation.
///
/// Owns the compilation's capability cache, so each probe runs at most once.
pub struct ExpressionTreeCompiler<'a> {
    symbols: &'a mut SymbolTable,
    options: CompilerOptions,
    caps: Capabilities,
}

impl<'a> ExpressionTreeCompiler<'a> {
    pub fn new(symbols: &'a mut SymbolTable, options: CompilerOptions) -> Self {
        Self { symbols, options, caps: Capabilities::new() }
    }

    pub fn symbols(&self) -> &SymbolTable {
        self.symbols
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Run the legality pass over a whole method body.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_body(&mut self, body: &BoundBlock, diagnostics: &mut DiagnosticBag) {
        let result = LegalityChecker::new(self.symbols, &self.caps, &self.options, diagnostics).check_block(body);
        if let Err(err) = result {
            debug!(%err, "legality pass cancelled");
            diagnostics.add(DiagnosticCode::RecursionTooDeep, err.span());
        }
    }

    /// Lower one quoted lambda. On failure one diagnostic is reported and
    /// the original node returned.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn lower_quoted_lambda(&mut self, node: &BoundExpr, diagnostics: &mut DiagnosticBag) -> BoundExpr {
        ExpressionLowering::new(self.symbols, &self.caps, &self.options).lower(node, diagnostics)
    }

    /// Check then lower one quoted lambda. Lowering is skipped when the
    /// legality pass reports errors for it.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_lambda(&mut self, node: &BoundExpr, diagnostics: &mut DiagnosticBag) -> LambdaOutcome {
        let errors_before = diagnostics.error_count();
        let result = LegalityChecker::new(self.symbols, &self.caps, &self.options, diagnostics).check_expr(node);
        if let Err(err) = result {
            diagnostics.add(DiagnosticCode::RecursionTooDeep, err.span());
        }

        let errors = diagnostics.error_count() - errors_before;
        if errors > 0 {
            debug!(errors, "quoted lambda rejected");
            return LambdaOutcome::Rejected(node.clone());
        }

        let errors_before = diagnostics.error_count();
        let lowered = self.lower_quoted_lambda(node, diagnostics);
        if diagnostics.error_count() > errors_before {
            LambdaOutcome::Failed(lowered)
        } else {
            trace!("quoted lambda lowered");
            LambdaOutcome::Lowered(lowered)
        }
    }
}
