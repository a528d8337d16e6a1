//! Internal errors of the expression-tree passes.
//!
//! These are not user diagnostics. They signal that lowering cannot continue
//! (an unhandled node, a variable with no binding, recursion too deep) and
//! are converted into a single diagnostic at the boundary of one lambda.

use exprtree_core::Span;
use thiserror::Error;

/// Errors that abort lowering of one quoted lambda.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoweringError {
    /// The lowering engine has no translation for this node.
    #[error("at {span}: no expression-tree translation for {node}")]
    Unhandled { node: &'static str, span: Span },

    /// A variable was referenced with no live binding.
    #[error("at {span}: variable '{name}' has no binding in the current scope")]
    UnboundVariable { name: String, span: Span },

    /// `break` or `continue` outside any loop or switch.
    #[error("at {span}: '{statement}' has no enclosing loop or switch")]
    NoEnclosingBreakable { statement: &'static str, span: Span },

    /// The walk nested deeper than the configured limit.
    #[error("at {span}: nesting exceeds the limit of {limit}")]
    RecursionTooDeep { limit: usize, span: Span },
}

impl LoweringError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            LoweringError::Unhandled { span, .. }
            | LoweringError::UnboundVariable { span, .. }
            | LoweringError::NoEnclosingBreakable { span, .. }
            | LoweringError::RecursionTooDeep { span, .. } => *span,
        }
    }

    #[inline]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, LoweringError::RecursionTooDeep { .. })
    }
}

pub type Result<T> = std::result::Result<T, LoweringError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_location() {
        let err = LoweringError::Unhandled { node: "pointer indirection", span: Span::new(4, 2, 1) };
        assert_eq!(err.to_string(), "at 4:2: no expression-tree translation for pointer indirection");
        assert_eq!(err.span(), Span::new(4, 2, 1));
        assert!(!err.is_cancellation());
    }

    #[test]
    fn recursion_is_cancellation() {
        let err = LoweringError::RecursionTooDeep { limit: 8, span: Span::default() };
        assert!(err.is_cancellation());
    }
}
