//! Recursion-depth guard for the tree walks.
//!
//! Both passes recurse once per nested node. Rather than risk overflowing
//! the host stack on pathological input, each recursive entry bumps a
//! counter and the walk cancels with [`LoweringError::RecursionTooDeep`]
//! once the configured limit is reached.

use exprtree_core::Span;

use crate::error::{LoweringError, Result};

#[derive(Debug, Clone)]
pub struct DepthGuard {
    depth: usize,
    limit: usize,
}

impl DepthGuard {
    pub fn new(limit: usize) -> Self {
        Self { depth: 0, limit }
    }

    /// Enter one level. Every successful `enter` must be paired with `exit`.
    pub fn enter(&mut self, span: Span) -> Result<()> {
        if self.depth >= self.limit {
            return Err(LoweringError::RecursionTooDeep { limit: self.limit, span });
        }
        self.depth += 1;
        Ok(())
    }

    pub fn exit(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced depth guard");
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_and_exit_balance() {
        let mut guard = DepthGuard::new(2);
        guard.enter(Span::default()).unwrap();
        guard.enter(Span::default()).unwrap();
        assert_eq!(guard.depth(), 2);
        guard.exit();
        guard.exit();
        assert_eq!(guard.depth(), 0);
    }

    #[test]
    fn limit_cancels() {
        let mut guard = DepthGuard::new(1);
        guard.enter(Span::default()).unwrap();
        let err = guard.enter(Span::new(9, 9, 1)).unwrap_err();
        assert_eq!(err, LoweringError::RecursionTooDeep { limit: 1, span: Span::new(9, 9, 1) });
        assert_eq!(guard.depth(), 1);
    }
}
