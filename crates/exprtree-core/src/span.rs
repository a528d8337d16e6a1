//! Source location tracking for diagnostics.
//!
//! Every bound node carries the [`Span`] of the syntax it was bound from so
//! that both passes can report against the original source.

use std::fmt;

/// A span of source code, represented by its starting position.
///
/// Ordering is by line, then column, then length, which is the order the
/// diagnostic bag hands diagnostics back in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
    /// Length in bytes.
    pub len: u32,
}

impl Span {
    /// Create a new span from a line, column, and length.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }

    /// Create a zero-length span at a position.
    #[inline]
    pub fn point(line: u32, col: u32) -> Self {
        Self { line, col, len: 0 }
    }

    /// Whether this span is empty (zero length).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The length of this span in bytes.
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(1, 5, 10);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());

        let empty = Span::point(1, 5);
        assert!(empty.is_empty());
    }

    #[test]
    fn span_display() {
        let span = Span::new(3, 15, 5);
        assert_eq!(format!("{}", span), "3:15");
    }

    #[test]
    fn spans_order_by_line_then_column() {
        let mut spans = vec![Span::new(2, 1, 1), Span::new(1, 9, 1), Span::new(1, 3, 4)];
        spans.sort();
        assert_eq!(spans, vec![Span::new(1, 3, 4), Span::new(1, 9, 1), Span::new(2, 1, 1)]);
    }
}
