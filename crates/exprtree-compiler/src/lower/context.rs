//! Per-lambda lowering state.
//!
//! Each lambda being lowered, the quoted one and any nested inside it, gets
//! a [`LambdaContext`]. The context owns the lambda's prologue: the
//! temporaries that hold its `ParameterExpression`s, label targets and
//! conditional receivers, each paired with the factory call that creates
//! it. Labels are created on first use, so a loop with no `break` passes a
//! null break target.

use exprtree_core::{BoundExpr, LabelId, LocalId, MethodId, TypeId};
use rustc_hash::FxHashMap;

// ============================================================================
// Breakables
// ============================================================================

/// What a `break` inside the construct leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakableKind {
    Loop,
    Switch,
}

/// One enclosing loop or switch. A switch only ever has a break label;
/// `continue` inside a switch targets the nearest enclosing loop.
#[derive(Debug)]
pub struct Breakable {
    pub kind: BreakableKind,
    pub break_label: Option<BoundExpr>,
    pub continue_label: Option<BoundExpr>,
}

impl Breakable {
    pub fn new(kind: BreakableKind) -> Self {
        Self { kind, break_label: None, continue_label: None }
    }
}

// ============================================================================
// LambdaContext
// ============================================================================

#[derive(Debug)]
pub struct LambdaContext {
    pub symbol: MethodId,
    pub return_type: TypeId,
    /// Temporaries and their initializers, in creation order.
    pub prologue: Vec<(LocalId, BoundExpr)>,
    pub return_target: Option<BoundExpr>,
    /// Enclosing loops and switches, innermost last.
    pub breakables: Vec<Breakable>,
    pub labels: FxHashMap<LabelId, BoundExpr>,
    /// Active conditional-access receivers, innermost last.
    pub receivers: Vec<(u32, BoundExpr)>,
}

impl LambdaContext {
    pub fn new(symbol: MethodId, return_type: TypeId) -> Self {
        Self {
            symbol,
            return_type,
            prologue: Vec::new(),
            return_target: None,
            breakables: Vec::new(),
            labels: FxHashMap::default(),
            receivers: Vec::new(),
        }
    }

    /// Index of the innermost breakable `break` leaves.
    pub fn innermost_breakable(&self) -> Option<usize> {
        self.breakables.len().checked_sub(1)
    }

    /// Index of the innermost loop `continue` targets.
    pub fn innermost_loop(&self) -> Option<usize> {
        self.breakables
            .iter()
            .rposition(|b| b.kind == BreakableKind::Loop)
    }

    pub fn receiver(&self, id: u32) -> Option<&BoundExpr> {
        self.receivers
            .iter()
            .rev()
            .find(|(rid, _)| *rid == id)
            .map(|(_, expr)| expr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exprtree_core::{MethodFlags, MethodKind, SpecialType, SymbolTable};

    fn context() -> LambdaContext {
        let mut symbols = SymbolTable::new();
        let void = symbols.special(SpecialType::Void);
        let lambda = symbols.declare_method("<lambda>", None, void, MethodKind::Lambda, MethodFlags::empty());
        LambdaContext::new(lambda, void)
    }

    #[test]
    fn continue_skips_switches() {
        let mut ctx = context();
        assert_eq!(ctx.innermost_breakable(), None);
        ctx.breakables.push(Breakable::new(BreakableKind::Loop));
        ctx.breakables.push(Breakable::new(BreakableKind::Switch));
        assert_eq!(ctx.innermost_breakable(), Some(1));
        assert_eq!(ctx.innermost_loop(), Some(0));
    }

    #[test]
    fn no_loop_inside_bare_switch() {
        let mut ctx = context();
        ctx.breakables.push(Breakable::new(BreakableKind::Switch));
        assert_eq!(ctx.innermost_loop(), None);
    }
}
