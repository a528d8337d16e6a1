//! Variable bindings for lowering.
//!
//! Every source local and parameter visible inside a quoted lambda is bound
//! to the build-expression that evaluates to its `ParameterExpression`.
//! Scopes nest: entering a block records a mark, and leaving it undoes every
//! binding made since, restoring whatever each binding shadowed.

use exprtree_core::{BoundExpr, LocalId, ParamId};
use rustc_hash::FxHashMap;

/// A bindable variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKey {
    Local(LocalId),
    Parameter(ParamId),
}

/// Position in the undo log returned by [`BindingTable::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeMark(usize);

#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: FxHashMap<VariableKey, BoundExpr>,
    /// (key, binding it replaced), innermost last
    undo: Vec<(VariableKey, Option<BoundExpr>)>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, key: VariableKey, value: BoundExpr) {
        let previous = self.bindings.insert(key, value);
        self.undo.push((key, previous));
    }

    pub fn get(&self, key: VariableKey) -> Option<&BoundExpr> {
        self.bindings.get(&key)
    }

    pub fn mark(&self) -> ScopeMark {
        ScopeMark(self.undo.len())
    }

    /// Undo every binding made after `mark`.
    pub fn restore(&mut self, mark: ScopeMark) {
        while self.undo.len() > mark.0 {
            let Some((key, previous)) = self.undo.pop() else { break };
            match previous {
                Some(value) => {
                    self.bindings.insert(key, value);
                }
                None => {
                    self.bindings.remove(&key);
                }
            }
        }
    }

    /// Number of live bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.undo.clear();
    }
}
