//! Memoized probes for the optional factory grammars.
//!
//! A probe asks the symbol table whether a support type (or member) exists
//! and caches the answer for the rest of the compilation. An inconclusive
//! probe, where the reference that would define the type failed to load,
//! counts as present: the missing reference is reported elsewhere and a
//! second diagnostic here would only add noise.

use std::cell::Cell;
use tracing::trace;

use crate::symbols::{SymbolTable, TypeProbe};
use crate::well_known::WellKnownType;

/// An optional part of the factory grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Statement, assignment and parameter-binding factories.
    ExtendedExpressions,
    /// Dynamic-operation factories.
    DynamicExpressions,
    /// `MethodInfo.CreateDelegate` for delegate creation.
    MethodInfoCreateDelegate,
}

impl Capability {
    const COUNT: usize = 3;

    fn slot(self) -> usize {
        match self {
            Capability::ExtendedExpressions => 0,
            Capability::DynamicExpressions => 1,
            Capability::MethodInfoCreateDelegate => 2,
        }
    }
}

/// Per-compilation capability cache.
#[derive(Debug, Default)]
pub struct Capabilities {
    slots: [Cell<Option<bool>>; Capability::COUNT],
}

impl Capabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `capability` is available, probing `symbols` on first use.
    pub fn has(&self, symbols: &SymbolTable, capability: Capability) -> bool {
        let slot = &self.slots[capability.slot()];
        if let Some(known) = slot.get() {
            return known;
        }
        let available = probe(symbols, capability);
        trace!(?capability, available, "capability probed");
        slot.set(Some(available));
        available
    }

    /// Fix the answer for `capability` without probing.
    pub fn assume(&self, capability: Capability, available: bool) {
        self.slots[capability.slot()].set(Some(available));
    }

    /// Forget cached answers, e.g. after new references were added.
    pub fn reset(&self) {
        for slot in &self.slots {
            slot.set(None);
        }
    }
}

fn probe(symbols: &SymbolTable, capability: Capability) -> bool {
    let type_present = |ty: WellKnownType| match symbols.probe_type(ty.name()) {
        TypeProbe::Present(_) | TypeProbe::Unresolved => true,
        TypeProbe::Absent => false,
    };
    match capability {
        Capability::ExtendedExpressions => type_present(WellKnownType::CSharpExpression),
        Capability::DynamicExpressions => type_present(WellKnownType::DynamicCSharpExpression),
        Capability::MethodInfoCreateDelegate => symbols
            .well_known(WellKnownType::MethodInfo)
            .is_some_and(|method_info| !symbols.find_methods(method_info, "CreateDelegate").is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeFlags, TypeKind};

    #[test]
    fn absent_type_is_unavailable() {
        let symbols = SymbolTable::new();
        let caps = Capabilities::new();
        assert!(!caps.has(&symbols, Capability::ExtendedExpressions));
    }

    #[test]
    fn unresolved_reference_counts_as_present() {
        let mut symbols = SymbolTable::new();
        symbols.mark_unresolved_namespace("Microsoft.CSharp.Expressions");
        let caps = Capabilities::new();
        assert!(caps.has(&symbols, Capability::DynamicExpressions));
    }

    #[test]
    fn answers_are_memoized() {
        let mut symbols = SymbolTable::new();
        let caps = Capabilities::new();
        assert!(!caps.has(&symbols, Capability::ExtendedExpressions));
        symbols.declare_type(
            WellKnownType::CSharpExpression.name(),
            TypeKind::Class,
            TypeFlags::STATIC,
            None,
        );
        assert!(!caps.has(&symbols, Capability::ExtendedExpressions));
        caps.reset();
        assert!(caps.has(&symbols, Capability::ExtendedExpressions));
    }

    #[test]
    fn assume_overrides_probe() {
        let symbols = SymbolTable::new();
        let caps = Capabilities::new();
        caps.assume(Capability::ExtendedExpressions, true);
        assert!(caps.has(&symbols, Capability::ExtendedExpressions));
    }
}
