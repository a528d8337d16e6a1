//! Capture rules for static local functions.
//!
//! A static local function may not read locals, parameters or `this` from
//! an enclosing function. These rules apply whether or not the code is in
//! a quoted region.

use exprtree_core::bound::LocalFunctionStmt;
use exprtree_core::{DiagnosticCode, LocalId, MethodFlags, MethodId, ParamId, Span};

use super::LegalityChecker;
use crate::error::Result;

impl LegalityChecker<'_> {
    /// Run `f` with `method` as the innermost function being checked.
    pub(super) fn with_function<F>(&mut self, method: MethodId, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let saved = self.static_local_function;
        if self.symbols.method(method).flags.contains(MethodFlags::STATIC_LOCAL_FUNCTION) {
            self.static_local_function = Some(method);
        }
        let result = f(self);
        self.static_local_function = saved;
        result
    }

    pub(super) fn visit_local_function(&mut self, f: &LocalFunctionStmt) -> Result<()> {
        self.with_function(f.symbol, |this| this.visit_block(&f.body))
    }

    /// Whether `owner` is `function` or a lambda or local function nested in it.
    fn is_within(&self, owner: MethodId, function: MethodId) -> bool {
        let mut current = Some(owner);
        while let Some(method) = current {
            if method == function {
                return true;
            }
            current = self.symbols.method(method).owner;
        }
        false
    }

    fn captures(&self, owner: Option<MethodId>) -> bool {
        match (self.static_local_function, owner) {
            (Some(function), Some(owner)) => !self.is_within(owner, function),
            _ => false,
        }
    }

    pub(super) fn check_local_capture(&mut self, local: LocalId, span: Span) {
        let symbols = self.symbols;
        let def = symbols.local(local);
        if def.is_const || def.synthesized {
            return;
        }
        if self.captures(def.owner) {
            self.report_with(DiagnosticCode::StaticLocalFunctionCapturesVariable, span, &def.name);
        }
    }

    pub(super) fn check_parameter_capture(&mut self, param: ParamId, span: Span) {
        let symbols = self.symbols;
        let def = symbols.param(param);
        if self.captures(def.owner) {
            self.report_with(DiagnosticCode::StaticLocalFunctionCapturesVariable, span, &def.name);
        }
    }

    pub(super) fn check_this_capture(&mut self, span: Span) {
        if self.static_local_function.is_some() {
            self.report(DiagnosticCode::StaticLocalFunctionCapturesThis, span);
        }
    }
}
