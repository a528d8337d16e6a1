//! Assignment forms and the self-assignment warning.

use exprtree_core::bound::*;
use exprtree_core::{Capability, DiagnosticCode, Span, TypeId};

use super::LegalityChecker;
use crate::error::Result;

impl LegalityChecker<'_> {
    fn is_dynamic(&self, ty: Option<TypeId>) -> bool {
        ty.is_some_and(|t| self.symbols.is_dynamic(t))
    }

    fn warn_self_assignment(&mut self, span: Span) {
        if self.options.warn_on_self_assignment {
            self.report(DiagnosticCode::SelfAssignment, span);
        }
    }

    pub(super) fn visit_assignment(&mut self, expr: &BoundExpr, assignment: &AssignmentExpr) -> Result<()> {
        if self.in_quoted_region {
            if assignment.is_ref {
                self.report(DiagnosticCode::RefAssignment, expr.span);
            } else if !matches!(assignment.target.kind, ExprKind::ObjectInitializerMember(_)) {
                // Initializer members become `Bind`, which the core factory has.
                self.require(Capability::ExtendedExpressions, DiagnosticCode::Assignment, expr.span);
                if self.is_dynamic(assignment.target.ty) {
                    self.require(Capability::DynamicExpressions, DiagnosticCode::DynamicOperation, expr.span);
                }
            }
        }
        if !assignment.is_ref && assignment.target.same_variable(&assignment.value) {
            self.warn_self_assignment(expr.span);
        }
        self.visit_expr(&assignment.target)?;
        self.visit_expr(&assignment.value)
    }

    pub(super) fn visit_null_coalescing_assignment(
        &mut self,
        expr: &BoundExpr,
        assignment: &AssignmentExpr,
    ) -> Result<()> {
        if self.in_quoted_region {
            self.require(
                Capability::ExtendedExpressions,
                DiagnosticCode::NullCoalescingAssignment,
                expr.span,
            );
            if self.is_dynamic(assignment.target.ty) {
                self.require(Capability::DynamicExpressions, DiagnosticCode::DynamicOperation, expr.span);
            }
        }
        self.visit_expr(&assignment.target)?;
        self.visit_expr(&assignment.value)
    }

    pub(super) fn visit_compound_assignment(
        &mut self,
        expr: &BoundExpr,
        compound: &CompoundAssignmentExpr,
    ) -> Result<()> {
        if self.in_quoted_region {
            self.require(Capability::ExtendedExpressions, DiagnosticCode::Assignment, expr.span);
            if compound.op.is_dynamic() {
                self.require(Capability::DynamicExpressions, DiagnosticCode::DynamicOperation, expr.span);
            }
        }
        self.visit_expr(&compound.target)?;
        self.visit_expr(&compound.value)
    }

    pub(super) fn visit_increment(&mut self, expr: &BoundExpr, increment: &IncrementExpr) -> Result<()> {
        if self.in_quoted_region {
            self.require(Capability::ExtendedExpressions, DiagnosticCode::Assignment, expr.span);
            if self.is_dynamic(increment.operand.ty) {
                self.require(Capability::DynamicExpressions, DiagnosticCode::DynamicOperation, expr.span);
            }
        }
        self.visit_expr(&increment.operand)
    }

    /// `(a, b) = (b, a)` cannot be expressed with the factory grammar at all.
    pub(super) fn visit_deconstruction(
        &mut self,
        expr: &BoundExpr,
        deconstruction: &DeconstructionExpr,
    ) -> Result<()> {
        if self.in_quoted_region {
            self.report(DiagnosticCode::Assignment, expr.span);
        }
        if let ExprKind::TupleLiteral(values) = &deconstruction.value.kind {
            for (target, value) in deconstruction.targets.iter().zip(values) {
                if target.same_variable(value) {
                    self.warn_self_assignment(target.span);
                }
            }
        }
        for target in &deconstruction.targets {
            self.visit_expr(target)?;
        }
        self.visit_expr(&deconstruction.value)
    }
}

#[cfg(test)]
mod tests {
    use exprtree_core::bound::*;
    use exprtree_core::{Capabilities, DiagnosticBag, DiagnosticCode, Span, SpecialType, SymbolTable};

    use crate::legality::LegalityChecker;
    use crate::options::CompilerOptions;

    fn check(symbols: &SymbolTable, options: &CompilerOptions, expr: &BoundExpr) -> DiagnosticBag {
        let caps = Capabilities::new();
        let mut diagnostics = DiagnosticBag::new();
        LegalityChecker::new(symbols, &caps, options, &mut diagnostics)
            .check_expr(expr)
            .unwrap();
        diagnostics
    }

    #[test]
    fn self_assignment_warns_outside_regions() {
        let mut symbols = SymbolTable::new();
        let int = symbols.special(SpecialType::Int32);
        let x = symbols.declare_local("x", int, None);
        let assign = BoundExpr::assign(
            Span::new(1, 1, 5),
            BoundExpr::local(Span::new(1, 1, 1), x, int),
            BoundExpr::local(Span::new(1, 5, 1), x, int),
        );

        let diagnostics = check(&symbols, &CompilerOptions::default(), &assign);
        assert_eq!(diagnostics.count(DiagnosticCode::SelfAssignment), 1);
        assert!(!diagnostics.has_errors());

        let quiet = CompilerOptions::default().with_self_assignment_warning(false);
        assert!(check(&symbols, &quiet, &assign).is_empty());
    }

    #[test]
    fn deconstruction_warns_per_matching_element() {
        let mut symbols = SymbolTable::new();
        let int = symbols.special(SpecialType::Int32);
        let a = symbols.declare_local("a", int, None);
        let b = symbols.declare_local("b", int, None);
        let local = |id, col| BoundExpr::local(Span::new(1, col, 1), id, int);
        let swap = BoundExpr::new(
            Span::new(1, 1, 16),
            None,
            ExprKind::DeconstructionAssignment(Box::new(DeconstructionExpr {
                targets: vec![local(a, 2), local(b, 5)],
                value: BoundExpr::new(Span::new(1, 10, 6), None, ExprKind::TupleLiteral(vec![local(a, 11), local(a, 14)])),
            })),
        );

        let diagnostics = check(&symbols, &CompilerOptions::default(), &swap);
        assert_eq!(diagnostics.count(DiagnosticCode::SelfAssignment), 1);
        assert_eq!(diagnostics.sorted()[0].span, Span::new(1, 2, 1));
    }
}
