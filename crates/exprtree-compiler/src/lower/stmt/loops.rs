//! `while`, `do`, `for` and `foreach`.
//!
//! Each loop lowers its body inside a fresh breakable so `break` and
//! `continue` bind to the innermost loop; the targets come back as null
//! `LabelTarget`s when the body never jumps.

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, Span};

use crate::error::Result;
use crate::lower::{BreakableKind, ExpressionLowering};

impl ExpressionLowering<'_> {
    pub(super) fn lower_while(&mut self, stmt: &WhileStmt, span: Span) -> Result<BoundExpr> {
        let ((test, body), break_label, continue_label) = self.with_breakable(BreakableKind::Loop, span, |this| {
            let test = this.lower_expr(&stmt.condition)?;
            let body = this.lower_stmt_expr(&stmt.body)?;
            Ok((test, body))
        })?;
        Ok(self.factory(
            FactoryType::CSharpStatement,
            "While",
            vec![test, body, break_label, continue_label],
            span,
        ))
    }

    pub(super) fn lower_do(&mut self, stmt: &WhileStmt, span: Span) -> Result<BoundExpr> {
        let ((body, test), break_label, continue_label) = self.with_breakable(BreakableKind::Loop, span, |this| {
            let body = this.lower_stmt_expr(&stmt.body)?;
            let test = this.lower_expr(&stmt.condition)?;
            Ok((body, test))
        })?;
        Ok(self.factory(
            FactoryType::CSharpStatement,
            "Do",
            vec![body, test, break_label, continue_label],
            span,
        ))
    }

    /// `For(variables, initializers, test|null, increments, body, break, continue)`.
    pub(super) fn lower_for(&mut self, stmt: &ForStmt, span: Span) -> Result<BoundExpr> {
        self.with_scope(|this| {
            let variables = this.declare_variables(&stmt.locals, span)?;
            let (parts, break_label, continue_label) = this.with_breakable(BreakableKind::Loop, span, |this| {
                let mut initializers = Vec::new();
                if let Some(initializer) = &stmt.initializer {
                    this.lower_stmt(initializer, &mut initializers)?;
                }
                let test = this.lower_or_null(stmt.condition.as_ref(), span)?;
                let mut increments = Vec::new();
                if let Some(increment) = &stmt.increment {
                    this.lower_stmt(increment, &mut increments)?;
                }
                let body = this.lower_stmt_expr(&stmt.body)?;
                Ok((initializers, test, increments, body))
            })?;

            let (initializers, test, increments, body) = parts;
            let variables = this.parameters(variables, span);
            let initializers = this.expressions(initializers, span);
            let increments = this.expressions(increments, span);
            Ok(this.factory(
                FactoryType::CSharpStatement,
                "For",
                vec![variables, initializers, test, increments, body, break_label, continue_label],
                span,
            ))
        })
    }

    /// The collection is evaluated outside the iteration variable's scope.
    pub(super) fn lower_foreach(&mut self, stmt: &ForEachStmt, span: Span) -> Result<BoundExpr> {
        let collection = self.lower_expr(&stmt.collection)?;
        self.with_scope(|this| {
            let variable = this.declare_variable(stmt.iteration_variable, span)?;
            let (body, break_label, continue_label) =
                this.with_breakable(BreakableKind::Loop, span, |this| this.lower_stmt_expr(&stmt.body))?;
            Ok(this.factory(
                FactoryType::CSharpStatement,
                "ForEach",
                vec![variable, collection, body, break_label, continue_label],
                span,
            ))
        })
    }
}
