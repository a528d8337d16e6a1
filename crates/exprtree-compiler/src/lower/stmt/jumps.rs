//! `return`, `break`, `continue`, `goto`, labels and `throw`.
//!
//! Every jump target is a prologue temporary created on first use, so a
//! `goto` ahead of its label and the label itself share one `LabelTarget`.

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, LabelId, Span};

use crate::error::Result;
use crate::lower::ExpressionLowering;

impl ExpressionLowering<'_> {
    pub(super) fn lower_return(&mut self, value: Option<&BoundExpr>, span: Span) -> Result<BoundExpr> {
        let target = self.return_target(span)?;
        let args = match value {
            Some(value) => vec![target, self.lower_expr(value)?],
            None => vec![target],
        };
        Ok(self.factory(FactoryType::Expression, "Return", args, span))
    }

    pub(super) fn lower_break(&mut self, span: Span) -> Result<BoundExpr> {
        let target = self.break_target(span)?;
        Ok(self.factory(FactoryType::Expression, "Break", vec![target], span))
    }

    pub(super) fn lower_continue(&mut self, span: Span) -> Result<BoundExpr> {
        let target = self.continue_target(span)?;
        Ok(self.factory(FactoryType::Expression, "Continue", vec![target], span))
    }

    pub(super) fn lower_goto(&mut self, label: LabelId, span: Span) -> Result<BoundExpr> {
        let target = self.label_target(label, span)?;
        Ok(self.factory(FactoryType::Expression, "Goto", vec![target], span))
    }

    pub(super) fn lower_label(&mut self, label: LabelId, span: Span) -> Result<BoundExpr> {
        let target = self.label_target(label, span)?;
        Ok(self.factory(FactoryType::Expression, "Label", vec![target], span))
    }

    /// `throw e;`, or `Rethrow()` for a bare `throw;`.
    pub(super) fn lower_throw(&mut self, value: Option<&BoundExpr>, span: Span) -> Result<BoundExpr> {
        match value {
            Some(value) => {
                let value = self.lower_expr(value)?;
                Ok(self.factory(FactoryType::Expression, "Throw", vec![value], span))
            }
            None => Ok(self.factory(FactoryType::Expression, "Rethrow", Vec::new(), span)),
        }
    }
}
