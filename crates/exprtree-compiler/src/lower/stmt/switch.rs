//! `switch` statements.
//!
//! Each section becomes `SwitchCase(object[] tests, Expression[] body)`.
//! Case values are boxed constants; `default:` is the
//! `CSharpStatement.SwitchCaseDefaultValue` marker.

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, Span, SpecialType, WellKnownType};

use crate::error::{LoweringError, Result};
use crate::lower::{BreakableKind, ExpressionLowering};

const DEFAULT_MARKER: &str = "SwitchCaseDefaultValue";

impl ExpressionLowering<'_> {
    /// `Switch(value, break, variables, cases)`.
    pub(super) fn lower_switch(&mut self, stmt: &SwitchStmt, span: Span) -> Result<BoundExpr> {
        let value = self.lower_expr(&stmt.expression)?;
        self.with_scope(|this| {
            let variables = this.declare_variables(&stmt.locals, span)?;
            let (cases, break_label, _) = this.with_breakable(BreakableKind::Switch, span, |this| {
                let mut cases = Vec::with_capacity(stmt.sections.len());
                for section in &stmt.sections {
                    cases.push(this.lower_switch_section(section, span)?);
                }
                Ok(cases)
            })?;

            let variables = this.parameters(variables, span);
            let cases = this.array_of(WellKnownType::CSharpSwitchCase, cases, span);
            Ok(this.factory(
                FactoryType::CSharpStatement,
                "Switch",
                vec![value, break_label, variables, cases],
                span,
            ))
        })
    }

    fn lower_switch_section(&mut self, section: &SwitchSection, span: Span) -> Result<BoundExpr> {
        let mut tests = Vec::with_capacity(section.labels.len());
        for label in &section.labels {
            tests.push(self.switch_test(label, span)?);
        }
        let object = self.symbols.special(SpecialType::Object);
        let tests = self.array_of_type(object, tests, span);

        let body = self.with_scope(|this| {
            let variables = this.declare_variables(&section.locals, span)?;
            let mut exprs = Vec::with_capacity(section.statements.len());
            for statement in &section.statements {
                this.lower_stmt(statement, &mut exprs)?;
            }
            if variables.is_empty() {
                Ok(exprs)
            } else {
                Ok(vec![this.make_block(variables, exprs, span)?])
            }
        })?;
        let body = self.expressions(body, span);

        Ok(self.factory(FactoryType::CSharpStatement, "SwitchCase", vec![tests, body], span))
    }

    fn switch_test(&mut self, label: &SwitchLabel, span: Span) -> Result<BoundExpr> {
        match label {
            SwitchLabel::Case(value) => {
                let constant = value
                    .constant_value()
                    .ok_or(LoweringError::Unhandled { node: "non-constant case label", span: value.span })?;
                let literal = BoundExpr::literal(value.span, constant.clone(), value.ty);
                Ok(self.to_object(literal))
            }
            SwitchLabel::Default => {
                let owner = self.known(WellKnownType::CSharpStatement);
                let object = self.symbols.special(SpecialType::Object);
                match self.symbols.find_field(owner, DEFAULT_MARKER) {
                    Some(field) => Ok(BoundExpr::static_field(span, field, object)),
                    None => {
                        self.record_missing(WellKnownType::CSharpStatement.name(), DEFAULT_MARKER);
                        let error = self.symbols.error_type();
                        Ok(BoundExpr::bad(span, Vec::new(), Some(error)))
                    }
                }
            }
        }
    }
}
