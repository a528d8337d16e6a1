//! `try`, `using` and `lock`.

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, Span, SpecialType, WellKnownType};

use crate::error::{LoweringError, Result};
use crate::lower::ExpressionLowering;

impl ExpressionLowering<'_> {
    /// `TryCatch`, `TryFinally` or `TryCatchFinally`.
    pub(super) fn lower_try(&mut self, stmt: &TryStmt, span: Span) -> Result<BoundExpr> {
        let body = self.lower_block(&stmt.body)?;
        let mut catches = Vec::with_capacity(stmt.catches.len());
        for clause in &stmt.catches {
            catches.push(self.lower_catch(clause, span)?);
        }
        let finally = match &stmt.finally {
            Some(finally) => Some(self.lower_block(finally)?),
            None => None,
        };

        let factory = FactoryType::Expression;
        match (catches.is_empty(), finally) {
            (false, None) => {
                let catches = self.array_of(WellKnownType::CatchBlock, catches, span);
                Ok(self.factory(factory, "TryCatch", vec![body, catches], span))
            }
            (true, Some(finally)) => Ok(self.factory(factory, "TryFinally", vec![body, finally], span)),
            (false, Some(finally)) => {
                let catches = self.array_of(WellKnownType::CatchBlock, catches, span);
                Ok(self.factory(factory, "TryCatchFinally", vec![body, finally, catches], span))
            }
            (true, None) => Err(LoweringError::Unhandled { node: "try without catch or finally", span }),
        }
    }

    /// `Catch(variable|typeof(T), body[, filter])`. A clause without a
    /// variable still scopes its type; one without a type catches `object`.
    fn lower_catch(&mut self, clause: &CatchClause, span: Span) -> Result<BoundExpr> {
        self.with_scope(|this| {
            let target = match clause.local {
                Some(local) => this.declare_variable(local, span)?,
                None => {
                    let ty = clause
                        .exception_type
                        .unwrap_or_else(|| this.symbols.special(SpecialType::Object));
                    this.type_of(ty, span)
                }
            };
            let body = this.lower_block(&clause.body)?;
            let mut args = vec![target, body];
            if let Some(filter) = &clause.filter {
                args.push(this.lower_expr(filter)?);
            }
            Ok(this.factory(FactoryType::Expression, "Catch", args, span))
        })
    }

    /// `Using(variable|null, resource, body)`.
    ///
    /// Declarations nest one `Using` per resource with the first outermost,
    /// so the last-declared resource is released first.
    pub(super) fn lower_using(&mut self, stmt: &UsingStmt, span: Span) -> Result<BoundExpr> {
        match &stmt.expression {
            Some(resource) => {
                let resource = self.lower_expr(resource)?;
                let body = self.lower_stmt_expr(&stmt.body)?;
                let variable = self.null_of(WellKnownType::ParameterExpression, span);
                Ok(self.factory(FactoryType::CSharpStatement, "Using", vec![variable, resource, body], span))
            }
            None => self.lower_using_declarations(&stmt.declarations, &stmt.body, span),
        }
    }

    fn lower_using_declarations(
        &mut self,
        declarations: &[LocalDeclaration],
        body: &BoundStmt,
        span: Span,
    ) -> Result<BoundExpr> {
        let Some((first, rest)) = declarations.split_first() else {
            return self.lower_stmt_expr(body);
        };
        let resource = first
            .initializer
            .as_ref()
            .ok_or(LoweringError::Unhandled { node: "using declaration without initializer", span: first.span })?;

        self.with_scope(|this| {
            let resource = this.lower_expr(resource)?;
            let variable = this.declare_variable(first.local, first.span)?;
            let inner = this.lower_using_declarations(rest, body, span)?;
            Ok(this.factory(
                FactoryType::CSharpStatement,
                "Using",
                vec![variable, resource, inner],
                first.span,
            ))
        })
    }

    pub(super) fn lower_lock(&mut self, stmt: &LockStmt, span: Span) -> Result<BoundExpr> {
        let argument = self.lower_expr(&stmt.argument)?;
        let body = self.lower_stmt_expr(&stmt.body)?;
        Ok(self.factory(FactoryType::CSharpStatement, "Lock", vec![argument, body], span))
    }
}
