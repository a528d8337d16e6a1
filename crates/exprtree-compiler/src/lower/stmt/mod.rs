//! Statement lowering.
//!
//! Statements lower to factory calls collected into the enclosing block's
//! expression list. Statement lists and sequence points are transparent:
//! their children are spliced into the parent list.
//!
//! A lambda body goes through [`ExpressionLowering::lower_body`], which keeps
//! the single-expression shapes compact and otherwise builds a block ending
//! in the return label.

mod jumps;
mod loops;
mod protected;
mod switch;

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, Span, SpecialType};

use super::ExpressionLowering;
use crate::error::{LoweringError, Result};

/// Flatten statement lists and sequence points into `out`.
fn flatten<'s>(statements: &'s [BoundStmt], out: &mut Vec<&'s BoundStmt>) {
    for statement in statements {
        match &statement.kind {
            StmtKind::List(items) => flatten(items, out),
            StmtKind::SequencePoint(Some(inner)) => flatten(std::slice::from_ref(inner.as_ref()), out),
            StmtKind::SequencePoint(None) => {}
            _ => out.push(statement),
        }
    }
}

fn is_generated_void_return(statement: &BoundStmt) -> bool {
    matches!(statement.kind, StmtKind::Return { value: None, compiler_generated: true })
}

impl ExpressionLowering<'_> {
    /// Lower the body of the lambda on top of the context stack.
    ///
    /// `=> e` and `{ return e; }` lower to `e` alone, as does `e;` followed
    /// by a compiler-generated `return;`. Otherwise the body is a block; a
    /// trailing compiler-generated return is folded into the block's tail,
    /// and the return label is appended if any `return` jumped to it.
    pub(crate) fn lower_body(&mut self, body: &BoundBlock) -> Result<BoundExpr> {
        let span = body.span;
        let mut statements = Vec::with_capacity(body.statements.len());
        flatten(&body.statements, &mut statements);

        if body.locals.is_empty() {
            // `x => F(x)` on a void delegate binds with a generated `return;`.
            let compact = match statements.as_slice() {
                [only, last] if is_generated_void_return(last) => Some(*only),
                [only] => Some(*only),
                _ => None,
            };
            if let Some(only) = compact {
                match &only.kind {
                    StmtKind::Return { value: Some(value), .. } => return self.lower_expr(value),
                    StmtKind::Expression(expr) => return self.lower_expr(expr),
                    _ => {}
                }
            }
        }

        let tail = match statements.last().copied().map(|s| &s.kind) {
            Some(StmtKind::Return { value, compiler_generated: true }) => {
                let value = value.as_ref();
                statements.pop();
                Some(value)
            }
            _ => None,
        };

        let return_type = self.context(span)?.return_type;
        let void = self.symbols.special(SpecialType::Void);
        let returns_value = return_type != void;

        self.with_scope(|this| {
            let variables = this.declare_variables(&body.locals, span)?;
            let mut exprs = Vec::with_capacity(statements.len() + 1);
            for statement in &statements {
                this.lower_stmt(statement, &mut exprs)?;
            }

            let tail = match tail.flatten() {
                Some(value) => Some(this.lower_expr(value)?),
                None => None,
            };
            let return_label = this.context(span)?.return_target.clone();
            let mut has_value = false;
            match (return_label, tail) {
                (Some(label), tail) if returns_value => {
                    let value = match tail {
                        Some(value) => value,
                        None => this.default_of(return_type, span),
                    };
                    exprs.push(this.factory(FactoryType::Expression, "Label", vec![label, value], span));
                    has_value = true;
                }
                (Some(label), _) => {
                    exprs.push(this.factory(FactoryType::Expression, "Label", vec![label], span));
                }
                (None, Some(value)) => {
                    exprs.push(value);
                    has_value = returns_value;
                }
                (None, None) => {}
            }

            if variables.is_empty() && exprs.is_empty() {
                return Ok(this.empty(span));
            }
            if exprs.is_empty() {
                exprs.push(this.empty(span));
            }
            let ty = if has_value { return_type } else { void };
            Ok(this.block(ty, variables, exprs, span))
        })
    }

    /// `Block(typeof(void), variables, statements)`, or `Empty()` for a block
    /// with neither.
    pub(crate) fn lower_block(&mut self, block: &BoundBlock) -> Result<BoundExpr> {
        let span = block.span;
        self.with_scope(|this| {
            let variables = this.declare_variables(&block.locals, span)?;
            let mut exprs = Vec::with_capacity(block.statements.len());
            for statement in &block.statements {
                this.lower_stmt(statement, &mut exprs)?;
            }
            this.make_block(variables, exprs, span)
        })
    }

    fn make_block(&mut self, variables: Vec<BoundExpr>, mut exprs: Vec<BoundExpr>, span: Span) -> Result<BoundExpr> {
        if variables.is_empty() && exprs.is_empty() {
            return Ok(self.empty(span));
        }
        if exprs.is_empty() {
            exprs.push(self.empty(span));
        }
        let void = self.symbols.special(SpecialType::Void);
        Ok(self.block(void, variables, exprs, span))
    }

    /// Lower an embedded statement to a single expression.
    pub(crate) fn lower_stmt_expr(&mut self, statement: &BoundStmt) -> Result<BoundExpr> {
        let mut exprs = Vec::with_capacity(1);
        self.lower_stmt(statement, &mut exprs)?;
        if exprs.len() == 1 {
            if let Some(only) = exprs.pop() {
                return Ok(only);
            }
        }
        self.make_block(Vec::new(), exprs, statement.span)
    }

    pub(crate) fn lower_stmt(&mut self, statement: &BoundStmt, out: &mut Vec<BoundExpr>) -> Result<()> {
        self.depth.enter(statement.span)?;
        let result = self.lower_stmt_inner(statement, out);
        self.depth.exit();
        result
    }

    fn lower_stmt_inner(&mut self, statement: &BoundStmt, out: &mut Vec<BoundExpr>) -> Result<()> {
        let span = statement.span;
        match &statement.kind {
            StmtKind::Block(block) => out.push(self.lower_block(block)?),
            StmtKind::List(items) => {
                for item in items {
                    self.lower_stmt(item, out)?;
                }
            }
            StmtKind::SequencePoint(Some(inner)) => self.lower_stmt(inner, out)?,
            StmtKind::SequencePoint(None) | StmtKind::Empty => {}
            StmtKind::Expression(expr) => out.push(self.lower_expr(expr)?),
            StmtKind::LocalDeclaration(declaration) => self.lower_local_declaration(declaration, out)?,
            StmtKind::MultipleLocalDeclarations(declarations) => {
                for declaration in declarations {
                    self.lower_local_declaration(declaration, out)?;
                }
            }
            StmtKind::If(stmt) => {
                let condition = self.lower_expr(&stmt.condition)?;
                let consequence = self.lower_stmt_expr(&stmt.consequence)?;
                let call = match &stmt.alternative {
                    Some(alternative) => {
                        let alternative = self.lower_stmt_expr(alternative)?;
                        self.factory(
                            FactoryType::Expression,
                            "IfThenElse",
                            vec![condition, consequence, alternative],
                            span,
                        )
                    }
                    None => self.factory(FactoryType::Expression, "IfThen", vec![condition, consequence], span),
                };
                out.push(call);
            }
            StmtKind::While(stmt) => out.push(self.lower_while(stmt, span)?),
            StmtKind::DoWhile(stmt) => out.push(self.lower_do(stmt, span)?),
            StmtKind::For(stmt) => out.push(self.lower_for(stmt, span)?),
            StmtKind::ForEach(stmt) => out.push(self.lower_foreach(stmt, span)?),
            StmtKind::Switch(stmt) => out.push(self.lower_switch(stmt, span)?),
            StmtKind::Return { value, .. } => out.push(self.lower_return(value.as_ref(), span)?),
            StmtKind::Break => out.push(self.lower_break(span)?),
            StmtKind::Continue => out.push(self.lower_continue(span)?),
            StmtKind::Goto(label) => out.push(self.lower_goto(*label, span)?),
            StmtKind::Label(label) => out.push(self.lower_label(*label, span)?),
            StmtKind::Labeled { label, body } => {
                out.push(self.lower_label(*label, span)?);
                self.lower_stmt(body, out)?;
            }
            StmtKind::Throw(value) => out.push(self.lower_throw(value.as_ref(), span)?),
            StmtKind::Try(stmt) => out.push(self.lower_try(stmt, span)?),
            StmtKind::Using(stmt) => out.push(self.lower_using(stmt, span)?),
            StmtKind::Lock(stmt) => out.push(self.lower_lock(stmt, span)?),
            StmtKind::LocalFunction(_) => {
                return Err(LoweringError::Unhandled { node: "local function", span });
            }
        }
        Ok(())
    }

    /// `int x = v;` assigns the variable its enclosing block declared.
    fn lower_local_declaration(&mut self, declaration: &LocalDeclaration, out: &mut Vec<BoundExpr>) -> Result<()> {
        let Some(initializer) = &declaration.initializer else {
            return Ok(());
        };
        let span = declaration.span;
        let ty = self.symbols.local(declaration.local).ty;
        let target = self.lower_expr(&BoundExpr::local(span, declaration.local, ty))?;
        let value = self.lower_expr(initializer)?;
        out.push(self.factory(FactoryType::CSharpStatement, "Assign", vec![target, value], span));
        Ok(())
    }
}
