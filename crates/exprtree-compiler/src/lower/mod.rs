//! Lowering of quoted lambdas into build-expressions.
//!
//! [`ExpressionLowering`] turns the body of a lambda converted to an
//! expression-tree type into a bound expression that, when evaluated,
//! constructs the equivalent tree through the factory grammar.
//!
//! ## Architecture
//!
//! ```text
//! quoted lambda
//!     │
//!     ▼
//! lower_lambda ──► LambdaContext (prologue, labels, breakables)
//!     │
//!     ├──► stmt::*  ──► CSharpStatement / Expression block factories
//!     └──► expr::*  ──► Expression / CSharpExpression / Dynamic factories
//!                          │
//!                          ▼
//!                      factory()  resolves overloads in the SymbolTable
//! ```
//!
//! Each lambda produces
//! `Sequence(temps, [temp = init...], Expression.Lambda<D>(body, params))`,
//! where the temporaries hold its parameters, block variables, label
//! targets and conditional receivers.
//!
//! Failures never escape: [`ExpressionLowering::lower`] reports a diagnostic
//! and hands back the original node.

mod bindings;
mod context;
mod expr;
mod factory;
mod stmt;

pub use bindings::{BindingTable, ScopeMark, VariableKey};
pub use context::{Breakable, BreakableKind, LambdaContext};

use exprtree_core::bound::*;
use exprtree_core::{
    Capabilities, DiagnosticBag, DiagnosticCode, FactoryType, LabelId, LocalId, MethodId, Span,
    SpecialType, SymbolTable, TypeId, WellKnownType,
};
use tracing::debug;

use crate::depth::DepthGuard;
use crate::error::{LoweringError, Result};
use crate::options::CompilerOptions;

/// A factory member lowering needed and could not find.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingMember {
    pub type_name: String,
    pub member: String,
}

/// Builds expression-tree construction code for quoted lambdas.
pub struct ExpressionLowering<'a> {
    symbols: &'a mut SymbolTable,
    caps: &'a Capabilities,
    depth: DepthGuard,
    bindings: BindingTable,
    /// Lambdas being lowered, innermost last
    contexts: Vec<LambdaContext>,
    missing: Vec<MissingMember>,
}

impl<'a> ExpressionLowering<'a> {
    pub fn new(symbols: &'a mut SymbolTable, caps: &'a Capabilities, options: &CompilerOptions) -> Self {
        Self {
            symbols,
            caps,
            depth: DepthGuard::new(options.max_recursion_depth),
            bindings: BindingTable::new(),
            contexts: Vec::new(),
            missing: Vec::new(),
        }
    }

    /// Lower a quoted lambda, reporting any failure to `diagnostics`.
    ///
    /// On failure the original node is returned unchanged.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn lower(&mut self, node: &BoundExpr, diagnostics: &mut DiagnosticBag) -> BoundExpr {
        let result = self.try_lower(node);
        let tree = match result {
            Ok(tree) => tree,
            Err(err) => {
                debug!(%err, "lowering failed");
                match err {
                    LoweringError::RecursionTooDeep { .. } => {
                        diagnostics.add(DiagnosticCode::RecursionTooDeep, node.span);
                    }
                    other => {
                        diagnostics.add_with_args(
                            DiagnosticCode::InternalLoweringFailure,
                            other.span(),
                            [other.to_string()],
                        );
                    }
                }
                return node.clone();
            }
        };

        if self.missing.is_empty() && self.matches_target(&tree, node) {
            return tree;
        }

        if self.missing.is_empty() {
            self.record_missing(FactoryType::Expression.name(), "Lambda");
        }
        for missing in self.missing.drain(..) {
            diagnostics.add_with_args(
                DiagnosticCode::MissingFactoryMember,
                node.span,
                [missing.type_name, missing.member],
            );
        }
        node.clone()
    }

    /// Lower a quoted lambda, returning the raw error on failure.
    ///
    /// Missing factory members do not fail this call; they are collected
    /// and the affected subtrees replaced by bad nodes.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn try_lower(&mut self, node: &BoundExpr) -> Result<BoundExpr> {
        self.bindings.clear();
        self.contexts.clear();
        self.missing.clear();
        self.depth = DepthGuard::new(self.depth.limit());

        let (lambda_node, lambda) = quoted_lambda(node).ok_or(LoweringError::Unhandled {
            node: "expression that is not a quoted lambda",
            span: node.span,
        })?;
        let delegate = node
            .ty
            .and_then(|t| self.symbols.expression_tree_delegate(t))
            .ok_or(LoweringError::Unhandled { node: "lambda without a delegate type", span: node.span })?;
        self.lower_lambda(lambda_node.span, lambda, delegate)
    }

    /// Factory members that were needed but not found by the last call.
    pub fn missing_members(&self) -> &[MissingMember] {
        &self.missing
    }

    fn matches_target(&self, tree: &BoundExpr, node: &BoundExpr) -> bool {
        match (tree.ty, node.ty) {
            (Some(built), Some(target)) => self.symbols.is_assignable(built, target),
            _ => true,
        }
    }

    fn record_missing(&mut self, type_name: &str, member: &str) {
        let entry = MissingMember { type_name: type_name.to_string(), member: member.to_string() };
        if !self.missing.contains(&entry) {
            debug!(type_name, member, "missing factory member");
            self.missing.push(entry);
        }
    }

    // =========================================================================
    // Scopes
    // =========================================================================

    /// Run `f` in a nested binding scope, restoring bindings even on error.
    fn with_scope<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mark = self.bindings.mark();
        let result = f(self);
        self.bindings.restore(mark);
        result
    }

    /// Run `f` inside a loop or switch.
    ///
    /// Returns `f`'s result with the break and continue targets, each a null
    /// `LabelTarget` if nothing jumped to it.
    fn with_breakable<T, F>(&mut self, kind: BreakableKind, span: Span, f: F) -> Result<(T, BoundExpr, BoundExpr)>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        self.context(span)?.breakables.push(Breakable::new(kind));
        let result = f(self);
        let breakable = self.context(span)?.breakables.pop();
        let value = result?;

        let label_ty = self.known(WellKnownType::LabelTarget);
        let (break_label, continue_label) = match breakable {
            Some(b) => (b.break_label, b.continue_label),
            None => (None, None),
        };
        Ok((
            value,
            break_label.unwrap_or_else(|| BoundExpr::null(span, label_ty)),
            continue_label.unwrap_or_else(|| BoundExpr::null(span, label_ty)),
        ))
    }

    fn context(&mut self, span: Span) -> Result<&mut LambdaContext> {
        self.contexts
            .last_mut()
            .ok_or(LoweringError::Unhandled { node: "statement outside a lambda", span })
    }

    fn is_lowering(&self, method: MethodId) -> bool {
        self.contexts.iter().any(|c| c.symbol == method)
    }

    // =========================================================================
    // Temporaries
    // =========================================================================

    /// Add a temporary of type `ty` to the current lambda's prologue.
    fn hoist(&mut self, ty: TypeId, hint: &str, init: BoundExpr, span: Span) -> Result<BoundExpr> {
        let local = self.symbols.synthesize_local(ty, hint);
        self.context(span)?.prologue.push((local, init));
        Ok(BoundExpr::local(span, local, ty))
    }

    /// Declare `local` as a block variable and bind it.
    fn declare_variable(&mut self, local: LocalId, span: Span) -> Result<BoundExpr> {
        let def = self.symbols.local(local);
        let (name, ty) = (def.name.clone(), def.ty);
        let type_of = self.type_of(ty, span);
        let name_expr = self.string(&name, span);
        let init = self.factory(FactoryType::Expression, "Variable", vec![type_of, name_expr], span);
        let param_ty = self.known(WellKnownType::ParameterExpression);
        let variable = self.hoist(param_ty, &name, init, span)?;
        self.bindings.bind(VariableKey::Local(local), variable.clone());
        Ok(variable)
    }

    fn declare_variables(&mut self, locals: &[LocalId], span: Span) -> Result<Vec<BoundExpr>> {
        locals.iter().map(|l| self.declare_variable(*l, span)).collect()
    }

    /// The shared target for source label `label`.
    fn label_target(&mut self, label: LabelId, span: Span) -> Result<BoundExpr> {
        if let Some(target) = self.context(span)?.labels.get(&label) {
            return Ok(target.clone());
        }
        let name = self.symbols.label(label).name.clone();
        let void = self.symbols.special(SpecialType::Void);
        let target = self.new_label(void, &name, span)?;
        self.context(span)?.labels.insert(label, target.clone());
        Ok(target)
    }

    /// The current lambda's return target.
    fn return_target(&mut self, span: Span) -> Result<BoundExpr> {
        if let Some(target) = &self.context(span)?.return_target {
            return Ok(target.clone());
        }
        let ty = self.context(span)?.return_type;
        let target = self.new_label(ty, "return", span)?;
        self.context(span)?.return_target = Some(target.clone());
        Ok(target)
    }

    fn new_label(&mut self, ty: TypeId, name: &str, span: Span) -> Result<BoundExpr> {
        let type_of = self.type_of(ty, span);
        let name_expr = self.string(name, span);
        let init = self.factory(FactoryType::Expression, "Label", vec![type_of, name_expr], span);
        let label_ty = self.known(WellKnownType::LabelTarget);
        self.hoist(label_ty, name, init, span)
    }

    fn break_target(&mut self, span: Span) -> Result<BoundExpr> {
        let index = self
            .context(span)?
            .innermost_breakable()
            .ok_or(LoweringError::NoEnclosingBreakable { statement: "break", span })?;
        if let Some(label) = &self.context(span)?.breakables[index].break_label {
            return Ok(label.clone());
        }
        let void = self.symbols.special(SpecialType::Void);
        let label = self.new_label(void, "break", span)?;
        self.context(span)?.breakables[index].break_label = Some(label.clone());
        Ok(label)
    }

    fn continue_target(&mut self, span: Span) -> Result<BoundExpr> {
        let index = self
            .context(span)?
            .innermost_loop()
            .ok_or(LoweringError::NoEnclosingBreakable { statement: "continue", span })?;
        if let Some(label) = &self.context(span)?.breakables[index].continue_label {
            return Ok(label.clone());
        }
        let void = self.symbols.special(SpecialType::Void);
        let label = self.new_label(void, "continue", span)?;
        self.context(span)?.breakables[index].continue_label = Some(label.clone());
        Ok(label)
    }
}

/// The lambda inside a node converted to an expression-tree type.
fn quoted_lambda(node: &BoundExpr) -> Option<(&BoundExpr, &LambdaExpr)> {
    match &node.kind {
        ExprKind::Conversion(c) if c.conversion.kind == ConversionKind::AnonymousFunction => {
            c.operand.as_lambda().map(|lambda| (&c.operand, lambda))
        }
        ExprKind::Lambda(lambda) => Some((node, lambda)),
        _ => None,
    }
}
