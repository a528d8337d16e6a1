//! Lambdas.
//!
//! Every lambda, the quoted one and each nested inside it, is lowered in
//! its own [`LambdaContext`] and emits its own prologue sequence. A nested
//! lambda converted to an expression-tree type is additionally quoted.

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, LocalId, ParamId, Span, TypeId, WellKnownType};
use tracing::debug;

use crate::error::{LoweringError, Result};
use crate::lower::{ExpressionLowering, LambdaContext, VariableKey};

/// Lower a lambda whose node or conversion has type `target`.
pub(super) fn lower_lambda_as(
    lowering: &mut ExpressionLowering<'_>,
    span: Span,
    lambda: &LambdaExpr,
    target: Option<TypeId>,
) -> Result<BoundExpr> {
    let target = target.ok_or(LoweringError::Unhandled { node: "lambda without a target type", span })?;
    match lowering.symbols.expression_tree_delegate(target) {
        Some(delegate) => {
            let inner = lowering.lower_lambda(span, lambda, delegate)?;
            Ok(lowering.factory(FactoryType::Expression, "Quote", vec![inner], span))
        }
        None => lowering.lower_lambda(span, lambda, target),
    }
}

impl ExpressionLowering<'_> {
    /// `Sequence(temps, [temp = init...], Expression.Lambda<D>(body, params))`.
    pub(crate) fn lower_lambda(&mut self, span: Span, lambda: &LambdaExpr, delegate: TypeId) -> Result<BoundExpr> {
        let def = self.symbols.method(lambda.symbol);
        let (return_type, params) = (def.return_type, def.params.clone());
        debug!(lambda = %def.name, params = params.len(), "lowering lambda");

        self.contexts.push(LambdaContext::new(lambda.symbol, return_type));
        let result = self.with_scope(|this| {
            let mut variables = Vec::with_capacity(params.len());
            for param in &params {
                variables.push(this.declare_parameter(*param, span)?);
            }
            let body = this.lower_body(&lambda.body)?;
            let variables = this.parameters(variables, span);
            Ok(this.factory_generic(FactoryType::Expression, "Lambda", &[delegate], vec![body, variables], span))
        });
        let context = self.contexts.pop();
        let built = result?;

        let prologue = context.map(|c| c.prologue).unwrap_or_default();
        Ok(self.with_prologue(prologue, built, span))
    }

    fn declare_parameter(&mut self, param: ParamId, span: Span) -> Result<BoundExpr> {
        let def = self.symbols.param(param);
        let (name, ty) = (def.name.clone(), def.ty);
        let type_of = self.type_of(ty, span);
        let name_expr = self.string(&name, span);
        let init = self.factory(FactoryType::Expression, "Parameter", vec![type_of, name_expr], span);
        let param_ty = self.known(WellKnownType::ParameterExpression);
        let variable = self.hoist(param_ty, &name, init, span)?;
        self.bindings.bind(VariableKey::Parameter(param), variable.clone());
        Ok(variable)
    }

    fn with_prologue(&self, prologue: Vec<(LocalId, BoundExpr)>, value: BoundExpr, span: Span) -> BoundExpr {
        if prologue.is_empty() {
            return value;
        }
        let mut locals = Vec::with_capacity(prologue.len());
        let mut assignments = Vec::with_capacity(prologue.len());
        for (local, init) in prologue {
            let ty = self.symbols.local(local).ty;
            locals.push(local);
            assignments.push(BoundExpr::assign(span, BoundExpr::local(span, local, ty), init));
        }
        BoundExpr::sequence(span, locals, assignments, value)
    }
}
