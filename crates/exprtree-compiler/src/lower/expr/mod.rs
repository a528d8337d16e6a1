//! Expression lowering.
//!
//! [`ExpressionLowering::lower_expr`] dispatches on the bound node and hands
//! each construct to the submodule that builds its factory calls:
//!
//! - `binary`: unary and binary operators, enum promotion
//! - `conversion`: conversions, `as`/`is`, `??` and conversion lambdas
//! - `assignment`: simple, compound, `??=` and increment assignments
//! - `calls`: calls, invocations and delegate creation
//! - `init`: object, collection, anonymous-object and array creation
//! - `access`: fields, properties, indexers, arrays, `?.`, indices and ranges
//! - `lambda`: lambdas and the per-lambda prologue
//! - `dynamic`: late-bound operations

mod access;
mod assignment;
mod binary;
mod calls;
mod conversion;
mod dynamic;
mod init;
mod lambda;

use exprtree_core::bound::*;
use exprtree_core::{FactoryType, LocalId, ParamId, Span, SpecialType, TypeId};

use super::{ExpressionLowering, VariableKey};
use crate::error::{LoweringError, Result};

impl ExpressionLowering<'_> {
    pub(crate) fn lower_expr(&mut self, expr: &BoundExpr) -> Result<BoundExpr> {
        self.depth.enter(expr.span)?;
        let result = self.lower_expr_inner(expr);
        self.depth.exit();
        result
    }

    pub(crate) fn lower_all(&mut self, exprs: &[BoundExpr]) -> Result<Vec<BoundExpr>> {
        exprs.iter().map(|e| self.lower_expr(e)).collect()
    }

    /// Lower `expr`, or produce a null `Expression` when absent.
    pub(crate) fn lower_or_null(&mut self, expr: Option<&BoundExpr>, span: Span) -> Result<BoundExpr> {
        match expr {
            Some(expr) => self.lower_expr(expr),
            None => Ok(self.null_expression(span)),
        }
    }

    /// The node's type; untyped nodes are treated as `object`.
    pub(crate) fn type_or_object(&self, expr: &BoundExpr) -> TypeId {
        expr.ty
            .unwrap_or_else(|| self.symbols.special(SpecialType::Object))
    }

    fn lower_expr_inner(&mut self, expr: &BoundExpr) -> Result<BoundExpr> {
        let span = expr.span;

        if let Some(value) = expr.constant_value() {
            let ty = self.type_or_object(expr);
            let literal = BoundExpr::literal(span, value.clone(), expr.ty);
            return Ok(self.constant(literal, ty, span));
        }

        match &expr.kind {
            ExprKind::DefaultValue => {
                let ty = self.type_or_object(expr);
                Ok(self.default_of(ty, span))
            }
            ExprKind::TypeOf(_)
            | ExprKind::MethodInfo(_)
            | ExprKind::FieldInfo(_)
            | ExprKind::ParameterInfo(_)
            | ExprKind::This => {
                let ty = self.type_or_object(expr);
                Ok(self.constant(expr.clone(), ty, span))
            }
            ExprKind::Local(local) => self.lower_local(expr, *local),
            ExprKind::Parameter(param) => self.lower_parameter(expr, *param),
            ExprKind::ConditionalReceiver { id } => access::lower_receiver(self, expr, *id),

            ExprKind::Unary(unary) => binary::lower_unary(self, expr, unary),
            ExprKind::Binary(binary) => binary::lower_binary(self, expr, binary),
            ExprKind::Conversion(conversion) => conversion::lower_conversion(self, expr, conversion),
            ExprKind::As(operand) => conversion::lower_type_as(self, expr, operand),
            ExprKind::Is(is) => conversion::lower_type_is(self, expr, is),
            ExprKind::Conditional(c) => {
                let condition = self.lower_expr(&c.condition)?;
                let consequence = self.lower_expr(&c.consequence)?;
                let alternative = self.lower_expr(&c.alternative)?;
                Ok(self.factory(
                    FactoryType::Expression,
                    "Condition",
                    vec![condition, consequence, alternative],
                    span,
                ))
            }
            ExprKind::NullCoalescing(n) => conversion::lower_coalesce(self, expr, n),

            ExprKind::Assignment(a) => assignment::lower_assignment(self, expr, a),
            ExprKind::NullCoalescingAssignment(a) => assignment::lower_coalesce_assignment(self, expr, a),
            ExprKind::CompoundAssignment(c) => assignment::lower_compound(self, expr, c),
            ExprKind::IncrementDecrement(i) => assignment::lower_increment(self, expr, i),

            ExprKind::Call(call) => calls::lower_call(self, expr, call),
            ExprKind::DelegateCreation(creation) => calls::lower_delegate_creation(self, expr, creation),
            ExprKind::ObjectCreation(creation) => init::lower_object_creation(self, expr, creation),
            ExprKind::NewTypeParameter(initializer) => {
                init::lower_new_type_parameter(self, expr, initializer.as_deref())
            }
            ExprKind::AnonymousObjectCreation(anon) => init::lower_anonymous_object(self, expr, anon),
            ExprKind::ArrayCreation(creation) => init::lower_array_creation(self, expr, creation),

            ExprKind::ArrayAccess(access) => access::lower_array_access(self, expr, access),
            ExprKind::ArrayLength(array) => {
                let array = self.lower_expr(array)?;
                Ok(self.factory(FactoryType::Expression, "ArrayLength", vec![array], span))
            }
            ExprKind::FieldAccess(access) => access::lower_field(self, expr, access),
            ExprKind::PropertyAccess(access) => access::lower_property(self, expr, access),
            ExprKind::IndexerAccess(access) => access::lower_indexer(self, expr, access),
            ExprKind::ConditionalAccess(access) => access::lower_conditional_access(self, expr, access),
            ExprKind::FromEndIndex(operand) => access::lower_from_end(self, expr, operand),
            ExprKind::Range(range) => access::lower_range(self, expr, range),

            ExprKind::Lambda(lambda) => lambda::lower_lambda_as(self, span, lambda, expr.ty),

            ExprKind::ThrowExpression(operand) => {
                let operand = self.lower_expr(operand)?;
                let ty = self.type_or_object(expr);
                let type_of = self.type_of(ty, span);
                Ok(self.factory(FactoryType::Expression, "Throw", vec![operand, type_of], span))
            }
            ExprKind::Discard => {
                let ty = self.type_or_object(expr);
                let type_of = self.type_of(ty, span);
                Ok(self.factory(FactoryType::CSharpExpression, "Discard", vec![type_of], span))
            }
            ExprKind::Dynamic(dynamic) => dynamic::lower_dynamic(self, expr, dynamic),

            other => Err(LoweringError::Unhandled { node: unhandled_name(other), span }),
        }
    }

    fn lower_local(&mut self, expr: &BoundExpr, local: LocalId) -> Result<BoundExpr> {
        if let Some(bound) = self.bindings.get(VariableKey::Local(local)) {
            return Ok(bound.clone());
        }
        let def = self.symbols.local(local);
        match def.owner {
            Some(owner) if self.is_lowering(owner) => Err(LoweringError::UnboundVariable {
                name: def.name.clone(),
                span: expr.span,
            }),
            // Captured from outside the quoted lambda: a constant read.
            _ => {
                let ty = def.ty;
                Ok(self.constant(expr.clone(), ty, expr.span))
            }
        }
    }

    fn lower_parameter(&mut self, expr: &BoundExpr, param: ParamId) -> Result<BoundExpr> {
        if let Some(bound) = self.bindings.get(VariableKey::Parameter(param)) {
            return Ok(bound.clone());
        }
        let def = self.symbols.param(param);
        match def.owner {
            Some(owner) if self.is_lowering(owner) => Err(LoweringError::UnboundVariable {
                name: def.name.clone(),
                span: expr.span,
            }),
            _ => {
                let ty = def.ty;
                Ok(self.constant(expr.clone(), ty, expr.span))
            }
        }
    }
}

fn unhandled_name(kind: &ExprKind) -> &'static str {
    match kind {
        ExprKind::SizeOf { .. } => "non-constant sizeof",
        ExprKind::Base => "base access",
        ExprKind::ImplicitReceiver => "initializer receiver outside an initializer",
        ExprKind::IsPattern(_) => "pattern match",
        ExprKind::DeconstructionAssignment(_) => "deconstruction",
        ExprKind::MethodGroup(_) => "method group",
        ExprKind::ObjectInitializer(_) | ExprKind::ObjectInitializerMember(_) => "object initializer",
        ExprKind::CollectionInitializer(_) | ExprKind::CollectionElementInitializer(_) => {
            "collection initializer"
        }
        ExprKind::ArrayInitialization(_) => "array initializer",
        ExprKind::OutVariableDeclaration(_) => "out variable",
        ExprKind::TupleLiteral(_) => "tuple literal",
        ExprKind::TupleBinary(_) => "tuple comparison",
        ExprKind::SwitchExpression(_) => "switch expression",
        ExprKind::PointerIndirection(_)
        | ExprKind::AddressOf(_)
        | ExprKind::PointerElementAccess(_) => "pointer operation",
        ExprKind::MakeRef(_) | ExprKind::RefType(_) | ExprKind::RefValue(_) => "typed reference",
        ExprKind::ArgList | ExprKind::ArgListOperator(_) => "__arglist",
        ExprKind::Sequence(_) => "sequence",
        ExprKind::Bad(_) => "bad expression",
        _ => "expression",
    }
}
