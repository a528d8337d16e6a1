//! Legality pass: rejects constructs the lowering engine cannot translate.
//!
//! The pass walks a whole method body. Most rules only apply inside a
//! *quoted region*, the body of a lambda converted to an expression-tree
//! type. Capture rules for static local functions and the self-assignment
//! warning apply everywhere.
//!
//! ## State
//!
//! ```text
//! LegalityChecker
//!     ├── in_quoted_region        saved and restored around each region
//!     ├── reported_unsafe         one pointer diagnostic per region
//!     └── static_local_function   innermost enclosing static local function
//! ```
//!
//! The pass never mutates the tree and always runs to completion, except
//! for the recursion-depth cancellation which the caller turns into one
//! diagnostic.

mod assignment;
mod calls;
mod captures;

use exprtree_core::bound::*;
use exprtree_core::{
    Capabilities, Capability, DiagnosticBag, DiagnosticCode, MethodFlags, MethodId, RefKind, Span,
    SymbolTable, TypeId, WellKnownType,
};
use tracing::debug;

use crate::depth::DepthGuard;
use crate::error::Result;
use crate::options::CompilerOptions;

/// Walks a bound tree and reports legality diagnostics.
pub struct LegalityChecker<'a> {
    symbols: &'a SymbolTable,
    caps: &'a Capabilities,
    options: &'a CompilerOptions,
    diagnostics: &'a mut DiagnosticBag,
    depth: DepthGuard,
    in_quoted_region: bool,
    reported_unsafe: bool,
    static_local_function: Option<MethodId>,
}

impl<'a> LegalityChecker<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        caps: &'a Capabilities,
        options: &'a CompilerOptions,
        diagnostics: &'a mut DiagnosticBag,
    ) -> Self {
        Self {
            symbols,
            caps,
            options,
            diagnostics,
            depth: DepthGuard::new(options.max_recursion_depth),
            in_quoted_region: false,
            reported_unsafe: false,
            static_local_function: None,
        }
    }

    /// Check a whole method body.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_block(&mut self, block: &BoundBlock) -> Result<()> {
        self.visit_block(block)
    }

    /// Check one expression, entering a quoted region if it is a lambda
    /// conversion to an expression-tree type.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn check_expr(&mut self, expr: &BoundExpr) -> Result<()> {
        self.visit_expr(expr)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn report(&mut self, code: DiagnosticCode, span: Span) {
        self.diagnostics.add(code, span);
    }

    fn report_with(&mut self, code: DiagnosticCode, span: Span, arg: &str) {
        self.diagnostics.add_with_args(code, span, [arg]);
    }

    fn has(&self, capability: Capability) -> bool {
        self.caps.has(self.symbols, capability)
    }

    /// Report `code` unless `capability` is available.
    fn require(&mut self, capability: Capability, code: DiagnosticCode, span: Span) {
        if !self.has(capability) {
            self.report(code, span);
        }
    }

    /// Pointer operations are reported once per quoted region.
    fn report_unsafe(&mut self, span: Span) {
        if !self.reported_unsafe {
            self.reported_unsafe = true;
            self.report(DiagnosticCode::PointerOperation, span);
        }
    }

    fn is_expression_tree(&self, ty: Option<TypeId>) -> bool {
        ty.is_some_and(|t| self.symbols.is_expression_tree(t))
    }

    /// Run `f` inside a quoted region, restoring the previous state after.
    fn in_region<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        let saved = (self.in_quoted_region, self.reported_unsafe);
        self.in_quoted_region = true;
        self.reported_unsafe = false;
        let result = f(self);
        (self.in_quoted_region, self.reported_unsafe) = saved;
        result
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn visit_expr(&mut self, expr: &BoundExpr) -> Result<()> {
        self.depth.enter(expr.span)?;
        let result = self.visit_expr_inner(expr);
        self.depth.exit();
        result
    }

    fn visit_opt(&mut self, expr: Option<&BoundExpr>) -> Result<()> {
        match expr {
            Some(expr) => self.visit_expr(expr),
            None => Ok(()),
        }
    }

    fn visit_all(&mut self, exprs: &[BoundExpr]) -> Result<()> {
        for expr in exprs {
            self.visit_expr(expr)?;
        }
        Ok(())
    }

    /// An `Index` value other than a `^i` literal, which reports itself.
    fn is_index_value(&self, index: &BoundExpr) -> bool {
        !matches!(index.kind, ExprKind::FromEndIndex(_))
            && index.ty.is_some()
            && index.ty == self.symbols.well_known(WellKnownType::Index)
    }

    /// Checks that depend only on the node's type.
    fn check_type(&mut self, expr: &BoundExpr) {
        if !self.in_quoted_region {
            return;
        }
        let Some(ty) = expr.ty else { return };
        let symbols = self.symbols;
        if symbols.is_ref_like(ty) {
            self.report_with(DiagnosticCode::RefStruct, expr.span, symbols.type_name(ty));
        }
        if symbols.is_pointer(ty) {
            self.report_unsafe(expr.span);
        }
    }

    fn visit_expr_inner(&mut self, expr: &BoundExpr) -> Result<()> {
        self.check_type(expr);
        let region = self.in_quoted_region;
        let span = expr.span;

        match &expr.kind {
            ExprKind::Literal(_)
            | ExprKind::DefaultValue
            | ExprKind::NameOf(_)
            | ExprKind::TypeOf(_)
            | ExprKind::MethodInfo(_)
            | ExprKind::FieldInfo(_)
            | ExprKind::ParameterInfo(_)
            | ExprKind::ImplicitReceiver
            | ExprKind::ConditionalReceiver { .. } => Ok(()),

            ExprKind::SizeOf { constant, .. } => {
                if region && constant.is_none() {
                    self.report(DiagnosticCode::NonConstantSizeOf, span);
                }
                Ok(())
            }

            ExprKind::This => {
                self.check_this_capture(span);
                Ok(())
            }
            ExprKind::Base => {
                self.check_this_capture(span);
                if region {
                    self.report(DiagnosticCode::BaseAccess, span);
                }
                Ok(())
            }
            ExprKind::Local(local) => {
                self.check_local_capture(*local, span);
                Ok(())
            }
            ExprKind::Parameter(param) => {
                self.check_parameter_capture(*param, span);
                Ok(())
            }

            ExprKind::Unary(unary) => {
                if region && unary.op.flags.contains(OperatorFlags::DYNAMIC) {
                    self.require(Capability::DynamicExpressions, DiagnosticCode::DynamicOperation, span);
                }
                self.visit_expr(&unary.operand)
            }
            ExprKind::Binary(_) => self.visit_binary_chain(expr),
            ExprKind::Conversion(conversion) => self.visit_conversion(expr, conversion),
            ExprKind::As(operand) => self.visit_expr(operand),
            ExprKind::Is(is) => self.visit_expr(&is.operand),
            ExprKind::IsPattern(operand) => {
                if region {
                    self.report(DiagnosticCode::PatternMatching, span);
                }
                self.visit_expr(operand)
            }
            ExprKind::Conditional(c) => {
                self.visit_expr(&c.condition)?;
                self.visit_expr(&c.consequence)?;
                self.visit_expr(&c.alternative)
            }
            ExprKind::NullCoalescing(n) => {
                self.visit_expr(&n.left)?;
                self.visit_expr(&n.right)
            }
            ExprKind::NullCoalescingAssignment(a) => self.visit_null_coalescing_assignment(expr, a),
            ExprKind::Assignment(a) => self.visit_assignment(expr, a),
            ExprKind::CompoundAssignment(c) => self.visit_compound_assignment(expr, c),
            ExprKind::IncrementDecrement(i) => self.visit_increment(expr, i),
            ExprKind::DeconstructionAssignment(d) => self.visit_deconstruction(expr, d),

            ExprKind::Call(call) => self.visit_call(expr, call),
            ExprKind::ObjectCreation(creation) => self.visit_object_creation(expr, creation),
            ExprKind::NewTypeParameter(initializer) => self.visit_opt(initializer.as_deref()),
            ExprKind::AnonymousObjectCreation(anon) => self.visit_all(&anon.args),
            ExprKind::DelegateCreation(creation) => self.visit_delegate_creation(expr, creation),
            ExprKind::MethodGroup(group) => {
                self.check_method_group(span, &group.methods);
                self.visit_opt(group.receiver.as_ref())
            }

            ExprKind::ObjectInitializer(members) => self.visit_all(members),
            ExprKind::ObjectInitializerMember(member) => {
                if region && !member.args.is_empty() {
                    self.report(DiagnosticCode::DictionaryInitializer, span);
                }
                self.visit_all(&member.args)
            }
            ExprKind::CollectionInitializer(elements) => self.visit_all(elements),
            ExprKind::CollectionElementInitializer(element) => self.visit_collection_element(expr, element),
            ExprKind::ArrayCreation(creation) => {
                if region && creation.initializer.is_some() {
                    let rank = expr.ty.and_then(|t| self.symbols.array_rank(t)).unwrap_or(1);
                    if rank > 1 {
                        self.require(
                            Capability::ExtendedExpressions,
                            DiagnosticCode::MultiDimensionalArrayInitializer,
                            span,
                        );
                    }
                }
                self.visit_all(&creation.bounds)?;
                self.visit_opt(creation.initializer.as_ref())
            }
            ExprKind::ArrayInitialization(items) => self.visit_all(items),
            ExprKind::ArrayAccess(access) => {
                if region && access.indices.iter().any(|i| self.is_index_value(i)) {
                    self.require(Capability::ExtendedExpressions, DiagnosticCode::IndexOrRange, span);
                }
                self.visit_expr(&access.array)?;
                self.visit_all(&access.indices)
            }
            ExprKind::ArrayLength(array) => self.visit_expr(array),

            ExprKind::FieldAccess(access) => self.visit_opt(access.receiver.as_ref()),
            ExprKind::PropertyAccess(access) => self.visit_property_access(expr, access),
            ExprKind::IndexerAccess(access) => self.visit_indexer_access(expr, access),
            ExprKind::ConditionalAccess(access) => {
                if region {
                    self.require(Capability::ExtendedExpressions, DiagnosticCode::NullPropagation, span);
                }
                self.visit_expr(&access.receiver)?;
                self.visit_expr(&access.access)
            }
            ExprKind::FromEndIndex(operand) => {
                if region {
                    self.require(Capability::ExtendedExpressions, DiagnosticCode::IndexOrRange, span);
                }
                self.visit_expr(operand)
            }
            ExprKind::Range(range) => {
                if region {
                    self.require(Capability::ExtendedExpressions, DiagnosticCode::IndexOrRange, span);
                }
                self.visit_opt(range.left.as_ref())?;
                self.visit_opt(range.right.as_ref())
            }

            ExprKind::Lambda(lambda) => {
                if self.is_expression_tree(expr.ty) {
                    self.visit_quoted_lambda(expr, lambda)
                } else {
                    self.visit_lambda(expr, lambda)
                }
            }

            ExprKind::ThrowExpression(operand) => {
                if region {
                    self.require(Capability::ExtendedExpressions, DiagnosticCode::ThrowExpression, span);
                }
                self.visit_expr(operand)
            }
            ExprKind::Discard => {
                if region {
                    self.require(Capability::ExtendedExpressions, DiagnosticCode::Discard, span);
                }
                Ok(())
            }
            ExprKind::OutVariableDeclaration(local) => {
                if region {
                    self.report(DiagnosticCode::OutVariable, span);
                }
                self.check_local_capture(*local, span);
                Ok(())
            }
            ExprKind::TupleLiteral(items) => {
                if region {
                    self.report(DiagnosticCode::TupleLiteral, span);
                }
                self.visit_all(items)
            }
            ExprKind::TupleBinary(tuple) => {
                if region {
                    self.report(DiagnosticCode::TupleBinaryOperator, span);
                }
                self.visit_expr(&tuple.left)?;
                self.visit_expr(&tuple.right)
            }
            ExprKind::SwitchExpression(switch) => {
                if region {
                    self.report(DiagnosticCode::SwitchExpression, span);
                }
                self.visit_expr(&switch.governing)?;
                self.visit_all(&switch.arms)
            }
            ExprKind::Dynamic(dynamic) => self.visit_dynamic(expr, dynamic),

            ExprKind::PointerIndirection(operand) | ExprKind::AddressOf(operand) => {
                if region {
                    self.report_unsafe(span);
                }
                self.visit_expr(operand)
            }
            ExprKind::PointerElementAccess(access) => {
                if region {
                    self.report_unsafe(span);
                }
                self.visit_expr(&access.pointer)?;
                self.visit_expr(&access.index)
            }
            ExprKind::MakeRef(operand) => self.visit_typed_reference(span, "__makeref", operand),
            ExprKind::RefType(operand) => self.visit_typed_reference(span, "__reftype", operand),
            ExprKind::RefValue(operand) => self.visit_typed_reference(span, "__refvalue", operand),
            ExprKind::ArgList => {
                if region {
                    self.report(DiagnosticCode::ArgList, span);
                }
                Ok(())
            }
            ExprKind::ArgListOperator(args) => {
                if region {
                    self.report(DiagnosticCode::ArgList, span);
                }
                self.visit_all(args)
            }

            ExprKind::Sequence(sequence) => {
                self.visit_all(&sequence.side_effects)?;
                self.visit_expr(&sequence.value)
            }
            ExprKind::Bad(children) => self.visit_all(children),
        }
    }

    /// Walk a left-associative operator chain without recursing on the left.
    fn visit_binary_chain(&mut self, expr: &BoundExpr) -> Result<()> {
        let mut current = expr;
        loop {
            let ExprKind::Binary(binary) = &current.kind else {
                return self.visit_expr(current);
            };
            if !std::ptr::eq(current, expr) {
                self.check_type(current);
            }
            if self.in_quoted_region && binary.op.is_dynamic() {
                self.require(Capability::DynamicExpressions, DiagnosticCode::DynamicOperation, current.span);
            }
            if self.in_quoted_region && binary.op.flags.contains(OperatorFlags::POINTER) {
                self.report_unsafe(current.span);
            }
            self.visit_expr(&binary.right)?;
            current = &binary.left;
        }
    }

    fn visit_conversion(&mut self, expr: &BoundExpr, conversion: &ConversionExpr) -> Result<()> {
        let kind = conversion.conversion.kind;

        if kind == ConversionKind::AnonymousFunction && self.is_expression_tree(expr.ty) {
            if let ExprKind::Lambda(lambda) = &conversion.operand.kind {
                return self.visit_quoted_lambda(&conversion.operand, lambda);
            }
        }

        if self.in_quoted_region {
            if kind.is_tuple() {
                self.report(DiagnosticCode::TupleConversion, expr.span);
            } else if kind.is_dynamic() {
                self.require(Capability::DynamicExpressions, DiagnosticCode::DynamicOperation, expr.span);
            } else if kind.is_pointer() {
                self.report_unsafe(expr.span);
            }
        }
        self.visit_expr(&conversion.operand)
    }

    fn visit_typed_reference(&mut self, span: Span, keyword: &str, operand: &BoundExpr) -> Result<()> {
        if self.in_quoted_region {
            self.report_with(DiagnosticCode::TypedReference, span, keyword);
        }
        self.visit_expr(operand)
    }

    fn visit_dynamic(&mut self, expr: &BoundExpr, dynamic: &DynamicExpr) -> Result<()> {
        if self.in_quoted_region {
            self.require(Capability::DynamicExpressions, DiagnosticCode::DynamicOperation, expr.span);
        }
        match &dynamic.operation {
            DynamicOperation::InvokeMember { receiver, args, .. }
            | DynamicOperation::Invoke { receiver, args }
            | DynamicOperation::GetIndex { receiver, args } => {
                self.visit_expr(receiver)?;
                for arg in args {
                    self.visit_expr(&arg.expr)?;
                }
                Ok(())
            }
            DynamicOperation::GetMember { receiver, .. } => self.visit_expr(receiver),
            DynamicOperation::ObjectCreation { args } => {
                for arg in args {
                    self.visit_expr(&arg.expr)?;
                }
                Ok(())
            }
        }
    }

    // =========================================================================
    // Lambdas
    // =========================================================================

    /// A lambda converted to an expression-tree type: enter a quoted region.
    fn visit_quoted_lambda(&mut self, expr: &BoundExpr, lambda: &LambdaExpr) -> Result<()> {
        debug!(span = %expr.span, "entering quoted region");
        self.in_region(|this| this.visit_lambda(expr, lambda))
    }

    fn visit_lambda(&mut self, expr: &BoundExpr, lambda: &LambdaExpr) -> Result<()> {
        let span = expr.span;
        if self.in_quoted_region {
            let symbols = self.symbols;
            let method = symbols.method(lambda.symbol);
            if lambda.is_anonymous_method {
                self.report(DiagnosticCode::AnonymousMethod, span);
            } else if method.flags.contains(MethodFlags::ASYNC) {
                self.report(DiagnosticCode::AsyncLambda, span);
            } else if !lambda.is_expression_bodied {
                self.require(Capability::ExtendedExpressions, DiagnosticCode::StatementBody, span);
            }

            for &param in &method.params {
                let def = symbols.param(param);
                if def.ref_kind != RefKind::None {
                    self.report_with(DiagnosticCode::ByRefParameter, span, &def.name);
                }
                if symbols.is_ref_like(def.ty) {
                    self.report_with(DiagnosticCode::RefStruct, span, symbols.type_name(def.ty));
                }
            }
        }
        self.with_function(lambda.symbol, |this| this.visit_block(&lambda.body))
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn visit_block(&mut self, block: &BoundBlock) -> Result<()> {
        for stmt in &block.statements {
            self.visit_stmt(stmt)?;
        }
        Ok(())
    }

    fn visit_stmt(&mut self, stmt: &BoundStmt) -> Result<()> {
        self.depth.enter(stmt.span)?;
        let result = self.visit_stmt_inner(stmt);
        self.depth.exit();
        result
    }

    fn visit_stmt_opt(&mut self, stmt: Option<&BoundStmt>) -> Result<()> {
        match stmt {
            Some(stmt) => self.visit_stmt(stmt),
            None => Ok(()),
        }
    }

    fn visit_declaration(&mut self, decl: &LocalDeclaration) -> Result<()> {
        self.visit_opt(decl.initializer.as_ref())
    }

    fn visit_stmt_inner(&mut self, stmt: &BoundStmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Block(block) => self.visit_block(block),
            StmtKind::List(stmts) => {
                for stmt in stmts {
                    self.visit_stmt(stmt)?;
                }
                Ok(())
            }
            StmtKind::SequencePoint(inner) => self.visit_stmt_opt(inner.as_deref()),
            StmtKind::Expression(expr) => self.visit_expr(expr),
            StmtKind::LocalDeclaration(decl) => self.visit_declaration(decl),
            StmtKind::MultipleLocalDeclarations(decls) => {
                for decl in decls {
                    self.visit_declaration(decl)?;
                }
                Ok(())
            }
            StmtKind::Return { value, .. } => self.visit_opt(value.as_ref()),
            StmtKind::If(s) => {
                self.visit_expr(&s.condition)?;
                self.visit_stmt(&s.consequence)?;
                self.visit_stmt_opt(s.alternative.as_ref())
            }
            StmtKind::While(s) | StmtKind::DoWhile(s) => {
                self.visit_expr(&s.condition)?;
                self.visit_stmt(&s.body)
            }
            StmtKind::For(s) => {
                self.visit_stmt_opt(s.initializer.as_ref())?;
                self.visit_opt(s.condition.as_ref())?;
                self.visit_stmt_opt(s.increment.as_ref())?;
                self.visit_stmt(&s.body)
            }
            StmtKind::ForEach(s) => {
                self.visit_expr(&s.collection)?;
                self.visit_stmt(&s.body)
            }
            StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Goto(_)
            | StmtKind::Label(_)
            | StmtKind::Empty => Ok(()),
            StmtKind::Labeled { body, .. } => self.visit_stmt(body),
            StmtKind::Switch(s) => {
                self.visit_expr(&s.expression)?;
                for section in &s.sections {
                    for label in &section.labels {
                        if let SwitchLabel::Case(value) = label {
                            self.visit_expr(value)?;
                        }
                    }
                    for stmt in &section.statements {
                        self.visit_stmt(stmt)?;
                    }
                }
                Ok(())
            }
            StmtKind::Throw(value) => self.visit_opt(value.as_ref()),
            StmtKind::Try(s) => {
                self.visit_block(&s.body)?;
                for catch in &s.catches {
                    self.visit_opt(catch.filter.as_ref())?;
                    self.visit_block(&catch.body)?;
                }
                match &s.finally {
                    Some(finally) => self.visit_block(finally),
                    None => Ok(()),
                }
            }
            StmtKind::Using(s) => {
                for decl in &s.declarations {
                    self.visit_declaration(decl)?;
                }
                self.visit_opt(s.expression.as_ref())?;
                self.visit_stmt(&s.body)
            }
            StmtKind::Lock(s) => {
                self.visit_expr(&s.argument)?;
                self.visit_stmt(&s.body)
            }
            StmtKind::LocalFunction(f) => {
                if self.in_quoted_region {
                    let symbols = self.symbols;
                    self.report_with(DiagnosticCode::LocalFunction, stmt.span, &symbols.method(f.symbol).name);
                }
                self.visit_local_function(f)
            }
        }
    }
}
