//! Rules for calls, member access and initializers in a quoted region.

use exprtree_core::bound::*;
use exprtree_core::{
    Capability, DiagnosticCode, MethodFlags, MethodId, MethodKind, RefKind, Span, TypeFlags,
};

use super::LegalityChecker;
use crate::error::Result;

impl LegalityChecker<'_> {
    /// Checks shared by calls, constructions and indexer getters.
    fn check_invocation(&mut self, span: Span, method: MethodId, args: &BoundArguments) {
        let symbols = self.symbols;
        let def = symbols.method(method);

        if def.kind == MethodKind::LocalFunction {
            self.report_with(DiagnosticCode::LocalFunction, span, &def.name);
        }
        if def.return_ref_kind != RefKind::None {
            self.report(DiagnosticCode::RefReturningCall, span);
        }
        if def.flags.contains(MethodFlags::OMITTED_PARTIAL) {
            self.report_with(DiagnosticCode::OmittedPartialMethod, span, &def.name);
        }
        if def.flags.contains(MethodFlags::STATIC | MethodFlags::ABSTRACT) {
            self.report_with(DiagnosticCode::StaticAbstractMember, span, &def.name);
        }
        if def.flags.contains(MethodFlags::VARARG) {
            self.report(DiagnosticCode::ArgList, span);
        }

        let com_import = def
            .containing_type
            .is_some_and(|t| symbols.ty(t).flags.contains(TypeFlags::COM_IMPORT));
        if com_import {
            let omitted = (0..args.len()).any(|i| {
                let param_ref = def
                    .params
                    .get(args.parameter_of(i))
                    .map(|p| symbols.param(*p).ref_kind)
                    .unwrap_or_default();
                param_ref == RefKind::Ref && args.ref_kind(i) == RefKind::None
            });
            if omitted {
                self.report(DiagnosticCode::ComRefOmitted, span);
            }
        }

        if args.has_names() {
            self.require(Capability::ExtendedExpressions, DiagnosticCode::NamedArgument, span);
        }
        if !args.defaults.is_empty() {
            self.require(Capability::ExtendedExpressions, DiagnosticCode::OptionalArgument, span);
        }
    }

    fn visit_arguments(&mut self, args: &BoundArguments) -> Result<()> {
        for arg in &args.exprs {
            self.visit_expr(arg)?;
        }
        Ok(())
    }

    pub(super) fn visit_call(&mut self, expr: &BoundExpr, call: &CallExpr) -> Result<()> {
        if self.in_quoted_region {
            self.check_invocation(expr.span, call.method, &call.args);
        }
        self.visit_opt(call.receiver.as_ref())?;
        self.visit_arguments(&call.args)
    }

    pub(super) fn visit_object_creation(&mut self, expr: &BoundExpr, creation: &ObjectCreationExpr) -> Result<()> {
        if self.in_quoted_region {
            if let Some(ctor) = creation.constructor {
                self.check_invocation(expr.span, ctor, &creation.args);
            }
        }
        self.visit_arguments(&creation.args)?;
        self.visit_opt(creation.initializer.as_ref())
    }

    pub(super) fn visit_delegate_creation(&mut self, expr: &BoundExpr, creation: &DelegateCreationExpr) -> Result<()> {
        // A method-group argument reports its own local-function use.
        if !matches!(creation.argument.kind, ExprKind::MethodGroup(_)) {
            if let Some(method) = creation.method {
                self.check_method_group(expr.span, &[method]);
            }
        }
        self.visit_expr(&creation.argument)
    }

    pub(super) fn check_method_group(&mut self, span: Span, methods: &[MethodId]) {
        if !self.in_quoted_region {
            return;
        }
        let symbols = self.symbols;
        if let Some(&method) = methods.first() {
            let def = symbols.method(method);
            if def.kind == MethodKind::LocalFunction {
                self.report_with(DiagnosticCode::LocalFunction, span, &def.name);
            }
            if def.flags.contains(MethodFlags::STATIC | MethodFlags::ABSTRACT) {
                self.report_with(DiagnosticCode::StaticAbstractMember, span, &def.name);
            }
        }
    }

    pub(super) fn visit_collection_element(&mut self, expr: &BoundExpr, element: &CollectionElementExpr) -> Result<()> {
        if self.in_quoted_region {
            let symbols = self.symbols;
            if symbols.method(element.add_method).flags.contains(MethodFlags::EXTENSION) {
                self.report(DiagnosticCode::ExtensionAdd, expr.span);
            }
        }
        self.visit_all(&element.args)
    }

    pub(super) fn visit_property_access(&mut self, expr: &BoundExpr, access: &PropertyAccessExpr) -> Result<()> {
        if self.in_quoted_region {
            let symbols = self.symbols;
            let property = symbols.property(access.property);
            if property.ref_kind != RefKind::None {
                self.report(DiagnosticCode::RefReturningCall, expr.span);
            }
            if property.is_static && property.is_abstract {
                self.report_with(DiagnosticCode::StaticAbstractMember, expr.span, &property.name);
            }
        }
        self.visit_opt(access.receiver.as_ref())
    }

    pub(super) fn visit_indexer_access(&mut self, expr: &BoundExpr, access: &IndexerAccessExpr) -> Result<()> {
        if self.in_quoted_region {
            let symbols = self.symbols;
            let indexer = symbols.property(access.indexer);
            if indexer.name != "Item" {
                self.report(DiagnosticCode::IndexedProperty, expr.span);
            }
            if indexer.ref_kind != RefKind::None {
                self.report(DiagnosticCode::RefReturningCall, expr.span);
            }
            if access.args.has_names() {
                self.require(Capability::ExtendedExpressions, DiagnosticCode::NamedArgument, expr.span);
            }
            if !access.args.defaults.is_empty() {
                self.require(Capability::ExtendedExpressions, DiagnosticCode::OptionalArgument, expr.span);
            }
        }
        self.visit_expr(&access.receiver)?;
        self.visit_arguments(&access.args)
    }
}
