//! Diagnostics reported by the legality and lowering passes.
//!
//! Every user-facing problem is a [`Diagnostic`]: a [`DiagnosticCode`], the
//! severity implied by that code, a source [`Span`] and the arguments that
//! fill the code's message template. Diagnostics are appended to a
//! [`DiagnosticBag`] as they are found and handed back ordered by location.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;

use crate::span::Span;

/// Stable diagnostic identifiers. Rendered as `ET` followed by the number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u16)]
pub enum DiagnosticCode {
    // Unconditionally unrepresentable constructs
    PointerOperation = 1,
    NonConstantSizeOf = 2,
    TypedReference = 3,
    ArgList = 4,
    LocalFunction = 5,
    RefReturningCall = 6,
    ComRefOmitted = 7,
    BaseAccess = 8,
    AnonymousMethod = 9,
    AsyncLambda = 10,
    TupleLiteral = 11,
    TupleConversion = 12,
    TupleBinaryOperator = 13,
    PatternMatching = 14,
    SwitchExpression = 15,
    OutVariable = 16,
    NullCoalescingAssignment = 17,
    RefStruct = 18,
    ByRefParameter = 19,
    RefAssignment = 20,
    OmittedPartialMethod = 21,
    IndexedProperty = 22,
    StaticAbstractMember = 23,
    DictionaryInitializer = 24,
    ExtensionAdd = 25,

    // Constructs that need an optional factory grammar
    DynamicOperation = 40,
    NamedArgument = 41,
    OptionalArgument = 42,
    ThrowExpression = 43,
    Discard = 44,
    StatementBody = 45,
    Assignment = 46,
    NullPropagation = 47,
    IndexOrRange = 48,
    MultiDimensionalArrayInitializer = 49,

    // Capture rules, reported everywhere
    StaticLocalFunctionCapturesVariable = 60,
    StaticLocalFunctionCapturesThis = 61,

    // Lowering failures
    MissingFactoryMember = 100,
    RecursionTooDeep = 101,
    InternalLoweringFailure = 102,

    // Warnings
    SelfAssignment = 500,
}

/// How severe a diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl DiagnosticCode {
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticCode::SelfAssignment => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Message template; `{0}`, `{1}` are replaced by the diagnostic's arguments.
    pub fn template(self) -> &'static str {
        use DiagnosticCode::*;
        match self {
            PointerOperation => "an expression tree may not contain an unsafe pointer operation",
            NonConstantSizeOf => "an expression tree may not contain a non-constant sizeof",
            TypedReference => "an expression tree may not contain '{0}'",
            ArgList => "an expression tree may not contain a variable-argument call",
            LocalFunction => "an expression tree may not contain a reference to local function '{0}'",
            RefReturningCall => "an expression tree may not contain a call or property that returns by reference",
            ComRefOmitted => "an expression tree may not contain a COM call with 'ref' omitted on an argument",
            BaseAccess => "an expression tree may not contain a base access",
            AnonymousMethod => "an anonymous method expression cannot be converted to an expression tree",
            AsyncLambda => "async lambda expressions cannot be converted to expression trees",
            TupleLiteral => "an expression tree may not contain a tuple literal",
            TupleConversion => "an expression tree may not contain a tuple conversion",
            TupleBinaryOperator => "an expression tree may not contain a tuple == or != operator",
            PatternMatching => "an expression tree may not contain an 'is' pattern-matching operator",
            SwitchExpression => "an expression tree may not contain a switch expression",
            OutVariable => "an expression tree may not contain an out variable declaration",
            NullCoalescingAssignment => "an expression tree may not contain a null-coalescing assignment",
            RefStruct => "an expression tree may not contain a value of ref struct type '{0}'",
            ByRefParameter => "cannot use ref, in or out parameter '{0}' inside an expression tree",
            RefAssignment => "an expression tree may not contain a ref assignment",
            OmittedPartialMethod => "an expression tree may not contain a call to partial method '{0}' without an implementation",
            IndexedProperty => "an expression tree may not contain an indexed property",
            StaticAbstractMember => "an expression tree may not contain an access of static abstract interface member '{0}'",
            DictionaryInitializer => "an expression tree may not contain a dictionary initializer",
            ExtensionAdd => "an expression tree may not contain an extension collection element initializer",
            DynamicOperation => "an expression tree may not contain a dynamic operation",
            NamedArgument => "an expression tree may not contain a named argument specification",
            OptionalArgument => "an expression tree may not contain a call that uses optional arguments",
            ThrowExpression => "an expression tree may not contain a throw-expression",
            Discard => "an expression tree may not contain a discard",
            StatementBody => "a lambda expression with a statement body cannot be converted to an expression tree",
            Assignment => "an expression tree may not contain an assignment operator",
            NullPropagation => "an expression tree lambda may not contain a null propagating operator",
            IndexOrRange => "an expression tree may not contain an index or range expression",
            MultiDimensionalArrayInitializer => "an expression tree may not contain a multidimensional array initializer",
            StaticLocalFunctionCapturesVariable => "a static local function cannot contain a reference to '{0}'",
            StaticLocalFunctionCapturesThis => "a static local function cannot contain a reference to 'this' or 'base'",
            MissingFactoryMember => "missing factory member '{0}.{1}' required to build the expression tree",
            RecursionTooDeep => "expression is too deeply nested to convert to an expression tree",
            InternalLoweringFailure => "internal error while building the expression tree: {0}",
            SelfAssignment => "assignment made to same variable; did you mean to assign something else?",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ET{:04}", u16::from(*self))
    }
}

/// A single diagnostic.
///
/// # Examples
///
/// ```
/// use exprtree_core::{Diagnostic, DiagnosticCode, Span};
///
/// let d = Diagnostic::with_args(DiagnosticCode::LocalFunction, Span::new(2, 7, 3), ["Helper"]);
/// assert_eq!(
///     d.to_string(),
///     "2:7: error ET0005: an expression tree may not contain a reference to local function 'Helper'"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub span: Span,
    pub args: Vec<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, span: Span) -> Self {
        Self { code, span, args: Vec::new() }
    }

    pub fn with_args<I, S>(code: DiagnosticCode, span: Span, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { code, span, args: args.into_iter().map(Into::into).collect() }
    }

    #[inline]
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// The code's template with the arguments substituted.
    pub fn message(&self) -> String {
        let mut message = self.code.template().to_string();
        for (i, arg) in self.args.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), arg);
        }
        message
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {}: {}", self.span, self.severity(), self.code, self.message())
    }
}

/// Append-only sink for diagnostics.
///
/// The passes only ever push; callers read the results back sorted by source
/// location. Sorting is stable, so diagnostics at the same location keep
/// the order in which they were reported.
#[derive(Debug, Default, Clone)]
pub struct DiagnosticBag {
    items: Vec<Diagnostic>,
    error_count: usize,
}

impl DiagnosticBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            self.error_count += 1;
        }
        self.items.push(diagnostic);
    }

    pub fn add(&mut self, code: DiagnosticCode, span: Span) {
        self.push(Diagnostic::new(code, span));
    }

    pub fn add_with_args<I, S>(&mut self, code: DiagnosticCode, span: Span, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(Diagnostic::with_args(code, span, args));
    }

    pub fn extend(&mut self, other: DiagnosticBag) {
        for diagnostic in other.items {
            self.push(diagnostic);
        }
    }

    #[inline]
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// Number of error-severity diagnostics; warnings are not counted.
    #[inline]
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Diagnostics in the order they were reported.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter()
    }

    /// Number of diagnostics with the given code.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.items.iter().filter(|d| d.code == code).count()
    }

    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.items.iter().any(|d| d.code == code)
    }

    /// Diagnostics ordered by source location.
    pub fn sorted(&self) -> Vec<Diagnostic> {
        let mut items = self.items.clone();
        items.sort_by_key(|d| d.span);
        items
    }

    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.items.sort_by_key(|d| d.span);
        self.items
    }
}

impl fmt::Display for DiagnosticBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in self.sorted() {
            writeln!(f, "{diagnostic}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_display_and_round_trip() {
        assert_eq!(DiagnosticCode::PointerOperation.to_string(), "ET0001");
        assert_eq!(DiagnosticCode::SelfAssignment.to_string(), "ET0500");
        assert_eq!(DiagnosticCode::try_from(100u16).ok(), Some(DiagnosticCode::MissingFactoryMember));
        assert!(DiagnosticCode::try_from(9999u16).is_err());
    }

    #[test]
    fn self_assignment_is_warning() {
        let mut bag = DiagnosticBag::new();
        bag.add(DiagnosticCode::SelfAssignment, Span::new(1, 1, 1));
        assert!(!bag.has_errors());
        assert_eq!(bag.len(), 1);
        bag.add(DiagnosticCode::BaseAccess, Span::new(1, 1, 1));
        assert_eq!(bag.error_count(), 1);
    }

    #[test]
    fn sorted_is_stable_by_location() {
        let mut bag = DiagnosticBag::new();
        bag.add(DiagnosticCode::TupleLiteral, Span::new(3, 1, 1));
        bag.add(DiagnosticCode::BaseAccess, Span::new(1, 4, 1));
        bag.add(DiagnosticCode::Discard, Span::new(1, 4, 1));
        let codes: Vec<_> = bag.into_sorted().into_iter().map(|d| d.code).collect();
        assert_eq!(
            codes,
            vec![DiagnosticCode::BaseAccess, DiagnosticCode::Discard, DiagnosticCode::TupleLiteral]
        );
    }

    #[test]
    fn message_substitutes_arguments() {
        let d = Diagnostic::with_args(DiagnosticCode::MissingFactoryMember, Span::default(), ["Expression", "Lambda"]);
        assert_eq!(
            d.message(),
            "missing factory member 'Expression.Lambda' required to build the expression tree"
        );
    }
}
