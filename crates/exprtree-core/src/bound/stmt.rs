//! Bound statement nodes.

use crate::span::Span;
use crate::symbols::{LabelId, LocalId, MethodId};
use crate::types::TypeId;

use super::expr::BoundExpr;

#[derive(Debug, Clone, PartialEq)]
pub struct BoundStmt {
    pub span: Span,
    pub kind: StmtKind,
}

/// A block with the locals it declares.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BoundBlock {
    pub span: Span,
    pub locals: Vec<LocalId>,
    pub statements: Vec<BoundStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Block(BoundBlock),
    /// Statements with no scope of their own.
    List(Vec<BoundStmt>),
    /// Debugger step marker around an optional statement.
    SequencePoint(Option<Box<BoundStmt>>),
    Expression(BoundExpr),
    LocalDeclaration(LocalDeclaration),
    MultipleLocalDeclarations(Vec<LocalDeclaration>),
    Return { value: Option<BoundExpr>, compiler_generated: bool },
    If(Box<IfStmt>),
    While(Box<WhileStmt>),
    DoWhile(Box<WhileStmt>),
    For(Box<ForStmt>),
    ForEach(Box<ForEachStmt>),
    Break,
    Continue,
    Goto(LabelId),
    /// Label definition with no statement attached.
    Label(LabelId),
    Labeled { label: LabelId, body: Box<BoundStmt> },
    Switch(Box<SwitchStmt>),
    Throw(Option<BoundExpr>),
    Try(Box<TryStmt>),
    Using(Box<UsingStmt>),
    Lock(Box<LockStmt>),
    LocalFunction(Box<LocalFunctionStmt>),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalDeclaration {
    pub span: Span,
    pub local: LocalId,
    pub initializer: Option<BoundExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub condition: BoundExpr,
    pub consequence: BoundStmt,
    pub alternative: Option<BoundStmt>,
}

/// Shared shape of `while` and `do`.
#[derive(Debug, Clone, PartialEq)]
pub struct WhileStmt {
    pub condition: BoundExpr,
    pub body: BoundStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    /// Locals declared by the initializer.
    pub locals: Vec<LocalId>,
    pub initializer: Option<BoundStmt>,
    pub condition: Option<BoundExpr>,
    pub increment: Option<BoundStmt>,
    pub body: BoundStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForEachStmt {
    pub iteration_variable: LocalId,
    pub collection: BoundExpr,
    pub body: BoundStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwitchLabel {
    Case(BoundExpr),
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchSection {
    pub labels: Vec<SwitchLabel>,
    pub locals: Vec<LocalId>,
    pub statements: Vec<BoundStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub expression: BoundExpr,
    /// Locals scoped to the whole switch block.
    pub locals: Vec<LocalId>,
    pub sections: Vec<SwitchSection>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatchClause {
    pub local: Option<LocalId>,
    /// Caught exception type; `None` catches everything.
    pub exception_type: Option<TypeId>,
    pub filter: Option<BoundExpr>,
    pub body: BoundBlock,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TryStmt {
    pub body: BoundBlock,
    pub catches: Vec<CatchClause>,
    pub finally: Option<BoundBlock>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UsingStmt {
    pub locals: Vec<LocalId>,
    /// Resource declarations; empty when `expression` is used.
    pub declarations: Vec<LocalDeclaration>,
    pub expression: Option<BoundExpr>,
    pub body: BoundStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LockStmt {
    pub argument: BoundExpr,
    pub body: BoundStmt,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalFunctionStmt {
    pub symbol: MethodId,
    pub body: BoundBlock,
}

impl BoundStmt {
    pub fn new(span: Span, kind: StmtKind) -> Self {
        Self { span, kind }
    }

    /// Strip sequence points and single-element statement lists.
    pub fn unwrap_transparent(&self) -> &BoundStmt {
        match &self.kind {
            StmtKind::SequencePoint(Some(inner)) => inner.unwrap_transparent(),
            StmtKind::List(items) if items.len() == 1 => items[0].unwrap_transparent(),
            _ => self,
        }
    }
}

impl BoundBlock {
    pub fn new(span: Span, locals: Vec<LocalId>, statements: Vec<BoundStmt>) -> Self {
        Self { span, locals, statements }
    }
}
