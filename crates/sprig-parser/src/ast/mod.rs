//! Abstract syntax tree for Sprig programs.
//!
//! Nodes are allocated in a `bumpalo` arena and borrow from it via the
//! `'ast` lifetime. Small nodes live inline in the [`Stmt`]/[`Expr`]
//! enums; recursive ones sit behind `&'ast` references.

mod expr;
mod ops;
mod parser;
mod stmt;

pub use expr::{
    BinaryExpr, CallExpr, Expr, GroupingExpr, LiteralExpr, LiteralKind, UnaryExpr, VariableExpr,
};
pub use ops::{BinaryOp, UnaryOp};
pub use parser::{ParseErrors, Parser};
pub use stmt::{Block, ExprStmt, FunDecl, IfStmt, LetStmt, PrintStmt, ReturnStmt, Stmt, WhileStmt};

use sprig_core::Span;

/// An identifier with its source location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ident<'ast> {
    /// The identifier text (allocated in the arena).
    pub name: &'ast str,
    /// Location in source.
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    /// Create a new identifier.
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// A parsed program: an ordered sequence of top-level statements.
#[derive(Debug, Clone, Copy)]
pub struct Program<'ast> {
    stmts: &'ast [Stmt<'ast>],
}

impl<'ast> Program<'ast> {
    /// Create a program from its top-level statements.
    pub fn new(stmts: &'ast [Stmt<'ast>]) -> Self {
        Self { stmts }
    }

    /// The top-level statements in source order.
    pub fn stmts(&self) -> &'ast [Stmt<'ast>] {
        self.stmts
    }
}
