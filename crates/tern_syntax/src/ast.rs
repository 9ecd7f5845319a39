//! Abstract syntax tree for tern source files.
//!
//! A session produces exactly one [`SourceFile`]; every input buffer feeds declarations into its
//! `decls` sequence in parse order. The length of that sequence doubles as the cursor the driver
//! uses to hand newly parsed declarations to the type checker.

use std::fmt;

use crate::source::BufferId;

/// Source location span (byte offsets within one buffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Whether a cursor at `offset` sits strictly inside the span.
    ///
    /// For a brace range `{ ... }`, a cursor right after `{` or right before `}` is inside.
    pub fn contains_cursor(&self, offset: usize) -> bool {
        self.start < offset && offset < self.end
    }
}

/// A node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

pub type Ident = String;

/// What kind of input a session compiles. Fixed for the session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// Multi-file library: every buffer is parsed in one go, then checked once.
    Library,
    /// Single main file: top-level code is parsed and checked chunk by chunk.
    Main,
    /// Single low-level IR file: ordinary declarations interleaved with `sil` definitions.
    Sil,
    /// Interactive input, driven by an external read-eval loop.
    Repl,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Library => write!(f, "library"),
            SourceKind::Main => write!(f, "main"),
            SourceKind::Sil => write!(f, "sil"),
            SourceKind::Repl => write!(f, "repl"),
        }
    }
}

/// The single container of declarations for a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub kind: SourceKind,
    /// Set when this file *is* the standard library (no implicit stdlib import).
    pub parse_stdlib: bool,
    pub decls: Vec<Decl>,
}

impl SourceFile {
    pub fn new(kind: SourceKind, parse_stdlib: bool) -> Self {
        Self {
            kind,
            parse_stdlib,
            decls: Vec::new(),
        }
    }

    /// Names declared at the top level, in declaration order.
    pub fn top_level_names(&self) -> impl Iterator<Item = &str> {
        self.decls.iter().filter_map(|d| d.name())
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    pub kind: DeclKind,
    pub span: Span,
    pub buffer: BufferId,
}

impl Decl {
    /// The name this declaration introduces, if any.
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            DeclKind::Import(_) | DeclKind::TopLevelCode(_) => None,
            DeclKind::Var(v) => Some(&v.name.node),
            DeclKind::Func(f) => Some(&f.name.node),
            DeclKind::Type(t) => Some(&t.name.node),
        }
    }

    /// Whether the declaration executes at the top level of a main file.
    pub fn is_top_level_code(&self) -> bool {
        matches!(self.kind, DeclKind::Var(_) | DeclKind::TopLevelCode(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeclKind {
    Import(ImportDecl),
    Var(VarDecl),
    Func(FuncDecl),
    Type(TypeDecl),
    /// A bare statement at the top level of a main file.
    TopLevelCode(Spanned<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub module: Spanned<Ident>,
}

/// `let name = init` / `var name = init`
#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub name: Spanned<Ident>,
    pub mutable: bool,
    pub init: Spanned<Expr>,
}

/// `func name(a, b) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub name: Spanned<Ident>,
    pub params: Vec<Spanned<Ident>>,
    pub body: Body,
}

/// `type Name { field, field }`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: Spanned<Ident>,
    pub fields: Vec<Spanned<Ident>>,
}

/// A function body, either parsed or deferred until delayed parsing runs.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Parsed(Vec<Spanned<Stmt>>),
    /// Skipped during the main pass; `braces` covers `{ ... }` inclusive.
    Delayed { braces: Span },
}

impl Body {
    pub fn is_delayed(&self) -> bool {
        matches!(self, Body::Delayed { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let {
        name: Spanned<Ident>,
        mutable: bool,
        init: Spanned<Expr>,
    },
    Return(Option<Spanned<Expr>>),
    Expr(Spanned<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Str(String),
    Bool(bool),
    Name(Ident),
    Member(Box<Spanned<Expr>>, Spanned<Ident>),
    Call(Box<Spanned<Expr>>, Vec<Spanned<Expr>>),
    Binary(BinaryOp, Box<Spanned<Expr>>, Box<Spanned<Expr>>),
}
