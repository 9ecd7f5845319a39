//! Token types for the tern lexer.

use std::fmt;

use crate::ast::Span;
use tern_core::lang::keywords::{self, KeywordId};

/// Kind of token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(KeywordId),
    Ident(String),
    Int(i64),
    Str(String),

    // Punctuation
    At,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Eq,
    Arrow,
    Plus,
    Minus,
    Star,
    Slash,

    /// Any other ASCII symbol. Only meaningful inside `sil` bodies, which are kept as raw text.
    Other(char),

    Eof,
}

impl TokenKind {
    pub fn is_keyword(&self, id: KeywordId) -> bool {
        matches!(self, TokenKind::Keyword(k) if *k == id)
    }

    /// Whether the token can begin an expression.
    pub fn starts_expr(&self) -> bool {
        matches!(
            self,
            TokenKind::Int(_)
                | TokenKind::Str(_)
                | TokenKind::Ident(_)
                | TokenKind::LParen
                | TokenKind::Keyword(KeywordId::True)
                | TokenKind::Keyword(KeywordId::False)
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Keyword(k) => write!(f, "'{}'", keywords::as_str(*k)),
            TokenKind::Ident(name) => write!(f, "identifier '{name}'"),
            TokenKind::Int(v) => write!(f, "integer literal '{v}'"),
            TokenKind::Str(_) => write!(f, "string literal"),
            TokenKind::At => write!(f, "'@'"),
            TokenKind::LParen => write!(f, "'('"),
            TokenKind::RParen => write!(f, "')'"),
            TokenKind::LBrace => write!(f, "'{{'"),
            TokenKind::RBrace => write!(f, "'}}'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Eq => write!(f, "'='"),
            TokenKind::Arrow => write!(f, "'->'"),
            TokenKind::Plus => write!(f, "'+'"),
            TokenKind::Minus => write!(f, "'-'"),
            TokenKind::Star => write!(f, "'*'"),
            TokenKind::Slash => write!(f, "'/'"),
            TokenKind::Other(c) => write!(f, "'{c}'"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

/// A token with its kind and source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
