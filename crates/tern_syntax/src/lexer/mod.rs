//! Lexer for the tern language.
//!
//! Whitespace and newlines are insignificant; `//` starts a line comment. A leading `#!` line is
//! skipped when the buffer is the session's hashbang buffer and diagnosed otherwise.
//!
//! ## Notes
//! - The lexer never stops at the first error: it records a [`LexError`] and keeps scanning, so
//!   the parser always receives a complete token stream ending in `Eof`.

pub mod tokens;

pub use tokens::{Token, TokenKind};

use crate::ast::Span;
use crate::diagnostics::DiagId;
use tern_core::lang::keywords;

/// A lexical error, reported by the parser driver through the diagnostics sink.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub id: DiagId,
    pub span: Span,
    pub args: Vec<String>,
}

pub struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    allow_hashbang: bool,
    tokens: Vec<Token>,
    errors: Vec<LexError>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            allow_hashbang: false,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Allow a leading `#!` line (only for the main file).
    pub fn allow_hashbang(mut self, allow: bool) -> Self {
        self.allow_hashbang = allow;
        self
    }

    /// Tokenize everything, keeping going after errors.
    ///
    /// The token stream always ends with an `Eof` token.
    pub fn tokenize_recovering(mut self) -> (Vec<Token>, Vec<LexError>) {
        if self.source.starts_with("#!") {
            if !self.allow_hashbang {
                let end = self.source.find('\n').unwrap_or(self.source.len());
                self.errors.push(LexError {
                    id: DiagId::ErrorHashbangNotAllowed,
                    span: Span::new(0, end),
                    args: Vec::new(),
                });
            }
            self.skip_line();
        }

        while let Some((start, c)) = self.chars.next() {
            self.scan_token(start, c);
        }

        let end = self.source.len();
        self.tokens.push(Token::new(TokenKind::Eof, Span::new(end, end)));
        (self.tokens, self.errors)
    }

    /// Tokenize, failing if any error was found.
    pub fn tokenize(self) -> Result<Vec<Token>, Vec<LexError>> {
        let (tokens, errors) = self.tokenize_recovering();
        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn pos(&mut self) -> usize {
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.source.len())
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            self.chars.next();
        }
    }

    fn push(&mut self, kind: TokenKind, start: usize) {
        let end = self.pos();
        self.tokens.push(Token::new(kind, Span::new(start, end)));
    }

    fn error(&mut self, id: DiagId, start: usize, args: Vec<String>) {
        let end = self.pos();
        self.errors.push(LexError {
            id,
            span: Span::new(start, end),
            args,
        });
    }

    fn scan_token(&mut self, start: usize, c: char) {
        match c {
            c if c.is_whitespace() => {}
            '/' if self.peek() == Some('/') => self.skip_line(),
            '@' => self.push(TokenKind::At, start),
            '(' => self.push(TokenKind::LParen, start),
            ')' => self.push(TokenKind::RParen, start),
            '{' => self.push(TokenKind::LBrace, start),
            '}' => self.push(TokenKind::RBrace, start),
            ',' => self.push(TokenKind::Comma, start),
            ':' => self.push(TokenKind::Colon, start),
            ';' => self.push(TokenKind::Semicolon, start),
            '.' => self.push(TokenKind::Dot, start),
            '=' => self.push(TokenKind::Eq, start),
            '+' => self.push(TokenKind::Plus, start),
            '*' => self.push(TokenKind::Star, start),
            '/' => self.push(TokenKind::Slash, start),
            '-' => {
                if self.peek() == Some('>') {
                    self.chars.next();
                    self.push(TokenKind::Arrow, start);
                } else {
                    self.push(TokenKind::Minus, start);
                }
            }
            '"' => self.scan_string(start),
            c if c.is_ascii_digit() => self.scan_number(start),
            c if is_ident_start(c) => self.scan_ident(start),
            c if c.is_ascii_punctuation() => self.push(TokenKind::Other(c), start),
            c => self.error(DiagId::ErrorLexUnexpectedChar, start, vec![c.to_string()]),
        }
    }

    fn scan_string(&mut self, start: usize) {
        let mut value = String::new();
        loop {
            match self.chars.next() {
                Some((_, '"')) => break,
                Some((_, '\\')) => match self.chars.next() {
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, 't')) => value.push('\t'),
                    Some((_, other)) => value.push(other),
                    None => {
                        self.error(DiagId::ErrorLexUnterminatedString, start, Vec::new());
                        return;
                    }
                },
                Some((_, '\n')) | None => {
                    self.error(DiagId::ErrorLexUnterminatedString, start, Vec::new());
                    return;
                }
                Some((_, c)) => value.push(c),
            }
        }
        self.push(TokenKind::Str(value), start);
    }

    fn scan_number(&mut self, start: usize) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '_') {
            self.chars.next();
        }
        let end = self.pos();
        let text: String = self.source[start..end].chars().filter(|c| *c != '_').collect();
        match text.parse::<i64>() {
            Ok(v) => self.push(TokenKind::Int(v), start),
            Err(_) => self.error(DiagId::ErrorLexInvalidInteger, start, vec![self.source[start..end].to_string()]),
        }
    }

    fn scan_ident(&mut self, start: usize) {
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.chars.next();
        }
        let end = self.pos();
        let text = &self.source[start..end];
        let kind = match keywords::from_str(text) {
            Some(id) => TokenKind::Keyword(id),
            None => TokenKind::Ident(text.to_string()),
        };
        self.push(kind, start);
    }
}

/// Check if a character can start an identifier (ASCII-only).
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier (ASCII-only).
fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Whether `name` is a valid, non-reserved identifier (used to validate module names).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_ident_start(c) => {}
        _ => return false,
    }
    chars.all(is_ident_continue) && keywords::from_str(name).is_none()
}

/// Convenience function to lex a source string.
#[tracing::instrument(skip_all, fields(source_len = source.len()))]
pub fn lex(source: &str) -> Result<Vec<Token>, Vec<LexError>> {
    Lexer::new(source).tokenize()
}
