//! Parser type: token cursor, error type, recovery and top-level declarations.
//!
//! Statements and expressions live in `expr.rs`; both extend the same [`Parser`].

use crate::ast::*;
use crate::diagnostics::{DiagId, DiagnosticEngine};
use crate::lexer::{Token, TokenKind};
use crate::source::{BufferId, SourceRange};
use tern_core::lang::keywords::{self, KeywordId};

use super::delayed::DelayedParsingPolicy;
use super::sil::{SilDefineError, SilFunctionDef, SilSink};

/// A syntax error, reported by the caller that decides how to recover.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParseError {
    pub(crate) id: DiagId,
    pub(crate) span: Span,
    pub(crate) args: Vec<String>,
}

impl ParseError {
    pub(crate) fn expected(what: &str, found: &Token) -> Self {
        Self {
            id: DiagId::ErrorExpected,
            span: found.span,
            args: vec![what.to_string(), found.kind.to_string()],
        }
    }
}

pub(crate) type PResult<T> = Result<T, ParseError>;

/// Recursive-descent parser over a slice of a buffer's tokens.
///
/// ## Notes
/// - The parser starts at an arbitrary token index, so the driver can resume where the previous
///   call stopped.
/// - Errors go straight to the diagnostics sink; parsing recovers at the next declaration keyword
///   (top level) or statement boundary (inside a body).
pub(crate) struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    buffer: BufferId,
    source: &'a str,
    diags: &'a mut DiagnosticEngine,
    policy: Option<&'a DelayedParsingPolicy>,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(
        tokens: &'a [Token],
        pos: usize,
        buffer: BufferId,
        source: &'a str,
        diags: &'a mut DiagnosticEngine,
        policy: Option<&'a DelayedParsingPolicy>,
    ) -> Self {
        Self {
            tokens,
            pos,
            buffer,
            source,
            diags,
            policy,
        }
    }

    // ========================================================================
    // Cursor helpers
    // ========================================================================

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn peek(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        // The stream always ends in Eof; stay on it.
        &tokens[self.pos.min(tokens.len() - 1)]
    }

    pub(crate) fn peek_kind(&self) -> &'a TokenKind {
        &self.peek().kind
    }

    pub(crate) fn at_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn at_keyword(&self, id: KeywordId) -> bool {
        self.peek_kind().is_keyword(id)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn advance(&mut self) -> &'a Token {
        let tok = self.peek();
        if !matches!(tok.kind, TokenKind::Eof) {
            self.pos += 1;
        }
        tok
    }

    /// End offset of the last consumed token.
    pub(crate) fn prev_end(&self) -> usize {
        if self.pos == 0 {
            return self.peek().span.start;
        }
        self.tokens[self.pos - 1].span.end
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind, what: &str) -> PResult<&'a Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::expected(what, self.peek()))
        }
    }

    pub(crate) fn expect_ident(&mut self, what: &str) -> PResult<Spanned<Ident>> {
        let tok = self.peek();
        match &tok.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(Spanned::new(name.clone(), tok.span))
            }
            _ => Err(ParseError::expected(what, tok)),
        }
    }

    pub(crate) fn skip_semicolons(&mut self) {
        while self.eat(&TokenKind::Semicolon) {}
    }

    pub(crate) fn report(&mut self, err: ParseError) {
        let args: Vec<&dyn std::fmt::Display> = err.args.iter().map(|a| a as &dyn std::fmt::Display).collect();
        self.diags
            .diagnose(Some(SourceRange::new(self.buffer, err.span)), err.id, &args);
    }

    /// Skip to the next token that can begin a top-level declaration.
    pub(crate) fn synchronize(&mut self) {
        self.advance();
        while !self.at_eof() {
            if let TokenKind::Keyword(k) = self.peek_kind() {
                if keywords::starts_decl(*k) {
                    return;
                }
            }
            self.advance();
        }
    }

    /// Index of the `}` matching the `{` at `lbrace`.
    fn matching_rbrace(&self, lbrace: usize) -> PResult<usize> {
        let mut depth = 0usize;
        for (i, tok) in self.tokens.iter().enumerate().skip(lbrace) {
            match tok.kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                TokenKind::Eof => return Err(ParseError::expected("'}'", tok)),
                _ => {}
            }
        }
        Err(ParseError::expected("'}'", self.peek()))
    }

    // ========================================================================
    // Top-level declarations
    // ========================================================================

    /// Parse one top-level declaration.
    ///
    /// Returns `None` after diagnosing when nothing usable was parsed.
    pub(crate) fn parse_decl(&mut self, kind: SourceKind) -> Option<Decl> {
        let start = self.peek().span.start;
        let result = match self.peek_kind() {
            TokenKind::Keyword(KeywordId::Import) => self.parse_import(),
            TokenKind::Keyword(KeywordId::Let) | TokenKind::Keyword(KeywordId::Var) => self.parse_var(),
            TokenKind::Keyword(KeywordId::Func) => self.parse_func(),
            TokenKind::Keyword(KeywordId::Type) => self.parse_type(),
            k if k.starts_expr() => match kind {
                SourceKind::Main | SourceKind::Repl => self.parse_top_level_code(),
                SourceKind::Library | SourceKind::Sil => {
                    let span = self.peek().span;
                    match self.parse_expr() {
                        Ok(expr) => self.report(ParseError {
                            id: DiagId::ErrorExprAtTopLevel,
                            span: span.merge(expr.span),
                            args: Vec::new(),
                        }),
                        Err(e) => {
                            self.report(e);
                            self.synchronize();
                        }
                    }
                    return None;
                }
            },
            other => Err(ParseError {
                id: DiagId::ErrorExpectedDecl,
                span: self.peek().span,
                args: vec![other.to_string()],
            }),
        };

        match result {
            Ok(decl_kind) => Some(Decl {
                kind: decl_kind,
                span: Span::new(start, self.prev_end()),
                buffer: self.buffer,
            }),
            Err(e) => {
                self.report(e);
                self.synchronize();
                None
            }
        }
    }

    fn parse_import(&mut self) -> PResult<DeclKind> {
        self.advance();
        let module = self.expect_ident("module name")?;
        Ok(DeclKind::Import(ImportDecl { module }))
    }

    fn parse_var(&mut self) -> PResult<DeclKind> {
        let mutable = self.advance().kind.is_keyword(KeywordId::Var);
        let name = self.expect_ident("variable name")?;
        self.expect(&TokenKind::Eq, "'='")?;
        let init = self.parse_expr()?;
        Ok(DeclKind::Var(VarDecl { name, mutable, init }))
    }

    fn parse_func(&mut self) -> PResult<DeclKind> {
        self.advance();
        let name = self.expect_ident("function name")?;
        self.expect(&TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_ident("parameter name")?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')'")?;
        let body = self.parse_body()?;
        Ok(DeclKind::Func(FuncDecl { name, params, body }))
    }

    fn parse_type(&mut self) -> PResult<DeclKind> {
        self.advance();
        let name = self.expect_ident("type name")?;
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            fields.push(self.expect_ident("field name")?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace, "'}'")?;
        Ok(DeclKind::Type(TypeDecl { name, fields }))
    }

    fn parse_top_level_code(&mut self) -> PResult<DeclKind> {
        let expr = self.parse_expr()?;
        let span = expr.span;
        Ok(DeclKind::TopLevelCode(Spanned::new(Stmt::Expr(expr), span)))
    }

    /// Parse `{ ... }`, or skip it when the delayed-parsing policy asks to.
    pub(crate) fn parse_body(&mut self) -> PResult<Body> {
        if !self.check(&TokenKind::LBrace) {
            return Err(ParseError::expected("'{'", self.peek()));
        }
        let lbrace = self.pos;
        let rbrace = self.matching_rbrace(lbrace)?;
        let braces = Span::new(self.tokens[lbrace].span.start, self.tokens[rbrace].span.end);

        let delay = self
            .policy
            .is_some_and(|p| p.should_delay_body(self.buffer, braces));
        if delay {
            self.pos = rbrace + 1;
            return Ok(Body::Delayed { braces });
        }

        self.advance();
        Ok(Body::Parsed(self.parse_block_stmts()))
    }

    // ========================================================================
    // Low-level IR definitions
    // ========================================================================

    /// Parse `sil @name : <signature> { <body> }` into `sink`.
    pub(crate) fn parse_sil_definition(&mut self, sink: &mut dyn SilSink) {
        let start = self.advance().span.start;
        let header = self.parse_sil_header();
        let (name, lbrace, rbrace) = match header {
            Ok(parts) => parts,
            Err(e) => {
                self.report(e);
                self.synchronize();
                return;
            }
        };
        let source: &'a str = self.source;
        let signature = self.sil_signature_text(lbrace).unwrap_or("");
        let body = source[self.tokens[lbrace].span.end..self.tokens[rbrace].span.start].trim();
        let end = self.tokens[rbrace].span.end;
        self.pos = rbrace + 1;

        let range = SourceRange::new(self.buffer, Span::new(start, end));
        let def = SilFunctionDef {
            name: &name.node,
            signature,
            body,
            range,
        };
        if let Err(SilDefineError::Redefinition(n)) = sink.define_function(def) {
            self.report(ParseError {
                id: DiagId::ErrorSilRedefinition,
                span: name.span,
                args: vec![n],
            });
        }
    }

    /// Diagnose a `sil` definition where none is allowed and skip over it.
    pub(crate) fn skip_sil_definition(&mut self) {
        let sil = self.advance();
        self.report(ParseError {
            id: DiagId::ErrorSilOutsideSilMode,
            span: sil.span,
            args: Vec::new(),
        });
        while !self.at_eof() && !self.check(&TokenKind::LBrace) {
            self.advance();
        }
        match self.matching_rbrace(self.pos) {
            Ok(rbrace) => self.pos = rbrace + 1,
            Err(_) => self.pos = self.tokens.len() - 1,
        }
    }

    /// `@name :` then everything up to the body; returns (name, `{` index, `}` index).
    fn parse_sil_header(&mut self) -> PResult<(Spanned<Ident>, usize, usize)> {
        self.expect(&TokenKind::At, "'@'")?;
        let name = self.expect_ident("low-level function name")?;
        self.expect(&TokenKind::Colon, "':'")?;
        while !self.at_eof() && !self.check(&TokenKind::LBrace) {
            self.advance();
        }
        if self.at_eof() {
            return Err(ParseError::expected("'{'", self.peek()));
        }
        let lbrace = self.pos;
        let rbrace = self.matching_rbrace(lbrace)?;
        Ok((name, lbrace, rbrace))
    }

    /// Source text between the `:` and the `{` of a `sil` definition.
    fn sil_signature_text(&self, lbrace: usize) -> Option<&'a str> {
        let colon = (0..lbrace).rev().find(|&i| self.tokens[i].kind == TokenKind::Colon)?;
        let text: &'a str = self.source;
        Some(text[self.tokens[colon].span.end..self.tokens[lbrace].span.start].trim())
    }
}
