//! Statements and expressions.

use crate::ast::*;
use crate::lexer::TokenKind;
use tern_core::lang::keywords::KeywordId;

use super::decl::{PResult, ParseError, Parser};

impl<'a> Parser<'a> {
    /// Parse statements up to and including the closing `}` (the `{` is already consumed).
    ///
    /// A statement that fails to parse is diagnosed and skipped; the block is never abandoned
    /// early, so every error in a body is reported.
    pub(crate) fn parse_block_stmts(&mut self) -> Vec<Spanned<Stmt>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_semicolons();
            if self.eat(&TokenKind::RBrace) {
                break;
            }
            if self.at_eof() {
                let err = ParseError::expected("'}'", self.peek());
                self.report(err);
                break;
            }
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    self.report(e);
                    self.recover_in_block();
                }
            }
        }
        stmts
    }

    fn recover_in_block(&mut self) {
        self.advance();
        while !self.at_eof() {
            match self.peek_kind() {
                TokenKind::Semicolon | TokenKind::RBrace => return,
                TokenKind::Keyword(KeywordId::Let | KeywordId::Var | KeywordId::Return) => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    pub(crate) fn parse_stmt(&mut self) -> PResult<Spanned<Stmt>> {
        let start = self.peek().span.start;
        let stmt = match self.peek_kind() {
            TokenKind::Keyword(KeywordId::Let | KeywordId::Var) => {
                let mutable = self.advance().kind.is_keyword(KeywordId::Var);
                let name = self.expect_ident("variable name")?;
                self.expect(&TokenKind::Eq, "'='")?;
                let init = self.parse_expr()?;
                Stmt::Let { name, mutable, init }
            }
            TokenKind::Keyword(KeywordId::Return) => {
                self.advance();
                if self.peek_kind().starts_expr() {
                    Stmt::Return(Some(self.parse_expr()?))
                } else {
                    Stmt::Return(None)
                }
            }
            _ => Stmt::Expr(self.parse_expr()?),
        };
        Ok(Spanned::new(stmt, Span::new(start, self.prev_end())))
    }

    // ========================================================================
    // Expressions (precedence climbing: additive < multiplicative < postfix)
    // ========================================================================

    pub(crate) fn parse_expr(&mut self) -> PResult<Spanned<Expr>> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_term()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(Expr::Binary(op, Box::new(lhs), Box::new(rhs)), span);
        }
    }

    fn parse_term(&mut self) -> PResult<Spanned<Expr>> {
        let mut lhs = self.parse_postfix()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                _ => return Ok(lhs),
            };
            self.advance();
            let rhs = self.parse_postfix()?;
            let span = lhs.span.merge(rhs.span);
            lhs = Spanned::new(Expr::Binary(op, Box::new(lhs), Box::new(rhs)), span);
        }
    }

    fn parse_postfix(&mut self) -> PResult<Spanned<Expr>> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::LParen) {
                let mut args = Vec::new();
                if !self.check(&TokenKind::RParen) {
                    loop {
                        args.push(self.parse_expr()?);
                        if !self.eat(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                let close = self.expect(&TokenKind::RParen, "')'")?;
                let span = Span::new(expr.span.start, close.span.end);
                expr = Spanned::new(Expr::Call(Box::new(expr), args), span);
            } else if self.eat(&TokenKind::Dot) {
                let member = self.expect_ident("member name")?;
                let span = expr.span.merge(member.span);
                expr = Spanned::new(Expr::Member(Box::new(expr), member), span);
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> PResult<Spanned<Expr>> {
        let tok = self.peek();
        let expr = match &tok.kind {
            TokenKind::Int(v) => Expr::Int(*v),
            TokenKind::Str(s) => Expr::Str(s.clone()),
            TokenKind::Keyword(KeywordId::True) => Expr::Bool(true),
            TokenKind::Keyword(KeywordId::False) => Expr::Bool(false),
            TokenKind::Ident(name) => Expr::Name(name.clone()),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                let close = self.expect(&TokenKind::RParen, "')'")?;
                return Ok(Spanned::new(inner.node, Span::new(tok.span.start, close.span.end)));
            }
            _ => return Err(ParseError::expected("expression", tok)),
        };
        self.advance();
        Ok(Spanned::new(expr, tok.span))
    }
}
