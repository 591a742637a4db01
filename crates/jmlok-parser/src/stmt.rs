//! Statement parsing for method and constructor bodies.
//!
//! Only the statements contract analysis looks into get a structured form.
//! `try`, `switch`, `synchronized` and local classes are skipped whole.

use crate::{ParseResult, Parser};
use jmlok_ast::*;
use jmlok_lexer::TokenKind;

impl<'src> Parser<'src> {
    pub(crate) fn parse_block(&mut self) -> ParseResult<Block> {
        let start = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            if self.check(&TokenKind::AnnotationStart) {
                // `//@ assert ...`, `//@ set ...`, loop annotations
                self.skip_annotation();
                continue;
            }

            let before = self.pos;
            match self.parse_statement() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    self.errors.push(e);
                    self.recover_statement();
                    if self.pos == before {
                        self.advance();
                    }
                }
            }
        }

        let end = self.expect(TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: start.merge(end),
        })
    }

    fn recover_statement(&mut self) {
        while let Some(kind) = self.current_kind() {
            match kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => return,
                TokenKind::LBrace => {
                    let _ = self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                    return;
                }
                _ => self.advance(),
            }
        }
    }

    fn parse_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();

        match self.current_kind().cloned() {
            Some(TokenKind::LBrace) => {
                let block = self.parse_block()?;
                let span = block.span;
                Ok(Stmt::new(StmtKind::Block(block), span))
            }
            Some(TokenKind::Semicolon) => {
                self.advance();
                Ok(Stmt::new(StmtKind::Empty, start))
            }
            Some(TokenKind::If) => self.parse_if(),
            Some(TokenKind::While) => {
                self.advance();
                let condition = self.parse_condition()?;
                let body = self.parse_statement()?;
                let span = start.merge(body.span);
                Ok(Stmt::new(
                    StmtKind::While {
                        condition,
                        body: Box::new(body),
                    },
                    span,
                ))
            }
            Some(TokenKind::Do) => {
                self.advance();
                let body = self.parse_statement()?;
                self.expect(TokenKind::While)?;
                let condition = self.parse_condition()?;
                let end = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::new(
                    StmtKind::DoWhile {
                        body: Box::new(body),
                        condition,
                    },
                    start.merge(end),
                ))
            }
            Some(TokenKind::For) => {
                self.advance();
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                let body = self.parse_statement()?;
                let span = start.merge(body.span);
                Ok(Stmt::new(StmtKind::For { body: Box::new(body) }, span))
            }
            Some(TokenKind::Return) => {
                self.advance();
                let value = if self.check(&TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };
                let end = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::new(StmtKind::Return(value), start.merge(end)))
            }
            Some(TokenKind::Throw) => {
                self.advance();
                let value = self.parse_expression()?;
                let end = self.expect(TokenKind::Semicolon)?;
                Ok(Stmt::new(StmtKind::Throw(value), start.merge(end)))
            }
            Some(kind @ (TokenKind::Break | TokenKind::Continue | TokenKind::Assert)) => {
                self.advance();
                self.skip_to_semicolon()?;
                Ok(self.other(kind, start))
            }
            Some(TokenKind::Try) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                }
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                while self.check(&TokenKind::Catch) {
                    self.advance();
                    self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                }
                if self.check(&TokenKind::Finally) {
                    self.advance();
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                }
                Ok(self.other(TokenKind::Try, start))
            }
            Some(kind @ (TokenKind::Switch | TokenKind::Synchronized)) => {
                self.advance();
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                // Switch expression used as a statement
                if self.check(&TokenKind::Semicolon) {
                    self.advance();
                }
                Ok(self.other(kind, start))
            }
            Some(TokenKind::Class | TokenKind::Interface | TokenKind::Enum | TokenKind::Abstract) => {
                self.skip_nested_type()?;
                Ok(self.other(TokenKind::Class, start))
            }
            Some(TokenKind::Identifier(_)) if self.peek_kind() == Some(&TokenKind::Colon) => {
                // Labeled statement
                self.advance();
                self.advance();
                self.parse_statement()
            }
            _ => self.parse_simple_statement(),
        }
    }

    fn parse_if(&mut self) -> ParseResult<Stmt> {
        let start = self.expect(TokenKind::If)?;
        let condition = self.parse_condition()?;
        let then_branch = self.parse_statement()?;

        let else_branch = if self.check(&TokenKind::Else) {
            self.advance();
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };

        let end = else_branch
            .as_ref()
            .map_or(then_branch.span, |stmt| stmt.span);
        Ok(Stmt::new(
            StmtKind::If {
                condition,
                then_branch: Box::new(then_branch),
                else_branch,
            },
            start.merge(end),
        ))
    }

    /// Parenthesized condition of `if`, `while` and `do`
    fn parse_condition(&mut self) -> ParseResult<Expr> {
        self.expect(TokenKind::LParen)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RParen)?;
        Ok(condition)
    }

    /// Local variable declaration or expression statement
    fn parse_simple_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.current_span();

        let mut has_modifiers = false;
        loop {
            match self.current_kind() {
                Some(TokenKind::Final) => {
                    has_modifiers = true;
                    self.advance();
                }
                Some(TokenKind::At) => {
                    has_modifiers = true;
                    self.skip_java_annotation()?;
                }
                _ => break,
            }
        }

        if matches!(self.current_kind(), Some(TokenKind::Class | TokenKind::Interface)) {
            self.skip_nested_type()?;
            return Ok(self.other(TokenKind::Class, start));
        }

        let save = self.pos;
        if let Some(ty) = self.try_parse_local_type() {
            return self.parse_local_var(ty, start);
        }
        self.pos = save;

        if has_modifiers {
            return Err(self.unexpected("local variable declaration"));
        }

        let expr = self.parse_expression()?;
        let end = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::new(StmtKind::Expr(expr), start.merge(end)))
    }

    /// Parses `Type` when it is followed by a declarator, leaving the
    /// position on the variable name
    fn try_parse_local_type(&mut self) -> Option<TypeRef> {
        let ty = self.parse_type().ok()?;
        let is_name = matches!(self.current_kind(), Some(TokenKind::Identifier(_)));
        let follows_declarator = matches!(
            self.peek_kind(),
            Some(
                TokenKind::Eq
                    | TokenKind::Semicolon
                    | TokenKind::Comma
                    | TokenKind::LBracket
                    | TokenKind::Colon
            )
        );
        (is_name && follows_declarator).then_some(ty)
    }

    fn parse_local_var(&mut self, ty: TypeRef, start: Span) -> ParseResult<Stmt> {
        let mut declarators = Vec::new();

        loop {
            let name = self.parse_identifier()?;
            while self.check(&TokenKind::LBracket) && self.peek_kind() == Some(&TokenKind::RBracket) {
                self.advance();
                self.advance();
            }
            let init = if self.check(&TokenKind::Eq) {
                self.advance();
                Some(self.parse_variable_initializer()?)
            } else {
                None
            };
            declarators.push((name, init));

            if self.check(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }

        let end = self.expect(TokenKind::Semicolon)?;
        Ok(Stmt::new(
            StmtKind::LocalVar { ty, declarators },
            start.merge(end),
        ))
    }

    fn other(&self, keyword: TokenKind, start: Span) -> Stmt {
        Stmt::new(
            StmtKind::Other(SmolStr::new(keyword.to_string())),
            start.merge(self.previous_span()),
        )
    }
}
