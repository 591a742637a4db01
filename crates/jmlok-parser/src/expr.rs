//! Expression parsing: Java operators plus the JML extensions.
//!
//! Precedence, lowest first: assignment, ternary, `<==>`/`<=!=>`,
//! `==>`/`<==`, `||`, `&&`, `|`, `^`, `&`, equality, relational and
//! `instanceof`, shifts, additive, multiplicative, unary and casts, postfix.

use crate::{ParseError, ParseResult, Parser};
use jmlok_ast::*;
use jmlok_lexer::TokenKind;

/// JML quantifier keywords, always written inside parentheses
const QUANTIFIERS: &[&str] = &[
    "\\forall",
    "\\exists",
    "\\sum",
    "\\product",
    "\\max",
    "\\min",
    "\\num_of",
];

impl<'src> Parser<'src> {
    // ========================================================================
    // Expression Parsing
    // ========================================================================

    pub(crate) fn parse_expression(&mut self) -> ParseResult<Expr> {
        let target = self.parse_ternary()?;

        if self.check(&TokenKind::Eq) {
            self.advance();
            let value = self.parse_expression()?; // Right-associative
            let span = target.span.merge(value.span);
            return Ok(Expr::new(
                ExprKind::Assign {
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ));
        }

        if let Some(op) = self.current_kind().and_then(compound_assign_op) {
            self.advance();
            let value = self.parse_expression()?;
            let span = target.span.merge(value.span);
            return Ok(Expr::new(
                ExprKind::CompoundAssign {
                    op,
                    target: Box::new(target),
                    value: Box::new(value),
                },
                span,
            ));
        }

        Ok(target)
    }

    fn parse_ternary(&mut self) -> ParseResult<Expr> {
        let condition = self.parse_equivalence()?;

        if self.check(&TokenKind::Question) {
            self.advance();
            let then_expr = self.parse_ternary()?;
            self.expect(TokenKind::Colon)?;
            let else_expr = self.parse_ternary()?;
            let span = condition.span.merge(else_expr.span);
            return Ok(Expr::new(
                ExprKind::Ternary {
                    condition: Box::new(condition),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                },
                span,
            ));
        }

        Ok(condition)
    }

    fn parse_equivalence(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_implication, |kind| match kind {
            TokenKind::Equiv => Some(BinaryOp::Equiv),
            TokenKind::NotEquiv => Some(BinaryOp::NotEquiv),
            _ => None,
        })
    }

    /// `==>` is right-associative
    fn parse_implication(&mut self) -> ParseResult<Expr> {
        let left = self.parse_or()?;

        let op = match self.current_kind() {
            Some(TokenKind::Implies) => BinaryOp::Implies,
            Some(TokenKind::RevImplies) => BinaryOp::RevImplies,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_implication()?;
        Ok(binary(op, left, right))
    }

    fn parse_or(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_and()?;

        while self.check(&TokenKind::PipePipe) {
            self.advance();
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_bit_or()?;

        while self.check(&TokenKind::AmpAmp) {
            self.advance();
            let right = self.parse_bit_or()?;
            left = binary(BinaryOp::And, left, right);
        }

        Ok(left)
    }

    fn parse_bit_or(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_bit_xor, |kind| {
            (*kind == TokenKind::Pipe).then_some(BinaryOp::BitOr)
        })
    }

    fn parse_bit_xor(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_bit_and, |kind| {
            (*kind == TokenKind::Caret).then_some(BinaryOp::BitXor)
        })
    }

    fn parse_bit_and(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_equality, |kind| {
            (*kind == TokenKind::Amp).then_some(BinaryOp::BitAnd)
        })
    }

    fn parse_equality(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_relational, |kind| match kind {
            TokenKind::EqEq => Some(BinaryOp::Eq),
            TokenKind::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let mut left = self.parse_shift()?;

        loop {
            let op = match self.current_kind() {
                Some(TokenKind::Lt) => BinaryOp::Lt,
                Some(TokenKind::Gt) => BinaryOp::Gt,
                Some(TokenKind::LtEq) => BinaryOp::LtEq,
                Some(TokenKind::GtEq) => BinaryOp::GtEq,
                Some(TokenKind::Instanceof) => {
                    self.advance();
                    let ty = self.parse_type()?;
                    // Pattern binding: `x instanceof Foo f`
                    if matches!(self.current_kind(), Some(TokenKind::Identifier(_))) {
                        self.advance();
                    }
                    let span = left.span.merge(self.previous_span());
                    left = Expr::new(
                        ExprKind::InstanceOf {
                            expr: Box::new(left),
                            ty,
                        },
                        span,
                    );
                    continue;
                }
                _ => break,
            };

            self.advance();
            let right = self.parse_shift()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_shift(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_additive, |kind| match kind {
            TokenKind::Shl => Some(BinaryOp::Shl),
            TokenKind::Shr => Some(BinaryOp::Shr),
            TokenKind::UShr => Some(BinaryOp::UShr),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> ParseResult<Expr> {
        self.parse_binary_level(Self::parse_unary, |kind| match kind {
            TokenKind::Star => Some(BinaryOp::Mul),
            TokenKind::Slash => Some(BinaryOp::Div),
            TokenKind::Percent => Some(BinaryOp::Rem),
            _ => None,
        })
    }

    /// One left-associative precedence level
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> ParseResult<Expr>,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> ParseResult<Expr> {
        let mut left = next(self)?;

        while let Some(op) = self.current_kind().and_then(op_for) {
            self.advance();
            let right = next(self)?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();

        let op = match self.current_kind() {
            Some(TokenKind::Bang) => UnaryOp::Not,
            Some(TokenKind::Minus) => UnaryOp::Neg,
            Some(TokenKind::Plus) => UnaryOp::Plus,
            Some(TokenKind::Tilde) => UnaryOp::BitNot,
            Some(TokenKind::PlusPlus) => UnaryOp::PreInc,
            Some(TokenKind::MinusMinus) => UnaryOp::PreDec,
            Some(TokenKind::LParen) => {
                if let Some(cast) = self.try_parse_cast()? {
                    return Ok(cast);
                }
                return self.parse_postfix();
            }
            _ => return self.parse_postfix(),
        };

        self.advance();
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `(Type) operand`. Restores the position and yields `None` when the
    /// parenthesis does not start a cast.
    fn try_parse_cast(&mut self) -> ParseResult<Option<Expr>> {
        let save = self.pos;
        let start = self.current_span();
        self.advance(); // (

        let ty = match self.parse_type() {
            Ok(ty) if self.check(&TokenKind::RParen) => ty,
            _ => {
                self.pos = save;
                return Ok(None);
            }
        };

        let primitive = TypeRef::new(ty.name.clone(), 0, ty.span).is_primitive();
        let follows_operand = matches!(
            self.peek_kind(),
            Some(
                TokenKind::Identifier(_)
                    | TokenKind::IntLiteral(_)
                    | TokenKind::FloatLiteral(_)
                    | TokenKind::StringLiteral(_)
                    | TokenKind::CharLiteral(_)
                    | TokenKind::JmlKeyword(_)
                    | TokenKind::True
                    | TokenKind::False
                    | TokenKind::Null
                    | TokenKind::This
                    | TokenKind::Super
                    | TokenKind::New
                    | TokenKind::LParen
                    | TokenKind::Bang
                    | TokenKind::Tilde
            )
        );
        let follows_signed = matches!(
            self.peek_kind(),
            Some(TokenKind::Minus | TokenKind::Plus | TokenKind::PlusPlus | TokenKind::MinusMinus)
        );

        if !(follows_operand || (primitive && follows_signed)) {
            self.pos = save;
            return Ok(None);
        }

        self.advance(); // )
        let operand = self.parse_unary()?;
        let span = start.merge(operand.span);
        Ok(Some(Expr::new(
            ExprKind::Cast {
                ty,
                expr: Box::new(operand),
            },
            span,
        )))
    }

    fn parse_postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.parse_primary()?;

        loop {
            match self.current_kind() {
                Some(TokenKind::Dot) => {
                    self.advance();
                    expr = self.parse_member_access(expr)?;
                }
                Some(TokenKind::LBracket) => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket)?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                Some(TokenKind::PlusPlus | TokenKind::MinusMinus) => {
                    let op = if self.check(&TokenKind::PlusPlus) {
                        UnaryOp::PostInc
                    } else {
                        UnaryOp::PostDec
                    };
                    self.advance();
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Unary {
                            op,
                            operand: Box::new(expr),
                        },
                        span,
                    );
                }
                Some(TokenKind::ColonColon) => {
                    // Method reference
                    self.advance();
                    self.advance();
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(ExprKind::Opaque(SmolStr::new("method reference")), span);
                }
                _ => break,
            }
        }

        Ok(expr)
    }

    /// Whatever follows `object.`
    fn parse_member_access(&mut self, object: Expr) -> ParseResult<Expr> {
        let start = object.span;

        match self.current_kind().cloned() {
            Some(TokenKind::Identifier(_)) => {
                let field = self.parse_identifier()?;
                if self.check(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    let span = start.merge(self.previous_span());
                    Ok(Expr::new(
                        ExprKind::MethodCall {
                            object: Some(Box::new(object)),
                            method: field,
                            args,
                        },
                        span,
                    ))
                } else {
                    let span = start.merge(field.span);
                    Ok(Expr::new(
                        ExprKind::Field {
                            object: Box::new(object),
                            field,
                        },
                        span,
                    ))
                }
            }
            Some(TokenKind::Lt) => {
                // Explicit type arguments: `obj.<T>call()`
                self.skip_type_args()?;
                self.parse_member_access(object)
            }
            Some(kind @ (TokenKind::This | TokenKind::Super)) => {
                let field = Spanned::new(SmolStr::new(kind.to_string()), self.current_span());
                self.advance();
                let span = start.merge(field.span);
                Ok(Expr::new(
                    ExprKind::Field {
                        object: Box::new(object),
                        field,
                    },
                    span,
                ))
            }
            Some(TokenKind::Class) => {
                self.advance();
                Ok(Expr::new(
                    ExprKind::Opaque(SmolStr::new("class literal")),
                    start.merge(self.previous_span()),
                ))
            }
            Some(TokenKind::New) => {
                // Qualified inner class creation
                self.parse_new()
            }
            _ => Err(self.unexpected("member name after '.'")),
        }
    }

    fn parse_args(&mut self) -> ParseResult<Vec<Expr>> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_eof() {
            args.push(self.parse_expression()?);
            if !self.check(&TokenKind::RParen) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();

        match self.current_kind().cloned() {
            Some(TokenKind::IntLiteral(s)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Integer(s), start))
            }
            Some(TokenKind::FloatLiteral(s)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Float(s), start))
            }
            Some(TokenKind::StringLiteral(s)) => {
                self.advance();
                // Strip the surrounding quotes from the string
                let content = if s.len() >= 2 {
                    SmolStr::new(&s[1..s.len() - 1])
                } else {
                    s
                };
                Ok(Expr::new(ExprKind::String(content), start))
            }
            Some(TokenKind::CharLiteral(s)) => {
                self.advance();
                Ok(Expr::new(ExprKind::Char(s), start))
            }
            Some(TokenKind::True) => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(true), start))
            }
            Some(TokenKind::False) => {
                self.advance();
                Ok(Expr::new(ExprKind::Bool(false), start))
            }
            Some(TokenKind::Null) => {
                self.advance();
                Ok(Expr::new(ExprKind::Null, start))
            }
            Some(kind @ (TokenKind::This | TokenKind::Super)) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    // Explicit constructor invocation: `this(...)` / `super(...)`
                    let method = Spanned::new(SmolStr::new(kind.to_string()), start);
                    let args = self.parse_args()?;
                    let span = start.merge(self.previous_span());
                    return Ok(Expr::new(
                        ExprKind::MethodCall {
                            object: None,
                            method,
                            args,
                        },
                        span,
                    ));
                }
                let kind = if kind == TokenKind::This {
                    ExprKind::This
                } else {
                    ExprKind::Super
                };
                Ok(Expr::new(kind, start))
            }
            Some(TokenKind::Identifier(name)) => {
                if self.peek_kind() == Some(&TokenKind::Arrow) {
                    return self.parse_lambda();
                }
                self.advance();
                if self.check(&TokenKind::LParen) {
                    let method = Spanned::new(name, start);
                    let args = self.parse_args()?;
                    let span = start.merge(self.previous_span());
                    return Ok(Expr::new(
                        ExprKind::MethodCall {
                            object: None,
                            method,
                            args,
                        },
                        span,
                    ));
                }
                Ok(Expr::new(ExprKind::Ident(name), start))
            }
            Some(TokenKind::New) => self.parse_new(),
            Some(TokenKind::LParen) => {
                if let Some(TokenKind::JmlKeyword(word)) = self.peek_kind() {
                    if QUANTIFIERS.contains(&word.as_str()) {
                        return self.parse_quantifier();
                    }
                }
                if self.is_lambda_params() {
                    return self.parse_lambda();
                }

                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen)?;
                let span = start.merge(self.previous_span());
                Ok(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }
            Some(TokenKind::JmlKeyword(word)) => self.parse_jml_primary(word),
            Some(kind) if kind.is_primitive_type() || kind == TokenKind::Void => {
                // `int.class`, `int[].class`
                self.parse_type()?;
                self.expect(TokenKind::Dot)?;
                self.expect(TokenKind::Class)?;
                Ok(Expr::new(
                    ExprKind::Opaque(SmolStr::new("class literal")),
                    start.merge(self.previous_span()),
                ))
            }
            Some(TokenKind::LBrace) => self.parse_variable_initializer(),
            _ => Err(ParseError::InvalidExpression {
                span: start,
                hint: match self.current_kind() {
                    Some(kind) => format!("unexpected {}", kind),
                    None => "unexpected end of file".to_string(),
                },
            }),
        }
    }

    /// `\result`, `\old(e)`, `\fresh(x)`, ...
    fn parse_jml_primary(&mut self, word: SmolStr) -> ParseResult<Expr> {
        let start = self.current_span();
        self.advance();

        match word.as_str() {
            "\\old" | "\\pre" => {
                self.expect(TokenKind::LParen)?;
                let inner = self.parse_expression()?;
                // `\old(e, label)`
                if self.check(&TokenKind::Comma) {
                    self.advance();
                    self.parse_identifier()?;
                }
                self.expect(TokenKind::RParen)?;
                Ok(Expr::new(
                    ExprKind::Old(Box::new(inner)),
                    start.merge(self.previous_span()),
                ))
            }
            w if QUANTIFIERS.contains(&w) => Err(ParseError::InvalidExpression {
                span: start,
                hint: format!("{} must be enclosed in parentheses", w),
            }),
            _ if self.check(&TokenKind::LParen) => {
                self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
                Ok(Expr::new(
                    ExprKind::Opaque(word),
                    start.merge(self.previous_span()),
                ))
            }
            _ => Ok(Expr::new(ExprKind::Singleton(word), start)),
        }
    }

    /// `(\forall T x; range; body)` or `(\forall T x; body)`
    fn parse_quantifier(&mut self) -> ParseResult<Expr> {
        let start = self.expect(TokenKind::LParen)?;
        let quantifier = match self.current_kind().cloned() {
            Some(TokenKind::JmlKeyword(word)) => word,
            _ => return Err(self.unexpected("quantifier")),
        };
        self.advance();

        // Bound variable declarations
        while !self.is_eof() && !self.check(&TokenKind::Semicolon) {
            self.advance();
        }
        self.expect(TokenKind::Semicolon)?;

        let (range, body) = if self.check(&TokenKind::Semicolon) {
            self.advance();
            (None, self.parse_expression()?)
        } else {
            let first = self.parse_expression()?;
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                (Some(Box::new(first)), self.parse_expression()?)
            } else {
                (None, first)
            }
        };

        self.expect(TokenKind::RParen)?;
        Ok(Expr::new(
            ExprKind::Quantified {
                quantifier,
                range,
                body: Box::new(body),
            },
            start.merge(self.previous_span()),
        ))
    }

    /// `new T(args) [{ body }]` or `new T[n]... [{ init }]`
    pub(crate) fn parse_new(&mut self) -> ParseResult<Expr> {
        let start = self.expect(TokenKind::New)?;
        let mut ty = self.parse_type()?;

        if self.check(&TokenKind::LBracket) {
            while self.check(&TokenKind::LBracket) {
                self.advance();
                if !self.check(&TokenKind::RBracket) {
                    self.parse_expression()?;
                }
                self.expect(TokenKind::RBracket)?;
                ty.dims += 1;
            }
            if self.check(&TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
            }
            return Ok(Expr::new(
                ExprKind::New { ty, args: Vec::new() },
                start.merge(self.previous_span()),
            ));
        }

        if ty.dims > 0 {
            // `new int[] { 1, 2 }`
            if self.check(&TokenKind::LBrace) {
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
            }
            return Ok(Expr::new(
                ExprKind::New { ty, args: Vec::new() },
                start.merge(self.previous_span()),
            ));
        }

        let args = self.parse_args()?;
        if self.check(&TokenKind::LBrace) {
            // Anonymous class body
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
        }
        Ok(Expr::new(
            ExprKind::New { ty, args },
            start.merge(self.previous_span()),
        ))
    }

    /// Is the current `(` the parameter list of a lambda?
    fn is_lambda_params(&self) -> bool {
        let mut depth = 0usize;
        for (offset, token) in self.tokens[self.pos..].iter().enumerate() {
            match token.kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => {
                    depth -= 1;
                    if depth == 0 {
                        return matches!(
                            self.tokens.get(self.pos + offset + 1).map(|t| &t.kind),
                            Some(TokenKind::Arrow)
                        );
                    }
                }
                TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace => return false,
                _ => {}
            }
        }
        false
    }

    fn parse_lambda(&mut self) -> ParseResult<Expr> {
        let start = self.current_span();
        if self.check(&TokenKind::LParen) {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
        } else {
            self.parse_identifier()?;
        }
        self.expect(TokenKind::Arrow)?;

        if self.check(&TokenKind::LBrace) {
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
        } else {
            self.parse_expression()?;
        }

        Ok(Expr::new(
            ExprKind::Opaque(SmolStr::new("lambda")),
            start.merge(self.previous_span()),
        ))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.merge(right.span);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn compound_assign_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::PlusEq => Some(BinaryOp::Add),
        TokenKind::MinusEq => Some(BinaryOp::Sub),
        TokenKind::StarEq => Some(BinaryOp::Mul),
        TokenKind::SlashEq => Some(BinaryOp::Div),
        TokenKind::PercentEq => Some(BinaryOp::Rem),
        TokenKind::AmpEq => Some(BinaryOp::BitAnd),
        TokenKind::PipeEq => Some(BinaryOp::BitOr),
        TokenKind::CaretEq => Some(BinaryOp::BitXor),
        TokenKind::ShlEq => Some(BinaryOp::Shl),
        TokenKind::ShrEq => Some(BinaryOp::Shr),
        TokenKind::UShrEq => Some(BinaryOp::UShr),
        _ => None,
    }
}
