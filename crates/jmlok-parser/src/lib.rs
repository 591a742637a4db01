//! JMLOK Parser
//!
//! Recursive descent parser producing a [`CompilationUnit`] from a Java
//! source file (or a JML specification file) and the contract annotations
//! embedded in it.
//!
//! The parser only builds what contract analysis needs. Nested types,
//! initializer blocks, lambdas and the bodies of compound statements other
//! than blocks are skipped with balanced-delimiter scanning.

mod expr;
mod stmt;

use jmlok_ast::*;
use jmlok_lexer::{Lexer, Token, TokenKind};
use thiserror::Error;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("Unexpected token: expected {expected}, found {found} at position {span:?}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Unexpected end of file - expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("Invalid expression at position {span:?}: {hint}")]
    InvalidExpression { span: Span, hint: String },

    #[error("Invalid type at position {span:?}: {hint}")]
    InvalidType { span: Span, hint: String },

    #[error("Unclosed '{opener}' at position {span:?}")]
    Unclosed { opener: String, span: Span },

    #[error("{message}")]
    Lexer { message: String, span: Span },
}

impl ParseError {
    /// Source range the error points at
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::InvalidExpression { span, .. }
            | ParseError::InvalidType { span, .. }
            | ParseError::Unclosed { span, .. }
            | ParseError::Lexer { span, .. } => *span,
        }
    }

    /// Short code used when rendering diagnostics
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::UnexpectedToken { .. } => "P001",
            ParseError::UnexpectedEof { .. } => "P002",
            ParseError::InvalidExpression { .. } => "P003",
            ParseError::InvalidType { .. } => "P004",
            ParseError::Unclosed { .. } => "P005",
            ParseError::Lexer { .. } => "L001",
        }
    }
}

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// JML words that only modify a declaration
const JML_MODIFIERS: &[&str] = &[
    "pure",
    "spec_public",
    "spec_protected",
    "non_null",
    "nullable",
    "helper",
    "instance",
    "non_null_by_default",
    "nullable_by_default",
    "query",
    "secret",
    "uninitialized",
    "monitored",
    "code",
    "extract",
    "spec_pure",
];

/// Method specification clauses that carry no analyzable predicate
const OTHER_METHOD_CLAUSES: &[&str] = &[
    "assignable",
    "modifiable",
    "modifies",
    "signals",
    "signals_only",
    "exsures",
    "diverges",
    "when",
    "accessible",
    "callable",
    "measured_by",
    "duration",
    "working_space",
    "captures",
    "requires_redundantly",
    "ensures_redundantly",
    "pre_redundantly",
    "post_redundantly",
    "forall",
    "old",
];

/// Class-level annotation items that are skipped up to their `;`
const SKIPPED_CLASS_ITEMS: &[&str] = &[
    "initially",
    "represents",
    "axiom",
    "readable",
    "writable",
    "monitors_for",
    "in",
    "maps",
];

/// Outcome of parsing one class member
enum Member {
    Fields(Vec<FieldDecl>),
    Method(MethodDecl),
    Skipped,
}

/// Parser state
pub struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<ParseError>,
    /// JML method specification waiting for the next method or constructor
    pending: MethodContract,
    /// `invariant` / `constraint` clauses of the class being parsed
    class_contracts: Vec<Contract>,
}

impl<'src> Parser<'src> {
    /// Create a new parser from source code
    pub fn new(source: &'src str) -> Self {
        let lexer = Lexer::new(source);
        let (tokens, lex_errors) = lexer.tokenize_filtered();

        let errors = lex_errors
            .into_iter()
            .map(|e| {
                let pos = e.position();
                ParseError::Lexer {
                    message: e.to_string(),
                    span: Span::new(pos, pos + 1),
                }
            })
            .collect();

        Self {
            source,
            tokens,
            pos: 0,
            errors,
            pending: MethodContract::default(),
            class_contracts: Vec::new(),
        }
    }

    /// Parse the whole file
    pub fn parse_compilation_unit(&mut self) -> CompilationUnit {
        let mut unit = CompilationUnit::default();

        while !self.is_eof() {
            let result = match self.current_kind() {
                Some(TokenKind::AnnotationStart) => {
                    // File-level JML (model imports and the like)
                    self.skip_annotation();
                    Ok(())
                }
                Some(TokenKind::Semicolon) => {
                    self.advance();
                    Ok(())
                }
                Some(TokenKind::Package) => self.parse_package().map(|p| unit.package = p),
                Some(TokenKind::Import) => self.parse_import().map(|i| unit.imports.push(i)),
                _ => self.parse_type_decl().map(|decl| unit.types.extend(decl)),
            };

            if let Err(e) = result {
                self.errors.push(e);
                self.recover_to_next_member();
                if self.check(&TokenKind::RBrace) {
                    self.advance();
                }
            }
        }

        unit
    }

    /// Get collected errors
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<&TokenKind> {
        self.current().map(|t| &t.kind)
    }

    fn current_span(&self) -> Span {
        self.current()
            .map(|t| t.span)
            .unwrap_or(Span::new(self.source.len(), self.source.len()))
    }

    fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens
                .get(self.pos - 1)
                .map(|t| t.span)
                .unwrap_or(Span::new(0, 0))
        } else {
            Span::new(0, 0)
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn advance(&mut self) {
        if !self.is_eof() {
            self.pos += 1;
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.tokens.get(self.pos + 1).map(|t| &t.kind)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.current_kind() {
            Some(kind) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: kind.to_string(),
                span: self.current_span(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                span: self.current_span(),
            },
        }
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Span> {
        if self.check(&kind) {
            self.advance();
            Ok(self.previous_span())
        } else {
            Err(self.unexpected(&kind.to_string()))
        }
    }

    fn parse_identifier(&mut self) -> ParseResult<Ident> {
        let span = self.current_span();
        match self.current_kind().cloned() {
            Some(TokenKind::Identifier(s)) => {
                self.advance();
                Ok(Spanned::new(s, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Dotted name such as `java.util.List`
    fn parse_qualified_name(&mut self) -> ParseResult<SmolStr> {
        let mut name = self.parse_identifier()?.node.to_string();
        while self.check(&TokenKind::Dot)
            && matches!(self.peek_kind(), Some(TokenKind::Identifier(_)))
        {
            self.advance();
            name.push('.');
            name.push_str(&self.parse_identifier()?.node);
        }
        Ok(SmolStr::new(name))
    }

    fn source_text(&self, span: Span) -> &'src str {
        self.source.get(span.start..span.end).unwrap_or("")
    }

    // ========================================================================
    // Skipping and Recovery
    // ========================================================================

    /// Skip a balanced `open ... close` group; the current token must be `open`
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> ParseResult<()> {
        let start = self.current_span();
        let mut depth = 0usize;
        while let Some(kind) = self.current_kind() {
            if *kind == open {
                depth += 1;
            } else if *kind == close {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    self.advance();
                    return Ok(());
                }
            }
            self.advance();
        }
        Err(ParseError::Unclosed {
            opener: open.to_string(),
            span: start,
        })
    }

    /// Skip generic arguments or parameters; the current token must be `<`
    fn skip_type_args(&mut self) -> ParseResult<()> {
        let start = self.current_span();
        let mut depth: i32 = 0;
        while let Some(kind) = self.current_kind() {
            match kind {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => depth -= 1,
                TokenKind::Shr => depth -= 2,
                TokenKind::UShr => depth -= 3,
                TokenKind::Semicolon
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Eq
                | TokenKind::AnnotationEnd => break,
                _ => {}
            }
            self.advance();
            if depth <= 0 {
                return Ok(());
            }
        }
        Err(ParseError::Unclosed {
            opener: "<".to_string(),
            span: start,
        })
    }

    /// Skip the remainder of a JML annotation, including its end marker
    fn skip_annotation(&mut self) {
        while let Some(kind) = self.current_kind() {
            let done = *kind == TokenKind::AnnotationEnd;
            self.advance();
            if done {
                break;
            }
        }
    }

    /// Skip to the end of the current `;`-terminated item, stepping over
    /// balanced groups. Stops before a closing `}` or annotation end.
    fn skip_to_semicolon(&mut self) -> ParseResult<()> {
        while let Some(kind) = self.current_kind() {
            match kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::RBrace | TokenKind::AnnotationEnd => return Ok(()),
                TokenKind::LBrace => {
                    self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                    return Ok(());
                }
                TokenKind::LParen => self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?,
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    fn recover_to_next_member(&mut self) {
        while let Some(kind) = self.current_kind() {
            match kind {
                TokenKind::Semicolon => {
                    self.advance();
                    break;
                }
                TokenKind::RBrace => break,
                TokenKind::LBrace => {
                    let _ = self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace);
                    break;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    // ========================================================================
    // File Header
    // ========================================================================

    fn parse_package(&mut self) -> ParseResult<SmolStr> {
        self.expect(TokenKind::Package)?;
        let name = self.parse_qualified_name()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(name)
    }

    fn parse_import(&mut self) -> ParseResult<ImportDecl> {
        let start = self.expect(TokenKind::Import)?;
        let is_static = if self.check(&TokenKind::Static) {
            self.advance();
            true
        } else {
            false
        };
        let path = self.parse_qualified_name()?;
        let on_demand = if self.check(&TokenKind::Dot) && self.peek_kind() == Some(&TokenKind::Star) {
            self.advance();
            self.advance();
            true
        } else {
            false
        };
        let end = self.expect(TokenKind::Semicolon)?;
        Ok(ImportDecl {
            path,
            is_static,
            on_demand,
            span: start.merge(end),
        })
    }

    // ========================================================================
    // Modifiers
    // ========================================================================

    /// Skip Java modifiers, Java annotations and inline JML annotations.
    /// Returns whether `static` was among them.
    fn parse_modifiers(&mut self) -> ParseResult<bool> {
        let mut is_static = false;
        loop {
            match self.current_kind() {
                Some(TokenKind::Static) => {
                    is_static = true;
                    self.advance();
                }
                Some(kind) if kind.is_modifier() => {
                    self.advance();
                }
                Some(TokenKind::At) if self.peek_kind() != Some(&TokenKind::Interface) => {
                    self.skip_java_annotation()?;
                }
                Some(TokenKind::AnnotationStart) => self.parse_class_annotation(),
                _ => return Ok(is_static),
            }
        }
    }

    /// `@Name` or `@Name(...)`
    fn skip_java_annotation(&mut self) -> ParseResult<()> {
        self.expect(TokenKind::At)?;
        self.parse_qualified_name()?;
        if self.check(&TokenKind::LParen) {
            self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?;
        }
        Ok(())
    }

    // ========================================================================
    // Types
    // ========================================================================

    fn parse_type(&mut self) -> ParseResult<TypeRef> {
        let start = self.current_span();
        let name = match self.current_kind().cloned() {
            Some(kind) if kind.is_primitive_type() || kind == TokenKind::Void => {
                self.advance();
                SmolStr::new(kind.to_string())
            }
            Some(TokenKind::Identifier(first)) => {
                self.advance();
                let mut name = first.to_string();
                loop {
                    if self.check(&TokenKind::Lt) {
                        self.skip_type_args()?;
                    }
                    if self.check(&TokenKind::Dot)
                        && matches!(self.peek_kind(), Some(TokenKind::Identifier(_)))
                    {
                        self.advance();
                        name.push('.');
                        name.push_str(&self.parse_identifier()?.node);
                    } else {
                        break;
                    }
                }
                SmolStr::new(name)
            }
            _ => {
                return Err(ParseError::InvalidType {
                    span: start,
                    hint: "expected a type name".to_string(),
                })
            }
        };

        let mut dims = 0;
        while self.check(&TokenKind::LBracket) && self.peek_kind() == Some(&TokenKind::RBracket) {
            self.advance();
            self.advance();
            dims += 1;
        }
        if self.check(&TokenKind::Ellipsis) {
            self.advance();
            dims += 1;
        }

        Ok(TypeRef::new(name, dims, start.merge(self.previous_span())))
    }

    fn parse_type_list(&mut self) -> ParseResult<Vec<TypeRef>> {
        let mut types = vec![self.parse_type()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            types.push(self.parse_type()?);
        }
        Ok(types)
    }

    // ========================================================================
    // Type Declarations
    // ========================================================================

    /// Parse a top-level type. Annotation type declarations are skipped.
    fn parse_type_decl(&mut self) -> ParseResult<Option<ClassDecl>> {
        let start = self.current_span();
        self.parse_modifiers()?;

        if self.check(&TokenKind::At) {
            self.skip_nested_type()?;
            return Ok(None);
        }

        let kind = match self.current_kind() {
            Some(TokenKind::Class) => ClassKind::Class,
            Some(TokenKind::Interface) => ClassKind::Interface,
            Some(TokenKind::Enum) => ClassKind::Enum,
            _ => return Err(self.unexpected("class, interface or enum declaration")),
        };
        self.advance();
        self.parse_class_decl(kind, start).map(Some)
    }

    fn parse_class_decl(&mut self, kind: ClassKind, start: Span) -> ParseResult<ClassDecl> {
        let name = self.parse_identifier()?;
        if self.check(&TokenKind::Lt) {
            self.skip_type_args()?;
        }

        let mut extends = None;
        let mut implements = Vec::new();
        if self.check(&TokenKind::Extends) {
            self.advance();
            let types = self.parse_type_list()?;
            if kind == ClassKind::Interface {
                implements.extend(types);
            } else {
                extends = types.into_iter().next();
            }
        }
        if self.check(&TokenKind::Implements) {
            self.advance();
            implements.extend(self.parse_type_list()?);
        }
        // `permits` and anything else up to the body
        while !self.check(&TokenKind::LBrace) && !self.is_eof() {
            self.advance();
        }
        self.expect(TokenKind::LBrace)?;

        self.pending = MethodContract::default();
        let outer_contracts = std::mem::take(&mut self.class_contracts);

        if kind == ClassKind::Enum {
            self.skip_enum_constants()?;
        }

        let mut fields = Vec::new();
        let mut methods = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            match self.current_kind() {
                Some(TokenKind::AnnotationStart) => {
                    self.parse_class_annotation();
                    continue;
                }
                Some(TokenKind::Semicolon) => {
                    self.advance();
                    continue;
                }
                _ => {}
            }

            match self.parse_member(&name.node) {
                Ok(Member::Fields(decls)) => fields.extend(decls),
                Ok(Member::Method(method)) => methods.push(method),
                Ok(Member::Skipped) => {}
                Err(e) => {
                    self.errors.push(e);
                    self.pending = MethodContract::default();
                    self.recover_to_next_member();
                }
            }
        }

        let end = self.expect(TokenKind::RBrace)?;
        let contracts = std::mem::replace(&mut self.class_contracts, outer_contracts);

        Ok(ClassDecl {
            kind,
            name,
            extends,
            implements,
            fields,
            methods,
            contracts,
            span: start.merge(end),
        })
    }

    /// Skip enum constants up to the `;` that starts the member list
    fn skip_enum_constants(&mut self) -> ParseResult<()> {
        while let Some(kind) = self.current_kind() {
            match kind {
                TokenKind::Semicolon => {
                    self.advance();
                    return Ok(());
                }
                TokenKind::RBrace => return Ok(()),
                TokenKind::LParen => self.skip_balanced(TokenKind::LParen, TokenKind::RParen)?,
                TokenKind::LBrace => self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?,
                _ => {
                    self.advance();
                }
            }
        }
        Ok(())
    }

    /// Skip a nested class, interface, enum or annotation type
    fn skip_nested_type(&mut self) -> ParseResult<()> {
        while !self.check(&TokenKind::LBrace) && !self.is_eof() {
            self.advance();
        }
        self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)
    }

    fn parse_member(&mut self, class_name: &SmolStr) -> ParseResult<Member> {
        let start = self.current_span();
        let is_static = self.parse_modifiers()?;

        match self.current_kind() {
            Some(TokenKind::Class | TokenKind::Interface | TokenKind::Enum | TokenKind::At) => {
                self.pending = MethodContract::default();
                self.skip_nested_type()?;
                return Ok(Member::Skipped);
            }
            Some(TokenKind::LBrace) => {
                // Initializer block
                self.pending = MethodContract::default();
                self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
                return Ok(Member::Skipped);
            }
            Some(TokenKind::RBrace) | None => {
                // Modifiers or annotations right before the end of the class
                return Ok(Member::Skipped);
            }
            Some(TokenKind::Lt) => {
                self.skip_type_args()?;
            }
            _ => {}
        }

        let is_constructor = matches!(self.current_kind(), Some(TokenKind::Identifier(s)) if s == class_name)
            && self.peek_kind() == Some(&TokenKind::LParen);

        if is_constructor {
            let name = self.parse_identifier()?;
            return self
                .parse_method_rest(MethodKind::Constructor, name, None, start)
                .map(Member::Method);
        }

        let ty = self.parse_type()?;
        let name = self.parse_identifier()?;

        if self.check(&TokenKind::LParen) {
            return self
                .parse_method_rest(MethodKind::Method, name, Some(ty), start)
                .map(Member::Method);
        }

        self.pending = MethodContract::default();
        self.parse_field_declarators(ty, name, is_static, start)
            .map(Member::Fields)
    }

    fn parse_method_rest(
        &mut self,
        kind: MethodKind,
        name: Ident,
        return_type: Option<TypeRef>,
        start: Span,
    ) -> ParseResult<MethodDecl> {
        let params = self.parse_params()?;

        // Legacy array dimensions after the parameter list, `throws`, and
        // annotation-method defaults
        while !self.is_eof()
            && !self.check(&TokenKind::LBrace)
            && !self.check(&TokenKind::Semicolon)
        {
            if self.check(&TokenKind::AnnotationStart) {
                self.parse_class_annotation();
            } else {
                self.advance();
            }
        }
        let header_end = self.previous_span().end;
        let header = SmolStr::new(self.source_text(Span::new(start.start, header_end)).trim());

        let body = if self.check(&TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            self.expect(TokenKind::Semicolon)?;
            None
        };

        let contract = self.take_pending_contract();

        Ok(MethodDecl {
            kind,
            name,
            return_type,
            params,
            body,
            contract,
            header,
            span: start.merge(self.previous_span()),
        })
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();

        while !self.check(&TokenKind::RParen) && !self.is_eof() {
            let start = self.current_span();
            loop {
                match self.current_kind() {
                    Some(TokenKind::Final) => {
                        self.advance();
                    }
                    Some(TokenKind::At) => self.skip_java_annotation()?,
                    Some(TokenKind::AnnotationStart) => self.skip_annotation(),
                    _ => break,
                }
            }
            let ty = self.parse_type()?;
            let name = self.parse_identifier()?;
            let mut ty = ty;
            while self.check(&TokenKind::LBracket) && self.peek_kind() == Some(&TokenKind::RBracket) {
                self.advance();
                self.advance();
                ty.dims += 1;
            }
            params.push(Param {
                name,
                ty,
                span: start.merge(self.previous_span()),
            });

            if !self.check(&TokenKind::RParen) {
                self.expect(TokenKind::Comma)?;
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok(params)
    }

    fn parse_field_declarators(
        &mut self,
        ty: TypeRef,
        first: Ident,
        is_static: bool,
        start: Span,
    ) -> ParseResult<Vec<FieldDecl>> {
        let mut fields = Vec::new();
        let mut name = first;

        loop {
            let mut field_ty = ty.clone();
            while self.check(&TokenKind::LBracket) && self.peek_kind() == Some(&TokenKind::RBracket) {
                self.advance();
                self.advance();
                field_ty.dims += 1;
            }

            let initializer = if self.check(&TokenKind::Eq) {
                self.advance();
                Some(self.parse_variable_initializer()?)
            } else {
                None
            };

            fields.push(FieldDecl {
                name,
                ty: field_ty,
                is_static,
                initializer,
                span: start.merge(self.previous_span()),
            });

            if self.check(&TokenKind::Comma) {
                self.advance();
                name = self.parse_identifier()?;
            } else {
                break;
            }
        }

        self.expect(TokenKind::Semicolon)?;
        Ok(fields)
    }

    /// Expression or `{ ... }` array initializer
    fn parse_variable_initializer(&mut self) -> ParseResult<Expr> {
        if self.check(&TokenKind::LBrace) {
            let start = self.current_span();
            self.skip_balanced(TokenKind::LBrace, TokenKind::RBrace)?;
            return Ok(Expr::new(
                ExprKind::Opaque(SmolStr::new("array initializer")),
                start.merge(self.previous_span()),
            ));
        }
        self.parse_expression()
    }

    // ========================================================================
    // JML Annotations
    // ========================================================================

    /// Parse a JML annotation in class-body position. Method specification
    /// clauses accumulate in `pending`; invariants and constraints go to the
    /// class.
    fn parse_class_annotation(&mut self) {
        self.advance(); // AnnotationStart

        while !self.is_eof() && !self.check(&TokenKind::AnnotationEnd) {
            if let Err(e) = self.parse_annotation_item() {
                self.errors.push(e);
                while !self.is_eof()
                    && !self.check(&TokenKind::AnnotationEnd)
                    && !self.check(&TokenKind::Semicolon)
                {
                    self.advance();
                }
                if self.check(&TokenKind::Semicolon) {
                    self.advance();
                }
            }
        }

        if self.check(&TokenKind::AnnotationEnd) {
            self.advance();
        }
    }

    fn parse_annotation_item(&mut self) -> ParseResult<()> {
        let word = match self.current_kind() {
            Some(TokenKind::Identifier(word)) => word.clone(),
            _ => {
                // Visibility, `{|`, `|}`, stray `;` and the like
                self.advance();
                return Ok(());
            }
        };

        match word.as_str() {
            "invariant" | "invariant_redundantly" => {
                let clause = self.parse_clause_body()?;
                self.class_contracts.push(Contract::Invariant(clause));
            }
            "constraint" | "constraint_redundantly" => {
                let start = self.current_span();
                self.advance();
                let condition = self.parse_expression()?;
                // Optional `for m1, m2` restriction
                if self.check(&TokenKind::For) {
                    while !self.is_eof()
                        && !self.check(&TokenKind::Semicolon)
                        && !self.check(&TokenKind::AnnotationEnd)
                    {
                        self.advance();
                    }
                }
                let end = self.expect(TokenKind::Semicolon)?;
                self.class_contracts.push(Contract::Constraint(ContractClause {
                    condition: Box::new(condition),
                    span: start.merge(end),
                }));
            }
            "requires" | "pre" => {
                let clause = self.parse_clause_body()?;
                self.push_method_clause(Contract::Requires(clause));
            }
            "ensures" | "post" => {
                let clause = self.parse_clause_body()?;
                self.push_method_clause(Contract::Ensures(clause));
            }
            "also" => {
                self.advance();
                self.start_spec_case();
            }
            "normal_behavior" | "normal_behaviour" | "behavior" | "behaviour"
            | "exceptional_behavior" | "exceptional_behaviour" => {
                self.advance();
                self.start_spec_case();
            }
            "model" | "ghost" => {
                self.advance();
                self.skip_to_semicolon()?;
            }
            w if SKIPPED_CLASS_ITEMS.contains(&w) => {
                self.advance();
                self.skip_to_semicolon()?;
            }
            w if JML_MODIFIERS.contains(&w) => {
                self.advance();
            }
            w if OTHER_METHOD_CLAUSES.contains(&w) => {
                let span = self.current_span();
                self.advance();
                self.skip_to_semicolon()?;
                self.push_method_clause(Contract::Other {
                    keyword: word.clone(),
                    span: span.merge(self.previous_span()),
                });
            }
            _ => {
                self.advance();
            }
        }
        Ok(())
    }

    /// `keyword expr ;` with the keyword as the current token
    fn parse_clause_body(&mut self) -> ParseResult<ContractClause> {
        let start = self.current_span();
        self.advance();
        let condition = self.parse_expression()?;
        let end = self.expect(TokenKind::Semicolon)?;
        Ok(ContractClause {
            condition: Box::new(condition),
            span: start.merge(end),
        })
    }

    fn push_method_clause(&mut self, clause: Contract) {
        if self.pending.cases.is_empty() {
            self.pending.cases.push(SpecCase::default());
        }
        if let Some(case) = self.pending.cases.last_mut() {
            case.clauses.push(clause);
        }
    }

    fn start_spec_case(&mut self) {
        let needs_case = self
            .pending
            .cases
            .last()
            .map_or(true, |case| !case.clauses.is_empty());
        if needs_case {
            self.pending.cases.push(SpecCase::default());
        }
    }

    fn take_pending_contract(&mut self) -> Option<MethodContract> {
        let mut contract = std::mem::take(&mut self.pending);
        contract.cases.retain(|case| !case.clauses.is_empty());
        if contract.cases.is_empty() {
            None
        } else {
            Some(contract)
        }
    }
}

/// Parse a Java or JML specification file. Always yields a (possibly
/// partial) compilation unit together with every error encountered.
pub fn parse(source: &str) -> (CompilationUnit, Vec<ParseError>) {
    let mut parser = Parser::new(source);
    let unit = parser.parse_compilation_unit();
    (unit, parser.errors().to_vec())
}

#[cfg(test)]
mod tests;
