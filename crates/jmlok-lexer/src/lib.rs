//! JMLOK Lexer
//!
//! Tokenizes Java source files and the JML contract annotations embedded in
//! them. Uses the `logos` crate for the raw scan.
//!
//! JML lives inside comments: `//@ ...` runs to the end of the line and
//! `/*@ ... @*/` spans a block. [`Lexer::tokenize`] re-lexes the interior of
//! each annotation and emits it between [`TokenKind::AnnotationStart`] and
//! [`TokenKind::AnnotationEnd`], with spans pointing into the original file.

use logos::Logos;
use smol_str::SmolStr;
use std::fmt;
use std::ops::Range;

/// Source span representing a byte range in the source code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
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

    pub fn dummy() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Shift the span by `offset` bytes
    pub fn offset(self, offset: usize) -> Span {
        Span::new(self.start + offset, self.end + offset)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

/// A token with its kind and source location
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

/// Consumes a block comment body up to and including the closing `*/`.
/// Carries `false` when the comment runs off the end of the input.
fn block_comment_callback(lex: &mut logos::Lexer<TokenKind>) -> Option<bool> {
    let remainder = lex.remainder();
    match remainder.find("*/") {
        Some(end_idx) => {
            lex.bump(end_idx + 2);
            Some(true)
        }
        None => {
            lex.bump(remainder.len());
            Some(false)
        }
    }
}

/// All token kinds of the Java + JML surface syntax.
///
/// JML clause keywords (`requires`, `ensures`, `invariant`, ...) are
/// contextual and lex as identifiers; only backslash keywords get their own
/// variant.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    // ========== Keywords ==========
    #[token("package")]
    Package,
    #[token("import")]
    Import,
    #[token("class")]
    Class,
    #[token("interface")]
    Interface,
    #[token("enum")]
    Enum,
    #[token("extends")]
    Extends,
    #[token("implements")]
    Implements,
    #[token("throws")]
    Throws,
    #[token("public")]
    Public,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("static")]
    Static,
    #[token("final")]
    Final,
    #[token("abstract")]
    Abstract,
    #[token("native")]
    Native,
    #[token("synchronized")]
    Synchronized,
    #[token("transient")]
    Transient,
    #[token("volatile")]
    Volatile,
    #[token("strictfp")]
    Strictfp,
    #[token("default")]
    Default,
    #[token("new")]
    New,
    #[token("this")]
    This,
    #[token("super")]
    Super,
    #[token("return")]
    Return,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("throw")]
    Throw,
    #[token("try")]
    Try,
    #[token("catch")]
    Catch,
    #[token("finally")]
    Finally,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("assert")]
    Assert,
    #[token("instanceof")]
    Instanceof,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,

    // ========== Primitive types ==========
    #[token("void")]
    Void,
    #[token("boolean")]
    Boolean,
    #[token("byte")]
    Byte,
    #[token("char")]
    Char,
    #[token("short")]
    Short,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("float")]
    Float,
    #[token("double")]
    Double,

    // ========== Literals ==========
    #[regex(r"0[xX][0-9a-fA-F_]+[lL]?", |lex| SmolStr::new(lex.slice()))]
    #[regex(r"0[bB][01_]+[lL]?", |lex| SmolStr::new(lex.slice()))]
    #[regex(r"[0-9][0-9_]*[lL]?", |lex| SmolStr::new(lex.slice()))]
    IntLiteral(SmolStr),

    #[regex(r"[0-9][0-9_]*\.[0-9][0-9_]*([eE][+-]?[0-9]+)?[fFdD]?", |lex| SmolStr::new(lex.slice()))]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9]+[fFdD]?", |lex| SmolStr::new(lex.slice()))]
    #[regex(r"[0-9][0-9_]*[fFdD]", |lex| SmolStr::new(lex.slice()))]
    FloatLiteral(SmolStr),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| SmolStr::new(lex.slice()))]
    StringLiteral(SmolStr),

    #[regex(r"'([^'\\\n]|\\u[0-9a-fA-F]{4}|\\[0-7]{1,3}|\\.)'", |lex| SmolStr::new(lex.slice()))]
    CharLiteral(SmolStr),

    // ========== Identifiers ==========
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| SmolStr::new(lex.slice()))]
    Identifier(SmolStr),

    /// JML backslash keyword such as `\result`, `\old` or `\forall`
    #[regex(r"\\[a-zA-Z_]+", |lex| SmolStr::new(lex.slice()))]
    JmlKeyword(SmolStr),

    // ========== JML operators ==========
    #[token("==>")]
    Implies,
    #[token("<==")]
    RevImplies,
    #[token("<==>")]
    Equiv,
    #[token("<=!=>")]
    NotEquiv,

    // ========== Operators ==========
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("!")]
    Bang,
    #[token("~")]
    Tilde,
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token("::")]
    ColonColon,
    #[token("->")]
    Arrow,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token(">>>")]
    UShr,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token("%=")]
    PercentEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    ShlEq,
    #[token(">>=")]
    ShrEq,
    #[token(">>>=")]
    UShrEq,

    // ========== Delimiters ==========
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("@")]
    At,

    // ========== Comments ==========
    #[regex(r"//[^\n]*")]
    LineComment,

    /// `/* ... */`; the flag records whether the closing delimiter was found
    #[token("/*", block_comment_callback)]
    BlockComment(bool),

    /// `//@ ...` single-line JML annotation
    #[regex(r"//@[^\n]*", priority = 10)]
    JmlLine,

    /// `/*@ ... @*/` block JML annotation; the flag records termination
    #[token("/*@", block_comment_callback)]
    JmlBlock(bool),

    // ========== Synthesized by `Lexer::tokenize` ==========
    /// Opens the re-lexed body of a JML annotation
    AnnotationStart,
    /// Closes the re-lexed body of a JML annotation
    AnnotationEnd,

    /// Error token
    Error,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Package => "package",
            TokenKind::Import => "import",
            TokenKind::Class => "class",
            TokenKind::Interface => "interface",
            TokenKind::Enum => "enum",
            TokenKind::Extends => "extends",
            TokenKind::Implements => "implements",
            TokenKind::Throws => "throws",
            TokenKind::Public => "public",
            TokenKind::Private => "private",
            TokenKind::Protected => "protected",
            TokenKind::Static => "static",
            TokenKind::Final => "final",
            TokenKind::Abstract => "abstract",
            TokenKind::Native => "native",
            TokenKind::Synchronized => "synchronized",
            TokenKind::Transient => "transient",
            TokenKind::Volatile => "volatile",
            TokenKind::Strictfp => "strictfp",
            TokenKind::Default => "default",
            TokenKind::New => "new",
            TokenKind::This => "this",
            TokenKind::Super => "super",
            TokenKind::Return => "return",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::Do => "do",
            TokenKind::For => "for",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::Throw => "throw",
            TokenKind::Try => "try",
            TokenKind::Catch => "catch",
            TokenKind::Finally => "finally",
            TokenKind::Switch => "switch",
            TokenKind::Case => "case",
            TokenKind::Assert => "assert",
            TokenKind::Instanceof => "instanceof",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::Void => "void",
            TokenKind::Boolean => "boolean",
            TokenKind::Byte => "byte",
            TokenKind::Char => "char",
            TokenKind::Short => "short",
            TokenKind::Int => "int",
            TokenKind::Long => "long",
            TokenKind::Float => "float",
            TokenKind::Double => "double",
            TokenKind::IntLiteral(s) => return write!(f, "integer `{}`", s),
            TokenKind::FloatLiteral(s) => return write!(f, "float `{}`", s),
            TokenKind::StringLiteral(s) => return write!(f, "string {}", s),
            TokenKind::CharLiteral(s) => return write!(f, "char {}", s),
            TokenKind::Identifier(s) => return write!(f, "identifier `{}`", s),
            TokenKind::JmlKeyword(s) => return write!(f, "`{}`", s),
            TokenKind::Implies => "==>",
            TokenKind::RevImplies => "<==",
            TokenKind::Equiv => "<==>",
            TokenKind::NotEquiv => "<=!=>",
            TokenKind::Eq => "=",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::LtEq => "<=",
            TokenKind::GtEq => ">=",
            TokenKind::Bang => "!",
            TokenKind::Tilde => "~",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::ColonColon => "::",
            TokenKind::Arrow => "->",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Amp => "&",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Shl => "<<",
            TokenKind::Shr => ">>",
            TokenKind::UShr => ">>>",
            TokenKind::PlusEq => "+=",
            TokenKind::MinusEq => "-=",
            TokenKind::StarEq => "*=",
            TokenKind::SlashEq => "/=",
            TokenKind::PercentEq => "%=",
            TokenKind::AmpEq => "&=",
            TokenKind::PipeEq => "|=",
            TokenKind::CaretEq => "^=",
            TokenKind::ShlEq => "<<=",
            TokenKind::ShrEq => ">>=",
            TokenKind::UShrEq => ">>>=",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Ellipsis => "...",
            TokenKind::At => "@",
            TokenKind::LineComment | TokenKind::BlockComment(_) => "comment",
            TokenKind::JmlLine | TokenKind::JmlBlock(_) => "JML annotation",
            TokenKind::AnnotationStart => "start of JML annotation",
            TokenKind::AnnotationEnd => "end of JML annotation",
            TokenKind::Error => "error",
        };
        f.write_str(text)
    }
}

impl TokenKind {
    /// Check if this token is a comment (JML annotations are not comments)
    pub fn is_comment(&self) -> bool {
        matches!(self, TokenKind::LineComment | TokenKind::BlockComment(_))
    }

    /// Check if this token names a primitive Java type
    pub fn is_primitive_type(&self) -> bool {
        matches!(
            self,
            TokenKind::Boolean
                | TokenKind::Byte
                | TokenKind::Char
                | TokenKind::Short
                | TokenKind::Int
                | TokenKind::Long
                | TokenKind::Float
                | TokenKind::Double
        )
    }

    /// Check if this token is a declaration modifier
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            TokenKind::Public
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Static
                | TokenKind::Final
                | TokenKind::Abstract
                | TokenKind::Native
                | TokenKind::Synchronized
                | TokenKind::Transient
                | TokenKind::Volatile
                | TokenKind::Strictfp
                | TokenKind::Default
        )
    }
}

/// Lexer error type with detailed error messages
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerError {
    #[error("Unexpected character '{1}' at position {0}")]
    UnexpectedCharacter(usize, char),

    #[error("Unterminated block comment starting at position {0} - expected closing '*/'")]
    UnterminatedBlockComment(usize),

    #[error("Unterminated JML annotation starting at position {0} - expected closing '@*/'")]
    UnterminatedAnnotation(usize),
}

impl LexerError {
    /// Byte offset the error refers to
    pub fn position(&self) -> usize {
        match self {
            LexerError::UnexpectedCharacter(pos, _)
            | LexerError::UnterminatedBlockComment(pos)
            | LexerError::UnterminatedAnnotation(pos) => *pos,
        }
    }
}

/// Replace JML `@` margin markers with spaces so the annotation body lexes
/// as plain Java. Byte offsets are preserved.
fn mask_annotation_markers(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_line_start = true;
    for ch in text.chars() {
        if ch == '\n' {
            at_line_start = true;
            out.push(ch);
            continue;
        }
        if at_line_start && ch == '@' {
            out.push(' ');
            continue;
        }
        if !ch.is_whitespace() {
            at_line_start = false;
        }
        out.push(ch);
    }

    // Trailing `@` before the closing `*/`
    let keep = out
        .trim_end_matches(|c: char| c == '@' || c.is_whitespace())
        .len();
    let tail: String = out[keep..]
        .chars()
        .map(|c| if c == '@' { ' ' } else { c })
        .collect();
    out.truncate(keep);
    out.push_str(&tail);
    out
}

/// Lexer for Java + JML source code
pub struct Lexer<'src> {
    source: &'src str,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'src str) -> Self {
        Self { source }
    }

    /// Get the source code being lexed
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Tokenize the entire source into a vector of tokens.
    ///
    /// Comments are kept as trivia. JML annotations are expanded in place.
    pub fn tokenize(self) -> (Vec<Token>, Vec<LexerError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        lex_region(self.source, 0, false, &mut tokens, &mut errors);
        (tokens, errors)
    }

    /// Tokenize, filtering out comments and collecting only non-trivia tokens
    pub fn tokenize_filtered(self) -> (Vec<Token>, Vec<LexerError>) {
        let (tokens, errors) = self.tokenize();
        let filtered: Vec<Token> = tokens
            .into_iter()
            .filter(|t| !t.kind.is_comment())
            .collect();
        (filtered, errors)
    }
}

/// Lex `text`, whose first byte sits at `offset` in the original file.
/// Inside an annotation, nested annotation markers are plain comments.
fn lex_region(
    text: &str,
    offset: usize,
    in_annotation: bool,
    tokens: &mut Vec<Token>,
    errors: &mut Vec<LexerError>,
) {
    let mut inner = TokenKind::lexer(text);
    while let Some(result) = inner.next() {
        let range = inner.span();
        let span = Span::from(range.clone()).offset(offset);
        match result {
            Ok(TokenKind::BlockComment(terminated)) => {
                if !terminated {
                    errors.push(LexerError::UnterminatedBlockComment(span.start));
                }
                tokens.push(Token::new(TokenKind::BlockComment(terminated), span));
            }
            Ok(TokenKind::JmlLine) if !in_annotation => {
                let body = &text[range.start + 3..range.end];
                tokens.push(Token::new(
                    TokenKind::AnnotationStart,
                    Span::new(span.start, span.start + 3),
                ));
                lex_region(
                    &mask_annotation_markers(body),
                    span.start + 3,
                    true,
                    tokens,
                    errors,
                );
                tokens.push(Token::new(
                    TokenKind::AnnotationEnd,
                    Span::new(span.end, span.end),
                ));
            }
            Ok(TokenKind::JmlBlock(terminated)) if !in_annotation => {
                let body_end = if terminated { range.end - 2 } else { range.end };
                let body = &text[range.start + 3..body_end];
                if !terminated {
                    errors.push(LexerError::UnterminatedAnnotation(span.start));
                }
                tokens.push(Token::new(
                    TokenKind::AnnotationStart,
                    Span::new(span.start, span.start + 3),
                ));
                lex_region(
                    &mask_annotation_markers(body),
                    span.start + 3,
                    true,
                    tokens,
                    errors,
                );
                tokens.push(Token::new(
                    TokenKind::AnnotationEnd,
                    Span::new(body_end + offset, span.end),
                ));
            }
            Ok(TokenKind::JmlLine) => {
                tokens.push(Token::new(TokenKind::LineComment, span));
            }
            Ok(TokenKind::JmlBlock(terminated)) => {
                tokens.push(Token::new(TokenKind::BlockComment(terminated), span));
            }
            Ok(kind) => tokens.push(Token::new(kind, span)),
            Err(_) => {
                let bad_char = text[range].chars().next().unwrap_or('?');
                errors.push(LexerError::UnexpectedCharacter(span.start, bad_char));
                tokens.push(Token::new(TokenKind::Error, span));
            }
        }
    }
}
