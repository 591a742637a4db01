//! JMLOK Abstract Syntax Tree
//!
//! A deliberately small model of a JML-annotated Java compilation unit:
//! enough structure to inspect contract clauses, field declarations and the
//! top-level statements of method bodies. Nested types, lambdas and other
//! constructs that never influence contract analysis are kept opaque.

// Re-export common types for use by other crates
pub use jmlok_lexer::Span;
pub use smol_str::SmolStr;

use std::fmt;

/// A spanned value - wraps any value with source location info
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }

    pub fn dummy(node: T) -> Self {
        Self {
            node,
            span: Span::dummy(),
        }
    }
}

/// Identifier (field names, parameter names, method names)
pub type Ident = Spanned<SmolStr>;

// ============================================================================
// Compilation Units
// ============================================================================

/// One parsed `.java` (or specification) file
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationUnit {
    /// Declared package, empty for the default package
    pub package: SmolStr,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<ClassDecl>,
}

impl CompilationUnit {
    /// Find a top-level type by simple name
    pub fn find_type(&self, simple_name: &str) -> Option<&ClassDecl> {
        self.types.iter().find(|t| t.name.node == simple_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    /// Dotted path without the trailing `.*`
    pub path: SmolStr,
    pub is_static: bool,
    pub on_demand: bool,
    pub span: Span,
}

impl ImportDecl {
    /// Last segment of a single-type import
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
    Enum,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub kind: ClassKind,
    pub name: Ident,
    /// Superclass as written (classes only)
    pub extends: Option<TypeRef>,
    /// Implemented interfaces for classes, extended interfaces for interfaces
    pub implements: Vec<TypeRef>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    /// Class-level `invariant` and `constraint` clauses
    pub contracts: Vec<Contract>,
    pub span: Span,
}

impl ClassDecl {
    /// All methods (or constructors, for `<init>`) with the given name, in
    /// declaration order
    pub fn methods_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a MethodDecl> + 'a {
        let constructors = name == CONSTRUCTOR_NAME;
        let name = SmolStr::new(name);
        self.methods.iter().filter(move |m| {
            if constructors {
                m.is_constructor()
            } else {
                !m.is_constructor() && m.name.node == name
            }
        })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.fields.iter().map(|f| &f.name.node)
    }

    pub fn invariants(&self) -> impl Iterator<Item = &ContractClause> {
        self.contracts.iter().filter_map(|c| match c {
            Contract::Invariant(clause) => Some(clause),
            _ => None,
        })
    }

    pub fn constraints(&self) -> impl Iterator<Item = &ContractClause> {
        self.contracts.iter().filter_map(|c| match c {
            Contract::Constraint(clause) => Some(clause),
            _ => None,
        })
    }
}

/// Name under which constructors are looked up
pub const CONSTRUCTOR_NAME: &str = "<init>";

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: Ident,
    pub ty: TypeRef,
    pub is_static: bool,
    pub initializer: Option<Expr>,
    pub span: Span,
}

impl FieldDecl {
    pub fn is_primitive(&self) -> bool {
        self.ty.is_primitive()
    }

    /// True when the field is initialized at its declaration with anything
    /// other than the literal `null`
    pub fn has_non_null_initializer(&self) -> bool {
        self.initializer
            .as_ref()
            .is_some_and(|init| !init.is_null_literal())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Method,
    Constructor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub ty: TypeRef,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub kind: MethodKind,
    pub name: Ident,
    pub return_type: Option<TypeRef>,
    pub params: Vec<Param>,
    /// `None` for abstract, interface and specification-only declarations
    pub body: Option<Block>,
    pub contract: Option<MethodContract>,
    /// Declaration text from the first modifier up to the body or `;`
    pub header: SmolStr,
    pub span: Span,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.kind == MethodKind::Constructor
    }

    pub fn param_names(&self) -> impl Iterator<Item = &SmolStr> {
        self.params.iter().map(|p| &p.name.node)
    }

    /// Requires clauses across every spec case
    pub fn requires_clauses(&self) -> impl Iterator<Item = &ContractClause> {
        self.clauses().filter_map(|c| match c {
            Contract::Requires(clause) => Some(clause),
            _ => None,
        })
    }

    /// Ensures clauses across every spec case
    pub fn ensures_clauses(&self) -> impl Iterator<Item = &ContractClause> {
        self.clauses().filter_map(|c| match c {
            Contract::Ensures(clause) => Some(clause),
            _ => None,
        })
    }

    fn clauses(&self) -> impl Iterator<Item = &Contract> {
        self.contract
            .iter()
            .flat_map(|contract| contract.cases.iter())
            .flat_map(|case| case.clauses.iter())
    }

    /// Header with whitespace collapsed and, for constructors, the class
    /// name rewritten to `<init>`
    pub fn normalized_header(&self) -> String {
        let header = normalize_whitespace(&self.header);
        if self.is_constructor() {
            rewrite_constructor_name(&header, &self.name.node)
        } else {
            header
        }
    }
}

/// Collapse runs of whitespace to one space and drop `/* ... */` comments,
/// so declaration text compares equal regardless of layout
pub fn normalize_whitespace(text: &str) -> String {
    let mut stripped = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("/*") {
        stripped.push_str(&rest[..start]);
        stripped.push(' ');
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    stripped.push_str(rest);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Replace the first `Name(` (optionally `Name (`) with `<init>(`
pub fn rewrite_constructor_name(text: &str, class_name: &str) -> String {
    let mut search_from = 0;
    while let Some(found) = text[search_from..].find(class_name) {
        let start = search_from + found;
        let end = start + class_name.len();
        let preceded_by_ident = text[..start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$');
        let followed_by_paren = text[end..].trim_start().starts_with('(');
        if !preceded_by_ident && followed_by_paren {
            return format!("{}{}{}", &text[..start], CONSTRUCTOR_NAME, &text[end..]);
        }
        search_from = end;
    }
    text.to_string()
}

// ============================================================================
// Contracts
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Contract {
    Requires(ContractClause),
    Ensures(ContractClause),
    Invariant(ContractClause),
    Constraint(ContractClause),
    /// Any other clause (`assignable`, `signals`, ...), kept by keyword only
    Other { keyword: SmolStr, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContractClause {
    pub condition: Box<Expr>,
    pub span: Span,
}

/// One `also`-separated specification case
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecCase {
    pub clauses: Vec<Contract>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodContract {
    pub cases: Vec<SpecCase>,
}

// ============================================================================
// Types
// ============================================================================

/// A type as written, with generic arguments dropped
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    /// Possibly qualified name, e.g. `int`, `String`, `java.util.List`
    pub name: SmolStr,
    /// Array dimensions
    pub dims: usize,
    pub span: Span,
}

const PRIMITIVE_TYPES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double",
];

impl TypeRef {
    pub fn new(name: impl Into<SmolStr>, dims: usize, span: Span) -> Self {
        Self {
            name: name.into(),
            dims,
            span,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.dims == 0 && PRIMITIVE_TYPES.contains(&self.name.as_str())
    }

    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn is_qualified(&self) -> bool {
        self.name.contains('.')
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for _ in 0..self.dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    LocalVar {
        ty: TypeRef,
        declarators: Vec<(Ident, Option<Expr>)>,
    },
    Return(Option<Expr>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        condition: Expr,
    },
    For {
        body: Box<Stmt>,
    },
    Block(Block),
    Throw(Expr),
    Empty,
    /// `try`, `switch`, `synchronized`, labels, `break`, ... kept by keyword
    Other(SmolStr),
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_null_literal(&self) -> bool {
        matches!(self.kind, ExprKind::Null)
    }

    /// Dotted text of a simple access path: `a`, `this.a`, `a.b.c`.
    /// `None` for anything that is not a plain path.
    pub fn path_text(&self) -> Option<String> {
        match &self.kind {
            ExprKind::Ident(name) => Some(name.to_string()),
            ExprKind::This => Some("this".to_string()),
            ExprKind::Field { object, field } => {
                let base = object.path_text()?;
                Some(format!("{}.{}", base, field.node))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // Literals
    Integer(SmolStr),
    Float(SmolStr),
    String(SmolStr),
    Char(SmolStr),
    Bool(bool),
    Null,

    // Names
    Ident(SmolStr),
    This,
    Super,

    // Access
    Field {
        object: Box<Expr>,
        field: Ident,
    },
    MethodCall {
        object: Option<Box<Expr>>,
        method: Ident,
        args: Vec<Expr>,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    New {
        ty: TypeRef,
        args: Vec<Expr>,
    },

    // Operators
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    CompoundAssign {
        op: BinaryOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Ternary {
        condition: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Cast {
        ty: TypeRef,
        expr: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        ty: TypeRef,
    },

    // Grouping
    Paren(Box<Expr>),

    // JML
    /// Backslash keyword used as a value: `\result`, `\nothing`, ...
    Singleton(SmolStr),
    Old(Box<Expr>),
    Quantified {
        quantifier: SmolStr,
        range: Option<Box<Expr>>,
        body: Box<Expr>,
    },

    /// Lambdas, method references and array initializers
    Opaque(SmolStr),

    // Error placeholder
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    BitNot,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    /// Increment and decrement, which write to their operand
    pub fn is_update(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Logical
    And,
    Or,
    // JML logical
    Implies,
    RevImplies,
    Equiv,
    NotEquiv,
    // Equality and relational
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    UShr,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Implies => "==>",
            BinaryOp::RevImplies => "<==",
            BinaryOp::Equiv => "<==>",
            BinaryOp::NotEquiv => "<=!=>",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::UShr => ">>>",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}
