//! Tri-state evaluation of contract expressions.
//!
//! Nothing is executed and no variable is looked up. Names, `null` and any
//! other non-literal leaf are free: a free leaf on its own reads as false,
//! and any comparison touching one is indeterminate. `&&` holds only when
//! both sides are definitely true; `||` when either side is. JML singletons
//! such as `\result` or `\nothing` count as true. Under these rules
//! `x > 0` is indeterminate and `true && x` is false.

use jmlok_ast::{BinaryOp, Expr, ExprKind};

/// Outcome of evaluating a boolean contract expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Truth {
    True,
    False,
    Indeterminate,
}

impl Truth {
    pub fn is_true(self) -> bool {
        self == Truth::True
    }
}

impl From<bool> for Truth {
    fn from(value: bool) -> Self {
        if value {
            Truth::True
        } else {
            Truth::False
        }
    }
}

/// Intermediate value of a subexpression
#[derive(Debug, Clone, Copy, PartialEq)]
enum Value {
    Int(i64),
    Bool(bool),
    /// Identifier, field access, `null`
    Free,
    Indeterminate,
}

impl Value {
    fn is_definitely_true(self) -> bool {
        self == Value::Bool(true)
    }
}

/// Evaluate a contract expression
pub fn evaluate(expr: &Expr) -> Truth {
    match value_of(expr) {
        Value::Bool(b) => Truth::from(b),
        Value::Free => Truth::False,
        Value::Int(_) | Value::Indeterminate => Truth::Indeterminate,
    }
}

/// Does the clause hold no matter what the free names stand for?
pub fn is_trivially_true(expr: &Expr) -> bool {
    evaluate(expr).is_true()
}

fn value_of(expr: &Expr) -> Value {
    match &expr.kind {
        ExprKind::Bool(b) => Value::Bool(*b),
        ExprKind::Integer(text) => parse_int(text).map_or(Value::Indeterminate, Value::Int),
        ExprKind::Singleton(_) => Value::Bool(true),
        ExprKind::Paren(inner) => value_of(inner),
        ExprKind::Ident(_) | ExprKind::This | ExprKind::Field { .. } | ExprKind::Null => Value::Free,
        ExprKind::Binary { op, left, right } => binary(*op, value_of(left), value_of(right)),
        _ => Value::Indeterminate,
    }
}

fn binary(op: BinaryOp, left: Value, right: Value) -> Value {
    match op {
        BinaryOp::And => Value::Bool(left.is_definitely_true() && right.is_definitely_true()),
        BinaryOp::Or => Value::Bool(left.is_definitely_true() || right.is_definitely_true()),
        BinaryOp::Eq | BinaryOp::NotEq => match (left, right) {
            (Value::Int(l), Value::Int(r)) => Value::Bool((l == r) == (op == BinaryOp::Eq)),
            (Value::Bool(l), Value::Bool(r)) => Value::Bool((l == r) == (op == BinaryOp::Eq)),
            _ => Value::Indeterminate,
        },
        BinaryOp::Lt | BinaryOp::Gt | BinaryOp::LtEq | BinaryOp::GtEq => match (left, right) {
            (Value::Int(l), Value::Int(r)) => Value::Bool(match op {
                BinaryOp::Lt => l < r,
                BinaryOp::Gt => l > r,
                BinaryOp::LtEq => l <= r,
                _ => l >= r,
            }),
            _ => Value::Indeterminate,
        },
        _ => Value::Indeterminate,
    }
}

/// Decimal, hex, octal or binary Java integer literal, with `_` separators
/// and an optional `L` suffix
fn parse_int(text: &str) -> Option<i64> {
    let digits: String = text
        .trim_end_matches(['l', 'L'])
        .chars()
        .filter(|c| *c != '_')
        .collect();

    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn expr(source: &str) -> Expr {
        // Wrap in a requires clause and take it back out
        let file = format!("class T {{ //@ requires {};\n void m() {{}} }}", source);
        let (unit, errors) = jmlok_parser::parse(&file);
        assert!(errors.is_empty(), "Errors: {:?}", errors);
        let method = &unit.types[0].methods[0];
        let clause = method.requires_clauses().next().unwrap();
        (*clause.condition).clone()
    }

    #[test]
    fn test_literals() {
        assert_eq!(evaluate(&expr("true")), Truth::True);
        assert_eq!(evaluate(&expr("false")), Truth::False);
        assert_eq!(evaluate(&expr("(true)")), Truth::True);
        assert_eq!(evaluate(&expr("\\result")), Truth::True);
        assert_eq!(evaluate(&expr("1")), Truth::Indeterminate);
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(evaluate(&expr("true && true")), Truth::True);
        assert_eq!(evaluate(&expr("true && false")), Truth::False);
        assert_eq!(evaluate(&expr("false || false")), Truth::False);
        assert_eq!(evaluate(&expr("false || true")), Truth::True);
        assert_eq!(evaluate(&expr("(false || true) && \\nothing")), Truth::True);
    }

    #[test]
    fn test_free_identifiers() {
        assert_eq!(evaluate(&expr("x")), Truth::False);
        assert_eq!(evaluate(&expr("this.balance")), Truth::False);
        assert_eq!(evaluate(&expr("x > 0")), Truth::Indeterminate);
        assert_eq!(evaluate(&expr("x != null")), Truth::Indeterminate);
        assert_eq!(evaluate(&expr("true && x")), Truth::False);
        assert_eq!(evaluate(&expr("x || true")), Truth::True);
        // An indeterminate side is never definitely true
        assert_eq!(evaluate(&expr("x > 0 && true")), Truth::False);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(evaluate(&expr("1 < 2")), Truth::True);
        assert_eq!(evaluate(&expr("2 <= 1")), Truth::False);
        assert_eq!(evaluate(&expr("0x10 == 16")), Truth::True);
        assert_eq!(evaluate(&expr("true == false")), Truth::False);
        assert_eq!(evaluate(&expr("true != false")), Truth::True);
        assert_eq!(evaluate(&expr("true < 1")), Truth::Indeterminate);
        assert_eq!(evaluate(&expr("(1 < 2) == true")), Truth::True);
    }

    #[test]
    fn test_unrecognized_is_indeterminate() {
        assert_eq!(evaluate(&expr("!false")), Truth::Indeterminate);
        assert_eq!(evaluate(&expr("size()")), Truth::Indeterminate);
        assert_eq!(evaluate(&expr("a ==> b")), Truth::Indeterminate);
    }

    #[test]
    fn test_trivially_true() {
        assert!(is_trivially_true(&expr("true")));
        assert!(is_trivially_true(&expr("true || amount > 0")));
        assert!(!is_trivially_true(&expr("amount > 0")));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("1_000L"), Some(1000));
        assert_eq!(parse_int("0xFF"), Some(255));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("017"), Some(15));
        assert_eq!(parse_int("0"), Some(0));
    }
}
