//! Syntactic scans over contract clauses, method bodies and field
//! declarations.

use indexmap::IndexSet;
use jmlok_ast::{Block, ContractClause, Expr, ExprKind, FieldDecl, StmtKind};
use smol_str::SmolStr;

/// Does the clause name one of `params` or `fields`?
///
/// Only `&&`/`||`-style binary trees and parentheses are descended into.
/// A parameter counts as a bare identifier; a field either bare or as
/// `this.field`.
pub fn clause_mentions(
    clause: &ContractClause,
    params: &IndexSet<SmolStr>,
    fields: &IndexSet<SmolStr>,
) -> bool {
    mentions(&clause.condition, params, fields)
}

fn mentions(expr: &Expr, params: &IndexSet<SmolStr>, fields: &IndexSet<SmolStr>) -> bool {
    match &expr.kind {
        ExprKind::Ident(name) => params.contains(name) || fields.contains(name),
        ExprKind::Field { .. } => expr
            .path_text()
            .and_then(|path| path.strip_prefix("this.").map(|f| fields.contains(f)))
            .unwrap_or(false),
        ExprKind::Paren(inner) => mentions(inner, params, fields),
        ExprKind::Binary { left, right, .. } => {
            mentions(left, params, fields) || mentions(right, params, fields)
        }
        _ => false,
    }
}

/// Does a top-level statement of `body` write to a parameter or field, or
/// call a method?
///
/// Recognized writes are `x = ...`, `x += ...` and `x++`-style updates where
/// `x` is a parameter, a field, or `this.field`. Any expression statement
/// that is a bare method call counts as well. A missing body never does.
pub fn body_has_attribution_or_call(
    params: &IndexSet<SmolStr>,
    fields: &IndexSet<SmolStr>,
    body: Option<&Block>,
) -> bool {
    let Some(body) = body else {
        return false;
    };

    body.stmts.iter().any(|stmt| match &stmt.kind {
        StmtKind::Expr(expr) => match &expr.kind {
            ExprKind::Assign { target, .. } | ExprKind::CompoundAssign { target, .. } => {
                is_tracked_target(target, params, fields)
            }
            ExprKind::Unary { op, operand } if op.is_update() => {
                is_tracked_target(operand, params, fields)
            }
            ExprKind::MethodCall { .. } => true,
            _ => false,
        },
        _ => false,
    })
}

fn is_tracked_target(target: &Expr, params: &IndexSet<SmolStr>, fields: &IndexSet<SmolStr>) -> bool {
    let Some(path) = target.path_text() else {
        return false;
    };
    match path.strip_prefix("this.") {
        Some(field) => fields.contains(field),
        None => params.contains(path.as_str()) || fields.contains(path.as_str()),
    }
}

/// Remove from `unresolved` every field that can never be null: primitives
/// and fields initialized at their declaration with something other than
/// `null`.
pub fn discharge_field_declarations(unresolved: &mut IndexSet<SmolStr>, fields: &[FieldDecl]) {
    for field in fields {
        if field.is_primitive() || field.has_non_null_initializer() {
            unresolved.shift_remove(&field.name.node);
        }
    }
}

/// Remove every field the constructor body assigns a non-null value at top
/// level. Returns whether nothing is left unresolved.
pub fn discharge_constructor(unresolved: &mut IndexSet<SmolStr>, body: Option<&Block>) -> bool {
    if let Some(body) = body {
        for stmt in &body.stmts {
            let StmtKind::Expr(expr) = &stmt.kind else {
                continue;
            };
            let ExprKind::Assign { target, value } = &expr.kind else {
                continue;
            };
            if value.is_null_literal() {
                continue;
            }
            if let Some(path) = target.path_text() {
                let name = path.strip_prefix("this.").unwrap_or(&path);
                unresolved.shift_remove(name);
            }
        }
    }
    unresolved.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmlok_ast::{ClassDecl, MethodDecl};
    use pretty_assertions::assert_eq;

    fn class(source: &str) -> ClassDecl {
        let (unit, errors) = jmlok_parser::parse(source);
        assert!(errors.is_empty(), "Errors: {:?}", errors);
        unit.types.into_iter().next().unwrap()
    }

    fn method<'a>(class: &'a ClassDecl, name: &str) -> &'a MethodDecl {
        class.methods.iter().find(|m| m.name.node == name).unwrap()
    }

    fn set(names: &[&str]) -> IndexSet<SmolStr> {
        names.iter().map(|n| SmolStr::new(n)).collect()
    }

    #[test]
    fn test_clause_mentions() {
        let class = class(
            r#"class T {
                //@ requires amount > 0 && (this.limit > 1 || true);
                //@ requires other.limit > 0;
                //@ requires check(amount);
                void m(int amount) {}
            }"#,
        );
        let clauses: Vec<_> = method(&class, "m").requires_clauses().collect();
        let params = set(&["amount"]);
        let fields = set(&["limit"]);

        assert!(clause_mentions(clauses[0], &params, &fields));
        assert!(clause_mentions(clauses[0], &set(&[]), &fields));
        assert!(!clause_mentions(clauses[0], &set(&[]), &set(&[])));
        // Only `this.` qualifies a field
        assert!(!clause_mentions(clauses[1], &set(&[]), &fields));
        // Call arguments are not descended into
        assert!(!clause_mentions(clauses[2], &params, &fields));
    }

    #[test]
    fn test_attribution_to_parameter_or_field() {
        let class = class(
            r#"class T {
                int total;
                void assignParam(int x) { x = 3; }
                void assignField() { this.total += 1; }
                void increment() { total++; }
                void local() { int y = 0; y = 2; }
                void nested(int x) { if (x > 0) { x = 1; } }
                void call() { helper(); }
                void abstractLike();
            }"#,
        );
        let fields = set(&["total"]);
        let scan = |name: &str| {
            let m = method(&class, name);
            let params: IndexSet<SmolStr> = m.param_names().cloned().collect();
            body_has_attribution_or_call(&params, &fields, m.body.as_ref())
        };

        assert!(scan("assignParam"));
        assert!(scan("assignField"));
        assert!(scan("increment"));
        assert!(scan("call"));
        assert!(!scan("local"));
        assert!(!scan("nested"));
        assert!(!scan("abstractLike"));
    }

    #[test]
    fn test_discharge_field_declarations() {
        let class = class(
            r#"class T {
                int count;
                String name = "x";
                Object empty = null;
                Object pending;
            }"#,
        );
        let mut unresolved = set(&["count", "name", "empty", "pending"]);
        discharge_field_declarations(&mut unresolved, &class.fields);
        assert_eq!(unresolved, set(&["empty", "pending"]));
    }

    #[test]
    fn test_discharge_constructor() {
        let class = class(
            r#"class T {
                Object a; Object b; Object c;
                T(Object b) {
                    this.a = new Object();
                    b = null;
                    this.b = b;
                }
            }"#,
        );
        let ctor = class.methods.iter().find(|m| m.is_constructor()).unwrap();

        let mut unresolved = set(&["a", "b", "c"]);
        assert!(!discharge_constructor(&mut unresolved, ctor.body.as_ref()));
        assert_eq!(unresolved, set(&["c"]));

        let mut unresolved = set(&["a", "b"]);
        assert!(discharge_constructor(&mut unresolved, ctor.body.as_ref()));

        let mut unresolved = set(&["a"]);
        assert!(!discharge_constructor(&mut unresolved, None));
        assert!(discharge_constructor(&mut set(&[]), None));
    }
}
