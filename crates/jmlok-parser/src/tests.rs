use super::*;
use pretty_assertions::assert_eq;

const ACCOUNT: &str = r#"package bank;

import java.util.List;
import bank.audit.*;

public class Account extends Base implements Auditable {
    //@ public invariant balance >= 0;
    /*@ spec_public @*/ private int balance;
    private String owner = null;
    private List<String> log = new ArrayList<>();

    public Account(int initial) {
        balance = initial;
    }

    //@ requires amount > 0;
    //@ ensures balance == \old(balance) - amount;
    public void withdraw(int amount) {
        if (amount > balance) {
            throw new IllegalArgumentException("too much");
        }
        balance = balance - amount;
    }

    public /*@ pure @*/ int getBalance() {
        return balance;
    }
}
"#;

fn parse_ok(source: &str) -> CompilationUnit {
    let (unit, errors) = parse(source);
    assert!(errors.is_empty(), "Errors: {:?}", errors);
    unit
}

fn expr(source: &str) -> Expr {
    let mut parser = Parser::new(source);
    let expr = parser.parse_expression();
    assert!(parser.errors().is_empty(), "Errors: {:?}", parser.errors());
    expr.unwrap()
}

fn binary_op(expr: &Expr) -> Option<BinaryOp> {
    match &expr.kind {
        ExprKind::Binary { op, .. } => Some(*op),
        _ => None,
    }
}

#[test]
fn test_parse_account_header() {
    let unit = parse_ok(ACCOUNT);
    assert_eq!(unit.package, "bank");
    assert_eq!(unit.imports.len(), 2);
    assert_eq!(unit.imports[0].simple_name(), "List");
    assert!(!unit.imports[0].on_demand);
    assert_eq!(unit.imports[1].path, "bank.audit");
    assert!(unit.imports[1].on_demand);

    let class = unit.find_type("Account").unwrap();
    assert_eq!(class.kind, ClassKind::Class);
    assert_eq!(class.extends.as_ref().map(|t| t.name.as_str()), Some("Base"));
    assert_eq!(class.implements.len(), 1);
    assert_eq!(class.implements[0].name, "Auditable");
}

#[test]
fn test_parse_fields() {
    let unit = parse_ok(ACCOUNT);
    let class = unit.find_type("Account").unwrap();

    let names: Vec<&str> = class.field_names().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["balance", "owner", "log"]);

    assert!(class.fields[0].is_primitive());
    assert!(class.fields[1].initializer.as_ref().unwrap().is_null_literal());
    assert!(!class.fields[1].has_non_null_initializer());
    assert!(class.fields[2].has_non_null_initializer());
    assert_eq!(class.fields[2].ty.name, "List");
}

#[test]
fn test_parse_contracts() {
    let unit = parse_ok(ACCOUNT);
    let class = unit.find_type("Account").unwrap();

    assert_eq!(class.invariants().count(), 1);
    let withdraw = class.methods_named("withdraw").next().unwrap();
    let requires: Vec<_> = withdraw.requires_clauses().collect();
    assert_eq!(requires.len(), 1);
    assert_eq!(binary_op(&requires[0].condition), Some(BinaryOp::Gt));
    assert_eq!(
        &ACCOUNT[requires[0].span.start..requires[0].span.end],
        "requires amount > 0;"
    );

    let ensures: Vec<_> = withdraw.ensures_clauses().collect();
    assert_eq!(ensures.len(), 1);
    match &ensures[0].condition.kind {
        ExprKind::Binary { op: BinaryOp::Eq, right, .. } => match &right.kind {
            ExprKind::Binary { op: BinaryOp::Sub, left, .. } => {
                assert!(matches!(left.kind, ExprKind::Old(_)));
            }
            other => panic!("Expected subtraction, got {:?}", other),
        },
        other => panic!("Expected equality, got {:?}", other),
    }

    // Clauses attach to the next method only
    let ctor = class.methods_named(CONSTRUCTOR_NAME).next().unwrap();
    assert!(ctor.contract.is_none());
    let get = class.methods_named("getBalance").next().unwrap();
    assert!(get.contract.is_none());
}

#[test]
fn test_method_headers() {
    let unit = parse_ok(ACCOUNT);
    let class = unit.find_type("Account").unwrap();
    let headers: Vec<String> = class.methods.iter().map(|m| m.normalized_header()).collect();

    insta::assert_snapshot!(headers.join("\n"), @r###"
    public <init>(int initial)
    public void withdraw(int amount)
    public int getBalance()
    "###);
}

#[test]
fn test_method_bodies() {
    let unit = parse_ok(ACCOUNT);
    let class = unit.find_type("Account").unwrap();

    let withdraw = class.methods_named("withdraw").next().unwrap();
    let body = withdraw.body.as_ref().unwrap();
    assert_eq!(body.stmts.len(), 2);
    assert!(matches!(body.stmts[0].kind, StmtKind::If { .. }));
    match &body.stmts[1].kind {
        StmtKind::Expr(Expr {
            kind: ExprKind::Assign { target, .. },
            ..
        }) => assert_eq!(target.path_text().as_deref(), Some("balance")),
        other => panic!("Expected assignment, got {:?}", other),
    }

    let get = class.methods_named("getBalance").next().unwrap();
    let body = get.body.as_ref().unwrap();
    assert!(matches!(body.stmts[0].kind, StmtKind::Return(Some(_))));
}

#[test]
fn test_spec_cases() {
    let source = r#"class Calc {
    /*@ requires x > 0;
      @ ensures \result > 0;
      @ also
      @ requires x < 0;
      @ ensures \result < 0;
      @*/
    int sign(int x) { return x; }
}"#;
    let unit = parse_ok(source);
    let method = &unit.types[0].methods[0];
    let contract = method.contract.as_ref().unwrap();
    assert_eq!(contract.cases.len(), 2);
    assert_eq!(method.requires_clauses().count(), 2);
    assert_eq!(method.ensures_clauses().count(), 2);
}

#[test]
fn test_behavior_keywords_and_other_clauses() {
    let source = r#"class Stack {
    /*@ public normal_behavior
      @   requires !isEmpty();
      @   assignable size;
      @   ensures size == \old(size) - 1;
      @*/
    public Object pop() { return null; }
}"#;
    let unit = parse_ok(source);
    let method = &unit.types[0].methods[0];
    let contract = method.contract.as_ref().unwrap();
    assert_eq!(contract.cases.len(), 1);
    assert_eq!(contract.cases[0].clauses.len(), 3);
    assert!(matches!(
        &contract.cases[0].clauses[1],
        Contract::Other { keyword, .. } if keyword == "assignable"
    ));
}

#[test]
fn test_interface_and_spec_declarations() {
    let source = r#"package shapes;
public interface Shape extends Named, Comparable<Shape> {
    //@ requires scale > 0;
    void resize(int scale);
}"#;
    let unit = parse_ok(source);
    let shape = unit.find_type("Shape").unwrap();
    assert_eq!(shape.kind, ClassKind::Interface);
    assert!(shape.extends.is_none());
    assert_eq!(shape.implements.len(), 2);

    let resize = &shape.methods[0];
    assert!(resize.body.is_none());
    assert_eq!(resize.requires_clauses().count(), 1);
    assert_eq!(resize.normalized_header(), "void resize(int scale)");
}

#[test]
fn test_constraint_clause() {
    let source = r#"class Counter {
    int count;
    //@ constraint count >= \old(count);
    //@ invariant count >= 0;
}"#;
    let unit = parse_ok(source);
    let class = &unit.types[0];
    assert_eq!(class.constraints().count(), 1);
    assert_eq!(class.invariants().count(), 1);
}

#[test]
fn test_nested_types_and_initializers_skipped() {
    let source = r#"class Outer {
    static { System.out.println("init"); }
    class Inner { int hidden; void m() {} }
    enum Mode { ON, OFF; int x; }
    int visible;
    void run() {
        Runnable r = () -> { visible++; };
        for (int i = 0; i < 10; i++) { visible += i; }
        try { run(); } catch (Exception e) { } finally { }
    }
}"#;
    let unit = parse_ok(source);
    let outer = &unit.types[0];
    let names: Vec<&str> = outer.field_names().map(|n| n.as_str()).collect();
    assert_eq!(names, vec!["visible"]);
    assert_eq!(outer.methods.len(), 1);

    let body = outer.methods[0].body.as_ref().unwrap();
    assert_eq!(body.stmts.len(), 3);
    assert!(matches!(body.stmts[0].kind, StmtKind::LocalVar { .. }));
    assert!(matches!(body.stmts[1].kind, StmtKind::For { .. }));
    assert!(matches!(&body.stmts[2].kind, StmtKind::Other(k) if k == "try"));
}

#[test]
fn test_enum_members() {
    let source = r#"enum Color {
    RED("r"), GREEN("g") { },
    BLUE("b");
    private final String code;
    Color(String code) { this.code = code; }
}"#;
    let unit = parse_ok(source);
    let color = &unit.types[0];
    assert_eq!(color.kind, ClassKind::Enum);
    assert_eq!(color.fields.len(), 1);
    assert!(color.methods[0].is_constructor());
}

#[test]
fn test_local_variables() {
    let source = r#"class T {
    void m(int[] xs) {
        int a = 1, b;
        String[] names = { "x" };
        a = b = 2;
        xs[0] = a;
        java.util.List<String> l = null;
    }
}"#;
    let unit = parse_ok(source);
    let body = unit.types[0].methods[0].body.as_ref().unwrap();
    match &body.stmts[0].kind {
        StmtKind::LocalVar { ty, declarators } => {
            assert_eq!(ty.name, "int");
            assert_eq!(declarators.len(), 2);
            assert!(declarators[1].1.is_none());
        }
        other => panic!("Expected local variable, got {:?}", other),
    }
    assert!(matches!(body.stmts[1].kind, StmtKind::LocalVar { .. }));
    assert!(matches!(body.stmts[2].kind, StmtKind::Expr(_)));
    assert!(matches!(body.stmts[3].kind, StmtKind::Expr(_)));
    assert!(matches!(body.stmts[4].kind, StmtKind::LocalVar { .. }));
}

#[test]
fn test_expression_precedence() {
    let e = expr("a ==> b || c && d");
    assert_eq!(binary_op(&e), Some(BinaryOp::Implies));
    if let ExprKind::Binary { right, .. } = &e.kind {
        assert_eq!(binary_op(right), Some(BinaryOp::Or));
    }

    let e = expr("a + b * c == d");
    assert_eq!(binary_op(&e), Some(BinaryOp::Eq));

    let e = expr("a <==> b ==> c");
    assert_eq!(binary_op(&e), Some(BinaryOp::Equiv));

    // Right-associative implication
    let e = expr("a ==> b ==> c");
    if let ExprKind::Binary { left, right, .. } = &e.kind {
        assert!(matches!(left.kind, ExprKind::Ident(_)));
        assert_eq!(binary_op(right), Some(BinaryOp::Implies));
    }
}

#[test]
fn test_casts_and_parens() {
    assert!(matches!(expr("(int) x").kind, ExprKind::Cast { .. }));
    assert!(matches!(expr("(int) -x").kind, ExprKind::Cast { .. }));
    assert!(matches!(expr("(String) o.name").kind, ExprKind::Cast { .. }));
    assert_eq!(binary_op(&expr("(x) + 1")), Some(BinaryOp::Add));
    assert!(matches!(expr("(a < b)").kind, ExprKind::Paren(_)));
}

#[test]
fn test_jml_expressions() {
    assert!(matches!(expr("\\result").kind, ExprKind::Singleton(ref s) if s == "\\result"));
    assert!(matches!(expr("\\old(balance)").kind, ExprKind::Old(_)));
    assert!(matches!(expr("\\fresh(x)").kind, ExprKind::Opaque(_)));

    match expr("(\\forall int i; 0 <= i && i < n; a[i] > 0)").kind {
        ExprKind::Quantified {
            quantifier, range, ..
        } => {
            assert_eq!(quantifier, "\\forall");
            assert!(range.is_some());
        }
        other => panic!("Expected quantifier, got {:?}", other),
    }

    match expr("(\\exists int i; a[i] == 0)").kind {
        ExprKind::Quantified { range, .. } => assert!(range.is_none()),
        other => panic!("Expected quantifier, got {:?}", other),
    }
}

#[test]
fn test_postfix_expressions() {
    let e = expr("this.owner.name.length()");
    match &e.kind {
        ExprKind::MethodCall { object, method, .. } => {
            assert_eq!(method.node, "length");
            assert_eq!(
                object.as_ref().and_then(|o| o.path_text()).as_deref(),
                Some("this.owner.name")
            );
        }
        other => panic!("Expected call, got {:?}", other),
    }

    assert!(matches!(expr("x instanceof String").kind, ExprKind::InstanceOf { .. }));
    assert!(matches!(expr("c ? 1 : 2").kind, ExprKind::Ternary { .. }));
    assert!(matches!(expr("String.class").kind, ExprKind::Opaque(_)));
    assert!(matches!(expr("list.stream().map(Foo::bar)").kind, ExprKind::MethodCall { .. }));
    assert!(matches!(expr("new int[3]").kind, ExprKind::New { ref ty, .. } if ty.dims == 1));
}

#[test]
fn test_error_recovery() {
    let source = r#"class Broken {
    int x = ;
    //@ requires y > 0;
    void ok(int y) { }
}"#;
    let (unit, errors) = parse(source);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].code(), "P003");

    let class = &unit.types[0];
    assert_eq!(class.methods.len(), 1);
    assert_eq!(class.methods[0].requires_clauses().count(), 1);
}

#[test]
fn test_statement_recovery() {
    let source = r#"class Broken {
    void m() {
        int a = ;
        a = 1;
    }
    void n() { }
}"#;
    let (unit, errors) = parse(source);
    assert!(!errors.is_empty());
    assert_eq!(unit.types[0].methods.len(), 2);
    let body = unit.types[0].methods[0].body.as_ref().unwrap();
    assert_eq!(body.stmts.len(), 1);
}

#[test]
fn test_lexer_errors_reported() {
    let (_, errors) = parse("class A { /* open");
    assert!(errors.iter().any(|e| e.code() == "L001"));
}
