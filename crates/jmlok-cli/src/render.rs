use ariadne::{Color, Label, Report, ReportKind, Source};
use jmlok_ast::{normalize_whitespace, ClassKind, CompilationUnit};
use jmlok_parser::ParseError;
use std::fmt::Write;

/// Print a parse error with the offending source excerpt to stderr
pub fn report_parse_error(filename: &str, source: &str, error: &ParseError) -> std::io::Result<()> {
    let span = error.span();
    let end = span.end.max(span.start + 1).min(source.len().max(1));
    let start = span.start.min(end.saturating_sub(1));

    Report::build(ReportKind::Error, filename, start)
        .with_code(error.code())
        .with_message(headline(error))
        .with_label(
            Label::new((filename, start..end))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)))
}

fn headline(error: &ParseError) -> &'static str {
    match error {
        ParseError::UnexpectedToken { .. } => "unexpected token",
        ParseError::UnexpectedEof { .. } => "unexpected end of file",
        ParseError::InvalidExpression { .. } => "invalid expression",
        ParseError::InvalidType { .. } => "invalid type",
        ParseError::Unclosed { .. } => "unclosed delimiter",
        ParseError::Lexer { .. } => "invalid token",
    }
}

/// Outline of the types of `unit` and the contracts attached to them
pub fn class_summary(unit: &CompilationUnit) -> String {
    let mut out = String::new();
    if !unit.package.is_empty() {
        let _ = writeln!(out, "package {}", unit.package);
    }

    for class in &unit.types {
        let kind = match class.kind {
            ClassKind::Class => "class",
            ClassKind::Interface => "interface",
            ClassKind::Enum => "enum",
        };
        let _ = write!(out, "{} {}", kind, class.name.node);
        if let Some(superclass) = &class.extends {
            let _ = write!(out, " extends {}", superclass);
        }
        if !class.implements.is_empty() {
            let names: Vec<String> = class.implements.iter().map(|t| t.to_string()).collect();
            let _ = write!(out, " implements {}", names.join(", "));
        }
        out.push('\n');

        for field in &class.fields {
            let _ = writeln!(out, "  field {} {}", field.ty, field.name.node);
        }
        for method in &class.methods {
            let _ = writeln!(
                out,
                "  method {} [requires {}, ensures {}]",
                normalize_whitespace(&method.header),
                method.requires_clauses().count(),
                method.ensures_clauses().count()
            );
        }
        let _ = writeln!(
            out,
            "  invariants {}, constraints {}",
            class.invariants().count(),
            class.constraints().count()
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_class_summary() {
        let source = "package bank;

public class Account extends Base implements Comparable, java.io.Serializable {
    private int balance;
    private String[] owners;

    //@ public invariant balance >= 0;

    public Account() { balance = 0; }

    //@ requires amount > 0;
    //@ ensures balance == \\old(balance) - amount;
    public void withdraw(int amount) { balance -= amount; }
}
";
        let (unit, errors) = jmlok_parser::parse(source);
        assert!(errors.is_empty(), "{:?}", errors);

        insta::assert_snapshot!(class_summary(&unit), @r###"
        package bank
        class Account extends Base implements Comparable, java.io.Serializable
          field int balance
          field String[] owners
          method public Account() [requires 0, ensures 0]
          method public void withdraw(int amount) [requires 1, ensures 1]
          invariants 1, constraints 0
        "###);
    }

    #[test]
    fn test_summary_without_package() {
        let (unit, _) = jmlok_parser::parse("interface Shape { double area(); }");
        assert_eq!(
            class_summary(&unit),
            "interface Shape\n  method double area() [requires 0, ensures 0]\n  invariants 0, constraints 0\n"
        );
    }

    #[test]
    fn test_headlines_cover_every_error() {
        let error = ParseError::Unclosed {
            opener: "{".to_string(),
            span: jmlok_ast::Span::new(3, 4),
        };
        assert_eq!(headline(&error), "unclosed delimiter");
        assert_eq!(error.code(), "P005");
    }
}
