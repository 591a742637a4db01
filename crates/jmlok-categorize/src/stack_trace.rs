//! Stack trace reconstruction
//!
//! Turns the `at pkg.Class.method(File.java:12)` lines of a diagnostic into
//! the chain of methods of the analyzed tree that led to the violation.

use crate::nonconformance::Nonconformance;
use jmlok_ast::CONSTRUCTOR_NAME;
use rustc_hash::FxHashSet;

/// Constructor marker as it appears in HTML-escaped reports
const ESCAPED_CONSTRUCTOR_NAME: &str = "&lt;init&gt;";

/// Every `pkg.Class.method` declared in the analyzed tree. Constructors
/// appear as `pkg.Class.<init>`.
#[derive(Debug, Clone, Default)]
pub struct MethodRegistry {
    names: FxHashSet<String>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<String> for MethodRegistry {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// Ordered frames from the violated method up to the test method.
///
/// The first entry is always the violated method. The first diagnostic line
/// (the message itself) is skipped; later lines without the `at ...(` shape
/// are ignored, and so are frames not declared in the analyzed tree. The
/// walk ends at the frame of the test method.
pub fn stack_trace_order(record: &Nonconformance, registry: &MethodRegistry) -> Vec<String> {
    let mut order = vec![record.qualified_method()];
    let test_frame = format!("{}.{}", test_class(&record.test_file), record.test_name);

    for line in record.raw_diagnostic.lines().skip(1) {
        let Some(frame) = frame_of(line) else {
            continue;
        };

        if frame == test_frame {
            order.push(test_frame);
            break;
        }
        let frame = frame.replace(ESCAPED_CONSTRUCTOR_NAME, CONSTRUCTOR_NAME);
        if !registry.contains(&frame) {
            continue;
        }
        match rewrite_constructor_frame(&frame) {
            Some(rewritten) => order.push(rewritten),
            None => order.push(frame),
        }
    }

    order
}

/// Text between `at ` and the following `(`
fn frame_of(line: &str) -> Option<&str> {
    let start = line.find("at ")? + 3;
    let end = start + line[start..].find('(')?;
    Some(&line[start..end])
}

/// `a.b.Account.<init>` becomes `a.b.Account.Account`
fn rewrite_constructor_frame(frame: &str) -> Option<String> {
    let owner = frame.strip_suffix(CONSTRUCTOR_NAME)?.strip_suffix('.')?;
    let class = owner.rsplit('.').next().unwrap_or(owner);
    Some(format!("{}.{}", owner, class))
}

/// Test file name without its `.java` extension
fn test_class(test_file: &str) -> &str {
    match test_file.find(".java") {
        Some(end) => &test_file[..end],
        None => test_file,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonconformance::Category;
    use pretty_assertions::assert_eq;

    fn registry() -> MethodRegistry {
        ["bank.Account.withdraw", "bank.Account.<init>", "bank.Teller.serve"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    fn record(diagnostic: &str) -> Nonconformance {
        Nonconformance::new(Category::Postcondition, "bank", "Account", "withdraw")
            .with_test("test12", "AccountTest0.java")
            .with_diagnostic(diagnostic)
    }

    #[test]
    fn test_frame_of() {
        assert_eq!(frame_of("\tat bank.Account.withdraw(Account.java:12)"), Some("bank.Account.withdraw"));
        assert_eq!(frame_of("JMLInternalNormalPostconditionError: by method"), None);
        assert_eq!(frame_of("at nothing here"), None);
    }

    #[test]
    fn test_order_stops_at_test_method() {
        let diagnostic = "\
postcondition violated at bank.Account.withdraw(Account.java:12)
\tat bank.Account.withdraw(Account.java:12)
\tat java.util.ArrayList.forEach(ArrayList.java:1257)
\tat bank.Teller.serve(Teller.java:30)
\tat AccountTest0.test12(AccountTest0.java:88)
\tat bank.Teller.serve(Teller.java:31)";

        assert_eq!(
            stack_trace_order(&record(diagnostic), &registry()),
            vec![
                "bank.Account.withdraw",
                "bank.Account.withdraw",
                "bank.Teller.serve",
                "AccountTest0.test12",
            ]
        );
    }

    #[test]
    fn test_constructor_frames() {
        let diagnostic = "\
invariant violated
\tat bank.Account.<init>(Account.java:8)
\tat bank.Account.&lt;init&gt;(Account.java:8)
\tat bank.Vault.<init>(Vault.java:3)
\tat <init>(Unknown Source)";

        assert_eq!(
            stack_trace_order(&record(diagnostic), &registry()),
            vec!["bank.Account.withdraw", "bank.Account.Account", "bank.Account.Account"]
        );
    }

    #[test]
    fn test_foreign_constructors_are_dropped() {
        let diagnostic = "\
postcondition violated
\tat java.util.ArrayList.<init>(ArrayList.java:152)
\tat org.jmlspecs.jmlrac.runtime.Checker.&lt;init&gt;(Checker.java:40)
\tat bank.Account.withdraw(Account.java:12)
\tat AccountTest0.test12(AccountTest0.java:88)";

        let registry: MethodRegistry = ["bank.Account.withdraw".to_string()].into_iter().collect();
        assert_eq!(
            stack_trace_order(&record(diagnostic), &registry),
            vec!["bank.Account.withdraw", "bank.Account.withdraw", "AccountTest0.test12"]
        );
    }

    #[test]
    fn test_empty_diagnostic() {
        assert_eq!(
            stack_trace_order(&record(""), &MethodRegistry::new()),
            vec!["bank.Account.withdraw"]
        );
    }

    #[test]
    fn test_test_class() {
        assert_eq!(test_class("AccountTest0.java"), "AccountTest0");
        assert_eq!(test_class("AccountTest0"), "AccountTest0");
    }
}
