//! Clause examiner
//!
//! The three questions the classifier asks about a class: is the
//! precondition too strong, is the contract too weak, and can a field be
//! left null after construction.

use crate::hierarchy::{Check, HierarchyWalker};
use indexmap::IndexSet;
use jmlok_ast::CONSTRUCTOR_NAME;
use jmlok_source::{simple_name, SourceModelProvider};
use smol_str::SmolStr;
use tracing::debug;

/// Class and method signature a nonconformance points at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExaminationContext {
    /// Fully-qualified name of the principal class
    pub class_name: SmolStr,
    /// Declaration fragment used to pick among overloads
    pub signature_filter: String,
    /// Field names of the principal class
    pub fields: IndexSet<SmolStr>,
}

impl ExaminationContext {
    pub fn new(
        class_name: impl Into<SmolStr>,
        signature_filter: impl Into<String>,
        fields: IndexSet<SmolStr>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            signature_filter: signature_filter.into(),
            fields,
        }
    }

    pub fn simple_class_name(&self) -> &str {
        simple_name(&self.class_name)
    }

    /// A method named after the class is its constructor
    pub fn method_key<'m>(&self, method: &'m str) -> &'m str {
        if method == self.simple_class_name() {
            CONSTRUCTOR_NAME
        } else {
            method
        }
    }
}

/// Runs hierarchy walks against a source model provider
#[derive(Debug)]
pub struct Examiner<P: SourceModelProvider> {
    provider: P,
}

impl<P: SourceModelProvider> Examiner<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn into_provider(self) -> P {
        self.provider
    }

    /// Context for `class`, with the fields of the class resolved. An
    /// unresolvable class gets an empty field set.
    pub fn context(&mut self, class: &str, signature_filter: &str) -> ExaminationContext {
        let fields = match self.provider.resolve_class(class) {
            Some(model) => model.decl.field_names().cloned().collect(),
            None => {
                debug!(class, "principal class not resolvable");
                IndexSet::new()
            }
        };
        ExaminationContext::new(class, signature_filter, fields)
    }

    /// Does some requires clause of `method`, anywhere in the hierarchy,
    /// constrain a parameter or a field?
    pub fn check_strong_precondition(&mut self, context: &ExaminationContext, method: &str) -> bool {
        self.walk(context, context.method_key(method), Check::StrongPrecondition)
    }

    /// Trivial requires, a write or call in the body, or a trivial ensures.
    /// Checked in that order; the first hit wins.
    pub fn check_weak_precondition(&mut self, context: &ExaminationContext, method: &str) -> bool {
        let method = context.method_key(method);
        [Check::RequiresTrivial, Check::Attribution, Check::EnsuresTrivial]
            .into_iter()
            .any(|check| self.walk(context, method, check))
    }

    /// Can some non-primitive field still be null once construction is
    /// done? Walks the constructors of the class and its superclasses.
    ///
    /// The signature filter only applies when it names a constructor.
    /// An unresolvable principal class answers `false`.
    pub fn check_null(&mut self, context: &ExaminationContext) -> bool {
        if self.provider.resolve_class(&context.class_name).is_none() {
            debug!(class = %context.class_name, "null check skipped, class not resolvable");
            return false;
        }

        let filter = if context.signature_filter.contains(CONSTRUCTOR_NAME) {
            context.signature_filter.as_str()
        } else {
            ""
        };
        let safe = HierarchyWalker::new(&mut self.provider, context, Check::NullSafety)
            .with_filter(filter)
            .run(CONSTRUCTOR_NAME);
        !safe
    }

    fn walk(&mut self, context: &ExaminationContext, method: &str, check: Check) -> bool {
        let found = HierarchyWalker::new(&mut self.provider, context, check).run(method);
        debug!(class = %context.class_name, method, ?check, found, "hierarchy walk");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StubProvider;
    use pretty_assertions::assert_eq;

    const ACCOUNT: &str = r#"public class Account {
        private Integer balance;

        public Account() { balance = 0; }

        //@ requires amount > 0;
        public void withdraw(int amount) {
            balance = balance - amount;
        }
    }"#;

    #[test]
    fn test_context_resolves_fields() {
        let mut examiner = Examiner::new(StubProvider::new().with_class("Account", ACCOUNT));
        let context = examiner.context("Account", "public void withdraw(int amount)");
        assert_eq!(context.fields.iter().map(|f| f.as_str()).collect::<Vec<_>>(), vec!["balance"]);
        assert_eq!(context.method_key("Account"), CONSTRUCTOR_NAME);
        assert_eq!(context.method_key("withdraw"), "withdraw");

        let missing = examiner.context("Missing", "");
        assert!(missing.fields.is_empty());
    }

    #[test]
    fn test_strong_precondition_short_circuits_at_interface() {
        let mut examiner = Examiner::new(
            StubProvider::new()
                .with_class("I", "interface I { //@ requires x > 0;\n void m(int x); }")
                .with_class("S", "class S { void m(int x) {} }")
                .with_class("C", "class C extends S implements I { public void m(int x) {} }")
                .forbid("S"),
        );
        let context = examiner.context("C", "");
        assert!(examiner.check_strong_precondition(&context, "m"));
    }

    #[test]
    fn test_strong_precondition_without_mentions() {
        let mut examiner = Examiner::new(StubProvider::new().with_class(
            "C",
            "class C { //@ requires true;\n void m(int x) {} }",
        ));
        let context = examiner.context("C", "");
        assert!(!examiner.check_strong_precondition(&context, "m"));
    }

    #[test]
    fn test_weak_precondition_each_signal_alone() {
        let trivial_requires = "class C { int f; //@ requires true;\n//@ ensures f > 1;\n void m(int x) { int y = x; } }";
        let attribution = "class C { int f; //@ requires x > 0;\n//@ ensures f > 1;\n void m(int x) { f = x; } }";
        let trivial_ensures = "class C { int f; //@ requires x > 0;\n//@ ensures true;\n void m(int x) { int y = x; } }";
        let none = "class C { int f; //@ requires x > 0;\n//@ ensures f > 1;\n void m(int x) { int y = x; } }";

        for (source, expected) in [
            (trivial_requires, true),
            (attribution, true),
            (trivial_ensures, true),
            (none, false),
        ] {
            let mut examiner = Examiner::new(StubProvider::new().with_class("C", source));
            let context = examiner.context("C", "");
            assert_eq!(examiner.check_weak_precondition(&context, "m"), expected, "{}", source);
        }
    }

    #[test]
    fn test_weak_precondition_absent_contract() {
        let mut examiner = Examiner::new(StubProvider::new().with_class("C", "class C { void m() {} }"));
        let context = examiner.context("C", "");
        assert!(examiner.check_weak_precondition(&context, "m"));
        // No such method anywhere
        assert!(!examiner.check_weak_precondition(&context, "other"));
    }

    #[test]
    fn test_null_completion() {
        let complete = r#"class C {
            String name; Object data; int count;
            C() { name = "a"; this.data = new Object(); }
        }"#;
        let missing_one = r#"class C {
            String name; Object data; int count;
            C() { name = "a"; }
        }"#;

        let mut examiner = Examiner::new(StubProvider::new().with_class("C", complete));
        let context = examiner.context("C", "");
        assert!(!examiner.check_null(&context));

        let mut examiner = Examiner::new(StubProvider::new().with_class("C", missing_one));
        let context = examiner.context("C", "");
        assert!(examiner.check_null(&context));
    }

    #[test]
    fn test_null_safety_across_superclass() {
        let mut examiner = Examiner::new(
            StubProvider::new()
                .with_class("S", "class S { Object label = new Object(); Object extra; S() { extra = label; } }")
                .with_class("C", "class C extends S { String name; C() { name = \"c\"; } }"),
        );
        let context = examiner.context("C", "");
        assert!(!examiner.check_null(&context));
    }

    #[test]
    fn test_null_assignment_does_not_count() {
        let mut examiner = Examiner::new(StubProvider::new().with_class(
            "C",
            "class C { Object data; C() { data = null; } }",
        ));
        let context = examiner.context("C", "");
        assert!(examiner.check_null(&context));
    }

    #[test]
    fn test_null_filter_only_for_constructors() {
        let source = r#"class C {
            Object data;
            C() { }
            C(Object d) { data = d; }
        }"#;
        let mut examiner = Examiner::new(StubProvider::new().with_class("C", source));

        // A method filter is ignored, every constructor is tried
        let context = examiner.context("C", "void m()");
        assert!(!examiner.check_null(&context));

        let context = examiner.context("C", "<init>()");
        assert!(examiner.check_null(&context));
    }

    #[test]
    fn test_null_unresolvable_class() {
        let mut examiner = Examiner::new(StubProvider::new());
        let context = examiner.context("Missing", "");
        assert!(!examiner.check_null(&context));
    }
}
