//! In-memory provider for unit tests

use jmlok_source::{ClassModel, SourceModelProvider};
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;
use std::sync::Arc;

/// Serves classes from source strings keyed by fully-qualified name.
/// Resolving a forbidden class fails the test.
#[derive(Debug, Default)]
pub struct StubProvider {
    classes: FxHashMap<String, String>,
    specifications: FxHashMap<String, String>,
    forbidden: FxHashSet<String>,
    resolved: Vec<String>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, name: &str, source: &str) -> Self {
        self.classes.insert(name.to_string(), source.to_string());
        self
    }

    pub fn with_specification(mut self, name: &str, source: &str) -> Self {
        self.specifications.insert(name.to_string(), source.to_string());
        self
    }

    pub fn forbid(mut self, name: &str) -> Self {
        self.forbidden.insert(name.to_string());
        self
    }

    pub fn was_resolved(&self, name: &str) -> bool {
        self.resolved.iter().any(|r| r == name)
    }

    fn build(&self, name: &str, source: &str) -> Option<Arc<ClassModel>> {
        let (unit, errors) = jmlok_parser::parse(source);
        assert!(errors.is_empty(), "Errors in {}: {:?}", name, errors);
        ClassModel::from_unit(name, &unit, source.to_string(), self.source_path(name), |fqn| {
            self.classes.contains_key(fqn)
        })
        .map(Arc::new)
    }
}

impl SourceModelProvider for StubProvider {
    fn resolve_class(&mut self, name: &str) -> Option<Arc<ClassModel>> {
        assert!(!self.forbidden.contains(name), "{} must not be resolved", name);
        self.resolved.push(name.to_string());
        let source = self.classes.get(name)?;
        self.build(name, source)
    }

    fn resolve_specification(&mut self, name: &str) -> Option<Arc<ClassModel>> {
        let source = self.specifications.get(name)?;
        self.build(name, source)
    }

    fn source_path(&self, name: &str) -> PathBuf {
        PathBuf::from(format!("{}.java", name.replace('.', "/")))
    }

    fn declared_method_names(&mut self) -> Vec<String> {
        Vec::new()
    }
}
