//! Cause classifier
//!
//! Derives the method calling signature, stack trace and sample line of each
//! nonconformance and runs the decision procedure of its category against
//! the examiner.

use crate::config::Config;
use crate::error::CategorizeResult;
use crate::nonconformance::{Category, Cause, Nonconformance};
use crate::sample::sample_line;
use crate::signature::method_calling_signature;
use crate::stack_trace::{stack_trace_order, MethodRegistry};
use jmlok_contracts::Examiner;
use jmlok_source::{FileSystemProvider, SourceModelProvider};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Marker of a precondition reference inside an invariant diagnostic
pub const PRECONDITION_MARKER: &str = "@pre";

/// Classifies nonconformances one at a time
pub struct Classifier<P: SourceModelProvider> {
    examiner: Examiner<P>,
    registry: MethodRegistry,
    source_root: PathBuf,
    test_dir: PathBuf,
}

impl Classifier<FileSystemProvider> {
    /// Classifier over the file system tree described by `config`. Fails only
    /// when the source root is missing.
    pub fn from_config(config: &Config) -> CategorizeResult<Self> {
        let provider = FileSystemProvider::new(config.provider_config())?;
        Ok(Self::new(provider, &config.source_root, config.test_dir()))
    }
}

impl<P: SourceModelProvider> Classifier<P> {
    pub fn new(mut provider: P, source_root: &Path, test_dir: &Path) -> Self {
        let registry: MethodRegistry = provider.declared_method_names().into_iter().collect();
        debug!(methods = registry.len(), "method registry built");
        Self {
            examiner: Examiner::new(provider),
            registry,
            source_root: source_root.to_path_buf(),
            test_dir: test_dir.to_path_buf(),
        }
    }

    pub fn examiner(&self) -> &Examiner<P> {
        &self.examiner
    }

    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Enrich `record` and assign its cause. A record that already carries
    /// a cause is left untouched.
    pub fn classify(&mut self, record: &mut Nonconformance) -> CategorizeResult<Cause> {
        if let Some(cause) = record.cause() {
            debug!(method = %record.qualified_method(), %cause, "already classified");
            return Ok(cause);
        }

        let signature = method_calling_signature(record, &self.source_root);
        record.method_calling_signature = Some(signature);
        record.stack_trace_order = stack_trace_order(record, &self.registry);
        let sample = sample_line(&self.test_dir, record);
        record.sample_line = sample.text;
        record.occurrence_count = sample.occurrences;

        let cause = self.decide(record);
        record.assign_cause(cause)?;
        debug!(
            category = %record.category,
            method = %record.qualified_method(),
            %cause,
            "classified"
        );
        Ok(cause)
    }

    /// Classify every record, keeping input order. Failures are logged and
    /// leave the record without a cause.
    pub fn classify_batch(&mut self, mut records: Vec<Nonconformance>) -> Vec<Nonconformance> {
        info!(count = records.len(), "classifying nonconformances");
        for record in &mut records {
            if let Err(e) = self.classify(record) {
                warn!(method = %record.qualified_method(), error = %e, "classification failed");
            }
        }
        records
    }

    fn decide(&mut self, record: &Nonconformance) -> Cause {
        let signature = record.method_calling_signature.as_deref().unwrap_or_default();
        let method = record.method_name.as_str();

        match record.category {
            Category::Precondition => {
                let context = self.examiner.context(&record.qualified_class(), signature);
                if self.examiner.check_strong_precondition(&context, method) {
                    Cause::StrongPrecondition
                } else {
                    Cause::WeakPostcondition
                }
            }
            Category::Postcondition | Category::Evaluation => {
                let context = self.examiner.context(&record.qualified_class(), signature);
                if self.examiner.check_weak_precondition(&context, method) {
                    Cause::WeakPrecondition
                } else {
                    Cause::StrongPostcondition
                }
            }
            Category::Invariant => {
                let context = self.examiner.context(&record.qualified_class(), signature);
                if !record.is_constructor_context() {
                    if record.raw_diagnostic.contains(PRECONDITION_MARKER) {
                        Cause::NullRelated
                    } else if self.examiner.check_weak_precondition(&context, method) {
                        Cause::WeakPrecondition
                    } else {
                        Cause::StrongInvariant
                    }
                } else if self.examiner.check_null(&context) {
                    Cause::NullRelated
                } else if self.examiner.check_weak_precondition(&context, method) {
                    Cause::WeakPrecondition
                } else {
                    Cause::StrongInvariant
                }
            }
            Category::Constraint => {
                let class = if record.caller_class_hint.is_empty() {
                    record.qualified_class()
                } else {
                    record.caller_class_hint.clone()
                };
                let context = self.examiner.context(&class, signature);
                if self.examiner.check_null(&context) {
                    Cause::NullRelated
                } else if self.examiner.check_weak_precondition(&context, method) {
                    Cause::WeakPrecondition
                } else {
                    Cause::StrongConstraint
                }
            }
        }
    }
}
