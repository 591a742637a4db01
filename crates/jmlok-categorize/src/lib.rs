//! JMLOK Categorization
//!
//! Assigns a likely cause to each nonconformance found by a generated test
//! run, by examining the contracts and code of the class under test.

pub mod classifier;
pub mod config;
pub mod error;
pub mod nonconformance;
pub mod report;
pub mod sample;
pub mod signature;
pub mod stack_trace;

pub use classifier::{Classifier, PRECONDITION_MARKER};
pub use config::Config;
pub use error::{CategorizeError, CategorizeResult};
pub use nonconformance::{Category, Cause, Nonconformance};
pub use report::{render_stack_trace, report, ReportEntry, TestInfo};
pub use sample::{sample_line, SampleLine};
pub use signature::{method_calling_signature, DEFAULT_CONSTRUCTOR};
pub use stack_trace::{stack_trace_order, MethodRegistry};
