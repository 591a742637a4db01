//! Report view of classified nonconformances

use crate::nonconformance::Nonconformance;
use serde::{Deserialize, Serialize};

/// One nonconformance in the shape downstream report writers expect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub package: String,
    pub class: String,
    pub method: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub likely_cause: String,
    pub stack_trace: String,
    pub test: TestInfo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInfo {
    pub test_name: String,
    pub test_file: String,
    pub message: String,
}

impl From<&Nonconformance> for ReportEntry {
    fn from(record: &Nonconformance) -> Self {
        Self {
            package: record.package_name.clone(),
            class: record.class_name.clone(),
            method: record.method_name.clone(),
            kind: record.category.to_string(),
            likely_cause: record.cause().map(|c| c.to_string()).unwrap_or_default(),
            stack_trace: render_stack_trace(&record.stack_trace_order),
            test: TestInfo {
                test_name: record.test_name.clone(),
                test_file: record.test_file.clone(),
                message: record.raw_diagnostic.clone(),
            },
        }
    }
}

/// Report entries for a batch, in order
pub fn report(records: &[Nonconformance]) -> Vec<ReportEntry> {
    records.iter().map(ReportEntry::from).collect()
}

/// ```text
/// Error appeared in bank.Account.withdraw
/// ----> at bank.Teller.serve
/// ```
pub fn render_stack_trace(order: &[String]) -> String {
    let mut out = String::new();
    let mut frames = order.iter();
    if let Some(first) = frames.next() {
        out.push_str("Error appeared in ");
        out.push_str(first);
        out.push('\n');
    }
    for frame in frames {
        out.push_str("----> at ");
        out.push_str(frame);
        out.push('\n');
    }
    out
}
