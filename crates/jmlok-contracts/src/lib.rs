//! JMLOK Contract Analysis
//!
//! Static heuristics over contract clauses and method bodies:
//! - [`eval`]: tri-state evaluation of boolean clauses
//! - [`scanner`]: syntactic scans of clauses, bodies and fields
//! - [`hierarchy`]: repeating a check across interfaces, superclasses and
//!   specification files
//! - [`examiner`]: the strong-precondition, weak-precondition and null
//!   questions asked by the classifier

pub mod eval;
pub mod examiner;
pub mod hierarchy;
pub mod scanner;

#[cfg(test)]
mod testing;

pub use eval::{evaluate, is_trivially_true, Truth};
pub use examiner::{ExaminationContext, Examiner};
pub use hierarchy::{Check, HierarchyWalker, SourceKind, WalkState};
pub use scanner::{
    body_has_attribution_or_call, clause_mentions, discharge_constructor,
    discharge_field_declarations,
};
