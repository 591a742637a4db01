//! Nonconformance records

use crate::error::{CategorizeError, CategorizeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of contract a generated test found violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Precondition,
    Postcondition,
    Invariant,
    Constraint,
    /// A contract expression that could not be evaluated at runtime
    Evaluation,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Precondition => "precondition",
            Category::Postcondition => "postcondition",
            Category::Invariant => "invariant",
            Category::Constraint => "constraint",
            Category::Evaluation => "evaluation",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Likely cause of a nonconformance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cause {
    #[serde(rename = "Strong Precondition")]
    StrongPrecondition,
    #[serde(rename = "Weak Precondition")]
    WeakPrecondition,
    #[serde(rename = "Strong Postcondition")]
    StrongPostcondition,
    #[serde(rename = "Weak Postcondition")]
    WeakPostcondition,
    #[serde(rename = "Strong Invariant")]
    StrongInvariant,
    #[serde(rename = "Strong Constraint")]
    StrongConstraint,
    /// Reserved for malformed expressions reported by the harvester
    #[serde(rename = "Cannot be Evaluated")]
    CannotBeEvaluated,
    /// Reserved for malformed expressions reported by the harvester
    #[serde(rename = "Incorrect Expression")]
    IncorrectExpression,
    #[serde(rename = "Null-Related - Code Error")]
    NullRelated,
}

impl Cause {
    pub fn as_str(self) -> &'static str {
        match self {
            Cause::StrongPrecondition => "Strong Precondition",
            Cause::WeakPrecondition => "Weak Precondition",
            Cause::StrongPostcondition => "Strong Postcondition",
            Cause::WeakPostcondition => "Weak Postcondition",
            Cause::StrongInvariant => "Strong Invariant",
            Cause::StrongConstraint => "Strong Constraint",
            Cause::CannotBeEvaluated => "Cannot be Evaluated",
            Cause::IncorrectExpression => "Incorrect Expression",
            Cause::NullRelated => "Null-Related - Code Error",
        }
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One nonconformance, as handed over by the test-run harvester and
/// enriched by classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nonconformance {
    pub category: Category,
    #[serde(default)]
    pub package_name: String,
    pub class_name: String,
    pub method_name: String,
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub test_file: String,
    #[serde(default)]
    pub raw_diagnostic: String,
    /// Line of the violated declaration in the class source. `-1` when
    /// unknown, `0` for an implicit default constructor.
    #[serde(default = "unknown_line")]
    pub line_in_java: i64,
    /// Line of the test file that triggered the violation
    #[serde(default)]
    pub line_in_test: usize,
    /// `package.Class` of the caller, for constraints
    #[serde(default)]
    pub caller_class_hint: String,

    /// `None` until resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method_calling_signature: Option<String>,
    #[serde(default)]
    pub stack_trace_order: Vec<String>,
    #[serde(default)]
    pub sample_line: String,
    #[serde(default)]
    pub occurrence_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cause: Option<Cause>,
}

fn unknown_line() -> i64 {
    -1
}

impl Nonconformance {
    pub fn new(
        category: Category,
        package_name: impl Into<String>,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            category,
            package_name: package_name.into(),
            class_name: class_name.into(),
            method_name: method_name.into(),
            test_name: String::new(),
            test_file: String::new(),
            raw_diagnostic: String::new(),
            line_in_java: unknown_line(),
            line_in_test: 0,
            caller_class_hint: String::new(),
            method_calling_signature: None,
            stack_trace_order: Vec::new(),
            sample_line: String::new(),
            occurrence_count: 0,
            cause: None,
        }
    }

    pub fn with_test(mut self, test_name: impl Into<String>, test_file: impl Into<String>) -> Self {
        self.test_name = test_name.into();
        self.test_file = test_file.into();
        self
    }

    pub fn with_diagnostic(mut self, raw_diagnostic: impl Into<String>) -> Self {
        self.raw_diagnostic = raw_diagnostic.into();
        self
    }

    pub fn with_lines(mut self, line_in_java: i64, line_in_test: usize) -> Self {
        self.line_in_java = line_in_java;
        self.line_in_test = line_in_test;
        self
    }

    pub fn with_caller_class_hint(mut self, hint: impl Into<String>) -> Self {
        self.caller_class_hint = hint.into();
        self
    }

    /// `package.Class`, or just `Class` in the default package
    pub fn qualified_class(&self) -> String {
        if self.package_name.is_empty() {
            self.class_name.clone()
        } else {
            format!("{}.{}", self.package_name, self.class_name)
        }
    }

    /// `package.Class.method`
    pub fn qualified_method(&self) -> String {
        format!("{}.{}", self.qualified_class(), self.method_name)
    }

    /// Does the resolved signature denote a constructor of the class,
    /// explicit or implicit?
    pub fn is_constructor_context(&self) -> bool {
        self.method_calling_signature.as_deref().is_some_and(|signature| {
            signature.contains(jmlok_ast::CONSTRUCTOR_NAME)
                || signature.contains(crate::signature::DEFAULT_CONSTRUCTOR)
        })
    }

    pub fn cause(&self) -> Option<Cause> {
        self.cause
    }

    /// Set the cause. Fails if one is already set or the method calling
    /// signature is still unresolved.
    pub fn assign_cause(&mut self, cause: Cause) -> CategorizeResult<()> {
        if let Some(existing) = self.cause {
            return Err(CategorizeError::CauseAlreadyAssigned(existing));
        }
        if self.method_calling_signature.is_none() {
            return Err(CategorizeError::SignatureUnresolved(self.qualified_method()));
        }
        self.cause = Some(cause);
        Ok(())
    }
}
