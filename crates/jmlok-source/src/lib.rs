//! JMLOK Source Model
//!
//! Locates classes of the analyzed tree on disk, parses them, resolves
//! their supertypes and memoizes the result for the rest of the run.

pub mod cache;
pub mod error;
pub mod model;
pub mod provider;
pub mod registry;

pub use cache::ClassCache;
pub use error::{SourceError, SourceResult};
pub use model::{package_of, qualify, simple_name, ClassModel};
pub use provider::{FileSystemProvider, SourceModelProvider};
pub use registry::ClassRegistry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Which contract-aware compiler the analyzed project targets. Decides the
/// file suffixes of separate specification files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
    Jmlc,
    #[default]
    OpenJml,
}

impl fmt::Display for CompilerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilerKind::Jmlc => f.write_str("jmlc"),
            CompilerKind::OpenJml => f.write_str("openjml"),
        }
    }
}

impl FromStr for CompilerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jmlc" => Ok(CompilerKind::Jmlc),
            "openjml" => Ok(CompilerKind::OpenJml),
            other => Err(format!("unknown compiler '{}', expected jmlc or openjml", other)),
        }
    }
}

/// Where the sources and specifications live
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub source_root: PathBuf,
    pub spec_root: PathBuf,
    pub compiler_kind: CompilerKind,
}

impl ProviderConfig {
    /// Specifications default to living next to the sources
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        let source_root = source_root.into();
        Self {
            spec_root: source_root.clone(),
            source_root,
            compiler_kind: CompilerKind::default(),
        }
    }

    pub fn with_spec_root(mut self, spec_root: impl Into<PathBuf>) -> Self {
        self.spec_root = spec_root.into();
        self
    }

    pub fn with_compiler(mut self, compiler_kind: CompilerKind) -> Self {
        self.compiler_kind = compiler_kind;
        self
    }
}
