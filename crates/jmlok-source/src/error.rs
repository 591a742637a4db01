//! Source model errors

use jmlok_parser::ParseError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for source model operations
pub type SourceResult<T> = Result<T, SourceError>;

/// Errors raised while locating or loading class sources
#[derive(Debug, Error)]
pub enum SourceError {
    /// The configured source root does not exist
    #[error("source root not found: {}", .0.display())]
    MissingRoot(PathBuf),

    /// IO error while reading a source file
    #[error("IO error reading {}: {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    /// The file parsed with errors; the first one is kept
    #[error("parse errors in {}: {} error(s), first: {first}", .path.display(), .count)]
    Parse {
        path: PathBuf,
        count: usize,
        first: ParseError,
    },

    /// The file exists but does not declare the requested type
    #[error("{} does not declare {class}", .path.display())]
    ClassNotDeclared { path: PathBuf, class: String },
}
