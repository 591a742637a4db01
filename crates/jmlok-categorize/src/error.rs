//! Classification errors

use crate::nonconformance::Cause;
use jmlok_source::SourceError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for classification operations
pub type CategorizeResult<T> = Result<T, CategorizeError>;

/// Errors raised while classifying nonconformances
#[derive(Debug, Error)]
pub enum CategorizeError {
    /// A record only ever gets one cause
    #[error("cause already assigned: {0}")]
    CauseAlreadyAssigned(Cause),

    /// A cause was assigned before the method calling signature was known
    #[error("method calling signature of {0} has not been resolved")]
    SignatureUnresolved(String),

    /// IO error while reading a configuration file
    #[error("IO error reading {}: {1}", .0.display())]
    ConfigIo(PathBuf, #[source] std::io::Error),

    /// The configuration file is not valid TOML for [`crate::Config`]
    #[error("invalid configuration {}: {1}", .0.display())]
    ConfigParse(PathBuf, #[source] toml::de::Error),

    /// The source tree could not be opened
    #[error(transparent)]
    Source(#[from] SourceError),
}
