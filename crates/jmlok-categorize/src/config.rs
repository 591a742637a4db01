//! Classification configuration

use crate::error::{CategorizeError, CategorizeResult};
use jmlok_source::{CompilerKind, ProviderConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Where the analyzed project lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the `.java` sources
    pub source_root: PathBuf,

    /// Root of separate specification files; defaults to `source_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_root: Option<PathBuf>,

    /// Decides which specification file suffixes are looked up
    #[serde(default)]
    pub compiler_kind: CompilerKind,

    /// Directory of the generated tests; defaults to `source_root`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_dir: Option<PathBuf>,
}

impl Config {
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            spec_root: None,
            compiler_kind: CompilerKind::default(),
            test_dir: None,
        }
    }

    /// Load from a TOML file
    pub fn load(path: &Path) -> CategorizeResult<Self> {
        let content =
            fs::read_to_string(path).map_err(|e| CategorizeError::ConfigIo(path.to_path_buf(), e))?;
        toml::from_str(&content).map_err(|e| CategorizeError::ConfigParse(path.to_path_buf(), e))
    }

    pub fn spec_root(&self) -> &Path {
        self.spec_root.as_deref().unwrap_or(&self.source_root)
    }

    pub fn test_dir(&self) -> &Path {
        self.test_dir.as_deref().unwrap_or(&self.source_root)
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig::new(&self.source_root)
            .with_spec_root(self.spec_root())
            .with_compiler(self.compiler_kind)
    }
}
