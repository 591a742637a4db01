//! Class cache
//!
//! Memoizes class resolution for the duration of a run, so the same file is
//! parsed once no matter how many checks or nonconformances ask for it.
//! Misses are cached too.

use crate::ClassModel;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use std::sync::Arc;

/// Cache of resolved classes keyed by fully-qualified name
#[derive(Debug, Clone, Default)]
pub struct ClassCache {
    entries: FxHashMap<SmolStr, Option<Arc<ClassModel>>>,
}

impl ClassCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(None)` is a cached miss, `None` means never looked up
    pub fn get(&self, name: &str) -> Option<Option<Arc<ClassModel>>> {
        self.entries.get(name).cloned()
    }

    pub fn insert(&mut self, name: impl Into<SmolStr>, model: Option<Arc<ClassModel>>) {
        self.entries.insert(name.into(), model);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of cached lookups, hits and misses alike
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
