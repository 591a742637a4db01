//! Class registry
//!
//! Lists every class of the analyzed tree and, from there, every declared
//! `pkg.Class.method`. Stack trace reconstruction only keeps frames found
//! in that list.

use crate::error::{SourceError, SourceResult};
use crate::provider::SourceModelProvider;
use smol_str::SmolStr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Fully-qualified names of every `.java` file under a source root
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    root: PathBuf,
    /// Sorted
    classes: Vec<SmolStr>,
}

impl ClassRegistry {
    /// Walk `root` and collect `pkg.Class` for each `pkg/Class.java`.
    /// Entries that cannot be read are skipped.
    pub fn scan(root: &Path) -> SourceResult<Self> {
        if !root.is_dir() {
            return Err(SourceError::MissingRoot(root.to_path_buf()));
        }

        let mut classes = Vec::new();
        for entry in WalkDir::new(root).follow_links(false).into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().map_or(true, |ext| ext != "java") {
                continue;
            }
            if let Some(name) = class_name_for(root, path) {
                classes.push(SmolStr::new(name));
            }
        }

        classes.sort();
        classes.dedup();
        debug!(root = %root.display(), classes = classes.len(), "scanned source tree");

        Ok(Self {
            root: root.to_path_buf(),
            classes,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classes(&self) -> &[SmolStr] {
        &self.classes
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes
            .binary_search_by(|probe| probe.as_str().cmp(name))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// `pkg.Class.method` for every declared method and constructor of every
    /// resolvable class. Constructors are listed as `pkg.Class.<init>`.
    pub fn method_names<P>(&self, provider: &mut P) -> Vec<String>
    where
        P: SourceModelProvider + ?Sized,
    {
        let mut names = Vec::new();
        for class in &self.classes {
            let Some(model) = provider.resolve_class(class) else {
                continue;
            };
            for method in &model.decl.methods {
                let method_name = if method.is_constructor() {
                    jmlok_ast::CONSTRUCTOR_NAME
                } else {
                    method.name.node.as_str()
                };
                names.push(format!("{}.{}", class, method_name));
            }
        }
        names
    }
}

/// `root/a/b/C.java` becomes `a.b.C`
fn class_name_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}
