//! Source model providers
//!
//! Given a fully-qualified class name, find its `.java` file (or its
//! separate specification file), parse it, and hand out the class model.

use crate::cache::ClassCache;
use crate::error::{SourceError, SourceResult};
use crate::model::{simple_name, ClassModel};
use crate::registry::ClassRegistry;
use crate::{CompilerKind, ProviderConfig};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Access to the classes of the analyzed tree.
///
/// Resolution never fails loudly: a class that is missing or cannot be
/// loaded is simply `None`.
pub trait SourceModelProvider: Send {
    /// Implementation source of a class
    fn resolve_class(&mut self, name: &str) -> Option<Arc<ClassModel>>;

    /// Separate specification file of a class, if any
    fn resolve_specification(&mut self, name: &str) -> Option<Arc<ClassModel>>;

    /// Where the implementation source of `name` lives, whether or not it exists
    fn source_path(&self, name: &str) -> PathBuf;

    /// `pkg.Class.method` for every method declared in the tree
    fn declared_method_names(&mut self) -> Vec<String>;
}

/// File system-based provider with a per-run cache
#[derive(Debug)]
pub struct FileSystemProvider {
    config: ProviderConfig,
    classes: ClassCache,
    specs: ClassCache,
}

impl FileSystemProvider {
    /// Create a provider; fails only when the source root is missing
    pub fn new(config: ProviderConfig) -> SourceResult<Self> {
        if !config.source_root.is_dir() {
            return Err(SourceError::MissingRoot(config.source_root));
        }
        Ok(Self {
            config,
            classes: ClassCache::new(),
            specs: ClassCache::new(),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Cached implementation lookups, hits and misses
    pub fn cached_classes(&self) -> usize {
        self.classes.len()
    }

    /// First existing specification file for `name`
    pub fn specification_path(&self, name: &str) -> Option<PathBuf> {
        let base = relative_base(name);
        self.config
            .compiler_kind
            .spec_suffixes()
            .iter()
            .map(|suffix| {
                let mut file = base.clone().into_os_string();
                file.push(suffix);
                self.config.spec_root.join(file)
            })
            .find(|path| path.is_file())
    }

    fn in_tree(&self, name: &str) -> bool {
        self.source_path(name).is_file()
    }

    /// Read and parse `path`, building the model for `name`
    pub fn load(&self, name: &str, path: &Path) -> SourceResult<ClassModel> {
        let source =
            fs::read_to_string(path).map_err(|e| SourceError::Io(path.to_path_buf(), e))?;
        let (unit, errors) = jmlok_parser::parse(&source);

        if let Some(first) = errors.first() {
            if unit.find_type(simple_name(name)).is_none() {
                return Err(SourceError::Parse {
                    path: path.to_path_buf(),
                    count: errors.len(),
                    first: first.clone(),
                });
            }
            // The declaration survived recovery; analysis works on what was parsed
            warn!(
                path = %path.display(),
                errors = errors.len(),
                first = %first,
                "parsed with errors"
            );
        }

        ClassModel::from_unit(name, &unit, source, path.to_path_buf(), |fqn| self.in_tree(fqn))
            .ok_or_else(|| SourceError::ClassNotDeclared {
                path: path.to_path_buf(),
                class: name.to_string(),
            })
    }

    fn load_logged(&self, name: &str, path: &Path) -> Option<Arc<ClassModel>> {
        match self.load(name, path) {
            Ok(model) => {
                debug!(class = name, path = %path.display(), "loaded class");
                Some(Arc::new(model))
            }
            Err(e) => {
                warn!(class = name, error = %e, "could not load class");
                None
            }
        }
    }
}

impl SourceModelProvider for FileSystemProvider {
    fn resolve_class(&mut self, name: &str) -> Option<Arc<ClassModel>> {
        if let Some(cached) = self.classes.get(name) {
            return cached;
        }

        let path = self.source_path(name);
        let model = if path.is_file() {
            self.load_logged(name, &path)
        } else {
            debug!(class = name, path = %path.display(), "class not in source tree");
            None
        };

        self.classes.insert(name, model.clone());
        model
    }

    fn resolve_specification(&mut self, name: &str) -> Option<Arc<ClassModel>> {
        if let Some(cached) = self.specs.get(name) {
            return cached;
        }

        let model = match self.specification_path(name) {
            Some(path) => self.load_logged(name, &path),
            None => None,
        };

        self.specs.insert(name, model.clone());
        model
    }

    fn source_path(&self, name: &str) -> PathBuf {
        let mut file = relative_base(name).into_os_string();
        file.push(".java");
        self.config.source_root.join(file)
    }

    fn declared_method_names(&mut self) -> Vec<String> {
        match ClassRegistry::scan(&self.config.source_root) {
            Ok(registry) => registry.method_names(self),
            Err(e) => {
                warn!(error = %e, "could not list declared methods");
                Vec::new()
            }
        }
    }
}

/// `a.b.C` becomes `a/b/C`
fn relative_base(name: &str) -> PathBuf {
    name.split('.').collect()
}

impl CompilerKind {
    /// Specification file suffixes, in lookup order
    pub fn spec_suffixes(self) -> &'static [&'static str] {
        match self {
            CompilerKind::Jmlc => &[".jml", ".spec", ".refines-java"],
            CompilerKind::OpenJml => &[".jml"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_relative_base() {
        assert_eq!(relative_base("bank.Account"), PathBuf::from("bank/Account"));
        assert_eq!(relative_base("Account"), PathBuf::from("Account"));
    }

    #[test]
    fn test_missing_root() {
        let temp = TempDir::new().unwrap();
        let config = ProviderConfig::new(temp.path().join("missing"));
        assert!(matches!(
            FileSystemProvider::new(config),
            Err(SourceError::MissingRoot(_))
        ));
    }

    #[test]
    fn test_resolve_and_cache() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "bank/Account.java", "package bank;\npublic class Account { int balance; }");

        let mut provider = FileSystemProvider::new(ProviderConfig::new(temp.path())).unwrap();
        let first = provider.resolve_class("bank.Account").unwrap();
        assert_eq!(first.simple_name(), "Account");
        assert_eq!(first.fields().len(), 1);

        // A second lookup is served from the cache even if the file is gone
        fs::remove_file(temp.path().join("bank/Account.java")).unwrap();
        let second = provider.resolve_class("bank.Account").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        assert!(provider.resolve_class("bank.Missing").is_none());
        assert_eq!(provider.cached_classes(), 2);
    }

    #[test]
    fn test_unparsable_class_is_none() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "Broken.java", "class { this is not java");
        let mut provider = FileSystemProvider::new(ProviderConfig::new(temp.path())).unwrap();
        assert!(provider.resolve_class("Broken").is_none());
    }

    #[test]
    fn test_specification_suffixes() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "bank/Account.java", "package bank; class Account {}");
        write(temp.path(), "bank/Account.spec", "package bank; class Account {}");

        let openjml = ProviderConfig::new(temp.path());
        let provider = FileSystemProvider::new(openjml).unwrap();
        assert_eq!(provider.specification_path("bank.Account"), None);

        let jmlc = ProviderConfig::new(temp.path()).with_compiler(CompilerKind::Jmlc);
        let mut provider = FileSystemProvider::new(jmlc).unwrap();
        assert_eq!(
            provider.specification_path("bank.Account"),
            Some(temp.path().join("bank/Account.spec"))
        );
        assert!(provider.resolve_specification("bank.Account").is_some());
    }

    #[test]
    fn test_spec_root_is_separate() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        let specs = temp.path().join("specs");
        write(&src, "A.java", "class A {}");
        write(&specs, "A.jml", "class A { //@ requires x > 0;\n void m(int x); }");

        let config = ProviderConfig::new(&src).with_spec_root(&specs);
        let mut provider = FileSystemProvider::new(config).unwrap();
        let spec = provider.resolve_specification("A").unwrap();
        assert_eq!(spec.methods_named("m").count(), 1);
    }
}
