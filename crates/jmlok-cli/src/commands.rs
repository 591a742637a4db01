use crate::render::{class_summary, report_parse_error};
use crate::ProjectArgs;
use anyhow::{bail, Context, Result};
use jmlok_ast::CONSTRUCTOR_NAME;
use jmlok_categorize::{report, Cause, Classifier, Config, Nonconformance};
use jmlok_source::{simple_name, FileSystemProvider, SourceModelProvider};
use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;
use tracing::info;

impl ProjectArgs {
    /// Configuration file, if any, with the flags applied on top
    pub fn to_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => match &self.source_root {
                Some(root) => Config::new(root),
                None => bail!("either --source-root or --config is required"),
            },
        };

        if let Some(root) = &self.source_root {
            config.source_root = root.clone();
        }
        if let Some(spec_root) = &self.spec_root {
            config.spec_root = Some(spec_root.clone());
        }
        if let Some(test_dir) = &self.test_dir {
            config.test_dir = Some(test_dir.clone());
        }
        if let Some(compiler) = self.compiler {
            config.compiler_kind = compiler;
        }
        Ok(config)
    }
}

/// `jmlok classify`
pub fn classify(batch: &Path, project: &ProjectArgs, output: Option<&Path>, as_report: bool) -> Result<()> {
    let config = project.to_config()?;
    let content = fs::read_to_string(batch)
        .with_context(|| format!("failed to read batch {}", batch.display()))?;
    let records: Vec<Nonconformance> = serde_json::from_str(&content)
        .with_context(|| format!("malformed batch {}", batch.display()))?;

    let mut classifier = Classifier::from_config(&config).context("failed to open source tree")?;
    let classified = classifier.classify_batch(records);
    log_summary(&classified);

    let json = if as_report {
        serde_json::to_string_pretty(&report(&classified))?
    } else {
        serde_json::to_string_pretty(&classified)?
    };

    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn log_summary(records: &[Nonconformance]) {
    let mut counts: FxHashMap<Cause, usize> = FxHashMap::default();
    for cause in records.iter().filter_map(|r| r.cause()) {
        *counts.entry(cause).or_default() += 1;
    }
    let mut counts: Vec<(Cause, usize)> = counts.into_iter().collect();
    counts.sort_by_key(|(cause, _)| cause.as_str());

    info!(total = records.len(), "classification finished");
    for (cause, count) in counts {
        info!(%cause, count, "cause");
    }
}

/// `jmlok parse`
pub fn parse_file(path: &Path) -> Result<()> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = path.display().to_string();
    let (unit, errors) = jmlok_parser::parse(&source);

    for error in &errors {
        report_parse_error(&filename, &source, error)?;
    }
    print!("{}", class_summary(&unit));

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("{} parse error(s) in {}", errors.len(), filename)
    }
}

/// `jmlok show`
pub fn show(class: &str, method: &str, project: &ProjectArgs) -> Result<()> {
    let config = project.to_config()?;
    let mut provider = FileSystemProvider::new(config.provider_config())?;
    let Some(model) = provider.resolve_class(class) else {
        bail!("class {} not found under {}", class, config.source_root.display());
    };

    let key = if method == simple_name(class) { CONSTRUCTOR_NAME } else { method };
    let mut found = false;
    for declaration in model.methods_named(key) {
        found = true;
        println!("{}\n", model.declaration_text(declaration));
    }

    if !found {
        bail!("{} declares no method {}", class, method);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jmlok_source::CompilerKind;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_source_root_required() {
        assert!(ProjectArgs::default().to_config().is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jmlok.toml");
        fs::write(&path, "source_root = \"src\"\ncompiler_kind = \"jmlc\"\n").unwrap();

        let project = ProjectArgs {
            config: Some(path),
            test_dir: Some(PathBuf::from("generated")),
            compiler: Some(CompilerKind::OpenJml),
            ..Default::default()
        };
        let config = project.to_config().unwrap();
        assert_eq!(config.source_root, PathBuf::from("src"));
        assert_eq!(config.test_dir(), Path::new("generated"));
        assert_eq!(config.compiler_kind, CompilerKind::OpenJml);
    }

    #[test]
    fn test_classify_writes_report() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            src.join("Counter.java"),
            "public class Counter {\n  private int n;\n  //@ requires k > 0;\n  public void add(int k) { n += k; }\n}\n",
        )
        .unwrap();
        let batch = temp.path().join("batch.json");
        fs::write(
            &batch,
            r#"[{"category": "precondition", "className": "Counter", "methodName": "add"}]"#,
        )
        .unwrap();
        let output = temp.path().join("out.json");

        let project = ProjectArgs {
            source_root: Some(src),
            ..Default::default()
        };
        classify(&batch, &project, Some(&output), true).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written[0]["likelyCause"], "Strong Precondition");
        assert_eq!(written[0]["type"], "precondition");
    }

    #[test]
    fn test_classify_rejects_malformed_batch() {
        let temp = TempDir::new().unwrap();
        let batch = temp.path().join("batch.json");
        fs::write(&batch, "{ not json").unwrap();
        let project = ProjectArgs {
            source_root: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        assert!(classify(&batch, &project, None, false).is_err());
    }

    #[test]
    fn test_show_missing_method() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("A.java"), "class A { void m() {} }").unwrap();
        let project = ProjectArgs {
            source_root: Some(temp.path().to_path_buf()),
            ..Default::default()
        };
        assert!(show("A", "m", &project).is_ok());
        assert!(show("A", "other", &project).is_err());
        assert!(show("B", "m", &project).is_err());
    }
}
