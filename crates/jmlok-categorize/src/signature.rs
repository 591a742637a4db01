//! Method calling signature
//!
//! The declaration line of the violated method, read back from the class
//! source. It is matched against method headers to pick the right
//! overload.

use crate::nonconformance::Nonconformance;
use jmlok_ast::rewrite_constructor_name;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Signature recorded for an implicit default constructor
pub const DEFAULT_CONSTRUCTOR: &str = "defaultConstructor is not explicit";

/// Resolve the signature of the violated method.
///
/// `line_in_java` of `-1` means unknown and gives an empty signature; `0`
/// stands for the implicit default constructor. An unreadable source file
/// also gives an empty signature.
pub fn method_calling_signature(record: &Nonconformance, source_root: &Path) -> String {
    let line = match record.line_in_java {
        n if n < 0 => return String::new(),
        0 => return DEFAULT_CONSTRUCTOR.to_string(),
        n => n as usize,
    };

    let path = class_source_path(source_root, record);
    let text = match declaration_line(&path, line) {
        Ok(Some(text)) => text,
        Ok(None) => {
            debug!(path = %path.display(), line, "declaration line out of range");
            return String::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read declaration line");
            return String::new();
        }
    };

    let declaration = match text.rfind('{') {
        Some(brace) => text[..brace].trim(),
        None => text.as_str(),
    };
    rewrite_constructor_name(declaration, &record.class_name)
}

/// `<root>/<package path>/<Class>.java`
fn class_source_path(source_root: &Path, record: &Nonconformance) -> PathBuf {
    let mut path = source_root.to_path_buf();
    path.extend(record.package_name.split('.').filter(|part| !part.is_empty()));
    path.push(format!("{}.java", record.class_name));
    path
}

/// Line `line` (1-based) of the file, moving past comment and annotation
/// lines until one with code is found or the file ends
fn declaration_line(path: &Path, line: usize) -> io::Result<Option<String>> {
    let contents = fs::read_to_string(path)?;
    let mut lines = contents.lines().skip(line - 1);
    let Some(mut current) = lines.next() else {
        return Ok(None);
    };

    while is_comment_or_annotation(current) {
        match lines.next() {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(Some(current.to_string()))
}

fn is_comment_or_annotation(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with('*') || trimmed.starts_with('/') || trimmed.starts_with('@')
}
