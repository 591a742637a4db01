//! Sample line of the revealing test

use crate::nonconformance::Nonconformance;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The test line that revealed a nonconformance, with how often the same
/// text occurs earlier in its test method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SampleLine {
    pub text: String,
    pub occurrences: usize,
}

/// Read line `line_in_test` of the record's test file under `test_dir`.
///
/// `occurrences` counts the non-overlapping matches of that line in the
/// text of the test method that precedes it, from the line after
/// `public void <testName>()`. A missing file or line gives an empty sample.
pub fn sample_line(test_dir: &Path, record: &Nonconformance) -> SampleLine {
    let path = test_dir.join(&record.test_file);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "test file not readable");
            return SampleLine::default();
        }
    };

    let header = format!("public void {}()", record.test_name);
    let mut in_test = false;
    let mut preceding = String::new();

    for (index, line) in contents.lines().enumerate() {
        if line.contains(&header) {
            in_test = true;
        } else if index + 1 == record.line_in_test {
            return SampleLine {
                text: line.to_string(),
                occurrences: count_matches(&preceding, line),
            };
        } else if in_test {
            preceding.push_str(line);
        }
    }

    SampleLine::default()
}

fn count_matches(haystack: &str, needle: &str) -> usize {
    if haystack.is_empty() || needle.is_empty() {
        0
    } else {
        haystack.matches(needle).count()
    }
}
