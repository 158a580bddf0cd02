//! The golden test-file grammar: splitting, parsing and re-emitting.
//!
//! A test file is a newline-delimited sequence of test cases separated by
//! `==` lines. Each case consists of parts separated by `--` lines; part 0
//! is the test input, the remaining parts are expected outputs. Lines
//! starting with `#` and blank lines at the start or end of a part are
//! comments attached to that part; a backslash at the start of a line
//! escapes the special meaning of `#`, `--`, `==` and `\` itself.
//!
//! ```text
//! # Comment
//! First test case.
//! --
//! Expected output.
//! ==
//! Second test case.
//! --
//! \== this literal line starts with ==
//! ```
//!
//! [`next_test_case`] and [`build_test_file_entry`] are inverses of each
//! other up to escape normalization: parsing an emitted entry yields the
//! same parts and comments back.

use std::sync::LazyLock;

use regex::Regex;

use core_status::{Result, StatusError};

mod emitter;
mod parser;

pub use emitter::build_test_file_entry;
pub use parser::next_test_case;

/// Comments associated with one test case part: a block before the body
/// and a block after it. Comments cannot appear in the middle of a part.
///
/// Both blocks are multi-line strings in which every line (including the
/// last) ends with `\n`; an absent block is the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct TestCasePartComments {
    pub start_comment: String,
    pub end_comment: String,
}

/// Matches a part separator: `--` followed by nothing but whitespace.
static PART_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--\s*$").expect("part separator regex"));

/// Matches a case separator: `==` followed by optional spaces.
static CASE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^==\s*$").expect("case separator regex"));

pub(crate) fn is_part_separator(line: &str) -> bool {
    // Cheap check first; the regex only runs on plausible separators.
    line.starts_with("--") && PART_SEPARATOR.is_match(line)
}

pub(crate) fn is_case_separator(line: &str) -> bool {
    line.starts_with("==") && CASE_SEPARATOR.is_match(line)
}

/// Splits raw file data into lines. The trailing `\n` is a line
/// terminator, not a separator: `"a\n"` is one line, not two.
pub fn split_test_file_data(file_data: &str) -> Vec<String> {
    let mut lines: Vec<String> = file_data.split('\n').map(str::to_string).collect();
    if file_data.ends_with('\n') {
        lines.pop();
    }
    lines
}

/// Reads a test file from disk and splits it into lines.
pub fn read_test_file(path: &std::path::Path) -> Result<Vec<String>> {
    let file_data = std::fs::read_to_string(path)
        .map_err(|e| StatusError::from(e).with_context(format!("while reading {}", path.display())))?;
    Ok(split_test_file_data(&file_data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_treats_newline_as_terminator() {
        assert_eq!(split_test_file_data("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_test_file_data("a\nb"), vec!["a", "b"]);
        assert_eq!(split_test_file_data(""), Vec::<String>::new());
        assert_eq!(split_test_file_data("\n"), vec![""]);
    }

    #[test]
    fn separator_recognition() {
        assert!(is_part_separator("--"));
        assert!(is_part_separator("--   "));
        assert!(!is_part_separator("-- x"));
        assert!(!is_part_separator("---"));
        assert!(is_case_separator("=="));
        assert!(is_case_separator("==  "));
        assert!(!is_case_separator("== x"));
    }
}
