//! Execution modes for mode-aware test cases.

use std::collections::BTreeSet;
use std::fmt;

use core_status::{Result, StatusError};

/// A single mode of execution (e.g. `OLD_IMPL`), represented as an ordered
/// sequence of parts whose canonical text is the parts joined by single
/// spaces. The empty mode stands for "all modes".
///
/// Parts may not be empty, contain whitespace, or contain a literal `*`.
/// Ordering is lexicographic over the part sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TestCaseMode {
    mode_parts: Vec<String>,
}

/// Ordered set of modes; iteration order is the mode ordering.
pub type TestCaseModeSet = BTreeSet<TestCaseMode>;

impl TestCaseMode {
    /// The all-modes mode.
    pub fn all_modes() -> Self {
        Self::default()
    }

    /// Builds a mode from its parts, validating each part.
    pub fn from_parts(mode_parts: Vec<String>) -> Result<Self> {
        for part in &mode_parts {
            if part.is_empty() {
                return Err(StatusError::failed_precondition(
                    "Multi-part modes cannot contain empty strings",
                ));
            }
            if part.chars().any(char::is_whitespace) {
                return Err(StatusError::failed_precondition(
                    "Multi-part modes cannot contain spaces",
                ));
            }
            if part.contains('*') {
                return Err(StatusError::failed_precondition(
                    "Multi-part modes cannot contain literal stars (*)",
                ));
            }
        }
        Ok(Self { mode_parts })
    }

    /// Builds a mode from its space-separated description.
    pub fn parse(description: &str) -> Result<Self> {
        Self::from_parts(description.split(' ').map(str::to_string).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.mode_parts.is_empty()
    }

    /// Parses a `[MODE 1][MODE 2]...` sequence.
    pub fn parse_modes(modes_string: &str) -> Result<Vec<TestCaseMode>> {
        let mut test_modes = Vec::new();
        let mut rest = modes_string;
        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            let Some(after_bracket) = rest.strip_prefix('[') else {
                return Err(StatusError::unknown(format!(
                    "A test mode must be enclosed in [] but got: {rest}"
                )));
            };
            let Some(index) = after_bracket.find(']') else {
                return Err(StatusError::unknown(format!(
                    "A test mode must be enclosed in [] but got: {rest}"
                )));
            };
            let mode_name = &after_bracket[..index];
            if mode_name.is_empty() {
                return Err(StatusError::unknown(format!(
                    "Found empty test mode enclosed in []:\n{modes_string}"
                )));
            }
            test_modes.push(TestCaseMode::parse(mode_name)?);
            rest = &after_bracket[index + 1..];
        }
        Ok(test_modes)
    }

    /// Renders a mode set as `[MODE 1][MODE 2]...`; a set holding only the
    /// all-modes mode renders as the empty string.
    pub fn collapse_modes(modes: &TestCaseModeSet) -> String {
        if modes.len() == 1 && modes.iter().next().is_some_and(TestCaseMode::is_empty) {
            return String::new();
        }
        let mut out = String::new();
        for mode in modes {
            out.push('[');
            out.push_str(&mode.to_string());
            out.push(']');
        }
        out
    }
}

impl fmt::Display for TestCaseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mode_parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_status::ErrorKind;

    #[test]
    fn canonical_text_is_space_joined() {
        let mode = TestCaseMode::from_parts(vec!["MODE".to_string(), "2".to_string()]).unwrap();
        assert_eq!(mode.to_string(), "MODE 2");
        assert_eq!(TestCaseMode::parse("MODE 2").unwrap(), mode);
        assert!(TestCaseMode::all_modes().is_empty());
        assert_eq!(TestCaseMode::all_modes().to_string(), "");
    }

    #[test]
    fn invalid_parts_are_rejected() {
        for bad in [vec![String::new()], vec!["has space".to_string()], vec!["star*".to_string()]] {
            let err = TestCaseMode::from_parts(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::FailedPrecondition);
        }
        // A description with a tab is split on spaces only, leaving the
        // tab inside a part.
        assert!(TestCaseMode::parse("A\tB").is_err());
    }

    #[test]
    fn ordering_is_lexicographic_over_parts() {
        let a = TestCaseMode::parse("A").unwrap();
        let ab = TestCaseMode::parse("A B").unwrap();
        let b = TestCaseMode::parse("B").unwrap();
        assert!(TestCaseMode::all_modes() < a);
        assert!(a < ab);
        assert!(ab < b);
    }

    #[test]
    fn parse_modes_round_trip() {
        let modes = TestCaseMode::parse_modes("[MODE A][MODE B] [C]").unwrap();
        assert_eq!(
            modes
                .iter()
                .map(TestCaseMode::to_string)
                .collect::<Vec<_>>(),
            vec!["MODE A", "MODE B", "C"]
        );
        let set: TestCaseModeSet = modes.into_iter().collect();
        assert_eq!(TestCaseMode::collapse_modes(&set), "[C][MODE A][MODE B]");
    }

    #[test]
    fn parse_modes_errors() {
        assert_eq!(
            TestCaseMode::parse_modes("MODE").unwrap_err().kind(),
            ErrorKind::Unknown
        );
        assert_eq!(
            TestCaseMode::parse_modes("[MODE").unwrap_err().kind(),
            ErrorKind::Unknown
        );
        assert_eq!(
            TestCaseMode::parse_modes("[]").unwrap_err().kind(),
            ErrorKind::Unknown
        );
        assert!(TestCaseMode::parse_modes("").unwrap().is_empty());
    }

    #[test]
    fn collapse_of_all_modes_only_is_empty() {
        let mut set = TestCaseModeSet::new();
        set.insert(TestCaseMode::all_modes());
        assert_eq!(TestCaseMode::collapse_modes(&set), "");
    }
}
