//! Driver configuration.
//!
//! [`DriverConfig`] collects the runner knobs, a hook invoked per failed
//! case, and the sink failures are reported through. The plain-data knobs
//! can also be loaded from a TOML file (`[driver]` table, unknown fields
//! ignored) so a harness can keep them next to its other settings.

use std::path::Path;

use serde::Deserialize;
use tracing::error;

use core_status::Result;
use core_status::StatusError;

/// Diff information handed to [`DriverConfig::set_on_result_diff_found`]
/// callbacks for analysis or rendering.
#[derive(Debug, Clone)]
pub struct ResultDiff {
    /// The generated unified diff.
    pub unified_diff: String,
    /// The expected output of the test case.
    pub expected: String,
    /// The actual output of the test case.
    pub actual: String,
    /// Path of the test file.
    pub file_path: String,
    /// 0-based line where the test case starts in its file.
    pub start_line_number: usize,
}

pub type OnResultDiffFound = Box<dyn Fn(&ResultDiff)>;
/// Receives one formatted message per reported failure; the bridge to the
/// surrounding test framework's expectation mechanism.
pub type FailureSink = Box<dyn Fn(&str)>;

/// File form of the plain-data knobs.
#[derive(Debug, Clone, Default, Deserialize)]
struct DriverConfigFile {
    #[serde(default)]
    driver: DriverKnobs,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct DriverKnobs {
    alternations_enabled: bool,
    insert_leading_blank_lines: u32,
    ignore_regex: String,
    individual_tests: bool,
    generate_actual_file: bool,
    log_ignored_tests: bool,
}

impl Default for DriverKnobs {
    fn default() -> Self {
        Self {
            alternations_enabled: true,
            insert_leading_blank_lines: 0,
            ignore_regex: String::new(),
            individual_tests: true,
            generate_actual_file: false,
            log_ignored_tests: true,
        }
    }
}

/// Configuration for the test file runner.
#[derive(Default)]
pub struct DriverConfig {
    knobs: DriverKnobs,
    on_result_diff_found: Option<OnResultDiffFound>,
    failure_sink: Option<FailureSink>,
}

impl std::fmt::Debug for DriverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverConfig")
            .field("knobs", &self.knobs)
            .field("on_result_diff_found", &self.on_result_diff_found.is_some())
            .field("failure_sink", &self.failure_sink.is_some())
            .finish()
    }
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the plain-data knobs from a TOML file. Callbacks are attached
    /// afterwards through the setters.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(StatusError::from)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: DriverConfigFile = toml::from_str(contents)
            .map_err(|e| StatusError::invalid_argument(format!("bad driver config: {e}")))?;
        Ok(Self {
            knobs: file.driver,
            ..Self::default()
        })
    }

    /// Enables or disables `{{a|b}}` alternation expansion. Disable it
    /// when test inputs legitimately contain `{{ }}` constructs. Defaults
    /// to enabled.
    pub fn set_alternations_enabled(mut self, value: bool) -> Self {
        self.knobs.alternations_enabled = value;
        self
    }

    pub fn alternations_enabled(&self) -> bool {
        self.knobs.alternations_enabled
    }

    /// When set to N > 0, every test case that is not at the top of its
    /// file must start with N blank lines; missing ones are added to the
    /// regenerated output and the case fails.
    pub fn set_insert_leading_blank_lines(mut self, value: u32) -> Self {
        self.knobs.insert_leading_blank_lines = value;
        self
    }

    pub fn insert_leading_blank_lines(&self) -> u32 {
        self.knobs.insert_leading_blank_lines
    }

    /// When non-empty, substrings matching this pattern are removed from
    /// copies of both the expected and the actual output before diffing.
    pub fn set_ignore_regex(mut self, value: impl Into<String>) -> Self {
        self.knobs.ignore_regex = value.into();
        self
    }

    pub fn ignore_regex(&self) -> &str {
        &self.knobs.ignore_regex
    }

    /// When set, each diff is reported to the failure sink as a separate
    /// failure; otherwise diffs only go to the log. Defaults to true.
    pub fn set_individual_tests(mut self, value: bool) -> Self {
        self.knobs.individual_tests = value;
        self
    }

    pub fn individual_tests(&self) -> bool {
        self.knobs.individual_tests
    }

    /// When set, a failing test file additionally produces a
    /// `<file>_actual` next to it holding the actual outputs.
    pub fn set_generate_actual_file(mut self, value: bool) -> Self {
        self.knobs.generate_actual_file = value;
        self
    }

    pub fn generate_actual_file(&self) -> bool {
        self.knobs.generate_actual_file
    }

    /// Whether ignored tests are logged as they run. When false, logging
    /// is delayed until the callback has decided whether the test is
    /// ignored. Defaults to true.
    pub fn set_log_ignored_tests(mut self, value: bool) -> Self {
        self.knobs.log_ignored_tests = value;
        self
    }

    pub fn log_ignored_tests(&self) -> bool {
        self.knobs.log_ignored_tests
    }

    /// Invoked exactly once per failed test case, after alternation
    /// coalescing.
    pub fn set_on_result_diff_found(mut self, callback: OnResultDiffFound) -> Self {
        self.on_result_diff_found = Some(callback);
        self
    }

    /// Where failures surface when `individual_tests` is set; without a
    /// sink they go to the error log.
    pub fn set_failure_sink(mut self, sink: FailureSink) -> Self {
        self.failure_sink = Some(sink);
        self
    }

    pub(crate) fn notify_result_diff(&self, diff: &ResultDiff) {
        if let Some(callback) = &self.on_result_diff_found {
            callback(diff);
        }
    }

    /// Routes one failure message to the sink (or the error log).
    pub(crate) fn report_failure(&self, message: &str) {
        match &self.failure_sink {
            Some(sink) => sink(message),
            None => error!("{message}"),
        }
    }
}
