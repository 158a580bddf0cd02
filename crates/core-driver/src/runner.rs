//! The per-file test runner.
//!
//! [`TestFile`] is the immutable parse of one golden file;
//! [`TestFileRunner`] runs its cases, compares actual against expected
//! output, and buffers the regenerated file (expected inputs with actual
//! outputs merged in) until the runner is dropped, at which point the
//! buffer is flushed to the extractable-text log and, on failures, to a
//! `<file>_actual` side file when configured.

use std::collections::VecDeque;
use std::fmt;
use std::path::Path;

use regex::Regex;
use tracing::{error, info, warn};

use core_diff::{UnifiedDiffOptions, unified_diff};
use core_modes::TestCaseOutputs;
use core_status::{Result, StatusError};
use core_testfile::{TestCasePartComments, build_test_file_entry, next_test_case, read_test_file,
                    split_test_file_data};

use crate::alternations::{break_string_into_alternations, run_alternations};
use crate::config::{DriverConfig, ResultDiff};
use crate::result::{RunTestCaseResult, RunTestCaseWithModesResult};

const SAME_AS_PREVIOUS: &str = "[SAME AS PREVIOUS]\n";
/// Upper bound on one extractable-text log message.
const LOG_BUFFER_SIZE: usize = 15000;

/// One parsed test case: its parts, comments and position in the file.
#[derive(Debug, Clone)]
struct RawTestCase {
    start_line: usize,
    parts: Vec<String>,
    comments: Vec<TestCasePartComments>,
}

/// A handle naming one test case of a [`TestFile`]. Handles are plain
/// indices: they stay valid across copies of the file object, which keeps
/// them usable as test-framework parameters.
#[derive(Debug, Clone)]
pub struct TestCaseHandle {
    index: usize,
    name: String,
}

impl TestCaseHandle {
    /// A name containing only alphanumerics and underscores, suitable for
    /// test-framework identifiers.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TestCaseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Immutable representation of one golden test file.
#[derive(Debug, Clone)]
pub struct TestFile {
    filename: String,
    test_cases: Vec<RawTestCase>,
}

impl TestFile {
    /// Reads and parses a test file from disk.
    pub fn from_path(path: &Path) -> Result<TestFile> {
        let lines = read_test_file(path)?;
        Self::from_lines(path.display().to_string(), &lines)
    }

    /// Parses test file contents already in memory; `filename` is used in
    /// logs and diagnostics.
    pub fn from_contents(filename: impl Into<String>, contents: &str) -> Result<TestFile> {
        Self::from_lines(filename.into(), &split_test_file_data(contents))
    }

    fn from_lines(filename: String, lines: &[String]) -> Result<TestFile> {
        let mut test_cases = Vec::new();
        let mut line_number = 0;
        while line_number < lines.len() {
            let start_line = line_number;
            let (parts, comments) = next_test_case(lines, &mut line_number)
                .map_err(|e| e.with_context(format!("in {filename}, line {}", start_line + 1)))?;
            test_cases.push(RawTestCase {
                start_line,
                parts,
                comments,
            });
        }
        Ok(TestFile {
            filename,
            test_cases,
        })
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Handles for every test case in file order.
    pub fn tests(&self) -> Vec<TestCaseHandle> {
        (0..self.test_cases.len())
            .map(|index| TestCaseHandle {
                index,
                name: format!("test_case_{index}"),
            })
            .collect()
    }

    /// Whether any case input contains an alternation group.
    pub fn contains_alternations(&self) -> bool {
        self.test_cases
            .iter()
            .any(|case| break_string_into_alternations(&case.parts[0]).len() > 1)
    }

    /// A runner over this file. The config must outlive the runner.
    pub fn make_runner<'c>(&self, config: &'c DriverConfig) -> TestFileRunner<'c> {
        TestFileRunner::new(self.clone(), config)
    }
}

#[derive(Debug, Default)]
struct BaselineOutput {
    all_output: String,
    all_actual_output: String,
    prev_output: Vec<String>,
}

#[derive(Debug, Default)]
struct ModesOutput {
    all_merged_output: String,
    all_actual_output: String,
    prev_expected_outputs: Option<TestCaseOutputs>,
    prev_merged_outputs: Option<TestCaseOutputs>,
}

/// A runner decides on first use whether it serves plain or mode-aware
/// cases; the two bookkeeping states cannot mix within one file.
#[derive(Debug)]
enum RunnerState {
    Unused,
    Baseline(BaselineOutput),
    Modes(ModesOutput),
}

/// Stateful executor for the cases of one [`TestFile`].
///
/// Owns the file's regeneration buffer and the previous-output memo that
/// serves `[SAME AS PREVIOUS]`, so cases must be run in file order. The
/// buffers are flushed when the runner is dropped.
pub struct TestFileRunner<'c> {
    file: TestFile,
    config: &'c DriverConfig,
    ignore_matcher: Option<Regex>,
    state: RunnerState,
    found_diffs: bool,
}

impl<'c> TestFileRunner<'c> {
    fn new(file: TestFile, config: &'c DriverConfig) -> Self {
        let ignore_matcher = if config.ignore_regex().is_empty() {
            None
        } else {
            match Regex::new(config.ignore_regex()) {
                Ok(matcher) => Some(matcher),
                Err(e) => {
                    error!("invalid ignore_regex '{}': {e}", config.ignore_regex());
                    None
                }
            }
        };
        Self {
            file,
            config,
            ignore_matcher,
            state: RunnerState::Unused,
            found_diffs: false,
        }
    }

    pub fn test_file(&self) -> &TestFile {
        &self.file
    }

    /// Whether any case run so far produced a diff or a caught error.
    pub fn found_diffs(&self) -> bool {
        self.found_diffs
    }

    /// The regenerated file contents accumulated so far: inputs and
    /// comments from the file, outputs as the callbacks produced them.
    pub fn regenerated_output(&self) -> &str {
        match &self.state {
            RunnerState::Unused => "",
            RunnerState::Baseline(state) => &state.all_output,
            RunnerState::Modes(state) => &state.all_merged_output,
        }
    }

    /// The actual outputs accumulated so far (mode-annotated for
    /// mode-aware runs).
    pub fn actual_output(&self) -> &str {
        match &self.state {
            RunnerState::Unused => "",
            RunnerState::Baseline(state) => &state.all_actual_output,
            RunnerState::Modes(state) => &state.all_actual_output,
        }
    }

    /// Runs one plain test case; the callback is invoked once per
    /// alternation. Returns true when the case passed.
    pub fn run_test_case(
        &mut self,
        handle: &TestCaseHandle,
        mut run_test_case: impl FnMut(&str, &mut RunTestCaseResult),
    ) -> bool {
        let Some(case) = self.file.test_cases.get(handle.index).cloned() else {
            self.config
                .report_failure(&format!("stale test case handle {handle}"));
            self.found_diffs = true;
            return false;
        };
        if matches!(self.state, RunnerState::Unused) {
            self.state = RunnerState::Baseline(BaselineOutput::default());
        }
        let RunnerState::Baseline(state) = &mut self.state else {
            error!("runner for {} already ran mode-aware cases", self.file.filename);
            self.found_diffs = true;
            return false;
        };
        let found = run_one_case(
            &self.file.filename,
            case.start_line,
            case.parts,
            case.comments,
            &mut run_test_case,
            state,
            self.config,
            self.ignore_matcher.as_ref(),
        );
        self.found_diffs |= found;
        !found
    }

    /// Runs one mode-aware test case. Returns true when the case passed.
    pub fn run_test_case_with_modes(
        &mut self,
        handle: &TestCaseHandle,
        mut run_test_case: impl FnMut(&str, &mut RunTestCaseWithModesResult),
    ) -> bool {
        let Some(case) = self.file.test_cases.get(handle.index).cloned() else {
            self.config
                .report_failure(&format!("stale test case handle {handle}"));
            self.found_diffs = true;
            return false;
        };
        if matches!(self.state, RunnerState::Unused) {
            self.state = RunnerState::Modes(ModesOutput::default());
        }
        let RunnerState::Modes(state) = &mut self.state else {
            error!("runner for {} already ran plain cases", self.file.filename);
            self.found_diffs = true;
            return false;
        };
        let found = run_one_case_with_modes(
            &self.file.filename,
            case.start_line,
            case.parts,
            case.comments,
            &mut run_test_case,
            state,
            self.config,
            self.ignore_matcher.as_ref(),
        );
        self.found_diffs |= found;
        !found
    }

    fn flush(&mut self) {
        let state = std::mem::replace(&mut self.state, RunnerState::Unused);
        let actual_output = match state {
            RunnerState::Unused => return,
            RunnerState::Baseline(state) => {
                log_extractable_text(&self.file.filename, &state.all_output);
                state.all_actual_output
            }
            RunnerState::Modes(state) => {
                log_extractable_text_with_prefix(
                    &self.file.filename,
                    &state.all_merged_output,
                    "MERGED_TEST_OUTPUT",
                );
                log_extractable_text(&self.file.filename, &state.all_actual_output);
                state.all_actual_output
            }
        };
        if self.config.generate_actual_file() && self.found_diffs {
            let actual_path = format!("{}_actual", self.file.filename);
            if let Err(e) = std::fs::write(&actual_path, actual_output) {
                error!("failed to write {actual_path}: {e}");
            }
        }
    }
}

impl Drop for TestFileRunner<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Runs every test case of every listed file against `run_test_case`,
/// comparing outputs, logging diffs and the regenerated files. Returns
/// true when every case of every file matched its expected output.
pub fn run_test_cases_from_files(
    paths: &[std::path::PathBuf],
    config: &DriverConfig,
    mut run_test_case: impl FnMut(&str, &mut RunTestCaseResult),
) -> bool {
    let mut no_diffs = true;
    if paths.is_empty() {
        error!("no test files given");
        return false;
    }
    for path in paths {
        match TestFile::from_path(path) {
            Ok(file) => {
                info!("Executing tests from file {}", file.filename());
                let mut runner = file.make_runner(config);
                for handle in file.tests() {
                    no_diffs &= runner.run_test_case(&handle, &mut run_test_case);
                }
            }
            Err(e) => {
                error!("failed to load {}: {e}", path.display());
                no_diffs = false;
            }
        }
    }
    no_diffs
}

/// Mode-aware sibling of [`run_test_cases_from_files`]: expected outputs
/// are parsed as [`TestCaseOutputs`] and actual outputs are merged into
/// them before comparison.
pub fn run_test_cases_with_modes_from_files(
    paths: &[std::path::PathBuf],
    config: &DriverConfig,
    mut run_test_case: impl FnMut(&str, &mut RunTestCaseWithModesResult),
) -> bool {
    let mut no_diffs = true;
    if paths.is_empty() {
        error!("no test files given");
        return false;
    }
    for path in paths {
        match TestFile::from_path(path) {
            Ok(file) => {
                info!("Executing tests from file {}", file.filename());
                let mut runner = file.make_runner(config);
                for handle in file.tests() {
                    no_diffs &= runner.run_test_case_with_modes(&handle, &mut run_test_case);
                }
            }
            Err(e) => {
                error!("failed to load {}: {e}", path.display());
                no_diffs = false;
            }
        }
    }
    no_diffs
}

/// Number of test cases across the given files; the number of callback
/// invocations `run_test_cases_from_files` would make (not counting
/// alternation expansion).
pub fn count_test_cases_in_files(paths: &[std::path::PathBuf]) -> Result<u64> {
    let mut total = 0;
    for path in paths {
        let lines = read_test_file(path)?;
        let mut line_number = 0;
        while line_number < lines.len() {
            next_test_case(&lines, &mut line_number)
                .map_err(|e| e.with_context(format!("in {}", path.display())))?;
            total += 1;
        }
    }
    Ok(total)
}

/// Runs one plain case. Returns true when differences were found.
#[allow(clippy::too_many_arguments)]
fn run_one_case(
    filename: &str,
    start_line_number: usize,
    mut parts: Vec<String>,
    mut comments: Vec<TestCasePartComments>,
    run_test_case: &mut dyn FnMut(&str, &mut RunTestCaseResult),
    state: &mut BaselineOutput,
    config: &DriverConfig,
    ignore_matcher: Option<&Regex>,
) -> bool {
    let test_case_log = format!(
        "test case from {filename}, line {}:\n{}",
        start_line_number + 1,
        parts[0]
    );
    let mut ignore_test_output = false;
    let mut matches_requested_same_as_previous = false;
    let mut output: Vec<String>;

    if parts[0].is_empty() && parts.len() == 1 {
        // No input and no expected outputs: treat as passing. With
        // expected outputs present, the callback still runs and sees the
        // empty input.
        info!(
            "Skipping empty test case from {filename}, line {}.",
            start_line_number + 1
        );
        output = parts.clone();
    } else {
        if config.log_ignored_tests() {
            info!("Running {test_case_log}");
        }
        let mut test_result = RunTestCaseResult::default();
        test_result.context.filename = filename.to_string();
        test_result.context.line = start_line_number + 1;
        test_result.context.parts = parts.clone();
        if let Err(e) = run_alternations(
            &mut test_result,
            config.alternations_enabled(),
            run_test_case,
        ) {
            report_case_error(filename, start_line_number, &e, config);
            return true;
        }
        output = test_result.test_outputs().to_vec();
        ignore_test_output = test_result.ignore_test_output();
    }

    // All nonempty output parts end in a newline.
    for output_part in output.iter_mut() {
        if !output_part.is_empty() && !output_part.ends_with('\n') {
            output_part.push('\n');
        }
    }

    let mut update_prev_output = true;
    if ignore_test_output {
        // Pretend the output was correct so the regenerated file keeps the
        // skipped parts; that keeps it diffable against the original.
        if config.log_ignored_tests() {
            info!("Ignoring test result");
        }
        output = parts.clone();
        if parts.len() == 2 && parts[1] == SAME_AS_PREVIOUS {
            update_prev_output = false;
        }
    } else {
        // [SAME AS PREVIOUS] substitutes the previous case's output as the
        // expected output. This is an explicit annotation of semantic
        // equivalence; it is never produced by coincidence.
        if parts.len() == 2 && parts[1] == SAME_AS_PREVIOUS && !state.prev_output.is_empty() {
            parts.truncate(1);
            parts.extend_from_slice(&state.prev_output[1..]);
            if output == parts {
                matches_requested_same_as_previous = true;
            }
        }
        if !config.log_ignored_tests() {
            info!("Executed {test_case_log}");
        }
    }

    if update_prev_output {
        state.prev_output = output.clone();
    }

    let added_blank_lines = add_blank_lines(filename, start_line_number, &mut comments, config);

    let output_string = build_test_file_entry(&output, &comments);
    let expected_string = build_test_file_entry(&parts, &comments);

    let found_diffs = compare_and_append(
        &expected_string,
        &output_string,
        &parts[0],
        matches_requested_same_as_previous,
        filename,
        start_line_number,
        &comments,
        &mut state.all_output,
        config,
        ignore_matcher,
    );
    if !state.all_actual_output.is_empty() {
        state.all_actual_output.push_str("==\n");
    }
    state.all_actual_output.push_str(&output_string);

    found_diffs || added_blank_lines
}

/// Runs one mode-aware case. Returns true when differences were found.
#[allow(clippy::too_many_arguments)]
fn run_one_case_with_modes(
    filename: &str,
    start_line_number: usize,
    parts: Vec<String>,
    mut comments: Vec<TestCasePartComments>,
    run_test_case: &mut dyn FnMut(&str, &mut RunTestCaseWithModesResult),
    state: &mut ModesOutput,
    config: &DriverConfig,
    ignore_matcher: Option<&Regex>,
) -> bool {
    let test_case_log = format!(
        "test case from {filename}, line {}:\n{}",
        start_line_number + 1,
        parts[0]
    );
    let mut ignore_test_output = false;
    let mut matches_requested_same_as_previous = false;
    let mut expected_outputs = TestCaseOutputs::new();
    let mut merged_outputs = TestCaseOutputs::new();
    let mut test_result = RunTestCaseWithModesResult::default();

    if parts[0].is_empty() && parts.len() == 1 {
        info!(
            "Skipping empty test case from {filename}, line {}.",
            start_line_number + 1
        );
    } else {
        if config.log_ignored_tests() {
            info!("Running {test_case_log}");
        }
        if parts.len() == 2
            && parts[1] == SAME_AS_PREVIOUS
            && state.prev_expected_outputs.is_some()
        {
            expected_outputs = state
                .prev_expected_outputs
                .clone()
                .unwrap_or_default();
        } else if let Err(e) = expected_outputs.parse_from(&parts[1..]) {
            report_case_error(filename, start_line_number, &e, config);
            return true;
        }

        test_result.context.filename = filename.to_string();
        test_result.context.line = start_line_number + 1;
        test_result.context.parts = parts.clone();
        if let Err(e) = run_alternations(
            &mut test_result,
            config.alternations_enabled(),
            run_test_case,
        ) {
            report_case_error(filename, start_line_number, &e, config);
            return true;
        }
        if test_result.ignore_test_output() {
            ignore_test_output = true;
        } else {
            match TestCaseOutputs::merge_outputs(
                &expected_outputs,
                std::slice::from_ref(test_result.test_case_outputs()),
            ) {
                Ok(merged) => merged_outputs = merged,
                Err(e) => {
                    report_case_error(filename, start_line_number, &e, config);
                    return true;
                }
            }
        }
    }

    let mut update_prev_output = true;
    if ignore_test_output {
        if config.log_ignored_tests() {
            info!("Ignoring test result");
        }
        merged_outputs = expected_outputs.clone();
        if parts.len() == 2 && parts[1] == SAME_AS_PREVIOUS {
            update_prev_output = false;
        }
    } else {
        if parts.len() == 2 && parts[1] == SAME_AS_PREVIOUS {
            if let Some(prev_merged) = &state.prev_merged_outputs {
                if *prev_merged == merged_outputs {
                    matches_requested_same_as_previous = true;
                }
            }
        }
        if !config.log_ignored_tests() {
            info!("Executed {test_case_log}");
        }
    }

    if update_prev_output {
        state.prev_expected_outputs = Some(expected_outputs.clone());
        state.prev_merged_outputs = Some(merged_outputs.clone());
    }

    let build_parts = |outputs: &TestCaseOutputs, include_possible_modes: bool| -> Result<Vec<String>> {
        let mut rendered = vec![parts[0].clone()];
        rendered.extend(outputs.get_combined_outputs(include_possible_modes)?);
        Ok(rendered)
    };
    type RenderedParts = (Vec<String>, Vec<String>, Vec<String>);
    let rendered = (|| -> Result<RenderedParts> {
        let expected_parts = build_parts(&expected_outputs, false)?;
        let merged_parts = build_parts(&merged_outputs, false)?;
        let actual_parts = build_parts(test_result.test_case_outputs(), true)?;
        Ok((expected_parts, merged_parts, actual_parts))
    })();
    let (expected_parts, merged_parts, actual_parts) = match rendered {
        Ok(rendered) => rendered,
        Err(e) => {
            report_case_error(filename, start_line_number, &e, config);
            return true;
        }
    };

    let added_blank_lines = add_blank_lines(filename, start_line_number, &mut comments, config);

    let output_string = build_test_file_entry(&merged_parts, &comments);
    let expected_string = build_test_file_entry(&expected_parts, &comments);
    let actual_output_string = build_test_file_entry(&actual_parts, &comments);

    let found_diffs = compare_and_append(
        &expected_string,
        &output_string,
        &parts[0],
        matches_requested_same_as_previous,
        filename,
        start_line_number,
        &comments,
        &mut state.all_merged_output,
        config,
        ignore_matcher,
    ) || added_blank_lines;

    if !state.all_actual_output.is_empty() {
        state.all_actual_output.push_str("==\n");
    }
    state.all_actual_output.push_str(&actual_output_string);
    found_diffs
}

fn report_case_error(
    filename: &str,
    start_line_number: usize,
    error: &StatusError,
    config: &DriverConfig,
) {
    let message = format!(
        "Error in test case from {filename}, line {}: {error}",
        start_line_number + 1
    );
    if config.individual_tests() {
        config.report_failure(&message);
    } else {
        error!("{message}");
    }
}

/// Enforces the leading-blank-line policy on a non-initial case. Returns
/// true when lines had to be added, which fails the case so goldens get
/// updated.
fn add_blank_lines(
    filename: &str,
    start_line_number: usize,
    comments: &mut [TestCasePartComments],
    config: &DriverConfig,
) -> bool {
    let required = config.insert_leading_blank_lines() as usize;
    if required == 0 || start_line_number == 0 {
        return false;
    }
    let mut added_lines = false;
    let required_prefix = "\n".repeat(required);
    while !comments[0].start_comment.starts_with(&required_prefix) {
        comments[0].start_comment.insert(0, '\n');
        if config.individual_tests() {
            config.report_failure(&format!(
                "Test without leading blank line in {filename}, line {}",
                start_line_number + 1
            ));
        } else {
            info!(
                "Test without leading blank line in {filename}, line {}",
                start_line_number + 1
            );
        }
        added_lines = true;
    }
    added_lines
}

/// Compares expected against actual, reports any diff, and appends the
/// regenerated entry to `all_output`. Returns true when a diff was found.
#[allow(clippy::too_many_arguments)]
fn compare_and_append(
    expected_string: &str,
    output_string: &str,
    test_string: &str,
    matches_requested_same_as_previous: bool,
    filename: &str,
    start_line_number: usize,
    comments: &[TestCasePartComments],
    all_output: &mut String,
    config: &DriverConfig,
    ignore_matcher: Option<&Regex>,
) -> bool {
    let mut found_diffs = false;

    // With ignore_regex set, matching substrings are neutralized on copies
    // of both sides before diffing. Removal can join text across line
    // boundaries; that is the documented behavior, so only warn.
    let (expected_for_diff, output_for_diff) = match ignore_matcher {
        Some(matcher) => (
            matcher.replace_all(expected_string, "").into_owned(),
            matcher.replace_all(output_string, "").into_owned(),
        ),
        None => (expected_string.to_string(), output_string.to_string()),
    };
    if expected_for_diff != expected_string {
        warn!("Expected output is modified for diff because of the ignore_regex setting");
    }
    if output_for_diff != output_string {
        warn!("Generated output from test case is modified for diff because of the ignore_regex setting");
    }

    if expected_for_diff != output_for_diff {
        let diff = unified_diff(
            &expected_for_diff,
            &output_for_diff,
            &format!("expected/{filename}"),
            &format!("actual/{filename}"),
            &UnifiedDiffOptions::new().set_context_size(5),
        );
        found_diffs = true;
        config.notify_result_diff(&ResultDiff {
            unified_diff: diff.clone(),
            expected: expected_string.to_string(),
            actual: output_string.to_string(),
            file_path: filename.to_string(),
            start_line_number,
        });
        if config.individual_tests() {
            config.report_failure(&format!(
                "\n\n******************* BEGIN TEST DIFF ********************\n\
                 Failure in {filename}, line {}:\n\n\
                 =================== DIFF ===============================\n\
                 {diff}",
                start_line_number + 1
            ));
            // A separate message so long outputs do not truncate the diff.
            config.report_failure(&format!(
                "=================== EXPECTED ===========================\n\
                 {expected_string}\
                 =================== ACTUAL =============================\n\
                 {output_string}\
                 ******************* END TEST DIFF **********************\n\n"
            ));
        } else {
            warn!(
                "\n\n******************* BEGIN TEST DIFF ********************\n\
                 Failure in {filename}, line {}:\n\
                 =================== EXPECTED ===========================\n\
                 {expected_string}\
                 =================== ACTUAL =============================\n\
                 {output_string}",
                start_line_number + 1
            );
            warn!(
                "\n=================== DIFF ===============================\n\
                 {diff}\
                 ******************* END TEST DIFF **********************\n\n"
            );
        }
    }

    if !all_output.is_empty() {
        all_output.push_str("==\n");
    }
    if matches_requested_same_as_previous {
        all_output.push_str(&build_test_file_entry(
            &[test_string.to_string(), SAME_AS_PREVIOUS.to_string()],
            comments,
        ));
    } else {
        all_output.push_str(output_string);
    }
    found_diffs
}

/// Writes `text` to the info log in extractable blocks delimited by
/// `****TEST_OUTPUT_BEGIN****`/`****TEST_OUTPUT_END****` marker lines, so
/// regenerated goldens can be recovered from logs. Long texts split into
/// multiple blocks below the log-message size limit; over-long single
/// lines are cut with a `***MERGE_TOO_LONG_LINE***` marker.
pub fn log_extractable_text(file_path: &str, text: &str) {
    log_extractable_text_with_prefix(file_path, text, "TEST_OUTPUT");
}

fn log_extractable_text_with_prefix(file_path: &str, text: &str, test_output_prefix: &str) {
    let mut output_lines: VecDeque<&str> = text.split('\n').collect();
    // A trailing newline produces one empty line too many.
    if output_lines.back() == Some(&"") {
        output_lines.pop_back();
    }
    let mut first_output_block = true;
    while !output_lines.is_empty() {
        let mut this_output = String::new();
        while let Some(&front) = output_lines.front() {
            let padding = 500;
            if this_output.len() + front.len() + file_path.len() + padding > LOG_BUFFER_SIZE {
                if this_output.is_empty() && !front.is_empty() {
                    // A single line too long for one block: cut it and
                    // mark the cut for the log extractor.
                    let mut prefix_len = LOG_BUFFER_SIZE
                        .saturating_sub(file_path.len() + padding)
                        .max(1)
                        .min(front.len());
                    while !front.is_char_boundary(prefix_len) {
                        prefix_len -= 1;
                    }
                    this_output.push_str(&front[..prefix_len]);
                    this_output.push_str("\n***MERGE_TOO_LONG_LINE***\n");
                    output_lines[0] = &front[prefix_len..];
                }
                break;
            }
            this_output.push_str(front);
            this_output.push('\n');
            output_lines.pop_front();
        }
        if this_output.is_empty() {
            // Pathologically long file paths leave no room at all; drain a
            // line anyway so the loop terminates.
            if let Some(front) = output_lines.pop_front() {
                this_output.push_str(front);
                this_output.push('\n');
            }
        }
        info!(
            "\n****{test_output_prefix}_BEGIN**** {}{file_path}\n{this_output}****{test_output_prefix}_END****\n",
            if first_output_block { "NEW_TEST_RUN " } else { "" }
        );
        first_output_block = false;
    }
}
