//! The mode-aware output store for one test case.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use core_status::{Result, StatusError, ensure_internal};

use crate::mode::{TestCaseMode, TestCaseModeSet};

const POSSIBLE_MODES_PREFIX: &str = "Possible Modes:";

/// Matches an output header line: `<result type>[mode 1][mode 2]...`.
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([^>]*)>(.*)$").expect("header regex"));

/// The outputs of a single mode: result type to text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeResults {
    result_type_to_output: BTreeMap<String, String>,
}

impl ModeResults {
    /// The text recorded for `result_type`, if any.
    pub fn get(&self, result_type: &str) -> Option<&str> {
        self.result_type_to_output.get(result_type).map(String::as_str)
    }

    /// Adds `output` for `result_type` unless one exists. Returns whether
    /// it was added.
    #[must_use]
    fn add_output(&mut self, result_type: &str, output: &str) -> bool {
        if self.result_type_to_output.contains_key(result_type) {
            return false;
        }
        self.result_type_to_output
            .insert(result_type.to_string(), output.to_string());
        true
    }

    /// Removes the output for `result_type`. Returns whether it existed.
    #[must_use]
    fn remove_result_type(&mut self, result_type: &str) -> bool {
        self.result_type_to_output.remove(result_type).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.result_type_to_output.is_empty()
    }

    /// Iterates `(result_type, output)` pairs in result-type order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.result_type_to_output
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Parse result for the first line of an expected-output part.
struct FirstLine<'a> {
    /// True when the line is a `Possible Modes:` declaration.
    is_possible_modes: bool,
    result_type: String,
    test_modes: Vec<TestCaseMode>,
    /// Everything after the consumed header; the whole part when the first
    /// line carried no header.
    remainder: &'a str,
}

/// Pulls the first line off `part` and interprets it. Recognized shapes:
/// `Possible Modes: [m1][m2]...`, `<result type>[m1][m2]...`,
/// `<>[m1][m2]...`, `<result type>`; anything else means the part has no
/// header and is all text.
fn parse_first_line(part: &str) -> Result<FirstLine<'_>> {
    let first_line = part.split('\n').next().unwrap_or(part);
    let stripped = first_line.trim_start();

    let (is_possible_modes, result_type, modes_str) =
        if let Some(rest) = stripped.strip_prefix(POSSIBLE_MODES_PREFIX) {
            (true, String::new(), rest)
        } else if let Some(captures) = HEADER.captures(stripped) {
            (false, captures[1].to_string(), captures.get(2).map_or("", |m| m.as_str()))
        } else {
            return Ok(FirstLine {
                is_possible_modes: false,
                result_type: String::new(),
                test_modes: Vec::new(),
                remainder: part,
            });
        };

    // The modes string is only borrowed from `stripped` for parsing; the
    // remainder skips the entire first line.
    let test_modes = TestCaseMode::parse_modes(modes_str)
        .map_err(|e| e.with_context(first_line))?;
    let mut remainder = &part[first_line.len()..];
    if let Some(rest) = remainder.strip_prefix('\n') {
        remainder = rest;
    }
    Ok(FirstLine {
        is_possible_modes,
        result_type,
        test_modes,
        remainder,
    })
}

/// The outputs of one test case, keyed by mode and result type.
///
/// The hierarchy is mode → result type → output text. The empty mode means
/// "all modes"; the empty result type is the main output. At most one
/// output may exist per (mode, result type) pair, and an all-modes entry
/// for a result type excludes mode-specific entries for the same result
/// type (and vice versa).
///
/// The text format combines outputs that are identical across modes; a
/// combined output's first line names its result type and modes:
///
/// ```text
/// <>[mode A][mode B]
/// main output for modes A and B
/// --
/// <result type 1>[mode A]
/// output A1
/// --
/// <result type 3>
/// all-modes output for result type 3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCaseOutputs {
    outputs: BTreeMap<TestCaseMode, ModeResults>,
    disabled_modes: TestCaseModeSet,
    possible_modes: TestCaseModeSet,
}

impl TestCaseOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }

    /// Iterates `(mode, results)` pairs in mode order.
    pub fn iter(&self) -> impl Iterator<Item = (&TestCaseMode, &ModeResults)> {
        self.outputs.iter()
    }

    /// The results recorded for one mode.
    pub fn mode_results(&self, mode: &TestCaseMode) -> Option<&ModeResults> {
        self.outputs.get(mode)
    }

    pub fn possible_modes(&self) -> &TestCaseModeSet {
        &self.possible_modes
    }

    pub fn disabled_modes(&self) -> &TestCaseModeSet {
        &self.disabled_modes
    }

    /// Records a test output for `test_mode` and `result_type`, appending
    /// a trailing newline to non-empty text that lacks one.
    ///
    /// `test_mode` must not be the all-modes mode here; all-modes rows
    /// only come from parsing or from merging. Fails when the pair already
    /// has an output, when `test_mode` is outside a non-empty possible
    /// set, or when an all-modes output exists for `result_type`.
    pub fn record_output(
        &mut self,
        test_mode: &TestCaseMode,
        result_type: &str,
        output: &str,
    ) -> Result<()> {
        ensure_internal!(
            !test_mode.is_empty(),
            "cannot record an output under the all-modes mode"
        );
        let mut output_with_newline = output.to_string();
        if !output.is_empty() && !output.ends_with('\n') {
            output_with_newline.push('\n');
        }
        self.add_output_internal(test_mode, result_type, &output_with_newline)
    }

    fn add_output_internal(
        &mut self,
        test_mode: &TestCaseMode,
        result_type: &str,
        output: &str,
    ) -> Result<()> {
        if let Some(found) = self.outputs.get(test_mode).and_then(|m| m.get(result_type)) {
            return Err(StatusError::unknown(format!(
                "An output already exists for mode '{test_mode}', result type \
                 '{result_type}':\nfirst output:\n{found}\nsecond output:\n{output}"
            )));
        }
        if !test_mode.is_empty() {
            if !self.possible_modes.is_empty() && !self.possible_modes.contains(test_mode) {
                return Err(StatusError::unknown(format!(
                    "Cannot add output:\n{output}\nfor mode '{test_mode}' and result type \
                     '{result_type}'\nbecause mode '{test_mode}' does not exist in the possible \
                     modes list: '{}'.",
                    join_modes(&self.possible_modes)
                )));
            }
            if let Some(found) = self
                .outputs
                .get(&TestCaseMode::all_modes())
                .and_then(|m| m.get(result_type))
            {
                return Err(StatusError::unknown(format!(
                    "Cannot add output for mode '{test_mode}' and result type '{result_type}' \
                     because an 'all modes' output exists for the result type:\nall modes \
                     output:\n{found}"
                )));
            }
        } else {
            for (mode, mode_results) in &self.outputs {
                if mode.is_empty() {
                    continue;
                }
                if let Some(found) = mode_results.get(result_type) {
                    return Err(StatusError::unknown(format!(
                        "Cannot add all modes output for result type '{result_type}' because a \
                         '{mode}' output already exists for the result type\nmode specific \
                         output:\n{found}"
                    )));
                }
            }
        }
        let added = self
            .outputs
            .entry(test_mode.clone())
            .or_default()
            .add_output(result_type, output);
        ensure_internal!(added, "output insertion raced an existence check");
        Ok(())
    }

    /// Disables a mode, removing any outputs recorded for it.
    pub fn disable_test_mode(&mut self, disabled_mode: &TestCaseMode) {
        self.disabled_modes.insert(disabled_mode.clone());
        self.outputs.remove(disabled_mode);
    }

    /// Sets the possible modes. Modes must be non-empty, and the set must
    /// cover every mode already present in the outputs.
    pub fn set_possible_modes(&mut self, possible_modes: TestCaseModeSet) -> Result<()> {
        self.possible_modes = possible_modes;
        if self.possible_modes.is_empty() {
            return Ok(());
        }
        ensure_internal!(
            !self.possible_modes.contains(&TestCaseMode::all_modes()),
            "the all-modes mode cannot be a possible mode"
        );
        self.validate_possible_modes()
    }

    fn validate_possible_modes(&self) -> Result<()> {
        for mode in self.outputs.keys() {
            if !mode.is_empty() && !self.possible_modes.contains(mode) {
                return Err(StatusError::unknown(format!(
                    "Cannot set possible modes to '{}' because mode '{mode}' exists in the actual \
                     output but does not exist in the possible modes.",
                    join_modes(&self.possible_modes)
                )));
            }
        }
        Ok(())
    }

    /// Parses test outputs from expected-output parts. Each part holds one
    /// output, optionally introduced by a result-type/modes header, or a
    /// `Possible Modes:` declaration.
    pub fn parse_from(&mut self, parts: &[String]) -> Result<()> {
        for part in parts {
            let parsed = parse_first_line(part)?;
            if parsed.is_possible_modes {
                self.possible_modes.extend(parsed.test_modes);
                continue;
            }
            let output = parsed.remainder;
            if parsed.test_modes.is_empty() {
                self.add_output_internal(&TestCaseMode::all_modes(), &parsed.result_type, output)
                    .map_err(|e| e.with_context(part))?;
            } else {
                for test_mode in &parsed.test_modes {
                    self.add_output_internal(test_mode, &parsed.result_type, output)
                        .map_err(|e| e.with_context(part))?;
                }
            }
        }
        Ok(())
    }

    /// Renders the outputs back into parts, combining modes with identical
    /// text per result type. The inverse of [`Self::parse_from`].
    ///
    /// Parts are ordered by result type, then by the rendered text. With
    /// `include_possible_modes`, a non-empty possible set is emitted as
    /// the leading part.
    pub fn get_combined_outputs(&self, include_possible_modes: bool) -> Result<Vec<String>> {
        // Transpose [mode -> [result_type -> output]] into
        // [result_type -> [output -> modes]] so equal texts combine.
        let mut result_type_to_output_modes: BTreeMap<&str, BTreeMap<&str, TestCaseModeSet>> =
            BTreeMap::new();
        for (test_mode, mode_results) in &self.outputs {
            for (result_type, output) in mode_results.iter() {
                result_type_to_output_modes
                    .entry(result_type)
                    .or_default()
                    .entry(output)
                    .or_default()
                    .insert(test_mode.clone());
            }
        }

        let mut combined_outputs = Vec::new();
        if include_possible_modes && !self.possible_modes.is_empty() {
            combined_outputs.push(format!(
                "{POSSIBLE_MODES_PREFIX} {}\n",
                TestCaseMode::collapse_modes(&self.possible_modes)
            ));
        }
        for (result_type, output_modes_map) in &result_type_to_output_modes {
            let mut outputs_for_result_type = Vec::new();
            for (output, modes) in output_modes_map {
                ensure_internal!(!modes.is_empty(), "combined output lost its modes");
                let mut output_str = String::new();
                let first_mode_is_empty = modes.iter().next().is_some_and(TestCaseMode::is_empty);
                if !result_type.is_empty() || !first_mode_is_empty {
                    output_str.push('<');
                    output_str.push_str(result_type);
                    output_str.push('>');
                }
                output_str.push_str(&TestCaseMode::collapse_modes(modes));
                if !output_str.is_empty() {
                    output_str.push('\n');
                }
                output_str.push_str(output);
                outputs_for_result_type.push(output_str);
            }
            outputs_for_result_type.sort();
            combined_outputs.append(&mut outputs_for_result_type);
        }
        Ok(combined_outputs)
    }

    /// All the modes this output set speaks for: the possible modes when
    /// declared, otherwise the modes with recorded outputs.
    pub fn test_modes(&self) -> TestCaseModeSet {
        if !self.possible_modes.is_empty() {
            return self.possible_modes.clone();
        }
        self.outputs
            .keys()
            .filter(|m| !m.is_empty())
            .cloned()
            .collect()
    }

    fn has_all_modes_result(&self) -> bool {
        self.outputs.contains_key(&TestCaseMode::all_modes())
    }

    /// Replaces the all-modes row with per-mode copies for every mode in
    /// `test_modes`, making per-mode mutation uniform.
    fn break_out_all_modes_outputs(&mut self, test_modes: &TestCaseModeSet) -> Result<()> {
        let Some(all_modes_results) = self.outputs.remove(&TestCaseMode::all_modes()) else {
            return Ok(());
        };
        for (result_type, output) in all_modes_results.iter() {
            for test_mode in test_modes {
                let added = self
                    .outputs
                    .entry(test_mode.clone())
                    .or_default()
                    .add_output(result_type, output);
                ensure_internal!(
                    added,
                    "breaking out all-modes output collided for mode '{test_mode}'"
                );
            }
        }
        Ok(())
    }

    /// For every result type whose text is identical across all of
    /// `test_modes`, replaces the per-mode rows with a single all-modes
    /// row. The inverse of [`Self::break_out_all_modes_outputs`].
    fn generate_all_modes_outputs(&mut self, test_modes: &TestCaseModeSet) -> Result<()> {
        let mut result_type_to_output_modes: BTreeMap<String, BTreeMap<String, TestCaseModeSet>> =
            BTreeMap::new();
        for (test_mode, mode_results) in &self.outputs {
            ensure_internal!(
                test_modes.contains(test_mode),
                "output recorded for unknown mode '{test_mode}'"
            );
            for (result_type, output) in mode_results.iter() {
                result_type_to_output_modes
                    .entry(result_type.to_string())
                    .or_default()
                    .entry(output.to_string())
                    .or_default()
                    .insert(test_mode.clone());
            }
        }

        for (result_type, output_modes_map) in &result_type_to_output_modes {
            for (output, modes) in output_modes_map {
                if modes != test_modes {
                    continue;
                }
                let added = self
                    .outputs
                    .entry(TestCaseMode::all_modes())
                    .or_default()
                    .add_output(result_type, output);
                ensure_internal!(added, "all-modes row already present for '{result_type}'");
                for mode in test_modes {
                    let Some(mode_results) = self.outputs.get_mut(mode) else {
                        return Err(StatusError::internal(format!(
                            "mode '{mode}' vanished while regenerating all-modes outputs"
                        )));
                    };
                    let removed = mode_results.remove_result_type(result_type);
                    ensure_internal!(removed, "mode '{mode}' lost result type '{result_type}'");
                    if mode_results.is_empty() {
                        self.outputs.remove(mode);
                    }
                }
            }
        }
        Ok(())
    }

    /// Replaces this set's outputs for every mode of `outputs` that is in
    /// `test_modes` with the rows from `outputs`.
    fn insert_or_update_outputs_for_test_modes(
        &mut self,
        outputs: &TestCaseOutputs,
        test_modes: &TestCaseModeSet,
    ) {
        for (mode, mode_results) in &outputs.outputs {
            if test_modes.contains(mode) {
                self.outputs.insert(mode.clone(), mode_results.clone());
            }
        }
    }

    /// Merges actual outputs into an expected set.
    ///
    /// The actuals must be mode-specific (no all-modes rows) and agree on
    /// their declared possible modes. Modes disabled by any actual are
    /// erased; all-modes rows of the expected set are broken out over the
    /// union of known modes, overwritten per mode from the actuals, then
    /// recombined. An empty actual list leaves the expected outputs
    /// untouched.
    pub fn merge_outputs(
        expected_outputs: &TestCaseOutputs,
        actual_outputs: &[TestCaseOutputs],
    ) -> Result<TestCaseOutputs> {
        // Possible modes from the actuals must agree.
        let mut possible_modes = TestCaseModeSet::new();
        let mut possible_modes_source: Option<&TestCaseOutputs> = None;
        for outputs in actual_outputs {
            if outputs.possible_modes.is_empty() {
                continue;
            }
            match possible_modes_source {
                None => {
                    possible_modes = outputs.possible_modes.clone();
                    possible_modes_source = Some(outputs);
                }
                Some(source) => {
                    if possible_modes != outputs.possible_modes {
                        return Err(StatusError::unknown(format!(
                            "Cannot merge the following two outputs because their possible modes \
                             lists are different:\nFirst possible modes:\n{}\nSecond possible \
                             modes:\n{}\nFirst outputs:\n{}\nSecond outputs:\n{}",
                            join_modes(&source.possible_modes),
                            join_modes(&outputs.possible_modes),
                            source.get_combined_outputs(true)?.join("--\n"),
                            outputs.get_combined_outputs(true)?.join("--\n")
                        )));
                    }
                }
            }
        }

        // Collect the mode universe and the disabled modes.
        let mut test_modes = expected_outputs.test_modes();
        let mut disabled_modes = TestCaseModeSet::new();
        let mut has_actual_output = false;
        for outputs in actual_outputs {
            if outputs.has_all_modes_result() {
                return Err(StatusError::unknown(format!(
                    "Cannot merge partition output because it contains 'all modes' result:\n{}",
                    outputs.get_combined_outputs(false)?.join("\n--\n")
                )));
            }
            test_modes.extend(outputs.test_modes());
            disabled_modes.extend(outputs.disabled_modes.iter().cloned());
            if !outputs.outputs.is_empty() {
                has_actual_output = true;
            }
        }

        // With possible modes declared, everything outside them counts as
        // disabled.
        if !possible_modes.is_empty() {
            for mode in &test_modes {
                if !possible_modes.contains(mode) {
                    disabled_modes.insert(mode.clone());
                }
            }
        }
        for disabled_mode in &disabled_modes {
            test_modes.remove(disabled_mode);
        }

        let mut merged_outputs = expected_outputs.clone();
        for disabled_mode in &disabled_modes {
            merged_outputs.disable_test_mode(disabled_mode);
        }

        // Without actual output, keep the expected outputs as they are;
        // breaking out and regenerating could otherwise drop a lone
        // all-modes row.
        if !has_actual_output {
            return Ok(merged_outputs);
        }

        merged_outputs.break_out_all_modes_outputs(&test_modes)?;
        for outputs in actual_outputs {
            merged_outputs.insert_or_update_outputs_for_test_modes(outputs, &test_modes);
        }
        merged_outputs.generate_all_modes_outputs(&test_modes)?;
        Ok(merged_outputs)
    }
}

fn join_modes(modes: &TestCaseModeSet) -> String {
    modes
        .iter()
        .map(TestCaseMode::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
