//! Alternation expansion and result coalescing.
//!
//! An alternation like `{{a|b}}` in a test input multiplexes the case into
//! one execution per value; multiple groups form the cross product. After
//! running, executions with equal results are merged back into groups so
//! the regenerated file stays compact.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::info;

use core_modes::{TestCaseMode, TestCaseModeSet, TestCaseOutputs};
use core_status::{Result, StatusError, ensure_internal};

use crate::result::{RunTestCaseResult, RunTestCaseWithModesResult};

/// Display name for an empty alternation value in group headers.
const EMPTY_ALTERNATION_NAME: &str = "<empty>";
/// Display name for an empty alternation value in result-type suffixes,
/// where `<`/`>` are not allowed.
const EMPTY_ALTERNATION_NAME_FOR_MODES: &str = "EMPTY";

/// Finds one alternation group. Non-greedy, and `.` does not cross
/// newlines, so the shortest `{{...}}` on a single line wins; a `{{` whose
/// `}}` is on another line stays literal.
static ALTERNATION_GROUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("alternation regex"));

/// Characters that cannot be stored in a result-type annotation.
static INVALID_ALTERNATION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\n{}<>]").expect("alternation name regex"));

/// Splits alternation group content on `|`. `\|` produces a literal pipe;
/// all other escape sequences pass through untouched.
fn split_alternation_values(content: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('|') => current.push('|'),
                Some(other) => {
                    current.push('\\');
                    current.push(other);
                }
                None => current.push('\\'),
            },
            '|' => values.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    values.push(current);
    values
}

fn break_into_alternations_impl(
    input: &str,
    selected_values: &str,
    out: &mut Vec<(String, String)>,
) {
    let Some(found) = ALTERNATION_GROUP.captures(input) else {
        out.push((selected_values.to_string(), input.to_string()));
        return;
    };
    let group = found.get(0).expect("group 0 always exists");
    let content = found.get(1).map_or("", |m| m.as_str());

    for value in split_alternation_values(content) {
        let mut substituted = String::with_capacity(input.len());
        substituted.push_str(&input[..group.start()]);
        substituted.push_str(&value);
        substituted.push_str(&input[group.end()..]);
        let selected = if selected_values.is_empty() {
            value
        } else {
            format!("{selected_values},{value}")
        };
        break_into_alternations_impl(&substituted, &selected, out);
    }
}

/// Expands all alternation groups in `input` into the cross product of
/// their values, leftmost group varying slowest. Each element pairs the
/// comma-joined chosen values (the alternation label) with the input text
/// after substitution. An input without alternations yields a single
/// expansion with an empty label.
pub fn break_string_into_alternations(input: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    break_into_alternations_impl(input, "", &mut out);
    out
}

/// Glue between [`run_alternations`] and the two result flavors.
pub(crate) trait AlternationRun: Sized {
    type Collector: Default;

    fn is_empty(&self) -> bool;
    fn ignore_test_output(&self) -> bool;
    fn set_ignore_test_output(&mut self, value: bool);
    fn input(&self) -> &str;
    /// A fresh result carrying this result's case description and the
    /// given alternation label.
    fn make_sub_result(&self, test_alternation: &str) -> Self;
    fn record(collector: &mut Self::Collector, name: &str, result: &Self) -> Result<()>;
    fn finish(collector: Self::Collector, result: &mut Self) -> Result<()>;
}

/// Expands the alternations of `result`'s input, invokes the callback once
/// per expansion, and coalesces the collected outputs back into `result`.
pub(crate) fn run_alternations<R: AlternationRun>(
    result: &mut R,
    alternations_enabled: bool,
    run_test_case: &mut dyn FnMut(&str, &mut R),
) -> Result<()> {
    ensure_internal!(result.is_empty(), "alternations need an empty result to run into");

    let expansions = if alternations_enabled {
        break_string_into_alternations(result.input())
    } else {
        vec![(String::new(), result.input().to_string())]
    };

    // Ignore results by default; any alternation that is not ignored
    // flips the case back to being compared.
    result.set_ignore_test_output(true);

    let mut collector = R::Collector::default();
    for (test_alternation, test_case) in &expansions {
        if expansions.len() != 1 {
            info!("Running alternation {test_alternation}");
        }
        let mut sub_result = result.make_sub_result(test_alternation);
        run_test_case(test_case, &mut sub_result);
        if !sub_result.ignore_test_output() {
            result.set_ignore_test_output(false);
            R::record(&mut collector, test_alternation, &sub_result)?;
        }
    }
    R::finish(collector, result)
}

/// Collects per-alternation outputs of plain runs and merges them into a
/// single output list, grouping alternations with equal outputs.
#[derive(Debug, Default)]
pub(crate) struct AlternationSet {
    /// Results to the (sorted) indices of the alternations that produced
    /// them; indices keep the merged output in generation order.
    alternation_map: BTreeMap<Vec<String>, Vec<usize>>,
    alternation_names: Vec<String>,
}

impl AlternationRun for RunTestCaseResult {
    type Collector = AlternationSet;

    fn is_empty(&self) -> bool {
        RunTestCaseResult::is_empty(self)
    }

    fn ignore_test_output(&self) -> bool {
        RunTestCaseResult::ignore_test_output(self)
    }

    fn set_ignore_test_output(&mut self, value: bool) {
        RunTestCaseResult::set_ignore_test_output(self, value);
    }

    fn input(&self) -> &str {
        &self.context.parts[0]
    }

    fn make_sub_result(&self, test_alternation: &str) -> Self {
        let mut context = self.context.clone();
        context.ignore_test_output = false;
        context.test_alternation = test_alternation.to_string();
        Self::with_context(context)
    }

    fn record(collector: &mut AlternationSet, name: &str, result: &Self) -> Result<()> {
        collector
            .alternation_map
            .entry(result.test_outputs().to_vec())
            .or_default()
            .push(collector.alternation_names.len());
        collector.alternation_names.push(if name.is_empty() {
            EMPTY_ALTERNATION_NAME.to_string()
        } else {
            name.to_string()
        });
        Ok(())
    }

    fn finish(collector: AlternationSet, result: &mut Self) -> Result<()> {
        let input = result.context.parts[0].clone();
        let test_outputs = result.test_outputs_mut();
        ensure_internal!(test_outputs.is_empty(), "coalescing into a non-empty result");

        // A single distinct result passes through untouched. Otherwise
        // each group of alternations sharing a result gets a header,
        // ordered by the first generation index of any member.
        let AlternationSet {
            alternation_map,
            alternation_names,
        } = collector;
        if alternation_map.len() <= 1 {
            if let Some((outputs, _)) = alternation_map.into_iter().next() {
                *test_outputs = outputs;
            }
        } else {
            let mut transposed: BTreeMap<Vec<usize>, Vec<String>> = BTreeMap::new();
            for (outputs, indices) in alternation_map {
                transposed.insert(indices, outputs);
            }
            for (indices, group_output) in transposed {
                let names: Vec<&str> = indices
                    .iter()
                    .map(|&idx| alternation_names[idx].as_str())
                    .collect();
                if names.len() > 1 {
                    test_outputs.push(format!("ALTERNATION GROUPS:\n    {}", names.join("\n    ")));
                } else {
                    test_outputs.push(format!("ALTERNATION GROUP: {}", names[0]));
                }
                test_outputs.extend(group_output);
            }
        }
        test_outputs.insert(0, input);
        Ok(())
    }
}

/// Collects per-alternation [`TestCaseOutputs`] and merges them, keyed by
/// (mode, result type), annotating result types with alternation groups
/// where the outputs differ.
#[derive(Debug, Default)]
pub(crate) struct AlternationSetWithModes {
    alternations: Vec<(String, TestCaseOutputs)>,
}

impl AlternationSetWithModes {
    /// The union of modes across all alternations; also transfers the
    /// (consistent) possible modes into `outputs`.
    fn collect_modes(&self, outputs: &mut TestCaseOutputs) -> Result<TestCaseModeSet> {
        let mut first = true;
        let mut all_modes = TestCaseModeSet::new();
        for (_, alternation_outputs) in &self.alternations {
            if first {
                outputs.set_possible_modes(alternation_outputs.possible_modes().clone())?;
                first = false;
            } else if outputs.possible_modes() != alternation_outputs.possible_modes() {
                return Err(StatusError::unknown(format!(
                    "Different possible modes for different alternations are not allowed: \
                     {{{}}} vs {{{}}}",
                    join_modes(outputs.possible_modes()),
                    join_modes(alternation_outputs.possible_modes())
                )));
            }
            for (mode, _) in alternation_outputs.iter() {
                all_modes.insert(mode.clone());
            }
        }
        Ok(all_modes)
    }

    /// Adds the outputs for one mode, grouping alternations by output text
    /// per result type.
    fn build_single_mode(&self, mode: &TestCaseMode, outputs: &mut TestCaseOutputs) -> Result<()> {
        // result type -> output text -> alternation names.
        let mut result_type_to_output_map: BTreeMap<&str, BTreeMap<&str, Vec<&str>>> =
            BTreeMap::new();
        for (name, alternation_outputs) in &self.alternations {
            let Some(mode_results) = alternation_outputs.mode_results(mode) else {
                return Err(StatusError::internal(format!(
                    "alternation '{name}' produced no outputs for mode '{mode}'"
                )));
            };
            for (result_type, output) in mode_results.iter() {
                result_type_to_output_map
                    .entry(result_type)
                    .or_default()
                    .entry(output)
                    .or_default()
                    .push(name);
            }
        }

        for (result_type, output_map) in result_type_to_output_map {
            // When every alternation agrees, the result type carries no
            // annotation.
            let all_agree = output_map.len() == 1
                && output_map
                    .values()
                    .next()
                    .is_some_and(|names| names.len() == self.alternations.len());
            if all_agree {
                if let Some((output, _)) = output_map.iter().next() {
                    outputs.record_output(mode, result_type, output)?;
                }
            } else {
                for (output, names) in output_map {
                    let annotated_result_type =
                        format!("{result_type}{{{}}}", names.join("}{"));
                    outputs.record_output(mode, &annotated_result_type, output)?;
                }
            }
        }
        Ok(())
    }
}

impl AlternationRun for RunTestCaseWithModesResult {
    type Collector = AlternationSetWithModes;

    fn is_empty(&self) -> bool {
        RunTestCaseWithModesResult::is_empty(self)
    }

    fn ignore_test_output(&self) -> bool {
        RunTestCaseWithModesResult::ignore_test_output(self)
    }

    fn set_ignore_test_output(&mut self, value: bool) {
        RunTestCaseWithModesResult::set_ignore_test_output(self, value);
    }

    fn input(&self) -> &str {
        &self.context.parts[0]
    }

    fn make_sub_result(&self, test_alternation: &str) -> Self {
        let mut context = self.context.clone();
        context.ignore_test_output = false;
        context.test_alternation = test_alternation.to_string();
        Self::with_context(context)
    }

    fn record(collector: &mut AlternationSetWithModes, name: &str, result: &Self) -> Result<()> {
        if INVALID_ALTERNATION_NAME.is_match(name) {
            return Err(StatusError::internal(format!(
                "Alternation \"{name}\" contains names that can't be stored in a result_type: {}",
                INVALID_ALTERNATION_NAME.as_str()
            )));
        }
        collector.alternations.push((
            if name.is_empty() {
                EMPTY_ALTERNATION_NAME_FOR_MODES.to_string()
            } else {
                name.to_string()
            },
            result.test_case_outputs().clone(),
        ));
        Ok(())
    }

    fn finish(collector: AlternationSetWithModes, result: &mut Self) -> Result<()> {
        let outputs = result.mutable_test_case_outputs();
        let all_modes = collector.collect_modes(outputs)?;
        for mode in &all_modes {
            collector.build_single_mode(mode, outputs)?;
        }
        Ok(())
    }
}

fn join_modes(modes: &TestCaseModeSet) -> String {
    modes
        .iter()
        .map(TestCaseMode::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_alternation_yields_single_empty_label() {
        assert_eq!(
            break_string_into_alternations("plain input\n"),
            vec![(String::new(), "plain input\n".to_string())]
        );
    }

    #[test]
    fn cross_product_in_order() {
        assert_eq!(
            break_string_into_alternations("a{{b|c}}{{d|e}}"),
            vec![
                ("b,d".to_string(), "abd".to_string()),
                ("b,e".to_string(), "abe".to_string()),
                ("c,d".to_string(), "acd".to_string()),
                ("c,e".to_string(), "ace".to_string()),
            ]
        );
    }

    #[test]
    fn expansion_count_is_the_product_of_group_sizes() {
        let expansions = break_string_into_alternations("{{1|2|3}} x {{a|b}} y {{p|q}}");
        assert_eq!(expansions.len(), 3 * 2 * 2);
    }

    #[test]
    fn empty_values_are_allowed() {
        assert_eq!(
            break_string_into_alternations("x{{|0}}"),
            vec![
                ("".to_string(), "x".to_string()),
                ("0".to_string(), "x0".to_string()),
            ]
        );
    }

    #[test]
    fn escaped_pipe_is_literal() {
        assert_eq!(
            break_string_into_alternations("{{a\\|b|c}}"),
            vec![
                ("a|b".to_string(), "a|b".to_string()),
                ("c".to_string(), "c".to_string()),
            ]
        );
    }

    #[test]
    fn group_spanning_newline_stays_literal() {
        assert_eq!(
            break_string_into_alternations("{{a\nb}}"),
            vec![(String::new(), "{{a\nb}}".to_string())]
        );
    }

    #[test]
    fn shortest_group_wins() {
        // The first closing braces end the group.
        let expansions = break_string_into_alternations("{{a|b}}c}}");
        assert_eq!(
            expansions,
            vec![
                ("a".to_string(), "ac}}".to_string()),
                ("b".to_string(), "bc}}".to_string()),
            ]
        );
    }
}
