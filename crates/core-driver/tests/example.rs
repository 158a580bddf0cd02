//! A worked example: summing comma-separated numbers with per-case
//! options, driven by the checked-in golden file `testdata/sum.test`.

use std::path::PathBuf;

use core_driver::{DriverConfig, RunTestCaseResult, count_test_cases_in_files,
                  run_test_cases_from_files};
use core_options::TestCaseOptions;

const DOUBLE_RESULT_OPTION: &str = "double_result";
const ADD_AMOUNT_OPTION: &str = "add_amount";
const RESULT_PREFIX_OPTION: &str = "result_prefix";
const IGNORE_THIS_TEST_OPTION: &str = "ignore_this_test";

fn test_file_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("testdata")
        .join("sum.test")
}

/// The system under test: sums a list of numbers separated by `,` or `;`,
/// with option-controlled post-processing.
fn run_sum_test_case(
    options: &mut TestCaseOptions,
    test_case: &str,
    test_result: &mut RunTestCaseResult,
) {
    let mut test_case_without_options = test_case.to_string();
    if let Err(e) = options.parse_test_case_options(&mut test_case_without_options) {
        // Bad options become an error in the output rather than aborting
        // the whole file.
        test_result.add_test_output(format!("ERROR: Failed to parse options: {e}"));
        return;
    }

    if options.get_bool(IGNORE_THIS_TEST_OPTION) {
        test_result.set_ignore_test_output(true);
        return;
    }

    let mut sum: i64 = 0;
    for number_string in test_case_without_options
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        match number_string.parse::<i64>() {
            Ok(number) => sum += number,
            Err(_) => {
                test_result
                    .add_test_output(format!("ERROR: Failed to parse number: {number_string}"));
                return;
            }
        }
    }
    if options.get_bool(DOUBLE_RESULT_OPTION) {
        sum *= 2;
    }
    sum += options.get_int64(ADD_AMOUNT_OPTION);

    test_result.add_test_output(format!("{} {sum}\n", options.get_string(RESULT_PREFIX_OPTION)));
}

fn register_options() -> TestCaseOptions {
    let mut options = TestCaseOptions::new();
    options.register_bool(DOUBLE_RESULT_OPTION, false);
    options.register_int64(ADD_AMOUNT_OPTION, 0);
    options.register_string(RESULT_PREFIX_OPTION, "The result is:".to_string());
    options.register_bool(IGNORE_THIS_TEST_OPTION, false);
    options
}

#[test]
fn sum_golden_file_passes() {
    // One options instance per file, so `[default ...]` overrides stay
    // scoped to it.
    let mut options = register_options();
    let config = DriverConfig::new();
    let passed = run_test_cases_from_files(&[test_file_path()], &config, |input, result| {
        run_sum_test_case(&mut options, input, result);
    });
    assert!(passed);
}

#[test]
fn sum_golden_file_case_count() -> anyhow::Result<()> {
    assert_eq!(count_test_cases_in_files(&[test_file_path()])?, 5);
    Ok(())
}
