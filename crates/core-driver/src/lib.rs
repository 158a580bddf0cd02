//! A test driver for golden files: test cases live in text files, a
//! callback produces actual outputs, and the driver compares, reports
//! diffs, and regenerates the file with the actual outputs so goldens can
//! be updated.
//!
//! A test file contains cases separated by `==`; each case has an input
//! and expected outputs separated by `--` (see `core-testfile` for the
//! grammar, `core-options` for per-case `[key=value]` options):
//!
//! ```text
//! # Comment
//! First test case.
//! --
//! Test output 1
//! ==
//! Second {{test|TEST}} case.
//! --
//! Second test case output.
//! ==
//! Third test case.
//! --
//! [SAME AS PREVIOUS]
//! ```
//!
//! Beyond the basic shape this driver supports:
//! - **Alternations** `{{a|b}}`: the case runs once per combination of
//!   values; runs with equal results are merged into annotated groups.
//! - **`[SAME AS PREVIOUS]`**: an explicit annotation that a case must
//!   produce exactly the previous case's output.
//! - **Modes** ([`run_test_cases_with_modes_from_files`]): expected
//!   outputs keyed by a user-defined mode and result type, merged with the
//!   modes the callback actually ran (see `core-modes`).
//!
//! The simplest entry point runs a whole list of files:
//!
//! ```no_run
//! use std::path::PathBuf;
//! use core_driver::{DriverConfig, run_test_cases_from_files};
//!
//! let config = DriverConfig::new();
//! let passed = run_test_cases_from_files(
//!     &[PathBuf::from("testdata/queries.test")],
//!     &config,
//!     |input, result| {
//!         result.add_test_output(format!("echo: {input}"));
//!     },
//! );
//! assert!(passed);
//! ```
//!
//! For test-framework integration (one framework test per case), parse a
//! [`TestFile`] once, make a [`TestFileRunner`], and feed it
//! [`TestCaseHandle`]s; cases must run in file order because options
//! defaults and `[SAME AS PREVIOUS]` carry state across cases.

mod alternations;
mod config;
mod result;
mod runner;

pub use alternations::break_string_into_alternations;
pub use config::{DriverConfig, FailureSink, OnResultDiffFound, ResultDiff};
pub use result::{RunTestCaseResult, RunTestCaseWithModesResult};
pub use runner::{
    TestCaseHandle, TestFile, TestFileRunner, count_test_cases_in_files, log_extractable_text,
    run_test_cases_from_files, run_test_cases_with_modes_from_files,
};
