//! Result payloads handed to test callbacks.

use core_modes::TestCaseOutputs;

/// Read-only description of the test case being run, plus the
/// ignore-output switch. Shared between both result flavors.
#[derive(Debug, Clone, Default)]
pub(crate) struct CaseContext {
    pub(crate) ignore_test_output: bool,
    pub(crate) filename: String,
    pub(crate) line: usize,
    pub(crate) parts: Vec<String>,
    pub(crate) test_alternation: String,
}

macro_rules! context_accessors {
    () => {
        /// Whether the driver should treat this test as intentionally
        /// skipped.
        pub fn ignore_test_output(&self) -> bool {
            self.context.ignore_test_output
        }

        /// When set, the driver pretends the test returned exactly the
        /// expected output. Use with care: an inadvertently ignored test
        /// looks like a passing one.
        pub fn set_ignore_test_output(&mut self, value: bool) {
            self.context.ignore_test_output = value;
        }

        /// Name of the file the current test case came from.
        pub fn filename(&self) -> &str {
            &self.context.filename
        }

        /// 1-based line of the test case in its file.
        pub fn line(&self) -> usize {
            self.context.line
        }

        /// The raw parts of the test case: input first, then the expected
        /// outputs.
        pub fn parts(&self) -> &[String] {
            &self.context.parts
        }

        /// The comma-joined alternation values chosen for this specific
        /// run; empty when the case has no alternations.
        pub fn test_alternation(&self) -> &str {
            &self.context.test_alternation
        }
    };
}

/// The result of a plain test case run. The callback reports output
/// blocks through [`Self::add_test_output`].
#[derive(Debug, Default)]
pub struct RunTestCaseResult {
    pub(crate) context: CaseContext,
    test_outputs: Vec<String>,
}

impl RunTestCaseResult {
    pub(crate) fn with_context(context: CaseContext) -> Self {
        Self {
            context,
            ..Default::default()
        }
    }

    context_accessors!();

    /// Appends one output block.
    pub fn add_test_output(&mut self, output: impl Into<String>) {
        self.test_outputs.push(output.into());
    }

    pub fn is_empty(&self) -> bool {
        self.test_outputs.is_empty()
    }

    pub fn test_outputs(&self) -> &[String] {
        &self.test_outputs
    }

    pub(crate) fn test_outputs_mut(&mut self) -> &mut Vec<String> {
        &mut self.test_outputs
    }
}

/// The result of a mode-aware test case run. The callback records outputs
/// through [`Self::mutable_test_case_outputs`]; see [`TestCaseOutputs`]
/// for the mode/result-type model.
#[derive(Debug, Default)]
pub struct RunTestCaseWithModesResult {
    pub(crate) context: CaseContext,
    test_case_outputs: TestCaseOutputs,
}

impl RunTestCaseWithModesResult {
    pub(crate) fn with_context(context: CaseContext) -> Self {
        Self {
            context,
            ..Default::default()
        }
    }

    context_accessors!();

    pub fn test_case_outputs(&self) -> &TestCaseOutputs {
        &self.test_case_outputs
    }

    pub fn mutable_test_case_outputs(&mut self) -> &mut TestCaseOutputs {
        &mut self.test_case_outputs
    }

    pub fn is_empty(&self) -> bool {
        self.test_case_outputs.is_empty()
    }
}
