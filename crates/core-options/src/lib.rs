//! Per-case options parsed from the head of a test input.
//!
//! Options are enclosed in square brackets at the start of a test case and
//! control things like flags, input format or requested output type,
//! separate from the case body:
//!
//! ```text
//! [some_bool_option][no_some_other_bool_option]
//! [some_string_option=my_string]
//! ...actual test case...
//! ```
//!
//! Boolean options are written `[option]` / `[no_option]`; string, integer
//! and duration options as `[option=value]`. Whitespace around names and
//! values is allowed, and a value may span lines (brackets balance across
//! newlines). Keywords are case-insensitive.
//!
//! Every option has a default. `[default option=value]` sets the option
//! *and* makes that value the default for the rest of this parser's
//! lifetime, which is why one [`TestCaseOptions`] should be created per
//! test file: defaults evolving mid-file is a feature, defaults leaking
//! across files is not.
//!
//! The available options are fixed up front through the `register_*`
//! methods; parsing an unregistered keyword is an error.
//!
//! ```
//! use core_options::TestCaseOptions;
//!
//! let mut options = TestCaseOptions::new();
//! options.register_bool("run_fast", false);
//! options.register_string("name", "".to_string());
//!
//! let mut case = "[run_fast][name=widget]\nbody\n".to_string();
//! options.parse_test_case_options(&mut case).unwrap();
//! assert_eq!(case, "body\n");
//! assert!(options.get_bool("run_fast"));
//! assert_eq!(options.get_string("name"), "widget");
//! ```

use std::collections::HashMap;
use std::time::Duration;

use core_status::{Result, StatusError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionType {
    Bool,
    String,
    Int64,
    Duration,
}

/// A single option value. Only the field matching the option's type is
/// meaningful.
#[derive(Debug, Clone, Default)]
struct OptionValue {
    bool_value: bool,
    string_value: String,
    int64_value: i64,
    duration_value: Duration,
    /// True when the value was set explicitly in the current test case.
    is_set_explicitly: bool,
}

#[derive(Debug, Clone)]
struct TestCaseOption {
    option_type: OptionType,
    default_value: OptionValue,
    current_value: OptionValue,
    /// True when the default came from a parsed `[default ...]` rather
    /// than the registration call.
    default_was_parsed: bool,
}

impl TestCaseOption {
    fn new(option_type: OptionType, default_value: OptionValue) -> Self {
        Self {
            option_type,
            current_value: default_value.clone(),
            default_value,
            default_was_parsed: false,
        }
    }
}

/// Registry and parser for test case options. See the module docs.
#[derive(Debug, Default)]
pub struct TestCaseOptions {
    options_by_lower_keyword: HashMap<String, TestCaseOption>,
}

impl TestCaseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&mut self, keyword: &str, option_type: OptionType, default_value: OptionValue) {
        let keyword_lower = keyword.to_ascii_lowercase();
        let previous = self
            .options_by_lower_keyword
            .insert(keyword_lower.clone(), TestCaseOption::new(option_type, default_value));
        assert!(
            previous.is_none(),
            "option [{keyword_lower}] registered twice"
        );
    }

    /// Registers a boolean option, settable with `[keyword]` and
    /// `[no_keyword]`.
    pub fn register_bool(&mut self, keyword: &str, default_value: bool) {
        self.register(
            keyword,
            OptionType::Bool,
            OptionValue {
                bool_value: default_value,
                ..OptionValue::default()
            },
        );
    }

    /// Registers a string option, settable with `[keyword=some string]`.
    pub fn register_string(&mut self, keyword: &str, default_value: String) {
        self.register(
            keyword,
            OptionType::String,
            OptionValue {
                string_value: default_value,
                ..OptionValue::default()
            },
        );
    }

    /// Registers an integer option, settable with `[keyword=123456]`.
    pub fn register_int64(&mut self, keyword: &str, default_value: i64) {
        self.register(
            keyword,
            OptionType::Int64,
            OptionValue {
                int64_value: default_value,
                ..OptionValue::default()
            },
        );
    }

    /// Registers a duration option, settable with `[keyword=22m]`.
    pub fn register_duration(&mut self, keyword: &str, default_value: Duration) {
        self.register(
            keyword,
            OptionType::Duration,
            OptionValue {
                duration_value: default_value,
                ..OptionValue::default()
            },
        );
    }

    fn current_value(&self, option_type: OptionType, keyword: &str) -> &OptionValue {
        let keyword_lower = keyword.to_ascii_lowercase();
        let option = self
            .options_by_lower_keyword
            .get(&keyword_lower)
            .unwrap_or_else(|| panic!("unknown option: {keyword_lower}"));
        assert!(
            option.option_type == option_type,
            "option [{keyword_lower}] requested with the wrong type"
        );
        &option.current_value
    }

    fn current_value_mut(&mut self, option_type: OptionType, keyword: &str) -> &mut OptionValue {
        let keyword_lower = keyword.to_ascii_lowercase();
        let option = self
            .options_by_lower_keyword
            .get_mut(&keyword_lower)
            .unwrap_or_else(|| panic!("unknown option: {keyword_lower}"));
        assert!(
            option.option_type == option_type,
            "option [{keyword_lower}] requested with the wrong type"
        );
        &mut option.current_value
    }

    /// Current value of a bool option. Panics if the option is not
    /// registered with this type; that is a harness bug, not a data error.
    pub fn get_bool(&self, keyword: &str) -> bool {
        self.current_value(OptionType::Bool, keyword).bool_value
    }

    pub fn get_string(&self, keyword: &str) -> &str {
        &self.current_value(OptionType::String, keyword).string_value
    }

    pub fn get_int64(&self, keyword: &str) -> i64 {
        self.current_value(OptionType::Int64, keyword).int64_value
    }

    pub fn get_duration(&self, keyword: &str) -> Duration {
        self.current_value(OptionType::Duration, keyword).duration_value
    }

    /// Overrides the current value until the next parse call.
    pub fn set_bool(&mut self, keyword: &str, value: bool) {
        let v = self.current_value_mut(OptionType::Bool, keyword);
        v.bool_value = value;
        v.is_set_explicitly = true;
    }

    pub fn set_string(&mut self, keyword: &str, value: String) {
        let v = self.current_value_mut(OptionType::String, keyword);
        v.string_value = value;
        v.is_set_explicitly = true;
    }

    pub fn set_int64(&mut self, keyword: &str, value: i64) {
        let v = self.current_value_mut(OptionType::Int64, keyword);
        v.int64_value = value;
        v.is_set_explicitly = true;
    }

    pub fn set_duration(&mut self, keyword: &str, value: Duration) {
        let v = self.current_value_mut(OptionType::Duration, keyword);
        v.duration_value = value;
        v.is_set_explicitly = true;
    }

    /// True if the option was set explicitly in the current test case.
    pub fn is_explicitly_set(&self, keyword: &str) -> bool {
        let keyword_lower = keyword.to_ascii_lowercase();
        self.options_by_lower_keyword
            .get(&keyword_lower)
            .unwrap_or_else(|| panic!("unknown option: {keyword_lower}"))
            .current_value
            .is_set_explicitly
    }

    /// True if the option's default was changed by a parsed
    /// `[default ...]`, meaning it is no longer necessarily the value
    /// passed at registration.
    pub fn default_was_parsed(&self, keyword: &str) -> bool {
        let keyword_lower = keyword.to_ascii_lowercase();
        self.options_by_lower_keyword
            .get(&keyword_lower)
            .unwrap_or_else(|| panic!("unknown option: {keyword_lower}"))
            .default_was_parsed
    }

    /// Resets all options to their defaults, then strips any `[option]`
    /// strings off the start of `text` and applies them.
    pub fn parse_test_case_options(&mut self, text: &mut String) -> Result<()> {
        self.parse_test_case_options_with_defaults(text, true)
            .map(|_| ())
    }

    /// As [`Self::parse_test_case_options`], but `[default ...]` options
    /// are rejected when `allow_defaults` is false. Returns whether any
    /// defaults were set.
    pub fn parse_test_case_options_with_defaults(
        &mut self,
        text: &mut String,
        allow_defaults: bool,
    ) -> Result<bool> {
        let option_strings = extract_and_remove_option_strings(text)?;

        // Split into [default ...] and the rest.
        let mut default_option_strings = Vec::new();
        let mut nondefault_option_strings = Vec::new();
        for option_str in option_strings {
            let is_default = option_str
                .get(..8)
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case("default "));
            if is_default {
                if !allow_defaults {
                    return Err(StatusError::unknown(format!(
                        "default option \"{option_str}\" specified when defaults are not allowed"
                    )));
                }
                default_option_strings.push(option_str[8..].to_string());
            } else {
                nondefault_option_strings.push(option_str);
            }
        }
        let defaults_found = !default_option_strings.is_empty();

        // New defaults first, then reset everything to its default, then
        // the explicit per-case values on top.
        self.set_option_values_from_strings(&default_option_strings, true)?;
        for option in self.options_by_lower_keyword.values_mut() {
            option.current_value = option.default_value.clone();
            debug_assert!(!option.current_value.is_set_explicitly);
        }
        self.set_option_values_from_strings(&nondefault_option_strings, false)?;
        Ok(defaults_found)
    }

    fn set_option_values_from_strings(
        &mut self,
        option_strings: &[String],
        set_default: bool,
    ) -> Result<()> {
        for option_str in option_strings {
            let (keyword, value) = match option_str.find('=') {
                Some(equal_pos) => (
                    option_str[..equal_pos].trim().to_string(),
                    Some(option_str[equal_pos + 1..].trim().to_string()),
                ),
                None => (option_str.trim().to_string(), None),
            };
            let mut keyword = keyword.to_ascii_lowercase();

            let mut is_negated = false;
            if !self.options_by_lower_keyword.contains_key(&keyword) {
                if let Some(stripped) = keyword.strip_prefix("no_") {
                    let stripped = stripped.to_string();
                    if self.options_by_lower_keyword.contains_key(&stripped) {
                        keyword = stripped;
                        is_negated = true;
                    }
                }
            }
            let Some(option) = self.options_by_lower_keyword.get_mut(&keyword) else {
                return Err(StatusError::unknown(format!(
                    "Keyword [{keyword}] does not exist."
                )));
            };

            let option_value = if set_default {
                option.default_was_parsed = true;
                &mut option.default_value
            } else {
                &mut option.current_value
            };
            match option.option_type {
                OptionType::Bool => {
                    if value.is_some() {
                        return Err(StatusError::unknown(format!(
                            "Bool keyword [{keyword}] cannot take a value; use keyword and no_keyword instead"
                        )));
                    }
                    option_value.bool_value = !is_negated;
                }
                OptionType::String => {
                    if is_negated {
                        return Err(StatusError::unknown(format!(
                            "String keyword [{keyword}] cannot be negated with 'no_'"
                        )));
                    }
                    let Some(value) = value else {
                        return Err(StatusError::unknown(format!(
                            "String keyword [{keyword}] requires a value"
                        )));
                    };
                    option_value.string_value = value;
                }
                OptionType::Int64 => {
                    if is_negated {
                        return Err(StatusError::unknown(format!(
                            "Int64 keyword [{keyword}] cannot be negated with 'no_'"
                        )));
                    }
                    let Some(value) = value else {
                        return Err(StatusError::unknown(format!(
                            "Int64 keyword [{keyword}] requires a value"
                        )));
                    };
                    option_value.int64_value = value.parse().map_err(|_| {
                        StatusError::unknown(format!("Invalid value for int64 keyword [{keyword}]"))
                    })?;
                }
                OptionType::Duration => {
                    if is_negated {
                        return Err(StatusError::unknown(format!(
                            "Duration keyword [{keyword}] cannot be negated with 'no_'"
                        )));
                    }
                    let Some(value) = value else {
                        return Err(StatusError::unknown(format!(
                            "Duration keyword [{keyword}] requires a value"
                        )));
                    };
                    option_value.duration_value = humantime::parse_duration(&value).map_err(|_| {
                        StatusError::unknown(format!(
                            "Invalid value for duration keyword [{keyword}]"
                        ))
                    })?;
                }
            }
            if !set_default {
                option.current_value.is_set_explicitly = true;
            }
        }
        Ok(())
    }
}

/// Extracts `[...]` option strings from the start of `text`, removing them
/// and the whitespace around them. Brackets nest; an unclosed `[` is an
/// error.
fn extract_and_remove_option_strings(text: &mut String) -> Result<Vec<String>> {
    let mut option_strings = Vec::new();
    *text = text.trim_start().to_string();
    while text.starts_with('[') {
        let mut unmatched_left_square_brackets = 0i32;
        let mut end_pos = None;
        for (pos, byte) in text.bytes().enumerate() {
            unmatched_left_square_brackets += (byte == b'[') as i32;
            unmatched_left_square_brackets -= (byte == b']') as i32;
            if unmatched_left_square_brackets == 0 {
                end_pos = Some(pos);
                break;
            }
        }
        let Some(end_pos) = end_pos else {
            return Err(StatusError::invalid_argument(format!(
                "Unclosed [ while processing test case options for string:\n{text}"
            )));
        };
        option_strings.push(text[1..end_pos].to_string());
        *text = text[end_pos + 1..].trim_start().to_string();
    }
    Ok(option_strings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_status::ErrorKind;

    fn registered() -> TestCaseOptions {
        let mut options = TestCaseOptions::new();
        options.register_bool("bool_flag", false);
        options.register_string("string_flag", "default".to_string());
        options.register_int64("int_flag", 7);
        options.register_duration("time_flag", Duration::from_secs(1));
        options
    }

    #[test]
    fn parses_and_strips_options() {
        let mut options = registered();
        let mut text = "[bool_flag][string_flag=hello][int_flag=42]\nbody text\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert_eq!(text, "body text\n");
        assert!(options.get_bool("bool_flag"));
        assert_eq!(options.get_string("string_flag"), "hello");
        assert_eq!(options.get_int64("int_flag"), 42);
        assert!(options.is_explicitly_set("int_flag"));
        assert!(!options.is_explicitly_set("time_flag"));
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let mut options = registered();
        let mut text = "[Bool_Flag][STRING_FLAG=x]\nbody\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert!(options.get_bool("BOOL_FLAG"));
        assert_eq!(options.get_string("string_flag"), "x");
    }

    #[test]
    fn negated_bool() {
        let mut options = registered();
        options.set_bool("bool_flag", true);
        let mut text = "[no_bool_flag]\nbody\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert!(!options.get_bool("bool_flag"));
    }

    #[test]
    fn values_may_span_lines_and_carry_spaces() {
        let mut options = registered();
        let mut text = "[ string_flag =\n   long_value_1,\n   long_value_2 ]\nbody\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert_eq!(
            options.get_string("string_flag"),
            "long_value_1,\n   long_value_2"
        );
    }

    #[test]
    fn duration_values() {
        let mut options = registered();
        let mut text = "[time_flag=22m]\nbody\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert_eq!(options.get_duration("time_flag"), Duration::from_secs(22 * 60));

        let mut text = "[time_flag=not a duration]\nbody\n".to_string();
        let err = options.parse_test_case_options(&mut text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn defaults_persist_until_changed() {
        let mut options = registered();

        let mut text = "[default int_flag=100][int_flag=5]\ncase 1\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert_eq!(options.get_int64("int_flag"), 5);
        assert!(options.is_explicitly_set("int_flag"));
        assert!(options.default_was_parsed("int_flag"));

        // The next case falls back to the parsed default.
        let mut text = "case 2\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert_eq!(options.get_int64("int_flag"), 100);
        assert!(!options.is_explicitly_set("int_flag"));
    }

    #[test]
    fn defaults_rejected_when_disallowed() {
        let mut options = registered();
        let mut text = "[default int_flag=100]\nbody\n".to_string();
        let err = options
            .parse_test_case_options_with_defaults(&mut text, false)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn defaults_found_reporting() {
        let mut options = registered();
        let mut text = "[default bool_flag]\nbody\n".to_string();
        assert!(
            options
                .parse_test_case_options_with_defaults(&mut text, true)
                .unwrap()
        );
        let mut text = "[bool_flag]\nbody\n".to_string();
        assert!(
            !options
                .parse_test_case_options_with_defaults(&mut text, true)
                .unwrap()
        );
    }

    #[test]
    fn error_cases() {
        let mut options = registered();

        let mut text = "[nonexistent]\nbody\n".to_string();
        let err = options.parse_test_case_options(&mut text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert!(err.message().contains("nonexistent"));

        let mut text = "[bool_flag=true]\nbody\n".to_string();
        let err = options.parse_test_case_options(&mut text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        let mut text = "[no_string_flag=x]\nbody\n".to_string();
        let err = options.parse_test_case_options(&mut text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        let mut text = "[int_flag=twelve]\nbody\n".to_string();
        let err = options.parse_test_case_options(&mut text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unknown);

        let mut text = "[unclosed\nbody\n".to_string();
        let err = options.parse_test_case_options(&mut text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn stops_at_first_non_bracket() {
        let mut options = registered();
        let mut text = "[bool_flag] body [int_flag=3]\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert_eq!(text, "body [int_flag=3]\n");
        assert_eq!(options.get_int64("int_flag"), 7);
    }

    #[test]
    fn nested_brackets_in_values() {
        let mut options = registered();
        let mut text = "[string_flag=a[b]c]\nbody\n".to_string();
        options.parse_test_case_options(&mut text).unwrap();
        assert_eq!(options.get_string("string_flag"), "a[b]c");
    }
}
