//! Test case extraction from file lines.

use core_status::{Result, StatusError};

use crate::{TestCasePartComments, is_case_separator, is_part_separator};

/// Strips the escape backslash off a body line. Only the escapes the
/// emitter produces are meaningful (`\#`, `\--`, `\==`, `\\` and a lone
/// `\` standing for an escaped blank line); any other leading backslash is
/// preserved byte-for-byte.
fn unescape(line: &str) -> &str {
    if let Some(rest) = line.strip_prefix('\\') {
        if rest.is_empty()
            || rest.starts_with('#')
            || rest.starts_with("--")
            || rest.starts_with("==")
            || rest.starts_with('\\')
        {
            return rest;
        }
    }
    line
}

/// True if the comment block consists of blank lines only.
fn is_all_blank(comment: &str) -> bool {
    comment.bytes().all(|b| b == b'\n')
}

/// Extracts one test case from `lines`, starting at `*line_number` and
/// advancing it past the trailing `==` separator (if any).
///
/// A case has one or more parts separated by `--`, each with optional
/// comment blocks at its start and end. Guaranteed to return at least one
/// part when `*line_number < lines.len()`; each part body and comment
/// block ends in `\n` unless empty.
///
/// Fails with `InvalidArgument` when a non-blank comment block is followed
/// by more body inside a non-initial part: output parts may carry comments
/// only at their edges. (The input part allows interior `#` lines, which
/// are retroactively treated as body.)
pub fn next_test_case(
    lines: &[String],
    line_number: &mut usize,
) -> Result<(Vec<String>, Vec<TestCasePartComments>)> {
    let mut parts: Vec<String> = Vec::new();
    let mut comments: Vec<TestCasePartComments> = Vec::new();
    let mut current_part = String::new();
    let mut current_comment_start = String::new();
    let mut current_comment_end = String::new();

    while *line_number < lines.len() {
        let line = &lines[*line_number];

        // Comments are captured separately; whether a blank/# run is a
        // start or end block depends on whether body has been seen.
        if line.is_empty() || line.starts_with('#') {
            if current_part.is_empty() {
                current_comment_start.push_str(line);
                current_comment_start.push('\n');
            } else {
                current_comment_end.push_str(line);
                current_comment_end.push('\n');
            }
            *line_number += 1;
            continue;
        }

        if is_part_separator(line) {
            parts.push(std::mem::take(&mut current_part));
            comments.push(TestCasePartComments {
                start_comment: std::mem::take(&mut current_comment_start),
                end_comment: std::mem::take(&mut current_comment_end),
            });
            *line_number += 1;
            continue;
        }

        if is_case_separator(line) {
            *line_number += 1;
            break;
        }

        // An actual body line. If an end-comment block has accumulated, it
        // was mid-part after all; blank runs (and anything in the input
        // part) are retroactively reinterpreted as body, real comments in
        // later parts are an error.
        if !current_comment_end.is_empty() {
            if is_all_blank(&current_comment_end) || parts.is_empty() {
                current_part.push_str(&current_comment_end);
                current_comment_end.clear();
            } else {
                return Err(StatusError::invalid_argument(format!(
                    "Comment \"{current_comment_end}\" is contained within test part \"{current_part}\"."
                )));
            }
        }

        current_part.push_str(unescape(line));
        current_part.push('\n');
        *line_number += 1;
    }

    parts.push(current_part);
    comments.push(TestCasePartComments {
        start_comment: current_comment_start,
        end_comment: current_comment_end,
    });
    Ok((parts, comments))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split_test_file_data;

    fn parse_one(data: &str) -> (Vec<String>, Vec<TestCasePartComments>) {
        let lines = split_test_file_data(data);
        let mut line_number = 0;
        next_test_case(&lines, &mut line_number).expect("parse failed")
    }

    #[test]
    fn single_case_with_outputs() {
        let (parts, comments) = parse_one("input line 1\ninput line 2\n--\noutput\n");
        assert_eq!(parts, vec!["input line 1\ninput line 2\n", "output\n"]);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0], TestCasePartComments::default());
    }

    #[test]
    fn comments_attach_to_parts() {
        let (parts, comments) =
            parse_one("# leading\n\ninput\n# trailing\n--\n# out comment\noutput\n");
        assert_eq!(parts, vec!["input\n", "output\n"]);
        assert_eq!(comments[0].start_comment, "# leading\n\n");
        assert_eq!(comments[0].end_comment, "# trailing\n");
        assert_eq!(comments[1].start_comment, "# out comment\n");
        assert_eq!(comments[1].end_comment, "");
    }

    #[test]
    fn advances_past_case_separator() {
        let lines = split_test_file_data("case 1\n==\ncase 2\n");
        let mut line_number = 0;
        let (parts, _) = next_test_case(&lines, &mut line_number).unwrap();
        assert_eq!(parts, vec!["case 1\n"]);
        assert_eq!(line_number, 2);
        let (parts, _) = next_test_case(&lines, &mut line_number).unwrap();
        assert_eq!(parts, vec!["case 2\n"]);
        assert_eq!(line_number, 3);
    }

    #[test]
    fn escapes_strip_one_backslash() {
        let (parts, _) = parse_one("\\# not a comment\n\\-- not a separator\n\\== literal\n\\\\ backslash\n");
        assert_eq!(
            parts[0],
            "# not a comment\n-- not a separator\n== literal\n\\ backslash\n"
        );
    }

    #[test]
    fn unknown_escapes_are_preserved() {
        let (parts, _) = parse_one("\\x stays put\n");
        assert_eq!(parts[0], "\\x stays put\n");
    }

    #[test]
    fn escaped_blank_line_is_body() {
        let (parts, comments) = parse_one("\\\nreal input\n\\\n");
        assert_eq!(parts[0], "\nreal input\n\n");
        assert_eq!(comments[0], TestCasePartComments::default());
    }

    #[test]
    fn blank_run_inside_body_is_reinterpreted() {
        let (parts, comments) = parse_one("--\nout 1\n\n\nout 2\n");
        assert_eq!(parts[1], "out 1\n\n\nout 2\n");
        assert_eq!(comments[1].end_comment, "");
    }

    #[test]
    fn hash_comments_allowed_inside_input_part() {
        let (parts, _) = parse_one("in 1\n# interior\nin 2\n");
        assert_eq!(parts[0], "in 1\n# interior\nin 2\n");
    }

    #[test]
    fn comment_inside_output_part_is_an_error() {
        let lines = split_test_file_data("input\n--\nout 1\n# nope\nout 2\n");
        let mut line_number = 0;
        let err = next_test_case(&lines, &mut line_number).unwrap_err();
        assert_eq!(err.kind(), core_status::ErrorKind::InvalidArgument);
    }

    #[test]
    fn empty_case_is_one_empty_part() {
        let (parts, comments) = parse_one("==\n");
        assert_eq!(parts, vec![""]);
        assert_eq!(comments.len(), 1);
    }
}
