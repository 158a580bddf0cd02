//! Test file entry emission: the inverse of the parser.

use crate::TestCasePartComments;

/// Replaces `needle` with `replacement` wherever it occurs at the start of
/// a line. Every line in `lines` must be `\n`-terminated.
fn replace_at_start_of_line(needle: &str, replacement: &str, lines: &str) -> String {
    if lines.is_empty() {
        return String::new();
    }
    debug_assert!(lines.ends_with('\n'));
    let mut out = String::with_capacity(lines.len());
    for line in lines.split_inclusive('\n') {
        if let Some(rest) = line.strip_prefix(needle) {
            out.push_str(replacement);
            out.push_str(rest);
        } else {
            out.push_str(line);
        }
    }
    out
}

/// Like [`replace_at_start_of_line`] but only for the first and the last
/// line.
fn replace_at_start_of_first_and_last_lines(
    needle: &str,
    replacement: &str,
    lines: &str,
) -> String {
    if lines.is_empty() {
        return String::new();
    }
    debug_assert!(lines.ends_with('\n'));
    let mut out = String::from(lines);
    if out.starts_with(needle) {
        out.replace_range(0..needle.len(), replacement);
    }
    // Find the start of the last line: the character after the newline
    // preceding the terminator.
    let last_line_start = out[..out.len() - 1].rfind('\n').map_or(0, |i| i + 1);
    if out[last_line_start..].starts_with(needle) {
        out.replace_range(last_line_start..last_line_start + needle.len(), replacement);
    }
    out
}

/// Serializes a test case back into its file form, escaping content that
/// would otherwise read as markup:
/// - a leading `\` becomes `\\` on every line;
/// - a leading `#` is escaped on the first and last line of the input part
///   and on every line of output parts (interior `#` lines of the input
///   are legal comments-as-body and stay put);
/// - leading `--` and `==` are escaped on every line;
/// - blank first/last lines of a part become `\` so they are not parsed as
///   comments.
///
/// Parts without a comments entry render bare; surplus comment entries
/// beyond the parts are appended under explicit markers so no data is
/// dropped.
pub fn build_test_file_entry(parts: &[String], comments: &[TestCasePartComments]) -> String {
    let mut s = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i != 0 {
            s.push_str("--\n");
        }
        let mut part = replace_at_start_of_line("\\", "\\\\", part);
        if i == 0 {
            part = replace_at_start_of_first_and_last_lines("#", "\\#", &part);
        } else {
            part = replace_at_start_of_line("#", "\\#", &part);
        }
        part = replace_at_start_of_line("--", "\\--", &part);
        part = replace_at_start_of_line("==", "\\==", &part);
        part = replace_at_start_of_first_and_last_lines("\n", "\\\n", &part);
        match comments.get(i) {
            Some(comment) => {
                s.push_str(&comment.start_comment);
                s.push_str(&part);
                s.push_str(&comment.end_comment);
            }
            None => s.push_str(&part),
        }
    }
    for comment in comments.iter().skip(parts.len()) {
        if !comment.start_comment.is_empty() {
            s.push_str("# COMMENT FROM MISSING PART\n");
            s.push_str(&comment.start_comment);
        }
        if !comment.end_comment.is_empty() {
            s.push_str("# POST-COMMENT FROM MISSING PART\n");
            s.push_str(&comment.end_comment);
        }
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::next_test_case;
    use crate::split_test_file_data;

    fn comments(pairs: &[(&str, &str)]) -> Vec<TestCasePartComments> {
        pairs
            .iter()
            .map(|(start, end)| TestCasePartComments {
                start_comment: (*start).to_string(),
                end_comment: (*end).to_string(),
            })
            .collect()
    }

    fn roundtrip(parts: &[&str], comment_pairs: &[(&str, &str)]) {
        let parts: Vec<String> = parts.iter().map(|p| p.to_string()).collect();
        let comments = comments(comment_pairs);
        let entry = build_test_file_entry(&parts, &comments);
        let lines = split_test_file_data(&entry);
        let mut line_number = 0;
        let (reparsed_parts, reparsed_comments) =
            next_test_case(&lines, &mut line_number).expect("reparse failed");
        assert_eq!(parts, reparsed_parts, "entry was:\n{entry}");
        assert_eq!(comments, reparsed_comments, "entry was:\n{entry}");
    }

    #[test]
    fn plain_entry() {
        let parts = vec!["input\n".to_string(), "output\n".to_string()];
        assert_eq!(
            build_test_file_entry(&parts, &[]),
            "input\n--\noutput\n"
        );
    }

    #[test]
    fn entry_with_comments() {
        let parts = vec!["input\n".to_string(), "output\n".to_string()];
        assert_eq!(
            build_test_file_entry(&parts, &comments(&[("# lead\n", "\n"), ("", "# post\n")])),
            "# lead\ninput\n\n--\noutput\n# post\n"
        );
    }

    #[test]
    fn markup_gets_escaped() {
        let parts = vec!["-- not a separator\n== not either\n".to_string()];
        assert_eq!(
            build_test_file_entry(&parts, &[]),
            "\\-- not a separator\n\\== not either\n"
        );
    }

    #[test]
    fn hash_escaping_depends_on_part() {
        // Input part: only first and last lines are escaped.
        let parts = vec!["# first\nmiddle\n# interior\nlast\n# last\n".to_string()];
        assert_eq!(
            build_test_file_entry(&parts, &[]),
            "\\# first\nmiddle\n# interior\nlast\n\\# last\n"
        );
        // Output parts: every line.
        let parts = vec!["in\n".to_string(), "# a\nx\n# b\n".to_string()];
        assert_eq!(
            build_test_file_entry(&parts, &[]),
            "in\n--\n\\# a\nx\n\\# b\n"
        );
    }

    #[test]
    fn blank_edge_lines_get_escaped() {
        let parts = vec!["\nmiddle\n\n".to_string()];
        assert_eq!(build_test_file_entry(&parts, &[]), "\\\nmiddle\n\\\n");
    }

    #[test]
    fn surplus_comments_are_preserved_with_markers() {
        let parts = vec!["input\n".to_string()];
        let all = comments(&[("", ""), ("# orphan\n", "# tail\n")]);
        assert_eq!(
            build_test_file_entry(&parts, &all),
            "input\n\
             # COMMENT FROM MISSING PART\n\
             # orphan\n\
             # POST-COMMENT FROM MISSING PART\n\
             # tail\n"
        );
    }

    #[test]
    fn roundtrip_cases() {
        roundtrip(&["input\n", "output\n"], &[("", ""), ("", "")]);
        roundtrip(
            &["# looks like a comment\n", "-- dashes\n== equals\n\\ slash\n"],
            &[("# real comment\n", ""), ("", "# trailing\n")],
        );
        roundtrip(&["\ninner\n\n"], &[("\n\n", "")]);
        roundtrip(
            &["multi\nline\ninput\n", "out 1\n", "out 2\nwith more\n"],
            &[("", ""), ("", ""), ("", "")],
        );
    }
}
