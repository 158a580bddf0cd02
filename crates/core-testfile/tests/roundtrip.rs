//! Property tests: the emitter is a left inverse of the parser.

use core_testfile::{TestCasePartComments, build_test_file_entry, next_test_case, split_test_file_data};
use proptest::prelude::*;

/// Lines a part body may contain, including everything that needs
/// escaping.
fn body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("text".to_string()),
        Just("more text".to_string()),
        Just("--".to_string()),
        Just("-- trailing".to_string()),
        Just("==".to_string()),
        Just("# hash".to_string()),
        Just(String::new()),
        Just("\\x".to_string()),
        Just("\\".to_string()),
        Just("code {".to_string()),
        "[a-z ]{0,12}",
    ]
}

fn body() -> impl Strategy<Value = String> {
    proptest::collection::vec(body_line(), 0..5).prop_map(|lines| {
        let mut body = String::new();
        for line in lines {
            body.push_str(&line);
            body.push('\n');
        }
        body
    })
}

fn comment_block() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![Just("# comment".to_string()), Just(String::new())],
        0..3,
    )
    .prop_map(|lines| {
        let mut block = String::new();
        for line in lines {
            block.push_str(&line);
            block.push('\n');
        }
        block
    })
}

fn part() -> impl Strategy<Value = (String, TestCasePartComments)> {
    (body(), comment_block(), comment_block()).prop_map(|(body, start, end)| {
        // An end comment on an empty body would reparse as the start
        // comment; the emitter does not try to disambiguate that.
        let end = if body.is_empty() { String::new() } else { end };
        (
            body,
            TestCasePartComments {
                start_comment: start,
                end_comment: end,
            },
        )
    })
}

proptest! {
    #[test]
    fn parse_inverts_emit(case in proptest::collection::vec(part(), 1..4)) {
        let parts: Vec<String> = case.iter().map(|(body, _)| body.clone()).collect();
        let comments: Vec<TestCasePartComments> =
            case.iter().map(|(_, c)| c.clone()).collect();

        let entry = build_test_file_entry(&parts, &comments);
        let lines = split_test_file_data(&entry);
        let mut line_number = 0;
        let (reparsed_parts, reparsed_comments) = next_test_case(&lines, &mut line_number)
            .expect("emitted entry must reparse");

        prop_assert_eq!(&parts, &reparsed_parts, "entry:\n{}", entry);
        prop_assert_eq!(&comments, &reparsed_comments, "entry:\n{}", entry);
        prop_assert_eq!(line_number, lines.len());
    }

    // An emitted entry never contains an unescaped separator line inside a
    // part body, so concatenating entries with `==` keeps cases apart.
    #[test]
    fn emitted_cases_stay_separated(
        first in proptest::collection::vec(part(), 1..3),
        second in proptest::collection::vec(part(), 1..3),
    ) {
        let to_vecs = |case: &[(String, TestCasePartComments)]| {
            (
                case.iter().map(|(b, _)| b.clone()).collect::<Vec<_>>(),
                case.iter().map(|(_, c)| c.clone()).collect::<Vec<_>>(),
            )
        };
        let (first_parts, first_comments) = to_vecs(&first);
        let (second_parts, second_comments) = to_vecs(&second);

        let mut file = build_test_file_entry(&first_parts, &first_comments);
        file.push_str("==\n");
        file.push_str(&build_test_file_entry(&second_parts, &second_comments));

        let lines = split_test_file_data(&file);
        let mut line_number = 0;
        let (parts_1, _) = next_test_case(&lines, &mut line_number).expect("first case");
        let (parts_2, _) = next_test_case(&lines, &mut line_number).expect("second case");
        prop_assert_eq!(parts_1, first_parts);
        prop_assert_eq!(parts_2, second_parts);
    }
}
