//! Tests for the extractable-text log channel, capturing the runner's
//! tracing output.

use std::io;
use std::sync::{Arc, Mutex};

use core_driver::{DriverConfig, TestFile, log_extractable_text};

/// An `io::Write` that appends into shared memory, so the subscriber's
/// output can be inspected after the fact.
#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().expect("log poisoned")).into_owned()
    }
}

impl io::Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log poisoned").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(run: impl FnOnce()) -> String {
    let log = CapturedLog::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer({
            let log = log.clone();
            move || log.clone()
        })
        .finish();
    tracing::subscriber::with_default(subscriber, run);
    log.contents()
}

#[test]
fn extractable_text_is_delimited() {
    let logged = capture_logs(|| {
        log_extractable_text("some/file.test", "line 1\nline 2\n");
    });
    assert!(logged.contains("****TEST_OUTPUT_BEGIN**** NEW_TEST_RUN some/file.test"));
    assert!(logged.contains("line 1\nline 2\n****TEST_OUTPUT_END****"));
}

#[test]
fn long_text_splits_into_multiple_blocks() {
    let mut text = String::new();
    for i in 0..400 {
        text.push_str(&format!("line {i} {}\n", "x".repeat(100)));
    }
    let logged = capture_logs(|| {
        log_extractable_text("big.test", &text);
    });
    let begins = logged.matches("****TEST_OUTPUT_BEGIN****").count();
    assert!(begins >= 3, "expected several blocks, got {begins}");
    // Only the first block carries the run marker.
    assert_eq!(logged.matches("NEW_TEST_RUN").count(), 1);
    assert_eq!(logged.matches("****TEST_OUTPUT_END****").count(), begins);
}

#[test]
fn oversized_single_line_is_cut_with_marker() {
    let text = format!("{}\n", "y".repeat(40_000));
    let logged = capture_logs(|| {
        log_extractable_text("wide.test", &text);
    });
    assert!(logged.contains("***MERGE_TOO_LONG_LINE***"));
}

#[test]
fn runner_flush_logs_the_regenerated_file() {
    let logged = capture_logs(|| {
        let config = DriverConfig::new();
        let file = TestFile::from_contents("flushed.test", "abc\n--\nABC\n").unwrap();
        let mut runner = file.make_runner(&config);
        for handle in file.tests() {
            runner.run_test_case(&handle, |input, result| {
                result.add_test_output(input.to_uppercase());
            });
        }
        // Dropping the runner flushes the buffer to the log.
    });
    assert!(logged.contains("****TEST_OUTPUT_BEGIN**** NEW_TEST_RUN flushed.test"));
    assert!(logged.contains("abc\n--\nABC\n"));
}
