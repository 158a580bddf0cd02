//! Unified diff rendering on top of [`ReDiff`].

use crate::chunk::{ChunkKind, DiffChunk};
use crate::entry::{ProcessedEntry, default_score_matrix};
use crate::rediff::ReDiff;

const NO_NEWLINE_AT_EOF: &str = "\\ No newline at end of file";

/// Wraps added and deleted blocks in prefix/suffix strings, optionally
/// passing each line through an escaper first.
#[derive(Debug, Clone)]
pub struct UnifiedDiffColorizer {
    add_prefix: String,
    add_suffix: String,
    del_prefix: String,
    del_suffix: String,
    escaper: Option<fn(&str) -> String>,
}

impl UnifiedDiffColorizer {
    pub fn new(
        add_prefix: impl Into<String>,
        add_suffix: impl Into<String>,
        del_prefix: impl Into<String>,
        del_suffix: impl Into<String>,
        escaper: Option<fn(&str) -> String>,
    ) -> Self {
        Self {
            add_prefix: add_prefix.into(),
            add_suffix: add_suffix.into(),
            del_prefix: del_prefix.into(),
            del_suffix: del_suffix.into(),
            escaper,
        }
    }

    /// Standard colorizer using ANSI terminal escape codes: green
    /// additions, red deletions.
    pub fn ansi() -> &'static UnifiedDiffColorizer {
        static ANSI: std::sync::LazyLock<UnifiedDiffColorizer> = std::sync::LazyLock::new(|| {
            UnifiedDiffColorizer::new("\x1b[32m", "\x1b[0m", "\x1b[31m", "\x1b[0m", None)
        });
        &ANSI
    }

    pub fn add_prefix(&self) -> &str {
        &self.add_prefix
    }

    pub fn add_suffix(&self) -> &str {
        &self.add_suffix
    }

    pub fn del_prefix(&self) -> &str {
        &self.del_prefix
    }

    pub fn del_suffix(&self) -> &str {
        &self.del_suffix
    }
}

/// Options for [`unified_diff`].
#[derive(Debug, Clone, Default)]
pub struct UnifiedDiffOptions<'a> {
    context_size: Option<u32>,
    warn_missing_eof_newline: Option<bool>,
    colorizer: Option<&'a UnifiedDiffColorizer>,
}

impl<'a> UnifiedDiffOptions<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context lines around each hunk; same meaning as `diff -u N`.
    /// Defaults to 3.
    pub fn set_context_size(mut self, context_size: u32) -> Self {
        self.context_size = Some(context_size);
        self
    }

    pub fn context_size(&self) -> u32 {
        self.context_size.unwrap_or(3)
    }

    /// Whether a missing final newline is flagged with the standard
    /// `\ No newline at end of file` marker. Defaults to true.
    pub fn set_warn_missing_eof_newline(mut self, warn: bool) -> Self {
        self.warn_missing_eof_newline = Some(warn);
        self
    }

    pub fn warn_missing_eof_newline(&self) -> bool {
        self.warn_missing_eof_newline.unwrap_or(true)
    }

    pub fn set_colorizer(mut self, colorizer: &'a UnifiedDiffColorizer) -> Self {
        self.colorizer = Some(colorizer);
        self
    }

    pub fn colorizer(&self) -> Option<&'a UnifiedDiffColorizer> {
        self.colorizer
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LineType {
    Shared,
    Add,
    Delete,
}

impl LineType {
    fn prefix(self) -> &'static str {
        match self {
            LineType::Shared => " ",
            LineType::Add => "+",
            LineType::Delete => "-",
        }
    }
}

/// Prints `lines[from..to]` with the prefix for `line_type`, wrapping the
/// block in colorizer prefix/suffix when applicable and emitting the
/// missing-newline marker after the very last line of the side.
fn print(
    from: i32,
    to: i32,
    lines: &[ProcessedEntry<'_>],
    options: &UnifiedDiffOptions<'_>,
    line_type: LineType,
    out: &mut String,
) {
    // An empty range should not emit colorization either.
    let colorizer = if from >= to { None } else { options.colorizer() };

    let (prefix, suffix) = match (colorizer, line_type) {
        (Some(c), LineType::Add) => (Some(c.add_prefix()), Some(c.add_suffix())),
        (Some(c), LineType::Delete) => (Some(c.del_prefix()), Some(c.del_suffix())),
        _ => (None, None),
    };
    if let Some(prefix) = prefix {
        out.push_str(prefix);
    }

    for i in from..to {
        let entry = &lines[i as usize];
        let line = String::from_utf8_lossy(entry.data().unwrap_or(b""));
        out.push_str(line_type.prefix());
        match colorizer.and_then(|c| c.escaper) {
            Some(escaper) => out.push_str(&escaper(&line)),
            None => out.push_str(&line),
        }
        if i as usize == lines.len() - 1 && !line.ends_with('\n') {
            if options.warn_missing_eof_newline() {
                out.push('\n');
                out.push_str(NO_NEWLINE_AT_EOF);
                out.push('\n');
            } else {
                out.push('\n');
            }
        }
    }

    if let Some(suffix) = suffix {
        out.push_str(suffix);
    }
}

/// Clips `first_line..last_line` expanded by `context` to `0..parts` and
/// returns the 1-based `(start, length)` pair for the hunk header.
fn hunk_context(parts: i32, first_line: i32, last_line: i32, context: i32) -> (i32, i32) {
    let first_line = (first_line - context).max(0);
    let last_line = (last_line + context).min(parts);
    let length = last_line - first_line;
    if length > 0 { (first_line + 1, length) } else { (0, 0) }
}

fn format_line_numbers(start: i32, length: i32) -> String {
    if length == 1 {
        format!("{start}")
    } else {
        format!("{start},{length}")
    }
}

fn flush_hunk(
    hunk: &[DiffChunk],
    left: &[ProcessedEntry<'_>],
    right: &[ProcessedEntry<'_>],
    options: &UnifiedDiffOptions<'_>,
    out: &mut String,
) {
    let context = options.context_size() as i32;
    let (first, last) = (hunk[0], hunk[hunk.len() - 1]);
    let left_info = hunk_context(left.len() as i32, first.source_first, last.source_last, context);
    let right_info = hunk_context(right.len() as i32, first.first_line, last.last_line, context);
    out.push_str(&format!(
        "@@ -{} +{} @@\n",
        format_line_numbers(left_info.0, left_info.1),
        format_line_numbers(right_info.0, right_info.1)
    ));
    let mut prev_line = if left_info.0 > 0 { left_info.0 - 1 } else { 0 };
    for part in hunk {
        print(prev_line, part.source_first, left, options, LineType::Shared, out);
        print(
            part.source_first,
            part.source_last,
            left,
            options,
            LineType::Delete,
            out,
        );
        print(part.first_line, part.last_line, right, options, LineType::Add, out);
        prev_line = part.source_last;
    }
    print(
        prev_line,
        (left.len() as i32).min(prev_line + context),
        left,
        options,
        LineType::Shared,
        out,
    );
}

/// Returns the unified line-by-line diff between `left` and `right`, using
/// `left_name` and `right_name` in the `---`/`+++` headers. Returns the
/// empty string when the inputs are identical.
pub fn unified_diff(
    left: &str,
    right: &str,
    left_name: &str,
    right_name: &str,
    options: &UnifiedDiffOptions<'_>,
) -> String {
    if left.is_empty() && right.is_empty() {
        return String::new();
    }

    let matrix = default_score_matrix();
    let mut left_entries = Vec::new();
    ProcessedEntry::process_str(left, &mut left_entries, matrix);
    let mut right_entries = Vec::new();
    ProcessedEntry::process_str(right, &mut right_entries, matrix);

    let mut differ = ReDiff::new();
    for entry in &left_entries {
        differ.push_left(*entry);
    }
    for entry in &right_entries {
        differ.push_right(*entry);
    }
    differ.diff();
    let chunks = differ.chunks_to_vec();
    if chunks.len() == 1 && chunks[0].kind == ChunkKind::Unchanged {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("--- {left_name}\n"));
    out.push_str(&format!("+++ {right_name}\n"));
    let mut prev = DiffChunk::default();
    let mut hunk: Vec<DiffChunk> = Vec::new();
    for c in &chunks {
        if c.kind == ChunkKind::Unchanged {
            // A long enough equal stretch ends the current hunk.
            if c.source_last - c.source_first > (options.context_size() as i32) * 2
                && !hunk.is_empty()
            {
                flush_hunk(&hunk, &left_entries, &right_entries, options, &mut out);
                hunk.clear();
            }
        } else {
            let mut part = *c;
            // Added and removed chunks carry no lines for the opposite
            // side; anchor them at the end of the previous chunk so the
            // empty half-open range lands in the right place.
            if part.kind == ChunkKind::Added {
                part.source_first = prev.source_last;
                part.source_last = prev.source_last;
            }
            if part.kind == ChunkKind::Removed {
                part.first_line = prev.last_line;
                part.last_line = prev.last_line;
            }
            hunk.push(part);
        }
        prev = *c;
    }
    if !hunk.is_empty() {
        flush_hunk(&hunk, &left_entries, &right_entries, options, &mut out);
    }
    out
}
