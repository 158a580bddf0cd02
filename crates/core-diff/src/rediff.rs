//! Scored line diff with semantic heuristics.
//!
//! The overall strategy:
//! - Wrap every logical unit (usually a line) of both inputs in a
//!   [`ProcessedEntry`] and pad both sides with null entries so neighbor
//!   lookups never run off the ends.
//! - Consume common leading and trailing runs linearly, then hand the
//!   interior to the LCS engine.
//! - Walk the resulting match list: slide match boundaries to semantically
//!   preferable positions, extend matches backwards over equal neighbors,
//!   reject matched regions whose information score is below the
//!   tolerance, and mark accepted regions in per-line match tables.
//!   Accepted regions are masked out so later heuristics cannot walk
//!   across them.
//! - Condense the match tables into [`DiffChunk`]s and pair removed runs
//!   on the left with added runs on the right into `Changed` chunks.

use tracing::warn;

use core_lcs::{LcsHybrid, LcsHybridEstimator, LcsOptions, map_to_integer};

use crate::chunk::{ChunkKind, DiffChunk};
use crate::entry::{ProcessedEntry, ScoreMatrix, default_score_matrix};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchType {
    Matched,
    Unmatched,
}

/// An LCS chunk augmented with the bits the diff heuristics need. Fields
/// are mutable because sliding adjusts both the boundary between two
/// matches and their lengths.
#[derive(Debug, Clone, Copy)]
struct DiffMatch {
    left_start: i32,
    right_start: i32,
    length: i32,
    /// Matches for leading/trailing runs cannot be rejected by scoring.
    ignore_score: bool,
}

/// Line-oriented diff engine. See the module docs for the pipeline.
///
/// Entries borrow the diffed text, so the inputs must outlive the `ReDiff`.
pub struct ReDiff<'a> {
    left: Vec<ProcessedEntry<'a>>,
    right: Vec<ProcessedEntry<'a>>,
    left_matches: Vec<(MatchType, i32)>,
    right_matches: Vec<(MatchType, i32)>,
    chunks: Vec<DiffChunk>,
    tolerance: i32,
    score_matrix: ScoreMatrix,
    lcs_options: LcsOptions,
}

impl Default for ReDiff<'_> {
    fn default() -> Self {
        Self {
            left: Vec::new(),
            right: Vec::new(),
            left_matches: Vec::new(),
            right_matches: Vec::new(),
            chunks: Vec::new(),
            // Accept every match by default; scoring only rejects regions
            // when a caller raises the tolerance.
            tolerance: -1,
            score_matrix: *default_score_matrix(),
            lcs_options: LcsOptions::default(),
        }
    }
}

impl<'a> ReDiff<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matched regions scoring at or below `tolerance` are dropped from
    /// the match set, leaving their lines as differences.
    pub fn set_tolerance(&mut self, tolerance: i32) {
        self.tolerance = tolerance;
    }

    pub fn set_score_matrix(&mut self, score_matrix: &ScoreMatrix) {
        self.score_matrix = *score_matrix;
    }

    /// Options for the underlying LCS runs. If the configured memory limit
    /// is too small, it is raised to the engine's linear-memory
    /// recommendation: rediff's own overhead is already linear in the
    /// input, so LCS gets to be as well.
    pub fn set_lcs_options(&mut self, options: LcsOptions) {
        self.lcs_options = options;
    }

    /// Appends one pre-split line to the left input.
    pub fn push_left(&mut self, entry: ProcessedEntry<'a>) {
        self.left.push(entry);
    }

    /// Appends one pre-split line to the right input.
    pub fn push_right(&mut self, entry: ProcessedEntry<'a>) {
        self.right.push(entry);
    }

    /// Splits both inputs into lines and diffs them.
    pub fn diff_strings(&mut self, left: &'a str, right: &'a str) {
        self.left.clear();
        self.right.clear();
        let matrix = self.score_matrix;
        ProcessedEntry::process_str(left, &mut self.left, &matrix);
        ProcessedEntry::process_str(right, &mut self.right, &matrix);
        self.diff();
    }

    /// Diffs inputs the caller has already split into lines.
    pub fn diff_lines(&mut self, left: &[&'a str], right: &[&'a str]) {
        self.left.clear();
        self.right.clear();
        let matrix = self.score_matrix;
        for (i, line) in left.iter().enumerate() {
            self.left
                .push(ProcessedEntry::new(line.as_bytes(), i as i32, &matrix));
        }
        for (i, line) in right.iter().enumerate() {
            self.right
                .push(ProcessedEntry::new(line.as_bytes(), i as i32, &matrix));
        }
        self.diff();
    }

    /// Performs the diff over the pushed entries. The result is held
    /// internally; retrieve it with [`Self::chunks_to_vec`] or
    /// [`Self::chunks_to_string`].
    pub fn diff(&mut self) {
        let left_size = self.left.len();
        let right_size = self.right.len();
        self.left_matches = (0..left_size)
            .map(|i| (MatchType::Unmatched, i as i32))
            .collect();
        self.right_matches = (0..right_size)
            .map(|i| (MatchType::Unmatched, i as i32))
            .collect();

        // Null pads at both ends; they match nothing, so greedy neighbor
        // scans stop at them without bounds checks.
        self.left.insert(0, ProcessedEntry::null());
        self.left.push(ProcessedEntry::null());
        self.right.insert(0, ProcessedEntry::null());
        self.right.push(ProcessedEntry::null());

        self.diff_iteration(self.tolerance);

        let left_chunks = chunkify(&self.left_matches, ChunkKind::Removed);
        let right_chunks = chunkify(&self.right_matches, ChunkKind::Added);
        self.chunks = convert_chunks(left_chunks, right_chunks);
    }

    /// The diff result with ranges converted to exclusive ends, and with
    /// the unused side of `Added`/`Removed` chunks zeroed.
    pub fn chunks_to_vec(&self) -> Vec<DiffChunk> {
        let mut v = Vec::with_capacity(self.chunks.len());
        for chunk in &self.chunks {
            let mut c = *chunk;
            match c.kind {
                ChunkKind::Unchanged | ChunkKind::Changed => {
                    c.last_line += 1;
                    c.source_last += 1;
                }
                ChunkKind::Added => {
                    c.last_line += 1;
                    c.source_first = 0;
                    c.source_last = 0;
                }
                ChunkKind::Removed => {
                    c.first_line = 0;
                    c.last_line = 0;
                    c.source_last += 1;
                }
                ChunkKind::Ignored => {}
            }
            v.push(c);
        }
        v
    }

    /// The diff result as one `opcode source_first source_last first_line
    /// last_line` line per chunk.
    pub fn chunks_to_string(&self) -> String {
        let mut out = String::new();
        for c in self.chunks_to_vec() {
            out.push_str(&format!(
                "{} {} {} {} {}\n",
                c.kind.opcode(),
                c.source_first,
                c.source_last,
                c.first_line,
                c.last_line
            ));
        }
        out
    }

    /// One pass of matching: linear leading/trailing scan, LCS on the
    /// interior, then heuristic processing of the match list. Returns the
    /// number of accepted match regions.
    fn diff_iteration(&mut self, tolerance: i32) -> i32 {
        let padded_left = self.left.len();
        let padded_right = self.right.len();

        // Leading matches, starting past the front pads.
        let mut leading = 0usize;
        while self.left[1 + leading] == self.right[1 + leading] {
            leading += 1;
        }

        // Trailing matches, bounded so they cannot overlap the leading
        // run on either side (the -2 accounts for the pads).
        let max_trailing = (padded_left as i32 - leading as i32 - 2)
            .min(padded_right as i32 - leading as i32 - 2);
        let mut trailing = 0usize;
        if max_trailing > 0 {
            let mut l = padded_left - 2;
            let mut r = padded_right - 2;
            while (trailing as i32) < max_trailing && self.left[l] == self.right[r] {
                trailing += 1;
                l -= 1;
                r -= 1;
            }
        }

        // The interior between the linear runs goes to LCS; its matches
        // come back in padded coordinates via the offset.
        let mut matches: Vec<DiffMatch> = Vec::new();
        if leading > 0 {
            matches.push(DiffMatch {
                left_start: 1,
                right_start: 1,
                length: leading as i32,
                ignore_score: true,
            });
        }
        wrap_lcs(
            &self.lcs_options,
            &self.left[1 + leading..padded_left - 1 - trailing],
            &self.right[1 + leading..padded_right - 1 - trailing],
            (1 + leading) as i32,
            &mut matches,
        );
        if trailing > 0 {
            matches.push(DiffMatch {
                left_start: (padded_left - 1 - trailing) as i32,
                right_start: (padded_right - 1 - trailing) as i32,
                length: trailing as i32,
                ignore_score: true,
            });
        }

        self.process_match_list(matches, tolerance)
    }

    fn process_match_list(&mut self, mut matches: Vec<DiffMatch>, tolerance: i32) -> i32 {
        // Entries of accepted regions are masked; a masked slot reads as a
        // null entry, which stops slides and extensions from crossing the
        // gap an accepted match leaves behind.
        let mut left_consumed = vec![false; self.left.len()];
        let mut right_consumed = vec![false; self.right.len()];
        let mut accepted = 0;

        for i in 0..matches.len() {
            let mut match_length = matches[i].length;

            // Test for slidability before the match is considered at all.
            // The slidable section is the unmatched run between two
            // adjacent matches, present on exactly one side: an insert
            // (extra text on the right) or a delete (extra on the left).
            // A change is never slidable.
            if i + 1 < matches.len() {
                let (head, tail) = matches.split_at_mut(i + 1);
                let current = &mut head[i];
                let next = &mut tail[0];
                if current.left_start + match_length == next.left_start {
                    let gap = next.right_start - current.right_start;
                    slide_region(&self.right, &right_consumed, current, next, gap);
                    match_length = current.length;
                } else if current.right_start + match_length == next.right_start {
                    let gap = next.left_start - current.left_start;
                    slide_region(&self.left, &left_consumed, current, next, gap);
                    match_length = current.length;
                }
            }
            let m = matches[i];
            let mut lit = m.left_start as usize;
            let mut rit = m.right_start as usize;

            // Rejected matches (blank lines in particular) can leave equal
            // neighbors unmatched; seek backwards from the region start to
            // pick them up.
            loop {
                let lprev = entry_or_null(&self.left, &left_consumed, lit - 1);
                let rprev = entry_or_null(&self.right, &right_consumed, rit - 1);
                if lprev != rprev {
                    break;
                }
                if self.left_matches[lprev.number() as usize].0 != MatchType::Unmatched
                    || self.right_matches[rprev.number() as usize].0 != MatchType::Unmatched
                {
                    break;
                }
                lit -= 1;
                rit -= 1;
                match_length += 1;
            }
            // Sliding can consume a match completely.
            if match_length == 0 {
                continue;
            }

            let mut score = 0;
            for j in 0..match_length as usize {
                if score > tolerance {
                    break;
                }
                score += self.left[lit + j].score();
            }
            if score > tolerance || m.ignore_score {
                accepted += 1;
                for j in 0..match_length as usize {
                    let left_number = self.left[lit + j].number() as usize;
                    let right_number = self.right[rit + j].number() as usize;
                    self.left_matches[left_number] = (MatchType::Matched, right_number as i32);
                    self.right_matches[right_number] = (MatchType::Matched, left_number as i32);
                    left_consumed[lit + j] = true;
                    right_consumed[rit + j] = true;
                }
            }
        }
        accepted
    }
}

/// The entry at `index`, or the null entry where an accepted match has
/// masked the slot.
fn entry_or_null<'a>(
    entries: &[ProcessedEntry<'a>],
    consumed: &[bool],
    index: usize,
) -> ProcessedEntry<'a> {
    if consumed[index] {
        ProcessedEntry::null()
    } else {
        entries[index]
    }
}

/// Maps the interior entries to dense integers and runs the hybrid LCS,
/// appending the matches in padded coordinates. On an LCS resource error
/// the interior is left unmatched and only the linear runs survive.
fn wrap_lcs(
    options: &LcsOptions,
    left: &[ProcessedEntry<'_>],
    right: &[ProcessedEntry<'_>],
    offset: i32,
    out: &mut Vec<DiffMatch>,
) {
    let left_keys: Vec<&[u8]> = left.iter().map(|e| e.data().unwrap_or(b"")).collect();
    let right_keys: Vec<&[u8]> = right.iter().map(|e| e.data().unwrap_or(b"")).collect();
    let (left_int, right_int, keys) = map_to_integer(&left_keys, &right_keys);

    let mut lcs_options = options.clone();
    lcs_options.max_keys = keys;
    let estimator = LcsHybridEstimator::new(left_int.len(), right_int.len(), &lcs_options);
    lcs_options.recommend_memory(estimator.memory_recommendation());

    let mut chunks = Vec::new();
    let mut hybrid = LcsHybrid::new(lcs_options);
    let res = hybrid.run(&left_int, 0, &right_int, 0, Some(&mut chunks));
    if res < 0 {
        warn!(
            code = res,
            "LCS returned an error; only leading/trailing matches will be considered"
        );
    }
    for chunk in chunks {
        out.push(DiffMatch {
            left_start: chunk.left + offset,
            right_start: chunk.right + offset,
            length: chunk.length,
            ignore_score: false,
        });
    }
}

/// Tries to slide the boundary between `current` and `next` within the
/// positions where the extra text still matches, picking the slide whose
/// boundaries look most like natural block edges.
///
/// `entries`/`consumed` belong to the side carrying the extra text (right
/// for an insert, left for a delete); `current` starts at `text_start` on
/// that side and `gap` is the distance to the start of `next`.
///
/// Scoring: each boundary takes the minimum [`ProcessedEntry::boundary_score`]
/// of the two lines around it, with bonuses for `}` before a boundary, `{`
/// after the upper boundary, a shorter line before than after, and a large
/// bonus for consuming an adjacent match entirely. Lower is better.
fn slide_region(
    entries: &[ProcessedEntry<'_>],
    consumed: &[bool],
    current: &mut DiffMatch,
    next: &mut DiffMatch,
    gap: i32,
) {
    let text_start = if current.left_start + current.length == next.left_start {
        current.right_start
    } else {
        current.left_start
    };
    let at = |idx: i32| entry_or_null(entries, consumed, idx as usize);

    let extra_begin = text_start + current.length;
    let next_begin = text_start + gap;

    let mut max_backwards = 0i32;
    {
        let mut top = extra_begin;
        let mut bottom = next_begin;
        for _ in 0..current.length {
            top -= 1;
            bottom -= 1;
            if at(top) != at(bottom) {
                break;
            }
            max_backwards += 1;
        }
    }
    let mut max_forwards = 0i32;
    {
        let mut top = extra_begin;
        let mut bottom = next_begin;
        for _ in 0..next.length {
            if at(top) != at(bottom) {
                break;
            }
            max_forwards += 1;
            top += 1;
            bottom += 1;
        }
    }
    if max_backwards == 0 && max_forwards == 0 {
        return;
    }

    let n_slides = (max_backwards + max_forwards + 1) as usize;
    let mut scores = vec![0i32; n_slides];
    let mut before_top = extra_begin - 1 - max_backwards;
    let mut after_top = extra_begin - max_backwards;
    let mut before_bottom = next_begin - 1 - max_backwards;
    let mut after_bottom = next_begin - max_backwards;
    for score in scores.iter_mut() {
        let top_1 = at(before_top).boundary_score();
        let top_2 = at(after_top).boundary_score();
        let bottom_1 = at(before_bottom).boundary_score();
        let bottom_2 = at(after_bottom).boundary_score();
        // A boundary scores as the lower of its two contributing lines.
        let mut top_boundary = top_1.min(top_2);
        let mut bottom_boundary = bottom_1.min(bottom_2);
        // Block-edge bonuses.
        if at(before_top).last_real_char() == b'}' {
            top_boundary -= 2;
        }
        if at(after_top).last_real_char() == b'{' {
            top_boundary -= 2;
        }
        if at(before_bottom).last_real_char() == b'}' {
            bottom_boundary -= 2;
        }
        // Lines ending a logical unit tend to be shorter than what
        // follows; a small bonus breaks ties between otherwise equal
        // slides.
        if top_1 < top_2 {
            top_boundary -= 1;
        }
        if bottom_1 < bottom_2 {
            bottom_boundary -= 1;
        }
        *score = top_boundary + bottom_boundary;

        before_top += 1;
        after_top += 1;
        before_bottom += 1;
        after_bottom += 1;
    }
    if max_backwards == current.length {
        scores[0] -= 10;
    }
    if max_forwards == next.length {
        scores[n_slides - 1] -= 10;
    }

    let mut best_score = i32::MAX;
    let mut best_index = 0usize;
    for (idx, &s) in scores.iter().enumerate() {
        if s < best_score {
            best_score = s;
            best_index = idx;
        }
    }
    let logical_slide = best_index as i32 - max_backwards;
    if logical_slide == 0 {
        return;
    }
    // These adjustments hold for slides in either direction.
    current.length += logical_slide;
    next.left_start += logical_slide;
    next.right_start += logical_slide;
    next.length -= logical_slide;
}

/// Condenses a per-line match table into chunks by greedily merging
/// adjacent lines of the same type.
fn chunkify(matches: &[(MatchType, i32)], unmatched_kind: ChunkKind) -> Vec<DiffChunk> {
    let mut chunks = Vec::new();
    if matches.is_empty() {
        return chunks;
    }
    let kind_of = |match_type: MatchType| match match_type {
        MatchType::Matched => ChunkKind::Unchanged,
        MatchType::Unmatched => unmatched_kind,
    };

    let mut last_type = matches[0].0;
    let mut first_line = matches[0].1;
    let mut last_line = matches[0].1;
    let mut first_index = 0i32;
    let mut last_index = 0i32;
    for (i, &(match_type, line)) in matches.iter().enumerate().skip(1) {
        if match_type == last_type && line == last_line + 1 {
            last_line += 1;
            last_index = i as i32;
        } else {
            chunks.push(DiffChunk {
                first_line: first_index,
                last_line: last_index,
                source_first: first_line,
                source_last: last_line,
                kind: kind_of(last_type),
            });
            first_index = i as i32;
            last_index = i as i32;
            first_line = line;
            last_line = line;
            last_type = match_type;
        }
    }
    chunks.push(DiffChunk {
        first_line: first_index,
        last_line: last_index,
        source_first: first_line,
        source_last: last_line,
        kind: kind_of(last_type),
    });
    chunks
}

/// Merges the per-side chunk lists into one stream: removed/added runs
/// between the same pair of anchors become `Changed` pairs, and unpaired
/// removed runs are interleaved so rendering order follows the right side.
fn convert_chunks(
    mut left_chunks: Vec<DiffChunk>,
    mut right_chunks: Vec<DiffChunk>,
) -> Vec<DiffChunk> {
    // An add/remove pair found between associated anchor chunks converts
    // to a change. Anchors (unchanged runs) correspond one to one across
    // the sides, so walking both candidate lists in lockstep lines the
    // pairs up.
    let left_candidates: Vec<(ChunkKind, usize)> = left_chunks
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c.kind, ChunkKind::Removed | ChunkKind::Unchanged))
        .map(|(i, c)| (c.kind, i))
        .collect();
    let right_candidates: Vec<(ChunkKind, usize)> = right_chunks
        .iter()
        .enumerate()
        .filter(|(_, c)| matches!(c.kind, ChunkKind::Added | ChunkKind::Unchanged))
        .map(|(i, c)| (c.kind, i))
        .collect();
    let mut i = 0;
    let mut j = 0;
    while i < left_candidates.len() && j < right_candidates.len() {
        match (left_candidates[i].0, right_candidates[j].0) {
            (ChunkKind::Removed, ChunkKind::Added) => {
                let left_index = left_candidates[i].1;
                let right_index = right_candidates[j].1;
                left_chunks[left_index].kind = ChunkKind::Changed;
                right_chunks[right_index].kind = ChunkKind::Changed;
                right_chunks[right_index].source_first = left_chunks[left_index].first_line;
                right_chunks[right_index].source_last = left_chunks[left_index].last_line;
                i += 1;
                j += 1;
            }
            (ChunkKind::Unchanged, ChunkKind::Unchanged) => {
                i += 1;
                j += 1;
            }
            (ChunkKind::Unchanged, _) => j += 1,
            _ => i += 1,
        }
    }

    // Final stream: primarily the right chunks, with left-side removed
    // runs inserted before each shared anchor.
    let mut final_chunks = Vec::new();
    let mut i = 0;
    let mut j = 0;
    loop {
        if i >= left_chunks.len() && j >= right_chunks.len() {
            break;
        }
        while j < right_chunks.len()
            && right_chunks[j].kind != ChunkKind::Unchanged
            && right_chunks[j].kind != ChunkKind::Changed
        {
            if right_chunks[j].kind != ChunkKind::Ignored {
                final_chunks.push(right_chunks[j]);
            }
            j += 1;
        }
        while i < left_chunks.len()
            && left_chunks[i].kind != ChunkKind::Unchanged
            && left_chunks[i].kind != ChunkKind::Changed
        {
            if left_chunks[i].kind == ChunkKind::Removed {
                final_chunks.push(left_chunks[i]);
            }
            i += 1;
        }
        if j < right_chunks.len() {
            final_chunks.push(right_chunks[j]);
            i += 1;
            j += 1;
        }
    }
    final_chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opcodes(diff: &ReDiff<'_>) -> Vec<(String, i32, i32, i32, i32)> {
        diff.chunks_to_vec()
            .iter()
            .map(|c| {
                (
                    c.kind.opcode().to_string(),
                    c.source_first,
                    c.source_last,
                    c.first_line,
                    c.last_line,
                )
            })
            .collect()
    }

    #[test]
    fn equal_inputs_are_one_unchanged_chunk() {
        let mut diff = ReDiff::new();
        diff.diff_strings("a\nb\nc\n", "a\nb\nc\n");
        let chunks = diff.chunks_to_vec();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Unchanged);
        assert_eq!(chunks[0].source_first, 0);
        assert_eq!(chunks[0].source_last, 3);
    }

    #[test]
    fn replacement_in_the_middle() {
        let mut diff = ReDiff::new();
        diff.diff_strings("d\nF\nd\n", "d\na\nd\n");
        assert_eq!(
            opcodes(&diff),
            vec![
                ("equal".to_string(), 0, 1, 0, 1),
                ("replace".to_string(), 1, 2, 1, 2),
                ("equal".to_string(), 2, 3, 2, 3),
            ]
        );
    }

    #[test]
    fn pure_insert_and_delete() {
        let mut diff = ReDiff::new();
        diff.diff_strings("a\nb\n", "a\nx\nb\n");
        assert_eq!(
            opcodes(&diff),
            vec![
                ("equal".to_string(), 0, 1, 0, 1),
                ("insert".to_string(), 0, 0, 1, 2),
                ("equal".to_string(), 1, 2, 2, 3),
            ]
        );

        let mut diff = ReDiff::new();
        diff.diff_strings("a\nx\nb\n", "a\nb\n");
        assert_eq!(
            opcodes(&diff),
            vec![
                ("equal".to_string(), 0, 1, 0, 1),
                ("delete".to_string(), 1, 2, 0, 0),
                ("equal".to_string(), 1, 2, 1, 2),
            ]
        );
    }

    #[test]
    fn unbalanced_change_pairs_up() {
        // One removed line against two added ones still forms one
        // replace chunk.
        let mut diff = ReDiff::new();
        diff.diff_strings("d\nF\nd\n", "d\na\nb\nd\n");
        assert_eq!(
            opcodes(&diff),
            vec![
                ("equal".to_string(), 0, 1, 0, 1),
                ("replace".to_string(), 1, 2, 1, 3),
                ("equal".to_string(), 2, 3, 3, 4),
            ]
        );
    }

    #[test]
    fn tolerance_rejects_low_information_matches() {
        // The sole shared line is a brace-only line scoring 0; with a
        // tolerance above that the match is rejected and the diff becomes
        // one whole-block replacement.
        let mut diff = ReDiff::new();
        diff.set_tolerance(2);
        diff.diff_strings("aaa1\n}\nbbb1\n", "ccc2\n}\nddd2\n");
        let chunks = diff.chunks_to_vec();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].kind, ChunkKind::Changed);

        // Default tolerance keeps it.
        let mut diff = ReDiff::new();
        diff.diff_strings("aaa1\n}\nbbb1\n", "ccc2\n}\nddd2\n");
        assert!(
            diff.chunks_to_vec()
                .iter()
                .any(|c| c.kind == ChunkKind::Unchanged)
        );
    }

    #[test]
    fn slide_prefers_blank_line_boundaries() {
        // The inserted block can slide within the repeated structure;
        // boundaries should settle on the blank line rather than mid
        // paragraph.
        let left = "alpha\n\nomega\n";
        let right = "alpha\n\nnew text\nmore new\n\nomega\n";
        let mut diff = ReDiff::new();
        diff.diff_strings(left, right);
        let inserted: Vec<_> = diff
            .chunks_to_vec()
            .into_iter()
            .filter(|c| c.kind != ChunkKind::Unchanged)
            .collect();
        assert_eq!(inserted.len(), 1);
        let chunk = inserted[0];
        assert_eq!(chunk.kind, ChunkKind::Added);
        assert_eq!(chunk.last_line - chunk.first_line, 3);
    }

    #[test]
    fn empty_left_side_is_one_insert() {
        let mut diff = ReDiff::new();
        diff.diff_strings("", "a\nb\n");
        assert_eq!(opcodes(&diff), vec![("insert".to_string(), 0, 0, 0, 2)]);
    }

    #[test]
    fn chunks_to_string_format() {
        let mut diff = ReDiff::new();
        diff.diff_strings("a\n", "b\n");
        assert_eq!(diff.chunks_to_string(), "replace 0 1 0 1\n");
    }

    #[test]
    fn pre_split_lines_diff_like_strings() {
        let mut by_string = ReDiff::new();
        by_string.diff_strings("a\nx\nb\n", "a\nb\n");
        let mut by_lines = ReDiff::new();
        by_lines.diff_lines(&["a\n", "x\n", "b\n"], &["a\n", "b\n"]);
        assert_eq!(by_string.chunks_to_vec(), by_lines.chunks_to_vec());
    }
}
