//! Diff chunk representation.

use std::fmt;

/// Edit operation carried by a [`DiffChunk`]. The first four match the
/// opcodes produced by Python's `difflib.SequenceMatcher`; `Ignored` is
/// internal to the diff and never appears in final output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkKind {
    /// The source region equals the target region (same length guaranteed).
    #[default]
    Unchanged,
    /// Insert a copy of the target region at `source_first`; `source_last`
    /// is ignored.
    Added,
    /// Delete the source region; the target region is ignored.
    Removed,
    /// Replace the source region with the target region.
    Changed,
    Ignored,
}

impl ChunkKind {
    pub fn opcode(self) -> &'static str {
        match self {
            ChunkKind::Unchanged => "equal",
            ChunkKind::Added => "insert",
            ChunkKind::Removed => "delete",
            ChunkKind::Changed => "replace",
            ChunkKind::Ignored => "???",
        }
    }
}

impl fmt::Display for ChunkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opcode())
    }
}

/// One edit operation transforming source text A into target text B.
///
/// `source_first..source_last` is the region in A (left side),
/// `first_line..last_line` the region in B (right side); both are 0-based
/// line ranges. Inside the diff the ranges are inclusive of their
/// endpoints; [`crate::ReDiff::chunks_to_vec`] converts them to the
/// exclusive-end form for external consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiffChunk {
    pub source_first: i32,
    pub source_last: i32,
    pub first_line: i32,
    pub last_line: i32,
    pub kind: ChunkKind,
}
