//! Line-oriented diffing with semantic heuristics, plus a unified-diff
//! renderer.
//!
//! [`ReDiff`] computes a scored line diff built on the hybrid LCS engine;
//! [`unified_diff`] formats the result as a standard unified diff:
//!
//! ```
//! use core_diff::{UnifiedDiffOptions, unified_diff};
//!
//! let diff = unified_diff("a\nb\n", "a\nc\n", "expected", "actual",
//!                         &UnifiedDiffOptions::new());
//! assert!(diff.starts_with("--- expected\n+++ actual\n"));
//!
//! // Identical inputs produce the empty string.
//! assert_eq!(unified_diff("x\n", "x\n", "l", "r", &UnifiedDiffOptions::new()), "");
//! ```

mod chunk;
mod entry;
mod rediff;
mod unified;

pub use chunk::{ChunkKind, DiffChunk};
pub use entry::{ProcessedEntry, ScoreMatrix, default_score_matrix};
pub use rediff::ReDiff;
pub use unified::{UnifiedDiffColorizer, UnifiedDiffOptions, unified_diff};
