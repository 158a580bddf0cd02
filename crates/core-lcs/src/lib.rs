//! Longest Common Subsequence computations.
//!
//! Not to be mistaken for longest common *substring*: the subsequence may
//! skip items on both sides. The result is reported as matching chunks
//! `(left_start, right_start, length)`, strictly increasing on both axes.
//!
//! ```
//! use core_lcs::{Lcs, map_to_integer};
//!
//! let left = ["line 1", "line 2", "line 3"];
//! let right = ["line 2", "line 3"];
//! let (left_int, right_int, keys) = map_to_integer(&left, &right);
//!
//! let mut lcs = Lcs::default();
//! // Telling the engine the number of distinct keys tightens its runtime
//! // estimates; this step is optional.
//! lcs.options_mut().max_keys = keys;
//! let mut chunks = Vec::new();
//! let len = lcs.run(&left_int, &right_int, Some(&mut chunks));
//! assert_eq!(len, 2);
//! ```
//!
//! [`map_to_integer`] exists so the kernels only ever deal with dense
//! integer keys; byte inputs skip the mapping via [`Lcs::run_bytes`], where
//! the byte value is its own key.
//!
//! LCS lengths are non-negative, so negative return values express errors:
//! [`MEMORY_LIMIT_EXCEEDED`] and [`MAX_DIFF_EXCEEDED`].

use std::collections::HashMap;
use std::hash::Hash;

mod chunks;
mod hunt;
mod hybrid;
mod myers;
mod options;

pub use chunks::{Chunk, append_chunk, append_reverse_chunk, can_be_merged, reorder_reverse_chunks};
pub use hunt::{KeyOccurrences, LcsHunt};
pub use hybrid::{LcsHybrid, LcsHybridEstimator, LcsStats};
pub use myers::LcsMyers;
pub use options::{LcsOptions, MAX_DIFF_EXCEEDED, MEMORY_LIMIT_EXCEEDED};

/// Item type the kernels operate on. `key` must be dense and non-negative;
/// [`KeyOccurrences`] allocates `max_key + 1` slots.
pub trait LcsItem: Copy + Eq {
    fn key(self) -> usize;
}

impl LcsItem for i32 {
    fn key(self) -> usize {
        self as usize
    }
}

impl LcsItem for u8 {
    fn key(self) -> usize {
        self as usize
    }
}

/// Front end over [`LcsHybrid`] for integer and byte sequences.
#[derive(Debug, Default, Clone)]
pub struct Lcs {
    options: LcsOptions,
}

impl Lcs {
    pub fn new(options: LcsOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LcsOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut LcsOptions {
        &mut self.options
    }

    /// Computes the LCS of two integer sequences. The return value is the
    /// length of the longest common subsequence; the matched runs are
    /// appended to `chunks` when present. Passing `None` skips backpointer
    /// tracking and reduces both runtime and memory.
    ///
    /// On memory or diff bound violations, returns a negative error code
    /// and leaves `chunks` without interior matches.
    pub fn run(&self, left: &[i32], right: &[i32], chunks: Option<&mut Vec<Chunk>>) -> i32 {
        let mut hybrid = LcsHybrid::new(self.options.clone());
        hybrid.run(left, 0, right, 0, chunks)
    }

    /// Byte-sequence variant. Not UTF-8 aware: every byte is a separate
    /// unit, and the key space is fixed at 256.
    pub fn run_bytes(&self, left: &[u8], right: &[u8], chunks: Option<&mut Vec<Chunk>>) -> i32 {
        let mut options = self.options.clone();
        options.max_keys = u8::MAX as i32 + 1;
        let mut hybrid = LcsHybrid::new(options);
        hybrid.run(left, 0, right, 0, chunks)
    }
}

/// Maps two value sequences onto dense non-negative integers such that
/// `left_int[i] == right_int[j]` exactly when `left[i] == right[j]`.
///
/// Values occurring on only one side are collapsed: all right-only values
/// share one key and all left-only values share another, minimizing the key
/// count without affecting cross-sequence equality. Returns
/// `(left_int, right_int, keys)` where every mapped integer is in
/// `0..keys`.
pub fn map_to_integer<T: Eq + Hash>(left: &[T], right: &[T]) -> (Vec<i32>, Vec<i32>, i32) {
    let mut hash: HashMap<&T, i32> = HashMap::with_capacity(right.len());

    // Assign integers for the right side in first-occurrence order.
    let mut right_int: Vec<i32> = Vec::with_capacity(right.len());
    for entry in right {
        let next = hash.len() as i32;
        let mapped = *hash.entry(entry).or_insert(next);
        right_int.push(mapped);
    }

    // Map the left side onto the same integers; values absent from the
    // right all map to the shared key num_right_keys.
    let num_right_keys = hash.len() as i32;
    let mut used_by_left = vec![0i32; num_right_keys as usize + 1];
    let mut left_int: Vec<i32> = Vec::with_capacity(left.len());
    for entry in left {
        let mapped = hash.get(entry).copied().unwrap_or(num_right_keys);
        left_int.push(mapped);
        used_by_left[mapped as usize] = 1;
    }

    // Compact the key range: keys used only on the right collapse onto one
    // shared key. This is purely an optimization for the downstream
    // occurrence index; correctness does not depend on it.
    let mut num_new_keys = 0i32;
    let mut not_occurring = -1i32;
    for k in 0..=num_right_keys as usize {
        if used_by_left[k] != 0 {
            used_by_left[k] = num_new_keys;
            num_new_keys += 1;
        } else if k < num_right_keys as usize {
            if not_occurring == -1 {
                not_occurring = num_new_keys;
                num_new_keys += 1;
            }
            used_by_left[k] = not_occurring;
        }
    }
    for value in left_int.iter_mut() {
        *value = used_by_left[*value as usize];
    }
    for value in right_int.iter_mut() {
        *value = used_by_left[*value as usize];
    }
    (left_int, right_int, num_new_keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_to_integer_preserves_cross_equality() {
        let left = ["line 1", "line 2", "line 3", "line 4"];
        let right = ["line 2", "line 6", "line 4"];
        let (left_int, right_int, keys) = map_to_integer(&left, &right);
        assert_eq!(keys, 4);
        for (i, l) in left.iter().enumerate() {
            for (j, r) in right.iter().enumerate() {
                assert_eq!(
                    left_int[i] == right_int[j],
                    l == r,
                    "mapping broke equality for ({i}, {j})"
                );
            }
        }
        for &v in left_int.iter().chain(right_int.iter()) {
            assert!((0..keys).contains(&v));
        }
    }

    #[test]
    fn map_to_integer_empty_sides() {
        let empty: [&str; 0] = [];
        let (left_int, right_int, keys) = map_to_integer(&empty, &empty);
        assert!(left_int.is_empty());
        assert!(right_int.is_empty());
        assert_eq!(keys, 0);
    }

    #[test]
    fn run_reports_full_match() {
        let lcs = Lcs::default();
        let mut chunks = Vec::new();
        let len = lcs.run(&[1, 2, 3], &[1, 2, 3], Some(&mut chunks));
        assert_eq!(len, 3);
        assert_eq!(chunks, vec![Chunk::new(0, 0, 3)]);
    }

    #[test]
    fn run_bytes_on_strings() {
        let lcs = Lcs::default();
        let mut chunks = Vec::new();
        let len = lcs.run_bytes(b"abcabba", b"cbabac", Some(&mut chunks));
        assert_eq!(len, 4);
        assert_eq!(chunks.iter().map(|c| c.length).sum::<i32>(), 4);
    }
}
