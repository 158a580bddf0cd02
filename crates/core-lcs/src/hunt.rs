//! Hunt–McIlroy LCS kernel ("An Algorithm for Differential File
//! Comparison", Hunt and McIlroy).
//!
//! The right sequence is pre-indexed as a [`KeyOccurrences`] table so the
//! kernel can iterate all matches of a left item in O(1) per match. Two
//! variants exist: `run_and_report` tracks backpointers (quadratic memory in
//! the worst case) and reconstructs the matching chunks; `run_split` runs a
//! bidirectional search with linear memory and only produces the LCS length
//! plus a split point for the recursive driver in [`crate::hybrid`].

use crate::LcsItem;
use crate::chunks::{Chunk, append_reverse_chunk, reorder_reverse_chunks};

/// Occurrence index over one sequence with O(1) access per key.
///
/// Stored as two flat vectors: `first_match[k]..first_match[k + 1]` indexes
/// into `occurrences`, which lists the positions of key `k` in reverse
/// order. Memory is `sizeof(i32) * (max_key + 1 + len)`, which beats a hash
/// map from key to position vector by a wide margin once the key space has
/// been compacted.
#[derive(Debug, Default, Clone)]
pub struct KeyOccurrences {
    pub(crate) first_match: Vec<i32>,
    occurrences: Vec<i32>,
}

impl KeyOccurrences {
    /// Rebuilds the index for `items`. `keys` must be strictly greater than
    /// every `item.key()`.
    pub fn init<T: LcsItem>(&mut self, items: &[T], keys: usize) {
        // Counting sort: count per key, prefix-sum into start offsets, then
        // place positions in reverse so each bucket lists matches by
        // decreasing position.
        self.first_match.clear();
        self.first_match.resize(keys + 1, 0);
        for item in items {
            self.first_match[item.key()] += 1;
        }
        let mut acc = 0;
        for slot in self.first_match.iter_mut() {
            let count = *slot;
            *slot = acc;
            acc += count;
        }
        let mut insertion_point = self.first_match.clone();
        self.occurrences.clear();
        self.occurrences.resize(items.len(), 0);
        for (i, item) in items.iter().enumerate().rev() {
            let slot = &mut insertion_point[item.key()];
            self.occurrences[*slot as usize] = i as i32;
            *slot += 1;
        }
    }

    /// Positions of `key` in the indexed sequence, by decreasing position.
    pub fn occurrences(&self, key: usize) -> &[i32] {
        if key + 1 < self.first_match.len() {
            let begin = self.first_match[key] as usize;
            let end = self.first_match[key + 1] as usize;
            &self.occurrences[begin..end]
        } else {
            &[]
        }
    }

    /// Total number of indexed items.
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    pub fn clear(&mut self) {
        self.first_match.clear();
        self.occurrences.clear();
    }
}

/// A single match plus the index of the preceding match in the backpointer
/// arena. Flat indices instead of refcounted nodes: the arena is dropped as
/// a whole after reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BackPointer {
    pub x: i32,
    pub y: i32,
    pub predecessor: u32,
}

/// Estimated size of one backpointer, used by the memory estimators.
pub(crate) const BACK_POINTER_SIZE: i64 = std::mem::size_of::<BackPointer>() as i64;

#[derive(Debug, Default)]
pub struct LcsHunt {
    split_x: i32,
    split_y: i32,
}

impl LcsHunt {
    /// Runs Hunt's algorithm over `left` and the pre-indexed right side.
    /// With `chunks` present, backpointers are tracked and the matching
    /// chunks reported; without, the linear-memory split variant runs and
    /// the split point is available through [`Self::split_x`] /
    /// [`Self::split_y`]. Returns the LCS length.
    pub fn run<T: LcsItem>(
        &mut self,
        left: &[T],
        left_offset: i32,
        right_occ: &KeyOccurrences,
        right_offset: i32,
        chunks: Option<&mut Vec<Chunk>>,
    ) -> i32 {
        match chunks {
            Some(chunks) => self.run_and_report(left, left_offset, right_occ, right_offset, chunks),
            None => self.run_split(left, right_occ),
        }
    }

    pub fn split_x(&self) -> i32 {
        self.split_x
    }

    pub fn split_y(&self) -> i32 {
        self.split_y
    }

    fn run_and_report<T: LcsItem>(
        &mut self,
        left: &[T],
        left_offset: i32,
        right_occ: &KeyOccurrences,
        right_offset: i32,
        chunks: &mut Vec<Chunk>,
    ) -> i32 {
        let right_size = right_occ.len() as i32;
        let fence = left.len() as i32 + right_size + 1;

        let mut back_pointers: Vec<BackPointer> = Vec::with_capacity(left.len() + right_occ.len() + 2);
        // Index 0: sentinel before any match; index 1: sentinel after any
        // match. Every wave slot starts out pointing at one of the two.
        back_pointers.push(BackPointer {
            x: -1,
            y: -1,
            predecessor: 0,
        });
        back_pointers.push(BackPointer {
            x: fence,
            y: fence,
            predecessor: 0,
        });

        // waves_fwd[l] holds the backpointer id of the chain of exactly l
        // matches whose last match has the smallest right coordinate found
        // so far.
        let mut waves_fwd: Vec<usize> = vec![1; right_occ.len() + 1];
        waves_fwd[0] = 0;

        for (x, item) in left.iter().enumerate() {
            for &y in right_occ.occurrences(item.key()) {
                // Slot where a chain ending at y would land; the wave is
                // sorted by the y coordinate of its chain ends.
                let l = waves_fwd.partition_point(|&id| back_pointers[id].y < y);
                // Only replace when strictly improving: an equal right
                // coordinate means the same end position was reached with
                // the same chain length already.
                if back_pointers[waves_fwd[l]].y == y {
                    continue;
                }
                let predecessor = waves_fwd[l - 1] as u32;
                back_pointers.push(BackPointer {
                    x: x as i32,
                    y,
                    predecessor,
                });
                waves_fwd[l] = back_pointers.len() - 1;
            }
        }

        // The largest wave slot still pointing at a real chain is the LCS
        // length; walk its backpointers to emit matches back-to-front.
        let mut l = waves_fwd.len() - 1;
        while l > 0 && waves_fwd[l] == 1 {
            l -= 1;
        }
        let first_chunk = chunks.len();
        let mut bp = waves_fwd[l];
        while bp != 0 {
            let p = back_pointers[bp];
            append_reverse_chunk(p.x + left_offset, p.y + right_offset, 1, chunks);
            bp = p.predecessor as usize;
        }
        reorder_reverse_chunks(first_chunk, chunks);
        l as i32
    }

    fn run_split<T: LcsItem>(&mut self, left: &[T], right_occ: &KeyOccurrences) -> i32 {
        let left_size = left.len() as i32;
        let right_size = right_occ.len() as i32;
        let slots = right_occ.len() + 1;

        // Forward wave over the first half of left, backward wave over the
        // second half, both keyed by chain length and storing only the last
        // match coordinate per slot.
        let mut waves_fwd_y = vec![right_size + 1; slots];
        waves_fwd_y[0] = -1;
        let mut waves_bwd_y = vec![-1; slots];
        waves_bwd_y[slots - 1] = right_size + 1;
        let mut waves_fwd_x = vec![-1; slots];
        let mut waves_bwd_x = vec![-1; slots];

        self.split_x = left_size / 2;
        for x in 0..=self.split_x {
            for &y in right_occ.occurrences(left[x as usize].key()) {
                let l = waves_fwd_y.partition_point(|&wy| wy < y);
                waves_fwd_x[l] = x;
                waves_fwd_y[l] = y;
            }
        }
        for x in ((self.split_x + 1)..left_size).rev() {
            // Matches in increasing y order for the backward wave.
            for &y in right_occ.occurrences(left[x as usize].key()).iter().rev() {
                let l = waves_bwd_y.partition_point(|&wy| wy <= y) - 1;
                waves_bwd_x[l] = x;
                waves_bwd_y[l] = y;
            }
        }

        // Merge the waves: for every feasible forward chain length l, find
        // the longest backward chain whose matches lie strictly after the
        // forward chain's last right coordinate.
        let mut lcs = 0;
        self.split_y = 0;
        let mut k = 0usize;
        let mut l = 0usize;
        while l < slots && waves_fwd_y[l] < right_size {
            while waves_bwd_y[k] <= waves_fwd_y[l] {
                k += 1;
            }
            let candidate = l as i32 + right_size - k as i32;
            if lcs < candidate {
                lcs = candidate;
                // Slot 0 of the forward wave does not point at a match.
                if l > 0 {
                    self.split_x = waves_fwd_x[l];
                    self.split_y = waves_fwd_y[l];
                } else {
                    self.split_x = waves_bwd_x[k];
                    self.split_y = waves_bwd_y[k];
                }
            }
            l += 1;
        }
        lcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occ(items: &[i32], keys: usize) -> KeyOccurrences {
        let mut index = KeyOccurrences::default();
        index.init(items, keys);
        index
    }

    #[test]
    fn key_occurrences_reverse_order() {
        let index = occ(&[1, 0, 1, 2, 1], 3);
        assert_eq!(index.occurrences(1), &[4, 2, 0]);
        assert_eq!(index.occurrences(0), &[1]);
        assert_eq!(index.occurrences(3), &[] as &[i32]);
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn reports_single_chunk() {
        let right = [0, 1, 2, 3];
        let index = occ(&right, 4);
        let mut hunt = LcsHunt::default();
        let mut chunks = Vec::new();
        let lcs = hunt.run(&[1, 2], 0, &index, 0, Some(&mut chunks));
        assert_eq!(lcs, 2);
        assert_eq!(chunks, vec![Chunk::new(0, 1, 2)]);
    }

    #[test]
    fn split_variant_matches_report_length() {
        let left = [0, 3, 1, 2, 4, 0, 1];
        let right = [3, 0, 1, 2, 0, 4, 4, 1];
        let index = occ(&right, 5);
        let mut hunt = LcsHunt::default();
        let mut chunks = Vec::new();
        let with_chunks = hunt.run(&left, 0, &index, 0, Some(&mut chunks));
        let mut hunt_split = LcsHunt::default();
        let without_chunks = hunt_split.run(&left, 0, &index, 0, None);
        assert_eq!(with_chunks, without_chunks);
        assert_eq!(
            with_chunks,
            chunks.iter().map(|c| c.length).sum::<i32>()
        );
    }
}
