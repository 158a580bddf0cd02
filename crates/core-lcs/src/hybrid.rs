//! Hybrid driver choosing between the Myers and Hunt kernels.
//!
//! The choice is made from runtime estimates: cheap worst-case bounds first
//! (which can skip building the occurrence index entirely), then refined
//! estimates from sequence statistics. When the chosen kernel's backpointer
//! variant would exceed the memory budget, the driver runs the linear-memory
//! split variant instead and recurses on both halves of the split point,
//! keeping overall memory linear without changing the asymptotic runtime.
//!
//! The LCS bound formulas follow "Fast Algorithms to Approximate LCS
//! Length" (Pal and Bansal); the statistical variables are named as in the
//! paper.

use crate::LcsItem;
use crate::chunks::{Chunk, append_chunk};
use crate::hunt::{BACK_POINTER_SIZE, KeyOccurrences, LcsHunt};
use crate::myers::LcsMyers;
use crate::options::{LcsOptions, MEMORY_LIMIT_EXCEEDED};

const INT_SIZE: i64 = std::mem::size_of::<i32>() as i64;

/// Statistics over a sequence pair used to bound the LCS length.
///
/// Construction is O(left_size + right_size) given the right side as a
/// [`KeyOccurrences`] index, with O(max_keys) extra memory.
#[derive(Debug)]
pub struct LcsStats {
    left_size: i64,
    right_size: i64,
    gamma: i32,
    beta: i64,
    used_keys: i32,
}

impl LcsStats {
    pub fn new<T: LcsItem>(left: &[T], right: &KeyOccurrences) -> Self {
        let first_match = &right.first_match;
        // Track how many occurrences of each key the left scan has already
        // consumed on the right.
        let mut consumed_matches = first_match.clone();
        let mut gamma = 0;
        let mut beta = 0i64;
        let mut used_keys = 0;
        for item in left {
            let k = item.key();
            // Only the first use of a key counts it as shared.
            if consumed_matches[k] == first_match[k] {
                used_keys += 1;
            }
            // beta: sum over keys of occ_left * occ_right, incrementally.
            beta += (first_match[k + 1] - first_match[k]) as i64;
            // gamma: sum over keys of min(occ_left, occ_right).
            if consumed_matches[k] < first_match[k + 1] {
                gamma += 1;
            }
            consumed_matches[k] += 1;
        }
        Self {
            left_size: left.len() as i64,
            right_size: right.len() as i64,
            gamma,
            beta,
            used_keys,
        }
    }

    /// Sum over keys of `occ_left * occ_right`; the instruction count of
    /// Hunt's inner loop.
    pub fn beta(&self) -> i64 {
        self.beta
    }

    /// Sum over keys of `min(occ_left, occ_right)`.
    pub fn gamma(&self) -> i32 {
        self.gamma
    }

    /// Number of keys occurring in both sequences.
    pub fn keys(&self) -> i32 {
        self.used_keys
    }

    /// Lower and upper bounds for the LCS length.
    pub fn lcs_bounds(&self) -> (i32, i32) {
        if self.gamma == 0 {
            return (0, 0);
        }
        let max_lcs = self.left_size.min(self.right_size);
        // beta <= left_size * right_size implies the lower bound is at most
        // min(left_size, right_size).
        let lower = (self.beta / (self.left_size + self.right_size)) as i32;
        let upper_estimate =
            (self.beta as f64 * self.used_keys as f64 / self.gamma as f64).min(max_lcs as f64);
        // Precision issues may push the estimate below the lower bound.
        let upper = (upper_estimate as i32).max(lower);
        (lower, upper)
    }

    /// Lower and upper bounds for the difference between the sequences.
    pub fn diff_bounds(&self) -> (i32, i32) {
        let (lcs_lower, lcs_upper) = self.lcs_bounds();
        let total = (self.left_size + self.right_size) as i32;
        (total - lcs_upper * 2, total - lcs_lower * 2)
    }
}

fn sqr(a: f32) -> f32 {
    a * a
}

/// Memory consumption of the backpointer variant of Myers' algorithm for a
/// given maximum diff.
fn myers_memory_consumption(max_diff: i64) -> i64 {
    let k_max = (max_diff + 1) / 2;
    (k_max + 2) * (k_max + 1) * INT_SIZE
}

/// Runtime and memory estimates for the two kernels. The output chunk
/// vector is not counted.
pub struct LcsHybridEstimator<'a> {
    left_size: i64,
    right_size: i64,
    options: &'a LcsOptions,
}

impl<'a> LcsHybridEstimator<'a> {
    pub fn new(left_size: usize, right_size: usize, options: &'a LcsOptions) -> Self {
        Self {
            left_size: left_size as i64,
            right_size: right_size as i64,
            options,
        }
    }

    // Estimates relying only on the sequence sizes.

    pub fn myers_worst_case_runtime(&self) -> f32 {
        sqr((self.left_size + self.right_size) as f32) * self.options.myers_factor
    }

    pub fn myers_worst_case_memory(&self) -> i64 {
        myers_memory_consumption(self.left_size + self.right_size)
    }

    pub fn myers_split_memory(&self) -> i64 {
        (2 + self.left_size + self.right_size) * INT_SIZE
    }

    // Estimates additionally relying on max_keys.

    pub fn hunts_best_case_runtime(&self) -> f32 {
        let keys = self.options.max_keys;
        // Best case: every key occurs with the same probability. (Sharing
        // no keys at all would be better still, but assuming that is too
        // optimistic.) The init term covers building the occurrence index
        // and the statistics, which have to be paid before Hunt can run.
        let min_beta = self.right_size as f32 * self.left_size as f32 / keys as f32;
        self.options.init_factor * self.right_size as f32
            + self.options.estimate_factor * self.left_size as f32
            + self.options.hunt_factor * min_beta
    }

    pub fn hunts_split_memory(&self) -> i64 {
        self.right_size * 4 * INT_SIZE + self.key_occurrences_memory()
    }

    pub fn key_occurrences_memory(&self) -> i64 {
        (self.options.max_keys as i64 + 1 + self.right_size) * INT_SIZE
    }

    pub fn init_memory(&self) -> i64 {
        self.key_occurrences_memory() + (self.options.max_keys as i64 + 1) * INT_SIZE
    }

    /// A memory budget, linear in the input size, under which the split
    /// variants of both kernels are guaranteed to run. Returning the
    /// maximum of both kernels' needs lets the faster one be picked later.
    pub fn memory_recommendation(&self) -> i64 {
        let min_hunts_memory = self.init_memory().max(self.hunts_split_memory());
        min_hunts_memory.max(self.myers_split_memory())
    }

    // Estimates additionally relying on sequence statistics.

    pub fn myers_runtime(&self, stats: &LcsStats) -> f32 {
        let (lower_bound, upper_bound) = stats.diff_bounds();
        let weighted_bound = lower_bound as f32 * self.options.lcs_bound_ratio
            + upper_bound as f32 * (1.0 - self.options.lcs_bound_ratio);
        // Modelled by the executions of the innermost loop, which tracks
        // the observed runtime closely outside of degenerate inputs.
        sqr(weighted_bound) * self.options.myers_factor
    }

    pub fn hunts_runtime(&self, stats: &LcsStats) -> f32 {
        stats.beta() as f32 * self.options.hunt_factor
    }

    pub fn hunts_memory(&self, stats: &LcsStats) -> i64 {
        // Worst case: the innermost loop writes a backpointer every time,
        // and it executes beta times.
        stats.beta() * BACK_POINTER_SIZE + self.right_size * INT_SIZE + self.key_occurrences_memory()
    }

    pub fn myers_memory(&self, stats: &LcsStats) -> i64 {
        let (_, upper_bound) = stats.diff_bounds();
        myers_memory_consumption(upper_bound as i64)
    }
}

/// Reborrows an optional chunk sink so it can be handed out more than
/// once.
fn reborrow<'a>(chunks: &'a mut Option<&mut Vec<Chunk>>) -> Option<&'a mut Vec<Chunk>> {
    chunks.as_mut().map(|c| &mut **c)
}

/// Hybrid LCS over items that expose a dense integer key.
#[derive(Debug, Default)]
pub struct LcsHybrid {
    options: LcsOptions,
    right_occ: KeyOccurrences,
    myers: LcsMyers,
    hunt: LcsHunt,
}

impl LcsHybrid {
    pub fn new(options: LcsOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options_mut(&mut self) -> &mut LcsOptions {
        &mut self.options
    }

    /// Computes the LCS of `left` and `right`. Matching chunks are appended
    /// to `chunks` when present, shifted by the given offsets. Returns the
    /// LCS length, or a negative error code.
    pub fn run<T: LcsItem>(
        &mut self,
        left: &[T],
        left_offset: i32,
        right: &[T],
        right_offset: i32,
        mut chunks: Option<&mut Vec<Chunk>>,
    ) -> i32 {
        // Consume leading matches.
        let mut leading = 0;
        while leading < left.len().min(right.len()) && left[leading] == right[leading] {
            leading += 1;
        }
        let (left, right) = (&left[leading..], &right[leading..]);
        if leading > 0 {
            if let Some(chunks) = reborrow(&mut chunks) {
                append_chunk(left_offset, right_offset, leading as i32, chunks);
            }
        }
        let left_offset = left_offset + leading as i32;
        let right_offset = right_offset + leading as i32;

        // Consume trailing matches.
        let mut trailing = 0;
        while trailing < left.len().min(right.len())
            && left[left.len() - trailing - 1] == right[right.len() - trailing - 1]
        {
            trailing += 1;
        }
        let (left, right) = (&left[..left.len() - trailing], &right[..right.len() - trailing]);

        let lcs = self.run_hybrid(left, left_offset, right, right_offset, reborrow(&mut chunks));
        if lcs < 0 {
            return lcs;
        }

        if trailing > 0 {
            if let Some(chunks) = chunks {
                append_chunk(
                    left_offset + left.len() as i32,
                    right_offset + right.len() as i32,
                    trailing as i32,
                    chunks,
                );
            }
        }
        lcs + leading as i32 + trailing as i32
    }

    fn run_hybrid<T: LcsItem>(
        &mut self,
        left: &[T],
        left_offset: i32,
        right: &[T],
        right_offset: i32,
        mut chunks: Option<&mut Vec<Chunk>>,
    ) -> i32 {
        if left.is_empty() || right.is_empty() {
            return 0;
        }

        let estimator = LcsHybridEstimator::new(left.len(), right.len(), &self.options);
        let use_hunt;
        let mut memory_consumption;
        // Skip the statistics entirely when Myers is certain to win.
        if estimator.myers_worst_case_runtime() <= estimator.hunts_best_case_runtime()
            && estimator.myers_worst_case_memory() <= self.options.max_memory
        {
            use_hunt = false;
            memory_consumption = estimator.myers_worst_case_memory();
        } else if estimator.init_memory() > self.options.max_memory {
            // Not even Hunt's basic data structures fit; give Myers a try.
            use_hunt = false;
            memory_consumption = estimator.myers_worst_case_memory();
        } else {
            self.right_occ.init(right, self.options.max_keys as usize);
            let stats = LcsStats::new(left, &self.right_occ);
            // Pick the faster kernel. Myers is the more memory efficient
            // one, so pick it whenever Hunt does not fit even in the
            // recursive variant.
            use_hunt = estimator.hunts_runtime(&stats) < estimator.myers_runtime(&stats)
                && estimator.hunts_split_memory() <= self.options.max_memory;
            memory_consumption = if use_hunt {
                estimator.hunts_memory(&stats)
            } else {
                estimator.myers_memory(&stats)
            };
        }

        let mut split_only = false;
        if memory_consumption > self.options.max_memory {
            // The backpointer variant does not fit; fall back to the
            // split-point variant and recurse.
            split_only = true;
            memory_consumption = if use_hunt {
                estimator.hunts_split_memory()
            } else {
                estimator.myers_split_memory()
            };
            if memory_consumption > self.options.max_memory {
                return MEMORY_LIMIT_EXCEEDED;
            }
        }

        let kernel_chunks = if split_only {
            None
        } else {
            reborrow(&mut chunks)
        };
        let lcs = if use_hunt {
            self.hunt
                .run(left, left_offset, &self.right_occ, right_offset, kernel_chunks)
        } else {
            self.myers
                .run(left, left_offset, right, right_offset, kernel_chunks)
        };

        if split_only && chunks.is_some() && lcs > 0 {
            // Reconstruct the chunks by solving both halves of the split
            // point recursively; each half fits the same memory budget.
            let (split_x, split_y) = if use_hunt {
                (self.hunt.split_x(), self.hunt.split_y())
            } else {
                (self.myers.split_x(), self.myers.split_y())
            };
            let (sx, sy) = (split_x as usize, split_y as usize);
            let a = self.run(
                &left[..sx],
                left_offset,
                &right[..sy],
                right_offset,
                reborrow(&mut chunks),
            );
            let b = self.run(
                &left[sx..],
                left_offset + split_x,
                &right[sy..],
                right_offset + split_y,
                chunks,
            );
            debug_assert_eq!(a + b, lcs);
        }
        lcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_bounds_are_ordered() {
        let left = [0, 1, 2, 0, 1];
        let right = [1, 0, 2, 2, 1];
        let mut occ = KeyOccurrences::default();
        occ.init(&right, 3);
        let stats = LcsStats::new(&left, &occ);
        let (lcs_lower, lcs_upper) = stats.lcs_bounds();
        assert!(0 <= lcs_lower && lcs_lower <= lcs_upper);
        assert!(lcs_upper <= 5);
        let (diff_lower, diff_upper) = stats.diff_bounds();
        assert!(diff_lower <= diff_upper);
    }

    #[test]
    fn stats_on_disjoint_inputs() {
        let left = [0, 0];
        let right = [1, 1, 1];
        let mut occ = KeyOccurrences::default();
        occ.init(&right, 2);
        let stats = LcsStats::new(&left, &occ);
        assert_eq!(stats.gamma(), 0);
        assert_eq!(stats.lcs_bounds(), (0, 0));
    }

    #[test]
    fn memory_recommendation_allows_split_variants() {
        let options = LcsOptions {
            max_keys: 100,
            ..LcsOptions::default()
        };
        let estimator = LcsHybridEstimator::new(1000, 1000, &options);
        let recommendation = estimator.memory_recommendation();
        assert!(recommendation >= estimator.myers_split_memory());
        assert!(recommendation >= estimator.hunts_split_memory());
        assert!(recommendation >= estimator.init_memory());
    }
}
