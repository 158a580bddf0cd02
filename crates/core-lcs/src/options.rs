//! Tuning knobs for the hybrid LCS engine.

/// Negative return value: the computation would exceed the configured
/// memory budget even in its linear-memory form.
pub const MEMORY_LIMIT_EXCEEDED: i32 = -1;
/// Negative return value: the difference between the sequences exceeds the
/// search bound.
pub const MAX_DIFF_EXCEEDED: i32 = -3;

// Runtime factors measured on representative inputs. They only matter
// relative to each other: the estimators multiply them with instruction
// counts to pick the cheaper kernel.
const HUNT_FACTOR: f32 = 0.000000037547156;
const MYERS_FACTOR: f32 = 0.000000001179166;
const INIT_FACTOR: f32 = 0.000000002785935;
const ESTIMATE_FACTOR: f32 = 0.000000003818995;

/// Configuration for [`crate::Lcs`].
///
/// `max_memory` bounds the scratch memory the engine may allocate. When the
/// backpointer variants would exceed it, the engine switches to recursive
/// split-point variants with linear memory consumption; if even those do not
/// fit, the run fails with [`MEMORY_LIMIT_EXCEEDED`].
///
/// `max_keys` is an exclusive upper bound on the integer keys in the input.
/// The runtime of Hunt's algorithm depends on it; callers that map their
/// input through [`crate::map_to_integer`] should pass the returned key
/// count.
///
/// The runtime of Myers' algorithm depends on the (unknown) number of
/// differences, which can only be bounded. `lcs_bound_ratio` weights the
/// lower and upper difference bounds as
/// `ratio * lower + (1 - ratio) * upper` when estimating it.
#[derive(Debug, Clone, PartialEq)]
pub struct LcsOptions {
    pub hunt_factor: f32,
    pub myers_factor: f32,
    pub init_factor: f32,
    pub estimate_factor: f32,
    pub lcs_bound_ratio: f32,
    pub max_memory: i64,
    pub max_keys: i32,
}

impl Default for LcsOptions {
    fn default() -> Self {
        Self {
            hunt_factor: HUNT_FACTOR,
            myers_factor: MYERS_FACTOR,
            init_factor: INIT_FACTOR,
            estimate_factor: ESTIMATE_FACTOR,
            lcs_bound_ratio: 0.7,
            // 1 MiB is sufficient for most inputs.
            max_memory: 1 << 20,
            max_keys: i32::MAX,
        }
    }
}

impl LcsOptions {
    /// Raises the memory budget to at least `memory`.
    pub fn recommend_memory(&mut self, memory: i64) {
        if memory > self.max_memory {
            self.max_memory = memory;
        }
    }
}
