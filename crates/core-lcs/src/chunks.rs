//! Chunk collection helpers shared by the LCS kernels.
//!
//! Kernels report matches either front-to-back (`append_chunk`) or
//! back-to-front while walking backpointers (`append_reverse_chunk` followed
//! by `reorder_reverse_chunks`). Both paths merge adjacent chunks and drop
//! empty ones, so the resulting vector is always strictly increasing on both
//! axes with no two neighbors mergeable.

/// A run of identical items occurring in both sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// First common item in the left sequence.
    pub left: i32,
    /// First common item in the right sequence.
    pub right: i32,
    /// Number of identical items in both sequences.
    pub length: i32,
}

impl Chunk {
    pub fn new(left: i32, right: i32, length: i32) -> Self {
        Self {
            left,
            right,
            length,
        }
    }
}

/// Returns true if `after` starts immediately after `before` on both axes.
/// Overlapping chunks and chunks in the wrong order are not mergeable.
pub fn can_be_merged(before: &Chunk, after: &Chunk) -> bool {
    before.left + before.length == after.left && before.right + before.length == after.right
}

/// Appends a chunk, merging it into the last chunk where adjacent. Chunks
/// must be appended in ascending order. Empty chunks are ignored.
pub fn append_chunk(left: i32, right: i32, len: i32, chunks: &mut Vec<Chunk>) {
    if len == 0 {
        return;
    }
    let new_chunk = Chunk::new(left, right, len);
    match chunks.last_mut() {
        Some(last) if can_be_merged(last, &new_chunk) => last.length += len,
        _ => chunks.push(new_chunk),
    }
}

/// Same as [`append_chunk`] but for chunks appended in descending order.
pub fn append_reverse_chunk(left: i32, right: i32, len: i32, chunks: &mut Vec<Chunk>) {
    if len == 0 {
        return;
    }
    let new_chunk = Chunk::new(left, right, len);
    match chunks.last_mut() {
        Some(last) if can_be_merged(&new_chunk, last) => {
            last.left -= len;
            last.right -= len;
            last.length += len;
        }
        _ => chunks.push(new_chunk),
    }
}

/// Restores ascending order for the tail section built with
/// [`append_reverse_chunk`], starting at `first_chunk`. Merges the boundary
/// with the preceding ascending section where possible.
pub fn reorder_reverse_chunks(first_chunk: usize, chunks: &mut Vec<Chunk>) {
    if first_chunk > 0 {
        if let Some(&last) = chunks.last() {
            if can_be_merged(&chunks[first_chunk - 1], &last) {
                chunks[first_chunk - 1].length += last.length;
                chunks.pop();
            }
        }
    }
    chunks[first_chunk..].reverse();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_merges_adjacent() {
        let mut chunks = Vec::new();
        append_chunk(0, 0, 2, &mut chunks);
        append_chunk(2, 2, 3, &mut chunks);
        assert_eq!(chunks, vec![Chunk::new(0, 0, 5)]);
    }

    #[test]
    fn append_keeps_gap() {
        let mut chunks = Vec::new();
        append_chunk(0, 0, 2, &mut chunks);
        append_chunk(3, 2, 1, &mut chunks);
        assert_eq!(chunks, vec![Chunk::new(0, 0, 2), Chunk::new(3, 2, 1)]);
    }

    #[test]
    fn append_drops_empty() {
        let mut chunks = Vec::new();
        append_chunk(4, 4, 0, &mut chunks);
        assert!(chunks.is_empty());
    }

    #[test]
    fn reverse_append_and_reorder() {
        let mut chunks = vec![Chunk::new(0, 0, 1)];
        append_reverse_chunk(7, 7, 1, &mut chunks);
        append_reverse_chunk(6, 6, 1, &mut chunks);
        append_reverse_chunk(3, 4, 2, &mut chunks);
        reorder_reverse_chunks(1, &mut chunks);
        assert_eq!(
            chunks,
            vec![
                Chunk::new(0, 0, 1),
                Chunk::new(3, 4, 2),
                Chunk::new(6, 6, 2),
            ]
        );
    }

    #[test]
    fn reorder_merges_with_prefix() {
        // The reverse tail ends where the ascending prefix stops.
        let mut chunks = vec![Chunk::new(0, 0, 2)];
        append_reverse_chunk(5, 5, 1, &mut chunks);
        append_reverse_chunk(2, 2, 2, &mut chunks);
        reorder_reverse_chunks(1, &mut chunks);
        assert_eq!(chunks, vec![Chunk::new(0, 0, 4), Chunk::new(5, 5, 1)]);
    }
}
