//! Sorted cyclic rotations of a byte block.
//!
//! Rotations are compared cyclically, with no sentinel: rotation `i` is
//! `data[i..] ++ data[..i]`. Identical rotations (periodic input) are
//! ordered by their starting offset.
//!
//! Construction is prefix doubling. Each round ranks every rotation by its
//! first `2k` bytes using the ranks of the first `k`, with two stable
//! counting sorts (second half, then first half). Rounds stop once every
//! rank is distinct or `k` covers the whole block, so the cost is
//! `O(n log n)` regardless of content.

/// Starting offsets of the rotations of a block, in sorted order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixArray {
    offsets: Vec<usize>,
}

impl SuffixArray {
    /// Sort the rotations of `data`.
    pub fn build(data: &[u8]) -> Self {
        let n = data.len();
        if n == 0 {
            return Self {
                offsets: Vec::new(),
            };
        }

        // Round zero: rank by first byte.
        let identity: Vec<usize> = (0..n).collect();
        let mut offsets = counting_sort(&identity, 256, |i| usize::from(data[i]));
        let mut rank = vec![0usize; n];
        let mut classes = assign_ranks(&offsets, &mut rank, |a, b| data[a] == data[b]);

        let mut k = 1;
        while classes < n && k < n {
            let second = counting_sort(&identity, classes, |i| rank[(i + k) % n]);
            offsets = counting_sort(&second, classes, |i| rank[i]);

            let previous = rank.clone();
            classes = assign_ranks(&offsets, &mut rank, |a, b| {
                previous[a] == previous[b] && previous[(a + k) % n] == previous[(b + k) % n]
            });
            k *= 2;
        }

        Self { offsets }
    }

    /// Sorted starting offsets.
    pub fn as_slice(&self) -> &[usize] {
        &self.offsets
    }

    /// Number of rotations.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the block was empty.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Take ownership of the sorted offsets.
    pub fn into_inner(self) -> Vec<usize> {
        self.offsets
    }
}

/// Stable counting sort of `items` by `key`, where every key is below `buckets`.
fn counting_sort(items: &[usize], buckets: usize, key: impl Fn(usize) -> usize) -> Vec<usize> {
    let mut starts = vec![0usize; buckets + 1];
    for &item in items {
        starts[key(item) + 1] += 1;
    }
    for b in 1..=buckets {
        starts[b] += starts[b - 1];
    }

    let mut sorted = vec![0usize; items.len()];
    for &item in items {
        let slot = &mut starts[key(item)];
        sorted[*slot] = item;
        *slot += 1;
    }
    sorted
}

/// Give consecutive dense ranks to `order`, sharing a rank while `same` holds.
///
/// Returns the number of distinct ranks.
fn assign_ranks(order: &[usize], rank: &mut [usize], same: impl Fn(usize, usize) -> bool) -> usize {
    let mut current = 0;
    rank[order[0]] = 0;
    for pair in order.windows(2) {
        if !same(pair[0], pair[1]) {
            current += 1;
        }
        rank[pair[1]] = current;
    }
    current + 1
}
