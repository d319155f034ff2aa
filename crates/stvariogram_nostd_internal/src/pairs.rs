//! Enumeration of the strict upper triangle of an `n x n` pairwise matrix.
//!
//! Every pairwise array in the package (distances, lag groups, rows and
//! columns of the difference tensor) is laid out in the order produced by
//! [`UpperTrianglePairs`]: `(0,1), (0,2), ..., (0,n-1), (1,2), ...`. The
//! rest of the package relies on all of them agreeing, so this is the only
//! place where that order is spelled out.

/// Number of pairs `(i, j)` with `i < j < n`
#[inline]
pub const fn n_pairs(n: usize) -> usize {
    if n < 2 { 0 } else { n * (n - 1) / 2 }
}

/// flattened index of the first pair in row `i`
#[inline]
const fn row_offset(n: usize, i: usize) -> usize {
    // sum_{k < i} (n - 1 - k)
    i * (2 * n - i - 1) / 2
}

/// Maps a flattened upper-triangle index back to its `(i, j)` pair.
///
/// Returns `None` when `index >= n_pairs(n)`.
pub fn pair_from_index(n: usize, index: usize) -> Option<(usize, usize)> {
    if index >= n_pairs(n) {
        return None;
    }
    // this is only used to find the start of a block of rows, so a linear
    // scan over the rows is plenty (and sidesteps sqrt, which core lacks)
    let mut i = 0;
    while row_offset(n, i + 1) <= index {
        i += 1;
    }
    let j = i + 1 + (index - row_offset(n, i));
    Some((i, j))
}

/// Iterator over the `(i, j)` pairs (with `i < j`) in row-major order.
#[derive(Clone, Debug)]
pub struct UpperTrianglePairs {
    n: usize,
    i: usize,
    j: usize,
    remaining: usize,
}

impl UpperTrianglePairs {
    /// Iterate over every pair of an `n` element set
    pub fn new(n: usize) -> Self {
        Self {
            n,
            i: 0,
            j: 1,
            remaining: n_pairs(n),
        }
    }

    /// Iterate starting at the pair with the flattened index `start`.
    ///
    /// An out-of-range `start` produces an empty iterator.
    pub fn starting_at(n: usize, start: usize) -> Self {
        match pair_from_index(n, start) {
            Some((i, j)) => Self {
                n,
                i,
                j,
                remaining: n_pairs(n) - start,
            },
            None => Self {
                n,
                i: n,
                j: n,
                remaining: 0,
            },
        }
    }
}

impl Iterator for UpperTrianglePairs {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let out = (self.i, self.j);
        self.remaining -= 1;
        self.j += 1;
        if self.j == self.n {
            self.i += 1;
            self.j = self.i + 1;
        }
        Some(out)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for UpperTrianglePairs {}
