//! The difference-tensor kernel.
//!
//! For `n` points with `t` observations each, the tensor has one row per
//! spatial pair `(i, j)` and one column per temporal pair `(ti, tj)` (both
//! in [`UpperTrianglePairs`] order) and holds `v[i, ti] - v[j, tj]`.
//!
//! Evaluating that directly means 4 nested loops and a lot of strided
//! reads. Instead, we note that the left operand only depends on `(i, b)`
//! and the right operand only depends on `(j, b)` (where `b` is the column).
//! So we gather two `(n, tn)` tables once:
//! - `hi[p, b] = v[p, ti(b)]`
//! - `lo[p, b] = v[p, tj(b)]`
//!
//! and every tensor row then becomes a single contiguous subtraction,
//! `hi[i, :] - lo[j, :]`. Each table row is reused by every pair that
//! shares the point.
//!
//! Rows are independent of each other, so a caller is free to hand out
//! disjoint blocks of rows to different threads (see
//! [`fill_difference_rows`]).

use crate::pairs::{UpperTrianglePairs, n_pairs};
use ndarray::{ArrayView2, ArrayViewMut2, Axis, Zip};

/// Fill the gathered operand tables described in the module docs.
///
/// `values` has shape `(n, t)`, `hi` and `lo` must both have shape
/// `(n, t*(t-1)/2)`.
pub fn gather_time_pairs(
    values: ArrayView2<f64>,
    hi: &mut ArrayViewMut2<f64>,
    lo: &mut ArrayViewMut2<f64>,
) -> Result<(), &'static str> {
    let [n_points, n_times] = [values.shape()[0], values.shape()[1]];
    let shape = [n_points, n_pairs(n_times)];
    if hi.shape() != &shape[..] || lo.shape() != &shape[..] {
        return Err("the gathered tables must have shape (n_points, n_time_pairs)");
    }

    for (b, (ti, tj)) in UpperTrianglePairs::new(n_times).enumerate() {
        hi.column_mut(b).assign(&values.column(ti));
        lo.column_mut(b).assign(&values.column(tj));
    }
    Ok(())
}

/// Fill a contiguous block of difference-tensor rows.
///
/// `out` holds the rows with flattened spatial-pair indices
/// `first_row..first_row + out.nrows()`. `hi` and `lo` are the tables
/// produced by [`gather_time_pairs`].
pub fn fill_difference_rows(
    hi: ArrayView2<f64>,
    lo: ArrayView2<f64>,
    first_row: usize,
    out: &mut ArrayViewMut2<f64>,
) -> Result<(), &'static str> {
    let n_points = hi.nrows();
    if lo.shape() != hi.shape() {
        return Err("the gathered tables must have the same shape");
    } else if out.ncols() != hi.ncols() {
        return Err("the output must have one column per temporal pair");
    } else if first_row + out.nrows() > n_pairs(n_points) {
        return Err("the output rows extend past the last spatial pair");
    }

    let pairs = UpperTrianglePairs::starting_at(n_points, first_row);
    for (mut row, (i, j)) in out.axis_iter_mut(Axis(0)).zip(pairs) {
        Zip::from(&mut row)
            .and(hi.row(i))
            .and(lo.row(j))
            .for_each(|o, &a, &b| *o = a - b);
    }
    Ok(())
}
