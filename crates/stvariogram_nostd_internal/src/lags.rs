//! Lag-class machinery: computing bin edges and assigning pairwise distances
//! to lag classes.
//!
//! # Convention
//! Bin edges are *upper bounds*. For edges `e[0] <= e[1] <= ... <= e[m-1]`
//! a distance `d` belongs to class `i` if and only if `e[i-1] < d <= e[i]`,
//! where `e[-1]` is taken to be `0`. In other words the intervals are
//! closed on the right, which is the opposite of the histogram-bucket
//! convention used elsewhere in the wider ecosystem. A distance that is not
//! positive, exceeds the last edge, or is NaN is assigned [`UNCLASSIFIED`].

/// The group index assigned to pairs that don't fall into any lag class
pub const UNCLASSIFIED: isize = -1;

/// Determine the lag class of a single distance.
///
/// `bin_edges` must be sorted in non-decreasing order (this isn't checked).
#[inline]
pub fn classify_one(distance: f64, bin_edges: &[f64]) -> isize {
    // NaN fails this comparison too
    if !(distance > 0.0) {
        return UNCLASSIFIED;
    }
    // index of the first edge that is >= distance. Because every earlier
    // edge is < distance, the half-open rule is satisfied even when edges
    // repeat (the repeated classes just end up empty)
    let idx = bin_edges.partition_point(|&edge| edge < distance);
    if idx == bin_edges.len() {
        UNCLASSIFIED
    } else {
        idx as isize
    }
}

/// Classify every entry of `distances`, writing the group indices to `out`.
pub fn classify_into(
    distances: &[f64],
    bin_edges: &[f64],
    out: &mut [isize],
) -> Result<(), &'static str> {
    if distances.len() != out.len() {
        return Err("the output buffer must have one entry per distance");
    }
    for (group, &distance) in out.iter_mut().zip(distances.iter()) {
        *group = classify_one(distance, bin_edges);
    }
    Ok(())
}

/// Check a sequence of bin edges.
///
/// Edges must be finite and non-negative. When `strict` is `true` they must
/// also be strictly increasing (this is what we require from user-provided
/// edges), otherwise they only need to be non-decreasing (uniform-count
/// binning of heavily tied distances legitimately repeats edges).
pub fn validate_bin_edges(bin_edges: &[f64], strict: bool) -> Result<(), &'static str> {
    if bin_edges.is_empty() {
        return Err("at least one bin edge is required");
    } else if bin_edges.iter().any(|x| !x.is_finite()) {
        return Err("bin edges must be finite");
    } else if bin_edges.iter().any(|&x| x < 0.0) {
        return Err("bin edges must not be negative");
    }

    for pair in bin_edges.windows(2) {
        if strict && pair[1] <= pair[0] {
            return Err("bin edges must be in strictly increasing order");
        } else if pair[1] < pair[0] {
            return Err("bin edges must be sorted");
        }
    }
    Ok(())
}

/// largest non-NaN value
fn nan_max(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|x| !x.is_nan())
        .reduce(|a, b| if b > a { b } else { a })
}

/// Fill `out` with equal-width bin edges.
///
/// The classes span `(0, max_lag]`, where `max_lag` falls back to the
/// largest observed distance if it is `None` or exceeds that distance. The
/// number of classes is `out.len()`.
pub fn even_width_edges_into(
    distances: &[f64],
    max_lag: Option<f64>,
    out: &mut [f64],
) -> Result<(), &'static str> {
    if out.is_empty() {
        return Err("the number of lag classes must be positive");
    }
    let Some(largest) = nan_max(distances) else {
        return Err("can't derive bin edges without any distances");
    };
    let max_lag = match max_lag {
        Some(v) if v <= largest => v,
        _ => largest,
    };

    let n_lags = out.len();
    for (i, edge) in out.iter_mut().enumerate() {
        *edge = if i + 1 == n_lags {
            // the largest pair must never fall out due to rounding
            max_lag
        } else {
            max_lag * ((i + 1) as f64) / (n_lags as f64)
        };
    }
    Ok(())
}

/// Computes the `q`-th percentile (`0 <= q <= 100`) of an already sorted
/// slice, linearly interpolating between neighboring entries (this is the
/// default method used by numpy).
///
/// Returns NaN for an empty slice.
pub fn percentile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let pos = (q / 100.0) * ((sorted.len() - 1) as f64);
    let pos = pos.clamp(0.0, (sorted.len() - 1) as f64);
    // pos is non-negative, so truncation is floor (core doesn't have floor)
    let lo = pos as usize;
    let frac = pos - lo as f64;
    if lo + 1 < sorted.len() {
        sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
    } else {
        sorted[lo]
    }
}

/// Fill `out` with bin edges chosen so each class holds (roughly) the same
/// number of pairs.
///
/// `sorted_distances` must be sorted, free of NaN and already restricted to
/// the distances that should take part (i.e. the caller applies the maximum
/// lag). Edge `i` is the `100 * (i + 1) / out.len()` percentile, so the
/// last edge is always the largest distance.
pub fn uniform_count_edges_into(
    sorted_distances: &[f64],
    out: &mut [f64],
) -> Result<(), &'static str> {
    if out.is_empty() {
        return Err("the number of lag classes must be positive");
    } else if sorted_distances.is_empty() {
        return Err("can't derive bin edges without any distances");
    } else if !sorted_distances.is_sorted() {
        return Err("the distances must be sorted");
    }

    let n = out.len() as f64;
    for (i, edge) in out.iter_mut().enumerate() {
        *edge = percentile_of_sorted(sorted_distances, 100.0 * ((i + 1) as f64) / n);
    }
    Ok(())
}
