//! Semivariance estimators.
//!
//! An estimator reduces the signed value differences of one lag class to a
//! single dispersion statistic. Every built-in returns NaN for an empty
//! input, although [`crate::SpaceTimeVariogram`] never actually hands them
//! an empty lag class (it fills those cells with NaN itself).

use std::{fmt, str::FromStr, sync::Arc};

use stvariogram_nostd_internal::percentile_of_sorted;

use crate::Error;

type EstimatorFn = dyn Fn(&[f64]) -> f64 + Send + Sync;

/// A user-supplied estimator
#[derive(Clone)]
pub struct CustomEstimator {
    name: String,
    func: Arc<EstimatorFn>,
    surface: bool,
}

#[derive(Clone, Default)]
pub enum Estimator {
    /// Matheron's classical estimator: half the mean squared difference
    #[default]
    Matheron,
    /// Cressie & Hawkins' robust estimator
    Cressie,
    /// Dowd's median-based estimator
    Dowd,
    /// Genton's highly robust estimator (built on the Qn scale estimator)
    Genton,
    /// range of the absolute differences, normalized by their mean
    MinMax,
    /// the given percentile (in `[0, 100]`) of the absolute differences
    Percentile(f64),
    /// Shannon entropy, in bits, of a histogram with the given number of
    /// equal-width bins.
    ///
    /// This isn't a semivariance in the usual sense and can't be used to
    /// compute the experimental surface, only marginals.
    Entropy(usize),
    Custom(CustomEstimator),
}

impl Estimator {
    pub fn percentile(p: f64) -> Result<Estimator, Error> {
        let out = Estimator::Percentile(p);
        out.validate()?;
        Ok(out)
    }

    pub fn entropy(n_bins: usize) -> Result<Estimator, Error> {
        let out = Estimator::Entropy(n_bins);
        out.validate()?;
        Ok(out)
    }

    pub fn custom<F>(name: impl Into<String>, func: F) -> Estimator
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Estimator::Custom(CustomEstimator {
            name: name.into(),
            func: Arc::new(func),
            surface: true,
        })
    }

    /// Like [`Estimator::custom`], for a statistic that only makes sense
    /// along one axis. Computing the experimental surface with it fails
    /// with [`crate::ErrorKind::UnsupportedEstimatorForSurface`].
    pub fn custom_marginal_only<F>(name: impl Into<String>, func: F) -> Estimator
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        Estimator::Custom(CustomEstimator {
            name: name.into(),
            func: Arc::new(func),
            surface: false,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Estimator::Matheron => "matheron",
            Estimator::Cressie => "cressie",
            Estimator::Dowd => "dowd",
            Estimator::Genton => "genton",
            Estimator::MinMax => "minmax",
            Estimator::Percentile(_) => "percentile",
            Estimator::Entropy(_) => "entropy",
            Estimator::Custom(c) => &c.name,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        match *self {
            Estimator::Percentile(p) if !(0.0..=100.0).contains(&p) => Err(
                Error::invalid_estimator(format!("percentile must lie in [0, 100], not {p}")),
            ),
            Estimator::Entropy(0) => Err(Error::invalid_estimator(
                "entropy needs at least 1 histogram bin",
            )),
            _ => Ok(()),
        }
    }

    /// Whether the estimator may be applied to every cell of the
    /// experimental surface
    pub fn supports_surface(&self) -> bool {
        match self {
            Estimator::Entropy(_) => false,
            Estimator::Custom(c) => c.surface,
            _ => true,
        }
    }

    /// Apply the estimator to a set of signed differences
    pub fn estimate(&self, diffs: &[f64]) -> f64 {
        match self {
            Estimator::Matheron => matheron(diffs),
            Estimator::Cressie => cressie(diffs),
            Estimator::Dowd => dowd(diffs),
            Estimator::Genton => genton(diffs),
            Estimator::MinMax => minmax(diffs),
            Estimator::Percentile(p) => percentile(diffs, *p),
            Estimator::Entropy(n_bins) => entropy(diffs, *n_bins),
            Estimator::Custom(c) => (c.func)(diffs),
        }
    }
}

impl fmt::Debug for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Estimator::Percentile(p) => write!(f, "Percentile({p})"),
            Estimator::Entropy(n) => write!(f, "Entropy({n})"),
            Estimator::Custom(c) => write!(f, "Custom({:?})", c.name),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl FromStr for Estimator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "matheron" => Ok(Estimator::Matheron),
            "cressie" => Ok(Estimator::Cressie),
            "dowd" => Ok(Estimator::Dowd),
            "genton" => Ok(Estimator::Genton),
            "minmax" => Ok(Estimator::MinMax),
            "percentile" => Ok(Estimator::Percentile(50.0)),
            "entropy" => Ok(Estimator::Entropy(10)),
            _ => Err(Error::invalid_estimator(format!(
                "\"{s}\" is not understood. Choices include: [\"matheron\", \
                 \"cressie\", \"dowd\", \"genton\", \"minmax\", \"percentile\", \
                 \"entropy\"], or provide a custom function"
            ))),
        }
    }
}

fn sorted_abs(diffs: &[f64]) -> Vec<f64> {
    let mut out: Vec<f64> = diffs.iter().map(|d| d.abs()).collect();
    out.sort_unstable_by(f64::total_cmp);
    out
}

/// `sum(d^2) / (2 N)`
pub fn matheron(diffs: &[f64]) -> f64 {
    if diffs.is_empty() {
        return f64::NAN;
    }
    diffs.iter().map(|d| d * d).sum::<f64>() / (2.0 * diffs.len() as f64)
}

/// `0.5 * mean(sqrt|d|)^4 / (0.457 + 0.494 / N + 0.045 / N^2)`
pub fn cressie(diffs: &[f64]) -> f64 {
    if diffs.is_empty() {
        return f64::NAN;
    }
    let n = diffs.len() as f64;
    let term1 = (diffs.iter().map(|d| d.abs().sqrt()).sum::<f64>() / n).powi(4);
    let term2 = 0.457 + 0.494 / n + 0.045 / (n * n);
    0.5 * term1 / term2
}

/// `2.198 * median(|d|)^2 / 2`
pub fn dowd(diffs: &[f64]) -> f64 {
    if diffs.is_empty() {
        return f64::NAN;
    }
    let median = percentile_of_sorted(&sorted_abs(diffs), 50.0);
    2.198 * median * median / 2.0
}

/// The `rank`-th smallest (from 0) of `x[j] - x[i]` over all `i < j`, for
/// an ascending `x`, without materializing the `n (n - 1) / 2` spreads.
///
/// The candidates of row `i` are the contiguous range `left[i]..right[i]` of
/// `j`. Every round counts the spreads below and up to a weighted median of
/// the row medians, and discards the part of each row that can't hold the
/// answer. Once at most `n` candidates remain they are sorted directly.
fn select_spread(x: &[f64], rank: usize) -> f64 {
    let n = x.len();
    let mut left: Vec<usize> = (1..=n).collect();
    let mut right = vec![n; n];
    loop {
        let remaining: usize = left
            .iter()
            .zip(&right)
            .map(|(l, r)| r.saturating_sub(*l))
            .sum();
        // spreads in front of a row's range are below the answer
        let below: usize = left.iter().enumerate().map(|(i, l)| l - (i + 1)).sum();
        if remaining <= n {
            let mut rest: Vec<f64> = (0..n)
                .flat_map(|i| (left[i]..right[i]).map(move |j| x[j] - x[i]))
                .collect();
            rest.sort_unstable_by(f64::total_cmp);
            return rest[rank - below];
        }

        let mut medians: Vec<(f64, usize)> = (0..n)
            .filter(|&i| left[i] < right[i])
            .map(|i| (x[(left[i] + right[i] - 1) / 2] - x[i], right[i] - left[i]))
            .collect();
        medians.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));
        let half = remaining.div_ceil(2);
        let mut seen = 0;
        let Some(&(pivot, _)) = medians.iter().find(|(_, weight)| {
            seen += weight;
            seen >= half
        }) else {
            return f64::NAN;
        };

        // per row, the number of spreads < pivot and <= pivot
        let mut n_less = vec![0; n];
        let mut n_upto = vec![0; n];
        let (mut j_less, mut j_upto) = (1, 1);
        for i in 0..n {
            j_less = j_less.max(i + 1);
            while j_less < n && x[j_less] - x[i] < pivot {
                j_less += 1;
            }
            j_upto = j_upto.max(i + 1);
            while j_upto < n && x[j_upto] - x[i] <= pivot {
                j_upto += 1;
            }
            n_less[i] = j_less - (i + 1);
            n_upto[i] = j_upto - (i + 1);
        }

        if rank < n_less.iter().sum::<usize>() {
            for i in 0..n {
                right[i] = right[i].min(i + 1 + n_less[i]);
            }
        } else if rank < n_upto.iter().sum::<usize>() {
            return pivot;
        } else {
            for i in 0..n {
                left[i] = left[i].max(i + 1 + n_upto[i]);
            }
        }
    }
}

/// `0.5 * (2.2191 * Qn)^2`, where `Qn` is the `k`-quantile of
/// `|d_i - d_j|` over all `i < j`, with `k = C(h, 2) / C(N, 2)` and
/// `h = floor(N / 2) + 1`.
///
/// The quantile is found by selection, so memory stays linear in the number
/// of differences. Fewer than 2 differences, or any non-finite difference,
/// yield NaN.
pub fn genton(diffs: &[f64]) -> f64 {
    let n = diffs.len();
    if n < 2 || diffs.iter().any(|d| !d.is_finite()) {
        return f64::NAN;
    }
    let mut sorted = diffs.to_vec();
    sorted.sort_unstable_by(f64::total_cmp);

    let binom2 = |m: usize| (m * m.saturating_sub(1)) as f64 / 2.0;
    let h = n / 2 + 1;
    let k = binom2(h) / binom2(n);

    // linear interpolation between order statistics, as percentile_of_sorted
    let n_spreads = n * (n - 1) / 2;
    let last = (n_spreads - 1) as f64;
    let pos = (k * last).clamp(0.0, last);
    let lo = pos as usize;
    let frac = pos - lo as f64;
    let q_lo = select_spread(&sorted, lo);
    let q = if lo + 1 < n_spreads && frac > 0.0 {
        q_lo + frac * (select_spread(&sorted, lo + 1) - q_lo)
    } else {
        q_lo
    };

    let qn = 2.2191 * q;
    0.5 * qn * qn
}

/// `(max|d| - min|d|) / mean|d|`
pub fn minmax(diffs: &[f64]) -> f64 {
    if diffs.is_empty() {
        return f64::NAN;
    }
    let abs = sorted_abs(diffs);
    let mean = abs.iter().sum::<f64>() / abs.len() as f64;
    (abs[abs.len() - 1] - abs[0]) / mean
}

/// the `p`-th percentile of `|d|`
pub fn percentile(diffs: &[f64], p: f64) -> f64 {
    percentile_of_sorted(&sorted_abs(diffs), p)
}

/// Shannon entropy (bits) of an `n_bins` equal-width histogram of `diffs`
pub fn entropy(diffs: &[f64], n_bins: usize) -> f64 {
    if diffs.is_empty() || n_bins == 0 {
        return f64::NAN;
    }
    let (lo, hi) = diffs
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &d| {
            (lo.min(d), hi.max(d))
        });
    let width = (hi - lo) / n_bins as f64;

    let mut counts = vec![0_usize; n_bins];
    for &d in diffs {
        let idx = if width > 0.0 {
            // the maximum lands in the last bin (numpy's convention)
            (((d - lo) / width) as usize).min(n_bins - 1)
        } else {
            0
        };
        counts[idx] += 1;
    }

    let total = diffs.len() as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}
