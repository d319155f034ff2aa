//! Binning strategies: turning an array of pairwise distances into the
//! upper bounds of the lag classes.

use std::{fmt, str::FromStr, sync::Arc};

use stvariogram_nostd_internal::{
    even_width_edges_into, uniform_count_edges_into, validate_bin_edges,
};

use crate::Error;

type BinFn = dyn Fn(&[f64], usize, Option<f64>) -> Vec<f64> + Send + Sync;

/// A user-supplied binning function.
///
/// It receives the distance array, the number of lag classes and the
/// (resolved) maximum lag, and must return one upper bound per lag class.
#[derive(Clone)]
pub struct CustomBinning {
    name: String,
    func: Arc<BinFn>,
}

/// How the bin edges of an axis get derived from its distances
#[derive(Clone, Default)]
pub enum BinningMethod {
    /// classes of equal width spanning `(0, max_lag]`
    #[default]
    EvenWidth,
    /// classes holding (roughly) the same number of pairs
    UniformCount,
    Custom(CustomBinning),
}

impl BinningMethod {
    pub fn custom<F>(name: impl Into<String>, func: F) -> BinningMethod
    where
        F: Fn(&[f64], usize, Option<f64>) -> Vec<f64> + Send + Sync + 'static,
    {
        BinningMethod::Custom(CustomBinning {
            name: name.into(),
            func: Arc::new(func),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            BinningMethod::EvenWidth => "even",
            BinningMethod::UniformCount => "uniform",
            BinningMethod::Custom(c) => &c.name,
        }
    }

    /// Compute `n_lags` bin edges from `distances`.
    ///
    /// `max_lag` has already been resolved to an absolute distance (see
    /// [`MaxLag::resolve`]).
    pub fn bin_edges(
        &self,
        distances: &[f64],
        n_lags: usize,
        max_lag: Option<f64>,
    ) -> Result<Vec<f64>, Error> {
        if n_lags == 0 {
            return Err(Error::invalid_lag_count("there must be at least 1 lag class"));
        }
        let who = format!("the \"{}\" binning method", self.name());
        let edges = match self {
            BinningMethod::EvenWidth => {
                let mut out = vec![0.0; n_lags];
                even_width_edges_into(distances, max_lag, &mut out)
                    .map_err(|what| Error::invalid_bin_edges(&who, what))?;
                out
            }
            BinningMethod::UniformCount => {
                let largest = distances.iter().copied().filter(|d| !d.is_nan()).fold(
                    f64::NEG_INFINITY,
                    f64::max,
                );
                let mut usable: Vec<f64> = match max_lag {
                    Some(max_lag) if max_lag < largest => distances
                        .iter()
                        .copied()
                        .filter(|&d| d <= max_lag)
                        .collect(),
                    _ => distances.iter().copied().filter(|d| !d.is_nan()).collect(),
                };
                usable.sort_unstable_by(f64::total_cmp);
                let mut out = vec![0.0; n_lags];
                let filled = if usable.is_empty() && max_lag.is_some() {
                    // nothing lies within max_lag; like even-width bins, the
                    // edges stay below every distance and no pair is classified
                    even_width_edges_into(distances, max_lag, &mut out)
                } else {
                    uniform_count_edges_into(&usable, &mut out)
                };
                filled.map_err(|what| Error::invalid_bin_edges(&who, what))?;
                out
            }
            BinningMethod::Custom(c) => {
                let out = (c.func)(distances, n_lags, max_lag);
                if out.len() != n_lags {
                    return Err(Error::invalid_bin_edges(
                        &who,
                        &format!("returned {} edges instead of {n_lags}", out.len()),
                    ));
                }
                out
            }
        };
        validate_bin_edges(&edges, false).map_err(|what| Error::invalid_bin_edges(&who, what))?;
        Ok(edges)
    }
}

impl fmt::Debug for BinningMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BinningMethod::Custom(c) => write!(f, "Custom({:?})", c.name),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl FromStr for BinningMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "even" | "even-width" | "even_width" => Ok(BinningMethod::EvenWidth),
            "uniform" | "uniform-count" | "uniform_count" => Ok(BinningMethod::UniformCount),
            _ => Err(Error::invalid_binning_method(s)),
        }
    }
}

/// The largest spatial distance that takes part in the spatial binning.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum MaxLag {
    /// use the largest observed distance
    #[default]
    Unbounded,
    Absolute(f64),
    /// a fraction (in `(0, 1)`) of the largest observed distance
    Fraction(f64),
    /// the median of the distance array
    Median,
    /// the mean of the distance array
    Mean,
}

impl MaxLag {
    /// Interpret a bare number: values below 1 are a fraction of the largest
    /// distance, anything else is an absolute distance.
    pub fn from_value(value: f64) -> Result<MaxLag, Error> {
        let out = if value < 1.0 {
            MaxLag::Fraction(value)
        } else {
            MaxLag::Absolute(value)
        };
        out.validate()?;
        Ok(out)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        match *self {
            MaxLag::Absolute(v) if !(v.is_finite() && v > 0.0) => Err(Error::invalid_max_lag(
                format!("an absolute maximum lag must be finite and positive, not {v}"),
            )),
            MaxLag::Fraction(f) if !(f > 0.0 && f < 1.0) => Err(Error::invalid_max_lag(format!(
                "a fractional maximum lag must lie between 0 and 1, not {f}"
            ))),
            _ => Ok(()),
        }
    }

    /// Resolve to an absolute distance for the given distance array.
    ///
    /// `Unbounded` (and any statistic of an empty array) resolves to `None`.
    pub fn resolve(&self, distances: &[f64]) -> Option<f64> {
        let finite = || distances.iter().copied().filter(|d| !d.is_nan());
        match *self {
            MaxLag::Unbounded => None,
            MaxLag::Absolute(v) => Some(v),
            MaxLag::Fraction(f) => finite().reduce(f64::max).map(|largest| f * largest),
            MaxLag::Mean => {
                let (sum, count) = finite().fold((0.0, 0_usize), |(s, c), d| (s + d, c + 1));
                (count > 0).then(|| sum / count as f64)
            }
            MaxLag::Median => {
                let mut sorted: Vec<f64> = finite().collect();
                sorted.sort_unstable_by(f64::total_cmp);
                let m = stvariogram_nostd_internal::percentile_of_sorted(&sorted, 50.0);
                (!m.is_nan()).then_some(m)
            }
        }
    }
}

impl FromStr for MaxLag {
    type Err = Error;

    /// accepts `"median"`, `"mean"`, `"none"` or a number (see
    /// [`MaxLag::from_value`])
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "median" => Ok(MaxLag::Median),
            "mean" => Ok(MaxLag::Mean),
            "none" => Ok(MaxLag::Unbounded),
            other => match other.parse::<f64>() {
                Ok(v) => MaxLag::from_value(v),
                Err(_) => Err(Error::invalid_max_lag(format!(
                    "\"{s}\" is not a number, \"median\", \"mean\" or \"none\""
                ))),
            },
        }
    }
}

/// The number of lag classes along an axis
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LagCount {
    Count(usize),
    /// one class per possible time step separation (`n_times - 1`). Only
    /// meaningful for the time axis.
    Max,
}

impl LagCount {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        match self {
            LagCount::Count(0) => Err(Error::invalid_lag_count(
                "there must be at least 1 lag class",
            )),
            _ => Ok(()),
        }
    }
}

impl From<usize> for LagCount {
    fn from(value: usize) -> Self {
        LagCount::Count(value)
    }
}
