//! The distance engine: named pairwise metrics and the routine that
//! evaluates them over every pair of points.

use std::{fmt, str::FromStr, sync::Arc};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Zip};
use stvariogram_nostd_internal::{UpperTrianglePairs, n_pairs};

use crate::Error;

type MetricFn = dyn Fn(ArrayView1<f64>, ArrayView1<f64>) -> f64 + Send + Sync;

/// A user-supplied metric. The name is only used for display and logging.
#[derive(Clone)]
pub struct CustomMetric {
    name: String,
    func: Arc<MetricFn>,
}

/// A pairwise distance metric.
///
/// The named variants follow the definitions used by
/// `scipy.spatial.distance`; they can be constructed from those names with
/// [`str::parse`].
#[derive(Clone)]
pub enum Metric {
    Euclidean,
    SqEuclidean,
    /// aka manhattan
    Cityblock,
    Chebyshev,
    /// holds the order `p` (always `>= 1`; use [`Metric::minkowski`])
    Minkowski(f64),
    Cosine,
    Canberra,
    Custom(CustomMetric),
}

impl Metric {
    /// Minkowski metric of order `p`, which must be finite and `>= 1`
    pub fn minkowski(p: f64) -> Result<Metric, Error> {
        if p.is_finite() && p >= 1.0 {
            Ok(Metric::Minkowski(p))
        } else {
            Err(Error::invalid_metric(format!(
                "minkowski requires a finite order p >= 1, not {p}"
            )))
        }
    }

    /// Wrap an arbitrary function of two points as a metric
    pub fn custom<F>(name: impl Into<String>, func: F) -> Metric
    where
        F: Fn(ArrayView1<f64>, ArrayView1<f64>) -> f64 + Send + Sync + 'static,
    {
        Metric::Custom(CustomMetric {
            name: name.into(),
            func: Arc::new(func),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::SqEuclidean => "sqeuclidean",
            Metric::Cityblock => "cityblock",
            Metric::Chebyshev => "chebyshev",
            Metric::Minkowski(_) => "minkowski",
            Metric::Cosine => "cosine",
            Metric::Canberra => "canberra",
            Metric::Custom(c) => &c.name,
        }
    }

    /// Reject variants that were built by hand with bad parameters
    pub(crate) fn validate(&self) -> Result<(), Error> {
        match self {
            Metric::Minkowski(p) => Metric::minkowski(*p).map(|_| ()),
            _ => Ok(()),
        }
    }

    /// evaluate the metric for a single pair of points
    pub fn eval(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        match self {
            Metric::Euclidean => squared_diff_norm(a, b).sqrt(),
            Metric::SqEuclidean => squared_diff_norm(a, b),
            Metric::Cityblock => Zip::from(a).and(b).fold(0.0, |acc, &x, &y| acc + (x - y).abs()),
            Metric::Chebyshev => {
                Zip::from(a)
                    .and(b)
                    .fold(0.0, |acc: f64, &x, &y| acc.max((x - y).abs()))
            }
            Metric::Minkowski(p) => Zip::from(a)
                .and(b)
                .fold(0.0, |acc, &x, &y| acc + (x - y).abs().powf(*p))
                .powf(1.0 / p),
            Metric::Cosine => {
                let norm = (a.dot(&a) * b.dot(&b)).sqrt();
                // a zero-length vector has no direction; scipy also yields
                // NaN here
                if norm == 0.0 {
                    f64::NAN
                } else {
                    1.0 - a.dot(&b) / norm
                }
            }
            Metric::Canberra => Zip::from(a).and(b).fold(0.0, |acc, &x, &y| {
                let denom = x.abs() + y.abs();
                // 0/0 terms are dropped
                if denom == 0.0 {
                    acc
                } else {
                    acc + (x - y).abs() / denom
                }
            }),
            Metric::Custom(c) => (c.func)(a, b),
        }
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::Euclidean
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Metric::Minkowski(p) => write!(f, "Minkowski({p})"),
            Metric::Custom(c) => write!(f, "Custom({:?})", c.name),
            other => write!(f, "{}", other.name()),
        }
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "euclidean" => Ok(Metric::Euclidean),
            "sqeuclidean" => Ok(Metric::SqEuclidean),
            "cityblock" | "manhattan" => Ok(Metric::Cityblock),
            "chebyshev" => Ok(Metric::Chebyshev),
            // scipy's default order
            "minkowski" => Ok(Metric::Minkowski(2.0)),
            "cosine" => Ok(Metric::Cosine),
            "canberra" => Ok(Metric::Canberra),
            _ => Err(Error::invalid_metric(format!(
                "\"{s}\" is not a known metric. Choices include: [\"euclidean\", \
                 \"sqeuclidean\", \"cityblock\", \"chebyshev\", \"minkowski\", \
                 \"cosine\", \"canberra\"]"
            ))),
        }
    }
}

fn squared_diff_norm(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    Zip::from(a).and(b).fold(0.0, |acc, &x, &y| {
        let diff = x - y;
        acc + diff * diff
    })
}

/// Compute the distance between every pair of points.
///
/// `points` has shape `(n_points, n_dims)`. The result is the strict upper
/// triangle of the `(n_points, n_points)` distance matrix, flattened in
/// row-major order, so it holds `n_points * (n_points - 1) / 2` entries.
pub fn pdist(points: ArrayView2<f64>, metric: &Metric) -> Array1<f64> {
    let n_points = points.nrows();
    let mut out = Array1::zeros(n_pairs(n_points));
    for (d, (i, j)) in out.iter_mut().zip(UpperTrianglePairs::new(n_points)) {
        *d = metric.eval(points.row(i), points.row(j));
    }
    out
}

/// Construct the pseudo-coordinates of the time axis.
///
/// Time step `k` becomes the point `(k, 0)`, so time distances go through
/// exactly the same metric machinery as spatial distances.
pub fn time_coordinates(n_times: usize) -> Array2<f64> {
    Array2::from_shape_fn((n_times, 2), |(k, dim)| if dim == 0 { k as f64 } else { 0.0 })
}
