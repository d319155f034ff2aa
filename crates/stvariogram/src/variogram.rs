//! The [`SpaceTimeVariogram`] type: owns the observations and the
//! configuration, and computes every derived quantity on demand.
//!
//! # Caching
//! Getters take `&self` and fill the cache of the quantity they return (and
//! of everything it is derived from) the first time they are called.
//! Setters take `&mut self`, validate their argument *before* touching any
//! state, and then invalidate exactly the stages that depend on what they
//! changed (see [`Stage::dependents`]). A rejected setter leaves the
//! variogram untouched.

use std::{cell::OnceCell, fmt, str::FromStr, sync::Arc};

use ndarray::{Array1, Array2, ArrayView2, ArrayViewMut2};
use stvariogram_nostd_internal::{
    UNCLASSIFIED, classify_into, fill_difference_rows, gather_time_pairs, n_pairs,
    validate_bin_edges,
};
use tracing::{debug, debug_span};

use crate::{
    BinningMethod, Error, Estimator, Executor, LagCount, MaxLag, Metric, SerialExecutor,
    cache::{Caches, Stage},
    metric::{pdist, time_coordinates},
};

/// The two axes of a space-time variogram
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LagAxis {
    Space,
    Time,
}

impl LagAxis {
    pub fn name(&self) -> &'static str {
        match self {
            LagAxis::Space => "space",
            LagAxis::Time => "time",
        }
    }

    fn other(self) -> LagAxis {
        match self {
            LagAxis::Space => LagAxis::Time,
            LagAxis::Time => LagAxis::Space,
        }
    }
}

impl FromStr for LagAxis {
    type Err = Error;

    /// accepts `space`/`s` and `time`/`t` (case-insensitive)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "space" | "s" => Ok(LagAxis::Space),
            "time" | "t" => Ok(LagAxis::Time),
            _ => Err(Error::invalid_axis(s)),
        }
    }
}

/// How the bin edges of one axis are determined
#[derive(Clone, Debug, Default)]
struct AxisBinning {
    method: BinningMethod,
    // explicit edges take precedence over the method
    explicit: Option<Array1<f64>>,
}

/// Check that the coordinates and values describe a space-time dataset
fn validate_data(coordinates: ArrayView2<f64>, values: ArrayView2<f64>) -> Result<(), Error> {
    let [n_points, n_dims] = [coordinates.nrows(), coordinates.ncols()];
    if n_dims == 0 {
        Err(Error::invalid_shape(
            "coordinates need at least one spatial dimension",
        ))
    } else if n_points < 2 {
        Err(Error::invalid_shape(format!(
            "at least 2 locations are required, got {n_points}"
        )))
    } else if values.nrows() != n_points {
        Err(Error::invalid_shape(format!(
            "the values have {} rows, but there are {n_points} coordinates",
            values.nrows()
        )))
    } else if values.ncols() <= 1 {
        Err(Error::invalid_shape(
            "a space-time variogram needs more than one observation on the \
             time axis",
        ))
    } else {
        Ok(())
    }
}

/// Fill `cell` with the output of `f`, unless it already holds a value
fn get_or_try_init<T>(
    cell: &OnceCell<T>,
    f: impl FnOnce() -> Result<T, Error>,
) -> Result<&T, Error> {
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = f()?;
    Ok(cell.get_or_init(|| value))
}

/// The row (or column) indices of the difference tensor that belong to each
/// lag class of one axis
fn class_members(groups: &Array1<isize>, n_lags: usize) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); n_lags];
    for (idx, &group) in groups.iter().enumerate() {
        // a group index >= n_lags can't happen with validated edges, but
        // we don't want to panic over it
        if group != UNCLASSIFIED {
            if let Some(members) = out.get_mut(group as usize) {
                members.push(idx);
            }
        }
    }
    out
}

/// The rows and columns of the difference tensor grouped by lag class
struct LagIndex {
    rows: Vec<Vec<usize>>,
    cols: Vec<Vec<usize>>,
}

impl LagIndex {
    fn n_members(&self, x: usize, t: usize) -> usize {
        self.rows[x].len() * self.cols[t].len()
    }

    /// Append the members of cell `(x, t)` to `buf`, iterating the selected
    /// rows in the outer loop (i.e. the sub-matrix is flattened row-major).
    fn gather_into(&self, diff: &Array2<f64>, x: usize, t: usize, buf: &mut Vec<f64>) {
        buf.reserve(self.n_members(x, t));
        for &row in &self.rows[x] {
            let row = diff.row(row);
            buf.extend(self.cols[t].iter().map(|&col| row[col]));
        }
    }
}

/// The signed differences that belong to a single `(space, time)` lag class
#[derive(Clone, Debug, PartialEq)]
pub struct LagClass {
    pub space_lag: usize,
    pub time_lag: usize,
    pub differences: Vec<f64>,
}

/// Iterator over every lag class; space lags vary in the outer loop and time
/// lags in the inner loop.
///
/// Created by [`SpaceTimeVariogram::lag_classes`]. Calling that method again
/// produces a fresh iterator.
pub struct LagClasses<'a> {
    diff: &'a Array2<f64>,
    index: LagIndex,
    next_cell: usize,
}

impl Iterator for LagClasses<'_> {
    type Item = LagClass;

    fn next(&mut self) -> Option<Self::Item> {
        let n_t = self.index.cols.len();
        let n_cells = self.index.rows.len() * n_t;
        if self.next_cell >= n_cells {
            return None;
        }
        let (x, t) = (self.next_cell / n_t, self.next_cell % n_t);
        self.next_cell += 1;

        let mut differences = Vec::new();
        self.index.gather_into(self.diff, x, t, &mut differences);
        Some(LagClass {
            space_lag: x,
            time_lag: t,
            differences,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n_cells = self.index.rows.len() * self.index.cols.len();
        let remaining = n_cells.saturating_sub(self.next_cell);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LagClasses<'_> {}

/// An experimental space-time semivariogram.
///
/// Holds `n_points` locations (the rows of `coordinates`) that each carry a
/// time series of `n_times` observations (the rows of `values`). Use
/// [`crate::VariogramBuilder`] to construct one.
pub struct SpaceTimeVariogram {
    coordinates: Array2<f64>,
    values: Array2<f64>,
    xdist_metric: Metric,
    tdist_metric: Metric,
    x_lags: usize,
    t_lags: LagCount,
    max_lag: MaxLag,
    xbinning: AxisBinning,
    tbinning: AxisBinning,
    estimator: Estimator,
    pub(crate) executor: Arc<dyn Executor>,
    caches: Caches,
}

impl fmt::Debug for SpaceTimeVariogram {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SpaceTimeVariogram")
            .field("n_points", &self.coordinates.nrows())
            .field("n_dims", &self.coordinates.ncols())
            .field("n_times", &self.values.ncols())
            .field("xdist_metric", &self.xdist_metric)
            .field("tdist_metric", &self.tdist_metric)
            .field("x_lags", &self.n_lags(LagAxis::Space))
            .field("t_lags", &self.n_lags(LagAxis::Time))
            .field("max_lag", &self.max_lag)
            .field("estimator", &self.estimator)
            .field("executor", &self.executor.name())
            .finish()
    }
}

// construction & setters
impl SpaceTimeVariogram {
    /// Create a variogram with the default configuration (see
    /// [`crate::VariogramBuilder`] for the defaults).
    pub(crate) fn from_data(coordinates: Array2<f64>, values: Array2<f64>) -> Result<Self, Error> {
        validate_data(coordinates.view(), values.view())?;
        Ok(Self {
            coordinates,
            values,
            xdist_metric: Metric::default(),
            tdist_metric: Metric::default(),
            x_lags: 10,
            t_lags: LagCount::Max,
            max_lag: MaxLag::default(),
            xbinning: AxisBinning::default(),
            tbinning: AxisBinning::default(),
            estimator: Estimator::default(),
            executor: Arc::new(SerialExecutor),
            caches: Caches::default(),
        })
    }

    /// Replace both the coordinates and the values. Everything derived from
    /// them is recomputed on the next read.
    pub fn set_data<C, V>(
        &mut self,
        coordinates: ArrayView2<C>,
        values: ArrayView2<V>,
    ) -> Result<(), Error>
    where
        C: Copy + Into<f64>,
        V: Copy + Into<f64>,
    {
        let coordinates = coordinates.mapv(Into::into);
        let values = values.mapv(Into::into);
        validate_data(coordinates.view(), values.view())?;
        self.coordinates = coordinates;
        self.values = values;
        self.caches.invalidate_all();
        debug!(
            n_points = self.coordinates.nrows(),
            n_times = self.values.ncols(),
            "replaced coordinates and values"
        );
        Ok(())
    }

    /// Replace the values (one row per location). The number of time steps
    /// may change.
    pub fn set_values<V: Copy + Into<f64>>(&mut self, values: ArrayView2<V>) -> Result<(), Error> {
        let values = values.mapv(Into::into);
        validate_data(self.coordinates.view(), values.view())?;
        self.values = values;
        self.caches.invalidate(Stage::Difference);
        // the time "coordinates" are derived from the number of columns
        self.caches.invalidate(Stage::TimeDistance);
        debug!(n_times = self.values.ncols(), "replaced values");
        Ok(())
    }

    pub fn set_xdist_metric(&mut self, metric: Metric) -> Result<(), Error> {
        metric.validate()?;
        self.xdist_metric = metric;
        self.caches.invalidate(Stage::SpaceDistance);
        Ok(())
    }

    pub fn set_tdist_metric(&mut self, metric: Metric) -> Result<(), Error> {
        metric.validate()?;
        self.tdist_metric = metric;
        self.caches.invalidate(Stage::TimeDistance);
        Ok(())
    }

    /// Set the number of lag classes along `axis`.
    ///
    /// This discards any explicit bin edges of that axis.
    /// [`LagCount::Max`] is only accepted for the time axis.
    pub fn set_lags(&mut self, axis: LagAxis, lags: LagCount) -> Result<(), Error> {
        lags.validate()?;
        match (axis, lags) {
            (LagAxis::Space, LagCount::Max) => {
                return Err(Error::invalid_lag_count(
                    "\"max\" is only supported for the time axis",
                ));
            }
            (LagAxis::Space, LagCount::Count(n)) => {
                self.x_lags = n;
                self.xbinning.explicit = None;
            }
            (LagAxis::Time, lags) => {
                self.t_lags = lags;
                self.tbinning.explicit = None;
            }
        }
        self.invalidate_bins(axis);
        Ok(())
    }

    /// Select the binning method of `axis`, discarding any explicit edges
    pub fn set_bin_method(&mut self, axis: LagAxis, method: BinningMethod) {
        let binning = self.binning_mut(axis);
        binning.method = method;
        binning.explicit = None;
        self.invalidate_bins(axis);
    }

    /// Use fixed bin edges (upper bounds) for `axis`. The number of lag
    /// classes becomes the number of edges.
    pub fn set_bin_edges(&mut self, axis: LagAxis, edges: Vec<f64>) -> Result<(), Error> {
        validate_bin_edges(&edges, true)
            .map_err(|what| Error::invalid_bin_edges(&format!("the {} bin edges", axis.name()), what))?;
        self.binning_mut(axis).explicit = Some(Array1::from(edges));
        self.invalidate_bins(axis);
        Ok(())
    }

    /// Set the largest spatial lag that is binned. The time axis always
    /// spans every observed time separation.
    pub fn set_max_lag(&mut self, max_lag: MaxLag) -> Result<(), Error> {
        max_lag.validate()?;
        self.max_lag = max_lag;
        self.invalidate_bins(LagAxis::Space);
        Ok(())
    }

    /// Replace the estimator. Only the experimental surface is affected.
    pub fn set_estimator(&mut self, estimator: Estimator) -> Result<(), Error> {
        estimator.validate()?;
        self.estimator = estimator;
        self.caches.invalidate(Stage::Experimental);
        Ok(())
    }

    /// Replace the backend used for the difference tensor. The results don't
    /// depend on the executor, so nothing is invalidated.
    pub fn set_executor(&mut self, executor: impl Executor + 'static) {
        self.executor = Arc::new(executor);
    }

    /// Compute every intermediate quantity (distances, bins, groups and the
    /// difference tensor, in that order). With `force`, all cached values
    /// are discarded first.
    pub fn preprocess(&mut self, force: bool) -> Result<(), Error> {
        if force {
            self.caches.invalidate_all();
        }
        self.xdistance();
        self.tdistance();
        self.bins(LagAxis::Space)?;
        self.bins(LagAxis::Time)?;
        self.lag_groups(LagAxis::Space)?;
        self.lag_groups(LagAxis::Time)?;
        self.differences()?;
        Ok(())
    }

    fn binning_mut(&mut self, axis: LagAxis) -> &mut AxisBinning {
        match axis {
            LagAxis::Space => &mut self.xbinning,
            LagAxis::Time => &mut self.tbinning,
        }
    }

    fn invalidate_bins(&mut self, axis: LagAxis) {
        self.caches.invalidate(match axis {
            LagAxis::Space => Stage::SpaceBins,
            LagAxis::Time => Stage::TimeBins,
        });
    }
}

// plain accessors
impl SpaceTimeVariogram {
    /// the `(n_points, n_dims)` coordinates
    pub fn coordinates(&self) -> &Array2<f64> {
        &self.coordinates
    }

    /// the `(n_points, n_times)` values
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn xdist_metric(&self) -> &Metric {
        &self.xdist_metric
    }

    pub fn tdist_metric(&self) -> &Metric {
        &self.tdist_metric
    }

    pub fn max_lag(&self) -> MaxLag {
        self.max_lag
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn bin_method(&self, axis: LagAxis) -> &BinningMethod {
        match axis {
            LagAxis::Space => &self.xbinning.method,
            LagAxis::Time => &self.tbinning.method,
        }
    }

    /// The number of lag classes along `axis`
    pub fn n_lags(&self, axis: LagAxis) -> usize {
        let binning = match axis {
            LagAxis::Space => &self.xbinning,
            LagAxis::Time => &self.tbinning,
        };
        if let Some(edges) = &binning.explicit {
            return edges.len();
        }
        match axis {
            LagAxis::Space => self.x_lags,
            LagAxis::Time => match self.t_lags {
                LagCount::Count(n) => n,
                LagCount::Max => self.values.ncols() - 1,
            },
        }
    }

    /// Whether `stage` currently holds a valid cached value
    pub fn is_cached(&self, stage: Stage) -> bool {
        self.caches.is_cached(stage)
    }
}

// derived quantities
impl SpaceTimeVariogram {
    /// The pairwise spatial distances, as a flattened upper triangle with
    /// `n_points * (n_points - 1) / 2` entries.
    pub fn xdistance(&self) -> &Array1<f64> {
        self.caches.xdist.get_or_init(|| {
            debug!(metric = ?self.xdist_metric, "computing spatial distances");
            pdist(self.coordinates.view(), &self.xdist_metric)
        })
    }

    /// The pairwise temporal distances, as a flattened upper triangle with
    /// `n_times * (n_times - 1) / 2` entries. The time step index is the
    /// time coordinate.
    pub fn tdistance(&self) -> &Array1<f64> {
        self.caches.tdist.get_or_init(|| {
            debug!(metric = ?self.tdist_metric, "computing temporal distances");
            let t = time_coordinates(self.values.ncols());
            pdist(t.view(), &self.tdist_metric)
        })
    }

    /// Both distance arrays: `(space, time)`
    pub fn distances(&self) -> (&Array1<f64>, &Array1<f64>) {
        (self.xdistance(), self.tdistance())
    }

    pub fn distance(&self, axis: LagAxis) -> &Array1<f64> {
        match axis {
            LagAxis::Space => self.xdistance(),
            LagAxis::Time => self.tdistance(),
        }
    }

    /// The maximum spatial lag, resolved against the current spatial
    /// distances (`None` means the largest distance)
    pub fn resolved_max_lag(&self) -> Option<f64> {
        self.max_lag.resolve(self.xdistance().as_slice().unwrap_or(&[]))
    }

    /// The bin edges (upper bounds of the lag classes) of `axis`
    pub fn bins(&self, axis: LagAxis) -> Result<&Array1<f64>, Error> {
        let (cell, binning) = match axis {
            LagAxis::Space => (&self.caches.xbins, &self.xbinning),
            LagAxis::Time => (&self.caches.tbins, &self.tbinning),
        };
        get_or_try_init(cell, || {
            if let Some(edges) = &binning.explicit {
                return Ok(edges.clone());
            }
            let distances = self.distance(axis).to_vec();
            let max_lag = match axis {
                LagAxis::Space => self.resolved_max_lag(),
                LagAxis::Time => None,
            };
            let n_lags = self.n_lags(axis);
            debug!(
                axis = axis.name(),
                method = binning.method.name(),
                n_lags,
                ?max_lag,
                "computing bin edges"
            );
            let edges = binning.method.bin_edges(&distances, n_lags, max_lag)?;
            Ok(Array1::from(edges))
        })
    }

    pub fn xbins(&self) -> Result<&Array1<f64>, Error> {
        self.bins(LagAxis::Space)
    }

    pub fn tbins(&self) -> Result<&Array1<f64>, Error> {
        self.bins(LagAxis::Time)
    }

    /// The bin edges of both axes arranged like numpy's `meshgrid`: both
    /// arrays have shape `(t_lags, x_lags)`, the first varies along the
    /// columns (space) and the second along the rows (time).
    pub fn meshbins(&self) -> Result<(Array2<f64>, Array2<f64>), Error> {
        let xbins = self.xbins()?;
        let tbins = self.tbins()?;
        let shape = (tbins.len(), xbins.len());
        let xx = Array2::from_shape_fn(shape, |(_, i)| xbins[i]);
        let tt = Array2::from_shape_fn(shape, |(j, _)| tbins[j]);
        Ok((xx, tt))
    }

    /// The lag class index of every pair along `axis` (parallel to
    /// [`Self::distance`]). Pairs outside every lag class are
    /// [`UNCLASSIFIED`] (`-1`).
    pub fn lag_groups(&self, axis: LagAxis) -> Result<&Array1<isize>, Error> {
        let cell = match axis {
            LagAxis::Space => &self.caches.xgroups,
            LagAxis::Time => &self.caches.tgroups,
        };
        get_or_try_init(cell, || {
            let edges = self.bins(axis)?;
            let distances = self.distance(axis);
            let mut groups = Array1::from_elem(distances.len(), UNCLASSIFIED);
            // the arrays are freshly allocated & contiguous
            let (Some(d), Some(e), Some(g)) = (
                distances.as_slice(),
                edges.as_slice(),
                groups.as_slice_mut(),
            ) else {
                return Err(Error::invalid_shape("non-contiguous pairwise array"));
            };
            classify_into(d, e, g).map_err(Error::invalid_shape)?;
            debug!(axis = axis.name(), "classified pairs");
            Ok(groups)
        })
    }

    /// The number of pairs along `axis` that fall outside every lag class
    /// (and are therefore excluded from every estimate)
    pub fn unclassified_pairs(&self, axis: LagAxis) -> Result<usize, Error> {
        Ok(self
            .lag_groups(axis)?
            .iter()
            .filter(|&&g| g == UNCLASSIFIED)
            .count())
    }

    /// The `(xn, tn)` matrix of pairwise value differences. Entry `[a, b]`
    /// is `v[i, ti] - v[j, tj]`, where `(i, j)` is the `a`-th spatial pair
    /// and `(ti, tj)` the `b`-th temporal pair.
    pub fn differences(&self) -> Result<&Array2<f64>, Error> {
        get_or_try_init(&self.caches.diff, || {
            let [n_points, n_times] = [self.values.nrows(), self.values.ncols()];
            let _span = debug_span!(
                "differences",
                n_points,
                n_times,
                executor = self.executor.name()
            )
            .entered();

            let table_shape = (n_points, n_pairs(n_times));
            let mut hi = Array2::zeros(table_shape);
            let mut lo = Array2::zeros(table_shape);
            gather_time_pairs(self.values.view(), &mut hi.view_mut(), &mut lo.view_mut())
                .map_err(Error::invalid_shape)?;

            let mut out = Array2::from_elem((n_pairs(n_points), n_pairs(n_times)), f64::NAN);
            let (hi, lo) = (hi.view(), lo.view());
            self.executor
                .drive_rows(out.view_mut(), &|first_row: usize, rows: &mut ArrayViewMut2<f64>| {
                    fill_difference_rows(hi, lo, first_row, rows)
                })
                .map_err(Error::invalid_shape)?;
            debug!("filled the difference tensor");
            Ok(out)
        })
    }

    fn lag_index(&self) -> Result<LagIndex, Error> {
        Ok(LagIndex {
            rows: class_members(self.lag_groups(LagAxis::Space)?, self.n_lags(LagAxis::Space)),
            cols: class_members(self.lag_groups(LagAxis::Time)?, self.n_lags(LagAxis::Time)),
        })
    }

    /// Iterate over every lag class. Space lags vary in the outer loop, so
    /// the estimates can be reshaped to `(x_lags, t_lags)` in row-major
    /// order.
    pub fn lag_classes(&self) -> Result<LagClasses<'_>, Error> {
        Ok(LagClasses {
            diff: self.differences()?,
            index: self.lag_index()?,
            next_cell: 0,
        })
    }

    fn check_lag(&self, axis: LagAxis, lag: usize) -> Result<(), Error> {
        let n_lags = self.n_lags(axis);
        if lag < n_lags {
            Ok(())
        } else {
            Err(Error::lag_index_out_of_range(axis.name(), lag, n_lags))
        }
    }

    /// The differences in the lag class with space lag `x` & time lag `t`
    pub fn lag_class_members(&self, x: usize, t: usize) -> Result<Vec<f64>, Error> {
        self.check_lag(LagAxis::Space, x)?;
        self.check_lag(LagAxis::Time, t)?;
        let index = self.lag_index()?;
        let mut out = Vec::new();
        index.gather_into(self.differences()?, x, t, &mut out);
        Ok(out)
    }

    /// The number of differences in every lag class, shape `(x_lags, t_lags)`
    pub fn lag_class_counts(&self) -> Result<Array2<usize>, Error> {
        let index = self.lag_index()?;
        let shape = (index.rows.len(), index.cols.len());
        Ok(Array2::from_shape_fn(shape, |(x, t)| index.n_members(x, t)))
    }

    /// Apply the estimator to cell `(x, t)`; empty cells are NaN
    fn estimate_cell(
        &self,
        index: &LagIndex,
        diff: &Array2<f64>,
        x: usize,
        t: usize,
        buf: &mut Vec<f64>,
    ) -> f64 {
        if index.n_members(x, t) == 0 {
            return f64::NAN;
        }
        buf.clear();
        index.gather_into(diff, x, t, buf);
        self.estimator.estimate(buf)
    }

    /// The experimental variogram, shape `(x_lags, t_lags)`.
    ///
    /// Lag classes without any member pairs are NaN. Fails for estimators
    /// that don't support the full surface (see
    /// [`Estimator::supports_surface`]).
    pub fn experimental(&self) -> Result<&Array2<f64>, Error> {
        get_or_try_init(&self.caches.experimental, || {
            if !self.estimator.supports_surface() {
                return Err(Error::unsupported_estimator_for_surface(
                    self.estimator.name(),
                ));
            }
            let diff = self.differences()?;
            let index = self.lag_index()?;
            let _span = debug_span!("experimental", estimator = self.estimator.name()).entered();
            debug!(
                unclassified_space_pairs = self.unclassified_pairs(LagAxis::Space)?,
                unclassified_time_pairs = self.unclassified_pairs(LagAxis::Time)?,
                "pairs outside of every lag class are excluded"
            );

            let mut buf = Vec::new();
            let shape = (index.rows.len(), index.cols.len());
            let mut out = Array2::from_elem(shape, f64::NAN);
            for ((x, t), cell) in out.indexed_iter_mut() {
                *cell = self.estimate_cell(&index, diff, x, t, &mut buf);
            }
            Ok(out)
        })
    }

    /// The marginal variogram of `axis`: the estimates for every lag class
    /// of `axis`, with the other axis fixed at lag class `lag`.
    ///
    /// `lag = 0` gives what is usually called *the* marginal variogram.
    /// Unlike [`Self::experimental`], this accepts every estimator.
    pub fn marginal(&self, axis: LagAxis, lag: usize) -> Result<Array1<f64>, Error> {
        self.check_lag(axis.other(), lag)?;
        let diff = self.differences()?;
        let index = self.lag_index()?;
        let mut buf = Vec::new();
        let out = (0..self.n_lags(axis))
            .map(|i| match axis {
                LagAxis::Space => self.estimate_cell(&index, diff, i, lag, &mut buf),
                LagAxis::Time => self.estimate_cell(&index, diff, lag, i, &mut buf),
            })
            .collect();
        Ok(out)
    }
}
