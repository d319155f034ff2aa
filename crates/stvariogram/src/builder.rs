use std::{fmt, sync::Arc};

use ndarray::ArrayView2;

use crate::{
    BinningMethod, Error, Estimator, Executor, LagAxis, LagCount, MaxLag, Metric, SerialExecutor,
    SpaceTimeVariogram,
};

/// Configures and constructs a [`SpaceTimeVariogram`].
///
/// The defaults are: euclidean distances on both axes, 10 spatial lag
/// classes, one time lag class per possible time separation
/// ([`LagCount::Max`]), no maximum lag, even-width bins on both axes, the
/// matheron estimator and serial execution.
///
/// Every option is validated by [`VariogramBuilder::build`], which also
/// computes all intermediate quantities up front.
///
/// ```
/// use ndarray::array;
/// use stvariogram::{Estimator, LagCount, VariogramBuilder};
///
/// let coords = array![[0.0, 0.0], [1.0, 0.0], [0.0, 2.0]];
/// let values = array![[1.0, 2.0, 3.0], [2.0, 2.5, 4.0], [0.5, 1.0, 1.0]];
/// let variogram = VariogramBuilder::new()
///     .x_lags(2)
///     .t_lags(LagCount::Max)
///     .estimator(Estimator::Cressie)
///     .build(coords.view(), values.view())
///     .unwrap();
/// assert_eq!(variogram.experimental().unwrap().dim(), (2, 2));
/// ```
#[derive(Clone)]
pub struct VariogramBuilder {
    xdist_metric: Metric,
    tdist_metric: Metric,
    x_lags: LagCount,
    t_lags: LagCount,
    max_lag: MaxLag,
    xbin_method: BinningMethod,
    tbin_method: BinningMethod,
    xbin_edges: Option<Vec<f64>>,
    tbin_edges: Option<Vec<f64>>,
    estimator: Estimator,
    executor: Arc<dyn Executor>,
}

impl fmt::Debug for VariogramBuilder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VariogramBuilder")
            .field("xdist_metric", &self.xdist_metric)
            .field("tdist_metric", &self.tdist_metric)
            .field("x_lags", &self.x_lags)
            .field("t_lags", &self.t_lags)
            .field("max_lag", &self.max_lag)
            .field("xbin_method", &self.xbin_method)
            .field("tbin_method", &self.tbin_method)
            .field("xbin_edges", &self.xbin_edges)
            .field("tbin_edges", &self.tbin_edges)
            .field("estimator", &self.estimator)
            .field("executor", &self.executor.name())
            .finish()
    }
}

impl Default for VariogramBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VariogramBuilder {
    pub fn new() -> Self {
        Self {
            xdist_metric: Metric::default(),
            tdist_metric: Metric::default(),
            x_lags: LagCount::Count(10),
            t_lags: LagCount::Max,
            max_lag: MaxLag::Unbounded,
            xbin_method: BinningMethod::default(),
            tbin_method: BinningMethod::default(),
            xbin_edges: None,
            tbin_edges: None,
            estimator: Estimator::default(),
            executor: Arc::new(SerialExecutor),
        }
    }

    pub fn xdist_metric(mut self, metric: Metric) -> Self {
        self.xdist_metric = metric;
        self
    }

    pub fn tdist_metric(mut self, metric: Metric) -> Self {
        self.tdist_metric = metric;
        self
    }

    pub fn x_lags(mut self, n: usize) -> Self {
        self.x_lags = LagCount::Count(n);
        self
    }

    pub fn t_lags(mut self, lags: impl Into<LagCount>) -> Self {
        self.t_lags = lags.into();
        self
    }

    pub fn max_lag(mut self, max_lag: MaxLag) -> Self {
        self.max_lag = max_lag;
        self
    }

    pub fn bin_method(mut self, axis: LagAxis, method: BinningMethod) -> Self {
        match axis {
            LagAxis::Space => self.xbin_method = method,
            LagAxis::Time => self.tbin_method = method,
        }
        self
    }

    /// Fix the bin edges of `axis`; this overrides the lag count and the
    /// binning method of that axis.
    pub fn bin_edges(mut self, axis: LagAxis, edges: &[f64]) -> Self {
        match axis {
            LagAxis::Space => self.xbin_edges = Some(edges.to_vec()),
            LagAxis::Time => self.tbin_edges = Some(edges.to_vec()),
        }
        self
    }

    pub fn estimator(mut self, estimator: Estimator) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn executor(mut self, executor: impl Executor + 'static) -> Self {
        self.executor = Arc::new(executor);
        self
    }

    /// Build the variogram from `coordinates` (shape `(n_points, n_dims)`)
    /// and `values` (shape `(n_points, n_times)`).
    ///
    /// Besides validating the configuration, this computes the distances,
    /// the bins, the lag groups and the difference tensor.
    pub fn build<C, V>(
        &self,
        coordinates: ArrayView2<C>,
        values: ArrayView2<V>,
    ) -> Result<SpaceTimeVariogram, Error>
    where
        C: Copy + Into<f64>,
        V: Copy + Into<f64>,
    {
        let mut out = SpaceTimeVariogram::from_data(
            coordinates.mapv(Into::into),
            values.mapv(Into::into),
        )?;
        out.set_xdist_metric(self.xdist_metric.clone())?;
        out.set_tdist_metric(self.tdist_metric.clone())?;
        out.set_max_lag(self.max_lag)?;
        out.set_estimator(self.estimator.clone())?;

        for (axis, lags, method, edges) in [
            (LagAxis::Space, self.x_lags, &self.xbin_method, &self.xbin_edges),
            (LagAxis::Time, self.t_lags, &self.tbin_method, &self.tbin_edges),
        ] {
            out.set_lags(axis, lags)?;
            out.set_bin_method(axis, method.clone());
            if let Some(edges) = edges {
                out.set_bin_edges(axis, edges.clone())?;
            }
        }
        out.executor = Arc::clone(&self.executor);

        out.preprocess(false)?;
        Ok(out)
    }
}
