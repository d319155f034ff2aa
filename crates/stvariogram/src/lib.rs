/*!
Computes experimental space-time semivariograms from observations that were
taken at fixed spatial locations at a sequence of time steps.

# High-Level: Space-Time Variograms

A semivariogram summarizes how dissimilar two observations are as a
function of their separation. For space-time data, every observation is
compared with every other observation whose location *and* time step
differ, and the squared (or otherwise transformed) differences are
aggregated into a 2D grid of lag classes: one axis for the spatial
separation and one for the temporal separation.

The calculation proceeds in stages, each of which is cached by
[`SpaceTimeVariogram`] and recomputed only after one of its inputs changes:

1. pairwise distances along each axis ([`metric`]),
2. bin edges along each axis ([`binning`]),
3. the lag class of every pair (the "lag groups"),
4. the difference tensor: the signed difference of the values of every
   spatial pair at every temporal pair (filled by an [`Executor`]),
5. the experimental variogram: an [`Estimator`] applied to the
   differences that fall in each lag class.

# User Guide

```
use ndarray::array;
use stvariogram::{LagAxis, VariogramBuilder};

// 3 locations on a line, observed at 4 time steps
let coords = array![[0.0], [1.0], [2.0]];
let values = array![
    [1.0, 2.0, 4.0, 3.0],
    [2.0, 3.0, 5.0, 5.0],
    [0.0, 1.0, 1.0, 2.0],
];
let mut variogram = VariogramBuilder::new()
    .x_lags(2)
    .build(coords.view(), values.view())
    .unwrap();

// shape is (space lags, time lags)
let surface = variogram.experimental().unwrap();
assert_eq!(surface.dim(), (2, 3));

// changing the estimator only discards the surface
variogram.set_estimator("dowd".parse().unwrap()).unwrap();
let marginal = variogram.marginal(LagAxis::Time, 0).unwrap();
assert_eq!(marginal.len(), 3);
```

Progress is reported through [`tracing`] events; install a subscriber to
see them.

# Developer Guide

The numerical kernels that don't need an allocator live in
[`stvariogram_nostd_internal`].

*/

#![deny(rustdoc::broken_intra_doc_links)]

// inform build-system of the crates in this package
pub mod binning;
mod builder;
mod cache;
mod error;
pub mod estimator;
mod executor;
pub mod metric;
mod variogram;

// pull in symbols that visible outside of the package
pub use binning::{BinningMethod, LagCount, MaxLag};
pub use builder::VariogramBuilder;
pub use cache::Stage;
pub use error::{Error, ErrorKind};
pub use estimator::Estimator;
pub use executor::{Executor, RowBlockFn, SerialExecutor, ThreadedExecutor};
pub use metric::{Metric, pdist};
pub use stvariogram_nostd_internal::{UNCLASSIFIED, n_pairs, pair_from_index};
pub use variogram::{LagAxis, LagClass, LagClasses, SpaceTimeVariogram};
