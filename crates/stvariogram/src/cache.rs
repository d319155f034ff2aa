//! Validity tracking for the derived quantities of a
//! [`crate::SpaceTimeVariogram`].
//!
//! Each derived quantity lives in its own [`OnceCell`]. A quantity is
//! computed the first time it is read and stays valid until one of its
//! inputs changes. Invalidation always cascades along the dependency edges
//! described by [`Stage::dependents`], so a cell can never hold a value
//! that was computed from inputs that have since been replaced.

use std::cell::OnceCell;

use ndarray::{Array1, Array2};
use tracing::trace;

/// A derived quantity that is cached
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    SpaceDistance,
    TimeDistance,
    SpaceBins,
    TimeBins,
    SpaceGroups,
    TimeGroups,
    Difference,
    Experimental,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::SpaceDistance,
        Stage::TimeDistance,
        Stage::SpaceBins,
        Stage::TimeBins,
        Stage::SpaceGroups,
        Stage::TimeGroups,
        Stage::Difference,
        Stage::Experimental,
    ];

    /// The stages that are computed directly from this one
    pub fn dependents(self) -> &'static [Stage] {
        match self {
            // the spatial max lag is resolved against the distances, so the
            // bins depend on them even when the edges are fixed by hand
            Stage::SpaceDistance => &[Stage::SpaceBins],
            Stage::TimeDistance => &[Stage::TimeBins],
            Stage::SpaceBins => &[Stage::SpaceGroups],
            Stage::TimeBins => &[Stage::TimeGroups],
            Stage::SpaceGroups | Stage::TimeGroups | Stage::Difference => &[Stage::Experimental],
            Stage::Experimental => &[],
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Caches {
    pub(crate) xdist: OnceCell<Array1<f64>>,
    pub(crate) tdist: OnceCell<Array1<f64>>,
    pub(crate) xbins: OnceCell<Array1<f64>>,
    pub(crate) tbins: OnceCell<Array1<f64>>,
    pub(crate) xgroups: OnceCell<Array1<isize>>,
    pub(crate) tgroups: OnceCell<Array1<isize>>,
    pub(crate) diff: OnceCell<Array2<f64>>,
    pub(crate) experimental: OnceCell<Array2<f64>>,
}

impl Caches {
    pub(crate) fn is_cached(&self, stage: Stage) -> bool {
        match stage {
            Stage::SpaceDistance => self.xdist.get().is_some(),
            Stage::TimeDistance => self.tdist.get().is_some(),
            Stage::SpaceBins => self.xbins.get().is_some(),
            Stage::TimeBins => self.tbins.get().is_some(),
            Stage::SpaceGroups => self.xgroups.get().is_some(),
            Stage::TimeGroups => self.tgroups.get().is_some(),
            Stage::Difference => self.diff.get().is_some(),
            Stage::Experimental => self.experimental.get().is_some(),
        }
    }

    /// drop a single cached value, returning whether there was one
    fn clear(&mut self, stage: Stage) -> bool {
        match stage {
            Stage::SpaceDistance => self.xdist.take().is_some(),
            Stage::TimeDistance => self.tdist.take().is_some(),
            Stage::SpaceBins => self.xbins.take().is_some(),
            Stage::TimeBins => self.tbins.take().is_some(),
            Stage::SpaceGroups => self.xgroups.take().is_some(),
            Stage::TimeGroups => self.tgroups.take().is_some(),
            Stage::Difference => self.diff.take().is_some(),
            Stage::Experimental => self.experimental.take().is_some(),
        }
    }

    /// Drop `stage` and everything that (transitively) depends on it
    pub(crate) fn invalidate(&mut self, stage: Stage) {
        if self.clear(stage) {
            trace!(?stage, "invalidated");
        }
        for &dependent in stage.dependents() {
            self.invalidate(dependent);
        }
    }

    pub(crate) fn invalidate_all(&mut self) {
        for stage in Stage::ALL {
            self.clear(stage);
        }
    }
}
