//! Backends that drive row-wise computations (currently only the
//! difference tensor).
//!
//! Every row of the difference tensor can be computed on its own, so an
//! executor is free to split the rows however it likes. The only contract
//! is that each row ends up in the same place it would have been written by
//! [`SerialExecutor`]; the assembled result is therefore bitwise identical
//! across executors.

use std::num::NonZeroUsize;

use ndarray::{ArrayViewMut2, Axis};
use rayon::{ThreadPoolBuilder, prelude::*};

/// Fills a block of rows. The first argument is the index of the block's
/// first row within the full output.
pub type RowBlockFn<'a> = dyn Fn(usize, &mut ArrayViewMut2<f64>) -> Result<(), &'static str> + Sync + 'a;

pub trait Executor: Send + Sync {
    /// Invoke `fill` on disjoint blocks of rows that together cover `out`
    fn drive_rows(&self, out: ArrayViewMut2<f64>, fill: &RowBlockFn) -> Result<(), &'static str>;

    fn name(&self) -> &'static str;
}

/// Fills every row from the calling thread
#[derive(Clone, Copy, Debug, Default)]
pub struct SerialExecutor;

impl Executor for SerialExecutor {
    fn drive_rows(
        &self,
        mut out: ArrayViewMut2<f64>,
        fill: &RowBlockFn,
    ) -> Result<(), &'static str> {
        fill(0, &mut out)
    }

    fn name(&self) -> &'static str {
        "serial"
    }
}

/// Splits the rows into (at most) `n_threads` contiguous blocks and fills
/// them from a rayon thread pool of that size.
#[derive(Clone, Copy, Debug)]
pub struct ThreadedExecutor {
    n_threads: NonZeroUsize,
}

impl ThreadedExecutor {
    pub fn new(n_threads: NonZeroUsize) -> Self {
        Self { n_threads }
    }

    /// use the parallelism reported by the OS (falling back to 1 thread)
    pub fn from_available_parallelism() -> Self {
        let n_threads = std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN);
        Self { n_threads }
    }

    pub fn n_threads(&self) -> NonZeroUsize {
        self.n_threads
    }
}

impl Executor for ThreadedExecutor {
    fn drive_rows(&self, mut out: ArrayViewMut2<f64>, fill: &RowBlockFn) -> Result<(), &'static str> {
        let n_rows = out.nrows();
        if n_rows == 0 {
            return Ok(());
        }
        let rows_per_block = n_rows.div_ceil(self.n_threads.get());
        if rows_per_block == n_rows {
            return fill(0, &mut out);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.n_threads.get())
            .build()
            .map_err(|_| "unable to start the worker threads")?;
        pool.install(|| {
            out.axis_chunks_iter_mut(Axis(0), rows_per_block)
                .into_par_iter()
                .enumerate()
                .try_for_each(|(block, mut rows)| fill(block * rows_per_block, &mut rows))
        })
    }

    fn name(&self) -> &'static str {
        "threaded"
    }
}
