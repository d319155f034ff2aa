#![no_std]
//! Kernels shared by the `stvariogram` crate.
//!
//! Everything in here operates on caller-provided buffers and reports
//! problems with `&'static str`. The public crate owns allocation, caching
//! and error translation.

mod diff;
mod lags;
mod pairs;

pub use diff::{fill_difference_rows, gather_time_pairs};
pub use lags::{
    UNCLASSIFIED, classify_into, classify_one, even_width_edges_into, percentile_of_sorted,
    uniform_count_edges_into, validate_bin_edges,
};
pub use pairs::{UpperTrianglePairs, n_pairs, pair_from_index};
