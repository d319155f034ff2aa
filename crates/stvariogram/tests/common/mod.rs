// the reason this is named mod.rs has to do with some complexities of how
// testing is handled
//
// we are following the advice of the rust book
// https://doc.rust-lang.org/book/ch11-03-test-organization.html#submodules-in-integration-tests

#![allow(dead_code)]

use ndarray::{Array2, ArrayView2};
use rand::distr::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use rand_xoshiro::rand_core::SeedableRng;
use tracing_subscriber::EnvFilter;

/// Send the crate's events to the captured test output. `RUST_LOG` overrides
/// the default filter.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stvariogram=debug"));
    // every test calls this, only the first one wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// based on numpy!
// https://numpy.org/doc/stable/reference/generated/numpy.isclose.html
pub fn isclose(actual: f64, ref_val: f64, rtol: f64, atol: f64) -> bool {
    let actual_nan = actual.is_nan();
    let ref_nan = ref_val.is_nan();
    if actual_nan || ref_nan {
        actual_nan && ref_nan
    } else {
        (actual - ref_val).abs() <= (atol + rtol * ref_val.abs())
    }
}

pub fn assert_allclose(actual: ArrayView2<f64>, expected: ArrayView2<f64>, rtol: f64, atol: f64) {
    assert_eq!(actual.dim(), expected.dim(), "shape mismatch");
    for ((idx, a), e) in actual.indexed_iter().zip(expected.iter()) {
        assert!(
            isclose(*a, *e, rtol, atol),
            "mismatch at {idx:?}: actual = {a}, expected = {e}"
        );
    }
}

/// random `(n_points, n_dims)` coordinates & `(n_points, n_times)` values
pub fn random_dataset(
    seed: u64,
    n_points: usize,
    n_dims: usize,
    n_times: usize,
) -> (Array2<f64>, Array2<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let coord_distr = Uniform::try_from(0.0..10.0).unwrap();
    let value_distr = Uniform::try_from(-5.0..5.0).unwrap();
    let coords = Array2::from_shape_fn((n_points, n_dims), |_| coord_distr.sample(&mut rng));
    let values = Array2::from_shape_fn((n_points, n_times), |_| value_distr.sample(&mut rng));
    (coords, values)
}

/// the difference tensor computed the slow & obvious way
pub fn naive_differences(values: ArrayView2<f64>) -> Array2<f64> {
    let (n, t) = values.dim();
    let mut out = Vec::new();
    for i in 0..n {
        for j in (i + 1)..n {
            for ti in 0..t {
                for tj in (ti + 1)..t {
                    out.push(values[[i, ti]] - values[[j, tj]]);
                }
            }
        }
    }
    Array2::from_shape_vec((n * (n - 1) / 2, t * (t - 1) / 2), out).unwrap()
}
