mod common;

use common::{assert_allclose, init_logging, isclose, random_dataset};
use ndarray::{Array2, array, s};
use stvariogram::{
    BinningMethod, ErrorKind, Estimator, LagAxis, LagCount, MaxLag, Metric, SpaceTimeVariogram,
    Stage, UNCLASSIFIED, VariogramBuilder,
};

// 3 locations on a line, each with a 3-step time series
fn line_variogram() -> SpaceTimeVariogram {
    #[rustfmt::skip]
    let values = array![
        [1.0, 2.0, 4.0],
        [2.0, 3.0, 5.0],
        [0.0, 1.0, 1.0],
    ];
    VariogramBuilder::new()
        .x_lags(2)
        .t_lags(LagCount::Count(2))
        .max_lag(MaxLag::Absolute(2.0))
        .build(array![[0.0], [1.0], [2.0]].view(), values.view())
        .unwrap()
}

fn random_variogram(seed: u64) -> SpaceTimeVariogram {
    let (coords, values) = random_dataset(seed, 12, 2, 7);
    VariogramBuilder::new()
        .x_lags(5)
        .max_lag(MaxLag::Fraction(0.6))
        .build(coords.view(), values.view())
        .unwrap()
}

fn stages_cached(v: &SpaceTimeVariogram) -> Vec<Stage> {
    Stage::ALL.into_iter().filter(|s| v.is_cached(*s)).collect()
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn line_scenario() {
        init_logging();
        let v = line_variogram();

        assert_eq!(v.xdistance(), &array![1.0, 2.0, 1.0]);
        assert_eq!(v.tdistance(), &array![1.0, 2.0, 1.0]);
        assert_eq!(v.xbins().unwrap(), &array![1.0, 2.0]);
        assert_eq!(v.tbins().unwrap(), &array![1.0, 2.0]);
        assert_eq!(v.lag_groups(LagAxis::Space).unwrap(), &array![0, 1, 0]);
        assert_eq!(v.lag_groups(LagAxis::Time).unwrap(), &array![0, 1, 0]);
        assert_eq!(v.unclassified_pairs(LagAxis::Space).unwrap(), 0);
        assert_eq!(v.unclassified_pairs(LagAxis::Time).unwrap(), 0);

        // row a <-> spatial pair (0,1), (0,2), (1,2)
        // col b <-> temporal pair (0,1), (0,2), (1,2)
        #[rustfmt::skip]
        let expected_diff = array![
            [-2.0, -4.0, -3.0],
            [ 0.0,  0.0,  1.0],
            [ 1.0,  1.0,  2.0],
        ];
        assert_eq!(v.differences().unwrap(), &expected_diff);

        assert_eq!(v.lag_class_counts().unwrap(), array![[4, 2], [2, 1]]);
        assert_eq!(v.lag_class_members(0, 0).unwrap(), vec![-2.0, -3.0, 1.0, 2.0]);
        assert_eq!(v.lag_class_members(1, 1).unwrap(), vec![0.0]);

        let expected_surface = array![[2.25, 4.25], [0.25, 0.0]];
        assert_allclose(
            v.experimental().unwrap().view(),
            expected_surface.view(),
            1e-15,
            0.0,
        );
    }

    #[test]
    fn pair_counts() {
        for (n, t) in [(2, 2), (5, 3), (9, 10)] {
            let (coords, values) = random_dataset(n as u64, n, 3, t);
            let v = VariogramBuilder::new()
                .build(coords.view(), values.view())
                .unwrap();
            let (xn, tn) = (n * (n - 1) / 2, t * (t - 1) / 2);
            assert_eq!(v.xdistance().len(), xn);
            assert_eq!(v.tdistance().len(), tn);
            assert_eq!(v.lag_groups(LagAxis::Space).unwrap().len(), xn);
            assert_eq!(v.differences().unwrap().dim(), (xn, tn));
            assert_eq!(v.experimental().unwrap().dim(), (10, t - 1));
        }
    }

    #[test]
    fn distances_and_groups_stay_aligned() {
        let v = random_variogram(7);
        let distances = v.xdistance().clone();
        let edges = v.xbins().unwrap().clone();
        let groups = v.lag_groups(LagAxis::Space).unwrap().clone();
        for _ in 0..3 {
            assert_eq!(v.xdistance(), &distances);
            assert_eq!(v.lag_groups(LagAxis::Space).unwrap(), &groups);
        }
        for (d, g) in distances.iter().zip(groups.iter()) {
            if *g == UNCLASSIFIED {
                assert!(*d > edges[edges.len() - 1] || *d <= 0.0);
            } else {
                let g = *g as usize;
                assert!(*d <= edges[g]);
                assert!(g == 0 || *d > edges[g - 1]);
            }
        }
    }

    #[test]
    fn distance_on_an_edge_goes_to_the_lower_class() {
        // spatial distances: [2, 3, 1]
        let mut v = VariogramBuilder::new()
            .x_lags(3)
            .build(array![[0.0], [2.0], [3.0]].view(), array![[1, 2], [3, 4], [5, 6]].view())
            .unwrap();
        v.set_bin_edges(LagAxis::Space, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(v.lag_groups(LagAxis::Space).unwrap(), &array![1, 2, 0]);
    }

    #[test]
    fn class_counts_cover_distances_within_the_last_edge() {
        let v = random_variogram(42);
        let edges = v.xbins().unwrap();
        let last_edge = edges[edges.len() - 1];
        let n_within = v
            .xdistance()
            .iter()
            .filter(|&&d| d <= last_edge)
            .count();
        let n_grouped = v
            .lag_groups(LagAxis::Space)
            .unwrap()
            .iter()
            .filter(|&&g| g != UNCLASSIFIED)
            .count();
        assert_eq!(n_within, n_grouped);
        assert_eq!(
            v.unclassified_pairs(LagAxis::Space).unwrap(),
            v.xdistance().len() - n_within
        );
        // the max lag excludes some pairs
        assert!(n_within < v.xdistance().len());

        // counts along the time axis are full, so the surface counts follow
        let counts = v.lag_class_counts().unwrap();
        let tn = v.tdistance().len();
        assert_eq!(counts.sum(), n_within * tn);
    }

    #[test]
    fn repeated_reads_are_bit_identical() {
        let mut v = random_variogram(3);
        let first = v.experimental().unwrap().clone();
        let second = v.experimental().unwrap().clone();
        v.preprocess(true).unwrap();
        let third = v.experimental().unwrap().clone();
        for ((a, b), c) in first.iter().zip(second.iter()).zip(third.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
            assert_eq!(a.to_bits(), c.to_bits());
        }
    }

    #[test]
    fn estimator_change_only_touches_the_surface() {
        let mut v = random_variogram(11);
        let before = v.experimental().unwrap().clone();
        let xdist_ptr = v.xdistance().as_ptr();
        let xbins_ptr = v.xbins().unwrap().as_ptr();
        let tgroups_ptr = v.lag_groups(LagAxis::Time).unwrap().as_ptr();
        let diff_ptr = v.differences().unwrap().as_ptr();

        v.set_estimator(Estimator::Cressie).unwrap();
        assert_eq!(stages_cached(&v), &Stage::ALL[..7]);

        assert_eq!(v.xdistance().as_ptr(), xdist_ptr);
        assert_eq!(v.xbins().unwrap().as_ptr(), xbins_ptr);
        assert_eq!(v.lag_groups(LagAxis::Time).unwrap().as_ptr(), tgroups_ptr);
        assert_eq!(v.differences().unwrap().as_ptr(), diff_ptr);

        let after = v.experimental().unwrap();
        assert_eq!(before.dim(), after.dim());
        assert!(before.iter().zip(after.iter()).any(|(a, b)| a != b));
    }

    #[test]
    fn invalidation_radius() {
        use Stage::*;
        init_logging();
        let (coords, values) = random_dataset(5, 8, 2, 5);
        let mut v = VariogramBuilder::new()
            .x_lags(4)
            .build(coords.view(), values.view())
            .unwrap();
        let refill = |v: &mut SpaceTimeVariogram| {
            v.experimental().unwrap();
            assert_eq!(stages_cached(v), Stage::ALL);
        };

        refill(&mut v);
        let (_, new_values) = random_dataset(6, 8, 2, 6);
        v.set_values(new_values.view()).unwrap();
        assert_eq!(stages_cached(&v), [SpaceDistance, SpaceBins, SpaceGroups]);
        assert_eq!(v.n_lags(LagAxis::Time), 5);

        refill(&mut v);
        v.set_xdist_metric(Metric::Cityblock).unwrap();
        assert_eq!(stages_cached(&v), [TimeDistance, TimeBins, TimeGroups, Difference]);

        refill(&mut v);
        v.set_tdist_metric(Metric::SqEuclidean).unwrap();
        assert_eq!(stages_cached(&v), [SpaceDistance, SpaceBins, SpaceGroups, Difference]);

        refill(&mut v);
        v.set_lags(LagAxis::Space, LagCount::Count(3)).unwrap();
        assert_eq!(
            stages_cached(&v),
            [SpaceDistance, TimeDistance, TimeBins, TimeGroups, Difference]
        );

        refill(&mut v);
        v.set_bin_edges(LagAxis::Time, vec![1.0, 3.0]).unwrap();
        assert_eq!(
            stages_cached(&v),
            [SpaceDistance, TimeDistance, SpaceBins, SpaceGroups, Difference]
        );
        assert_eq!(v.n_lags(LagAxis::Time), 2);

        refill(&mut v);
        v.set_bin_method(LagAxis::Time, BinningMethod::UniformCount);
        assert_eq!(
            stages_cached(&v),
            [SpaceDistance, TimeDistance, SpaceBins, SpaceGroups, Difference]
        );
        // explicit edges were dropped
        assert_eq!(v.n_lags(LagAxis::Time), 5);

        refill(&mut v);
        v.set_max_lag(MaxLag::Median).unwrap();
        assert_eq!(
            stages_cached(&v),
            [SpaceDistance, TimeDistance, TimeBins, TimeGroups, Difference]
        );

        refill(&mut v);
        let (new_coords, new_values) = random_dataset(8, 5, 3, 4);
        v.set_data(new_coords.view(), new_values.view()).unwrap();
        assert!(stages_cached(&v).is_empty());
        assert_eq!(v.differences().unwrap().dim(), (10, 6));
    }

    #[test]
    fn rejected_setters_leave_state_intact() {
        let mut v = line_variogram();
        v.experimental().unwrap();
        let surface = v.experimental().unwrap().clone();

        let err = v.set_values(array![[1.0, 2.0], [3.0, 4.0]].view()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidShape(_)));
        let err = v
            .set_values(array![[1.0], [3.0], [4.0]].view())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidShape(_)));
        let err = v
            .set_data(array![[0.0]].view(), array![[1.0, 2.0]].view())
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidShape(_)));
        let err = v.set_xdist_metric(Metric::Minkowski(0.0)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidMetric(_)));
        let err = v.set_lags(LagAxis::Space, LagCount::Max).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidLagCount(_)));
        let err = v.set_lags(LagAxis::Time, LagCount::Count(0)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidLagCount(_)));
        let err = v
            .set_bin_edges(LagAxis::Space, vec![1.0, 1.0])
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBinEdges(_)));
        let err = v.set_max_lag(MaxLag::Fraction(1.5)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidMaxLag(_)));
        let err = v.set_estimator(Estimator::Percentile(101.0)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidEstimator(_)));

        assert_eq!(stages_cached(&v), Stage::ALL);
        assert_eq!(v.values().dim(), (3, 3));
        assert_eq!(v.n_lags(LagAxis::Space), 2);
        assert_eq!(v.n_lags(LagAxis::Time), 2);
        assert_eq!(v.estimator().name(), "matheron");
        assert_eq!(v.experimental().unwrap(), &surface);
    }

    #[test]
    fn unknown_names() {
        let err = "mahalanobis".parse::<Metric>().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidMetric(_)));
        let err = "kmeans".parse::<BinningMethod>().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidBinningMethod(_)));
        let err = "mean".parse::<Estimator>().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidEstimator(_)));
        let err = "depth".parse::<LagAxis>().unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidAxis(_)));
    }

    #[test]
    fn empty_cells_are_nan() {
        let mut v = line_variogram();
        // nothing lies in (1, 1.5]
        v.set_bin_edges(LagAxis::Space, vec![1.0, 1.5, 2.0]).unwrap();
        v.set_estimator(Estimator::custom("non-empty", |diffs: &[f64]| {
            assert!(!diffs.is_empty(), "called on an empty lag class");
            diffs.iter().sum::<f64>()
        }))
        .unwrap();

        let surface = v.experimental().unwrap();
        assert_eq!(surface.dim(), (3, 2));
        assert!(surface.row(1).iter().all(|x| x.is_nan()));
        assert!(surface.row(0).iter().all(|x| !x.is_nan()));
        assert!(surface.row(2).iter().all(|x| !x.is_nan()));
        assert_eq!(surface[[0, 0]], -2.0);
        assert_eq!(v.lag_class_counts().unwrap().row(1).sum(), 0);
        assert!(v.lag_class_members(1, 0).unwrap().is_empty());

        let marginal = v.marginal(LagAxis::Space, 1).unwrap();
        assert!(marginal[1].is_nan());
    }

    #[test]
    fn marginals_match_the_surface() {
        let v = random_variogram(23);
        let surface = v.experimental().unwrap();
        for lag in 0..v.n_lags(LagAxis::Time) {
            let marginal = v.marginal(LagAxis::Space, lag).unwrap();
            let slice = surface.slice(s![.., lag]);
            assert_eq!(marginal.len(), slice.len());
            for (m, s) in marginal.iter().zip(slice.iter()) {
                assert!(isclose(*m, *s, 0.0, 0.0), "{m} vs {s}");
            }
        }
        for lag in 0..v.n_lags(LagAxis::Space) {
            let marginal = v.marginal(LagAxis::Time, lag).unwrap();
            let slice = surface.slice(s![lag, ..]);
            for (m, s) in marginal.iter().zip(slice.iter()) {
                assert!(isclose(*m, *s, 0.0, 0.0), "{m} vs {s}");
            }
        }
        let err = v.marginal(LagAxis::Time, 5).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::LagIndexOutOfRange { axis: "space", lag: 5, n_lags: 5 }
        ));
    }

    #[test]
    fn entropy_only_for_marginals() {
        let mut v = random_variogram(1);
        v.set_estimator(Estimator::Entropy(10)).unwrap();
        let err = v.experimental().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedEstimatorForSurface(_)
        ));
        assert!(!v.is_cached(Stage::Experimental));

        let marginal = v.marginal(LagAxis::Time, 0).unwrap();
        assert_eq!(marginal.len(), v.n_lags(LagAxis::Time));
        assert!(marginal.iter().all(|x| x.is_nan() || *x >= 0.0));
    }

    #[test]
    fn custom_estimators_can_opt_out_of_the_surface() {
        let mut v = line_variogram();
        v.set_estimator(Estimator::custom_marginal_only("count", |d: &[f64]| {
            d.len() as f64
        }))
        .unwrap();
        let err = v.experimental().unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::UnsupportedEstimatorForSurface(name) if name.contains("count")
        ));
        // cell sizes along space at time lag 0: [4, 2]
        assert_eq!(v.marginal(LagAxis::Space, 0).unwrap(), array![4.0, 2.0]);
    }

    #[test]
    fn lag_classes_follow_the_surface_layout() {
        let v = random_variogram(9);
        let n_x = v.n_lags(LagAxis::Space);
        let n_t = v.n_lags(LagAxis::Time);
        let classes: Vec<_> = v.lag_classes().unwrap().collect();
        assert_eq!(classes.len(), n_x * n_t);

        let surface = v.experimental().unwrap();
        let counts = v.lag_class_counts().unwrap();
        for (k, class) in classes.iter().enumerate() {
            assert_eq!((class.space_lag, class.time_lag), (k / n_t, k % n_t));
            let (x, t) = (class.space_lag, class.time_lag);
            assert_eq!(class.differences.len(), counts[[x, t]]);
            assert_eq!(class.differences, v.lag_class_members(x, t).unwrap());
            let expected = if class.differences.is_empty() {
                f64::NAN
            } else {
                v.estimator().estimate(&class.differences)
            };
            assert!(isclose(surface[[x, t]], expected, 0.0, 0.0));
        }

        // a fresh iterator starts over
        assert_eq!(v.lag_classes().unwrap().len(), n_x * n_t);
    }

    #[test]
    fn meshbins_layout() {
        let v = random_variogram(2);
        let (xx, tt) = v.meshbins().unwrap();
        let xbins = v.xbins().unwrap();
        let tbins = v.tbins().unwrap();
        let shape = (tbins.len(), xbins.len());
        assert_eq!(xx.dim(), shape);
        assert_eq!(tt.dim(), shape);
        let expected_xx = Array2::from_shape_fn(shape, |(_, i)| xbins[i]);
        let expected_tt = Array2::from_shape_fn(shape, |(j, _)| tbins[j]);
        assert_eq!(xx, expected_xx);
        assert_eq!(tt, expected_tt);
    }

    #[test]
    fn time_bins_span_every_separation() {
        let (coords, values) = random_dataset(4, 4, 1, 6);
        let v = VariogramBuilder::new()
            .max_lag(MaxLag::Absolute(0.5))
            .build(coords.view(), values.view())
            .unwrap();
        // the max lag only applies to space
        assert_eq!(v.tbins().unwrap(), &array![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(v.unclassified_pairs(LagAxis::Time).unwrap(), 0);
        assert_eq!(v.resolved_max_lag(), Some(0.5));
    }

    #[test]
    fn max_lag_below_every_distance() {
        // spatial distances: [1, 2, 1]
        for method in [BinningMethod::UniformCount, BinningMethod::EvenWidth] {
            let mut v = VariogramBuilder::new()
                .x_lags(2)
                .bin_method(LagAxis::Space, method)
                .build(
                    array![[0.0], [1.0], [2.0]].view(),
                    array![[1.0, 2.0, 4.0], [2.0, 3.0, 5.0], [0.0, 1.0, 1.0]].view(),
                )
                .unwrap();
            v.set_max_lag(MaxLag::Absolute(0.5)).unwrap();

            let name = v.bin_method(LagAxis::Space).name().to_string();
            assert_eq!(v.xbins().unwrap(), &array![0.25, 0.5], "{name}");
            assert_eq!(v.unclassified_pairs(LagAxis::Space).unwrap(), 3, "{name}");
            let surface = v.experimental().unwrap();
            assert_eq!(surface.dim(), (2, 2), "{name}");
            assert!(surface.iter().all(|x| x.is_nan()), "{name}");
            assert!(v.marginal(LagAxis::Space, 0).unwrap().iter().all(|x| x.is_nan()));
        }
    }

    #[test]
    fn uniform_bins_balance_counts() {
        let coords = Array2::from_shape_fn((6, 1), |(i, _)| (i * i) as f64);
        let values = Array2::from_shape_fn((6, 3), |(i, j)| (i + j) as f64);
        let v = VariogramBuilder::new()
            .x_lags(3)
            .bin_method(LagAxis::Space, BinningMethod::UniformCount)
            .build(coords.view(), values.view())
            .unwrap();
        let groups = v.lag_groups(LagAxis::Space).unwrap();
        let mut per_class = [0usize; 3];
        for g in groups.iter() {
            assert_ne!(*g, UNCLASSIFIED);
            per_class[*g as usize] += 1;
        }
        // 15 distances in 3 classes
        assert_eq!(per_class, [5, 5, 5]);
    }
}
