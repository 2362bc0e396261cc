//! Integration tests: best-only and list-mode search end to end

use autofit::grid::{GridRegistry, ParamGrid};
use autofit::metrics;
use autofit::models::TaskKind;
use autofit::search::{ModelSearch, DEFAULT_FOLDS};
use ndarray::{Array1, Array2};

/// Balanced 3-class dataset: 50 samples per class, 4 features, clusters well
/// separated. Jitter is deterministic so every run sees the same data.
fn three_class_data() -> (Array2<f64>, Array1<f64>) {
    let centers = [
        [0.0, 0.0, 0.0, 0.0],
        [4.0, 4.0, 4.0, 4.0],
        [8.0, 0.0, 8.0, 0.0],
    ];

    let mut rows = Vec::with_capacity(150 * 4);
    let mut labels = Vec::with_capacity(150);
    for (class, center) in centers.iter().enumerate() {
        for i in 0..50 {
            for (j, &c) in center.iter().enumerate() {
                let jitter = ((i * 37 + j * 11) % 100) as f64 / 100.0 - 0.5;
                rows.push(c + jitter);
            }
            labels.push(class as f64);
        }
    }

    (
        Array2::from_shape_vec((150, 4), rows).unwrap(),
        Array1::from_vec(labels),
    )
}

fn linear_regression_data() -> (Array2<f64>, Array1<f64>) {
    let mut rows = Vec::new();
    let mut targets = Vec::new();
    for i in 0..60 {
        let x1 = i as f64 / 6.0;
        let x2 = ((i * 13) % 60) as f64 / 10.0;
        rows.extend_from_slice(&[x1, x2]);
        targets.push(3.0 * x1 - 2.0 * x2 + 5.0);
    }
    (
        Array2::from_shape_vec((60, 2), rows).unwrap(),
        Array1::from_vec(targets),
    )
}

#[test]
fn test_best_only_classification_exceeds_090() {
    let (x, y) = three_class_data();
    let report = ModelSearch::classification().fit_best(&x, &y, DEFAULT_FOLDS);

    assert!(report.record.is_fitted(), "expected a fitted winner");
    let accuracy = report
        .record
        .metric(metrics::TRAINING_ACCURACY)
        .expect("primary metric present");
    assert!(accuracy > 0.90, "training accuracy too low: {}", accuracy);

    // Agreement of the refit model against the training labels
    let predictions = report.record.predict(&x).unwrap();
    let agreement = metrics::accuracy(&y, &predictions);
    assert!(agreement > 0.90, "agreement too low: {}", agreement);
}

#[test]
fn test_best_only_picks_the_list_maximum() {
    let (x, y) = three_class_data();
    let search = ModelSearch::classification();

    let report = search.fit_best(&x, &y, DEFAULT_FOLDS);
    let (records, _) = search.fit_all(&x, &y, DEFAULT_FOLDS);

    let best = report
        .record
        .metric(metrics::TRAINING_ACCURACY)
        .expect("primary metric present");
    assert!(!records.is_empty());
    for record in &records {
        let candidate = record.metric(metrics::TRAINING_ACCURACY).unwrap();
        assert!(
            best >= candidate,
            "{} out-scored the best-only winner: {} > {}",
            record.family(),
            candidate,
            best
        );
    }
}

#[test]
fn test_regression_search_fits_linear_target() {
    let (x, y) = linear_regression_data();
    let report = ModelSearch::regression().fit_best(&x, &y, DEFAULT_FOLDS);

    assert!(report.record.is_fitted());
    let rmse = report
        .record
        .metric(metrics::TRAINING_RMSE)
        .expect("primary metric present");
    assert!(rmse >= 0.0);
    let r2 = report.record.metric(metrics::R2_SCORE).unwrap();
    assert!(r2 > 0.9, "R2 too low for a linear target: {}", r2);
}

#[test]
fn test_all_families_failing_yields_sentinel() {
    let (x, y) = three_class_data();

    // Every value below is rejected by its family's constructor or fit
    let registry = GridRegistry::try_new(
        TaskKind::Classification,
        vec![
            (
                "DecisionTreeClassifier",
                ParamGrid::new()
                    .choices("criterion", &["bogus"])
                    .ints("max_depth", vec![5]),
            ),
            (
                "RandomForestClassifier",
                ParamGrid::new()
                    .ints("n_estimators", vec![-1])
                    .ints("max_depth", vec![4])
                    .choices("max_features", &["sqrt"]),
            ),
            (
                "KNeighborsClassifier",
                ParamGrid::new()
                    .ints("n_neighbors", vec![0])
                    .choices("weights", &["uniform"])
                    .choices("metric", &["euclidean"]),
            ),
            (
                "GaussianNB",
                ParamGrid::new().floats("var_smoothing", vec![-1.0]),
            ),
            (
                "SGDClassifier",
                ParamGrid::new().floats("alpha", vec![-0.5]),
            ),
        ],
    )
    .unwrap();

    let search = ModelSearch::with_registry(TaskKind::Classification, registry);
    let report = search.fit_best(&x, &y, DEFAULT_FOLDS);

    assert!(!report.record.is_fitted(), "sentinel expected");
    assert!(report.record.metrics().is_empty());
    assert_eq!(report.failed.len(), 5, "one failure per registry family");

    let mut failed: Vec<&str> = report.failed.iter().map(|f| f.family.as_str()).collect();
    failed.sort_unstable();
    assert_eq!(
        failed,
        vec![
            "DecisionTreeClassifier",
            "GaussianNB",
            "KNeighborsClassifier",
            "RandomForestClassifier",
            "SGDClassifier",
        ]
    );
}

#[test]
fn test_single_failure_does_not_abort_the_search() {
    let (x, y) = three_class_data();

    let registry = GridRegistry::try_new(
        TaskKind::Classification,
        vec![
            (
                "DecisionTreeClassifier",
                ParamGrid::new()
                    .choices("criterion", &["bogus"])
                    .ints("max_depth", vec![5]),
            ),
            (
                "KNeighborsClassifier",
                ParamGrid::new()
                    .ints("n_neighbors", vec![3, 5])
                    .choices("weights", &["uniform"])
                    .choices("metric", &["euclidean"]),
            ),
        ],
    )
    .unwrap();

    let search = ModelSearch::with_registry(TaskKind::Classification, registry);
    let report = search.fit_best(&x, &y, DEFAULT_FOLDS);

    assert_eq!(report.record.family(), "KNeighborsClassifier");
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].family, "DecisionTreeClassifier");
}

#[test]
fn test_chosen_params_come_from_the_grid() {
    let (x, y) = three_class_data();

    let registry = GridRegistry::try_new(
        TaskKind::Classification,
        vec![(
            "KNeighborsClassifier",
            ParamGrid::new()
                .ints("n_neighbors", vec![3, 7])
                .choices("weights", &["uniform", "distance"])
                .choices("metric", &["euclidean"]),
        )],
    )
    .unwrap();

    let search = ModelSearch::with_registry(TaskKind::Classification, registry);
    let report = search.fit_best(&x, &y, DEFAULT_FOLDS);

    let k = report.record.params().get_i64("n_neighbors").unwrap();
    assert!(k == 3 || k == 7);
    let weights = report.record.params().get_str("weights").unwrap().to_string();
    assert!(weights == "uniform" || weights == "distance");
}
