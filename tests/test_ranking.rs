//! Integration tests: ranked model list ordering, pop semantics, rendering

use autofit::error::AutoFitError;
use autofit::metrics;
use autofit::models::TaskKind;
use autofit::ranking::{RankedModelList, EMPTY_LIST_REPORT};
use autofit::search::DEFAULT_FOLDS;
use ndarray::{Array1, Array2};

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

fn regression_data() -> (Array2<f64>, Array1<f64>) {
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
fn test_classification_list_sorted_descending() {
    let (x, y) = three_class_data();
    let mut list = RankedModelList::classification();
    list.fit(&x, &y, DEFAULT_FOLDS);

    assert!(list.len() > 1, "expected several trained families");
    let scores: Vec<f64> = list
        .records()
        .iter()
        .map(|r| r.metric(metrics::TRAINING_ACCURACY).unwrap())
        .collect();
    for pair in scores.windows(2) {
        assert!(
            pair[0] >= pair[1],
            "accuracy-ranked list out of order: {:?}",
            scores
        );
    }
}

#[test]
fn test_regression_list_sorted_ascending_by_rmse() {
    let (x, y) = regression_data();
    let mut list = RankedModelList::regression();
    list.fit(&x, &y, DEFAULT_FOLDS);

    assert!(list.len() > 1);
    let scores: Vec<f64> = list
        .records()
        .iter()
        .map(|r| r.metric(metrics::TRAINING_RMSE).unwrap())
        .collect();
    for pair in scores.windows(2) {
        assert!(
            pair[0] <= pair[1],
            "error-ranked list out of order: {:?}",
            scores
        );
    }
}

#[test]
fn test_pop_removes_exactly_one_record() {
    let (x, y) = three_class_data();
    let mut list = RankedModelList::classification();
    list.fit(&x, &y, DEFAULT_FOLDS);

    let len_before = list.len();
    assert!(len_before >= 2);

    let popped = list.pop(1).unwrap();
    assert_eq!(list.len(), len_before - 1);

    // One record per family in list mode, so the popped family is gone
    let remaining: Vec<&str> = list.records().iter().map(|r| r.family()).collect();
    assert!(!remaining.contains(&popped.family()));

    // Popped records stay usable
    let predictions = popped.predict(&x).unwrap();
    assert_eq!(predictions.len(), x.nrows());
}

#[test]
fn test_pop_default_front_and_exhaustion() {
    let (x, y) = three_class_data();
    let mut list = RankedModelList::classification();
    list.fit(&x, &y, DEFAULT_FOLDS);

    let first = list.records()[0].family().to_string();
    let popped = list.pop(0).unwrap();
    assert_eq!(popped.family(), first);

    while !list.is_empty() {
        list.pop(0).unwrap();
    }
    assert!(matches!(
        list.pop(0),
        Err(AutoFitError::IndexOutOfBounds { .. })
    ));
    assert_eq!(list.to_string(), EMPTY_LIST_REPORT);
}

#[test]
fn test_pop_out_of_range_is_index_error() {
    let (x, y) = three_class_data();
    let mut list = RankedModelList::classification();
    list.fit(&x, &y, DEFAULT_FOLDS);

    let len = list.len();
    assert!(matches!(
        list.pop(len + 3),
        Err(AutoFitError::IndexOutOfBounds { .. })
    ));
    // A failed pop leaves the list untouched
    assert_eq!(list.len(), len);
}

#[test]
fn test_render_is_rank_prefixed_per_record() {
    let (x, y) = three_class_data();
    let mut list = RankedModelList::classification();
    list.fit(&x, &y, DEFAULT_FOLDS);

    let rendered = list.to_string();
    assert!(rendered.contains("\"rank\": 1"));
    assert!(rendered.contains("\"index\": 0"));
    assert!(rendered.contains(&format!("\"rank\": {}", list.len())));
}

#[test]
fn test_ranking_by_alternate_metric() {
    let (x, y) = three_class_data();
    let mut list = RankedModelList::with_metric(TaskKind::Classification, metrics::F1_SCORE).unwrap();
    list.fit(&x, &y, DEFAULT_FOLDS);

    let scores: Vec<f64> = list
        .records()
        .iter()
        .map(|r| r.metric(metrics::F1_SCORE).unwrap())
        .collect();
    for pair in scores.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
}
