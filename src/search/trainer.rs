//! Cross-validated grid search for a single model family
//!
//! The trainer never panics across a family boundary: every failure —
//! invalid parameter value, fitting error, degenerate split — is folded into
//! a [`TrainingFailure`] so the orchestrator can pattern-match and move on.

use crate::error::Result;
use crate::grid::{GridPoint, ParamGrid};
use crate::models::{Estimator, FamilySpec, TaskKind};
use crate::search::cross_validation::{k_fold, stratified_k_fold, CvSplit};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Successful outcome of one family's grid search
#[derive(Debug)]
pub struct TrainedCandidate {
    pub family: String,
    /// Refit on the full training set at the best grid point
    pub estimator: Estimator,
    pub params: GridPoint,
    /// Mean cross-validation score, normalized so higher is better
    pub cv_score: f64,
    /// Wall-clock time of the whole grid search, refit included
    pub search_duration: Duration,
    /// Wall-clock time of the final refit alone
    pub refit_duration: Duration,
}

/// Failed outcome of one family's grid search
#[derive(Debug, Clone)]
pub struct TrainingFailure {
    pub family: String,
    pub detail: String,
}

/// Run the full grid search for one family.
///
/// Grid points are evaluated concurrently on the rayon pool; the caller
/// blocks until the family completes. Ties on the mean score keep the
/// earliest point in grid order.
pub fn train_family(
    spec: &FamilySpec,
    grid: &ParamGrid,
    x: &Array2<f64>,
    y: &Array1<f64>,
    folds: usize,
    task: TaskKind,
) -> std::result::Result<TrainedCandidate, TrainingFailure> {
    let fail = |detail: String| TrainingFailure {
        family: spec.name.to_string(),
        detail,
    };

    let start = Instant::now();

    // The orchestrator skips empty grids; a direct caller gets a failure
    let points = grid.points();
    if points.is_empty() {
        return Err(fail("empty hyperparameter grid".to_string()));
    }

    // Grid keys must match the family's accepted parameter names exactly;
    // every point shares the grid's keys, so the first one stands for all
    if let Some(unknown) = points[0].names().find(|n| !spec.params.contains(n)) {
        return Err(fail(format!(
            "unknown hyperparameter {:?} for {}",
            unknown, spec.name
        )));
    }

    let splits = match task {
        TaskKind::Classification => stratified_k_fold(y, folds),
        TaskKind::Regression => k_fold(x.nrows(), folds),
    }
    .map_err(|e| fail(e.to_string()))?;

    let scored: Vec<f64> = points
        .par_iter()
        .map(|point| mean_cv_score(spec, point, x, y, &splits, task))
        .collect::<Result<Vec<f64>>>()
        .map_err(|e| fail(e.to_string()))?;

    // Strictly-greater comparison: the earliest point wins ties. NaN scores
    // (a diverged fit) are never adopted.
    let mut best_idx: Option<usize> = None;
    for (idx, &score) in scored.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        if best_idx.map_or(true, |b| score > scored[b]) {
            best_idx = Some(idx);
        }
    }
    let Some(best_idx) = best_idx else {
        return Err(fail("every grid point produced a non-finite score".to_string()));
    };
    let best_point = points[best_idx].clone();
    let cv_score = scored[best_idx];

    let refit_start = Instant::now();
    let mut estimator = (spec.build)(&best_point).map_err(|e| fail(e.to_string()))?;
    estimator
        .fit(x, y)
        .map_err(|e| fail(format!("refit failed: {}", e)))?;
    let refit_duration = refit_start.elapsed();

    Ok(TrainedCandidate {
        family: spec.name.to_string(),
        estimator,
        params: best_point,
        cv_score,
        search_duration: start.elapsed(),
        refit_duration,
    })
}

fn mean_cv_score(
    spec: &FamilySpec,
    point: &GridPoint,
    x: &Array2<f64>,
    y: &Array1<f64>,
    splits: &[CvSplit],
    task: TaskKind,
) -> Result<f64> {
    let mut total = 0.0;
    for split in splits {
        let x_train = x.select(Axis(0), &split.train_indices);
        let y_train = take_labels(y, &split.train_indices);
        let x_test = x.select(Axis(0), &split.test_indices);
        let y_test = take_labels(y, &split.test_indices);

        let mut estimator = (spec.build)(point)?;
        estimator.fit(&x_train, &y_train)?;
        let y_pred = estimator.predict(&x_test)?;
        total += task.fold_score(&y_test, &y_pred);
    }
    Ok(total / splits.len() as f64)
}

fn take_labels(y: &Array1<f64>, indices: &[usize]) -> Array1<f64> {
    Array1::from_vec(indices.iter().map(|&i| y[i]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ParamGrid;
    use crate::models::catalog;
    use ndarray::Array2;

    fn spec(task: TaskKind, name: &str) -> FamilySpec {
        *catalog(task)
            .iter()
            .find(|s| s.name == name)
            .expect("family in catalog")
    }

    fn two_cluster_data() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let offset = i as f64 * 0.05;
            rows.extend_from_slice(&[offset, offset]);
            labels.push(0.0);
            rows.extend_from_slice(&[5.0 + offset, 5.0 + offset]);
            labels.push(1.0);
        }
        (
            Array2::from_shape_vec((24, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_trains_a_candidate() {
        let (x, y) = two_cluster_data();
        let spec = spec(TaskKind::Classification, "DecisionTreeClassifier");
        let grid = ParamGrid::new()
            .choices("criterion", &["gini"])
            .ints("max_depth", vec![3, 5]);

        let candidate = train_family(&spec, &grid, &x, &y, 3, TaskKind::Classification).unwrap();
        assert_eq!(candidate.family, "DecisionTreeClassifier");
        assert!(candidate.cv_score > 0.9);
        assert!(candidate.params.get("max_depth").is_some());
    }

    #[test]
    fn test_invalid_value_fails_the_family() {
        let (x, y) = two_cluster_data();
        let spec = spec(TaskKind::Classification, "DecisionTreeClassifier");
        let grid = ParamGrid::new()
            .choices("criterion", &["gini", "bogus"])
            .ints("max_depth", vec![3]);

        let result = train_family(&spec, &grid, &x, &y, 3, TaskKind::Classification);
        let failure = result.err().expect("family should fail");
        assert_eq!(failure.family, "DecisionTreeClassifier");
        assert!(failure.detail.contains("criterion"));
    }

    #[test]
    fn test_unknown_key_fails_the_family() {
        let (x, y) = two_cluster_data();
        let spec = spec(TaskKind::Classification, "GaussianNB");
        let grid = ParamGrid::new().floats("no_such_knob", vec![1.0]);

        let result = train_family(&spec, &grid, &x, &y, 3, TaskKind::Classification);
        assert!(result.is_err());
    }

    #[test]
    fn test_tie_keeps_first_point() {
        // Both depths separate this data perfectly, so scores tie; the
        // first grid point must win.
        let (x, y) = two_cluster_data();
        let spec = spec(TaskKind::Classification, "DecisionTreeClassifier");
        let grid = ParamGrid::new()
            .choices("criterion", &["gini"])
            .ints("max_depth", vec![4, 9]);

        let candidate = train_family(&spec, &grid, &x, &y, 3, TaskKind::Classification).unwrap();
        assert_eq!(candidate.params.get_i64("max_depth").unwrap(), 4);
    }

    #[test]
    fn test_regression_score_is_negated_rmse() {
        let x = Array2::from_shape_vec((12, 1), (0..12).map(|i| i as f64).collect()).unwrap();
        let y = Array1::from_vec((0..12).map(|i| 2.0 * i as f64).collect());
        let spec = spec(TaskKind::Regression, "Ridge");
        let grid = ParamGrid::new().floats("alpha", vec![0.001]);

        let candidate = train_family(&spec, &grid, &x, &y, 3, TaskKind::Regression).unwrap();
        // Normalized score is -RMSE, so it must be <= 0 and near zero here
        assert!(candidate.cv_score <= 0.0);
        assert!(candidate.cv_score > -1.0);
    }
}
