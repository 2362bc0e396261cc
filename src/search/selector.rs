//! Search orchestration across model families
//!
//! The per-family loop is strictly sequential; parallelism lives inside a
//! single family's grid search. A family failure is recorded and the loop
//! moves on — nothing a family does can abort the overall search.

use crate::error::Result;
use crate::grid::{classifier_grids, regressor_grids, GridRegistry};
use crate::metrics;
use crate::models::{catalog, TaskKind};
use crate::record::ModelRecord;
use crate::search::trainer::{train_family, TrainedCandidate, TrainingFailure};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Default number of cross-validation folds
pub const DEFAULT_FOLDS: usize = 3;

/// Outcome of a best-only search
#[derive(Debug)]
pub struct SearchReport {
    /// The winning record, or the sentinel if every family failed
    pub record: ModelRecord,
    /// One entry per family whose grid search failed
    pub failed: Vec<TrainingFailure>,
}

/// Orchestrates the model-family search for one task type
#[derive(Debug, Clone)]
pub struct ModelSearch {
    task: TaskKind,
    registry: GridRegistry,
}

impl ModelSearch {
    /// Search over the built-in classification registry
    pub fn classification() -> Self {
        Self {
            task: TaskKind::Classification,
            registry: classifier_grids().clone(),
        }
    }

    /// Search over the built-in regression registry
    pub fn regression() -> Self {
        Self {
            task: TaskKind::Regression,
            registry: regressor_grids().clone(),
        }
    }

    /// Search over a caller-supplied registry
    pub fn with_registry(task: TaskKind, registry: GridRegistry) -> Self {
        Self { task, registry }
    }

    pub fn task(&self) -> TaskKind {
        self.task
    }

    /// Best-only mode: keep a single running best, first-found wins ties.
    /// Secondary metrics are computed only when a candidate is adopted.
    pub fn fit_best(&self, x: &Array2<f64>, y: &Array1<f64>, folds: usize) -> SearchReport {
        let mut failed = Vec::new();
        let mut best: Option<(f64, ModelRecord)> = None;

        for spec in catalog(self.task) {
            let Some(grid) = self.registry.lookup(spec.name) else {
                continue;
            };
            if grid.is_empty() {
                continue;
            }

            match train_family(spec, grid, x, y, folds, self.task) {
                Ok(candidate) => {
                    debug!(
                        family = %candidate.family,
                        score = candidate.cv_score,
                        secs = candidate.search_duration.as_secs_f64(),
                        "grid search finished"
                    );
                    let adopt = best
                        .as_ref()
                        .map_or(true, |(score, _)| candidate.cv_score > *score);
                    if adopt {
                        match self.to_record(candidate, x, y) {
                            Ok((score, record)) => best = Some((score, record)),
                            Err(failure) => {
                                warn!(family = %failure.family, error = %failure.detail, "model family failed");
                                failed.push(failure);
                            }
                        }
                    }
                }
                Err(failure) => {
                    warn!(family = %failure.family, error = %failure.detail, "model family failed");
                    failed.push(failure);
                }
            }
        }

        SearchReport {
            record: best.map(|(_, record)| record).unwrap_or_else(ModelRecord::empty),
            failed,
        }
    }

    /// List mode: one record per successful family, secondary metrics for all
    pub fn fit_all(&self, x: &Array2<f64>, y: &Array1<f64>, folds: usize) -> (Vec<ModelRecord>, Vec<TrainingFailure>) {
        let mut records = Vec::new();
        let mut failed = Vec::new();

        for spec in catalog(self.task) {
            let Some(grid) = self.registry.lookup(spec.name) else {
                continue;
            };
            if grid.is_empty() {
                continue;
            }

            match train_family(spec, grid, x, y, folds, self.task) {
                Ok(candidate) => match self.to_record(candidate, x, y) {
                    Ok((_, record)) => records.push(record),
                    Err(failure) => {
                        warn!(family = %failure.family, error = %failure.detail, "model family failed");
                        failed.push(failure);
                    }
                },
                Err(failure) => {
                    warn!(family = %failure.family, error = %failure.detail, "model family failed");
                    failed.push(failure);
                }
            }
        }

        (records, failed)
    }

    /// Turn a trained candidate into a record, paying the secondary-metric
    /// cost (training-set predictions) exactly here.
    fn to_record(
        &self,
        candidate: TrainedCandidate,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> std::result::Result<(f64, ModelRecord), TrainingFailure> {
        let family = candidate.family.clone();
        self.build_record(candidate, x, y)
            .map_err(|e| TrainingFailure {
                family,
                detail: format!("metric computation failed: {}", e),
            })
    }

    fn build_record(
        &self,
        candidate: TrainedCandidate,
        x: &Array2<f64>,
        y: &Array1<f64>,
    ) -> Result<(f64, ModelRecord)> {
        let mut metric_map = BTreeMap::new();
        metric_map.insert(
            self.task.primary_metric().to_string(),
            self.task.primary_value(candidate.cv_score),
        );

        let y_pred = candidate.estimator.predict(x)?;
        match self.task {
            TaskKind::Classification => {
                metric_map.insert(
                    metrics::JACCARD_SCORE.to_string(),
                    metrics::jaccard_macro(y, &y_pred),
                );
                metric_map.insert(metrics::F1_SCORE.to_string(), metrics::f1_macro(y, &y_pred));
            }
            TaskKind::Regression => {
                metric_map.insert(
                    metrics::MEAN_ABSOLUTE_ERROR.to_string(),
                    metrics::mean_absolute_error(y, &y_pred),
                );
                metric_map.insert(
                    metrics::MEAN_SQUARED_ERROR.to_string(),
                    metrics::mean_squared_error(y, &y_pred),
                );
                metric_map.insert(metrics::R2_SCORE.to_string(), metrics::r2_score(y, &y_pred));
            }
        }

        let record = ModelRecord::new(
            candidate.family,
            Some(candidate.estimator),
            candidate.params,
            metric_map,
            candidate.search_duration,
            candidate.refit_duration,
        );
        Ok((candidate.cv_score, record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ParamGrid;

    fn cluster_data() -> (Array2<f64>, Array1<f64>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..15 {
            let offset = i as f64 * 0.1;
            rows.extend_from_slice(&[offset, offset]);
            labels.push(0.0);
            rows.extend_from_slice(&[6.0 + offset, 6.0 + offset]);
            labels.push(1.0);
        }
        (
            Array2::from_shape_vec((30, 2), rows).unwrap(),
            Array1::from_vec(labels),
        )
    }

    #[test]
    fn test_fit_best_adopts_a_family() {
        let (x, y) = cluster_data();
        let report = ModelSearch::classification().fit_best(&x, &y, DEFAULT_FOLDS);

        assert!(report.record.is_fitted());
        assert!(report.record.metric(metrics::TRAINING_ACCURACY).unwrap() > 0.9);
        assert!(report.record.metric(metrics::JACCARD_SCORE).is_some());
        assert!(report.record.metric(metrics::F1_SCORE).is_some());
    }

    #[test]
    fn test_missing_grid_is_skipped_silently() {
        let (x, y) = cluster_data();
        // Registry covering a single family: the others are skipped, not failed
        let registry = GridRegistry::try_new(
            TaskKind::Classification,
            vec![(
                "DecisionTreeClassifier",
                ParamGrid::new()
                    .choices("criterion", &["gini"])
                    .ints("max_depth", vec![3, 5]),
            )],
        )
        .unwrap();

        let search = ModelSearch::with_registry(TaskKind::Classification, registry);
        let report = search.fit_best(&x, &y, DEFAULT_FOLDS);

        assert!(report.failed.is_empty());
        assert_eq!(report.record.family(), "DecisionTreeClassifier");
    }

    #[test]
    fn test_empty_grid_is_skipped_silently() {
        let (x, y) = cluster_data();
        let registry = GridRegistry::try_new(
            TaskKind::Classification,
            vec![("DecisionTreeClassifier", ParamGrid::new())],
        )
        .unwrap();

        let search = ModelSearch::with_registry(TaskKind::Classification, registry);
        let report = search.fit_best(&x, &y, DEFAULT_FOLDS);

        assert!(report.failed.is_empty());
        assert!(!report.record.is_fitted());
    }
}
