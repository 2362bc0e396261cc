//! Ranked list of trained model records
//!
//! The list owns its records and the name of the metric that orders them.
//! Direction comes from the fixed table in [`crate::metrics`]; it is never
//! inferred from the values. Ranks shown in the report are recomputed from
//! sequence position at render time and stored nowhere.

use crate::error::{AutoFitError, Result};
use crate::metrics::{direction_of, Direction};
use crate::models::TaskKind;
use crate::record::ModelRecord;
use crate::search::selector::ModelSearch;
use crate::search::trainer::TrainingFailure;
use ndarray::{Array1, Array2};
use std::fmt;

/// Fixed rendering for a list with no records
pub const EMPTY_LIST_REPORT: &str = "The ranked list is empty.";

#[derive(Debug)]
pub struct RankedModelList {
    records: Vec<ModelRecord>,
    metric: String,
    direction: Direction,
    search: ModelSearch,
}

impl RankedModelList {
    /// Classification list ranked by the primary training accuracy
    pub fn classification() -> Self {
        Self::for_search(ModelSearch::classification())
            .expect("primary classification metric is in the direction table")
    }

    /// Regression list ranked by training RMSE (ascending: lower is better)
    pub fn regression() -> Self {
        Self::for_search(ModelSearch::regression())
            .expect("primary regression metric is in the direction table")
    }

    /// Rank by any metric the engine records. Fails with
    /// [`AutoFitError::UnknownMetric`] for names outside the direction table.
    pub fn with_metric(task: TaskKind, metric: &str) -> Result<Self> {
        let search = match task {
            TaskKind::Classification => ModelSearch::classification(),
            TaskKind::Regression => ModelSearch::regression(),
        };
        Self::for_search_with_metric(search, metric)
    }

    /// Rank a caller-supplied search (custom registry) by its primary metric
    pub fn for_search(search: ModelSearch) -> Result<Self> {
        let metric = search.task().primary_metric();
        Self::for_search_with_metric(search, metric)
    }

    fn for_search_with_metric(search: ModelSearch, metric: &str) -> Result<Self> {
        let direction =
            direction_of(metric).ok_or_else(|| AutoFitError::UnknownMetric(metric.to_string()))?;
        Ok(Self {
            records: Vec::new(),
            metric: metric.to_string(),
            direction,
            search,
        })
    }

    /// Train every family and rebuild the ranking, replacing any previous
    /// contents. Returns the families that failed; an all-failed pass leaves
    /// the list empty rather than erroring.
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>, folds: usize) -> Vec<TrainingFailure> {
        self.records.clear();

        let (records, failed) = self.search.fit_all(x, y, folds);
        for record in records {
            self.records.push(record);
            self.resort();
        }
        failed
    }

    /// Remove and return the record at `index`, shifting later ranks down
    pub fn pop(&mut self, index: usize) -> Result<ModelRecord> {
        if index >= self.records.len() {
            return Err(AutoFitError::IndexOutOfBounds {
                index,
                len: self.records.len(),
            });
        }
        Ok(self.records.remove(index))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[ModelRecord] {
        &self.records
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    /// Stable sort: equal scores keep their arrival order
    fn resort(&mut self) {
        let direction = self.direction;
        let metric = self.metric.clone();
        self.records.sort_by(|a, b| {
            let va = sort_key(a, &metric, direction);
            let vb = sort_key(b, &metric, direction);
            va.partial_cmp(&vb).unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Smaller keys sort first; records missing the metric sink to the end
fn sort_key(record: &ModelRecord, metric: &str, direction: Direction) -> f64 {
    match record.metric(metric) {
        Some(value) => match direction {
            Direction::HigherIsBetter => -value,
            Direction::LowerIsBetter => value,
        },
        None => f64::INFINITY,
    }
}

impl fmt::Display for RankedModelList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.records.is_empty() {
            return write!(f, "{}", EMPTY_LIST_REPORT);
        }

        let mut docs = Vec::with_capacity(self.records.len());
        for (position, record) in self.records.iter().enumerate() {
            let doc = record.report(Some(position + 1));
            docs.push(serde_json::to_string_pretty(&doc).map_err(|_| fmt::Error)?);
        }
        write!(f, "{}", docs.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPoint;
    use std::collections::BTreeMap;
    use std::time::Duration;

    fn record_with(metric: &str, value: f64, family: &str) -> ModelRecord {
        let mut metrics = BTreeMap::new();
        metrics.insert(metric.to_string(), value);
        ModelRecord::new(
            family.to_string(),
            None,
            GridPoint::new(),
            metrics,
            Duration::ZERO,
            Duration::ZERO,
        )
    }

    fn list_with_scores(scores: &[f64]) -> RankedModelList {
        let mut list = RankedModelList::classification();
        for (i, &score) in scores.iter().enumerate() {
            list.records.push(record_with(
                "training_accuracy",
                score,
                &format!("Family{}", i),
            ));
            list.resort();
        }
        list
    }

    #[test]
    fn test_sorted_descending_for_accuracy_style_metric() {
        let list = list_with_scores(&[0.5, 0.9, 0.7]);
        let values: Vec<f64> = list
            .records()
            .iter()
            .map(|r| r.metric("training_accuracy").unwrap())
            .collect();
        assert_eq!(values, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn test_ties_keep_arrival_order() {
        let list = list_with_scores(&[0.8, 0.8, 0.8]);
        let families: Vec<&str> = list.records().iter().map(|r| r.family()).collect();
        assert_eq!(families, vec!["Family0", "Family1", "Family2"]);
    }

    #[test]
    fn test_pop_out_of_range() {
        let mut list = RankedModelList::classification();
        assert!(matches!(
            list.pop(0),
            Err(AutoFitError::IndexOutOfBounds { index: 0, len: 0 })
        ));
    }

    #[test]
    fn test_empty_render_sentinel() {
        let list = RankedModelList::classification();
        assert_eq!(list.to_string(), EMPTY_LIST_REPORT);
    }

    #[test]
    fn test_unknown_metric_rejected() {
        assert!(matches!(
            RankedModelList::with_metric(TaskKind::Classification, "vibes"),
            Err(AutoFitError::UnknownMetric(_))
        ));
    }

    #[test]
    fn test_render_has_one_based_ranks() {
        let list = list_with_scores(&[0.6, 0.9]);
        let rendered = list.to_string();
        assert!(rendered.contains("\"rank\": 1"));
        assert!(rendered.contains("\"rank\": 2"));
        assert!(rendered.contains("\"index\": 0"));
    }
}
