//! The trained-candidate record
//!
//! A [`ModelRecord`] is the unit the orchestrator produces, the ranked list
//! orders, and persistence serializes. It exclusively owns its fitted state;
//! once produced it is never mutated.

use crate::error::{AutoFitError, Result};
use crate::grid::GridPoint;
use crate::models::Estimator;
use ndarray::{Array1, Array2};
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Family identifier of the sentinel record produced when every family fails
pub const EMPTY_FAMILY: &str = "EmptyModel";

#[derive(Debug, Clone)]
pub struct ModelRecord {
    family: String,
    estimator: Option<Estimator>,
    params: GridPoint,
    metrics: BTreeMap<String, f64>,
    search_duration: Duration,
    refit_duration: Duration,
}

impl ModelRecord {
    pub(crate) fn new(
        family: String,
        estimator: Option<Estimator>,
        params: GridPoint,
        metrics: BTreeMap<String, f64>,
        search_duration: Duration,
        refit_duration: Duration,
    ) -> Self {
        Self {
            family,
            estimator,
            params,
            metrics,
            search_duration,
            refit_duration,
        }
    }

    /// The explicit "no model" sentinel. Not an error: callers check
    /// [`ModelRecord::is_fitted`] before predicting.
    pub fn empty() -> Self {
        Self {
            family: EMPTY_FAMILY.to_string(),
            estimator: None,
            params: GridPoint::new(),
            metrics: BTreeMap::new(),
            search_duration: Duration::ZERO,
            refit_duration: Duration::ZERO,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn is_fitted(&self) -> bool {
        self.estimator.is_some()
    }

    pub fn params(&self) -> &GridPoint {
        &self.params
    }

    pub fn metrics(&self) -> &BTreeMap<String, f64> {
        &self.metrics
    }

    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    pub fn search_duration(&self) -> Duration {
        self.search_duration
    }

    pub fn refit_duration(&self) -> Duration {
        self.refit_duration
    }

    pub(crate) fn estimator(&self) -> Option<&Estimator> {
        self.estimator.as_ref()
    }

    /// Predict with the fitted model. Fails with [`AutoFitError::ModelNotFitted`]
    /// on the sentinel record.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let estimator = self.estimator.as_ref().ok_or(AutoFitError::ModelNotFitted)?;
        estimator.predict(x)
    }

    /// Persist this record to a zip archive at `path`
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        crate::archive::save(self, path)
    }

    /// Reload a record previously written with [`ModelRecord::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        crate::archive::load(path)
    }

    /// Report document for one record. Rank and index fields are included
    /// only when rendered from a ranked list; rank is 1-based, index 0-based.
    pub(crate) fn report(&self, rank: Option<usize>) -> serde_json::Value {
        let mut doc = json!({
            "family": self.family,
            "training_duration": format!("{:.4}s", self.refit_duration.as_secs_f64()),
            "grid_search_duration": format!("{:.4}s", self.search_duration.as_secs_f64()),
            "parameters": self.params,
            "metrics": self.metrics,
        });
        if let (Some(rank), Some(obj)) = (rank, doc.as_object_mut()) {
            obj.insert("rank".to_string(), json!(rank));
            obj.insert("index".to_string(), json!(rank - 1));
        }
        doc
    }
}

impl fmt::Display for ModelRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let doc = self.report(None);
        let rendered = serde_json::to_string_pretty(&doc).map_err(|_| fmt::Error)?;
        write!(f, "{}", rendered)
    }
}
