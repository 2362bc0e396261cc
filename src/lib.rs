//! autofit - automated model selection for tabular data
//!
//! Given a feature matrix and a label vector, the engine searches a fixed
//! catalog of model families, tunes each family with cross-validated grid
//! search, and surfaces either the single best trained model or a ranked
//! list of every candidate. Trained records can be persisted to a single
//! archive file and reloaded.
//!
//! # Modules
//!
//! - [`grid`] - hyperparameter grid registry (one per task type)
//! - [`models`] - estimator catalog with native model implementations
//! - [`search`] - cross-validated grid search and the per-family orchestrator
//! - [`ranking`] - ranked model list with indexed removal
//! - [`record`] - the trained-candidate record
//! - [`archive`] - zip persistence for records
//! - [`metrics`] - scoring functions and the metric direction table
//!
//! # Example
//!
//! ```no_run
//! use autofit::prelude::*;
//! use ndarray::{Array1, Array2};
//!
//! fn select(x: &Array2<f64>, y: &Array1<f64>) {
//!     let report = ModelSearch::classification().fit_best(x, y, DEFAULT_FOLDS);
//!     for failure in &report.failed {
//!         eprintln!("{} failed: {}", failure.family, failure.detail);
//!     }
//!     if report.record.is_fitted() {
//!         println!("{}", report.record);
//!     }
//! }
//! ```

// Core error handling
pub mod error;

// Search space and estimators
pub mod grid;
pub mod metrics;
pub mod models;

// Search, ranking, persistence
pub mod archive;
pub mod ranking;
pub mod record;
pub mod search;

pub use error::{AutoFitError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{AutoFitError, Result};

    pub use crate::grid::{
        classifier_grids, regressor_grids, GridPoint, GridRegistry, ParamGrid, ParamValue,
        ParamValues,
    };

    pub use crate::models::{Estimator, TaskKind};

    pub use crate::search::{ModelSearch, SearchReport, TrainingFailure, DEFAULT_FOLDS};

    pub use crate::ranking::RankedModelList;

    pub use crate::record::ModelRecord;

    pub use crate::metrics::Direction;
}
