//! Cross-validated model search
//!
//! [`trainer`] runs the grid search for a single family; [`selector`] drives
//! the sequential per-family loop in best-only or list mode.

pub mod cross_validation;
pub mod selector;
pub mod trainer;

pub use cross_validation::{k_fold, stratified_k_fold, CvSplit};
pub use selector::{ModelSearch, SearchReport, DEFAULT_FOLDS};
pub use trainer::{train_family, TrainedCandidate, TrainingFailure};
