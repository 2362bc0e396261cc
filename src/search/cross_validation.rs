//! K-fold split generation
//!
//! Splits are deterministic (no shuffling): contiguous folds for regression,
//! per-class round-robin assignment for classification. Determinism keeps
//! the tie-breaking rule of the grid search reproducible.

use crate::error::{AutoFitError, Result};
use ndarray::Array1;
use std::collections::BTreeMap;

/// One train/validation split
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
    pub fold_idx: usize,
}

fn validate(n_samples: usize, n_splits: usize) -> Result<()> {
    if n_splits < 2 {
        return Err(AutoFitError::ValidationError(
            "n_splits must be at least 2".to_string(),
        ));
    }
    if n_samples < n_splits {
        return Err(AutoFitError::ValidationError(format!(
            "n_samples ({}) must be >= n_splits ({})",
            n_samples, n_splits
        )));
    }
    Ok(())
}

/// Contiguous k-fold split over `0..n_samples`
pub fn k_fold(n_samples: usize, n_splits: usize) -> Result<Vec<CvSplit>> {
    validate(n_samples, n_splits)?;

    let base = n_samples / n_splits;
    let remainder = n_samples % n_splits;

    let mut splits = Vec::with_capacity(n_splits);
    let mut current = 0;

    for fold_idx in 0..n_splits {
        let fold_size = if fold_idx < remainder { base + 1 } else { base };
        let test_indices: Vec<usize> = (current..current + fold_size).collect();
        let train_indices: Vec<usize> = (0..current)
            .chain(current + fold_size..n_samples)
            .collect();

        splits.push(CvSplit {
            train_indices,
            test_indices,
            fold_idx,
        });
        current += fold_size;
    }

    Ok(splits)
}

/// Stratified k-fold split: samples of each class are dealt round-robin
/// across folds so every fold keeps the class distribution.
pub fn stratified_k_fold(y: &Array1<f64>, n_splits: usize) -> Result<Vec<CvSplit>> {
    validate(y.len(), n_splits)?;

    let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, &label) in y.iter().enumerate() {
        class_indices.entry(label.round() as i64).or_default().push(idx);
    }

    let mut folds: Vec<Vec<usize>> = vec![Vec::new(); n_splits];
    for indices in class_indices.values() {
        for (i, &idx) in indices.iter().enumerate() {
            folds[i % n_splits].push(idx);
        }
    }

    if folds.iter().any(|f| f.is_empty()) {
        return Err(AutoFitError::ValidationError(format!(
            "too few samples to fill {} stratified folds",
            n_splits
        )));
    }

    let mut splits = Vec::with_capacity(n_splits);
    for fold_idx in 0..n_splits {
        let test_indices = folds[fold_idx].clone();
        let train_indices: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != fold_idx)
            .flat_map(|(_, f)| f.iter().copied())
            .collect();

        splits.push(CvSplit {
            train_indices,
            test_indices,
            fold_idx,
        });
    }

    Ok(splits)
}
