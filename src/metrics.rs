//! Scoring metrics and the ranking direction table
//!
//! Every metric the engine records is listed in [`direction_of`]; ranking
//! never infers whether a metric is accuracy-style or error-style.

use ndarray::Array1;

/// Primary cross-validation score for classification
pub const TRAINING_ACCURACY: &str = "training_accuracy";
/// Primary cross-validation score for regression (raw RMSE, lower is better)
pub const TRAINING_RMSE: &str = "training_rmse";
/// Macro-averaged Jaccard score against the training labels
pub const JACCARD_SCORE: &str = "jaccard_score";
/// Macro-averaged F1 score against the training labels
pub const F1_SCORE: &str = "f1_score";
pub const MEAN_ABSOLUTE_ERROR: &str = "mean_absolute_error";
pub const MEAN_SQUARED_ERROR: &str = "mean_squared_error";
pub const R2_SCORE: &str = "r2_score";

/// Whether larger or smaller values of a metric indicate a better model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    HigherIsBetter,
    LowerIsBetter,
}

/// Fixed direction table for every metric the engine produces.
///
/// Returns `None` for unknown metric names.
pub fn direction_of(metric: &str) -> Option<Direction> {
    match metric {
        TRAINING_ACCURACY | JACCARD_SCORE | F1_SCORE | R2_SCORE => Some(Direction::HigherIsBetter),
        TRAINING_RMSE | MEAN_ABSOLUTE_ERROR | MEAN_SQUARED_ERROR => Some(Direction::LowerIsBetter),
        _ => None,
    }
}

/// Fraction of exactly matching labels
pub fn accuracy(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| (**t - **p).abs() < 0.5)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Per-class counts of true positives, false positives and false negatives
fn per_class_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Vec<(usize, usize, usize)> {
    let classes = union_classes(y_true, y_pred);
    classes
        .iter()
        .map(|&class| {
            let mut tp = 0;
            let mut fp = 0;
            let mut fn_ = 0;
            for (t, p) in y_true.iter().zip(y_pred.iter()) {
                let t_is = t.round() as i64 == class;
                let p_is = p.round() as i64 == class;
                match (t_is, p_is) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            (tp, fp, fn_)
        })
        .collect()
}

fn union_classes(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Vec<i64> {
    let mut classes: Vec<i64> = y_true
        .iter()
        .chain(y_pred.iter())
        .map(|&v| v.round() as i64)
        .collect();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Macro-averaged Jaccard score: mean over classes of |TP| / |TP + FP + FN|
pub fn jaccard_macro(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let counts = per_class_counts(y_true, y_pred);
    if counts.is_empty() {
        return 0.0;
    }
    let total: f64 = counts
        .iter()
        .map(|&(tp, fp, fn_)| {
            let denom = tp + fp + fn_;
            if denom == 0 {
                0.0
            } else {
                tp as f64 / denom as f64
            }
        })
        .sum();
    total / counts.len() as f64
}

/// Macro-averaged F1 score: mean over classes of 2 * TP / (2 * TP + FP + FN)
pub fn f1_macro(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    let counts = per_class_counts(y_true, y_pred);
    if counts.is_empty() {
        return 0.0;
    }
    let total: f64 = counts
        .iter()
        .map(|&(tp, fp, fn_)| {
            let denom = 2 * tp + fp + fn_;
            if denom == 0 {
                0.0
            } else {
                2.0 * tp as f64 / denom as f64
            }
        })
        .sum();
    total / counts.len() as f64
}

pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / y_true.len() as f64
}

pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum::<f64>()
        / y_true.len() as f64
}

pub fn root_mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    mean_squared_error(y_true, y_pred).sqrt()
}

/// Coefficient of determination
pub fn r2_score(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let n = y_true.len() as f64;
    let y_mean = y_true.sum() / n;
    let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else {
        0.0
    }
}
