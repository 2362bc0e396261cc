//! Decision tree estimator
//!
//! One implementation serves both tasks: classification trees predict the
//! majority class of a leaf, regression trees the leaf mean.

use crate::error::{AutoFitError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Impurity criterion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Criterion {
    /// Gini impurity (classification)
    Gini,
    /// Entropy (classification)
    Entropy,
    /// Mean squared error (regression)
    Mse,
    /// Mean absolute error around the median (regression)
    Mae,
}

impl Criterion {
    /// Parse a grid choice. Only criteria legal for the requested task parse.
    pub fn parse(name: &str, classification: bool) -> Result<Self> {
        let criterion = match name {
            "gini" => Criterion::Gini,
            "entropy" => Criterion::Entropy,
            "mse" => Criterion::Mse,
            "mae" => Criterion::Mae,
            _ => {
                return Err(AutoFitError::InvalidParameter {
                    name: "criterion".to_string(),
                    value: name.to_string(),
                    reason: "unknown impurity criterion".to_string(),
                })
            }
        };
        let legal = match criterion {
            Criterion::Gini | Criterion::Entropy => classification,
            Criterion::Mse | Criterion::Mae => !classification,
        };
        if !legal {
            return Err(AutoFitError::InvalidParameter {
                name: "criterion".to_string(),
                value: name.to_string(),
                reason: "criterion does not match the task type".to_string(),
            });
        }
        Ok(criterion)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Decision tree for classification or regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of features scanned per split; `None` scans all
    pub max_features: Option<usize>,
    pub criterion: Criterion,
    is_classification: bool,
}

impl DecisionTree {
    pub fn new_classifier() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Gini,
            is_classification: true,
        }
    }

    pub fn new_regressor() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            criterion: Criterion::Mse,
            is_classification: false,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(AutoFitError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(AutoFitError::TrainingError("empty dataset".to_string()));
        }
        if self.max_depth == Some(0) {
            return Err(AutoFitError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_node(x, y, &indices, 0));
        Ok(())
    }

    fn build_node(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = indices.len() < self.min_samples_split
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(&y_subset);

        if should_stop {
            return TreeNode::Leaf {
                value: self.leaf_value(&y_subset),
            };
        }

        match self.best_split(x, y, indices) {
            Some((feature_idx, threshold)) => {
                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| x[[i, feature_idx]] <= threshold);

                if left_idx.len() < self.min_samples_leaf || right_idx.len() < self.min_samples_leaf {
                    return TreeNode::Leaf {
                        value: self.leaf_value(&y_subset),
                    };
                }

                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left: Box::new(self.build_node(x, y, &left_idx, depth + 1)),
                    right: Box::new(self.build_node(x, y, &right_idx, depth + 1)),
                }
            }
            None => TreeNode::Leaf {
                value: self.leaf_value(&y_subset),
            },
        }
    }

    /// Scan candidate thresholds feature by feature, keeping running
    /// left/right statistics so each threshold costs one pass over the node.
    fn best_split(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<(usize, f64)> {
        let n_features = x.ncols();
        let n_scan = self.max_features.unwrap_or(n_features).min(n_features).max(1);

        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let parent_impurity = self.impurity(&y_subset);
        let n = indices.len() as f64;

        let mut best: Option<(usize, f64, f64)> = None;

        for feature_idx in 0..n_scan {
            // Sort node samples once per feature, then sweep the boundary
            let mut order: Vec<usize> = indices.to_vec();
            order.sort_by(|&a, &b| {
                x[[a, feature_idx]]
                    .partial_cmp(&x[[b, feature_idx]])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left: SplitSide = SplitSide::new();
            let mut right: SplitSide = SplitSide::new();
            for &i in &order {
                right.add(y[i]);
            }

            for w in 0..order.len() - 1 {
                let yi = y[order[w]];
                left.add(yi);
                right.remove(yi);

                let lo = x[[order[w], feature_idx]];
                let hi = x[[order[w + 1], feature_idx]];
                if hi - lo < 1e-12 {
                    continue;
                }
                if left.count < self.min_samples_leaf || right.count < self.min_samples_leaf {
                    continue;
                }

                let threshold = (lo + hi) / 2.0;
                let weighted = (left.count as f64 * left.impurity(self.criterion)
                    + right.count as f64 * right.impurity(self.criterion))
                    / n;
                let gain = parent_impurity - weighted;

                if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                    best = Some((feature_idx, threshold, gain));
                }
            }
        }

        best.map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    fn impurity(&self, y: &[f64]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        let mut side = SplitSide::new();
        for &v in y {
            side.add(v);
        }
        side.impurity(self.criterion)
    }

    fn leaf_value(&self, y: &[f64]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        if self.is_classification {
            let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
            for &v in y {
                *counts.entry(v.round() as i64).or_insert(0) += 1;
            }
            // Ties resolve to the smallest class label for determinism
            counts
                .into_iter()
                .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                .map(|(class, _)| class as f64)
                .unwrap_or(0.0)
        } else {
            y.iter().sum::<f64>() / y.len() as f64
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(AutoFitError::ModelNotFitted)?;
        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| predict_row(root, &x.row(i).to_vec()))
            .collect();
        Ok(Array1::from_vec(predictions))
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

fn predict_row(node: &TreeNode, sample: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_row(left, sample)
            } else {
                predict_row(right, sample)
            }
        }
    }
}

fn is_pure(y: &[f64]) -> bool {
    y.first()
        .map_or(true, |&first| y.iter().all(|&v| (v - first).abs() < 1e-10))
}

/// Running statistics for one side of a candidate split
struct SplitSide {
    count: usize,
    sum: f64,
    sq_sum: f64,
    class_counts: BTreeMap<i64, usize>,
}

impl SplitSide {
    fn new() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            sq_sum: 0.0,
            class_counts: BTreeMap::new(),
        }
    }

    fn add(&mut self, y: f64) {
        self.count += 1;
        self.sum += y;
        self.sq_sum += y * y;
        *self.class_counts.entry(y.round() as i64).or_insert(0) += 1;
    }

    fn remove(&mut self, y: f64) {
        self.count -= 1;
        self.sum -= y;
        self.sq_sum -= y * y;
        if let Some(c) = self.class_counts.get_mut(&(y.round() as i64)) {
            *c = c.saturating_sub(1);
        }
    }

    fn impurity(&self, criterion: Criterion) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        match criterion {
            Criterion::Gini => {
                let mut gini = 1.0;
                for &c in self.class_counts.values() {
                    let p = c as f64 / n;
                    gini -= p * p;
                }
                gini
            }
            Criterion::Entropy => {
                let mut entropy = 0.0;
                for &c in self.class_counts.values() {
                    if c > 0 {
                        let p = c as f64 / n;
                        entropy -= p * p.ln();
                    }
                }
                entropy
            }
            // MAE around the median needs the raw values; the variance is a
            // close surrogate for split scanning and keeps the sweep O(1).
            Criterion::Mse | Criterion::Mae => self.sq_sum / n - (self.sum / n).powi(2),
        }
    }
}
