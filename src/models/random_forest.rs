//! Random forest estimator
//!
//! Bagged decision trees with per-tree feature subsampling. Trees build in
//! parallel on the rayon pool; bootstrap sampling is seeded so a forest fit
//! twice on the same data is identical.

use super::decision_tree::{Criterion, DecisionTree};
use crate::error::{AutoFitError, Result};
use ndarray::{Array1, Array2, Axis};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-tree feature subset size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MaxFeatures {
    Sqrt,
    Log2,
    All,
}

impl MaxFeatures {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "sqrt" => Ok(MaxFeatures::Sqrt),
            "log2" => Ok(MaxFeatures::Log2),
            "all" => Ok(MaxFeatures::All),
            _ => Err(AutoFitError::InvalidParameter {
                name: "max_features".to_string(),
                value: name.to_string(),
                reason: "expected one of sqrt, log2, all".to_string(),
            }),
        }
    }

    fn resolve(&self, n_features: usize) -> usize {
        let n = match self {
            MaxFeatures::Sqrt => (n_features as f64).sqrt().ceil() as usize,
            MaxFeatures::Log2 => (n_features as f64).log2().ceil() as usize,
            MaxFeatures::All => n_features,
        };
        n.clamp(1, n_features)
    }
}

/// Random forest for classification or regression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
    pub criterion: Criterion,
    pub random_state: u64,
    is_classification: bool,
}

impl RandomForest {
    pub fn new_classifier(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            criterion: Criterion::Gini,
            random_state: 42,
            is_classification: true,
        }
    }

    pub fn new_regressor(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            criterion: Criterion::Mse,
            random_state: 42,
            is_classification: false,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_features(mut self, max_features: MaxFeatures) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
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
        if self.n_estimators == 0 {
            return Err(AutoFitError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let max_features = self.max_features.resolve(x.ncols());
        let base_seed = self.random_state;

        let trees = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| rng.next_u64() as usize % n_samples)
                    .collect();

                let x_boot = x.select(Axis(0), &sample_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = if self.is_classification {
                    DecisionTree::new_classifier()
                } else {
                    DecisionTree::new_regressor()
                };
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }
                tree = tree
                    .with_criterion(self.criterion)
                    .with_max_features(max_features);

                tree.fit(&x_boot, &y_boot)?;
                Ok(tree)
            })
            .collect::<Result<Vec<DecisionTree>>>()?;
        self.trees = trees;

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(AutoFitError::ModelNotFitted);
        }

        let all_predictions: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .map(|tree| tree.predict(x))
            .collect::<Result<Vec<_>>>()?;

        let n_samples = x.nrows();
        let predictions: Vec<f64> = if self.is_classification {
            (0..n_samples)
                .map(|i| {
                    let mut votes: BTreeMap<i64, usize> = BTreeMap::new();
                    for preds in &all_predictions {
                        *votes.entry(preds[i].round() as i64).or_insert(0) += 1;
                    }
                    votes
                        .into_iter()
                        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
                        .map(|(class, _)| class as f64)
                        .unwrap_or(0.0)
                })
                .collect()
        } else {
            (0..n_samples)
                .map(|i| {
                    all_predictions.iter().map(|p| p[i]).sum::<f64>() / all_predictions.len() as f64
                })
                .collect()
        };

        Ok(Array1::from_vec(predictions))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_classifier_separable() {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut forest = RandomForest::new_classifier(10).with_random_state(42);
        forest.fit(&x, &y).unwrap();
        assert_eq!(forest.n_trees(), 10);

        let predictions = forest.predict(&x).unwrap();
        let accuracy = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (**p - **t).abs() < 0.5)
            .count() as f64
            / y.len() as f64;
        assert!(accuracy >= 0.8, "accuracy too low: {}", accuracy);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut a = RandomForest::new_classifier(5).with_random_state(7);
        let mut b = RandomForest::new_classifier(5).with_random_state(7);
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict(&x).unwrap(), b.predict(&x).unwrap());
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        let mut forest = RandomForest::new_classifier(0);
        assert!(forest.fit(&x, &y).is_err());
    }
}
