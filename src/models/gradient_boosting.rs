//! Gradient-boosted regression trees
//!
//! Mean-initialized residual boosting: each round fits a shallow regression
//! tree to the current residuals and adds a shrunken copy of its predictions.

use super::decision_tree::DecisionTree;
use crate::error::{AutoFitError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    trees: Vec<DecisionTree>,
    initial_prediction: f64,
}

impl GradientBoostingRegressor {
    pub fn new(n_estimators: usize, learning_rate: f64, max_depth: usize) -> Self {
        Self {
            n_estimators,
            learning_rate,
            max_depth,
            trees: Vec::new(),
            initial_prediction: 0.0,
        }
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
        if self.n_estimators == 0 {
            return Err(AutoFitError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.learning_rate <= 0.0 || self.learning_rate > 1.0 {
            return Err(AutoFitError::InvalidParameter {
                name: "learning_rate".to_string(),
                value: self.learning_rate.to_string(),
                reason: "must be in (0, 1]".to_string(),
            });
        }
        if self.max_depth == 0 {
            return Err(AutoFitError::InvalidParameter {
                name: "max_depth".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        self.initial_prediction = y.sum() / n_samples as f64;
        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);
        self.trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let residuals: Array1<f64> = y - &predictions;

            let mut tree = DecisionTree::new_regressor().with_max_depth(self.max_depth);
            tree.fit(x, &residuals)?;

            let update = tree.predict(x)?;
            predictions = predictions + update.mapv(|v| v * self.learning_rate);
            self.trees.push(tree);
        }

        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(AutoFitError::ModelNotFitted);
        }

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for tree in &self.trees {
            let update = tree.predict(x)?;
            predictions = predictions + update.mapv(|v| v * self.learning_rate);
        }
        Ok(predictions)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}
