//! Stochastic gradient descent estimators
//!
//! The regressor minimizes squared error; the classifier trains one
//! log-loss model per class (one-vs-rest) and predicts the class with the
//! largest margin. Both use an inverse-scaling learning rate and a seeded
//! shuffle so fits are reproducible.

use crate::error::{AutoFitError, Result};
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdConfig {
    /// L2 regularization strength
    pub alpha: f64,
    /// Initial learning rate
    pub eta0: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub power_t: f64,
    pub random_state: u64,
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            alpha: 0.0001,
            eta0: 0.01,
            max_iter: 1000,
            tol: 1e-4,
            power_t: 0.25,
            random_state: 42,
        }
    }
}

impl SgdConfig {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.alpha < 0.0 {
            return Err(AutoFitError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }
        if self.eta0 <= 0.0 {
            return Err(AutoFitError::InvalidParameter {
                name: "eta0".to_string(),
                value: self.eta0.to_string(),
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    fn learning_rate(&self, t: usize) -> f64 {
        self.eta0 / (t as f64 + 1.0).powf(self.power_t)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// SGD regressor with squared-error loss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdRegressor {
    pub config: SgdConfig,
    weights: Option<Array1<f64>>,
    bias: f64,
}

impl SgdRegressor {
    pub fn new(config: SgdConfig) -> Self {
        Self {
            config,
            weights: None,
            bias: 0.0,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;
        let n = x.nrows();
        let p = x.ncols();
        if n == 0 {
            return Err(AutoFitError::TrainingError("empty dataset".to_string()));
        }
        if n != y.len() {
            return Err(AutoFitError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.random_state);
        let mut w: Array1<f64> = Array1::zeros(p);
        let mut b = 0.0;
        let mut indices: Vec<usize> = (0..n).collect();
        let mut prev_loss = f64::MAX;
        let mut t = 1usize;

        for epoch in 0..self.config.max_iter {
            indices.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for &i in &indices {
                let xi = x.row(i);
                let residual = xi.dot(&w) + b - y[i];
                epoch_loss += residual * residual;

                let lr = self.config.learning_rate(t);
                for j in 0..p {
                    w[j] -= lr * (residual * xi[j] + self.config.alpha * w[j]);
                }
                b -= lr * residual;
                t += 1;
            }

            epoch_loss /= n as f64;
            if epoch > 0 && (prev_loss - epoch_loss).abs() < self.config.tol {
                break;
            }
            prev_loss = epoch_loss;
        }

        self.weights = Some(w);
        self.bias = b;
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let w = self.weights.as_ref().ok_or(AutoFitError::ModelNotFitted)?;
        Ok(Array1::from_vec(
            x.rows().into_iter().map(|row| row.dot(w) + self.bias).collect(),
        ))
    }
}

/// One-vs-rest SGD classifier with logistic loss
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdClassifier {
    pub config: SgdConfig,
    classes: Vec<i64>,
    weights: Vec<Array1<f64>>,
    biases: Vec<f64>,
}

impl SgdClassifier {
    pub fn new(config: SgdConfig) -> Self {
        Self {
            config,
            classes: Vec::new(),
            weights: Vec::new(),
            biases: Vec::new(),
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        self.config.validate()?;
        let n = x.nrows();
        if n == 0 {
            return Err(AutoFitError::TrainingError("empty dataset".to_string()));
        }
        if n != y.len() {
            return Err(AutoFitError::ShapeError {
                expected: format!("y length = {}", n),
                actual: format!("y length = {}", y.len()),
            });
        }

        let mut classes: Vec<i64> = y.iter().map(|&v| v.round() as i64).collect();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(AutoFitError::TrainingError(
                "classification needs at least two classes".to_string(),
            ));
        }

        let mut weights = Vec::with_capacity(classes.len());
        let mut biases = Vec::with_capacity(classes.len());

        for (class_idx, &class) in classes.iter().enumerate() {
            let targets: Vec<f64> = y
                .iter()
                .map(|&v| if v.round() as i64 == class { 1.0 } else { 0.0 })
                .collect();
            let seed = self.config.random_state.wrapping_add(class_idx as u64);
            let (w, b) = self.fit_binary(x, &targets, seed);
            weights.push(w);
            biases.push(b);
        }

        self.classes = classes;
        self.weights = weights;
        self.biases = biases;
        Ok(())
    }

    fn fit_binary(&self, x: &Array2<f64>, targets: &[f64], seed: u64) -> (Array1<f64>, f64) {
        let n = x.nrows();
        let p = x.ncols();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let mut w: Array1<f64> = Array1::zeros(p);
        let mut b = 0.0;
        let mut indices: Vec<usize> = (0..n).collect();
        let mut prev_loss = f64::MAX;
        let mut t = 1usize;

        for epoch in 0..self.config.max_iter {
            indices.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for &i in &indices {
                let xi = x.row(i);
                let prob = sigmoid(xi.dot(&w) + b);
                let diff = prob - targets[i];
                epoch_loss -= targets[i] * prob.max(1e-15).ln()
                    + (1.0 - targets[i]) * (1.0 - prob).max(1e-15).ln();

                let lr = self.config.learning_rate(t);
                for j in 0..p {
                    w[j] -= lr * (diff * xi[j] + self.config.alpha * w[j]);
                }
                b -= lr * diff;
                t += 1;
            }

            epoch_loss /= n as f64;
            if epoch > 0 && (prev_loss - epoch_loss).abs() < self.config.tol {
                break;
            }
            prev_loss = epoch_loss;
        }

        (w, b)
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.classes.is_empty() {
            return Err(AutoFitError::ModelNotFitted);
        }

        let predictions: Vec<f64> = x
            .rows()
            .into_iter()
            .map(|row| {
                let best = self
                    .weights
                    .iter()
                    .zip(self.biases.iter())
                    .map(|(w, &b)| row.dot(w) + b)
                    .enumerate()
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
                best.map(|(idx, _)| self.classes[idx] as f64).unwrap_or(0.0)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_regressor_learns_slope() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![2.0, 4.0, 6.0, 8.0, 10.0];

        let mut sgd = SgdRegressor::new(SgdConfig {
            eta0: 0.05,
            max_iter: 500,
            ..Default::default()
        });
        sgd.fit(&x, &y).unwrap();

        let predictions = sgd.predict(&x).unwrap();
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1.0, "prediction {} vs {}", p, t);
        }
    }

    #[test]
    fn test_classifier_three_classes() {
        let x = array![
            [0.0, 0.0],
            [0.2, 0.1],
            [5.0, 5.0],
            [5.2, 5.1],
            [10.0, 0.0],
            [10.2, 0.1],
        ];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];

        let mut sgd = SgdClassifier::new(SgdConfig {
            eta0: 0.1,
            max_iter: 300,
            ..Default::default()
        });
        sgd.fit(&x, &y).unwrap();

        let predictions = sgd.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (**p - **t).abs() < 0.5)
            .count();
        assert!(correct >= 5, "only {} of 6 correct", correct);
    }

    #[test]
    fn test_single_class_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![1.0, 1.0];
        let mut sgd = SgdClassifier::new(SgdConfig::default());
        assert!(sgd.fit(&x, &y).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        let mut sgd = SgdRegressor::new(SgdConfig {
            eta0: 0.0,
            ..Default::default()
        });
        assert!(sgd.fit(&x, &y).is_err());
    }
}
