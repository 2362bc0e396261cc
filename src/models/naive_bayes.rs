//! Gaussian naive Bayes classifier
//!
//! Per-class feature moments are accumulated in a single Welford pass.

use crate::error::{AutoFitError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::f64::consts::PI;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GaussianNb {
    means: HashMap<i64, Vec<f64>>,
    variances: HashMap<i64, Vec<f64>>,
    priors: HashMap<i64, f64>,
    classes: Vec<i64>,
    pub var_smoothing: f64,
}

impl Default for GaussianNb {
    fn default() -> Self {
        Self::new(1e-9)
    }
}

impl GaussianNb {
    pub fn new(var_smoothing: f64) -> Self {
        Self {
            means: HashMap::new(),
            variances: HashMap::new(),
            priors: HashMap::new(),
            classes: Vec::new(),
            var_smoothing,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(AutoFitError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.var_smoothing <= 0.0 {
            return Err(AutoFitError::InvalidParameter {
                name: "var_smoothing".to_string(),
                value: self.var_smoothing.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let mut class_indices: HashMap<i64, Vec<usize>> = HashMap::new();
        for (i, &label) in y.iter().enumerate() {
            class_indices.entry(label.round() as i64).or_default().push(i);
        }

        self.classes = class_indices.keys().copied().collect();
        self.classes.sort_unstable();

        self.means.clear();
        self.variances.clear();
        self.priors.clear();

        for (&class, indices) in &class_indices {
            self.priors
                .insert(class, indices.len() as f64 / n_samples as f64);

            // Welford's online mean/variance, one pass over the class rows
            let mut means = vec![0.0; n_features];
            let mut m2 = vec![0.0; n_features];
            let mut count = 0usize;
            for &idx in indices {
                count += 1;
                for (j, &val) in x.row(idx).iter().enumerate() {
                    let delta = val - means[j];
                    means[j] += delta / count as f64;
                    m2[j] += delta * (val - means[j]);
                }
            }
            let variances: Vec<f64> = m2
                .iter()
                .map(|&m| m / count as f64 + self.var_smoothing)
                .collect();

            self.means.insert(class, means);
            self.variances.insert(class, variances);
        }

        Ok(())
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
                    .classes
                    .iter()
                    .map(|&class| {
                        let log_prior = self.priors[&class].ln();
                        (class, log_prior + self.log_likelihood(row.iter(), class))
                    })
                    .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
                best.map(|(class, _)| class as f64).unwrap_or(0.0)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn log_likelihood<'a>(&self, row: impl Iterator<Item = &'a f64>, class: i64) -> f64 {
        let means = &self.means[&class];
        let vars = &self.variances[&class];
        row.zip(means.iter())
            .zip(vars.iter())
            .map(|((&xi, &mean), &var)| -0.5 * ((xi - mean).powi(2) / var + var.ln() + (2.0 * PI).ln()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_separable_classes() {
        let x = array![
            [1.0, 1.0],
            [1.2, 0.9],
            [0.8, 1.1],
            [5.0, 5.0],
            [5.2, 4.9],
            [4.8, 5.1],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut nb = GaussianNb::default();
        nb.fit(&x, &y).unwrap();

        let predictions = nb.predict(&x).unwrap();
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 0.5);
        }
    }

    #[test]
    fn test_three_classes() {
        let x = array![[0.0], [0.1], [5.0], [5.1], [10.0], [10.1]];
        let y = array![0.0, 0.0, 1.0, 1.0, 2.0, 2.0];

        let mut nb = GaussianNb::default();
        nb.fit(&x, &y).unwrap();

        let predictions = nb.predict(&array![[0.05], [5.05], [10.05]]).unwrap();
        assert_eq!(predictions, array![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_nonpositive_smoothing_rejected() {
        let x = array![[0.0], [1.0]];
        let y = array![0.0, 1.0];
        let mut nb = GaussianNb::new(0.0);
        assert!(nb.fit(&x, &y).is_err());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let nb = GaussianNb::default();
        assert!(matches!(
            nb.predict(&array![[0.0]]),
            Err(AutoFitError::ModelNotFitted)
        ));
    }
}
