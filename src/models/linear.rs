//! Ridge regression
//!
//! Closed-form fit on centered data: solve (XᵀX + αI) w = Xᵀy with a
//! Cholesky factorization, falling back to Gauss-Jordan inversion when the
//! regularized Gram matrix is not positive definite.

use crate::error::{AutoFitError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeRegression {
    pub alpha: f64,
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl RidgeRegression {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            coefficients: None,
            intercept: 0.0,
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
        if n_samples == 0 {
            return Err(AutoFitError::TrainingError("empty dataset".to_string()));
        }
        if self.alpha < 0.0 {
            return Err(AutoFitError::InvalidParameter {
                name: "alpha".to_string(),
                value: self.alpha.to_string(),
                reason: "must be non-negative".to_string(),
            });
        }

        // Center so the intercept can be recovered after the solve
        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| AutoFitError::ComputationError("mean of empty axis".to_string()))?;
        let y_mean = y.sum() / n_samples as f64;
        let x_c = x - &x_mean.view().insert_axis(Axis(0));
        let y_c = y - y_mean;

        let mut gram = x_c.t().dot(&x_c);
        for i in 0..n_features {
            gram[[i, i]] += self.alpha;
        }
        let moment = x_c.t().dot(&y_c);

        let coefficients = match cholesky_solve(&gram, &moment) {
            Some(w) => w,
            None => {
                let inv = gauss_jordan_inverse(&gram).ok_or_else(|| {
                    AutoFitError::ComputationError("singular Gram matrix".to_string())
                })?;
                inv.dot(&moment)
            }
        };

        self.intercept = y_mean - coefficients.dot(&x_mean);
        self.coefficients = Some(coefficients);
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(AutoFitError::ModelNotFitted)?;
        Ok(x.dot(coefficients) + self.intercept)
    }
}

fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L Lᵀ
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let sum: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= 0.0 {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward: L z = b
    let mut z = Array1::<f64>::zeros(n);
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[[i, j]] * z[j]).sum();
        z[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward: Lᵀ w = z
    let mut w = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|j| l[[j, i]] * w[j]).sum();
        w[i] = (z[i] - sum) / l[[i, i]];
    }

    Some(w)
}

fn gauss_jordan_inverse(m: &Array2<f64>) -> Option<Array2<f64>> {
    let n = m.nrows();
    if n != m.ncols() {
        return None;
    }

    let mut aug = Array2::<f64>::zeros((n, 2 * n));
    for i in 0..n {
        for j in 0..n {
            aug[[i, j]] = m[[i, j]];
        }
        aug[[i, n + i]] = 1.0;
    }

    for col in 0..n {
        let mut pivot_row = col;
        for row in col + 1..n {
            if aug[[row, col]].abs() > aug[[pivot_row, col]].abs() {
                pivot_row = row;
            }
        }
        if aug[[pivot_row, col]].abs() < 1e-10 {
            return None;
        }
        if pivot_row != col {
            for j in 0..2 * n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        for j in 0..2 * n {
            aug[[col, j]] /= pivot;
        }
        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                for j in 0..2 * n {
                    aug[[row, j]] -= factor * aug[[col, j]];
                }
            }
        }
    }

    let mut inv = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            inv[[i, j]] = aug[[i, n + j]];
        }
    }
    Some(inv)
}
