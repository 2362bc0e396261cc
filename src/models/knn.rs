//! K-nearest neighbors estimators
//!
//! Both variants store the training data and defer all work to prediction
//! time. Neighbor lookup keeps the k smallest distances in a max-heap, so a
//! query is O(n log k) rather than a full sort.

use crate::error::{AutoFitError, Result};
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DistanceMetric {
    Euclidean,
    Manhattan,
}

impl DistanceMetric {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "euclidean" => Ok(DistanceMetric::Euclidean),
            "manhattan" => Ok(DistanceMetric::Manhattan),
            _ => Err(AutoFitError::InvalidParameter {
                name: "metric".to_string(),
                value: name.to_string(),
                reason: "expected euclidean or manhattan".to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightScheme {
    Uniform,
    Distance,
}

impl WeightScheme {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "uniform" => Ok(WeightScheme::Uniform),
            "distance" => Ok(WeightScheme::Distance),
            _ => Err(AutoFitError::InvalidParameter {
                name: "weights".to_string(),
                value: name.to_string(),
                reason: "expected uniform or distance".to_string(),
            }),
        }
    }

    fn weight(&self, dist: f64) -> f64 {
        match self {
            WeightScheme::Uniform => 1.0,
            WeightScheme::Distance => 1.0 / (dist + 1e-10),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnConfig {
    pub n_neighbors: usize,
    pub metric: DistanceMetric,
    pub weights: WeightScheme,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 5,
            metric: DistanceMetric::Euclidean,
            weights: WeightScheme::Uniform,
        }
    }
}

/// K-nearest neighbors classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnClassifier {
    config: KnnConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KnnClassifier {
    pub fn new(config: KnnConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit(&self.config, x, y)?;
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self.x_train.as_ref().ok_or(AutoFitError::ModelNotFitted)?;
        let y_train = self.y_train.as_ref().ok_or(AutoFitError::ModelNotFitted)?;
        let config = &self.config;

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = k_nearest(&x.row(i).to_vec(), x_train, y_train, config);
                vote(&neighbors, config.weights)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

/// K-nearest neighbors regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnRegressor {
    config: KnnConfig,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KnnRegressor {
    pub fn new(config: KnnConfig) -> Self {
        Self {
            config,
            x_train: None,
            y_train: None,
        }
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        validate_fit(&self.config, x, y)?;
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(())
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let x_train = self.x_train.as_ref().ok_or(AutoFitError::ModelNotFitted)?;
        let y_train = self.y_train.as_ref().ok_or(AutoFitError::ModelNotFitted)?;
        let config = &self.config;

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = k_nearest(&x.row(i).to_vec(), x_train, y_train, config);
                weighted_mean(&neighbors, config.weights)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }
}

fn validate_fit(config: &KnnConfig, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() != y.len() {
        return Err(AutoFitError::ShapeError {
            expected: format!("y length = {}", x.nrows()),
            actual: format!("y length = {}", y.len()),
        });
    }
    if config.n_neighbors == 0 {
        return Err(AutoFitError::InvalidParameter {
            name: "n_neighbors".to_string(),
            value: "0".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if config.n_neighbors > x.nrows() {
        return Err(AutoFitError::TrainingError(format!(
            "n_neighbors ({}) exceeds the number of training samples ({})",
            config.n_neighbors,
            x.nrows()
        )));
    }
    Ok(())
}

/// Max-heap entry ordered by distance; the heap keeps the k smallest
#[derive(PartialEq)]
struct DistLabel(f64, f64);

impl Eq for DistLabel {}

impl PartialOrd for DistLabel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DistLabel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.partial_cmp(&other.0).unwrap_or(Ordering::Equal)
    }
}

fn k_nearest(point: &[f64], x_train: &Array2<f64>, y_train: &Array1<f64>, config: &KnnConfig) -> Vec<(f64, f64)> {
    let k = config.n_neighbors;
    let mut heap = BinaryHeap::with_capacity(k + 1);

    for (i, row) in x_train.rows().into_iter().enumerate() {
        let dist = distance(point, row.iter(), config.metric);
        if heap.len() < k {
            heap.push(DistLabel(dist, y_train[i]));
        } else if let Some(top) = heap.peek() {
            if dist < top.0 {
                heap.pop();
                heap.push(DistLabel(dist, y_train[i]));
            }
        }
    }

    heap.into_iter().map(|dl| (dl.0, dl.1)).collect()
}

fn distance<'a>(a: &[f64], b: impl IntoIterator<Item = &'a f64>, metric: DistanceMetric) -> f64 {
    match metric {
        DistanceMetric::Euclidean => a
            .iter()
            .zip(b)
            .map(|(ai, bi)| {
                let d = ai - bi;
                d * d
            })
            .sum::<f64>()
            .sqrt(),
        DistanceMetric::Manhattan => a.iter().zip(b).map(|(ai, bi)| (ai - bi).abs()).sum(),
    }
}

fn vote(neighbors: &[(f64, f64)], weights: WeightScheme) -> f64 {
    let mut votes: BTreeMap<i64, f64> = BTreeMap::new();
    for &(dist, label) in neighbors {
        *votes.entry(label.round() as i64).or_insert(0.0) += weights.weight(dist);
    }
    votes
        .into_iter()
        .max_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(Ordering::Equal)
                .then(b.0.cmp(&a.0))
        })
        .map(|(label, _)| label as f64)
        .unwrap_or(0.0)
}

fn weighted_mean(neighbors: &[(f64, f64)], weights: WeightScheme) -> f64 {
    if neighbors.is_empty() {
        return 0.0;
    }
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;
    for &(dist, y) in neighbors {
        let w = weights.weight(dist);
        weighted_sum += w * y;
        weight_total += w;
    }
    if weight_total > 0.0 {
        weighted_sum / weight_total
    } else {
        neighbors.iter().map(|(_, y)| y).sum::<f64>() / neighbors.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn config(k: usize) -> KnnConfig {
        KnnConfig {
            n_neighbors: k,
            ..Default::default()
        }
    }

    #[test]
    fn test_classifier_separable() {
        let x = array![
            [1.0, 1.0],
            [1.5, 1.5],
            [2.0, 2.0],
            [8.0, 8.0],
            [8.5, 8.5],
            [9.0, 9.0],
        ];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];

        let mut knn = KnnClassifier::new(config(3));
        knn.fit(&x, &y).unwrap();

        let predictions = knn.predict(&x).unwrap();
        for (p, t) in predictions.iter().zip(y.iter()) {
            assert!((p - t).abs() < 0.5);
        }
    }

    #[test]
    fn test_regressor_interpolates() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];

        let mut knn = KnnRegressor::new(config(3));
        knn.fit(&x, &y).unwrap();

        let predictions = knn.predict(&array![[3.5]]).unwrap();
        assert!((predictions[0] - 3.5).abs() < 1.0);
    }

    #[test]
    fn test_too_many_neighbors_rejected() {
        let x = array![[1.0], [2.0]];
        let y = array![0.0, 1.0];
        let mut knn = KnnClassifier::new(config(5));
        assert!(knn.fit(&x, &y).is_err());
    }

    #[test]
    fn test_distance_metrics() {
        assert!((distance(&[0.0, 0.0], &[3.0, 4.0], DistanceMetric::Euclidean) - 5.0).abs() < 1e-9);
        assert!((distance(&[0.0, 0.0], &[3.0, 4.0], DistanceMetric::Manhattan) - 7.0).abs() < 1e-9);
    }
}
