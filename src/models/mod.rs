//! Estimator catalog
//!
//! Every supported model family is declared statically: one [`Estimator`]
//! variant, one [`FamilySpec`] entry pairing the family identifier with its
//! accepted hyperparameter names and a constructor from a grid point. The
//! search iterates this table — there is no runtime discovery of
//! implementations.

pub mod decision_tree;
pub mod gradient_boosting;
pub mod knn;
pub mod linear;
pub mod naive_bayes;
pub mod random_forest;
pub mod sgd;

pub use decision_tree::{Criterion, DecisionTree};
pub use gradient_boosting::GradientBoostingRegressor;
pub use knn::{DistanceMetric, KnnClassifier, KnnConfig, KnnRegressor, WeightScheme};
pub use linear::RidgeRegression;
pub use naive_bayes::GaussianNb;
pub use random_forest::{MaxFeatures, RandomForest};
pub use sgd::{SgdClassifier, SgdConfig, SgdRegressor};

use crate::error::{AutoFitError, Result};
use crate::grid::GridPoint;
use crate::metrics;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Task type a search is run for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    Classification,
    Regression,
}

impl TaskKind {
    /// Name of the primary metric recorded for this task
    pub fn primary_metric(&self) -> &'static str {
        match self {
            TaskKind::Classification => metrics::TRAINING_ACCURACY,
            TaskKind::Regression => metrics::TRAINING_RMSE,
        }
    }

    /// Score one held-out fold, normalized so that higher is always better
    /// (accuracy for classification, negative RMSE for regression).
    pub(crate) fn fold_score(&self, y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        match self {
            TaskKind::Classification => metrics::accuracy(y_true, y_pred),
            TaskKind::Regression => -metrics::root_mean_squared_error(y_true, y_pred),
        }
    }

    /// Convert a normalized cross-validation score into the value stored
    /// under the primary metric (RMSE is recorded as its raw positive value).
    pub(crate) fn primary_value(&self, normalized_score: f64) -> f64 {
        match self {
            TaskKind::Classification => normalized_score,
            TaskKind::Regression => -normalized_score,
        }
    }
}

/// A trained (or trainable) model instance, one variant per family
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    DecisionTreeClassifier(DecisionTree),
    DecisionTreeRegressor(DecisionTree),
    RandomForestClassifier(RandomForest),
    RandomForestRegressor(RandomForest),
    KnnClassifier(KnnClassifier),
    KnnRegressor(KnnRegressor),
    GaussianNb(GaussianNb),
    SgdClassifier(SgdClassifier),
    SgdRegressor(SgdRegressor),
    Ridge(RidgeRegression),
    GradientBoostingRegressor(GradientBoostingRegressor),
}

impl Estimator {
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Estimator::DecisionTreeClassifier(m) | Estimator::DecisionTreeRegressor(m) => m.fit(x, y),
            Estimator::RandomForestClassifier(m) | Estimator::RandomForestRegressor(m) => m.fit(x, y),
            Estimator::KnnClassifier(m) => m.fit(x, y),
            Estimator::KnnRegressor(m) => m.fit(x, y),
            Estimator::GaussianNb(m) => m.fit(x, y),
            Estimator::SgdClassifier(m) => m.fit(x, y),
            Estimator::SgdRegressor(m) => m.fit(x, y),
            Estimator::Ridge(m) => m.fit(x, y),
            Estimator::GradientBoostingRegressor(m) => m.fit(x, y),
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::DecisionTreeClassifier(m) | Estimator::DecisionTreeRegressor(m) => m.predict(x),
            Estimator::RandomForestClassifier(m) | Estimator::RandomForestRegressor(m) => m.predict(x),
            Estimator::KnnClassifier(m) => m.predict(x),
            Estimator::KnnRegressor(m) => m.predict(x),
            Estimator::GaussianNb(m) => m.predict(x),
            Estimator::SgdClassifier(m) => m.predict(x),
            Estimator::SgdRegressor(m) => m.predict(x),
            Estimator::Ridge(m) => m.predict(x),
            Estimator::GradientBoostingRegressor(m) => m.predict(x),
        }
    }
}

/// Catalog entry for one model family
#[derive(Clone, Copy)]
pub struct FamilySpec {
    /// Family identifier, matching the grid registry key
    pub name: &'static str,
    /// Accepted hyperparameter names
    pub params: &'static [&'static str],
    /// Construct an untrained instance from a grid point
    pub build: fn(&GridPoint) -> Result<Estimator>,
}

/// All families available for a task, in the order the search visits them
pub fn catalog(task: TaskKind) -> &'static [FamilySpec] {
    match task {
        TaskKind::Classification => CLASSIFIER_CATALOG,
        TaskKind::Regression => REGRESSOR_CATALOG,
    }
}

static CLASSIFIER_CATALOG: &[FamilySpec] = &[
    FamilySpec {
        name: "DecisionTreeClassifier",
        params: &["criterion", "max_depth"],
        build: build_decision_tree_classifier,
    },
    FamilySpec {
        name: "RandomForestClassifier",
        params: &["n_estimators", "max_depth", "max_features"],
        build: build_random_forest_classifier,
    },
    FamilySpec {
        name: "KNeighborsClassifier",
        params: &["n_neighbors", "weights", "metric"],
        build: build_knn_classifier,
    },
    FamilySpec {
        name: "GaussianNB",
        params: &["var_smoothing"],
        build: build_gaussian_nb,
    },
    FamilySpec {
        name: "SGDClassifier",
        params: &["alpha"],
        build: build_sgd_classifier,
    },
];

static REGRESSOR_CATALOG: &[FamilySpec] = &[
    FamilySpec {
        name: "DecisionTreeRegressor",
        params: &["criterion", "max_depth"],
        build: build_decision_tree_regressor,
    },
    FamilySpec {
        name: "RandomForestRegressor",
        params: &["n_estimators", "max_depth"],
        build: build_random_forest_regressor,
    },
    FamilySpec {
        name: "KNeighborsRegressor",
        params: &["n_neighbors", "weights"],
        build: build_knn_regressor,
    },
    FamilySpec {
        name: "Ridge",
        params: &["alpha"],
        build: build_ridge,
    },
    FamilySpec {
        name: "SGDRegressor",
        params: &["alpha", "eta0"],
        build: build_sgd_regressor,
    },
    FamilySpec {
        name: "GradientBoostingRegressor",
        params: &["n_estimators", "learning_rate", "max_depth"],
        build: build_gradient_boosting_regressor,
    },
];

/// Read an integer parameter that must be strictly positive
fn positive_usize(point: &GridPoint, name: &str) -> Result<usize> {
    let value = point.get_i64(name)?;
    if value < 1 {
        return Err(AutoFitError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value as usize)
}

fn build_decision_tree_classifier(point: &GridPoint) -> Result<Estimator> {
    let criterion = Criterion::parse(point.get_str("criterion")?, true)?;
    let max_depth = positive_usize(point, "max_depth")?;
    Ok(Estimator::DecisionTreeClassifier(
        DecisionTree::new_classifier()
            .with_criterion(criterion)
            .with_max_depth(max_depth),
    ))
}

fn build_decision_tree_regressor(point: &GridPoint) -> Result<Estimator> {
    let criterion = Criterion::parse(point.get_str("criterion")?, false)?;
    let max_depth = positive_usize(point, "max_depth")?;
    Ok(Estimator::DecisionTreeRegressor(
        DecisionTree::new_regressor()
            .with_criterion(criterion)
            .with_max_depth(max_depth),
    ))
}

fn build_random_forest_classifier(point: &GridPoint) -> Result<Estimator> {
    let n_estimators = positive_usize(point, "n_estimators")?;
    let max_depth = positive_usize(point, "max_depth")?;
    let max_features = MaxFeatures::parse(point.get_str("max_features")?)?;
    Ok(Estimator::RandomForestClassifier(
        RandomForest::new_classifier(n_estimators)
            .with_max_depth(max_depth)
            .with_max_features(max_features),
    ))
}

fn build_random_forest_regressor(point: &GridPoint) -> Result<Estimator> {
    let n_estimators = positive_usize(point, "n_estimators")?;
    let max_depth = positive_usize(point, "max_depth")?;
    Ok(Estimator::RandomForestRegressor(
        RandomForest::new_regressor(n_estimators).with_max_depth(max_depth),
    ))
}

fn build_knn_classifier(point: &GridPoint) -> Result<Estimator> {
    let config = KnnConfig {
        n_neighbors: positive_usize(point, "n_neighbors")?,
        weights: WeightScheme::parse(point.get_str("weights")?)?,
        metric: DistanceMetric::parse(point.get_str("metric")?)?,
    };
    Ok(Estimator::KnnClassifier(KnnClassifier::new(config)))
}

fn build_knn_regressor(point: &GridPoint) -> Result<Estimator> {
    let config = KnnConfig {
        n_neighbors: positive_usize(point, "n_neighbors")?,
        weights: WeightScheme::parse(point.get_str("weights")?)?,
        metric: DistanceMetric::Euclidean,
    };
    Ok(Estimator::KnnRegressor(KnnRegressor::new(config)))
}

fn build_gaussian_nb(point: &GridPoint) -> Result<Estimator> {
    let var_smoothing = point.get_f64("var_smoothing")?;
    if var_smoothing <= 0.0 {
        return Err(AutoFitError::InvalidParameter {
            name: "var_smoothing".to_string(),
            value: var_smoothing.to_string(),
            reason: "must be positive".to_string(),
        });
    }
    Ok(Estimator::GaussianNb(GaussianNb::new(var_smoothing)))
}

fn build_sgd_classifier(point: &GridPoint) -> Result<Estimator> {
    let config = SgdConfig {
        alpha: point.get_f64("alpha")?,
        ..Default::default()
    };
    config.validate()?;
    Ok(Estimator::SgdClassifier(SgdClassifier::new(config)))
}

fn build_sgd_regressor(point: &GridPoint) -> Result<Estimator> {
    let config = SgdConfig {
        alpha: point.get_f64("alpha")?,
        eta0: point.get_f64("eta0")?,
        ..Default::default()
    };
    config.validate()?;
    Ok(Estimator::SgdRegressor(SgdRegressor::new(config)))
}

fn build_ridge(point: &GridPoint) -> Result<Estimator> {
    let alpha = point.get_f64("alpha")?;
    if alpha < 0.0 {
        return Err(AutoFitError::InvalidParameter {
            name: "alpha".to_string(),
            value: alpha.to_string(),
            reason: "must be non-negative".to_string(),
        });
    }
    Ok(Estimator::Ridge(RidgeRegression::new(alpha)))
}

fn build_gradient_boosting_regressor(point: &GridPoint) -> Result<Estimator> {
    let n_estimators = positive_usize(point, "n_estimators")?;
    let learning_rate = point.get_f64("learning_rate")?;
    let max_depth = positive_usize(point, "max_depth")?;
    if learning_rate <= 0.0 || learning_rate > 1.0 {
        return Err(AutoFitError::InvalidParameter {
            name: "learning_rate".to_string(),
            value: learning_rate.to_string(),
            reason: "must be in (0, 1]".to_string(),
        });
    }
    Ok(Estimator::GradientBoostingRegressor(
        GradientBoostingRegressor::new(n_estimators, learning_rate, max_depth),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{classifier_grids, regressor_grids};

    #[test]
    fn test_catalog_names_are_unique() {
        for task in [TaskKind::Classification, TaskKind::Regression] {
            let mut names: Vec<&str> = catalog(task).iter().map(|s| s.name).collect();
            let before = names.len();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), before);
        }
    }

    #[test]
    fn test_every_builtin_grid_point_builds() {
        for (task, registry) in [
            (TaskKind::Classification, classifier_grids()),
            (TaskKind::Regression, regressor_grids()),
        ] {
            for spec in catalog(task) {
                let grid = registry
                    .lookup(spec.name)
                    .unwrap_or_else(|| panic!("no grid for {}", spec.name));
                for point in grid.points() {
                    (spec.build)(&point)
                        .unwrap_or_else(|e| panic!("{} failed to build: {}", spec.name, e));
                }
            }
        }
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut point = GridPoint::new();
        point.insert("criterion", crate::grid::ParamValue::Str("bogus".to_string()));
        point.insert("max_depth", crate::grid::ParamValue::Int(5));
        assert!(build_decision_tree_classifier(&point).is_err());

        let mut point = GridPoint::new();
        point.insert("criterion", crate::grid::ParamValue::Str("gini".to_string()));
        point.insert("max_depth", crate::grid::ParamValue::Int(-3));
        assert!(build_decision_tree_classifier(&point).is_err());
    }

    #[test]
    fn test_primary_metric_names() {
        assert_eq!(
            TaskKind::Classification.primary_metric(),
            crate::metrics::TRAINING_ACCURACY
        );
        assert_eq!(
            TaskKind::Regression.primary_metric(),
            crate::metrics::TRAINING_RMSE
        );
    }
}
