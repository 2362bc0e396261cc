//! Built-in hyperparameter grids for classification families

use super::{GridRegistry, ParamGrid};
use crate::models::TaskKind;
use once_cell::sync::Lazy;

static CLASSIFIER_GRIDS: Lazy<GridRegistry> = Lazy::new(|| {
    GridRegistry::try_new(
        TaskKind::Classification,
        vec![
            (
                "DecisionTreeClassifier",
                ParamGrid::new()
                    .choices("criterion", &["gini", "entropy"])
                    .ints("max_depth", (3..=12).collect()),
            ),
            (
                "RandomForestClassifier",
                ParamGrid::new()
                    .ints("n_estimators", vec![20, 50])
                    .ints("max_depth", vec![4, 6, 8])
                    .choices("max_features", &["sqrt", "log2"]),
            ),
            (
                "KNeighborsClassifier",
                ParamGrid::new()
                    .ints("n_neighbors", (3..=14).collect())
                    .choices("weights", &["uniform", "distance"])
                    .choices("metric", &["euclidean", "manhattan"]),
            ),
            (
                "GaussianNB",
                ParamGrid::new().floats("var_smoothing", vec![1e-9, 1e-8, 1e-7]),
            ),
            (
                "SGDClassifier",
                ParamGrid::new().floats("alpha", vec![0.0001, 0.001, 0.01, 0.1]),
            ),
        ],
    )
    .expect("built-in classifier grids match their family parameter tables")
});

/// The classification grid registry, loaded once per process
pub fn classifier_grids() -> &'static GridRegistry {
    &CLASSIFIER_GRIDS
}
