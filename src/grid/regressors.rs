//! Built-in hyperparameter grids for regression families

use super::{GridRegistry, ParamGrid};
use crate::models::TaskKind;
use once_cell::sync::Lazy;

static REGRESSOR_GRIDS: Lazy<GridRegistry> = Lazy::new(|| {
    GridRegistry::try_new(
        TaskKind::Regression,
        vec![
            (
                "DecisionTreeRegressor",
                ParamGrid::new()
                    .choices("criterion", &["mse", "mae"])
                    .ints("max_depth", (3..=12).collect()),
            ),
            (
                "RandomForestRegressor",
                ParamGrid::new()
                    .ints("n_estimators", vec![20, 50])
                    .ints("max_depth", vec![4, 8, 16]),
            ),
            (
                "KNeighborsRegressor",
                ParamGrid::new()
                    .ints("n_neighbors", (3..=14).collect())
                    .choices("weights", &["uniform", "distance"]),
            ),
            (
                "Ridge",
                ParamGrid::new().floats("alpha", vec![10.0, 1.0, 0.1, 0.01, 0.001]),
            ),
            (
                "SGDRegressor",
                ParamGrid::new()
                    .floats("alpha", vec![0.0001, 0.001])
                    .floats("eta0", vec![0.01, 0.05, 0.1]),
            ),
            (
                "GradientBoostingRegressor",
                ParamGrid::new()
                    .ints("n_estimators", vec![50, 100])
                    .floats("learning_rate", vec![0.05, 0.1])
                    .ints("max_depth", vec![2, 3]),
            ),
        ],
    )
    .expect("built-in regressor grids match their family parameter tables")
});

/// The regression grid registry, loaded once per process
pub fn regressor_grids() -> &'static GridRegistry {
    &REGRESSOR_GRIDS
}
