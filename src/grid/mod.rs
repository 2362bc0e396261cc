//! Hyperparameter grid registry
//!
//! A [`ParamGrid`] describes the search space for one model family as a set
//! of named, ordered candidate value lists. Two built-in registries exist —
//! one per task type — because the legal hyperparameter names and value
//! ranges differ between classification and regression families.
//!
//! The registry validates parameter *names* against each family's accepted
//! parameter table when it is constructed. Value ranges are not checked here;
//! an invalid value surfaces as a per-family training failure.

mod classifiers;
mod regressors;

pub use classifiers::classifier_grids;
pub use regressors::regressor_grids;

use crate::error::{AutoFitError, Result};
use crate::models::{self, TaskKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single hyperparameter value drawn from a grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(v) => write!(f, "{}", v),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Str(v) => write!(f, "{}", v),
            ParamValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered candidate value set for one hyperparameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValues {
    Ints(Vec<i64>),
    Floats(Vec<f64>),
    Choices(Vec<String>),
    Bools(Vec<bool>),
}

impl ParamValues {
    pub fn len(&self) -> usize {
        match self {
            ParamValues::Ints(v) => v.len(),
            ParamValues::Floats(v) => v.len(),
            ParamValues::Choices(v) => v.len(),
            ParamValues::Bools(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn value_at(&self, idx: usize) -> ParamValue {
        match self {
            ParamValues::Ints(v) => ParamValue::Int(v[idx]),
            ParamValues::Floats(v) => ParamValue::Float(v[idx]),
            ParamValues::Choices(v) => ParamValue::Str(v[idx].clone()),
            ParamValues::Bools(v) => ParamValue::Bool(v[idx]),
        }
    }
}

/// One concrete hyperparameter assignment drawn from a grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GridPoint {
    values: BTreeMap<String, ParamValue>,
}

impl GridPoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ParamValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.values.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Typed accessor used by family constructors. Integer-valued floats are
    /// not coerced; the grid declares the type.
    pub fn get_i64(&self, name: &str) -> Result<i64> {
        match self.get(name) {
            Some(ParamValue::Int(v)) => Ok(*v),
            other => Err(self.type_error(name, other, "integer")),
        }
    }

    pub fn get_f64(&self, name: &str) -> Result<f64> {
        match self.get(name) {
            Some(ParamValue::Float(v)) => Ok(*v),
            Some(ParamValue::Int(v)) => Ok(*v as f64),
            other => Err(self.type_error(name, other, "float")),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.get(name) {
            Some(ParamValue::Str(v)) => Ok(v.as_str()),
            other => Err(self.type_error(name, other, "choice")),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<bool> {
        match self.get(name) {
            Some(ParamValue::Bool(v)) => Ok(*v),
            other => Err(self.type_error(name, other, "boolean")),
        }
    }

    fn type_error(&self, name: &str, value: Option<&ParamValue>, wanted: &str) -> AutoFitError {
        AutoFitError::InvalidParameter {
            name: name.to_string(),
            value: value.map(|v| v.to_string()).unwrap_or_else(|| "absent".to_string()),
            reason: format!("expected a {} value", wanted),
        }
    }
}

/// Search space for one model family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    params: Vec<(String, ParamValues)>,
}

impl ParamGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a candidate value set for one hyperparameter
    pub fn add(mut self, name: impl Into<String>, values: ParamValues) -> Self {
        self.params.push((name.into(), values));
        self
    }

    pub fn ints(self, name: impl Into<String>, values: Vec<i64>) -> Self {
        self.add(name, ParamValues::Ints(values))
    }

    pub fn floats(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.add(name, ParamValues::Floats(values))
    }

    pub fn choices(self, name: impl Into<String>, values: &[&str]) -> Self {
        self.add(
            name,
            ParamValues::Choices(values.iter().map(|s| s.to_string()).collect()),
        )
    }

    pub fn bools(self, name: impl Into<String>, values: Vec<bool>) -> Self {
        self.add(name, ParamValues::Bools(values))
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|(name, _)| name.as_str())
    }

    /// Number of points in the Cartesian product. A grid with no parameters
    /// (or any empty value set) has zero points and is skipped by the search.
    pub fn n_points(&self) -> usize {
        if self.params.is_empty() {
            return 0;
        }
        self.params.iter().map(|(_, v)| v.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.n_points() == 0
    }

    /// Enumerate the full Cartesian product in deterministic order: the first
    /// parameter varies slowest, the last varies fastest. Tie-breaking during
    /// the search relies on this ordering being stable.
    pub fn points(&self) -> Vec<GridPoint> {
        let total = self.n_points();
        if total == 0 {
            return Vec::new();
        }

        let mut points = Vec::with_capacity(total);
        let mut odometer = vec![0usize; self.params.len()];

        loop {
            let mut point = GridPoint::new();
            for ((name, values), &idx) in self.params.iter().zip(odometer.iter()) {
                point.insert(name.clone(), values.value_at(idx));
            }
            points.push(point);

            // Advance the odometer, last digit fastest
            let mut pos = self.params.len();
            loop {
                if pos == 0 {
                    return points;
                }
                pos -= 1;
                odometer[pos] += 1;
                if odometer[pos] < self.params[pos].1.len() {
                    break;
                }
                odometer[pos] = 0;
            }
        }
    }
}

/// Read-only mapping from family identifier to its search space
#[derive(Debug, Clone, Default)]
pub struct GridRegistry {
    entries: BTreeMap<String, ParamGrid>,
}

impl GridRegistry {
    /// Build a registry, validating each entry's parameter names against the
    /// accepted-parameter table of the corresponding family in `task`'s
    /// catalog. Entries for families the catalog does not know are kept but
    /// never reached by the search.
    pub fn try_new(task: TaskKind, entries: Vec<(&str, ParamGrid)>) -> Result<Self> {
        let catalog = models::catalog(task);
        let mut map = BTreeMap::new();

        for (family, grid) in entries {
            if let Some(spec) = catalog.iter().find(|s| s.name == family) {
                for name in grid.param_names() {
                    if !spec.params.contains(&name) {
                        return Err(AutoFitError::InvalidParameter {
                            name: name.to_string(),
                            value: "-".to_string(),
                            reason: format!("not an accepted parameter of {}", family),
                        });
                    }
                }
            }
            map.insert(family.to_string(), grid);
        }

        Ok(Self { entries: map })
    }

    pub fn lookup(&self, family: &str) -> Option<&ParamGrid> {
        self.entries.get(family)
    }

    pub fn families(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
