//! Error types for the autofit engine

use thiserror::Error;

/// Result type alias for autofit operations
pub type Result<T> = std::result::Result<T, AutoFitError>;

/// Main error type for the autofit engine
#[derive(Error, Debug)]
pub enum AutoFitError {
    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Index {index} out of range for list of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Malformed archive: {0}")]
    ArchiveFormat(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Unknown ranking metric: {0}")]
    UnknownMetric(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<serde_json::Error> for AutoFitError {
    fn from(err: serde_json::Error) -> Self {
        AutoFitError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for AutoFitError {
    fn from(err: bincode::Error) -> Self {
        AutoFitError::SerializationError(err.to_string())
    }
}

impl From<zip::result::ZipError> for AutoFitError {
    fn from(err: zip::result::ZipError) -> Self {
        AutoFitError::ArchiveFormat(err.to_string())
    }
}

impl From<ndarray::ShapeError> for AutoFitError {
    fn from(err: ndarray::ShapeError) -> Self {
        AutoFitError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AutoFitError::TrainingError("diverged".to_string());
        assert_eq!(err.to_string(), "Training error: diverged");
    }

    #[test]
    fn test_index_error_display() {
        let err = AutoFitError::IndexOutOfBounds { index: 4, len: 2 };
        assert_eq!(err.to_string(), "Index 4 out of range for list of length 2");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AutoFitError = io_err.into();
        assert!(matches!(err, AutoFitError::IoError(_)));
    }
}
