//! Error types for the gait analysis core.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Non-uniform sampling: interval deviates {max_deviation:.4} from the mean (tolerance {tolerance:.4})")]
    NonUniformSampling { max_deviation: f64, tolerance: f64 },

    #[error("Insufficient data: need {required} samples, have {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Invalid detection thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Invalid signal: {0}")]
    InvalidSignal(String),

    #[error("Length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}
