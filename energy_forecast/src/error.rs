//! Error types for the energy_forecast crate

use chrono::{DateTime, Utc};
use forecast_math::MathError;
use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

/// Custom error types for the energy_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Not enough lag/rolling depth before a target timestamp
    #[error(
        "Insufficient history{}: need {required} hourly points, have {available}",
        describe_target(.target)
    )]
    InsufficientHistory {
        target: Option<DateTime<Utc>>,
        required: usize,
        available: usize,
    },

    /// A lag or rolling slot is absent from an otherwise deep enough history
    #[error("Missing observation at {missing} needed for features of {target}")]
    MissingObservation {
        target: DateTime<Utc>,
        missing: DateTime<Utc>,
    },

    /// A series is not strictly increasing at a one-hour cadence
    #[error("Series is not hourly contiguous: expected {expected}, found {found}")]
    NonContiguous {
        expected: DateTime<Utc>,
        found: DateTime<Utc>,
    },

    /// Realized and forecast series share no hourly slot
    #[error("No overlap between realized and forecast series in [{start}, {end})")]
    NoOverlap {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Forecast attempted before any model was saved
    #[error("Model not found at {}", .0.display())]
    ModelNotFound(PathBuf),

    /// The external training operation failed
    #[error("Training failed: {0}")]
    TrainingFailed(String),

    /// A feature vector referenced a timestamp at or after its target
    #[error("Malformed feature for {target}: references {referenced}")]
    MalformedFeature {
        target: DateTime<Utc>,
        referenced: DateTime<Utc>,
    },

    /// Caller-supplied deadline passed before a recursive step started
    #[error("Deadline exceeded after {completed} of {horizon} forecast steps")]
    DeadlineExceeded { completed: usize, horizon: usize },

    /// A model was handed features with a different layout than it was trained on
    #[error("Feature schema mismatch: expected [{expected}], got [{found}]")]
    SchemaMismatch { expected: String, found: String },

    /// The model produced NaN or an infinite value
    #[error("Model produced a non-finite prediction ({value}) for {timestamp}")]
    InvalidPrediction {
        timestamp: DateTime<Utc>,
        value: f64,
    },

    /// Error from invalid parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error loading or validating configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from JSON (de)serialization
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error from CSV reading or writing
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error from the numeric kernels
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

fn describe_target(target: &Option<DateTime<Utc>>) -> String {
    match target {
        Some(ts) => format!(" before {}", ts),
        None => String::new(),
    }
}
