//! # Forecast Math
//!
//! Numeric building blocks for the energy forecasting workspace.
//! This crate holds the calculations that do not care about timestamps:
//! forecast error statistics and a ridge-regularized least-squares solver.

use thiserror::Error;

pub mod regression;
pub mod stats;

pub use regression::LeastSquares;
pub use stats::{error_summary, ErrorSummary};

/// Errors that can occur in forecasting math
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecasting math operations
pub type Result<T> = std::result::Result<T, MathError>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
