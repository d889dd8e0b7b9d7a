//! Forecast error statistics
//!
//! MAE and RMSE are computed exactly as defined, over every pair given,
//! with no weighting and no outlier clipping.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

/// Error statistics between realized and predicted values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorSummary {
    /// Mean Absolute Error
    pub mae: f64,
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Number of pairs the statistics were computed over
    pub count: usize,
}

impl std::fmt::Display for ErrorSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "MAE={:.3}, RMSE={:.3} over {} samples",
            self.mae, self.rmse, self.count
        )
    }
}

/// Calculate error statistics for paired actual and predicted values
pub fn error_summary(actual: &[f64], predicted: &[f64]) -> Result<ErrorSummary> {
    if actual.len() != predicted.len() {
        return Err(MathError::InvalidInput(format!(
            "Actual length ({}) doesn't match predicted length ({})",
            actual.len(),
            predicted.len()
        )));
    }
    if actual.is_empty() {
        return Err(MathError::InsufficientData(
            "Need at least one actual/predicted pair".to_string(),
        ));
    }

    let n = actual.len() as f64;
    let mut abs_sum = 0.0;
    let mut sq_sum = 0.0;
    for (&a, &p) in actual.iter().zip(predicted.iter()) {
        let error = a - p;
        abs_sum += error.abs();
        sq_sum += error * error;
    }

    let mse = sq_sum / n;
    Ok(ErrorSummary {
        mae: abs_sum / n,
        mse,
        rmse: mse.sqrt(),
        count: actual.len(),
    })
}

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
