//! Configuration for the forecasting and retraining loop
//!
//! Settings are read once per invocation (typically from the plugin's
//! `settings.json`) and handed to each component explicitly.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

/// Upper bound for every window and horizon setting (ten years of hours)
pub const MAX_WINDOW_HOURS: u32 = 10 * 365 * 24;

/// How the evaluation window is chosen relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPeriod {
    /// Midnight-to-midnight (UTC) of the previous day
    PreviousDay,
    /// The given number of hours ending at the current hour
    TrailingHours(u32),
}

impl Default for EvaluationPeriod {
    fn default() -> Self {
        EvaluationPeriod::PreviousDay
    }
}

/// Which features the builder emits, in addition to the calendar fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Lag offsets in hours (`lag_kh`)
    pub lag_offsets: BTreeSet<u32>,
    /// Rolling mean windows in hours (`rolling_mean_Nh`)
    pub rolling_windows: BTreeSet<u32>,
    /// Emit the `is_weekend` flag
    pub include_is_weekend: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lag_offsets: [1, 24].into_iter().collect(),
            rolling_windows: BTreeSet::new(),
            include_is_weekend: false,
        }
    }
}

impl FeatureConfig {
    /// Deepest lag or rolling window, i.e. how many prior hours one vector needs
    pub fn required_depth(&self) -> usize {
        self.lag_offsets
            .iter()
            .chain(self.rolling_windows.iter())
            .copied()
            .max()
            .unwrap_or(0) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.lag_offsets.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one lag offset is required".to_string(),
            ));
        }
        if self.lag_offsets.contains(&0) {
            return Err(ForecastError::InvalidParameter(
                "Lag offsets must be at least 1 hour".to_string(),
            ));
        }
        if self.rolling_windows.contains(&0) {
            return Err(ForecastError::InvalidParameter(
                "Rolling windows must be at least 1 hour".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error levels above which the model is retrained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetrainThresholds {
    /// Mean absolute error threshold, in the measurement's native unit
    pub mae: f64,
    /// Root mean squared error threshold, in the measurement's native unit
    pub rmse: f64,
}

impl Default for RetrainThresholds {
    fn default() -> Self {
        Self { mae: 0.3, rmse: 0.5 }
    }
}

/// Master configuration for one forecasting/evaluation invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Hours of history used to train
    pub history_window_hours: u32,
    /// Hours of realized history used to seed a forecast
    pub seed_window_hours: u32,
    /// Lag offsets in hours
    pub lag_offsets: BTreeSet<u32>,
    /// Rolling mean windows in hours
    pub rolling_windows: BTreeSet<u32>,
    /// Emit the `is_weekend` feature
    pub include_is_weekend: bool,
    /// Number of hourly steps per forecast
    pub forecast_horizon_hours: u32,
    /// MAE retrain threshold
    pub mae_threshold: f64,
    /// RMSE retrain threshold
    pub rmse_threshold: f64,
    /// Consecutive missing realized hours that may be forward-filled during evaluation
    pub max_forward_fill: u32,
    /// Window compared during evaluation
    pub evaluation_period: EvaluationPeriod,
    /// Fewer usable training rows than this aborts training
    pub min_training_rows: usize,
    /// L2 penalty for the linear trainer
    pub ridge_lambda: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        let features = FeatureConfig::default();
        let thresholds = RetrainThresholds::default();
        Self {
            history_window_hours: 14 * 24,
            seed_window_hours: 48,
            lag_offsets: features.lag_offsets,
            rolling_windows: features.rolling_windows,
            include_is_weekend: features.include_is_weekend,
            forecast_horizon_hours: 24,
            mae_threshold: thresholds.mae,
            rmse_threshold: thresholds.rmse,
            max_forward_fill: 1,
            evaluation_period: EvaluationPeriod::PreviousDay,
            min_training_rows: 24,
            ridge_lambda: 1e-6,
        }
    }
}

impl ForecastConfig {
    /// Load and validate configuration from a JSON settings file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ForecastError::Config(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&raw)
    }

    /// Parse and validate configuration from JSON text
    ///
    /// Unknown keys are ignored so the plugin's shared settings file (MQTT,
    /// Influx and location entries) can be pointed at directly.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| ForecastError::Config(format!("Invalid settings: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// The feature subset of the configuration
    pub fn feature_config(&self) -> FeatureConfig {
        FeatureConfig {
            lag_offsets: self.lag_offsets.clone(),
            rolling_windows: self.rolling_windows.clone(),
            include_is_weekend: self.include_is_weekend,
        }
    }

    /// The retrain thresholds
    pub fn thresholds(&self) -> RetrainThresholds {
        RetrainThresholds {
            mae: self.mae_threshold,
            rmse: self.rmse_threshold,
        }
    }

    /// Check the configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let features = self.feature_config();
        features
            .validate()
            .map_err(|e| ForecastError::Config(e.to_string()))?;

        let depth = features.required_depth();
        if (self.seed_window_hours as usize) < depth {
            return Err(ForecastError::Config(format!(
                "seed_window_hours ({}) must cover the deepest lag/rolling window ({})",
                self.seed_window_hours, depth
            )));
        }
        if (self.history_window_hours as usize) <= depth {
            return Err(ForecastError::Config(format!(
                "history_window_hours ({}) must exceed the deepest lag/rolling window ({})",
                self.history_window_hours, depth
            )));
        }
        let mut windows = vec![
            ("history_window_hours", self.history_window_hours),
            ("seed_window_hours", self.seed_window_hours),
            ("forecast_horizon_hours", self.forecast_horizon_hours),
            ("max_forward_fill", self.max_forward_fill),
        ];
        if let EvaluationPeriod::TrailingHours(hours) = self.evaluation_period {
            windows.push(("evaluation_period trailing_hours", hours));
        }
        for (name, value) in windows {
            if value > MAX_WINDOW_HOURS {
                return Err(ForecastError::Config(format!(
                    "{} ({}) exceeds the maximum of {} hours",
                    name, value, MAX_WINDOW_HOURS
                )));
            }
        }
        if self.forecast_horizon_hours == 0 {
            return Err(ForecastError::Config(
                "forecast_horizon_hours must be positive".to_string(),
            ));
        }
        for (name, value) in [
            ("mae_threshold", self.mae_threshold),
            ("rmse_threshold", self.rmse_threshold),
            ("ridge_lambda", self.ridge_lambda),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ForecastError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if let EvaluationPeriod::TrailingHours(0) = self.evaluation_period {
            return Err(ForecastError::Config(
                "evaluation_period trailing_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
