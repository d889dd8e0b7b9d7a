//! # Consumption Prediction
//!
//! `consumption_prediction` bundles the forecasting workspace: the
//! [`energy_forecast`] pipeline and the [`forecast_math`] numeric kernels.
//!
//! ## Example
//!
//! ```
//! use consumption_prediction::energy_forecast::features::FeatureName;
//! use consumption_prediction::energy_forecast::{FeatureBuilder, FeatureConfig};
//!
//! let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
//! assert_eq!(builder.required_depth(), 24);
//! assert!(builder.schema().names().contains(&FeatureName::Lag(24)));
//! ```

pub use energy_forecast;
pub use forecast_math;

/// Crates that make up the workspace, in dependency order.
pub fn components() -> [(&'static str, &'static str); 2] {
    [
        (forecast_math::NAME, forecast_math::VERSION),
        (energy_forecast::NAME, energy_forecast::VERSION),
    ]
}
