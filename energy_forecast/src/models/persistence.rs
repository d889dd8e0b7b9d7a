//! Naive persistence baseline: the next hour equals the last one

use crate::error::{ForecastError, Result};
use crate::features::{FeatureName, FeatureVector};
use crate::models::Model;
use serde::{Deserialize, Serialize};

/// Predicts the `lag_1h` field unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistenceModel;

impl Model for PersistenceModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        features
            .get(FeatureName::Lag(1))
            .ok_or_else(|| ForecastError::SchemaMismatch {
                expected: FeatureName::Lag(1).to_string(),
                found: features
                    .names()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    fn name(&self) -> &str {
        "Persistence"
    }
}
