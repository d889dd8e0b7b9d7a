//! Linear regression over the feature vector

use crate::error::{ForecastError, Result};
use crate::features::{FeatureName, FeatureVector, TrainingRow};
use crate::models::{Model, Trainer};
use forecast_math::LeastSquares;
use serde::{Deserialize, Serialize};

/// Ridge least-squares trainer
#[derive(Debug, Clone)]
pub struct LinearTrainer {
    /// Name of the trainer
    name: String,
    /// L2 penalty on the standardized coefficients
    lambda: f64,
}

/// Trained linear model, persisted by the model store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    /// Feature layout the model was fitted on
    schema: Vec<FeatureName>,
    /// Fitted regression
    regression: LeastSquares,
    /// Rows seen during fitting
    training_rows: usize,
}

impl LinearTrainer {
    /// Create a new linear trainer with the given ridge penalty
    pub fn new(lambda: f64) -> Result<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(ForecastError::InvalidParameter(
                "Ridge penalty must be non-negative".to_string(),
            ));
        }

        Ok(Self {
            name: format!("Linear Regression (ridge={})", lambda),
            lambda,
        })
    }
}

impl Trainer for LinearTrainer {
    type Model = LinearModel;

    fn fit(&self, rows: &[TrainingRow]) -> Result<Self::Model> {
        let first = rows.first().ok_or_else(|| {
            ForecastError::TrainingFailed("No training rows supplied".to_string())
        })?;
        let schema = first.features.names();

        let mut matrix = Vec::with_capacity(rows.len());
        let mut targets = Vec::with_capacity(rows.len());
        for row in rows {
            check_schema(&schema, &row.features)?;
            matrix.push(row.features.values());
            targets.push(row.target);
        }

        let regression = LeastSquares::fit(&matrix, &targets, self.lambda)?;
        tracing::info!(rows = rows.len(), features = schema.len(), "Linear model trained");

        Ok(LinearModel {
            schema,
            regression,
            training_rows: rows.len(),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl LinearModel {
    /// Feature layout the model expects
    pub fn schema(&self) -> &[FeatureName] {
        &self.schema
    }

    /// Number of rows the model was fitted on
    pub fn training_rows(&self) -> usize {
        self.training_rows
    }
}

impl Model for LinearModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        check_schema(&self.schema, features)?;
        Ok(self.regression.predict(&features.values())?)
    }

    fn name(&self) -> &str {
        "Linear Regression"
    }
}

fn check_schema(expected: &[FeatureName], features: &FeatureVector) -> Result<()> {
    let found = features.names();
    if found != expected {
        return Err(ForecastError::SchemaMismatch {
            expected: join_names(expected),
            found: join_names(&found),
        });
    }
    Ok(())
}

fn join_names(names: &[FeatureName]) -> String {
    names
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
