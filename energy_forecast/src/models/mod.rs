//! Forecasting models
//!
//! The forecaster and the retrain loop only depend on two narrow traits:
//! [`Model`] maps a feature vector to a prediction, [`Trainer`] produces a
//! model from training rows. Swapping the regression technique means
//! implementing these two traits, nothing else.

use crate::error::Result;
use crate::features::{FeatureVector, TrainingRow};
use std::fmt::Debug;

/// Trained model: an opaque map from features to a predicted value
pub trait Model: Debug {
    /// Predict the value at the vector's timestamp
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Name of the model
    fn name(&self) -> &str;
}

/// Training procedure producing a [`Model`]
pub trait Trainer: Debug {
    /// The type of trained model produced
    type Model: Model;

    /// Fit a model to the given rows
    fn fit(&self, rows: &[TrainingRow]) -> Result<Self::Model>;

    /// Get the name of the trainer
    fn name(&self) -> &str;
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        (**self).predict(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

pub mod linear;
pub mod persistence;

pub use linear::{LinearModel, LinearTrainer};
pub use persistence::PersistenceModel;
