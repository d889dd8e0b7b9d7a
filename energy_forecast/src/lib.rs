//! # Energy Forecast
//!
//! Hourly forecasting of household energy consumption and solar production,
//! with a drift-triggered retraining loop.
//!
//! ## Features
//!
//! - Feature construction from calendar fields, lags and rolling means,
//!   without lookahead
//! - Recursive multi-step forecasting that feeds predictions back as lags
//! - Atomic persistence of the trained model
//! - MAE/RMSE evaluation of published forecasts against realized data
//! - Threshold-based retrain decisions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use energy_forecast::config::ForecastConfig;
//! use energy_forecast::io::{CsvForecastSink, CsvHistorySource};
//! use energy_forecast::measurement::Measurement;
//! use energy_forecast::models::{LinearModel, LinearTrainer};
//! use energy_forecast::pipeline::{train_model, ForecastCycle};
//! use energy_forecast::store::ModelStore;
//!
//! # fn main() -> energy_forecast::error::Result<()> {
//! let config = ForecastConfig::from_json_file("settings.json")?;
//! let source = CsvHistorySource::open("history.csv")?;
//! let store: ModelStore<LinearModel> = ModelStore::for_measurement("models", Measurement::Consumption);
//!
//! // Train on the trailing history window
//! let trainer = LinearTrainer::new(config.ridge_lambda)?;
//! let now = chrono::Utc::now();
//! train_model(&config, Measurement::Consumption, &source, &trainer, &store, now)?;
//!
//! // Forecast the next horizon and publish it
//! let model = store.load()?;
//! let mut sink = CsvForecastSink::new("history.csv");
//! let batch = ForecastCycle::new(config, Measurement::Consumption).run(&source, &model, &mut sink, now)?;
//! println!("{}", batch.to_json()?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod forecast;
pub mod io;
pub mod measurement;
pub mod models;
pub mod pipeline;
pub mod retrain;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use crate::config::{EvaluationPeriod, FeatureConfig, ForecastConfig, RetrainThresholds};
pub use crate::data::{DataLoader, TimePoint, TimeRange};
pub use crate::error::{ForecastError, Result};
pub use crate::evaluation::{AccuracyEvaluator, EvaluationReport, EvaluationWindow};
pub use crate::features::{FeatureBuilder, FeatureName, FeatureSchema, FeatureVector, TrainingRow};
pub use crate::forecast::{ForecastBatch, RecursiveForecaster};
pub use crate::io::{ForecastSink, HistorySource};
pub use crate::measurement::Measurement;
pub use crate::models::{Model, Trainer};
pub use crate::retrain::{CycleOutcome, RetrainAction, RetrainController, RetrainDecision, TrainingJob};
pub use crate::store::ModelStore;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
