//! Batch cycles tying the components together
//!
//! A scheduler runs these once per invocation: [`ForecastCycle`] every
//! hour, [`EvaluationCycle`] once per evaluation period. [`train_model`] is
//! both the `train` entry point and, wrapped in a [`RetrainJob`], the
//! training operation an evaluation cycle triggers.

use crate::config::ForecastConfig;
use crate::data::{floor_to_hour, TimeRange};
use crate::error::{ForecastError, Result};
use crate::evaluation::{AccuracyEvaluator, EvaluationReport};
use crate::features::FeatureBuilder;
use crate::forecast::{ForecastBatch, RecursiveForecaster};
use crate::io::{ForecastSink, HistorySource};
use crate::measurement::Measurement;
use crate::models::{Model, Trainer};
use crate::retrain::{CycleOutcome, RetrainController, TrainingJob};
use crate::store::ModelStore;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Fit a model on the trailing history window and save it
pub fn train_model<S, T>(
    config: &ForecastConfig,
    measurement: Measurement,
    source: &S,
    trainer: &T,
    store: &ModelStore<T::Model>,
    now: DateTime<Utc>,
) -> Result<T::Model>
where
    S: HistorySource + ?Sized,
    T: Trainer,
    T::Model: Serialize + DeserializeOwned,
{
    let builder = FeatureBuilder::new(&config.feature_config())?;
    let range = TimeRange::trailing(floor_to_hour(now)?, config.history_window_hours)?;
    let history = source.query(
        measurement.source_measurement(),
        measurement.source_field(),
        &range,
    )?;
    tracing::info!(%measurement, points = history.len(), "Training history queried");

    let rows = builder.build_training_rows(&history)?;
    if rows.len() < config.min_training_rows {
        return Err(ForecastError::TrainingFailed(format!(
            "Only {} usable training rows, need at least {}",
            rows.len(),
            config.min_training_rows
        )));
    }

    let model = trainer.fit(&rows)?;
    store.save(&model)?;
    tracing::info!(%measurement, trainer = trainer.name(), rows = rows.len(), "Model trained and saved");
    Ok(model)
}

/// Training operation handed to the retrain controller
#[derive(Debug)]
pub struct RetrainJob<'a, S: ?Sized, T: Trainer> {
    config: &'a ForecastConfig,
    measurement: Measurement,
    source: &'a S,
    trainer: T,
    store: &'a ModelStore<T::Model>,
    now: DateTime<Utc>,
}

impl<'a, S, T> RetrainJob<'a, S, T>
where
    S: HistorySource + ?Sized,
    T: Trainer,
    T::Model: Serialize + DeserializeOwned,
{
    pub fn new(
        config: &'a ForecastConfig,
        measurement: Measurement,
        source: &'a S,
        trainer: T,
        store: &'a ModelStore<T::Model>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            config,
            measurement,
            source,
            trainer,
            store,
            now,
        }
    }
}

impl<'a, S, T> TrainingJob for RetrainJob<'a, S, T>
where
    S: HistorySource + ?Sized,
    T: Trainer,
    T::Model: Serialize + DeserializeOwned,
{
    fn run(&mut self) -> Result<()> {
        train_model(
            self.config,
            self.measurement,
            self.source,
            &self.trainer,
            self.store,
            self.now,
        )
        .map(|_| ())
        .map_err(|e| match e {
            ForecastError::TrainingFailed(_) => e,
            other => ForecastError::TrainingFailed(other.to_string()),
        })
    }
}

/// Seed, forecast and publish one horizon
#[derive(Debug, Clone)]
pub struct ForecastCycle {
    config: ForecastConfig,
    measurement: Measurement,
}

impl ForecastCycle {
    pub fn new(config: ForecastConfig, measurement: Measurement) -> Self {
        Self {
            config,
            measurement,
        }
    }

    /// Forecast the hours after the latest realized hour before `now`
    pub fn run<M>(
        &self,
        source: &dyn HistorySource,
        model: &M,
        sink: &mut dyn ForecastSink,
        now: DateTime<Utc>,
    ) -> Result<ForecastBatch>
    where
        M: Model + ?Sized,
    {
        let builder = FeatureBuilder::new(&self.config.feature_config())?;
        let range = TimeRange::trailing(floor_to_hour(now)?, self.config.seed_window_hours)?;
        let seed = source.query(
            self.measurement.source_measurement(),
            self.measurement.source_field(),
            &range,
        )?;
        tracing::info!(
            measurement = %self.measurement,
            points = seed.len(),
            start = %range.start,
            end = %range.end,
            "Seed history queried"
        );

        let forecaster = RecursiveForecaster::new(builder);
        let batch = forecaster.forecast(
            model,
            &seed,
            self.config.forecast_horizon_hours as usize,
        )?;

        sink.publish(
            self.measurement.forecast_measurement(),
            self.measurement.forecast_field(),
            &batch,
        )?;
        tracing::info!(
            measurement = %self.measurement,
            model = model.name(),
            steps = batch.len(),
            "Forecast cycle completed"
        );
        Ok(batch)
    }
}

/// Evaluate the last period's forecasts and retrain when they drifted
#[derive(Debug, Clone)]
pub struct EvaluationCycle {
    config: ForecastConfig,
    measurement: Measurement,
}

impl EvaluationCycle {
    pub fn new(config: ForecastConfig, measurement: Measurement) -> Self {
        Self {
            config,
            measurement,
        }
    }

    /// Run one evaluate/decide/retrain cycle; failures end up in the outcome
    pub fn run(
        &self,
        source: &dyn HistorySource,
        job: &mut dyn TrainingJob,
        now: DateTime<Utc>,
    ) -> CycleOutcome {
        let controller = RetrainController::new(self.config.thresholds());
        let evaluation = self.evaluate(source, now);
        controller.run_cycle(evaluation, job)
    }

    fn evaluate(
        &self,
        source: &dyn HistorySource,
        now: DateTime<Utc>,
    ) -> Result<EvaluationReport> {
        let window = TimeRange::for_period(self.config.evaluation_period, now)?;
        let realized = source.query_observed(
            self.measurement.source_measurement(),
            self.measurement.source_field(),
            &window,
        )?;
        let forecast = source.query_observed(
            self.measurement.forecast_measurement(),
            self.measurement.forecast_field(),
            &window,
        )?;
        tracing::info!(
            measurement = %self.measurement,
            realized = realized.len(),
            forecast = forecast.len(),
            start = %window.start,
            end = %window.end,
            "Evaluation data queried"
        );

        let evaluator = AccuracyEvaluator::new(self.config.max_forward_fill as usize);
        evaluator.evaluate_series(&realized, &forecast, &window)
    }
}
