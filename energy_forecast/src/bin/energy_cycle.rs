//! energy-cycle - batch driver for the forecasting and retraining loop.
//!
//! Each invocation runs one cycle and exits; scheduling is left to cron or a
//! systemd timer. The exit code is non-zero only when a cycle cannot
//! complete.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use energy_forecast::config::ForecastConfig;
use energy_forecast::data::floor_to_hour;
use energy_forecast::io::{write_rows, CsvForecastSink, CsvHistorySource};
use energy_forecast::measurement::Measurement;
use energy_forecast::models::{LinearModel, LinearTrainer};
use energy_forecast::pipeline::{train_model, EvaluationCycle, ForecastCycle, RetrainJob};
use energy_forecast::retrain::CycleOutcome;
use energy_forecast::store::ModelStore;
use energy_forecast::utils::{generate_hourly_series, parse_timestamp, SyntheticProfile};

/// Hourly energy forecasting and drift-triggered retraining
#[derive(Parser, Debug)]
#[command(name = "energy-cycle", version, about)]
struct Cli {
    /// JSON settings file; defaults apply when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Long-format CSV holding realized series and published forecasts
    #[arg(long, global = true, default_value = "history.csv")]
    data: PathBuf,

    /// Directory holding the model artifacts
    #[arg(long, global = true, default_value = "models")]
    model_dir: PathBuf,

    /// Quantity to forecast: consumption or solar
    #[arg(long, global = true, default_value = "consumption")]
    measurement: Measurement,

    /// Reference time (RFC 3339); defaults to the current time
    #[arg(long, global = true)]
    now: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Train a model on the trailing history window and save it
    Train,
    /// Forecast the next horizon with the saved model and publish it
    Forecast,
    /// Evaluate the last period's forecasts and retrain on drift
    Evaluate,
    /// Append a synthetic realized series ending at the reference hour
    Simulate {
        /// Number of hours to generate
        #[arg(long, default_value_t = 21 * 24)]
        hours: usize,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("energy_forecast=info".parse()?)
                .add_directive("energy_cycle=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ForecastConfig::from_json_file(path)?,
        None => ForecastConfig::default(),
    };
    let now: DateTime<Utc> = match &cli.now {
        Some(raw) => parse_timestamp(raw)?,
        None => Utc::now(),
    };
    let store: ModelStore<LinearModel> = ModelStore::for_measurement(&cli.model_dir, cli.measurement);

    info!(measurement = %cli.measurement, now = %now, "energy-cycle starting");

    match cli.command {
        Commands::Train => {
            let source = CsvHistorySource::open(&cli.data)?;
            let trainer = LinearTrainer::new(config.ridge_lambda)?;
            let model = train_model(&config, cli.measurement, &source, &trainer, &store, now)?;
            info!(rows = model.training_rows(), path = %store.path().display(), "Training completed");
        }
        Commands::Forecast => {
            let source = CsvHistorySource::open(&cli.data)?;
            let model = store.load()?;
            let mut sink = CsvForecastSink::new(&cli.data);
            let batch = ForecastCycle::new(config, cli.measurement).run(&source, &model, &mut sink, now)?;
            println!("{}", batch.to_json()?);
        }
        Commands::Evaluate => {
            let source = CsvHistorySource::open(&cli.data)?;
            let trainer = LinearTrainer::new(config.ridge_lambda)?;
            let mut job = RetrainJob::new(&config, cli.measurement, &source, trainer, &store, now);
            let outcome = EvaluationCycle::new(config.clone(), cli.measurement).run(&source, &mut job, now);

            if let Some(decision) = outcome.decision() {
                println!("{}", serde_json::to_string_pretty(decision)?);
            }
            match outcome {
                CycleOutcome::NotEvaluated { error } => bail!("Evaluation cycle did not complete: {}", error),
                CycleOutcome::RetrainFailed { error, .. } => bail!("Retraining did not complete: {}", error),
                CycleOutcome::Skipped(_) | CycleOutcome::Retrained(_) => {}
            }
        }
        Commands::Simulate { hours, seed } => {
            let end = floor_to_hour(now)?;
            let start = end - Duration::hours(hours as i64);
            let profile = SyntheticProfile {
                seed,
                ..SyntheticProfile::default()
            };
            let points = generate_hourly_series(start, hours, profile)?;
            write_rows(
                &cli.data,
                cli.measurement.source_measurement(),
                cli.measurement.source_field(),
                &points,
            )?;
            info!(points = points.len(), path = %cli.data.display(), "Synthetic history written");
        }
    }

    info!("energy-cycle completed successfully");
    Ok(())
}
