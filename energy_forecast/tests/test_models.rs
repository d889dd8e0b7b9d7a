use approx::assert_abs_diff_eq;
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use energy_forecast::config::FeatureConfig;
use energy_forecast::data::TimePoint;
use energy_forecast::error::ForecastError;
use energy_forecast::features::{FeatureBuilder, FeatureName};
use energy_forecast::models::{LinearTrainer, Model, PersistenceModel, Trainer};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
}

/// Every day repeats the same profile, so `lag_24h` equals the target
fn daily_profile(days: usize) -> Vec<TimePoint> {
    (0..days * 24)
        .map(|i| {
            let timestamp = start() + Duration::hours(i as i64);
            TimePoint::new(timestamp, 0.5 + 0.05 * f64::from(timestamp.hour()))
        })
        .collect()
}

#[test]
fn test_linear_model_learns_daily_profile() {
    let history = daily_profile(10);
    let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
    let rows = builder.build_training_rows(&history).unwrap();

    let trainer = LinearTrainer::new(1e-6).unwrap();
    let model = trainer.fit(&rows).unwrap();
    assert_eq!(model.training_rows(), rows.len());
    assert_eq!(model.schema(), builder.schema().names());

    let target = start() + Duration::hours(10 * 24 + 7);
    let vector = builder.build(&daily_profile(11), target).unwrap();
    let predicted = model.predict(&vector).unwrap();
    assert_abs_diff_eq!(predicted, 0.5 + 0.05 * 7.0, epsilon = 1e-3);
}

#[test]
fn test_linear_model_rejects_other_schema() {
    let history = daily_profile(3);
    let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
    let model = LinearTrainer::new(1e-3)
        .unwrap()
        .fit(&builder.build_training_rows(&history).unwrap())
        .unwrap();

    let other = FeatureBuilder::new(&FeatureConfig {
        include_is_weekend: true,
        ..FeatureConfig::default()
    })
    .unwrap();
    let vector = other.build(&history, start() + Duration::hours(72)).unwrap();

    assert!(matches!(
        model.predict(&vector),
        Err(ForecastError::SchemaMismatch { .. })
    ));
}

#[test]
fn test_fit_without_rows_fails() {
    let trainer = LinearTrainer::new(0.0).unwrap();
    assert!(matches!(
        trainer.fit(&[]),
        Err(ForecastError::TrainingFailed(_))
    ));
}

#[test]
fn test_negative_ridge_is_rejected() {
    assert!(LinearTrainer::new(-1.0).is_err());
    assert!(LinearTrainer::new(f64::NAN).is_err());
}

#[test]
fn test_persistence_model() {
    let history = daily_profile(2);
    let builder = FeatureBuilder::new(&FeatureConfig::default()).unwrap();
    let target = start() + Duration::hours(48);
    let vector = builder.build(&history, target).unwrap();

    let predicted = PersistenceModel.predict(&vector).unwrap();
    assert_eq!(Some(predicted), vector.get(FeatureName::Lag(1)));
    assert_eq!(PersistenceModel.name(), "Persistence");
}

#[test]
fn test_persistence_needs_lag_one() {
    let history = daily_profile(2);
    let builder = FeatureBuilder::new(&FeatureConfig {
        lag_offsets: [24].into_iter().collect(),
        ..FeatureConfig::default()
    })
    .unwrap();
    let vector = builder.build(&history, start() + Duration::hours(48)).unwrap();

    assert!(PersistenceModel.predict(&vector).is_err());
}

#[test]
fn test_boxed_model_delegates() {
    let model: Box<dyn Model> = Box::new(PersistenceModel);
    assert_eq!(model.name(), "Persistence");
}
