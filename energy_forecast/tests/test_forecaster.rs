use chrono::{DateTime, Duration, TimeZone, Utc};
use energy_forecast::config::FeatureConfig;
use energy_forecast::data::TimePoint;
use energy_forecast::error::{ForecastError, Result};
use energy_forecast::features::{FeatureBuilder, FeatureName, FeatureVector};
use energy_forecast::forecast::{ForecastBatch, RecursiveForecaster};
use energy_forecast::models::{Model, PersistenceModel};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::BTreeSet;
use std::time::Instant;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
}

fn hourly(values: &[f64]) -> Vec<TimePoint> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| TimePoint::new(start() + Duration::hours(i as i64), v))
        .collect()
}

fn forecaster() -> RecursiveForecaster {
    RecursiveForecaster::new(FeatureBuilder::new(&FeatureConfig::default()).unwrap())
}

/// Blends the last hour with the same hour yesterday
#[derive(Debug)]
struct BlendModel;

impl Model for BlendModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let lag_1 = features.get(FeatureName::Lag(1)).unwrap_or_default();
        let lag_24 = features.get(FeatureName::Lag(24)).unwrap_or_default();
        let hour = features.get(FeatureName::Hour).unwrap_or_default();
        Ok(0.6 * lag_1 + 0.3 * lag_24 + 0.01 * hour + 0.5)
    }

    fn name(&self) -> &str {
        "Blend"
    }
}

/// Predicts the 3-hour rolling mean
#[derive(Debug)]
struct RollingModel;

impl Model for RollingModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        features
            .get(FeatureName::RollingMean(3))
            .ok_or_else(|| ForecastError::DataError("rolling_mean_3h missing".to_string()))
    }

    fn name(&self) -> &str {
        "Rolling"
    }
}

/// Averages every lag and rolling field, plus a small hour term
#[derive(Debug)]
struct SmoothingModel;

impl Model for SmoothingModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let history: Vec<f64> = features
            .fields()
            .iter()
            .filter(|(name, _)| matches!(name, FeatureName::Lag(_) | FeatureName::RollingMean(_)))
            .map(|(_, value)| *value)
            .collect();
        let hour = features.get(FeatureName::Hour).unwrap_or_default();
        Ok(history.iter().sum::<f64>() / history.len() as f64 + 0.05 * hour)
    }

    fn name(&self) -> &str {
        "Smoothing"
    }
}

fn features(lags: &[u32], rolling: &[u32]) -> FeatureConfig {
    FeatureConfig {
        lag_offsets: lags.iter().copied().collect::<BTreeSet<_>>(),
        rolling_windows: rolling.iter().copied().collect::<BTreeSet<_>>(),
        include_is_weekend: false,
    }
}

#[derive(Debug)]
struct NanModel;

impl Model for NanModel {
    fn predict(&self, _features: &FeatureVector) -> Result<f64> {
        Ok(f64::NAN)
    }

    fn name(&self) -> &str {
        "NaN"
    }
}

#[test]
fn test_persistence_repeats_last_seed_value() {
    let values: Vec<f64> = (10..58).map(f64::from).collect();
    let seed = hourly(&values);
    assert_eq!(seed.len(), 48);

    let batch = forecaster().forecast(&PersistenceModel, &seed, 24).unwrap();

    assert_eq!(batch.values(), vec![57.0; 24]);
    assert_eq!(batch.start(), Some(start() + Duration::hours(48)));
    assert_eq!(batch.end(), Some(start() + Duration::hours(71)));
}

#[test]
fn test_zero_horizon_is_empty() {
    let seed = hourly(&[1.0; 48]);
    let batch = forecaster().forecast(&PersistenceModel, &seed, 0).unwrap();
    assert!(batch.is_empty());
}

#[test]
fn test_batch_is_contiguous_after_seed() {
    let seed = hourly(&(0..48).map(|i| (i % 24) as f64).collect::<Vec<_>>());
    let batch = forecaster().forecast(&BlendModel, &seed, 36).unwrap();

    assert_eq!(batch.len(), 36);
    for (i, ts) in batch.timestamps().iter().enumerate() {
        assert_eq!(*ts, start() + Duration::hours(48 + i as i64));
    }
    assert!(ForecastBatch::from_points(batch.points().to_vec()).is_ok());
}

#[test]
fn test_split_horizon_matches_full_horizon() {
    let seed = hourly(&(0..48).map(|i| ((i * 5) % 17) as f64).collect::<Vec<_>>());
    let forecaster = forecaster();

    let full = forecaster.forecast(&BlendModel, &seed, 24).unwrap();
    let first = forecaster.forecast(&BlendModel, &seed, 12).unwrap();

    let mut extended = seed.clone();
    extended.extend_from_slice(first.points());
    let second = forecaster.forecast(&BlendModel, &extended, 12).unwrap();

    let mut stitched = first.values();
    stitched.extend(second.values());
    assert_eq!(full.values(), stitched);
}

#[test]
fn test_short_seed_fails_without_partial_output() {
    let seed = hourly(&[1.0; 10]);
    match forecaster().forecast(&PersistenceModel, &seed, 24) {
        Err(ForecastError::InsufficientHistory {
            required,
            available,
            ..
        }) => {
            assert_eq!(required, 24);
            assert_eq!(available, 10);
        }
        other => panic!("expected InsufficientHistory, got {:?}", other),
    }
}

#[test]
fn test_gapped_seed_is_rejected() {
    let mut seed = hourly(&[1.0; 49]);
    seed.remove(30);
    let result = forecaster().forecast(&PersistenceModel, &seed, 24);
    assert!(matches!(result, Err(ForecastError::NonContiguous { .. })));
}

#[test]
fn test_expired_deadline_stops_before_first_step() {
    let seed = hourly(&[1.0; 48]);
    let deadline = Instant::now();
    let result = forecaster().forecast_until(&PersistenceModel, &seed, 24, Some(deadline));

    match result {
        Err(ForecastError::DeadlineExceeded { completed, horizon }) => {
            assert_eq!(completed, 0);
            assert_eq!(horizon, 24);
        }
        other => panic!("expected DeadlineExceeded, got {:?}", other),
    }
}

#[test]
fn test_non_finite_prediction_is_an_error() {
    let seed = hourly(&[1.0; 48]);
    let result = forecaster().forecast(&NanModel, &seed, 3);
    assert!(matches!(result, Err(ForecastError::InvalidPrediction { .. })));
}

#[test]
fn test_payload_format() {
    let points = vec![
        TimePoint::new(start(), 1.23456),
        TimePoint::new(start() + Duration::hours(1), 2.0),
    ];
    let batch = ForecastBatch::from_points(points).unwrap();
    let payload = batch.to_payload();

    assert_eq!(payload.timestamp, "2025-03-01 00:00:00");
    assert_eq!(payload.predictions.len(), 2);
    assert_eq!(payload.predictions[0].datetime, "2025-03-01 00:00:00");
    assert_eq!(payload.predictions[0].value, 1.23);
    assert_eq!(payload.predictions[1].datetime, "2025-03-01 01:00:00");

    let json = batch.to_json().unwrap();
    assert!(json.contains("\"predictions\""));
    assert!(json.contains(r#"{"datetime":"2025-03-01 00:00:00","kwh":1.23}"#));
    assert!(!json.contains("\"value\""));
}

#[test]
fn test_batch_rejects_gaps() {
    let points = vec![
        TimePoint::new(start(), 1.0),
        TimePoint::new(start() + Duration::hours(2), 2.0),
    ];
    assert!(ForecastBatch::from_points(points).is_err());
}

#[test]
fn test_rolling_mean_is_fed_by_predictions() {
    let forecaster = RecursiveForecaster::new(FeatureBuilder::new(&features(&[1], &[3])).unwrap());
    let seed = hourly(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    let batch = forecaster.forecast(&RollingModel, &seed, 3).unwrap();
    let values = batch.values();

    // mean(4, 5, 6), then one and two predicted values enter the window
    let first = 5.0;
    let second = (5.0 + 6.0 + first) / 3.0;
    let third = (6.0 + first + second) / 3.0;
    assert!((values[0] - first).abs() < 1e-12);
    assert!((values[1] - second).abs() < 1e-12);
    assert!((values[2] - third).abs() < 1e-12);
    assert!((third - 49.0 / 9.0).abs() < 1e-12);
}

#[rstest]
#[case(&[1], &[3], 3)]
#[case(&[1, 24], &[48], 48)]
#[case(&[2], &[6, 12], 12)]
fn test_rolling_configs_split_consistently(
    #[case] lags: &[u32],
    #[case] rolling: &[u32],
    #[case] depth: usize,
) {
    let forecaster = RecursiveForecaster::new(FeatureBuilder::new(&features(lags, rolling)).unwrap());
    assert_eq!(forecaster.builder().required_depth(), depth);

    let seed = hourly(&(0..72).map(|i| ((i * 7) % 13) as f64).collect::<Vec<_>>());
    let full = forecaster.forecast(&SmoothingModel, &seed, 24).unwrap();
    let first = forecaster.forecast(&SmoothingModel, &seed, 10).unwrap();

    let mut extended = seed.clone();
    extended.extend_from_slice(first.points());
    let second = forecaster.forecast(&SmoothingModel, &extended, 14).unwrap();

    let mut stitched = first.values();
    stitched.extend(second.values());
    assert_eq!(full.values(), stitched);

    // A seed covering exactly the depth is enough; one point less is not
    let exact = &seed[seed.len() - depth..];
    assert_eq!(
        forecaster.forecast(&SmoothingModel, exact, 24).unwrap().values(),
        full.values()
    );
    let short = &seed[seed.len() - depth + 1..];
    assert!(matches!(
        forecaster.forecast(&SmoothingModel, short, 24),
        Err(ForecastError::InsufficientHistory { required, .. }) if required == depth
    ));
}
