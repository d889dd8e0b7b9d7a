//! Utility functions for the energy_forecast crate

use crate::data::TimePoint;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Timelike, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

/// Format used for published forecast payloads and log lines
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse an RFC 3339 timestamp or a naive `%Y-%m-%d %H:%M:%S` one (taken as UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|e| ForecastError::DataError(format!("Unparseable timestamp '{}': {}", raw, e)))
}

/// Format a timestamp the way forecast payloads carry it
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Shape of a synthetic hourly load profile
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticProfile {
    /// Mean level in the native unit (kWh per hour)
    pub base: f64,
    /// Peak-to-mean amplitude of the daily cycle
    pub daily_amplitude: f64,
    /// Standard deviation of the additive Gaussian noise
    pub noise_std: f64,
    /// RNG seed, so generated series are reproducible
    pub seed: u64,
}

impl Default for SyntheticProfile {
    fn default() -> Self {
        Self {
            base: 0.8,
            daily_amplitude: 0.4,
            noise_std: 0.05,
            seed: 42,
        }
    }
}

/// Generate a gapless hourly series with a daily cycle plus noise
///
/// Values are clamped at zero; a household never consumes negative energy.
pub fn generate_hourly_series(
    start: DateTime<Utc>,
    hours: usize,
    profile: SyntheticProfile,
) -> Result<Vec<TimePoint>> {
    if !profile.noise_std.is_finite() || profile.noise_std < 0.0 {
        return Err(ForecastError::InvalidParameter(
            "Noise standard deviation must be non-negative".to_string(),
        ));
    }

    let noise = Normal::new(0.0, profile.noise_std)
        .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(profile.seed);

    let series = (0..hours)
        .map(|i| {
            let timestamp = start + Duration::hours(i as i64);
            let phase = (f64::from(timestamp.hour()) - 6.0) / 24.0 * std::f64::consts::TAU;
            let value = profile.base + profile.daily_amplitude * phase.sin() + noise.sample(&mut rng);
            TimePoint::new(timestamp, value.max(0.0))
        })
        .collect();

    Ok(series)
}
