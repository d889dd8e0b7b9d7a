//! Feature construction for hourly forecasting
//!
//! A [`FeatureVector`] for target timestamp `T` is built from calendar
//! fields of `T` and from observations strictly before `T`. The builder only
//! ever looks at the part of the history that precedes the target, so
//! lookahead is impossible by construction; the slot arithmetic is checked
//! anyway and a violation is reported as [`ForecastError::MalformedFeature`].

use crate::config::FeatureConfig;
use crate::data::TimePoint;
use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;

/// Name of one feature field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureName {
    Hour,
    DayOfWeek,
    Day,
    Month,
    Year,
    IsWeekend,
    /// Value `k` hours before the target
    Lag(u32),
    /// Mean of the `n` values before the target
    RollingMean(u32),
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureName::Hour => write!(f, "hour"),
            FeatureName::DayOfWeek => write!(f, "day_of_week"),
            FeatureName::Day => write!(f, "day"),
            FeatureName::Month => write!(f, "month"),
            FeatureName::Year => write!(f, "year"),
            FeatureName::IsWeekend => write!(f, "is_weekend"),
            FeatureName::Lag(k) => write!(f, "lag_{}h", k),
            FeatureName::RollingMean(n) => write!(f, "rolling_mean_{}h", n),
        }
    }
}

/// Fixed field order of every vector a builder produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<FeatureName>,
}

impl FeatureSchema {
    /// Calendar fields, optional `is_weekend`, lags ascending, rolling windows ascending
    pub fn from_config(config: &FeatureConfig) -> Self {
        let mut names = vec![
            FeatureName::Hour,
            FeatureName::DayOfWeek,
            FeatureName::Day,
            FeatureName::Month,
            FeatureName::Year,
        ];
        if config.include_is_weekend {
            names.push(FeatureName::IsWeekend);
        }
        names.extend(config.lag_offsets.iter().map(|&k| FeatureName::Lag(k)));
        names.extend(
            config
                .rolling_windows
                .iter()
                .map(|&n| FeatureName::RollingMean(n)),
        );
        Self { names }
    }

    pub fn names(&self) -> &[FeatureName] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.names.iter().map(ToString::to_string).collect();
        write!(f, "{}", names.join(", "))
    }
}

/// Named numeric inputs for one target timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    timestamp: DateTime<Utc>,
    fields: Vec<(FeatureName, f64)>,
}

impl FeatureVector {
    /// Timestamp the vector predicts
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn fields(&self) -> &[(FeatureName, f64)] {
        &self.fields
    }

    pub fn get(&self, name: FeatureName) -> Option<f64> {
        self.fields
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| *value)
    }

    /// Values in schema order
    pub fn values(&self) -> Vec<f64> {
        self.fields.iter().map(|(_, value)| *value).collect()
    }

    pub fn names(&self) -> Vec<FeatureName> {
        self.fields.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A feature vector paired with the realized value at its timestamp
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub features: FeatureVector,
    pub target: f64,
}

/// Builds feature vectors from an ordered hourly history
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    schema: FeatureSchema,
    required_depth: usize,
}

impl FeatureBuilder {
    pub fn new(config: &FeatureConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            schema: FeatureSchema::from_config(config),
            required_depth: config.required_depth(),
        })
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Number of hourly points that must precede a target
    pub fn required_depth(&self) -> usize {
        self.required_depth
    }

    /// Build the vector for `target` from `history` (sorted by timestamp)
    pub fn build(&self, history: &[TimePoint], target: DateTime<Utc>) -> Result<FeatureVector> {
        let available = history.partition_point(|p| p.timestamp < target);
        let prior = &history[..available];
        if prior.len() < self.required_depth {
            return Err(ForecastError::InsufficientHistory {
                target: Some(target),
                required: self.required_depth,
                available: prior.len(),
            });
        }

        let weekday = target.weekday().num_days_from_monday();
        let mut fields = Vec::with_capacity(self.schema.len());
        for &name in self.schema.names() {
            let value = match name {
                FeatureName::Hour => f64::from(target.hour()),
                FeatureName::DayOfWeek => f64::from(weekday),
                FeatureName::Day => f64::from(target.day()),
                FeatureName::Month => f64::from(target.month()),
                FeatureName::Year => f64::from(target.year()),
                FeatureName::IsWeekend => {
                    if weekday >= 5 {
                        1.0
                    } else {
                        0.0
                    }
                }
                FeatureName::Lag(k) => lookup(prior, target, k)?,
                FeatureName::RollingMean(n) => {
                    let window = (1..=n)
                        .rev()
                        .map(|offset| lookup(prior, target, offset))
                        .collect::<Result<Vec<f64>>>()?;
                    window.iter().mean()
                }
            };
            fields.push((name, value));
        }

        Ok(FeatureVector {
            timestamp: target,
            fields,
        })
    }

    /// Build one row per timestamp of `history` whose dependencies are present
    ///
    /// Rows that lack lag or rolling depth are dropped; any other failure is
    /// returned as is.
    pub fn build_training_rows(&self, history: &[TimePoint]) -> Result<Vec<TrainingRow>> {
        let mut rows = Vec::with_capacity(history.len().saturating_sub(self.required_depth));
        let mut dropped = 0usize;

        for point in history {
            if !point.value.is_finite() {
                dropped += 1;
                continue;
            }
            match self.build(history, point.timestamp) {
                Ok(features) => rows.push(TrainingRow {
                    features,
                    target: point.value,
                }),
                Err(
                    e @ (ForecastError::InsufficientHistory { .. }
                    | ForecastError::MissingObservation { .. }),
                ) => {
                    tracing::debug!(timestamp = %point.timestamp, reason = %e, "Dropping training row");
                    dropped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(rows = rows.len(), dropped, "Feature engineering completed");

        if rows.is_empty() {
            return Err(ForecastError::InsufficientHistory {
                target: None,
                required: self.required_depth + 1,
                available: history.len(),
            });
        }
        Ok(rows)
    }
}

/// Value of the slot `offset` hours before `target`, searched in `prior` only
fn lookup(prior: &[TimePoint], target: DateTime<Utc>, offset: u32) -> Result<f64> {
    let slot = target - Duration::hours(i64::from(offset));
    if slot >= target {
        debug_assert!(false, "feature for {} references {}", target, slot);
        return Err(ForecastError::MalformedFeature {
            target,
            referenced: slot,
        });
    }

    let index = prior
        .binary_search_by_key(&slot, |p| p.timestamp)
        .map_err(|_| ForecastError::MissingObservation {
            target,
            missing: slot,
        })?;
    let value = prior[index].value;
    if !value.is_finite() {
        return Err(ForecastError::MissingObservation {
            target,
            missing: slot,
        });
    }
    Ok(value)
}
