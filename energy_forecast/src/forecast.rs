//! Recursive multi-step forecasting
//!
//! Each step's prediction is appended to a bounded buffer and becomes the
//! `lag_1h` (and deeper lags, and rolling inputs) of later steps. Error
//! therefore compounds across the horizon; realized values after the seed
//! are never consulted.

use crate::data::{validate_hourly, TimePoint};
use crate::error::{ForecastError, Result};
use crate::features::FeatureBuilder;
use crate::models::Model;
use crate::utils::format_timestamp;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Instant;

/// Contiguous hourly forecast produced by one forecaster run
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastBatch {
    points: Vec<TimePoint>,
}

/// Publishable form of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    /// First forecast slot
    pub timestamp: String,
    pub predictions: Vec<PayloadEntry>,
}

/// One hour of a published forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadEntry {
    pub datetime: String,
    /// Predicted value rounded to two decimals
    #[serde(rename = "kwh")]
    pub value: f64,
}

impl ForecastBatch {
    /// Wrap points that already form a contiguous hourly run
    pub fn from_points(points: Vec<TimePoint>) -> Result<Self> {
        validate_hourly(&points)?;
        Ok(Self { points })
    }

    /// A batch with no points (horizon zero)
    pub fn empty() -> Self {
        Self { points: Vec::new() }
    }

    pub fn points(&self) -> &[TimePoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// First forecast slot
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.points.first().map(|p| p.timestamp)
    }

    /// Last forecast slot
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.points.last().map(|p| p.timestamp)
    }

    /// Build the payload handed to downstream consumers
    pub fn to_payload(&self) -> ForecastPayload {
        ForecastPayload {
            timestamp: self.start().map(format_timestamp).unwrap_or_default(),
            predictions: self
                .points
                .iter()
                .map(|p| PayloadEntry {
                    datetime: format_timestamp(p.timestamp),
                    value: (p.value * 100.0).round() / 100.0,
                })
                .collect(),
        }
    }

    /// Serialize the payload to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_payload())?)
    }
}

/// Drives a model over a horizon, feeding predictions back as lags
#[derive(Debug, Clone)]
pub struct RecursiveForecaster {
    builder: FeatureBuilder,
}

impl RecursiveForecaster {
    pub fn new(builder: FeatureBuilder) -> Self {
        Self { builder }
    }

    pub fn builder(&self) -> &FeatureBuilder {
        &self.builder
    }

    /// Forecast `horizon` hours after the last seed point
    pub fn forecast<M: Model + ?Sized>(
        &self,
        model: &M,
        seed: &[TimePoint],
        horizon: usize,
    ) -> Result<ForecastBatch> {
        self.forecast_until(model, seed, horizon, None)
    }

    /// Forecast with an optional deadline, checked before each step starts
    pub fn forecast_until<M: Model + ?Sized>(
        &self,
        model: &M,
        seed: &[TimePoint],
        horizon: usize,
        deadline: Option<Instant>,
    ) -> Result<ForecastBatch> {
        let depth = self.builder.required_depth();
        if seed.len() < depth || seed.is_empty() {
            return Err(ForecastError::InsufficientHistory {
                target: seed.last().map(|p| p.timestamp + Duration::hours(1)),
                required: depth.max(1),
                available: seed.len(),
            });
        }
        validate_hourly(seed)?;
        if let Some(bad) = seed.iter().find(|p| !p.value.is_finite()) {
            return Err(ForecastError::DataError(format!(
                "Seed value at {} is not finite",
                bad.timestamp
            )));
        }

        let mut buffer: VecDeque<TimePoint> = seed[seed.len() - depth..].iter().copied().collect();
        let mut cursor = seed[seed.len() - 1].timestamp;
        let mut points = Vec::with_capacity(horizon);

        for step in 0..horizon {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    tracing::warn!(completed = step, horizon, "Forecast deadline exceeded");
                    return Err(ForecastError::DeadlineExceeded {
                        completed: step,
                        horizon,
                    });
                }
            }

            cursor = cursor + Duration::hours(1);
            let features = self.builder.build(buffer.make_contiguous(), cursor)?;
            let value = model.predict(&features)?;
            if !value.is_finite() {
                return Err(ForecastError::InvalidPrediction {
                    timestamp: cursor,
                    value,
                });
            }

            let point = TimePoint::new(cursor, value);
            buffer.push_back(point);
            if buffer.len() > depth {
                buffer.pop_front();
            }
            points.push(point);
        }

        tracing::debug!(model = model.name(), steps = points.len(), "Recursive forecast completed");
        Ok(ForecastBatch { points })
    }
}
