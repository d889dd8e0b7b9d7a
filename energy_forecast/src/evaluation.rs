//! Forecast accuracy evaluation
//!
//! Realized and forecast series are both reduced to hourly means on the
//! evaluation window's grid and joined on exact slot equality. Realized gaps
//! between two observations are forward-filled, but only for a bounded
//! number of consecutive hours; longer gaps are flagged and left out.

use crate::config::EvaluationPeriod;
use crate::data::{floor_to_hour, hourly_means, TimePoint, TimeRange};
use crate::error::{ForecastError, Result};
use crate::forecast::ForecastBatch;
use chrono::{DateTime, Duration, Utc};
use forecast_math::error_summary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Half-open window `[start, end)` an evaluation covers
pub type EvaluationWindow = TimeRange;

impl TimeRange {
    /// Midnight-to-midnight (UTC) of the day before `now`
    pub fn previous_day(now: DateTime<Utc>) -> Result<Self> {
        let today = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| ForecastError::DataError(format!("No midnight for {}", now)))?
            .and_utc();
        Self::new(today - Duration::days(1), today)
    }

    /// Resolve a configured evaluation period against `now`
    pub fn for_period(period: EvaluationPeriod, now: DateTime<Utc>) -> Result<Self> {
        match period {
            EvaluationPeriod::PreviousDay => Self::previous_day(now),
            EvaluationPeriod::TrailingHours(hours) => Self::trailing(floor_to_hour(now)?, hours),
        }
    }
}

/// Accuracy of one forecast over one window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// Mean Absolute Error over aligned rows
    pub mae: f64,
    /// Root Mean Squared Error over aligned rows
    pub rmse: f64,
    /// Aligned rows the metrics were computed over
    pub sample_count: usize,
    /// Realized hours with no forecast
    pub realized_only: usize,
    /// Forecast hours with no (trusted) realized value
    pub forecast_only: usize,
    /// Realized hours filled from the previous hour
    pub forward_filled: usize,
    /// Realized gap hours beyond the fill bound, excluded
    pub stale_slots: usize,
}

impl std::fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} .. {}) MAE={:.3}, RMSE={:.3} over {} samples",
            self.period_start, self.period_end, self.mae, self.rmse, self.sample_count
        )
    }
}

/// Compares realized values with previously emitted forecasts
#[derive(Debug, Clone)]
pub struct AccuracyEvaluator {
    max_forward_fill: usize,
}

impl Default for AccuracyEvaluator {
    fn default() -> Self {
        Self { max_forward_fill: 1 }
    }
}

impl AccuracyEvaluator {
    pub fn new(max_forward_fill: usize) -> Self {
        Self { max_forward_fill }
    }

    pub fn max_forward_fill(&self) -> usize {
        self.max_forward_fill
    }

    /// Evaluate one forecast batch against the realized series
    pub fn evaluate(
        &self,
        realized: &[TimePoint],
        forecast: &ForecastBatch,
        window: &EvaluationWindow,
    ) -> Result<EvaluationReport> {
        self.evaluate_series(realized, forecast.points(), window)
    }

    /// Evaluate an arbitrary forecast series, e.g. one read back from a sink
    pub fn evaluate_series(
        &self,
        realized: &[TimePoint],
        forecast: &[TimePoint],
        window: &EvaluationWindow,
    ) -> Result<EvaluationReport> {
        let actual = hourly_means(realized)?;
        let predicted = hourly_means(forecast)?;
        let slots = window.hourly_slots()?;

        let first_observed = actual.range(window.start..window.end).next().map(|(ts, _)| *ts);
        let last_observed = actual
            .range(window.start..window.end)
            .next_back()
            .map(|(ts, _)| *ts);

        let mut trusted: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();
        let mut forward_filled = 0usize;
        let mut stale_slots = 0usize;
        if let (Some(first), Some(last)) = (first_observed, last_observed) {
            let mut carried: Option<f64> = None;
            let mut gap = 0usize;
            for &slot in slots.iter().filter(|s| **s >= first && **s <= last) {
                match actual.get(&slot) {
                    Some(&value) => {
                        trusted.insert(slot, value);
                        carried = Some(value);
                        gap = 0;
                    }
                    None => {
                        gap += 1;
                        match carried {
                            Some(value) if gap <= self.max_forward_fill => {
                                trusted.insert(slot, value);
                                forward_filled += 1;
                            }
                            _ => stale_slots += 1,
                        }
                    }
                }
            }
        }
        if stale_slots > 0 {
            tracing::warn!(
                stale_slots,
                max_forward_fill = self.max_forward_fill,
                "Realized series has gaps longer than the forward-fill bound; excluding them"
            );
        }

        let mut actual_values = Vec::new();
        let mut predicted_values = Vec::new();
        let mut forecast_only = 0usize;
        for (slot, &value) in predicted.range(window.start..window.end) {
            match trusted.get(slot) {
                Some(&realized_value) => {
                    actual_values.push(realized_value);
                    predicted_values.push(value);
                }
                None => forecast_only += 1,
            }
        }
        let realized_only = trusted
            .keys()
            .filter(|slot| !predicted.contains_key(*slot))
            .count();

        if actual_values.is_empty() {
            return Err(ForecastError::NoOverlap {
                start: window.start,
                end: window.end,
            });
        }

        let summary = error_summary(&actual_values, &predicted_values)?;
        let report = EvaluationReport {
            period_start: window.start,
            period_end: window.end,
            mae: summary.mae,
            rmse: summary.rmse,
            sample_count: summary.count,
            realized_only,
            forecast_only,
            forward_filled,
            stale_slots,
        };

        tracing::info!(
            start = %report.period_start,
            end = %report.period_end,
            mae = report.mae,
            rmse = report.rmse,
            samples = report.sample_count,
            "Evaluation metrics computed"
        );
        Ok(report)
    }
}
