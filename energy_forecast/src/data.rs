//! Hourly time series handling

use crate::error::{ForecastError, Result};
use crate::utils::parse_timestamp;
use chrono::{DateTime, Duration, DurationRound, Utc};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

/// One observation of the forecast quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

impl TimePoint {
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Half-open time range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Create a range, rejecting empty or inverted bounds
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(ForecastError::InvalidParameter(format!(
                "Range start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The `hours` hours ending at `end` (exclusive)
    pub fn trailing(end: DateTime<Utc>, hours: u32) -> Result<Self> {
        let start = end
            .checked_sub_signed(Duration::hours(i64::from(hours)))
            .ok_or_else(|| {
                ForecastError::InvalidParameter(format!(
                    "{} hours before {} is out of range",
                    hours, end
                ))
            })?;
        Self::new(start, end)
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp < self.end
    }

    /// Hour slots covered by the range, starting at the floored start
    pub fn hourly_slots(&self) -> Result<Vec<DateTime<Utc>>> {
        let mut slot = floor_to_hour(self.start)?;
        let mut slots = Vec::new();
        while slot < self.end {
            if slot >= self.start {
                slots.push(slot);
            }
            slot = slot + Duration::hours(1);
        }
        Ok(slots)
    }
}

/// Truncate a timestamp to the start of its hour
pub fn floor_to_hour(timestamp: DateTime<Utc>) -> Result<DateTime<Utc>> {
    timestamp
        .duration_trunc(Duration::hours(1))
        .map_err(|e| ForecastError::DataError(format!("Cannot floor {} to hour: {}", timestamp, e)))
}

/// Check that a series is strictly increasing at exactly one-hour spacing
pub fn validate_hourly(points: &[TimePoint]) -> Result<()> {
    for pair in points.windows(2) {
        let expected = pair[0].timestamp + Duration::hours(1);
        if pair[1].timestamp != expected {
            return Err(ForecastError::NonContiguous {
                expected,
                found: pair[1].timestamp,
            });
        }
    }
    Ok(())
}

/// Average observations per hour slot (a resample to hourly means)
pub fn hourly_means(points: &[TimePoint]) -> Result<BTreeMap<DateTime<Utc>, f64>> {
    let mut buckets: BTreeMap<DateTime<Utc>, (f64, usize)> = BTreeMap::new();
    for point in points {
        if !point.value.is_finite() {
            continue;
        }
        let slot = floor_to_hour(point.timestamp)?;
        let entry = buckets.entry(slot).or_insert((0.0, 0));
        entry.0 += point.value;
        entry.1 += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|(slot, (sum, count))| (slot, sum / count as f64))
        .collect())
}

/// Resample to hourly means and forward-fill every interior gap
///
/// This is the shape a history source hands to the feature builder:
/// gapless, one point per hour, from the first to the last observed hour.
pub fn resample_hourly(points: &[TimePoint]) -> Result<Vec<TimePoint>> {
    let means = hourly_means(points)?;
    let (first, last) = match (means.keys().next(), means.keys().next_back()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Ok(Vec::new()),
    };

    let mut series = Vec::with_capacity(means.len());
    let mut slot = first;
    let mut carried = f64::NAN;
    while slot <= last {
        if let Some(value) = means.get(&slot) {
            carried = *value;
        }
        series.push(TimePoint::new(slot, carried));
        slot = slot + Duration::hours(1);
    }
    Ok(series)
}

/// One row of a long-format measurement file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    pub measurement: String,
    pub field: String,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}

/// Data loader for long-format measurement files
///
/// Expected columns: `measurement`, `field`, `timestamp`, `value`.
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Load measurement records from a CSV file
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Vec<SeriesRecord>> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .finish()?;

        Self::from_dataframe(&df)
    }

    /// Extract measurement records from an existing DataFrame
    pub fn from_dataframe(df: &DataFrame) -> Result<Vec<SeriesRecord>> {
        let measurements = Self::string_column(df, "measurement")?;
        let fields = Self::string_column(df, "field")?;
        let timestamps = Self::string_column(df, "timestamp")?;
        let values = Self::float_column(df, "value")?;

        let mut records = Vec::with_capacity(df.height());
        for (row, (((measurement, field), timestamp), value)) in measurements
            .into_iter()
            .zip(fields)
            .zip(timestamps)
            .zip(values)
            .enumerate()
        {
            let (measurement, field, timestamp, value) = match (measurement, field, timestamp, value)
            {
                (Some(m), Some(f), Some(t), Some(v)) => (m, f, t, v),
                _ => {
                    tracing::debug!(row, "Skipping row with empty cells");
                    continue;
                }
            };

            let timestamp = parse_timestamp(&timestamp).map_err(|e| {
                ForecastError::DataError(format!("Row {}: {}", row, e))
            })?;

            records.push(SeriesRecord {
                measurement,
                field,
                timestamp,
                value,
            });
        }

        Ok(records)
    }

    /// Get a column as optional strings
    fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
        let col = df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })?;
        let col = col.cast(&DataType::Utf8)?;
        let values = col
            .utf8()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect();
        Ok(values)
    }

    /// Get a column as optional f64 values
    fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
        let col = df.column(name).map_err(|e| {
            ForecastError::DataError(format!("Column '{}' not found: {}", name, e))
        })?;

        match col.dtype() {
            DataType::Float64 | DataType::Float32 | DataType::Int64 | DataType::Int32 => {
                let col = col.cast(&DataType::Float64)?;
                Ok(col.f64()?.into_iter().collect())
            }
            _ => Err(ForecastError::DataError(format!(
                "Column '{}' cannot be converted to f64",
                name
            ))),
        }
    }
}
