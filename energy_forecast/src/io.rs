//! History sources and forecast sinks
//!
//! The core never talks to a datastore directly. A [`HistorySource`] hands
//! it hourly series, forward-filled for training and seeding or as observed
//! for evaluation; a [`ForecastSink`] takes finished batches. The CSV implementations use one long-format file with columns
//! `measurement, field, timestamp, value` for both directions, so forecasts
//! published by one cycle can be read back by the next evaluation.

use crate::data::{hourly_means, resample_hourly, DataLoader, SeriesRecord, TimePoint, TimeRange};
use crate::error::Result;
use crate::forecast::ForecastBatch;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

/// Query interface of the time series store
pub trait HistorySource {
    /// Hourly, forward-filled points of one series inside `range`
    fn query(&self, measurement: &str, field: &str, range: &TimeRange) -> Result<Vec<TimePoint>>;

    /// Hourly means of the observed hours only; gaps stay gaps
    ///
    /// Evaluation reads through this so the evaluator alone decides how far
    /// a realized gap may be filled, and forecasts are never filled at all.
    /// The default delegates to [`query`](Self::query); sources whose
    /// `query` fills gaps must override it.
    fn query_observed(
        &self,
        measurement: &str,
        field: &str,
        range: &TimeRange,
    ) -> Result<Vec<TimePoint>> {
        self.query(measurement, field, range)
    }
}

/// Destination for finished forecasts
pub trait ForecastSink {
    fn publish(&mut self, measurement: &str, field: &str, batch: &ForecastBatch) -> Result<()>;
}

/// History held in memory, keyed by measurement and field
///
/// Points are returned as inserted; gaps are not filled.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistorySource {
    series: HashMap<(String, String), Vec<TimePoint>>,
}

impl MemoryHistorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add points to a series, keeping it sorted
    pub fn insert(&mut self, measurement: &str, field: &str, points: &[TimePoint]) {
        let series = self
            .series
            .entry((measurement.to_string(), field.to_string()))
            .or_default();
        series.extend_from_slice(points);
        series.sort_by_key(|p| p.timestamp);
    }
}

impl HistorySource for MemoryHistorySource {
    fn query(&self, measurement: &str, field: &str, range: &TimeRange) -> Result<Vec<TimePoint>> {
        let points = self
            .series
            .get(&(measurement.to_string(), field.to_string()))
            .map(|series| {
                series
                    .iter()
                    .filter(|p| range.contains(p.timestamp))
                    .copied()
                    .collect()
            })
            .unwrap_or_default();
        Ok(points)
    }
}

/// History read from a long-format CSV file
#[derive(Debug, Clone)]
pub struct CsvHistorySource {
    records: Vec<SeriesRecord>,
}

impl CsvHistorySource {
    /// Load every record of the file; a missing file is an empty history
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(path = %path.display(), "History file not found; starting empty");
            return Ok(Self {
                records: Vec::new(),
            });
        }

        let records = DataLoader::from_csv(path)?;
        tracing::info!(path = %path.display(), records = records.len(), "History loaded");
        Ok(Self { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn select(&self, measurement: &str, field: &str, range: &TimeRange) -> Vec<TimePoint> {
        self.records
            .iter()
            .filter(|r| r.measurement == measurement && r.field == field)
            .filter(|r| range.contains(r.timestamp))
            .map(|r| TimePoint::new(r.timestamp, r.value))
            .collect()
    }
}

impl HistorySource for CsvHistorySource {
    fn query(&self, measurement: &str, field: &str, range: &TimeRange) -> Result<Vec<TimePoint>> {
        let points = resample_hourly(&self.select(measurement, field, range))?;
        tracing::debug!(measurement, field, points = points.len(), "History queried");
        Ok(points)
    }

    fn query_observed(
        &self,
        measurement: &str,
        field: &str,
        range: &TimeRange,
    ) -> Result<Vec<TimePoint>> {
        let points: Vec<TimePoint> = hourly_means(&self.select(measurement, field, range))?
            .into_iter()
            .map(|(slot, value)| TimePoint::new(slot, value))
            .collect();
        tracing::debug!(measurement, field, points = points.len(), "Observed hours queried");
        Ok(points)
    }
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    measurement: &'a str,
    field: &'a str,
    timestamp: String,
    value: f64,
}

/// Appends published forecasts to a long-format CSV file
#[derive(Debug, Clone)]
pub struct CsvForecastSink {
    path: PathBuf,
}

impl CsvForecastSink {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ForecastSink for CsvForecastSink {
    fn publish(&mut self, measurement: &str, field: &str, batch: &ForecastBatch) -> Result<()> {
        write_rows(&self.path, measurement, field, batch.points())?;
        tracing::info!(
            path = %self.path.display(),
            measurement,
            points = batch.len(),
            "Forecast published"
        );
        Ok(())
    }
}

/// Append rows in the long format, writing the header for a new file
pub fn write_rows(path: &Path, measurement: &str, field: &str, points: &[TimePoint]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let needs_header = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let file = OpenOptions::new().create(true).append(true).open(path)?;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for point in points {
        writer.serialize(CsvRow {
            measurement,
            field,
            timestamp: point.timestamp.to_rfc3339(),
            value: point.value,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Keeps published batches in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryForecastSink {
    published: Vec<(String, String, ForecastBatch)>,
}

impl MemoryForecastSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> &[(String, String, ForecastBatch)] {
        &self.published
    }
}

impl ForecastSink for MemoryForecastSink {
    fn publish(&mut self, measurement: &str, field: &str, batch: &ForecastBatch) -> Result<()> {
        self.published
            .push((measurement.to_string(), field.to_string(), batch.clone()));
        Ok(())
    }
}
