use chrono::{DateTime, Duration, TimeZone, Utc};
use energy_forecast::data::{TimePoint, TimeRange};
use energy_forecast::forecast::ForecastBatch;
use energy_forecast::io::{
    write_rows, CsvForecastSink, CsvHistorySource, ForecastSink, HistorySource,
    MemoryForecastSink, MemoryHistorySource,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
}

fn at(hour: i64, value: f64) -> TimePoint {
    TimePoint::new(start() + Duration::hours(hour), value)
}

fn day_range() -> TimeRange {
    TimeRange::new(start(), start() + Duration::days(1)).unwrap()
}

#[test]
fn test_csv_round_trip_filters_series() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.csv");

    write_rows(&path, "energy_consumption", "consumption_kwh", &[at(0, 1.5), at(1, 2.5)]).unwrap();
    write_rows(&path, "solar_production", "production_kwh", &[at(0, 9.0)]).unwrap();

    let source = CsvHistorySource::open(&path).unwrap();
    assert_eq!(source.len(), 3);

    let points = source
        .query("energy_consumption", "consumption_kwh", &day_range())
        .unwrap();
    assert_eq!(points, vec![at(0, 1.5), at(1, 2.5)]);
}

#[test]
fn test_csv_source_resamples_and_fills() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.csv");
    std::fs::write(
        &path,
        "measurement,field,timestamp,value\n\
         energy_consumption,consumption_kwh,2025-03-01 00:00:00,1.0\n\
         energy_consumption,consumption_kwh,2025-03-01 00:30:00,3.0\n\
         energy_consumption,consumption_kwh,2025-03-01T01:00:00Z,4.0\n\
         energy_consumption,consumption_kwh,2025-03-01T03:00:00+00:00,5.0\n",
    )
    .unwrap();

    let source = CsvHistorySource::open(&path).unwrap();
    let points = source
        .query("energy_consumption", "consumption_kwh", &day_range())
        .unwrap();

    assert_eq!(points, vec![at(0, 2.0), at(1, 4.0), at(2, 4.0), at(3, 5.0)]);
}

#[test]
fn test_csv_query_respects_range() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.csv");
    let points: Vec<TimePoint> = (-3..30).map(|h| at(h, h as f64)).collect();
    write_rows(&path, "energy_consumption", "consumption_kwh", &points).unwrap();

    let source = CsvHistorySource::open(&path).unwrap();
    let queried = source
        .query("energy_consumption", "consumption_kwh", &day_range())
        .unwrap();

    assert_eq!(queried.len(), 24);
    assert_eq!(queried.first().map(|p| p.timestamp), Some(start()));
    assert_eq!(
        queried.last().map(|p| p.timestamp),
        Some(start() + Duration::hours(23))
    );
}

#[test]
fn test_missing_history_file_is_empty() {
    let dir = tempdir().unwrap();
    let source = CsvHistorySource::open(dir.path().join("absent.csv")).unwrap();
    assert!(source.is_empty());
    assert!(source
        .query("energy_consumption", "consumption_kwh", &day_range())
        .unwrap()
        .is_empty());
}

#[test]
fn test_csv_sink_appends_with_single_header() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("out").join("forecasts.csv");
    let mut sink = CsvForecastSink::new(&path);

    let first = ForecastBatch::from_points(vec![at(0, 1.0), at(1, 1.1)]).unwrap();
    let second = ForecastBatch::from_points(vec![at(2, 1.2)]).unwrap();
    sink.publish("predictions", "predicted_kwh", &first).unwrap();
    sink.publish("predictions", "predicted_kwh", &second).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches("measurement,field,timestamp,value").count(), 1);
    assert_eq!(text.lines().count(), 4);

    let source = CsvHistorySource::open(&path).unwrap();
    let points = source
        .query("predictions", "predicted_kwh", &day_range())
        .unwrap();
    assert_eq!(points, vec![at(0, 1.0), at(1, 1.1), at(2, 1.2)]);
}

#[test]
fn test_memory_source_and_sink() {
    let mut source = MemoryHistorySource::new();
    source.insert("energy_consumption", "consumption_kwh", &[at(2, 3.0), at(0, 1.0)]);
    source.insert("energy_consumption", "consumption_kwh", &[at(1, 2.0), at(30, 9.0)]);

    let points = source
        .query("energy_consumption", "consumption_kwh", &day_range())
        .unwrap();
    assert_eq!(points, vec![at(0, 1.0), at(1, 2.0), at(2, 3.0)]);
    assert!(source.query("other", "field", &day_range()).unwrap().is_empty());

    let mut sink = MemoryForecastSink::new();
    let batch = ForecastBatch::from_points(points).unwrap();
    sink.publish("predictions", "predicted_kwh", &batch).unwrap();
    assert_eq!(sink.published().len(), 1);
    assert_eq!(sink.published()[0].2, batch);
}

#[test]
fn test_csv_observed_query_keeps_gaps() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.csv");
    write_rows(
        &path,
        "energy_consumption",
        "consumption_kwh",
        &[at(0, 1.0), at(0, 3.0), at(1, 4.0), at(5, 6.0)],
    )
    .unwrap();

    let source = CsvHistorySource::open(&path).unwrap();
    let observed = source
        .query_observed("energy_consumption", "consumption_kwh", &day_range())
        .unwrap();
    assert_eq!(observed, vec![at(0, 2.0), at(1, 4.0), at(5, 6.0)]);

    let filled = source
        .query("energy_consumption", "consumption_kwh", &day_range())
        .unwrap();
    assert_eq!(filled.len(), 6);
    assert_eq!(filled[4], at(4, 4.0));
}
