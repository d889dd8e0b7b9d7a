use chrono::{TimeZone, Utc};
use energy_forecast::error::ForecastError;
use forecast_math::MathError;
use std::io;
use std::path::PathBuf;

#[test]
fn test_error_conversion() {
    let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
    assert!(matches!(ForecastError::from(io_error), ForecastError::IoError(_)));

    let math_error = MathError::InsufficientData("no pairs".to_string());
    assert!(matches!(ForecastError::from(math_error), ForecastError::Math(_)));

    let json_error = serde_json::from_str::<f64>("nope").unwrap_err();
    assert!(matches!(
        ForecastError::from(json_error),
        ForecastError::Serialization(_)
    ));
}

#[test]
fn test_error_display_carries_context() {
    let target = Utc.with_ymd_and_hms(2025, 3, 1, 5, 0, 0).unwrap();

    let error = ForecastError::InsufficientHistory {
        target: Some(target),
        required: 24,
        available: 3,
    };
    let message = error.to_string();
    assert!(message.contains("2025-03-01 05:00:00"));
    assert!(message.contains("need 24"));
    assert!(message.contains("have 3"));

    let error = ForecastError::InsufficientHistory {
        target: None,
        required: 25,
        available: 0,
    };
    assert_eq!(
        error.to_string(),
        "Insufficient history: need 25 hourly points, have 0"
    );

    let error = ForecastError::ModelNotFound(PathBuf::from("models/energy_model.json"));
    assert!(error.to_string().contains("models/energy_model.json"));

    let error = ForecastError::DeadlineExceeded {
        completed: 5,
        horizon: 24,
    };
    assert_eq!(
        error.to_string(),
        "Deadline exceeded after 5 of 24 forecast steps"
    );
}

#[test]
fn test_error_creation() {
    let data_error = ForecastError::DataError("Empty series".to_string());
    let training_error = ForecastError::TrainingFailed("singular matrix".to_string());
    let parameter_error = ForecastError::InvalidParameter("Invalid window".to_string());

    assert!(matches!(data_error, ForecastError::DataError(_)));
    assert!(matches!(training_error, ForecastError::TrainingFailed(_)));
    assert!(matches!(parameter_error, ForecastError::InvalidParameter(_)));
    assert!(training_error.to_string().starts_with("Training failed"));
}
