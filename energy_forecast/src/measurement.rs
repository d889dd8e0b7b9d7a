//! Measurement types the loop forecasts, with their storage names

use crate::error::ForecastError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Forecastable quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Measurement {
    /// Household energy consumption (kWh per hour)
    Consumption,
    /// Photovoltaic production
    Solar,
}

impl Measurement {
    /// Measurement name of the realized series
    pub fn source_measurement(&self) -> &'static str {
        match self {
            Measurement::Consumption => "energy_consumption",
            Measurement::Solar => "solar_production",
        }
    }

    /// Field name of the realized series
    pub fn source_field(&self) -> &'static str {
        match self {
            Measurement::Consumption => "consumption_kwh",
            Measurement::Solar => "production_kwh",
        }
    }

    /// Measurement name forecasts are published under
    pub fn forecast_measurement(&self) -> &'static str {
        match self {
            Measurement::Consumption => "predictions",
            Measurement::Solar => "solar_production_prediction",
        }
    }

    /// Field name forecasts are published under
    pub fn forecast_field(&self) -> &'static str {
        match self {
            Measurement::Consumption => "predicted_kwh",
            Measurement::Solar => "predicted_w",
        }
    }

    /// File name of the model artifact
    pub fn model_file_name(&self) -> &'static str {
        match self {
            Measurement::Consumption => "energy_model.json",
            Measurement::Solar => "solar_model.json",
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Measurement::Consumption => write!(f, "consumption"),
            Measurement::Solar => write!(f, "solar"),
        }
    }
}

impl FromStr for Measurement {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "consumption" | "energy" => Ok(Measurement::Consumption),
            "solar" | "production" => Ok(Measurement::Solar),
            other => Err(ForecastError::InvalidParameter(format!(
                "Unknown measurement: {}",
                other
            ))),
        }
    }
}
