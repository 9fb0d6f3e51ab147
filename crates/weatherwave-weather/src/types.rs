use serde::{Deserialize, Serialize};
use weatherwave_core::{AppError, ConfigError, ForecastError, NetworkError};
use weatherwave_services::FetchError;

/// Geographic point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Latitude {}, Longitude {}", self.latitude, self.longitude)
    }
}

/// Where the coordinates of a forecast request came from
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationSource {
    /// No place name was entered
    Default,
    /// Forward geocoding found the place
    Geocoded { query: String },
    /// Forward geocoding found nothing; the default was used instead
    LookupMiss { query: String },
    /// A pinned map coordinate overrode everything else
    MapPin,
}

/// Coordinates chosen for a request, with their provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedLocation {
    pub coordinates: Coordinates,
    pub source: LocationSource,
}

impl ResolvedLocation {
    /// User-facing warning for a lookup miss
    pub fn warning(&self) -> Option<String> {
        match &self.source {
            LocationSource::LookupMiss { query } => Some(format!(
                "Could not find coordinates for {}. Please try another location.",
                query
            )),
            _ => None,
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Forecast request failed: {0}")]
    Upstream(#[from] FetchError),
    #[error("Malformed forecast response: {0}")]
    Malformed(String),
    #[error("Invalid time axis: {0}")]
    TimeAxis(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        WeatherError::Malformed(e.to_string())
    }
}

impl From<WeatherError> for AppError {
    fn from(e: WeatherError) -> Self {
        match e {
            WeatherError::Upstream(e) => AppError::Network(e.into()),
            WeatherError::Malformed(msg) | WeatherError::TimeAxis(msg) => {
                AppError::Forecast(ForecastError::Malformed(msg))
            }
            WeatherError::InvalidRequest(msg) => AppError::Config(ConfigError::Invalid(msg)),
        }
    }
}
