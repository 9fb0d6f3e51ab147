//! Error hierarchy shared by the WeatherWave crates.
//!
//! Library crates keep their own error enums and convert into [`AppError`].
//! The CLI prints [`AppError::user_message`] and logs the full chain.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Forecast error: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),
}

impl AppError {
    /// Short, non-technical text for the terminal
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::Forecast(e) => e.user_message(),
            AppError::Model(e) => e.user_message(),
            AppError::Dataset(e) => e.user_message(),
        }
    }
}

/// Forecast and geocoding HTTP failures, after retries
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Could not connect: {0}")]
    Connect(String),

    #[error("Request timed out")]
    Timeout,

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Unreadable response body: {0}")]
    Body(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::Connect(_) => {
                "Could not reach the weather service. Check your internet connection."
            }
            NetworkError::Timeout => "The weather service did not answer in time. Try again.",
            NetworkError::Status { status, .. } if *status >= 500 => {
                "The weather service is down. Try again later."
            }
            NetworkError::Status { .. } => "The weather service rejected the request.",
            NetworkError::Body(_) => "The weather service answer was cut short. Try again.",
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout
        } else if let Some(status) = e.status() {
            NetworkError::Status {
                status: status.as_u16(),
                message: e.to_string(),
            }
        } else if e.is_body() || e.is_decode() {
            NetworkError::Body(e.to_string())
        } else {
            NetworkError::Connect(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot access {path}: {message}")]
    Io { path: String, message: String },

    #[error("Cannot parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Io { .. } => "The config file could not be read or written.",
            ConfigError::Parse { .. } => "The config file is not valid TOML. Fix or delete it.",
            ConfigError::Invalid(_) => "The config file has invalid settings. See the log.",
        }
    }
}

/// The forecast service answered, but not with a usable ensemble
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Malformed forecast response: {0}")]
    Malformed(String),
}

impl ForecastError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ForecastError::Malformed(_) => "The weather service returned data we could not read.",
        }
    }
}

/// Always fatal when raised while loading artifacts
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Model artifact missing: {0}")]
    Missing(String),

    #[error("Model artifact unreadable: {0}")]
    Corrupt(String),

    #[error("Invalid feature input: {0}")]
    InvalidInput(String),
}

impl ModelError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ModelError::Missing(_) => "Prediction models are not installed. Check the models directory.",
            ModelError::Corrupt(_) => "Prediction models could not be loaded. Re-export the models.",
            ModelError::InvalidInput(_) => "Feature input is invalid. Check the entered values.",
        }
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Dataset not found: {0}")]
    NotFound(String),

    #[error("Dataset malformed: {0}")]
    Malformed(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),
}

impl DatasetError {
    pub fn user_message(&self) -> &'static str {
        match self {
            DatasetError::NotFound(_) => "Historical dataset not found. Check the dataset path.",
            DatasetError::Malformed(_) => "Historical dataset could not be read.",
            DatasetError::UnknownColumn(_) => "That column is not in the dataset.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_variant_has_a_message() {
        let errors: Vec<AppError> = vec![
            NetworkError::Timeout.into(),
            NetworkError::Connect("refused".into()).into(),
            ConfigError::Invalid("forecast.models".into()).into(),
            ForecastError::Malformed("no hourly".into()).into(),
            ModelError::Missing("lstm_model.json".into()).into(),
            DatasetError::Malformed("row 3".into()).into(),
        ];
        for e in errors {
            assert!(!e.user_message().is_empty());
        }
    }

    #[test]
    fn test_status_message_depends_on_class() {
        let down = NetworkError::Status {
            status: 503,
            message: "unavailable".into(),
        };
        let rejected = NetworkError::Status {
            status: 400,
            message: "bad request".into(),
        };
        assert!(down.user_message().contains("later"));
        assert!(!rejected.user_message().contains("later"));
    }

    #[test]
    fn test_wraps_into_app_error() {
        let app: AppError = ModelError::Corrupt("bad json".into()).into();
        assert!(matches!(app, AppError::Model(ModelError::Corrupt(_))));
        assert_eq!(app.user_message(), ModelError::Corrupt(String::new()).user_message());
    }
}
