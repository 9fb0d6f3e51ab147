use std::path::PathBuf;

use weatherwave_core::{AppError, ModelError};

use crate::models::ModelId;

/// Failures loading a model artifact. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Model artifact not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt artifact {artifact}: {message}")]
    Corrupt { artifact: String, message: String },

    #[error("{artifact}: {what} has width {got}, expected {expected}")]
    Width {
        artifact: String,
        what: String,
        expected: usize,
        got: usize,
    },
}

impl ArtifactError {
    pub(crate) fn corrupt(artifact: &str, message: impl Into<String>) -> Self {
        ArtifactError::Corrupt {
            artifact: artifact.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn width(artifact: &str, what: impl Into<String>, expected: usize, got: usize) -> Self {
        ArtifactError::Width {
            artifact: artifact.to_string(),
            what: what.into(),
            expected,
            got,
        }
    }
}

/// Failures on the prediction path
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    #[error("Feature {name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("Expected {expected} feature values, got {got}")]
    FeatureCount { expected: usize, got: usize },

    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    #[error("Input scaled for {actual} cannot be fed to {expected}")]
    WrongModel { expected: ModelId, actual: ModelId },
}

impl From<ArtifactError> for AppError {
    fn from(e: ArtifactError) -> Self {
        match e {
            ArtifactError::Missing(path) => {
                AppError::Model(ModelError::Missing(path.display().to_string()))
            }
            other => AppError::Model(ModelError::Corrupt(other.to_string())),
        }
    }
}

impl From<PredictError> for AppError {
    fn from(e: PredictError) -> Self {
        AppError::Model(ModelError::InvalidInput(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_artifact_maps_to_missing_model() {
        let app: AppError = ArtifactError::Missing(PathBuf::from("models/lstm_model.json")).into();
        assert!(matches!(app, AppError::Model(ModelError::Missing(_))));
        assert_eq!(
            app.user_message(),
            "Prediction models are not installed. Check the models directory."
        );
    }

    #[test]
    fn test_width_error_message() {
        let err = ArtifactError::width("ridge_regression_model.json", "coef", 13, 12);
        assert_eq!(
            err.to_string(),
            "ridge_regression_model.json: coef has width 12, expected 13"
        );
        let app: AppError = err.into();
        assert!(matches!(app, AppError::Model(ModelError::Corrupt(_))));
    }
}
