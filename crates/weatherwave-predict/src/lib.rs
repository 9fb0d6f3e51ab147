//! Next-day maximum temperature prediction for WeatherWave
//!
//! Three independently fitted models (an LSTM, gradient-boosted trees and a
//! ridge regression) read the same 13 daily features. Each model carries its
//! own feature scaler, loaded from JSON artifacts in the models directory.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod artifacts;
pub mod error;
pub mod features;
pub mod input;
pub mod models;
pub mod predictor;
pub mod scaler;

pub use artifacts::{
    LoadedModels, LstmArtifact, RidgeArtifact, XgboostArtifact, LSTM_ARTIFACT, RIDGE_ARTIFACT,
    XGBOOST_ARTIFACT,
};
pub use error::{ArtifactError, PredictError};
pub use features::{feature_index, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use input::{FeatureInputs, InputView, SyncedValue};
pub use models::{ModelId, TemperatureModel};
pub use predictor::{ModelPrediction, MultiModelPredictor, PredictionResult};
pub use scaler::{FeatureScaler, ScaledFeatureVector, Scaler};
