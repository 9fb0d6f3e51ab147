//! Runs all three models on one feature vector.

use std::path::Path;

use serde::Serialize;

use crate::artifacts::LoadedModels;
use crate::error::{ArtifactError, PredictError};
use crate::features::FeatureVector;
use crate::models::{ModelId, TemperatureModel};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelPrediction {
    pub model: ModelId,
    /// Predicted next-day maximum temperature
    pub tmax: f64,
}

/// One estimate per model, in LSTM, XGBoost, Ridge Regression order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    predictions: [ModelPrediction; 3],
}

impl PredictionResult {
    pub fn predictions(&self) -> &[ModelPrediction] {
        &self.predictions
    }

    pub fn get(&self, model: ModelId) -> Option<f64> {
        self.predictions
            .iter()
            .find(|p| p.model == model)
            .map(|p| p.tmax)
    }
}

/// Immutable set of loaded models, shared for the process lifetime
#[derive(Debug, Clone)]
pub struct MultiModelPredictor {
    models: LoadedModels,
}

impl MultiModelPredictor {
    /// Load every artifact from `dir`. Any missing or invalid artifact fails.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        Ok(Self::new(LoadedModels::load(dir)?))
    }

    pub fn new(models: LoadedModels) -> Self {
        Self { models }
    }

    fn ordered(&self) -> [&dyn TemperatureModel; 3] {
        [&self.models.lstm, &self.models.xgboost, &self.models.ridge]
    }

    /// Each model scales the input with its own scaler. No fallbacks: the first
    /// failure is returned.
    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PredictError> {
        let [lstm, xgboost, ridge] = self.ordered();
        let run = |model: &dyn TemperatureModel| -> Result<ModelPrediction, PredictError> {
            let tmax = model.predict(features)?;
            tracing::debug!("{} predicted tmax {:.2}", model.id(), tmax);
            Ok(ModelPrediction {
                model: model.id(),
                tmax,
            })
        };

        Ok(PredictionResult {
            predictions: [run(lstm)?, run(xgboost)?, run(ridge)?],
        })
    }
}
