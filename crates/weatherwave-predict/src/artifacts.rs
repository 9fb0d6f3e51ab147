//! Model artifact files in the models directory.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use crate::models::{LstmModel, LstmNetwork, RidgeModel, RidgeParams, TreeEnsemble, TreeModel};
use crate::scaler::Scaler;

pub const LSTM_ARTIFACT: &str = "lstm_model.json";
pub const XGBOOST_ARTIFACT: &str = "xgboost_model.json";
pub const RIDGE_ARTIFACT: &str = "ridge_regression_model.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmArtifact {
    pub scaler_features: Scaler,
    pub scaler_target: Scaler,
    pub network: LstmNetwork,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct XgboostArtifact {
    /// Absent in the legacy layout, where the trees were trained on the LSTM's
    /// feature scaling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<Scaler>,
    pub model: TreeEnsemble,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RidgeArtifact {
    pub model: RidgeParams,
    pub scaler: Scaler,
}

/// Read and parse one artifact
pub fn read_artifact<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<T, ArtifactError> {
    let path = dir.join(name);
    if !path.exists() {
        return Err(ArtifactError::Missing(path));
    }

    let content = std::fs::read_to_string(&path).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|e| ArtifactError::corrupt(name, e.to_string()))
}

/// Write one artifact as pretty JSON
pub fn write_artifact<T: Serialize>(dir: &Path, name: &str, artifact: &T) -> Result<PathBuf, ArtifactError> {
    let path = dir.join(name);
    let content =
        serde_json::to_string_pretty(artifact).map_err(|e| ArtifactError::corrupt(name, e.to_string()))?;
    std::fs::write(&path, content).map_err(|source| ArtifactError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// The three validated models, each bound to its own scaler
#[derive(Debug, Clone)]
pub struct LoadedModels {
    pub lstm: LstmModel,
    pub xgboost: TreeModel,
    pub ridge: RidgeModel,
}

impl LoadedModels {
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        tracing::info!("Loading model artifacts from {}", dir.display());
        let lstm: LstmArtifact = read_artifact(dir, LSTM_ARTIFACT)?;
        let xgboost: XgboostArtifact = read_artifact(dir, XGBOOST_ARTIFACT)?;
        let ridge: RidgeArtifact = read_artifact(dir, RIDGE_ARTIFACT)?;
        Self::from_artifacts(lstm, xgboost, ridge)
    }

    pub fn from_artifacts(
        lstm: LstmArtifact,
        xgboost: XgboostArtifact,
        ridge: RidgeArtifact,
    ) -> Result<Self, ArtifactError> {
        let xgboost_scaler = match xgboost.scaler {
            Some(scaler) => scaler,
            None => {
                tracing::warn!(
                    "{} has no scaler; using a copy of the LSTM feature scaler",
                    XGBOOST_ARTIFACT
                );
                lstm.scaler_features.clone()
            }
        };

        let lstm = LstmModel::new(
            LSTM_ARTIFACT,
            lstm.scaler_features,
            lstm.scaler_target,
            lstm.network,
        )?;
        let xgboost = TreeModel::new(XGBOOST_ARTIFACT, xgboost.model, xgboost_scaler)?;
        let ridge = RidgeModel::new(RIDGE_ARTIFACT, ridge.model, ridge.scaler)?;

        tracing::info!(
            "Loaded LSTM ({} units), XGBoost ({} trees), Ridge Regression",
            lstm.units(),
            xgboost.tree_count()
        );
        Ok(Self { lstm, xgboost, ridge })
    }
}
