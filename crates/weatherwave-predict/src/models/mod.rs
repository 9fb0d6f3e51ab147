//! The three next-day maximum temperature models.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PredictError;
use crate::features::FeatureVector;
use crate::scaler::{FeatureScaler, ScaledFeatureVector};

pub mod lstm;
pub mod ridge;
pub mod trees;

pub use lstm::{Activation, DenseLayer, LstmLayer, LstmModel, LstmNetwork};
pub use ridge::{RidgeModel, RidgeParams};
pub use trees::{Tree, TreeEnsemble, TreeModel, TreeNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelId {
    #[serde(rename = "LSTM")]
    Lstm,
    #[serde(rename = "XGBoost")]
    XgBoost,
    #[serde(rename = "Ridge Regression")]
    Ridge,
}

impl ModelId {
    pub const ALL: [ModelId; 3] = [ModelId::Lstm, ModelId::XgBoost, ModelId::Ridge];

    pub fn label(&self) -> &'static str {
        match self {
            ModelId::Lstm => "LSTM",
            ModelId::XgBoost => "XGBoost",
            ModelId::Ridge => "Ridge Regression",
        }
    }
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fitted regressor together with the feature transform it was trained on
pub trait TemperatureModel: Send + Sync {
    fn id(&self) -> ModelId;

    fn feature_scaler(&self) -> &FeatureScaler;

    /// Predict from a vector scaled by this model's own scaler
    fn predict_scaled(&self, input: &ScaledFeatureVector) -> Result<f64, PredictError>;

    fn predict(&self, features: &FeatureVector) -> Result<f64, PredictError> {
        self.predict_scaled(&self.feature_scaler().scale(features))
    }
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_and_serde_names_agree() {
        for id in ModelId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(json, format!("\"{}\"", id.label()));
        }
    }
}
