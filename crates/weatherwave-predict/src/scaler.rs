//! Fitted affine feature transforms (sklearn MinMaxScaler / StandardScaler).

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, PredictError};
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::models::ModelId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    /// `x * scale + min`
    MinMax { scale: Vec<f64>, min: Vec<f64> },
    /// `(x - mean) / scale`
    Standard { mean: Vec<f64>, scale: Vec<f64> },
}

impl Scaler {
    pub fn width(&self) -> usize {
        match self {
            Scaler::MinMax { scale, .. } | Scaler::Standard { scale, .. } => scale.len(),
        }
    }

    /// Check shape and parameters against the expected column count
    pub fn validate(&self, artifact: &str, what: &str, expected: usize) -> Result<(), ArtifactError> {
        let (scale, offset, offset_name) = match self {
            Scaler::MinMax { scale, min } => (scale, min, "min"),
            Scaler::Standard { mean, scale } => (scale, mean, "mean"),
        };
        if scale.len() != expected {
            return Err(ArtifactError::width(artifact, format!("{}.scale", what), expected, scale.len()));
        }
        if offset.len() != expected {
            return Err(ArtifactError::width(
                artifact,
                format!("{}.{}", what, offset_name),
                expected,
                offset.len(),
            ));
        }
        if scale.iter().chain(offset).any(|v| !v.is_finite()) {
            return Err(ArtifactError::corrupt(artifact, format!("{} has non-finite parameters", what)));
        }
        if scale.iter().any(|s| *s == 0.0) {
            return Err(ArtifactError::corrupt(artifact, format!("{} has a zero scale", what)));
        }
        Ok(())
    }

    pub fn transform_in_place(&self, values: &mut [f64]) {
        match self {
            Scaler::MinMax { scale, min } => {
                for ((x, s), m) in values.iter_mut().zip(scale).zip(min) {
                    *x = *x * s + m;
                }
            }
            Scaler::Standard { mean, scale } => {
                for ((x, m), s) in values.iter_mut().zip(mean).zip(scale) {
                    *x = (*x - m) / s;
                }
            }
        }
    }

    pub fn inverse_transform_in_place(&self, values: &mut [f64]) {
        match self {
            Scaler::MinMax { scale, min } => {
                for ((x, s), m) in values.iter_mut().zip(scale).zip(min) {
                    *x = (*x - m) / s;
                }
            }
            Scaler::Standard { mean, scale } => {
                for ((x, m), s) in values.iter_mut().zip(mean).zip(scale) {
                    *x = *x * s + m;
                }
            }
        }
    }

    pub fn transform(&self, values: &[f64]) -> Vec<f64> {
        let mut out = values.to_vec();
        self.transform_in_place(&mut out);
        out
    }

    pub fn inverse_transform(&self, values: &[f64]) -> Vec<f64> {
        let mut out = values.to_vec();
        self.inverse_transform_in_place(&mut out);
        out
    }
}

/// A feature vector after a specific model's transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaledFeatureVector {
    owner: ModelId,
    values: [f64; FEATURE_COUNT],
}

impl ScaledFeatureVector {
    pub fn owner(&self) -> ModelId {
        self.owner
    }

    /// Values, if this vector was scaled for `model`
    pub fn values_for(&self, model: ModelId) -> Result<&[f64; FEATURE_COUNT], PredictError> {
        if self.owner != model {
            return Err(PredictError::WrongModel {
                expected: model,
                actual: self.owner,
            });
        }
        Ok(&self.values)
    }
}

/// A scaler bound to the one model allowed to consume its output
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    owner: ModelId,
    scaler: Scaler,
}

impl FeatureScaler {
    /// The scaler must already be validated for [`FEATURE_COUNT`] columns
    pub fn new(owner: ModelId, scaler: Scaler) -> Self {
        Self { owner, scaler }
    }

    pub fn owner(&self) -> ModelId {
        self.owner
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn scale(&self, features: &FeatureVector) -> ScaledFeatureVector {
        let mut values = *features.values();
        self.scaler.transform_in_place(&mut values);
        ScaledFeatureVector {
            owner: self.owner,
            values,
        }
    }
}
