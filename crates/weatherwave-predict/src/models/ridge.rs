use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, PredictError};
use crate::features::FEATURE_COUNT;
use crate::models::{dot, ModelId, TemperatureModel};
use crate::scaler::{FeatureScaler, ScaledFeatureVector, Scaler};

/// Linear model coefficients (sklearn `Ridge`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RidgeParams {
    pub coef: Vec<f64>,
    pub intercept: f64,
}

impl RidgeParams {
    pub fn validate(&self, artifact: &str) -> Result<(), ArtifactError> {
        if self.coef.len() != FEATURE_COUNT {
            return Err(ArtifactError::width(artifact, "coef", FEATURE_COUNT, self.coef.len()));
        }
        if !self.intercept.is_finite() || self.coef.iter().any(|c| !c.is_finite()) {
            return Err(ArtifactError::corrupt(artifact, "non-finite coefficients"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct RidgeModel {
    scaler: FeatureScaler,
    params: RidgeParams,
}

impl RidgeModel {
    pub fn new(artifact: &str, params: RidgeParams, scaler: Scaler) -> Result<Self, ArtifactError> {
        params.validate(artifact)?;
        scaler.validate(artifact, "scaler", FEATURE_COUNT)?;
        Ok(Self {
            scaler: FeatureScaler::new(ModelId::Ridge, scaler),
            params,
        })
    }
}

impl TemperatureModel for RidgeModel {
    fn id(&self) -> ModelId {
        ModelId::Ridge
    }

    fn feature_scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    fn predict_scaled(&self, input: &ScaledFeatureVector) -> Result<f64, PredictError> {
        let x = input.values_for(self.id())?;
        Ok(dot(&self.params.coef, x) + self.params.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    fn identity() -> Scaler {
        Scaler::Standard {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; FEATURE_COUNT],
        }
    }

    #[test]
    fn test_linear_prediction() {
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[0] = 0.5;
        coef[1] = 0.25;
        let model = RidgeModel::new("ridge", RidgeParams { coef, intercept: 3.0 }, identity()).unwrap();

        let mut values = [0.0; FEATURE_COUNT];
        values[0] = 20.0;
        values[1] = 8.0;
        let features = FeatureVector::new(values).unwrap();
        assert_eq!(model.predict(&features).unwrap(), 15.0);
    }

    #[test]
    fn test_coef_width_checked() {
        let params = RidgeParams {
            coef: vec![1.0; 4],
            intercept: 0.0,
        };
        assert!(matches!(
            RidgeModel::new("ridge", params, identity()),
            Err(ArtifactError::Width { expected: 13, got: 4, .. })
        ));
    }
}
