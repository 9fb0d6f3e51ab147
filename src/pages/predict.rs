//! Prediction page: feature entry and the three model estimates.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use weatherwave_core::{AppError, Config};
use weatherwave_predict::{
    FeatureInputs, InputView, MultiModelPredictor, PredictionResult, FEATURE_NAMES,
};

use crate::cli::Assignment;
use crate::render::{num, Table};

/// Loaded models, shared for the process lifetime
#[derive(Clone)]
pub struct PredictionContext {
    predictor: Arc<MultiModelPredictor>,
}

impl PredictionContext {
    /// Load every artifact from the configured models directory. Any failure
    /// is fatal for the page.
    pub fn load(config: &Config) -> Result<Self, AppError> {
        let predictor = MultiModelPredictor::load(&config.models.dir)?;
        Ok(Self::new(Arc::new(predictor)))
    }

    pub fn new(predictor: Arc<MultiModelPredictor>) -> Self {
        Self { predictor }
    }

    /// Apply the writes in order, then run every model on the result
    pub fn predict(&self, writes: &[(InputView, Assignment)]) -> Result<PredictionPage, AppError> {
        let mut inputs = FeatureInputs::new();
        for (view, assignment) in writes {
            let stored = inputs.set(&assignment.name, *view, assignment.value)?;
            if stored != assignment.value {
                tracing::info!(
                    "{} adjusted from {} to {}",
                    assignment.name,
                    assignment.value,
                    stored
                );
            }
        }

        let features = inputs.to_feature_vector()?;
        let result = self.predictor.predict(&features)?;
        Ok(PredictionPage { inputs, result })
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionPage {
    pub inputs: FeatureInputs,
    pub result: PredictionResult,
}

impl fmt::Display for PredictionPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut table = Table::new(["feature", "value", "set by"]);
        for name in FEATURE_NAMES {
            let (value, writer) = match self.inputs.cell(name) {
                Some(cell) => (Some(cell.value()), cell.last_writer()),
                None => (None, None),
            };
            let writer = match writer {
                Some(InputView::Number) => "number",
                Some(InputView::Slider) => "slider",
                None => "default",
            };
            table.row([name.to_string(), num(value, 2), writer.to_string()]);
        }
        writeln!(f, "{}", table)?;

        for prediction in self.result.predictions() {
            writeln!(f, "{} Predicted tmax: {:.2}", prediction.model, prediction.tmax)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use weatherwave_predict::models::{Activation, DenseLayer, LstmLayer, LstmNetwork, RidgeParams, TreeEnsemble};
    use weatherwave_predict::{LoadedModels, LstmArtifact, RidgeArtifact, Scaler, XgboostArtifact, FEATURE_COUNT};

    fn identity(width: usize) -> Scaler {
        Scaler::MinMax {
            scale: vec![1.0; width],
            min: vec![0.0; width],
        }
    }

    /// Constant models: LSTM 28, XGBoost 25, ridge 20 plus 0.1 per unit of tmin
    fn context() -> PredictionContext {
        let lstm = LstmArtifact {
            scaler_features: identity(FEATURE_COUNT),
            scaler_target: identity(1),
            network: LstmNetwork {
                lstm: LstmLayer {
                    units: 1,
                    kernel: vec![vec![0.0; 4]; FEATURE_COUNT],
                    recurrent_kernel: vec![vec![0.0; 4]],
                    bias: vec![0.0; 4],
                },
                dense: vec![DenseLayer {
                    weights: vec![vec![1.0]],
                    bias: vec![28.0],
                    activation: Activation::Linear,
                }],
            },
        };
        let xgboost = XgboostArtifact {
            scaler: None,
            model: TreeEnsemble {
                base_score: 25.0,
                trees: Vec::new(),
            },
        };
        let mut coef = vec![0.0; FEATURE_COUNT];
        coef[0] = 0.1;
        let ridge = RidgeArtifact {
            model: RidgeParams { coef, intercept: 20.0 },
            scaler: identity(FEATURE_COUNT),
        };

        let models = LoadedModels::from_artifacts(lstm, xgboost, ridge).unwrap();
        PredictionContext::new(Arc::new(MultiModelPredictor::new(models)))
    }

    fn write(view: InputView, name: &str, value: f64) -> (InputView, Assignment) {
        (
            view,
            Assignment {
                name: name.to_string(),
                value,
            },
        )
    }

    #[test]
    fn test_three_lines_in_model_order() {
        let page = context().predict(&[]).unwrap();
        let text = page.to_string();
        let lines: Vec<&str> = text.lines().rev().take(3).collect();
        // defaults are 30, so ridge gives 20 + 0.1 * 30
        assert_eq!(
            lines,
            vec![
                "Ridge Regression Predicted tmax: 23.00",
                "XGBoost Predicted tmax: 25.00",
                "LSTM Predicted tmax: 28.00",
            ]
        );
    }

    #[test]
    fn test_last_write_wins() {
        let page = context()
            .predict(&[
                write(InputView::Slider, "tmin", 40.4),
                write(InputView::Number, "tmin", 12.5),
            ])
            .unwrap();
        let cell = page.inputs.cell("tmin").unwrap();
        assert_eq!(cell.value(), 12.5);
        assert_eq!(cell.last_writer(), Some(InputView::Number));
        assert!(page.to_string().contains("Ridge Regression Predicted tmax: 21.25"));
    }

    #[test]
    fn test_unknown_feature_is_an_error() {
        let err = context()
            .predict(&[write(InputView::Number, "humidity", 3.0)])
            .unwrap_err();
        assert!(matches!(err, AppError::Model(_)));
    }
}
