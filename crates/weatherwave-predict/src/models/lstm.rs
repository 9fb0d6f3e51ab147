//! Single-layer LSTM followed by dense layers, evaluated from exported Keras
//! weights.
//!
//! Weight layout follows Keras: `kernel` is `[inputs][4 * units]`,
//! `recurrent_kernel` is `[units][4 * units]`, `bias` is `[4 * units]`, and the
//! gate blocks are ordered input, forget, cell, output.

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, PredictError};
use crate::features::FEATURE_COUNT;
use crate::models::{dot, ModelId, TemperatureModel};
use crate::scaler::{FeatureScaler, ScaledFeatureVector, Scaler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Sigmoid,
    Tanh,
}

impl Activation {
    pub fn apply(&self, x: f64) -> f64 {
        match self {
            Activation::Linear => x,
            Activation::Relu => x.max(0.0),
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
        }
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn check_matrix(
    artifact: &str,
    what: &str,
    matrix: &[Vec<f64>],
    rows: usize,
    cols: usize,
) -> Result<(), ArtifactError> {
    if matrix.len() != rows {
        return Err(ArtifactError::width(artifact, format!("{} rows", what), rows, matrix.len()));
    }
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != cols {
            return Err(ArtifactError::width(artifact, format!("{} row {}", what, i), cols, row.len()));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmLayer {
    pub units: usize,
    pub kernel: Vec<Vec<f64>>,
    pub recurrent_kernel: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
}

impl LstmLayer {
    fn validate(&self, artifact: &str, inputs: usize) -> Result<(), ArtifactError> {
        if self.units == 0 {
            return Err(ArtifactError::corrupt(artifact, "lstm has zero units"));
        }
        let gates = 4 * self.units;
        check_matrix(artifact, "lstm.kernel", &self.kernel, inputs, gates)?;
        check_matrix(artifact, "lstm.recurrent_kernel", &self.recurrent_kernel, self.units, gates)?;
        if self.bias.len() != gates {
            return Err(ArtifactError::width(artifact, "lstm.bias", gates, self.bias.len()));
        }
        Ok(())
    }

    /// One timestep. Updates `h` and `c` in place.
    fn step(&self, x: &[f64], h: &mut [f64], c: &mut [f64]) {
        let u = self.units;
        let mut z = self.bias.clone();
        for (xi, row) in x.iter().zip(&self.kernel) {
            for (zj, w) in z.iter_mut().zip(row) {
                *zj += xi * w;
            }
        }
        for (hi, row) in h.iter().zip(&self.recurrent_kernel) {
            for (zj, w) in z.iter_mut().zip(row) {
                *zj += hi * w;
            }
        }

        for k in 0..u {
            let i = sigmoid(z[k]);
            let f = sigmoid(z[u + k]);
            let g = z[2 * u + k].tanh();
            let o = sigmoid(z[3 * u + k]);
            c[k] = f * c[k] + i * g;
            h[k] = o * c[k].tanh();
        }
    }

    /// Final hidden state after running the whole sequence from zero state
    pub fn run(&self, sequence: &[&[f64]]) -> Vec<f64> {
        let mut h = vec![0.0; self.units];
        let mut c = vec![0.0; self.units];
        for x in sequence {
            self.step(x, &mut h, &mut c);
        }
        h
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    /// `[inputs][outputs]`
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    fn forward(&self, x: &[f64]) -> Vec<f64> {
        self.bias
            .iter()
            .enumerate()
            .map(|(j, b)| {
                let column: Vec<f64> = self.weights.iter().map(|row| row[j]).collect();
                self.activation.apply(dot(x, &column) + b)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LstmNetwork {
    pub lstm: LstmLayer,
    pub dense: Vec<DenseLayer>,
}

impl LstmNetwork {
    /// Check every weight shape for `inputs` features and a single output
    pub fn validate(&self, artifact: &str, inputs: usize) -> Result<(), ArtifactError> {
        self.lstm.validate(artifact, inputs)?;
        if self.dense.is_empty() {
            return Err(ArtifactError::corrupt(artifact, "network has no dense output layer"));
        }

        let mut width = self.lstm.units;
        for (i, layer) in self.dense.iter().enumerate() {
            let outputs = layer.bias.len();
            check_matrix(artifact, &format!("dense[{}].weights", i), &layer.weights, width, outputs)?;
            width = outputs;
        }
        if width != 1 {
            return Err(ArtifactError::width(artifact, "network output", 1, width));
        }
        Ok(())
    }

    pub fn forward(&self, sequence: &[&[f64]]) -> Vec<f64> {
        let mut x = self.lstm.run(sequence);
        for layer in &self.dense {
            x = layer.forward(&x);
        }
        x
    }
}

/// LSTM with its feature scaler and the target scaler that maps outputs back
/// to degrees
#[derive(Debug, Clone)]
pub struct LstmModel {
    features: FeatureScaler,
    target: Scaler,
    network: LstmNetwork,
}

impl LstmModel {
    pub fn new(
        artifact: &str,
        scaler_features: Scaler,
        scaler_target: Scaler,
        network: LstmNetwork,
    ) -> Result<Self, ArtifactError> {
        scaler_features.validate(artifact, "scaler_features", FEATURE_COUNT)?;
        scaler_target.validate(artifact, "scaler_target", 1)?;
        network.validate(artifact, FEATURE_COUNT)?;
        Ok(Self {
            features: FeatureScaler::new(ModelId::Lstm, scaler_features),
            target: scaler_target,
            network,
        })
    }

    pub fn target_scaler(&self) -> &Scaler {
        &self.target
    }

    pub fn units(&self) -> usize {
        self.network.lstm.units
    }
}

impl TemperatureModel for LstmModel {
    fn id(&self) -> ModelId {
        ModelId::Lstm
    }

    fn feature_scaler(&self) -> &FeatureScaler {
        &self.features
    }

    fn predict_scaled(&self, input: &ScaledFeatureVector) -> Result<f64, PredictError> {
        let x = input.values_for(self.id())?;
        // One sample, one timestep
        let mut output = self.network.forward(&[x.as_slice()]);
        self.target.inverse_transform_in_place(&mut output);
        Ok(output.first().copied().unwrap_or(f64::NAN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureVector;

    /// One unit whose gates are all driven by feature 0
    fn tiny_network(dense_weight: f64) -> LstmNetwork {
        let mut kernel = vec![vec![0.0; 4]; FEATURE_COUNT];
        kernel[0] = vec![1.0, 1.0, 1.0, 1.0];
        LstmNetwork {
            lstm: LstmLayer {
                units: 1,
                kernel,
                recurrent_kernel: vec![vec![0.0; 4]],
                bias: vec![0.0; 4],
            },
            dense: vec![DenseLayer {
                weights: vec![vec![dense_weight]],
                bias: vec![0.0],
                activation: Activation::Linear,
            }],
        }
    }

    fn identity(width: usize) -> Scaler {
        Scaler::MinMax {
            scale: vec![1.0; width],
            min: vec![0.0; width],
        }
    }

    #[test]
    fn test_single_step_matches_hand_computation() {
        let network = tiny_network(1.0);
        let mut x = [0.0; FEATURE_COUNT];
        x[0] = 1.0;

        // c = sigmoid(1) * tanh(1); h = sigmoid(1) * tanh(c)
        let s = sigmoid(1.0);
        let expected = s * (s * 1.0_f64.tanh()).tanh();
        let out = network.forward(&[x.as_slice()]);
        assert_eq!(out.len(), 1);
        assert!((out[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_zero_input_gives_zero_state() {
        let network = tiny_network(5.0);
        let x = [0.0; FEATURE_COUNT];
        // i = f = o = 0.5, g = 0 -> c = 0 -> h = 0
        assert_eq!(network.forward(&[x.as_slice()]), vec![0.0]);
    }

    #[test]
    fn test_target_scaler_applied() {
        let target = Scaler::MinMax {
            scale: vec![0.1],
            min: vec![-2.0],
        };
        let model = LstmModel::new("lstm", identity(FEATURE_COUNT), target, tiny_network(1.0)).unwrap();
        let features = FeatureVector::new([0.0; FEATURE_COUNT]).unwrap();
        // network output 0 -> (0 - (-2)) / 0.1 = 20
        let prediction = model.predict(&features).unwrap();
        assert!((prediction - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_shape_validation() {
        let mut network = tiny_network(1.0);
        network.lstm.kernel.pop();
        assert!(matches!(
            network.validate("lstm_model.json", FEATURE_COUNT),
            Err(ArtifactError::Width { expected: 13, got: 12, .. })
        ));

        let mut network = tiny_network(1.0);
        network.dense[0].weights = vec![vec![1.0, 1.0]];
        network.dense[0].bias = vec![0.0, 0.0];
        assert!(matches!(
            network.validate("lstm_model.json", FEATURE_COUNT),
            Err(ArtifactError::Width { expected: 1, got: 2, .. })
        ));

        let bad_target = identity(2);
        assert!(LstmModel::new("lstm", identity(FEATURE_COUNT), bad_target, tiny_network(1.0)).is_err());
    }
}
