//! Request-scoped feature entry state.
//!
//! Every feature has one value cell reachable through two views, a number box
//! and a slider. Both write the same cell, so whichever wrote last wins.

use serde::Serialize;

use crate::error::PredictError;
use crate::features::{feature_index, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};

pub const INPUT_MIN: f64 = 0.0;
pub const INPUT_MAX: f64 = 100.0;
pub const INPUT_STEP: f64 = 1.0;
pub const INPUT_DEFAULT: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputView {
    Number,
    Slider,
}

/// One feature's value plus which view last wrote it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SyncedValue {
    value: f64,
    last_writer: Option<InputView>,
}

impl Default for SyncedValue {
    fn default() -> Self {
        Self {
            value: INPUT_DEFAULT,
            last_writer: None,
        }
    }
}

impl SyncedValue {
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn last_writer(&self) -> Option<InputView> {
        self.last_writer
    }

    /// Write through a view. The value is clamped to the input range, and the
    /// slider additionally snaps to the step. Returns the stored value.
    pub fn write(&mut self, view: InputView, value: f64) -> f64 {
        let value = match view {
            InputView::Number => value,
            InputView::Slider => (value / INPUT_STEP).round() * INPUT_STEP,
        };
        self.value = value.clamp(INPUT_MIN, INPUT_MAX);
        self.last_writer = Some(view);
        self.value
    }
}

/// Input cells for all thirteen features
#[derive(Debug, Clone, Default, Serialize)]
pub struct FeatureInputs {
    cells: [SyncedValue; FEATURE_COUNT],
}

impl FeatureInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `value` to `name` through `view`
    pub fn set(&mut self, name: &str, view: InputView, value: f64) -> Result<f64, PredictError> {
        let index = feature_index(name).ok_or_else(|| PredictError::UnknownFeature(name.to_string()))?;
        if !value.is_finite() {
            return Err(PredictError::NonFinite {
                name: FEATURE_NAMES[index],
                value,
            });
        }

        let stored = self.cells[index].write(view, value);
        tracing::debug!("{} <- {} via {:?}", name, stored, view);
        Ok(stored)
    }

    pub fn cell(&self, name: &str) -> Option<&SyncedValue> {
        feature_index(name).map(|i| &self.cells[i])
    }

    pub fn to_feature_vector(&self) -> Result<FeatureVector, PredictError> {
        let mut values = [0.0; FEATURE_COUNT];
        for (slot, cell) in values.iter_mut().zip(&self.cells) {
            *slot = cell.value;
        }
        FeatureVector::new(values)
    }
}
