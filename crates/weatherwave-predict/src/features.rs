//! The 13-feature input of the next-day temperature models.

use serde::Serialize;

use crate::error::PredictError;

pub const FEATURE_COUNT: usize = 13;

/// Column order the models were trained on. Scalers are positional.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "tmin",
    "tmean",
    "atmax",
    "atmin",
    "atmean",
    "sun_dur",
    "prec_sum",
    "prec_hrs",
    "wsmax",
    "wgmax",
    "wdirdom",
    "radsum",
    "evapotrans",
];

pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_NAMES.iter().position(|n| *n == name)
}

/// Thirteen finite values in training order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Result<Self, PredictError> {
        for (name, value) in FEATURE_NAMES.into_iter().zip(values) {
            if !value.is_finite() {
                return Err(PredictError::NonFinite { name, value });
            }
        }
        Ok(Self(values))
    }

    pub fn from_slice(values: &[f64]) -> Result<Self, PredictError> {
        let values: [f64; FEATURE_COUNT] =
            values.try_into().map_err(|_| PredictError::FeatureCount {
                expected: FEATURE_COUNT,
                got: values.len(),
            })?;
        Self::new(values)
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.0
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        feature_index(name).map(|i| self.0[i])
    }

    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_NAMES.iter().copied().zip(self.0.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_finite() {
        let mut values = [30.0; FEATURE_COUNT];
        values[6] = f64::NAN;
        match FeatureVector::new(values) {
            Err(PredictError::NonFinite { name, .. }) => assert_eq!(name, "prec_sum"),
            other => panic!("expected NonFinite, got {:?}", other),
        }

        values[6] = f64::INFINITY;
        assert!(FeatureVector::new(values).is_err());
    }

    #[test]
    fn test_from_slice_checks_width() {
        assert!(matches!(
            FeatureVector::from_slice(&[1.0; 12]),
            Err(PredictError::FeatureCount { expected: 13, got: 12 })
        ));
        let v = FeatureVector::from_slice(&[2.0; 13]).unwrap();
        assert_eq!(v.get("evapotrans"), Some(2.0));
        assert_eq!(v.get("tmax"), None);
    }

    #[test]
    fn test_named_preserves_order() {
        let mut values = [0.0; FEATURE_COUNT];
        for (i, v) in values.iter_mut().enumerate() {
            *v = i as f64;
        }
        let v = FeatureVector::new(values).unwrap();
        let names: Vec<&str> = v.named().map(|(n, _)| n).collect();
        assert_eq!(names, FEATURE_NAMES);
        assert_eq!(v.get("wdirdom"), Some(10.0));
    }
}
