//! Gradient-boosted regression trees in the XGBoost flat-node layout.

use serde::{Deserialize, Serialize};

use crate::error::{ArtifactError, PredictError};
use crate::features::FEATURE_COUNT;
use crate::models::{ModelId, TemperatureModel};
use crate::scaler::{FeatureScaler, ScaledFeatureVector, Scaler};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        /// Taken when `x < threshold`
        yes: usize,
        no: usize,
        /// Taken when `x` is NaN; defaults to `yes`
        #[serde(default)]
        missing: Option<usize>,
    },
    Leaf {
        leaf: f64,
    },
}

/// One tree; node 0 is the root and children always follow their parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    fn validate(&self, artifact: &str, index: usize) -> Result<(), ArtifactError> {
        if self.nodes.is_empty() {
            return Err(ArtifactError::corrupt(artifact, format!("tree {} is empty", index)));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature,
                yes,
                no,
                missing,
                ..
            } = node
            {
                if *feature >= FEATURE_COUNT {
                    return Err(ArtifactError::corrupt(
                        artifact,
                        format!("tree {} node {} splits on feature {}", index, i, feature),
                    ));
                }
                let children = [Some(*yes), Some(*no), *missing];
                for child in children.into_iter().flatten() {
                    // Forward-only links guarantee evaluation terminates
                    if child <= i || child >= self.nodes.len() {
                        return Err(ArtifactError::corrupt(
                            artifact,
                            format!("tree {} node {} links to node {}", index, i, child),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Leaf value reached by `x`
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes.get(i) {
                Some(TreeNode::Leaf { leaf }) => return *leaf,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    yes,
                    no,
                    missing,
                }) => {
                    let value = x.get(*feature).copied().unwrap_or(f64::NAN);
                    i = if value.is_nan() {
                        missing.unwrap_or(*yes)
                    } else if value < *threshold {
                        *yes
                    } else {
                        *no
                    };
                }
                // unreachable after validation
                None => return 0.0,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub base_score: f64,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    pub fn validate(&self, artifact: &str) -> Result<(), ArtifactError> {
        if !self.base_score.is_finite() {
            return Err(ArtifactError::corrupt(artifact, "non-finite base_score"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(artifact, i)?;
        }
        Ok(())
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        self.base_score + self.trees.iter().map(|t| t.evaluate(x)).sum::<f64>()
    }
}

#[derive(Debug, Clone)]
pub struct TreeModel {
    scaler: FeatureScaler,
    ensemble: TreeEnsemble,
}

impl TreeModel {
    pub fn new(artifact: &str, ensemble: TreeEnsemble, scaler: Scaler) -> Result<Self, ArtifactError> {
        ensemble.validate(artifact)?;
        scaler.validate(artifact, "scaler", FEATURE_COUNT)?;
        Ok(Self {
            scaler: FeatureScaler::new(ModelId::XgBoost, scaler),
            ensemble,
        })
    }

    pub fn tree_count(&self) -> usize {
        self.ensemble.trees.len()
    }
}

impl TemperatureModel for TreeModel {
    fn id(&self) -> ModelId {
        ModelId::XgBoost
    }

    fn feature_scaler(&self) -> &FeatureScaler {
        &self.scaler
    }

    fn predict_scaled(&self, input: &ScaledFeatureVector) -> Result<f64, PredictError> {
        let x = input.values_for(self.id())?;
        Ok(self.ensemble.predict(x))
    }
}
