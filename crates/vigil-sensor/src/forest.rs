//! Random-forest sensor classifier.
//!
//! Trees use the flattened array layout exported from scikit-learn's
//! `tree_` attribute: node `i` is a leaf when `children_left[i] == -1`,
//! otherwise samples with `x[feature[i]] <= threshold[i]` go left. `value[i]`
//! holds the class distribution at the node.

use serde::{Deserialize, Serialize};
use vigil_core::{CapabilityError, CapabilityResult, SensorClassifier, SensorLabel, SensorSample};

use crate::error::{ArtifactError, Result};

const LEAF: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    pub value: Vec<Vec<f64>>,
}

impl DecisionTree {
    fn validate(&self, n_features: usize, n_classes: usize) -> std::result::Result<(), String> {
        let n = self.children_left.len();
        if n == 0 {
            return Err("tree has no nodes".to_string());
        }
        if self.children_right.len() != n
            || self.feature.len() != n
            || self.threshold.len() != n
            || self.value.len() != n
        {
            return Err("tree node arrays differ in length".to_string());
        }

        for i in 0..n {
            let (left, right) = (self.children_left[i], self.children_right[i]);
            if left == LEAF || right == LEAF {
                if left != right {
                    return Err(format!("node {i} has exactly one child"));
                }
                let dist = &self.value[i];
                if dist.len() != n_classes {
                    return Err(format!(
                        "leaf {i} has {} class weights, expected {n_classes}",
                        dist.len()
                    ));
                }
                if dist.iter().any(|w| !w.is_finite() || *w < 0.0) || dist.iter().sum::<f64>() <= 0.0 {
                    return Err(format!("leaf {i} has no usable class weights"));
                }
                continue;
            }

            // Children are stored after their parent, which rules out cycles
            for child in [left, right] {
                if child <= i as i64 || child >= n as i64 {
                    return Err(format!("node {i} points to invalid child {child}"));
                }
            }
            let feature = self.feature[i];
            if feature < 0 || feature as usize >= n_features {
                return Err(format!("node {i} splits on unknown feature {feature}"));
            }
            if self.threshold[i].is_nan() {
                return Err(format!("node {i} has a NaN threshold"));
            }
        }
        Ok(())
    }

    /// Normalized class distribution of the leaf `features` falls into.
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut node = 0usize;
        while self.children_left[node] != LEAF {
            let feature = self.feature[node] as usize;
            node = if features[feature] <= self.threshold[node] {
                self.children_left[node] as usize
            } else {
                self.children_right[node] as usize
            };
        }

        let dist = &self.value[node];
        let total: f64 = dist.iter().sum();
        dist.iter().map(|w| w / total).collect()
    }
}

fn default_classes() -> Vec<u8> {
    vec![0, 1]
}

/// Ensemble of decision trees voting by averaged class probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    pub n_features: usize,
    /// Class label for each column of the leaf distributions
    #[serde(default = "default_classes")]
    pub classes: Vec<u8>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    pub fn validate(&self) -> Result<()> {
        if self.n_features != SensorSample::FEATURE_COUNT {
            return Err(ArtifactError::Invalid(format!(
                "classifier expects {} features, sensor provides {}",
                self.n_features,
                SensorSample::FEATURE_COUNT
            )));
        }
        if self.classes.len() < 2 {
            return Err(ArtifactError::Invalid(
                "classifier needs at least two classes".to_string(),
            ));
        }
        if let Some(bad) = self.classes.iter().find(|c| SensorLabel::try_from(**c).is_err()) {
            return Err(ArtifactError::Invalid(format!(
                "classifier class {bad} is not a sensor label"
            )));
        }
        if self.trees.is_empty() {
            return Err(ArtifactError::Invalid("classifier has no trees".to_string()));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features, self.classes.len())
                .map_err(|reason| ArtifactError::Invalid(format!("tree {i}: {reason}")))?;
        }
        Ok(())
    }

    /// Mean class distribution across all trees.
    pub fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            for (acc, p) in proba.iter_mut().zip(tree.predict_proba(features)) {
                *acc += p;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }
}

impl SensorClassifier for RandomForest {
    fn classify(&self, features: &[f64]) -> CapabilityResult<SensorLabel> {
        if features.len() != self.n_features {
            return Err(CapabilityError::new(format!(
                "classifier expects {} features, got {}",
                self.n_features,
                features.len()
            )));
        }

        let proba = self.predict_proba(features);
        // First maximum wins ties, matching argmax
        let best = proba
            .iter()
            .enumerate()
            .fold(0, |best, (i, p)| if *p > proba[best] { i } else { best });

        SensorLabel::try_from(self.classes[best]).map_err(CapabilityError::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stump splitting on normalized sound level.
    fn stump(threshold: f64) -> DecisionTree {
        DecisionTree {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![1, -2, -2],
            threshold: vec![threshold, -2.0, -2.0],
            value: vec![vec![50.0, 50.0], vec![40.0, 2.0], vec![3.0, 30.0]],
        }
    }

    fn forest(thresholds: &[f64]) -> RandomForest {
        RandomForest {
            n_features: 5,
            classes: vec![0, 1],
            trees: thresholds.iter().map(|t| stump(*t)).collect(),
        }
    }

    #[test]
    fn test_single_tree_prediction() {
        let model = forest(&[0.5]);
        model.validate().unwrap();
        assert_eq!(
            model.classify(&[1.0, 2.0, 1.0, 0.0, 1.0]).unwrap(),
            SensorLabel::Intrusion
        );
        assert_eq!(
            model.classify(&[0.0, -1.0, 0.0, 0.0, 0.0]).unwrap(),
            SensorLabel::Normal
        );
        // Boundary goes left
        assert_eq!(
            model.classify(&[0.0, 0.5, 0.0, 0.0, 0.0]).unwrap(),
            SensorLabel::Normal
        );
    }

    #[test]
    fn test_forest_averages_trees() {
        // Two of three trees send 1.0 right (intrusion)
        let model = forest(&[0.0, 0.5, 2.0]);
        let proba = model.predict_proba(&[0.0, 1.0, 0.0, 0.0, 0.0]);
        let intrusion = (2.0 * (30.0 / 33.0) + 2.0 / 42.0) / 3.0;
        assert!((proba[1] - intrusion).abs() < 1e-9);
        assert_eq!(
            model.classify(&[0.0, 1.0, 0.0, 0.0, 0.0]).unwrap(),
            SensorLabel::Intrusion
        );
    }

    #[test]
    fn test_wrong_feature_count_is_capability_error() {
        assert!(forest(&[0.5]).classify(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_rejects_child_pointing_backwards() {
        let mut model = forest(&[0.5]);
        model.trees[0].children_right[0] = 0;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_rejects_unknown_feature() {
        let mut model = forest(&[0.5]);
        model.trees[0].feature[0] = 7;
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_forest() {
        assert!(forest(&[]).validate().is_err());
    }

    #[test]
    fn test_rejects_non_label_class() {
        let mut model = forest(&[0.5]);
        model.classes = vec![0, 2];
        assert!(model.validate().is_err());
    }
}
