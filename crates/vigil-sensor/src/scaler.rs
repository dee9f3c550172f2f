//! Standard-score feature scaling with parameters fitted at training time.

use serde::{Deserialize, Serialize};
use vigil_core::{CapabilityError, CapabilityResult, Normalizer, SensorSample};

use crate::error::{ArtifactError, Result};

const FEATURES: usize = SensorSample::FEATURE_COUNT;

/// `(x - mean) / scale` per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    #[serde(alias = "mean_")]
    pub mean: Vec<f64>,
    #[serde(alias = "scale_")]
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Result<Self> {
        let scaler = Self { mean, scale };
        scaler.validate()?;
        Ok(scaler)
    }

    /// Check the fitted parameters match the sensor feature layout.
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != FEATURES || self.scale.len() != FEATURES {
            return Err(ArtifactError::Invalid(format!(
                "scaler expects {FEATURES} features, got mean={} scale={}",
                self.mean.len(),
                self.scale.len()
            )));
        }
        if let Some(i) = self.mean.iter().position(|m| !m.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "scaler mean for {} is not finite",
                SensorSample::FEATURE_NAMES[i]
            )));
        }
        if let Some(i) = self.scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(ArtifactError::Invalid(format!(
                "scaler scale for {} must be finite and non-zero",
                SensorSample::FEATURE_NAMES[i]
            )));
        }
        Ok(())
    }

    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect()
    }
}

impl Normalizer for StandardScaler {
    fn normalize(&self, sample: &SensorSample) -> CapabilityResult<Vec<f64>> {
        if sample.hour > 23 {
            return Err(CapabilityError::new(format!(
                "sensor reading hour must be 0-23, got {}",
                sample.hour
            )));
        }
        let features = sample.features();
        if let Some(i) = features.iter().position(|v| !v.is_finite()) {
            return Err(CapabilityError::new(format!(
                "sensor reading {} is not finite",
                SensorSample::FEATURE_NAMES[i]
            )));
        }
        Ok(self.transform(&features))
    }
}
