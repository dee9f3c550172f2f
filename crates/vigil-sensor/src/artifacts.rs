//! Loading pre-fitted model artifacts from disk.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::{ArtifactError, Result};
use crate::forest::RandomForest;
use crate::scaler::StandardScaler;

/// The classifier and the scaler it was trained with.
#[derive(Debug, Clone)]
pub struct ModelArtifacts {
    pub classifier: RandomForest,
    pub scaler: StandardScaler,
}

impl ModelArtifacts {
    /// Load and validate both artifacts.
    ///
    /// Both files are checked for existence before either is parsed so a
    /// missing artifact is always reported as [`ArtifactError::NotFound`].
    pub fn load(classifier_path: impl AsRef<Path>, scaler_path: impl AsRef<Path>) -> Result<Self> {
        let classifier_path = classifier_path.as_ref();
        let scaler_path = scaler_path.as_ref();

        for path in [classifier_path, scaler_path] {
            if !path.exists() {
                return Err(ArtifactError::NotFound {
                    path: path.to_path_buf(),
                });
            }
        }

        let classifier: RandomForest = read_json(classifier_path)?;
        classifier.validate()?;
        let scaler: StandardScaler = read_json(scaler_path)?;
        scaler.validate()?;

        info!(
            trees = classifier.trees.len(),
            classifier = %classifier_path.display(),
            scaler = %scaler_path.display(),
            "sensor model loaded"
        );

        Ok(Self { classifier, scaler })
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
