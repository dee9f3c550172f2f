//! Host error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("sensor model: {0}")]
    Artifact(#[from] vigil_sensor::ArtifactError),

    #[error("detector: {0}")]
    Engine(#[from] vigil_vision::EngineError),

    #[error(transparent)]
    Fusion(#[from] vigil_core::FusionError),

    #[error("frame source: {0}")]
    Source(String),

    #[error("decision loop task failed: {0}")]
    Task(String),
}

impl MonitorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
