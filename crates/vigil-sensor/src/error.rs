//! Model artifact errors

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating pre-fitted model artifacts.
///
/// All of these are fatal at startup: the decision loop never begins with a
/// missing or malformed model.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("model artifact not found: {}", path.display())]
    NotFound { path: PathBuf },

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

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ArtifactError>;
