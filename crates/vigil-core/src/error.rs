//! Error types for the decision core.

use std::fmt;

use thiserror::Error;

/// The external collaborator a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    FrameSource,
    Detector,
    Sampler,
    Normalizer,
    Classifier,
    Sink,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::FrameSource => "frame source",
            Capability::Detector => "vision detector",
            Capability::Sampler => "sensor sampler",
            Capability::Normalizer => "sensor normalizer",
            Capability::Classifier => "sensor classifier",
            Capability::Sink => "frame sink",
        };
        f.write_str(name)
    }
}

/// Failure reported by an external capability implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct CapabilityError {
    message: String,
}

impl CapabilityError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wrap any error as a capability failure, keeping only its message.
    pub fn from_err(err: impl std::error::Error) -> Self {
        Self::new(err.to_string())
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Errors surfaced by the decision core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    /// Malformed zone or loop configuration. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An external capability call failed while processing a frame.
    #[error("{capability} failed at frame {frame_index}: {source}")]
    Capability {
        capability: Capability,
        frame_index: u64,
        #[source]
        source: CapabilityError,
    },
}

impl FusionError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn capability(capability: Capability, frame_index: u64, source: CapabilityError) -> Self {
        Self::Capability {
            capability,
            frame_index,
            source,
        }
    }

    /// The capability that failed, if this is a capability failure.
    pub fn failed_capability(&self) -> Option<Capability> {
        match self {
            Self::Capability { capability, .. } => Some(*capability),
            Self::Configuration(_) => None,
        }
    }
}

/// Result type alias using the core error.
pub type Result<T> = std::result::Result<T, FusionError>;
