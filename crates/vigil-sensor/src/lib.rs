//! Vigil sensor capabilities
//!
//! Concrete implementations of the sensor-side capabilities consumed by
//! `vigil-core`:
//!
//! - [`StandardScaler`]: the feature normalization fitted at training time
//! - [`RandomForest`]: the trained classifier, exported as JSON
//! - [`SimulatedSampler`]: a synthetic sensor feed for demos and tests
//!
//! Model artifacts are loaded once at startup with [`ModelArtifacts::load`];
//! a missing or malformed file stops startup before any frame is processed.

pub mod artifacts;
pub mod error;
pub mod forest;
pub mod sampler;
pub mod scaler;

pub use artifacts::ModelArtifacts;
pub use error::{ArtifactError, Result};
pub use forest::{DecisionTree, RandomForest};
pub use sampler::SimulatedSampler;
pub use scaler::StandardScaler;
