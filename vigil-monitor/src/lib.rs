//! Vigil Monitor
//!
//! Host for the decision core: plays back a directory of frames through the
//! detector, samples the simulated sensor feed on a cadence, fuses both into
//! one alert per frame and records the decisions as JSON lines.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod recorder;
pub mod shutdown;
pub mod source;

pub use app::Monitor;
pub use cli::Args;
pub use config::{DetectorConfig, MonitorConfig, SensorConfig};
pub use error::{MonitorError, Result};
pub use recorder::{EventRecord, EventRecorder};
pub use shutdown::shutdown_signal;
pub use source::{ImageSequenceSource, PrefetchSource, Primed};
