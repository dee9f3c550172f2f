//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use vigil_core::FailurePolicy;

use crate::config::MonitorConfig;

#[derive(Parser, Debug)]
#[command(name = "vigil-monitor")]
#[command(about = "Perimeter monitor fusing zone intrusion detection with sensor classification")]
#[command(version)]
pub struct Args {
    /// JSON config file; flags below override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory of frame images, processed in name order
    #[arg(short, long)]
    pub frames: Option<PathBuf>,

    /// ONNX detector model
    #[arg(short, long)]
    pub model: Option<PathBuf>,

    /// Detector class labels (newline-separated or JSON array)
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Sensor classifier (random forest JSON)
    #[arg(long)]
    pub sensor_model: Option<PathBuf>,

    /// Sensor feature scaler JSON
    #[arg(long)]
    pub sensor_scaler: Option<PathBuf>,

    /// Frames between sensor samples
    #[arg(long)]
    pub cadence: Option<u64>,

    /// Event log output (JSON lines)
    #[arg(short, long)]
    pub events: Option<PathBuf>,

    /// Do not write an event log
    #[arg(long, conflicts_with = "events")]
    pub no_events: bool,

    /// Seed for the simulated sensor feed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Stop on the first detector or sensor failure instead of skipping the frame
    #[arg(long)]
    pub fail_fast: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Apply flag overrides to a loaded config.
    pub fn apply(&self, config: &mut MonitorConfig) {
        if let Some(frames) = &self.frames {
            config.frames_dir = frames.clone();
        }
        if let Some(model) = &self.model {
            config.detector.model_path = model.clone();
        }
        if let Some(labels) = &self.labels {
            config.detector.labels_path = Some(labels.clone());
        }
        if let Some(path) = &self.sensor_model {
            config.sensor.model_path = path.clone();
        }
        if let Some(path) = &self.sensor_scaler {
            config.sensor.scaler_path = path.clone();
        }
        if let Some(cadence) = self.cadence {
            config.cadence = cadence;
        }
        if let Some(events) = &self.events {
            config.events_path = Some(events.clone());
        }
        if self.no_events {
            config.events_path = None;
        }
        if let Some(seed) = self.seed {
            config.sensor.seed = Some(seed);
        }
        if self.fail_fast {
            config.failure_policy = FailurePolicy::Propagate;
        }
    }
}
