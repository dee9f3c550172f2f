//! Monitor configuration
//!
//! Loaded from an optional JSON file; every field has a default so a config
//! file only needs the values it changes. Command-line flags are applied on
//! top (see [`crate::cli`]).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vigil_core::{EveryNthFrame, FailurePolicy, ZoneDefinition};

use crate::error::{MonitorError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Directory of sequentially named frame images
    #[serde(default = "default_frames_dir")]
    pub frames_dir: PathBuf,
    /// Nominal frame rate used to timestamp frames
    #[serde(default = "default_fps")]
    pub fps: f64,
    /// Frames decoded ahead of the decision loop
    #[serde(default = "default_prefetch")]
    pub prefetch: usize,
    #[serde(default)]
    pub detector: DetectorConfig,
    /// Detector category treated as an intruder
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
    #[serde(default)]
    pub zone: ZoneDefinition,
    /// Frames between sensor samples
    #[serde(default = "default_cadence")]
    pub cadence: u64,
    #[serde(default)]
    pub sensor: SensorConfig,
    /// JSON-lines event log; `None` disables recording
    #[serde(default = "default_events_path")]
    pub events_path: Option<PathBuf>,
    #[serde(default = "default_failure_policy")]
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Label file (newline-separated or JSON array); COCO labels if absent
    #[serde(default)]
    pub labels_path: Option<PathBuf>,
    #[serde(default = "default_min_confidence")]
    pub confidence_threshold: f32,
    #[serde(default = "default_nms")]
    pub nms_threshold: f32,
    #[serde(default = "default_input_size")]
    pub input_width: u32,
    #[serde(default = "default_input_size")]
    pub input_height: u32,
    #[serde(default)]
    pub num_threads: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfig {
    #[serde(default = "default_sensor_model")]
    pub model_path: PathBuf,
    #[serde(default = "default_sensor_scaler")]
    pub scaler_path: PathBuf,
    /// Seed for the simulated feed; entropy if absent
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_intrusion_rate")]
    pub intrusion_rate: f64,
}

fn default_frames_dir() -> PathBuf {
    PathBuf::from("data/frames")
}
fn default_fps() -> f64 {
    30.0
}
fn default_prefetch() -> usize {
    2
}
fn default_category() -> String {
    vigil_core::vision::DEFAULT_CATEGORY.to_string()
}
fn default_min_confidence() -> f32 {
    vigil_core::vision::DEFAULT_MIN_CONFIDENCE
}
fn default_cadence() -> u64 {
    30
}
fn default_events_path() -> Option<PathBuf> {
    Some(PathBuf::from("results/events/fusion_events.jsonl"))
}
fn default_failure_policy() -> FailurePolicy {
    FailurePolicy::SkipFrame
}
fn default_model_path() -> PathBuf {
    PathBuf::from("yolov8n.onnx")
}
fn default_nms() -> f32 {
    0.45
}
fn default_input_size() -> u32 {
    640
}
fn default_sensor_model() -> PathBuf {
    PathBuf::from("data/iot/model_iot.json")
}
fn default_sensor_scaler() -> PathBuf {
    PathBuf::from("data/iot/scaler.json")
}
fn default_intrusion_rate() -> f64 {
    vigil_sensor::sampler::DEFAULT_INTRUSION_RATE
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            frames_dir: default_frames_dir(),
            fps: default_fps(),
            prefetch: default_prefetch(),
            detector: DetectorConfig::default(),
            category: default_category(),
            min_confidence: default_min_confidence(),
            zone: ZoneDefinition::default(),
            cadence: default_cadence(),
            sensor: SensorConfig::default(),
            events_path: default_events_path(),
            failure_policy: default_failure_policy(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            labels_path: None,
            confidence_threshold: default_min_confidence(),
            nms_threshold: default_nms(),
            input_width: default_input_size(),
            input_height: default_input_size(),
            num_threads: 0,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            model_path: default_sensor_model(),
            scaler_path: default_sensor_scaler(),
            seed: None,
            intrusion_rate: default_intrusion_rate(),
        }
    }
}

impl MonitorConfig {
    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| MonitorError::io(path, e))?;
        serde_json::from_str(&text).map_err(|source| MonitorError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Reject values that can never produce a working loop.
    pub fn validate(&self) -> Result<()> {
        EveryNthFrame::new(self.cadence)?;

        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(MonitorError::Config(format!("fps must be positive, got {}", self.fps)));
        }
        if self.prefetch == 0 {
            return Err(MonitorError::Config("prefetch must be at least 1".to_string()));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(MonitorError::Config(format!(
                "min_confidence must be between 0.0 and 1.0, got {}",
                self.min_confidence
            )));
        }
        if self.category.trim().is_empty() {
            return Err(MonitorError::Config("category must not be empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.sensor.intrusion_rate) {
            return Err(MonitorError::Config(format!(
                "sensor.intrusion_rate must be between 0.0 and 1.0, got {}",
                self.sensor.intrusion_rate
            )));
        }
        Ok(())
    }
}
