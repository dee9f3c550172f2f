//! Environmental sensor signal.
//!
//! Sensor classification is slow relative to the video frame rate, so the
//! signal is sampled on a fixed cadence and its last label is held between
//! sampling points. Before the first sample the held label is
//! [`SensorLabel::Normal`], which keeps the fused decision defined from the
//! very first frame.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::capability::{Normalizer, SensorClassifier, SensorSampler};
use crate::error::{Capability, FusionError, Result};

/// One environmental reading, in fixed feature order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    pub motion: bool,
    /// Sound level in dB
    pub sound_level: f64,
    pub vibration: bool,
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Hour of day, 0-23
    pub hour: u8,
}

impl SensorSample {
    /// Feature names in the order produced by [`SensorSample::features`].
    pub const FEATURE_NAMES: [&'static str; 5] =
        ["motion", "sound_level", "vibration", "temperature", "hour"];

    pub const FEATURE_COUNT: usize = Self::FEATURE_NAMES.len();

    pub fn features(&self) -> [f64; Self::FEATURE_COUNT] {
        [
            f64::from(u8::from(self.motion)),
            self.sound_level,
            f64::from(u8::from(self.vibration)),
            self.temperature,
            f64::from(self.hour),
        ]
    }
}

/// Binary sensor classification. Serialized as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SensorLabel {
    #[default]
    Normal,
    Intrusion,
}

impl SensorLabel {
    pub fn is_alert(self) -> bool {
        self == SensorLabel::Intrusion
    }
}

impl From<SensorLabel> for u8 {
    fn from(label: SensorLabel) -> Self {
        match label {
            SensorLabel::Normal => 0,
            SensorLabel::Intrusion => 1,
        }
    }
}

impl TryFrom<u8> for SensorLabel {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(SensorLabel::Normal),
            1 => Ok(SensorLabel::Intrusion),
            other => Err(format!("sensor label must be 0 or 1, got {other}")),
        }
    }
}

impl fmt::Display for SensorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

/// Held sensor state, mutated only when a new sample is classified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorState {
    pub last_label: SensorLabel,
    pub last_sample: Option<SensorSample>,
    /// Frame index of the most recent sample
    pub sampled_at: Option<u64>,
}

/// Decides which frames trigger a new sensor sample.
pub trait SamplingPolicy {
    fn should_sample(&self, frame_index: u64) -> bool;
}

/// Sample on every frame whose index is a multiple of `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EveryNthFrame {
    period: u64,
}

impl EveryNthFrame {
    pub fn new(period: u64) -> Result<Self> {
        if period == 0 {
            return Err(FusionError::config("sensor cadence must be at least 1 frame"));
        }
        Ok(Self { period })
    }

    pub fn period(&self) -> u64 {
        self.period
    }
}

impl SamplingPolicy for EveryNthFrame {
    fn should_sample(&self, frame_index: u64) -> bool {
        frame_index % self.period == 0
    }
}

/// Cached, periodically refreshed sensor classification.
pub struct SensorSignal {
    sampler: Box<dyn SensorSampler + Send>,
    normalizer: Box<dyn Normalizer + Send>,
    classifier: Box<dyn SensorClassifier + Send>,
    state: SensorState,
}

impl SensorSignal {
    pub fn new(
        sampler: impl SensorSampler + Send + 'static,
        normalizer: impl Normalizer + Send + 'static,
        classifier: impl SensorClassifier + Send + 'static,
    ) -> Self {
        Self {
            sampler: Box::new(sampler),
            normalizer: Box::new(normalizer),
            classifier: Box::new(classifier),
            state: SensorState::default(),
        }
    }

    pub fn state(&self) -> &SensorState {
        &self.state
    }

    /// Refresh the held state if `cadence` selects this frame.
    ///
    /// On non-sampling frames this is a no-op. If any capability fails the
    /// held state is left untouched and the failure is returned.
    pub fn maybe_sample(
        &mut self,
        frame_index: u64,
        cadence: &dyn SamplingPolicy,
    ) -> Result<&SensorState> {
        if !cadence.should_sample(frame_index) {
            return Ok(&self.state);
        }

        let sample = self
            .sampler
            .draw_sample()
            .map_err(|e| FusionError::capability(Capability::Sampler, frame_index, e))?;
        let features = self
            .normalizer
            .normalize(&sample)
            .map_err(|e| FusionError::capability(Capability::Normalizer, frame_index, e))?;
        let label = self
            .classifier
            .classify(&features)
            .map_err(|e| FusionError::capability(Capability::Classifier, frame_index, e))?;

        debug!(
            frame_index,
            label = %label,
            sound_level = sample.sound_level,
            "sensor sampled"
        );

        self.state = SensorState {
            last_label: label,
            last_sample: Some(sample),
            sampled_at: Some(frame_index),
        };
        Ok(&self.state)
    }
}
