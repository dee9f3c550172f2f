//! External collaborators consumed by the decision loop.
//!
//! Implementations live outside this crate (ONNX detector, pre-fitted sensor
//! models, host frame sources). Each call either returns a value or a
//! [`CapabilityError`]; retries and timeouts are the implementor's business.

use crate::controller::FrameReport;
use crate::error::CapabilityError;
use crate::frame::Frame;
use crate::detection::Detection;
use crate::sensor::{SensorLabel, SensorSample};

/// Result type for capability calls.
pub type CapabilityResult<T> = std::result::Result<T, CapabilityError>;

/// Sequential frame supply.
pub trait FrameSource {
    /// Next frame in arrival order, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> CapabilityResult<Option<Frame>>;
}

/// Stateless object detector.
pub trait Detector {
    /// Detections of `category` scoring at least `min_confidence`.
    fn detect(
        &self,
        frame: &Frame,
        category: &str,
        min_confidence: f32,
    ) -> CapabilityResult<Vec<Detection>>;
}

/// Source of environmental sensor readings. Cadence is decided by the caller.
pub trait SensorSampler {
    fn draw_sample(&mut self) -> CapabilityResult<SensorSample>;
}

/// Pre-fitted feature transform applied before classification.
pub trait Normalizer {
    fn normalize(&self, sample: &SensorSample) -> CapabilityResult<Vec<f64>>;
}

/// Pre-trained sensor classifier operating on normalized features.
pub trait SensorClassifier {
    fn classify(&self, features: &[f64]) -> CapabilityResult<SensorLabel>;
}

/// Consumer of the per-frame decision (rendering, recording).
pub trait FrameSink {
    fn emit(&mut self, frame: &Frame, report: &FrameReport) -> CapabilityResult<()>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn next_frame(&mut self) -> CapabilityResult<Option<Frame>> {
        (**self).next_frame()
    }
}

impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    fn emit(&mut self, frame: &Frame, report: &FrameReport) -> CapabilityResult<()> {
        (**self).emit(frame, report)
    }
}

/// Sink that drops every report. Useful when only the run summary matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn emit(&mut self, _frame: &Frame, _report: &FrameReport) -> CapabilityResult<()> {
        Ok(())
    }
}
