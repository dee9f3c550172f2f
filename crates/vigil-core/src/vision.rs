//! Vision signal: reduces a frame's detections to one intrusion flag.

use serde::Serialize;

use crate::capability::Detector;
use crate::detection::Detection;
use crate::error::{Capability, FusionError, Result};
use crate::frame::Frame;
use crate::zone::Zone;

/// Default detector category.
pub const DEFAULT_CATEGORY: &str = "person";

/// Default minimum detector confidence.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Outcome of evaluating one frame against the zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisionOutcome {
    /// True iff at least one detection stands inside the zone
    pub video_flag: bool,
    /// Detections whose ground-contact point is inside the zone
    pub flagged: Vec<Detection>,
}

/// Test each detection's ground-contact point against the zone.
///
/// Pure and memoryless: the result depends only on the arguments.
pub fn evaluate_detections(detections: Vec<Detection>, zone: &Zone) -> VisionOutcome {
    let flagged: Vec<Detection> = detections
        .into_iter()
        .filter(|d| zone.contains(d.ground_point()))
        .collect();

    VisionOutcome {
        video_flag: !flagged.is_empty(),
        flagged,
    }
}

/// Wraps a [`Detector`] with the category and confidence it is queried with.
pub struct VisionSignal {
    detector: Box<dyn Detector + Send>,
    category: String,
    min_confidence: f32,
}

impl VisionSignal {
    pub fn new(detector: impl Detector + Send + 'static) -> Self {
        Self {
            detector: Box::new(detector),
            category: DEFAULT_CATEGORY.to_string(),
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn min_confidence(&self) -> f32 {
        self.min_confidence
    }

    /// Run the detector on `frame` and evaluate the result against `zone`.
    pub fn evaluate(&self, frame: &Frame, zone: &Zone, frame_index: u64) -> Result<VisionOutcome> {
        let detections = self
            .detector
            .detect(frame, &self.category, self.min_confidence)
            .map_err(|e| FusionError::capability(Capability::Detector, frame_index, e))?;
        Ok(evaluate_detections(detections, zone))
    }
}
