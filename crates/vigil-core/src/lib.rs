//! Vigil Decision Core
//!
//! Fuses two independent detection signals into one authoritative alert
//! state per video frame:
//!
//! - **vision**: per-frame person detections tested against a monitored zone
//! - **sensor**: an environmental classification sampled every N frames and
//!   held in between
//!
//! ```text
//! ┌───────┐   ┌──────────────┐  video_flag   ┌──────────────┐   ┌─────────────┐
//! │ Frame │──▶│ VisionSignal │──────────────▶│              │   │             │
//! └───────┘   └──────────────┘               │ FusionEngine │──▶│ FrameReport │
//!  frame_index┌──────────────┐  sensor_label │  (OR rule)   │   │             │
//!  ──────────▶│ SensorSignal │──────────────▶│              │   └─────────────┘
//!             └──────────────┘               └──────────────┘
//! ```
//!
//! Detection, classification, frame decoding and rendering are external
//! capabilities, see [`capability`].
//!
//! # Example
//!
//! ```rust
//! use vigil_core::{fuse, Point, SensorLabel, Zone};
//!
//! let zone = Zone::bottom_half(100, 100).unwrap();
//! assert!(zone.contains(Point::new(50, 80)));
//! assert!(!zone.contains(Point::new(50, 10)));
//!
//! assert!(fuse(false, SensorLabel::Intrusion).alert);
//! ```

pub mod capability;
pub mod controller;
pub mod detection;
pub mod error;
pub mod frame;
pub mod fusion;
pub mod sensor;
pub mod vision;
pub mod zone;

// Re-export main types at crate root
pub use capability::{
    CapabilityResult, Detector, FrameSink, FrameSource, Normalizer, NullSink, SensorClassifier,
    SensorSampler,
};
pub use controller::{
    CancelToken, FailurePolicy, FrameReport, LoopController, LoopState, RunSummary, StopReason,
};
pub use detection::{BoundingBox, Detection, Point};
pub use error::{Capability, CapabilityError, FusionError, Result};
pub use frame::{Frame, FrameFormat};
pub use fusion::{fuse, FusionEngine, FusionResult};
pub use sensor::{EveryNthFrame, SamplingPolicy, SensorLabel, SensorSample, SensorSignal, SensorState};
pub use vision::{evaluate_detections, VisionOutcome, VisionSignal};
pub use zone::{Zone, ZoneDefinition};
