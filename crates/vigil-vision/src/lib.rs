//! Vigil Vision
//!
//! Person detection for the decision core, backed by a YOLO model running
//! on ONNX Runtime.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌────────────────┐
//! │ Video Frame │────▶│ VideoEngine  │────▶│ Vec<Detection> │
//! │ (raw bytes) │     │ (Rust/ONNX)  │     │ (frame pixels) │
//! └─────────────┘     └──────────────┘     └────────────────┘
//! ```
//!
//! [`VideoEngine`] implements [`vigil_core::Detector`], so it plugs straight
//! into a `VisionSignal`.
//!
//! ## Features
//!
//! - `onnx` (default) - ONNX Runtime inference. Without it the engine still
//!   validates configuration but cannot load a model.

pub mod engine;
pub mod onnx;
pub mod types;

// Re-export main types
pub use engine::{select_category, EngineError, VideoEngine};
pub use types::{ProcessingStats, VideoEngineConfig};
