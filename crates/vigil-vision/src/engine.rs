//! Video processing engine
//!
//! Core engine for frame-by-frame person detection. Designed for low
//! latency with reusable buffers in the hot path.

use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::debug;
use vigil_core::{
    BoundingBox, CapabilityError, CapabilityResult, Detection, Detector, Frame, FrameFormat,
};

use crate::onnx::{OnnxBackend, RawOutput};
use crate::types::{ProcessingStats, VideoEngineConfig};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("model not loaded")]
    ModelNotLoaded,

    #[error("failed to load model: {0}")]
    ModelLoad(String),

    #[error("inference failed: {0}")]
    Inference(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("built without ONNX support (enable the `onnx` feature)")]
    BackendUnavailable,
}

pub type Result<T> = std::result::Result<T, EngineError>;

/// Thread-safe video processing engine
pub struct VideoEngine {
    config: VideoEngineConfig,
    labels: Vec<String>,
    backend: RwLock<Option<OnnxBackend>>,
    /// Reusable buffers to minimize allocations
    state: Mutex<EngineState>,
}

struct EngineState {
    /// Preprocessed frame buffer (planar RGB at model input size)
    input_buffer: Vec<f32>,
    /// Raw detection buffer before NMS
    raw_detections: Vec<Detection>,
    /// Frames processed since creation
    frame_count: u64,
}

impl VideoEngine {
    /// Create a new video engine with the given configuration.
    ///
    /// The model is not loaded yet; call [`VideoEngine::load`] before
    /// processing frames.
    pub fn new(config: VideoEngineConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.confidence_threshold) {
            return Err(EngineError::InvalidConfig(
                "confidence_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&config.nms_threshold) {
            return Err(EngineError::InvalidConfig(
                "nms_threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if config.input_width == 0 || config.input_height == 0 {
            return Err(EngineError::InvalidConfig(
                "model input dimensions must be non-zero".to_string(),
            ));
        }

        let labels = match config.labels {
            Some(ref labels_str) => parse_labels(labels_str),
            None => default_coco_labels(),
        };

        // Pre-allocate buffers for the expected input size
        let input_size = (config.input_width * config.input_height * 3) as usize;

        Ok(Self {
            config,
            labels,
            backend: RwLock::new(None),
            state: Mutex::new(EngineState {
                input_buffer: vec![0.0f32; input_size],
                raw_detections: Vec::with_capacity(100),
                frame_count: 0,
            }),
        })
    }

    /// Load the detector model named in the configuration.
    pub fn load(&self) -> Result<()> {
        let backend = OnnxBackend::load(&self.config)?;
        *self.backend.write() = Some(backend);
        Ok(())
    }

    /// Check if the engine is ready for inference
    pub fn is_ready(&self) -> bool {
        self.backend.read().is_some()
    }

    /// Get the model input dimensions
    pub fn input_dimensions(&self) -> (u32, u32) {
        (self.config.input_width, self.config.input_height)
    }

    /// Get label for a class ID
    pub fn get_label(&self, class_id: u32) -> Option<&str> {
        self.labels.get(class_id as usize).map(|s| s.as_str())
    }

    /// Frames processed since the engine was created.
    pub fn frame_count(&self) -> u64 {
        self.state.lock().frame_count
    }

    /// Process a single frame and return detections in frame coordinates.
    pub fn process_frame(&self, frame: &Frame) -> Result<(Vec<Detection>, ProcessingStats)> {
        let total_start = Instant::now();
        let mut stats = ProcessingStats {
            frame_width: frame.width,
            frame_height: frame.height,
            ..Default::default()
        };

        if frame.width == 0 || frame.height == 0 || !frame.is_well_formed() {
            return Err(EngineError::InvalidInput(format!(
                "{}x{} {:?} frame needs {} bytes, got {}",
                frame.width,
                frame.height,
                frame.format,
                frame.expected_size(),
                frame.data.len()
            )));
        }

        let backend = self.backend.read();
        let backend = backend.as_ref().ok_or(EngineError::ModelNotLoaded)?;

        let mut state = self.state.lock();
        state.frame_count += 1;

        // === PREPROCESSING ===
        let preprocess_start = Instant::now();
        self.preprocess_frame(frame, &mut state.input_buffer);
        stats.preprocess_us = preprocess_start.elapsed().as_micros() as u64;

        // === INFERENCE ===
        let inference_start = Instant::now();
        let (w, h) = self.input_dimensions();
        let output = backend.infer(&state.input_buffer, w, h)?;
        state.raw_detections = decode_output(&output, self.config.confidence_threshold)?;
        stats.inference_us = inference_start.elapsed().as_micros() as u64;
        stats.detections_raw = state.raw_detections.len() as u32;

        // === POST-PROCESSING ===
        let postprocess_start = Instant::now();
        let detections = self.postprocess_detections(&state.raw_detections, frame.width, frame.height);
        stats.postprocess_us = postprocess_start.elapsed().as_micros() as u64;
        stats.detections_final = detections.len() as u32;
        stats.total_us = total_start.elapsed().as_micros() as u64;

        Ok((detections, stats))
    }

    // === Private Methods ===

    /// Nearest-neighbour resize into planar RGB normalized to [0, 1].
    fn preprocess_frame(&self, frame: &Frame, output: &mut [f32]) {
        let (target_w, target_h) = (self.config.input_width, self.config.input_height);
        let (width, height) = (frame.width, frame.height);
        let plane = (target_w * target_h) as usize;
        let channels = frame.format.channels();

        let scale_x = width as f32 / target_w as f32;
        let scale_y = height as f32 / target_h as f32;

        for y in 0..target_h {
            for x in 0..target_w {
                let src_x = ((x as f32 + 0.5) * scale_x - 0.5).clamp(0.0, (width - 1) as f32);
                let src_y = ((y as f32 + 0.5) * scale_y - 0.5).clamp(0.0, (height - 1) as f32);

                let src_idx = (src_y as usize * width as usize + src_x as usize) * channels;
                let px = &frame.data[src_idx..src_idx + channels];

                let [r, g, b] = match frame.format {
                    FrameFormat::RGB8 | FrameFormat::RGBA8 => [px[0], px[1], px[2]],
                    // BGR to RGB
                    FrameFormat::BGR8 => [px[2], px[1], px[0]],
                    // Luma only for YUV
                    FrameFormat::Gray8 | FrameFormat::YUV420 => [px[0], px[0], px[0]],
                };

                let dst = (y * target_w + x) as usize;
                output[dst] = r as f32 / 255.0;
                output[plane + dst] = g as f32 / 255.0;
                output[2 * plane + dst] = b as f32 / 255.0;
            }
        }
    }

    fn postprocess_detections(
        &self,
        raw_detections: &[Detection],
        frame_width: u32,
        frame_height: u32,
    ) -> Vec<Detection> {
        // Filter by confidence threshold
        let mut filtered: Vec<Detection> = raw_detections
            .iter()
            .filter(|d| d.confidence >= self.config.confidence_threshold)
            .cloned()
            .collect();

        // Sort by confidence (descending)
        filtered.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        let sx = frame_width as f32 / self.config.input_width as f32;
        let sy = frame_height as f32 / self.config.input_height as f32;

        // Apply Non-Maximum Suppression
        let mut keep = Vec::new();
        let mut suppressed = vec![false; filtered.len()];

        for i in 0..filtered.len() {
            if suppressed[i] {
                continue;
            }

            let mut det = filtered[i].clone();

            // Scale bbox to original frame size
            det.bbox = det.bbox.scaled(sx, sy);

            // Add label if we have it
            if det.label.is_empty() {
                if let Some(label) = self.get_label(det.class_id) {
                    det.label = label.to_string();
                }
            }

            keep.push(det);

            // Suppress overlapping detections of same class
            for j in (i + 1)..filtered.len() {
                if suppressed[j] {
                    continue;
                }
                if filtered[i].class_id == filtered[j].class_id {
                    let iou = filtered[i].bbox.iou(&filtered[j].bbox);
                    if iou > self.config.nms_threshold {
                        suppressed[j] = true;
                    }
                }
            }
        }

        keep
    }
}

impl Detector for VideoEngine {
    fn detect(
        &self,
        frame: &Frame,
        category: &str,
        min_confidence: f32,
    ) -> CapabilityResult<Vec<Detection>> {
        let (detections, stats) = self.process_frame(frame).map_err(CapabilityError::from_err)?;
        debug!(
            preprocess_us = stats.preprocess_us,
            inference_us = stats.inference_us,
            postprocess_us = stats.postprocess_us,
            raw = stats.detections_raw,
            kept = stats.detections_final,
            "frame inference"
        );
        Ok(select_category(detections, category, min_confidence))
    }
}

/// Keep detections of one category at or above a confidence floor.
pub fn select_category(detections: Vec<Detection>, category: &str, min_confidence: f32) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| d.label == category && d.confidence >= min_confidence)
        .collect()
}

/// Decode a YOLOv8 head of shape `[1, 4 + classes, candidates]`.
///
/// Each candidate column holds `cx, cy, w, h` in model input pixels followed
/// by per-class scores. Candidates whose best score is below `threshold` are
/// dropped. Labels are left empty for post-processing to fill.
fn decode_output(output: &RawOutput, threshold: f32) -> Result<Vec<Detection>> {
    let (rows, candidates) = match output.shape.as_slice() {
        [1, rows, candidates] => (*rows, *candidates),
        [rows, candidates] => (*rows, *candidates),
        other => {
            return Err(EngineError::Inference(format!(
                "unexpected output shape: {other:?}"
            )))
        }
    };
    if rows < 5 || output.values.len() != rows * candidates {
        return Err(EngineError::Inference(format!(
            "output shape {:?} does not match {} values",
            output.shape,
            output.values.len()
        )));
    }

    let at = |row: usize, i: usize| output.values[row * candidates + i];
    let mut detections = Vec::new();

    for i in 0..candidates {
        let (class_id, score) = (4..rows)
            .map(|row| (row - 4, at(row, i)))
            .fold((0, f32::MIN), |best, cur| if cur.1 > best.1 { cur } else { best });

        if score < threshold {
            continue;
        }

        let bbox = BoundingBox::from_center(at(0, i), at(1, i), at(2, i), at(3, i));
        detections.push(Detection::new(class_id as u32, String::new(), score, bbox));
    }

    Ok(detections)
}

/// Parse labels from string (newline-separated or JSON array)
fn parse_labels(labels_str: &str) -> Vec<String> {
    let trimmed = labels_str.trim();

    // Try JSON array first
    if trimmed.starts_with('[') {
        if let Ok(labels) = serde_json::from_str::<Vec<String>>(trimmed) {
            return labels;
        }
    }

    // Fall back to newline-separated
    trimmed.lines().map(|s| s.trim().to_string()).collect()
}

/// Default COCO class labels
fn default_coco_labels() -> Vec<String> {
    vec![
        "person", "bicycle", "car", "motorcycle", "airplane", "bus", "train", "truck",
        "boat", "traffic light", "fire hydrant", "stop sign", "parking meter", "bench",
        "bird", "cat", "dog", "horse", "sheep", "cow", "elephant", "bear", "zebra",
        "giraffe", "backpack", "umbrella", "handbag", "tie", "suitcase", "frisbee",
        "skis", "snowboard", "sports ball", "kite", "baseball bat", "baseball glove",
        "skateboard", "surfboard", "tennis racket", "bottle", "wine glass", "cup",
        "fork", "knife", "spoon", "bowl", "banana", "apple", "sandwich", "orange",
        "broccoli", "carrot", "hot dog", "pizza", "donut", "cake", "chair", "couch",
        "potted plant", "bed", "dining table", "toilet", "tv", "laptop", "mouse",
        "remote", "keyboard", "cell phone", "microwave", "oven", "toaster", "sink",
        "refrigerator", "book", "clock", "vase", "scissors", "teddy bear", "hair drier",
        "toothbrush",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
