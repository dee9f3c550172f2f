//! Detector configuration and per-frame statistics

/// Processing statistics for performance monitoring
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessingStats {
    /// Frame preprocessing time (microseconds)
    pub preprocess_us: u64,
    /// Model inference time (microseconds)
    pub inference_us: u64,
    /// Post-processing/NMS time (microseconds)
    pub postprocess_us: u64,
    /// Total processing time (microseconds)
    pub total_us: u64,
    /// Frame width processed
    pub frame_width: u32,
    /// Frame height processed
    pub frame_height: u32,
    /// Number of detections before NMS
    pub detections_raw: u32,
    /// Number of detections after NMS
    pub detections_final: u32,
}

/// Configuration for video engine initialization
#[derive(Debug, Clone)]
pub struct VideoEngineConfig {
    /// Path to ONNX model file
    pub model_path: String,
    /// Confidence threshold for detections (0.0-1.0)
    pub confidence_threshold: f32,
    /// IoU threshold for NMS (0.0-1.0)
    pub nms_threshold: f32,
    /// Model input width
    pub input_width: u32,
    /// Model input height
    pub input_height: u32,
    /// Number of inference threads (0 for auto)
    pub num_threads: u32,
    /// Class labels (newline-separated or JSON array)
    pub labels: Option<String>,
}

impl Default for VideoEngineConfig {
    fn default() -> Self {
        Self {
            model_path: String::new(),
            confidence_threshold: 0.5,
            nms_threshold: 0.45,
            input_width: 640,
            input_height: 640,
            num_threads: 0, // auto
            labels: None,
        }
    }
}
