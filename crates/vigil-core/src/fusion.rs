//! Alert fusion.
//!
//! Inclusive OR: either signal alone raises the alert. There is no
//! confirmation window and no weighting, and a single frame's flag is taken
//! as-is, so borderline detections may make the alert flicker.

use serde::Serialize;

use crate::sensor::SensorLabel;

/// Fused decision for one frame. Recomputed every frame, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FusionResult {
    pub video_flag: bool,
    pub sensor_label: SensorLabel,
    pub alert: bool,
}

/// Stateless fusion rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct FusionEngine;

impl FusionEngine {
    pub fn fuse(&self, video_flag: bool, sensor_label: SensorLabel) -> FusionResult {
        fuse(video_flag, sensor_label)
    }
}

/// `alert = video_flag OR sensor_label == 1`
pub fn fuse(video_flag: bool, sensor_label: SensorLabel) -> FusionResult {
    FusionResult {
        video_flag,
        sensor_label,
        alert: video_flag || sensor_label.is_alert(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truth_table() {
        let cases = [
            (false, SensorLabel::Normal, false),
            (true, SensorLabel::Normal, true),
            (false, SensorLabel::Intrusion, true),
            (true, SensorLabel::Intrusion, true),
        ];
        for (video, sensor, expected) in cases {
            let result = FusionEngine.fuse(video, sensor);
            assert_eq!(result.alert, expected, "fuse({video}, {sensor})");
            assert_eq!(result.video_flag, video);
            assert_eq!(result.sensor_label, sensor);
        }
    }
}
