//! Per-frame detection types.
//!
//! Detections are produced fresh for every frame and dropped afterwards;
//! nothing here carries identity across frames.

use serde::{Deserialize, Serialize};

/// Integer pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box in frame pixel coordinates (`x1 < x2`, `y1 < y2`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from a top-left corner plus size.
    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Build from a center point plus size (YOLO box layout).
    pub fn from_center(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::from_xywh(cx - width / 2.0, cy - height / 2.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Scale both axes, e.g. from model input space to frame space.
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        Self::new(self.x1 * sx, self.y1 * sy, self.x2 * sx, self.y2 * sy)
    }

    /// Calculate intersection over union with another box
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }

    /// Ground-contact point: horizontal midpoint of the box on its bottom edge.
    ///
    /// Coordinates are truncated toward zero to whole pixels.
    pub fn ground_point(&self) -> Point {
        let feet_x = ((self.x1 + self.x2) / 2.0).trunc() as i64;
        let feet_y = self.y2.trunc() as i64;
        Point::new(feet_x, feet_y)
    }
}

/// A single detection result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Class/label ID (model-specific)
    pub class_id: u32,
    /// Human-readable label (if available)
    pub label: String,
    /// Confidence score 0.0-1.0
    pub confidence: f32,
    /// Bounding box in pixel coordinates
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: u32, label: impl Into<String>, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            label: label.into(),
            confidence,
            bbox,
        }
    }

    pub fn ground_point(&self) -> Point {
        self.bbox.ground_point()
    }
}
