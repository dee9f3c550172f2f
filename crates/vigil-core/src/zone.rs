//! Monitored region geometry.
//!
//! A [`Zone`] is a closed polygon in frame pixel coordinates. Membership is
//! inclusive: points on an edge or vertex count as inside. All arithmetic is
//! exact integer math, so repeated queries always agree.

use serde::{Deserialize, Serialize};

use crate::detection::Point;
use crate::error::{FusionError, Result};

/// Immutable monitored polygon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zone {
    points: Vec<Point>,
    frame_width: u32,
    frame_height: u32,
}

impl Zone {
    /// Build a zone from polygon vertices for a frame of the given size.
    ///
    /// Fails when fewer than 3 distinct vertices are given or any vertex
    /// falls outside `[0, width] x [0, height]`.
    pub fn new(points: Vec<Point>, frame_width: u32, frame_height: u32) -> Result<Self> {
        let mut distinct: Vec<Point> = Vec::with_capacity(points.len());
        for p in &points {
            if !distinct.contains(p) {
                distinct.push(*p);
            }
        }
        if distinct.len() < 3 {
            return Err(FusionError::config(format!(
                "zone needs at least 3 distinct points, got {}",
                distinct.len()
            )));
        }

        let (w, h) = (i64::from(frame_width), i64::from(frame_height));
        if let Some(p) = points
            .iter()
            .find(|p| p.x < 0 || p.y < 0 || p.x > w || p.y > h)
        {
            return Err(FusionError::config(format!(
                "zone point ({}, {}) lies outside the {}x{} frame",
                p.x, p.y, frame_width, frame_height
            )));
        }

        Ok(Self {
            points,
            frame_width,
            frame_height,
        })
    }

    /// The lower half of the frame: `(0,H/2) (W,H/2) (W,H) (0,H)`.
    pub fn bottom_half(frame_width: u32, frame_height: u32) -> Result<Self> {
        let (w, h) = (i64::from(frame_width), i64::from(frame_height));
        let mid = h / 2;
        Self::new(
            vec![
                Point::new(0, mid),
                Point::new(w, mid),
                Point::new(w, h),
                Point::new(0, h),
            ],
            frame_width,
            frame_height,
        )
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    /// Whether `point` lies inside the polygon or on its boundary.
    ///
    /// Any point is accepted; points off the frame are never inside.
    pub fn contains(&self, point: Point) -> bool {
        let (w, h) = (i64::from(self.frame_width), i64::from(self.frame_height));
        if point.x < 0 || point.y < 0 || point.x > w || point.y > h {
            return false;
        }

        let n = self.points.len();
        let mut inside = false;

        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];

            if on_segment(a, b, point) {
                return true;
            }

            // Crossing test for a ray cast toward +x
            if (a.y > point.y) != (b.y > point.y) {
                let lhs = (wide(point.x) - wide(a.x)) * (wide(b.y) - wide(a.y));
                let rhs = (wide(point.y) - wide(a.y)) * (wide(b.x) - wide(a.x));
                let crosses = if b.y > a.y { lhs < rhs } else { lhs > rhs };
                if crosses {
                    inside = !inside;
                }
            }
        }

        inside
    }
}

fn wide(v: i64) -> i128 {
    i128::from(v)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    let cross = (wide(b.x) - wide(a.x)) * (wide(p.y) - wide(a.y))
        - (wide(b.y) - wide(a.y)) * (wide(p.x) - wide(a.x));
    cross == 0
        && p.x >= a.x.min(b.x)
        && p.x <= a.x.max(b.x)
        && p.y >= a.y.min(b.y)
        && p.y <= a.y.max(b.y)
}

/// Zone as written in configuration, resolved once frame dimensions are known.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ZoneDefinition {
    /// Lower half of the frame
    #[default]
    BottomHalf,
    /// Arbitrary polygon given as `[x, y]` pixel pairs
    Polygon { points: Vec<[f64; 2]> },
}

impl ZoneDefinition {
    pub fn resolve(&self, frame_width: u32, frame_height: u32) -> Result<Zone> {
        match self {
            ZoneDefinition::BottomHalf => Zone::bottom_half(frame_width, frame_height),
            ZoneDefinition::Polygon { points } => {
                let mut vertices = Vec::with_capacity(points.len());
                for [x, y] in points {
                    if !x.is_finite() || !y.is_finite() {
                        return Err(FusionError::config(format!(
                            "zone point ({x}, {y}) is not finite"
                        )));
                    }
                    vertices.push(Point::new(x.round() as i64, y.round() as i64));
                }
                Zone::new(vertices, frame_width, frame_height)
            }
        }
    }
}
