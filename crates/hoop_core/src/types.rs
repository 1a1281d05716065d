//! Shared value types for the analysis pipeline.
//!
//! ## Coordinate Systems
//!
//! **Pixel coordinates** (`PixelPoint`, `BoundingBox`):
//! - X: 0 = left edge of the frame, grows right
//! - Y: 0 = top edge of the frame, grows down
//!
//! **Court coordinates** (`CourtPoint`, metres):
//! - X: 0 = left baseline, 28.65 = right baseline (LENGTH direction)
//! - Y: 0 = near sideline, 15.24 = far sideline (WIDTH direction)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Monotonically increasing frame number within one video.
pub type FrameIndex = u64;

/// Opaque identifier assigned by the external tracker. Not guaranteed to persist.
pub type TrackId = u32;

/// Index into the court landmark table.
pub type LandmarkId = u8;

/// Detected court landmarks for one frame. Missing entries are occluded landmarks.
pub type KeypointSet = BTreeMap<LandmarkId, PixelPoint>;

/// Point in image pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &PixelPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Point on the court plane in metres. Only ever produced by projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CourtPoint {
    pub x: f64,
    pub y: f64,
}

impl CourtPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &CourtPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned detection box in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_confidence() -> f64 {
    1.0
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2, confidence: 1.0 }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f64 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    pub fn center(&self) -> PixelPoint {
        PixelPoint::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Bottom-centre of the box, where a standing player touches the floor.
    pub fn foot_position(&self) -> PixelPoint {
        PixelPoint::new((self.x1 + self.x2) / 2.0, self.y2)
    }

    /// Fraction of `other`'s area that lies inside `self` (0 when `other` is empty).
    pub fn containment_of(&self, other: &BoundingBox) -> f64 {
        let other_area = other.area();
        if other_area <= 0.0 {
            return 0.0;
        }

        let ix1 = self.x1.max(other.x1);
        let iy1 = self.y1.max(other.y1);
        let ix2 = self.x2.min(other.x2);
        let iy2 = self.y2.min(other.y2);
        let intersection = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);

        intersection / other_area
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectClass {
    Player,
    Ball,
}

/// One tracked object in one frame, as produced by the detection/tracking collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub track_id: TrackId,
    pub class: ObjectClass,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn player(track_id: TrackId, bbox: BoundingBox) -> Self {
        Self { track_id, class: ObjectClass::Player, bbox }
    }

    pub fn ball(track_id: TrackId, bbox: BoundingBox) -> Self {
        Self { track_id, class: ObjectClass::Ball, bbox }
    }
}

/// Team assignment from the jersey classifier. Can flip between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamLabel {
    TeamA,
    TeamB,
    #[default]
    Unknown,
}

impl TeamLabel {
    pub fn is_known(&self) -> bool {
        !matches!(self, TeamLabel::Unknown)
    }
}

/// Everything the external collaborators supply for a single frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameInput {
    pub frame: FrameIndex,
    /// Wall-clock time of the frame in seconds, when the source provides it.
    #[serde(default)]
    pub time_s: Option<f64>,
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub keypoints: KeypointSet,
    #[serde(default)]
    pub teams: BTreeMap<TrackId, TeamLabel>,
}

impl FrameInput {
    pub fn new(frame: FrameIndex) -> Self {
        Self { frame, ..Default::default() }
    }

    pub fn players(&self) -> impl Iterator<Item = &Detection> {
        self.detections.iter().filter(|d| d.class == ObjectClass::Player)
    }

    /// Highest-confidence ball detection of the frame.
    pub fn ball(&self) -> Option<&Detection> {
        self.detections
            .iter()
            .filter(|d| d.class == ObjectClass::Ball)
            .max_by(|a, b| a.bbox.confidence.total_cmp(&b.bbox.confidence))
    }
}
