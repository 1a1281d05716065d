//! Per-stage configuration sections.

use serde::{Deserialize, Serialize};

use crate::court::CourtLandmarks;

/// Homography estimation and carry-forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourtConfig {
    /// Landmark id -> court metres
    pub landmarks: CourtLandmarks,
    /// Drop keypoints whose distance ratios disagree with the court layout
    pub validate_keypoints: bool,
    /// Relative distance-ratio error above which a keypoint is dropped
    pub max_ratio_error: f64,
    /// Stop reusing a stale homography after this many frames (None = forever)
    pub max_carry_frames: Option<u64>,
}

impl Default for CourtConfig {
    fn default() -> Self {
        Self {
            landmarks: CourtLandmarks::basketball(),
            validate_keypoints: true,
            max_ratio_error: 0.8,
            max_carry_frames: None,
        }
    }
}

/// Ball possession hysteresis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PossessionConfig {
    /// Max ball-centre to player distance in pixels for a loose-possession candidate
    pub distance_threshold_px: f64,
    /// Fraction of the ball box inside a player box for a tight-possession candidate
    pub containment_threshold: f64,
    /// Frames without evidence before the holder is cleared
    pub grace_frames: u32,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self {
            distance_threshold_px: 50.0,
            containment_threshold: 0.8,
            grace_frames: 10,
        }
    }
}

/// Pass / interception detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Longest loose-ball gap (frames) still linking two possessions
    pub max_gap_frames: u64,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self { max_gap_frames: 30 }
    }
}

/// Speed and distance accumulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Video frame rate, used when frames carry no timestamp
    pub fps: f64,
    /// Number of most recent steps averaged into the reported speed
    pub speed_window_frames: usize,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            fps: 30.0,
            speed_window_frames: 5,
        }
    }
}

/// Ball track cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BallConfig {
    /// Drop ball detections that jump further than this per elapsed frame (None = keep all)
    pub max_jump_px_per_frame: Option<f64>,
    /// Fill ball gaps up to this many frames by linear interpolation (0 = off, batch only)
    pub interpolate_max_gap: u64,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            max_jump_px_per_frame: Some(25.0),
            interpolate_max_gap: 0,
        }
    }
}
