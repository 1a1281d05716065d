//! Court Mapper
//!
//! Pixel -> court projection plus the per-video carry-forward cache of the
//! last valid homography.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::homography::{court_to_pixel, estimate_homography, Homography};
use super::landmarks::CourtLandmarks;
use super::validation::filter_inconsistent_keypoints;
use crate::config::CourtConfig;
use crate::error::{AnalysisError, Result};
use crate::types::{CourtPoint, FrameIndex, KeypointSet, PixelPoint};

/// Below this magnitude the homogeneous scale is treated as zero (point at infinity).
pub const HOMOGENEOUS_EPSILON: f64 = 1e-9;

/// Project an image point onto the court plane.
pub fn map_to_court(homography: &Homography, point: PixelPoint) -> Result<CourtPoint> {
    let m = homography.to_court();
    let w = m[(2, 0)] * point.x + m[(2, 1)] * point.y + m[(2, 2)];
    if w.abs() < HOMOGENEOUS_EPSILON || !w.is_finite() {
        return Err(AnalysisError::DegenerateHomography);
    }

    let x = (m[(0, 0)] * point.x + m[(0, 1)] * point.y + m[(0, 2)]) / w;
    let y = (m[(1, 0)] * point.x + m[(1, 1)] * point.y + m[(1, 2)]) / w;
    if !x.is_finite() || !y.is_finite() {
        return Err(AnalysisError::DegenerateHomography);
    }

    Ok(CourtPoint::new(x, y))
}

/// Project a court point into the image.
pub fn project_to_image(homography: &Homography, point: CourtPoint) -> Result<PixelPoint> {
    let m = homography.to_image();
    let w = m[(2, 0)] * point.x + m[(2, 1)] * point.y + m[(2, 2)];
    if w.abs() < HOMOGENEOUS_EPSILON || !w.is_finite() {
        return Err(AnalysisError::DegenerateHomography);
    }
    Ok(court_to_pixel(m, point))
}

/// Where the homography used for a frame came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HomographySource {
    /// Estimated from this frame's keypoints.
    Fresh,
    /// Reused from an earlier frame because this frame's keypoints were unusable.
    CarriedForward { estimated_at: FrameIndex },
    /// No valid homography is available yet (or the cached one expired).
    Unavailable,
}

/// Carry-forward cache of the last valid homography for one video.
#[derive(Debug, Clone)]
pub struct CourtMapper {
    landmarks: CourtLandmarks,
    validate_keypoints: bool,
    max_ratio_error: f64,
    max_carry_frames: Option<u64>,
    current: Option<(FrameIndex, Homography)>,
    source: HomographySource,
}

impl CourtMapper {
    pub fn new(config: &CourtConfig) -> Self {
        Self {
            landmarks: config.landmarks.clone(),
            validate_keypoints: config.validate_keypoints,
            max_ratio_error: config.max_ratio_error,
            max_carry_frames: config.max_carry_frames,
            current: None,
            source: HomographySource::Unavailable,
        }
    }

    /// Refresh the homography for `frame`.
    ///
    /// Returns the estimation error when the frame's keypoints were unusable;
    /// the previous homography stays active in that case.
    pub fn update(&mut self, frame: FrameIndex, keypoints: &KeypointSet) -> Option<AnalysisError> {
        let filtered;
        let keypoints = if self.validate_keypoints {
            filtered = filter_inconsistent_keypoints(keypoints, &self.landmarks, self.max_ratio_error);
            &filtered
        } else {
            keypoints
        };

        match estimate_homography(keypoints, &self.landmarks) {
            Ok(h) => {
                self.current = Some((frame, h));
                self.source = HomographySource::Fresh;
                None
            }
            Err(err) => {
                self.source = match &self.current {
                    Some((estimated_at, _)) if !self.expired(*estimated_at, frame) => {
                        HomographySource::CarriedForward { estimated_at: *estimated_at }
                    }
                    Some((estimated_at, _)) => {
                        debug!(frame, estimated_at, "carried homography expired");
                        self.current = None;
                        HomographySource::Unavailable
                    }
                    None => HomographySource::Unavailable,
                };
                Some(err)
            }
        }
    }

    fn expired(&self, estimated_at: FrameIndex, frame: FrameIndex) -> bool {
        self.max_carry_frames
            .map(|max| frame.saturating_sub(estimated_at) > max)
            .unwrap_or(false)
    }

    pub fn source(&self) -> HomographySource {
        self.source
    }

    pub fn homography(&self) -> Option<&Homography> {
        self.current.as_ref().map(|(_, h)| h)
    }

    /// Project with the active homography.
    pub fn map(&self, point: PixelPoint) -> Result<CourtPoint> {
        match self.homography() {
            Some(h) => map_to_court(h, point),
            None => Err(AnalysisError::InsufficientKeypoints { found: 0 }),
        }
    }
}
