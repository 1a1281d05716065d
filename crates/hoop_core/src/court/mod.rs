//! # Court Module
//!
//! Image-to-court geometry.
//!
//! - `landmarks` - Fixed court landmark coordinates
//! - `homography` - Per-frame projective fit from keypoints
//! - `mapper` - Point projection and carry-forward of the last valid fit
//! - `validation` - Distance-ratio check that drops inconsistent keypoints

pub mod homography;
pub mod landmarks;
pub mod mapper;
pub mod validation;

pub use homography::{estimate_homography, Homography, MIN_CORRESPONDENCES};
pub use landmarks::{dims, CourtLandmarks};
pub use mapper::{map_to_court, project_to_image, CourtMapper, HomographySource, HOMOGENEOUS_EPSILON};
pub use validation::filter_inconsistent_keypoints;
