//! # Homography Estimator
//!
//! Fits the projective transform between the court plane and the image plane
//! from detected court keypoints.
//!
//! ## Algorithm
//! 1. Pair every detected keypoint with its landmark's court coordinate
//! 2. Require 4+ correspondences with some 4 in general position on both planes
//! 3. Hartley-normalize both point sets
//! 4. Solve the DLT system with an SVD (least squares for N > 4, exact for N = 4)
//! 5. Denormalize and invert to get the image -> court direction

use nalgebra::{DMatrix, Matrix3};
use serde::{Deserialize, Serialize};

use super::landmarks::CourtLandmarks;
use crate::error::{AnalysisError, Result};
use crate::types::{CourtPoint, KeypointSet, PixelPoint};

/// Minimum number of point pairs for a projective fit.
pub const MIN_CORRESPONDENCES: usize = 4;

/// Sine of the smallest angle still treated as non-collinear.
const COLLINEAR_SINE_EPSILON: f64 = 1e-6;

/// Projective mapping between court metres and image pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Homography {
    to_image: Matrix3<f64>,
    to_court: Matrix3<f64>,
    correspondences: usize,
    reprojection_error_px: f64,
}

impl Homography {
    /// Build from a known court -> image matrix.
    pub fn from_matrix(to_image: Matrix3<f64>) -> Result<Self> {
        if !to_image.iter().all(|v| v.is_finite()) {
            return Err(AnalysisError::DegenerateHomography);
        }
        let to_court = to_image.try_inverse().ok_or(AnalysisError::DegenerateHomography)?;

        Ok(Self {
            to_image,
            to_court,
            correspondences: 0,
            reprojection_error_px: 0.0,
        })
    }

    /// Court -> image matrix.
    pub fn to_image(&self) -> &Matrix3<f64> {
        &self.to_image
    }

    /// Image -> court matrix.
    pub fn to_court(&self) -> &Matrix3<f64> {
        &self.to_court
    }

    /// Number of keypoint pairs the fit used (0 for injected matrices).
    pub fn correspondences(&self) -> usize {
        self.correspondences
    }

    /// RMS distance in pixels between detected keypoints and projected landmarks.
    pub fn reprojection_error_px(&self) -> f64 {
        self.reprojection_error_px
    }
}

/// Estimate the court -> image homography for one frame.
///
/// # Errors
/// - `InsufficientKeypoints` when fewer than 4 usable pairs exist or all of
///   them are degenerate (3 of every 4 collinear)
/// - `DegenerateHomography` when the fitted matrix cannot be inverted
pub fn estimate_homography(
    keypoints: &KeypointSet,
    landmarks: &CourtLandmarks,
) -> Result<Homography> {
    let (court, image): (Vec<(f64, f64)>, Vec<(f64, f64)>) = keypoints
        .iter()
        .filter(|(_, p)| p.x.is_finite() && p.y.is_finite())
        .filter_map(|(&id, p)| landmarks.get(id).map(|c| ((c.x, c.y), (p.x, p.y))))
        .unzip();

    let found = court.len();
    if found < MIN_CORRESPONDENCES
        || !has_general_position(&court)
        || !has_general_position(&image)
    {
        return Err(AnalysisError::InsufficientKeypoints { found });
    }

    let to_image = solve_dlt(&court, &image)?;
    let mut homography = Homography::from_matrix(to_image)?;
    homography.correspondences = found;
    homography.reprojection_error_px = rms_reprojection_error(&to_image, &court, &image);

    Ok(homography)
}

/// Direct linear transform from `src` to `dst` with Hartley normalization.
fn solve_dlt(src: &[(f64, f64)], dst: &[(f64, f64)]) -> Result<Matrix3<f64>> {
    let t_src = normalizing_transform(src).ok_or(AnalysisError::DegenerateHomography)?;
    let t_dst = normalizing_transform(dst).ok_or(AnalysisError::DegenerateHomography)?;

    // Zero rows keep the system at least 9x9 so the SVD yields a full V.
    let rows = (2 * src.len()).max(9);
    let mut a = DMatrix::<f64>::zeros(rows, 9);

    for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
        let (x, y) = apply(&t_src, *s);
        let (u, v) = apply(&t_dst, *d);

        let row_u = [-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u];
        let row_v = [0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v];
        for c in 0..9 {
            a[(2 * i, c)] = row_u[c];
            a[(2 * i + 1, c)] = row_v[c];
        }
    }

    let svd = a.svd(false, true);
    let v_t = svd.v_t.ok_or(AnalysisError::DegenerateHomography)?;

    let (null_idx, _) = svd
        .singular_values
        .iter()
        .enumerate()
        .min_by(|a, b| a.1.total_cmp(b.1))
        .ok_or(AnalysisError::DegenerateHomography)?;

    let h = v_t.row(null_idx);
    let h_norm = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst.try_inverse().ok_or(AnalysisError::DegenerateHomography)?;
    let mut m = t_dst_inv * h_norm * t_src;

    let scale = if m[(2, 2)].abs() > f64::EPSILON { m[(2, 2)] } else { m.norm() };
    if scale == 0.0 || !scale.is_finite() {
        return Err(AnalysisError::DegenerateHomography);
    }
    m /= scale;

    Ok(m)
}

/// Similarity transform moving the centroid to the origin with mean distance sqrt(2).
fn normalizing_transform(points: &[(f64, f64)]) -> Option<Matrix3<f64>> {
    let n = points.len() as f64;
    let cx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let cy = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mean_dist = points
        .iter()
        .map(|p| (p.0 - cx).hypot(p.1 - cy))
        .sum::<f64>()
        / n;

    if mean_dist <= f64::EPSILON || !mean_dist.is_finite() {
        return None;
    }

    let s = std::f64::consts::SQRT_2 / mean_dist;
    Some(Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0))
}

fn apply(m: &Matrix3<f64>, (x, y): (f64, f64)) -> (f64, f64) {
    let w = m[(2, 0)] * x + m[(2, 1)] * y + m[(2, 2)];
    (
        (m[(0, 0)] * x + m[(0, 1)] * y + m[(0, 2)]) / w,
        (m[(1, 0)] * x + m[(1, 1)] * y + m[(1, 2)]) / w,
    )
}

fn rms_reprojection_error(m: &Matrix3<f64>, src: &[(f64, f64)], dst: &[(f64, f64)]) -> f64 {
    let sum_sq: f64 = src
        .iter()
        .zip(dst.iter())
        .map(|(s, d)| {
            let (u, v) = apply(m, *s);
            (u - d.0).powi(2) + (v - d.1).powi(2)
        })
        .sum();

    (sum_sq / src.len() as f64).sqrt()
}

fn collinear(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> bool {
    let ab = (b.0 - a.0, b.1 - a.1);
    let ac = (c.0 - a.0, c.1 - a.1);
    let scale = ab.0.hypot(ab.1) * ac.0.hypot(ac.1);
    if scale <= f64::EPSILON {
        return true;
    }
    let cross = ab.0 * ac.1 - ab.1 * ac.0;
    cross.abs() <= COLLINEAR_SINE_EPSILON * scale
}

/// True if some 4 of the points have no 3 collinear.
fn has_general_position(points: &[(f64, f64)]) -> bool {
    let n = points.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                if collinear(points[i], points[j], points[k]) {
                    continue;
                }
                for l in (k + 1)..n {
                    let p = points[l];
                    if !collinear(points[i], points[j], p)
                        && !collinear(points[i], points[k], p)
                        && !collinear(points[j], points[k], p)
                    {
                        return true;
                    }
                }
            }
        }
    }
    false
}

/// Convenience for tests and overlays: project a court point into the image.
pub(crate) fn court_to_pixel(m: &Matrix3<f64>, p: CourtPoint) -> PixelPoint {
    let (x, y) = apply(m, (p.x, p.y));
    PixelPoint::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::court::landmarks::dims;

    /// Mild broadcast-style perspective: court metres -> 1280x720 pixels.
    fn camera() -> Matrix3<f64> {
        Matrix3::new(38.0, 6.0, 90.0, -1.5, 22.0, 180.0, 0.0004, 0.006, 1.0)
    }

    fn observe(ids: &[u8], landmarks: &CourtLandmarks) -> KeypointSet {
        let cam = camera();
        ids.iter()
            .map(|&id| (id, court_to_pixel(&cam, landmarks.get(id).unwrap())))
            .collect()
    }

    #[test]
    fn test_exact_four_point_round_trip() {
        let landmarks = CourtLandmarks::basketball();
        // Baseline corners + free-throw corners
        let keypoints = observe(&[0, 5, 6, 7], &landmarks);

        let h = estimate_homography(&keypoints, &landmarks).unwrap();
        assert_eq!(h.correspondences(), 4);
        assert!(h.reprojection_error_px() < 1e-6);

        for (&id, observed) in &keypoints {
            let projected = court_to_pixel(h.to_image(), landmarks.get(id).unwrap());
            assert!(
                projected.distance_to(observed) < 1e-6,
                "landmark {} reprojected to {:?}, observed {:?}",
                id,
                projected,
                observed
            );
        }
    }

    #[test]
    fn test_least_squares_with_many_points() {
        let landmarks = CourtLandmarks::basketball();
        let ids: Vec<u8> = (0..18).collect();
        let mut keypoints = observe(&ids, &landmarks);

        // Half-pixel detector noise, alternating sign
        for (i, p) in keypoints.values_mut().enumerate() {
            let n = if i % 2 == 0 { 0.5 } else { -0.5 };
            p.x += n;
            p.y -= n;
        }

        let h = estimate_homography(&keypoints, &landmarks).unwrap();
        assert_eq!(h.correspondences(), 18);
        assert!(h.reprojection_error_px() < 1.0, "rms {}", h.reprojection_error_px());

        let center = court_to_pixel(h.to_image(), CourtPoint::new(dims::HALF_LENGTH_M, dims::WIDTH_M / 2.0));
        let expected = court_to_pixel(&camera(), CourtPoint::new(dims::HALF_LENGTH_M, dims::WIDTH_M / 2.0));
        assert!(center.distance_to(&expected) < 1.0);
    }

    #[test]
    fn test_too_few_keypoints() {
        let landmarks = CourtLandmarks::basketball();
        let keypoints = observe(&[0, 5, 6], &landmarks);

        match estimate_homography(&keypoints, &landmarks) {
            Err(AnalysisError::InsufficientKeypoints { found }) => assert_eq!(found, 3),
            other => panic!("expected InsufficientKeypoints, got {:?}", other),
        }
    }

    #[test]
    fn test_collinear_keypoints_rejected() {
        let landmarks = CourtLandmarks::basketball();
        // All six lie on the left baseline
        let keypoints = observe(&[0, 1, 2, 3, 4, 5], &landmarks);

        assert!(matches!(
            estimate_homography(&keypoints, &landmarks),
            Err(AnalysisError::InsufficientKeypoints { found: 6 })
        ));
    }

    #[test]
    fn test_three_collinear_plus_one_rejected() {
        let landmarks = CourtLandmarks::basketball();
        // Three on the left baseline, one at the free-throw line: every quadruple has 3 collinear
        let keypoints = observe(&[0, 2, 5, 6], &landmarks);

        assert!(matches!(
            estimate_homography(&keypoints, &landmarks),
            Err(AnalysisError::InsufficientKeypoints { .. })
        ));
    }

    #[test]
    fn test_unknown_landmarks_ignored() {
        let landmarks = CourtLandmarks::basketball();
        let mut keypoints = observe(&[0, 5, 6], &landmarks);
        keypoints.insert(42, PixelPoint::new(500.0, 500.0));

        assert!(matches!(
            estimate_homography(&keypoints, &landmarks),
            Err(AnalysisError::InsufficientKeypoints { found: 3 })
        ));
    }

    #[test]
    fn test_from_matrix_rejects_singular() {
        let singular = Matrix3::new(1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 0.0, 0.0, 1.0);
        assert!(matches!(
            Homography::from_matrix(singular),
            Err(AnalysisError::DegenerateHomography)
        ));
    }

    #[test]
    fn test_general_position() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(has_general_position(&square));

        let line = [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0), (4.0, 4.0)];
        assert!(!has_general_position(&line));
    }

    #[cfg(all(test, feature = "proptest"))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: the fit reproduces any mild perspective exactly from the four baseline corners
            #[test]
            fn prop_round_trip_corners(
                sx in 20.0f64..60.0,
                sy in 10.0f64..40.0,
                tx in 0.0f64..300.0,
                ty in 0.0f64..300.0,
                skew in -5.0f64..5.0,
                persp in 0.0f64..0.01
            ) {
                let cam = Matrix3::new(sx, skew, tx, 0.0, sy, ty, 0.0, persp, 1.0);
                let landmarks = CourtLandmarks::basketball();
                let keypoints: KeypointSet = [0u8, 5, 12, 17]
                    .iter()
                    .map(|&id| (id, court_to_pixel(&cam, landmarks.get(id).unwrap())))
                    .collect();

                let h = estimate_homography(&keypoints, &landmarks).unwrap();
                for (&id, observed) in &keypoints {
                    let projected = court_to_pixel(h.to_image(), landmarks.get(id).unwrap());
                    prop_assert!(projected.distance_to(observed) < 1e-6);
                }
            }
        }
    }
}
