//! Keypoint consistency check.
//!
//! For a keypoint `p1` and two other keypoints `p2`, `p3`, the ratio
//! `|p1 p2| / |p1 p3|` in the image should roughly match the same ratio on
//! the court. Each keypoint is scored by the median relative ratio error over
//! all pairs of other retained keypoints; the worst keypoint is dropped while
//! its score exceeds `max_ratio_error`, then the scores are recomputed.

use crate::types::{KeypointSet, LandmarkId};

use super::landmarks::CourtLandmarks;

pub fn filter_inconsistent_keypoints(
    keypoints: &KeypointSet,
    landmarks: &CourtLandmarks,
    max_ratio_error: f64,
) -> KeypointSet {
    let mut active: Vec<LandmarkId> = keypoints
        .keys()
        .copied()
        .filter(|id| landmarks.get(*id).is_some())
        .collect();

    let mut rejected: Vec<LandmarkId> = Vec::new();

    while active.len() >= 3 {
        let worst = active
            .iter()
            .map(|&id| (id, median_ratio_error(id, &active, keypoints, landmarks)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match worst {
            Some((id, score)) if score > max_ratio_error => {
                active.retain(|&a| a != id);
                rejected.push(id);
            }
            _ => break,
        }
    }

    keypoints
        .iter()
        .filter(|(id, _)| !rejected.contains(id))
        .map(|(&id, &p)| (id, p))
        .collect()
}

fn median_ratio_error(
    i1: LandmarkId,
    active: &[LandmarkId],
    keypoints: &KeypointSet,
    landmarks: &CourtLandmarks,
) -> f64 {
    let others: Vec<LandmarkId> = active.iter().copied().filter(|&i| i != i1).collect();
    let (p1, c1) = match (keypoints.get(&i1), landmarks.get(i1)) {
        (Some(p), Some(c)) => (*p, c),
        _ => return 0.0,
    };

    let mut errors = Vec::new();
    for (a, &i2) in others.iter().enumerate() {
        for &i3 in &others[a + 1..] {
            let (Some(p2), Some(p3)) = (keypoints.get(&i2), keypoints.get(&i3)) else {
                continue;
            };
            let (Some(c2), Some(c3)) = (landmarks.get(i2), landmarks.get(i3)) else {
                continue;
            };

            let court_12 = c1.distance_to(&c2);
            let court_13 = c1.distance_to(&c3);
            if court_12 <= 0.0 || court_13 <= 0.0 {
                continue;
            }
            let ratio_court = court_12 / court_13;

            let image_12 = p1.distance_to(p2);
            let image_13 = p1.distance_to(p3);
            let err = if image_12 <= 0.0 || image_13 <= 0.0 {
                f64::INFINITY
            } else {
                let ratio_image = image_12 / image_13;
                // Symmetric: shrinking and stretching are penalized alike
                (ratio_image / ratio_court - 1.0)
                    .abs()
                    .max((ratio_court / ratio_image - 1.0).abs())
            };
            errors.push(err);
        }
    }

    if errors.is_empty() {
        return 0.0;
    }

    errors.sort_by(|a, b| a.total_cmp(b));
    let mid = errors.len() / 2;
    if errors.len() % 2 == 0 {
        (errors[mid - 1] + errors[mid]) / 2.0
    } else {
        errors[mid]
    }
}
