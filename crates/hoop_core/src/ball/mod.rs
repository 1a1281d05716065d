//! # Ball Track Cleaning
//!
//! - `BallJumpFilter` - causal, used frame by frame by the analyzer
//! - `interpolate_ball_gaps` - batch, fills short interior gaps linearly
//!
//! ## Jump rule
//! A detection is rejected when its centre is further from the last accepted
//! ball centre than `max_jump_px_per_frame * frames_elapsed`. Rejected
//! detections never become the reference.

use tracing::debug;

use crate::config::BallConfig;
use crate::types::{BoundingBox, Detection, FrameIndex, FrameInput, ObjectClass, PixelPoint};

#[derive(Debug, Clone, Default)]
pub struct BallJumpFilter {
    max_jump_px_per_frame: Option<f64>,
    last_valid: Option<(FrameIndex, PixelPoint)>,
}

impl BallJumpFilter {
    pub fn new(config: &BallConfig) -> Self {
        Self {
            max_jump_px_per_frame: config.max_jump_px_per_frame,
            last_valid: None,
        }
    }

    /// Returns true if the detection is plausible and records it as the new reference.
    pub fn accept(&mut self, frame: FrameIndex, ball: &BoundingBox) -> bool {
        let center = ball.center();

        if let (Some(max_jump), Some((last_frame, last_center))) = (self.max_jump_px_per_frame, self.last_valid) {
            let elapsed = frame.saturating_sub(last_frame).max(1) as f64;
            let jump = center.distance_to(&last_center);
            if jump > max_jump * elapsed {
                debug!(frame, jump_px = jump, "ball detection rejected as jump");
                return false;
            }
        }

        self.last_valid = Some((frame, center));
        true
    }
}

fn lerp_box(a: &BoundingBox, b: &BoundingBox, t: f64) -> BoundingBox {
    let mix = |p: f64, q: f64| p + (q - p) * t;
    BoundingBox::new(mix(a.x1, b.x1), mix(a.y1, b.y1), mix(a.x2, b.x2), mix(a.y2, b.y2))
        .with_confidence(a.confidence.min(b.confidence))
}

/// Fill frames without a ball that sit between two ball detections at most
/// `max_gap` frames apart. Gaps at the start or end are left empty.
///
/// A gap is only filled when every frame in it lies strictly between its two
/// anchors; out-of-order stretches are left untouched.
///
/// Returns the number of frames filled.
pub fn interpolate_ball_gaps(frames: &mut [FrameInput], max_gap: u64) -> usize {
    if max_gap == 0 {
        return 0;
    }

    let anchors: Vec<(usize, Detection)> = frames
        .iter()
        .enumerate()
        .filter_map(|(idx, f)| f.ball().map(|d| (idx, d.clone())))
        .collect();

    let mut filled = 0;
    for pair in anchors.windows(2) {
        let (start_idx, start) = (pair[0].0, &pair[0].1);
        let (end_idx, end) = (pair[1].0, &pair[1].1);
        if end_idx == start_idx + 1 {
            continue;
        }

        let start_frame = frames[start_idx].frame;
        let end_frame = frames[end_idx].frame;
        let span = end_frame.saturating_sub(start_frame);
        if span.saturating_sub(1) > max_gap || span == 0 {
            continue;
        }

        let gap = &mut frames[start_idx + 1..end_idx];
        if gap.iter().any(|f| f.frame <= start_frame || f.frame >= end_frame) {
            debug!(start_frame, end_frame, "ball gap not monotonic, left empty");
            continue;
        }

        for frame in gap {
            let t = frame.frame.saturating_sub(start_frame) as f64 / span as f64;
            let bbox = lerp_box(&start.bbox, &end.bbox, t);
            frame.detections.push(Detection::ball(start.track_id, bbox));
            filled += 1;
        }
    }

    filled
}

/// Jump filtering followed by optional gap interpolation over a whole video.
///
/// Each frame keeps at most one ball detection afterwards.
pub fn clean_ball_track(frames: &[FrameInput], config: &BallConfig) -> Vec<FrameInput> {
    let mut filter = BallJumpFilter::new(config);

    let mut cleaned: Vec<FrameInput> = frames
        .iter()
        .map(|input| {
            let kept = input
                .ball()
                .filter(|ball| filter.accept(input.frame, &ball.bbox))
                .cloned();

            let mut out = input.clone();
            out.detections.retain(|d| d.class != ObjectClass::Ball);
            out.detections.extend(kept);
            out
        })
        .collect();

    let filled = interpolate_ball_gaps(&mut cleaned, config.interpolate_max_gap);
    if filled > 0 {
        debug!(filled, "interpolated ball positions");
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball_box(x: f64, y: f64) -> BoundingBox {
        BoundingBox::new(x - 4.0, y - 4.0, x + 4.0, y + 4.0)
    }

    fn frame_with_ball(frame: FrameIndex, ball: Option<(f64, f64)>) -> FrameInput {
        let mut input = FrameInput::new(frame);
        if let Some((x, y)) = ball {
            input.detections.push(Detection::ball(1, ball_box(x, y)));
        }
        input
    }

    #[test]
    fn test_jump_rejected_and_not_used_as_reference() {
        let mut filter = BallJumpFilter::new(&BallConfig::default());

        assert!(filter.accept(0, &ball_box(100.0, 100.0)));
        assert!(filter.accept(1, &ball_box(120.0, 100.0)));
        assert!(!filter.accept(2, &ball_box(400.0, 100.0)));
        // Reference is still frame 1, so 2 frames elapsed allow 50 px
        assert!(filter.accept(3, &ball_box(165.0, 100.0)));
    }

    #[test]
    fn test_allowance_scales_with_elapsed_frames() {
        let mut filter = BallJumpFilter::new(&BallConfig::default());

        assert!(filter.accept(0, &ball_box(0.0, 0.0)));
        assert!(filter.accept(4, &ball_box(100.0, 0.0)));
        assert!(!filter.accept(5, &ball_box(130.0, 0.0)));
    }

    #[test]
    fn test_disabled_filter_accepts_everything() {
        let config = BallConfig { max_jump_px_per_frame: None, ..Default::default() };
        let mut filter = BallJumpFilter::new(&config);

        assert!(filter.accept(0, &ball_box(0.0, 0.0)));
        assert!(filter.accept(1, &ball_box(1000.0, 1000.0)));
    }

    #[test]
    fn test_interpolation_fills_interior_gap() {
        let mut frames = vec![
            frame_with_ball(0, None),
            frame_with_ball(1, Some((100.0, 100.0))),
            frame_with_ball(2, None),
            frame_with_ball(3, None),
            frame_with_ball(4, Some((130.0, 100.0))),
            frame_with_ball(5, None),
        ];

        let filled = interpolate_ball_gaps(&mut frames, 2);

        assert_eq!(filled, 2);
        assert!(frames[0].ball().is_none());
        assert!(frames[5].ball().is_none());
        let mid = frames[2].ball().unwrap().bbox.center();
        assert!((mid.x - 110.0).abs() < 1e-9);
        assert!((frames[3].ball().unwrap().bbox.center().x - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_interpolation_respects_max_gap() {
        let mut frames = vec![
            frame_with_ball(0, Some((100.0, 100.0))),
            frame_with_ball(1, None),
            frame_with_ball(2, None),
            frame_with_ball(3, None),
            frame_with_ball(4, Some((100.0, 100.0))),
        ];

        assert_eq!(interpolate_ball_gaps(&mut frames, 2), 0);
        assert_eq!(interpolate_ball_gaps(&mut frames, 0), 0);
        assert!(frames[2].ball().is_none());
    }

    #[test]
    fn test_interpolation_skips_out_of_order_gap() {
        let mut frames = vec![
            frame_with_ball(10, Some((100.0, 100.0))),
            frame_with_ball(3, None),
            frame_with_ball(12, Some((120.0, 100.0))),
        ];

        assert_eq!(interpolate_ball_gaps(&mut frames, 5), 0);
        assert!(frames[1].ball().is_none());
    }

    #[test]
    fn test_clean_drops_jump_then_fills() {
        let frames = vec![
            frame_with_ball(0, Some((100.0, 100.0))),
            frame_with_ball(1, Some((900.0, 500.0))),
            frame_with_ball(2, Some((110.0, 100.0))),
        ];
        let config = BallConfig { interpolate_max_gap: 3, ..Default::default() };

        let cleaned = clean_ball_track(&frames, &config);

        assert_eq!(cleaned.len(), 3);
        let filled = cleaned[1].ball().unwrap().bbox.center();
        assert!((filled.x - 105.0).abs() < 1e-9);
        assert_eq!(cleaned[1].detections.iter().filter(|d| d.class == ObjectClass::Ball).count(), 1);
    }
}
