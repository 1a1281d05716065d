//! Per-frame possession candidate selection.
//!
//! ## Algorithm
//! 1. A player whose box holds more than `containment_threshold` of the ball box
//!    is a tight candidate; the highest containment wins outright
//! 2. Otherwise the player with the smallest ball-centre distance to one of its
//!    key points wins, if that distance is under `distance_threshold_px`
//! 3. Ties go to the lower track id so reruns are deterministic

use crate::config::PossessionConfig;
use crate::types::{BoundingBox, PixelPoint, TrackId};

/// How strongly one player is tied to the ball in one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evidence {
    pub track_id: TrackId,
    /// Fraction of the ball box inside the player box
    pub containment: f64,
    /// Ball centre to nearest key point, pixels
    pub distance_px: f64,
}

impl Evidence {
    pub fn evaluate(track_id: TrackId, player: &BoundingBox, ball: &BoundingBox) -> Self {
        let ball_center = ball.center();
        Self {
            track_id,
            containment: player.containment_of(ball),
            distance_px: min_distance_to_ball(player, ball_center),
        }
    }

    pub fn is_tight(&self, config: &PossessionConfig) -> bool {
        self.containment > config.containment_threshold
    }

    /// Close enough to count as possession this frame.
    pub fn in_range(&self, config: &PossessionConfig) -> bool {
        self.is_tight(config) || self.distance_px < config.distance_threshold_px
    }

    pub fn confidence(&self, config: &PossessionConfig) -> f64 {
        if self.is_tight(config) {
            self.containment.clamp(0.0, 1.0)
        } else {
            (1.0 - self.distance_px / config.distance_threshold_px).clamp(0.0, 1.0)
        }
    }
}

/// Edge, corner and edge-intersection points of a player box relative to the ball.
pub fn key_points(player: &BoundingBox, ball_center: PixelPoint) -> Vec<PixelPoint> {
    let BoundingBox { x1, y1, x2, y2, .. } = *player;
    let (bx, by) = (ball_center.x, ball_center.y);
    let mid_x = x1 + player.width() / 2.0;
    let mid_y = y1 + player.height() / 2.0;

    let mut points = Vec::with_capacity(12);

    // Horizontal projections of the ball onto the side edges
    if y1 < by && by < y2 {
        points.push(PixelPoint::new(x1, by));
        points.push(PixelPoint::new(x2, by));
    }
    // Vertical projections onto the top and bottom edges
    if x1 < bx && bx < x2 {
        points.push(PixelPoint::new(bx, y1));
        points.push(PixelPoint::new(bx, y2));
    }

    points.extend([
        PixelPoint::new(x1, y1),
        PixelPoint::new(x2, y1),
        PixelPoint::new(x1, y2),
        PixelPoint::new(x2, y2),
        PixelPoint::new(mid_x, y1),
        PixelPoint::new(mid_x, y2),
        PixelPoint::new(x1, mid_y),
        PixelPoint::new(x2, mid_y),
    ]);

    points
}

pub fn min_distance_to_ball(player: &BoundingBox, ball_center: PixelPoint) -> f64 {
    key_points(player, ball_center)
        .iter()
        .map(|p| p.distance_to(&ball_center))
        .fold(f64::INFINITY, f64::min)
}

/// Evaluate every player; result is ordered by track id.
pub fn evaluate_players(ball: &BoundingBox, players: &[(TrackId, BoundingBox)]) -> Vec<Evidence> {
    let mut evidence: Vec<Evidence> = players
        .iter()
        .map(|(track_id, bbox)| Evidence::evaluate(*track_id, bbox, ball))
        .collect();
    evidence.sort_by_key(|e| e.track_id);
    evidence
}

/// Pick the provisional holder for this frame, if any.
pub fn select_candidate(evidence: &[Evidence], config: &PossessionConfig) -> Option<Evidence> {
    let tight = evidence
        .iter()
        .filter(|e| e.is_tight(config))
        .fold(None::<&Evidence>, |best, e| match best {
            Some(b) if b.containment >= e.containment => Some(b),
            _ => Some(e),
        });

    if let Some(best) = tight {
        return Some(*best);
    }

    evidence
        .iter()
        .filter(|e| e.distance_px < config.distance_threshold_px)
        .fold(None::<&Evidence>, |best, e| match best {
            Some(b) if b.distance_px <= e.distance_px => Some(b),
            _ => Some(e),
        })
        .copied()
}
