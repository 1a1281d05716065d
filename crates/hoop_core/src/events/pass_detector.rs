//! # Pass / Interception Detector
//!
//! Classifies the transition between each pair of adjacent possession episodes.
//!
//! ## Algorithm
//! 1. Skip pairs separated by more than `max_gap_frames` loose-ball frames
//! 2. Skip pairs with the same holder (hysteresis already merged them upstream)
//! 3. Skip pairs where either team is unknown
//! 4. Same team = pass, different team = interception
//!
//! Teams are read at the transition: the previous holder's label on its last
//! frame and the new holder's label on its first frame. Later relabels of
//! either player do not change the classification.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::possession::PossessionEvent;
use crate::types::{FrameIndex, TeamLabel, TrackId};

/// Ball moved between two players of the same team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassEvent {
    /// Last frame the passer held the ball
    pub from_frame: FrameIndex,
    /// First frame the receiver held the ball
    pub to_frame: FrameIndex,
    pub passer: TrackId,
    pub receiver: TrackId,
    pub team: TeamLabel,
}

/// Ball moved to the other team (turnover).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptionEvent {
    pub from_frame: FrameIndex,
    pub to_frame: FrameIndex,
    pub lost_by: TrackId,
    pub lost_by_team: TeamLabel,
    pub won_by: TrackId,
    pub won_by_team: TeamLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BallEvent {
    Pass(PassEvent),
    Interception(InterceptionEvent),
}

impl BallEvent {
    /// Frame at which the new holder has the ball.
    pub fn frame(&self) -> FrameIndex {
        match self {
            BallEvent::Pass(p) => p.to_frame,
            BallEvent::Interception(i) => i.to_frame,
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, BallEvent::Pass(_))
    }

    pub fn is_interception(&self) -> bool {
        matches!(self, BallEvent::Interception(_))
    }
}

/// Loose-ball frames strictly between two episodes.
fn gap_frames(prev: &PossessionEvent, next: &PossessionEvent) -> u64 {
    next.start_frame.saturating_sub(prev.end_frame).saturating_sub(1)
}

/// Classify one transition, if it is meaningful.
pub fn classify_transition(
    prev: &PossessionEvent,
    next: &PossessionEvent,
    max_gap_frames: u64,
) -> Option<BallEvent> {
    if gap_frames(prev, next) > max_gap_frames {
        return None;
    }
    if prev.track_id == next.track_id {
        return None;
    }
    let (from_team, to_team) = (prev.team, next.start_team);
    if !from_team.is_known() || !to_team.is_known() {
        debug!(
            from = prev.track_id,
            to = next.track_id,
            frame = next.start_frame,
            "unclassifiable transition, unknown team"
        );
        return None;
    }

    let event = if from_team == to_team {
        BallEvent::Pass(PassEvent {
            from_frame: prev.end_frame,
            to_frame: next.start_frame,
            passer: prev.track_id,
            receiver: next.track_id,
            team: from_team,
        })
    } else {
        BallEvent::Interception(InterceptionEvent {
            from_frame: prev.end_frame,
            to_frame: next.start_frame,
            lost_by: prev.track_id,
            lost_by_team: from_team,
            won_by: next.track_id,
            won_by_team: to_team,
        })
    };

    Some(event)
}

/// Detect passes and interceptions in an ordered episode list.
pub fn detect_ball_events(events: &[PossessionEvent], max_gap_frames: u64) -> Vec<BallEvent> {
    events
        .windows(2)
        .filter_map(|pair| classify_transition(&pair[0], &pair[1], max_gap_frames))
        .collect()
}
