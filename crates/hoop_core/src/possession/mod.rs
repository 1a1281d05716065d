//! # Possession Module
//!
//! Frame-by-frame ball possession with hysteresis, and the possession episodes
//! it produces.
//!
//! - `candidate` - Which player is tied to the ball in a single frame
//! - `tracker` - Holder state machine and episode bookkeeping

pub mod candidate;
pub mod tracker;

pub use candidate::{evaluate_players, select_candidate, Evidence};
pub use tracker::{PossessionOutcome, PossessionTracker};

use serde::{Deserialize, Serialize};

use crate::types::{FrameIndex, TeamLabel, TrackId};

/// Who holds the ball in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PossessionState {
    NoPossession,
    Held {
        track_id: TrackId,
        team: TeamLabel,
        confidence: f64,
    },
}

impl PossessionState {
    pub fn holder(&self) -> Option<TrackId> {
        match self {
            PossessionState::Held { track_id, .. } => Some(*track_id),
            PossessionState::NoPossession => None,
        }
    }

    pub fn team(&self) -> Option<TeamLabel> {
        match self {
            PossessionState::Held { team, .. } => Some(*team),
            PossessionState::NoPossession => None,
        }
    }
}

/// One uninterrupted possession episode. `end_frame` is inclusive.
///
/// `start_team` is the holder's label on `start_frame` and never changes;
/// `team` is the holder's label on `end_frame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PossessionEvent {
    pub start_frame: FrameIndex,
    pub end_frame: FrameIndex,
    pub track_id: TrackId,
    pub start_team: TeamLabel,
    pub team: TeamLabel,
}

impl PossessionEvent {
    /// Episode whose holder kept one label throughout.
    pub fn new(start_frame: FrameIndex, end_frame: FrameIndex, track_id: TrackId, team: TeamLabel) -> Self {
        Self { start_frame, end_frame, track_id, start_team: team, team }
    }

    pub fn with_start_team(mut self, start_team: TeamLabel) -> Self {
        self.start_team = start_team;
        self
    }

    /// Number of frames in the episode.
    pub fn duration_frames(&self) -> u64 {
        self.end_frame.saturating_sub(self.start_frame) + 1
    }
}
