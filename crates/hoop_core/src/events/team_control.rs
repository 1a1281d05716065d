//! Team ball-control statistics.
//!
//! Each frame is credited to the team in possession. Loose-ball frames are
//! credited to the last team that had the ball; frames before anyone has
//! had the ball are not counted.

use serde::{Deserialize, Serialize};

use crate::possession::PossessionState;
use crate::types::{FrameIndex, TeamLabel};

/// Running control shares after one frame, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlShare {
    pub frame: FrameIndex,
    pub team_a_pct: f64,
    pub team_b_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamControl {
    pub team_a_frames: u64,
    pub team_b_frames: u64,
    pub timeline: Vec<ControlShare>,
    #[serde(skip)]
    last_team: Option<TeamLabel>,
}

impl TeamControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, frame: FrameIndex, state: &PossessionState) -> ControlShare {
        if let Some(team) = state.team().filter(|t| t.is_known()) {
            self.last_team = Some(team);
        }

        match self.last_team {
            Some(TeamLabel::TeamA) => self.team_a_frames += 1,
            Some(TeamLabel::TeamB) => self.team_b_frames += 1,
            _ => {}
        }

        let share = self.share_at(frame);
        self.timeline.push(share);
        share
    }

    fn share_at(&self, frame: FrameIndex) -> ControlShare {
        let total = self.team_a_frames + self.team_b_frames;
        if total == 0 {
            return ControlShare { frame, team_a_pct: 0.0, team_b_pct: 0.0 };
        }
        let total = total as f64;
        ControlShare {
            frame,
            team_a_pct: 100.0 * self.team_a_frames as f64 / total,
            team_b_pct: 100.0 * self.team_b_frames as f64 / total,
        }
    }

    /// Shares over the whole video so far.
    pub fn overall(&self) -> Option<ControlShare> {
        self.timeline.last().copied()
    }
}
