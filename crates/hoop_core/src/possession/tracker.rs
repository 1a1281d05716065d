//! # Possession Tracker
//!
//! Holder state machine for one video.
//!
//! ## Rules
//! - No ball box: the holder carries forward untouched
//! - Candidate is the holder: counters reset
//! - No holder yet: the candidate is acquired on the same frame
//! - Different candidate while the holder is out of range: switch on the same frame
//! - Different candidate while the holder is still in range: the holder keeps the
//!   ball until the same challenger has led for more than `grace_frames` frames
//! - No candidate: the holder is cleared once more than `grace_frames` frames pass
//!
//! Every episode covers exactly the frames whose published state named its holder.

use tracing::info;

use super::candidate::{evaluate_players, select_candidate, Evidence};
use super::{PossessionEvent, PossessionState};
use crate::config::PossessionConfig;
use crate::error::{AnalysisError, Result};
use crate::ordering::FrameClock;
use crate::teams::TeamRegistry;
use crate::types::{BoundingBox, FrameIndex, TeamLabel, TrackId};

/// Published state plus the non-fatal condition hit on this frame, if any.
#[derive(Debug)]
pub struct PossessionOutcome {
    pub state: PossessionState,
    pub issue: Option<AnalysisError>,
}

#[derive(Debug, Clone, Copy)]
struct Holder {
    track_id: TrackId,
    /// Confidence of the last frame that had evidence for this holder
    confidence: f64,
}

#[derive(Debug, Clone, Copy)]
struct OpenEpisode {
    track_id: TrackId,
    start_frame: FrameIndex,
    last_frame: FrameIndex,
    /// Label when the episode opened, fixed
    start_team: TeamLabel,
    /// Label on `last_frame`
    team: TeamLabel,
}

impl OpenEpisode {
    fn close(self) -> PossessionEvent {
        PossessionEvent::new(self.start_frame, self.last_frame, self.track_id, self.team)
            .with_start_team(self.start_team)
    }
}

#[derive(Debug, Clone)]
pub struct PossessionTracker {
    config: PossessionConfig,
    clock: FrameClock,
    holder: Option<Holder>,
    frames_without_candidate: u32,
    challenger: Option<(TrackId, u32)>,
    open: Option<OpenEpisode>,
    closed: Vec<PossessionEvent>,
}

impl PossessionTracker {
    pub fn new(config: PossessionConfig) -> Self {
        Self {
            config,
            clock: FrameClock::new(),
            holder: None,
            frames_without_candidate: 0,
            challenger: None,
            open: None,
            closed: Vec::new(),
        }
    }

    /// Advance one frame.
    ///
    /// # Errors
    /// `OutOfOrderFrame` if `frame` does not follow the previous frame.
    pub fn update(
        &mut self,
        frame: FrameIndex,
        ball: Option<&BoundingBox>,
        players: &[(TrackId, BoundingBox)],
        teams: &TeamRegistry,
    ) -> Result<PossessionOutcome> {
        self.clock.advance(frame)?;

        let Some(ball) = ball else {
            let state = self.publish(frame, teams);
            return Ok(PossessionOutcome { state, issue: Some(AnalysisError::NoBallDetected) });
        };

        let issue = players.is_empty().then_some(AnalysisError::NoPlayersDetected);
        let evidence = evaluate_players(ball, players);
        let candidate = select_candidate(&evidence, &self.config);

        match (self.holder, candidate) {
            (Some(holder), Some(c)) if c.track_id == holder.track_id => {
                self.frames_without_candidate = 0;
                self.challenger = None;
                self.holder = Some(Holder { confidence: c.confidence(&self.config), ..holder });
            }
            (None, Some(c)) => self.switch_to(frame, &c, teams),
            (Some(holder), Some(c)) => {
                self.frames_without_candidate = 0;
                let incumbent = evidence
                    .iter()
                    .find(|e| e.track_id == holder.track_id && e.in_range(&self.config));

                match incumbent {
                    None => self.switch_to(frame, &c, teams),
                    Some(inc) => {
                        let streak = match self.challenger {
                            Some((id, n)) if id == c.track_id => n.saturating_add(1),
                            _ => 1,
                        };
                        if streak > self.config.grace_frames {
                            self.switch_to(frame, &c, teams);
                        } else {
                            self.challenger = Some((c.track_id, streak));
                            self.holder = Some(Holder { confidence: inc.confidence(&self.config), ..holder });
                        }
                    }
                }
            }
            (Some(holder), None) => {
                self.challenger = None;
                self.frames_without_candidate = self.frames_without_candidate.saturating_add(1);
                if self.frames_without_candidate > self.config.grace_frames {
                    info!(frame, track_id = holder.track_id, "possession lost");
                    self.close_open();
                    self.holder = None;
                    self.frames_without_candidate = 0;
                }
            }
            (None, None) => {}
        }

        let state = self.publish(frame, teams);
        Ok(PossessionOutcome { state, issue })
    }

    fn switch_to(&mut self, frame: FrameIndex, candidate: &Evidence, teams: &TeamRegistry) {
        let previous = self.holder.map(|h| h.track_id);
        self.close_open();

        info!(frame, from = ?previous, to = candidate.track_id, "possession acquired");

        self.holder = Some(Holder {
            track_id: candidate.track_id,
            confidence: candidate.confidence(&self.config),
        });
        self.frames_without_candidate = 0;
        self.challenger = None;
        let team = teams.label(candidate.track_id);
        self.open = Some(OpenEpisode {
            track_id: candidate.track_id,
            start_frame: frame,
            last_frame: frame,
            start_team: team,
            team,
        });
    }

    fn close_open(&mut self) {
        if let Some(open) = self.open.take() {
            self.closed.push(open.close());
        }
    }

    /// Build this frame's state and extend the open episode.
    fn publish(&mut self, frame: FrameIndex, teams: &TeamRegistry) -> PossessionState {
        let Some(holder) = self.holder else {
            return PossessionState::NoPossession;
        };

        let team = teams.label(holder.track_id);
        if let Some(open) = self.open.as_mut() {
            open.last_frame = frame;
            open.team = team;
        }

        let decay = 1.0 - self.frames_without_candidate as f64 / (self.config.grace_frames as f64 + 1.0);
        PossessionState::Held {
            track_id: holder.track_id,
            team,
            confidence: holder.confidence * decay,
        }
    }

    pub fn holder(&self) -> Option<TrackId> {
        self.holder.map(|h| h.track_id)
    }

    /// Closed episodes plus the open one cut at the last processed frame.
    pub fn events(&self) -> Vec<PossessionEvent> {
        let mut events = self.closed.clone();
        if let Some(open) = self.open {
            events.push(open.close());
        }
        events
    }

    /// Close the open episode at the last processed frame and return all episodes.
    pub fn finish(mut self) -> Vec<PossessionEvent> {
        self.close_open();
        self.closed
    }
}
