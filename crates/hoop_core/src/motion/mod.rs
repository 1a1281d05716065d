//! # Speed / Distance Accumulator
//!
//! Per-track cumulative distance and windowed speed in court metres.
//!
//! ## Algorithm
//! 1. A track's previous point is only trusted if the track was observed on
//!    the previous processed frame
//! 2. Otherwise (new track, reappearance, mapping failure) the point is
//!    recorded and no distance is added
//! 3. Speed = sum of displacement / sum of dt over the last
//!    `speed_window_frames` steps

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::MotionConfig;
use crate::error::Result;
use crate::ordering::FrameClock;
use crate::types::{CourtPoint, FrameIndex, TrackId};

/// One track's motion after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackMotion {
    pub position: CourtPoint,
    pub cumulative_distance_m: f64,
    pub speed_mps: f64,
}

/// Whole-video totals for one track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionSummary {
    pub total_distance_m: f64,
    pub max_speed_mps: f64,
    pub frames_observed: u64,
}

/// Running state of a track visible on the last processed frame.
///
/// Dropped as soon as the track misses a frame; only its `MotionSummary`
/// outlives it.
#[derive(Debug, Clone, Default)]
pub struct PlayerMotionState {
    pub last_position: Option<CourtPoint>,
    /// (displacement_m, dt_s) of the most recent steps
    window: VecDeque<(f64, f64)>,
}

impl PlayerMotionState {
    fn windowed_speed(&self) -> f64 {
        let (distance, time) = self
            .window
            .iter()
            .fold((0.0, 0.0), |(d, t), (step_d, step_t)| (d + step_d, t + step_t));
        if time > 0.0 {
            distance / time
        } else {
            0.0
        }
    }
}

/// Seconds between two processed frames.
///
/// Uses timestamps when both frames carry one, otherwise the frame gap at `fps`.
pub fn step_seconds(
    prev_frame: FrameIndex,
    prev_time_s: Option<f64>,
    frame: FrameIndex,
    time_s: Option<f64>,
    fps: f64,
) -> f64 {
    match (prev_time_s, time_s) {
        (Some(t0), Some(t1)) if t1 > t0 => t1 - t0,
        _ => frame.saturating_sub(prev_frame) as f64 / fps,
    }
}

#[derive(Debug, Clone)]
pub struct SpeedDistanceAccumulator {
    window_len: usize,
    clock: FrameClock,
    /// Tracks seen on the previous processed frame
    active: BTreeMap<TrackId, PlayerMotionState>,
    totals: BTreeMap<TrackId, MotionSummary>,
}

impl SpeedDistanceAccumulator {
    pub fn new(config: &MotionConfig) -> Self {
        Self {
            window_len: config.speed_window_frames.max(1),
            clock: FrameClock::new(),
            active: BTreeMap::new(),
            totals: BTreeMap::new(),
        }
    }

    /// Advance every visible track by one frame.
    ///
    /// `dt_s` is the time since the previous processed frame. Tracks absent
    /// from `positions` lose their running state.
    pub fn update(
        &mut self,
        frame: FrameIndex,
        dt_s: f64,
        positions: &BTreeMap<TrackId, CourtPoint>,
    ) -> Result<BTreeMap<TrackId, TrackMotion>> {
        self.clock.advance(frame)?;
        let dt_s = if dt_s.is_finite() { dt_s.max(0.0) } else { 0.0 };
        let window_len = self.window_len;

        let mut active = BTreeMap::new();
        let mut visible = BTreeMap::new();
        for (&track_id, &position) in positions {
            let totals = self.totals.entry(track_id).or_default();
            let mut state = self.active.remove(&track_id).unwrap_or_default();

            if let Some(last) = state.last_position {
                let step = last.distance_to(&position);
                totals.total_distance_m += step;
                state.window.push_back((step, dt_s));
                while state.window.len() > window_len {
                    state.window.pop_front();
                }
            }

            let speed_mps = state.windowed_speed();
            totals.max_speed_mps = totals.max_speed_mps.max(speed_mps);
            totals.frames_observed += 1;
            state.last_position = Some(position);

            visible.insert(
                track_id,
                TrackMotion {
                    position,
                    cumulative_distance_m: totals.total_distance_m,
                    speed_mps,
                },
            );
            active.insert(track_id, state);
        }

        if !self.active.is_empty() {
            trace!(frame, dropped = self.active.len(), "tracks left view");
        }
        self.active = active;

        Ok(visible)
    }

    /// Number of tracks carrying running state into the next frame.
    pub fn active_tracks(&self) -> usize {
        self.active.len()
    }

    pub fn summary(&self, track_id: TrackId) -> Option<MotionSummary> {
        self.totals.get(&track_id).copied()
    }

    pub fn summaries(&self) -> BTreeMap<TrackId, MotionSummary> {
        self.totals.clone()
    }
}
