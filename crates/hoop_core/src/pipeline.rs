//! # Video Analyzer
//!
//! Threads each frame of one video through the stages in order:
//!
//! 1. Frame ordering guard (a violation halts the analyzer)
//! 2. Team label registry
//! 3. Court mapper (fresh or carried-forward homography)
//! 4. Player anchors to court space
//! 5. Ball jump filter, then possession tracker
//! 6. Team control and speed/distance accumulation
//!
//! Recoverable conditions are reported per frame in `FrameReport::issues`.
//! `finish` can be called at any point; closed episodes and accumulated
//! distances stay valid.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ball::{clean_ball_track, BallJumpFilter};
use crate::config::AnalysisConfig;
use crate::court::{CourtMapper, HomographySource};
use crate::error::{AnalysisError, Result};
use crate::events::{detect_ball_events, BallEvent, TeamControl};
use crate::motion::{step_seconds, MotionSummary, SpeedDistanceAccumulator, TrackMotion};
use crate::ordering::{check_frame_order, FrameClock};
use crate::possession::{PossessionEvent, PossessionState, PossessionTracker};
use crate::teams::TeamRegistry;
use crate::types::{BoundingBox, CourtPoint, FrameIndex, FrameInput, TrackId};

/// Above this many players per frame the court projection runs on the rayon pool.
const PARALLEL_MAPPING_THRESHOLD: usize = 16;

/// Output of one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: FrameIndex,
    pub possession: PossessionState,
    pub homography: HomographySource,
    /// Visible players that could be placed on the court
    pub tracks: BTreeMap<TrackId, TrackMotion>,
    /// Codes of the recoverable conditions hit on this frame
    pub issues: Vec<String>,
}

/// Everything accumulated for one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoAnalysis {
    pub frames: Vec<FrameReport>,
    pub possessions: Vec<PossessionEvent>,
    pub ball_events: Vec<BallEvent>,
    pub team_control: TeamControl,
    pub motion: BTreeMap<TrackId, MotionSummary>,
}

impl VideoAnalysis {
    pub fn pass_count(&self) -> usize {
        self.ball_events.iter().filter(|e| e.is_pass()).count()
    }

    pub fn interception_count(&self) -> usize {
        self.ball_events.iter().filter(|e| e.is_interception()).count()
    }
}

/// Per-video analysis state. One instance per video, never shared.
#[derive(Debug)]
pub struct VideoAnalyzer {
    config: AnalysisConfig,
    clock: FrameClock,
    halted: bool,
    last_time_s: Option<f64>,
    teams: TeamRegistry,
    mapper: CourtMapper,
    ball_filter: BallJumpFilter,
    possession: PossessionTracker,
    team_control: TeamControl,
    motion: SpeedDistanceAccumulator,
    reports: Vec<FrameReport>,
}

impl VideoAnalyzer {
    /// # Errors
    /// `InvalidConfig` if the configuration fails validation.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            clock: FrameClock::new(),
            halted: false,
            last_time_s: None,
            teams: TeamRegistry::new(),
            mapper: CourtMapper::new(&config.court),
            ball_filter: BallJumpFilter::new(&config.ball),
            possession: PossessionTracker::new(config.possession.clone()),
            team_control: TeamControl::new(),
            motion: SpeedDistanceAccumulator::new(&config.motion),
            reports: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Process the next frame of the video.
    ///
    /// # Errors
    /// `OutOfOrderFrame` if `input.frame` does not follow the previous frame.
    /// The analyzer then rejects every later frame as well.
    pub fn process_frame(&mut self, input: &FrameInput) -> Result<FrameReport> {
        let frame = input.frame;
        if self.halted {
            return Err(AnalysisError::OutOfOrderFrame {
                previous: self.clock.last().unwrap_or_default(),
                received: frame,
            });
        }

        let previous = match self.clock.advance(frame) {
            Ok(previous) => previous,
            Err(err) => {
                warn!(frame, %err, "frame ordering violated, analyzer halted");
                self.halted = true;
                return Err(err);
            }
        };

        let mut issues: Vec<AnalysisError> = Vec::new();

        self.teams.observe(&input.teams);

        if let Some(err) = self.mapper.update(frame, &input.keypoints) {
            issues.push(err);
        }

        let players: Vec<(TrackId, BoundingBox)> =
            input.players().map(|d| (d.track_id, d.bbox)).collect();
        let (positions, mapping_failed) = self.map_players(&players);
        if mapping_failed {
            issues.push(AnalysisError::DegenerateHomography);
        }

        let ball = input
            .ball()
            .filter(|d| self.ball_filter.accept(frame, &d.bbox))
            .map(|d| d.bbox);

        let outcome = self.possession.update(frame, ball.as_ref(), &players, &self.teams)?;
        issues.extend(outcome.issue);
        self.team_control.observe(frame, &outcome.state);

        let dt_s = previous
            .map(|prev| step_seconds(prev, self.last_time_s, frame, input.time_s, self.config.motion.fps))
            .unwrap_or(0.0);
        let tracks = self.motion.update(frame, dt_s, &positions)?;
        self.last_time_s = input.time_s;

        for issue in &issues {
            debug!(frame, code = issue.code(), %issue, "recoverable frame issue");
        }

        let report = FrameReport {
            frame,
            possession: outcome.state,
            homography: self.mapper.source(),
            tracks,
            issues: issues.iter().map(|e| e.code().to_string()).collect(),
        };
        self.reports.push(report.clone());
        Ok(report)
    }

    /// Foot positions of every player projected to court metres.
    ///
    /// Returns the projected positions and whether any projection hit a
    /// degenerate point. Without a homography nothing is projected.
    fn map_players(&self, players: &[(TrackId, BoundingBox)]) -> (BTreeMap<TrackId, CourtPoint>, bool) {
        if self.mapper.homography().is_none() {
            return (BTreeMap::new(), false);
        }

        let project = |(track_id, bbox): &(TrackId, BoundingBox)| {
            (*track_id, self.mapper.map(bbox.foot_position()))
        };
        let projected: Vec<(TrackId, Result<CourtPoint>)> = if players.len() > PARALLEL_MAPPING_THRESHOLD {
            players.par_iter().map(project).collect()
        } else {
            players.iter().map(project).collect()
        };

        let mut positions = BTreeMap::new();
        let mut failed = false;
        for (track_id, result) in projected {
            match result {
                Ok(point) => {
                    positions.insert(track_id, point);
                }
                Err(_) => failed = true,
            }
        }
        (positions, failed)
    }

    /// Reports of every frame processed so far.
    pub fn reports(&self) -> &[FrameReport] {
        &self.reports
    }

    /// Possession episodes so far, the open one cut at the last processed frame.
    pub fn possessions(&self) -> Vec<PossessionEvent> {
        self.possession.events()
    }

    pub fn finish(self) -> VideoAnalysis {
        let possessions = self.possession.finish();
        let ball_events = detect_ball_events(&possessions, self.config.events.max_gap_frames);

        info!(
            frames = self.reports.len(),
            possessions = possessions.len(),
            ball_events = ball_events.len(),
            "video analysis finished"
        );

        VideoAnalysis {
            frames: self.reports,
            possessions,
            ball_events,
            team_control: self.team_control,
            motion: self.motion.summaries(),
        }
    }
}

/// Analyze one complete video.
///
/// Frame order is checked before anything runs. Ball gap interpolation then
/// runs when `ball.interpolate_max_gap > 0`.
///
/// # Errors
/// `InvalidConfig` or the first `OutOfOrderFrame` in `frames`.
pub fn analyze(config: &AnalysisConfig, frames: &[FrameInput]) -> Result<VideoAnalysis> {
    let mut analyzer = VideoAnalyzer::new(config.clone())?;

    if let Err(err) = check_frame_order(frames.iter().map(|f| f.frame)) {
        warn!(%err, "frame ordering violated, video rejected");
        return Err(err);
    }

    let cleaned;
    let frames = if config.ball.interpolate_max_gap > 0 {
        cleaned = clean_ball_track(frames, &config.ball);
        cleaned.as_slice()
    } else {
        frames
    };

    for input in frames {
        analyzer.process_frame(input)?;
    }
    Ok(analyzer.finish())
}

/// Analyze independent videos in parallel, one analyzer each.
pub fn analyze_videos(config: &AnalysisConfig, videos: &[Vec<FrameInput>]) -> Vec<Result<VideoAnalysis>> {
    videos
        .par_iter()
        .map(|frames| analyze(config, frames))
        .collect()
}
