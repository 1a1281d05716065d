//! # Ball Events
//!
//! Derived from the closed possession episodes of one video.
//!
//! - `pass_detector` - Passes and interceptions between adjacent episodes
//! - `team_control` - Per-team share of ball control over time

pub mod pass_detector;
pub mod team_control;

pub use pass_detector::{
    classify_transition, detect_ball_events, BallEvent, InterceptionEvent, PassEvent,
};
pub use team_control::{ControlShare, TeamControl};
