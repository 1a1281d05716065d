//! # hoop_core - Basketball Possession, Pass and Motion Analysis
//!
//! Turns per-frame detections (players and ball with tracker ids), court
//! keypoints and team labels into a court-relative account of one video.
//!
//! ## Features
//! - Pixel -> court homography with carry-forward across bad frames
//! - Ball possession with hysteresis and possession episodes
//! - Pass / interception detection from possession transitions
//! - Per-track distance and speed in metres
//! - Deterministic output (same input = same report, byte for byte)
//!
//! ## Example
//!
//! ```rust
//! use hoop_core::{analyze, AnalysisConfig, FrameInput};
//!
//! let frames: Vec<FrameInput> = (0..3).map(FrameInput::new).collect();
//! let analysis = analyze(&AnalysisConfig::default(), &frames).unwrap();
//! assert_eq!(analysis.frames.len(), 3);
//! assert!(analysis.possessions.is_empty());
//! ```

// Matrix code indexes rows and columns explicitly
#![allow(clippy::needless_range_loop)]
// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]

pub mod ball;
pub mod config;
pub mod court;
pub mod error;
pub mod events;
pub mod motion;
pub mod ordering;
pub mod pipeline;
pub mod possession;
pub mod teams;
pub mod types;

pub use config::AnalysisConfig;
pub use court::{estimate_homography, map_to_court, CourtLandmarks, CourtMapper, Homography, HomographySource};
pub use error::{AnalysisError, Result};
pub use events::{detect_ball_events, BallEvent, InterceptionEvent, PassEvent, TeamControl};
pub use motion::{MotionSummary, SpeedDistanceAccumulator, TrackMotion};
pub use pipeline::{analyze, analyze_videos, FrameReport, VideoAnalysis, VideoAnalyzer};
pub use possession::{PossessionEvent, PossessionState, PossessionTracker};
pub use types::{
    BoundingBox, CourtPoint, Detection, FrameIndex, FrameInput, KeypointSet, LandmarkId, ObjectClass,
    PixelPoint, TeamLabel, TrackId,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
