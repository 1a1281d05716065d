//! # Analysis Configuration
//!
//! Every tunable constant of the pipeline lives here. Thresholds are a
//! calibration decision per camera setup, so nothing downstream hardcodes them.
//!
//! ## Usage
//!
//! ```rust
//! use hoop_core::config::AnalysisConfig;
//!
//! let config = AnalysisConfig::default();
//! let zoomed = AnalysisConfig::close_up();
//! let partial = AnalysisConfig::from_yaml_str("possession:\n  grace_frames: 4\n").unwrap();
//! assert_eq!(partial.possession.grace_frames, 4);
//! ```
//!
//! ## Environment Variables
//!
//! - `HOOP_CONFIG`: path of a YAML file read by `from_env_or_default`

mod sections;

pub use sections::{BallConfig, CourtConfig, EventConfig, MotionConfig, PossessionConfig};

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::{AnalysisError, Result};

pub const CONFIG_ENV_VAR: &str = "HOOP_CONFIG";

/// Upper bound for `possession.grace_frames` (over five minutes at 30 fps).
pub const MAX_GRACE_FRAMES: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AnalysisConfig {
    pub court: CourtConfig,
    pub possession: PossessionConfig,
    pub events: EventConfig,
    pub motion: MotionConfig,
    pub ball: BallConfig,
}

impl AnalysisConfig {
    /// Wide broadcast camera (default)
    pub fn broadcast() -> Self {
        Self::default()
    }

    /// Zoomed footage: players and ball are larger, so pixel thresholds scale up
    pub fn close_up() -> Self {
        let mut cfg = Self::default();
        cfg.possession.distance_threshold_px = 110.0;
        cfg.possession.grace_frames = 6;
        cfg.ball.max_jump_px_per_frame = Some(60.0);
        cfg.court.max_carry_frames = Some(90);
        cfg
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: AnalysisConfig = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Load from `HOOP_CONFIG` if set, otherwise defaults.
    pub fn from_env_or_default() -> Self {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => Self::load(&path).unwrap_or_else(|err| {
                warn!(%path, %err, "falling back to default analysis config");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(AnalysisError::InvalidConfig(msg.to_string()));

        if !(self.motion.fps.is_finite() && self.motion.fps > 0.0) {
            return invalid("motion.fps must be positive");
        }
        if self.motion.speed_window_frames == 0 {
            return invalid("motion.speed_window_frames must be at least 1");
        }
        if !(self.possession.distance_threshold_px.is_finite()
            && self.possession.distance_threshold_px > 0.0)
        {
            return invalid("possession.distance_threshold_px must be positive");
        }
        if self.possession.grace_frames > MAX_GRACE_FRAMES {
            return invalid(&format!("possession.grace_frames must be at most {}", MAX_GRACE_FRAMES));
        }
        if !(0.0..=1.0).contains(&self.possession.containment_threshold) {
            return invalid("possession.containment_threshold must be within [0, 1]");
        }
        if !(self.court.max_ratio_error.is_finite() && self.court.max_ratio_error > 0.0) {
            return invalid("court.max_ratio_error must be positive");
        }
        if self.court.landmarks.len() < 4 {
            return invalid("court.landmarks needs at least 4 entries");
        }
        if let Some(jump) = self.ball.max_jump_px_per_frame {
            if !(jump.is_finite() && jump > 0.0) {
                return invalid("ball.max_jump_px_per_frame must be positive");
            }
        }
        Ok(())
    }
}
