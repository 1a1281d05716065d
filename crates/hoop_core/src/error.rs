use thiserror::Error;

use crate::types::FrameIndex;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Insufficient keypoints: found {found} usable correspondences, need 4 in general position")]
    InsufficientKeypoints { found: usize },

    #[error("Degenerate homography")]
    DegenerateHomography,

    #[error("No ball detected")]
    NoBallDetected,

    #[error("No players detected")]
    NoPlayersDetected,

    #[error("Out of order frame: received {received} after {previous}")]
    OutOfOrderFrame {
        previous: FrameIndex,
        received: FrameIndex,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl AnalysisError {
    /// Frame-local problems that are absorbed by carry-forward or skip-frame policies.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AnalysisError::InsufficientKeypoints { .. } => true,
            AnalysisError::DegenerateHomography => true,
            AnalysisError::NoBallDetected => true,
            AnalysisError::NoPlayersDetected => true,
            AnalysisError::OutOfOrderFrame { .. } => false,
            _ => false,
        }
    }

    /// Short stable code used in serialized frame reports.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::InsufficientKeypoints { .. } => "insufficient_keypoints",
            AnalysisError::DegenerateHomography => "degenerate_homography",
            AnalysisError::NoBallDetected => "no_ball_detected",
            AnalysisError::NoPlayersDetected => "no_players_detected",
            AnalysisError::OutOfOrderFrame { .. } => "out_of_order_frame",
            AnalysisError::InvalidConfig(_) => "invalid_config",
            AnalysisError::Io(_) => "io",
            AnalysisError::Yaml(_) => "yaml",
        }
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
