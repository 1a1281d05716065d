//! Real-world court landmark table.
//!
//! Landmark ids follow the court keypoint detector's output order. Coordinates
//! are metres on a 28.65 m x 15.24 m court (see `types` for the axes).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{CourtPoint, LandmarkId};

/// Court dimensions in metres.
pub mod dims {
    pub const LENGTH_M: f64 = 28.65;
    pub const WIDTH_M: f64 = 15.24;
    pub const HALF_LENGTH_M: f64 = LENGTH_M / 2.0;
    /// Baseline to free-throw line.
    pub const FREE_THROW_DEPTH_M: f64 = 5.79;
    /// Lane edges measured from the near sideline.
    pub const LANE_NEAR_M: f64 = 5.18;
    pub const LANE_FAR_M: f64 = 10.0;
    /// Three-point corner marks measured from the near sideline.
    pub const CORNER_NEAR_M: f64 = 0.91;
    pub const CORNER_FAR_M: f64 = 14.1;
}

/// Fixed mapping from landmark id to court coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourtLandmarks {
    points: BTreeMap<LandmarkId, CourtPoint>,
}

impl CourtLandmarks {
    pub fn new(points: BTreeMap<LandmarkId, CourtPoint>) -> Self {
        Self { points }
    }

    /// The 18-point basketball layout.
    pub fn basketball() -> Self {
        use dims::*;

        let table = [
            // Left baseline
            (0.0, 0.0),
            (0.0, CORNER_NEAR_M),
            (0.0, LANE_NEAR_M),
            (0.0, LANE_FAR_M),
            (0.0, CORNER_FAR_M),
            (0.0, WIDTH_M),
            // Left free-throw line
            (FREE_THROW_DEPTH_M, LANE_NEAR_M),
            (FREE_THROW_DEPTH_M, LANE_FAR_M),
            // Half-court line
            (HALF_LENGTH_M, WIDTH_M),
            (HALF_LENGTH_M, 0.0),
            // Right free-throw line
            (LENGTH_M - FREE_THROW_DEPTH_M, LANE_NEAR_M),
            (LENGTH_M - FREE_THROW_DEPTH_M, LANE_FAR_M),
            // Right baseline
            (LENGTH_M, WIDTH_M),
            (LENGTH_M, CORNER_FAR_M),
            (LENGTH_M, LANE_FAR_M),
            (LENGTH_M, LANE_NEAR_M),
            (LENGTH_M, CORNER_NEAR_M),
            (LENGTH_M, 0.0),
        ];

        let points = table
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| (id as LandmarkId, CourtPoint::new(x, y)))
            .collect();

        Self { points }
    }

    pub fn get(&self, id: LandmarkId) -> Option<CourtPoint> {
        self.points.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LandmarkId, CourtPoint)> + '_ {
        self.points.iter().map(|(&id, &p)| (id, p))
    }
}

impl Default for CourtLandmarks {
    fn default() -> Self {
        Self::basketball()
    }
}
