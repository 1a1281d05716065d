//! Frame ordering guard shared by the stateful stages.

use crate::error::{AnalysisError, Result};
use crate::types::FrameIndex;

/// Remembers the last accepted frame and rejects anything not strictly after it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClock {
    last: Option<FrameIndex>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `frame` and return the previously accepted frame.
    pub fn advance(&mut self, frame: FrameIndex) -> Result<Option<FrameIndex>> {
        if let Some(previous) = self.last {
            if frame <= previous {
                return Err(AnalysisError::OutOfOrderFrame { previous, received: frame });
            }
        }
        Ok(self.last.replace(frame))
    }

    pub fn last(&self) -> Option<FrameIndex> {
        self.last
    }
}

/// Check a whole sequence up front. Returns the first violation.
pub fn check_frame_order<I>(frames: I) -> Result<()>
where
    I: IntoIterator<Item = FrameIndex>,
{
    let mut clock = FrameClock::new();
    frames.into_iter().try_for_each(|frame| clock.advance(frame).map(|_| ()))
}
