//! Latest-wins team label registry.
//!
//! The jersey classifier may revise a track's label at any frame. The registry
//! always answers with the most recent label seen for a track, never a label
//! cached when the track first appeared.

use std::collections::BTreeMap;

use crate::types::{TeamLabel, TrackId};

#[derive(Debug, Clone, Default)]
pub struct TeamRegistry {
    labels: BTreeMap<TrackId, TeamLabel>,
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this frame's labels. `Unknown` never overwrites a known label.
    pub fn observe(&mut self, labels: &BTreeMap<TrackId, TeamLabel>) {
        for (&track_id, &label) in labels {
            if label.is_known() || !self.labels.contains_key(&track_id) {
                self.labels.insert(track_id, label);
            }
        }
    }

    pub fn label(&self, track_id: TrackId) -> TeamLabel {
        self.labels.get(&track_id).copied().unwrap_or_default()
    }
}
