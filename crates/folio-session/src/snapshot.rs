//! Points in time across the history logs.

use serde::{Deserialize, Serialize};

/// Lengths of the three history logs right after one player action.
///
/// Index 0 of a session's snapshot list is [`Snapshot::START`], the story
/// start, which is never written to or read from a session file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Length of the queue history.
    pub queue: usize,
    /// Length of the asset history.
    pub assets: usize,
    /// Length of the value change log.
    pub changes: usize,
}

impl Snapshot {
    /// The story-start sentinel.
    pub const START: Snapshot = Snapshot {
        queue: 0,
        assets: 0,
        changes: 0,
    };

    /// Create a snapshot from log lengths.
    pub fn new(queue: usize, assets: usize, changes: usize) -> Self {
        Self {
            queue,
            assets,
            changes,
        }
    }

    /// Whether no field is smaller than the matching field of `previous`.
    pub fn follows(&self, previous: &Snapshot) -> bool {
        self.queue >= previous.queue
            && self.assets >= previous.assets
            && self.changes >= previous.changes
    }
}
