//! Back-navigation history
//!
//! Bounded stack of previously current tracks, consumed only when
//! moving backward past the start of the queue.

use cadence_core::Track;
use std::collections::VecDeque;

/// Default history capacity
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Bounded history stack
///
/// Most recent entry at the back; when full, the oldest entry is
/// discarded on push.
#[derive(Debug, Clone)]
pub struct History {
    tracks: VecDeque<Track>,
    max_size: usize,
}

impl History {
    /// Create new history with the given maximum size
    pub fn new(max_size: usize) -> Self {
        Self {
            tracks: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    /// Push a track, discarding the oldest entry when full
    pub fn push(&mut self, track: Track) {
        if self.tracks.len() >= self.max_size {
            self.tracks.pop_front();
        }
        self.tracks.push_back(track);
    }

    /// Most recent entry without removing it
    pub fn peek(&self) -> Option<&Track> {
        self.tracks.back()
    }

    /// Pop the most recent entry
    pub fn pop(&mut self) -> Option<Track> {
        self.tracks.pop_back()
    }

    /// All entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the history is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    /// Maximum number of entries
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}
