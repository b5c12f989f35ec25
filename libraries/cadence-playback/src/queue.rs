//! Playback queue
//!
//! Ordered track sequence with a current position and a bounded
//! back-navigation history. All mutation is best-effort: out-of-range
//! indices and missing ids are no-ops, never panics or errors.

use crate::history::History;
use cadence_core::{Track, TrackId};
use serde::{Deserialize, Serialize};

/// Serializable queue state for the durable store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Tracks in queue order
    pub tracks: Vec<Track>,

    /// Current position
    pub current_index: usize,
}

/// Ordered playback sequence with position and back-history
///
/// Invariants:
/// - `current_index` is a valid index whenever the queue is non-empty,
///   and 0 when it is empty
/// - the most recent history entry is never the current track
///   immediately after a move
/// - queue entries have unique ids, except where a batch insert
///   deliberately re-queues the currently playing track
#[derive(Debug, Clone)]
pub struct QueueManager {
    tracks: Vec<Track>,
    current_index: usize,
    history: History,
    generation: u64,
}

impl QueueManager {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::with_history_capacity(crate::history::DEFAULT_HISTORY_CAPACITY)
    }

    /// Create an empty queue with a custom history capacity
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            tracks: Vec::new(),
            current_index: 0,
            history: History::new(capacity),
            generation: 0,
        }
    }

    /// Replace the queue wholesale
    ///
    /// Clamps `start_index` into range, clears the back-history and
    /// bumps the queue generation, invalidating prefetch plans keyed to
    /// the previous queue identity.
    pub fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        self.tracks = tracks;
        self.current_index = if self.tracks.is_empty() {
            0
        } else {
            start_index.min(self.tracks.len() - 1)
        };
        self.history.clear();
        self.generation += 1;
    }

    /// Insert a track immediately after the current position
    ///
    /// An existing occurrence at another index is moved rather than
    /// duplicated; inserting the currently playing track is a no-op.
    pub fn play_next(&mut self, track: Track) {
        if self.tracks.is_empty() {
            self.tracks.push(track);
            return;
        }

        if let Some(pos) = self.position_of(&track.id) {
            if pos == self.current_index {
                return;
            }
            self.tracks.remove(pos);
            if pos < self.current_index {
                // Target slot shifts down with the removal
                self.current_index -= 1;
            }
        }

        self.tracks.insert(self.current_index + 1, track);
    }

    /// Append a track unless its id is already present anywhere
    pub fn add_to_queue(&mut self, track: Track) {
        if self.position_of(&track.id).is_none() {
            self.tracks.push(track);
        }
    }

    /// Batched `play_next`
    ///
    /// A track is skipped only when it already exists at an index other
    /// than the current one; a track matching the current slot may be
    /// queued again.
    pub fn play_next_multiple(&mut self, tracks: Vec<Track>) {
        let mut slot = if self.tracks.is_empty() {
            0
        } else {
            self.current_index + 1
        };

        for track in tracks {
            if self.exists_elsewhere(&track.id) {
                continue;
            }
            self.tracks.insert(slot, track);
            slot += 1;
        }
    }

    /// Batched `add_to_queue` with the same dedup rule as
    /// [`Self::play_next_multiple`]
    pub fn add_to_queue_multiple(&mut self, tracks: Vec<Track>) {
        for track in tracks {
            if self.exists_elsewhere(&track.id) {
                continue;
            }
            self.tracks.push(track);
        }
    }

    /// Jump to a track by index
    ///
    /// Pushes the outgoing current track onto the back-history and
    /// returns the new current track. Out-of-range indices return
    /// `None` without touching any state. Selecting the current index
    /// returns the track without a history push.
    pub fn play_track_at_index(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }

        if index != self.current_index {
            let outgoing = self.tracks[self.current_index].clone();
            self.history.push(outgoing);
            self.current_index = index;
        }

        Some(self.tracks[self.current_index].clone())
    }

    /// Advance to the next queue slot
    ///
    /// Returns `None` at the last index; wraparound-on-repeat is a
    /// policy decision left to the playback driver.
    pub fn go_to_next(&mut self) -> Option<Track> {
        if self.tracks.is_empty() || self.current_index + 1 >= self.tracks.len() {
            return None;
        }
        self.play_track_at_index(self.current_index + 1)
    }

    /// Step back one slot, or replay from the back-history
    ///
    /// Within the queue this moves the index without consuming history.
    /// At index 0 the most recent history entry is reinserted at the
    /// front (any other occurrence of the same id is removed first, so
    /// the queue returns duplicate-free) and becomes current.
    pub fn go_to_previous(&mut self) -> Option<Track> {
        if self.current_index > 0 {
            self.current_index -= 1;
            return Some(self.tracks[self.current_index].clone());
        }

        let track = self.history.pop()?;
        if let Some(pos) = self.position_of(&track.id) {
            self.tracks.remove(pos);
        }
        self.tracks.insert(0, track.clone());
        self.current_index = 0;
        Some(track)
    }

    /// Reorder a track from one index to another
    ///
    /// No-op when either index is out of range or they are equal. The
    /// current position follows the move so that the current track is
    /// unchanged (verify by id, not index).
    pub fn move_track(&mut self, from: usize, to: usize) {
        let len = self.tracks.len();
        if from == to || from >= len || to >= len {
            return;
        }

        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);

        if from == self.current_index {
            self.current_index = to;
        } else if from < self.current_index && to >= self.current_index {
            self.current_index -= 1;
        } else if from > self.current_index && to <= self.current_index {
            self.current_index += 1;
        }
    }

    /// Remove the track at an index
    ///
    /// The currently playing slot cannot be removed this way; both that
    /// and out-of-range indices are no-ops.
    pub fn remove_track(&mut self, index: usize) {
        if index >= self.tracks.len() || index == self.current_index {
            return;
        }

        self.tracks.remove(index);
        if index < self.current_index {
            self.current_index -= 1;
        }
    }

    /// Currently playing track, `None` when the queue is empty
    pub fn current_track(&self) -> Option<&Track> {
        self.tracks.get(self.current_index)
    }

    /// Whether a next queue slot exists
    pub fn has_next(&self) -> bool {
        !self.tracks.is_empty() && self.current_index + 1 < self.tracks.len()
    }

    /// Whether backward navigation is possible (in-queue or via history)
    pub fn has_previous(&self) -> bool {
        self.current_index > 0 || !self.history.is_empty()
    }

    /// Tracks in queue order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Current position
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Queue identity, bumped by every wholesale replacement
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of tracks in the queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Read-only view of the back-history
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Serializable snapshot of tracks and position
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.tracks.clone(),
            current_index: self.current_index,
        }
    }

    /// Restore a snapshot (a wholesale replacement: clears history and
    /// bumps the generation)
    pub fn restore(&mut self, snapshot: QueueSnapshot) {
        self.set_queue(snapshot.tracks, snapshot.current_index);
    }

    fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|t| &t.id == id)
    }

    fn exists_elsewhere(&self, id: &TrackId) -> bool {
        self.tracks
            .iter()
            .enumerate()
            .any(|(i, t)| &t.id == id && i != self.current_index)
    }
}

impl Default for QueueManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::MediaLocator;
    use std::time::Duration;

    fn create_test_track(id: &str) -> Track {
        Track {
            id: TrackId::new(id),
            title: format!("Track {id}"),
            artist: "Test Artist".to_string(),
            channel: "Test Channel".to_string(),
            duration: Duration::from_secs(180),
            thumbnail_url: None,
            media: MediaLocator::Remote(format!("https://cdn.example/{id}")),
            favorite: false,
            play_count: 0,
        }
    }

    fn queue_of(ids: &[&str]) -> QueueManager {
        let mut queue = QueueManager::new();
        queue.set_queue(ids.iter().map(|id| create_test_track(id)).collect(), 0);
        queue
    }

    fn ids(queue: &QueueManager) -> Vec<&str> {
        queue.tracks().iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn empty_queue_defaults() {
        let queue = QueueManager::new();
        assert!(queue.is_empty());
        assert_eq!(queue.current_index(), 0);
        assert!(queue.current_track().is_none());
        assert!(!queue.has_next());
        assert!(!queue.has_previous());
    }

    #[test]
    fn set_queue_clamps_start_index() {
        let mut queue = QueueManager::new();
        queue.set_queue(vec![create_test_track("a"), create_test_track("b")], 99);
        assert_eq!(queue.current_index(), 1);

        queue.set_queue(Vec::new(), 5);
        assert_eq!(queue.current_index(), 0);
    }

    #[test]
    fn set_queue_clears_history_and_bumps_generation() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.play_track_at_index(2);
        assert!(!queue.history().is_empty());

        let generation = queue.generation();
        queue.set_queue(vec![create_test_track("x")], 0);
        assert!(queue.history().is_empty());
        assert_eq!(queue.generation(), generation + 1);
    }

    #[test]
    fn play_next_inserts_after_current() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.play_next(create_test_track("d"));
        assert_eq!(ids(&queue), vec!["a", "d", "b", "c"]);
        assert_eq!(queue.current_index(), 0);
    }

    #[test]
    fn play_next_moves_existing_occurrence() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.play_track_at_index(1);

        // "c" exists after the target slot; it moves, no duplicate
        queue.play_next(create_test_track("c"));
        assert_eq!(ids(&queue), vec!["a", "b", "c"]);
        assert_eq!(queue.current_track().unwrap().id.as_str(), "b");
    }

    #[test]
    fn play_next_compensates_for_removal_before_current() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.play_track_at_index(2);

        // "a" sits before the current slot; removing it shifts the target
        queue.play_next(create_test_track("a"));
        assert_eq!(ids(&queue), vec!["b", "c", "a"]);
        assert_eq!(queue.current_track().unwrap().id.as_str(), "c");
    }

    #[test]
    fn play_next_current_track_is_noop() {
        let mut queue = queue_of(&["a", "b"]);
        queue.play_next(create_test_track("a"));
        assert_eq!(ids(&queue), vec!["a", "b"]);
    }

    #[test]
    fn play_next_twice_yields_single_occurrence() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.play_next(create_test_track("d"));
        queue.play_next(create_test_track("d"));

        let count = queue.tracks().iter().filter(|t| t.id.as_str() == "d").count();
        assert_eq!(count, 1);
        assert_eq!(ids(&queue), vec!["a", "d", "b", "c"]);
    }

    #[test]
    fn play_next_on_empty_queue() {
        let mut queue = QueueManager::new();
        queue.play_next(create_test_track("a"));
        assert_eq!(ids(&queue), vec!["a"]);
        assert_eq!(queue.current_index(), 0);
        assert_eq!(queue.current_track().unwrap().id.as_str(), "a");
    }

    #[test]
    fn add_to_queue_dedups_anywhere() {
        let mut queue = queue_of(&["a", "b"]);
        queue.add_to_queue(create_test_track("a"));
        queue.add_to_queue(create_test_track("c"));
        assert_eq!(ids(&queue), vec!["a", "b", "c"]);
    }

    #[test]
    fn batch_insert_allows_requeue_of_current() {
        let mut queue = queue_of(&["a", "b", "c"]);

        // "a" is current and may be queued again; "b" exists elsewhere
        queue.play_next_multiple(vec![
            create_test_track("a"),
            create_test_track("b"),
            create_test_track("d"),
        ]);
        assert_eq!(ids(&queue), vec!["a", "a", "d", "b", "c"]);
    }

    #[test]
    fn batch_append_preserves_order() {
        let mut queue = queue_of(&["a", "b"]);
        queue.add_to_queue_multiple(vec![
            create_test_track("b"),
            create_test_track("c"),
            create_test_track("d"),
        ]);
        assert_eq!(ids(&queue), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn play_track_at_index_pushes_history() {
        let mut queue = queue_of(&["a", "b", "c"]);
        let track = queue.play_track_at_index(2).unwrap();
        assert_eq!(track.id.as_str(), "c");
        assert_eq!(queue.current_index(), 2);
        assert_eq!(queue.history().peek().unwrap().id.as_str(), "a");
    }

    #[test]
    fn play_track_at_index_out_of_bounds() {
        let mut queue = queue_of(&["a"]);
        assert!(queue.play_track_at_index(1).is_none());
        assert_eq!(queue.current_index(), 0);
        assert!(queue.history().is_empty());
    }

    #[test]
    fn play_track_at_current_index_skips_history() {
        let mut queue = queue_of(&["a", "b"]);
        let track = queue.play_track_at_index(0).unwrap();
        assert_eq!(track.id.as_str(), "a");
        assert!(queue.history().is_empty());
    }

    #[test]
    fn go_to_next_stops_at_end() {
        let mut queue = queue_of(&["a", "b"]);
        assert_eq!(queue.go_to_next().unwrap().id.as_str(), "b");
        assert!(queue.go_to_next().is_none());
        assert_eq!(queue.current_index(), 1);
    }

    #[test]
    fn go_to_previous_moves_back_without_consuming_history() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.go_to_next();
        queue.go_to_next();
        let history_len = queue.history().len();

        let track = queue.go_to_previous().unwrap();
        assert_eq!(track.id.as_str(), "b");
        assert_eq!(queue.history().len(), history_len);
    }

    #[test]
    fn go_to_previous_at_front_pops_history() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.play_track_at_index(2);

        // Current is "c" at index 2; walk back to the front first
        queue.go_to_previous();
        queue.go_to_previous();
        assert_eq!(queue.current_index(), 0);

        // History holds "a"; popping reinserts it at the front without
        // duplicating the existing occurrence
        let track = queue.go_to_previous().unwrap();
        assert_eq!(track.id.as_str(), "a");
        assert_eq!(queue.current_index(), 0);
        assert_eq!(ids(&queue), vec!["a", "b", "c"]);
    }

    #[test]
    fn go_to_previous_exhausted_returns_none() {
        let mut queue = queue_of(&["a"]);
        assert!(queue.go_to_previous().is_none());
    }

    #[test]
    fn move_track_follows_current() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.move_track(0, 2);
        assert_eq!(ids(&queue), vec!["b", "c", "a"]);
        assert_eq!(queue.current_index(), 2);
        assert_eq!(queue.current_track().unwrap().id.as_str(), "a");
    }

    #[test]
    fn move_track_across_current_rebases_index() {
        let mut queue = queue_of(&["a", "b", "c", "d"]);
        queue.play_track_at_index(2);

        // Before-current to after-current: index shifts down
        queue.move_track(0, 3);
        assert_eq!(ids(&queue), vec!["b", "c", "d", "a"]);
        assert_eq!(queue.current_track().unwrap().id.as_str(), "c");

        // After-current to before-current: index shifts up
        queue.move_track(2, 0);
        assert_eq!(ids(&queue), vec!["d", "b", "c", "a"]);
        assert_eq!(queue.current_track().unwrap().id.as_str(), "c");
    }

    #[test]
    fn move_track_invalid_is_noop() {
        let mut queue = queue_of(&["a", "b"]);
        queue.move_track(0, 0);
        queue.move_track(5, 0);
        queue.move_track(0, 5);
        assert_eq!(ids(&queue), vec!["a", "b"]);
    }

    #[test]
    fn remove_track_adjusts_index() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.play_track_at_index(2);
        queue.remove_track(0);
        assert_eq!(ids(&queue), vec!["b", "c"]);
        assert_eq!(queue.current_index(), 1);
        assert_eq!(queue.current_track().unwrap().id.as_str(), "c");
    }

    #[test]
    fn remove_current_track_is_noop() {
        let mut queue = queue_of(&["a", "b"]);
        queue.remove_track(0);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.current_track().unwrap().id.as_str(), "a");
    }

    #[test]
    fn history_is_bounded() {
        let mut queue = QueueManager::with_history_capacity(3);
        let tracks: Vec<Track> = (0..10).map(|i| create_test_track(&i.to_string())).collect();
        queue.set_queue(tracks, 0);

        for _ in 0..9 {
            queue.go_to_next();
        }
        assert_eq!(queue.history().len(), 3);
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut queue = queue_of(&["a", "b", "c"]);
        queue.play_track_at_index(1);

        let snapshot = queue.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let decoded: QueueSnapshot = serde_json::from_str(&json).unwrap();

        let mut restored = QueueManager::new();
        restored.restore(decoded);
        assert_eq!(ids(&restored), vec!["a", "b", "c"]);
        assert_eq!(restored.current_index(), 1);
        assert!(restored.history().is_empty());
    }
}
