//! Smart shuffle selection
//!
//! Recency-aware random track picking. A small bounded list of
//! recently played ids biases selection away from repeats: candidates
//! outside the list are preferred whenever any exist, otherwise the
//! full pool is used.

use cadence_core::{Track, TrackId};
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};
use std::collections::{HashSet, VecDeque};

/// Default recency list capacity
pub const DEFAULT_RECENCY_CAPACITY: usize = 10;

/// A shuffled selection: the chosen track and its queue index
#[derive(Debug, Clone, PartialEq)]
pub struct ShuffledPick {
    pub track: Track,
    pub index: usize,
}

/// Recency-aware random selector
///
/// Owns only the recency list; the queue is read, never mutated. The
/// list is persisted by the durable store across sessions and survives
/// queue replacement — it tracks listening recency, not queue
/// membership.
#[derive(Debug, Clone)]
pub struct SmartShuffleSelector {
    recent: VecDeque<TrackId>,
    capacity: usize,
}

impl SmartShuffleSelector {
    /// Create a selector with the default recency capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RECENCY_CAPACITY)
    }

    /// Create a selector with a custom recency capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a played track id: append-or-move-to-end, trimmed to
    /// capacity
    pub fn add_to_history(&mut self, id: TrackId) {
        if let Some(pos) = self.recent.iter().position(|r| r == &id) {
            self.recent.remove(pos);
        }
        self.recent.push_back(id);
        while self.recent.len() > self.capacity {
            self.recent.pop_front();
        }
    }

    /// Recently played ids, oldest first (for persistence)
    pub fn history(&self) -> Vec<TrackId> {
        self.recent.iter().cloned().collect()
    }

    /// Restore a persisted recency list, keeping the most recent
    /// entries when it exceeds capacity
    pub fn set_history(&mut self, ids: Vec<TrackId>) {
        self.recent = ids.into_iter().collect();
        while self.recent.len() > self.capacity {
            self.recent.pop_front();
        }
    }

    /// Pick the next track at random, biased away from recent plays
    ///
    /// The candidate pool is the queue minus (optionally) the current
    /// slot. When any candidate is absent from the recency list, the
    /// pool is restricted to those; otherwise the full pool is kept.
    /// Returns `None` for an empty pool.
    pub fn smart_shuffled_next(
        &self,
        tracks: &[Track],
        current_index: usize,
        exclude_current: bool,
    ) -> Option<ShuffledPick> {
        let mut pool: Vec<usize> = (0..tracks.len())
            .filter(|&i| !(exclude_current && i == current_index))
            .collect();
        if pool.is_empty() {
            return None;
        }

        if !self.recent.is_empty() {
            let fresh: Vec<usize> = pool
                .iter()
                .copied()
                .filter(|&i| !self.recent.contains(&tracks[i].id))
                .collect();
            if !fresh.is_empty() {
                pool = fresh;
            }
        }

        let mut rng = thread_rng();
        let &index = pool.choose(&mut rng)?;
        Some(ShuffledPick {
            track: tracks[index].clone(),
            index,
        })
    }

    /// Produce a full shuffled permutation of `original`
    ///
    /// When `start_track` is present in `original` it is placed first
    /// and removed from the working pool. Draws prefer tracks outside
    /// the recency list as it stood at the start of the call, falling
    /// back to whatever remains. The result is a one-shot sequence,
    /// consumed in a single pass.
    pub fn generate_smart_shuffled_queue(
        &self,
        original: &[Track],
        start_track: Option<&Track>,
    ) -> Vec<Track> {
        let recent: HashSet<&TrackId> = self.recent.iter().collect();
        let mut pool: Vec<Track> = original.to_vec();
        let mut shuffled = Vec::with_capacity(pool.len());

        if let Some(start) = start_track {
            if let Some(pos) = pool.iter().position(|t| t.id == start.id) {
                shuffled.push(pool.remove(pos));
            }
        }

        let mut rng = thread_rng();
        while !pool.is_empty() {
            let fresh: Vec<usize> = (0..pool.len())
                .filter(|&i| !recent.contains(&pool[i].id))
                .collect();

            let index = match fresh.choose(&mut rng) {
                Some(&i) => i,
                None => rng.gen_range(0..pool.len()),
            };
            shuffled.push(pool.remove(index));
        }

        shuffled
    }
}

impl Default for SmartShuffleSelector {
    fn default() -> Self {
        Self::new()
    }
}
