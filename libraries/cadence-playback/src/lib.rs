//! Cadence - Playback State Machines
//!
//! Platform-agnostic playback state for the Cadence player:
//! - Queue management (ordered sequence + current position + bounded
//!   back-history)
//! - Smart shuffle (recency-aware random selection)
//! - Sleep timer (minutes/songs/end-of-track countdown with fade-out)
//!
//! # Architecture
//!
//! Everything in this crate is synchronous and deterministic given a
//! clock: no async runtime, no I/O, no platform dependencies. The
//! session layer owns the recurring tick that drives the sleep timer
//! and the store that persists snapshots; the components here only
//! hold state.
//!
//! All queue operations are best-effort UI-facing mutations: malformed
//! indices and missing ids are no-ops or `None` returns, never panics.
//!
//! # Example
//!
//! ```rust
//! use cadence_playback::{QueueManager, SmartShuffleSelector};
//! use cadence_core::{MediaLocator, Track};
//!
//! let mut queue = QueueManager::new();
//! queue.set_queue(
//!     vec![
//!         Track::new("a", "First", MediaLocator::Remote("https://cdn.example/a".into())),
//!         Track::new("b", "Second", MediaLocator::Remote("https://cdn.example/b".into())),
//!     ],
//!     0,
//! );
//!
//! assert_eq!(queue.current_track().unwrap().id.as_str(), "a");
//! assert!(queue.has_next());
//!
//! let selector = SmartShuffleSelector::new();
//! let pick = selector.smart_shuffled_next(queue.tracks(), queue.current_index(), true);
//! assert_eq!(pick.unwrap().track.id.as_str(), "b");
//! ```

mod history;
mod queue;
mod shuffle;
mod sleep_timer;

pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use queue::{QueueManager, QueueSnapshot};
pub use shuffle::{ShuffledPick, SmartShuffleSelector, DEFAULT_RECENCY_CAPACITY};
pub use sleep_timer::{
    SleepTimer, SleepTimerMode, SleepTimerSettings, DEFAULT_FADE_DURATION,
};
