//! Session events
//!
//! Event-based communication for UI synchronization. Events are
//! emitted on track transitions, queue edits and sleep-timer state
//! changes, and delivered over an unbounded channel handed out at
//! session start.

use cadence_core::TrackId;
use cadence_playback::SleepTimerMode;
use cadence_prefetch::PlayRecord;
use serde::{Deserialize, Serialize};

/// Events emitted by a player session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The current track changed
    TrackChanged {
        /// Id of the new current track
        track_id: TrackId,
        /// Id of the previous track (if any)
        previous_track_id: Option<TrackId>,
    },

    /// Queue contents changed (set/added/removed/reordered)
    QueueChanged {
        /// New queue length
        length: usize,
    },

    /// A listen was finalized for the outgoing track
    PlayRecorded {
        /// The finalized play record
        record: PlayRecord,
    },

    /// A sleep timer was armed
    SleepTimerStarted {
        /// The armed countdown mode
        mode: SleepTimerMode,
    },

    /// The sleep timer expired; playback must stop
    SleepTimerExpired,

    /// The sleep timer was cancelled before expiry
    SleepTimerStopped,
}
