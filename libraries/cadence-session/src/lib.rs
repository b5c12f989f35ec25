//! Cadence Session
//!
//! Per-application-session wiring of the playback components. A
//! [`PlayerSession`] owns the queue, smart shuffle, sleep timer and
//! prefetch cache, with the durable store and the collaborator
//! implementations (track metadata source, media fetcher) injected at
//! construction:
//!
//! - restore-on-start: queue snapshot, shuffle recency list and
//!   shuffle setting come back from the store
//! - explicit transition hooks: every track change finalizes the
//!   outgoing track's listened time into a play record, feeds the
//!   recency list and re-triggers the prefetch window
//! - scheduled-task discipline: the sleep-timer tick and the prefetch
//!   debounce are owned `ScheduledTask` values, cancelled before any
//!   re-arm and on teardown
//! - teardown paths: `shutdown` persists state; `sign_out` wipes the
//!   store and the media cache
//!
//! UI-facing state changes stream out as [`SessionEvent`]s over an
//! unbounded channel handed back by [`PlayerSession::start`].

mod error;
mod events;
mod session;

pub use error::{Result, SessionError};
pub use events::SessionEvent;
pub use session::{PlayerSession, SessionConfig};
