//! Cadence Storage
//!
//! `SQLite` database layer for Cadence session state. Four logical
//! collections plus key/value settings:
//!
//! - **queue_state**: the queue snapshot a session resumes from
//! - **favorites**: timestamped favorite tracks
//! - **playlists**: locally stored playlists with sync bookkeeping
//! - **settings**: arbitrary key/value settings (JSON values)
//! - **play_history**: the capped shuffle recency id list
//!
//! # Architecture
//!
//! One [`Database`] is constructed per application session and injected
//! into the components that persist state. Each collection owns its own
//! queries in a vertical slice; everything goes through the single
//! pool, so readers never observe torn writes.
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_storage::{queue_state, Database};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::new("sqlite://cadence.db").await?;
//!
//! if let Some((tracks, index)) = queue_state::load(db.pool()).await? {
//!     // resume playback where the last session stopped
//!     let _ = (tracks, index);
//! }
//! # Ok(())
//! # }
//! ```

mod database;
mod error;

// Vertical slices
pub mod favorites;
pub mod play_history;
pub mod playlists;
pub mod queue_state;
pub mod settings;

pub use database::Database;
pub use error::{Result, StorageError};
