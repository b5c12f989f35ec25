//! Cadence Core
//!
//! Shared domain types and collaborator traits for the Cadence playback
//! stack:
//! - `Track` / `TrackId` / `MediaLocator` domain types
//! - `TrackSource` (metadata lookup) and `MediaFetcher` (media download)
//!   seams implemented by the embedding application
//! - `CoreError` and the crate-wide `Result` alias
//!
//! This crate is intentionally small: everything stateful (queue,
//! shuffle, sleep timer, prefetch cache, durable store) lives in the
//! sibling crates and depends on the types defined here.

mod error;
mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use traits::{MediaFetcher, MediaPayload, TrackSource};
pub use types::{MediaLocator, PlaylistId, Track, TrackId};
