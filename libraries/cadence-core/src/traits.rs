/// Collaborator traits for the Cadence playback core
///
/// The playback core consumes these as abstract seams; the application
/// supplies concrete implementations (HTTP clients, platform media
/// resolvers). Failures a caller can act on are reported as absence
/// (`None`/empty), not as errors.
use crate::error::Result;
use crate::types::{Track, TrackId};
use async_trait::async_trait;
use std::path::PathBuf;

/// Track metadata source
///
/// Returns track records and queue-worthy collections (similar-track
/// sets) given an id. Absence is reported as `None`/empty, never as an
/// error — the playback core treats a missing track as a no-op.
#[async_trait]
pub trait TrackSource: Send + Sync {
    /// Look up metadata for a single track
    async fn track(&self, id: &TrackId) -> Option<Track>;

    /// Queue-worthy set of tracks similar to the given one
    ///
    /// Returns an empty vec when the source has nothing to offer.
    async fn similar_tracks(&self, id: &TrackId) -> Vec<Track>;
}

/// Media payload returned by a fetch
#[derive(Debug, Clone)]
pub enum MediaPayload {
    /// Raw media bytes to be written into the local cache
    Bytes(Vec<u8>),

    /// Media that is already a local resource
    Local(PathBuf),
}

/// Media fetcher
///
/// Given a track, produces a playable locator or raw media bytes. A
/// fetch may fail; the caller must not expose any half-written state
/// for a failed fetch.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch the playable media for a track
    async fn fetch_media(&self, track: &Track) -> Result<MediaPayload>;
}
