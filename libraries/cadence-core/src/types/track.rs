/// Track domain type
use crate::types::TrackId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where a track's playable media lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MediaLocator {
    /// Remote identifier or URL resolvable by the media fetcher
    Remote(String),

    /// Local resource handle (e.g. a cached file)
    Local(PathBuf),
}

/// Streaming track
///
/// Immutable-by-reference record: queue, shuffle and cache operations
/// clone it freely and compare by `id` only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Source channel the track was published under
    pub channel: String,

    /// Track duration
    pub duration: Duration,

    /// Thumbnail/cover locator
    pub thumbnail_url: Option<String>,

    /// Playable media locator
    pub media: MediaLocator,

    /// Favorite flag
    pub favorite: bool,

    /// Times this track has been played
    pub play_count: u32,
}

impl Track {
    /// Create a new track with minimal metadata
    pub fn new(id: impl Into<TrackId>, title: impl Into<String>, media: MediaLocator) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: String::new(),
            channel: String::new(),
            duration: Duration::ZERO,
            thumbnail_url: None,
            media,
            favorite: false,
            play_count: 0,
        }
    }

    /// Duration in whole seconds
    pub fn duration_secs(&self) -> u64 {
        self.duration.as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_identity_is_by_id() {
        let a = Track {
            id: TrackId::new("t1"),
            title: "Song".to_string(),
            artist: "Artist".to_string(),
            channel: "Channel".to_string(),
            duration: Duration::from_secs(180),
            thumbnail_url: None,
            media: MediaLocator::Remote("https://cdn.example/t1".to_string()),
            favorite: false,
            play_count: 0,
        };
        let mut b = a.clone();
        b.title = "Renamed".to_string();
        assert_eq!(a.id, b.id);
        assert_ne!(a, b);
    }
}
