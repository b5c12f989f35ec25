//! Core types for the Cadence playback stack

mod ids;
mod track;

pub use ids::{PlaylistId, TrackId};
pub use track::{MediaLocator, Track};
