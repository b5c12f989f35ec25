/// Session-level errors
use thiserror::Error;

/// Result type alias using `SessionError`
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors surfaced by session lifecycle operations
///
/// Queue, shuffle and sleep-timer operations never produce these;
/// only the storage- and cache-backed lifecycle paths can fail.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Durable store failure
    #[error(transparent)]
    Storage(#[from] cadence_storage::StorageError),

    /// Prefetch cache failure
    #[error(transparent)]
    Prefetch(#[from] cadence_prefetch::PrefetchError),
}
