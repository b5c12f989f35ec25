/// Prefetch-specific errors
use thiserror::Error;

/// Result type alias using `PrefetchError`
pub type Result<T> = std::result::Result<T, PrefetchError>;

/// Prefetch error types
///
/// These stay internal to the fetch pipeline: the public cache API is
/// best-effort and reports failures as absence, after logging.
#[derive(Error, Debug)]
pub enum PrefetchError {
    /// The media fetcher reported a failure
    #[error("Fetch failed: {0}")]
    Fetch(String),

    /// I/O error while writing or inspecting cached media
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
