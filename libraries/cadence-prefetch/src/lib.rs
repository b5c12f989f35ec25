//! Cadence - Prefetch Cache
//!
//! Priority-scheduled fetch-ahead and local caching of upcoming
//! tracks:
//! - Debounced position-change triggers, keyed on queue identity and
//!   position so duplicate notifications schedule nothing extra
//! - Nearest-first priority dispatch through a bounded set of
//!   concurrent fetch slots
//! - Disk-backed media cache with byte-budget LRU eviction
//! - Strict failure isolation: a failed fetch leaves no readable entry
//!   and no partial file, and schedules no retry
//!
//! Media retrieval itself is delegated to the application through the
//! [`cadence_core::MediaFetcher`] trait; this crate owns scheduling,
//! storage and eviction only.

mod cache;
mod error;
mod task;

pub use cache::{CacheStats, PlayRecord, PrefetchCache, PrefetchConfig};
pub use error::{PrefetchError, Result};
pub use task::ScheduledTask;
