//! Prefetch cache
//!
//! Fetch-ahead and local caching of upcoming tracks, driven by queue
//! position changes. Triggers are debounced and keyed on the queue
//! position so duplicate notifications for the same slot schedule no
//! extra work; the fetch window is dispatched nearest-first through a
//! bounded number of concurrent fetch slots.
//!
//! Failure isolation: a failed fetch logs a warning, removes its
//! pending marker and any partial file, and leaves no readable entry.
//! No retry is scheduled; the next position-change trigger is the only
//! retry path.

use crate::error::{PrefetchError, Result};
use crate::task::ScheduledTask;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use cadence_core::{MediaFetcher, MediaPayload, Track, TrackId};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

/// Prefetch and cache configuration
#[derive(Debug, Clone)]
pub struct PrefetchConfig {
    /// Directory holding cached media files
    pub cache_dir: PathBuf,

    /// How many upcoming tracks to fetch ahead
    pub window: usize,

    /// Debounce window for position-change triggers
    pub debounce: Duration,

    /// Concurrent fetch slots
    pub max_concurrent_fetches: usize,

    /// Byte budget for cached media; least-recently accessed entries
    /// are evicted past it
    pub max_cache_bytes: u64,

    /// Bounded length of the in-memory play-record log
    pub play_record_capacity: usize,
}

impl PrefetchConfig {
    /// Configuration with defaults for everything but the cache dir
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            window: 5,
            debounce: Duration::from_secs(2),
            max_concurrent_fetches: 3,
            max_cache_bytes: 512 * 1024 * 1024,
            play_record_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchState {
    Pending,
    Ready,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    path: PathBuf,
    bytes: u64,
    priority: u32,
    state: FetchState,
    /// Whether the file was written by this cache (and may be deleted
    /// on eviction) as opposed to an externally owned local resource
    owned_file: bool,
}

/// Cache introspection counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub ready_entries: usize,
    pub pending_entries: usize,
    pub total_bytes: u64,
    pub failed_fetches: u64,
}

/// One finalized listen, emitted on track transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub track_id: TrackId,

    /// Accumulated listened time for the outgoing track
    pub listened: Duration,

    /// Whether at least 80% of the track was heard
    pub completed: bool,
}

struct DebouncedPlan {
    /// (queue generation, current index) the plan was scheduled for
    key: (u64, usize),
    task: ScheduledTask,
}

/// Priority-scheduled fetch-ahead cache
///
/// Owns cache entries keyed by track id; reads, never mutates, the
/// queue it is given. Media bytes live on disk under the configured
/// cache directory, so ready entries survive process restarts.
pub struct PrefetchCache {
    inner: Arc<CacheInner>,
    debounce_slot: Mutex<Option<DebouncedPlan>>,
}

struct CacheInner {
    fetcher: Arc<dyn MediaFetcher>,
    config: PrefetchConfig,
    entries: Mutex<LruCache<TrackId, CacheEntry>>,
    fetch_slots: Arc<Semaphore>,
    initialized: AtomicBool,
    failed_fetches: AtomicU64,
    play_records: Mutex<VecDeque<PlayRecord>>,
}

impl PrefetchCache {
    /// Create a cache around the given fetcher
    pub fn new(fetcher: Arc<dyn MediaFetcher>, config: PrefetchConfig) -> Self {
        let fetch_slots = Arc::new(Semaphore::new(config.max_concurrent_fetches.max(1)));
        Self {
            inner: Arc::new(CacheInner {
                fetcher,
                config,
                entries: Mutex::new(LruCache::unbounded()),
                fetch_slots,
                initialized: AtomicBool::new(false),
                failed_fetches: AtomicU64::new(0),
                play_records: Mutex::new(VecDeque::new()),
            }),
            debounce_slot: Mutex::new(None),
        }
    }

    /// Establish the durable cache; idempotent
    ///
    /// Creates the cache directory and rebuilds the ready-entry index
    /// from media files already on disk.
    pub async fn init(&self) -> Result<()> {
        let inner = &self.inner;
        if inner.initialized.load(Ordering::SeqCst) {
            return Ok(());
        }

        tokio::fs::create_dir_all(&inner.config.cache_dir).await?;

        let mut dir = tokio::fs::read_dir(&inner.config.cache_dir).await?;
        let mut entries = inner.entries.lock().await;
        while let Some(file) = dir.next_entry().await? {
            let meta = file.metadata().await?;
            if !meta.is_file() {
                continue;
            }
            let Some(id) = decode_cache_file_name(&file.file_name()) else {
                continue;
            };
            entries.put(
                id,
                CacheEntry {
                    path: file.path(),
                    bytes: meta.len(),
                    priority: 0,
                    state: FetchState::Ready,
                    owned_file: true,
                },
            );
        }
        drop(entries);

        inner.initialized.store(true, Ordering::SeqCst);
        debug!(dir = %inner.config.cache_dir.display(), "prefetch cache initialized");
        Ok(())
    }

    /// Position-change trigger: schedule fetch-ahead for the tracks
    /// following `current_index`
    ///
    /// Debounced; keyed on `(generation, current_index)` so repeated
    /// notifications for the same position do not reschedule, while a
    /// changed position replaces (and thereby cancels) the pending
    /// plan. Fetches already dispatched keep running.
    pub async fn prefetch_upcoming(
        &self,
        tracks: &[Track],
        current_index: usize,
        generation: u64,
        shuffle_enabled: bool,
    ) {
        if tracks.is_empty() {
            return;
        }

        let key = (generation, current_index);
        let mut slot = self.debounce_slot.lock().await;
        if let Some(plan) = slot.as_ref() {
            if plan.key == key && !plan.task.is_finished() {
                debug!(position = current_index, "duplicate prefetch trigger ignored");
                return;
            }
        }

        let window = self
            .inner
            .select_window(tracks, current_index, shuffle_enabled);
        if window.is_empty() {
            *slot = None;
            return;
        }

        debug!(
            position = current_index,
            generation,
            tracks = window.len(),
            "prefetch window scheduled"
        );

        let inner = Arc::clone(&self.inner);
        let delay = self.inner.config.debounce;
        let task = ScheduledTask::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.run_plan(window).await;
        });

        // Replacing the slot aborts any previously pending plan
        *slot = Some(DebouncedPlan { key, task });
    }

    /// Fetch one track's media and store it keyed by id
    ///
    /// Returns whether the track is cached afterwards. A concurrent
    /// fetch for the same id is left alone; a failure leaves no entry.
    pub async fn prefetch_track(&self, track: &Track, priority: u32) -> bool {
        self.inner.prefetch_track(track, priority).await
    }

    /// Local path of a cached track, `None` when absent or still
    /// pending
    pub async fn cached_path(&self, id: &TrackId) -> Option<PathBuf> {
        let mut entries = self.inner.entries.lock().await;
        match entries.get(id) {
            Some(entry) if entry.state == FetchState::Ready => Some(entry.path.clone()),
            _ => None,
        }
    }

    /// Whether a ready entry exists for the id
    pub async fn is_cached(&self, id: &TrackId) -> bool {
        self.cached_path(id).await.is_some()
    }

    /// Finalize a listen for the analytics side-channel
    ///
    /// `completed` means at least 80% of the track's duration was
    /// heard.
    pub async fn record_play(&self, track: &Track, listened: Duration) -> PlayRecord {
        let completed = listened.as_secs_f64() >= 0.8 * track.duration.as_secs_f64();
        let record = PlayRecord {
            track_id: track.id.clone(),
            listened,
            completed,
        };

        let mut records = self.inner.play_records.lock().await;
        if records.len() >= self.inner.config.play_record_capacity {
            records.pop_front();
        }
        records.push_back(record.clone());
        drop(records);

        info!(
            track_id = %track.id,
            listened_secs = listened.as_secs(),
            completed,
            "play recorded"
        );
        record
    }

    /// Drain the accumulated play records
    pub async fn take_play_records(&self) -> Vec<PlayRecord> {
        self.inner.play_records.lock().await.drain(..).collect()
    }

    /// Entry and byte counters
    pub async fn stats(&self) -> CacheStats {
        let entries = self.inner.entries.lock().await;
        let mut stats = CacheStats {
            failed_fetches: self.inner.failed_fetches.load(Ordering::Relaxed),
            ..CacheStats::default()
        };
        for (_, entry) in entries.iter() {
            match entry.state {
                FetchState::Ready => {
                    stats.ready_entries += 1;
                    stats.total_bytes += entry.bytes;
                }
                FetchState::Pending => stats.pending_entries += 1,
            }
        }
        stats
    }

    /// Cancel any debounced plan that has not dispatched yet
    pub async fn cancel_pending(&self) {
        *self.debounce_slot.lock().await = None;
    }

    /// Full eviction: drop every entry and delete owned media files
    pub async fn clear(&self) {
        self.cancel_pending().await;

        let victims: Vec<PathBuf> = {
            let mut entries = self.inner.entries.lock().await;
            let mut victims = Vec::new();
            while let Some((_, entry)) = entries.pop_lru() {
                if entry.owned_file && entry.state == FetchState::Ready {
                    victims.push(entry.path);
                }
            }
            victims
        };

        for path in victims {
            let _ = tokio::fs::remove_file(path).await;
        }
        info!("prefetch cache cleared");
    }
}

impl CacheInner {
    fn select_window(
        &self,
        tracks: &[Track],
        current_index: usize,
        shuffle_enabled: bool,
    ) -> Vec<Track> {
        let window = self.config.window;
        if shuffle_enabled {
            // Under shuffle any remaining track is a likely-next
            // candidate, so the window wraps past the end of the queue
            let take = tracks.len().saturating_sub(1).min(window);
            tracks
                .iter()
                .cycle()
                .skip(current_index + 1)
                .take(take)
                .cloned()
                .collect()
        } else {
            tracks
                .iter()
                .skip(current_index + 1)
                .take(window)
                .cloned()
                .collect()
        }
    }

    async fn run_plan(self: Arc<Self>, window: Vec<Track>) {
        let total = window.len();
        for (offset, track) in window.into_iter().enumerate() {
            // Nearest first: dispatch order is priority order, and the
            // FIFO semaphore hands slots out in that order
            let priority = (total - offset) as u32;
            let Ok(permit) = Arc::clone(&self.fetch_slots).acquire_owned().await else {
                return;
            };
            let inner = Arc::clone(&self);
            tokio::spawn(async move {
                let _permit = permit;
                inner.prefetch_track(&track, priority).await;
            });
        }
    }

    async fn prefetch_track(&self, track: &Track, priority: u32) -> bool {
        {
            let mut entries = self.entries.lock().await;
            if let Some(entry) = entries.get(&track.id) {
                match entry.state {
                    FetchState::Ready => return true,
                    FetchState::Pending => return false,
                }
            }
            entries.put(
                track.id.clone(),
                CacheEntry {
                    path: PathBuf::new(),
                    bytes: 0,
                    priority,
                    state: FetchState::Pending,
                    owned_file: false,
                },
            );
        }

        match self.fetch_and_store(track).await {
            Ok((path, bytes, owned_file)) => {
                {
                    let mut entries = self.entries.lock().await;
                    entries.put(
                        track.id.clone(),
                        CacheEntry {
                            path,
                            bytes,
                            priority,
                            state: FetchState::Ready,
                            owned_file,
                        },
                    );
                }
                self.enforce_budget().await;
                info!(track_id = %track.id, size = bytes, priority, "media prefetched");
                true
            }
            Err(err) => {
                self.entries.lock().await.pop(&track.id);
                self.failed_fetches.fetch_add(1, Ordering::Relaxed);
                warn!(track_id = %track.id, error = %err, "prefetch failed, no cache entry kept");
                false
            }
        }
    }

    async fn fetch_and_store(&self, track: &Track) -> Result<(PathBuf, u64, bool)> {
        let payload = self
            .fetcher
            .fetch_media(track)
            .await
            .map_err(|err| PrefetchError::Fetch(err.to_string()))?;

        match payload {
            MediaPayload::Bytes(bytes) => {
                // Write to a temp name and rename so a ready entry is
                // always backed by a fully written file
                let final_path = self.media_path(&track.id);
                let tmp_path = final_path.with_extension("part");
                let size = bytes.len() as u64;

                if let Err(err) = tokio::fs::write(&tmp_path, &bytes).await {
                    let _ = tokio::fs::remove_file(&tmp_path).await;
                    return Err(err.into());
                }
                if let Err(err) = tokio::fs::rename(&tmp_path, &final_path).await {
                    let _ = tokio::fs::remove_file(&tmp_path).await;
                    return Err(err.into());
                }
                Ok((final_path, size, true))
            }
            MediaPayload::Local(path) => {
                let meta = tokio::fs::metadata(&path).await?;
                Ok((path, meta.len(), false))
            }
        }
    }

    async fn enforce_budget(&self) {
        let victims: Vec<PathBuf> = {
            let mut entries = self.entries.lock().await;
            let mut total: u64 = entries.iter().map(|(_, entry)| entry.bytes).sum();
            let mut victims = Vec::new();

            while total > self.config.max_cache_bytes {
                let Some((id, entry)) = entries.pop_lru() else {
                    break;
                };
                if entry.state == FetchState::Pending {
                    // In-flight fetches are not evicted
                    entries.put(id, entry);
                    continue;
                }
                total -= entry.bytes;
                debug!(track_id = %id, size = entry.bytes, "cache entry evicted over byte budget");
                if entry.owned_file {
                    victims.push(entry.path);
                }
            }
            victims
        };

        for path in victims {
            let _ = tokio::fs::remove_file(path).await;
        }
    }

    fn media_path(&self, id: &TrackId) -> PathBuf {
        let name = format!("{}.media", URL_SAFE_NO_PAD.encode(id.as_str()));
        self.config.cache_dir.join(name)
    }
}

fn decode_cache_file_name(name: &OsStr) -> Option<TrackId> {
    let name = name.to_str()?;
    let stem = name.strip_suffix(".media")?;
    let bytes = URL_SAFE_NO_PAD.decode(stem).ok()?;
    let id = String::from_utf8(bytes).ok()?;
    Some(TrackId::new(id))
}
