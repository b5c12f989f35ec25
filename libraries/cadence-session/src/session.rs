//! Player session
//!
//! One `PlayerSession` exists per application session. It constructs
//! nothing global: the store and the collaborator implementations are
//! injected at start, owned here, and torn down together. The session
//! is also the place where implicit lifecycle effects become explicit
//! hooks: every track transition finalizes the outgoing track's
//! listened time, feeds the shuffle recency list and re-triggers the
//! prefetch window.

use crate::error::Result;
use crate::events::SessionEvent;
use cadence_core::{MediaFetcher, Track, TrackId, TrackSource};
use cadence_playback::{
    QueueManager, QueueSnapshot, SleepTimer, SleepTimerMode, SleepTimerSettings,
    SmartShuffleSelector, DEFAULT_HISTORY_CAPACITY, DEFAULT_RECENCY_CAPACITY,
};
use cadence_prefetch::{PrefetchCache, PrefetchConfig, ScheduledTask};
use cadence_storage::{favorites, play_history, queue_state, settings, Database};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Prefetch cache configuration
    pub prefetch: PrefetchConfig,

    /// Capacity of the shuffle recency list
    pub recency_capacity: usize,

    /// Capacity of the back-navigation history
    pub history_capacity: usize,

    /// Period of the sleep-timer tick task
    pub sleep_tick: Duration,
}

impl SessionConfig {
    /// Defaults for everything but the cache directory
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            prefetch: PrefetchConfig::new(cache_dir),
            recency_capacity: DEFAULT_RECENCY_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            sleep_tick: Duration::from_secs(1),
        }
    }
}

/// Per-session owner of the playback components
///
/// Owns the queue, shuffle selector, sleep timer and prefetch cache;
/// reads and writes the injected store. All background work (the
/// sleep-timer tick, the prefetch debounce) is held in `ScheduledTask`
/// values cancelled on re-arm and on teardown.
pub struct PlayerSession {
    id: String,
    db: Database,
    track_source: Arc<dyn TrackSource>,
    queue: QueueManager,
    shuffle: SmartShuffleSelector,
    shuffle_enabled: bool,
    sleep_timer: Arc<Mutex<SleepTimer>>,
    sleep_tick_task: Option<ScheduledTask>,
    sleep_tick: Duration,
    prefetch: PrefetchCache,
    events: mpsc::UnboundedSender<SessionEvent>,
    current_started: Option<Instant>,
}

impl PlayerSession {
    /// Start a session: initialize the cache and restore persisted
    /// state (queue snapshot, shuffle recency, shuffle setting)
    pub async fn start(
        db: Database,
        track_source: Arc<dyn TrackSource>,
        fetcher: Arc<dyn MediaFetcher>,
        config: SessionConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SessionEvent>)> {
        let prefetch = PrefetchCache::new(fetcher, config.prefetch.clone());
        prefetch.init().await?;

        let mut queue = QueueManager::with_history_capacity(config.history_capacity);
        if let Some((tracks, current_index)) = queue_state::load(db.pool()).await? {
            queue.restore(QueueSnapshot {
                tracks,
                current_index,
            });
        }

        let mut shuffle = SmartShuffleSelector::with_capacity(config.recency_capacity);
        let persisted = play_history::load(db.pool()).await?;
        if !persisted.is_empty() {
            shuffle.set_history(persisted);
        }

        let shuffle_enabled = matches!(
            settings::get_setting(db.pool(), settings::SETTING_SHUFFLE_ENABLED).await?,
            Some(serde_json::Value::Bool(true))
        );

        let (events, receiver) = mpsc::unbounded_channel();
        let id = Uuid::new_v4().to_string();
        info!(session_id = %id, restored_tracks = queue.len(), "player session started");

        Ok((
            Self {
                id,
                db,
                track_source,
                queue,
                shuffle,
                shuffle_enabled,
                sleep_timer: Arc::new(Mutex::new(SleepTimer::new())),
                sleep_tick_task: None,
                sleep_tick: config.sleep_tick,
                prefetch,
                events,
                current_started: None,
            },
            receiver,
        ))
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Read-only queue access
    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    /// The prefetch cache (read-only lookups and stats)
    pub fn prefetch(&self) -> &PrefetchCache {
        &self.prefetch
    }

    // --- Queue operations -------------------------------------------------

    /// Replace the queue wholesale and land on the start track
    pub async fn set_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        let outgoing = self.queue.current_track().cloned();
        let previous_track_id = outgoing.as_ref().map(|t| t.id.clone());

        self.queue.set_queue(tracks, start_index);
        self.emit(SessionEvent::QueueChanged {
            length: self.queue.len(),
        });

        self.finalize_outgoing(outgoing).await;
        if let Some(landed) = self.queue.current_track().cloned() {
            self.current_started = Some(Instant::now());
            self.emit(SessionEvent::TrackChanged {
                track_id: landed.id.clone(),
                previous_track_id,
            });
            self.trigger_prefetch().await;
        }
    }

    /// Insert a track right after the current position
    pub fn play_next(&mut self, track: Track) {
        self.queue.play_next(track);
        self.emit_queue_changed();
    }

    /// Append a track to the queue
    pub fn add_to_queue(&mut self, track: Track) {
        self.queue.add_to_queue(track);
        self.emit_queue_changed();
    }

    /// Batched [`Self::play_next`]
    pub fn play_next_multiple(&mut self, tracks: Vec<Track>) {
        self.queue.play_next_multiple(tracks);
        self.emit_queue_changed();
    }

    /// Batched [`Self::add_to_queue`]
    pub fn add_to_queue_multiple(&mut self, tracks: Vec<Track>) {
        self.queue.add_to_queue_multiple(tracks);
        self.emit_queue_changed();
    }

    /// Reorder the queue
    pub fn move_track(&mut self, from: usize, to: usize) {
        self.queue.move_track(from, to);
        self.emit_queue_changed();
    }

    /// Remove a non-current track
    pub fn remove_track(&mut self, index: usize) {
        self.queue.remove_track(index);
        self.emit_queue_changed();
    }

    /// Advance to the next track
    ///
    /// Under shuffle the queue delegates selection to the smart
    /// shuffle selector; otherwise the next sequential slot is used.
    pub async fn next(&mut self) -> Option<Track> {
        let outgoing = self.queue.current_track().cloned();

        let landed = if self.shuffle_enabled {
            let pick = self.shuffle.smart_shuffled_next(
                self.queue.tracks(),
                self.queue.current_index(),
                true,
            )?;
            self.queue.play_track_at_index(pick.index)
        } else {
            self.queue.go_to_next()
        }?;

        self.after_transition(outgoing, &landed).await;
        Some(landed)
    }

    /// Step back within the queue, or replay from history
    pub async fn previous(&mut self) -> Option<Track> {
        let outgoing = self.queue.current_track().cloned();
        let landed = self.queue.go_to_previous()?;
        self.after_transition(outgoing, &landed).await;
        Some(landed)
    }

    /// Jump to a queue slot
    pub async fn play_at(&mut self, index: usize) -> Option<Track> {
        let outgoing = self.queue.current_track().cloned();
        let landed = self.queue.play_track_at_index(index)?;
        self.after_transition(outgoing, &landed).await;
        Some(landed)
    }

    /// Look up a track by id and play it next
    pub async fn play_now(&mut self, id: &TrackId) -> Option<Track> {
        if self.queue.current_track().map(|t| &t.id) == Some(id) {
            return self.queue.current_track().cloned();
        }

        let track = self.track_source.track(id).await?;
        self.queue.play_next(track);
        self.emit_queue_changed();

        let index = self.queue.tracks().iter().position(|t| &t.id == id)?;
        self.play_at(index).await
    }

    /// Append tracks similar to the given one from the metadata source
    ///
    /// Returns how many tracks were actually added after dedup.
    pub async fn queue_similar(&mut self, id: &TrackId) -> usize {
        let similar = self.track_source.similar_tracks(id).await;
        if similar.is_empty() {
            return 0;
        }

        let before = self.queue.len();
        self.queue.add_to_queue_multiple(similar);
        let added = self.queue.len() - before;
        if added > 0 {
            self.emit_queue_changed();
        }
        added
    }

    // --- Shuffle ----------------------------------------------------------

    /// Whether shuffle is active
    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle_enabled
    }

    /// Toggle shuffle and persist the setting
    pub async fn set_shuffle_enabled(&mut self, enabled: bool) {
        self.shuffle_enabled = enabled;
        if let Err(err) = settings::set_setting(
            self.db.pool(),
            settings::SETTING_SHUFFLE_ENABLED,
            &serde_json::Value::Bool(enabled),
        )
        .await
        {
            warn!(error = %err, "failed to persist shuffle setting");
        }
    }

    /// Regenerate the queue as a smart-shuffled permutation, keeping
    /// the current track first
    pub async fn reshuffle_queue(&mut self) {
        if self.queue.is_empty() {
            return;
        }

        let current = self.queue.current_track().cloned();
        let shuffled = self
            .shuffle
            .generate_smart_shuffled_queue(self.queue.tracks(), current.as_ref());
        self.queue.set_queue(shuffled, 0);
        self.emit_queue_changed();
        self.trigger_prefetch().await;
    }

    // --- Sleep timer ------------------------------------------------------

    /// Arm the sleep timer, cancelling any previous tick task
    ///
    /// Minutes mode spawns the 1-second recurring tick that advances
    /// the countdown; songs/end-of-track modes are driven purely by
    /// [`Self::on_song_ended`].
    pub async fn start_sleep_timer(&mut self, timer_settings: SleepTimerSettings) {
        // Predecessor tick must die before a new countdown is armed
        self.sleep_tick_task = None;

        {
            let mut timer = self.sleep_timer.lock().await;
            timer.start(&timer_settings);
            if !timer.is_active() {
                return;
            }
        }

        self.emit(SessionEvent::SleepTimerStarted {
            mode: timer_settings.mode,
        });

        if timer_settings.mode == SleepTimerMode::Minutes {
            let timer = Arc::clone(&self.sleep_timer);
            let events = self.events.clone();
            let period = self.sleep_tick;

            self.sleep_tick_task = Some(ScheduledTask::spawn(async move {
                let mut interval = tokio::time::interval(period);
                // The first tick completes immediately
                interval.tick().await;
                loop {
                    interval.tick().await;
                    let mut timer = timer.lock().await;
                    if timer.poll() {
                        let _ = events.send(SessionEvent::SleepTimerExpired);
                        break;
                    }
                    if !timer.is_active() {
                        break;
                    }
                }
            }));
        }
    }

    /// Cancel the sleep timer and its tick task
    pub async fn stop_sleep_timer(&mut self) {
        self.sleep_tick_task = None;
        let was_active = {
            let mut timer = self.sleep_timer.lock().await;
            let active = timer.is_active();
            timer.stop();
            active
        };
        if was_active {
            self.emit(SessionEvent::SleepTimerStopped);
        }
    }

    /// Track-boundary notification for songs/end-of-track timers
    ///
    /// Returns `true` when playback must stop immediately.
    pub async fn on_song_ended(&mut self) -> bool {
        let expired = self.sleep_timer.lock().await.on_song_ended();
        if expired {
            self.emit(SessionEvent::SleepTimerExpired);
        }
        expired
    }

    /// Whether a sleep countdown is armed
    pub async fn sleep_timer_active(&self) -> bool {
        self.sleep_timer.lock().await.is_active()
    }

    /// Fade-out multiplier for the playback driver's volume
    pub async fn sleep_fade_volume(&self) -> f32 {
        self.sleep_timer.lock().await.fade_volume()
    }

    /// Edge-triggered stop signal, consumed by the read
    pub async fn sleep_timer_should_stop(&self) -> bool {
        self.sleep_timer.lock().await.should_stop()
    }

    // --- Favorites --------------------------------------------------------

    /// Flip a track's favorite flag; returns the new state
    pub async fn toggle_favorite(&self, id: &TrackId) -> Result<bool> {
        if favorites::is_favorite(self.db.pool(), id).await? {
            favorites::remove(self.db.pool(), id).await?;
            Ok(false)
        } else {
            favorites::add(self.db.pool(), id).await?;
            Ok(true)
        }
    }

    /// Whether a track is a favorite
    pub async fn is_favorite(&self, id: &TrackId) -> Result<bool> {
        Ok(favorites::is_favorite(self.db.pool(), id).await?)
    }

    // --- Lifecycle --------------------------------------------------------

    /// Tear the session down: cancel all scheduled work and persist
    /// the queue snapshot and recency list
    pub async fn shutdown(&mut self) -> Result<()> {
        self.sleep_tick_task = None;
        self.sleep_timer.lock().await.stop();
        self.prefetch.cancel_pending().await;

        queue_state::save(self.db.pool(), self.queue.tracks(), self.queue.current_index())
            .await?;
        play_history::save(self.db.pool(), &self.shuffle.history()).await?;

        info!(session_id = %self.id, "player session shut down");
        Ok(())
    }

    /// Sign-out path: cancel all scheduled work and wipe both the
    /// durable store and the media cache
    pub async fn sign_out(mut self) -> Result<()> {
        self.sleep_tick_task = None;
        self.sleep_timer.lock().await.stop();
        self.prefetch.cancel_pending().await;
        self.prefetch.clear().await;
        self.db.clear_all().await?;

        info!(session_id = %self.id, "signed out, local state cleared");
        Ok(())
    }

    // --- Internals --------------------------------------------------------

    async fn after_transition(&mut self, outgoing: Option<Track>, landed: &Track) {
        let previous_track_id = outgoing.as_ref().map(|t| t.id.clone());
        self.finalize_outgoing(outgoing).await;

        self.current_started = Some(Instant::now());
        self.emit(SessionEvent::TrackChanged {
            track_id: landed.id.clone(),
            previous_track_id,
        });
        self.trigger_prefetch().await;
    }

    /// Explicit transition hook: finalize the outgoing track's
    /// accumulated listened time and feed the recency list
    async fn finalize_outgoing(&mut self, outgoing: Option<Track>) {
        let Some(track) = outgoing else {
            return;
        };

        let listened = self
            .current_started
            .take()
            .map(|started| started.elapsed())
            .unwrap_or_default();

        let record = self.prefetch.record_play(&track, listened).await;
        self.emit(SessionEvent::PlayRecorded { record });

        self.shuffle.add_to_history(track.id);
        if let Err(err) = play_history::save(self.db.pool(), &self.shuffle.history()).await {
            warn!(error = %err, "failed to persist shuffle history");
        }
    }

    async fn trigger_prefetch(&self) {
        self.prefetch
            .prefetch_upcoming(
                self.queue.tracks(),
                self.queue.current_index(),
                self.queue.generation(),
                self.shuffle_enabled,
            )
            .await;
    }

    fn emit_queue_changed(&self) {
        self.emit(SessionEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        // A dropped receiver just means nobody is listening
        let _ = self.events.send(event);
    }
}
