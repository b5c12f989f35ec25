//! Sleep timer state machine
//!
//! Independent countdown/song-count automaton that signals "stop now"
//! and exposes a fade-out volume multiplier. The timer itself is a
//! pure state machine: the owning session drives it with a 1-second
//! recurring tick (`poll`) and at track boundaries (`on_song_ended`),
//! and the playback driver consumes the edge-triggered stop signal.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default fade-out length when fade is enabled without an explicit
/// duration
pub const DEFAULT_FADE_DURATION: Duration = Duration::from_secs(10);

/// What the timer counts down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SleepTimerMode {
    /// Wall-clock countdown
    Minutes,

    /// Fixed number of songs
    Songs,

    /// Stop when the current track ends (songs with a counter of 1)
    EndOfTrack,
}

/// Settings handed to [`SleepTimer::start`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepTimerSettings {
    pub mode: SleepTimerMode,

    /// Countdown length for [`SleepTimerMode::Minutes`]
    pub minutes: u32,

    /// Counter for [`SleepTimerMode::Songs`]
    pub songs: u32,

    /// Ease playback to silence before the scheduled stop
    pub fade_enabled: bool,

    /// Fade-out length (minutes mode only)
    pub fade_duration: Duration,
}

impl SleepTimerSettings {
    /// Wall-clock countdown of `minutes`
    pub fn minutes(minutes: u32) -> Self {
        Self {
            mode: SleepTimerMode::Minutes,
            minutes,
            songs: 0,
            fade_enabled: false,
            fade_duration: DEFAULT_FADE_DURATION,
        }
    }

    /// Stop after `songs` tracks finish
    pub fn songs(songs: u32) -> Self {
        Self {
            mode: SleepTimerMode::Songs,
            minutes: 0,
            songs,
            fade_enabled: false,
            fade_duration: DEFAULT_FADE_DURATION,
        }
    }

    /// Stop when the current track ends
    pub fn end_of_track() -> Self {
        Self {
            mode: SleepTimerMode::EndOfTrack,
            minutes: 0,
            songs: 1,
            fade_enabled: false,
            fade_duration: DEFAULT_FADE_DURATION,
        }
    }

    /// Enable the fade-out with the given duration
    pub fn with_fade(mut self, fade_duration: Duration) -> Self {
        self.fade_enabled = true;
        self.fade_duration = fade_duration;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum CountdownState {
    Idle,
    Minutes {
        ends_at: Instant,
        fade_start: Option<Instant>,
        fade_duration: Duration,
    },
    Songs {
        mode: SleepTimerMode,
        remaining: u32,
    },
}

/// Countdown state machine with fade-out
///
/// Lifecycle: armed by [`Self::start`], mutated by its own
/// tick/song-end calls, reset to idle on expiry or explicit stop.
#[derive(Debug, Clone)]
pub struct SleepTimer {
    state: CountdownState,
    is_fading: bool,
    stop_pending: bool,
}

impl SleepTimer {
    /// Create an idle timer
    pub fn new() -> Self {
        Self {
            state: CountdownState::Idle,
            is_fading: false,
            stop_pending: false,
        }
    }

    /// Arm the timer, cancelling any previous countdown
    ///
    /// Malformed settings (zero minutes or songs) leave the timer idle.
    pub fn start(&mut self, settings: &SleepTimerSettings) {
        self.start_at(settings, Instant::now());
    }

    /// Deterministic variant of [`Self::start`] for drivers with their
    /// own clock
    pub fn start_at(&mut self, settings: &SleepTimerSettings, now: Instant) {
        self.stop();

        match settings.mode {
            SleepTimerMode::Minutes => {
                if settings.minutes == 0 {
                    return;
                }
                let total = Duration::from_secs(u64::from(settings.minutes) * 60);
                let ends_at = now + total;
                let fade_start = if settings.fade_enabled
                    && settings.fade_duration > Duration::ZERO
                {
                    // A fade longer than the countdown starts immediately
                    Some(ends_at.checked_sub(settings.fade_duration).unwrap_or(now).max(now))
                } else {
                    None
                };
                self.state = CountdownState::Minutes {
                    ends_at,
                    fade_start,
                    fade_duration: settings.fade_duration,
                };
            }
            SleepTimerMode::Songs => {
                if settings.songs == 0 {
                    return;
                }
                self.state = CountdownState::Songs {
                    mode: SleepTimerMode::Songs,
                    remaining: settings.songs,
                };
            }
            SleepTimerMode::EndOfTrack => {
                self.state = CountdownState::Songs {
                    mode: SleepTimerMode::EndOfTrack,
                    remaining: 1,
                };
            }
        }
    }

    /// Recurring-tick entry point
    ///
    /// Recomputes remaining time, flips the fading flag once the fade
    /// threshold is crossed, and on expiry resets to idle and latches
    /// the stop signal. Returns `true` exactly on the poll that
    /// observes expiry.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    /// Deterministic variant of [`Self::poll`]
    pub fn poll_at(&mut self, now: Instant) -> bool {
        let CountdownState::Minutes {
            ends_at,
            fade_start,
            ..
        } = self.state
        else {
            return false;
        };

        if let Some(fade_start) = fade_start {
            if now >= fade_start {
                self.is_fading = true;
            }
        }

        if now >= ends_at {
            self.state = CountdownState::Idle;
            self.is_fading = false;
            self.stop_pending = true;
            return true;
        }

        false
    }

    /// Track-boundary entry point for songs/end-of-track modes
    ///
    /// Returns `true` when the counter reached zero and playback must
    /// stop immediately; `false` otherwise, including when the timer is
    /// idle or counting minutes.
    pub fn on_song_ended(&mut self) -> bool {
        let CountdownState::Songs { remaining, .. } = &mut self.state else {
            return false;
        };

        *remaining = remaining.saturating_sub(1);
        if *remaining == 0 {
            self.state = CountdownState::Idle;
            self.is_fading = false;
            self.stop_pending = true;
            true
        } else {
            false
        }
    }

    /// Current fade-out volume multiplier
    ///
    /// `1.0` unless fading; while fading, an ease-out curve
    /// `max(0, 1 - p^2)` that reaches `0.0` exactly at fade completion.
    pub fn fade_volume(&self) -> f32 {
        self.fade_volume_at(Instant::now())
    }

    /// Deterministic variant of [`Self::fade_volume`]
    pub fn fade_volume_at(&self, now: Instant) -> f32 {
        if let CountdownState::Minutes {
            fade_start: Some(fade_start),
            fade_duration,
            ..
        } = self.state
        {
            if now >= fade_start {
                let elapsed = now.duration_since(fade_start);
                let p = (elapsed.as_secs_f32() / fade_duration.as_secs_f32()).min(1.0);
                return (1.0 - p * p).max(0.0);
            }
        }
        1.0
    }

    /// Edge-triggered stop signal
    ///
    /// `true` exactly once per expiry event, then `false` until the
    /// next start+expiry cycle.
    pub fn should_stop(&mut self) -> bool {
        std::mem::take(&mut self.stop_pending)
    }

    /// Cancel the countdown and clear the stop signal
    pub fn stop(&mut self) {
        self.state = CountdownState::Idle;
        self.is_fading = false;
        self.stop_pending = false;
    }

    /// Whether a countdown is armed
    pub fn is_active(&self) -> bool {
        !matches!(self.state, CountdownState::Idle)
    }

    /// Mode of the armed countdown, `None` when idle
    pub fn mode(&self) -> Option<SleepTimerMode> {
        match self.state {
            CountdownState::Idle => None,
            CountdownState::Minutes { .. } => Some(SleepTimerMode::Minutes),
            CountdownState::Songs { mode, .. } => Some(mode),
        }
    }

    /// Whether the fade-out has begun
    pub fn is_fading(&self) -> bool {
        self.is_fading
    }

    /// Remaining wall-clock time in minutes mode
    pub fn remaining_at(&self, now: Instant) -> Option<Duration> {
        match self.state {
            CountdownState::Minutes { ends_at, .. } => {
                Some(ends_at.saturating_duration_since(now))
            }
            _ => None,
        }
    }

    /// Remaining songs in songs/end-of-track mode
    pub fn remaining_songs(&self) -> Option<u32> {
        match self.state {
            CountdownState::Songs { remaining, .. } => Some(remaining),
            _ => None,
        }
    }
}

impl Default for SleepTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(60);

    #[test]
    fn idle_by_default() {
        let mut timer = SleepTimer::new();
        assert!(!timer.is_active());
        assert!(timer.mode().is_none());
        assert!(!timer.should_stop());
        assert_eq!(timer.fade_volume(), 1.0);
    }

    #[test]
    fn minutes_mode_expires_once() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();
        timer.start_at(&SleepTimerSettings::minutes(10), t0);
        assert!(timer.is_active());
        assert_eq!(timer.mode(), Some(SleepTimerMode::Minutes));

        assert!(!timer.poll_at(t0 + 5 * MIN));
        assert!(timer.is_active());
        assert_eq!(timer.remaining_at(t0 + 5 * MIN), Some(5 * MIN));

        assert!(timer.poll_at(t0 + 10 * MIN));
        assert!(!timer.is_active());

        // Edge-triggered: exactly one true
        assert!(timer.should_stop());
        assert!(!timer.should_stop());
    }

    #[test]
    fn restart_cancels_previous_countdown() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();
        timer.start_at(&SleepTimerSettings::minutes(1), t0);
        timer.start_at(&SleepTimerSettings::minutes(30), t0 + 30 * MIN);

        // The first deadline has long passed; only the new one counts
        assert!(!timer.poll_at(t0 + 40 * MIN));
        assert!(timer.is_active());
        assert!(timer.poll_at(t0 + 60 * MIN));
    }

    #[test]
    fn zero_minutes_is_a_noop() {
        let mut timer = SleepTimer::new();
        timer.start_at(&SleepTimerSettings::minutes(0), Instant::now());
        assert!(!timer.is_active());
    }

    #[test]
    fn songs_mode_counts_down() {
        let mut timer = SleepTimer::new();
        timer.start(&SleepTimerSettings::songs(3));
        assert_eq!(timer.remaining_songs(), Some(3));

        assert!(!timer.on_song_ended());
        assert!(!timer.on_song_ended());
        assert!(timer.on_song_ended());

        assert!(!timer.is_active());
        assert!(timer.should_stop());
        assert!(!timer.should_stop());
    }

    #[test]
    fn end_of_track_is_songs_with_counter_one() {
        let mut timer = SleepTimer::new();
        timer.start(&SleepTimerSettings::end_of_track());
        assert_eq!(timer.mode(), Some(SleepTimerMode::EndOfTrack));
        assert_eq!(timer.remaining_songs(), Some(1));
        assert!(timer.on_song_ended());
    }

    #[test]
    fn song_end_ignored_when_idle_or_in_minutes_mode() {
        let mut timer = SleepTimer::new();
        assert!(!timer.on_song_ended());

        timer.start_at(&SleepTimerSettings::minutes(10), Instant::now());
        assert!(!timer.on_song_ended());
        assert!(timer.is_active());
    }

    #[test]
    fn fade_volume_is_unity_before_threshold() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();
        let settings = SleepTimerSettings::minutes(10).with_fade(Duration::from_secs(30));
        timer.start_at(&settings, t0);

        assert_eq!(timer.fade_volume_at(t0), 1.0);
        assert_eq!(timer.fade_volume_at(t0 + 9 * MIN), 1.0);
        assert_eq!(timer.fade_volume_at(t0 + 10 * MIN - Duration::from_secs(31)), 1.0);
    }

    #[test]
    fn fade_volume_eases_out_quadratically() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();
        let settings = SleepTimerSettings::minutes(10).with_fade(Duration::from_secs(30));
        timer.start_at(&settings, t0);

        let fade_start = t0 + 10 * MIN - Duration::from_secs(30);

        // Halfway through the fade: 1 - 0.5^2
        let halfway = timer.fade_volume_at(fade_start + Duration::from_secs(15));
        assert!((halfway - 0.75).abs() < 1e-6);

        // Completion and beyond: exactly zero
        assert_eq!(timer.fade_volume_at(fade_start + Duration::from_secs(30)), 0.0);
        assert_eq!(timer.fade_volume_at(fade_start + Duration::from_secs(45)), 0.0);
    }

    #[test]
    fn poll_flips_fading_flag() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();
        let settings = SleepTimerSettings::minutes(2).with_fade(Duration::from_secs(30));
        timer.start_at(&settings, t0);

        timer.poll_at(t0 + MIN);
        assert!(!timer.is_fading());

        timer.poll_at(t0 + 2 * MIN - Duration::from_secs(10));
        assert!(timer.is_fading());
    }

    #[test]
    fn fade_longer_than_countdown_starts_immediately() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();
        let settings = SleepTimerSettings::minutes(1).with_fade(Duration::from_secs(300));
        timer.start_at(&settings, t0);

        timer.poll_at(t0);
        assert!(timer.is_fading());
        assert!(timer.fade_volume_at(t0 + Duration::from_secs(1)) < 1.0);
    }

    #[test]
    fn stop_clears_everything() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();
        timer.start_at(&SleepTimerSettings::minutes(1), t0);
        timer.poll_at(t0 + MIN);
        assert!(timer.is_active() || timer.stop_pending);

        timer.stop();
        assert!(!timer.is_active());
        assert!(!timer.should_stop());
        assert_eq!(timer.fade_volume(), 1.0);
    }

    #[test]
    fn expiry_resets_fade_state() {
        let t0 = Instant::now();
        let mut timer = SleepTimer::new();
        let settings = SleepTimerSettings::minutes(1).with_fade(Duration::from_secs(30));
        timer.start_at(&settings, t0);

        timer.poll_at(t0 + Duration::from_secs(45));
        assert!(timer.is_fading());

        assert!(timer.poll_at(t0 + MIN));
        assert!(!timer.is_fading());
        assert_eq!(timer.fade_volume_at(t0 + MIN), 1.0);
    }
}
