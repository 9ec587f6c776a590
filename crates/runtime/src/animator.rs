//! Year-stepping playback state machine.
//!
//! Deterministic core of the animation driver: all deadlines are explicit
//! `Instant`s supplied by the caller, so the machine can be driven by a
//! real timer in production and by fabricated clocks in tests.

use std::time::{Duration, Instant};

use foundation::{Year, YearSequence};
use tracing::debug;

/// Default step interval when the user has not picked a speed.
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Playback {
    Stopped,
    Playing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// Animation over fewer than two years is meaningless.
    NeedsTwoYears { selected: usize },
}

impl std::fmt::Display for AnimationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnimationError::NeedsTwoYears { selected } => {
                write!(f, "animation needs at least two years, {selected} selected")
            }
        }
    }
}

impl std::error::Error for AnimationError {}

/// `Stopped → Playing → Stopped`, with `Playing` parameterized by a step
/// interval and carrying the deadline of the next pending step.
#[derive(Debug)]
pub struct Animator {
    playback: Playback,
    interval: Duration,
    next_at: Option<Instant>,
}

impl Default for Animator {
    fn default() -> Self {
        Self {
            playback: Playback::Stopped,
            interval: DEFAULT_STEP_INTERVAL,
            next_at: None,
        }
    }
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn playback(&self) -> Playback {
        self.playback
    }

    pub fn is_playing(&self) -> bool {
        self.playback == Playback::Playing
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Deadline of the pending step, if playing.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_at
    }

    /// Transitions to `Playing` and schedules the first step.
    pub fn start(&mut self, years: &YearSequence, now: Instant) -> Result<(), AnimationError> {
        if !years.animatable() {
            return Err(AnimationError::NeedsTwoYears {
                selected: years.len(),
            });
        }
        self.playback = Playback::Playing;
        self.next_at = Some(now + self.interval);
        debug!(interval_ms = self.interval.as_millis() as u64, "playback started");
        Ok(())
    }

    /// Transitions to `Stopped` and cancels the pending step.
    pub fn stop(&mut self) {
        if self.playback == Playback::Playing {
            debug!("playback stopped");
        }
        self.playback = Playback::Stopped;
        self.next_at = None;
    }

    /// Updates the step interval. If playing, the pending step is
    /// cancelled and rescheduled to `now + interval`; a step already being
    /// executed is unaffected.
    pub fn set_speed(&mut self, interval: Duration, now: Instant) {
        // A zero interval would make the deadline permanently due.
        self.interval = interval.max(Duration::from_millis(1));
        if self.playback == Playback::Playing {
            self.next_at = Some(now + self.interval);
        }
    }

    /// Executes one due step: advances the sequence index with wraparound
    /// and schedules the next step. Returns the year to display, or `None`
    /// when stopped.
    pub fn step(&mut self, years: &mut YearSequence, now: Instant) -> Option<Year> {
        if self.playback != Playback::Playing {
            return None;
        }
        let year = years.advance()?;
        self.next_at = Some(now + self.interval);
        Some(year)
    }
}
