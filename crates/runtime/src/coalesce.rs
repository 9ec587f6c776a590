//! Latest-wins coalescing for rapid-fire edits.
//!
//! Rapid successive submissions (a threshold drag, say) collapse into one
//! application: every submission overwrites the pending value for its key
//! and pushes the deadline out by the quiet window, so only the last value
//! inside the window is ever applied. Single pending deadline, no queue.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Quiet window if the caller has no opinion; "tens of milliseconds".
pub const DEFAULT_QUIET_WINDOW: Duration = Duration::from_millis(40);

#[derive(Debug)]
pub struct Coalescer<K, V> {
    pending: BTreeMap<K, V>,
    deadline: Option<Instant>,
    quiet: Duration,
}

impl<K: Ord, V> Coalescer<K, V> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            pending: BTreeMap::new(),
            deadline: None,
            quiet,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline at which the pending values become due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Records a value for `key`, replacing any pending one, and restarts
    /// the quiet window.
    pub fn submit(&mut self, key: K, value: V, now: Instant) {
        self.pending.insert(key, value);
        self.deadline = Some(now + self.quiet);
    }

    /// Takes the pending values if the quiet window has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<BTreeMap<K, V>> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(std::mem::take(&mut self.pending))
            }
            _ => None,
        }
    }
}

impl<K: Ord, V> Default for Coalescer<K, V> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use super::Coalescer;

    #[test]
    fn latest_value_wins_within_the_window() {
        let mut c: Coalescer<&str, f64> = Coalescer::new(Duration::from_millis(40));
        let t0 = Instant::now();
        c.submit("PopDensity", 1.0, t0);
        c.submit("PopDensity", 2.0, t0 + Duration::from_millis(10));
        c.submit("PopDensity", 3.0, t0 + Duration::from_millis(20));

        // Not yet due: the last submission restarted the window.
        assert!(c.take_due(t0 + Duration::from_millis(45)).is_none());

        let due = c.take_due(t0 + Duration::from_millis(60)).expect("due");
        assert_eq!(due.get("PopDensity"), Some(&3.0));
        assert!(c.is_idle());
    }

    #[test]
    fn distinct_keys_coalesce_independently() {
        let mut c: Coalescer<&str, f64> = Coalescer::new(Duration::from_millis(40));
        let t0 = Instant::now();
        c.submit("PopDensity", 5.0, t0);
        c.submit("Precipitation", 7.0, t0 + Duration::from_millis(5));

        let due = c
            .take_due(t0 + Duration::from_millis(50))
            .expect("both due together");
        assert_eq!(due.len(), 2);
    }

    #[test]
    fn take_due_before_deadline_returns_nothing() {
        let mut c: Coalescer<&str, f64> = Coalescer::new(Duration::from_millis(40));
        let t0 = Instant::now();
        c.submit("PopDensity", 1.0, t0);
        assert!(c.take_due(t0 + Duration::from_millis(39)).is_none());
        assert!(!c.is_idle());
    }
}
