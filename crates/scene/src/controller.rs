//! The overlay controller: one struct owning every piece of mutable layer
//! state, driven from a single logical thread.
//!
//! Concurrency model: the only suspension points are the geometry fetch
//! awaits inside `apply_filters`; everything else (visibility changes,
//! index advances, threshold edits) is synchronous with respect to the
//! caller. The service loop serializes commands, so reconciliations never
//! overlap and no locking is needed around this struct.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog::{Selection, SelectionResolver};
use foundation::{ThresholdMap, YearSequence};
use layers::{
    ActiveLayerSet, MapSurface, RangeTracker, Reconciler, ValueRange, ZeroPolicy,
    plan_apply_thresholds, plan_show_year,
};
use runtime::{Animator, Coalescer, DEFAULT_QUIET_WINDOW};
use streaming::{GeometryCache, GeometrySource};
use tracing::warn;

use crate::notice::{Notice, NoticeLog};

/// Tunables for a controller instance.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Quiet window for coalescing rapid threshold edits.
    pub threshold_quiet_window: Duration,
    /// Whether zero-valued `DN` features count toward color domains.
    pub zero_policy: ZeroPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            threshold_quiet_window: DEFAULT_QUIET_WINDOW,
            zero_policy: ZeroPolicy::default(),
        }
    }
}

/// Turns a `(datasets × locations × years)` selection into a minimal,
/// correct set of rendered overlay layers, and animates through the years.
pub struct OverlayController {
    resolver: Arc<dyn SelectionResolver>,
    cache: GeometryCache,
    reconciler: Reconciler,
    ranges: RangeTracker,
    thresholds: ThresholdMap,
    years: YearSequence,
    animator: Animator,
    threshold_edits: Coalescer<String, f64>,
    notices: NoticeLog,
    surface: Box<dyn MapSurface>,
}

impl OverlayController {
    pub fn new(
        resolver: Arc<dyn SelectionResolver>,
        source: Arc<dyn GeometrySource>,
        surface: Box<dyn MapSurface>,
    ) -> Self {
        Self::with_config(resolver, source, surface, ControllerConfig::default())
    }

    pub fn with_config(
        resolver: Arc<dyn SelectionResolver>,
        source: Arc<dyn GeometrySource>,
        surface: Box<dyn MapSurface>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            resolver,
            cache: GeometryCache::new(source),
            reconciler: Reconciler::new(),
            ranges: RangeTracker::with_zero_policy(config.zero_policy),
            thresholds: ThresholdMap::new(),
            years: YearSequence::default(),
            animator: Animator::new(),
            threshold_edits: Coalescer::new(config.threshold_quiet_window),
            notices: NoticeLog::new(),
            surface,
        }
    }

    pub fn active(&self) -> &ActiveLayerSet {
        self.reconciler.active()
    }

    pub fn years(&self) -> &YearSequence {
        &self.years
    }

    pub fn thresholds(&self) -> &ThresholdMap {
        &self.thresholds
    }

    pub fn is_playing(&self) -> bool {
        self.animator.is_playing()
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    /// Entry point for the selection UI: one full load cycle.
    ///
    /// Resolution failure leaves the previous layers untouched. A
    /// successful resolution implicitly stops playback, resets the year
    /// index to 0, reconciles the surface, and paints the first year.
    pub async fn apply_filters(&mut self, selection: Selection) {
        self.thresholds.merge(&selection.thresholds);

        let resolved = match self.resolver.resolve(&selection).await {
            Ok(resolved) => resolved,
            Err(error) => {
                warn!(%error, "selection resolution failed");
                self.notices.push(Notice::ResolutionFailed {
                    message: error.to_string(),
                });
                return;
            }
        };

        self.animator.stop();
        self.years = resolved.year_sequence();

        let outcome = self
            .reconciler
            .reconcile(
                &resolved,
                &self.cache,
                &mut self.ranges,
                &self.thresholds,
                &mut *self.surface,
            )
            .await;
        for (key, _) in outcome.failed {
            self.notices.push(Notice::GeometryUnavailable { key });
        }

        if self.reconciler.active().is_empty() {
            self.notices.push(Notice::NoDataForSelection);
            return;
        }
        self.show_current_year();
    }

    /// Explicit year pick from the timeline UI.
    pub fn set_year(&mut self, index: usize) {
        if self.years.set_index(index) {
            self.show_current_year();
        } else {
            warn!(index, len = self.years.len(), "year index out of range");
        }
    }

    /// Updates the animation step interval.
    pub fn set_speed(&mut self, interval: Duration, now: Instant) {
        self.animator.set_speed(interval, now);
    }

    /// Starts playback, or stops it if already playing.
    pub fn toggle_animation(&mut self, now: Instant) {
        if self.animator.is_playing() {
            self.animator.stop();
            return;
        }
        if let Err(error) = self.animator.start(&self.years, now) {
            warn!(%error, "animation not started");
            self.notices.push(Notice::AnimationNeedsTwoYears {
                selected: self.years.len(),
            });
        }
    }

    /// Threshold edit from a drag gesture; coalesced, applied after the
    /// quiet window elapses.
    pub fn edit_threshold(&mut self, dataset: impl Into<String>, min_value: f64, now: Instant) {
        self.threshold_edits.submit(dataset.into(), min_value, now);
    }

    /// External range-override action: replaces a dataset's color domain.
    pub fn override_range(&mut self, dataset: impl Into<String>, range: ValueRange) {
        self.ranges.override_range(dataset, range);
    }

    /// Fires any due timer work (animation steps, coalesced threshold
    /// edits) and reports the next wake-up deadline, if one is pending.
    pub fn poll(&mut self, now: Instant) -> Option<Instant> {
        if let Some(edits) = self.threshold_edits.take_due(now) {
            self.thresholds.merge(&edits);
            self.apply_thresholds_to_current_year();
        }

        while let Some(deadline) = self.animator.next_deadline() {
            if now < deadline {
                break;
            }
            if self.animator.step(&mut self.years, now).is_some() {
                self.show_current_year();
            }
        }

        match (self.animator.next_deadline(), self.threshold_edits.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn show_current_year(&mut self) {
        let Some(year) = self.years.current() else {
            return;
        };
        let batch = plan_show_year(self.reconciler.active_mut(), year, &self.thresholds);
        if !batch.is_empty() {
            self.surface.apply(batch);
        }
    }

    fn apply_thresholds_to_current_year(&mut self) {
        let Some(year) = self.years.current() else {
            return;
        };
        let batch = plan_apply_thresholds(self.reconciler.active_mut(), year, &self.thresholds);
        if !batch.is_empty() {
            self.surface.apply(batch);
        }
    }
}
