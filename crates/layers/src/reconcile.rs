//! Layer reconciliation: turning a resolved selection into a minimal
//! sequence of add/remove operations against the rendering surface.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use catalog::ResolvedSelection;
use formats::FeatureCollection;
use foundation::{LayerKey, ThresholdMap};
use futures_util::future::join_all;
use streaming::{FetchError, GeometryCache};
use tracing::{info, warn};

use crate::active::{ActiveLayerSet, LayerState};
use crate::range::RangeTracker;
use crate::surface::{MapSurface, MinValueFilter, SurfaceOp};

/// What one reconciliation did.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub added: Vec<LayerKey>,
    pub removed: Vec<LayerKey>,
    /// Combinations dropped from this batch because their geometry fetch
    /// failed. Non-fatal; the rest of the batch proceeds.
    pub failed: Vec<(LayerKey, FetchError)>,
}

/// Owns the active layer set and diffs it against resolved selections.
#[derive(Debug, Default)]
pub struct Reconciler {
    active: ActiveLayerSet,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> &ActiveLayerSet {
        &self.active
    }

    pub fn active_mut(&mut self) -> &mut ActiveLayerSet {
        &mut self.active
    }

    /// Reconciles the surface against `resolved`.
    ///
    /// Stale members are removed before any additions, so the surface never
    /// holds two generations of the same key. A member whose resolved URL
    /// differs from the one it was built from counts as stale and is
    /// rebuilt. Missing geometries are fetched concurrently through the
    /// cache; per-URL failures exclude their combinations individually.
    /// Re-invoking with an unchanged resolution issues no surface batch at
    /// all.
    pub async fn reconcile(
        &mut self,
        resolved: &ResolvedSelection,
        cache: &GeometryCache,
        ranges: &mut RangeTracker,
        thresholds: &ThresholdMap,
        surface: &mut dyn MapSurface,
    ) -> ReconcileOutcome {
        let targets = resolved.target_keys();
        let target_urls: BTreeMap<&LayerKey, &str> =
            targets.iter().map(|(key, url)| (key, url.as_str())).collect();

        let mut outcome = ReconcileOutcome::default();

        // Removals first. A key resolving to a new URL is stale too: its
        // attached geometry no longer matches the resolution.
        let stale: Vec<LayerKey> = self
            .active
            .iter()
            .filter(|(key, state)| {
                target_urls.get(*key).is_none_or(|url| *url != state.url)
            })
            .map(|(key, _)| key.clone())
            .collect();
        if !stale.is_empty() {
            let mut batch = Vec::with_capacity(stale.len() * 2);
            for key in &stale {
                batch.push(SurfaceOp::RemoveLayer { key: key.clone() });
                batch.push(SurfaceOp::RemoveSource { id: key.id() });
                self.active.remove(key);
            }
            surface.apply(batch);
            outcome.removed = stale;
        }

        // Concurrent fan-out for geometries the new members need. The
        // cache deduplicates, so a URL shared by several keys is fetched
        // once at most.
        let missing: Vec<&(LayerKey, String)> = targets
            .iter()
            .filter(|(key, _)| !self.active.contains(key))
            .collect();
        let urls: BTreeSet<&str> = missing.iter().map(|(_, url)| url.as_str()).collect();
        let fetched: BTreeMap<String, Result<Arc<FeatureCollection>, FetchError>> =
            join_all(urls.iter().map(|url| async move {
                (url.to_string(), cache.get(url).await)
            }))
            .await
            .into_iter()
            .collect();

        // Additions, hidden until the scheduler shows the current year.
        let mut batch = Vec::new();
        for (key, url) in missing {
            match &fetched[url.as_str()] {
                Ok(geometry) => {
                    let range = ranges.ensure_range(&key.dataset, geometry.dn_values());
                    let threshold = thresholds.get(&key.dataset);
                    batch.push(SurfaceOp::AddSource {
                        id: key.id(),
                        geometry: Arc::clone(geometry),
                    });
                    batch.push(SurfaceOp::AddLayer {
                        key: key.clone(),
                        source: key.id(),
                        range,
                        visible: false,
                        filter: MinValueFilter(threshold),
                    });
                    self.active.insert(
                        key.clone(),
                        LayerState {
                            url: url.clone(),
                            visible: false,
                            threshold,
                        },
                    );
                    outcome.added.push(key.clone());
                }
                Err(error) => {
                    warn!(key = %key, url = %url, %error, "dropping combination from batch");
                    outcome.failed.push((key.clone(), error.clone()));
                }
            }
        }
        if !batch.is_empty() {
            surface.apply(batch);
        }

        info!(
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            failed = outcome.failed.len(),
            active = self.active.len(),
            "reconciliation complete"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use catalog::{Resolved, ResolvedSelection};
    use formats::parse_feature_collection;
    use foundation::{LayerKey, ThresholdMap};
    use pretty_assertions::assert_eq;
    use streaming::{FetchError, GeometryCache, GeometrySource, MemoryGeometrySource};

    use super::Reconciler;
    use crate::range::RangeTracker;
    use crate::surface::{MinValueFilter, RecordingSurface, SurfaceOp};

    fn payload(dns: &[i64]) -> formats::FeatureCollection {
        let features: Vec<String> = dns
            .iter()
            .map(|dn| {
                format!(
                    r#"{{"type":"Feature","properties":{{"DN":{dn}}},"geometry":{{"type":"Point","coordinates":[0,0]}}}}"#
                )
            })
            .collect();
        let doc = format!(
            r#"{{"type":"FeatureCollection","features":[{}]}}"#,
            features.join(",")
        );
        parse_feature_collection(doc.as_bytes()).expect("fixture")
    }

    fn fixture() -> (Arc<MemoryGeometrySource>, GeometryCache, ResolvedSelection) {
        let source = Arc::new(MemoryGeometrySource::new());
        source.insert("/pd/2015", payload(&[2, 9]));
        source.insert("/pd/2018", payload(&[4, 30]));
        let cache = GeometryCache::new(Arc::clone(&source) as Arc<dyn GeometrySource>);

        let mut resolved = ResolvedSelection::default();
        resolved.insert(2015, "PopDensity", "Mali", Resolved::Url("/pd/2015".into()));
        resolved.insert(2018, "PopDensity", "Mali", Resolved::Url("/pd/2018".into()));
        (source, cache, resolved)
    }

    #[tokio::test]
    async fn valid_selection_materializes_all_keys() {
        let (_, cache, resolved) = fixture();
        let mut reconciler = Reconciler::new();
        let mut ranges = RangeTracker::new();
        let mut surface = RecordingSurface::new();

        let outcome = reconciler
            .reconcile(
                &resolved,
                &cache,
                &mut ranges,
                &ThresholdMap::new(),
                &mut surface,
            )
            .await;

        assert_eq!(outcome.added.len(), 2);
        assert!(outcome.failed.is_empty());
        assert_eq!(reconciler.active().len(), 2);
        assert_eq!(surface.layer_count(), 2);
        // New layers start hidden.
        assert!(surface.visible_layer_ids().is_empty());
        // Range computed from the first batch for the dataset.
        assert_eq!(ranges.get("PopDensity").unwrap().min, 2.0);
    }

    #[tokio::test]
    async fn reconcile_is_idempotent() {
        let (source, cache, resolved) = fixture();
        let mut reconciler = Reconciler::new();
        let mut ranges = RangeTracker::new();
        let mut surface = RecordingSurface::new();
        let thresholds = ThresholdMap::new();

        reconciler
            .reconcile(&resolved, &cache, &mut ranges, &thresholds, &mut surface)
            .await;
        let batches_after_first = surface.batches().len();

        let outcome = reconciler
            .reconcile(&resolved, &cache, &mut ranges, &thresholds, &mut surface)
            .await;

        assert!(outcome.added.is_empty());
        assert!(outcome.removed.is_empty());
        assert_eq!(surface.batches().len(), batches_after_first);
        assert_eq!(surface.layer_count(), 2);
        assert_eq!(source.fetch_count("/pd/2015"), 1);
    }

    #[tokio::test]
    async fn stale_layers_are_removed_before_additions() {
        let (source, cache, resolved) = fixture();
        let mut reconciler = Reconciler::new();
        let mut ranges = RangeTracker::new();
        let mut surface = RecordingSurface::new();
        let thresholds = ThresholdMap::new();

        reconciler
            .reconcile(&resolved, &cache, &mut ranges, &thresholds, &mut surface)
            .await;

        // A new selection keeps 2018 but swaps 2015 for 2020.
        source.insert("/pd/2020", payload(&[1, 5]));
        let mut next = ResolvedSelection::default();
        next.insert(2018, "PopDensity", "Mali", Resolved::Url("/pd/2018".into()));
        next.insert(2020, "PopDensity", "Mali", Resolved::Url("/pd/2020".into()));

        let before = surface.batches().len();
        let outcome = reconciler
            .reconcile(&next, &cache, &mut ranges, &thresholds, &mut surface)
            .await;

        assert_eq!(outcome.removed, vec![LayerKey::new("PopDensity", "Mali", 2015)]);
        assert_eq!(outcome.added, vec![LayerKey::new("PopDensity", "Mali", 2020)]);
        assert_eq!(reconciler.active().len(), 2);
        // The stale layer's source is gone too.
        assert_eq!(surface.source_count(), 2);

        // The removal batch precedes the addition batch.
        let batches = &surface.batches()[before..];
        assert!(matches!(batches[0][0], SurfaceOp::RemoveLayer { .. }));
        assert!(matches!(batches[1][0], SurfaceOp::AddSource { .. }));
    }

    #[tokio::test]
    async fn changed_url_rebuilds_the_layer() {
        let (source, cache, resolved) = fixture();
        let mut reconciler = Reconciler::new();
        let mut ranges = RangeTracker::new();
        let mut surface = RecordingSurface::new();
        let thresholds = ThresholdMap::new();

        reconciler
            .reconcile(&resolved, &cache, &mut ranges, &thresholds, &mut surface)
            .await;

        // Same keys, but 2015 now resolves elsewhere.
        source.insert("/pd/2015-v2", payload(&[7, 11]));
        let mut next = ResolvedSelection::default();
        next.insert(2015, "PopDensity", "Mali", Resolved::Url("/pd/2015-v2".into()));
        next.insert(2018, "PopDensity", "Mali", Resolved::Url("/pd/2018".into()));

        let outcome = reconciler
            .reconcile(&next, &cache, &mut ranges, &thresholds, &mut surface)
            .await;

        let key = LayerKey::new("PopDensity", "Mali", 2015);
        assert_eq!(outcome.removed, vec![key.clone()]);
        assert_eq!(outcome.added, vec![key.clone()]);
        assert_eq!(reconciler.active().len(), 2);
        assert_eq!(
            reconciler.active().get(&key).map(|s| s.url.as_str()),
            Some("/pd/2015-v2")
        );
        assert_eq!(source.fetch_count("/pd/2015-v2"), 1);
        // The untouched 2018 member was not rebuilt.
        assert_eq!(source.fetch_count("/pd/2018"), 1);
    }

    #[tokio::test]
    async fn fetch_failure_drops_only_that_combination() {
        let (source, cache, mut resolved) = fixture();
        source.fail("/pd/2018", FetchError::Status(500));
        resolved.insert(
            2020,
            "PopDensity",
            "Sudan",
            Resolved::Error("Country not supported for PopDensity".into()),
        );

        let mut reconciler = Reconciler::new();
        let mut ranges = RangeTracker::new();
        let mut surface = RecordingSurface::new();

        let outcome = reconciler
            .reconcile(
                &resolved,
                &cache,
                &mut ranges,
                &ThresholdMap::new(),
                &mut surface,
            )
            .await;

        // 2015 loads; 2018 failed its fetch; the Sudan error marker never
        // entered the target set at all.
        assert_eq!(outcome.added, vec![LayerKey::new("PopDensity", "Mali", 2015)]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(reconciler.active().len(), 1);
        assert_eq!(surface.layer_count(), 1);
    }

    #[tokio::test]
    async fn new_layer_carries_current_threshold() {
        let (_, cache, resolved) = fixture();
        let mut thresholds = ThresholdMap::new();
        thresholds.set("PopDensity", 1.0);

        let mut reconciler = Reconciler::new();
        let mut ranges = RangeTracker::new();
        let mut surface = RecordingSurface::new();
        reconciler
            .reconcile(&resolved, &cache, &mut ranges, &thresholds, &mut surface)
            .await;

        let key = LayerKey::new("PopDensity", "Mali", 2015);
        let layer = surface.layer(&key.id()).expect("layer");
        assert_eq!(layer.filter, MinValueFilter(1.0));
        assert!(!layer.visible);
    }
}
