//! Rendering-surface boundary.
//!
//! The map widget itself (projection, camera, paint primitives) is an
//! external collaborator. This module defines the narrow contract the
//! layer manager drives it through: batches of add/remove/visibility/filter
//! operations, applied together at the surface's next paint opportunity so
//! interleaved show/hide calls never flicker.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use formats::FeatureCollection;
use foundation::LayerKey;

use crate::range::ValueRange;

/// Inequality filter carried by a layer: keep features with `DN >= min`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct MinValueFilter(pub f64);

/// One mutation against the rendering surface.
#[derive(Debug, Clone)]
pub enum SurfaceOp {
    AddSource {
        id: String,
        geometry: Arc<FeatureCollection>,
    },
    RemoveSource {
        id: String,
    },
    AddLayer {
        key: LayerKey,
        source: String,
        /// Color-mapping domain for this layer's dataset.
        range: ValueRange,
        visible: bool,
        filter: MinValueFilter,
    },
    RemoveLayer {
        key: LayerKey,
    },
    SetVisibility {
        key: LayerKey,
        visible: bool,
    },
    SetFilter {
        key: LayerKey,
        filter: MinValueFilter,
    },
}

/// The rendering surface contract.
///
/// Ordering contract:
/// - A batch is applied atomically with respect to painting.
/// - Within a batch, operations are applied in order; callers put removals
///   and hides ahead of additions and shows.
pub trait MapSurface: Send {
    fn apply(&mut self, batch: Vec<SurfaceOp>);
}

/// What the recording surface knows about one materialized layer.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLayer {
    pub key: LayerKey,
    pub source: String,
    pub range: ValueRange,
    pub visible: bool,
    pub filter: MinValueFilter,
}

/// In-memory surface model for testing.
///
/// Maintains the same identifier discipline a real surface enforces and
/// panics on violations (duplicate ids, mutations of unknown layers) so
/// invariant breaches fail tests loudly. Applied batches are kept verbatim
/// for ordering assertions.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    sources: BTreeSet<String>,
    layers: BTreeMap<String, RecordedLayer>,
    batches: Vec<Vec<SurfaceOp>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn layer(&self, id: &str) -> Option<&RecordedLayer> {
        self.layers.get(id)
    }

    pub fn layers(&self) -> impl Iterator<Item = &RecordedLayer> {
        self.layers.values()
    }

    pub fn visible_layer_ids(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter(|(_, l)| l.visible)
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn batches(&self) -> &[Vec<SurfaceOp>] {
        &self.batches
    }
}

impl MapSurface for RecordingSurface {
    fn apply(&mut self, batch: Vec<SurfaceOp>) {
        for op in &batch {
            match op {
                SurfaceOp::AddSource { id, .. } => {
                    assert!(self.sources.insert(id.clone()), "duplicate source {id}");
                }
                SurfaceOp::RemoveSource { id } => {
                    assert!(self.sources.remove(id), "unknown source {id}");
                }
                SurfaceOp::AddLayer {
                    key,
                    source,
                    range,
                    visible,
                    filter,
                } => {
                    assert!(self.sources.contains(source), "layer without source {key}");
                    let prev = self.layers.insert(
                        key.id(),
                        RecordedLayer {
                            key: key.clone(),
                            source: source.clone(),
                            range: *range,
                            visible: *visible,
                            filter: *filter,
                        },
                    );
                    assert!(prev.is_none(), "duplicate layer {key}");
                }
                SurfaceOp::RemoveLayer { key } => {
                    assert!(self.layers.remove(&key.id()).is_some(), "unknown layer {key}");
                }
                SurfaceOp::SetVisibility { key, visible } => {
                    let layer = self.layers.get_mut(&key.id()).expect("unknown layer");
                    layer.visible = *visible;
                }
                SurfaceOp::SetFilter { key, filter } => {
                    let layer = self.layers.get_mut(&key.id()).expect("unknown layer");
                    layer.filter = *filter;
                }
            }
        }
        self.batches.push(batch);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use foundation::LayerKey;

    use super::{MapSurface, MinValueFilter, RecordingSurface, SurfaceOp};
    use crate::range::ValueRange;

    fn empty_collection() -> Arc<formats::FeatureCollection> {
        Arc::new(formats::FeatureCollection {
            kind: "FeatureCollection".to_string(),
            features: vec![],
        })
    }

    #[test]
    fn recording_surface_tracks_layer_model() {
        let mut surface = RecordingSurface::new();
        let key = LayerKey::new("PopDensity", "Mali", 2015);
        surface.apply(vec![
            SurfaceOp::AddSource {
                id: key.id(),
                geometry: empty_collection(),
            },
            SurfaceOp::AddLayer {
                key: key.clone(),
                source: key.id(),
                range: ValueRange::new(1.0, 9.0),
                visible: false,
                filter: MinValueFilter(0.0),
            },
        ]);
        surface.apply(vec![SurfaceOp::SetVisibility {
            key: key.clone(),
            visible: true,
        }]);

        assert_eq!(surface.layer_count(), 1);
        assert_eq!(surface.visible_layer_ids(), vec![key.id()]);
        assert_eq!(surface.batches().len(), 2);
    }

    #[test]
    #[should_panic(expected = "duplicate layer")]
    fn duplicate_layer_id_panics() {
        let mut surface = RecordingSurface::new();
        let key = LayerKey::new("PopDensity", "Mali", 2015);
        let add = |key: &LayerKey| SurfaceOp::AddLayer {
            key: key.clone(),
            source: key.id(),
            range: ValueRange::new(1.0, 9.0),
            visible: false,
            filter: MinValueFilter(0.0),
        };
        surface.apply(vec![
            SurfaceOp::AddSource {
                id: key.id(),
                geometry: empty_collection(),
            },
            add(&key),
            add(&key),
        ]);
    }
}
