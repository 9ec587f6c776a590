use std::collections::BTreeMap;

use foundation::LayerKey;

/// Manager-side state of one materialized layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerState {
    /// Source URL backing this layer's geometry.
    pub url: String,
    pub visible: bool,
    /// Minimum-value filter currently applied on the surface.
    pub threshold: f64,
}

/// The set of layer keys currently materialized on the rendering surface.
///
/// Owned exclusively by the reconciler; visibility planning mutates member
/// state but never creates or destroys entries.
#[derive(Debug, Default)]
pub struct ActiveLayerSet {
    layers: BTreeMap<LayerKey, LayerState>,
}

impl ActiveLayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn contains(&self, key: &LayerKey) -> bool {
        self.layers.contains_key(key)
    }

    pub fn get(&self, key: &LayerKey) -> Option<&LayerState> {
        self.layers.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &LayerKey> {
        self.layers.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LayerKey, &LayerState)> {
        self.layers.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&LayerKey, &mut LayerState)> {
        self.layers.iter_mut()
    }

    pub(crate) fn insert(&mut self, key: LayerKey, state: LayerState) {
        self.layers.insert(key, state);
    }

    pub(crate) fn remove(&mut self, key: &LayerKey) -> Option<LayerState> {
        self.layers.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use foundation::LayerKey;

    use super::{ActiveLayerSet, LayerState};

    #[test]
    fn insert_and_remove_round_trip() {
        let mut set = ActiveLayerSet::new();
        let key = LayerKey::new("PopDensity", "Mali", 2018);
        set.insert(
            key.clone(),
            LayerState {
                url: "/pd/2018".into(),
                visible: false,
                threshold: 0.0,
            },
        );
        assert!(set.contains(&key));
        assert_eq!(set.len(), 1);

        let removed = set.remove(&key);
        assert_eq!(removed.map(|s| s.url), Some("/pd/2018".into()));
        assert!(set.is_empty());
    }
}
