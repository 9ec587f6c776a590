/// Calendar year of an overlay slice.
pub type Year = i32;

/// Identifies exactly one renderable overlay: one dataset, for one
/// location, for one year.
///
/// Immutable once created. `id()` is the stable identifier used for both
/// the rendering-surface layer and its backing geometry source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LayerKey {
    pub dataset: String,
    pub location: String,
    pub year: Year,
}

impl LayerKey {
    pub fn new(dataset: impl Into<String>, location: impl Into<String>, year: Year) -> Self {
        Self {
            dataset: dataset.into(),
            location: location.into(),
            year,
        }
    }

    /// Stable surface identifier. Never parsed back; uniqueness follows
    /// from the (dataset, location, year) triple being unique.
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.dataset, self.location, self.year)
    }
}

impl std::fmt::Display for LayerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.dataset, self.location, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::LayerKey;

    #[test]
    fn keys_order_by_dataset_then_location_then_year() {
        let mut keys = vec![
            LayerKey::new("Precipitation", "Mali", 2015),
            LayerKey::new("PopDensity", "Mali", 2018),
            LayerKey::new("PopDensity", "Chad", 2018),
            LayerKey::new("PopDensity", "Chad", 2015),
        ];
        keys.sort();
        assert_eq!(keys[0], LayerKey::new("PopDensity", "Chad", 2015));
        assert_eq!(keys[3], LayerKey::new("Precipitation", "Mali", 2015));
    }

    #[test]
    fn id_is_unique_per_triple() {
        let a = LayerKey::new("PopDensity", "Mali", 2015);
        let b = LayerKey::new("PopDensity", "Mali", 2018);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), "PopDensity-Mali-2015");
    }
}
