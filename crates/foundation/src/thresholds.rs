use std::collections::BTreeMap;

/// Per-dataset minimum-value filter thresholds.
///
/// User-editable, independent of which years/locations are active. A
/// dataset with no explicit entry filters at 0 (everything passes the
/// `value >= 0` check for the non-negative DN property).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdMap {
    values: BTreeMap<String, f64>,
}

impl ThresholdMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, dataset: &str) -> f64 {
        self.values.get(dataset).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, dataset: impl Into<String>, min_value: f64) {
        self.values.insert(dataset.into(), min_value);
    }

    pub fn merge(&mut self, other: &BTreeMap<String, f64>) {
        for (dataset, value) in other {
            self.values.insert(dataset.clone(), *value);
        }
    }
}
