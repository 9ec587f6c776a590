use std::collections::BTreeMap;

use foundation::Year;
use serde::{Deserialize, Serialize};

/// Selected locations. Country-level and sub-national region-level
/// granularities are mutually exclusive, which the type enforces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationSet {
    Countries(Vec<String>),
    Regions(Vec<String>),
}

impl LocationSet {
    pub fn names(&self) -> &[String] {
        match self {
            LocationSet::Countries(names) | LocationSet::Regions(names) => names,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }

    /// The backend query parameter carrying these names.
    pub fn query_param(&self) -> &'static str {
        match self {
            LocationSet::Countries(_) => "countries",
            LocationSet::Regions(_) => "regions",
        }
    }
}

/// One user-driven filter selection: which overlays should exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub datasets: Vec<String>,
    pub locations: LocationSet,
    pub years: Vec<Year>,
    /// Per-dataset minimum-value thresholds carried with the selection.
    #[serde(default)]
    pub thresholds: BTreeMap<String, f64>,
}

impl Selection {
    pub fn new(datasets: Vec<String>, locations: LocationSet, years: Vec<Year>) -> Self {
        Self {
            datasets,
            locations,
            years,
            thresholds: BTreeMap::new(),
        }
    }

    pub fn with_threshold(mut self, dataset: impl Into<String>, min_value: f64) -> Self {
        self.thresholds.insert(dataset.into(), min_value);
        self
    }
}
