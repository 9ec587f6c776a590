use std::collections::BTreeMap;

use foundation::{LayerKey, Year, YearSequence};
use serde::{Deserialize, Serialize};

/// Outcome of resolving one (year, dataset, location) combination.
///
/// The backend encodes failures inline: a missing combination is JSON
/// `null`, and an unsupported one is an `"Error: …"` string. Both become
/// `Resolved::Error` so the reconciler can skip them uniformly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Resolved {
    Url(String),
    Error(String),
}

const ERROR_MARKER: &str = "Error: ";

impl From<Option<String>> for Resolved {
    fn from(value: Option<String>) -> Self {
        match value {
            None => Resolved::Error("no file for combination".to_string()),
            Some(s) => match s.strip_prefix(ERROR_MARKER) {
                Some(detail) => Resolved::Error(detail.to_string()),
                None => Resolved::Url(s),
            },
        }
    }
}

impl From<Resolved> for Option<String> {
    fn from(value: Resolved) -> Self {
        match value {
            Resolved::Url(url) => Some(url),
            Resolved::Error(detail) => Some(format!("{ERROR_MARKER}{detail}")),
        }
    }
}

impl Resolved {
    pub fn url(&self) -> Option<&str> {
        match self {
            Resolved::Url(url) => Some(url),
            Resolved::Error(_) => None,
        }
    }
}

/// One resolved selection: `year → dataset → location → url-or-error`.
///
/// Transient; consumed by a single load cycle and not retained. The outer
/// `BTreeMap` keeps years in ascending order, matching the backend's
/// sorted response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedSelection {
    pub by_year: BTreeMap<Year, BTreeMap<String, BTreeMap<String, Resolved>>>,
}

impl ResolvedSelection {
    /// Every layer key with a usable URL, paired with that URL.
    /// Error-marker combinations are excluded here and nowhere else.
    pub fn target_keys(&self) -> Vec<(LayerKey, String)> {
        let mut out = Vec::new();
        for (year, datasets) in &self.by_year {
            for (dataset, locations) in datasets {
                for (location, resolved) in locations {
                    if let Some(url) = resolved.url() {
                        out.push((LayerKey::new(dataset, location, *year), url.to_string()));
                    }
                }
            }
        }
        out
    }

    /// The ascending deduplicated year sequence for this resolution.
    pub fn year_sequence(&self) -> YearSequence {
        YearSequence::new(self.by_year.keys().copied().collect())
    }

    pub fn insert(
        &mut self,
        year: Year,
        dataset: impl Into<String>,
        location: impl Into<String>,
        resolved: Resolved,
    ) {
        self.by_year
            .entry(year)
            .or_default()
            .entry(dataset.into())
            .or_default()
            .insert(location.into(), resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::{Resolved, ResolvedSelection};
    use foundation::LayerKey;
    use pretty_assertions::assert_eq;

    const LOOKUP_RESPONSE: &str = r#"{
        "2015": {
            "PopDensity": {
                "Mali": "/static/Africa/PopDensity/Mali/mli_pd_2015_1km_UNadj.geojson",
                "Sudan": "Error: Country not supported for PopDensity"
            }
        },
        "2018": {
            "PopDensity": {
                "Mali": "/static/Africa/PopDensity/Mali/mli_pd_2018_1km_UNadj.geojson",
                "Sudan": null
            }
        }
    }"#;

    #[test]
    fn deserializes_urls_nulls_and_error_markers() {
        let resolved: ResolvedSelection =
            serde_json::from_str(LOOKUP_RESPONSE).expect("deserialize");

        let mali_2015 = &resolved.by_year[&2015]["PopDensity"]["Mali"];
        assert!(matches!(mali_2015, Resolved::Url(_)));

        let sudan_2015 = &resolved.by_year[&2015]["PopDensity"]["Sudan"];
        assert_eq!(
            sudan_2015,
            &Resolved::Error("Country not supported for PopDensity".to_string())
        );

        let sudan_2018 = &resolved.by_year[&2018]["PopDensity"]["Sudan"];
        assert!(matches!(sudan_2018, Resolved::Error(_)));
    }

    #[test]
    fn target_keys_skip_error_markers() {
        let resolved: ResolvedSelection =
            serde_json::from_str(LOOKUP_RESPONSE).expect("deserialize");
        let keys: Vec<LayerKey> = resolved.target_keys().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            vec![
                LayerKey::new("PopDensity", "Mali", 2015),
                LayerKey::new("PopDensity", "Mali", 2018),
            ]
        );
    }

    #[test]
    fn year_sequence_is_ascending() {
        let mut resolved = ResolvedSelection::default();
        resolved.insert(2020, "PopDensity", "Mali", Resolved::Url("/a".into()));
        resolved.insert(2015, "PopDensity", "Mali", Resolved::Url("/b".into()));
        let seq = resolved.year_sequence();
        assert_eq!(seq.years(), &[2015, 2020]);
    }
}
