//! GeoJSON feature-collection payloads as fetched from the backend.
//!
//! The layer manager never interprets coordinates; geometry stays an opaque
//! JSON value that is handed through to the rendering surface unchanged.
//! The only property the manager reads is the per-feature numeric `DN`,
//! used for both color-domain computation and threshold filtering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One member of a feature collection. `geometry` is passed through
/// verbatim; `properties` is kept as a flat JSON map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    pub geometry: serde_json::Value,
}

impl Feature {
    /// The numeric `DN` property, if present and numeric.
    pub fn dn(&self) -> Option<f64> {
        self.properties.get("DN").and_then(|v| v.as_f64())
    }
}

/// A parsed geometry payload: one GeoJSON `FeatureCollection` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// All numeric `DN` values across the collection, in feature order.
    /// Features without a numeric `DN` are skipped.
    pub fn dn_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.features.iter().filter_map(Feature::dn)
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoJsonError {
    Parse(String),
    NotAFeatureCollection(String),
}

impl std::fmt::Display for GeoJsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoJsonError::Parse(msg) => write!(f, "geojson parse error: {msg}"),
            GeoJsonError::NotAFeatureCollection(kind) => {
                write!(f, "expected FeatureCollection, got {kind:?}")
            }
        }
    }
}

impl std::error::Error for GeoJsonError {}

/// Parses a geometry payload from raw bytes.
pub fn parse_feature_collection(bytes: &[u8]) -> Result<FeatureCollection, GeoJsonError> {
    let doc: FeatureCollection =
        serde_json::from_slice(bytes).map_err(|e| GeoJsonError::Parse(e.to_string()))?;
    if doc.kind != "FeatureCollection" {
        return Err(GeoJsonError::NotAFeatureCollection(doc.kind));
    }
    Ok(doc)
}
