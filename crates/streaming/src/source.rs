//! Geometry retrieval boundary.
//!
//! A `GeometrySource` turns a backend-relative URL into a parsed
//! feature collection. The HTTP implementation talks to the backend's
//! static file mount; the in-memory implementation backs tests and
//! offline runs.

use std::collections::HashMap;

use catalog::BoxFuture;
use formats::{FeatureCollection, parse_feature_collection};
use parking_lot::Mutex;

/// Error type for geometry fetches.
///
/// `Clone` because results flow through shared futures: every waiter on a
/// deduplicated fetch receives its own copy of the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    Transport(String),
    Status(u16),
    Decode(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "geometry fetch failed: {msg}"),
            FetchError::Status(code) => write!(f, "geometry fetch returned HTTP {code}"),
            FetchError::Decode(msg) => write!(f, "geometry payload invalid: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Trait for geometry providers.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility.
pub trait GeometrySource: Send + Sync {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<FeatureCollection, FetchError>>;
}

/// HTTP-backed geometry source.
///
/// Backend URLs are server-relative paths (`/static/...`); absolute URLs
/// are passed through unchanged.
pub struct HttpGeometrySource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGeometrySource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn absolute_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("{}{}", self.base_url.trim_end_matches('/'), url)
        }
    }
}

impl GeometrySource for HttpGeometrySource {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<FeatureCollection, FetchError>> {
        let url = self.absolute_url(url);
        Box::pin(async move {
            let resp = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(FetchError::Status(resp.status().as_u16()));
            }

            let bytes = resp
                .bytes()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?;

            parse_feature_collection(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
        })
    }
}

/// In-memory geometry source for testing or offline use.
///
/// Tracks per-URL fetch counts so tests can assert deduplication, and can
/// be told to fail specific URLs.
#[derive(Default)]
pub struct MemoryGeometrySource {
    inner: Mutex<MemorySourceState>,
}

#[derive(Default)]
struct MemorySourceState {
    payloads: HashMap<String, FeatureCollection>,
    failures: HashMap<String, FetchError>,
    fetch_counts: HashMap<String, usize>,
}

impl MemoryGeometrySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, payload: FeatureCollection) {
        self.inner.lock().payloads.insert(url.into(), payload);
    }

    /// Makes `url` fail with `error` until `insert` replaces it.
    pub fn fail(&self, url: impl Into<String>, error: FetchError) {
        let url = url.into();
        let mut inner = self.inner.lock();
        inner.payloads.remove(&url);
        inner.failures.insert(url, error);
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.inner.lock().fetch_counts.get(url).copied().unwrap_or(0)
    }
}

impl GeometrySource for MemoryGeometrySource {
    fn fetch(&self, url: &str) -> BoxFuture<'_, Result<FeatureCollection, FetchError>> {
        let url = url.to_string();
        Box::pin(async move {
            let mut inner = self.inner.lock();
            *inner.fetch_counts.entry(url.clone()).or_insert(0) += 1;
            if let Some(error) = inner.failures.get(&url) {
                return Err(error.clone());
            }
            inner
                .payloads
                .get(&url)
                .cloned()
                .ok_or(FetchError::Status(404))
        })
    }
}

#[cfg(test)]
mod tests {
    use formats::parse_feature_collection;
    use pretty_assertions::assert_eq;

    use super::{FetchError, GeometrySource, HttpGeometrySource, MemoryGeometrySource};

    fn sample() -> formats::FeatureCollection {
        parse_feature_collection(
            br#"{"type":"FeatureCollection","features":[
                {"type":"Feature","properties":{"DN":3},"geometry":{"type":"Point","coordinates":[0,0]}}
            ]}"#,
        )
        .expect("fixture")
    }

    #[test]
    fn absolute_urls_pass_through_relative_are_joined() {
        let src = HttpGeometrySource::new("http://localhost:8000/");
        assert_eq!(
            src.absolute_url("/static/a.geojson"),
            "http://localhost:8000/static/a.geojson"
        );
        assert_eq!(
            src.absolute_url("https://cdn.example/a.geojson"),
            "https://cdn.example/a.geojson"
        );
    }

    #[tokio::test]
    async fn memory_source_serves_counts_and_fails() {
        let src = MemoryGeometrySource::new();
        src.insert("/a", sample());
        src.fail("/b", FetchError::Status(500));

        assert!(src.fetch("/a").await.is_ok());
        assert!(src.fetch("/a").await.is_ok());
        assert_eq!(src.fetch_count("/a"), 2);

        assert_eq!(src.fetch("/b").await, Err(FetchError::Status(500)));
        assert_eq!(src.fetch("/missing").await, Err(FetchError::Status(404)));
    }
}
