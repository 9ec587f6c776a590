//! HTTP client for the backend lookup endpoint.

use catalog::{BoxFuture, ResolveError, ResolvedSelection, Selection, SelectionResolver};
use tracing::debug;

/// Resolves selections against the backend `/lookup` endpoint.
///
/// Query shape matches the backend contract: repeated `datasets`, repeated
/// `countries` (or `regions`, depending on the selection granularity), and
/// repeated `years` parameters; the response is the nested
/// `{year: {dataset: {location: url-or-error}}}` document.
pub struct HttpResolver {
    base_url: String,
    client: reqwest::Client,
}

impl HttpResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn query_pairs(selection: &Selection) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        for dataset in &selection.datasets {
            pairs.push(("datasets", dataset.clone()));
        }
        let location_param = selection.locations.query_param();
        for location in selection.locations.names() {
            pairs.push((location_param, location.clone()));
        }
        for year in &selection.years {
            pairs.push(("years", year.to_string()));
        }
        pairs
    }

    fn lookup_request(&self, selection: &Selection) -> Result<reqwest::Request, ResolveError> {
        let url = format!("{}/lookup", self.base_url.trim_end_matches('/'));
        self.client
            .get(&url)
            .query(&Self::query_pairs(selection))
            .build()
            .map_err(|e| ResolveError::with_source("failed to build lookup request", e))
    }
}

impl SelectionResolver for HttpResolver {
    fn resolve(
        &self,
        selection: &Selection,
    ) -> BoxFuture<'_, Result<ResolvedSelection, ResolveError>> {
        let request = self.lookup_request(selection);
        Box::pin(async move {
            let request = request?;
            debug!(url = %request.url(), "resolving selection");

            let resp = self
                .client
                .execute(request)
                .await
                .map_err(|e| ResolveError::with_source("lookup request failed", e))?;

            if !resp.status().is_success() {
                return Err(ResolveError::new(format!(
                    "lookup returned HTTP {}",
                    resp.status()
                )));
            }

            resp.json::<ResolvedSelection>()
                .await
                .map_err(|e| ResolveError::with_source("lookup response invalid", e))
        })
    }
}
