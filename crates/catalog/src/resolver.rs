use std::future::Future;
use std::pin::Pin;

use crate::resolved::ResolvedSelection;
use crate::selection::Selection;

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Error type for selection resolution.
#[derive(Debug)]
pub struct ResolveError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ResolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl ResolveError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Resolves a selection to the per-combination source URLs.
///
/// This is the boundary to the backend lookup endpoint. Implementations
/// must be `Send + Sync` for use across async tasks; methods return boxed
/// futures for dyn-compatibility.
pub trait SelectionResolver: Send + Sync {
    fn resolve(&self, selection: &Selection)
    -> BoxFuture<'_, Result<ResolvedSelection, ResolveError>>;
}

/// Fixed-table resolver for tests and offline runs.
pub struct StaticResolver {
    resolved: ResolvedSelection,
}

impl StaticResolver {
    pub fn new(resolved: ResolvedSelection) -> Self {
        Self { resolved }
    }
}

impl SelectionResolver for StaticResolver {
    fn resolve(
        &self,
        _selection: &Selection,
    ) -> BoxFuture<'_, Result<ResolvedSelection, ResolveError>> {
        let resolved = self.resolved.clone();
        Box::pin(async move { Ok(resolved) })
    }
}
