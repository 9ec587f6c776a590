//! Deduplicated, memoized geometry retrieval keyed by source URL.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use catalog::BoxFuture;
use formats::FeatureCollection;
use futures_util::FutureExt;
use futures_util::future::Shared;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::source::{FetchError, GeometrySource};

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<FeatureCollection>, FetchError>>>;

struct Slot {
    generation: u64,
    fetch: SharedFetch,
}

/// Session-lifetime geometry cache.
///
/// The first `get` for a URL installs a shared fetch future; every
/// concurrent and subsequent `get` for that URL awaits the same future, so
/// at most one fetch is ever in flight per URL. Successes are cached for
/// the whole session (growth is unbounded on purpose, see the data model
/// notes); failures clear the slot so a later call can retry.
///
/// Slot removal on failure is generation-guarded: an old waiter observing
/// an error can never evict a newer retry that replaced the slot in the
/// meantime.
pub struct GeometryCache {
    source: Arc<dyn GeometrySource>,
    slots: Mutex<HashMap<String, Slot>>,
    generations: AtomicU64,
}

impl GeometryCache {
    pub fn new(source: Arc<dyn GeometrySource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
            generations: AtomicU64::new(0),
        }
    }

    /// Number of cached or in-flight URLs.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Fetches the geometry for `url`, memoizing the result.
    pub async fn get(&self, url: &str) -> Result<Arc<FeatureCollection>, FetchError> {
        let (generation, fetch) = {
            let mut slots = self.slots.lock();
            match slots.get(url) {
                Some(slot) => (slot.generation, slot.fetch.clone()),
                None => {
                    let generation = self.generations.fetch_add(1, Ordering::Relaxed);
                    let fetch = self.begin_fetch(url);
                    debug!(url, "geometry fetch started");
                    slots.insert(
                        url.to_string(),
                        Slot {
                            generation,
                            fetch: fetch.clone(),
                        },
                    );
                    (generation, fetch)
                }
            }
        };

        let result = fetch.await;

        if let Err(error) = &result {
            warn!(url, %error, "geometry fetch failed, clearing cache slot");
            let mut slots = self.slots.lock();
            if let Some(slot) = slots.get(url)
                && slot.generation == generation
            {
                slots.remove(url);
            }
        }

        result
    }

    fn begin_fetch(&self, url: &str) -> SharedFetch {
        let source = Arc::clone(&self.source);
        let url = url.to_string();
        let fut: BoxFuture<'static, Result<Arc<FeatureCollection>, FetchError>> =
            Box::pin(async move { source.fetch(&url).await.map(Arc::new) });
        fut.shared()
    }
}
