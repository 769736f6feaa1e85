// =============================================================================
// Quote Service — Fetch → Cache, scheduled or on demand
// =============================================================================
//
// Shared by the scheduler (fixed daily refreshes), the manual-update endpoint,
// and the stock-data endpoint (lazy first fetch when the cache is empty).
//
// State machine: Idle → Fetching → Idle. Concurrent refreshes are allowed;
// each one that succeeds swaps in its own complete snapshot.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::FetchError;
use crate::quote::cache::{QuoteCache, QuoteSnapshot};
use crate::quote::normalize::{normalize_with_shape, PayloadShape};
use crate::upstream::{JsonSource, Query};

/// Daily-candle query sent with every quote request.
pub const PERIOD_TYPE: &str = "dayCandle";

/// Owns the quote cache and knows how to refresh it.
pub struct QuoteService {
    source: Arc<dyn JsonSource>,
    cache: QuoteCache,
    quote_url: String,
    in_flight: AtomicUsize,
}

/// Build the chart URL for `item_code`: `<base>/<item_code>`.
pub fn quote_url(base: &str, item_code: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), item_code)
}

/// Query parameters for the daily-candle chart endpoint.
pub fn quote_query() -> Query {
    vec![("periodType", PERIOD_TYPE.to_string())]
}

impl QuoteService {
    pub fn new(source: Arc<dyn JsonSource>, quote_url: impl Into<String>) -> Self {
        Self {
            source,
            cache: QuoteCache::new(),
            quote_url: quote_url.into(),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    /// `true` while at least one refresh is in flight.
    pub fn is_fetching(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// Fetch the quote payload without touching the cache.
    pub async fn fetch(&self) -> Result<serde_json::Value, FetchError> {
        self.source.get_json(&self.quote_url, &quote_query()).await
    }

    /// Fetch and, on success, replace the cached snapshot.
    ///
    /// On failure the previous snapshot is kept and the error is returned.
    pub async fn refresh(&self) -> Result<Arc<QuoteSnapshot>, FetchError> {
        let result = {
            let _guard = InFlight::enter(&self.in_flight);
            self.fetch().await
        };

        match result {
            Ok(payload) => {
                let (normalized, shape) = normalize_with_shape(&payload);
                if shape == PayloadShape::Unrecognized {
                    warn!(url = %self.quote_url, "quote payload has an unrecognised shape; caching it anyway");
                }
                let snapshot = self.cache.set(payload);
                info!(
                    candles = normalized.price_infos.len(),
                    shape = ?shape,
                    last_update = ?snapshot.last_update(),
                    "quote data refreshed"
                );
                Ok(snapshot)
            }
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "quote refresh failed; keeping previous snapshot");
                Err(e)
            }
        }
    }

    /// Current snapshot, fetching first if nothing has been cached yet.
    ///
    /// The returned error (if any) describes the lazy fetch that failed; the
    /// snapshot is still returned so callers can answer with an empty payload.
    pub async fn snapshot_or_fetch(&self) -> (Arc<QuoteSnapshot>, Option<FetchError>) {
        if !self.cache.is_empty() {
            return (self.cache.get(), None);
        }
        match self.refresh().await {
            Ok(snapshot) => (snapshot, None),
            Err(e) => (self.cache.get(), Some(e)),
        }
    }
}

/// Counts one in-flight refresh; released on drop, so a cancelled refresh
/// future still decrements.
struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
