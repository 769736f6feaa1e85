// =============================================================================
// Upstream Access — the one seam between the service and the stock API
// =============================================================================
//
// Both the quote refresh and the discussion crawler only ever need "GET this
// URL with these query parameters and give me JSON back". `JsonSource` is that
// contract; `HttpFetcher` is the production implementation, and tests swap in
// a scripted source so nothing touches the network.
// =============================================================================

pub mod fetcher;

pub use fetcher::{FetcherConfig, HttpFetcher};

use async_trait::async_trait;

use crate::error::FetchError;

/// Query parameters for a single upstream GET, in the order they are sent.
pub type Query = Vec<(&'static str, String)>;

/// A source of JSON documents addressed by URL + query string.
///
/// Implementations perform exactly one request per call and never retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait JsonSource: Send + Sync {
    async fn get_json(&self, url: &str, query: &Query) -> Result<serde_json::Value, FetchError>;
}

// =============================================================================
// Test support
// =============================================================================

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;

    use parking_lot::Mutex;

    use super::*;

    /// A recorded call made against a [`ScriptedSource`].
    #[derive(Debug, Clone)]
    pub struct RecordedCall {
        pub url: String,
        pub query: Vec<(String, String)>,
    }

    impl RecordedCall {
        pub fn param(&self, key: &str) -> Option<&str> {
            self.query
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        }
    }

    /// In-memory [`JsonSource`] that replays queued responses in order and
    /// records every call. Once the queue is drained it falls back to
    /// `fallback` (or a network error when none is set).
    #[derive(Default)]
    pub struct ScriptedSource {
        responses: Mutex<VecDeque<Result<serde_json::Value, FetchError>>>,
        fallback: Option<Box<dyn Fn(usize) -> Result<serde_json::Value, FetchError> + Send + Sync>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl ScriptedSource {
        pub fn new(responses: Vec<Result<serde_json::Value, FetchError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Self::default()
            }
        }

        /// Source that answers every call with `f(call_index)`.
        pub fn from_fn(
            f: impl Fn(usize) -> Result<serde_json::Value, FetchError> + Send + Sync + 'static,
        ) -> Self {
            Self {
                fallback: Some(Box::new(f)),
                ..Self::default()
            }
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl JsonSource for ScriptedSource {
        async fn get_json(
            &self,
            url: &str,
            query: &Query,
        ) -> Result<serde_json::Value, FetchError> {
            let index = {
                let mut calls = self.calls.lock();
                calls.push(RecordedCall {
                    url: url.to_string(),
                    query: query
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.clone()))
                        .collect(),
                });
                calls.len() - 1
            };

            if let Some(next) = self.responses.lock().pop_front() {
                return next;
            }
            match &self.fallback {
                Some(f) => f(index),
                None => Err(FetchError::network("scripted source exhausted")),
            }
        }
    }
}
