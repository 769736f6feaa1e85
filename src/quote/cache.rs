// =============================================================================
// Quote Cache — last good upstream payload, swapped atomically
// =============================================================================
//
// Readers get an `Arc<QuoteSnapshot>`; a refresh builds a brand-new immutable
// snapshot and swaps the pointer under a short write lock. A reader therefore
// sees either the old snapshot or the new one, never a payload from one fetch
// paired with the timestamp of another.
//
// Only successful fetches reach `set`; a failed refresh leaves the previous
// snapshot in place.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

/// The most recent successfully fetched quote payload.
#[derive(Debug, Clone, Default)]
pub struct QuoteSnapshot {
    /// Raw upstream body, `None` until the first successful fetch.
    pub payload: Option<serde_json::Value>,
    /// When `payload` was stored.
    pub fetched_at: Option<DateTime<Utc>>,
}

impl QuoteSnapshot {
    pub fn is_empty(&self) -> bool {
        self.payload.is_none()
    }

    /// `fetched_at` as an RFC 3339 string, for API responses.
    pub fn last_update(&self) -> Option<String> {
        self.fetched_at.map(|t| t.to_rfc3339())
    }
}

/// Thread-safe holder of the current [`QuoteSnapshot`].
#[derive(Debug, Default)]
pub struct QuoteCache {
    current: RwLock<Arc<QuoteSnapshot>>,
}

impl QuoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot (possibly empty, possibly stale). Never blocks on a
    /// fetch in progress.
    pub fn get(&self) -> Arc<QuoteSnapshot> {
        self.current.read().clone()
    }

    /// Replace the snapshot with `payload`, stamped with the current time.
    pub fn set(&self, payload: serde_json::Value) -> Arc<QuoteSnapshot> {
        self.set_at(payload, Utc::now())
    }

    pub fn set_at(&self, payload: serde_json::Value, at: DateTime<Utc>) -> Arc<QuoteSnapshot> {
        let snapshot = Arc::new(QuoteSnapshot {
            payload: Some(payload),
            fetched_at: Some(at),
        });
        *self.current.write() = snapshot.clone();
        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_cache_is_empty() {
        let cache = QuoteCache::new();
        assert!(cache.is_empty());
        let snap = cache.get();
        assert!(snap.payload.is_none());
        assert!(snap.last_update().is_none());
    }

    #[test]
    fn set_replaces_payload_and_stamps_time() {
        let cache = QuoteCache::new();
        let before = Utc::now();
        cache.set(json!({"priceInfos": []}));
        let snap = cache.get();
        assert!(!cache.is_empty());
        assert_eq!(snap.payload, Some(json!({"priceInfos": []})));
        assert!(snap.fetched_at.unwrap() >= before);
    }

    #[test]
    fn old_readers_keep_their_snapshot_after_swap() {
        let cache = QuoteCache::new();
        cache.set(json!({"v": 1}));
        let held = cache.get();
        cache.set(json!({"v": 2}));
        assert_eq!(held.payload, Some(json!({"v": 1})));
        assert_eq!(cache.get().payload, Some(json!({"v": 2})));
    }

    #[test]
    fn concurrent_readers_never_see_mixed_snapshots() {
        let cache = Arc::new(QuoteCache::new());
        let base = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        let writer = {
            let cache = cache.clone();
            std::thread::spawn(move || {
                for seq in 0..2_000i64 {
                    cache.set_at(json!({ "seq": seq }), base + chrono::Duration::seconds(seq));
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for _ in 0..2_000 {
                        let snap = cache.get();
                        if let (Some(payload), Some(at)) = (&snap.payload, snap.fetched_at) {
                            let seq = payload["seq"].as_i64().unwrap();
                            assert_eq!(at.timestamp() - base.timestamp(), seq);
                        } else {
                            assert!(snap.payload.is_none() && snap.fetched_at.is_none());
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(cache.get().payload, Some(json!({ "seq": 1_999 })));
    }
}
