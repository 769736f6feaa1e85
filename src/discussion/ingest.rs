// =============================================================================
// Discussion Ingestor — bounded, cursor-paginated crawl of the board
// =============================================================================
//
// Per page:
//   1. Parse the posts.
//   2. Keep posts whose timestamp is >= cutoff (or missing / unreadable).
//   3. Track the oldest timestamp on the page. Pages trend older, so once a
//      page reaches past the cutoff there is nothing newer left to find.
//   4. Continue from the last post's `orderNo`.
//
// Stops on: page older than cutoff, no posts, no cursor, upstream failure,
// or `max_pages` requests, whichever comes first. `max_pages` bounds the
// crawl even when the upstream keeps handing out fresh cursors.
//
// An upstream failure on any page, the first included, ends the crawl and
// keeps what was gathered; it is reported through `StopReason`.
// =============================================================================

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::discussion::post::{parse_posts, DiscussionPost};
use crate::error::FetchError;
use crate::upstream::{JsonSource, Query};

/// Static parameters of the board listing endpoint.
#[derive(Debug, Clone)]
pub struct DiscussionEndpoint {
    pub url: String,
    pub discussion_type: String,
    pub page_size: u32,
}

/// Why pagination ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// A page contained a post older than the cutoff.
    ReachedCutoff,
    /// The upstream returned a page with no posts.
    NoPosts,
    /// The last post carried no continuation cursor.
    NoCursor,
    /// The page ceiling was hit.
    MaxPages,
    /// A page request failed; earlier pages are kept.
    UpstreamFailed(FetchError),
}

/// Result of one crawl.
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub posts: Vec<DiscussionPost>,
    pub pages_fetched: u32,
    pub stop_reason: StopReason,
}

impl IngestOutcome {
    /// `title + content` for every collected post.
    pub fn texts(&self) -> Vec<String> {
        self.posts.iter().map(DiscussionPost::text).collect()
    }
}

/// Crawls the discussion board of one item.
pub struct DiscussionIngestor {
    source: Arc<dyn JsonSource>,
    endpoint: DiscussionEndpoint,
}

/// Start of the recency window: `now - window_days`.
pub fn cutoff_from(now: DateTime<Utc>, window_days: i64) -> DateTime<Utc> {
    now - Duration::days(window_days)
}

impl DiscussionIngestor {
    pub fn new(source: Arc<dyn JsonSource>, endpoint: DiscussionEndpoint) -> Self {
        Self { source, endpoint }
    }

    /// Query for one listing page; `offset` is omitted on the first page.
    pub fn page_query(&self, item_code: &str, offset: Option<&str>) -> Query {
        let mut query: Query = vec![
            ("discussionType", self.endpoint.discussion_type.clone()),
            ("itemCode", item_code.to_string()),
            ("pageSize", self.endpoint.page_size.to_string()),
            ("isHolderOnly", "false".to_string()),
            ("excludesItemNews", "false".to_string()),
            ("isItemNewsOnly", "false".to_string()),
        ];
        if let Some(cursor) = offset {
            query.push(("offset", cursor.to_string()));
        }
        query
    }

    /// Collect posts written at or after `cutoff`, fetching at most
    /// `max_pages` pages.
    pub async fn collect_recent_posts(
        &self,
        item_code: &str,
        cutoff: DateTime<Utc>,
        max_pages: u32,
    ) -> IngestOutcome {
        let mut posts = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages_fetched = 0u32;
        let mut stop_reason = StopReason::MaxPages;

        while pages_fetched < max_pages {
            let query = self.page_query(item_code, cursor.as_deref());
            let page = match self.source.get_json(&self.endpoint.url, &query).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        item_code,
                        page = pages_fetched + 1,
                        kind = e.kind(),
                        error = %e,
                        "discussion page failed; keeping posts collected so far"
                    );
                    stop_reason = StopReason::UpstreamFailed(e);
                    break;
                }
            };
            pages_fetched += 1;

            let page_posts = parse_posts(&page);
            if page_posts.is_empty() {
                stop_reason = StopReason::NoPosts;
                break;
            }

            let oldest = page_posts.iter().filter_map(|p| p.written_at).min();
            let next_cursor = page_posts.last().and_then(|p| p.order_no.clone());
            let before = posts.len();
            posts.extend(page_posts.into_iter().filter(|p| p.is_within(cutoff)));

            debug!(
                page = pages_fetched,
                kept = posts.len() - before,
                oldest = ?oldest,
                "discussion page processed"
            );

            if oldest.is_some_and(|t| t < cutoff) {
                stop_reason = StopReason::ReachedCutoff;
                break;
            }
            match next_cursor {
                Some(c) => cursor = Some(c),
                None => {
                    stop_reason = StopReason::NoCursor;
                    break;
                }
            }
        }

        info!(
            item_code,
            posts = posts.len(),
            pages = pages_fetched,
            stop_reason = ?stop_reason,
            "discussion crawl finished"
        );

        IngestOutcome {
            posts,
            pages_fetched,
            stop_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::testing::ScriptedSource;
    use chrono::TimeZone;
    use serde_json::{json, Value};

    fn endpoint() -> DiscussionEndpoint {
        DiscussionEndpoint {
            url: "https://example.test/discussion".into(),
            discussion_type: "domesticStock".into(),
            page_size: 20,
        }
    }

    fn cutoff() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()
    }

    fn post(title: &str, at: DateTime<Utc>, order_no: i64) -> Value {
        json!({
            "title": title,
            "contentSwReplaced": "본문",
            "writtenAt": at.to_rfc3339(),
            "orderNo": order_no,
        })
    }

    fn page(posts: Vec<Value>) -> Value {
        json!({ "result": { "posts": posts } })
    }

    fn ingestor(source: Arc<ScriptedSource>) -> DiscussionIngestor {
        DiscussionIngestor::new(source, endpoint())
    }

    #[tokio::test]
    async fn stops_after_page_that_crosses_cutoff() {
        let day = chrono::Duration::days(1);
        let c = cutoff();
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(page(vec![post("p1a", c + day * 10, 30), post("p1b", c + day * 9, 29)])),
            Ok(page(vec![post("p2a", c + day * 5, 20), post("p2b", c + day * 4, 19)])),
            Ok(page(vec![post("p3a", c + day, 10), post("p3b", c - day, 9)])),
            Ok(page(vec![post("p4a", c - day * 2, 5)])),
        ]));
        let ing = ingestor(source.clone());

        let out = ing.collect_recent_posts("001530", c, 20).await;

        let titles: Vec<_> = out.posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["p1a", "p1b", "p2a", "p2b", "p3a"]);
        assert_eq!(out.pages_fetched, 3);
        assert_eq!(out.stop_reason, StopReason::ReachedCutoff);
        assert_eq!(source.call_count(), 3);
    }

    #[tokio::test]
    async fn cursor_of_last_post_drives_next_page() {
        let c = cutoff();
        let later = c + chrono::Duration::days(3);
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(page(vec![post("a", later, 111), post("b", later, 110)])),
            Ok(page(vec![])),
        ]));
        let ing = ingestor(source.clone());

        let out = ing.collect_recent_posts("001530", c, 20).await;
        assert_eq!(out.stop_reason, StopReason::NoPosts);

        let calls = source.calls();
        assert_eq!(calls[0].param("offset"), None);
        assert_eq!(calls[0].param("itemCode"), Some("001530"));
        assert_eq!(calls[0].param("pageSize"), Some("20"));
        assert_eq!(calls[0].param("discussionType"), Some("domesticStock"));
        assert_eq!(calls[0].param("isHolderOnly"), Some("false"));
        assert_eq!(calls[1].param("offset"), Some("110"));
    }

    #[tokio::test]
    async fn adversarial_cursors_are_bounded_by_max_pages() {
        let recent = cutoff() + chrono::Duration::days(1);
        let source = Arc::new(ScriptedSource::from_fn(move |i| {
            Ok(page(vec![post("spam", recent, 1_000_000 - i as i64)]))
        }));
        let ing = ingestor(source.clone());

        let out = ing.collect_recent_posts("001530", cutoff(), 20).await;
        assert_eq!(source.call_count(), 20);
        assert_eq!(out.pages_fetched, 20);
        assert_eq!(out.stop_reason, StopReason::MaxPages);
        assert_eq!(out.posts.len(), 20);
    }

    #[tokio::test]
    async fn post_exactly_at_cutoff_is_included() {
        let c = cutoff();
        let source = Arc::new(ScriptedSource::new(vec![Ok(page(vec![
            json!({ "title": "edge", "writtenAt": c.to_rfc3339() }),
        ]))]));

        let out = ingestor(source).collect_recent_posts("001530", c, 20).await;
        assert_eq!(out.posts.len(), 1);
        assert_eq!(out.stop_reason, StopReason::NoCursor);
    }

    #[tokio::test]
    async fn undated_posts_are_kept() {
        let c = cutoff();
        let source = Arc::new(ScriptedSource::new(vec![Ok(page(vec![
            json!({ "title": "no date", "orderNo": 5 }),
            json!({ "title": "garbled", "writtenAt": "???", "orderNo": 4 }),
        ]))]));

        let out = ingestor(source).collect_recent_posts("001530", c, 1).await;
        assert_eq!(out.posts.len(), 2);
        assert_eq!(out.stop_reason, StopReason::MaxPages);
    }

    #[tokio::test]
    async fn mid_crawl_failure_keeps_collected_posts() {
        let later = cutoff() + chrono::Duration::days(2);
        let source = Arc::new(ScriptedSource::new(vec![
            Ok(page(vec![post("kept", later, 7)])),
            Err(FetchError::bad_status(502, "gateway")),
        ]));

        let out = ingestor(source).collect_recent_posts("001530", cutoff(), 20).await;
        assert_eq!(out.texts(), vec!["kept 본문".to_string()]);
        assert!(matches!(out.stop_reason, StopReason::UpstreamFailed(FetchError::BadStatus { status: 502, .. })));
    }

    #[tokio::test]
    async fn first_page_failure_stops_with_nothing_collected() {
        let source = Arc::new(ScriptedSource::new(vec![Err(FetchError::network("refused"))]));
        let out = ingestor(source.clone())
            .collect_recent_posts("001530", cutoff(), 20)
            .await;
        assert!(out.posts.is_empty());
        assert_eq!(out.pages_fetched, 0);
        assert!(matches!(out.stop_reason, StopReason::UpstreamFailed(FetchError::Network { .. })));
        assert_eq!(source.call_count(), 1);
    }

    #[test]
    fn cutoff_is_thirty_days_back() {
        let now = Utc.with_ymd_and_hms(2024, 5, 31, 0, 0, 0).unwrap();
        assert_eq!(cutoff_from(now, 30), cutoff());
    }
}
