// =============================================================================
// Discussion Posts — parsing one page of the board listing
// =============================================================================
//
// Expected page shape:
//
//   { "result": { "posts": [ { "title", "contentSwReplaced",
//                              "writtenAt", "orderNo" }, ... ] } }
//
// Parsing is lenient: missing text fields become empty strings, and a
// timestamp that cannot be read is kept as `None` (the ingestor treats that
// as "recent enough" rather than silently dropping the post).
// =============================================================================

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde_json::Value;

/// Naive timestamp layouts seen on the board, interpreted in local time.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y.%m.%d %H:%M:%S",
    "%Y.%m.%d %H:%M",
];

/// One discussion-board post. Lives only for the duration of a request.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscussionPost {
    pub title: String,
    pub content: String,
    pub written_at: Option<DateTime<Utc>>,
    /// Opaque pagination cursor; the next page starts after this post.
    pub order_no: Option<String>,
}

impl DiscussionPost {
    pub fn from_json(raw: &Value) -> Self {
        Self {
            title: string_field(raw, "title"),
            content: string_field(raw, "contentSwReplaced"),
            written_at: raw.get("writtenAt").and_then(parse_written_at_value),
            order_no: raw.get("orderNo").and_then(cursor_value),
        }
    }

    /// Inclusive window check; posts without a usable timestamp pass.
    pub fn is_within(&self, cutoff: DateTime<Utc>) -> bool {
        match self.written_at {
            Some(t) => t >= cutoff,
            None => true,
        }
    }

    /// Title and body joined for keyword extraction.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.content)
    }
}

/// All posts on a listing page, in upstream order. Missing containers yield
/// an empty list.
pub fn parse_posts(page: &Value) -> Vec<DiscussionPost> {
    page.get("result")
        .and_then(|r| r.get("posts"))
        .and_then(Value::as_array)
        .map(|posts| posts.iter().map(DiscussionPost::from_json).collect())
        .unwrap_or_default()
}

/// Parse a board timestamp. Offset-qualified RFC 3339 is honoured as given;
/// naive layouts are read as service-local time.
pub fn parse_written_at(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS.iter().find_map(|fmt| {
        let naive = NaiveDateTime::parse_from_str(s, fmt).ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn parse_written_at_value(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::String(s) => parse_written_at(s),
        // Epoch milliseconds.
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn cursor_value(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_full_post() {
        let post = DiscussionPost::from_json(&json!({
            "title": "실적 발표",
            "contentSwReplaced": "좋네요",
            "writtenAt": "2024-05-01T12:00:00+09:00",
            "orderNo": 12345
        }));
        assert_eq!(post.title, "실적 발표");
        assert_eq!(post.content, "좋네요");
        assert_eq!(
            post.written_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap())
        );
        assert_eq!(post.order_no.as_deref(), Some("12345"));
        assert_eq!(post.text(), "실적 발표 좋네요");
    }

    #[test]
    fn missing_fields_are_lenient() {
        let post = DiscussionPost::from_json(&json!({ "writtenAt": "yesterday-ish" }));
        assert_eq!(post.title, "");
        assert_eq!(post.content, "");
        assert!(post.written_at.is_none());
        assert!(post.order_no.is_none());
    }

    #[test]
    fn naive_timestamps_parse_as_local_time() {
        let parsed = parse_written_at("2024-05-01T12:00:00").unwrap();
        let expected = Local
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(parsed, expected);
        assert!(parse_written_at("2024-05-01 12:00:00.123").is_some());
        assert!(parse_written_at("").is_none());
    }

    #[test]
    fn epoch_millis_are_accepted() {
        let post = DiscussionPost::from_json(&json!({ "writtenAt": 1_714_532_400_000i64 }));
        assert_eq!(post.written_at.unwrap().timestamp(), 1_714_532_400);
    }

    #[test]
    fn window_check_is_inclusive_and_fails_open() {
        let cutoff = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut post = DiscussionPost::from_json(&json!({}));
        assert!(post.is_within(cutoff));

        post.written_at = Some(cutoff);
        assert!(post.is_within(cutoff));

        post.written_at = Some(cutoff - chrono::Duration::seconds(1));
        assert!(!post.is_within(cutoff));
    }

    #[test]
    fn parse_posts_tolerates_missing_containers() {
        assert!(parse_posts(&json!({})).is_empty());
        assert!(parse_posts(&json!({"result": {"posts": null}})).is_empty());
        let posts = parse_posts(&json!({"result": {"posts": [{"title": "a"}, {"title": "b"}]}}));
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].title, "b");
    }
}
