// =============================================================================
// Upstream Fetch Errors
// =============================================================================
//
// Every call against the stock API ends in one of three failure categories:
//
//   Network   — connect failure, timeout, or body read error
//   BadStatus — the upstream answered with anything other than 200
//   Parse     — 200 OK, but the body is not JSON
//
// Response-shape drift is NOT an error here; the quote normaliser absorbs it.
// Errors serialise to a tagged JSON object so handlers can hand them straight
// to the client.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

/// Maximum number of characters of an upstream body kept for diagnostics.
pub const BODY_SNIPPET_CHARS: usize = 200;

/// Structured failure of a single upstream GET.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("upstream request failed: {message}")]
    Network { message: String },

    #[error("upstream returned HTTP {status}: {body_snippet}")]
    BadStatus { status: u16, body_snippet: String },

    #[error("upstream body is not valid JSON ({message}): {body_snippet}")]
    Parse {
        message: String,
        body_snippet: String,
    },
}

impl FetchError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }

    pub fn bad_status(status: u16, body: &str) -> Self {
        Self::BadStatus {
            status,
            body_snippet: snippet(body),
        }
    }

    pub fn parse(err: impl std::fmt::Display, body: &str) -> Self {
        Self::Parse {
            message: err.to_string(),
            body_snippet: snippet(body),
        }
    }

    /// Short category label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::BadStatus { .. } => "bad_status",
            Self::Parse { .. } => "parse",
        }
    }

    /// JSON object for API responses: `{kind, message, ...}`.
    pub fn to_json(&self) -> serde_json::Value {
        let mut value = serde_json::to_value(self).unwrap_or_default();
        if let Some(obj) = value.as_object_mut() {
            obj.entry("message")
                .or_insert_with(|| serde_json::Value::String(self.to_string()));
        }
        value
    }
}

/// Truncate `body` to [`BODY_SNIPPET_CHARS`] characters without splitting a
/// multi-byte character.
pub fn snippet(body: &str) -> String {
    match body.char_indices().nth(BODY_SNIPPET_CHARS) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
