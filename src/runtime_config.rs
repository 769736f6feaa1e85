// =============================================================================
// Runtime Configuration — service settings with env overrides
// =============================================================================
//
// Loaded once at startup from an optional JSON file. Every field carries a
// serde default, so a partial (or absent) file still yields a complete
// configuration. A few values can be overridden from the environment:
//
//   PORT                 — HTTP bind port
//   STOCK_ITEM_CODE      — item whose quotes and discussion are tracked
//   STOCK_KEYWORD_LIMIT  — number of keywords returned by /api/discussion
//
// =============================================================================

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::discussion::DiscussionEndpoint;
use crate::scheduler::{DailySchedule, MAX_POLL_INTERVAL};

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_item_code() -> String {
    "001530".to_string()
}

fn default_quote_base_url() -> String {
    "https://api.stock.naver.com/chart/domestic/item".to_string()
}

fn default_discussion_url() -> String {
    "https://stock.naver.com/api/community/discussion/posts/by-item".to_string()
}

fn default_discussion_type() -> String {
    "domesticStock".to_string()
}

fn default_referer_base() -> String {
    "https://m.stock.naver.com/domestic/stock".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_refresh_times() -> Vec<String> {
    vec!["09:00".to_string(), "15:00".to_string()]
}

fn default_scheduler_poll_secs() -> u64 {
    60
}

fn default_discussion_page_size() -> u32 {
    20
}

fn default_discussion_max_pages() -> u32 {
    20
}

fn default_discussion_window_days() -> i64 {
    30
}

fn default_keyword_limit() -> usize {
    50
}

fn default_port() -> u16 {
    8000
}

// =============================================================================
// RuntimeConfig
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    // --- Tracked item -------------------------------------------------------

    /// Six-digit item code of the tracked stock.
    #[serde(default = "default_item_code")]
    pub item_code: String,

    // --- Upstream -----------------------------------------------------------

    /// Chart endpoint; the item code is appended as the last path segment.
    #[serde(default = "default_quote_base_url")]
    pub quote_base_url: String,

    /// Discussion-board listing endpoint.
    #[serde(default = "default_discussion_url")]
    pub discussion_url: String,

    #[serde(default = "default_discussion_type")]
    pub discussion_type: String,

    /// Item page the requests claim to come from (`<base>/<item>/total`).
    #[serde(default = "default_referer_base")]
    pub referer_base: String,

    /// Budget for a single upstream call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    // --- Scheduling ---------------------------------------------------------

    /// Local times of day (`HH:MM`) at which quotes are refreshed.
    #[serde(default = "default_refresh_times")]
    pub refresh_times: Vec<String>,

    /// How often the scheduler checks the clock (clamped to 1..=60 s).
    #[serde(default = "default_scheduler_poll_secs")]
    pub scheduler_poll_secs: u64,

    // --- Discussion crawl ---------------------------------------------------

    #[serde(default = "default_discussion_page_size")]
    pub discussion_page_size: u32,

    /// Hard ceiling on listing pages fetched per request.
    #[serde(default = "default_discussion_max_pages")]
    pub discussion_max_pages: u32,

    /// Recency window for posts, in days.
    #[serde(default = "default_discussion_window_days")]
    pub discussion_window_days: i64,

    #[serde(default = "default_keyword_limit")]
    pub keyword_limit: usize,

    // --- HTTP ---------------------------------------------------------------

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            item_code: default_item_code(),
            quote_base_url: default_quote_base_url(),
            discussion_url: default_discussion_url(),
            discussion_type: default_discussion_type(),
            referer_base: default_referer_base(),
            request_timeout_secs: default_request_timeout_secs(),
            refresh_times: default_refresh_times(),
            scheduler_poll_secs: default_scheduler_poll_secs(),
            discussion_page_size: default_discussion_page_size(),
            discussion_max_pages: default_discussion_max_pages(),
            discussion_window_days: default_discussion_window_days(),
            keyword_limit: default_keyword_limit(),
            port: default_port(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// A missing file is an error so the caller can fall back to defaults
    /// with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse config from {}", path.display()))?;

        info!(
            path = %path.display(),
            item_code = %config.item_code,
            refresh_times = ?config.refresh_times,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults.
    ///
    /// A missing file is the normal case and only logs at info; an unreadable
    /// or invalid file logs a warning before falling back.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!(path = %path.display(), "no config file, using defaults");
            return Self::default();
        }
        Self::load(path).unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (the environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(raw) = lookup("PORT") {
            match raw.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid PORT"),
            }
        }
        if let Some(code) = lookup("STOCK_ITEM_CODE") {
            let code = code.trim();
            if code.is_empty() {
                warn!("ignoring empty STOCK_ITEM_CODE");
            } else {
                self.item_code = code.to_string();
            }
        }
        if let Some(raw) = lookup("STOCK_KEYWORD_LIMIT") {
            match raw.trim().parse::<usize>() {
                Ok(limit) => self.keyword_limit = limit,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid STOCK_KEYWORD_LIMIT"),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn scheduler_poll_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler_poll_secs.clamp(1, MAX_POLL_INTERVAL.as_secs()))
    }

    pub fn schedule(&self) -> Result<DailySchedule> {
        DailySchedule::parse(self.refresh_times.as_slice())
    }

    pub fn referer(&self) -> String {
        format!(
            "{}/{}/total",
            self.referer_base.trim_end_matches('/'),
            self.item_code
        )
    }

    pub fn discussion_endpoint(&self) -> DiscussionEndpoint {
        DiscussionEndpoint {
            url: self.discussion_url.clone(),
            discussion_type: self.discussion_type.clone(),
            page_size: self.discussion_page_size,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
