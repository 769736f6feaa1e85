// =============================================================================
// HTTP Fetcher — browser-flavoured GET against the stock API
// =============================================================================
//
// The upstream rejects requests that do not look like they come from its own
// web client, so every request carries a fixed header set (User-Agent, Accept,
// Origin, Referer, sec-fetch-*). One reqwest client is built up-front with
// those headers and the request timeout, then shared by all callers.
//
// Only HTTP 200 with a JSON body counts as success.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use crate::error::FetchError;
use crate::upstream::{JsonSource, Query};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";
const BROWSER_ACCEPT: &str = "application/json, text/plain, */*";
const BROWSER_ACCEPT_LANGUAGE: &str = "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7";
const BROWSER_ORIGIN: &str = "https://m.stock.naver.com";

/// Settings for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// Whole-request budget (connect + headers + body).
    pub timeout: Duration,
    /// Page the upstream expects the request to originate from.
    pub referer: String,
}

/// [`JsonSource`] backed by a shared `reqwest::Client`.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let headers = browser_headers(&config.referer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("failed to build reqwest client")?;

        debug!(
            timeout_ms = config.timeout.as_millis() as u64,
            referer = %config.referer,
            "HttpFetcher initialised"
        );

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }
}

/// The fixed header set sent with every upstream request.
pub fn browser_headers(referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE));
    headers.insert(ORIGIN, HeaderValue::from_static(BROWSER_ORIGIN));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("same-site"));
    match HeaderValue::from_str(referer) {
        Ok(val) => {
            headers.insert(REFERER, val);
        }
        Err(_) => warn!(referer, "referer is not a valid header value; sending without it"),
    }
    headers
}

#[async_trait]
impl JsonSource for HttpFetcher {
    #[instrument(skip(self, query), name = "upstream::get_json")]
    async fn get_json(&self, url: &str, query: &Query) -> Result<serde_json::Value, FetchError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::network(format!(
                        "timed out after {} ms: {e}",
                        self.timeout.as_millis()
                    ))
                } else {
                    FetchError::network(e)
                }
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(FetchError::network)?;

        if status != StatusCode::OK {
            return Err(FetchError::bad_status(status.as_u16(), &body));
        }

        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| FetchError::parse(e, &body))?;

        debug!(bytes = body.len(), "upstream JSON received");
        Ok(value)
    }
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}
