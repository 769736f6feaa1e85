// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
//   GET /api/health      — liveness + cache status
//   GET /api/stock-data  — cached daily candles (lazy first fetch)
//   GET /api/update      — force a quote refresh now
//   GET /api/discussion  — top keywords from the last month of board posts
//
// The stock-data endpoint always answers 200 with a well-shaped body, even
// when the upstream is down. The discussion endpoint ranks whatever the crawl
// collected; only a failed ranking task answers `success: false` with a 500.
//
// CORS is permissive; the dashboard is served from a different origin during
// development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use crate::app_state::AppState;
use crate::discussion::cutoff_from;
use crate::keywords::KeywordCount;
use crate::quote::{normalize_opt, NormalizedQuote};

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/stock-data", get(stock_data))
        .route("/api/update", get(manual_update))
        .route("/api/discussion", get(discussion_keywords))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    item_code: String,
    last_update: Option<String>,
    fetching: bool,
    uptime_secs: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        item_code: state.config.item_code.clone(),
        last_update: state.quotes.cache().get().last_update(),
        fetching: state.quotes.is_fetching(),
        uptime_secs: state.uptime_secs(),
        server_time: Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Stock data
// =============================================================================

#[derive(Serialize)]
struct StockDataResponse {
    data: NormalizedQuote,
    last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<serde_json::Value>,
}

async fn stock_data(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (snapshot, fetch_error) = state.quotes.snapshot_or_fetch().await;
    let (data, shape) = normalize_opt(snapshot.payload.as_ref());

    if snapshot.payload.is_some() && data.price_infos.is_empty() {
        warn!(shape = ?shape, "cached quote payload produced no candles");
    }

    Json(StockDataResponse {
        data,
        last_update: snapshot.last_update(),
        error: fetch_error.map(|e| e.to_json()),
    })
}

// =============================================================================
// Manual update
// =============================================================================

#[derive(Serialize)]
struct UpdateResponse {
    success: bool,
    last_update: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<serde_json::Value>,
}

async fn manual_update(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    info!("Manual quote refresh requested via API");
    let result = state.quotes.refresh().await;
    let last_update = state.quotes.cache().get().last_update();

    Json(UpdateResponse {
        success: result.is_ok(),
        last_update,
        error: result.err().map(|e| e.to_json()),
    })
}

// =============================================================================
// Discussion keywords
// =============================================================================

#[derive(Serialize)]
struct DiscussionResponse {
    success: bool,
    keywords: Vec<KeywordCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn discussion_failure(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(DiscussionResponse {
            success: false,
            keywords: Vec::new(),
            error: Some(message),
        }),
    )
        .into_response()
}

async fn discussion_keywords(State(state): State<Arc<AppState>>) -> Response {
    let config = &state.config;
    let cutoff = cutoff_from(Utc::now(), config.discussion_window_days);

    let outcome = state
        .discussion
        .collect_recent_posts(&config.item_code, cutoff, config.discussion_max_pages)
        .await;

    let texts = outcome.texts();
    let ranker = state.ranker.clone();
    let limit = config.keyword_limit;

    match tokio::task::spawn_blocking(move || ranker.rank(texts.as_slice(), limit)).await {
        Ok(keywords) => {
            info!(
                posts = outcome.posts.len(),
                pages = outcome.pages_fetched,
                keywords = keywords.len(),
                stop_reason = ?outcome.stop_reason,
                "discussion keywords computed"
            );
            Json(DiscussionResponse {
                success: true,
                keywords,
                error: None,
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "keyword ranking task failed");
            discussion_failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("keyword ranking failed: {e}"),
            )
        }
    }
}
