// =============================================================================
// Central Application State
// =============================================================================
//
// Ties together everything the HTTP handlers and the scheduler share. Built
// once at startup and handed around as `Arc<AppState>`; the only mutable
// piece is the quote cache inside `QuoteService`, which manages its own
// synchronisation.
// =============================================================================

use std::sync::Arc;

use crate::discussion::DiscussionIngestor;
use crate::keywords::KeywordRanker;
use crate::quote::service::quote_url;
use crate::quote::QuoteService;
use crate::runtime_config::RuntimeConfig;
use crate::upstream::JsonSource;

pub struct AppState {
    pub config: RuntimeConfig,
    pub quotes: Arc<QuoteService>,
    pub discussion: DiscussionIngestor,
    pub ranker: Arc<KeywordRanker>,
    /// Instant when the service was started. Used for uptime reporting.
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Wire all components against one upstream `source`.
    pub fn new(config: RuntimeConfig, source: Arc<dyn JsonSource>) -> Self {
        let quotes = Arc::new(QuoteService::new(
            source.clone(),
            quote_url(&config.quote_base_url, &config.item_code),
        ));
        let discussion = DiscussionIngestor::new(source, config.discussion_endpoint());

        Self {
            config,
            quotes,
            discussion,
            ranker: Arc::new(KeywordRanker::default()),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
