// =============================================================================
// Discussion Board Module
// =============================================================================
//
// Crawls the item's discussion board over the last N days and hands the raw
// post text to the keyword ranker. Nothing here is cached: every request
// re-crawls, bounded by `max_pages x page_size` posts.

pub mod ingest;
pub mod post;

pub use ingest::{cutoff_from, DiscussionEndpoint, DiscussionIngestor};
