pub mod cache;
pub mod normalize;
pub mod service;
pub mod snapshot_file;

pub use normalize::{normalize, normalize_opt, NormalizedQuote};
pub use service::QuoteService;
