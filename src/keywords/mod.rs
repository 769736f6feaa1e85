// =============================================================================
// Keyword Extraction
// =============================================================================
//
// Turns a month of discussion text into a ranked keyword list. Pipeline:
// markup cleanup → coarse script-aware tokens → stop-word filter → counts.

pub mod markup;
pub mod ranker;
pub mod stopwords;

pub use ranker::{KeywordCount, KeywordRanker};
