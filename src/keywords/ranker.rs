// =============================================================================
// Keyword Ranker — clean → tokenise → filter → count → top N
// =============================================================================
//
// Pure and stateless per call. Counts are pooled across all input texts.
// Ordering: count descending, ties in order of first appearance (stable sort
// over first-seen order). Only terms that actually occurred are returned.
// =============================================================================

use std::collections::{HashMap, HashSet};

use serde::ser::{Serialize, SerializeTuple, Serializer};

use crate::keywords::markup::{clean_text, tokenize, MIN_TOKEN_CHARS};
use crate::keywords::stopwords::default_stop_words;

/// A term and how often it appeared. Serialises as `[term, count]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordCount {
    pub term: String,
    pub count: u32,
}

impl Serialize for KeywordCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tup = serializer.serialize_tuple(2)?;
        tup.serialize_element(&self.term)?;
        tup.serialize_element(&self.count)?;
        tup.end()
    }
}

/// Ranks discussion text by term frequency.
#[derive(Debug, Clone)]
pub struct KeywordRanker {
    stop_words: HashSet<String>,
}

impl Default for KeywordRanker {
    fn default() -> Self {
        Self::with_stop_words(default_stop_words())
    }
}

impl KeywordRanker {
    /// Ranker with a custom stop-word set (matched case-insensitively for
    /// ASCII).
    pub fn with_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            stop_words: words
                .into_iter()
                .map(|w| w.as_ref().to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.stop_words.contains(token)
    }

    /// Top `limit` keywords across `texts`.
    pub fn rank<S: AsRef<str>>(&self, texts: &[S], limit: usize) -> Vec<KeywordCount> {
        let mut counts: Vec<KeywordCount> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for text in texts {
            let cleaned = clean_text(text.as_ref());
            for token in tokenize(&cleaned) {
                if token.chars().count() < MIN_TOKEN_CHARS || self.is_stop_word(&token) {
                    continue;
                }
                match index.get(&token) {
                    Some(&i) => counts[i].count += 1,
                    None => {
                        index.insert(token.clone(), counts.len());
                        counts.push(KeywordCount {
                            term: token,
                            count: 1,
                        });
                    }
                }
            }
        }

        // Stable: equal counts keep first-seen order.
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        counts.retain(|k| k.count > 0);
        counts.truncate(limit);
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repeated_company_name_ranks_first() {
        let ranker = KeywordRanker::with_stop_words(["stock", "today"]);
        let texts = ["삼성전자 실적 발표", "삼성전자 good news"];
        let ranked = ranker.rank(&texts, 5);
        assert_eq!(
            ranked[0],
            KeywordCount {
                term: "삼성전자".into(),
                count: 2
            }
        );
        assert_eq!(ranked.len(), 5);
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let ranker = KeywordRanker::with_stop_words(Vec::<String>::new());
        let ranked = ranker.rank(&["알파 베타 감마 베타", "감마 델타"], 10);
        let terms: Vec<_> = ranked.iter().map(|k| (k.term.as_str(), k.count)).collect();
        assert_eq!(
            terms,
            vec![("베타", 2), ("감마", 2), ("알파", 1), ("델타", 1)]
        );
    }

    #[test]
    fn output_sorted_descending() {
        let ranker = KeywordRanker::default();
        let ranked = ranker.rank(&["하락 하락 하락 반등 반등 매수", "매수 매수 매수 하락"], 10);
        assert!(ranked.windows(2).all(|w| w[0].count >= w[1].count));
        assert_eq!(ranked[0].term, "하락");
        assert_eq!(ranked[0].count, 4);
        assert_eq!(ranked[1].term, "매수");
    }

    #[test]
    fn only_stop_words_and_short_tokens_yield_nothing() {
        let ranker = KeywordRanker::default();
        let ranked = ranker.rank(&["오늘 주식 댓글 stock TODAY comment a 가 1"], 10);
        assert!(ranked.is_empty());
    }

    #[test]
    fn stop_words_never_leak() {
        let ranker = KeywordRanker::default();
        let ranked = ranker.rank(&["그리고 실적 그리고 실적 Stock stock"], 10);
        assert!(ranked.iter().all(|k| !ranker.is_stop_word(&k.term)));
        assert_eq!(ranked, vec![KeywordCount { term: "실적".into(), count: 2 }]);
    }

    #[test]
    fn markup_is_stripped_before_counting() {
        let ranker = KeywordRanker::default();
        let ranked = ranker.rank(&["<div>배당</div><script>배당 배당</script>"], 10);
        assert_eq!(ranked, vec![KeywordCount { term: "배당".into(), count: 1 }]);
    }

    #[test]
    fn limit_caps_output_and_zero_limit_is_empty() {
        let ranker = KeywordRanker::default();
        assert_eq!(ranker.rank(&["하나 둘둘 셋셋 넷넷"], 2).len(), 2);
        assert!(ranker.rank(&["하나 둘둘"], 0).is_empty());
        assert!(ranker.rank::<&str>(&[], 5).is_empty());
    }

    #[test]
    fn serialises_as_pair() {
        let k = KeywordCount {
            term: "실적".into(),
            count: 3,
        };
        assert_eq!(serde_json::to_value(&k).unwrap(), json!(["실적", 3]));
    }
}
