// =============================================================================
// Text Cleanup & Tokenisation
// =============================================================================
//
// Board posts are usually plain text but can carry markup, so cleanup always
// runs:
//   1. drop <script>/<style> blocks with their contents
//   2. drop remaining tags, decode the handful of common entities
//   3. collapse whitespace
//
// Tokenisation is deliberately coarse: maximal runs of Hangul syllables,
// ASCII letters and digits, at least two characters long. It over-generates
// and relies on the stop-word filter to prune.
// =============================================================================

/// Elements whose contents are never user-visible text.
const HIDDEN_BLOCKS: &[&str] = &["script", "style"];

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&amp;", "&"),
];

/// Minimum token length in characters.
pub const MIN_TOKEN_CHARS: usize = 2;

/// Strip markup and collapse whitespace runs to single spaces.
pub fn clean_text(text: &str) -> String {
    let without_blocks = strip_hidden_blocks(text);
    let without_tags = strip_tags(&without_blocks);
    let decoded = decode_entities(&without_tags);
    collapse_whitespace(&decoded)
}

/// Remove `<script>`/`<style>` elements including their bodies. An unclosed
/// block swallows the rest of the text.
pub fn strip_hidden_blocks(text: &str) -> String {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;

    while let Some((start, name)) = next_block_start(&lower, pos) {
        out.push_str(&text[pos..start]);
        out.push(' ');
        let closing = format!("</{name}");
        pos = match lower[start..].find(&closing) {
            Some(rel) => {
                let close_at = start + rel;
                match lower[close_at..].find('>') {
                    Some(gt) => close_at + gt + 1,
                    None => text.len(),
                }
            }
            None => text.len(),
        };
    }
    out.push_str(&text[pos..]);
    out
}

fn next_block_start(lower: &str, from: usize) -> Option<(usize, &'static str)> {
    HIDDEN_BLOCKS
        .iter()
        .filter_map(|name| {
            let open = format!("<{name}");
            let mut search = from;
            while let Some(rel) = lower[search..].find(&open) {
                let at = search + rel;
                let after = lower[at + open.len()..].chars().next();
                if matches!(after, None | Some('>') | Some('/')) || after.is_some_and(char::is_whitespace) {
                    return Some((at, *name));
                }
                search = at + open.len();
            }
            None
        })
        .min_by_key(|(at, _)| *at)
}

/// Replace every `<tag ...>` with a space. A `<` that does not open a tag
/// (e.g. "a < b") is left alone.
pub fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(lt) = rest.find('<') {
        let opens_tag = rest[lt + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');
        let close = rest[lt..].find('>');
        match (opens_tag, close) {
            (true, Some(gt)) => {
                out.push_str(&rest[..lt]);
                out.push(' ');
                rest = &rest[lt + gt + 1..];
            }
            _ => {
                out.push_str(&rest[..=lt]);
                rest = &rest[lt + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    ENTITIES
        .iter()
        .fold(text.to_string(), |acc, (entity, plain)| acc.replace(entity, plain))
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Precomposed Hangul syllables (가..힣).
fn is_hangul_syllable(c: char) -> bool {
    ('\u{AC00}'..='\u{D7A3}').contains(&c)
}

fn is_token_char(c: char) -> bool {
    is_hangul_syllable(c) || c.is_ascii_alphanumeric()
}

/// Split `text` into candidate keywords. ASCII letters are lower-cased so
/// "Stock" and "stock" count together.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut len = 0usize;

    for c in text.chars().chain(std::iter::once(' ')) {
        if is_token_char(c) {
            current.push(c.to_ascii_lowercase());
            len += 1;
        } else if !current.is_empty() {
            if len >= MIN_TOKEN_CHARS {
                tokens.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            len = 0;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_and_style_blocks_disappear() {
        let html = "앞<SCRIPT type=\"x\">var a = '삼성';</script>중간<style>p{}</style >뒤";
        assert_eq!(clean_text(html), "앞 중간 뒤");
    }

    #[test]
    fn unclosed_script_swallows_rest() {
        assert_eq!(clean_text("보임 <script>숨김"), "보임");
    }

    #[test]
    fn similar_tag_names_are_not_blocks() {
        assert_eq!(strip_hidden_blocks("<scripted>글</scripted>"), "<scripted>글</scripted>");
        assert_eq!(clean_text("<scripted>글</scripted>"), "글");
    }

    #[test]
    fn tags_removed_but_comparisons_kept() {
        assert_eq!(clean_text("<p>주가 <b>상승</b></p>"), "주가 상승");
        assert_eq!(clean_text("3 < 5 그리고 <br/>끝"), "3 < 5 그리고 끝");
    }

    #[test]
    fn entities_and_whitespace() {
        assert_eq!(clean_text("a&nbsp;&amp;\n\n\tb"), "a & b");
    }

    #[test]
    fn tokenize_keeps_runs_of_two_or_more() {
        let tokens = tokenize("삼성전자 실적 발표! Good 가 a 2024년 ㅋㅋ");
        assert_eq!(tokens, vec!["삼성전자", "실적", "발표", "good", "2024년"]);
    }

    #[test]
    fn tokenize_splits_on_punctuation() {
        assert_eq!(tokenize("매수/매도...HOLD"), vec!["매수", "매도", "hold"]);
        assert!(tokenize("").is_empty());
    }
}
