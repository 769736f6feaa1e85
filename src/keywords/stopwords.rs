// =============================================================================
// Stop Words — connectives and board boilerplate that never make a keyword
// =============================================================================

/// Korean function words, fillers and board boilerplate.
const KOREAN: &[&str] = &[
    // connectives / adverbs
    "그리고", "그런데", "그러나", "하지만", "그래서", "그러니", "그럼", "그냥", "근데",
    "또는", "혹은", "및", "아니", "아니라", "이제", "지금", "아직", "벌써", "다시", "계속",
    "정말", "진짜", "너무", "아주", "매우", "많이", "조금", "좀", "역시", "과연", "결국",
    // pronouns / demonstratives
    "이거", "저거", "그거", "이것", "저것", "그것", "여기", "거기", "저기", "우리", "저희",
    "너희", "당신", "이런", "저런", "그런", "이번", "저번",
    // verbs / endings that surface as standalone runs
    "있다", "없다", "있는", "없는", "있고", "없고", "하는", "하고", "해서", "했다", "한다",
    "합니다", "입니다", "있습니다", "없습니다", "됩니다", "같은", "같다", "같네요", "되는",
    "에서", "으로", "에게", "까지", "부터", "보다", "처럼", "하면", "해도", "라고",
    // time words
    "오늘", "내일", "어제", "요즘", "이번주", "다음주", "올해", "작년",
    // board / market boilerplate
    "주식", "종목", "주가", "주주", "댓글", "게시글", "게시판", "토론", "토론방", "답글",
    "삭제", "신고", "공지", "뉴스", "기사", "관련", "내용", "원문", "보기", "더보기",
];

/// English connectives and site boilerplate.
const ENGLISH: &[&str] = &[
    "the", "and", "or", "but", "for", "with", "this", "that", "from", "are", "was", "were",
    "is", "it", "to", "of", "in", "on", "at", "by", "an", "be", "as", "so", "if", "not",
    "stock", "stocks", "today", "comment", "comments", "reply", "post", "news",
    "http", "https", "www", "com", "co", "kr", "html", "nbsp",
];

/// The built-in stop-word list (lower-case).
pub fn default_stop_words() -> impl Iterator<Item = &'static str> {
    KOREAN.iter().chain(ENGLISH.iter()).copied()
}
