// =============================================================================
// Quote Normaliser — one stable output schema over a drifting upstream
// =============================================================================
//
// The chart API has shipped the candle list under two envelopes:
//
//   { "priceInfos": [...] }               (current)
//   { "data": { "priceInfos": [...] } }   (older)
//
// Detection runs in that priority order. Anything else (including a
// `priceInfos` that is not an array) yields an empty candle list, so callers
// always get `{"priceInfos": [...]}` and never a missing field.
// =============================================================================

use serde::Serialize;
use serde_json::Value;

const PRICE_INFOS: &str = "priceInfos";
const DATA: &str = "data";

/// Which envelope the candles were found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
    /// `priceInfos` at the top level.
    Direct,
    /// `priceInfos` under a `data` object.
    Nested,
    /// No recognised envelope; candles are empty.
    Unrecognized,
}

/// Stable view of the daily candles, computed on every read.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedQuote {
    #[serde(rename = "priceInfos")]
    pub price_infos: Vec<Value>,
}

/// Map a raw upstream payload onto [`NormalizedQuote`].
///
/// Never fails: unrecognised input degrades to an empty candle list.
pub fn normalize(raw: &Value) -> NormalizedQuote {
    normalize_with_shape(raw).0
}

/// Like [`normalize`], also reporting which envelope matched.
pub fn normalize_with_shape(raw: &Value) -> (NormalizedQuote, PayloadShape) {
    if let Some(candles) = raw.get(PRICE_INFOS).and_then(Value::as_array) {
        return (
            NormalizedQuote {
                price_infos: candles.clone(),
            },
            PayloadShape::Direct,
        );
    }

    if let Some(candles) = raw
        .get(DATA)
        .filter(|d| d.is_object())
        .and_then(|d| d.get(PRICE_INFOS))
        .and_then(Value::as_array)
    {
        return (
            NormalizedQuote {
                price_infos: candles.clone(),
            },
            PayloadShape::Nested,
        );
    }

    (NormalizedQuote::default(), PayloadShape::Unrecognized)
}

/// Normalise an optional payload (an empty cache normalises to no candles).
pub fn normalize_opt(raw: Option<&Value>) -> (NormalizedQuote, PayloadShape) {
    match raw {
        Some(v) => normalize_with_shape(v),
        None => (NormalizedQuote::default(), PayloadShape::Unrecognized),
    }
}
