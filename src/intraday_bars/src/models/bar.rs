//! Canonical in-memory representation of one OHLCV candle.
//!
//! Every [`BarProvider`](crate::providers::BarProvider) maps its vendor rows
//! into this struct, whatever the wire format looked like.

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, de};

/// A single OHLCV bar.
///
/// The timestamp is naive exchange-local time (US/Eastern for every supported
/// vendor) at minute resolution. `high >= max(open, close)` is what the market
/// promises; nothing here checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the bar interval, exchange-local.
    pub timestamp: NaiveDateTime,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Shares traded during the bar interval.
    pub volume: u64,
}

impl Bar {
    pub fn new(
        timestamp: NaiveDateTime,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Coerces a vendor volume figure into a share count.
///
/// Vendors hand back volumes as floats, decimal strings or `-1` for "unknown";
/// negatives and NaN collapse to zero.
pub fn coerce_volume(raw: f64) -> u64 {
    if raw.is_finite() && raw > 0.0 {
        raw.round() as u64
    } else {
        0
    }
}

/// Deserializes a price that may arrive as a JSON number or a numeric string.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("not a number: {s:?}"))),
    }
}

/// Like [`lenient_f64`] but `null` and absent values become `None`.
pub fn lenient_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "lenient_f64")] f64);

    Ok(Option::<Wrap>::deserialize(deserializer)?.map(|Wrap(v)| v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Row {
        #[serde(deserialize_with = "lenient_f64")]
        price: f64,
        #[serde(default, deserialize_with = "lenient_f64_opt")]
        maybe: Option<f64>,
    }

    #[test]
    fn numbers_and_numeric_strings_both_parse() {
        let a: Row = serde_json::from_str(r#"{"price": 12.5, "maybe": "3"}"#).unwrap();
        let b: Row = serde_json::from_str(r#"{"price": " 12.5 ", "maybe": null}"#).unwrap();
        let c: Row = serde_json::from_str(r#"{"price": 1}"#).unwrap();
        assert_eq!(a.price, 12.5);
        assert_eq!(a.maybe, Some(3.0));
        assert_eq!(b.price, 12.5);
        assert_eq!(b.maybe, None);
        assert_eq!(c.maybe, None);
        assert!(serde_json::from_str::<Row>(r#"{"price": "n/a"}"#).is_err());
    }

    #[test]
    fn coerce_volume_clamps_unknowns() {
        assert_eq!(coerce_volume(1234.4), 1234);
        assert_eq!(coerce_volume(-1.0), 0);
        assert_eq!(coerce_volume(f64::NAN), 0);
    }
}
