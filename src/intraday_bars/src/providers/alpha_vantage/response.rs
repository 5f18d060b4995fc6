//! Alpha Vantage payload shapes.
//!
//! A good answer has two keys: `"Meta Data"` and one time-series key whose
//! name depends on the function (`"Time Series (5min)"`,
//! `"Weekly Time Series"`, ...). Rows are keyed by timestamp, newest first,
//! and every number is a string.

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::{
    bar::{Bar, coerce_volume, lenient_f64},
    window::{WindowParseError, parse_timestamp},
};

#[derive(Deserialize, Debug)]
pub struct AlphaVantageRow {
    #[serde(rename = "1. open", deserialize_with = "lenient_f64")]
    pub open: f64,
    #[serde(rename = "2. high", deserialize_with = "lenient_f64")]
    pub high: f64,
    #[serde(rename = "3. low", deserialize_with = "lenient_f64")]
    pub low: f64,
    #[serde(rename = "4. close", deserialize_with = "lenient_f64")]
    pub close: f64,
    #[serde(rename = "5. volume", deserialize_with = "lenient_f64")]
    pub volume: f64,
}

/// What a 200 response turned out to be.
#[derive(Debug)]
pub enum Payload {
    Series {
        meta: Map<String, Value>,
        rows: IndexMap<String, AlphaVantageRow>,
    },
    /// `"Error Message"`: bad symbol, bad function, bad key.
    Error(String),
    /// No time-series key; the vendor is throttling us.
    Throttled(String),
}

impl Payload {
    /// Classifies a raw JSON object. Fails only when a time-series block is
    /// present but malformed.
    pub fn classify(raw: IndexMap<String, Value>) -> Result<Self, serde_json::Error> {
        if let Some(message) = raw.get("Error Message") {
            return Ok(Self::Error(text_of(message)));
        }

        let series_key = raw.keys().find(|k| k.contains("Time Series")).cloned();
        let Some(series_key) = series_key else {
            let greeting = ["Note", "Information"]
                .iter()
                .find_map(|k| raw.get(*k))
                .or_else(|| raw.values().next())
                .map(text_of)
                .unwrap_or_else(|| "empty response".to_string());
            return Ok(Self::Throttled(greeting));
        };

        let mut raw = raw;
        let meta = match raw.shift_remove("Meta Data") {
            Some(Value::Object(meta)) => meta,
            _ => Map::new(),
        };
        let rows = match raw.shift_remove(&series_key) {
            Some(value) => serde_json::from_value(value)?,
            None => IndexMap::new(),
        };
        Ok(Self::Series { meta, rows })
    }
}

/// Converts one keyed row. Daily keys have no time part and land on midnight.
pub fn to_bar(key: &str, row: AlphaVantageRow) -> Result<Bar, WindowParseError> {
    Ok(Bar::new(
        parse_timestamp(key)?,
        row.open,
        row.high,
        row.low,
        row.close,
        coerce_volume(row.volume),
    ))
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
