use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::models::bar::{Bar, coerce_volume, lenient_f64, lenient_f64_opt};

#[derive(Deserialize, Debug)]
pub struct BarchartStatus {
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize, Debug)]
pub struct BarchartBar {
    /// RFC 3339 with the exchange offset, e.g. `2019-01-17T09:30:00-05:00`.
    pub timestamp: DateTime<FixedOffset>,
    #[serde(deserialize_with = "lenient_f64")]
    pub open: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub high: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub low: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub close: f64,
    #[serde(default, deserialize_with = "lenient_f64_opt")]
    pub volume: Option<f64>,
}

impl From<BarchartBar> for Bar {
    /// Keeps the wall-clock part of the timestamp; Barchart already reports
    /// in exchange time.
    fn from(bar: BarchartBar) -> Self {
        Bar::new(
            bar.timestamp.naive_local(),
            bar.open,
            bar.high,
            bar.low,
            bar.close,
            coerce_volume(bar.volume.unwrap_or(0.0)),
        )
    }
}

#[derive(Deserialize, Debug)]
pub struct BarchartResponse {
    pub status: BarchartStatus,
    #[serde(default)]
    pub results: Option<Vec<BarchartBar>>,
}

impl BarchartResponse {
    /// Barchart's status block as status metadata.
    pub fn meta(&self) -> Map<String, Value> {
        let mut meta = Map::new();
        meta.insert("code".into(), self.status.code.into());
        meta.insert("message".into(), self.status.message.clone().into());
        meta
    }

    /// True when the vendor refused the call because the account is out of
    /// queries for the day.
    pub fn is_quota_refusal(&self) -> bool {
        let message = self.status.message.to_lowercase();
        self.status.code == 429
            || message.contains("limit")
            || message.contains("exceeded")
            || message.contains("maximum")
    }
}
