use serde::Deserialize;

use crate::models::{
    bar::{Bar, coerce_volume, lenient_f64_opt},
    window::parse_timestamp,
};

/// One chart row. Minute rows carry `date` as `YYYYMMDD` plus `minute` as
/// `HH:MM`; daily rows carry `date` as `YYYY-MM-DD` and no minute.
///
/// Minutes without trades come back with null or `-1` prices.
#[derive(Deserialize, Debug)]
pub struct IexRow {
    pub date: String,
    #[serde(default)]
    pub minute: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64_opt")]
    pub open: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64_opt")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64_opt")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64_opt")]
    pub close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64_opt")]
    pub volume: Option<f64>,
}

impl IexRow {
    /// The bar for this row, or `None` for an empty minute or an unparseable
    /// date.
    pub fn into_bar(self) -> Option<Bar> {
        let price = |p: Option<f64>| p.filter(|v| v.is_finite() && *v >= 0.0);
        let (open, high, low, close) = (
            price(self.open)?,
            price(self.high)?,
            price(self.low)?,
            price(self.close)?,
        );
        let stamp = match &self.minute {
            Some(minute) => format!("{} {minute}", self.date),
            None => self.date.clone(),
        };
        let timestamp = parse_timestamp(&stamp).ok()?;
        Some(Bar::new(
            timestamp,
            open,
            high,
            low,
            close,
            coerce_volume(self.volume.unwrap_or(0.0)),
        ))
    }
}
