use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::models::{
    interval::{Bucket, DAY_SECS, IntervalVocabulary, MONTH_SECS, WEEK_SECS},
    request_params::ResolvedRequest,
};

/// Barchart takes any whole number of minutes, plus the named daily types.
pub const VOCABULARY: IntervalVocabulary = IntervalVocabulary::any_minutes(
    "barchart",
    &[
        Bucket::secs("daily", DAY_SECS),
        Bucket::secs("weekly", WEEK_SECS),
        Bucket::secs("monthly", MONTH_SECS),
    ],
    &[
        ("d", "daily"),
        ("day", "daily"),
        ("w", "weekly"),
        ("week", "weekly"),
        ("m", "monthly"),
        ("month", "monthly"),
    ],
);

/// The `type` parameter of `getHistory`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryType {
    Minutes,
    Daily,
    Weekly,
    Monthly,
}

/// Specifies the sort order for the bars.
#[derive(Clone, Copy, Debug, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// How volume is reported for each bar.
#[derive(Clone, Copy, Debug, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VolumeMode {
    Total,
    #[default]
    Sum,
    Contract,
}

/// Query parameters for `getHistory.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub apikey: String,
    pub symbol: String,
    #[serde(rename = "type")]
    pub history_type: HistoryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<u32>,
    /// `YYYYMMDDHHMMSS`, exchange-local.
    pub start_date: String,
    pub order: Order,
    /// `EFK` keeps the regular session and drops form-T trades.
    pub session_filter: &'static str,
    pub volume: VolumeMode,
    pub nearby: u8,
    pub jerq: bool,
}

/// Builds the `getHistory` query for a resolved request.
///
/// There is no end parameter on the free API.
pub fn construct_params(request: &ResolvedRequest, api_key: &SecretString) -> HistoryParams {
    let (history_type, interval) = match request.interval.label() {
        "daily" => (HistoryType::Daily, None),
        "weekly" => (HistoryType::Weekly, None),
        "monthly" => (HistoryType::Monthly, None),
        _ => (HistoryType::Minutes, Some(request.interval.minutes())),
    };
    HistoryParams {
        apikey: api_key.expose_secret().to_string(),
        symbol: request.symbol.clone(),
        history_type,
        interval,
        start_date: request.start.format("%Y%m%d%H%M%S").to_string(),
        order: Order::Asc,
        session_filter: "EFK",
        volume: VolumeMode::Sum,
        nearby: 1,
        jerq: true,
    }
}
