use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::models::{
    interval::{Bucket, DAY_SECS, IntervalVocabulary, MONTH_SECS, WEEK_SECS},
    request_params::ResolvedRequest,
};

const INTRADAY: &[Bucket] = &[
    Bucket::mins("1min", 1),
    Bucket::mins("5min", 5),
    Bucket::mins("15min", 15),
    Bucket::mins("30min", 30),
    Bucket::mins("60min", 60),
];

pub const VOCABULARY: IntervalVocabulary = IntervalVocabulary::with_breakpoints(
    "alphavantage",
    &[
        Bucket::mins("1min", 1),
        Bucket::mins("5min", 5),
        Bucket::mins("15min", 15),
        Bucket::mins("30min", 30),
        Bucket::mins("60min", 60),
        Bucket::secs("daily", DAY_SECS),
        Bucket::secs("weekly", WEEK_SECS),
        Bucket::secs("monthly", MONTH_SECS),
    ],
    &[("d", "daily"), ("w", "weekly"), ("m", "monthly")],
    INTRADAY,
);

/// The `function` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Function {
    #[serde(rename = "TIME_SERIES_INTRADAY")]
    Intraday,
    #[serde(rename = "TIME_SERIES_DAILY")]
    Daily,
    #[serde(rename = "TIME_SERIES_WEEKLY")]
    Weekly,
    #[serde(rename = "TIME_SERIES_MONTHLY")]
    Monthly,
}

/// `compact` is the latest 100 points; `full` is everything available.
#[derive(Clone, Copy, Debug, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputSize {
    Compact,
    #[default]
    Full,
}

#[derive(Debug, Serialize)]
pub struct QueryParams {
    pub function: Function,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    pub outputsize: OutputSize,
    pub datatype: &'static str,
    pub apikey: String,
}

pub fn construct_params(request: &ResolvedRequest, api_key: &SecretString) -> QueryParams {
    let (function, interval) = match request.interval.label() {
        "daily" => (Function::Daily, None),
        "weekly" => (Function::Weekly, None),
        "monthly" => (Function::Monthly, None),
        label => (Function::Intraday, Some(label.to_string())),
    };
    QueryParams {
        function,
        symbol: request.symbol.clone(),
        interval,
        outputsize: OutputSize::Full,
        datatype: "json",
        apikey: api_key.expose_secret().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request_params::BarsRequest;
    use chrono::NaiveDate;

    #[test]
    fn integers_round_down_to_supported_minutes() {
        assert_eq!(VOCABULARY.normalize(4).label(), "1min");
        assert_eq!(VOCABULARY.normalize(5).label(), "5min");
        assert_eq!(VOCABULARY.normalize(29).label(), "15min");
        assert_eq!(VOCABULARY.normalize(45).label(), "30min");
        assert_eq!(VOCABULARY.normalize(390).label(), "60min");
        assert_eq!(VOCABULARY.normalize("60").label(), "60min");
        assert_eq!(VOCABULARY.normalize("w").label(), "weekly");
        assert_eq!(VOCABULARY.normalize(0).label(), "1min");
        assert_eq!(VOCABULARY.normalize("hourly").label(), "1min");
    }

    #[test]
    fn daily_uses_its_own_function() {
        let now = NaiveDate::from_ymd_opt(2019, 1, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let resolved = BarsRequest::new("SQ").with_interval("d").resolve(now, &VOCABULARY);
        let params = construct_params(&resolved, &SecretString::new("demo".into()));
        let query = serde_json::to_value(&params).unwrap();
        assert_eq!(query["function"], "TIME_SERIES_DAILY");
        assert!(query.get("interval").is_none());
        assert_eq!(query["outputsize"], "full");
    }
}
