use chrono::{NaiveDate, TimeDelta};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::models::{
    interval::{Bucket, DAY_SECS, IntervalVocabulary},
    request_params::ResolvedRequest,
};

/// IEX accepts any `chartInterval`; daily charts are their own endpoint.
pub const VOCABULARY: IntervalVocabulary = IntervalVocabulary::any_minutes(
    "iex",
    &[Bucket::secs("daily", DAY_SECS)],
    &[("d", "daily"), ("day", "daily")],
);

/// How far back minute data goes.
pub const MINUTE_HORIZON_DAYS: i64 = 30;

/// Daily ranges, longest first, with the months each one covers.
const DAILY_RANGES: &[(&str, u32)] = &[
    ("5y", 60),
    ("2y", 24),
    ("1y", 12),
    ("6m", 6),
    ("3m", 3),
    ("1m", 1),
];

const MINUTE_FILTER: &str = "date,minute,open,high,low,close,average,volume";
const DAILY_FILTER: &str = "date,open,high,low,close,volume";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_interval: Option<u32>,
    pub filter: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// The chart path segment: `1d` for today, `date/YYYYMMDD` for an earlier
/// session.
pub fn minute_range(session: NaiveDate, today: NaiveDate) -> String {
    if session >= today {
        "1d".to_string()
    } else {
        format!("date/{}", session.format("%Y%m%d"))
    }
}

/// The smallest daily range that covers `start`, rounding up near the edges.
///
/// The flag is false when `start` is older than the longest range.
pub fn daily_range(start: NaiveDate, today: NaiveDate) -> (&'static str, bool) {
    let wanted_months = (today - start).num_days() as f64 / 30.0 + 1.0;
    let mut range = DAILY_RANGES[0].0;
    for (name, months) in DAILY_RANGES {
        if f64::from(*months) > wanted_months {
            range = *name;
        } else {
            break;
        }
    }
    (range, wanted_months <= f64::from(DAILY_RANGES[0].1))
}

/// True when `session` is too old for minute data.
pub fn beyond_minute_horizon(session: NaiveDate, today: NaiveDate) -> bool {
    today - session > TimeDelta::days(MINUTE_HORIZON_DAYS)
}

pub fn construct_params(request: &ResolvedRequest, token: Option<&SecretString>) -> ChartParams {
    let daily = request.interval.is_daily_or_longer();
    ChartParams {
        chart_interval: (!daily && request.interval.minutes() > 1)
            .then(|| request.interval.minutes()),
        filter: if daily { DAILY_FILTER } else { MINUTE_FILTER },
        token: token.map(|t| t.expose_secret().to_string()),
    }
}
