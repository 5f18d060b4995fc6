use chrono::{DateTime, NaiveDateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::{
    interval::{Bucket, DAY_SECS, IntervalVocabulary, MONTH_SECS, WEEK_SECS},
    request_params::ResolvedRequest,
};

/// Every bar size the client can request, in TWS spelling.
const BAR_SIZES: &[Bucket] = &[
    Bucket::secs("1 secs", 1),
    Bucket::secs("5 secs", 5),
    Bucket::secs("15 secs", 15),
    Bucket::secs("30 secs", 30),
    Bucket::mins("1 min", 1),
    Bucket::mins("2 mins", 2),
    Bucket::mins("3 mins", 3),
    Bucket::mins("5 mins", 5),
    Bucket::mins("15 mins", 15),
    Bucket::mins("20 mins", 20),
    Bucket::mins("30 mins", 30),
    Bucket::mins("1 hour", 60),
    Bucket::mins("2 hours", 120),
    Bucket::mins("3 hours", 180),
    Bucket::mins("4 hours", 240),
    Bucket::mins("8 hours", 480),
    Bucket::secs("1 day", DAY_SECS),
    Bucket::secs("1 week", WEEK_SECS),
    Bucket::secs("1 month", MONTH_SECS),
];

/// Where integer minute counts round down to.
const MINUTE_BREAKPOINTS: &[Bucket] = &[
    Bucket::mins("1 min", 1),
    Bucket::mins("2 mins", 2),
    Bucket::mins("3 mins", 3),
    Bucket::mins("5 mins", 5),
    Bucket::mins("15 mins", 15),
    Bucket::mins("20 mins", 20),
    Bucket::mins("30 mins", 30),
    Bucket::mins("1 hour", 60),
];

pub const VOCABULARY: IntervalVocabulary = IntervalVocabulary::with_breakpoints(
    "ib",
    BAR_SIZES,
    &[
        ("1 mins", "1 min"),
        ("1 hours", "1 hour"),
        ("d", "1 day"),
        ("day", "1 day"),
        ("w", "1 week"),
        ("week", "1 week"),
        ("m", "1 month"),
        ("month", "1 month"),
    ],
    MINUTE_BREAKPOINTS,
);

/// How far back from the end a request reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Days(i32),
    /// TWS refuses day durations past 365, so longer spans go in years.
    Years(i32),
}

impl Lookback {
    /// Whole calendar days covering `start..=end`.
    pub fn covering(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        let days = (end.date() - start.date()).num_days().max(0) + 1;
        if days > 365 {
            Self::Years(i32::try_from((days + 364) / 365).unwrap_or(i32::MAX))
        } else {
            Self::Days(i32::try_from(days).unwrap_or(365))
        }
    }
}

/// One historical bar request.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalQuery {
    /// Stock symbol, routed through SMART in USD.
    pub symbol: String,
    pub end: DateTime<Utc>,
    pub lookback: Lookback,
    /// A label from [`VOCABULARY`].
    pub bar_size: String,
    /// Zone the returned bar times are expressed in.
    pub time_zone: Tz,
    /// Daily and longer bars carry a bare date.
    pub daily: bool,
}

impl HistoricalQuery {
    pub fn new(request: &ResolvedRequest, time_zone: Tz) -> Self {
        Self {
            symbol: request.symbol.clone(),
            end: exchange_instant(request.end, time_zone),
            lookback: Lookback::covering(request.start, request.end),
            bar_size: request.interval.label().to_string(),
            time_zone,
            daily: request.interval.is_daily_or_longer(),
        }
    }
}

/// Exchange wall time as an instant. A wall time skipped by a DST jump moves
/// an hour later.
fn exchange_instant(local: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + TimeDelta::hours(1))).earliest())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{request_params::BarsRequest, window::Window};
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn integers_round_down_through_bar_sizes() {
        assert_eq!(VOCABULARY.normalize(7).label(), "5 mins");
        assert_eq!(VOCABULARY.normalize(1).label(), "1 min");
        assert_eq!(VOCABULARY.normalize(2).label(), "2 mins");
        assert_eq!(VOCABULARY.normalize(12).label(), "5 mins");
        assert_eq!(VOCABULARY.normalize(25).label(), "20 mins");
        assert_eq!(VOCABULARY.normalize(300).label(), "1 hour");
        assert_eq!(VOCABULARY.normalize(i64::MAX).label(), "1 hour");
        assert_eq!(VOCABULARY.normalize("30 secs").label(), "30 secs");
        assert_eq!(VOCABULARY.normalize("d").label(), "1 day");
        assert_eq!(VOCABULARY.normalize("fortnight").label(), "1 min");
    }

    #[test]
    fn lookback_covers_whole_days() {
        assert_eq!(Lookback::covering(at(17, 9, 30), at(17, 16, 0)), Lookback::Days(1));
        assert_eq!(Lookback::covering(at(14, 9, 30), at(18, 16, 0)), Lookback::Days(5));
        assert_eq!(Lookback::covering(at(18, 9, 30), at(17, 16, 0)), Lookback::Days(1));
        let long_ago = NaiveDate::from_ymd_opt(2017, 6, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Lookback::covering(long_ago, at(18, 16, 0)), Lookback::Years(2));
    }

    #[test]
    fn query_ends_at_the_exchange_instant() {
        let resolved = BarsRequest::new("sq")
            .with_window(Window::between(at(17, 9, 30), at(17, 16, 0)))
            .with_interval(5)
            .resolve(at(18, 0, 0), &VOCABULARY);
        let query = HistoricalQuery::new(&resolved, chrono_tz::America::New_York);
        assert_eq!(query.symbol, "SQ");
        assert_eq!(query.end, Utc.with_ymd_and_hms(2019, 1, 17, 21, 0, 0).unwrap());
        assert_eq!(query.lookback, Lookback::Days(1));
        assert_eq!(query.bar_size, "5 mins");
        assert!(!query.daily);
    }

    #[test]
    fn wall_times_inside_a_dst_gap_move_forward() {
        let gap = NaiveDate::from_ymd_opt(2019, 3, 10)
            .unwrap()
            .and_hms_opt(2, 30, 0)
            .unwrap();
        assert_eq!(
            exchange_instant(gap, chrono_tz::America::New_York),
            Utc.with_ymd_and_hms(2019, 3, 10, 7, 30, 0).unwrap()
        );
    }
}
