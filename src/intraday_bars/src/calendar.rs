//! Business-day helpers for picking default window anchors.
//!
//! Weekends roll back to Friday. Exchange holidays are not modelled at all; a
//! request anchored on a holiday simply comes back empty with a warning from
//! the window clipper.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Weekday};

/// Regular-session open, exchange-local.
pub const MARKET_OPEN: NaiveTime = match NaiveTime::from_hms_opt(9, 30, 0) {
    Some(t) => t,
    None => panic!("invalid market open"),
};

/// Regular-session close, exchange-local.
pub const MARKET_CLOSE: NaiveTime = match NaiveTime::from_hms_opt(16, 0, 0) {
    Some(t) => t,
    None => panic!("invalid market close"),
};

/// Returns `date` if it is Monday through Friday, otherwise the preceding Friday.
pub fn last_business_day(date: NaiveDate) -> NaiveDate {
    let mut day = date;
    while !is_business_day(day) {
        day = day - Days::new(1);
    }
    day
}

/// The business day strictly before `date`.
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    last_business_day(date - Days::new(1))
}

pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
