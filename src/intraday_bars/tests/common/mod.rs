#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use intraday_bars::{models::window::Window, session::Session};

/// Friday 2019-01-18, 16:00 US/Eastern.
pub fn session() -> Session {
    Session::unlimited().with_fixed_now(Utc.with_ymd_and_hms(2019, 1, 18, 21, 0, 0).unwrap())
}

pub fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2019, 1, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

pub fn window(start: NaiveDateTime, end: NaiveDateTime) -> Window {
    Window::between(start, end)
}
