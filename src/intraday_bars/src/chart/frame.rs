use chrono::{NaiveDateTime, TimeDelta};

use crate::calendar::{MARKET_CLOSE, MARKET_OPEN};

/// Minutes of context to show around a trade, by candle width.
fn padding_minutes(interval_minutes: u32) -> i64 {
    match interval_minutes {
        0..5 => 20,
        5..7 => 40,
        7..20 => 60,
        _ => 180,
    }
}

/// Widens `begin..end` by some context on either side, never past the
/// regular session: the start stops at 09:30 on its day, the end at 16:00.
pub fn chart_time_frame(
    begin: NaiveDateTime,
    end: NaiveDateTime,
    interval_minutes: u32,
) -> (NaiveDateTime, NaiveDateTime) {
    let pad = TimeDelta::minutes(padding_minutes(interval_minutes));
    let begin = begin - pad;
    let end = end + pad;
    let open = begin.date().and_time(MARKET_OPEN);
    let close = end.date().and_time(MARKET_CLOSE);
    (begin.max(open), end.min(close))
}
