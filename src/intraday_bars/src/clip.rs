//! Trimming a vendor response to the requested window.
//!
//! Vendors are sloppy about boundaries: some ignore the end, some hand back
//! the previous session when today has not been published yet, some start at
//! 09:31 instead of 09:30. Every adapter funnels its table through
//! [`clip_to_window`], which applies one rule: `start <= timestamp <= end`.
//! Mismatches become warnings on the status, never errors.

use crate::{models::bar_table::BarTable, models::window::Window, status::ProviderStatus};

/// Clips `table` to `window` (inclusive on both ends), recording warnings on
/// `status` when the response under- or overshoots what was asked.
///
/// Same-session checks compare dates only; slicing compares full timestamps.
pub fn clip_to_window(table: BarTable, window: &Window, status: &mut ProviderStatus) -> BarTable {
    let (Some(first), Some(last)) = (table.first_timestamp(), table.last_timestamp()) else {
        status.mark_unavailable(format!("no bars returned for {}", table.symbol()));
        return table;
    };

    if let Some(end) = window.end {
        if end < first {
            status.mark_unavailable(format!(
                "requested end ({end}) predates earliest available data ({first})"
            ));
            return table.cleared();
        }
        if end.date() > last.date() {
            status.warn(format!(
                "requested end date {} is not included in the response (last bar {last}); \
                 weekend, holiday or not yet published?",
                end.date()
            ));
        }
    }
    if let Some(start) = window.start {
        if start.date() < first.date() {
            status.warn(format!(
                "requested start date {} is not included in the response (first bar {first}); \
                 weekend or holiday?",
                start.date()
            ));
        }
    }

    let mut table = table;
    if let Some(start) = window.start {
        if start > first {
            table = table.since(start);
        }
    }
    if let Some(end) = window.end {
        if end < last {
            table = table.until(end);
        }
    }

    if table.is_empty() {
        let culprit = match (window.start, window.end) {
            (Some(start), _) if start > last => {
                format!("requested start ({start}) is after the last available bar ({last})")
            }
            (Some(start), Some(end)) => {
                format!("no bars fall between requested start ({start}) and end ({end})")
            }
            _ => "no bars fall inside the requested window".to_string(),
        };
        status.mark_unavailable(culprit);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::bar::Bar,
        providers::ProviderKind,
        status::StatusCode,
    };
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// One regular session of 1-minute bars, 09:30 through 16:00 inclusive.
    fn session(day: u32) -> BarTable {
        let open = at(day, 9, 30);
        let bars = (0..=390)
            .map(|i| {
                let ts = open + TimeDelta::minutes(i);
                Bar::new(ts, 10.0, 11.0, 9.0, 10.5, 100)
            })
            .collect();
        BarTable::new("SQ", "1min", bars)
    }

    fn status() -> ProviderStatus {
        ProviderStatus::ok(ProviderKind::AlphaVantage)
    }

    #[test]
    fn window_wider_than_data_returns_table_unchanged_without_warning() {
        let table = session(17);
        let mut st = status();
        let clipped = clip_to_window(
            table.clone(),
            &Window::between(at(17, 9, 0), at(17, 17, 0)),
            &mut st,
        );
        assert_eq!(clipped, table);
        assert!(st.messages.is_empty());
        assert!(st.is_ok());
    }

    #[test]
    fn end_before_first_bar_is_unsatisfiable() {
        let mut st = status();
        let clipped = clip_to_window(session(17), &Window::new(None, Some(at(16, 15, 0))), &mut st);
        assert!(clipped.is_empty());
        assert_eq!(st.code, StatusCode::Unavailable);
        assert!(st.message().contains("predates earliest available data"));
    }

    #[test]
    fn slices_both_ends_inclusively() {
        let mut st = status();
        let clipped = clip_to_window(
            session(17),
            &Window::between(at(17, 10, 0), at(17, 11, 0)),
            &mut st,
        );
        assert_eq!(clipped.first_timestamp(), Some(at(17, 10, 0)));
        assert_eq!(clipped.last_timestamp(), Some(at(17, 11, 0)));
        assert_eq!(clipped.len(), 61);
        assert!(st.messages.is_empty());
    }

    #[test]
    fn start_after_data_names_the_start_bound() {
        let mut st = status();
        let clipped = clip_to_window(session(17), &Window::new(Some(at(18, 9, 30)), None), &mut st);
        assert!(clipped.is_empty());
        assert_eq!(st.code, StatusCode::Unavailable);
        assert!(st.message().contains("requested start"));
    }

    #[test]
    fn different_session_days_warn_but_keep_data() {
        let mut st = status();
        let clipped = clip_to_window(
            session(17),
            &Window::between(at(16, 9, 30), at(18, 16, 0)),
            &mut st,
        );
        assert_eq!(clipped.len(), 391);
        assert_eq!(st.messages.len(), 2);
        assert!(st.is_ok());
    }

    #[test]
    fn empty_input_is_reported() {
        let mut st = status();
        let clipped = clip_to_window(BarTable::empty("SQ", "1min"), &Window::unbounded(), &mut st);
        assert!(clipped.is_empty());
        assert_eq!(st.code, StatusCode::Unavailable);
    }
}
