use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{
    calendar::{MARKET_OPEN, last_business_day, previous_business_day},
    models::{
        interval::{IntervalRequest, IntervalToken, IntervalVocabulary},
        window::Window,
    },
};

/// Vendor-agnostic parameters for one intraday bar pull.
///
/// This is the standard input for every
/// [`BarProvider`](crate::providers::BarProvider). Each provider normalizes
/// the interval into its own vocabulary and fills in missing window bounds
/// with [`BarsRequest::resolve`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BarsRequest {
    /// Ticker, e.g. `"SQ"`.
    pub symbol: String,

    /// Requested range. Both bounds inclusive; either may be open.
    #[serde(default)]
    pub window: Window,

    /// Candle length as the user typed it. `None` means the provider's smallest.
    #[serde(default)]
    pub interval: Option<IntervalRequest>,
}

impl BarsRequest {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            window: Window::default(),
            interval: None,
        }
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    pub fn with_interval(mut self, interval: impl Into<IntervalRequest>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    /// Fills in defaults against `now` (vendor-local):
    ///
    /// - no `end` means `now`,
    /// - no `start` means the market open of the session `end` falls in, or
    ///   the previous session when `end` is before the open,
    /// - for daily and longer candles that default start is midnight, since
    ///   vendors stamp those bars with the bare date.
    pub fn resolve(&self, now: NaiveDateTime, vocabulary: &IntervalVocabulary) -> ResolvedRequest {
        let interval = vocabulary.normalize_opt(self.interval.as_ref());
        let end = self.window.end.unwrap_or(now);
        let start = self.window.start.unwrap_or_else(|| {
            let session = if end.time() < MARKET_OPEN {
                previous_business_day(end.date())
            } else {
                last_business_day(end.date())
            };
            if interval.is_daily_or_longer() {
                session.and_time(NaiveTime::MIN)
            } else {
                session.and_time(MARKET_OPEN)
            }
        });
        ResolvedRequest {
            symbol: self.symbol.trim().to_uppercase(),
            start,
            end,
            interval,
            requested: self.window,
        }
    }
}

/// A request with every default applied, ready for a vendor call.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRequest {
    pub symbol: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub interval: IntervalToken,
    /// The window exactly as the caller asked for it.
    pub requested: Window,
}

impl ResolvedRequest {
    /// The window the response gets clipped to.
    ///
    /// Daily and longer bars are clipped by date: both bounds drop to
    /// midnight so the bar stamped with the start or end date is kept.
    pub fn window(&self) -> Window {
        if self.interval.is_daily_or_longer() {
            Window::between(
                self.start.date().and_time(NaiveTime::MIN),
                self.end.date().and_time(NaiveTime::MIN),
            )
        } else {
            Window::between(self.start, self.end)
        }
    }
}
