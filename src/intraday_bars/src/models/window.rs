//! The requested `[start, end]` range for a data pull.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Unrecognized timestamp {input:?}; expected e.g. \"2019-01-17 09:30\" or \"20190117 09:30:00\"")]
pub struct WindowParseError {
    pub input: String,
}

/// A pair of optional bounds. A missing bound is open-ended in that direction.
///
/// Both bounds are inclusive wherever a window is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl Window {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    pub fn between(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self::new(Some(start), Some(end))
    }

    /// Fully open window: take whatever the vendor returns.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Builds a window from loosely formatted strings, see [`parse_timestamp`].
    pub fn parse(start: Option<&str>, end: Option<&str>) -> Result<Self, WindowParseError> {
        Ok(Self {
            start: start.map(parse_timestamp).transpose()?,
            end: end.map(parse_timestamp).transpose()?,
        })
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y%m%d %H:%M:%S",
    "%Y%m%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y%m%d"];

/// Parses a user-supplied timestamp.
///
/// Accepts dashed or compact dates, with or without a `T`, with or without
/// seconds. A bare date means midnight.
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, WindowParseError> {
    let s = input.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| WindowParseError {
            input: input.to_string(),
        })
}
