//! Candle-length normalization.
//!
//! Users ask for intervals loosely: `5`, `"5"`, `"5min"`, `"5 mins"`, `"d"`.
//! Each vendor understands exactly one vocabulary. [`IntervalVocabulary`]
//! maps the loose request onto that vocabulary:
//!
//! 1. a token already in the vocabulary comes back unchanged,
//! 2. a known alias maps through a fixed table,
//! 3. an integer (or numeral string) rounds down to the nearest bucket, and
//!    anything wider than the widest bucket lands on it,
//! 4. anything else logs a warning and falls back to the smallest interval.
//!
//! Normalizing never fails. Normalizing an already-normalized token is a no-op.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A loosely typed candle-length request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntervalRequest {
    Minutes(i64),
    Text(String),
}

impl From<i64> for IntervalRequest {
    fn from(value: i64) -> Self {
        Self::Minutes(value)
    }
}

impl From<i32> for IntervalRequest {
    fn from(value: i32) -> Self {
        Self::Minutes(value.into())
    }
}

impl From<u32> for IntervalRequest {
    fn from(value: u32) -> Self {
        Self::Minutes(value.into())
    }
}

impl From<&str> for IntervalRequest {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for IntervalRequest {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&IntervalToken> for IntervalRequest {
    fn from(value: &IntervalToken) -> Self {
        Self::Text(value.label.clone())
    }
}

impl fmt::Display for IntervalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minutes(m) => write!(f, "{m}"),
            Self::Text(s) => write!(f, "{s:?}"),
        }
    }
}

/// One supported interval: the vendor's label and the bar width it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub label: &'static str,
    pub seconds: u32,
}

impl Bucket {
    pub const fn secs(label: &'static str, seconds: u32) -> Self {
        Self { label, seconds }
    }

    pub const fn mins(label: &'static str, minutes: u32) -> Self {
        Self {
            label,
            seconds: minutes * 60,
        }
    }
}

/// A normalized interval, valid for exactly one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct IntervalToken {
    label: String,
    seconds: u32,
}

impl IntervalToken {
    pub fn new(label: impl Into<String>, seconds: u32) -> Self {
        Self {
            label: label.into(),
            seconds,
        }
    }

    /// The exact string the vendor expects.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Bar width in whole minutes, never less than one.
    pub fn minutes(&self) -> u32 {
        (self.seconds / 60).max(1)
    }

    /// True for daily and longer candles.
    pub fn is_daily_or_longer(&self) -> bool {
        self.seconds >= DAY_SECS
    }
}

impl fmt::Display for IntervalToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

pub const DAY_SECS: u32 = 86_400;
pub const WEEK_SECS: u32 = 7 * DAY_SECS;
pub const MONTH_SECS: u32 = 30 * DAY_SECS;

/// How integers map onto a vocabulary.
#[derive(Debug, Clone, Copy)]
enum Rounding {
    /// Round down through an ascending breakpoint table.
    Breakpoints(&'static [Bucket]),
    /// Any positive minute count is its own label (`15` -> `"15"`).
    AnyMinutes,
}

/// The set of interval tokens one vendor accepts.
#[derive(Debug, Clone, Copy)]
pub struct IntervalVocabulary {
    provider: &'static str,
    labels: &'static [Bucket],
    aliases: &'static [(&'static str, &'static str)],
    rounding: Rounding,
    fallback: Bucket,
}

impl IntervalVocabulary {
    /// A closed vocabulary. Integers round down through `breakpoints`
    /// (ascending by width); the first breakpoint is the fallback.
    pub const fn with_breakpoints(
        provider: &'static str,
        labels: &'static [Bucket],
        aliases: &'static [(&'static str, &'static str)],
        breakpoints: &'static [Bucket],
    ) -> Self {
        Self {
            provider,
            labels,
            aliases,
            rounding: Rounding::Breakpoints(breakpoints),
            fallback: breakpoints[0],
        }
    }

    /// A vocabulary where any positive minute count is valid, plus the named
    /// `labels` (daily and longer).
    pub const fn any_minutes(
        provider: &'static str,
        labels: &'static [Bucket],
        aliases: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            provider,
            labels,
            aliases,
            rounding: Rounding::AnyMinutes,
            fallback: Bucket::mins("1", 1),
        }
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// The smallest supported interval; also the fallback for bad input.
    pub fn smallest(&self) -> IntervalToken {
        token(self.fallback)
    }

    /// Maps a loose request onto this vocabulary. See the module docs.
    pub fn normalize(&self, request: impl Into<IntervalRequest>) -> IntervalToken {
        let request = request.into();
        match &request {
            IntervalRequest::Minutes(m) => self
                .round(*m)
                .unwrap_or_else(|| self.fall_back(&request)),
            IntervalRequest::Text(text) => {
                let text = text.trim();
                if let Some(found) = self.lookup(text) {
                    return found;
                }
                if let Some((_, target)) = self.aliases.iter().find(|(alias, _)| *alias == text) {
                    if let Some(found) = self.lookup(target) {
                        return found;
                    }
                }
                parse_minutes(text)
                    .and_then(|m| self.round(m))
                    .unwrap_or_else(|| self.fall_back(&request))
            }
        }
    }

    /// Like [`normalize`](Self::normalize) but an absent request quietly means
    /// the smallest interval.
    pub fn normalize_opt(&self, request: Option<&IntervalRequest>) -> IntervalToken {
        match request {
            Some(r) => self.normalize(r.clone()),
            None => self.smallest(),
        }
    }

    fn lookup(&self, label: &str) -> Option<IntervalToken> {
        if let Some(bucket) = self.labels.iter().find(|b| b.label == label) {
            return Some(token(*bucket));
        }
        match self.rounding {
            Rounding::AnyMinutes => match label.parse::<u32>() {
                // Only the canonical spelling counts as membership, so "05"
                // still goes through rounding and comes back as "5".
                Ok(m) if m > 0 && m.to_string() == label => Some(minutes_token(m)),
                _ => None,
            },
            Rounding::Breakpoints(_) => None,
        }
    }

    fn round(&self, minutes: i64) -> Option<IntervalToken> {
        match self.rounding {
            Rounding::AnyMinutes if minutes > 0 => {
                Some(minutes_token(u32::try_from(minutes).unwrap_or(u32::MAX)))
            }
            Rounding::AnyMinutes => None,
            Rounding::Breakpoints(breakpoints) => {
                let seconds = minutes.saturating_mul(60);
                breakpoints
                    .iter()
                    .rev()
                    .find(|b| i64::from(b.seconds) <= seconds)
                    .map(|b| token(*b))
            }
        }
    }

    fn fall_back(&self, request: &IntervalRequest) -> IntervalToken {
        warn!(
            provider = self.provider,
            "interval={request} is not supported; using the {} candle default",
            self.fallback.label
        );
        token(self.fallback)
    }
}

/// A numeral string as minutes; digit runs too long for `i64` saturate.
fn parse_minutes(text: &str) -> Option<i64> {
    match text.parse::<i64>() {
        Ok(m) => Some(m),
        Err(_) if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) => Some(i64::MAX),
        Err(_) => None,
    }
}

fn token(bucket: Bucket) -> IntervalToken {
    IntervalToken::new(bucket.label, bucket.seconds)
}

fn minutes_token(minutes: u32) -> IntervalToken {
    IntervalToken::new(minutes.to_string(), minutes.saturating_mul(60))
}
