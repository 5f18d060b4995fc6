//! An ordered run of bars for one symbol and one interval.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::models::bar::Bar;

/// Represents one symbol over one contiguous pull of bars.
///
/// Bars are unique and strictly increasing by timestamp. Constructors enforce
/// that, so a table never needs re-sorting downstream. Tables are created fresh
/// per request and handed to the caller; slicing consumes the table and
/// returns a new one rather than mutating in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarTable {
    symbol: String,
    interval: String,
    bars: Vec<Bar>,
}

impl BarTable {
    /// Builds a table from bars in any order.
    ///
    /// Sorts ascending by timestamp and drops repeated timestamps, keeping the
    /// first occurrence. Some vendors (Alpha Vantage) deliver newest-first.
    pub fn new(symbol: impl Into<String>, interval: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            bars,
        }
    }

    /// A table with no rows, used for quota and unavailability results.
    pub fn empty(symbol: impl Into<String>, interval: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            interval: interval.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The provider's interval label the bars were requested with.
    pub fn interval(&self) -> &str {
        &self.interval
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.first().map(|b| b.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<NaiveDateTime> {
        self.bars.last().map(|b| b.timestamp)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }

    /// Keeps bars with `timestamp >= start`.
    pub fn since(mut self, start: NaiveDateTime) -> Self {
        let cut = self.bars.partition_point(|b| b.timestamp < start);
        self.bars.drain(..cut);
        self
    }

    /// Keeps bars with `timestamp <= end`.
    pub fn until(mut self, end: NaiveDateTime) -> Self {
        let cut = self.bars.partition_point(|b| b.timestamp <= end);
        self.bars.truncate(cut);
        self
    }

    /// Drops every row while keeping symbol and interval.
    pub fn cleared(mut self) -> Self {
        self.bars.clear();
        self
    }
}

impl<'a> IntoIterator for &'a BarTable {
    type Item = &'a Bar;
    type IntoIter = std::slice::Iter<'a, Bar>;

    fn into_iter(self) -> Self::IntoIter {
        self.bars.iter()
    }
}
