//! Price overlays computed over a [`BarTable`](crate::models::bar_table::BarTable).
//!
//! Every series lines up index for index with the bars; `None` marks a point
//! with too little history to have a value.

use serde::Deserialize;

use crate::{calendar::MARKET_OPEN, models::bar::Bar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AverageKind {
    Sma,
    #[default]
    Ema,
}

/// One moving average line on the price pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MovingAverage {
    pub period: u32,
    #[serde(default)]
    pub kind: AverageKind,
}

impl MovingAverage {
    pub const fn ema(period: u32) -> Self {
        Self {
            period,
            kind: AverageKind::Ema,
        }
    }

    pub const fn sma(period: u32) -> Self {
        Self {
            period,
            kind: AverageKind::Sma,
        }
    }

    pub fn label(&self) -> String {
        match self.kind {
            AverageKind::Sma => format!("SMA {}", self.period),
            AverageKind::Ema => format!("EMA {}", self.period),
        }
    }

    pub fn compute(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let period = self.period as usize;
        match self.kind {
            AverageKind::Sma => sma(closes, period),
            AverageKind::Ema => ema(closes, period),
        }
    }
}

/// Mean of the trailing `period` closes.
pub fn sma(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }
    let mut out = Vec::with_capacity(closes.len());
    let mut sum = 0.0;
    for (i, close) in closes.iter().enumerate() {
        sum += close;
        if i >= period {
            sum -= closes[i - period];
        }
        out.push((i + 1 >= period).then(|| sum / period as f64));
    }
    out
}

/// Exponential average with `alpha = 2 / (period + 1)`, seeded with the first
/// close. Values before the `period`-th close are withheld.
pub fn ema(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; closes.len()];
    }
    let alpha = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(closes.len());
    let mut running: Option<f64> = None;
    for (i, &close) in closes.iter().enumerate() {
        let next = match running {
            Some(prev) => alpha * close + (1.0 - alpha) * prev,
            None => close,
        };
        running = Some(next);
        out.push((i + 1 >= period).then_some(next));
    }
    out
}

/// Volume weighted typical price, accumulated from the open of the last
/// session in `bars`. Earlier bars, and bars before any volume trades, have
/// no value.
pub fn vwap(bars: &[Bar]) -> Vec<Option<f64>> {
    let Some(last) = bars.last() else {
        return Vec::new();
    };
    let begin = last.timestamp.date().and_time(MARKET_OPEN);

    let mut volume = 0.0;
    let mut weighted = 0.0;
    bars.iter()
        .map(|bar| {
            if bar.timestamp < begin {
                return None;
            }
            let v = bar.volume as f64;
            volume += v;
            weighted += v * (bar.high + bar.low + bar.close) / 3.0;
            (volume > 0.0).then(|| weighted / volume)
        })
        .collect()
}
