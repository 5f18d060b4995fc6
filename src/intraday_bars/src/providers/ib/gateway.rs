//! The seam between the adapter and TWS.
//!
//! [`TwsGateway`] drives the `ibapi` async client; tests swap in their own
//! [`HistoricalGateway`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use ibapi::{
    Client,
    contracts::{Contract, SecurityType},
    market_data::{
        TradingHours,
        historical::{self, BarSize, ToDuration, WhatToShow},
    },
};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::{
    config::IbConfig,
    models::bar::{Bar, coerce_volume},
};

use super::params::{HistoricalQuery, Lookback};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("could not connect to TWS at {address}: {message}")]
    Connect { address: String, message: String },

    /// An error message TWS sent back for the request.
    #[error("TWS error {code}: {message}")]
    Message { code: i32, message: String },

    #[error("{0}")]
    Client(String),
}

impl From<ibapi::Error> for GatewayError {
    fn from(e: ibapi::Error) -> Self {
        match e {
            ibapi::Error::Message(code, message) => Self::Message { code, message },
            other => Self::Client(other.to_string()),
        }
    }
}

/// Something that answers one historical bar query.
#[async_trait]
pub trait HistoricalGateway: Send + Sync {
    /// Bars in exchange-local time, oldest first.
    async fn historical_bars(&self, query: &HistoricalQuery) -> Result<Vec<Bar>, GatewayError>;
}

/// A fresh `ibapi` connection per query.
pub struct TwsGateway {
    address: String,
    client_id: i32,
}

impl TwsGateway {
    pub fn new(config: &IbConfig) -> Self {
        Self {
            address: config.address(),
            client_id: config.client_id,
        }
    }
}

#[async_trait]
impl HistoricalGateway for TwsGateway {
    async fn historical_bars(&self, query: &HistoricalQuery) -> Result<Vec<Bar>, GatewayError> {
        let bar_size = bar_size(&query.bar_size)
            .ok_or_else(|| GatewayError::Client(format!("unsupported bar size {:?}", query.bar_size)))?;
        let end = OffsetDateTime::from_unix_timestamp(query.end.timestamp())
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        let client = Client::connect(&self.address, self.client_id)
            .await
            .map_err(|e| GatewayError::Connect {
                address: self.address.clone(),
                message: e.to_string(),
            })?;
        debug!(
            address = %self.address,
            symbol = %query.symbol,
            bar_size = %query.bar_size,
            lookback = ?query.lookback,
            "requesting historical bars"
        );

        let contract = Contract {
            symbol: query.symbol.as_str().into(),
            security_type: SecurityType::Stock,
            exchange: "SMART".into(),
            currency: "USD".into(),
            ..Contract::default()
        };
        let data = client
            .historical_data(
                &contract,
                Some(end),
                duration(query.lookback),
                bar_size,
                Some(WhatToShow::Trades),
                TradingHours::Regular,
            )
            .await?;

        let mut bars = Vec::with_capacity(data.bars.len());
        for bar in &data.bars {
            match bar_time(bar.date, query) {
                Some(timestamp) => bars.push(Bar::new(
                    timestamp,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    coerce_volume(bar.volume),
                )),
                None => warn!(date = %bar.date, "skipping bar with an out-of-range date"),
            }
        }
        Ok(bars)
    }
}

fn bar_size(label: &str) -> Option<BarSize> {
    Some(match label {
        "1 secs" => BarSize::Sec,
        "5 secs" => BarSize::Sec5,
        "15 secs" => BarSize::Sec15,
        "30 secs" => BarSize::Sec30,
        "1 min" => BarSize::Min,
        "2 mins" => BarSize::Min2,
        "3 mins" => BarSize::Min3,
        "5 mins" => BarSize::Min5,
        "15 mins" => BarSize::Min15,
        "20 mins" => BarSize::Min20,
        "30 mins" => BarSize::Min30,
        "1 hour" => BarSize::Hour,
        "2 hours" => BarSize::Hour2,
        "3 hours" => BarSize::Hour3,
        "4 hours" => BarSize::Hour4,
        "8 hours" => BarSize::Hour8,
        "1 day" => BarSize::Day,
        "1 week" => BarSize::Week,
        "1 month" => BarSize::Month,
        _ => return None,
    })
}

fn duration(lookback: Lookback) -> historical::Duration {
    match lookback {
        Lookback::Days(n) => n.days(),
        Lookback::Years(n) => n.years(),
    }
}

/// Intraday bars move to exchange wall time; daily and longer bars keep
/// their calendar date at midnight.
fn bar_time(date: OffsetDateTime, query: &HistoricalQuery) -> Option<NaiveDateTime> {
    if query.daily {
        let day = date.date();
        return Some(
            NaiveDate::from_yo_opt(day.year(), u32::from(day.ordinal()))?.and_time(NaiveTime::MIN),
        );
    }
    let utc = DateTime::from_timestamp(date.unix_timestamp(), 0)?;
    Some(utc.with_timezone(&query.time_zone).naive_local())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ib::VOCABULARY;
    use chrono::{TimeZone, Utc};
    use time::UtcOffset;

    fn query(daily: bool) -> HistoricalQuery {
        HistoricalQuery {
            symbol: "SQ".into(),
            end: Utc.with_ymd_and_hms(2019, 1, 17, 21, 0, 0).unwrap(),
            lookback: Lookback::Days(1),
            bar_size: if daily { "1 day" } else { "5 mins" }.into(),
            time_zone: chrono_tz::America::New_York,
            daily,
        }
    }

    fn local(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 17)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn every_vocabulary_label_has_a_bar_size() {
        for raw in [
            "1 secs", "5 secs", "15 secs", "30 secs", "1 min", "2 mins", "3 mins", "5 mins",
            "15 mins", "20 mins", "30 mins", "1 hour", "2 hours", "3 hours", "4 hours", "8 hours",
            "1 day", "1 week", "1 month",
        ] {
            let token = VOCABULARY.normalize(raw);
            assert_eq!(token.label(), raw);
            assert!(bar_size(token.label()).is_some(), "{raw}");
        }
        assert!(bar_size("10 mins").is_none());
    }

    #[test]
    fn intraday_bar_times_land_in_exchange_time() {
        // 14:30 UTC is 09:30 in New York in January.
        let date = OffsetDateTime::from_unix_timestamp(
            Utc.with_ymd_and_hms(2019, 1, 17, 14, 30, 0).unwrap().timestamp(),
        )
        .unwrap();
        assert_eq!(bar_time(date, &query(false)), Some(local(9, 30)));
    }

    #[test]
    fn daily_bars_keep_their_calendar_date() {
        // A bare date parsed as midnight UTC would read 19:00 the day before
        // in New York; the date is kept as parsed instead.
        let midnight_east = OffsetDateTime::from_unix_timestamp(
            Utc.with_ymd_and_hms(2019, 1, 17, 5, 0, 0).unwrap().timestamp(),
        )
        .unwrap()
        .to_offset(UtcOffset::from_hms(-5, 0, 0).unwrap());
        assert_eq!(bar_time(midnight_east, &query(true)), Some(local(0, 0)));

        let midnight_utc = OffsetDateTime::from_unix_timestamp(
            Utc.with_ymd_and_hms(2019, 1, 17, 0, 0, 0).unwrap().timestamp(),
        )
        .unwrap();
        assert_eq!(bar_time(midnight_utc, &query(true)), Some(local(0, 0)));
    }

    #[test]
    fn tws_messages_keep_their_code() {
        let err = GatewayError::from(ibapi::Error::Message(
            162,
            "Historical Market Data Service error message:HMDS query returned no data".into(),
        ));
        assert!(matches!(err, GatewayError::Message { code: 162, .. }));
        assert!(err.to_string().starts_with("TWS error 162"));
    }
}
