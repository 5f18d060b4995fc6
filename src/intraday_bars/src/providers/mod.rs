//! Provider abstraction for intraday bar vendors.
//!
//! This module defines the [`BarProvider`] trait, the single interface every
//! vendor adapter (Barchart, Alpha Vantage, IEX, Interactive Brokers)
//! implements. Callers pick a provider at runtime through
//! [`build_provider`] or [`first_available`] and talk to it as a
//! `Box<dyn BarProvider>`.
//!
//! Every adapter follows the same contract:
//!
//! - resolve the request against the session clock and the vendor's interval
//!   vocabulary,
//! - ask the [`Session`] for admission and answer with a quota status if it
//!   refuses,
//! - make exactly one vendor call, no retries,
//! - clip the result to the requested window.
//!
//! Quota and "no data" are reported through [`BarResponse::status`]. Only
//! transport failures and vendor error payloads come back as
//! [`ProviderError`].
//!
//! # Example
//!
//! ```no_run
//! use intraday_bars::{
//!     config::Config,
//!     models::request_params::BarsRequest,
//!     providers::{ProviderKind, build_provider},
//!     session::Session,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let provider = build_provider(ProviderKind::AlphaVantage, &config)?;
//! let session = Session::new();
//! let response = provider
//!     .fetch_bars(&session, &BarsRequest::new("SQ").with_interval(5))
//!     .await?;
//! println!("{} bars", response.table.len());
//! # Ok(())
//! # }
//! ```

pub mod alpha_vantage;
pub mod barchart;
mod http;
pub mod ib;
pub mod iex;

use std::{fmt, str::FromStr, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use snafu::{Backtrace, Snafu};
use thiserror::Error;
use tracing::debug;

use crate::{
    config::Config,
    models::{
        bar_table::BarTable,
        interval::IntervalVocabulary,
        request_params::{BarsRequest, ResolvedRequest},
    },
    session::Session,
    status::{BarResponse, ProviderStatus},
};

/// The vendors this crate can pull bars from.
///
/// Serialized as the short codes used in configuration (`bc`, `av`, `iex`, `ib`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderKind {
    #[serde(rename = "bc", alias = "barchart")]
    Barchart,
    #[serde(rename = "av", alias = "alphavantage", alias = "alpha_vantage")]
    AlphaVantage,
    #[serde(rename = "iex")]
    Iex,
    #[serde(rename = "ib")]
    Ib,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [Self::Barchart, Self::AlphaVantage, Self::Iex, Self::Ib];

    pub fn code(self) -> &'static str {
        match self {
            Self::Barchart => "bc",
            Self::AlphaVantage => "av",
            Self::Iex => "iex",
            Self::Ib => "ib",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Barchart => "Barchart",
            Self::AlphaVantage => "Alpha Vantage",
            Self::Iex => "IEX",
            Self::Ib => "Interactive Brokers",
        }
    }

    /// The vendor's published usage limits, for display.
    pub fn limits(self) -> &'static str {
        match self {
            Self::Barchart => "150 getHistory queries per day; the day's data lags until ~15 minutes after the close",
            Self::AlphaVantage => "5 calls per minute, 500 per day; intraday goes back about one week",
            Self::Iex => "minute data for the trailing 30 calendar days; daily data up to 5 years",
            Self::Ib => "60 historical data requests per 10 minutes; requires a running TWS or IB Gateway",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error)]
#[error("Unknown provider {0:?}; expected one of bc, av, iex, ib")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bc" | "barchart" => Ok(Self::Barchart),
            "av" | "alphavantage" | "alpha_vantage" => Ok(Self::AlphaVantage),
            "iex" => Ok(Self::Iex),
            "ib" | "tws" => Ok(Self::Ib),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// Trait for fetching intraday bars from one vendor.
///
/// Implementations are cheap to hold and safe to share; all per-call state
/// lives in the arguments.
#[async_trait]
pub trait BarProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// The interval tokens this vendor accepts.
    fn vocabulary(&self) -> &IntervalVocabulary;

    /// Fetches bars for `request`, clipped to its window.
    ///
    /// # Returns
    ///
    /// * `Ok(BarResponse)` - bars plus status. Quota refusals and empty
    ///   windows land here, not in `Err`.
    /// * `Err(ProviderError)` - transport failure, non-2xx response, vendor
    ///   error payload or timeout.
    async fn fetch_bars(
        &self,
        session: &Session,
        request: &BarsRequest,
    ) -> Result<BarResponse, ProviderError>;

    /// Whether the vendor can be reached right now. HTTP vendors assume yes.
    async fn is_available(&self) -> bool {
        true
    }
}

/// Errors that can occur during the creation of a provider instance.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// No API key in the config file or the environment.
    #[snafu(display("No credential configured for {provider}; set {variable} or the config file"))]
    MissingCredential {
        provider: ProviderKind,
        variable: &'static str,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `BarProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an HTTP request (connect failure, body read).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The vendor answered with a non-2xx status.
    #[snafu(display("HTTP {status}: {body}"))]
    HttpStatus {
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// The vendor's payload carried an explicit error (bad symbol, bad key).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The payload did not have the expected shape.
    #[snafu(display("Failed to decode response: {message}"))]
    Decode {
        message: String,
        backtrace: Backtrace,
    },

    /// TWS / IB Gateway could not be reached or rejected the request.
    #[snafu(display("TWS request failed: {source}"))]
    Gateway {
        source: ib::GatewayError,
        backtrace: Backtrace,
    },

    /// No complete response arrived in time.
    #[snafu(display("No complete response within {after:?}"))]
    Timeout {
        after: Duration,
        backtrace: Backtrace,
    },

    /// An error during provider configuration or initialization.
    #[snafu(display("Provider initialization error: {source}"))]
    Init {
        #[snafu(backtrace)]
        source: ProviderInitError,
    },
}

/// Builds the adapter for `kind` from `config`.
pub fn build_provider(
    kind: ProviderKind,
    config: &Config,
) -> Result<Box<dyn BarProvider>, ProviderInitError> {
    let provider: Box<dyn BarProvider> = match kind {
        ProviderKind::Barchart => Box::new(barchart::BarchartProvider::from_config(&config.barchart)?),
        ProviderKind::AlphaVantage => Box::new(
            alpha_vantage::AlphaVantageProvider::from_config(&config.alpha_vantage)?,
        ),
        ProviderKind::Iex => Box::new(iex::IexProvider::from_config(&config.iex)?),
        ProviderKind::Ib => Box::new(ib::IbProvider::from_config(&config.ib)),
    };
    Ok(provider)
}

/// The first provider in `config.preferences` that can be built, is not
/// marked as over its limit in `session`, and reports itself reachable.
pub async fn first_available(config: &Config, session: &Session) -> Option<Box<dyn BarProvider>> {
    for kind in &config.preferences {
        if session.is_limit_reached(*kind) {
            debug!(provider = %kind, "skipping: limit reached");
            continue;
        }
        match build_provider(*kind, config) {
            Ok(provider) if provider.is_available().await => return Some(provider),
            Ok(_) => debug!(provider = %kind, "skipping: not reachable"),
            Err(e) => debug!(provider = %kind, "skipping: {e}"),
        }
    }
    None
}

/// Short-circuits a window that cannot contain any bar (`start` after `end`),
/// so no vendor call or quota is spent on it.
pub(crate) fn inverted_window(kind: ProviderKind, request: &ResolvedRequest) -> Option<BarResponse> {
    if request.start <= request.end {
        return None;
    }
    let mut status = ProviderStatus::ok(kind);
    status.mark_unavailable(format!(
        "requested start ({}) is after the end ({}); nothing to fetch",
        request.start, request.end
    ));
    Some(BarResponse::new(
        status,
        BarTable::empty(&request.symbol, request.interval.label()),
    ))
}

/// The response for a request the session refused to let out.
pub(crate) fn refused(kind: ProviderKind, request: &ResolvedRequest, message: String) -> BarResponse {
    BarResponse::quota_exceeded(
        kind,
        BarTable::empty(&request.symbol, request.interval.label()),
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusCode;

    struct StaticProvider;

    #[async_trait]
    impl BarProvider for StaticProvider {
        fn kind(&self) -> ProviderKind {
            ProviderKind::Iex
        }

        fn vocabulary(&self) -> &IntervalVocabulary {
            &iex::VOCABULARY
        }

        async fn fetch_bars(
            &self,
            session: &Session,
            request: &BarsRequest,
        ) -> Result<BarResponse, ProviderError> {
            let resolved = request.resolve(session.local_now(), self.vocabulary());
            Ok(refused(self.kind(), &resolved, "no".into()))
        }
    }

    #[test]
    fn short_codes_round_trip() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.code().parse::<ProviderKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.code());
        }
        assert_eq!("AlphaVantage".parse::<ProviderKind>().unwrap(), ProviderKind::AlphaVantage);
        assert!("fh".parse::<ProviderKind>().is_err());
    }

    #[tokio::test]
    async fn trait_objects_dispatch_at_runtime() {
        let provider: Box<dyn BarProvider> = Box::new(StaticProvider);
        let response = provider
            .fetch_bars(&Session::unlimited(), &BarsRequest::new("sq"))
            .await
            .unwrap();
        assert_eq!(response.status.code, StatusCode::QuotaExceeded);
        assert_eq!(response.table.symbol(), "SQ");
        assert!(provider.is_available().await);
    }

    #[test]
    fn start_after_end_is_answered_locally() {
        let now = chrono::NaiveDate::from_ymd_opt(2019, 1, 17)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let future = now + chrono::TimeDelta::days(1);
        let resolved = BarsRequest::new("SQ")
            .with_window(crate::models::window::Window::new(Some(future), None))
            .resolve(now, &iex::VOCABULARY);
        let response = inverted_window(ProviderKind::Iex, &resolved).unwrap();
        assert_eq!(response.status.code, StatusCode::Unavailable);
        assert!(response.table.is_empty());
        assert!(!response.status.messages.is_empty());
    }

    #[test]
    fn building_without_a_key_names_the_variable() {
        let err = build_provider(ProviderKind::Barchart, &Config::default())
            .err()
            .unwrap();
        assert!(err.to_string().contains("BARCHART_API_KEY"));
        assert!(build_provider(ProviderKind::Iex, &Config::default()).is_ok());
        assert!(build_provider(ProviderKind::Ib, &Config::default()).is_ok());
    }

    #[tokio::test]
    async fn first_available_skips_limited_and_unconfigured() {
        let mut config = Config::default();
        config.preferences = vec![ProviderKind::Barchart, ProviderKind::AlphaVantage, ProviderKind::Iex];
        let session = Session::unlimited();
        session.mark_limit_reached(
            ProviderKind::Iex,
            session.now_utc() + chrono::TimeDelta::hours(1),
        );
        assert!(first_available(&config, &session).await.is_none());

        config.alpha_vantage.api_key = Some(secrecy::SecretString::new("demo".into()));
        let chosen = first_available(&config, &session).await.unwrap();
        assert_eq!(chosen.kind(), ProviderKind::AlphaVantage);
    }
}
