//! Intraday OHLCV bars from Barchart, Alpha Vantage, IEX and Interactive
//! Brokers, behind one [`BarProvider`](providers::BarProvider) interface.
//!
//! ```no_run
//! use intraday_bars::{
//!     config::Config,
//!     models::{request_params::BarsRequest, window::Window},
//!     providers::{ProviderKind, build_provider},
//!     session::Session,
//!     status::FetchOutcome,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::from_env()?;
//! let session = Session::new();
//! let provider = build_provider(ProviderKind::AlphaVantage, &config)?;
//! let request = BarsRequest::new("SQ")
//!     .with_window(Window::parse(Some("2019-01-17 09:30"), Some("2019-01-17 16:00"))?)
//!     .with_interval(5);
//! let outcome = FetchOutcome::from(provider.fetch_bars(&session, &request).await);
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod calendar;
#[cfg(feature = "chart")]
pub mod chart;
#[cfg(feature = "cli")]
pub mod cli;
pub mod clip;
pub mod config;
pub mod indicators;
pub mod models;
pub mod providers;
pub mod session;
pub mod status;
