//! Alpha Vantage `TIME_SERIES_*` adapter.
//!
//! Intraday history reaches back about a week. The free tier allows 5 calls a
//! minute and 500 a day; past that the vendor answers 200 with a one-key
//! greeting (`"Note"` or `"Information"`) instead of data.

pub mod params;
pub mod provider;
pub mod response;

pub use params::VOCABULARY;
pub use provider::AlphaVantageProvider;
