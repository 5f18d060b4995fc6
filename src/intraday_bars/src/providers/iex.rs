//! IEX chart API adapter.
//!
//! Minute bars come one session at a time and only for the trailing 30
//! calendar days. Daily bars come in fixed ranges (`1m` through `5y`).

pub mod params;
pub mod provider;
pub mod response;

pub use params::VOCABULARY;
pub use provider::IexProvider;
