//! Interactive Brokers adapter, built on the `ibapi` client.
//!
//! Requires a running TWS or IB Gateway with API access enabled. Each fetch
//! connects, asks for one block of historical bars and drops the client. IB
//! paces historical requests at 60 per ten minutes and answers with error 162
//! when a caller goes faster.

pub mod gateway;
pub mod params;
pub mod provider;

pub use gateway::{GatewayError, HistoricalGateway, TwsGateway};
pub use params::{HistoricalQuery, Lookback, VOCABULARY};
pub use provider::IbProvider;
