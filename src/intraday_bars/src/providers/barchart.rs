//! Barchart OnDemand `getHistory` adapter.
//!
//! The free tier only exposes `getHistory` and `getQuote` and ignores any end
//! bound, so the end of the window is always applied locally. The current
//! session is only published about 15 minutes after the close; until then
//! Barchart hands back the previous day and the clipper warns about it.

pub mod params;
pub mod provider;
pub mod response;

pub use params::VOCABULARY;
pub use provider::BarchartProvider;
