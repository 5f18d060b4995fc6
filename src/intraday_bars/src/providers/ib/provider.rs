use std::time::Duration;

use async_trait::async_trait;
use chrono::TimeDelta;
use snafu::ResultExt;
use tokio::{net::TcpStream, time::timeout};
use tracing::{info, warn};

use crate::{
    clip::clip_to_window,
    config::IbConfig,
    models::{bar_table::BarTable, interval::IntervalVocabulary, request_params::BarsRequest},
    providers::{
        ApiSnafu, BarProvider, GatewaySnafu, ProviderError, ProviderKind, TimeoutSnafu,
        ib::{
            gateway::{GatewayError, HistoricalGateway, TwsGateway},
            params::{HistoricalQuery, VOCABULARY},
        },
        inverted_window, refused,
    },
    session::Session,
    status::{BarResponse, ProviderStatus},
};

const KIND: ProviderKind = ProviderKind::Ib;

/// TWS reports both pacing violations and empty results under this code.
const HISTORICAL_DATA_ERROR: i32 = 162;

/// How long TWS holds a pacing violation against a client.
const PACING_PENALTY_MINUTES: i64 = 10;

#[derive(Debug, PartialEq)]
enum Rejection {
    Pacing,
    NoData,
}

fn classify(code: i32, message: &str) -> Option<Rejection> {
    if code != HISTORICAL_DATA_ERROR {
        return None;
    }
    let lower = message.to_ascii_lowercase();
    if lower.contains("pacing") {
        Some(Rejection::Pacing)
    } else if lower.contains("no data") || lower.contains("returned no") {
        Some(Rejection::NoData)
    } else {
        None
    }
}

pub struct IbProvider {
    config: IbConfig,
    gateway: Box<dyn HistoricalGateway>,
}

impl IbProvider {
    pub fn new(config: IbConfig) -> Self {
        let gateway = TwsGateway::new(&config);
        Self::with_gateway(config, gateway)
    }

    /// Uses `gateway` in place of a live TWS connection.
    pub fn with_gateway(config: IbConfig, gateway: impl HistoricalGateway + 'static) -> Self {
        Self {
            config,
            gateway: Box::new(gateway),
        }
    }

    pub fn from_config(config: &IbConfig) -> Self {
        Self::new(config.clone())
    }
}

#[async_trait]
impl BarProvider for IbProvider {
    fn kind(&self) -> ProviderKind {
        KIND
    }

    fn vocabulary(&self) -> &IntervalVocabulary {
        &VOCABULARY
    }

    async fn fetch_bars(
        &self,
        session: &Session,
        request: &BarsRequest,
    ) -> Result<BarResponse, ProviderError> {
        let resolved = request.resolve(session.local_now(), &VOCABULARY);
        if let Some(response) = inverted_window(KIND, &resolved) {
            return Ok(response);
        }
        if let Err(message) = session.admit(KIND) {
            return Ok(refused(KIND, &resolved, message));
        }

        let query = HistoricalQuery::new(&resolved, session.time_zone());
        let after = self.config.timeout();
        let reply = match timeout(after, self.gateway.historical_bars(&query)).await {
            Ok(reply) => reply,
            Err(_) => return TimeoutSnafu { after }.fail(),
        };

        let mut status = ProviderStatus::ok(KIND);
        let bars = match reply {
            Ok(bars) => bars,
            Err(GatewayError::Message { code, message }) => match classify(code, &message) {
                Some(Rejection::Pacing) => {
                    warn!(provider = %KIND, "pacing violation: {message}");
                    let until = session.now_utc() + TimeDelta::minutes(PACING_PENALTY_MINUTES);
                    session.mark_limit_reached(KIND, until);
                    return Ok(refused(KIND, &resolved, message));
                }
                Some(Rejection::NoData) => {
                    status.mark_unavailable(message);
                    return Ok(BarResponse::new(
                        status,
                        BarTable::empty(&resolved.symbol, resolved.interval.label()),
                    ));
                }
                None => {
                    return ApiSnafu {
                        message: format!("{code}: {message}"),
                    }
                    .fail();
                }
            },
            Err(source) => return Err(source).context(GatewaySnafu),
        };

        let table = BarTable::new(&resolved.symbol, resolved.interval.label(), bars);
        let table = clip_to_window(table, &resolved.window(), &mut status);

        info!(provider = %KIND, symbol = %resolved.symbol, bars = table.len(), "fetched bars");
        Ok(BarResponse::new(status, table))
    }

    /// True when something accepts connections on the configured port.
    async fn is_available(&self) -> bool {
        let connect = TcpStream::connect((self.config.host.as_str(), self.config.port));
        matches!(timeout(Duration::from_secs(1), connect).await, Ok(Ok(_)))
    }
}
