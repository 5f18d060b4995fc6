use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use tracing::info;

use crate::{
    clip::clip_to_window,
    config::IexConfig,
    models::{
        bar::Bar, bar_table::BarTable, interval::IntervalVocabulary, request_params::BarsRequest,
    },
    providers::{
        BarProvider, ClientBuildSnafu, ProviderError, ProviderInitError, ProviderKind,
        http::get_json,
        iex::{
            params::{
                MINUTE_HORIZON_DAYS, VOCABULARY, beyond_minute_horizon, construct_params,
                daily_range, minute_range,
            },
            response::IexRow,
        },
        inverted_window, refused,
    },
    session::Session,
    status::{BarResponse, ProviderStatus},
};

const KIND: ProviderKind = ProviderKind::Iex;

pub struct IexProvider {
    client: Client,
    token: Option<SecretString>,
    base_url: String,
}

impl IexProvider {
    pub fn new(token: Option<SecretString>, base_url: impl Into<String>) -> Result<Self, ProviderInitError> {
        let client = Client::builder().build().context(ClientBuildSnafu)?;
        Ok(Self {
            client,
            token,
            base_url: base_url.into(),
        })
    }

    /// The legacy endpoints need no token; one is forwarded when configured.
    pub fn from_config(config: &IexConfig) -> Result<Self, ProviderInitError> {
        let token = config
            .token
            .as_ref()
            .map(|t| SecretString::new(t.expose_secret().into()));
        Self::new(token, config.base_url.clone())
    }
}

#[async_trait]
impl BarProvider for IexProvider {
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
        let today = session.local_now().date();
        let resolved = request.resolve(session.local_now(), &VOCABULARY);
        if let Some(response) = inverted_window(KIND, &resolved) {
            return Ok(response);
        }

        let mut status = ProviderStatus::ok(KIND);
        let range = if resolved.interval.is_daily_or_longer() {
            let (range, covered) = daily_range(resolved.start.date(), today);
            if !covered {
                status.warn(format!(
                    "requested start {} is beyond the 5 year daily history",
                    resolved.start.date()
                ));
            }
            range.to_string()
        } else {
            let day = resolved.start.date();
            if beyond_minute_horizon(day, today) {
                status.mark_unavailable(format!(
                    "minute data is only available for the trailing {MINUTE_HORIZON_DAYS} days; {day} is too old"
                ));
                return Ok(BarResponse::new(
                    status,
                    BarTable::empty(&resolved.symbol, resolved.interval.label()),
                ));
            }
            if resolved.end.date() != day {
                status.warn(format!(
                    "minute data is fetched one session at a time; only {day} is returned"
                ));
            }
            minute_range(day, today)
        };

        if let Err(message) = session.admit(KIND) {
            return Ok(refused(KIND, &resolved, message));
        }

        let params = construct_params(&resolved, self.token.as_ref());
        let url = format!(
            "{}/stock/{}/chart/{range}",
            self.base_url.trim_end_matches('/'),
            resolved.symbol
        );
        let rows: Vec<IexRow> = get_json(&self.client, &url, &params, &["token"]).await?;

        let bars: Vec<Bar> = rows.into_iter().filter_map(IexRow::into_bar).collect();
        let table = BarTable::new(&resolved.symbol, resolved.interval.label(), bars);
        let table = clip_to_window(table, &resolved.window(), &mut status);

        info!(provider = %KIND, symbol = %resolved.symbol, bars = table.len(), "fetched bars");
        Ok(BarResponse::new(status, table))
    }
}
