use async_trait::async_trait;
use chrono::TimeDelta;
use indexmap::IndexMap;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use snafu::{OptionExt, ResultExt};
use tracing::{info, warn};

use crate::{
    clip::clip_to_window,
    config::AlphaVantageConfig,
    models::{bar_table::BarTable, interval::IntervalVocabulary, request_params::BarsRequest},
    providers::{
        ApiSnafu, BarProvider, ClientBuildSnafu, DecodeSnafu, MissingCredentialSnafu,
        ProviderError, ProviderInitError, ProviderKind,
        alpha_vantage::{
            params::{VOCABULARY, construct_params},
            response::{Payload, to_bar},
        },
        http::get_json,
        inverted_window, refused,
    },
    session::Session,
    status::{BarResponse, ProviderStatus},
};

const KIND: ProviderKind = ProviderKind::AlphaVantage;

pub struct AlphaVantageProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl AlphaVantageProvider {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Result<Self, ProviderInitError> {
        let client = Client::builder().build().context(ClientBuildSnafu)?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
        })
    }

    /// Creates a provider from the `[alpha_vantage]` section or
    /// `ALPHAVANTAGE_API_KEY`.
    pub fn from_config(config: &AlphaVantageConfig) -> Result<Self, ProviderInitError> {
        let api_key = config.api_key.as_ref().context(MissingCredentialSnafu {
            provider: KIND,
            variable: "ALPHAVANTAGE_API_KEY",
        })?;
        Self::new(
            SecretString::new(api_key.expose_secret().into()),
            config.base_url.clone(),
        )
    }
}

#[async_trait]
impl BarProvider for AlphaVantageProvider {
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

        let params = construct_params(&resolved, &self.api_key);
        let url = format!("{}/query", self.base_url.trim_end_matches('/'));
        let raw: IndexMap<String, Value> =
            get_json(&self.client, &url, &params, &["apikey"]).await?;

        let payload = Payload::classify(raw).map_err(|e| {
            DecodeSnafu {
                message: e.to_string(),
            }
            .build()
        })?;

        let (meta, rows) = match payload {
            Payload::Error(message) => return ApiSnafu { message }.fail(),
            Payload::Throttled(message) => {
                let until = if message.contains("per day") || message.contains("daily") {
                    session.next_local_midnight()
                } else {
                    session.now_utc() + TimeDelta::minutes(1)
                };
                session.mark_limit_reached(KIND, until);
                return Ok(refused(KIND, &resolved, message));
            }
            Payload::Series { meta, rows } => (meta, rows),
        };

        let mut status = ProviderStatus::ok(KIND).with_meta(meta);
        let mut bars = Vec::with_capacity(rows.len());
        for (key, row) in rows {
            match to_bar(&key, row) {
                Ok(bar) => bars.push(bar),
                Err(e) => warn!(provider = %KIND, "skipping row: {e}"),
            }
        }

        // Rows arrive newest first; the table sorts them.
        let table = BarTable::new(&resolved.symbol, resolved.interval.label(), bars);
        let table = clip_to_window(table, &resolved.window(), &mut status);

        info!(provider = %KIND, symbol = %resolved.symbol, bars = table.len(), "fetched bars");
        Ok(BarResponse::new(status, table))
    }
}
