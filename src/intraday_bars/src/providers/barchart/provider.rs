use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use snafu::{OptionExt, ResultExt};
use tracing::info;

use crate::{
    clip::clip_to_window,
    config::BarchartConfig,
    models::{
        bar::Bar, bar_table::BarTable, interval::IntervalVocabulary, request_params::BarsRequest,
    },
    providers::{
        ApiSnafu, BarProvider, ClientBuildSnafu, MissingCredentialSnafu, ProviderError,
        ProviderInitError, ProviderKind,
        barchart::{
            params::{VOCABULARY, construct_params},
            response::BarchartResponse,
        },
        http::get_json,
        inverted_window, refused,
    },
    session::Session,
    status::{BarResponse, ProviderStatus},
};

const KIND: ProviderKind = ProviderKind::Barchart;

pub struct BarchartProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl BarchartProvider {
    pub fn new(api_key: SecretString, base_url: impl Into<String>) -> Result<Self, ProviderInitError> {
        let client = Client::builder().build().context(ClientBuildSnafu)?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
        })
    }

    /// Creates a provider from the `[barchart]` section. The key must be set
    /// there or in `BARCHART_API_KEY`.
    pub fn from_config(config: &BarchartConfig) -> Result<Self, ProviderInitError> {
        let api_key = config.api_key.as_ref().context(MissingCredentialSnafu {
            provider: KIND,
            variable: "BARCHART_API_KEY",
        })?;
        Self::new(
            SecretString::new(api_key.expose_secret().into()),
            config.base_url.clone(),
        )
    }
}

#[async_trait]
impl BarProvider for BarchartProvider {
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
        let url = format!("{}/getHistory.json", self.base_url.trim_end_matches('/'));
        let body: BarchartResponse = get_json(&self.client, &url, &params, &["apikey"]).await?;

        let empty = || BarTable::empty(&resolved.symbol, resolved.interval.label());
        match body.status.code {
            200 | 204 => {}
            _ if body.is_quota_refusal() => {
                session.mark_limit_reached(KIND, session.next_local_midnight());
                let status = ProviderStatus::quota_exceeded(KIND, body.status.message.clone())
                    .with_meta(body.meta());
                return Ok(BarResponse::new(status, empty()));
            }
            code => {
                return ApiSnafu {
                    message: format!("{code}: {}", body.status.message),
                }
                .fail();
            }
        }

        let mut status = ProviderStatus::ok(KIND).with_meta(body.meta());
        let bars: Vec<Bar> = body
            .results
            .unwrap_or_default()
            .into_iter()
            .map(Bar::from)
            .collect();
        let table = BarTable::new(&resolved.symbol, resolved.interval.label(), bars);
        let table = clip_to_window(table, &resolved.window(), &mut status);

        info!(provider = %KIND, symbol = %resolved.symbol, bars = table.len(), "fetched bars");
        Ok(BarResponse::new(status, table))
    }
}
