//! The one GET every HTTP adapter makes.

use reqwest::{Client, Url};
use serde::{Serialize, de::DeserializeOwned};
use snafu::ResultExt;
use tracing::debug;

use crate::providers::{DecodeSnafu, HttpStatusSnafu, ProviderError, ReqwestSnafu};

/// Sends a GET with `query` and decodes a 2xx JSON body into `T`.
///
/// Query parameters named in `secret_keys` are masked in the debug log line.
pub(crate) async fn get_json<Q, T>(
    client: &Client,
    url: &str,
    query: &Q,
    secret_keys: &[&str],
) -> Result<T, ProviderError>
where
    Q: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let request = client.get(url).query(query).build().context(ReqwestSnafu)?;
    debug!("GET {}", redacted(request.url(), secret_keys));

    let response = client.execute(request).await.context(ReqwestSnafu)?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown API error".to_string());
        return HttpStatusSnafu {
            status: status.as_u16(),
            body,
        }
        .fail();
    }

    let text = response.text().await.context(ReqwestSnafu)?;
    serde_json::from_str(&text).map_err(|e| {
        DecodeSnafu {
            message: format!("{e} in body starting {:?}", preview(&text)),
        }
        .build()
    })
}

fn redacted(url: &Url, secret_keys: &[&str]) -> String {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if secret_keys.contains(&k.as_ref()) {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    let mut shown = url.clone();
    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(120) {
        Some((i, _)) => &text[..i],
        None => text,
    }
}
