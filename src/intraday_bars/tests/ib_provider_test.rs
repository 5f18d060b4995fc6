//! Drives the IB adapter against a scripted stand-in for TWS.

mod common;

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{at, session, window};
use intraday_bars::{
    config::IbConfig,
    models::{bar::Bar, request_params::BarsRequest},
    providers::{
        BarProvider, ProviderError, ProviderKind,
        ib::{GatewayError, HistoricalGateway, HistoricalQuery, IbProvider, Lookback},
    },
    status::{FetchOutcome, StatusCode},
};
use tokio::net::TcpListener;

/// What the gateway answers.
#[derive(Clone)]
enum Script {
    Bars(Vec<Bar>),
    Reject(i32, &'static str),
    Unreachable,
    Silent,
}

struct ScriptedGateway {
    script: Script,
    seen: Arc<Mutex<Vec<HistoricalQuery>>>,
}

#[async_trait]
impl HistoricalGateway for ScriptedGateway {
    async fn historical_bars(&self, query: &HistoricalQuery) -> Result<Vec<Bar>, GatewayError> {
        self.seen.lock().unwrap().push(query.clone());
        match &self.script {
            Script::Bars(bars) => Ok(bars.clone()),
            Script::Reject(code, message) => Err(GatewayError::Message {
                code: *code,
                message: message.to_string(),
            }),
            Script::Unreachable => Err(GatewayError::Connect {
                address: "127.0.0.1:7496".into(),
                message: "connection refused".into(),
            }),
            Script::Silent => {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Vec::new())
            }
        }
    }
}

fn gateway(script: Script) -> (IbProvider, Arc<Mutex<Vec<HistoricalQuery>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let provider = IbProvider::with_gateway(
        IbConfig {
            timeout_secs: 1,
            ..IbConfig::default()
        },
        ScriptedGateway {
            script,
            seen: Arc::clone(&seen),
        },
    );
    (provider, seen)
}

fn five_minute_bars() -> Vec<Bar> {
    vec![
        Bar::new(at(17, 9, 30), 63.5, 63.9, 63.1, 63.8, 1200),
        Bar::new(at(17, 9, 35), 63.8, 64.0, 63.7, 63.9, 800),
        Bar::new(at(17, 9, 40), 63.9, 64.1, 63.8, 64.0, 950),
    ]
}

#[tokio::test]
async fn test_bars_are_fetched_and_clipped() {
    let (provider, seen) = gateway(Script::Bars(five_minute_bars()));
    let request = BarsRequest::new("sq")
        .with_window(window(at(17, 9, 30), at(17, 9, 35)))
        .with_interval(7);

    let response = provider.fetch_bars(&session(), &request).await.unwrap();

    assert_eq!(response.status.code, StatusCode::Ok);
    assert_eq!(response.table.interval(), "5 mins");
    assert_eq!(response.table.len(), 2);
    assert_eq!(response.table.bars()[1].close, 63.9);
    assert_eq!(response.table.bars()[1].volume, 800);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].symbol, "SQ");
    assert_eq!(seen[0].bar_size, "5 mins");
    assert_eq!(seen[0].lookback, Lookback::Days(1));
    // 09:35 in New York is 14:35 UTC in January.
    assert_eq!(seen[0].end, Utc.with_ymd_and_hms(2019, 1, 17, 14, 35, 0).unwrap());
    assert!(!seen[0].daily);
}

#[tokio::test]
async fn test_pacing_violation_is_a_quota_refusal() {
    let (provider, _) = gateway(Script::Reject(
        162,
        "Historical Market Data Service error message:Historical data request pacing violation",
    ));
    let session = session();
    let request = BarsRequest::new("SQ").with_window(window(at(17, 9, 30), at(17, 16, 0)));

    let response = provider.fetch_bars(&session, &request).await.unwrap();

    assert_eq!(response.status.code, StatusCode::QuotaExceeded);
    assert!(response.table.is_empty());
    assert!(session.is_limit_reached(ProviderKind::Ib));

    // The penalty holds for the next request without touching the gateway.
    let again = provider.fetch_bars(&session, &request).await.unwrap();
    assert_eq!(again.status.code, StatusCode::QuotaExceeded);
}

#[tokio::test]
async fn test_no_data_is_unavailable() {
    let (provider, _) = gateway(Script::Reject(
        162,
        "Historical Market Data Service error message:HMDS query returned no data: SQ@SMART Trades",
    ));
    let request = BarsRequest::new("SQ").with_window(window(at(17, 9, 30), at(17, 16, 0)));

    let outcome = FetchOutcome::from(provider.fetch_bars(&session(), &request).await);

    assert!(matches!(outcome, FetchOutcome::Unavailable(msg) if msg.contains("returned no data")));
}

#[tokio::test]
async fn test_other_tws_errors_carry_their_code() {
    let (provider, _) = gateway(Script::Reject(200, "No security definition has been found for the request"));
    let request = BarsRequest::new("ZZZZ").with_window(window(at(17, 9, 30), at(17, 16, 0)));

    let err = provider.fetch_bars(&session(), &request).await.unwrap_err();

    assert!(matches!(err, ProviderError::Api { ref message, .. } if message.starts_with("200: ")));
}

#[tokio::test]
async fn test_silent_gateway_times_out() {
    let (provider, _) = gateway(Script::Silent);
    let request = BarsRequest::new("SQ").with_window(window(at(17, 9, 30), at(17, 16, 0)));

    let err = provider.fetch_bars(&session(), &request).await.unwrap_err();

    assert!(matches!(err, ProviderError::Timeout { after, .. } if after == Duration::from_secs(1)));
}

#[tokio::test]
async fn test_unreachable_gateway_is_a_gateway_error() {
    let (provider, _) = gateway(Script::Unreachable);

    let err = provider
        .fetch_bars(&session(), &BarsRequest::new("SQ"))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Gateway { .. }));
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn test_daily_without_a_window_returns_todays_bar() {
    let (provider, seen) = gateway(Script::Bars(vec![
        Bar::new(at(17, 0, 0), 63.0, 64.0, 62.5, 63.8, 9_100_000),
        Bar::new(at(18, 0, 0), 63.8, 64.6, 63.2, 64.2, 8_700_000),
    ]));
    let request = BarsRequest::new("SQ").with_interval("d");

    let response = provider.fetch_bars(&session(), &request).await.unwrap();

    assert_eq!(response.status.code, StatusCode::Ok);
    assert_eq!(response.table.interval(), "1 day");
    assert_eq!(response.table.len(), 1);
    assert_eq!(response.table.bars()[0].timestamp, at(18, 0, 0));
    assert_eq!(response.table.bars()[0].close, 64.2);

    let seen = seen.lock().unwrap();
    assert!(seen[0].daily);
    assert_eq!(seen[0].bar_size, "1 day");
    assert_eq!(seen[0].lookback, Lookback::Days(1));
}

#[tokio::test]
async fn test_nothing_listening_is_not_available() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let provider = IbProvider::new(IbConfig {
        port,
        ..IbConfig::default()
    });

    assert!(!provider.is_available().await);
}
