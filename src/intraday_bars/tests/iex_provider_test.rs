mod common;

use common::{at, session, window};
use chrono::NaiveDate;
use intraday_bars::{
    models::{request_params::BarsRequest, window::Window},
    providers::{BarProvider, ProviderError, iex::IexProvider},
    status::{FetchOutcome, StatusCode},
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

fn provider(server: &MockServer) -> IexProvider {
    IexProvider::new(None, server.uri()).unwrap()
}

fn minute(minute: &str, close: Value) -> Value {
    json!({
        "date": "20190117",
        "minute": minute,
        "open": 63.5,
        "high": 64.0,
        "low": 63.0,
        "close": close,
        "average": 63.4,
        "volume": 300
    })
}

#[tokio::test]
async fn test_minute_bars_for_an_earlier_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/SQ/chart/date/20190117"))
        .and(query_param("filter", "date,minute,open,high,low,close,average,volume"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            minute("09:30", json!(63.6)),
            minute("09:31", json!(-1)),
            minute("09:32", Value::Null),
            minute("09:33", json!(63.9)),
            minute("09:40", json!(64.0)),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let request = BarsRequest::new("sq").with_window(window(at(17, 9, 30), at(17, 9, 35)));
    let response = provider(&server).fetch_bars(&session(), &request).await.unwrap();

    assert_eq!(response.status.code, StatusCode::Ok);
    assert_eq!(response.table.interval(), "1");
    let stamps: Vec<_> = response.table.iter().map(|b| b.timestamp).collect();
    assert_eq!(stamps, vec![at(17, 9, 30), at(17, 9, 33)]);
}

#[tokio::test]
async fn test_chart_interval_is_forwarded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/SQ/chart/date/20190117"))
        .and(query_param("chartInterval", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([minute("09:30", json!(63.6))])))
        .expect(1)
        .mount(&server)
        .await;

    let request = BarsRequest::new("SQ")
        .with_window(window(at(17, 9, 30), at(17, 16, 0)))
        .with_interval(5);
    let response = provider(&server).fetch_bars(&session(), &request).await.unwrap();
    assert_eq!(response.table.len(), 1);
}

#[tokio::test]
async fn test_daily_range_covers_the_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stock/SQ/chart/3m"))
        .and(query_param("filter", "date,open,high,low,close,volume"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"date": "2019-01-09", "open": 60.0, "high": 61.0, "low": 59.0, "close": 60.5, "volume": 9000000},
            {"date": "2019-01-10", "open": 60.5, "high": 62.0, "low": 60.0, "close": 61.5, "volume": 8000000},
            {"date": "2019-01-11", "open": 61.5, "high": 63.0, "low": 61.0, "close": 62.5, "volume": 7000000},
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let request = BarsRequest::new("SQ")
        .with_window(window(at(10, 0, 0), at(11, 0, 0)))
        .with_interval("d");
    let response = provider(&server).fetch_bars(&session(), &request).await.unwrap();

    assert_eq!(response.table.interval(), "daily");
    assert_eq!(response.table.len(), 2);
    assert_eq!(response.table.bars()[1].volume, 7_000_000);
}

#[tokio::test]
async fn test_minute_data_past_the_horizon_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2018, 11, 1).unwrap();
    let request = BarsRequest::new("SQ").with_window(Window::between(
        day.and_hms_opt(9, 30, 0).unwrap(),
        day.and_hms_opt(16, 0, 0).unwrap(),
    ));
    let response = provider(&server).fetch_bars(&session(), &request).await.unwrap();

    assert_eq!(response.status.code, StatusCode::Unavailable);
    assert!(response.table.is_empty());
    assert!(response.status.message().contains("30 days"));
}

#[tokio::test]
async fn test_http_error_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Unknown symbol"))
        .mount(&server)
        .await;

    let request = BarsRequest::new("ZZZZ").with_window(window(at(17, 9, 30), at(17, 16, 0)));
    let outcome = FetchOutcome::from(provider(&server).fetch_bars(&session(), &request).await);
    assert!(matches!(
        outcome,
        FetchOutcome::TransportError(ProviderError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_start_after_now_is_empty_without_a_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let request = BarsRequest::new("SQ").with_window(Window::new(Some(at(22, 9, 30)), None));
    let outcome = FetchOutcome::from(provider(&server).fetch_bars(&session(), &request).await);
    assert!(matches!(outcome, FetchOutcome::Unavailable(_)));
}
