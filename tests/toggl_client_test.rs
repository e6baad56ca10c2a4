//! Integration tests for the Toggl Reports client against a mock server

use base64::{engine::general_purpose, Engine as _};
use chrono::NaiveDate;
use mockito::{Matcher, Server};
use serde_json::json;
use toggl_ledger::adapters::toggl::{TimeReportSource, TogglClient};
use toggl_ledger::config::{parse_config, TogglConfig};
use toggl_ledger::domain::{SourceError, SyncError};

fn config(base_url: &str, max_pages: u32) -> TogglConfig {
    let toml = format!(
        r#"
[toggl]
base_url = "{base_url}"
api_token = "test-token"
user_agent = "me@example.com"
workspace_id = "42"
max_pages = {max_pages}
"#
    );
    parse_config(&toml).unwrap().toggl
}

fn since() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn entry(id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "description": format!("entry {id}"),
        "start": "2024-05-01T09:00:00+09:00",
        "end": "2024-05-01T10:00:00+09:00",
        "updated": "2024-05-01T10:00:05+09:00",
        "project": "Ledger",
        "tags": ["deep"]
    })
}

fn page_query(page: &str) -> Matcher {
    Matcher::AllOf(vec![
        Matcher::UrlEncoded("user_agent".into(), "me@example.com".into()),
        Matcher::UrlEncoded("workspace_id".into(), "42".into()),
        Matcher::UrlEncoded("since".into(), "2024-05-01".into()),
        Matcher::UrlEncoded("page".into(), page.into()),
    ])
}

#[tokio::test]
async fn test_fetch_sends_auth_and_query() {
    let mut server = Server::new_async().await;
    let expected_auth = format!(
        "Basic {}",
        general_purpose::STANDARD.encode("test-token:api_token")
    );
    let mock = server
        .mock("GET", "/v2/details")
        .match_query(page_query("1"))
        .match_header("authorization", expected_auth.as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"total_count": 1, "per_page": 50, "data": [entry(1)]}).to_string())
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 50)).unwrap();
    let records = client.fetch(since(), None, None).await.unwrap();

    mock.assert_async().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].id, 1);
    assert_eq!(records[0].project.as_deref(), Some("Ledger"));
    assert_eq!(records[0].tags, vec!["deep".to_string()]);
}

#[tokio::test]
async fn test_fetch_follows_pages() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/v2/details")
        .match_query(page_query("1"))
        .with_status(200)
        .with_body(json!({"total_count": 3, "per_page": 2, "data": [entry(1), entry(2)]}).to_string())
        .create_async()
        .await;
    let second = server
        .mock("GET", "/v2/details")
        .match_query(page_query("2"))
        .with_status(200)
        .with_body(json!({"total_count": 3, "per_page": 2, "data": [entry(3)]}).to_string())
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 50)).unwrap();
    let records = client.fetch(since(), None, None).await.unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_fetch_stops_at_max_pages() {
    let mut server = Server::new_async().await;
    let first = server
        .mock("GET", "/v2/details")
        .match_query(page_query("1"))
        .with_status(200)
        .with_body(json!({"total_count": 10, "per_page": 2, "data": [entry(1), entry(2)]}).to_string())
        .expect(1)
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 1)).unwrap();
    let records = client.fetch(since(), None, None).await.unwrap();

    first.assert_async().await;
    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn test_running_timer_has_no_end() {
    let mut server = Server::new_async().await;
    let mut running = entry(5);
    running["end"] = serde_json::Value::Null;
    server
        .mock("GET", "/v2/details")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"total_count": 1, "per_page": 50, "data": [running]}).to_string())
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 50)).unwrap();
    let records = client.fetch(since(), None, None).await.unwrap();

    assert!(records[0].end.is_none());
}

#[tokio::test]
async fn test_missing_data_is_no_data_fetched() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/details")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"total_count": 0, "per_page": 50}).to_string())
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 50)).unwrap();
    let err = client.fetch(since(), None, None).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Source(SourceError::NoDataFetched(_))
    ));
}

#[tokio::test]
async fn test_unauthorized_is_authentication_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/details")
        .match_query(Matcher::Any)
        .with_status(401)
        .with_body(json!({"error": {"message": "api token missing"}}).to_string())
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 50)).unwrap();
    let err = client.fetch(since(), None, None).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Source(SourceError::AuthenticationFailed(_))
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_rate_limit_is_retryable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/details")
        .match_query(Matcher::Any)
        .with_status(429)
        .with_body("Too Many Requests")
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 50)).unwrap();
    let err = client.fetch(since(), None, None).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Source(SourceError::ServerError { status: 429, .. })
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_undecodable_body_is_invalid_response() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/v2/details")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body("<html>maintenance</html>")
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 50)).unwrap();
    let err = client.fetch(since(), None, None).await.unwrap_err();

    assert!(matches!(
        err,
        SyncError::Source(SourceError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn test_until_and_report_type_are_passed_through() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/weekly")
        .match_query(Matcher::UrlEncoded("until".into(), "2024-05-03".into()))
        .with_status(200)
        .with_body(json!({"total_count": 1, "per_page": 50, "data": [entry(1)]}).to_string())
        .create_async()
        .await;

    let client = TogglClient::new(config(&server.url(), 50)).unwrap();
    let until = NaiveDate::from_ymd_opt(2024, 5, 3);
    client.fetch(since(), until, Some("weekly")).await.unwrap();

    mock.assert_async().await;
}
