//! Integration tests for the prober
//!
//! These tests use wiremock to stand in for probed sites, proxies and the
//! sheet service, and exercise a full run end-to-end.

use async_trait::async_trait;
use reach_probe::config::{parse_config, Config};
use reach_probe::probe::{browser_headers, AttemptExecutor, HttpExecutor, Runner, Sleeper};
use reach_probe::sheets::SheetClient;
use reach_probe::state::{AttemptKind, AttemptResult, TransportErrorKind};
use reach_probe::storage::{OutcomeStore, RunStatus, SharedStore, SqliteStore};
use reach_probe::{parse_proxy, ProbeError};
use reqwest::header::HeaderMap;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_AGENT: &str = "TestChecker/1.0";

fn executor(timeout_ms: u64) -> HttpExecutor {
    HttpExecutor::new(Duration::from_millis(timeout_ms), TEST_AGENT).expect("client builds")
}

/// Creates a test configuration pointing the sheet service at `api_url`
fn create_test_config(api_url: &str, db_path: &str) -> Config {
    parse_config(&format!(
        r#"
[probe]
default-max-slots = 2
default-max-wait-seconds = 0
request-timeout-ms = 2000
max-redirect-chase = 3
concurrency-limit = 2

[sheets]
api-url = "{api_url}"
token = "secret"
input-spreadsheet-id = "in-1"
output-spreadsheet-id = "out-1"

[storage]
database-path = "{db_path}"
"#
    ))
    .expect("test config is valid")
}

// ===== Attempt executor =====

#[tokio::test]
async fn test_executor_extracts_title_on_success() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", TEST_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><head><title>Example &amp; Co</title></head><body>Hi</body></html>",
            "text/html",
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = executor(2000)
        .execute(&format!("{}/", mock_server.uri()), None, None)
        .await;

    assert_eq!(result.kind, AttemptKind::Http(200));
    assert_eq!(result.snippet, "Example & Co");
    assert_eq!(result.redirect_location, None);
}

#[tokio::test]
async fn test_executor_falls_back_to_body_text() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "<html><body><script>x()</script><main>Welcome   to the site</main></body></html>",
            "text/html",
        ))
        .mount(&mock_server)
        .await;

    let result = executor(2000).execute(&mock_server.uri(), None, None).await;

    assert_eq!(result.snippet, "Welcome to the site");
}

#[tokio::test]
async fn test_executor_does_not_follow_redirects() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/landing"))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = executor(2000)
        .execute(&format!("{}/", mock_server.uri()), None, None)
        .await;

    assert_eq!(result.kind, AttemptKind::Http(301));
    assert_eq!(result.redirect_location.as_deref(), Some("/landing"));
    assert_eq!(result.snippet, "");
}

#[tokio::test]
async fn test_executor_returns_error_statuses() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw("<title>Not Found</title>", "text/html"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let executor = executor(2000);
    let missing = executor
        .execute(&format!("{}/missing", mock_server.uri()), None, None)
        .await;
    let broken = executor
        .execute(&format!("{}/broken", mock_server.uri()), None, None)
        .await;

    assert_eq!(missing.kind, AttemptKind::Http(404));
    assert_eq!(missing.snippet, "");
    assert_eq!(broken.kind, AttemptKind::Http(503));
}

#[tokio::test]
async fn test_executor_sends_override_headers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("pragma", "no-cache"))
        .and(header("cache-control", "no-cache"))
        .and(header_exists("accept-language"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let headers = browser_headers();
    let result = executor(2000)
        .execute(&mock_server.uri(), None, Some(&headers))
        .await;

    assert_eq!(result.kind, AttemptKind::Http(200));
}

#[tokio::test]
async fn test_executor_classifies_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(1500)))
        .mount(&mock_server)
        .await;

    let result = executor(200).execute(&mock_server.uri(), None, None).await;

    assert_eq!(
        result.kind,
        AttemptKind::Transport(TransportErrorKind::Timeout)
    );
}

/// Serves one connection: reads the request, writes `response`, then holds
/// the socket open for `hold` before dropping it
async fn serve_raw_once(response: &'static str, hold: Duration) -> String {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(hold).await;
    });

    format!("http://{}/", addr)
}

#[tokio::test]
async fn test_executor_classifies_stalled_body_as_timeout() {
    let url = serve_raw_once(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5000\r\n\r\n<html><title>Part",
        Duration::from_secs(3),
    )
    .await;

    let result = executor(800).execute(&url, None, None).await;

    assert_eq!(
        result.kind,
        AttemptKind::Transport(TransportErrorKind::Timeout)
    );
    assert!(result.snippet.is_empty());
}

#[tokio::test]
async fn test_executor_rejects_truncated_body() {
    let url = serve_raw_once(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 5000\r\n\r\n<html><title>Part",
        Duration::ZERO,
    )
    .await;

    let result = executor(2000).execute(&url, None, None).await;

    assert!(
        matches!(result.kind, AttemptKind::Transport(_)),
        "cut-short body must not count as a response: {:?}",
        result
    );
}

#[tokio::test]
async fn test_executor_classifies_connection_refused() {
    // Reserve a port, then release it so nothing is listening there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let result = executor(2000)
        .execute(&format!("http://127.0.0.1:{}/", port), None, None)
        .await;

    assert_eq!(
        result.kind,
        AttemptKind::Transport(TransportErrorKind::ConnectionRefused)
    );
}

#[tokio::test]
async fn test_executor_routes_through_proxy() {
    let proxy_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists("proxy-authorization"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<title>Via proxy</title>", "text/html"),
        )
        .expect(1)
        .mount(&proxy_server)
        .await;

    let address = proxy_server.address();
    let proxy = parse_proxy(&format!("{}:{}:alice:pw", address.ip(), address.port()))
        .expect("proxy descriptor parses");

    let result = executor(2000)
        .execute("http://probe-target.test/", Some(&proxy), None)
        .await;

    assert_eq!(result.kind, AttemptKind::Http(200));
    assert_eq!(result.snippet, "Via proxy");
}

// ===== Sheet service =====

#[tokio::test]
async fn test_sheet_client_fetches_rows() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/exec"))
        .and(query_param("action", "input"))
        .and(query_param("token", "secret"))
        .and(query_param("inputSpreadsheetId", "in-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "rows": [
                { "Domain": "example.com", "ISP": "FPT" },
                { "Domain": "example.org", "Max Slot try": 4 }
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/exec", mock_server.uri()), "unused.db");
    let client = SheetClient::new(&config.sheets, "secret").unwrap();

    let rows = client.fetch_rows().await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["Domain"], "example.com");
    assert_eq!(rows[1]["Max Slot try"], 4);
}

#[tokio::test]
async fn test_sheet_client_rejected_input() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "ok": false, "error": "bad token" })),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused.db");
    let client = SheetClient::new(&config.sheets, "wrong").unwrap();

    match client.fetch_rows().await {
        Err(ProbeError::Sheets(message)) => assert_eq!(message, "bad token"),
        other => panic!("expected a sheet error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_sheet_client_server_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused.db");
    let client = SheetClient::new(&config.sheets, "secret").unwrap();

    let result = client.fetch_rows().await;
    assert!(matches!(result, Err(ProbeError::Http { .. })));
}

#[tokio::test]
async fn test_sheet_client_posts_output() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/exec"))
        .and(body_partial_json(json!({
            "action": "output",
            "token": "secret",
            "sheetName": "09:30_01/15/2024",
            "outputSpreadsheetId": "out-1",
            "headers": ["Domain", "ISP", "DNS", "Update", "StatusHTTP", "StatusFinal", "URL", "ContentDomain"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/exec", mock_server.uri()), "unused.db");
    let client = SheetClient::new(&config.sheets, "secret").unwrap();

    client.post_output("09:30_01/15/2024", &[]).await.unwrap();
}

// ===== Full run =====

/// Answers by URL so that results do not depend on task interleaving
struct SiteExecutor;

#[async_trait]
impl AttemptExecutor for SiteExecutor {
    async fn execute(
        &self,
        url: &str,
        _proxy: Option<&str>,
        _headers: Option<&HeaderMap>,
    ) -> AttemptResult {
        if url.contains("up.example") {
            AttemptResult::success("Up and running")
        } else if url.ends_with("moved.example/home") {
            AttemptResult::success("Moved home")
        } else if url.contains("moved.example") {
            AttemptResult::redirect(301, "/home")
        } else {
            AttemptResult::http(503)
        }
    }
}

struct NoSleep;

#[async_trait]
impl Sleeper for NoSleep {
    async fn sleep(&self, _duration: Duration) {}
}

async fn mount_input(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(query_param("action", "input"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "rows": [
                { "Domain": "up.example", "ISP": "Viettel", "DNS": "8.8.8.8" },
                { "Domain": "moved.example", "Proxy": "9.9.9.9:80" },
                { "Domain": "down.example", "Max_Slot_try": "2", "Maxtime_try": "0" },
                { "Domain": "", "ISP": "VNPT" }
            ]
        })))
        .mount(mock_server)
        .await;
}

fn runner(mock_server: &MockServer, db_path: &str) -> (Runner, SharedStore) {
    let config = create_test_config(&mock_server.uri(), db_path);
    let sheets = SheetClient::new(&config.sheets, "secret").unwrap();
    let store: SharedStore = Arc::new(Mutex::new(
        SqliteStore::new(std::path::Path::new(db_path)).unwrap(),
    ));

    let runner = Runner::new(
        config,
        "test-hash".to_string(),
        sheets,
        Arc::new(SiteExecutor),
        Arc::new(NoSleep),
        store.clone(),
    );
    (runner, store)
}

#[tokio::test]
async fn test_full_run_writes_sheet_and_database() {
    let mock_server = MockServer::start().await;
    mount_input(&mock_server).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("probe.db");
    let (runner, store) = runner(&mock_server, db_path.to_str().unwrap());

    let summary = runner.run_once().await.unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.succeeded, 2);

    // Output sheet
    let requests = mock_server.received_requests().await.unwrap();
    let post = requests
        .iter()
        .find(|r| r.method.to_string() == "POST")
        .expect("output was posted");
    let body: Value = serde_json::from_slice(&post.body).unwrap();

    let sheet_name = body["sheetName"].as_str().unwrap();
    assert_eq!(sheet_name, summary.sheet_name);
    assert_eq!(sheet_name.len(), "HH:mm_MM/DD/YYYY".len());
    assert_eq!(&sheet_name[2..3], ":");
    assert_eq!(&sheet_name[5..6], "_");

    let data = body["data"].as_array().unwrap();
    let domains: Vec<_> = data.iter().map(|r| r["Domain"].as_str().unwrap()).collect();
    assert_eq!(domains, vec!["up.example", "moved.example", "down.example", ""]);

    assert_eq!(data[0]["StatusFinal"], "SUCCESS");
    assert_eq!(data[0]["StatusHTTP"], "200");
    assert_eq!(data[0]["URL"], "https://www.up.example");
    assert_eq!(data[0]["ContentDomain"], "Up and running");
    assert_eq!(data[0]["ISP"], "Viettel");

    assert_eq!(data[1]["StatusFinal"], "SUCCESS");
    assert_eq!(data[1]["StatusHTTP"], "301");
    assert_eq!(data[1]["URL"], "https://www.moved.example/home");
    assert_eq!(data[1]["ContentDomain"], "Moved home");

    assert_eq!(data[2]["StatusFinal"], "FAIL");
    assert_eq!(data[2]["StatusHTTP"], "503");
    assert_eq!(data[2]["ContentDomain"], "");

    assert_eq!(data[3]["StatusFinal"], "FAIL");
    assert_eq!(data[3]["StatusHTTP"], "");
    assert_eq!(data[3]["ISP"], "VNPT");

    let update = data[0]["Update"].as_str().unwrap();
    assert!(update.ends_with("+07:00"), "unexpected timestamp {}", update);
    assert!(data.iter().all(|r| r["Update"] == data[0]["Update"]));

    // Database
    let store = store.lock().unwrap();
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(Some(run.id), summary.run_id);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");

    let counts = store.count_by_verdict(run.id).unwrap();
    assert_eq!(counts.success, 2);
    assert_eq!(counts.fail, 2);

    let outcomes = store.get_outcomes(run.id).unwrap();
    let down = outcomes.iter().find(|o| o.domain == "down.example").unwrap();
    assert_eq!(down.tried_count, 2);
}

#[tokio::test]
async fn test_run_marked_failed_when_output_rejected() {
    let mock_server = MockServer::start().await;
    mount_input(&mock_server).await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "ok": false, "error": "sheet locked" })),
        )
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("probe.db");
    let (runner, store) = runner(&mock_server, db_path.to_str().unwrap());

    let result = runner.run_once().await;
    assert!(matches!(result, Err(ProbeError::Sheets(ref m)) if m == "sheet locked"));

    let store = store.lock().unwrap();
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    // Outcomes are still kept for the failed run
    assert_eq!(store.count_by_verdict(run.id).unwrap().total(), 4);
}

#[tokio::test]
async fn test_run_aborts_when_input_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .expect(0)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("probe.db");
    let (runner, store) = runner(&mock_server, db_path.to_str().unwrap());

    assert!(runner.run_once().await.is_err());
    assert!(store.lock().unwrap().get_latest_run().unwrap().is_none());
}
