#![allow(clippy::unwrap_used)]
// Integration tests for `Session` against a wiremock firewall.

use std::collections::BTreeMap;
use std::fs;
use std::sync::Mutex;
use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use panreport_core::{
    ConnectionSettings, ConnectionStatus, CoreError, ExportKind, ExportMode, PROBE_TTL, Session,
    SessionConfig, SettingsStore,
};

// ── Helpers ─────────────────────────────────────────────────────────

const RULES_PATH: &str = "/restapi/v11.0/Policies/SecurityRules";
const THREAT_PATH: &str = "/restapi/v11.0/Objects/ThreatLogs";

#[derive(Default)]
struct MemoryStore {
    saved: Mutex<Vec<String>>,
}

impl SettingsStore for MemoryStore {
    fn save(&self, settings: &ConnectionSettings) -> Result<(), CoreError> {
        self.saved.lock().unwrap().push(settings.base_url.clone());
        Ok(())
    }
}

fn settings(base_url: &str, max_rows: usize, format: ExportMode) -> ConnectionSettings {
    ConnectionSettings {
        base_url: base_url.into(),
        api_key: SecretString::from("test-key".to_string()),
        max_rows,
        format,
    }
}

fn session(settings: ConnectionSettings, reports: &TempDir) -> Session {
    let mut config = SessionConfig::new(settings, reports.path().join("Reports"));
    config.timeout = Duration::from_secs(5);
    Session::new(config).unwrap()
}

async fn mount_rules(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(RULES_PATH))
        .and(header("X-PAN-KEY", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn csv_lines(path: &std::path::Path) -> Vec<String> {
    let text = fs::read_to_string(path).unwrap();
    text.trim_start_matches('\u{feff}')
        .lines()
        .map(str::to_owned)
        .collect()
}

// ── Generate + export ───────────────────────────────────────────────

#[tokio::test]
async fn test_generate_then_export_standard() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_rules(&server, json!([{"a": 1, "b": 2}, {"a": 3, "c": 4}, {"b": 5}])).await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    session.generate_report("securityRules", None).await.unwrap();
    let artifact = session
        .export("securityRules", ExportKind::Tabular)
        .await
        .unwrap();

    assert_eq!(&csv_lines(&artifact.path)[5..], &["a,b", "1,2", "3,", ",5"]);
}

#[tokio::test]
async fn test_generate_then_export_complete() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_rules(&server, json!([{"a": 1, "b": 2}, {"a": 3, "c": 4}, {"b": 5}])).await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Complete), &dir);
    session.generate_report("securityRules", None).await.unwrap();
    let artifact = session
        .export("securityRules", ExportKind::Tabular)
        .await
        .unwrap();

    assert_eq!(
        &csv_lines(&artifact.path)[5..],
        &["a,b,c", "1,2,", "3,,4", ",5,"]
    );
}

#[tokio::test]
async fn test_row_cap_note() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let rows: Vec<_> = (0..5).map(|i| json!({"name": format!("rule-{i}")})).collect();
    mount_rules(&server, json!(rows)).await;

    let session = session(settings(&server.uri(), 2, ExportMode::Standard), &dir);
    session.generate_report("securityRules", None).await.unwrap();
    let artifact = session
        .export("securityRules", ExportKind::Tabular)
        .await
        .unwrap();

    let lines = csv_lines(&artifact.path);
    assert_eq!(lines.len(), 5 + 1 + 2 + 1);
    assert_eq!(lines.last().unwrap(), "Note: Output limited to 2 of 5 rows");
}

#[tokio::test]
async fn test_legacy_document_exports_as_pdf() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/api/"))
        .and(query_param("type", "op"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<response status="success"><result><hostname>fw01</hostname></result></response>"#,
        ))
        .mount(&server)
        .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    session.generate_report("systemInfo", None).await.unwrap();
    let artifact = session
        .export("systemInfo", ExportKind::Document)
        .await
        .unwrap();

    assert!(fs::read(&artifact.path).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_date_range_forwarded() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path(THREAT_PATH))
        .and(query_param("start-time", "2024-06-01"))
        .and(query_param("end-time", "2024-06-30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    let range = panreport_core::DateRange::new("2024-06-01", "2024-06-30");
    session.generate_report("threat", Some(&range)).await.unwrap();
}

// ── Error paths ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unconfigured_session_fails_fast() {
    let dir = TempDir::new().unwrap();
    let session = session(ConnectionSettings::default(), &dir);

    let err = session.generate_report("zones", None).await.unwrap_err();
    assert!(matches!(err, CoreError::Unconfigured));

    let probe = session.test_connection().await;
    assert_eq!(probe.status, ConnectionStatus::Unconfigured);
    assert!(!probe.cached);
}

#[tokio::test]
async fn test_unknown_report_type() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);

    let err = session.generate_report("bogus", None).await.unwrap_err();
    assert!(matches!(err, CoreError::UnknownReportType { .. }));
}

#[tokio::test]
async fn test_export_without_fetch_is_no_data() {
    let dir = TempDir::new().unwrap();
    let session = session(settings("https://fw.example", 1000, ExportMode::Standard), &dir);

    let err = session
        .export("zones", ExportKind::Tabular)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoData { .. }));
}

#[tokio::test]
async fn test_status_error_keeps_code() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Invalid credentials"))
        .mount(&server)
        .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    let err = session
        .generate_report("securityRules", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Status { status: 403, .. }));
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let mut config = SessionConfig::new(
        settings(&server.uri(), 1000, ExportMode::Standard),
        dir.path().join("Reports"),
    );
    config.timeout = Duration::from_secs(1);
    let session = Session::new(config).unwrap();

    let err = session
        .generate_report("securityRules", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Timeout { timeout_secs: 1 }), "got {err:?}");
    assert_eq!(err.to_string(), "Request timed out after 1s");
}

// ── Connectivity probe ──────────────────────────────────────────────

#[tokio::test]
async fn test_probe_is_cached_until_settings_saved() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<response status=\"success\"/>"))
        .expect(2)
        .mount(&server)
        .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    assert_eq!(session.connection_status().await, ConnectionStatus::Unknown);

    let first = session.test_connection().await;
    assert_eq!(first.status, ConnectionStatus::Connected);
    assert!(!first.cached);

    let second = session.test_connection().await;
    assert!(second.cached);
    assert_eq!(second.status, ConnectionStatus::Connected);

    let store = MemoryStore::default();
    session
        .save_settings(&store, settings(&server.uri(), 500, ExportMode::Complete))
        .await
        .unwrap();
    assert_eq!(session.connection_status().await, ConnectionStatus::Unknown);
    assert_eq!(store.saved.lock().unwrap().len(), 1);

    let third = session.test_connection().await;
    assert!(!third.cached);
}

#[tokio::test]
async fn test_probe_verdict_expires_after_ttl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<response status=\"success\"/>"))
        .expect(2)
        .mount(&server)
        .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    assert!(!session.test_connection().await.cached);

    // Only the verdict clock moves; requests run on real time.
    tokio::time::pause();
    tokio::time::advance(PROBE_TTL - Duration::from_secs(1)).await;
    assert!(session.test_connection().await.cached);

    tokio::time::advance(Duration::from_secs(2)).await;
    tokio::time::resume();
    let expired = session.test_connection().await;
    assert!(!expired.cached);
    assert_eq!(expired.status, ConnectionStatus::Connected);
}

#[tokio::test]
async fn test_save_during_probe_clears_verdict() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .and(path("/api/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<response status=\"success\"/>")
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    let probing = tokio::spawn({
        let session = session.clone();
        async move { session.test_connection().await }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    let store = MemoryStore::default();
    session
        .save_settings(&store, settings(&server.uri(), 500, ExportMode::Complete))
        .await
        .unwrap();

    assert_eq!(probing.await.unwrap().status, ConnectionStatus::Connected);
    assert_eq!(session.connection_status().await, ConnectionStatus::Unknown);
}

#[tokio::test]
async fn test_probe_failure_is_error_verdict() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    let probe = session.test_connection().await;
    assert_eq!(probe.status, ConnectionStatus::Error);
    assert!(probe.message.starts_with("API connection failed"));
    assert_eq!(session.connection_status().await, ConnectionStatus::Error);
}

// ── Filter / search ─────────────────────────────────────────────────

#[tokio::test]
async fn test_filtered_export_and_invalidation() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_rules(
        &server,
        json!([
            {"name": "allow-dns", "action": "allow"},
            {"name": "deny-all", "action": "deny"}
        ]),
    )
    .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    session.generate_report("securityRules", None).await.unwrap();

    let filters = BTreeMap::from([("action".to_owned(), "DENY".to_owned())]);
    let result = session.filter("securityRules", &filters).unwrap();
    assert!(result.filtered);
    assert_eq!(result.count, 1);

    let artifact = session
        .export_filtered("securityRules", ExportKind::Tabular)
        .await
        .unwrap();
    let name = artifact.path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("securityRules_filtered_"));
    assert_eq!(&csv_lines(&artifact.path)[5..], &["action,name", "deny,deny-all"]);

    // Refetching the parent drops the view.
    session.generate_report("securityRules", None).await.unwrap();
    let err = session
        .export_filtered("securityRules", ExportKind::Tabular)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::NoData { .. }));
}

#[tokio::test]
async fn test_search_across_cached_reports() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_rules(&server, json!([{"name": "allow-web", "action": "allow"}])).await;
    Mock::given(method("GET"))
        .and(path(THREAT_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"type": "threat", "name": "eicar"},
            {"type": "virus", "name": "Threat-Sample"}
        ])))
        .mount(&server)
        .await;

    let session = session(settings(&server.uri(), 1000, ExportMode::Standard), &dir);
    session.generate_report("securityRules", None).await.unwrap();
    session.generate_report("threat", None).await.unwrap();

    let result = session.search("threat").unwrap();
    assert!(result.found);
    assert_eq!(result.reports_searched, 2);
    assert_eq!(result.reports_with_matches, 1);
    assert_eq!(result.results["threat"].count, 2);
}
