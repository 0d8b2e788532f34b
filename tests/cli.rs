//! End-to-end checks of the `flowctl` binary.

mod common;

use common::{blocking, query, reply};
use std::path::Path;
use std::process::{Command, Output};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn flowctl<S: AsRef<std::ffi::OsStr>>(args: &[S]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flowctl"))
        .args(args)
        .env_remove("FLOWCTL_API_URL")
        .env_remove("FLOWCTL_ENV")
        .env("FLOWCTL_LOG", "warn")
        .output()
        .expect("run flowctl")
}

fn write(path: &Path, contents: &str) {
    std::fs::write(path, contents.as_bytes()).expect("write file");
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("utf-8 path")
}

#[test]
fn init_config_writes_defaults_and_refuses_overwrite() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = dir.path().join("flowctl").join("config.json");

    let first = flowctl(&["init-config", "--out", path_str(&config)]);
    assert!(first.status.success(), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    let written: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&config).expect("read config")).expect("parse");
    assert_eq!(written["schema_version"], 1);
    assert_eq!(written["disable_success"], "exact_200");

    let second = flowctl(&["init-config", "--out", path_str(&config)]);
    assert!(!second.status.success());
    assert!(String::from_utf8_lossy(&second.stderr).contains("--force"));

    let forced = flowctl(&["init-config", "--out", path_str(&config), "--force"]);
    assert!(forced.status.success());
}

#[test]
fn status_applies_live_listing() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let flow = dir.path().join("flow.json");
    let listing = dir.path().join("listing.json");
    write(&flow, r#"{"type": "sync", "name": "contacts", "enabled": false}"#);
    write(
        &listing,
        r#"{"syncs": [{"name": "contacts", "enabled": true, "id": 42}], "actions": []}"#,
    );

    let output = flowctl(&[
        "status",
        "--flow",
        path_str(&flow),
        "--listing",
        path_str(&listing),
        "--json",
    ]);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse report");
    assert_eq!(report["name"], "contacts");
    assert_eq!(report["kind"], "sync");
    assert_eq!(report["enabled"], true);
    assert_eq!(report["id"], 42);
}

/// Run the binary off the async runtime so the mock server keeps answering.
async fn flowctl_async(args: Vec<String>) -> Output {
    blocking(move || flowctl(args.as_slice())).await
}

fn owned(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| arg.to_string()).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn toggle_enables_action_without_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flow"))
        .and(query_param("env", "staging"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = dir.path().join("config.json");
    let flow = dir.path().join("flow.json");
    write(&config, r#"{"schema_version": 1}"#);
    write(&flow, r#"{"type": "action", "name": "create-contact"}"#);

    let output = flowctl_async(owned(&[
        "--config",
        path_str(&config),
        "toggle",
        "--flow",
        path_str(&flow),
        "--provider",
        "hubspot",
        "--provider-config-key",
        "hubspot-prod",
        "--api-url",
        &server.uri(),
        "--env",
        "staging",
        "--json",
    ]))
    .await;

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse report");
    assert_eq!(report["enabled"], true);
    assert_eq!(report["outcome"], "success");
    let requests = server.received_requests().await.expect("recorded requests");
    let body: serde_json::Value = requests[0].body_json().expect("request body is JSON");
    assert_eq!(body[0]["providerConfigKey"], "hubspot-prod");
    assert!(body[0].get("sync_type").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn capped_action_shows_upgrade_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/flow"))
        .respond_with(reply(402, r#"{"type":"resource_capped"}"#))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().expect("create temp dir");
    let flow = dir.path().join("flow.json");
    write(&flow, r#"{"type": "action", "name": "create-contact", "provider": "hubspot"}"#);
    let config = dir.path().join("config.json");
    write(&config, r#"{"schema_version": 1}"#);

    let output = flowctl_async(owned(&[
        "--config",
        path_str(&config),
        "toggle",
        "--flow",
        path_str(&flow),
        "--api-url",
        &server.uri(),
        "--yes",
        "--json",
    ]))
    .await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("You've reached your connections limit!"), "stderr: {stderr}");
    assert!(stderr.contains("Upgrade: https://nango.dev/chat"), "stderr: {stderr}");
    assert!(
        stderr.contains("Learn more: https://docs.nango.dev/reference/limits"),
        "stderr: {stderr}"
    );
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse report");
    assert_eq!(report["enabled"], false);
    assert_eq!(report["outcome"], "quota_exceeded");
}

#[tokio::test(flavor = "multi_thread")]
async fn toggle_reports_failed_disable() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/flow/42/disable"))
        .and(query_param("connectionIds", "acme"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = dir.path().join("config.json");
    let flow = dir.path().join("flow.json");
    let connections = dir.path().join("connections.json");
    write(&config, r#"{"schema_version": 1}"#);
    write(
        &flow,
        r#"{"id": 42, "type": "sync", "name": "contacts", "enabled": true, "providerConfigKey": "hubspot-prod"}"#,
    );
    write(
        &connections,
        r#"[{"connection_id": "acme", "provider_config_key": "hubspot-prod"}]"#,
    );

    let output = flowctl_async(owned(&[
        "--config",
        path_str(&config),
        "toggle",
        "--flow",
        path_str(&flow),
        "--connections",
        path_str(&connections),
        "--api-url",
        &server.uri(),
        "--yes",
        "--json",
    ]))
    .await;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Something went wrong"), "stderr: {stderr}");
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).expect("parse report");
    assert_eq!(report["enabled"], true);
    assert_eq!(report["outcome"], "failure");
    let requests = server.received_requests().await.expect("recorded requests");
    assert_eq!(query(&requests[0], "sync_name").as_deref(), Some("contacts"));
}
