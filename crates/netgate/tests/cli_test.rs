//! Integration tests for the `netgate` CLI binary.
//!
//! Argument parsing, help output and completions run without a server;
//! the remaining tests point the binary at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `netgate` binary with env isolation.
///
/// Clears all `NETGATE_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn netgate_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("netgate");
    cmd.env("HOME", "/tmp/netgate-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/netgate-cli-test-nonexistent")
        .env(
            "NETGATE_CONFIG",
            "/tmp/netgate-cli-test-nonexistent/config.toml",
        )
        .env_remove("NETGATE_PROFILE")
        .env_remove("NETGATE_CONTROLLER")
        .env_remove("NETGATE_USERNAME")
        .env_remove("NETGATE_PASSWORD")
        .env_remove("NETGATE_OUTPUT")
        .env_remove("NETGATE_INSECURE")
        .env_remove("NETGATE_CA_CERT")
        .env_remove("NETGATE_TIMEOUT");
    cmd
}

/// Command already pointed at `server` with admin credentials.
fn against(server: &MockServer) -> assert_cmd::Command {
    let mut cmd = netgate_cmd();
    cmd.args(["--controller", &server.uri(), "--username", "admin"])
        .env("NETGATE_PASSWORD", "secret")
        .args(["--color", "never"]);
    cmd
}

/// Run a prepared command off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mock_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({ "username": "admin", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-123",
            "token_type": "bearer",
        })))
        .mount(server)
        .await;
}

fn rule_json(id: &str, name: &str, priority: i32) -> serde_json::Value {
    json!({
        "_id": id,
        "rule_name": name,
        "source_ips": ["10.0.0.0/8"],
        "port": "22",
        "protocol": "TCP",
        "action": "DENY",
        "direction": "IN",
        "profile": "Any",
        "description": null,
        "enabled": true,
        "priority": priority,
        "schedule_start": null,
        "schedule_end": null,
        "days_of_week": [],
        "group_id": null,
        "created_at": "2024-05-01T12:00:00Z",
        "updated_at": null,
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = netgate_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    netgate_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("NetGate")
            .and(predicate::str::contains("rules"))
            .and(predicate::str::contains("groups"))
            .and(predicate::str::contains("dns")),
    );
}

#[test]
fn test_version_flag() {
    netgate_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("netgate"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    netgate_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    netgate_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = netgate_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_rules_list_without_server_configured() {
    let output = netgate_cmd().args(["rules", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("No server configured"), "{text}");
}

#[test]
fn test_unknown_profile() {
    let output = netgate_cmd()
        .args(["--profile", "lab", "rules", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("lab"));
}

#[test]
fn test_config_show_no_config() {
    netgate_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_invalid_output_format() {
    let output = netgate_cmd()
        .args(["--output", "invalid", "rules", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("invalid") || text.contains("possible values"));
}

#[test]
fn test_schedule_start_requires_end() {
    let output = netgate_cmd()
        .args(["rules", "create", "--name", "x", "--schedule-start", "08:00"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config file round trip ──────────────────────────────────────────

#[test]
fn test_config_set_and_use() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    netgate_cmd()
        .env("NETGATE_CONFIG", &config)
        .args(["--profile", "lab", "config", "set", "controller", "http://10.1.1.1:8000"])
        .assert()
        .success();
    netgate_cmd()
        .env("NETGATE_CONFIG", &config)
        .args(["config", "use", "lab"])
        .assert()
        .success();

    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("default_profile = \"lab\""), "{written}");
    assert!(written.contains("http://10.1.1.1:8000"));

    netgate_cmd()
        .env("NETGATE_CONFIG", &config)
        .args(["config", "use", "missing"])
        .assert()
        .code(4);
}

// ── Against a mock server ───────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rules_list_json() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/firewall/rules"))
        .and(header("authorization", "Bearer tok-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            rule_json("r1", "block-ssh", 1),
            rule_json("r2", "block-telnet", 2),
        ])))
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["--output", "json-compact", "rules", "list"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let rules: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rules[0]["rule_name"], "block-ssh");
    assert_eq!(rules[1]["_id"], "r2");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rules_list_plain_prints_ids() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/firewall/rules"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([rule_json("r1", "a", 1)])),
        )
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["-o", "plain", "rules", "list"]);
    let output = run(cmd).await;
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "r1");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_bad_credentials_exit_with_auth_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "detail": "invalid credentials" })),
        )
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["rules", "list"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(3));
    assert!(combined_output(&output).contains("invalid credentials"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_missing_rule_exits_not_found() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/firewall/rules/nope"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Rule not found: nope" })),
        )
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["rules", "get", "nope"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("Rule not found: nope"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_reorder_sends_ids_in_order() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("PUT"))
        .and(path("/firewall/rules/order"))
        .and(body_json(json!({ "ordered_ids": ["r3", "r1", "r2"] })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "Rules reordered" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/firewall/rules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["-q", "rules", "reorder", "r3,r1,r2"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_nat_conflict_exit_code() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/nat"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "detail": "Conflict: WAN and LAN cannot be the same interface",
        })))
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["nat", "enable", "--wan", "eth0", "--lan", "eth0"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(6));
}

#[test]
fn test_unreadable_ca_cert_exits_with_connection_code() {
    let output = netgate_cmd()
        .args([
            "--controller",
            "https://127.0.0.1:9",
            "--ca-cert",
            "/tmp/netgate-cli-test-nonexistent/ca.pem",
            "status",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(7));
    assert!(combined_output(&output).contains("CA cert"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_needs_no_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "message": "NetGate API is running" })),
        )
        .mount(&server)
        .await;

    let mut cmd = netgate_cmd();
    cmd.args(["--controller", &server.uri(), "status"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("NetGate API is running"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_group_disable_reports_count() {
    let server = MockServer::start().await;
    mock_login(&server).await;
    Mock::given(method("PATCH"))
        .and(path("/firewall/groups/g1/rules/enable"))
        .and(body_json(json!({ "enable": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "3 rule(s) disabled",
            "data": 3,
        })))
        .mount(&server)
        .await;

    let mut cmd = against(&server);
    cmd.args(["groups", "disable", "g1"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stderr).contains("3 rule(s) disabled"));
}
