//! Integration tests for the `wpfleet` CLI binary.
//!
//! Argument parsing, completions, and error handling run without any
//! network. The fleet commands run against a temp config + state file, and
//! the end-to-end test drives a wiremock site.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `wpfleet` binary with env isolation.
///
/// Clears the `WPFLEET_*` flags and points platform directories at a
/// nonexistent path so tests never touch the user's real config or state.
fn wpfleet_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("wpfleet");
    cmd.env("HOME", "/tmp/wpfleet-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/wpfleet-cli-test-nonexistent")
        .env("XDG_DATA_HOME", "/tmp/wpfleet-cli-test-nonexistent")
        .env_remove("WPFLEET_CONFIG")
        .env_remove("WPFLEET_STATE")
        .env_remove("WPFLEET_OUTPUT")
        .env_remove("WPFLEET_LOG_FORMAT")
        .env_remove("RUST_LOG");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// A temp dir holding `config.toml` and `state.json`.
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(config: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn with_state(self, state: &Value) -> Self {
        std::fs::write(self.state_path(), state.to_string()).unwrap();
        self
    }

    fn config_path(&self) -> PathBuf {
        self.dir.path().join("config.toml")
    }

    fn state_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    /// `wpfleet --config .. --state .. --color never <args>`
    fn cmd(&self, args: &[&str]) -> assert_cmd::Command {
        let mut cmd = wpfleet_cmd();
        cmd.arg("--config")
            .arg(self.config_path())
            .arg("--state")
            .arg(self.state_path())
            .args(["--color", "never"])
            .args(args);
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.cmd(args).args(["-o", "json"]).output().unwrap();
        assert!(
            output.status.success(),
            "command failed:\n{}",
            combined_output(&output)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn state(&self) -> Value {
        read_json(&self.state_path())
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

const BLOG_CONFIG: &str = r#"
[sites.blog]
name = "Company blog"
url = "https://blog.example.invalid"
username = "fleet-bot"
credential = "plain:secret"
"#;

fn plugin(slug: &str, update: Option<&str>, active: bool, security: bool) -> Value {
    json!({
        "site_id": "blog",
        "kind": "plugin",
        "slug": slug,
        "name": slug,
        "version": "1.0",
        "update_available": update.is_some(),
        "new_version": update,
        "is_active": active,
        "security_update": security,
    })
}

fn blog_state(status: &str, inventory: &[Value]) -> Value {
    json!({
        "sites": [{
            "id": "blog",
            "name": "Company blog",
            "url": "https://blog.example.invalid",
            "username": "fleet-bot",
            "credential": "plain:secret",
            "status": status,
        }],
        "inventory": inventory,
        "update_log": [],
    })
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = wpfleet_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    wpfleet_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("WordPress")
            .and(predicate::str::contains("sync"))
            .and(predicate::str::contains("updates"))
            .and(predicate::str::contains("notifications")),
    );
}

#[test]
fn test_version_flag() {
    wpfleet_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("wpfleet"));
}

#[test]
fn test_invalid_subcommand() {
    let output = wpfleet_cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions() {
    for shell in ["bash", "zsh", "fish"] {
        wpfleet_cmd()
            .args(["completions", shell])
            .assert()
            .success()
            .stdout(predicate::str::contains("wpfleet"));
    }
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_path_honours_flag() {
    wpfleet_cmd()
        .args(["--config", "/tmp/somewhere/fleet.toml", "config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/somewhere/fleet.toml"));
}

#[test]
fn test_config_show_masks_plaintext_credentials() {
    let ws = Workspace::new(
        r#"
[sites.blog]
url = "https://blog.example.invalid"
username = "fleet-bot"
credential = "hunter2"

[sites.shop]
url = "https://shop.example.invalid"
username = "fleet-bot"
credential = "env:SHOP_PASSWORD"
"#,
    );
    ws.cmd(&["config", "show"]).assert().success().stdout(
        predicate::str::contains("****")
            .and(predicate::str::contains("env:SHOP_PASSWORD"))
            .and(predicate::str::contains("hunter2").not()),
    );
}

#[test]
fn test_invalid_site_url_is_a_config_error() {
    let ws = Workspace::new(
        r#"
[sites.blog]
url = "ftp://blog.example.invalid"
username = "fleet-bot"
"#,
    );
    let output = ws.cmd(&["sites", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("unsupported scheme"));
}

// ── Read-only fleet commands ────────────────────────────────────────

#[test]
fn test_sites_list_merges_config_with_state() {
    let ws = Workspace::new(BLOG_CONFIG).with_state(&blog_state(
        "online",
        &[
            plugin("akismet", Some("5.1"), true, false),
            plugin("hello", None, false, false),
        ],
    ));

    let sites = ws.json(&["sites", "list"]);
    let blog = &sites[0];
    assert_eq!(blog["id"], "blog");
    assert_eq!(blog["name"], "Company blog");
    assert_eq!(blog["status"], "online");
    assert_eq!(blog["plugin_updates"], 1);
    assert_eq!(blog["theme_updates"], 0);
    assert!(blog["health_score"].as_u64().unwrap() <= 100);
}

#[test]
fn test_updates_list_puts_security_releases_first() {
    let ws = Workspace::new(BLOG_CONFIG).with_state(&blog_state(
        "online",
        &[
            plugin("inactive-one", Some("2.0"), false, false),
            plugin("active-one", Some("2.0"), true, false),
            plugin("patched", Some("1.0.1"), false, true),
        ],
    ));

    let updates = ws.json(&["updates", "list"]);
    let order: Vec<_> = updates
        .as_array()
        .unwrap()
        .iter()
        .map(|u| (u["slug"].as_str().unwrap(), u["priority"].as_str().unwrap()))
        .collect();
    assert_eq!(
        order,
        vec![
            ("patched", "critical"),
            ("active-one", "high"),
            ("inactive-one", "low"),
        ]
    );
}

#[test]
fn test_updates_list_unknown_site_is_not_found() {
    let ws = Workspace::new(BLOG_CONFIG);
    let output = ws
        .cmd(&["updates", "list", "--site", "nope"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("sites list"));
}

#[test]
fn test_due_lists_never_synced_sites() {
    let ws = Workspace::new(BLOG_CONFIG);
    ws.cmd(&["due", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("blog"));
}

#[test]
fn test_notifications_flag_offline_sites() {
    let ws = Workspace::new(BLOG_CONFIG).with_state(&blog_state("offline", &[]));

    let notes = ws.json(&["notifications"]);
    assert_eq!(notes[0]["site_id"], "blog");
    assert_eq!(notes[0]["kind"], "offline");
    assert_eq!(notes[0]["severity"], "critical");
}

#[test]
fn test_log_is_empty_on_a_fresh_fleet() {
    let ws = Workspace::new(BLOG_CONFIG);
    assert_eq!(ws.json(&["log"]), json!([]));
}

#[test]
fn test_corrupt_state_is_reported() {
    let ws = Workspace::new(BLOG_CONFIG);
    std::fs::write(ws.state_path(), "{ nope").unwrap();
    let output = ws.cmd(&["sites", "list"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("fleet state"));
}

// ── Update apply guards ─────────────────────────────────────────────

#[test]
fn test_apply_without_yes_refuses_non_interactive() {
    let ws = Workspace::new(BLOG_CONFIG).with_state(&blog_state(
        "online",
        &[plugin("akismet", Some("5.1"), true, false)],
    ));
    let output = ws.cmd(&["updates", "apply", "--all"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--yes"));
}

#[test]
fn test_apply_needs_a_selection() {
    let ws = Workspace::new(BLOG_CONFIG);
    let output = ws.cmd(&["-y", "updates", "apply"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_apply_slugs_need_a_site() {
    let ws = Workspace::new(BLOG_CONFIG);
    let output = ws
        .cmd(&["-y", "updates", "apply", "--plugin", "akismet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("--site"));
}

#[test]
fn test_apply_all_with_nothing_pending_is_a_no_op() {
    let ws = Workspace::new(BLOG_CONFIG).with_state(&blog_state("online", &[]));
    ws.cmd(&["-y", "updates", "apply", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No pending updates"));
}

#[test]
fn test_sync_unknown_site_is_not_found() {
    let ws = Workspace::new(BLOG_CONFIG);
    let output = ws.cmd(&["sync", "--site", "nope"]).output().unwrap();
    assert_eq!(output.status.code(), Some(4));
}

// ── End to end against a mock site ──────────────────────────────────

fn fleet_path(suffix: &str) -> String {
    format!("/wp-json/fleet/v1/{suffix}")
}

async fn mock_site() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(fleet_path("health")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "online": true,
            "version": "6.5.2",
            "php_version": "8.2.18",
            "is_ssl": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(fleet_path("plugins")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "slug": "akismet",
                "name": "Akismet Anti-spam",
                "version": "5.0",
                "status": "active",
                "update": {"version": "5.1", "security": false}
            },
            {
                "slug": "hello-dolly",
                "name": "Hello Dolly",
                "version": "1.7.2",
                "status": "inactive"
            }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(fleet_path("themes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(fleet_path("plugins/akismet/update")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "5.1"})))
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_sync_then_apply_against_a_live_site() {
    let server = mock_site().await;
    let ws = Workspace::new(&format!(
        r#"
[sites.blog]
name = "Company blog"
url = "{}"
username = "fleet-bot"
credential = "plain:secret"
"#,
        server.uri()
    ));

    let summary = ws.json(&["sync"]);
    assert_eq!(summary["synced"], 1);
    assert_eq!(summary["outcomes"][0]["outcome"], "synced");
    assert_eq!(summary["outcomes"][0]["plugins"], 2);

    let state = ws.state();
    assert_eq!(state["sites"][0]["status"], "online");
    assert_eq!(state["sites"][0]["wp_version"], "6.5.2");
    assert_eq!(state["inventory"].as_array().unwrap().len(), 2);

    let pending = ws.json(&["updates", "list"]);
    assert_eq!(pending.as_array().unwrap().len(), 1);
    assert_eq!(pending[0]["slug"], "akismet");
    assert_eq!(pending[0]["priority"], "high");

    let report = ws.json(&["-y", "updates", "apply", "--all"]);
    assert_eq!(report["summary"]["successful"], 1);
    assert_eq!(report["summary"]["failed"], 0);
    assert_eq!(report["results"][0]["new_version"], "5.1");

    let log = ws.json(&["log"]);
    assert_eq!(log.as_array().unwrap().len(), 1);
    assert_eq!(log[0]["slug"], "akismet");
    assert_eq!(log[0]["status"], "success");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_rejected_update_exits_non_zero_and_is_logged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(fleet_path("plugins/akismet/update")))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "code": "update_failed",
            "message": "Could not copy file."
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(fleet_path("plugins")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(fleet_path("themes")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let ws = Workspace::new(&format!(
        r#"
[sites.blog]
url = "{}"
username = "fleet-bot"
credential = "plain:secret"
"#,
        server.uri()
    ));

    let output = ws
        .cmd(&["-y", "updates", "apply", "--site", "blog", "--plugin", "akismet"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("Could not copy file."), "output:\n{text}");
    assert!(text.contains("1 of 1 updates failed"), "output:\n{text}");

    let state = ws.state();
    assert_eq!(state["update_log"][0]["status"], "failed");
}

#[test]
fn test_json_logs_go_to_stderr() {
    let ws = Workspace::new(BLOG_CONFIG);
    let output = ws
        .cmd(&["-v", "--log-format", "json", "due", "-o", "plain"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "blog");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.lines().all(|l| l.starts_with('{')),
        "non-JSON log line:\n{stderr}"
    );
}
