//! CLI integration tests.
//!
//! Runs the `refgraph` binary with an isolated home directory. Commands
//! that talk to the remote service run against a wiremock server.

use std::path::Path;

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A `refgraph` command that ignores the developer's real config and environment.
fn refgraph(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("refgraph").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join("xdg"))
        .env_remove("REFGRAPH_CONFIG")
        .env_remove("REFGRAPH_BASE_URL")
        .env_remove("REFGRAPH_ACCOUNT_ID")
        .env_remove("REFGRAPH_API_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &TempDir, base_url: &str) -> std::path::PathBuf {
    let config = dir.child("config.toml");
    config
        .write_str(&format!(
            r#"
[remote]
base_url = "{}"
account_id = "acct"

[retry]
base_delay_ms = 0
max_jitter_ms = 0

[discovery]
root_id = "R"
"#,
            base_url
        ))
        .unwrap();
    config.path().to_path_buf()
}

async fn mount_example(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/accounts/acct/resources/R"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "Root", "type": "Process", "version": 1
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/accounts/acct/resources/A"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "A", "type": "Connector", "version": 1
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct/references/query"))
        .and(body_json(json!({ "filter": { "parentId": "R", "parentVersion": 1 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [ { "references": [ { "id": "A" }, { "id": "B" } ] } ]
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts/acct/references/query"))
        .and(body_json(json!({ "filter": { "parentId": "A", "parentVersion": 1 } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .mount(server)
        .await;
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    refgraph(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("discover"))
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("completion"));
}

#[test]
fn discover_without_config_reports_missing_setting() {
    let home = TempDir::new().unwrap();
    refgraph(home.path())
        .arg("discover")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains(
            "missing required setting 'remote.base_url'",
        ));
}

#[test]
fn discover_without_token_reports_missing_token() {
    let home = TempDir::new().unwrap();
    let config = write_config(&home, "http://127.0.0.1:9");
    refgraph(home.path())
        .arg("--config")
        .arg(&config)
        .arg("discover")
        .assert()
        .failure()
        .stderr(predicate::str::contains("remote.api_token"));
}

#[test]
fn explicit_config_must_exist() {
    let home = TempDir::new().unwrap();
    refgraph(home.path())
        .args(["--config", "does-not-exist.toml", "config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn unknown_config_keys_are_rejected() {
    let home = TempDir::new().unwrap();
    let config = home.child("config.toml");
    config.write_str("[remote]\nbase_uri = \"https://x\"\n").unwrap();

    refgraph(home.path())
        .arg("--config")
        .arg(config.path())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn config_path_defaults_to_home() {
    let home = TempDir::new().unwrap();
    let expected = home.path().join(".refgraph/config.toml");
    refgraph(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn config_path_finds_xdg_file() {
    let home = TempDir::new().unwrap();
    let xdg = home.child("xdg/refgraph/config.toml");
    xdg.write_str("").unwrap();

    refgraph(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(xdg.path().display().to_string()));
}

#[test]
fn config_show_redacts_token() {
    let home = TempDir::new().unwrap();
    let config = home.child("config.toml");
    config
        .write_str(
            "[remote]\nbase_url = \"https://api.example.com\"\naccount_id = \"acct\"\napi_token = \"supersecret\"\n",
        )
        .unwrap();

    refgraph(home.path())
        .arg("--config")
        .arg(config.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("supersecret").not())
        .stdout(predicate::str::contains("max_in_flight = 8"));
}

#[test]
fn completion_generates_script() {
    let home = TempDir::new().unwrap();
    refgraph(home.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("refgraph"));
}

#[tokio::test(flavor = "multi_thread")]
async fn discover_writes_graph_file() {
    let server = MockServer::start().await;
    mount_example(&server).await;
    let home = TempDir::new().unwrap();
    let config = write_config(&home, &server.uri());
    let out = home.child("out/graph.json");

    let mut cmd = refgraph(home.path());
    cmd.env("REFGRAPH_API_TOKEN", "tok")
        .arg("--config")
        .arg(&config)
        .arg("discover")
        .arg("-o")
        .arg(out.path());
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert
        .success()
        .stderr(predicate::str::contains(
            "Discovered 2 resources and 2 references, 1 dangling",
        ));
    out.assert(
        r#"{"nodes":[{"id":"R","name":"Root","category":"Process"},{"id":"A","name":"A","category":"Connector"}],"edges":[{"source":"R","target":"A"},{"source":"R","target":"B"}]}"#,
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn discover_to_stdout_with_root_argument() {
    let server = MockServer::start().await;
    mount_example(&server).await;
    let home = TempDir::new().unwrap();
    let config = write_config(&home, &server.uri());

    let mut cmd = refgraph(home.path());
    cmd.env("REFGRAPH_API_TOKEN", "tok")
        .current_dir(home.path())
        .arg("--config")
        .arg(&config)
        .args(["-q", "discover", "A", "--stdout"]);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert.success().stdout(predicate::eq(
        "{\"nodes\":[{\"id\":\"A\",\"name\":\"A\",\"category\":\"Connector\"}],\"edges\":[]}\n",
    ));
    home.child("graph.json").assert(predicate::path::missing());
}

#[tokio::test(flavor = "multi_thread")]
async fn discover_missing_root_fails() {
    let server = MockServer::start().await;
    let home = TempDir::new().unwrap();
    let config = write_config(&home, &server.uri());

    let mut cmd = refgraph(home.path());
    cmd.env("REFGRAPH_API_TOKEN", "tok")
        .arg("--config")
        .arg(&config)
        .args(["discover", "--stdout"]);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert
        .failure()
        .code(1)
        .stderr(predicate::str::contains("root resource 'R' was not found"));
}

#[tokio::test(flavor = "multi_thread")]
async fn lookup_prints_resource_and_references() {
    let server = MockServer::start().await;
    mount_example(&server).await;
    let home = TempDir::new().unwrap();
    let config = write_config(&home, &server.uri());

    let mut cmd = refgraph(home.path());
    cmd.env("REFGRAPH_API_TOKEN", "tok")
        .arg("--config")
        .arg(&config)
        .args(["lookup", "R"]);
    let assert = tokio::task::spawn_blocking(move || cmd.assert())
        .await
        .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("R  Root (Process)"))
        .stdout(predicate::str::contains("references (2):"))
        .stdout(predicate::str::contains("  B"));
}
