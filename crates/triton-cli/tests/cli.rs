//! The `triton` binary against the scripted test server.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use ssh_key::private::Ed25519Keypair;
use ssh_key::{LineEnding, PrivateKey};
use triton_auth::KeyPair;
use triton_test_server::{Reply, TestServer};

const VM: &str = "b4f0b46c-1111-4000-8000-000000000001";

/// Writes an unencrypted OpenSSH key and returns its path and fingerprint.
fn write_key(dir: &Path) -> (PathBuf, String) {
    let key = PrivateKey::from(Ed25519Keypair::from_seed(&[9u8; 32]));
    let pem = key.to_openssh(LineEnding::LF).expect("encode key");
    let path = dir.join("id_ed25519");
    std::fs::write(&path, pem.as_bytes()).expect("write key");
    let fingerprint = KeyPair::from_file(&path)
        .expect("load key")
        .fingerprint()
        .to_string();
    (path, fingerprint)
}

fn triton(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("triton").expect("binary");
    cmd.env("TRITONTEST_CLI_CONFIG_DIR", config_dir);
    for var in [
        "TRITON_PROFILE",
        "TRITON_URL",
        "TRITON_ACCOUNT",
        "TRITON_USER",
        "TRITON_KEY_ID",
        "TRITON_KEY_FILE",
        "TRITON_TLS_INSECURE",
        "SDC_URL",
        "SDC_ACCOUNT",
        "SDC_USER",
        "SDC_KEY_ID",
        "SDC_TESTING",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn configured(config_dir: &Path, url: &str) -> Command {
    let (key_file, key_id) = write_key(config_dir);
    let mut cmd = triton(config_dir);
    cmd.env("TRITON_URL", url)
        .env("TRITON_ACCOUNT", "alice")
        .env("TRITON_KEY_ID", key_id)
        .env("TRITON_KEY_FILE", key_file);
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = tempfile::tempdir().expect("tempdir");
    triton(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("instance"))
        .stdout(predicate::str::contains("changefeed"));
}

#[test]
fn test_missing_profile_is_a_config_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    triton(dir.path())
        .args(["instance", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no profile"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_not_found_exits_3() {
    let server = TestServer::start(|_| Reply::error(404, "ResourceNotFound", "no such machine"))
        .await
        .expect("server");
    let url = server.url();
    let dir = tempfile::tempdir().expect("tempdir");
    let config_dir = dir.path().to_path_buf();

    let assert = tokio::task::spawn_blocking(move || {
        configured(&config_dir, &url)
            .args(["instance", "get", VM])
            .assert()
    })
    .await
    .expect("join");
    assert
        .code(3)
        .stderr(predicate::str::contains(format!("no instance with id or name \"{VM}\"")));
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_instance_list_json() {
    let server = TestServer::start(|req| {
        if req.route() == "GET /alice/machines" {
            Reply::json(
                200,
                &json!([{"id": VM, "name": "web", "state": "running", "tags": {}}]),
            )
        } else {
            Reply::error(404, "ResourceNotFound", "nope")
        }
    })
    .await
    .expect("server");
    let url = server.url();
    let dir = tempfile::tempdir().expect("tempdir");
    let config_dir = dir.path().to_path_buf();

    let assert = tokio::task::spawn_blocking(move || {
        configured(&config_dir, &url)
            .args(["--format", "json", "instance", "list"])
            .assert()
    })
    .await
    .expect("join");
    let output = assert.success().get_output().stdout.clone();
    let listed: serde_json::Value = serde_json::from_slice(&output).expect("json output");
    assert_eq!(listed[0]["name"], json!("web"));
    assert!(
        server
            .requests()
            .iter()
            .all(|r| r.header("authorization").is_some_and(|a| a.starts_with("Signature ")))
    );
    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_instance_list_table() {
    let server = TestServer::start(|_| {
        Reply::json(
            200,
            &json!([{"id": VM, "name": "web", "state": "running", "primaryIp": "10.0.0.5", "package": "g4", "tags": {}}]),
        )
    })
    .await
    .expect("server");
    let url = server.url();
    let dir = tempfile::tempdir().expect("tempdir");
    let config_dir = dir.path().to_path_buf();

    let assert = tokio::task::spawn_blocking(move || {
        configured(&config_dir, &url).args(["instance", "ls"]).assert()
    })
    .await
    .expect("join");
    assert
        .success()
        .stdout(predicate::str::starts_with("SHORTID"))
        .stdout(predicate::str::contains("b4f0b46c  web"));
    server.shutdown().await;
}
