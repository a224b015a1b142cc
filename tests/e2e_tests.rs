//! End-to-end tests for the full pipeline
//!
//! The binary runs against a stand-in transfer tool (a shell script that
//! answers per candidate address) and mock geolocation services, so the whole
//! read -> locate -> probe -> sort -> write path runs without real network
//! access.

#![cfg(unix)]

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

/// `$3` is the `--resolve host:port:address` value
const FAKE_CURL: &str = r#"#!/bin/sh
case "$3" in
  *:104.16.0.1) printf 'speed_download:5242880.000\nsize:10485760\n' ;;
  *:104.16.0.2) printf 'speed_download:20971520.000\nsize:10485760\n' ;;
  *:104.16.0.3) printf 'speed_download:9000000.000\nsize:1000\n' ;;
  *:104.16.0.5) printf 'speed_download:5242880.000\nsize:10485760\n' ;;
  *) echo "curl: (7) Failed to connect" >&2; exit 7 ;;
esac
"#;

const CANDIDATES: &str = "\
# test pool
104.16.0.1:443 # slow but complete
104.16.0.2 # fastest
104.16.0.3:2053 # short transfer
104.16.0.4:2096 # unreachable
104.16.0.5:8443 # ties with the first
";

fn write_fake_curl(dir: &Path) -> PathBuf {
    let path = dir.join("fake-curl.sh");
    fs::write(&path, FAKE_CURL).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

async fn mount_geo(primary: &MockServer, fallback: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/json/104.16.0.1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"status":"success","country":"Japan","regionName":"Tokyo","city":"Tokyo"}"#,
        ))
        .mount(primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/json/104.16.0.2"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(primary)
        .await;
    Mock::given(method("GET"))
        .and(path("/104.16.0.2/country_name/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("United States"))
        .mount(fallback)
        .await;
    // Everything else is unmatched and gets 404 from both services
}

fn create_test_cmd(dir: &Path, primary: &MockServer, fallback: &MockServer, curl: &Path) -> Command {
    let mut cmd = Command::cargo_bin("ipst").unwrap();
    cmd.current_dir(dir)
        .env("NO_COLOR", "1")
        .env("GEO_PRIMARY_URL", primary.uri())
        .env("GEO_FALLBACK_URL", fallback.uri())
        .env("GEO_TIMEOUT_SECONDS", "5")
        .env_remove("LANGUAGE")
        .args(["--delay-ms", "0", "--retries", "0", "--curl"])
        .arg(curl);
    cmd
}

#[tokio::test(flavor = "multi_thread")]
async fn test_full_pipeline_ranks_reachable_candidates() {
    let dir = TempDir::new().unwrap();
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    mount_geo(&primary, &fallback).await;

    fs::write(dir.path().join("ip.txt"), CANDIDATES).unwrap();
    let curl = write_fake_curl(dir.path());

    create_test_cmd(dir.path(), &primary, &fallback, &curl)
        .assert()
        .success()
        .stdout(predicate::str::contains("[5/5]"))
        .stdout(predicate::str::contains("3 result(s) saved"));

    let report = fs::read_to_string(dir.path().join("speed_ip.txt")).unwrap();
    let lines: Vec<&str> = report.lines().collect();

    assert_eq!(lines, vec![
        "104.16.0.2:8443#美国 20.0MB/s",
        "104.16.0.1:443#日本 5.0MB/s",
        "104.16.0.5:8443#未知 5.0MB/s",
    ]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_english_detail_plus_separator() {
    let dir = TempDir::new().unwrap();
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;
    mount_geo(&primary, &fallback).await;

    fs::write(dir.path().join("ip.txt"), CANDIDATES).unwrap();
    let curl = write_fake_curl(dir.path());

    create_test_cmd(dir.path(), &primary, &fallback, &curl)
        .args(["--lang", "en", "--geo-detail", "--plus-separator", "--header"])
        .assert()
        .success();

    let report = fs::read_to_string(dir.path().join("speed_ip.txt")).unwrap();
    let entries: Vec<&str> = report.lines().filter(|l| !l.starts_with('#')).collect();

    assert!(report.starts_with('#'));
    assert_eq!(entries, vec![
        "104.16.0.2:8443#United States+20.0MB/s",
        "104.16.0.1:443#Japan-Tokyo+5.0MB/s",
        "104.16.0.5:8443#Unknown+5.0MB/s",
    ]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_report_is_replaced_on_rerun() {
    let dir = TempDir::new().unwrap();
    let primary = MockServer::start().await;
    let fallback = MockServer::start().await;

    fs::write(dir.path().join("speed_ip.txt"), "stale contents\n").unwrap();
    fs::write(dir.path().join("ip.txt"), "104.16.0.4 # unreachable\n").unwrap();
    let curl = write_fake_curl(dir.path());

    create_test_cmd(dir.path(), &primary, &fallback, &curl)
        .assert()
        .success();

    let report = fs::read_to_string(dir.path().join("speed_ip.txt")).unwrap();
    assert!(report.is_empty());
}
