//! CLI tests driven through the compiled binary

use assert_cmd::Command;
use serde_json::json;
use std::fs;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &TempDir, config: serde_json::Value) -> std::path::PathBuf {
    let path = dir.path().join("run.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

#[test]
fn test_validate_prints_summary() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        &temp_dir,
        json!({
            "method": "post",
            "url": "https://api.example.com/items",
            "payloads": [{"x": 1}, {"x": 2}],
            "loops": 2
        }),
    );

    let output = Command::cargo_bin("reqloop")
        .unwrap()
        .args(["validate", "--config", config.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Method: POST"), "stdout: {stdout}");
    assert!(stdout.contains("Total requests: 4"), "stdout: {stdout}");
}

#[test]
fn test_validate_rejects_zero_loops() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_config(
        &temp_dir,
        json!({"method": "GET", "url": "https://api.example.com/", "loops": 0}),
    );

    Command::cargo_bin("reqloop")
        .unwrap()
        .args(["validate", "--config", config.to_str().unwrap()])
        .assert()
        .failure();
}

#[test]
fn test_run_missing_config_fails() {
    let temp_dir = TempDir::new().unwrap();

    Command::cargo_bin("reqloop")
        .unwrap()
        .args([
            "run",
            "--config",
            temp_dir.path().join("absent.json").to_str().unwrap(),
        ])
        .assert()
        .failure();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_run_writes_output_with_overrides() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200).set_body_string("pong"))
        .expect(3)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let out = temp_dir.path().join("responses.txt");
    let config = write_config(
        &temp_dir,
        json!({
            "method": "GET",
            "url": format!("{}/ping", server.uri()),
            "loops": 1
        }),
    );

    let config_arg = config.to_str().unwrap().to_string();
    let out_arg = out.to_str().unwrap().to_string();
    let status = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("reqloop")
            .unwrap()
            .args([
                "run",
                "--config",
                &config_arg,
                "--loops",
                "3",
                "--save-output",
                "--output-file",
                &out_arg,
            ])
            .output()
            .unwrap()
            .status
    })
    .await
    .unwrap();

    assert!(status.success());
    assert_eq!(fs::read_to_string(&out).unwrap(), "pong\npong\npong\n");
}
