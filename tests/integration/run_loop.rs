//! End-to-end runs against a mock endpoint

use reqloop::condition::Condition;
use reqloop::runner::{BodyEncoding, OutputConfig, RequestRunner, RequestSpec, RunSettings};
use reqloop::sink::{LogLevel, RecordingSink};
use reqloop::token::Token;
use reqloop::transport::{Payload, ReqwestTransport};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload(value: serde_json::Value) -> Payload {
    value.as_object().cloned().unwrap()
}

fn transport() -> Arc<ReqwestTransport> {
    Arc::new(ReqwestTransport::new().unwrap())
}

#[tokio::test]
async fn test_post_loops_and_saves_every_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({"x": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_string("one"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({"x": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_string("two"))
        .expect(2)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("output.txt");
    let spec = RequestSpec::new(Method::POST, format!("{}/items", server.uri()))
        .with_payloads(vec![payload(json!({"x": 1})), payload(json!({"x": 2}))])
        .with_body_encoding(BodyEncoding::Json);
    let settings = RunSettings {
        loops: 2,
        output: OutputConfig {
            save_output: true,
            output_file: out.clone(),
            append: false,
        },
        ..RunSettings::default()
    };

    let mut runner = RequestRunner::new(spec, settings, transport());
    assert_eq!(runner.total_requests(), 4);
    runner.run().await;

    assert_eq!(runner.completed_requests(), 4);
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "one\ntwo\none\ntwo\n");
}

#[tokio::test]
async fn test_401_refresh_then_retry_with_new_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("secret data"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "fresh", "refresh_token": "r2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let token = Token::new(format!("{}/token", server.uri()), "id", "secret", "r1").shared();
    let settings = RunSettings {
        loops: 3,
        output: OutputConfig {
            save_output: true,
            output_file: dir.path().join("out.txt"),
            append: false,
        },
        ..RunSettings::default()
    };

    let mut runner = RequestRunner::new(
        RequestSpec::new(Method::GET, format!("{}/data", server.uri())),
        settings,
        transport(),
    )
    .with_token(token.clone());
    runner.run().await;

    // One refresh, then every request carries the new token
    assert_eq!(runner.results(), ["secret data", "secret data", "secret data"]);
    assert_eq!(
        runner.headers().get("Authorization").map(String::as_str),
        Some("Bearer fresh")
    );
    assert_eq!(token.lock().await.refresh_token(), "r2");

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 5);
}

#[tokio::test]
async fn test_second_401_is_processed_as_final() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/locked"))
        .respond_with(ResponseTemplate::new(401).set_body_string("still no"))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a1"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let denied = dir.path().join("denied.txt");
    let token = Token::new(format!("{}/token", server.uri()), "id", "secret", "r1").shared();
    let settings = RunSettings {
        conditions: vec![Condition::new(&denied).with_status_codes([401])],
        ..RunSettings::default()
    };

    let mut runner = RequestRunner::new(
        RequestSpec::new(Method::GET, format!("{}/locked", server.uri())),
        settings,
        transport(),
    )
    .with_token(token);
    runner.run().await;

    assert_eq!(std::fs::read_to_string(&denied).unwrap(), "still no\n");
}

#[tokio::test]
async fn test_conditions_split_responses_into_files() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(ResponseTemplate::new(200).set_body_string("status ok"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let ok_file = dir.path().join("ok.txt");
    let fail_file = dir.path().join("fail.txt");
    let settings = RunSettings {
        loops: 2,
        conditions: vec![
            Condition::new(&ok_file)
                .with_status_codes([200])
                .with_messages(["ok"]),
            Condition::new(&fail_file)
                .with_status_codes([200])
                .with_messages(["fail"]),
        ],
        ..RunSettings::default()
    };

    let mut runner = RequestRunner::new(
        RequestSpec::new(Method::GET, format!("{}/ok", server.uri())),
        settings,
        transport(),
    );
    runner.run().await;

    assert_eq!(std::fs::read_to_string(&ok_file).unwrap(), "status ok\nstatus ok\n");
    assert!(!fail_file.exists());
}

#[tokio::test]
async fn test_append_preserves_existing_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("new"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");
    let hits = dir.path().join("hits.txt");
    std::fs::write(&out, "old\n").unwrap();
    std::fs::write(&hits, "old hit\n").unwrap();

    let settings = RunSettings {
        output: OutputConfig {
            save_output: true,
            output_file: out.clone(),
            append: true,
        },
        conditions: vec![Condition::new(&hits)],
        ..RunSettings::default()
    };

    let mut runner = RequestRunner::new(RequestSpec::new(Method::GET, server.uri()), settings, transport());
    runner.run().await;

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "old\nnew\n");
    assert_eq!(std::fs::read_to_string(&hits).unwrap(), "old hit\nnew\n");
}

#[tokio::test]
async fn test_overwrite_truncates_existing_output() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("new"))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");
    std::fs::write(&out, "old\n").unwrap();

    let settings = RunSettings {
        output: OutputConfig {
            save_output: true,
            output_file: out.clone(),
            append: false,
        },
        ..RunSettings::default()
    };

    let mut runner = RequestRunner::new(RequestSpec::new(Method::GET, server.uri()), settings, transport());
    runner.run().await;

    assert_eq!(std::fs::read_to_string(&out).unwrap(), "new\n");
}

#[tokio::test]
async fn test_unreachable_endpoint_completes_run() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("out.txt");
    let sink = Arc::new(RecordingSink::new());
    let settings = RunSettings {
        loops: 3,
        output: OutputConfig {
            save_output: true,
            output_file: out.clone(),
            append: false,
        },
        ..RunSettings::default()
    };

    let mut runner = RequestRunner::new(
        RequestSpec::new(Method::GET, "http://127.0.0.1:1/"),
        settings,
        transport(),
    )
    .with_sink(sink.clone());
    runner.run().await;

    assert_eq!(runner.completed_requests(), 3);
    assert_eq!(sink.messages(LogLevel::Error).len(), 3);
    assert!(sink
        .messages(LogLevel::Info)
        .contains(&"Progress: 100.00%".to_string()));
    // Output file is still written, with no lines
    assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
}

#[tokio::test]
async fn test_shared_token_refreshed_once_across_runners() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a1"})))
        .expect(1)
        .mount(&server)
        .await;

    let token = Token::new(format!("{}/token", server.uri()), "id", "secret", "r1").shared();

    let mut first = RequestRunner::new(
        RequestSpec::new(Method::GET, server.uri()),
        RunSettings::default(),
        transport(),
    )
    .with_token(token.clone());
    let mut second = RequestRunner::new(
        RequestSpec::new(Method::GET, server.uri()),
        RunSettings::default(),
        transport(),
    )
    .with_token(token.clone());

    first.run().await;
    second.run().await;

    assert_eq!(token.lock().await.access_token(), "a1");
    assert_eq!(
        second.headers().get("Authorization").map(String::as_str),
        Some("Bearer a1")
    );
}
