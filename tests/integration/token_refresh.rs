//! Integration tests for the OAuth2 refresh grant

use reqloop::sink::{LogLevel, RecordingSink};
use reqloop::token::{Token, TokenRefreshError};
use reqloop::transport::{Headers, ReqwestTransport};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_for(server: &MockServer) -> Token {
    Token::new(format!("{}/oauth/token", server.uri()), "client-1", "s3cret", "r1")
}

#[tokio::test]
async fn test_refresh_sends_grant_and_stores_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=r1"))
        .and(body_string_contains("client_id=client-1"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "a1", "refresh_token": "r2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let sink = RecordingSink::new();
    let mut token = token_for(&server);

    let access = token
        .refresh_access_token(&transport, &Headers::new(), &sink)
        .await
        .unwrap();

    assert_eq!(access, "a1");
    assert_eq!(token.access_token(), "a1");
    assert_eq!(token.refresh_token(), "r2");
    assert!(token.is_authenticated());
    assert!(sink.messages(LogLevel::Error).is_empty());
}

#[tokio::test]
async fn test_refresh_follows_nested_paths() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"tokens": {"access": "nested-a", "refresh": "nested-r"}}
        })))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let sink = RecordingSink::new();
    let mut token = token_for(&server)
        .with_access_token_path(vec!["data".into(), "tokens".into(), "access".into()])
        .with_refresh_token_path(vec!["data".into(), "tokens".into(), "refresh".into()]);

    token
        .refresh_access_token(&transport, &Headers::new(), &sink)
        .await
        .unwrap();

    assert_eq!(token.access_token(), "nested-a");
    assert_eq!(token.refresh_token(), "nested-r");
}

#[tokio::test]
async fn test_refresh_keeps_refresh_token_when_absent_or_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "a1", "refresh_token": ""})),
        )
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let mut token = token_for(&server);

    token
        .refresh_access_token(&transport, &Headers::new(), &RecordingSink::new())
        .await
        .unwrap();

    assert_eq!(token.access_token(), "a1");
    assert_eq!(token.refresh_token(), "r1");
}

#[tokio::test]
async fn test_refresh_non_200_leaves_state_unchanged() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let sink = RecordingSink::new();
    let mut token = token_for(&server).with_access_token("a0");

    let err = token
        .refresh_access_token(&transport, &Headers::new(), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, TokenRefreshError::UnexpectedStatus(400)));
    assert_eq!(token.access_token(), "a0");
    assert_eq!(token.refresh_token(), "r1");
    assert_eq!(
        sink.messages(LogLevel::Error),
        vec!["Token refresh failed with status code 400"]
    );
}

#[tokio::test]
async fn test_refresh_invalid_json_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let mut token = token_for(&server).with_access_token("a0");

    let err = token
        .refresh_access_token(&transport, &Headers::new(), &RecordingSink::new())
        .await
        .unwrap_err();

    assert!(matches!(err, TokenRefreshError::InvalidJson(_)));
    assert_eq!(token.access_token(), "a0");
}

#[tokio::test]
async fn test_refresh_missing_access_token_clears_previous() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "bearer"})))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new().unwrap();
    let mut token = token_for(&server).with_access_token("a0");

    let access = token
        .refresh_access_token(&transport, &Headers::new(), &RecordingSink::new())
        .await
        .unwrap();

    assert_eq!(access, "");
    assert!(!token.is_authenticated());
}

#[tokio::test]
async fn test_refresh_unreachable_endpoint() {
    let transport = ReqwestTransport::new().unwrap();
    let sink = RecordingSink::new();
    let mut token = Token::new("http://127.0.0.1:1/oauth/token", "id", "secret", "r1");

    let err = token
        .refresh_access_token(&transport, &Headers::new(), &sink)
        .await
        .unwrap_err();

    assert!(matches!(err, TokenRefreshError::Transport(_)));
    assert_eq!(sink.messages(LogLevel::Error).len(), 1);
}

#[tokio::test]
async fn test_refresh_forwards_caller_headers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("x-tenant", "acme"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a1"})))
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = Headers::new();
    headers.insert("X-Tenant".to_string(), "acme".to_string());

    let transport = ReqwestTransport::new().unwrap();
    let mut token = token_for(&server);
    token
        .refresh_access_token(&transport, &headers, &RecordingSink::new())
        .await
        .unwrap();

    assert_eq!(token.access_token(), "a1");
}
