//! HTTP transport tests against a wiremock server standing in for
//! `api.buildkite.com`.

use std::time::Duration;

use buildkite::HttpTransport;
use serde_json::json;
use trigger::{AccessToken, ApiRequest, BuildTransport, HttpMethod, RequestPurpose, TransportError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BUILDS_PATH: &str = "/v2/organizations/acme/pipelines/web/builds";

fn build_json(state: &str) -> serde_json::Value {
    json!({
        "id": "f62a1b4d-10f9-4790-bc1c-e2c3a0c80983",
        "number": 12,
        "url": "https://api.buildkite.com/v2/organizations/acme/pipelines/web/builds/12",
        "web_url": "https://buildkite.com/acme/web/builds/12",
        "state": state,
        "creator": {"name": "Octo Cat"}
    })
}

fn create_request(server: &MockServer) -> ApiRequest {
    ApiRequest {
        method: HttpMethod::Post,
        url: format!("{}{}", server.uri(), BUILDS_PATH),
        token: AccessToken::new("bk-token").unwrap(),
        body: Some(json!({"commit": "abc123", "branch": "main"})),
        purpose: RequestPurpose::CreateBuild,
    }
}

#[tokio::test]
async fn post_sends_bearer_token_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(BUILDS_PATH))
        .and(header("authorization", "Bearer bk-token"))
        .and(body_json(json!({"commit": "abc123", "branch": "main"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(build_json("scheduled")))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpTransport::new().unwrap();
    let build = transport.send(&create_request(&server)).await.unwrap();

    assert_eq!(build.number.as_u64(), 12);
    assert_eq!(build.state.as_str(), "scheduled");
    assert!(build.extra.contains_key("creator"));
}

#[tokio::test]
async fn get_polls_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{BUILDS_PATH}/12")))
        .and(header("authorization", "Bearer bk-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json({
            let mut b = build_json("passed");
            b["finished_at"] = json!("2024-05-01T12:00:00.000Z");
            b
        }))
        .expect(1)
        .mount(&server)
        .await;

    let request = ApiRequest {
        method: HttpMethod::Get,
        url: format!("{}{}/12", server.uri(), BUILDS_PATH),
        token: AccessToken::new("bk-token").unwrap(),
        body: None,
        purpose: RequestPurpose::PollBuild,
    };
    let build = HttpTransport::new().unwrap().send(&request).await.unwrap();

    assert!(build.is_finished());
}

#[tokio::test]
async fn non_success_status_carries_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(BUILDS_PATH))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "Authentication required"})),
        )
        .mount(&server)
        .await;

    let err = HttpTransport::new()
        .unwrap()
        .send(&create_request(&server))
        .await
        .unwrap_err();

    match err {
        TransportError::Status { status, body, .. } => {
            assert_eq!(status, 401);
            assert!(body.contains("Authentication required"));
        }
        other => panic!("expected Status error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(BUILDS_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = HttpTransport::new()
        .unwrap()
        .send(&create_request(&server))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Decode { .. }));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(BUILDS_PATH))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_json(build_json("scheduled"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let transport = HttpTransport::with_timeout(Duration::from_millis(100)).unwrap();
    let err = transport.send(&create_request(&server)).await.unwrap_err();

    assert!(
        matches!(err, TransportError::Timeout { .. }),
        "expected Timeout, got {err:?}"
    );
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let request = ApiRequest {
        method: HttpMethod::Post,
        url: format!("http://{addr}{BUILDS_PATH}"),
        token: AccessToken::new("bk-token").unwrap(),
        body: Some(json!({})),
        purpose: RequestPurpose::CreateBuild,
    };

    let err = HttpTransport::new().unwrap().send(&request).await.unwrap_err();

    assert!(
        matches!(err, TransportError::Network { .. }),
        "expected Network, got {err:?}"
    );
}
