//! Request execution against a mock server

mod common;

use apiwrap::{ApiError, Client, ClientConfig, ErrorKind, RequestKwargs};
use apiwrap_core::rate_limit::ThrottleConfig;
use common::{client, BrokenRefreshAdapter, FailTokenRefreshAdapter, TokenRefreshAdapter};
use serde_json::json;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount(server: &MockServer, verb: &str, status: u16, body: serde_json::Value) {
    Mock::given(method(verb))
        .and(path("/test/"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_get_wraps_response_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test/"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"key": "value"}})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server.uri())
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new().param("page", 2))
        .await
        .unwrap();

    assert_eq!(response.data(), &json!({"data": {"key": "value"}}));
    assert_eq!(response.status_code().unwrap(), 200);
    assert_eq!(
        response.request_kwargs().and_then(|k| k.url.as_deref()),
        Some(format!("{}/test/", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_verbs() {
    let server = MockServer::start().await;
    for verb in ["POST", "PUT", "PATCH", "DELETE", "OPTIONS"] {
        Mock::given(method(verb))
            .and(path("/test/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"verb": verb})))
            .expect(1)
            .mount(&server)
            .await;
    }

    let executor = client(&server.uri()).attr("test").unwrap().call().unwrap();
    let responses = [
        executor.post(RequestKwargs::new()).await.unwrap(),
        executor.put(RequestKwargs::new()).await.unwrap(),
        executor.patch(RequestKwargs::new()).await.unwrap(),
        executor.delete(RequestKwargs::new()).await.unwrap(),
        executor.options(RequestKwargs::new()).await.unwrap(),
    ];
    let verbs: Vec<_> = responses
        .iter()
        .map(|r| r.attr("verb").unwrap().into_data())
        .collect();
    assert_eq!(verbs, vec!["POST", "PUT", "PATCH", "DELETE", "OPTIONS"]);
}

#[tokio::test]
async fn test_post_sends_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/test/"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"name": "apiwrap", "tags": ["http"]})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let created = client(&server.uri())
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .post(RequestKwargs::new().data(json!({"name": "apiwrap", "tags": ["http"]})))
        .await
        .unwrap();

    assert_eq!(created.status_code().unwrap(), 201);
    assert_eq!(created.attr("id").unwrap().data(), &json!(1));
}

#[tokio::test]
async fn test_empty_body_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/test/"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let deleted = client(&server.uri())
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .delete(RequestKwargs::new())
        .await
        .unwrap();
    assert!(deleted.data().is_null());
}

#[tokio::test]
async fn test_error_carries_client_and_status() {
    let server = MockServer::start().await;
    mount(&server, "GET", 400, json!({"data": {"key": "value"}})).await;

    let err = client(&server.uri())
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "response status code: 400");
    assert_eq!(err.kind(), Some(ErrorKind::BadRequest));
    assert_eq!(err.status_code(), Some(400));
    assert!(err.is_client_error());

    let response_error = err.response_error().unwrap();
    assert_eq!(response_error.data(), &json!({"data": {"key": "value"}}));
    assert_eq!(
        response_error.client.attr("data").unwrap().attr("key").unwrap().data(),
        "value"
    );
}

#[tokio::test]
async fn test_adapter_error_message() {
    let server = MockServer::start().await;
    mount(&server, "GET", 404, json!({"error": "no such thing"})).await;

    let err = client(&server.uri())
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "no such thing");
    assert_eq!(err.kind(), Some(ErrorKind::NotFound));
    assert!(err.kind().unwrap().is_client_error());
}

#[tokio::test]
async fn test_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::ServerError));
    assert!(err.is_server_error());
    assert!(err.response_error().unwrap().data().is_null());
}

#[tokio::test]
async fn test_unparsable_success_body_is_json_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server.uri())
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Json(_)));
}

async fn mount_token_endpoints(server: &MockServer, expected_success: u64, expected_expired: u64) {
    Mock::given(method("GET"))
        .and(path("/test/"))
        .and(header("authorization", "Bearer new_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .with_priority(1)
        .expect(expected_success)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/test/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "expired"})))
        .expect(expected_expired)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_token_refresh_retries_once() {
    let server = MockServer::start().await;
    mount_token_endpoints(&server, 1, 1).await;

    let adapter = TokenRefreshAdapter::new(server.uri());
    let refreshes = adapter.refreshes.clone();
    let client = Client::builder(adapter)
        .refresh_token_by_default(true)
        .build()
        .unwrap();

    let response = client
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap();

    assert_eq!(response.attr("ok").unwrap().data(), &json!(true));
    assert_eq!(response.refresh_data(), Some(json!("new_token")));
    assert_eq!(client.api_params().get_str("token").as_deref(), Some("new_token"));
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_token_refresh_per_call_opt_in_is_ignored() {
    let server = MockServer::start().await;
    mount_token_endpoints(&server, 0, 1).await;

    let adapter = TokenRefreshAdapter::new(server.uri());
    let refreshes = adapter.refreshes.clone();
    let client = Client::new(adapter).unwrap();

    let err = client
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new().refresh_token(true))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidCredentials));
    assert_eq!(refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_refresh_per_call_opt_out() {
    let server = MockServer::start().await;
    mount_token_endpoints(&server, 0, 1).await;

    let adapter = TokenRefreshAdapter::new(server.uri());
    let refreshes = adapter.refreshes.clone();
    let client = Client::builder(adapter)
        .refresh_token_by_default(true)
        .build()
        .unwrap();

    let err = client
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new().refresh_token(false))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), Some(ErrorKind::InvalidCredentials));
    assert_eq!(refreshes.load(Ordering::SeqCst), 0);
    assert_eq!(err.response_error().unwrap().client.refresh_data(), None);
}

#[tokio::test]
async fn test_token_refresh_is_kept_by_the_executor() {
    let server = MockServer::start().await;
    mount_token_endpoints(&server, 2, 1).await;

    let adapter = TokenRefreshAdapter::new(server.uri());
    let refreshes = adapter.refreshes.clone();
    let client = Client::builder(adapter)
        .refresh_token_by_default(true)
        .build()
        .unwrap();

    let executor = client.attr("test").unwrap().call().unwrap();
    assert_eq!(executor.refresh_data(), None);

    executor.get(RequestKwargs::new()).await.unwrap();
    assert_eq!(executor.refresh_data(), Some(json!("new_token")));

    let second = executor.get(RequestKwargs::new()).await.unwrap();
    assert_eq!(second.refresh_data(), Some(json!("new_token")));
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);

    // a fresh executor from the same client starts clean
    let other = client.attr("test").unwrap().call().unwrap();
    assert_eq!(other.refresh_data(), None);
}

#[tokio::test]
async fn test_token_refresh_retry_resends_params_and_body() {
    let server = MockServer::start().await;
    let body = json!({"name": "apiwrap", "tags": ["http"]});
    Mock::given(method("POST"))
        .and(path("/test/"))
        .and(query_param("page", "2"))
        .and(body_json(body.clone()))
        .and(header("authorization", "Bearer new_token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 1})))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/test/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "expired"})))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = TokenRefreshAdapter::new(server.uri());
    let client = Client::builder(adapter)
        .refresh_token_by_default(true)
        .build()
        .unwrap();

    let created = client
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .post(RequestKwargs::new().param("page", 2).data(body))
        .await
        .unwrap();
    assert_eq!(created.status_code().unwrap(), 201);
    assert_eq!(created.attr("id").unwrap().data(), &json!(1));
}

#[tokio::test]
async fn test_refresh_error_is_propagated() {
    let server = MockServer::start().await;
    mount_token_endpoints(&server, 0, 1).await;

    let adapter = BrokenRefreshAdapter::new(server.uri());
    let refreshes = adapter.refreshes.clone();
    let client = Client::builder(adapter)
        .refresh_token_by_default(true)
        .build()
        .unwrap();

    let executor = client.attr("test").unwrap().call().unwrap();
    let err = executor.get(RequestKwargs::new()).await.unwrap_err();

    assert!(matches!(err, ApiError::Config(ref msg) if msg == "refresh endpoint unavailable"));
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(executor.refresh_data(), None);
}

#[tokio::test]
async fn test_token_refresh_disabled_by_default() {
    let server = MockServer::start().await;
    mount_token_endpoints(&server, 0, 1).await;

    let adapter = TokenRefreshAdapter::new(server.uri());
    let refreshes = adapter.refreshes.clone();
    let client = Client::new(adapter).unwrap();

    let err = client
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::InvalidCredentials));
    assert_eq!(refreshes.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_token_refresh_never_refreshes_twice() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test/"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let adapter = TokenRefreshAdapter::new(server.uri());
    let refreshes = adapter.refreshes.clone();
    let client = Client::builder(adapter)
        .refresh_token_by_default(true)
        .build()
        .unwrap();

    let err = client
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(401));
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
    assert_eq!(
        err.response_error().unwrap().client.refresh_data(),
        Some(json!("new_token"))
    );
}

#[tokio::test]
async fn test_failed_refresh_returns_original_error() {
    let server = MockServer::start().await;
    mount_token_endpoints(&server, 0, 1).await;

    let adapter = FailTokenRefreshAdapter::new(server.uri());
    let refreshes = adapter.refreshes.clone();
    let client = Client::builder(adapter)
        .refresh_token_by_default(true)
        .build()
        .unwrap();

    let err = client
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), Some(ErrorKind::InvalidCredentials));
    assert_eq!(err.to_string(), "response status code: 401");
    assert_eq!(refreshes.load(Ordering::SeqCst), 1);
}

fn rate_limited(remaining: &str, reset: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_json(json!({"data": []}))
        .insert_header("X-RateLimit-Remaining", remaining)
        .insert_header("X-RateLimit-Reset", reset)
}

#[tokio::test]
async fn test_throttle_waits_reset_over_remaining() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test/"))
        .respond_with(rate_limited("50", "100"))
        .expect(1)
        .mount(&server)
        .await;

    let executor = client(&server.uri()).attr("test").unwrap().call().unwrap();
    let start = Instant::now();
    executor.get(RequestKwargs::new()).await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test]
async fn test_throttle_skipped_above_threshold_or_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/test/"))
        .respond_with(rate_limited("500", "100"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/1/"))
        .respond_with(rate_limited("1", "100"))
        .mount(&server)
        .await;

    let start = Instant::now();
    client(&server.uri())
        .attr("test")
        .unwrap()
        .call()
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap();

    let unthrottled = common::builder(&server.uri())
        .config(ClientConfig::default().with_rate_limit(ThrottleConfig::disabled()))
        .build()
        .unwrap();
    unthrottled
        .attr("user")
        .unwrap()
        .call_with([("id", 1)])
        .unwrap()
        .get(RequestKwargs::new())
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(2));
}
