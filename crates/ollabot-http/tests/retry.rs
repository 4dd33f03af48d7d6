use httpmock::prelude::*;
use httpmock::Method::HEAD;
use ollabot_http::{HttpError, RetryPolicy, RetryableHttpClient};
use serde_json::json;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn fast_policy() -> RetryPolicy {
    RetryPolicy::default().with_backoff_factor(Duration::from_millis(1))
}

#[tokio::test]
async fn retries_three_times_on_each_transient_status() {
    for code in [429, 500, 502, 503, 504] {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/tags");
                then.status(code);
            })
            .await;

        let client = RetryableHttpClient::new(server.base_url(), fast_policy()).unwrap();
        let response = client.get("/api/tags", TIMEOUT).await.unwrap();

        assert_eq!(response.status().as_u16(), code);
        assert_eq!(mock.hits_async().await, 4, "status {code}");
    }
}

#[tokio::test]
async fn does_not_retry_client_errors() {
    for code in [400, 404] {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/generate");
                then.status(code).json_body(json!({"error": "nope"}));
            })
            .await;

        let client = RetryableHttpClient::new(server.base_url(), fast_policy()).unwrap();
        let response = client
            .post("/api/generate", &json!({"model": "mistral"}), TIMEOUT)
            .await
            .unwrap();

        assert_eq!(response.status().as_u16(), code);
        assert_eq!(mock.hits_async().await, 1, "status {code}");
    }
}

#[tokio::test]
async fn post_is_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/generate")
                .json_body(json!({"model": "mistral", "prompt": "hi", "stream": false}));
            then.status(502);
        })
        .await;

    let client = RetryableHttpClient::new(server.base_url(), fast_policy()).unwrap();
    let body = json!({"model": "mistral", "prompt": "hi", "stream": false});
    client.post("/api/generate", &body, TIMEOUT).await.unwrap();

    mock.assert_hits_async(4).await;
}

#[tokio::test]
async fn head_is_retried() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(HEAD).path("/api/tags");
            then.status(504);
        })
        .await;

    let client = RetryableHttpClient::new(server.base_url(), fast_policy()).unwrap();
    let response = client.head("/api/tags", TIMEOUT).await.unwrap();

    assert_eq!(response.status().as_u16(), 504);
    assert!(response.text().is_empty());
    mock.assert_hits_async(4).await;
}

#[tokio::test(start_paused = true)]
async fn default_backoff_waits_at_least_seven_seconds() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(503);
        })
        .await;

    // Default factor of 1s: 1 + 2 + 4 seconds across three retries.
    let client = RetryableHttpClient::new(server.base_url(), RetryPolicy::default()).unwrap();

    let started = tokio::time::Instant::now();
    let outcome = client.get("/api/tags", Duration::from_secs(600)).await;

    assert!(started.elapsed() >= Duration::from_secs(7));
    match outcome {
        Ok(response) => assert_eq!(response.status().as_u16(), 503),
        Err(err) => assert!(err.is_transient(), "got {err:?}"),
    }
}

#[tokio::test]
async fn success_is_returned_without_retry() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200)
                .header("content-type", "application/json")
                .body(r#"{"models":[{"name":"mistral:latest"}]}"#);
        })
        .await;

    let client = RetryableHttpClient::new(server.base_url(), fast_policy()).unwrap();
    let value: serde_json::Value = client.get_json("/api/tags", TIMEOUT).await.unwrap();

    assert_eq!(value["models"][0]["name"], "mistral:latest");
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn timeouts_are_retried_then_reported() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/tags");
            then.status(200).delay(Duration::from_millis(500));
        })
        .await;

    let policy = fast_policy().with_max_retries(2);
    let client = RetryableHttpClient::new(server.base_url(), policy).unwrap();
    let timeout = Duration::from_millis(100);
    let err = client.get("/api/tags", timeout).await.unwrap_err();

    assert_eq!(err, HttpError::Timeout(timeout));
    assert_eq!(mock.hits_async().await, 3);
}

#[tokio::test]
async fn unreachable_host_is_a_connection_error() {
    let client = RetryableHttpClient::new("http://127.0.0.1:1", fast_policy()).unwrap();
    let err = client.get("/api/tags", TIMEOUT).await.unwrap_err();

    assert!(matches!(err, HttpError::Connection(_)), "got {err:?}");
}
