use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, router, MockState, SearchResponse};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn empty_request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- search ---

#[tokio::test]
async fn search_users_filters_by_login() {
    let resp = app()
        .oneshot(empty_request("GET", "/search/users?q=taktem"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let result: SearchResponse = body_json(resp).await;
    assert_eq!(result.total_count, 2);
    assert!(!result.incomplete_results);
    assert_eq!(result.items[0].login, "taktem");
    assert_eq!(result.items[0].id, 1);
}

#[tokio::test]
async fn search_users_without_term_is_rejected() {
    let resp = app().oneshot(empty_request("GET", "/search/users")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body_bytes(resp).await, "Validation Failed");
}

#[tokio::test]
async fn search_users_with_no_match_is_empty() {
    let resp = app()
        .oneshot(empty_request("GET", "/search/users?q=zzz"))
        .await
        .unwrap();

    let result: SearchResponse = body_json(resp).await;
    assert_eq!(result.total_count, 0);
    assert!(result.items.is_empty());
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_query_in_order() {
    let resp = app()
        .oneshot(empty_request("GET", "/echo?list%5B%5D=1&list%5B%5D=2&q=a+b"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echoed: Value = body_json(resp).await;
    assert_eq!(echoed["method"], "GET");
    assert_eq!(echoed["path"], "/echo");
    assert_eq!(
        echoed["query"],
        serde_json::json!([["list[]", "1"], ["list[]", "2"], ["q", "a b"]])
    );
    assert_eq!(echoed["body"], Value::Null);
}

#[tokio::test]
async fn echo_reflects_json_body_and_headers() {
    let resp = app()
        .oneshot(json_request("PATCH", "/echo", r#"{"content":{"list":[1,2]}}"#))
        .await
        .unwrap();

    let echoed: Value = body_json(resp).await;
    assert_eq!(echoed["method"], "PATCH");
    assert_eq!(echoed["headers"]["content-type"], "application/json");
    assert_eq!(echoed["body"], serde_json::json!({"content": {"list": [1, 2]}}));
}

#[tokio::test]
async fn echo_keeps_non_json_body_as_text() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/echo")
                .body("plain".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    let echoed: Value = body_json(resp).await;
    assert_eq!(echoed["body"], "plain");
}

// --- status ---

#[tokio::test]
async fn status_route_replies_with_requested_code() {
    let resp = app().oneshot(empty_request("DELETE", "/status/400")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(resp).await, "Error");
}

#[tokio::test]
async fn status_route_rejects_impossible_codes() {
    let resp = app().oneshot(empty_request("GET", "/status/42")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_bytes(resp).await, "invalid status code");
}

// --- no content / slow ---

#[tokio::test]
async fn no_content_has_empty_body() {
    let resp = app().oneshot(empty_request("POST", "/no-content")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn slow_route_eventually_answers() {
    let resp = app().oneshot(empty_request("GET", "/slow/10")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "done");
}

// --- flaky lifecycle ---

#[tokio::test]
async fn flaky_fails_then_recovers() {
    use tower::Service;

    let state = MockState::new();
    let mut app = router(state.clone()).into_service();

    for _ in 0..2 {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(empty_request("GET", "/flaky/lifecycle/2"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/flaky/lifecycle/2"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["key"], "lifecycle");
    assert_eq!(body["attempt"], 3);

    // a different key starts its own count
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(empty_request("GET", "/flaky/other/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(state.hits("/flaky/lifecycle/2").await, 3);
    assert_eq!(state.hits("/flaky/other/1").await, 1);
}
