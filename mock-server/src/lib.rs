//! A local HTTP server for exercising API clients.
//!
//! Routes:
//! - `GET /search/users?q=` answers like the GitHub user search.
//! - `ANY /echo` reflects the method, query, headers and body as JSON.
//! - `ANY /status/{code}` replies with `code` and the body `Error`.
//! - `ANY /flaky/{key}/{failures}` fails with 503 for the first `failures`
//!   hits on `key`, then succeeds.
//! - `ANY /slow/{ms}` sleeps before answering.
//! - `ANY /no-content` replies 204.
//!
//! Every routed request is counted per path; tests read the counts through
//! [`MockState::hits`].

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::Duration,
};

use axum::{
    body::Bytes,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
    pub id: u64,
    pub avatar_url: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub total_count: usize,
    pub incomplete_results: bool,
    pub items: Vec<User>,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Shared counters. Cloning shares the same counters.
#[derive(Clone, Debug, Default)]
pub struct MockState {
    hits: Arc<RwLock<HashMap<String, u32>>>,
    flaky: Arc<RwLock<HashMap<String, u32>>>,
}

impl MockState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of requests routed to `path` so far.
    pub async fn hits(&self, path: &str) -> u32 {
        self.hits.read().await.get(path).copied().unwrap_or(0)
    }

    async fn record(&self, path: &str) {
        *self.hits.write().await.entry(path.to_string()).or_insert(0) += 1;
    }

    /// Bump the counter for `key` and return the new count.
    async fn next_flaky(&self, key: &str) -> u32 {
        let mut flaky = self.flaky.write().await;
        let count = flaky.entry(key.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

pub fn app() -> Router {
    router(MockState::new())
}

pub fn router(state: MockState) -> Router {
    Router::new()
        .route("/search/users", get(search_users))
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/flaky/{key}/{failures}", any(flaky))
        .route("/slow/{ms}", any(slow))
        .route("/no-content", any(no_content))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    serve(listener, MockState::new()).await
}

pub async fn serve(listener: TcpListener, state: MockState) -> Result<(), std::io::Error> {
    axum::serve(listener, router(state)).await
}

/// The fixed user directory behind `/search/users`.
pub fn users() -> Vec<User> {
    [
        ("taktem", 1, "https://avatars.example.com/u/1"),
        ("taktem-bot", 2, "https://avatars.example.com/u/2"),
        ("octocat", 583231, "https://avatars.example.com/u/583231"),
    ]
    .into_iter()
    .map(|(login, id, avatar_url)| User {
        login: login.to_string(),
        id,
        avatar_url: avatar_url.to_string(),
        kind: "User".to_string(),
    })
    .collect()
}

/// Users whose login contains `term`, ignoring case.
pub fn matching_users(term: &str) -> Vec<User> {
    let term = term.to_lowercase();
    users()
        .into_iter()
        .filter(|user| user.login.to_lowercase().contains(&term))
        .collect()
}

async fn count_hits(State(state): State<MockState>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    state.record(&path).await;

    let response = next.run(request).await;
    tracing::info!("{} {} -> {}", method, path, response.status());
    response
}

async fn search_users(Query(query): Query<SearchQuery>) -> Response {
    match query.q.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => {
            let items = matching_users(term);
            Json(SearchResponse {
                total_count: items.len(),
                incomplete_results: false,
                items,
            })
            .into_response()
        }
        _ => (StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed").into_response(),
    }
}

async fn echo(
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Json<Value> {
    let headers: BTreeMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let body = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
    };

    Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": query,
        "headers": headers,
        "body": body,
    }))
}

async fn status(Path(code): Path<u16>) -> Response {
    match StatusCode::from_u16(code) {
        Ok(status) => (status, "Error").into_response(),
        Err(_) => (StatusCode::BAD_REQUEST, "invalid status code").into_response(),
    }
}

async fn flaky(State(state): State<MockState>, Path((key, failures)): Path<(String, u32)>) -> Response {
    let attempt = state.next_flaky(&key).await;
    if attempt <= failures {
        return (StatusCode::SERVICE_UNAVAILABLE, "Unavailable").into_response();
    }
    Json(json!({ "key": key, "attempt": attempt })).into_response()
}

async fn slow(Path(ms): Path<u64>) -> &'static str {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    "done"
}

async fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
