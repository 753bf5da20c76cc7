//! Request execution and outcome classification.
//!
//! # Design
//! A `Transport` only has to "issue request, await bytes or error". Status
//! handling is shared by every transport through `classify_response`, so a
//! test double and the reqwest-backed transport agree on what counts as
//! success. Cancelling a call means dropping its future; reqwest aborts the
//! in-flight request when that happens.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{redirect, Client, Method, StatusCode};
use tracing::debug;

use crate::config::{ConfigError, TransportConfig};
use crate::error::{ApiError, TransportErrorCode};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Executes wire requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request` and return the body of a successful response.
    ///
    /// Fails with `ApiError::Transport` when no HTTP response arrived and with
    /// `ApiError::HttpResponse` for statuses outside `200..300`.
    async fn execute(&self, request: &HttpRequest) -> Result<Bytes, ApiError>;
}

/// Apply the status rules to a received response.
///
/// 204 yields an empty body whatever the server sent, other 2xx statuses
/// yield the body unchanged, everything else is an `HttpResponse` error.
pub fn classify_response(request: &HttpRequest, response: HttpResponse) -> Result<Bytes, ApiError> {
    let status = StatusCode::from_u16(response.status)
        .map_err(|_| ApiError::unknown(format!("invalid HTTP status {}", response.status)))?;

    if status == StatusCode::NO_CONTENT {
        return Ok(Bytes::new());
    }
    if status.is_success() {
        return Ok(response.body);
    }

    Err(ApiError::HttpResponse {
        request: request.clone(),
        status_code: status.as_u16(),
        reason_body: std::str::from_utf8(&response.body).ok().map(str::to_owned),
        description: Some(format!(
            "HTTP {} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        )),
    })
}

/// `Transport` backed by a `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, ConfigError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(&config.user_agent)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &HttpRequest) -> Result<Bytes, ApiError> {
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut builder = self.client.request(method(request.method), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_owned(), value.to_owned()))
            })
            .collect();
        let body = response.bytes().await.map_err(transport_error)?;

        debug!(status, size = body.len(), "received response");
        classify_response(request, HttpResponse { status, headers, body })
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

/// Map a reqwest failure into the taxonomy. Requests reqwest refuses to
/// build (e.g. an invalid header name) are not transport failures.
fn transport_error(error: reqwest::Error) -> ApiError {
    if error.is_builder() {
        return ApiError::unknown(describe(&error));
    }

    let code = if error.is_timeout() {
        TransportErrorCode::Timeout
    } else if error.is_connect() {
        TransportErrorCode::Connect
    } else if error.is_redirect() {
        TransportErrorCode::Redirect
    } else if error.is_body() || error.is_decode() {
        TransportErrorCode::Body
    } else if error.is_request() {
        TransportErrorCode::Request
    } else {
        TransportErrorCode::Other
    };

    ApiError::Transport {
        code,
        description: describe(&error),
    }
}

/// The error message followed by its source chain.
fn describe(error: &reqwest::Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
