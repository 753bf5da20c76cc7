//! Error types for the API client core.
//!
//! # Design
//! `ApiError` is a closed taxonomy: every failure the request pipeline can
//! produce lands in exactly one variant. Request-construction problems are
//! grouped under `InvalidRequest` so callers can tell "this call could never
//! have worked" apart from failures observed on the wire (`Transport`,
//! `HttpResponse`), which are the only ones the client retries.
//!
//! Decoding the response body is the configuration's business, so decode
//! failures never enter the taxonomy; they surface as `ConnectError::Decode`.

use std::fmt;

use thiserror::Error;

use crate::http::HttpRequest;
use crate::value::{ParamValue, Parameters};

/// Boxed error returned by response decoders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reasons a request could not be assembled from its configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// No registered or built-in encoder accepts this query parameter value.
    #[error("no encoder available for {} value `{value}`", .value.kind())]
    NoEncoderAvailable { value: ParamValue },

    /// The parameter map cannot be serialized as a JSON object body.
    #[error("invalid body: {description}")]
    InvalidBody {
        description: String,
        value: Parameters,
    },

    /// The endpoint does not resolve to an absolute URL.
    #[error("invalid endpoint `{endpoint}`: {description}")]
    InvalidEndpoint {
        endpoint: String,
        description: String,
    },
}

/// Low-level cause of a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorCode {
    Timeout,
    Connect,
    Redirect,
    Body,
    Request,
    Other,
}

impl TransportErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            TransportErrorCode::Timeout => "timeout",
            TransportErrorCode::Connect => "connect",
            TransportErrorCode::Redirect => "redirect",
            TransportErrorCode::Body => "body",
            TransportErrorCode::Request => "request",
            TransportErrorCode::Other => "other",
        }
    }
}

impl fmt::Display for TransportErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every failure mode of the request pipeline.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Unclassified internal failure.
    #[error("unknown error: {}", .message.as_deref().unwrap_or("no details"))]
    Unknown { message: Option<String> },

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),

    /// The request never produced an HTTP response (DNS, TLS, timeout, reset).
    #[error("transport error ({code}): {description}")]
    Transport {
        code: TransportErrorCode,
        description: String,
    },

    /// The server answered with a status outside `200..300`.
    #[error(
        "HTTP {status_code} for {} {}: {}",
        .request.method,
        .request.url,
        .reason_body.as_deref().unwrap_or("<non UTF-8 body>")
    )]
    HttpResponse {
        request: HttpRequest,
        status_code: u16,
        reason_body: Option<String>,
        description: Option<String>,
    },
}

impl ApiError {
    pub fn unknown(message: impl Into<String>) -> Self {
        ApiError::Unknown {
            message: Some(message.into()),
        }
    }

    /// Failures observed on the wire. Only these enter the retry pipeline;
    /// malformed requests and unclassified errors are raised immediately.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::HttpResponse { .. })
    }

    /// HTTP status code for `HttpResponse` errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::HttpResponse { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }
}

/// Error returned by `ApiClient::connect`.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The configuration's decoder rejected the response body.
    #[error("failed to decode response: {0}")]
    Decode(#[source] BoxError),
}

impl ConnectError {
    /// The pipeline error, if this is not a decode failure.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            ConnectError::Api(error) => Some(error),
            ConnectError::Decode(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn request() -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: "https://taktem.com/dummy".parse().unwrap(),
            headers: Vec::new(),
            body: None,
        }
    }

    #[test]
    fn only_wire_failures_are_retryable() {
        let transport = ApiError::Transport {
            code: TransportErrorCode::Timeout,
            description: "timed out".to_string(),
        };
        let http = ApiError::HttpResponse {
            request: request(),
            status_code: 500,
            reason_body: None,
            description: None,
        };
        let invalid = ApiError::from(RequestError::NoEncoderAvailable {
            value: ParamValue::from(vec![1, 2]),
        });

        assert!(transport.is_retryable());
        assert!(http.is_retryable());
        assert!(!invalid.is_retryable());
        assert!(!ApiError::unknown("boom").is_retryable());
    }

    #[test]
    fn display_includes_status_and_reason() {
        let err = ApiError::HttpResponse {
            request: request(),
            status_code: 400,
            reason_body: Some("Error".to_string()),
            description: None,
        };
        assert_eq!(err.to_string(), "HTTP 400 for GET https://taktem.com/dummy: Error");
        assert_eq!(err.status_code(), Some(400));
    }

    #[test]
    fn unknown_without_message() {
        let err = ApiError::Unknown { message: None };
        assert_eq!(err.to_string(), "unknown error: no details");
    }

    #[test]
    fn no_encoder_names_the_kind() {
        let err = RequestError::NoEncoderAvailable {
            value: ParamValue::from(vec![1u8]),
        };
        assert_eq!(err.to_string(), "no encoder available for array value `[1]`");
    }
}
