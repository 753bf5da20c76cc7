//! Typed HTTP API client core.
//!
//! # Overview
//! A `RequestConfiguration` describes one endpoint call. `ApiClient` turns it
//! into a wire request (`RequestBuilder` + `EncoderRegistry`), executes it
//! through a `Transport`, decodes the body with the configuration's decoder,
//! and runs the failure protocol: report to loggers, conditionally notify
//! error handlers, retry per `RetryPolicy`.
//!
//! # Design
//! - Request building and status classification are pure functions over
//!   plain data (`HttpRequest`, `HttpResponse`) so they test without I/O.
//! - `ApiError` is a closed taxonomy; only wire failures are retried.
//! - Loggers, error handlers, encoders and the retry policy belong to a
//!   client instance, fixed when it is built. There is no global state.
//! - `ReqwestTransport` is the default transport; anything implementing
//!   `Transport` can replace it.

pub mod client;
pub mod config;
pub mod configuration;
pub mod encoder;
pub mod error;
pub mod http;
pub mod request;
pub mod retry;
pub mod transport;
pub mod value;

pub use client::{ApiClient, ApiClientBuilder, ErrorHandler, Logger, TracingErrorHandler, TracingLogger};
pub use config::{ConfigError, TransportConfig};
pub use configuration::{decode_json, Configuration, Endpoint, Headers, RequestConfiguration};
pub use encoder::{EncoderRegistry, Scalar, ValueEncoder};
pub use error::{ApiError, BoxError, ConnectError, RequestError, TransportErrorCode};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use request::RequestBuilder;
pub use retry::{ExponentialBackoff, NoRetry, RetryOnce, RetryPolicy};
pub use transport::{classify_response, ReqwestTransport, Transport};
pub use value::{ParamValue, Parameters, ValueKind};
