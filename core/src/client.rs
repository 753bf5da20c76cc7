//! The request pipeline: build, execute, decode, and the failure protocol.
//!
//! # Design
//! `ApiClient` holds everything a call needs (transport, encoders, loggers,
//! error handlers, retry policy) behind one `Arc`, fixed at build time.
//! Concurrent calls therefore share nothing mutable and tests can run
//! side by side with independent clients.
//!
//! When the first attempt fails on the wire, every logger receives one
//! summary of the call, the caller's predicate decides whether the default
//! error handlers run, and the retry policy decides what happens next. With
//! the default `RetryOnce` the identical request runs once more and its
//! outcome is returned as is.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::{ConfigError, TransportConfig};
use crate::configuration::RequestConfiguration;
use crate::encoder::{EncoderRegistry, ValueEncoder};
use crate::error::{ApiError, ConnectError};
use crate::http::HttpRequest;
use crate::request::RequestBuilder;
use crate::retry::{RetryOnce, RetryPolicy};
use crate::transport::{ReqwestTransport, Transport};

/// Receives a description of every call whose first attempt failed.
pub trait Logger: Send + Sync {
    fn log(&self, message: &str);
}

/// Default handling for failures the caller's predicate accepts.
pub trait ErrorHandler: Send + Sync {
    fn handle(&self, error: &ApiError);
}

/// `Logger` that forwards to `tracing` at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, message: &str) {
        tracing::info!(target: "api_client", "{message}");
    }
}

/// `ErrorHandler` that records the error with `tracing` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn handle(&self, error: &ApiError) {
        tracing::error!(target: "api_client", error = %error, "request failed");
    }
}

struct Inner<T> {
    transport: T,
    encoders: EncoderRegistry,
    loggers: Vec<Arc<dyn Logger>>,
    error_handlers: Vec<Arc<dyn ErrorHandler>>,
    retry_policy: Arc<dyn RetryPolicy>,
}

/// Typed HTTP client. Cheap to clone.
pub struct ApiClient<T = ReqwestTransport> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for ApiClient<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Assembles an `ApiClient`.
pub struct ApiClientBuilder {
    encoders: EncoderRegistry,
    loggers: Vec<Arc<dyn Logger>>,
    error_handlers: Vec<Arc<dyn ErrorHandler>>,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ApiClientBuilder {
    pub fn new() -> Self {
        Self {
            encoders: EncoderRegistry::new(),
            loggers: Vec::new(),
            error_handlers: Vec::new(),
            retry_policy: Arc::new(RetryOnce),
        }
    }

    /// Register a custom query encoder ahead of all existing ones.
    pub fn encoder(mut self, encoder: ValueEncoder) -> Self {
        self.encoders.register(encoder);
        self
    }

    /// Replace the encoder registry.
    pub fn encoders(mut self, encoders: EncoderRegistry) -> Self {
        self.encoders = encoders;
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.loggers.push(logger);
        self
    }

    /// Replace the whole logger set.
    pub fn loggers(mut self, loggers: Vec<Arc<dyn Logger>>) -> Self {
        self.loggers = loggers;
        self
    }

    pub fn error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handlers.push(handler);
        self
    }

    /// Replace the whole default error handler set.
    pub fn error_handlers(mut self, handlers: Vec<Arc<dyn ErrorHandler>>) -> Self {
        self.error_handlers = handlers;
        self
    }

    pub fn retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry_policy = Arc::new(policy);
        self
    }

    pub fn build<T: Transport>(self, transport: T) -> ApiClient<T> {
        ApiClient {
            inner: Arc::new(Inner {
                transport,
                encoders: self.encoders,
                loggers: self.loggers,
                error_handlers: self.error_handlers,
                retry_policy: self.retry_policy,
            }),
        }
    }
}

impl ApiClient<ReqwestTransport> {
    /// Client over reqwest with default encoders, no observers and `RetryOnce`.
    pub fn new(config: &TransportConfig) -> Result<Self, ConfigError> {
        Ok(ApiClientBuilder::new().build(ReqwestTransport::new(config)?))
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn transport(&self) -> &T {
        &self.inner.transport
    }

    pub fn encoders(&self) -> &EncoderRegistry {
        &self.inner.encoders
    }

    /// Build the wire request `config` describes without sending it.
    pub fn build_request<C: RequestConfiguration>(&self, config: &C) -> Result<HttpRequest, ApiError> {
        RequestBuilder::new(&self.inner.encoders).build(
            config.method(),
            &config.endpoint(),
            &config.headers(),
            &config.parameters(),
        )
    }

    /// Run the call with a predicate that accepts every error.
    pub async fn connect<C>(&self, config: &C) -> Result<C::Response, ConnectError>
    where
        C: RequestConfiguration + Sync,
    {
        self.connect_with(config, |_: &ApiError| true).await
    }

    /// Run the call. `predicate` decides whether the default error handlers
    /// see a wire failure; under `RetryOnce` it does not affect the retry.
    ///
    /// Dropping the returned future cancels the in-flight request and any
    /// pending retry.
    pub async fn connect_with<C, P>(&self, config: &C, predicate: P) -> Result<C::Response, ConnectError>
    where
        C: RequestConfiguration + Sync,
        P: Fn(&ApiError) -> bool + Send,
    {
        let call_id = Uuid::new_v4();
        debug!(%call_id, method = %config.method(), path = config.endpoint().path(), "connect");
        self.run(call_id, config, predicate).await
    }

    async fn run<C, P>(&self, call_id: Uuid, config: &C, predicate: P) -> Result<C::Response, ConnectError>
    where
        C: RequestConfiguration + Sync,
        P: Fn(&ApiError) -> bool + Send,
    {
        let policy = &self.inner.retry_policy;
        let mut attempt = 1;

        loop {
            let error = match self.attempt(config).await {
                Ok(response) => {
                    if attempt > 1 {
                        debug!(%call_id, attempt, "request succeeded after retry");
                    }
                    return Ok(response);
                }
                Err(ConnectError::Api(error)) if error.is_retryable() => error,
                Err(other) => return Err(other),
            };

            let can_retry = attempt < policy.max_attempts();
            let handled = if attempt == 1 {
                self.report(config, &error, &predicate)
            } else {
                can_retry && predicate(&error)
            };

            let delay = if can_retry {
                policy.next_delay(attempt, &error, handled)
            } else {
                None
            };
            let Some(delay) = delay else {
                warn!(%call_id, attempt, error = %error, "request failed");
                return Err(error.into());
            };

            warn!(%call_id, attempt, error = %error, ?delay, "request failed, retrying");
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    /// One build, execute, decode pass.
    async fn attempt<C>(&self, config: &C) -> Result<C::Response, ConnectError>
    where
        C: RequestConfiguration + Sync,
    {
        let request = self.build_request(config)?;
        let body = self.inner.transport.execute(&request).await?;
        config.decode(&body).map_err(ConnectError::Decode)
    }

    /// Notify loggers, then the default error handlers if `predicate`
    /// accepts the error. Returns the predicate's verdict.
    fn report<C, P>(&self, config: &C, error: &ApiError, predicate: &P) -> bool
    where
        C: RequestConfiguration,
        P: Fn(&ApiError) -> bool,
    {
        let summary = config.summary();
        for logger in &self.inner.loggers {
            logger.log(&summary);
        }

        let handled = predicate(error);
        if handled {
            for handler in &self.inner.error_handlers {
                handler.handle(error);
            }
        }
        handled
    }
}
