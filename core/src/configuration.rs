//! Per-endpoint request descriptions.
//!
//! A `RequestConfiguration` says everything about one endpoint call: method,
//! URL parts, headers, parameters and how to decode a successful body. It is
//! implemented once per endpoint, either as a dedicated type or as a
//! `Configuration<R>` value.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use url::Url;

use crate::error::{ApiError, BoxError, RequestError};
use crate::http::HttpMethod;
use crate::value::{ParamValue, Parameters};

/// Request headers keyed by name.
pub type Headers = BTreeMap<String, String>;

/// Host plus path, resolving to one absolute URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    path: String,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Resolve to an absolute URL. The path replaces any path on the host;
    /// a query already present on the host is kept.
    pub fn url(&self) -> Result<Url, ApiError> {
        let invalid = |description: String| {
            ApiError::from(RequestError::InvalidEndpoint {
                endpoint: format!("{}{}", self.host, self.path),
                description,
            })
        };

        if !self.path.starts_with('/') {
            return Err(invalid("path must start with '/'".to_string()));
        }
        let mut url = Url::parse(&self.host).map_err(|e| invalid(e.to_string()))?;
        if url.cannot_be_a_base() || !url.has_host() {
            return Err(invalid("host has no authority".to_string()));
        }
        url.set_path(&self.path);
        Ok(url)
    }
}

/// Description of one endpoint call and the type its response decodes into.
pub trait RequestConfiguration {
    type Response;

    fn method(&self) -> HttpMethod;

    fn endpoint(&self) -> Endpoint;

    fn headers(&self) -> Headers {
        Headers::new()
    }

    fn parameters(&self) -> Parameters {
        Parameters::new()
    }

    /// Turn the bytes of a successful response into `Response`.
    fn decode(&self, body: &[u8]) -> Result<Self::Response, BoxError>;

    /// One-line description used when reporting failures.
    fn summary(&self) -> String {
        let endpoint = self.endpoint();
        let url = endpoint
            .url()
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{}", endpoint.host(), endpoint.path()));
        format!(
            "endpoint: {url}, parameters: {}",
            ParamValue::Map(self.parameters())
        )
    }
}

/// Deserialize a JSON body with `serde_json`.
pub fn decode_json<R: DeserializeOwned>(body: &[u8]) -> Result<R, BoxError> {
    Ok(serde_json::from_slice(body)?)
}

type DecodeFn<R> = dyn Fn(&[u8]) -> Result<R, BoxError> + Send + Sync;

/// A `RequestConfiguration` assembled from values.
///
/// ```
/// use api_client_core::{Configuration, Endpoint, HttpMethod};
///
/// #[derive(serde::Deserialize)]
/// struct Search {
///     total_count: u64,
/// }
///
/// let config = Configuration::<Search>::json(
///     HttpMethod::Get,
///     Endpoint::new("https://api.github.com", "/search/users"),
/// )
/// .header("Accept", "application/vnd.github.v3+json")
/// .parameter("q", "taktem");
/// ```
pub struct Configuration<R> {
    method: HttpMethod,
    endpoint: Endpoint,
    headers: Headers,
    parameters: Parameters,
    decode: Arc<DecodeFn<R>>,
}

impl<R> Configuration<R> {
    pub fn new<F>(method: HttpMethod, endpoint: Endpoint, decode: F) -> Self
    where
        F: Fn(&[u8]) -> Result<R, BoxError> + Send + Sync + 'static,
    {
        Self {
            method,
            endpoint,
            headers: Headers::new(),
            parameters: Parameters::new(),
            decode: Arc::new(decode),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }
}

impl<R: DeserializeOwned + 'static> Configuration<R> {
    /// Configuration whose response is the JSON body deserialized into `R`.
    pub fn json(method: HttpMethod, endpoint: Endpoint) -> Self {
        Self::new(method, endpoint, decode_json::<R>)
    }
}

impl Configuration<bytes::Bytes> {
    /// Configuration whose response is the raw body.
    pub fn raw(method: HttpMethod, endpoint: Endpoint) -> Self {
        Self::new(method, endpoint, |body| Ok(bytes::Bytes::copy_from_slice(body)))
    }
}

impl<R> Clone for Configuration<R> {
    fn clone(&self) -> Self {
        Self {
            method: self.method,
            endpoint: self.endpoint.clone(),
            headers: self.headers.clone(),
            parameters: self.parameters.clone(),
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<R> fmt::Debug for Configuration<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("method", &self.method)
            .field("endpoint", &self.endpoint)
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

impl<R> RequestConfiguration for Configuration<R> {
    type Response = R;

    fn method(&self) -> HttpMethod {
        self.method
    }

    fn endpoint(&self) -> Endpoint {
        self.endpoint.clone()
    }

    fn headers(&self) -> Headers {
        self.headers.clone()
    }

    fn parameters(&self) -> Parameters {
        self.parameters.clone()
    }

    fn decode(&self, body: &[u8]) -> Result<R, BoxError> {
        (self.decode)(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_resolves_host_and_path() {
        let url = Endpoint::new("https://api.github.com", "/search/users").url().unwrap();
        assert_eq!(url.as_str(), "https://api.github.com/search/users");
    }

    #[test]
    fn endpoint_keeps_host_query() {
        let url = Endpoint::new("https://taktem.com/?lang=ja", "/dummy").url().unwrap();
        assert_eq!(url.as_str(), "https://taktem.com/dummy?lang=ja");
    }

    #[test]
    fn endpoint_rejects_relative_path() {
        let err = Endpoint::new("https://taktem.com", "dummy").url().unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidRequest(RequestError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn endpoint_rejects_host_without_authority() {
        assert!(Endpoint::new("taktem.com", "/dummy").url().is_err());
        assert!(Endpoint::new("mailto:someone@taktem.com", "/dummy").url().is_err());
    }

    #[test]
    fn configuration_builder_collects_headers_and_parameters() {
        let config = Configuration::raw(HttpMethod::Get, Endpoint::new("https://taktem.com", "/dummy"))
            .header("Accept", "text/plain")
            .parameter("q", "taktem")
            .parameter("page", 2u32);

        assert_eq!(config.headers().get("Accept").map(String::as_str), Some("text/plain"));
        assert_eq!(config.parameters().len(), 2);
        assert_eq!(config.decode(b"Success").unwrap(), bytes::Bytes::from_static(b"Success"));
    }

    #[test]
    fn json_configuration_decodes_body() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Dummy {
            value: String,
        }

        let config = Configuration::<Dummy>::json(HttpMethod::Get, Endpoint::new("https://taktem.com", "/dummy"));
        let decoded = config.decode(br#"{"value":"Success"}"#).unwrap();
        assert_eq!(decoded, Dummy { value: "Success".to_string() });
        assert!(config.decode(b"not json").is_err());
    }

    #[test]
    fn summary_lists_url_and_parameters() {
        let config = Configuration::raw(HttpMethod::Get, Endpoint::new("https://taktem.com", "/dummy"))
            .parameter("q", "taktem")
            .parameter("ids", vec![1, 2]);
        assert_eq!(
            config.summary(),
            "endpoint: https://taktem.com/dummy, parameters: {ids: [1, 2], q: taktem}"
        );
    }
}
