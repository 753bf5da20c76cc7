//! HTTP request/response types as plain data.
//!
//! # Design
//! `HttpRequest` is the wire-level request produced by the request builder:
//! everything the transport needs, nothing it has to compute. `HttpResponse`
//! is what a transport observed before status classification. Keeping both as
//! plain data lets the builder and the status rules be tested without a
//! network.

use std::fmt;

use bytes::Bytes;
use url::Url;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Methods whose parameters travel in the query string.
    pub fn is_query(self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }

    /// Methods whose parameters travel as a JSON body.
    pub fn is_body(self) -> bool {
        !self.is_query()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request, ready for a `Transport`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    /// Case-insensitive header lookup. Returns the last value set.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decoded query items in URL order.
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }
}

/// A response as received by a transport, before status classification.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_classes() {
        assert!(HttpMethod::Get.is_query());
        assert!(HttpMethod::Delete.is_query());
        for method in [HttpMethod::Post, HttpMethod::Put, HttpMethod::Patch] {
            assert!(method.is_body(), "{method} should carry a body");
        }
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Post,
            url: "https://taktem.com/".parse().unwrap(),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: None,
        };
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("Accept"), None);
    }
}
