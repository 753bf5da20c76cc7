//! Turns a configuration into a wire-level `HttpRequest`.
//!
//! # Design
//! Query methods (GET, DELETE) carry parameters in the URL: arrays expand to
//! one `key[]` item per element, everything else to a single `key` item, and
//! every value goes through the `EncoderRegistry`. Body methods (POST, PUT,
//! PATCH) carry the whole parameter map as one JSON object; the content
//! headers are applied after the caller's headers so they always win.

use bytes::Bytes;
use serde_json::Value;
use tracing::debug;

use crate::configuration::{Endpoint, Headers};
use crate::encoder::EncoderRegistry;
use crate::error::{ApiError, RequestError};
use crate::http::{HttpMethod, HttpRequest};
use crate::value::{map_to_json, ParamValue, Parameters};

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_LENGTH: &str = "Content-Length";
pub const APPLICATION_JSON: &str = "application/json";

/// Builds requests using one encoder registry.
#[derive(Debug, Clone, Copy)]
pub struct RequestBuilder<'a> {
    encoders: &'a EncoderRegistry,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(encoders: &'a EncoderRegistry) -> Self {
        Self { encoders }
    }

    pub fn build(
        &self,
        method: HttpMethod,
        endpoint: &Endpoint,
        headers: &Headers,
        parameters: &Parameters,
    ) -> Result<HttpRequest, ApiError> {
        let mut url = endpoint.url()?;
        let mut header_list: Vec<(String, String)> = headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        let body = if method.is_query() {
            let items = self.query_items(parameters)?;
            if !items.is_empty() {
                url.query_pairs_mut().extend_pairs(items);
            }
            None
        } else {
            let payload = json_body(parameters)?;
            set_header(&mut header_list, CONTENT_TYPE, APPLICATION_JSON.to_string());
            set_header(&mut header_list, CONTENT_LENGTH, payload.len().to_string());
            Some(payload)
        };

        debug!(%method, %url, "built request");
        Ok(HttpRequest {
            method,
            url,
            headers: header_list,
            body,
        })
    }

    /// Query items in parameter order; array elements keep their order.
    pub fn query_items(&self, parameters: &Parameters) -> Result<Vec<(String, String)>, RequestError> {
        let mut items = Vec::with_capacity(parameters.len());
        for (key, value) in parameters {
            match value {
                ParamValue::Array(elements) => {
                    let name = format!("{key}[]");
                    for element in elements {
                        items.push((name.clone(), self.encoders.encode(element)?));
                    }
                }
                scalar => items.push((key.clone(), self.encoders.encode(scalar)?)),
            }
        }
        Ok(items)
    }
}

/// Serialize the parameter map as a JSON object.
pub fn json_body(parameters: &Parameters) -> Result<Bytes, RequestError> {
    let invalid = |description: String| RequestError::InvalidBody {
        description,
        value: parameters.clone(),
    };
    let object = map_to_json(parameters).map_err(invalid)?;
    serde_json::to_vec(&Value::Object(object))
        .map(Bytes::from)
        .map_err(|e| invalid(e.to_string()))
}

/// Replace every header named `name` (case-insensitively) with one value.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value));
}
