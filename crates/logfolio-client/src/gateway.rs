//! Response classification on top of a [`Transport`].

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::request::ApiRequest;
use crate::transport::{RawResponse, Transport};

/// Sends requests and turns raw responses into JSON or a classified error.
///
/// No caching, deduplication or retry happens here.
#[derive(Clone)]
pub struct Gateway {
    transport: Arc<dyn Transport>,
}

impl Gateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Send a request and return the parsed JSON body.
    pub async fn send(&self, request: &ApiRequest) -> Result<Value> {
        tracing::trace!(endpoint = %request.endpoint, method = %request.method, "sending request");
        let response = self.transport.execute(request).await?;
        classify(response)
    }

    /// Send a request and deserialize the body into `T`.
    pub async fn send_as<T: DeserializeOwned>(&self, request: &ApiRequest) -> Result<T> {
        let value = self.send(request).await?;
        decode(value)
    }
}

/// Deserialize a JSON value into `T`, mapping failures to [`Error::Decode`].
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(Error::from)
}

/// Map a raw response onto success JSON or an error.
pub fn classify(response: RawResponse) -> Result<Value> {
    if response.status == 401 {
        return Err(Error::auth());
    }

    if !response.is_success() {
        return Err(Error::Http {
            status: response.status,
            detail: error_detail(&response),
        });
    }

    if response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(&response.body).map_err(Error::from)
}

/// The body's `detail` field if it is a JSON object carrying one, else the
/// status text.
fn error_detail(response: &RawResponse) -> String {
    let detail = serde_json::from_slice::<Value>(&response.body)
        .ok()
        .and_then(|body| body.get("detail").cloned());

    match detail {
        Some(Value::String(text)) => text,
        // FastAPI validation errors carry a list of objects.
        Some(other) if !other.is_null() => other.to_string(),
        _ if !response.status_text.is_empty() => response.status_text.clone(),
        _ => format!("HTTP {}", response.status),
    }
}
