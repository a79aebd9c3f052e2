//! The network chokepoint.
//!
//! Everything the client sends goes through a [`Transport`]. Production code
//! uses [`ReqwestTransport`]; tests substitute scripted fakes.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use url::Url;

use crate::error::{Error, Result};
use crate::request::{ApiRequest, FormPart, Method, MultipartForm, RequestBody};

/// Default timeout for a single request attempt.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default path prefix for the REST API.
pub const DEFAULT_API_PATH: &str = "/api";

/// Response as received, before classification.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    /// Reason phrase, e.g. `Not Found`.
    pub status_text: String,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            status_text: reason_phrase(status).to_string(),
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns whatever the server answered.
///
/// Implementations return `Err` only when no response was obtained
/// ([`Error::Network`]); status handling belongs to the gateway.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: reqwest::Client,
    /// API root, always ending in `/`.
    api_root: Url,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Create a transport for `base_url` + `api_path`.
    pub fn new(base_url: &str, api_path: &str, timeout: Duration) -> Result<Self> {
        let api_root = api_root(base_url, api_path)?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .user_agent(format!("logfolio-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Self {
            http,
            api_root,
            timeout,
        })
    }

    /// The API root URL.
    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    /// Build a URL for an endpoint path.
    pub fn url(&self, endpoint: &str) -> Result<Url> {
        let endpoint = endpoint.trim_start_matches('/');
        self.api_root.join(endpoint).map_err(Error::from)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        let url = self.url(&request.endpoint)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, url).timeout(self.timeout);
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder
                .header(CONTENT_TYPE, "application/json")
                .body(value.to_string()),
            // The multipart encoder sets its own Content-Type with the boundary.
            RequestBody::Multipart(form) => builder.multipart(to_reqwest_form(form)?),
        };

        let response = builder.send().await.map_err(network_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(network_error)?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("").to_string(),
            body,
        })
    }
}

fn network_error(err: reqwest::Error) -> Error {
    tracing::debug!(error = %err, "transport failure");
    Error::Network(err.to_string())
}

fn to_reqwest_form(form: &MultipartForm) -> Result<reqwest::multipart::Form> {
    let mut out = reqwest::multipart::Form::new();
    for (name, part) in form.parts() {
        out = match part {
            FormPart::Text(value) => out.text(name.clone(), value.clone()),
            FormPart::File {
                filename,
                content_type,
                data,
            } => {
                let mut file = reqwest::multipart::Part::bytes(data.to_vec())
                    .file_name(filename.clone());
                if let Some(mime) = content_type {
                    file = file
                        .mime_str(mime)
                        .map_err(|e| Error::Validation(format!("bad content type: {}", e)))?;
                }
                out.part(name.clone(), file)
            }
        };
    }
    Ok(out)
}

/// Join `base_url` and `api_path` into a directory-style URL.
fn api_root(base_url: &str, api_path: &str) -> Result<Url> {
    let mut root = Url::parse(base_url)?;
    let prefix = root.path().trim_end_matches('/').to_string();
    let api_path = api_path.trim_matches('/');
    let path = if api_path.is_empty() {
        format!("{}/", prefix)
    } else {
        format!("{}/{}/", prefix, api_path)
    };
    root.set_path(&path);
    Ok(root)
}

fn reason_phrase(status: u16) -> &'static str {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Transport
// ─────────────────────────────────────────────────────────────────────────────

/// A scripted transport for tests.
///
/// Responses are queued per `(method, endpoint)` and handed out in order; the
/// last queued response repeats once the others are used up. Unscripted
/// routes answer 404.
#[derive(Debug, Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Result<RawResponse>>>>,
    request_log: Mutex<Vec<ApiRequest>>,
    latency: Duration,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response by `latency` (tokio time, so it honours a paused clock).
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Queue a response for `method endpoint`.
    pub fn push(&self, method: Method, endpoint: &str, response: Result<RawResponse>) {
        self.routes
            .lock()
            .entry((method, endpoint.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Queue a JSON success for a GET.
    pub fn push_get(&self, endpoint: &str, body: serde_json::Value) {
        self.push(Method::Get, endpoint, Ok(RawResponse::json(200, &body)));
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.request_log.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.request_log.lock().len()
    }

    /// Number of requests received for `method endpoint`.
    pub fn count(&self, method: Method, endpoint: &str) -> usize {
        self.request_log
            .lock()
            .iter()
            .filter(|r| r.method == method && r.endpoint == endpoint)
            .count()
    }

    fn next_response(&self, request: &ApiRequest) -> Result<RawResponse> {
        let mut routes = self.routes.lock();
        let key = (request.method, request.endpoint.clone());
        match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Ok(RawResponse::new(404, ""))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(RawResponse::new(404, ""))),
            None => Ok(RawResponse::json(
                404,
                &serde_json::json!({"detail": "Not Found"}),
            )),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(&self, request: &ApiRequest) -> Result<RawResponse> {
        self.request_log.lock().push(request.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.next_response(request)
    }
}
