//! Request descriptions and cache keys.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Method and JSON body of a coordinated request.
///
/// Serialized into the cache key, so two option values that compare equal
/// always map to the same key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestOptions {
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl RequestOptions {
    /// A bodiless GET.
    pub fn get() -> Self {
        Self {
            method: Method::Get,
            body: None,
        }
    }

    /// A POST with a JSON body.
    pub fn post(body: Value) -> Self {
        Self {
            method: Method::Post,
            body: Some(body),
        }
    }

    /// A PUT with an optional JSON body.
    pub fn put(body: Option<Value>) -> Self {
        Self {
            method: Method::Put,
            body,
        }
    }

    /// A bodiless DELETE.
    pub fn delete() -> Self {
        Self {
            method: Method::Delete,
            body: None,
        }
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::Get
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// Deterministic identity of a coordinated request: `endpoint:options-json`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(endpoint: &str, options: &RequestOptions) -> Self {
        // serde_json maps are sorted, so nested body objects serialize stably.
        let options = serde_json::to_string(options).unwrap_or_default();
        Self(format!("{}:{}", endpoint, options))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key belongs to a GET on `prefix` or an endpoint below it.
    /// `prefix` matches whole path segments only: `/items` covers `/items/3`
    /// and `/items?q=x` but not `/items-archive`.
    pub fn is_get_under(&self, prefix: &str) -> bool {
        let Some(rest) = self.0.strip_prefix(prefix) else {
            return false;
        };
        let on_boundary = prefix.ends_with('/') || rest.starts_with(['/', '?', ':']);
        on_boundary && self.0.ends_with(r#":{"method":"GET"}"#)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire-level request
// ─────────────────────────────────────────────────────────────────────────────

/// One part of a multipart form.
#[derive(Debug, Clone)]
pub enum FormPart {
    Text(String),
    File {
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// Multipart form body. Parts keep insertion order; repeated names are allowed.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<(String, FormPart)>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Append a file field.
    pub fn file(
        mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push((
            name.into(),
            FormPart::File {
                filename: filename.into(),
                content_type,
                data: data.into(),
            },
        ));
        self
    }

    pub fn parts(&self) -> &[(String, FormPart)] {
        &self.parts
    }

    /// First text value for `name`.
    pub fn text_value(&self, name: &str) -> Option<&str> {
        self.parts.iter().find_map(|(n, part)| match part {
            FormPart::Text(value) if n == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Request body as handed to the transport.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(MultipartForm),
}

/// A fully described request, relative to the API root.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Endpoint path including any query string, e.g. `/items/?limit=20`.
    pub endpoint: String,
    pub method: Method,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            body: RequestBody::Empty,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn multipart(mut self, form: MultipartForm) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Build from coordinator options.
    pub fn from_options(endpoint: &str, options: &RequestOptions) -> Self {
        let request = Self::new(options.method, endpoint);
        match &options.body {
            Some(body) => request.json(body.clone()),
            None => request,
        }
    }
}
