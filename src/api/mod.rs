//! HTTP client for the mchat backend.
//!
//! [`ApiClient::request`] is the single choke point for JSON calls: it joins
//! the path onto the configured [`ApiBase`], merges headers, and normalises
//! the response into a [`ResponseBody`] so callers never branch on status
//! codes or content types themselves.
//!
//! The named bindings live in [`endpoints`]; the streaming chat call, which
//! skips normalisation, lives in [`chat`].

pub mod chat;
pub mod endpoints;

use reqwest::{
    Client, Method, Response, StatusCode,
    header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{ApiConfig, DEFAULT_BACKEND_ORIGIN};

pub use chat::{ChatStreamRequest, conversation_id_of};

// ── Error ─────────────────────────────────────────────────────────────────────

/// The one failure kind the client surfaces.
///
/// Transport errors, non-2xx responses and undecodable bodies all land here.
/// `Display` is the bare message so server error text reaches the user as-is.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Request(String),
}

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            ApiError::Request(msg) => msg,
        }
    }
}

/// Message used when a failed response carries no body.
pub fn fallback_message(status: StatusCode) -> String {
    format!("请求失败 {}", status.as_u16())
}

// ── Base URL ──────────────────────────────────────────────────────────────────

/// Origin prefix prepended to every API path.
///
/// One trailing slash is stripped on construction. An empty base means
/// same-origin: paths pass through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiBase(String);

impl ApiBase {
    pub fn new(raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        if raw.ends_with('/') {
            raw.pop();
        }
        Self(raw)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_same_origin(&self) -> bool {
        self.0.is_empty()
    }

    /// `path` unchanged when same-origin, `{base}{path}` otherwise.
    pub fn join(&self, path: &str) -> String {
        if self.is_same_origin() {
            path.to_string()
        } else {
            format!("{}{}", self.0, path)
        }
    }
}

// ── Request options ───────────────────────────────────────────────────────────

/// Per-call method, extra headers and body for [`ApiClient::request`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub method: Method,
    /// Merged over the defaults; these win on conflicting names.
    pub headers: HeaderMap,
    pub body: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self { method, headers: HeaderMap::new(), body: None }
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialise `payload` as the JSON request body.
    pub fn json<P: Serialize + ?Sized>(self, payload: &P) -> Result<Self, ApiError> {
        let body = serde_json::to_string(payload)
            .map_err(|e| ApiError::Request(format!("failed to encode request body: {e}")))?;
        Ok(self.body(body))
    }
}

// ── Response body ─────────────────────────────────────────────────────────────

/// A successful response, classified by status and content type.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// `Content-Type` contained `application/json`.
    Json(Value),
    /// Any other content type; the raw body text.
    Text(String),
    /// 204 No Content.
    Empty,
}

impl ResponseBody {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponseBody::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            _ => None,
        }
    }

    /// Decode into a typed model.
    ///
    /// Text bodies are parsed as JSON too, for backends that omit the
    /// content type. `Empty` decodes as `null`, so `Option<T>` and `()`
    /// targets accept it.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        let decoded = match self {
            ResponseBody::Json(v) => serde_json::from_value(v),
            ResponseBody::Text(s) => serde_json::from_str(&s),
            ResponseBody::Empty => serde_json::from_value(Value::Null),
        };
        decoded.map_err(|e| ApiError::Request(format!("failed to decode response body: {e}")))
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// Stateless client for the mchat backend.
///
/// Cheap to clone: `reqwest::Client` is an `Arc` internally.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base: ApiBase,
    /// Origin that same-origin paths resolve against when sent.
    origin: String,
}

impl ApiClient {
    pub fn new(base: ApiBase) -> Self {
        Self {
            http: Client::new(),
            base,
            origin: DEFAULT_BACKEND_ORIGIN.to_string(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(ApiBase::new(config.base.clone())).with_origin(config.origin.clone())
    }

    /// Override the origin used for same-origin paths.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        let origin: String = origin.into();
        self.origin = origin.trim_end_matches('/').to_string();
        self
    }

    /// Absolute URL a request for `path` is sent to.
    pub fn url(&self, path: &str) -> String {
        let joined = self.base.join(path);
        if self.base.is_same_origin() {
            format!("{}{}", self.origin, joined)
        } else {
            joined
        }
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    /// Issue one request and normalise the response.
    ///
    /// `Content-Type: application/json` is always sent unless `options`
    /// carries its own value for that header.
    pub async fn request(&self, path: &str, options: RequestOptions) -> Result<ResponseBody, ApiError> {
        let url = self.url(path);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers);

        debug!(method = %options.method, %url, "api request");

        let mut req = self.http.request(options.method.clone(), &url).headers(headers);
        if let Some(body) = options.body {
            req = req.body(body);
        }

        let response = req.send().await.map_err(|e| {
            warn!(method = %options.method, %url, error = %e, "api request failed (transport)");
            ApiError::Request(e.to_string())
        })?;

        normalize(response).await
    }
}

/// Apply the uniform response policy.
async fn normalize(response: Response) -> Result<ResponseBody, ApiError> {
    let status = response.status();

    if !status.is_success() {
        // A failed body read must not mask the HTTP failure itself.
        let text = response.text().await.unwrap_or_default();
        warn!(%status, body_len = text.len(), "api request returned HTTP error");
        let message = if text.is_empty() { fallback_message(status) } else { text };
        return Err(ApiError::Request(message));
    }

    if status == StatusCode::NO_CONTENT {
        return Ok(ResponseBody::Empty);
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    if is_json {
        let value = response
            .json::<Value>()
            .await
            .map_err(|e| ApiError::Request(format!("failed to parse response body: {e}")))?;
        Ok(ResponseBody::Json(value))
    } else {
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(format!("failed to read response body: {e}")))?;
        Ok(ResponseBody::Text(text))
    }
}

// ── Test support ──────────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;
    use tokio::net::TcpListener;

    /// Serve `router` on an ephemeral local port; returns its origin.
    pub async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }
}
