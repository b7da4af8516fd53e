//! Reverse proxy for the API prefix.
//!
//! Matching is a plain prefix test on the request path. The forwarded
//! request keeps method, path, query, headers and body; with
//! `change_origin` the `Host` header is rewritten to the target's authority.
//! Bodies are streamed in both directions: uploads are not buffered, and
//! chat replies reach the browser chunk by chunk as they are produced.

use axum::{
    body::{Body, HttpBody},
    extract::Request,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, warn};

use super::DevState;
use crate::error::AppError;

/// Headers that describe a single hop and must not be forwarded.
/// `content-length` is dropped because bodies are re-framed on each side.
const HOP_BY_HOP: &[header::HeaderName] = &[
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::CONTENT_LENGTH,
];

/// Where proxied requests go.
#[derive(Debug, Clone)]
pub struct ProxyTarget {
    prefix: String,
    /// Scheme + authority, no trailing slash.
    origin: String,
    /// Set when `Host` should be rewritten.
    host: Option<HeaderValue>,
}

impl ProxyTarget {
    pub fn new(prefix: &str, target: &str, change_origin: bool) -> Result<Self, AppError> {
        let url = reqwest::Url::parse(target)
            .map_err(|e| AppError::Config(format!("invalid proxy target {target:?}: {e}")))?;
        let host_str = url
            .host_str()
            .ok_or_else(|| AppError::Config(format!("proxy target has no host: {target:?}")))?;

        let authority = match url.port() {
            Some(port) => format!("{host_str}:{port}"),
            None => host_str.to_string(),
        };
        let host = if change_origin {
            Some(
                HeaderValue::from_str(&authority)
                    .map_err(|e| AppError::Config(format!("invalid proxy host {authority:?}: {e}")))?,
            )
        } else {
            None
        };

        Ok(Self {
            prefix: prefix.to_string(),
            origin: target.trim_end_matches('/').to_string(),
            host,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Upstream URL for a request's path and query.
    pub fn upstream_url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.origin, path_and_query)
    }

    /// Headers to send upstream.
    fn outgoing_headers(&self, incoming: &HeaderMap) -> HeaderMap {
        let mut headers = strip_hop_by_hop(incoming);
        if let Some(ref host) = self.host {
            headers.insert(header::HOST, host.clone());
        }
        headers
    }
}

/// Copy of `headers` without hop-by-hop fields, including any extra ones
/// the sender nominated in its `Connection` header.
fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let nominated: Vec<header::HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| header::HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    let mut out = headers.clone();
    for name in HOP_BY_HOP.iter().chain(&nominated) {
        out.remove(name);
    }
    out.remove("keep-alive");
    out
}

/// Whether the incoming request carries a body worth forwarding. Chunked
/// bodies of unknown length count as present.
fn has_body(body: &Body) -> bool {
    !body.is_end_stream() && body.size_hint().exact() != Some(0)
}

/// Forward one request upstream and stream the response back.
pub(super) async fn forward(state: &DevState, req: Request) -> Response {
    let (parts, body) = req.into_parts();
    let path_and_query = parts.uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let url = state.proxy.upstream_url(path_and_query);

    debug!(method = %parts.method, %url, "proxying");

    let mut upstream = state
        .http
        .request(parts.method.clone(), &url)
        .headers(state.proxy.outgoing_headers(&parts.headers));
    // Bodiless requests (plain GETs) must not turn into chunked uploads.
    if has_body(&body) {
        upstream = upstream.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }
    let upstream = upstream.send().await;

    let upstream = match upstream {
        Ok(resp) => resp,
        Err(e) => {
            warn!(method = %parts.method, %url, error = %e, "proxy target unreachable");
            return (StatusCode::BAD_GATEWAY, format!("proxy error: {e}\n")).into_response();
        }
    };

    let status = upstream.status();
    let headers = strip_hop_by_hop(upstream.headers());

    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
