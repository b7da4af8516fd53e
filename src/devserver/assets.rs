//! Static bundle serving with history-mode routing.
//!
//! Redirect routes in the [`RouteTable`] answer with `302`. A path naming a
//! real file under the bundle directory gets that file. Every other GET gets
//! `index.html` and the client router decides what to render, so deep links
//! like `/roles/3` survive a reload.
//!
//! When the bundle directory is missing, the built-in placeholder page stands
//! in for `index.html`.

use std::path::{Component, Path, PathBuf};

use axum::http::StatusCode;
use tracing::{debug, info, warn};

use crate::routes::{RouteTable, RouteTarget};

// ── Built-in fallback ─────────────────────────────────────────────────────────

const BUILTIN_INDEX_HTML: &str = r#"<!doctype html>
<html lang="zh-CN">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>mchat</title>
  <style>
    body {
      font-family: system-ui, -apple-system, sans-serif;
      background: #fafafa; color: #333;
      display: flex; align-items: center; justify-content: center;
      height: 100vh; margin: 0;
    }
    p { font-size: 0.9rem; color: #888; }
  </style>
</head>
<body>
  <div>
    <h1>mchat</h1>
    <p>Bundle not built yet. Build the web client into the configured out_dir.</p>
  </div>
</body>
</html>
"#;

/// Response produced by [`StaticAssets::serve`].
#[derive(Debug, Clone)]
pub struct ServeResponse {
    pub status: StatusCode,
    pub content_type: &'static str,
    /// Set for redirects.
    pub location: Option<&'static str>,
    pub body: Vec<u8>,
}

impl ServeResponse {
    fn plain(status: StatusCode, body: &'static [u8]) -> Self {
        Self { status, content_type: "text/plain; charset=utf-8", location: None, body: body.to_vec() }
    }
}

// ── StaticAssets ──────────────────────────────────────────────────────────────

pub struct StaticAssets {
    /// Bundle directory, `None` if it does not exist.
    root: Option<PathBuf>,
}

impl StaticAssets {
    pub fn new(out_dir: PathBuf) -> Self {
        let root = Some(out_dir).filter(|p| p.is_dir());
        match root {
            Some(ref dir) => info!(dir = %dir.display(), "serving static bundle from disk"),
            None => info!("no bundle directory, using built-in placeholder"),
        }
        Self { root }
    }

    /// Serve a GET for `path` (no query string).
    pub fn serve(&self, path: &str, routes: &RouteTable) -> ServeResponse {
        if escapes_root(path) {
            return ServeResponse::plain(StatusCode::BAD_REQUEST, b"bad request\n");
        }

        if let Some(route) = routes.matching(path) {
            return match route.target {
                RouteTarget::Redirect(to) => {
                    debug!(from = path, to, "route redirect");
                    ServeResponse {
                        status: StatusCode::FOUND,
                        content_type: "text/plain; charset=utf-8",
                        location: Some(to),
                        body: Vec::new(),
                    }
                }
                RouteTarget::Render(view) => {
                    debug!(path, %view, "route served by index.html");
                    self.index()
                }
            };
        }

        if let Some(ref root) = self.root {
            let file_path = root.join(path.trim_start_matches('/'));
            if file_path.is_file() {
                return read_static_file(&file_path);
            }
        }

        debug!(path, "no such file, falling back to index.html");
        self.index()
    }

    fn index(&self) -> ServeResponse {
        match self.root {
            Some(ref root) if root.join("index.html").is_file() => read_static_file(&root.join("index.html")),
            Some(_) => ServeResponse::plain(StatusCode::NOT_FOUND, b"index.html missing from bundle\n"),
            None => ServeResponse {
                status: StatusCode::OK,
                content_type: "text/html; charset=utf-8",
                location: None,
                body: BUILTIN_INDEX_HTML.as_bytes().to_vec(),
            },
        }
    }
}

/// A `..` segment anywhere in the path. Names that merely contain two dots
/// (`app..js`) are fine.
fn escapes_root(path: &str) -> bool {
    Path::new(path).components().any(|c| matches!(c, Component::ParentDir))
}

/// Read a file from disk with a MIME type inferred from its extension.
fn read_static_file(path: &Path) -> ServeResponse {
    match std::fs::read(path) {
        Ok(body) => ServeResponse {
            status: StatusCode::OK,
            content_type: mime_from_extension(path),
            location: None,
            body,
        },
        Err(e) => {
            warn!(path = %path.display(), "failed to read static file: {e}");
            ServeResponse::plain(StatusCode::INTERNAL_SERVER_ERROR, b"internal error\n")
        }
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("html") | Some("htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js") | Some("mjs") => "application/javascript; charset=utf-8",
        Some("json") | Some("map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("wasm") => "application/wasm",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
