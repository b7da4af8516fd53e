//! Development server: forwards API calls to the backend and serves the
//! static bundle with history-mode routing.
//!
//! ## URL layout
//!
//! ```text
//! ANY  {proxy_prefix}*        → proxied to proxy_target (Host rewritten)
//! GET  /                      → 302 /roles   (route table redirect)
//! GET  /roles, /chat          → index.html   (route table views)
//! GET  /assets/app.js, ...    → file from out_dir
//! GET  anything else          → index.html   (client router decides)
//! ```
//!
//! [`DevServer::run`] drives the axum loop; the [`CancellationToken`] is
//! wired to axum's graceful shutdown.

mod assets;
mod proxy;

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::DevServerConfig;
use crate::error::AppError;
use crate::routes::RouteTable;

pub use assets::{ServeResponse, StaticAssets};
pub use proxy::ProxyTarget;

// ── Shared request state ──────────────────────────────────────────────────────

/// Axum router state injected into the dispatch handler.
///
/// Cheap to clone; all fields are reference-counted.
#[derive(Clone)]
pub struct DevState {
    pub proxy: Arc<ProxyTarget>,
    pub http: reqwest::Client,
    pub assets: Arc<StaticAssets>,
    pub routes: Arc<RouteTable>,
}

impl DevState {
    pub fn from_config(config: &DevServerConfig) -> Result<Self, AppError> {
        let proxy = ProxyTarget::new(&config.proxy_prefix, &config.proxy_target, config.change_origin)?;
        // Upstream redirects go back to the browser untouched.
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AppError::Server(format!("failed to build proxy client: {e}")))?;
        Ok(Self {
            proxy: Arc::new(proxy),
            http,
            assets: Arc::new(StaticAssets::new(config.out_dir.clone())),
            routes: Arc::new(RouteTable::default()),
        })
    }
}

// ── DevServer ─────────────────────────────────────────────────────────────────

pub struct DevServer {
    bind_addr: String,
    state: DevState,
}

impl DevServer {
    pub fn new(config: &DevServerConfig) -> Result<Self, AppError> {
        Ok(Self {
            bind_addr: config.bind_addr(),
            state: DevState::from_config(config)?,
        })
    }

    pub async fn run(self, shutdown: CancellationToken) -> Result<(), AppError> {
        let listener = TcpListener::bind(&self.bind_addr)
            .await
            .map_err(|e| AppError::Server(format!("bind failed on {}: {e}", self.bind_addr)))?;

        info!(
            bind_addr = %self.bind_addr,
            proxy_prefix = %self.state.proxy.prefix(),
            proxy_target = %self.state.proxy.origin(),
            "dev server listening"
        );

        axum::serve(listener, build_router(self.state))
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| AppError::Server(format!("dev server error: {e}")))?;

        info!("dev server shut down");
        Ok(())
    }
}

// ── Router ────────────────────────────────────────────────────────────────────

/// The proxy prefix is runtime config, so everything goes through one
/// fallback that picks proxy or static serving per request.
pub fn build_router(state: DevState) -> Router {
    Router::new().fallback(dispatch).with_state(state)
}

async fn dispatch(State(state): State<DevState>, req: Request) -> Response {
    if state.proxy.matches(req.uri().path()) {
        return proxy::forward(&state, req).await;
    }

    if req.method() != Method::GET && req.method() != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let path = req.uri().path().to_string();
    debug!(%path, "static request");

    let assets = Arc::clone(&state.assets);
    let routes = Arc::clone(&state.routes);
    // StaticAssets::serve does blocking file I/O; run it off the async executor.
    match tokio::task::spawn_blocking(move || assets.serve(&path, &routes)).await {
        Ok(resp) => into_response(resp),
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

fn into_response(resp: ServeResponse) -> Response {
    let mut builder = Response::builder()
        .status(resp.status)
        .header(header::CONTENT_TYPE, resp.content_type);
    if let Some(location) = resp.location {
        builder = builder.header(header::LOCATION, location);
    }
    builder
        .body(Body::from(resp.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
