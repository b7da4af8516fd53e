//! mchat-web: development server entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config (`config/default.toml` + env overrides)
//!   3. Init logger once
//!   4. Spawn Ctrl-C → shutdown signal watcher
//!   5. Run the dev server until shutdown

use mchat_web::{config, devserver::DevServer, error::AppError, logger};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level)?;

    info!(
        log_level = %config.log_level,
        api_base = %config.api.base,
        out_dir = %config.dev_server.out_dir.display(),
        "config loaded"
    );

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("ctrl-c received, shutting down");
                signal_token.cancel();
            }
            Err(e) => warn!("failed to listen for ctrl-c: {e}"),
        }
    });

    DevServer::new(&config.dev_server)?.run(shutdown).await
}
