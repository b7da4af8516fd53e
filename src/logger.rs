//! Logging initialisation via tracing-subscriber.
//!
//! The configured level (config file, overridden by `MCHAT_LOG_LEVEL`) always
//! decides the filter. `RUST_LOG` only fills in when the configured level is
//! blank or does not parse.

use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Which input the active filter was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSource {
    Configured,
    RustLog,
}

/// Build the filter from the configured `level` and the raw `RUST_LOG` value.
///
/// `level` accepts a level string (`"info"`, `"debug"`, ...) or a full
/// filter directive (`"mchat_web=debug,tower=warn"`).
pub fn select_filter(level: &str, rust_log: Option<&str>) -> Result<(EnvFilter, FilterSource), AppError> {
    let level_err = if level.trim().is_empty() {
        "log level is empty".to_string()
    } else {
        match EnvFilter::try_new(level) {
            Ok(filter) => return Ok((filter, FilterSource::Configured)),
            Err(e) => e.to_string(),
        }
    };

    let Some(directives) = rust_log.filter(|v| !v.trim().is_empty()) else {
        return Err(AppError::Logger(format!("invalid log level '{level}': {level_err}")));
    };
    EnvFilter::try_new(directives)
        .map(|filter| (filter, FilterSource::RustLog))
        .map_err(|env_err| {
            AppError::Logger(format!(
                "invalid log level '{level}': {level_err}; RUST_LOG parse failed: {env_err}"
            ))
        })
}

/// Install the global subscriber. Call once, after the config is resolved.
pub fn init(level: &str) -> Result<(), AppError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let (filter, source) = select_filter(level, rust_log.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    tracing::debug!(?source, "logger ready");
    Ok(())
}
