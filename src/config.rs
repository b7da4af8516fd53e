//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `VITE_API_BASE` and `MCHAT_LOG_LEVEL` env overrides.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// Backend origin used when nothing else is configured.
pub const DEFAULT_BACKEND_ORIGIN: &str = "http://localhost:5555";

/// Config file read by [`load`], relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// API client configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Origin prefix for every API path. Empty means same-origin.
    pub base: String,
    /// Origin that same-origin paths resolve against when sent natively.
    pub origin: String,
}

/// Dev server configuration.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    pub host: String,
    pub port: u16,
    /// Requests whose path starts with this prefix are forwarded.
    pub proxy_prefix: String,
    /// Origin the proxy forwards to.
    pub proxy_target: String,
    /// Rewrite the `Host` header to the target's authority.
    pub change_origin: bool,
    /// Static bundle directory (already expanded, no `~`).
    pub out_dir: PathBuf,
}

impl DevServerConfig {
    /// `host:port` socket address string for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub api: ApiConfig,
    pub dev_server: DevServerConfig,
}

/// Env-sourced values that override the TOML.
#[derive(Debug, Clone, Default)]
pub struct Overrides<'a> {
    /// `VITE_API_BASE`: replaces both the client base and the proxy target.
    pub api_base: Option<&'a str>,
    /// `MCHAT_LOG_LEVEL`.
    pub log_level: Option<&'a str>,
}

/// Raw TOML shape, the `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    app: RawApp,
    #[serde(default)]
    api: RawApi,
    #[serde(default)]
    dev_server: RawDevServer,
}

#[derive(Deserialize)]
struct RawApp {
    #[serde(default = "default_log_level")]
    log_level: String,
}

#[derive(Deserialize)]
struct RawApi {
    #[serde(default)]
    base: String,
    #[serde(default = "default_origin")]
    origin: String,
}

#[derive(Deserialize)]
struct RawDevServer {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_proxy_prefix")]
    proxy_prefix: String,
    #[serde(default = "default_origin")]
    proxy_target: String,
    #[serde(default = "default_true")]
    change_origin: bool,
    #[serde(default = "default_out_dir")]
    out_dir: String,
}

impl Default for RawApp {
    fn default() -> Self {
        Self { log_level: default_log_level() }
    }
}

impl Default for RawApi {
    fn default() -> Self {
        Self { base: String::new(), origin: default_origin() }
    }
}

impl Default for RawDevServer {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            proxy_prefix: default_proxy_prefix(),
            proxy_target: default_origin(),
            change_origin: true,
            out_dir: default_out_dir(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_origin() -> String { DEFAULT_BACKEND_ORIGIN.to_string() }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5173 }
fn default_proxy_prefix() -> String { "/api".to_string() }
fn default_out_dir() -> String { "dist".to_string() }

fn default_true() -> bool {
    true
}

/// Load config from `config/default.toml`, then apply env-var overrides.
///
/// An empty `VITE_API_BASE` counts as unset, same as a missing one.
pub fn load() -> Result<Config, AppError> {
    with_env_overrides(|o| load_from(Path::new(DEFAULT_CONFIG_PATH), o))
}

/// Like [`load`], but reads `path` and treats a missing file as empty.
pub fn load_or_default(path: &Path) -> Result<Config, AppError> {
    with_env_overrides(|o| load_from_or_default(path, o))
}

fn with_env_overrides<T>(f: impl FnOnce(Overrides<'_>) -> T) -> T {
    let api_base = env::var("VITE_API_BASE").ok().filter(|v| !v.is_empty());
    let log_level = env::var("MCHAT_LOG_LEVEL").ok().filter(|v| !v.is_empty());
    f(Overrides {
        api_base: api_base.as_deref(),
        log_level: log_level.as_deref(),
    })
}

/// [`load_from`] when `path` exists, built-in defaults plus `overrides` otherwise.
pub fn load_from_or_default(path: &Path, overrides: Overrides<'_>) -> Result<Config, AppError> {
    if path.exists() {
        load_from(path, overrides)
    } else {
        resolve(RawConfig::default(), overrides)
    }
}

/// Internal loader that accepts an explicit path and overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;
    resolve(parsed, overrides)
}

fn resolve(parsed: RawConfig, overrides: Overrides<'_>) -> Result<Config, AppError> {
    let d = parsed.dev_server;

    if !d.proxy_prefix.starts_with('/') {
        return Err(AppError::Config(format!(
            "dev_server.proxy_prefix must start with '/': {:?}",
            d.proxy_prefix
        )));
    }

    let log_level = overrides.log_level.unwrap_or(&parsed.app.log_level).trim().to_string();
    if log_level.is_empty() {
        return Err(AppError::Config("app.log_level must not be empty".into()));
    }

    let (base, proxy_target) = match overrides.api_base {
        Some(v) => (v.to_string(), v.to_string()),
        None => (parsed.api.base, d.proxy_target),
    };

    Ok(Config {
        log_level,
        api: ApiConfig { base, origin: parsed.api.origin },
        dev_server: DevServerConfig {
            host: d.host,
            port: d.port,
            proxy_prefix: d.proxy_prefix,
            proxy_target,
            change_origin: d.change_origin,
            out_dir: expand_home(&d.out_dir),
        },
    })
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

#[cfg(test)]
impl Config {
    /// Built-in defaults, as if the TOML file were empty.
    pub fn test_default() -> Self {
        resolve(RawConfig::default(), Overrides::default())
            .expect("defaults always resolve")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const FULL_TOML: &str = r#"
[app]
log_level = "warn"

[api]
base = "http://api.example/"
origin = "http://localhost:7000"

[dev_server]
host = "127.0.0.1"
port = 8081
proxy_prefix = "/api"
proxy_target = "http://backend:5555"
change_origin = false
out_dir = "web/dist"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn parse_full_config() {
        let f = write_toml(FULL_TOML);
        let cfg = load_from(f.path(), Overrides::default()).unwrap();
        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.api.base, "http://api.example/");
        assert_eq!(cfg.api.origin, "http://localhost:7000");
        assert_eq!(cfg.dev_server.bind_addr(), "127.0.0.1:8081");
        assert_eq!(cfg.dev_server.proxy_target, "http://backend:5555");
        assert!(!cfg.dev_server.change_origin);
        assert_eq!(cfg.dev_server.out_dir, PathBuf::from("web/dist"));
    }

    #[test]
    fn empty_file_uses_defaults() {
        let f = write_toml("");
        let cfg = load_from(f.path(), Overrides::default()).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.api.base, "");
        assert_eq!(cfg.api.origin, DEFAULT_BACKEND_ORIGIN);
        assert_eq!(cfg.dev_server.bind_addr(), "0.0.0.0:5173");
        assert_eq!(cfg.dev_server.proxy_prefix, "/api");
        assert_eq!(cfg.dev_server.proxy_target, DEFAULT_BACKEND_ORIGIN);
        assert!(cfg.dev_server.change_origin);
        assert_eq!(cfg.dev_server.out_dir, PathBuf::from("dist"));
    }

    #[test]
    fn api_base_override_sets_base_and_proxy_target() {
        let f = write_toml(FULL_TOML);
        let cfg = load_from(
            f.path(),
            Overrides { api_base: Some("http://override:9000"), log_level: None },
        )
        .unwrap();
        assert_eq!(cfg.api.base, "http://override:9000");
        assert_eq!(cfg.dev_server.proxy_target, "http://override:9000");
    }

    #[test]
    fn env_log_level_override() {
        let f = write_toml(FULL_TOML);
        let cfg = load_from(f.path(), Overrides { api_base: None, log_level: Some("debug") })
            .unwrap();
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn bad_proxy_prefix_rejected() {
        let f = write_toml("[dev_server]\nproxy_prefix = \"api\"\n");
        let err = load_from(f.path(), Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("proxy_prefix"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Path::new("/nonexistent/config.toml"), Overrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn malformed_toml_errors() {
        let f = write_toml("[dev_server\nport = 1");
        let msg = load_from(f.path(), Overrides::default()).unwrap_err().to_string();
        assert!(msg.contains("parse error"));
    }

    #[test]
    fn blank_log_level_rejected() {
        let f = write_toml("[app]\nlog_level = \" \"\n");
        let msg = load_from(f.path(), Overrides::default()).unwrap_err().to_string();
        assert!(msg.contains("log_level"));
    }

    #[test]
    fn env_log_level_rescues_blank_file_level() {
        let f = write_toml("[app]\nlog_level = \"\"\n");
        let cfg = load_from(f.path(), Overrides { api_base: None, log_level: Some("trace") }).unwrap();
        assert_eq!(cfg.log_level, "trace");
    }

    #[test]
    fn missing_optional_file_uses_defaults_and_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_from_or_default(
            &dir.path().join("absent.toml"),
            Overrides { api_base: Some("http://override:9000"), log_level: None },
        )
        .unwrap();
        assert_eq!(cfg.api.base, "http://override:9000");
        assert_eq!(cfg.api.origin, DEFAULT_BACKEND_ORIGIN);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn present_optional_file_is_read() {
        let f = write_toml(FULL_TOML);
        let cfg = load_from_or_default(f.path(), Overrides::default()).unwrap();
        assert_eq!(cfg.api.origin, "http://localhost:7000");
    }

    #[test]
    fn absolute_path_unchanged() {
        assert_eq!(expand_home("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/mchat/dist");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with("mchat/dist"));
    }

    #[test]
    fn test_default_matches_empty_file() {
        let cfg = Config::test_default();
        assert_eq!(cfg.dev_server.port, 5173);
        assert_eq!(cfg.api.base, "");
    }
}
