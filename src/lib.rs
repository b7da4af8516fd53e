// Library root, shared by the `mchat-web` dev server and the `mchat-ctl` CLI.

pub mod api;
pub mod config;
#[cfg(feature = "dev-server")]
pub mod devserver;
pub mod error;
pub mod logger;
pub mod models;
pub mod routes;
