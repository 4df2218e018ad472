//! HTTP host for wishreg: configuration and router assembly.
//!
//! The JSON API is nested under `/api`; uploaded blobs are served read-only
//! from `/blobs`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::{Router, routing::get};
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};
use wishreg_api::Backend;
use wishreg_core::store::BlobStore;

/// Route prefix under which blobs are served.
pub const BLOB_ROUTE: &str = "/blobs";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `WISHREG_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  #[serde(default = "default_blob_dir")]
  pub blob_dir:        PathBuf,
  /// Externally visible origin, used to build public blob URLs.
  #[serde(default = "default_public_base_url")]
  pub public_base_url: String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }
fn default_port() -> u16 { 8080 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/wishreg/wishreg.db") }
fn default_blob_dir() -> PathBuf { PathBuf::from("~/.local/share/wishreg/blobs") }
fn default_public_base_url() -> String { "http://localhost:8080".to_owned() }

impl ServerConfig {
  /// Public URL prefix for stored blobs.
  pub fn blob_base_url(&self) -> String {
    format!("{}{BLOB_ROUTE}", self.public_base_url.trim_end_matches('/'))
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn app<S, B>(store: Arc<S>, blobs: Arc<B>, blob_dir: &Path) -> Router
where
  S: Backend,
  B: BlobStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", wishreg_api::api_router(store, blobs))
    .nest_service(BLOB_ROUTE, ServeDir::new(blob_dir))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests;
