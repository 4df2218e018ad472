//! wishreg server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `WISHREG_*` environment variables, opens the SQLite store and blob
//! directory, and serves the JSON API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use wishreg_server::{ServerConfig, expand_tilde};
use wishreg_store_sqlite::{FsBlobStore, SqliteStore};

#[derive(Parser)]
#[command(author, version, about = "wishreg gift registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("WISHREG"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let blob_dir = expand_tilde(&server_cfg.blob_dir);
  tokio::fs::create_dir_all(&blob_dir)
    .await
    .with_context(|| format!("failed to create blob directory {blob_dir:?}"))?;
  let blobs = FsBlobStore::new(&blob_dir, server_cfg.blob_base_url());

  let app = wishreg_server::app(Arc::new(store), Arc::new(blobs), &blob_dir);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
