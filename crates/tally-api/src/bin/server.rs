//! tally-server binary.
//!
//! Reads `tally.toml` (or the path specified with `--config`) layered with
//! `TALLY_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! # Cost repair
//!
//! To reset every finished good's unit cost from its latest completed work
//! order without starting the server:
//!
//! ```
//! cargo run -p tally-api --bin tally-server -- --recalculate-costs
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tally_api::ServerConfig;
use tally_core::ProductionService;
use tally_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally production server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  /// Run the historical cost repair pass and exit.
  #[arg(long)]
  recalculate_costs: bool,
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
    .add_source(
      config::Environment::with_prefix("TALLY")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open_with_busy_timeout(&store_path, server_cfg.busy_timeout())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let service = ProductionService::new(Arc::new(store), server_cfg.engine);

  if cli.recalculate_costs {
    let repairs = service
      .recalculate_historical_costs()
      .await
      .context("cost repair failed")?;
    tracing::info!(repaired = repairs.len(), "cost repair finished");
    return Ok(());
  }

  let app = tally_api::api_router(service);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(error = %e, "failed to listen for ctrl-c");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
