//! extract-gateway binary.
//!
//! Reads an optional TOML file (`--config`) layered under `EXTRACT_*`
//! environment variables, e.g. `EXTRACT_PORT=3001` or
//! `EXTRACT_BOX__CLIENT_SECRET=…`, and serves the extraction API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use claimdesk_extract::{AppState, GatewayConfig, ai::BoxAiClient, box_auth::BoxAuth};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Claimdesk extraction gateway")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "extract.toml")]
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
    .add_source(
      config::Environment::with_prefix("EXTRACT")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?;

  let cfg: GatewayConfig = settings
    .try_deserialize()
    .context("failed to deserialise GatewayConfig")?;

  if !cfg.box_api.is_configured() {
    tracing::warn!("no document-platform credentials configured; every AI call will fail");
  }

  let http = reqwest::Client::builder()
    .build()
    .context("failed to build HTTP client")?;
  let auth = BoxAuth::new(http, Arc::new(cfg.box_api.clone()));
  let state = AppState { ai: Arc::new(BoxAiClient::new(auth)) };

  let app = claimdesk_extract::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
