//! proxy binary.
//!
//! Reads an optional TOML file (`--config`) layered under `PROXY_*`
//! environment variables, e.g. `PROXY_TARGET_URL=http://n8n:5678`.

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use claimdesk_proxy::{AppState, ProxyConfig};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Claimdesk automation reverse proxy")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "proxy.toml")]
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
      config::Environment::with_prefix("PROXY")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?;

  let cfg: ProxyConfig = settings
    .try_deserialize()
    .context("failed to deserialise ProxyConfig")?;

  let state = AppState::new(cfg.clone()).context("failed to build HTTP client")?;

  let app = claimdesk_proxy::router(state);
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!(target_url = %cfg.target_url, "Proxying on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
