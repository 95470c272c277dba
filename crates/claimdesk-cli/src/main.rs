//! `claimdesk` — one-shot provisioning for the services around the portal.
//!
//! # Usage
//!
//! ```
//! claimdesk --config claimdesk.toml provision-webhooks --spec webhooks.json
//! claimdesk provision-agents --spec agents.json
//! claimdesk import-workflows --dir workflows/ --activate
//! ```
//!
//! Each command makes one pass, skips what already exists and writes a
//! results file. There is no locking: two concurrent runs may both create
//! the same object.

mod agents;
mod platform;
mod report;
mod webhooks;
mod workflows;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use claimdesk_extract::box_auth::{BoxApiConfig, BoxAuth};
use platform::PlatformClient;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use workflows::AutomationApi;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "claimdesk", about = "Provision webhooks, AI agents and automation workflows")]
struct Args {
  /// Path to a TOML config file (`[box]` and `[automation]` sections).
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Document-platform developer token.
  #[arg(long, env = "CLAIMDESK_BOX_DEVELOPER_TOKEN", hide_env_values = true)]
  box_developer_token: Option<String>,

  #[arg(long, env = "CLAIMDESK_BOX_CLIENT_ID")]
  box_client_id: Option<String>,

  #[arg(long, env = "CLAIMDESK_BOX_CLIENT_SECRET", hide_env_values = true)]
  box_client_secret: Option<String>,

  #[arg(long, env = "CLAIMDESK_BOX_ENTERPRISE_ID")]
  box_enterprise_id: Option<String>,

  /// Base URL of the automation tool (default: http://localhost:5678).
  #[arg(long, env = "CLAIMDESK_AUTOMATION_URL")]
  automation_url: Option<String>,

  #[arg(long, env = "CLAIMDESK_AUTOMATION_API_KEY", hide_env_values = true)]
  automation_api_key: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Create document-platform webhooks that do not exist yet.
  ProvisionWebhooks {
    #[arg(long, default_value = "webhooks.json")]
    spec: PathBuf,
    #[arg(long, default_value = "webhook-results.json")]
    out:  PathBuf,
  },
  /// Create AI agents that do not exist yet, matched by name.
  ProvisionAgents {
    #[arg(long, default_value = "agents.json")]
    spec: PathBuf,
    #[arg(long, default_value = "agent-results.json")]
    out:  PathBuf,
  },
  /// Import exported workflow definitions, matched by name.
  ImportWorkflows {
    #[arg(long, default_value = "workflows")]
    dir:      PathBuf,
    /// Activate each workflow after creating it.
    #[arg(long)]
    activate: bool,
    #[arg(long, default_value = "import-results.json")]
    out:      PathBuf,
  },
}

// ─── Config file ──────────────────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct AutomationSection {
  url:     Option<String>,
  api_key: Option<String>,
}

/// Shape of the optional TOML config file.
#[derive(Deserialize, Default)]
struct ConfigFile {
  #[serde(rename = "box", default)]
  box_api:    BoxApiConfig,
  #[serde(default)]
  automation: AutomationSection,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let args = Args::parse();

  let file_cfg: ConfigFile = if let Some(path) = &args.config {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).context("parsing config file")?
  } else {
    ConfigFile::default()
  };

  let http = reqwest::Client::builder()
    .timeout(Duration::from_secs(60))
    .build()
    .context("failed to build HTTP client")?;

  match args.command {
    Command::ProvisionWebhooks { ref spec, ref out } => {
      let client = platform_client(&args, file_cfg.box_api, http)?;
      let specs = platform::read_entries(spec)?;
      webhooks::provision(&client, specs).await?.write(out)?;
    }
    Command::ProvisionAgents { ref spec, ref out } => {
      let client = platform_client(&args, file_cfg.box_api, http)?;
      let specs = platform::read_entries(spec)?;
      agents::provision(&client, specs).await?.write(out)?;
    }
    Command::ImportWorkflows { ref dir, activate, ref out } => {
      let url = args
        .automation_url
        .clone()
        .or(file_cfg.automation.url)
        .unwrap_or_else(|| "http://localhost:5678".to_string());
      let Some(key) = args.automation_api_key.clone().or(file_cfg.automation.api_key) else {
        bail!("no automation API key: set CLAIMDESK_AUTOMATION_API_KEY or [automation].api_key");
      };
      let api = AutomationApi::new(http, url, key);
      workflows::import(&api, dir, activate).await?.write(out)?;
    }
  }

  Ok(())
}

/// Flags and environment override the config file.
fn platform_client(args: &Args, mut cfg: BoxApiConfig, http: reqwest::Client) -> Result<PlatformClient> {
  let overrides = [
    (&args.box_developer_token, &mut cfg.developer_token),
    (&args.box_client_id, &mut cfg.client_id),
    (&args.box_client_secret, &mut cfg.client_secret),
    (&args.box_enterprise_id, &mut cfg.enterprise_id),
  ];
  for (flag, slot) in overrides {
    if let Some(v) = flag {
      *slot = Some(v.clone());
    }
  }
  if !cfg.is_configured() {
    bail!("no document-platform credentials: set a developer token or client id and secret");
  }
  Ok(PlatformClient::new(BoxAuth::new(http, Arc::new(cfg))))
}
