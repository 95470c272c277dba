//! portal binary.
//!
//! Reads `portal.toml` (or the path given with `--config`) layered under
//! `PORTAL_*` environment variables, opens the SQLite claims database,
//! upserts the seed users and serves the portal API over HTTP.
//!
//! # Password hash generation
//!
//! Admin accounts and seed users carry argon2 PHC strings, produced with:
//!
//! ```
//! cargo run -p claimdesk-portal --bin portal -- --hash-password
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use claimdesk_core::{store::ClaimStore as _, user::NewUser};
use claimdesk_portal::{AppState, PortalConfig};
use claimdesk_store_sqlite::SqliteStore;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Claimdesk portal server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "portal.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("PORTAL")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()
    .context("failed to read configuration")?;

  let cfg: PortalConfig = settings
    .try_deserialize()
    .context("failed to deserialise PortalConfig")?;

  if cfg.admins.is_empty() {
    tracing::warn!("no admin accounts configured; the admin console is unreachable");
  }
  if cfg.webhook.primary_key.is_none() {
    tracing::warn!("webhook signature key not configured; deliveries will not be verified");
  }
  if !cfg.box_api.is_configured() {
    tracing::warn!("document-platform credentials missing; uploads will be skipped");
  }

  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(seed) = &cfg.seed_file {
    seed_users(&store, seed).await?;
  }

  let http = reqwest::Client::builder()
    .build()
    .context("failed to build HTTP client")?;
  let address = format!("{}:{}", cfg.host, cfg.port);
  let app = claimdesk_portal::router(AppState::new(store, cfg, http));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Upsert every user in a JSON array file.
async fn seed_users(store: &SqliteStore, path: &Path) -> anyhow::Result<()> {
  let raw = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read seed file {path:?}"))?;
  let users: Vec<NewUser> =
    serde_json::from_str(&raw).with_context(|| format!("invalid seed file {path:?}"))?;
  let count = users.len();
  for user in users {
    let email = user.email.clone();
    store
      .upsert_user(user)
      .await
      .with_context(|| format!("failed to seed user {email}"))?;
  }
  tracing::info!(count, "seed users loaded");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
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
