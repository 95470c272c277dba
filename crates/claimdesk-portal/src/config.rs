//! Portal configuration, deserialised from an optional TOML file layered
//! under `PORTAL_*` environment variables.
//!
//! Nothing secret has a default. An outbound integration whose credentials
//! are missing either stays disabled (CRM) or fails at call time, which the
//! submission flow records as a degraded step.

use std::{path::PathBuf, time::Duration};

use claimdesk_extract::box_auth::BoxApiConfig;
use serde::Deserialize;

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3000 }
fn default_store_path() -> PathBuf { PathBuf::from("claimdesk.db") }
fn default_session_ttl() -> u64 { 8 * 60 * 60 }

/// Top-level portal configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct PortalConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  #[serde(default = "default_store_path")]
  pub store_path:          PathBuf,
  /// JSON array of users (with argon2 hashes) upserted at startup.
  pub seed_file:           Option<PathBuf>,
  #[serde(default = "default_session_ttl")]
  pub session_ttl_secs:    u64,
  /// Set the `Secure` attribute on the session cookie.
  #[serde(default)]
  pub secure_cookies:      bool,
  #[serde(default)]
  pub admins:              Vec<AdminAccount>,
  #[serde(rename = "box", default)]
  pub box_api:             BoxApiConfig,
  #[serde(default)]
  pub storage:             StorageConfig,
  #[serde(default)]
  pub uploads:             UploadConfig,
  #[serde(default)]
  pub webhook:             WebhookConfig,
  #[serde(default)]
  pub workflow:            WorkflowConfig,
  #[serde(default)]
  pub automation:          AutomationConfig,
  #[serde(default)]
  pub crm:                 CrmConfig,
  #[serde(default)]
  pub extraction:          ExtractionConfig,
}

impl PortalConfig {
  pub fn session_ttl(&self) -> Duration { Duration::from_secs(self.session_ttl_secs) }
}

impl Default for PortalConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      store_path:       default_store_path(),
      seed_file:        None,
      session_ttl_secs: default_session_ttl(),
      secure_cookies:   false,
      admins:           Vec::new(),
      box_api:          BoxApiConfig::default(),
      storage:          StorageConfig::default(),
      uploads:          UploadConfig::default(),
      webhook:          WebhookConfig::default(),
      workflow:         WorkflowConfig::default(),
      automation:       AutomationConfig::default(),
      crm:              CrmConfig::default(),
      extraction:       ExtractionConfig::default(),
    }
  }
}

/// An administrator account. There is no built-in admin.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminAccount {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

// ─── Document storage ────────────────────────────────────────────────────────

fn default_claims_folder() -> String { "0".into() }

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
  /// Parent folder under which one folder per claim is created.
  #[serde(default = "default_claims_folder")]
  pub claims_folder_id:  String,
  /// Enterprise metadata template applied to each uploaded file, if set.
  pub metadata_template: Option<String>,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self { claims_folder_id: default_claims_folder(), metadata_template: None }
  }
}

// ─── Uploads ─────────────────────────────────────────────────────────────────

fn default_max_file_bytes() -> usize { 10 * 1024 * 1024 }
fn default_max_files() -> usize { 10 }
fn default_allowed_types() -> Vec<String> {
  [
    "application/pdf",
    "image/jpeg",
    "image/png",
    "image/heic",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
  ]
  .into_iter()
  .map(String::from)
  .collect()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
  #[serde(default = "default_max_file_bytes")]
  pub max_file_bytes:     usize,
  #[serde(default = "default_max_files")]
  pub max_files:          usize,
  #[serde(default = "default_allowed_types")]
  pub allowed_mime_types: Vec<String>,
}

impl UploadConfig {
  /// Upper bound on a whole multipart request body.
  pub fn request_limit(&self) -> usize {
    self.max_file_bytes.saturating_mul(self.max_files).saturating_add(1024 * 1024)
  }

  pub fn allows(&self, mime: &str) -> bool {
    self.allowed_mime_types.iter().any(|m| m.eq_ignore_ascii_case(mime))
  }
}

impl Default for UploadConfig {
  fn default() -> Self {
    Self {
      max_file_bytes:     default_max_file_bytes(),
      max_files:          default_max_files(),
      allowed_mime_types: default_allowed_types(),
    }
  }
}

// ─── Inbound webhook ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WebhookConfig {
  /// When unset, signatures are not checked at all.
  pub primary_key:   Option<String>,
  pub secondary_key: Option<String>,
}

// ─── Workflow engine ─────────────────────────────────────────────────────────

fn default_engine_url() -> String { "http://localhost:8080/engine-rest".into() }
fn default_process_key() -> String { "claim_process".into() }

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
  #[serde(default = "default_engine_url")]
  pub base_url:      String,
  /// Process definition key started for each claim.
  #[serde(default = "default_process_key")]
  pub process_key:   String,
  /// Client-credentials token endpoint; tokens are only requested when set.
  pub token_url:     Option<String>,
  pub client_id:     Option<String>,
  pub client_secret: Option<String>,
}

impl Default for WorkflowConfig {
  fn default() -> Self {
    Self {
      base_url:      default_engine_url(),
      process_key:   default_process_key(),
      token_url:     None,
      client_id:     None,
      client_secret: None,
    }
  }
}

// ─── Automation tool ─────────────────────────────────────────────────────────

fn default_automation_url() -> String { "http://localhost:5678".into() }
fn default_claim_submitted_path() -> String { "/webhook/claim-submitted".into() }

#[derive(Debug, Deserialize, Clone)]
pub struct AutomationConfig {
  #[serde(default = "default_automation_url")]
  pub base_url:             String,
  #[serde(default = "default_claim_submitted_path")]
  pub claim_submitted_path: String,
}

impl Default for AutomationConfig {
  fn default() -> Self {
    Self {
      base_url:             default_automation_url(),
      claim_submitted_path: default_claim_submitted_path(),
    }
  }
}

// ─── CRM ─────────────────────────────────────────────────────────────────────

fn default_login_url() -> String { "https://login.salesforce.com".into() }
fn default_api_version() -> String { "v59.0".into() }

#[derive(Debug, Deserialize, Clone)]
pub struct CrmConfig {
  #[serde(default = "default_login_url")]
  pub login_url:     String,
  #[serde(default = "default_api_version")]
  pub api_version:   String,
  pub client_id:     Option<String>,
  pub client_secret: Option<String>,
  pub username:      Option<String>,
  pub password:      Option<String>,
  /// Create a lead automatically for every submitted claim.
  #[serde(default)]
  pub lead_on_submit: bool,
}

impl CrmConfig {
  pub fn is_configured(&self) -> bool {
    self.client_id.is_some()
      && self.client_secret.is_some()
      && self.username.is_some()
      && self.password.is_some()
  }
}

impl Default for CrmConfig {
  fn default() -> Self {
    Self {
      login_url:      default_login_url(),
      api_version:    default_api_version(),
      client_id:      None,
      client_secret:  None,
      username:       None,
      password:       None,
      lead_on_submit: false,
    }
  }
}

// ─── Extraction gateway ──────────────────────────────────────────────────────

fn default_extract_url() -> String { "http://localhost:3001".into() }

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
  #[serde(default = "default_extract_url")]
  pub base_url: String,
}

impl Default for ExtractionConfig {
  fn default() -> Self { Self { base_url: default_extract_url() } }
}
