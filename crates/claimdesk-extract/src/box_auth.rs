//! Document-platform API settings and access-token acquisition.
//!
//! Either a static developer token is configured, or a client-credentials
//! grant is exchanged for a token scoped to an enterprise or a user.

use std::{sync::Arc, time::Duration};

use reqwest::Client;
use serde::Deserialize;

use crate::{Error, Result, token::TokenCache};

fn default_api_url() -> String { "https://api.box.com".into() }
fn default_upload_url() -> String { "https://upload.box.com/api".into() }
fn default_token_url() -> String { "https://api.box.com/oauth2/token".into() }

/// `[box]` section shared by the gateway and the portal.
#[derive(Debug, Clone, Deserialize)]
pub struct BoxApiConfig {
  #[serde(default = "default_api_url")]
  pub api_url:         String,
  #[serde(default = "default_upload_url")]
  pub upload_url:      String,
  #[serde(default = "default_token_url")]
  pub token_url:       String,
  /// Short-lived token pasted from the developer console. Takes precedence.
  pub developer_token: Option<String>,
  pub client_id:       Option<String>,
  pub client_secret:   Option<String>,
  /// Subject of the client-credentials grant; `user_id` wins over
  /// `enterprise_id` when both are set.
  pub enterprise_id:   Option<String>,
  pub user_id:         Option<String>,
}

impl Default for BoxApiConfig {
  fn default() -> Self {
    Self {
      api_url:         default_api_url(),
      upload_url:      default_upload_url(),
      token_url:       default_token_url(),
      developer_token: None,
      client_id:       None,
      client_secret:   None,
      enterprise_id:   None,
      user_id:         None,
    }
  }
}

impl BoxApiConfig {
  /// Whether enough credentials are present to call the API at all.
  pub fn is_configured(&self) -> bool {
    self.developer_token.is_some() || (self.client_id.is_some() && self.client_secret.is_some())
  }

  pub fn api(&self, path: &str) -> String {
    format!("{}{}", self.api_url.trim_end_matches('/'), path)
  }

  pub fn upload(&self, path: &str) -> String {
    format!("{}{}", self.upload_url.trim_end_matches('/'), path)
  }
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  #[serde(default = "default_expires_in")]
  expires_in:   u64,
}

fn default_expires_in() -> u64 { 3600 }

/// Hands out bearer tokens for the document platform.
///
/// Cheap to clone; clones share the token cache.
#[derive(Clone)]
pub struct BoxAuth {
  http:   Client,
  config: Arc<BoxApiConfig>,
  cache:  Arc<TokenCache<String>>,
}

impl BoxAuth {
  pub fn new(http: Client, config: Arc<BoxApiConfig>) -> Self {
    Self { http, config, cache: Arc::new(TokenCache::new()) }
  }

  pub fn config(&self) -> &BoxApiConfig { &self.config }

  pub fn http(&self) -> &Client { &self.http }

  /// A valid access token, exchanging client credentials if necessary.
  pub async fn token(&self) -> Result<String> {
    if let Some(tok) = &self.config.developer_token {
      return Ok(tok.clone());
    }
    self.cache.get_or_fetch(|| self.exchange()).await
  }

  /// Forget the cached token, e.g. after a 401.
  pub async fn invalidate(&self) { self.cache.invalidate().await; }

  async fn exchange(&self) -> Result<(String, Duration)> {
    let cfg = &self.config;
    let (Some(client_id), Some(client_secret)) = (&cfg.client_id, &cfg.client_secret) else {
      return Err(Error::Auth("no developer token or client credentials configured".into()));
    };
    let (subject_type, subject_id) = match (&cfg.user_id, &cfg.enterprise_id) {
      (Some(user), _) => ("user", user.as_str()),
      (None, Some(ent)) => ("enterprise", ent.as_str()),
      (None, None) => {
        return Err(Error::Auth("client credentials need an enterprise_id or user_id".into()));
      }
    };

    let resp = self
      .http
      .post(&cfg.token_url)
      .form(&[
        ("grant_type", "client_credentials"),
        ("client_id", client_id.as_str()),
        ("client_secret", client_secret.as_str()),
        ("box_subject_type", subject_type),
        ("box_subject_id", subject_id),
      ])
      .send()
      .await?;

    if !resp.status().is_success() {
      let status = resp.status();
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Auth(format!("token exchange → {status}: {body}")));
    }
    let tok: TokenResponse = resp.json().await?;
    Ok((tok.access_token, Duration::from_secs(tok.expires_in)))
  }
}
