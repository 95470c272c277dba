//! CRM client: password-grant login and lead creation.

use std::{sync::Arc, time::Duration};

use claimdesk_core::claim::Claim;
use claimdesk_extract::token::TokenCache;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::check;
use crate::{
  config::CrmConfig,
  error::{Error, Result},
};

const SERVICE: &str = "crm";

/// The token endpoint does not report a lifetime; sessions are refreshed
/// after this long.
const SESSION_LIFETIME: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Deserialize)]
pub struct CrmSession {
  pub access_token: String,
  pub instance_url: String,
}

#[derive(Deserialize)]
struct Created {
  id: String,
}

#[derive(Clone)]
pub struct CrmClient {
  http:     reqwest::Client,
  config:   Arc<CrmConfig>,
  sessions: Arc<TokenCache<CrmSession>>,
}

impl CrmClient {
  pub fn new(http: reqwest::Client, config: CrmConfig) -> Self {
    Self { http, config: Arc::new(config), sessions: Arc::new(TokenCache::new()) }
  }

  async fn login(&self) -> Result<(CrmSession, Duration)> {
    let cfg = &self.config;
    let (Some(id), Some(secret), Some(user), Some(pass)) =
      (&cfg.client_id, &cfg.client_secret, &cfg.username, &cfg.password)
    else {
      return Err(Error::NotConfigured("CRM"));
    };
    let url = format!("{}/services/oauth2/token", cfg.login_url.trim_end_matches('/'));
    let resp = self
      .http
      .post(url)
      .form(&[
        ("grant_type", "password"),
        ("client_id", id.as_str()),
        ("client_secret", secret.as_str()),
        ("username", user.as_str()),
        ("password", pass.as_str()),
      ])
      .send()
      .await?;
    let session: CrmSession = check(SERVICE, resp).await?.json().await?;
    Ok((session, SESSION_LIFETIME))
  }

  /// Create a `Lead` describing `claim`; returns the new record id.
  pub async fn create_lead(&self, claim: &Claim, email: &str) -> Result<String> {
    let session = self.sessions.get_or_fetch(|| self.login()).await?;
    let url = format!(
      "{}/services/data/{}/sobjects/Lead/",
      session.instance_url.trim_end_matches('/'),
      self.config.api_version
    );
    let body = json!({
      "LastName":    claim.user_name,
      "Company":     format!("Policy {}", claim.policy_number),
      "Email":       email,
      "LeadSource":  "Claims Portal",
      "Description": format!(
        "{} claim {} for {:.2}: {}",
        claim.claim_type.as_str(),
        claim.claim_id,
        claim.estimated_amount,
        claim.description
      ),
    });
    let resp = self.http.post(url).bearer_auth(&session.access_token).json(&body).send().await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      self.sessions.invalidate().await;
    }
    let created: Created = check(SERVICE, resp).await?.json().await?;
    tracing::info!(claim_id = %claim.claim_id, lead_id = %created.id, "CRM lead created");
    Ok(created.id)
  }
}
