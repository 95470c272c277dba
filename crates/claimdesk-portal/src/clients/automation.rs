//! Fire-and-check trigger for automation webhooks.

use serde_json::Value;

use super::check;
use crate::error::Result;

#[derive(Clone)]
pub struct AutomationClient {
  http:     reqwest::Client,
  base_url: String,
}

impl AutomationClient {
  pub fn new(http: reqwest::Client, base_url: String) -> Self { Self { http, base_url } }

  /// `POST {base_url}{path}` with a JSON payload.
  pub async fn trigger(&self, path: &str, payload: &Value) -> Result<()> {
    let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
    let resp = self.http.post(url).json(payload).send().await?;
    check("automation", resp).await?;
    Ok(())
  }
}
