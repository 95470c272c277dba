//! Thin document-platform JSON client for the provisioning commands.

use anyhow::{Context, Result, anyhow};
use claimdesk_extract::box_auth::BoxAuth;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Clone)]
pub struct PlatformClient {
  auth: BoxAuth,
}

impl PlatformClient {
  pub fn new(auth: BoxAuth) -> Self { Self { auth } }

  pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
    let token = self.auth.token().await?;
    let resp = self
      .auth
      .http()
      .get(self.auth.config().api(path))
      .query(query)
      .bearer_auth(token)
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    if !resp.status().is_success() {
      let status = resp.status();
      return Err(anyhow!("GET {path} → {status}: {}", resp.text().await.unwrap_or_default()));
    }
    resp.json().await.with_context(|| format!("deserialising GET {path}"))
  }

  pub async fn post(&self, path: &str, body: &Value) -> Result<Value> {
    let token = self.auth.token().await?;
    let resp = self
      .auth
      .http()
      .post(self.auth.config().api(path))
      .bearer_auth(token)
      .json(body)
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    if !resp.status().is_success() {
      let status = resp.status();
      return Err(anyhow!("POST {path} → {status}: {}", resp.text().await.unwrap_or_default()));
    }
    resp.json().await.with_context(|| format!("deserialising POST {path}"))
  }
}

/// Read a JSON array of entries from `path`.
pub fn read_entries<T: DeserializeOwned>(path: &std::path::Path) -> Result<Vec<T>> {
  let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
pub(crate) mod test_support {
  use std::sync::Arc;

  use axum::Router;
  use claimdesk_extract::box_auth::{BoxApiConfig, BoxAuth};

  use super::PlatformClient;

  pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
  }

  pub fn client(api_url: String) -> PlatformClient {
    let config = BoxApiConfig {
      api_url,
      developer_token: Some("dev".into()),
      ..BoxApiConfig::default()
    };
    PlatformClient::new(BoxAuth::new(reqwest::Client::new(), Arc::new(config)))
  }
}
