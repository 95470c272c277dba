//! Workflow-engine REST client.
//!
//! Speaks the engine's typed-variable JSON (`{"name": {"value": …, "type":
//! "String"}}`). When a token endpoint is configured, requests carry a
//! client-credentials bearer token cached in a [`TokenCache`].

use std::{sync::Arc, time::Duration};

use claimdesk_extract::token::TokenCache;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::check;
use crate::{
  config::WorkflowConfig,
  error::{Error, Result},
};

const SERVICE: &str = "workflow";

/// A process variable with its engine type.
#[derive(Debug, Clone, PartialEq)]
pub enum Variable {
  String(String),
  Double(f64),
  Boolean(bool),
}

impl Variable {
  fn to_json(&self) -> Value {
    match self {
      Variable::String(s) => json!({ "value": s, "type": "String" }),
      Variable::Double(d) => json!({ "value": d, "type": "Double" }),
      Variable::Boolean(b) => json!({ "value": b, "type": "Boolean" }),
    }
  }
}

impl From<&str> for Variable {
  fn from(s: &str) -> Self { Variable::String(s.to_owned()) }
}

impl From<String> for Variable {
  fn from(s: String) -> Self { Variable::String(s) }
}

impl From<f64> for Variable {
  fn from(d: f64) -> Self { Variable::Double(d) }
}

impl From<bool> for Variable {
  fn from(b: bool) -> Self { Variable::Boolean(b) }
}

fn variables(vars: &[(&str, Variable)]) -> Value {
  let map: Map<String, Value> = vars.iter().map(|(k, v)| ((*k).to_owned(), v.to_json())).collect();
  Value::Object(map)
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProcessInstance {
  pub id:        String,
  #[serde(default)]
  pub ended:     bool,
  #[serde(default)]
  pub suspended: bool,
}

impl ProcessInstance {
  pub fn state(&self) -> &'static str {
    if self.ended {
      "COMPLETED"
    } else if self.suspended {
      "SUSPENDED"
    } else {
      "ACTIVE"
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id:                  String,
  pub name:                Option<String>,
  pub assignee:            Option<String>,
  pub created:             Option<String>,
  pub task_definition_key: Option<String>,
}

#[derive(Deserialize)]
struct TypedValue {
  value: Value,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  #[serde(default = "default_expires_in")]
  expires_in:   u64,
}

fn default_expires_in() -> u64 { 300 }

#[derive(Clone)]
pub struct WorkflowClient {
  http:   reqwest::Client,
  config: Arc<WorkflowConfig>,
  tokens: Arc<TokenCache<String>>,
}

impl WorkflowClient {
  pub fn new(http: reqwest::Client, config: WorkflowConfig) -> Self {
    Self { http, config: Arc::new(config), tokens: Arc::new(TokenCache::new()) }
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
  }

  async fn authorize(&self, req: RequestBuilder) -> Result<RequestBuilder> {
    let Some(token_url) = &self.config.token_url else {
      return Ok(req);
    };
    let token = self.tokens.get_or_fetch(|| self.exchange(token_url)).await?;
    Ok(req.bearer_auth(token))
  }

  async fn exchange(&self, token_url: &str) -> Result<(String, Duration)> {
    let (Some(id), Some(secret)) = (&self.config.client_id, &self.config.client_secret) else {
      return Err(Error::NotConfigured("workflow client credentials"));
    };
    let resp = self
      .http
      .post(token_url)
      .form(&[
        ("grant_type", "client_credentials"),
        ("client_id", id.as_str()),
        ("client_secret", secret.as_str()),
      ])
      .send()
      .await?;
    let tok: TokenResponse = check(SERVICE, resp).await?.json().await?;
    Ok((tok.access_token, Duration::from_secs(tok.expires_in)))
  }

  async fn send(&self, req: RequestBuilder) -> Result<reqwest::Response> {
    let resp = self.authorize(req).await?.send().await?;
    if resp.status() == StatusCode::UNAUTHORIZED {
      self.tokens.invalidate().await;
    }
    Ok(resp)
  }

  /// Start the configured process definition; returns the new instance.
  pub async fn start_process(
    &self,
    business_key: &str,
    vars: &[(&str, Variable)],
  ) -> Result<ProcessInstance> {
    let path = format!("/process-definition/key/{}/start", self.config.process_key);
    let body = json!({ "businessKey": business_key, "variables": variables(vars) });
    let resp = self.send(self.http.post(self.url(&path)).json(&body)).await?;
    Ok(check(SERVICE, resp).await?.json().await?)
  }

  /// `None` once the instance has finished (the engine answers 404).
  pub async fn process_instance(&self, id: &str) -> Result<Option<ProcessInstance>> {
    let resp = self
      .send(self.http.get(self.url(&format!("/process-instance/{id}"))))
      .await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    Ok(Some(check(SERVICE, resp).await?.json().await?))
  }

  /// The numeric `riskScore` variable, if the process has set one.
  pub async fn risk_score(&self, instance_id: &str) -> Result<Option<f64>> {
    let path = format!("/process-instance/{instance_id}/variables/riskScore");
    let resp = self.send(self.http.get(self.url(&path))).await?;
    if resp.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }
    let v: TypedValue = check(SERVICE, resp).await?.json().await?;
    Ok(v.value.as_f64())
  }

  pub async fn tasks(&self, instance_id: &str) -> Result<Vec<Task>> {
    let req = self.http.get(self.url("/task")).query(&[("processInstanceId", instance_id)]);
    let resp = self.send(req).await?;
    Ok(check(SERVICE, resp).await?.json().await?)
  }

  pub async fn complete_task(&self, task_id: &str, vars: &[(&str, Variable)]) -> Result<()> {
    let body = json!({ "variables": variables(vars) });
    let req = self.http.post(self.url(&format!("/task/{task_id}/complete"))).json(&body);
    check(SERVICE, self.send(req).await?).await?;
    Ok(())
  }

  /// Deliver message `name` to the process with `business_key`.
  pub async fn correlate_message(
    &self,
    name: &str,
    business_key: &str,
    vars: &[(&str, Variable)],
  ) -> Result<()> {
    let body = json!({
      "messageName":       name,
      "businessKey":       business_key,
      "processVariables":  variables(vars),
    });
    check(SERVICE, self.send(self.http.post(self.url("/message")).json(&body)).await?).await?;
    Ok(())
  }
}
