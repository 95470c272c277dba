//! Client for the document platform's AI endpoints.

use claimdesk_core::extraction::FieldSpec;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Error, Result, box_auth::BoxAuth};

#[derive(Deserialize)]
struct AskResponse {
  answer: String,
}

#[derive(Deserialize)]
struct ExtractResponse {
  #[serde(default)]
  answer: Value,
}

/// One synchronous call per operation; no retry, no timeout override.
#[derive(Clone)]
pub struct BoxAiClient {
  auth: BoxAuth,
}

impl BoxAiClient {
  pub fn new(auth: BoxAuth) -> Self { Self { auth } }

  /// `POST /2.0/ai/extract_structured` with the given field table.
  ///
  /// Returns the vendor's `answer` object unchanged.
  pub async fn extract_structured(&self, file_id: &str, fields: &[FieldSpec]) -> Result<Value> {
    let fields: Vec<Value> = fields
      .iter()
      .map(|f| {
        json!({
          "key":         f.key,
          "displayName": f.display_name,
          "type":        f.kind,
          "description": f.description,
          "prompt":      format!("Extract the {}: {}.", f.display_name.to_lowercase(), f.description),
        })
      })
      .collect();
    let body = json!({
      "items":  [{ "id": file_id, "type": "file" }],
      "fields": fields,
    });

    let resp: ExtractResponse = self.post("/2.0/ai/extract_structured", &body).await?;
    Ok(resp.answer)
  }

  /// `POST /2.0/ai/ask` in single-item mode; returns the answer text.
  pub async fn ask(&self, file_id: &str, prompt: &str) -> Result<String> {
    let body = json!({
      "mode":   "single_item_qa",
      "prompt": prompt,
      "items":  [{ "id": file_id, "type": "file" }],
    });
    let resp: AskResponse = self.post("/2.0/ai/ask", &body).await?;
    Ok(resp.answer)
  }

  async fn post<T: serde::de::DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
    let token = self.auth.token().await?;
    let resp = self
      .auth
      .http()
      .post(self.auth.config().api(path))
      .bearer_auth(token)
      .json(body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      if status == reqwest::StatusCode::UNAUTHORIZED {
        self.auth.invalidate().await;
      }
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Vendor { status: status.as_u16(), body });
    }
    Ok(resp.json().await?)
  }
}
