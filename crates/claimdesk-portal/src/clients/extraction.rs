//! Client for the extraction gateway.

use claimdesk_core::extraction::ExtractionType;
use serde::Deserialize;
use serde_json::{Value, json};

use super::check;
use crate::error::{Error, Result};

#[derive(Deserialize)]
struct Envelope {
  success: bool,
  #[serde(default)]
  data:    Value,
}

#[derive(Clone)]
pub struct ExtractionClient {
  http:     reqwest::Client,
  base_url: String,
}

impl ExtractionClient {
  pub fn new(http: reqwest::Client, base_url: String) -> Self { Self { http, base_url } }

  /// Structured extraction of `file_id`; returns the envelope's `data`.
  pub async fn extract(&self, file_id: &str, ty: ExtractionType) -> Result<Value> {
    let url = format!("{}/extract", self.base_url.trim_end_matches('/'));
    let body = json!({ "fileId": file_id, "extractionType": ty });
    let resp = self.http.post(url).json(&body).send().await?;
    let envelope: Envelope = check("extraction", resp).await?.json().await?;
    if !envelope.success {
      return Err(Error::Upstream {
        service: "extraction",
        status:  200,
        body:    "gateway reported failure".into(),
      });
    }
    Ok(envelope.data)
  }
}
