//! Receiver for document-platform webhook deliveries.

use axum::{
  Json,
  extract::State,
  http::HeaderMap,
};
use base64::{Engine as _, engine::general_purpose::STANDARD as B64};
use bytes::Bytes;
use chrono::Utc;
use claimdesk_core::{claim::StoredFile, store::ClaimStore, trigger::BoxTrigger};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{Value, json};
use sha2::Sha256;

use crate::{
  AppState,
  config::WebhookConfig,
  error::{Error, Result},
};

type HmacSha256 = Hmac<Sha256>;

pub const PRIMARY_HEADER: &str = "box-signature-primary";
pub const SECONDARY_HEADER: &str = "box-signature-secondary";

/// Base64 HMAC-SHA256 of `body` under `key`.
pub fn sign(key: &str, body: &[u8]) -> Result<String> {
  let mut mac = HmacSha256::new_from_slice(key.as_bytes())
    .map_err(|_| Error::BadRequest("invalid signature key".into()))?;
  mac.update(body);
  Ok(B64.encode(mac.finalize().into_bytes()))
}

fn matches(key: &str, body: &[u8], signature: Option<&str>) -> bool {
  let Some(sig) = signature.and_then(|s| B64.decode(s.trim()).ok()) else {
    return false;
  };
  let Ok(mut mac) = HmacSha256::new_from_slice(key.as_bytes()) else {
    return false;
  };
  mac.update(body);
  mac.verify_slice(&sig).is_ok()
}

/// Accept when either configured key signs the body.
///
/// With no primary key configured every delivery is accepted.
pub fn verify(config: &WebhookConfig, headers: &HeaderMap, body: &[u8]) -> Result<()> {
  let Some(primary) = config.primary_key.as_deref() else {
    tracing::warn!("webhook signature key not configured; accepting unverified delivery");
    return Ok(());
  };
  let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());

  if matches(primary, body, header(PRIMARY_HEADER)) {
    return Ok(());
  }
  if let Some(secondary) = config.secondary_key.as_deref()
    && matches(secondary, body, header(SECONDARY_HEADER))
  {
    return Ok(());
  }
  Err(Error::Unauthorized)
}

#[derive(Deserialize)]
struct Parent {
  id: String,
}

#[derive(Deserialize)]
struct Source {
  id:     String,
  #[serde(default)]
  name:   String,
  #[serde(default)]
  size:   u64,
  parent: Option<Parent>,
}

#[derive(Deserialize)]
struct Delivery {
  trigger: String,
  source:  Option<Source>,
}

pub async fn receive<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Value>> {
  verify(&state.config.webhook, &headers, &body)?;

  let delivery: Delivery = serde_json::from_slice(&body)
    .map_err(|e| Error::BadRequest(format!("invalid webhook payload: {e}")))?;
  tracing::info!(trigger = %delivery.trigger, "webhook received");

  if BoxTrigger::parse(&delivery.trigger) == Some(BoxTrigger::FileUploaded)
    && let Some(source) = delivery.source
    && let Some(parent) = &source.parent
  {
    attach_upload(&state, &parent.id, source.id.clone(), source.name.clone(), source.size).await?;
  }

  Ok(Json(json!({ "received": true, "trigger": delivery.trigger })))
}

/// Append a file uploaded directly into a claim folder, once.
async fn attach_upload<S: ClaimStore>(
  state: &AppState<S>,
  folder_id: &str,
  file_id: String,
  name: String,
  size: u64,
) -> Result<()> {
  let Some(claim) = state
    .store
    .find_claim_by_folder(folder_id)
    .await
    .map_err(Error::store)?
  else {
    return Ok(());
  };
  if claim.files.iter().any(|f| f.file_id == file_id) {
    return Ok(());
  }

  let file = StoredFile {
    file_id,
    name,
    size,
    content_type: "application/octet-stream".into(),
    uploaded_at: Utc::now(),
  };
  tracing::info!(claim_id = %claim.claim_id, file_id = %file.file_id, "attaching externally uploaded file");
  state
    .store
    .add_files(claim.claim_id, vec![file])
    .await
    .map_err(Error::store)?;
  Ok(())
}
