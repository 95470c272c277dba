//! Administrator claim management.

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use claimdesk_core::{
  claim::{Claim, ClaimStatus, StatusChange},
  store::{ClaimFilter, ClaimStore},
  workflow::is_demo_key,
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  clients::workflow::Variable,
  error::{Error, Result},
  session::AdminSession,
};

pub(crate) async fn find_claim<S: ClaimStore>(state: &AppState<S>, id: Uuid) -> Result<Claim> {
  state
    .store
    .get_claim(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::NotFound(format!("claim {id}")))
}

fn parse_status(s: &str) -> Result<ClaimStatus> {
  s.parse().map_err(|e: claimdesk_core::Error| Error::BadRequest(e.to_string()))
}

#[derive(Deserialize)]
pub struct ListQuery {
  pub status: Option<String>,
}

pub async fn list<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminSession,
  Query(q): Query<ListQuery>,
) -> Result<Json<Vec<Claim>>> {
  let status = q.status.as_deref().filter(|s| !s.is_empty()).map(parse_status).transpose()?;
  let claims = state
    .store
    .list_claims(ClaimFilter { user_id: None, status })
    .await
    .map_err(Error::store)?;
  Ok(Json(claims))
}

pub async fn get<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Claim>> {
  Ok(Json(find_claim(&state, id).await?))
}

#[derive(Deserialize)]
pub struct StatusUpdate {
  pub status: String,
  pub note:   Option<String>,
}

/// Record a status change and notify the claim's process.
pub(crate) async fn apply_status<S: ClaimStore>(
  state: &AppState<S>,
  claim: &Claim,
  status: ClaimStatus,
  changed_by: &str,
  note: Option<String>,
) -> Result<Claim> {
  let change = StatusChange::now(status, changed_by, note);
  let updated = state
    .store
    .update_status(claim.claim_id, change)
    .await
    .map_err(Error::store)?;
  tracing::info!(claim_id = %claim.claim_id, from = %claim.status, to = %status, changed_by, "claim status changed");
  Ok(updated)
}

pub async fn update_status<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusUpdate>,
) -> Result<Json<Claim>> {
  let status = parse_status(&body.status)?;
  let claim = find_claim(&state, id).await?;
  let updated = apply_status(&state, &claim, status, &admin.username, body.note).await?;

  if let Some(key) = claim.workflow.process_key.as_deref().filter(|k| !is_demo_key(k)) {
    let vars = [
      ("status", Variable::from(status.as_str())),
      ("changedBy", admin.username.as_str().into()),
    ];
    let business_key = claim.claim_id.to_string();
    if let Err(e) = state
      .services
      .workflow
      .correlate_message("ClaimStatusChanged", &business_key, &vars)
      .await
    {
      tracing::warn!(claim_id = %claim.claim_id, process = key, error = %e, "status message not delivered");
    }
  }

  Ok(Json(updated))
}

pub async fn stats<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminSession,
) -> Result<Json<Value>> {
  let counts = state.store.status_counts().await.map_err(Error::store)?;
  let mut by_status: BTreeMap<&'static str, u64> =
    ClaimStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
  for (status, n) in &counts {
    by_status.insert(status.as_str(), *n);
  }
  let total: u64 = counts.iter().map(|(_, n)| n).sum();
  Ok(Json(json!({ "total": total, "byStatus": by_status })))
}

pub async fn crm_lead<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
  let crm = state.services.crm.as_ref().ok_or(Error::NotConfigured("CRM"))?;
  let claim = find_claim(&state, id).await?;
  let email = state
    .store
    .get_user(claim.user_id)
    .await
    .map_err(Error::store)?
    .map(|u| u.email)
    .unwrap_or_default();
  let lead_id = crm.create_lead(&claim, &email).await?;
  Ok(Json(json!({ "claimId": claim.claim_id, "leadId": lead_id })))
}
