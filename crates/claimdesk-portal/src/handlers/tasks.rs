//! Adjuster tasks, served from the workflow engine with a local fallback.

use axum::{
  Json,
  extract::{Path, State},
};
use claimdesk_core::{
  store::ClaimStore,
  workflow::{Decision, fallback_task, is_demo_key},
};
use serde::Deserialize;
use serde_json::{Value, json};
use uuid::Uuid;

use super::admin::{apply_status, find_claim};
use crate::{
  AppState,
  clients::workflow::Variable,
  error::Result,
  session::AdminSession,
};

pub async fn list<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  _admin: AdminSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
  let claim = find_claim(&state, id).await?;

  if let Some(key) = claim.workflow.process_key.as_deref().filter(|k| !is_demo_key(k)) {
    match state.services.workflow.tasks(key).await {
      Ok(tasks) => return Ok(Json(json!({ "tasks": tasks, "degraded": false }))),
      Err(e) => {
        tracing::warn!(claim_id = %claim.claim_id, error = %e, "task list unavailable; using fallback task");
      }
    }
  }

  let tasks: Vec<_> = fallback_task(claim.status, claim.claim_id).into_iter().collect();
  Ok(Json(json!({ "tasks": tasks, "degraded": true })))
}

#[derive(Deserialize)]
pub struct Completion {
  pub decision: String,
  pub notes:    Option<String>,
}

/// Complete a task and move the claim to the status the decision implies.
///
/// The local status change happens whether or not the engine accepted the
/// completion.
pub async fn complete<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  admin: AdminSession,
  Path((id, task_id)): Path<(Uuid, String)>,
  Json(body): Json<Completion>,
) -> Result<Json<Value>> {
  let claim = find_claim(&state, id).await?;

  let remote = !is_demo_key(&task_id)
    && claim.workflow.process_key.as_deref().is_some_and(|k| !is_demo_key(k));
  let mut degraded = !remote;
  if remote {
    let vars = [
      ("decision", Variable::from(body.decision.as_str())),
      ("notes", body.notes.clone().unwrap_or_default().into()),
    ];
    if let Err(e) = state.services.workflow.complete_task(&task_id, &vars).await {
      tracing::warn!(claim_id = %claim.claim_id, task_id = %task_id, error = %e, "task completion not accepted by engine");
      degraded = true;
    }
  }

  let (claim, status_changed) = match Decision::parse(&body.decision) {
    Some(decision) => {
      let note = body.notes.or_else(|| Some(format!("decision: {}", body.decision.trim())));
      let updated =
        apply_status(&state, &claim, decision.resulting_status(), &admin.username, note).await?;
      (updated, true)
    }
    None => {
      tracing::info!(claim_id = %claim.claim_id, decision = %body.decision, "unrecognised decision; status unchanged");
      (claim, false)
    }
  };

  Ok(Json(json!({ "claim": claim, "statusChanged": status_changed, "degraded": degraded })))
}
