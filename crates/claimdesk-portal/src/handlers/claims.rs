//! Member-facing claim routes.

use axum::{
  Json,
  extract::{Multipart, Path, State},
  http::StatusCode,
};
use claimdesk_core::{
  claim::{Claim, WorkflowLink},
  store::{ClaimFilter, ClaimStore},
  workflow::is_demo_key,
};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  AppState,
  error::{Error, Result},
  session::MemberSession,
  submission::{self, ClaimSubmission, SubmissionReport},
  upload,
};

/// The claim `id` if it belongs to `member`; 404 otherwise.
async fn own_claim<S: ClaimStore>(state: &AppState<S>, member: &MemberSession, id: Uuid) -> Result<Claim> {
  state
    .store
    .get_claim(id)
    .await
    .map_err(Error::store)?
    .filter(|c| c.user_id == member.user_id)
    .ok_or_else(|| Error::NotFound(format!("claim {id}")))
}

pub async fn list<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  member: MemberSession,
) -> Result<Json<Vec<Claim>>> {
  let filter = ClaimFilter { user_id: Some(member.user_id), status: None };
  let claims = state.store.list_claims(filter).await.map_err(Error::store)?;
  Ok(Json(claims))
}

pub async fn get<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  member: MemberSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Claim>> {
  Ok(Json(own_claim(&state, &member, id).await?))
}

pub async fn create<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  member: MemberSession,
  multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
  let form = upload::read_form(multipart, &state.config.uploads).await?;
  let input = ClaimSubmission::try_from(form)?;
  let user = state
    .store
    .get_user(member.user_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;

  let (claim, report) = submission::submit(&state, &user, input).await?;
  Ok((StatusCode::CREATED, Json(json!({ "claim": claim, "report": report }))))
}

/// Upload further documents into an existing claim's folder.
pub async fn add_documents<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  member: MemberSession,
  Path(id): Path<Uuid>,
  multipart: Multipart,
) -> Result<Json<Value>> {
  let claim = own_claim(&state, &member, id).await?;
  let form = upload::read_form(multipart, &state.config.uploads).await?;
  if form.files.is_empty() {
    return Err(Error::BadRequest("at least one file is required".into()));
  }
  let folder_id = claim
    .folder_id
    .as_deref()
    .ok_or_else(|| Error::BadRequest("claim has no document folder".into()))?;

  let mut report = SubmissionReport::default();
  let stored = submission::upload_files(&state, folder_id, &form.files, &mut report).await;
  if stored.is_empty() {
    return Err(Error::Upstream {
      service: "storage",
      status:  502,
      body:    "no file could be uploaded".into(),
    });
  }
  let claim = state.store.add_files(id, stored).await.map_err(Error::store)?;
  Ok(Json(json!({ "claim": claim, "report": report })))
}

/// Refresh the claim's workflow link from the engine.
///
/// Demo keys and engine failures answer with the stored link, marked
/// `degraded`.
pub async fn refresh_workflow<S: ClaimStore>(state: &AppState<S>, claim: &Claim) -> WorkflowLink {
  let stored = claim.workflow.clone();
  let Some(key) = stored.process_key.as_deref().filter(|k| !is_demo_key(k)) else {
    return WorkflowLink { degraded: true, ..stored };
  };

  let engine = &state.services.workflow;
  let instance = match engine.process_instance(key).await {
    Ok(i) => i,
    Err(e) => {
      tracing::warn!(claim_id = %claim.claim_id, error = %e, "workflow poll failed; using stored state");
      return WorkflowLink { degraded: true, ..stored };
    }
  };
  let (status, risk) = match instance {
    Some(i) => (i.state().to_owned(), engine.risk_score(key).await.ok().flatten()),
    None => ("COMPLETED".to_owned(), None),
  };
  let fresh = WorkflowLink {
    process_key:     stored.process_key.clone(),
    workflow_status: Some(status),
    risk_score:      risk.or(stored.risk_score),
    degraded:        false,
  };
  if fresh != stored
    && let Err(e) = state.store.set_workflow(claim.claim_id, fresh.clone()).await
  {
    tracing::warn!(claim_id = %claim.claim_id, error = %e, "workflow state not persisted");
  }
  fresh
}

pub async fn workflow<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  member: MemberSession,
  Path(id): Path<Uuid>,
) -> Result<Json<Value>> {
  let claim = own_claim(&state, &member, id).await?;
  let link = refresh_workflow(&state, &claim).await;
  Ok(Json(json!({ "claimId": claim.claim_id, "status": claim.status, "workflow": link })))
}
