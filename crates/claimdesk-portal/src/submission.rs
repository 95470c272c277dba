//! The claim submission sequence.
//!
//! Steps run one after another. Only the database insert is fatal; every
//! other step is best-effort and its outcome is recorded in the
//! [`SubmissionReport`] returned to the caller.

use chrono::{NaiveDate, Utc};
use claimdesk_core::{
  claim::{Claim, ClaimType, NewClaim, StoredFile, WorkflowLink},
  extraction::ExtractionType,
  store::ClaimStore,
  user::User,
  workflow::{DEMO_WORKFLOW_STATUS, demo_process_key, demo_risk_score},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
  AppState,
  clients::workflow::Variable,
  error::{Error, Result},
  upload::{FormData, UploadedFile},
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
  pub step:   &'static str,
  pub ok:     bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub detail: Option<String>,
}

/// What happened at each step of a submission.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReport {
  pub steps:    Vec<StepOutcome>,
  /// Set when any local fallback stood in for a remote result.
  pub degraded: bool,
}

impl SubmissionReport {
  fn ok(&mut self, step: &'static str, detail: Option<String>) {
    self.steps.push(StepOutcome { step, ok: true, detail });
  }

  fn failed(&mut self, step: &'static str, detail: impl ToString) {
    self.steps.push(StepOutcome { step, ok: false, detail: Some(detail.to_string()) });
  }

  fn skipped(&mut self, step: &'static str, why: &str) {
    self.steps.push(StepOutcome { step, ok: false, detail: Some(format!("skipped: {why}")) });
  }

  #[cfg(test)]
  pub fn step(&self, step: &str) -> Option<&StepOutcome> {
    self.steps.iter().find(|s| s.step == step)
  }
}

/// Validated input of `POST /api/claims`.
#[derive(Debug)]
pub struct ClaimSubmission {
  pub claim_type:       ClaimType,
  pub description:      String,
  pub incident_date:    NaiveDate,
  pub estimated_amount: f64,
  pub files:            Vec<UploadedFile>,
}

impl TryFrom<FormData> for ClaimSubmission {
  type Error = Error;

  fn try_from(form: FormData) -> Result<Self> {
    let claim_type = form
      .required("claimType")?
      .parse::<ClaimType>()
      .map_err(|e| Error::BadRequest(e.to_string()))?;
    let description = form.required("description")?.to_owned();
    let incident_date = NaiveDate::parse_from_str(form.required("incidentDate")?, "%Y-%m-%d")
      .map_err(|_| Error::BadRequest("incidentDate must be YYYY-MM-DD".into()))?;
    let estimated_amount = form
      .required("estimatedAmount")?
      .parse::<f64>()
      .ok()
      .filter(|a| a.is_finite() && *a >= 0.0)
      .ok_or_else(|| Error::BadRequest("estimatedAmount must be a non-negative number".into()))?;

    Ok(Self { claim_type, description, incident_date, estimated_amount, files: form.files })
  }
}

fn extraction_type_for(claim_type: ClaimType) -> ExtractionType {
  match claim_type {
    ClaimType::Medical => ExtractionType::Medical,
    _ => ExtractionType::Fnol,
  }
}

/// Upload `files` into `folder_id`, skipping (and reporting) failures.
pub async fn upload_files<S: ClaimStore>(
  state: &AppState<S>,
  folder_id: &str,
  files: &[UploadedFile],
  report: &mut SubmissionReport,
) -> Vec<StoredFile> {
  let services = &state.services;
  let mut stored = Vec::with_capacity(files.len());
  for file in files {
    match services
      .storage
      .upload(folder_id, &file.name, &file.content_type, file.data.clone())
      .await
    {
      Ok(sf) => {
        if let Some(template) = &state.config.storage.metadata_template {
          let values = json!({ "fileName": sf.name, "folderId": folder_id });
          if let Err(e) = services.storage.apply_metadata(&sf.file_id, template, &values).await {
            tracing::warn!(file_id = %sf.file_id, error = %e, "metadata template not applied");
          }
        }
        report.ok("upload", Some(file.name.clone()));
        stored.push(sf);
      }
      Err(e) => {
        tracing::warn!(folder_id, file = %file.name, error = %e, "file upload failed; skipping");
        report.failed("upload", format!("{}: {e}", file.name));
      }
    }
  }
  stored
}

/// Run the full submission for `user`.
pub async fn submit<S: ClaimStore>(
  state: &AppState<S>,
  user: &User,
  input: ClaimSubmission,
) -> Result<(Claim, SubmissionReport)> {
  let services = &state.services;
  let mut report = SubmissionReport::default();

  // 1. Folder.
  let folder_name = format!("{} {}", user.policy_number, Utc::now().format("%Y%m%d-%H%M%S%.3f"));
  let folder = match services
    .storage
    .create_folder(&state.config.storage.claims_folder_id, &folder_name)
    .await
  {
    Ok(folder) => {
      report.ok("folder", Some(folder.id.clone()));
      Some(folder)
    }
    Err(e) => {
      tracing::warn!(user_id = %user.user_id, error = %e, "claim folder not created");
      report.failed("folder", e);
      None
    }
  };
  let folder_id = folder.as_ref().map(|f| f.id.clone());

  // 2. Automation trigger.
  let payload = json!({
    "event":           "claim.submitted",
    "userId":          user.user_id,
    "policyNumber":    user.policy_number,
    "claimType":       input.claim_type,
    "estimatedAmount": input.estimated_amount,
    "folderId":        folder_id,
    "fileCount":       input.files.len(),
  });
  match services
    .automation
    .trigger(&state.config.automation.claim_submitted_path, &payload)
    .await
  {
    Ok(()) => report.ok("automation", None),
    Err(e) => {
      tracing::warn!(user_id = %user.user_id, error = %e, "automation trigger failed");
      report.failed("automation", e);
    }
  }

  // 3. Uploads.
  let files = match &folder_id {
    Some(folder) => upload_files(state, folder, &input.files, &mut report).await,
    None => {
      if !input.files.is_empty() {
        report.skipped("upload", "no folder");
      }
      Vec::new()
    }
  };

  // 4. Extraction on the first stored file only.
  let extraction: Option<Value> = match files.first() {
    Some(first) => {
      let ty = extraction_type_for(input.claim_type);
      match services.extraction.extract(&first.file_id, ty).await {
        Ok(data) => {
          report.ok("extraction", Some(first.file_id.clone()));
          Some(data)
        }
        Err(e) => {
          tracing::warn!(file_id = %first.file_id, error = %e, "extraction failed");
          report.failed("extraction", e);
          None
        }
      }
    }
    None => None,
  };

  // 5. Insert. The only fatal step.
  let new_claim = NewClaim {
    user_id: user.user_id,
    user_name: user.name.clone(),
    policy_number: user.policy_number.clone(),
    claim_type: input.claim_type,
    description: input.description,
    incident_date: input.incident_date,
    estimated_amount: input.estimated_amount,
    folder_id: folder_id.clone(),
    files,
    extraction,
    submitted_by: user.email.clone(),
  };
  let claim = match state.store.create_claim(new_claim).await {
    Ok(c) => c,
    Err(e) => {
      tracing::error!(user_id = %user.user_id, error = %e, "claim insert failed");
      // Only a folder this submission created is ours to remove.
      if let Some(folder) = folder.as_ref().filter(|f| f.created)
        && let Err(cleanup) = services.storage.delete_folder(&folder.id).await
      {
        tracing::warn!(folder_id = %folder.id, error = %cleanup, "orphaned claim folder not removed");
      }
      return Err(Error::store(e));
    }
  };
  report.ok("insert", Some(claim.claim_id.to_string()));

  // 6. Workflow.
  let claim_id = claim.claim_id.to_string();
  let vars = [
    ("claimId", Variable::from(claim_id.as_str())),
    ("claimType", claim.claim_type.as_str().into()),
    ("estimatedAmount", claim.estimated_amount.into()),
    ("policyNumber", claim.policy_number.as_str().into()),
    ("folderId", claim.folder_id.clone().unwrap_or_default().into()),
    ("hasDocuments", (!claim.files.is_empty()).into()),
  ];
  let link = match services.workflow.start_process(&claim_id, &vars).await {
    Ok(instance) => {
      let risk_score = match services.workflow.risk_score(&instance.id).await {
        Ok(score) => score,
        Err(e) => {
          tracing::warn!(claim_id = %claim.claim_id, error = %e, "risk score not available yet");
          None
        }
      };
      report.ok("workflow", Some(instance.id.clone()));
      WorkflowLink {
        process_key: Some(instance.id.clone()),
        workflow_status: Some(instance.state().to_owned()),
        risk_score,
        degraded: false,
      }
    }
    Err(e) => {
      tracing::warn!(claim_id = %claim.claim_id, error = %e, "workflow start failed; using demo process");
      report.failed("workflow", e);
      report.degraded = true;
      WorkflowLink {
        process_key: Some(demo_process_key()),
        workflow_status: Some(DEMO_WORKFLOW_STATUS.to_owned()),
        risk_score: Some(demo_risk_score(claim.estimated_amount)),
        degraded: true,
      }
    }
  };
  // The row is committed; from here on failures only degrade the result.
  let claim = match state.store.set_workflow(claim.claim_id, link.clone()).await {
    Ok(updated) => updated,
    Err(e) => {
      tracing::error!(claim_id = %claim.claim_id, error = %e, "workflow link not stored");
      report.failed("workflow_link", e);
      report.degraded = true;
      Claim { workflow: link, ..claim }
    }
  };

  // 7. CRM lead.
  if state.config.crm.lead_on_submit
    && let Some(crm) = &services.crm
  {
    match crm.create_lead(&claim, &user.email).await {
      Ok(id) => report.ok("crm", Some(id)),
      Err(e) => {
        tracing::warn!(claim_id = %claim.claim_id, error = %e, "CRM lead not created");
        report.failed("crm", e);
      }
    }
  }

  tracing::info!(claim_id = %claim.claim_id, degraded = report.degraded, "claim submitted");
  Ok((claim, report))
}
