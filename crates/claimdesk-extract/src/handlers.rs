//! Gateway route handlers.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/extract` | `{"fileId":"…","extractionType":"fnol"}` |
//! | `POST` | `/ask` | `{"fileId":"…","question":"…"}` |
//! | `POST` | `/summarize` | `{"fileId":"…","extractionType":"…"}` (type optional) |
//! | `POST` | `/analyze` | `{"fileId":"…","extractionType":"…"}` |
//! | `GET`  | `/extraction-types` | — |

use axum::{Json, extract::State};
use claimdesk_core::extraction::{
  ExtractionEnvelope, ExtractionType, FieldSpec, retain_documented_fields,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, Error, Result};

const GENERIC_SUMMARY_PROMPT: &str =
  "Summarize this document in three sentences, focusing on facts relevant to an insurance claim.";

/// Body shared by every document operation. Fields are optional so that
/// missing values produce a 400 with a fixed message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
  pub file_id:         Option<String>,
  pub extraction_type: Option<String>,
  pub question:        Option<String>,
}

impl DocumentRequest {
  fn file_id(&self) -> Result<&str> {
    self
      .file_id
      .as_deref()
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .ok_or(Error::BadRequest("fileId is required"))
  }

  fn extraction_type(&self) -> Result<Option<ExtractionType>> {
    match self.extraction_type.as_deref() {
      None => Ok(None),
      Some(s) => s
        .parse()
        .map(Some)
        .map_err(|_| Error::BadRequest("unknown extractionType")),
    }
  }

  fn required_type(&self) -> Result<ExtractionType> {
    self
      .extraction_type()?
      .ok_or(Error::BadRequest("extractionType is required"))
  }
}

// ─── Extract ─────────────────────────────────────────────────────────────────

/// `POST /extract` — structured extraction using the type's field table.
pub async fn extract(
  State(state): State<AppState>,
  Json(req): Json<DocumentRequest>,
) -> Result<Json<ExtractionEnvelope>> {
  let file_id = req.file_id()?;
  let ty = req.required_type()?;

  tracing::info!(file_id, extraction_type = %ty, "structured extraction");
  let answer = state.ai.extract_structured(file_id, ty.fields()).await?;
  let data = retain_documented_fields(ty, answer);
  Ok(Json(ExtractionEnvelope::ok(file_id, Some(ty), data)))
}

// ─── Ask ─────────────────────────────────────────────────────────────────────

/// `POST /ask` — free-form question about one document.
pub async fn ask(
  State(state): State<AppState>,
  Json(req): Json<DocumentRequest>,
) -> Result<Json<ExtractionEnvelope>> {
  let file_id = req.file_id()?;
  let question = req
    .question
    .as_deref()
    .map(str::trim)
    .filter(|q| !q.is_empty())
    .ok_or(Error::BadRequest("question is required"))?;

  let answer = state.ai.ask(file_id, question).await?;
  Ok(Json(ExtractionEnvelope::ok(
    file_id,
    None,
    json!({ "question": question, "answer": answer }),
  )))
}

// ─── Summarize / analyze ─────────────────────────────────────────────────────

/// `POST /summarize` — uses the type's summary prompt, or a generic one.
pub async fn summarize(
  State(state): State<AppState>,
  Json(req): Json<DocumentRequest>,
) -> Result<Json<ExtractionEnvelope>> {
  let file_id = req.file_id()?;
  let ty = req.extraction_type()?;
  let prompt = ty.map_or(GENERIC_SUMMARY_PROMPT, ExtractionType::summary_prompt);

  let summary = state.ai.ask(file_id, prompt).await?;
  Ok(Json(ExtractionEnvelope::ok(file_id, ty, json!({ "summary": summary }))))
}

/// `POST /analyze` — risk/consistency review with the type's analysis prompt.
pub async fn analyze(
  State(state): State<AppState>,
  Json(req): Json<DocumentRequest>,
) -> Result<Json<ExtractionEnvelope>> {
  let file_id = req.file_id()?;
  let ty = req.required_type()?;

  let analysis = state.ai.ask(file_id, ty.analysis_prompt()).await?;
  Ok(Json(ExtractionEnvelope::ok(file_id, Some(ty), json!({ "analysis": analysis }))))
}

// ─── Catalogue ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct TypeInfo {
  #[serde(rename = "type")]
  pub ty:     ExtractionType,
  pub fields: &'static [FieldSpec],
}

/// `GET /extraction-types`
pub async fn types() -> Json<Vec<TypeInfo>> {
  Json(
    ExtractionType::ALL
      .into_iter()
      .map(|ty| TypeInfo { ty, fields: ty.fields() })
      .collect(),
  )
}
