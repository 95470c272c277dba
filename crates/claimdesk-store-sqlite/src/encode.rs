//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, UUIDs
//! are hyphenated lowercase strings and nested structures are compact JSON.

use chrono::{DateTime, NaiveDate, Utc};
use claimdesk_core::{
  claim::{Claim, ClaimStatus, ClaimType, StatusChange, StoredFile, WorkflowLink},
  user::User,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_change(c: &StatusChange) -> Result<String> { Ok(serde_json::to_string(c)?) }

pub fn encode_history(h: &[StatusChange]) -> Result<String> { Ok(serde_json::to_string(h)?) }

pub fn encode_file(f: &StoredFile) -> Result<String> { Ok(serde_json::to_string(f)?) }

pub fn encode_files(f: &[StoredFile]) -> Result<String> { Ok(serde_json::to_string(f)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str =
  "user_id, name, email, password_hash, policy_number, member_since";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:       String,
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub policy_number: String,
  pub member_since:  String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:       row.get(0)?,
      name:          row.get(1)?,
      email:         row.get(2)?,
      password_hash: row.get(3)?,
      policy_number: row.get(4)?,
      member_since:  row.get(5)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:       decode_uuid(&self.user_id)?,
      name:          self.name,
      email:         self.email,
      password_hash: self.password_hash,
      policy_number: self.policy_number,
      member_since:  decode_date(&self.member_since)?,
    })
  }
}

pub const CLAIM_COLUMNS: &str = "claim_id, user_id, user_name, policy_number, claim_type,
  description, incident_date, estimated_amount, status, status_history,
  folder_id, files, extraction, process_key, workflow_status, risk_score,
  workflow_degraded, created_at, updated_at";

/// Raw values read directly from a `claims` row.
pub struct RawClaim {
  pub claim_id:          String,
  pub user_id:           String,
  pub user_name:         String,
  pub policy_number:     String,
  pub claim_type:        String,
  pub description:       String,
  pub incident_date:     String,
  pub estimated_amount:  f64,
  pub status:            String,
  pub status_history:    String,
  pub folder_id:         Option<String>,
  pub files:             String,
  pub extraction:        Option<String>,
  pub process_key:       Option<String>,
  pub workflow_status:   Option<String>,
  pub risk_score:        Option<f64>,
  pub workflow_degraded: bool,
  pub created_at:        String,
  pub updated_at:        String,
}

impl RawClaim {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      claim_id:          row.get(0)?,
      user_id:           row.get(1)?,
      user_name:         row.get(2)?,
      policy_number:     row.get(3)?,
      claim_type:        row.get(4)?,
      description:       row.get(5)?,
      incident_date:     row.get(6)?,
      estimated_amount:  row.get(7)?,
      status:            row.get(8)?,
      status_history:    row.get(9)?,
      folder_id:         row.get(10)?,
      files:             row.get(11)?,
      extraction:        row.get(12)?,
      process_key:       row.get(13)?,
      workflow_status:   row.get(14)?,
      risk_score:        row.get(15)?,
      workflow_degraded: row.get(16)?,
      created_at:        row.get(17)?,
      updated_at:        row.get(18)?,
    })
  }

  pub fn into_claim(self) -> Result<Claim> {
    let status: ClaimStatus = self.status.parse()?;
    let claim_type: ClaimType = self.claim_type.parse()?;
    let status_history: Vec<StatusChange> = serde_json::from_str(&self.status_history)?;
    let files: Vec<StoredFile> = serde_json::from_str(&self.files)?;
    let extraction = self
      .extraction
      .as_deref()
      .map(serde_json::from_str)
      .transpose()?;

    Ok(Claim {
      claim_id: decode_uuid(&self.claim_id)?,
      user_id: decode_uuid(&self.user_id)?,
      user_name: self.user_name,
      policy_number: self.policy_number,
      claim_type,
      description: self.description,
      incident_date: decode_date(&self.incident_date)?,
      estimated_amount: self.estimated_amount,
      status,
      status_history,
      folder_id: self.folder_id,
      files,
      extraction,
      workflow: WorkflowLink {
        process_key:     self.process_key,
        workflow_status: self.workflow_status,
        risk_score:      self.risk_score,
        degraded:        self.workflow_degraded,
      },
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}
