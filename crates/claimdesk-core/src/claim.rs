//! Claim types — the unit of work moving through the portal.
//!
//! A claim is created once per submission and mutated only by status changes,
//! file additions and workflow updates. It is never deleted.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Every status a claim can be in. Anything else is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
  Submitted,
  UnderReview,
  PendingInformation,
  SiuReview,
  Approved,
  Denied,
  Paid,
  Closed,
}

impl ClaimStatus {
  pub const ALL: [ClaimStatus; 8] = [
    ClaimStatus::Submitted,
    ClaimStatus::UnderReview,
    ClaimStatus::PendingInformation,
    ClaimStatus::SiuReview,
    ClaimStatus::Approved,
    ClaimStatus::Denied,
    ClaimStatus::Paid,
    ClaimStatus::Closed,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      ClaimStatus::Submitted => "submitted",
      ClaimStatus::UnderReview => "under_review",
      ClaimStatus::PendingInformation => "pending_information",
      ClaimStatus::SiuReview => "siu_review",
      ClaimStatus::Approved => "approved",
      ClaimStatus::Denied => "denied",
      ClaimStatus::Paid => "paid",
      ClaimStatus::Closed => "closed",
    }
  }

  /// Statuses after which no further review task exists.
  #[cfg(test)]
  pub fn is_terminal(self) -> bool {
    matches!(self, ClaimStatus::Denied | ClaimStatus::Paid | ClaimStatus::Closed)
  }
}

impl fmt::Display for ClaimStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for ClaimStatus {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    ClaimStatus::ALL
      .into_iter()
      .find(|st| st.as_str() == s)
      .ok_or_else(|| Error::UnknownStatus(s.to_owned()))
  }
}

/// One entry of a claim's status history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
  pub status:     ClaimStatus,
  pub at:         DateTime<Utc>,
  pub note:       Option<String>,
  /// Email of the member or username of the admin who made the change.
  pub changed_by: String,
}

impl StatusChange {
  pub fn now(status: ClaimStatus, changed_by: impl Into<String>, note: Option<String>) -> Self {
    Self { status, at: Utc::now(), note, changed_by: changed_by.into() }
  }
}

// ─── Claim type ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimType {
  Auto,
  Property,
  Medical,
  Liability,
  Other,
}

impl ClaimType {
  pub fn as_str(self) -> &'static str {
    match self {
      ClaimType::Auto => "auto",
      ClaimType::Property => "property",
      ClaimType::Medical => "medical",
      ClaimType::Liability => "liability",
      ClaimType::Other => "other",
    }
  }
}

impl FromStr for ClaimType {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "auto" => Ok(ClaimType::Auto),
      "property" => Ok(ClaimType::Property),
      "medical" => Ok(ClaimType::Medical),
      "liability" => Ok(ClaimType::Liability),
      "other" => Ok(ClaimType::Other),
      other => Err(Error::UnknownClaimType(other.to_owned())),
    }
  }
}

// ─── Attachments & workflow ──────────────────────────────────────────────────

/// A file stored on the document platform on behalf of a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
  pub file_id:      String,
  pub name:         String,
  pub size:         u64,
  pub content_type: String,
  pub uploaded_at:  DateTime<Utc>,
}

/// Correlation between a claim and its remote workflow process.
///
/// Populated best-effort. `degraded` is set when the values were produced
/// locally because the workflow engine could not be reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowLink {
  pub process_key:     Option<String>,
  pub workflow_status: Option<String>,
  pub risk_score:      Option<f64>,
  #[serde(default)]
  pub degraded:        bool,
}

// ─── Claim ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
  pub claim_id:         Uuid,
  pub user_id:          Uuid,
  /// Denormalised from the owning user at creation time.
  pub user_name:        String,
  pub policy_number:    String,
  pub claim_type:       ClaimType,
  pub description:      String,
  pub incident_date:    NaiveDate,
  pub estimated_amount: f64,
  pub status:           ClaimStatus,
  /// Append-only; the last entry always carries `status`.
  pub status_history:   Vec<StatusChange>,
  pub folder_id:        Option<String>,
  pub files:            Vec<StoredFile>,
  /// Opaque result of the AI extraction on the first uploaded file.
  pub extraction:       Option<serde_json::Value>,
  pub workflow:         WorkflowLink,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Claim {
  /// Whether `status` agrees with the head of `status_history`.
  pub fn history_consistent(&self) -> bool {
    self.status_history.last().is_some_and(|h| h.status == self.status)
  }
}

/// Input for [`ClaimStore::create_claim`](crate::store::ClaimStore::create_claim).
#[derive(Debug, Clone)]
pub struct NewClaim {
  pub user_id:          Uuid,
  pub user_name:        String,
  pub policy_number:    String,
  pub claim_type:       ClaimType,
  pub description:      String,
  pub incident_date:    NaiveDate,
  pub estimated_amount: f64,
  pub folder_id:        Option<String>,
  pub files:            Vec<StoredFile>,
  pub extraction:       Option<serde_json::Value>,
  /// Recorded as `changed_by` on the initial history entry.
  pub submitted_by:     String,
}
