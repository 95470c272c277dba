//! Local stand-ins for the remote workflow engine.
//!
//! When the engine is unreachable the portal answers task and decision
//! requests from these tables and marks the response as degraded.

use serde::Serialize;
use uuid::Uuid;

use crate::claim::ClaimStatus;

/// Process key prefix used when no remote process could be started.
pub const DEMO_KEY_PREFIX: &str = "DEMO-";

/// Workflow status recorded alongside a locally-generated process key.
pub const DEMO_WORKFLOW_STATUS: &str = "DEMO";

pub fn demo_process_key() -> String { format!("{DEMO_KEY_PREFIX}{}", Uuid::new_v4()) }

pub fn is_demo_key(key: &str) -> bool { key.starts_with(DEMO_KEY_PREFIX) }

// ─── Tasks ───────────────────────────────────────────────────────────────────

/// A user task shaped like the engine's task resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticTask {
  pub id:                  String,
  pub name:                &'static str,
  pub task_definition_key: &'static str,
  pub assignee:            Option<&'static str>,
}

/// The task an adjuster would be working on for a claim in `status`.
pub fn fallback_task(status: ClaimStatus, claim_id: Uuid) -> Option<SyntheticTask> {
  let (name, key, assignee) = match status {
    ClaimStatus::Submitted => ("Initial Review", "initial_review", Some("intake")),
    ClaimStatus::UnderReview => ("Adjuster Review", "adjuster_review", Some("adjuster")),
    ClaimStatus::PendingInformation => ("Await Documents", "await_documents", None),
    ClaimStatus::SiuReview => ("SIU Investigation", "siu_investigation", Some("siu")),
    ClaimStatus::Approved => ("Process Payment", "process_payment", Some("finance")),
    ClaimStatus::Denied | ClaimStatus::Paid | ClaimStatus::Closed => return None,
  };
  Some(SyntheticTask {
    id: format!("{DEMO_KEY_PREFIX}{key}-{claim_id}"),
    name,
    task_definition_key: key,
    assignee,
  })
}

// ─── Decisions ───────────────────────────────────────────────────────────────

/// An adjuster decision submitted when completing a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
  Approve,
  Deny,
  Investigate,
  RequestInformation,
  Review,
  Pay,
  Close,
}

impl Decision {
  /// Case-insensitive; surrounding whitespace ignored. `None` when the value
  /// is not a known decision.
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "approve" | "approved" => Some(Decision::Approve),
      "deny" | "denied" | "reject" | "rejected" => Some(Decision::Deny),
      "investigate" | "siu" | "refer_siu" => Some(Decision::Investigate),
      "request_info" | "request_information" | "more_info" => Some(Decision::RequestInformation),
      "review" => Some(Decision::Review),
      "pay" | "paid" => Some(Decision::Pay),
      "close" | "closed" => Some(Decision::Close),
      _ => None,
    }
  }

  pub fn resulting_status(self) -> ClaimStatus {
    match self {
      Decision::Approve => ClaimStatus::Approved,
      Decision::Deny => ClaimStatus::Denied,
      Decision::Investigate => ClaimStatus::SiuReview,
      Decision::RequestInformation => ClaimStatus::PendingInformation,
      Decision::Review => ClaimStatus::UnderReview,
      Decision::Pay => ClaimStatus::Paid,
      Decision::Close => ClaimStatus::Closed,
    }
  }
}

/// Deterministic 0–100 risk score from the claimed amount; used only when
/// the engine did not supply one.
pub fn demo_risk_score(estimated_amount: f64) -> f64 {
  let raw = (estimated_amount.max(0.0) / 500.0).min(100.0);
  (raw * 10.0).round() / 10.0
}
