//! Portal members.
//!
//! Users are created by seed data only; the portal never mutates them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A policy holder who can log into the member side of the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub user_id:       Uuid,
  pub name:          String,
  pub email:         String,
  /// argon2 PHC string. Never leaves the process.
  #[serde(skip_serializing, default)]
  pub password_hash: String,
  pub policy_number: String,
  pub member_since:  NaiveDate,
}

/// Input for [`ClaimStore::upsert_user`](crate::store::ClaimStore::upsert_user).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub policy_number: String,
  pub member_since:  NaiveDate,
}
