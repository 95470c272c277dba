//! The `ClaimStore` trait and supporting query types.
//!
//! Implemented by storage backends (e.g. `claimdesk-store-sqlite`). The portal
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  claim::{Claim, ClaimStatus, NewClaim, StatusChange, StoredFile, WorkflowLink},
  user::{NewUser, User},
};

/// Parameters for [`ClaimStore::list_claims`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ClaimFilter {
  /// Restrict to claims owned by this user.
  pub user_id: Option<Uuid>,
  pub status:  Option<ClaimStatus>,
}

/// Abstraction over a claims database.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait ClaimStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Insert a user, or update the existing one with the same email.
  fn upsert_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn get_user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Claims ────────────────────────────────────────────────────────────

  /// Persist a new claim with status `submitted` and a one-entry history.
  fn create_claim(
    &self,
    input: NewClaim,
  ) -> impl Future<Output = Result<Claim, Self::Error>> + Send + '_;

  fn get_claim(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Claim>, Self::Error>> + Send + '_;

  /// Claims matching `filter`, newest first.
  fn list_claims(
    &self,
    filter: ClaimFilter,
  ) -> impl Future<Output = Result<Vec<Claim>, Self::Error>> + Send + '_;

  /// Set `status` and append `change` to the history in one transaction.
  fn update_status(
    &self,
    id: Uuid,
    change: StatusChange,
  ) -> impl Future<Output = Result<Claim, Self::Error>> + Send + '_;

  fn set_workflow(
    &self,
    id: Uuid,
    link: WorkflowLink,
  ) -> impl Future<Output = Result<Claim, Self::Error>> + Send + '_;

  /// Append files to the claim's attachment list.
  fn add_files(
    &self,
    id: Uuid,
    files: Vec<StoredFile>,
  ) -> impl Future<Output = Result<Claim, Self::Error>> + Send + '_;

  fn find_claim_by_folder<'a>(
    &'a self,
    folder_id: &'a str,
  ) -> impl Future<Output = Result<Option<Claim>, Self::Error>> + Send + 'a;

  /// Number of claims per status; statuses with no claims are omitted.
  fn status_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<(ClaimStatus, u64)>, Self::Error>> + Send + '_;
}
