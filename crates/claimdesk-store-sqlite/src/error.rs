//! Error type for `claimdesk-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] claimdesk_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("claim not found: {0}")]
  ClaimNotFound(uuid::Uuid),

  #[error("user not found: {0}")]
  UserNotFound(uuid::Uuid),
}

impl Error {
  /// Whether the error means the addressed row does not exist.
  pub fn is_not_found(&self) -> bool {
    matches!(self, Error::ClaimNotFound(_) | Error::UserNotFound(_))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
