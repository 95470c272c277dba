//! Error types for `claimdesk-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown claim status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown claim type: {0:?}")]
  UnknownClaimType(String),

  #[error("unknown extraction type: {0:?}")]
  UnknownExtractionType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
