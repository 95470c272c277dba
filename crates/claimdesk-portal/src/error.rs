//! Portal error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  #[error("forbidden")]
  Forbidden,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  PayloadTooLarge(String),

  #[error("{0}")]
  UnsupportedMediaType(String),

  /// A remote service answered with a failure status.
  #[error("{service} error ({status}): {body}")]
  Upstream {
    service: &'static str,
    status:  u16,
    body:    String,
  },

  #[error("{0} is not configured")]
  NotConfigured(&'static str),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Document-platform token acquisition failed.
  #[error(transparent)]
  Auth(#[from] claimdesk_extract::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub fn store<E: std::error::Error + Send + Sync + 'static>(e: E) -> Self {
    Error::Store(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) | Error::NotConfigured(_) => StatusCode::BAD_REQUEST,
      Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
      Error::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
      Error::Upstream { .. } | Error::Http(_) | Error::Auth(_) => StatusCode::BAD_GATEWAY,
      Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
