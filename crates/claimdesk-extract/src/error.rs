//! Gateway error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  BadRequest(&'static str),

  /// The document platform answered with a non-success status.
  #[error("document platform error ({status}): {body}")]
  Vendor { status: u16, body: String },

  #[error("document platform authentication failed: {0}")]
  Auth(String),

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Vendor { .. } | Error::Auth(_) | Error::Http(_) => {
        tracing::error!(error = %self, "extraction request failed");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
