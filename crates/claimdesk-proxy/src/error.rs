//! Proxy error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("request body too large")]
  BodyTooLarge,

  #[error("{0}")]
  Upstream(#[from] reqwest::Error),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::BodyTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()).into_response(),
      Error::Upstream(e) => {
        tracing::error!(error = %e, "downstream request failed");
        (StatusCode::BAD_GATEWAY, format!("Proxy error: {e}")).into_response()
      }
    }
  }
}
