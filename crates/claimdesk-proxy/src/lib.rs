//! Reverse proxy in front of the automation backend.
//!
//! Everything under `/webhook`, `/api` and `/rest` is forwarded to the
//! configured target with the `Host` header rewritten to the target's. One
//! rule (see [`rewrite`]) redirects document-platform events posted to a
//! single inbound webhook to the workflow that handles their trigger.
//!
//! There is no retry and no circuit breaker: a connection failure yields a
//! 502 carrying the error text.

pub mod error;
pub mod rewrite;

pub use error::Error;

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  extract::{Request, State},
  http::{HeaderMap, HeaderName, StatusCode, header},
  response::{IntoResponse, Response},
  routing::any,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8080 }
fn default_target() -> String { "http://localhost:5678".into() }
fn default_rewrite_source() -> String { "/webhook/box-file-upload".into() }
fn default_max_body() -> usize { 16 * 1024 * 1024 }

#[derive(Debug, Deserialize, Clone)]
pub struct ProxyConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  /// Base URL of the automation backend.
  #[serde(default = "default_target")]
  pub target_url:     String,
  /// The inbound path the trigger rewrite applies to.
  #[serde(default = "default_rewrite_source")]
  pub rewrite_source: String,
  #[serde(default = "default_max_body")]
  pub max_body_bytes: usize,
}

impl Default for ProxyConfig {
  fn default() -> Self {
    Self {
      host:           default_host(),
      port:           default_port(),
      target_url:     default_target(),
      rewrite_source: default_rewrite_source(),
      max_body_bytes: default_max_body(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
  pub http:   reqwest::Client,
  pub config: Arc<ProxyConfig>,
}

impl AppState {
  /// Redirects from the backend are returned to the caller, never followed.
  pub fn new(config: ProxyConfig) -> Result<Self, Error> {
    let http = reqwest::Client::builder()
      .redirect(reqwest::redirect::Policy::none())
      .build()?;
    Ok(Self { http, config: Arc::new(config) })
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/webhook", any(forward))
    .route("/webhook/{*rest}", any(forward))
    .route("/api", any(forward))
    .route("/api/{*rest}", any(forward))
    .route("/rest", any(forward))
    .route("/rest/{*rest}", any(forward))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Headers that describe a single hop and must not be copied across.
const HOP_BY_HOP: [HeaderName; 7] = [
  header::CONNECTION,
  header::HOST,
  header::CONTENT_LENGTH,
  header::TRANSFER_ENCODING,
  header::TE,
  header::TRAILER,
  header::UPGRADE,
];

fn strip_hop_by_hop(headers: &mut HeaderMap) {
  for name in &HOP_BY_HOP {
    headers.remove(name);
  }
  headers.remove("keep-alive");
  headers.remove("proxy-connection");
}

async fn forward(State(state): State<AppState>, req: Request<Body>) -> Response {
  match forward_inner(&state, req).await {
    Ok(r) => r,
    Err(e) => e.into_response(),
  }
}

async fn forward_inner(state: &AppState, req: Request<Body>) -> Result<Response, Error> {
  let (parts, body) = req.into_parts();
  let body = axum::body::to_bytes(body, state.config.max_body_bytes)
    .await
    .map_err(|_| Error::BodyTooLarge)?;

  let inbound = parts.uri.path();
  let path = match rewrite::rewrite_target(&parts.method, inbound, &state.config.rewrite_source, &body) {
    Some(target) => {
      tracing::info!(from = inbound, to = target, "rewriting trigger webhook");
      target
    }
    None => inbound,
  };

  let mut url = format!("{}{}", state.config.target_url.trim_end_matches('/'), path);
  if let Some(q) = parts.uri.query() {
    url.push('?');
    url.push_str(q);
  }

  let mut headers = parts.headers.clone();
  strip_hop_by_hop(&mut headers);

  let upstream = state
    .http
    .request(parts.method.clone(), &url)
    .headers(headers)
    .body(body)
    .send()
    .await?;

  let status = upstream.status();
  let mut resp_headers = upstream.headers().clone();
  strip_hop_by_hop(&mut resp_headers);
  let bytes = upstream.bytes().await?;

  let mut resp = Response::new(Body::from(bytes));
  *resp.status_mut() = StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
  *resp.headers_mut() = resp_headers;
  Ok(resp)
}

// ─── Integration tests ────────────────────────────────────────────────────────
