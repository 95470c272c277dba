//! Extraction gateway for Claimdesk.
//!
//! Translates generic extract/ask/summarize/analyze requests into calls to
//! the document platform's AI endpoints, driven by the static field tables in
//! [`claimdesk_core::extraction`], and wraps every answer in an
//! [`ExtractionEnvelope`](claimdesk_core::extraction::ExtractionEnvelope).
//!
//! The [`box_auth`] and [`token`] modules are also used by the portal for its
//! own document-platform calls.

pub mod ai;
pub mod box_auth;
pub mod error;
pub mod handlers;
pub mod token;

pub use error::{Error, Result};

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use ai::BoxAiClient;
use box_auth::BoxApiConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3001 }

/// Runtime gateway configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
  #[serde(default = "default_host")]
  pub host:    String,
  #[serde(default = "default_port")]
  pub port:    u16,
  #[serde(rename = "box", default)]
  pub box_api: BoxApiConfig,
}

// ─── Application state ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct AppState {
  pub ai: Arc<BoxAiClient>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/extract", post(handlers::extract))
    .route("/ask", post(handlers::ask))
    .route("/summarize", post(handlers::summarize))
    .route("/analyze", post(handlers::analyze))
    .route("/extraction-types", get(handlers::types))
    .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
