//! Claimdesk portal backend.
//!
//! Members log in, submit claims with supporting documents and follow their
//! progress; administrators review claims, work the adjuster task list and
//! change statuses. The portal orchestrates the document platform, the
//! extraction gateway, the workflow engine, the automation tool and the CRM.
//! Only the claims database is authoritative; every remote call is
//! best-effort and its failure degrades rather than aborts the request.

pub mod clients;
pub mod config;
pub mod error;
pub mod handlers;
pub mod session;
pub mod submission;
pub mod upload;

pub use config::PortalConfig;
pub use error::{Error, Result};

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use claimdesk_core::store::ClaimStore;
use serde_json::json;
use tower_http::trace::TraceLayer;

use clients::Services;
use handlers::{admin, auth, claims, tasks, webhook};
use session::SessionStore;

// ─── Application state ────────────────────────────────────────────────────────

pub struct AppState<S: ClaimStore> {
  pub store:    Arc<S>,
  pub config:   Arc<PortalConfig>,
  pub sessions: Arc<SessionStore>,
  pub services: Arc<Services>,
}

impl<S: ClaimStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    self.store.clone(),
      config:   self.config.clone(),
      sessions: self.sessions.clone(),
      services: self.services.clone(),
    }
  }
}

impl<S: ClaimStore> AppState<S> {
  /// Build state with fresh sessions and clients derived from `config`.
  pub fn new(store: S, config: PortalConfig, http: reqwest::Client) -> Self {
    let services = Services::from_config(http, &config);
    Self {
      store:    Arc::new(store),
      sessions: Arc::new(SessionStore::new(config.session_ttl())),
      services: Arc::new(services),
      config:   Arc::new(config),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

pub fn router<S>(state: AppState<S>) -> Router
where
  S: ClaimStore + 'static,
{
  let body_limit = state.config.uploads.request_limit();

  Router::new()
    // Sessions
    .route("/api/auth/login", post(auth::member_login::<S>))
    .route("/api/auth/logout", post(auth::logout::<S>))
    .route("/api/auth/me", get(auth::me::<S>))
    .route("/api/admin/login", post(auth::admin_login::<S>))
    // Member claims
    .route("/api/claims", get(claims::list::<S>).post(claims::create::<S>))
    .route("/api/claims/{id}", get(claims::get::<S>))
    .route("/api/claims/{id}/documents", post(claims::add_documents::<S>))
    .route("/api/claims/{id}/workflow", get(claims::workflow::<S>))
    // Administration
    .route("/api/admin/claims", get(admin::list::<S>))
    .route("/api/admin/claims/{id}", get(admin::get::<S>))
    .route("/api/admin/claims/{id}/status", put(admin::update_status::<S>))
    .route("/api/admin/claims/{id}/crm-lead", post(admin::crm_lead::<S>))
    .route("/api/admin/claims/{id}/tasks", get(tasks::list::<S>))
    .route("/api/admin/claims/{id}/tasks/{task_id}/complete", post(tasks::complete::<S>))
    .route("/api/admin/stats", get(admin::stats::<S>))
    // Inbound events
    .route("/webhooks/box", post(webhook::receive::<S>))
    .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
