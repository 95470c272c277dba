//! Login, logout and session introspection.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Json,
  extract::State,
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
};
use claimdesk_core::store::ClaimStore;
use serde::Deserialize;
use serde_json::json;

use crate::{
  AppState,
  error::{Error, Result},
  session::{self, Principal},
};

#[derive(Deserialize)]
pub struct MemberLogin {
  pub email:    String,
  pub password: String,
}

#[derive(Deserialize)]
pub struct AdminLogin {
  pub username: String,
  pub password: String,
}

/// Check `password` against a PHC hash; any failure is `Unauthorized`.
pub fn verify_password(password: &str, phc: &str) -> Result<()> {
  let parsed = PasswordHash::new(phc).map_err(|_| Error::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .map_err(|_| Error::Unauthorized)
}

async fn open_session<S: ClaimStore>(
  state: &AppState<S>,
  principal: Principal,
  body: serde_json::Value,
) -> Result<Response> {
  let token = state.sessions.create(principal).await;
  let cookie = session::set_cookie(&token, state.sessions.ttl(), state.config.secure_cookies)?;
  Ok(([(header::SET_COOKIE, cookie)], Json(body)).into_response())
}

pub async fn member_login<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<MemberLogin>,
) -> Result<Response> {
  let user = state
    .store
    .get_user_by_email(body.email.trim())
    .await
    .map_err(Error::store)?
    .ok_or(Error::Unauthorized)?;
  verify_password(&body.password, &user.password_hash)?;

  tracing::info!(user_id = %user.user_id, "member logged in");
  let principal = Principal::Member {
    user_id: user.user_id,
    email:   user.email.clone(),
    name:    user.name.clone(),
  };
  open_session(&state, principal, json!({ "user": user })).await
}

pub async fn admin_login<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<AdminLogin>,
) -> Result<Response> {
  let account = state
    .config
    .admins
    .iter()
    .find(|a| a.username == body.username)
    .ok_or(Error::Unauthorized)?;
  verify_password(&body.password, &account.password_hash)?;

  tracing::info!(username = %account.username, "admin logged in");
  let principal = Principal::Admin { username: account.username.clone() };
  open_session(&state, principal, json!({ "admin": { "username": account.username } })).await
}

pub async fn logout<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Response {
  if let Some(token) = session::token_from_headers(&headers) {
    state.sessions.remove(&token).await;
  }
  (StatusCode::NO_CONTENT, [(header::SET_COOKIE, session::clear_cookie())]).into_response()
}

pub async fn me<S: ClaimStore + 'static>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<Json<serde_json::Value>> {
  let token = session::token_from_headers(&headers).ok_or(Error::Unauthorized)?;
  match state.sessions.get(&token).await.ok_or(Error::Unauthorized)? {
    Principal::Member { user_id, .. } => {
      let user = state
        .store
        .get_user(user_id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::Unauthorized)?;
      Ok(Json(json!({ "role": "member", "user": user })))
    }
    Principal::Admin { username } => {
      Ok(Json(json!({ "role": "admin", "admin": { "username": username } })))
    }
  }
}
