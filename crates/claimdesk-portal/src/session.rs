//! Cookie sessions and the extractors that require them.
//!
//! Sessions live in process memory and are lost on restart. The store is
//! owned by [`AppState`] rather than being a global.

use std::{collections::HashMap, time::Duration};

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, HeaderValue, header, request::Parts},
};
use claimdesk_core::store::ClaimStore;
use tokio::{sync::RwLock, time::Instant};
use uuid::Uuid;

use crate::{AppState, error::Error};

pub const COOKIE_NAME: &str = "claimdesk_session";

/// Who a session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
  Member { user_id: Uuid, email: String, name: String },
  Admin { username: String },
}

struct Session {
  principal:  Principal,
  expires_at: Instant,
}

pub struct SessionStore {
  ttl:      Duration,
  sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
  pub fn new(ttl: Duration) -> Self { Self { ttl, sessions: RwLock::new(HashMap::new()) } }

  pub fn ttl(&self) -> Duration { self.ttl }

  /// Open a session and return its token.
  pub async fn create(&self, principal: Principal) -> String {
    let token = Uuid::new_v4().to_string();
    let session = Session { principal, expires_at: Instant::now() + self.ttl };
    let mut sessions = self.sessions.write().await;
    sessions.retain(|_, s| s.expires_at > Instant::now());
    sessions.insert(token.clone(), session);
    token
  }

  /// The principal for `token`, if the session exists and has not expired.
  pub async fn get(&self, token: &str) -> Option<Principal> {
    {
      let sessions = self.sessions.read().await;
      match sessions.get(token) {
        Some(s) if s.expires_at > Instant::now() => return Some(s.principal.clone()),
        Some(_) => {}
        None => return None,
      }
    }
    self.sessions.write().await.remove(token);
    None
  }

  pub async fn remove(&self, token: &str) { self.sessions.write().await.remove(token); }
}

// ─── Cookies ─────────────────────────────────────────────────────────────────

/// The session token carried in the request's `Cookie` header(s), if any.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == COOKIE_NAME)
    .map(|(_, value)| value.to_string())
}

pub fn set_cookie(token: &str, ttl: Duration, secure: bool) -> Result<HeaderValue, Error> {
  let mut cookie = format!(
    "{COOKIE_NAME}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
    ttl.as_secs()
  );
  if secure {
    cookie.push_str("; Secure");
  }
  HeaderValue::from_str(&cookie).map_err(|_| Error::BadRequest("invalid session token".into()))
}

pub fn clear_cookie() -> HeaderValue {
  HeaderValue::from_static("claimdesk_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

// ─── Extractors ──────────────────────────────────────────────────────────────

async fn principal<S: ClaimStore>(parts: &Parts, state: &AppState<S>) -> Result<Principal, Error> {
  let token = token_from_headers(&parts.headers).ok_or(Error::Unauthorized)?;
  state.sessions.get(&token).await.ok_or(Error::Unauthorized)
}

/// A request made by a logged-in member.
pub struct MemberSession {
  pub user_id: Uuid,
  pub email:   String,
  pub name:    String,
}

impl<S> FromRequestParts<AppState<S>> for MemberSession
where
  S: ClaimStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match principal(parts, state).await? {
      Principal::Member { user_id, email, name } => Ok(MemberSession { user_id, email, name }),
      Principal::Admin { .. } => Err(Error::Forbidden),
    }
  }
}

/// A request made by a logged-in administrator.
pub struct AdminSession {
  pub username: String,
}

impl<S> FromRequestParts<AppState<S>> for AdminSession
where
  S: ClaimStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match principal(parts, state).await? {
      Principal::Admin { username } => Ok(AdminSession { username }),
      Principal::Member { .. } => Err(Error::Forbidden),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn member() -> Principal {
    Principal::Member { user_id: Uuid::new_v4(), email: "a@b.c".into(), name: "A".into() }
  }

  #[tokio::test]
  async fn created_session_resolves() {
    let store = SessionStore::new(Duration::from_secs(60));
    let token = store.create(member()).await;
    assert!(matches!(store.get(&token).await, Some(Principal::Member { .. })));
  }

  #[tokio::test]
  async fn expired_session_is_gone() {
    let store = SessionStore::new(Duration::ZERO);
    let token = store.create(member()).await;
    assert_eq!(store.get(&token).await, None);
  }

  #[tokio::test]
  async fn removed_session_is_gone() {
    let store = SessionStore::new(Duration::from_secs(60));
    let token = store.create(Principal::Admin { username: "root".into() }).await;
    store.remove(&token).await;
    assert_eq!(store.get(&token).await, None);
  }

  #[test]
  fn cookie_is_found_among_others() {
    let mut headers = HeaderMap::new();
    headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; claimdesk_session=abc"));
    assert_eq!(token_from_headers(&headers).as_deref(), Some("abc"));
  }

  #[test]
  fn set_cookie_attributes() {
    let v = set_cookie("t", Duration::from_secs(5), true).unwrap();
    let s = v.to_str().unwrap();
    assert!(s.starts_with("claimdesk_session=t;"));
    assert!(s.contains("HttpOnly"));
    assert!(s.contains("SameSite=Lax"));
    assert!(s.contains("Max-Age=5"));
    assert!(s.ends_with("; Secure"));
  }
}
