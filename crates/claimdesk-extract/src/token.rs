//! Process-scoped cache for a single OAuth access token.
//!
//! The cache is an explicit value owned by whichever client needs it; it is
//! empty after a restart. The lock is held across a refresh so concurrent
//! callers wait for one fetch instead of each issuing their own.

use std::{future::Future, time::Duration};

use tokio::{sync::Mutex, time::Instant};

/// Tokens are refreshed this long before the issuer says they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

struct Cached<T> {
  value:      T,
  expires_at: Instant,
}

pub struct TokenCache<T> {
  slot: Mutex<Option<Cached<T>>>,
}

impl<T: Clone> TokenCache<T> {
  pub fn new() -> Self { Self { slot: Mutex::new(None) } }

  /// Return the cached token, or run `fetch` to obtain a new one.
  ///
  /// `fetch` yields the token and its lifetime as reported by the issuer.
  pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<T, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(T, Duration), E>>,
  {
    let mut slot = self.slot.lock().await;
    if let Some(cached) = slot.as_ref()
      && Instant::now() < cached.expires_at
    {
      return Ok(cached.value.clone());
    }

    let (value, lifetime) = fetch().await?;
    let expires_at = Instant::now() + lifetime.saturating_sub(EXPIRY_MARGIN);
    *slot = Some(Cached { value: value.clone(), expires_at });
    tracing::debug!(lifetime_secs = lifetime.as_secs(), "access token refreshed");
    Ok(value)
  }

  /// Drop the cached token so the next call fetches a fresh one.
  pub async fn invalidate(&self) { *self.slot.lock().await = None; }
}

impl<T: Clone> Default for TokenCache<T> {
  fn default() -> Self { Self::new() }
}
