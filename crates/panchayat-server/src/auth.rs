//! HTTP Basic-auth extractor resolving the caller's portal identity.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use panchayat_core::{staff::Role, store::PortalStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::Error};

/// One login accepted by this server, bound to a portal profile.
#[derive(Deserialize, Clone)]
pub struct Account {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub profile_id:    Uuid,
  /// Used to create the profile on startup if it does not exist yet.
  pub name:          String,
  #[serde(default = "default_role")]
  pub role:          Role,
}

fn default_role() -> Role { Role::Citizen }

/// The accounts accepted by this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  pub accounts: Vec<Account>,
}

/// The authenticated caller. The role is read from the profile on every
/// request, so promotions and demotions apply immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
  pub profile_id: Uuid,
  pub role:       Role,
}

impl Actor {
  pub fn is_staff(&self) -> bool { self.role.is_staff() }

  pub fn require_staff(&self) -> Result<(), Error> {
    if self.is_staff() { Ok(()) } else { Err(Error::Forbidden("staff only")) }
  }

  pub fn require_admin(&self) -> Result<(), Error> {
    if self.role == Role::Admin { Ok(()) } else { Err(Error::Forbidden("admin only")) }
  }
}

/// Check the Basic credentials in `headers` and return the matching account.
pub fn verify_auth<'a>(headers: &HeaderMap, config: &'a AuthConfig) -> Result<&'a Account, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  let account = config
    .accounts
    .iter()
    .find(|a| a.username == username)
    .ok_or(Error::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| Error::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::Unauthorized)?;

  Ok(account)
}

impl<S> FromRequestParts<AppState<S>> for Actor
where
  S: PortalStore + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let profile_id = verify_auth(&parts.headers, &state.auth)?.profile_id;
    let profile = state
      .store
      .get_profile(profile_id)
      .await
      .map_err(|e| Error::Portal(panchayat_api::PortalError::store(e)))?;
    match profile {
      Some(p) => Ok(Actor { profile_id, role: p.role }),
      None => {
        tracing::warn!(%profile_id, "account has no profile");
        Err(Error::Unauthorized)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use axum::http::{Request, header};

  use crate::testing::{basic, make_state};

  async fn extract(
    req: Request<axum::body::Body>,
    state: &AppState<panchayat_store_sqlite::SqliteStore>,
  ) -> Result<Actor, Error> {
    let (mut parts, _) = req.into_parts();
    Actor::from_request_parts(&mut parts, state).await
  }

  #[tokio::test]
  async fn correct_credentials_resolve_profile() {
    let t = make_state().await;
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("officer", "secret"))
      .body(axum::body::Body::empty()).unwrap();
    let actor = extract(req, &t.state).await.unwrap();
    assert_eq!(actor.profile_id, t.officer);
    assert_eq!(actor.role, Role::Staff);
    assert!(actor.require_staff().is_ok());
    assert!(matches!(actor.require_admin(), Err(Error::Forbidden(_))));
  }

  #[tokio::test]
  async fn wrong_password() {
    let t = make_state().await;
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("citizen", "wrong"))
      .body(axum::body::Body::empty()).unwrap();
    assert!(matches!(extract(req, &t.state).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn unknown_user() {
    let t = make_state().await;
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("nobody", "secret"))
      .body(axum::body::Body::empty()).unwrap();
    assert!(matches!(extract(req, &t.state).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn missing_header() {
    let t = make_state().await;
    let req = Request::builder().body(axum::body::Body::empty()).unwrap();
    assert!(matches!(extract(req, &t.state).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn invalid_base64() {
    let t = make_state().await;
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic !!!not-base64!!!")
      .body(axum::body::Body::empty()).unwrap();
    assert!(matches!(extract(req, &t.state).await, Err(Error::Unauthorized)));
  }

  #[tokio::test]
  async fn role_follows_profile() {
    let t = make_state().await;
    t.state.store.set_profile_role(t.citizen, Role::Admin).await.unwrap();
    let req = Request::builder()
      .header(header::AUTHORIZATION, basic("citizen", "secret"))
      .body(axum::body::Body::empty()).unwrap();
    assert_eq!(extract(req, &t.state).await.unwrap().role, Role::Admin);
  }
}
