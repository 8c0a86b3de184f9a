//! Shared setup for router tests.

use std::{path::PathBuf, sync::Arc};

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use axum::{
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use bytes::Bytes;
use panchayat_api::TracingNotifier;
use panchayat_core::{
  staff::{NewProfile, Role},
  store::PortalStore,
};
use panchayat_store_sqlite::SqliteStore;
use rand_core::OsRng;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::{AppState, ServerConfig, auth::Account, router};

/// Every test account uses this password.
pub const PASSWORD: &str = "secret";

pub struct TestApp {
  pub state:     AppState<SqliteStore>,
  /// "Meena Devi", login `citizen`.
  pub citizen:   Uuid,
  /// "Officer Rao", login `officer`, a staff member.
  pub officer:   Uuid,
  /// "Sarpanch Kumar", login `admin`.
  pub admin:     Uuid,
  /// "Lakshmi Bai", login `neighbour`, another citizen.
  pub neighbour: Uuid,
}

pub async fn make_state() -> TestApp { make_state_with(false).await }

pub async fn make_state_with(strict_transitions: bool) -> TestApp {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(PASSWORD.as_bytes(), &salt)
    .unwrap()
    .to_string();

  let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
  let mut accounts = Vec::new();
  let mut ids = Vec::new();
  for (login, name, role) in [
    ("citizen", "Meena Devi", Role::Citizen),
    ("officer", "Officer Rao", Role::Citizen),
    ("admin", "Sarpanch Kumar", Role::Admin),
    ("neighbour", "Lakshmi Bai", Role::Citizen),
  ] {
    let profile = store.add_profile(NewProfile { name: name.into(), role }).await.unwrap();
    accounts.push(Account {
      username:      login.into(),
      password_hash: hash.clone(),
      profile_id:    profile.id,
      name:          name.into(),
      role,
    });
    ids.push(profile.id);
  }
  store.add_staff(ids[1]).await.unwrap();

  let config = ServerConfig {
    host: "127.0.0.1".into(),
    port: 8080,
    base_url: "http://localhost:8080".into(),
    store_path: PathBuf::from(":memory:"),
    files_dir: std::env::temp_dir().join(format!("panchayat-files-{}", Uuid::new_v4())),
    strict_transitions,
    accounts,
  };

  TestApp {
    state:     AppState::new(store, config, Arc::new(TracingNotifier)),
    citizen:   ids[0],
    officer:   ids[1],
    admin:     ids[2],
    neighbour: ids[3],
  }
}

pub fn basic(user: &str, pass: &str) -> String {
  let encoded = B64.encode(format!("{user}:{pass}"));
  format!("Basic {encoded}")
}

/// Send a request as `user` (with [`PASSWORD`]) and return the raw body.
pub async fn send_raw(
  state: &AppState<SqliteStore>,
  method: Method,
  uri: &str,
  user: Option<&str>,
  body: Vec<u8>,
) -> (StatusCode, Bytes) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header(header::AUTHORIZATION, basic(user, PASSWORD));
  }
  let req = builder.body(Body::from(body)).unwrap();
  let resp = router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, bytes)
}

/// Send an optional JSON body and parse the JSON response. Empty responses
/// come back as `Value::Null` and non-JSON ones as a string.
pub async fn send(
  state: &AppState<SqliteStore>,
  method: Method,
  uri: &str,
  user: Option<&str>,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let mut builder = Request::builder().method(method).uri(uri);
  if let Some(user) = user {
    builder = builder.header(header::AUTHORIZATION, basic(user, PASSWORD));
  }
  let req = match body {
    Some(json) => builder
      .header(header::CONTENT_TYPE, "application/json")
      .body(Body::from(serde_json::to_vec(&json).unwrap()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let resp = router(state.clone()).oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes)
      .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
  };
  (status, value)
}
