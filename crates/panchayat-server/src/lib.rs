//! HTTP surface of the Gram Panchayat portal.
//!
//! Exposes an axum [`Router`] serving the portal's JSON API under `/api`,
//! uploaded files under `/files`, and a liveness probe at `/health`. Every
//! `/api` route requires HTTP Basic auth; the caller's role comes from their
//! portal profile.

pub mod auth;
pub mod error;
pub mod handlers;

#[cfg(test)]
mod testing;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{delete, get, patch, post},
};
use panchayat_api::{
  AnnouncementController, ComplaintController, DocumentController, LiveView, Notifier,
  StaffController, StorageController, TransitionMode,
};
use panchayat_core::{realtime::Table, staff::StaffPerformance, store::PortalStore};
use panchayat_store_sqlite::FsObjectStore;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

use auth::{Account, AuthConfig};
use handlers::{announcements, complaints, documents, health, staff, uploads};

/// Largest accepted upload body.
const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// The staff report also changes when membership does.
const PERFORMANCE_TABLES: &[Table] = &[Table::Complaints, Table::DocumentRequests, Table::Staff];

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  /// Public origin, used to build the URLs of uploaded files.
  pub base_url:           String,
  pub store_path:         PathBuf,
  /// Root directory of the object store, served under `/files`.
  pub files_dir:          PathBuf,
  /// Write workflow transitions only while the row is still in the status
  /// the reviewer saw.
  #[serde(default)]
  pub strict_transitions: bool,
  #[serde(default)]
  pub accounts:           Vec<Account>,
}

impl ServerConfig {
  pub fn transition_mode(&self) -> TransitionMode {
    if self.strict_transitions {
      TransitionMode::CompareAndSwap
    } else {
      TransitionMode::LastWriteWins
    }
  }

  /// Public URL prefix of the object store.
  pub fn files_url(&self) -> String { format!("{}/files", self.base_url.trim_end_matches('/')) }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:         Arc<S>,
  pub config:        Arc<ServerConfig>,
  pub auth:          Arc<AuthConfig>,
  pub documents:     DocumentController<S>,
  pub announcements: AnnouncementController<S>,
  pub staff:         StaffController<S>,
  pub complaints:    ComplaintController<S>,
  pub storage:       StorageController<FsObjectStore>,
  /// Staff report kept current by the store's change feed.
  pub performance:   Arc<LiveView<Vec<StaffPerformance>>>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:         self.store.clone(),
      config:        self.config.clone(),
      auth:          self.auth.clone(),
      documents:     self.documents.clone(),
      announcements: self.announcements.clone(),
      staff:         self.staff.clone(),
      complaints:    self.complaints.clone(),
      storage:       self.storage.clone(),
      performance:   self.performance.clone(),
    }
  }
}

impl<S: PortalStore + 'static> AppState<S> {
  /// Wire controllers around `store` and start the staff report view. Must
  /// be called inside a tokio runtime.
  pub fn new(store: Arc<S>, config: ServerConfig, notifier: Arc<dyn Notifier>) -> Self {
    let objects = Arc::new(FsObjectStore::new(&config.files_dir, config.files_url()));
    let staff = StaffController::new(store.clone(), notifier.clone());

    let performance = {
      let staff = staff.clone();
      LiveView::mount(store.subscribe(), PERFORMANCE_TABLES, move || {
        let staff = staff.clone();
        async move { staff.compute_performance().await }
      })
    };

    Self {
      documents: DocumentController::new(store.clone(), notifier.clone())
        .with_mode(config.transition_mode()),
      announcements: AnnouncementController::new(store.clone(), notifier.clone()),
      complaints: ComplaintController::new(store.clone(), notifier.clone()),
      storage: StorageController::new(objects, notifier),
      performance: Arc::new(performance),
      auth: Arc::new(AuthConfig { accounts: config.accounts.clone() }),
      config: Arc::new(config),
      staff,
      store,
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the portal server.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: PortalStore + 'static,
{
  let api = Router::new()
    .route("/documents",                 get(documents::list::<S>).post(documents::submit::<S>))
    .route("/documents/{id}",            get(documents::get_one::<S>))
    .route("/documents/{id}/verify",     post(documents::verify::<S>))
    .route("/documents/{id}/approve",    post(documents::approve::<S>))
    .route("/documents/{id}/reject",     post(documents::reject::<S>))
    .route("/announcements",             get(announcements::list::<S>).post(announcements::create::<S>))
    .route(
      "/announcements/{id}",
      get(announcements::get_one::<S>)
        .put(announcements::update::<S>)
        .delete(announcements::remove::<S>),
    )
    .route("/staff",                     get(staff::list::<S>).post(staff::add::<S>))
    .route("/staff/performance",         get(staff::performance::<S>))
    .route("/staff/{id}",                delete(staff::remove::<S>))
    .route("/staff/{id}/toggle",         post(staff::toggle::<S>))
    .route("/complaints",                get(complaints::list::<S>).post(complaints::file::<S>))
    .route("/complaints/{id}",           patch(complaints::update::<S>))
    .route(
      "/uploads/{bucket}",
      post(uploads::upload::<S>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
    )
    .route("/uploads/{bucket}/{*path}",  delete(uploads::remove::<S>));

  let files = ServeDir::new(&state.config.files_dir);

  Router::new()
    .route("/health", get(health))
    .nest("/api", api)
    .nest_service("/files", files)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests {
  use axum::http::{Method, StatusCode};
  use serde_json::{Value, json};

  use crate::testing::{make_state, send, send_raw};

  #[tokio::test]
  async fn health_needs_no_auth() {
    let t = make_state().await;
    let (status, _) = send_raw(&t.state, Method::GET, "/health", None, Vec::new()).await;
    assert_eq!(status, StatusCode::OK);
  }

  #[tokio::test]
  async fn api_requires_auth() {
    let t = make_state().await;
    let (status, body) = send(&t.state, Method::GET, "/api/documents", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
  }

  #[tokio::test]
  async fn unknown_route_is_not_found() {
    let t = make_state().await;
    let (status, _) = send(&t.state, Method::GET, "/api/nothing", Some("admin"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn malformed_json_is_rejected() {
    let t = make_state().await;
    let (status, _) = send(
      &t.state,
      Method::POST,
      "/api/complaints",
      Some("citizen"),
      Some(json!({ "description": "no title" })),
    )
    .await;
    assert!(status.is_client_error());
    let (_, listed) = send(&t.state, Method::GET, "/api/complaints", Some("citizen"), None).await;
    assert_eq!(listed, Value::Array(Vec::new()));
  }
}
