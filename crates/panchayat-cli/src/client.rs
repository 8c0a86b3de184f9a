//! Async HTTP client wrapping the portal's JSON API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use panchayat_core::{
  announcement::Announcement,
  document::{DocumentFilter, DocumentRequest, DocumentType},
  staff::StaffPerformance,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Connection settings for the portal API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
  pub username: String,
  pub password: String,
}

/// Body of `POST /api/documents`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  pub document_type:    DocumentType,
  pub purpose:          String,
  pub additional_notes: Option<String>,
  pub form_details:     Map<String, Value>,
}

/// `GET /api/staff/performance`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
  pub generation: u64,
  pub staff:      Vec<StaffPerformance>,
  pub error:      Option<String>,
}

/// Async HTTP client for the portal JSON API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}/api{}", self.config.base_url.trim_end_matches('/'), path)
  }

  fn auth(&self, req: RequestBuilder) -> RequestBuilder {
    if self.config.username.is_empty() {
      req
    } else {
      req.basic_auth(&self.config.username, Some(&self.config.password))
    }
  }

  /// Send `req` and decode a JSON success body. `what` names the call in
  /// errors, e.g. `GET /documents`.
  async fn call<T: DeserializeOwned>(&self, what: &str, req: RequestBuilder) -> Result<T> {
    tracing::debug!(%what, "request");
    let resp = self.auth(req).send().await.with_context(|| format!("{what} failed"))?;
    let resp = check(what, resp).await?;
    resp.json().await.with_context(|| format!("deserialising {what}"))
  }

  // ── Documents ─────────────────────────────────────────────────────────────

  /// `GET /api/documents[?status&type&search]`
  pub async fn list_documents(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRequest>> {
    let req = self.client.get(self.url("/documents")).query(filter);
    self.call("GET /documents", req).await
  }

  /// `GET /api/documents/{id}`
  pub async fn get_document(&self, id: Uuid) -> Result<DocumentRequest> {
    let req = self.client.get(self.url(&format!("/documents/{id}")));
    self.call("GET /documents/{id}", req).await
  }

  /// `POST /api/documents`
  pub async fn submit_document(&self, submission: &Submission) -> Result<DocumentRequest> {
    let req = self.client.post(self.url("/documents")).json(submission);
    self.call("POST /documents", req).await
  }

  /// `POST /api/documents/{id}/{action}` for `verify` and `approve`.
  pub async fn review_document(&self, id: Uuid, action: &str) -> Result<DocumentRequest> {
    let req = self.client.post(self.url(&format!("/documents/{id}/{action}")));
    self.call(&format!("POST /documents/{{id}}/{action}"), req).await
  }

  /// `POST /api/documents/{id}/reject`
  pub async fn reject_document(&self, id: Uuid, reason: &str) -> Result<DocumentRequest> {
    let req = self
      .client
      .post(self.url(&format!("/documents/{id}/reject")))
      .json(&json!({ "reason": reason }));
    self.call("POST /documents/{id}/reject", req).await
  }

  // ── Announcements ─────────────────────────────────────────────────────────

  /// `GET /api/announcements[?category]`
  pub async fn list_announcements(&self, category: Option<&str>) -> Result<Vec<Announcement>> {
    let mut req = self.client.get(self.url("/announcements"));
    if let Some(category) = category {
      req = req.query(&[("category", category)]);
    }
    self.call("GET /announcements", req).await
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  /// `GET /api/staff/performance`
  pub async fn staff_performance(&self) -> Result<PerformanceReport> {
    let req = self.client.get(self.url("/staff/performance"));
    self.call("GET /staff/performance", req).await
  }
}

/// Pass a success response through; turn anything else into an error
/// carrying the server's `{"error": …}` message when there is one.
async fn check(what: &str, resp: Response) -> Result<Response> {
  let status = resp.status();
  if status.is_success() {
    return Ok(resp);
  }
  let body = resp.text().await.unwrap_or_default();
  let message = serde_json::from_str::<Value>(&body)
    .ok()
    .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
    .unwrap_or(body);
  if message.is_empty() {
    Err(anyhow!("{what} → {status}"))
  } else {
    Err(anyhow!("{what} → {status}: {message}"))
  }
}
