//! `/api/documents`: submission, listing and the review workflow.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use panchayat_core::{
  document::{DocumentFilter, DocumentRequest, DocumentStatus, DocumentType, NewDocumentRequest},
  store::PortalStore,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::Error};

/// Body of `POST /api/documents`. The requester is always the caller.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  pub document_type:    DocumentType,
  pub purpose:          String,
  #[serde(default)]
  pub attachments:      Vec<String>,
  pub additional_notes: Option<String>,
  #[serde(default)]
  pub form_details:     Map<String, Value>,
}

/// Optional body of the workflow routes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  /// The status the reviewer saw. Defaults to the stored status.
  pub expected_status: Option<DocumentStatus>,
  /// Required for rejection.
  pub reason:          Option<String>,
}

pub async fn list<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Query(filter): Query<DocumentFilter>,
) -> Result<Json<Vec<DocumentRequest>>, Error> {
  let docs = if actor.is_staff() {
    state.documents.list(&filter).await?
  } else {
    state.documents.list_for_user(actor.profile_id, &filter).await?
  };
  Ok(Json(docs))
}

pub async fn submit<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Json(body): Json<Submission>,
) -> Result<(StatusCode, Json<DocumentRequest>), Error> {
  let input = NewDocumentRequest {
    requester_id:     actor.profile_id,
    document_type:    body.document_type,
    purpose:          body.purpose,
    attachments:      body.attachments,
    additional_notes: body.additional_notes,
    form_details:     body.form_details,
  };
  let doc = state.documents.submit(input).await?;
  Ok((StatusCode::CREATED, Json(doc)))
}

pub async fn get_one<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<DocumentRequest>, Error> {
  Ok(Json(visible(&state, actor, id).await?))
}

pub async fn verify<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  body: Option<Json<Review>>,
) -> Result<Json<DocumentRequest>, Error> {
  actor.require_staff()?;
  let doc = snapshot(&state, actor, id, body.as_deref()).await?;
  Ok(Json(state.documents.verify(&doc, actor.profile_id).await?))
}

pub async fn approve<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  body: Option<Json<Review>>,
) -> Result<Json<DocumentRequest>, Error> {
  actor.require_staff()?;
  let doc = snapshot(&state, actor, id, body.as_deref()).await?;
  Ok(Json(state.documents.approve(&doc, actor.profile_id).await?))
}

pub async fn reject<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<Review>,
) -> Result<Json<DocumentRequest>, Error> {
  actor.require_staff()?;
  let doc = snapshot(&state, actor, id, Some(&body)).await?;
  let reason = body.reason.as_deref().unwrap_or_default();
  Ok(Json(state.documents.reject(&doc, actor.profile_id, reason).await?))
}

/// Load `id` if the caller may see it. Citizens only see their own requests;
/// anyone else's read as missing.
async fn visible<S: PortalStore>(
  state: &AppState<S>,
  actor: Actor,
  id: Uuid,
) -> Result<DocumentRequest, Error> {
  let doc = state.documents.get_by_id(id).await?;
  if !actor.is_staff() && doc.requester_id != actor.profile_id {
    return Err(Error::NotFound(format!("document {id}")));
  }
  Ok(doc)
}

/// The document as the reviewer saw it: the stored row, with its status
/// replaced by `expected_status` when one is given.
async fn snapshot<S: PortalStore>(
  state: &AppState<S>,
  actor: Actor,
  id: Uuid,
  review: Option<&Review>,
) -> Result<DocumentRequest, Error> {
  let mut doc = visible(state, actor, id).await?;
  if let Some(expected) = review.and_then(|r| r.expected_status) {
    doc.status = expected;
  }
  Ok(doc)
}

#[cfg(test)]
mod tests {
  use axum::http::{Method, StatusCode};
  use serde_json::json;

  use crate::testing::{make_state, make_state_with, send};

  async fn submit(state: &crate::AppState<panchayat_store_sqlite::SqliteStore>) -> String {
    let (status, body) = send(
      state,
      Method::POST,
      "/api/documents",
      Some("citizen"),
      Some(json!({
        "documentType": "income",
        "purpose": "Scholarship application",
        "formDetails": { "annualIncome": "84000" }
      })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["requesterName"], "Meena Devi");
    body["id"].as_str().unwrap().to_owned()
  }

  #[tokio::test]
  async fn submit_verify_approve() {
    let t = make_state().await;
    let id = submit(&t.state).await;

    let (status, body) =
      send(&t.state, Method::POST, &format!("/api/documents/{id}/verify"), Some("officer"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "verified");
    assert_eq!(body["verifiedBy"], t.officer.to_string());

    let (status, body) =
      send(&t.state, Method::POST, &format!("/api/documents/{id}/approve"), Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");
    assert_eq!(body["approvedBy"], t.admin.to_string());

    let (_, body) =
      send(&t.state, Method::GET, &format!("/api/documents/{id}"), Some("citizen"), None).await;
    assert_eq!(body["status"], "approved");
    assert_eq!(body["verifiedByName"], "Officer Rao");
    assert_eq!(body["approvedByName"], "Sarpanch Kumar");
  }

  #[tokio::test]
  async fn citizen_cannot_review() {
    let t = make_state().await;
    let id = submit(&t.state).await;
    let (status, body) =
      send(&t.state, Method::POST, &format!("/api/documents/{id}/verify"), Some("citizen"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden: staff only");
  }

  #[tokio::test]
  async fn approve_pending_conflicts() {
    let t = make_state().await;
    let id = submit(&t.state).await;
    let (status, _) =
      send(&t.state, Method::POST, &format!("/api/documents/{id}/approve"), Some("officer"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn reject_requires_reason() {
    let t = make_state().await;
    let id = submit(&t.state).await;
    let uri = format!("/api/documents/{id}/reject");

    let (status, _) =
      send(&t.state, Method::POST, &uri, Some("officer"), Some(json!({ "reason": "   " }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
      &t.state,
      Method::POST,
      &uri,
      Some("officer"),
      Some(json!({ "reason": "Income proof missing" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "rejected");
    assert_eq!(body["rejectionReason"], "Income proof missing");
  }

  #[tokio::test]
  async fn citizens_see_only_their_own() {
    let t = make_state().await;
    let id = submit(&t.state).await;

    let (_, mine) = send(&t.state, Method::GET, "/api/documents", Some("citizen"), None).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let (_, theirs) = send(&t.state, Method::GET, "/api/documents", Some("neighbour"), None).await;
    assert!(theirs.as_array().unwrap().is_empty());
    let (status, _) =
      send(&t.state, Method::GET, &format!("/api/documents/{id}"), Some("neighbour"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, all) =
      send(&t.state, Method::GET, "/api/documents?status=pending&search=scholar", Some("officer"), None)
        .await;
    assert_eq!(all.as_array().unwrap().len(), 1);
    let (_, none) =
      send(&t.state, Method::GET, "/api/documents?type=birth", Some("officer"), None).await;
    assert!(none.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn strict_mode_refuses_stale_snapshot() {
    let t = make_state_with(true).await;
    let id = submit(&t.state).await;
    let uri = format!("/api/documents/{id}/verify");

    let (status, _) = send(&t.state, Method::POST, &uri, Some("officer"), None).await;
    assert_eq!(status, StatusCode::OK);

    // A second reviewer still looking at the pending request.
    let (status, body) = send(
      &t.state,
      Method::POST,
      &uri,
      Some("admin"),
      Some(json!({ "expectedStatus": "pending" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("pending"));
  }

  #[tokio::test]
  async fn unknown_document_is_not_found() {
    let t = make_state().await;
    let uri = format!("/api/documents/{}/verify", uuid::Uuid::new_v4());
    let (status, _) = send(&t.state, Method::POST, &uri, Some("officer"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
