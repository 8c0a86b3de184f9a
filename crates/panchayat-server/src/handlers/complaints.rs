//! `/api/complaints`: citizens file, staff assign and resolve.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use panchayat_core::{
  complaint::{Complaint, ComplaintQuery, ComplaintStatus, NewComplaint},
  store::PortalStore,
};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::Error};

/// Staff-only filters; a citizen always sees their own complaints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub status:      Option<ComplaintStatus>,
  pub assigned_to: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct Filing {
  pub title:       String,
  #[serde(default)]
  pub description: String,
}

/// Body of `PATCH /api/complaints/{id}`. `"assignedTo": null` unassigns;
/// leaving the field out keeps the assignment.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintUpdate {
  pub status:      Option<ComplaintStatus>,
  #[serde(default, deserialize_with = "present")]
  pub assigned_to: Option<Option<Uuid>>,
}

/// Distinguish an explicit `null` from a missing field.
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(de).map(Some)
}

pub async fn list<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Complaint>>, Error> {
  let query = if actor.is_staff() {
    ComplaintQuery { status: params.status, assigned_to: params.assigned_to, user_id: None }
  } else {
    ComplaintQuery { user_id: Some(actor.profile_id), status: params.status, assigned_to: None }
  };
  Ok(Json(state.complaints.list(&query).await?))
}

pub async fn file<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Json(body): Json<Filing>,
) -> Result<(StatusCode, Json<Complaint>), Error> {
  let input = NewComplaint { user_id: actor.profile_id, title: body.title, description: body.description };
  let complaint = state.complaints.file(input).await?;
  Ok((StatusCode::CREATED, Json(complaint)))
}

pub async fn update<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<ComplaintUpdate>,
) -> Result<StatusCode, Error> {
  actor.require_staff()?;
  state.complaints.update(id, body.status, body.assigned_to).await?;
  Ok(StatusCode::NO_CONTENT)
}
