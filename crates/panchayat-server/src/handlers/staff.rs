//! `/api/staff`: membership and the live performance report.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use panchayat_core::{
  staff::{StaffMember, StaffPerformance},
  store::PortalStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::Error};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMember {
  pub user_id: Uuid,
}

/// Body of the toggle route: the state the caller last saw.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggle {
  #[serde(alias = "is_active")]
  pub is_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggled {
  pub id:        Uuid,
  pub is_active: bool,
}

/// The latest snapshot of the live staff report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
  pub generation: u64,
  pub staff:      Vec<StaffPerformance>,
  /// Set when the most recent refresh failed; `staff` is then the last good
  /// report.
  pub error:      Option<String>,
}

pub async fn list<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
) -> Result<Json<Vec<StaffMember>>, Error> {
  actor.require_admin()?;
  Ok(Json(state.staff.list().await?))
}

pub async fn add<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Json(body): Json<NewMember>,
) -> Result<(StatusCode, Json<StaffMember>), Error> {
  actor.require_admin()?;
  let member = state.staff.add_member(body.user_id).await?;
  Ok((StatusCode::CREATED, Json(member)))
}

pub async fn performance<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
) -> Result<Json<PerformanceReport>, Error> {
  actor.require_admin()?;
  let view = state
    .performance
    .wait_for_generation(1)
    .await
    .ok_or_else(|| Error::Unavailable("staff report stopped".into()))?;
  let Some(staff) = view.data else {
    let reason = view.error.unwrap_or_else(|| "staff report not loaded".into());
    return Err(Error::Unavailable(reason));
  };
  Ok(Json(PerformanceReport { generation: view.generation, staff, error: view.error }))
}

pub async fn toggle<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<Toggle>,
) -> Result<Json<Toggled>, Error> {
  actor.require_admin()?;
  let is_active = state.staff.toggle_status(id, body.is_active).await?;
  Ok(Json(Toggled { id, is_active }))
}

/// Remove the member and reset their profile to citizen.
pub async fn remove<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
  actor.require_admin()?;
  let member = state
    .staff
    .list()
    .await?
    .into_iter()
    .find(|m| m.id == id)
    .ok_or_else(|| Error::NotFound(format!("staff member {id}")))?;
  state.staff.remove_member(member.id, member.user_id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use axum::http::{Method, StatusCode};
  use panchayat_core::{staff::Role, store::PortalStore};
  use serde_json::json;

  use crate::testing::{make_state, send};

  #[tokio::test]
  async fn performance_follows_reviews() {
    let t = make_state().await;
    let (_, doc) = send(
      &t.state,
      Method::POST,
      "/api/documents",
      Some("citizen"),
      Some(json!({ "documentType": "residence", "purpose": "Ration card" })),
    )
    .await;
    let id = doc["id"].as_str().unwrap().to_owned();
    send(&t.state, Method::POST, &format!("/api/documents/{id}/verify"), Some("officer"), None).await;

    let officer = t.officer;
    tokio::time::timeout(
      Duration::from_secs(5),
      t.state.performance.wait_until(|s| {
        s.data
          .as_ref()
          .is_some_and(|d| d.iter().any(|p| p.staff_id == officer && p.documents_reviewed == 1))
      }),
    )
    .await
    .unwrap()
    .unwrap();

    let (status, report) =
      send(&t.state, Method::GET, "/api/staff/performance", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    let entries = report["staff"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["staffName"], "Officer Rao");
    assert_eq!(entries[0]["documentsReviewed"], 1);
    assert_eq!(entries[0]["documentsApproved"], 0);
    assert!(report["error"].is_null());
  }

  #[tokio::test]
  async fn performance_is_admin_only() {
    let t = make_state().await;
    let (status, _) =
      send(&t.state, Method::GET, "/api/staff/performance", Some("officer"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  #[tokio::test]
  async fn toggle_then_remove() {
    let t = make_state().await;
    let (_, members) = send(&t.state, Method::GET, "/api/staff", Some("admin"), None).await;
    let id = members[0]["id"].as_str().unwrap().to_owned();
    assert_eq!(members[0]["isActive"], true);

    let (status, toggled) = send(
      &t.state,
      Method::POST,
      &format!("/api/staff/{id}/toggle"),
      Some("admin"),
      Some(json!({ "isActive": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["isActive"], false);

    let (status, _) =
      send(&t.state, Method::DELETE, &format!("/api/staff/{id}"), Some("admin"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let profile = t.state.store.get_profile(t.officer).await.unwrap().unwrap();
    assert_eq!(profile.role, Role::Citizen);

    let (status, _) =
      send(&t.state, Method::DELETE, &format!("/api/staff/{id}"), Some("admin"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn add_member_promotes_citizen() {
    let t = make_state().await;
    let (status, member) = send(
      &t.state,
      Method::POST,
      "/api/staff",
      Some("admin"),
      Some(json!({ "userId": t.citizen })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(member["name"], "Meena Devi");
    let profile = t.state.store.get_profile(t.citizen).await.unwrap().unwrap();
    assert_eq!(profile.role, Role::Staff);
  }
}
