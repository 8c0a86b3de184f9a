//! `/api/announcements`: public notices, managed by admins.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use panchayat_core::{
  announcement::{Announcement, AnnouncementDraft},
  store::PortalStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, auth::Actor, error::Error};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub category: Option<String>,
}

/// Body of the create and update routes.
#[derive(Debug, Deserialize)]
pub struct AnnouncementBody {
  pub title:     String,
  pub content:   String,
  pub category:  String,
  #[serde(default)]
  pub important: bool,
}

impl AnnouncementBody {
  fn into_draft(self, author: Uuid) -> AnnouncementDraft {
    AnnouncementDraft {
      title:      self.title,
      content:    self.content,
      category:   self.category,
      important:  self.important,
      created_by: Some(author),
    }
  }
}

pub async fn list<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  _actor: Actor,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Announcement>>, Error> {
  let category = params.category.filter(|c| !c.trim().is_empty());
  Ok(Json(state.announcements.list(category).await?))
}

pub async fn get_one<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  _actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, Error> {
  Ok(Json(state.announcements.get_by_id(id).await?))
}

pub async fn create<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Json(body): Json<AnnouncementBody>,
) -> Result<(StatusCode, Json<Announcement>), Error> {
  actor.require_admin()?;
  let created = state.announcements.create(body.into_draft(actor.profile_id)).await?;
  Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
  Json(body): Json<AnnouncementBody>,
) -> Result<Json<Announcement>, Error> {
  actor.require_admin()?;
  state.announcements.update(id, body.into_draft(actor.profile_id)).await?;
  Ok(Json(state.announcements.get_by_id(id).await?))
}

pub async fn remove<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, Error> {
  actor.require_admin()?;
  state.announcements.delete(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use axum::http::{Method, StatusCode};
  use serde_json::json;

  use crate::testing::{make_state, send};

  fn notice(title: &str, category: &str) -> serde_json::Value {
    json!({
      "title": title,
      "content": "Water supply will be interrupted on Sunday.\n\nTankers will visit each ward.",
      "category": category,
    })
  }

  #[tokio::test]
  async fn admin_manages_announcements() {
    let t = make_state().await;
    let (status, created) = send(
      &t.state,
      Method::POST,
      "/api/announcements",
      Some("admin"),
      Some(notice("Water cut", "utilities")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_owned();
    assert_eq!(created["link"], format!("/announcements/{id}"));

    let mut edit = notice("Water cut extended", "utilities");
    edit["important"] = json!(true);
    let (status, updated) =
      send(&t.state, Method::PUT, &format!("/api/announcements/{id}"), Some("admin"), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Water cut extended");
    assert_eq!(updated["important"], true);

    let (status, _) =
      send(&t.state, Method::DELETE, &format!("/api/announcements/{id}"), Some("admin"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) =
      send(&t.state, Method::GET, &format!("/api/announcements/{id}"), Some("citizen"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn citizens_read_but_cannot_publish() {
    let t = make_state().await;
    send(&t.state, Method::POST, "/api/announcements", Some("admin"), Some(notice("Polio drive", "health")))
      .await;
    send(&t.state, Method::POST, "/api/announcements", Some("admin"), Some(notice("Gram Sabha", "governance")))
      .await;

    let (status, _) = send(
      &t.state,
      Method::POST,
      "/api/announcements",
      Some("officer"),
      Some(notice("Unofficial", "events")),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, all) = send(&t.state, Method::GET, "/api/announcements", Some("citizen"), None).await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    let (_, health) =
      send(&t.state, Method::GET, "/api/announcements?category=health", Some("citizen"), None).await;
    assert_eq!(health.as_array().unwrap().len(), 1);
    assert_eq!(health[0]["title"], "Polio drive");
  }

  #[tokio::test]
  async fn blank_title_is_bad_request() {
    let t = make_state().await;
    let (status, _) =
      send(&t.state, Method::POST, "/api/announcements", Some("admin"), Some(notice("", "health"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
  }
}
