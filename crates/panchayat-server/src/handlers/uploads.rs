//! `/api/uploads`: raw-body file uploads into the object store.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use bytes::Bytes;
use panchayat_api::FileUpload;
use panchayat_core::store::PortalStore;
use serde::{Deserialize, Serialize};

use crate::{AppState, auth::Actor, error::Error};

#[derive(Debug, Deserialize)]
pub struct UploadParams {
  /// Original file name; becomes the suffix of the object name.
  pub name:   String,
  pub folder: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Uploaded {
  pub url: String,
}

pub async fn upload<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  _actor: Actor,
  Path(bucket): Path<String>,
  Query(params): Query<UploadParams>,
  body: Bytes,
) -> Result<(StatusCode, Json<Uploaded>), Error> {
  if body.is_empty() {
    return Err(Error::BadRequest("empty upload".into()));
  }
  let file = FileUpload::new(params.name, body.to_vec());
  let url = state.storage.upload_file(&bucket, file, params.folder.as_deref()).await?;
  Ok((StatusCode::CREATED, Json(Uploaded { url })))
}

/// Staff only: object names carry no owner.
pub async fn remove<S: PortalStore + 'static>(
  State(state): State<AppState<S>>,
  actor: Actor,
  Path((bucket, path)): Path<(String, String)>,
) -> Result<StatusCode, Error> {
  actor.require_staff()?;
  state.storage.delete_file(&bucket, &path).await?;
  Ok(StatusCode::NO_CONTENT)
}
