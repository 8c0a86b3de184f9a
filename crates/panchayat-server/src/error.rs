//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use panchayat_api::PortalError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,
  #[error("forbidden: {0}")]
  Forbidden(&'static str),
  #[error("not found: {0}")]
  NotFound(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("unavailable: {0}")]
  Unavailable(String),
  #[error(transparent)]
  Portal(#[from] PortalError),
}

impl Error {
  fn status(&self) -> StatusCode {
    match self {
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::Forbidden(_) => StatusCode::FORBIDDEN,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      Error::Portal(e) => portal_status(e),
    }
  }
}

fn portal_status(e: &PortalError) -> StatusCode {
  use panchayat_core::Error as Rule;
  match e {
    PortalError::NotFound(_) => StatusCode::NOT_FOUND,
    PortalError::Validation(_) => StatusCode::BAD_REQUEST,
    PortalError::Workflow(Rule::EmptyRejectionReason | Rule::Validation(_)) => StatusCode::BAD_REQUEST,
    PortalError::Workflow(Rule::TransitionNotPermitted { .. }) | PortalError::StaleState { .. } => {
      StatusCode::CONFLICT
    }
    PortalError::Storage(inner) => match inner.downcast_ref::<panchayat_store_sqlite::Error>() {
      Some(panchayat_store_sqlite::Error::ObjectNotFound(_)) => StatusCode::NOT_FOUND,
      Some(panchayat_store_sqlite::Error::InvalidPath(_)) => StatusCode::BAD_REQUEST,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    },
    PortalError::Workflow(_)
    | PortalError::Store(_)
    | PortalError::MalformedRow { .. }
    | PortalError::StaffRemoval { .. } => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if matches!(self, Error::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"panchayat\""),
      );
    }
    res
  }
}
