//! Error type for `panchayat-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] panchayat_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// An object path segment was empty, `.` or `..`.
  #[error("invalid object path: {0:?}")]
  InvalidPath(String),

  #[error("object not found: {0}")]
  ObjectNotFound(String),

  #[error("profile not found: {0}")]
  ProfileNotFound(uuid::Uuid),

  /// A row written inside this call could not be read back.
  #[error("row {0} missing after insert")]
  MissingAfterInsert(uuid::Uuid),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
