//! The error type returned by every controller operation.

use std::fmt;

use panchayat_core::document::DocumentStatus;
use thiserror::Error;
use uuid::Uuid;

/// The step of staff removal that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalStep {
  /// Deleting the staff row. Nothing was changed.
  DeleteStaff,
  /// Resetting the profile role to citizen. The staff row is already gone.
  ResetRole,
}

impl fmt::Display for RemovalStep {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      RemovalStep::DeleteStaff => "delete staff row",
      RemovalStep::ResetRole => "reset profile role",
    })
  }
}

#[derive(Debug, Error)]
pub enum PortalError {
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("invalid input: {0}")]
  Validation(String),

  /// A workflow rule refused the transition before anything was written.
  #[error(transparent)]
  Workflow(panchayat_core::Error),

  /// A conditional transition found the document in another status.
  #[error("document {id} is no longer {expected}")]
  StaleState { id: Uuid, expected: DocumentStatus },

  #[error("malformed {table} row: {reason}")]
  MalformedRow { table: &'static str, reason: String },

  #[error("staff removal failed at step '{failed_step}': {source}")]
  StaffRemoval {
    failed_step: RemovalStep,
    #[source]
    source:      Box<PortalError>,
  },

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl PortalError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    PortalError::Store(Box::new(e))
  }

  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    PortalError::Storage(Box::new(e))
  }

  pub(crate) fn malformed(table: &'static str, reason: impl Into<String>) -> Self {
    PortalError::MalformedRow { table, reason: reason.into() }
  }
}

impl From<panchayat_core::Error> for PortalError {
  fn from(e: panchayat_core::Error) -> Self {
    match e {
      panchayat_core::Error::Validation(m) => PortalError::Validation(m),
      other => PortalError::Workflow(other),
    }
  }
}

pub type Result<T, E = PortalError> = std::result::Result<T, E>;
