//! Error types for `panchayat-core`.

use thiserror::Error;

use crate::document::DocumentStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("cannot {action} a document that is {from}")]
  TransitionNotPermitted {
    action: &'static str,
    from:   DocumentStatus,
  },

  #[error("a rejection reason is required")]
  EmptyRejectionReason,

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("invariant violated: {0}")]
  Invariant(String),

  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownDiscriminant { kind: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
