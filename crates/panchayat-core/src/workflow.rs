//! The document review workflow.
//!
//! ```text
//! pending ──verify──▶ verified ──approve──▶ approved
//!    │                   │
//!    └──────reject───────┴──────▶ rejected
//! ```
//!
//! `approved` and `rejected` are terminal. [`plan`] is the whole rule: it
//! checks the precondition against the caller's snapshot and produces the
//! single partial update to issue. It never reads the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  document::{DocumentPatch, DocumentStatus},
};

/// An action a staff member can take on a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
  Verify,
  Approve,
  Reject,
}

impl Action {
  pub fn as_str(self) -> &'static str {
    match self {
      Action::Verify => "verify",
      Action::Approve => "approve",
      Action::Reject => "reject",
    }
  }

  pub fn permitted_from(self, status: DocumentStatus) -> bool {
    use DocumentStatus::*;
    match self {
      Action::Verify => status == Pending,
      Action::Approve => status == Verified,
      Action::Reject => matches!(status, Pending | Verified),
    }
  }

  /// The status a successful action leads to.
  pub fn target(self) -> DocumentStatus {
    match self {
      Action::Verify => DocumentStatus::Verified,
      Action::Approve => DocumentStatus::Approved,
      Action::Reject => DocumentStatus::Rejected,
    }
  }
}

/// Actions a UI should offer for a request currently in `status`.
pub fn available_actions(status: DocumentStatus) -> Vec<Action> {
  [Action::Verify, Action::Approve, Action::Reject]
    .into_iter()
    .filter(|a| a.permitted_from(status))
    .collect()
}

/// A requested transition together with its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
  Verify,
  Approve,
  Reject { reason: String },
}

impl Transition {
  pub fn action(&self) -> Action {
    match self {
      Transition::Verify => Action::Verify,
      Transition::Approve => Action::Approve,
      Transition::Reject { .. } => Action::Reject,
    }
  }
}

/// Validate `transition` from `current` and build the update to issue.
///
/// Rejection reasons are trimmed; an empty result is refused. The patch
/// writes every column the target status constrains, whatever the stored
/// row holds (see [`DocumentPatch::settle`]).
pub fn plan(
  current:    DocumentStatus,
  transition: &Transition,
  actor:      Uuid,
  now:        DateTime<Utc>,
) -> Result<DocumentPatch> {
  let action = transition.action();

  if let Transition::Reject { reason } = transition
    && reason.trim().is_empty()
  {
    return Err(Error::EmptyRejectionReason);
  }

  if !action.permitted_from(current) {
    return Err(Error::TransitionNotPermitted { action: action.as_str(), from: current });
  }

  let reason = match transition {
    Transition::Reject { reason } => Some(reason.trim().to_owned()),
    Transition::Verify | Transition::Approve => None,
  };
  Ok(DocumentPatch::settle(action.target(), actor, reason, now))
}
