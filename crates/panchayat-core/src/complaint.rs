//! Citizen complaints. Only the parts staff metrics depend on are modelled:
//! who a complaint is assigned to and whether it has been resolved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ComplaintStatus {
  Open,
  InProgress,
  Resolved,
}

impl ComplaintStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownDiscriminant {
      kind:  "complaint status",
      value: s.to_owned(),
    })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
  pub id:          Uuid,
  pub user_id:     Uuid,
  pub title:       String,
  pub description: String,
  pub status:      ComplaintStatus,
  pub assigned_to: Option<Uuid>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewComplaint {
  pub user_id:     Uuid,
  pub title:       String,
  #[serde(default)]
  pub description: String,
}

impl NewComplaint {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("title is required".into()));
    }
    Ok(())
  }
}

/// A `complaints` row as returned by the store.
#[derive(Debug, Clone, Default)]
pub struct ComplaintRow {
  pub id:          Uuid,
  pub user_id:     Uuid,
  pub title:       String,
  pub description: String,
  pub status:      String,
  pub assigned_to: Option<Uuid>,
  pub created_at:  String,
  pub updated_at:  String,
}

/// Partial update; `None` leaves a column untouched, `assigned_to:
/// Some(None)` unassigns.
#[derive(Debug, Clone)]
pub struct ComplaintPatch {
  pub status:      Option<ComplaintStatus>,
  pub assigned_to: Option<Option<Uuid>>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplaintQuery {
  pub user_id:     Option<Uuid>,
  pub assigned_to: Option<Uuid>,
  pub status:      Option<ComplaintStatus>,
}
