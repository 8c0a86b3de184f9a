//! Profiles, staff membership and derived staff metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result};

/// What an identity may do in the portal.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Citizen,
  Staff,
  Admin,
}

impl Role {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownDiscriminant { kind: "role", value: s.to_owned() })
  }

  /// Staff and admins may review document requests.
  pub fn is_staff(self) -> bool { matches!(self, Role::Staff | Role::Admin) }
}

/// The identity entity referenced by requests, staff rows and complaints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
  pub id:   Uuid,
  pub name: String,
  pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProfile {
  pub name: String,
  pub role: Role,
}

/// A `staff` row as returned by the store, with the profile join.
#[derive(Debug, Clone, Default)]
pub struct StaffRow {
  pub id:        Uuid,
  pub user_id:   Uuid,
  pub is_active: bool,
  /// RFC 3339.
  pub joined_at: String,
  /// `profiles:user_id(name)`
  pub profiles:  Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
  pub id:        Uuid,
  pub user_id:   Uuid,
  pub name:      Option<String>,
  pub is_active: bool,
  pub joined_at: DateTime<Utc>,
}

/// Per-staff review counts. Derived on every fetch, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffPerformance {
  /// The staff member's profile id.
  pub staff_id:            Uuid,
  /// `"Unknown"` when the profile join is unusable.
  pub staff_name:          String,
  pub complaints_resolved: u64,
  /// Documents this staff member verified.
  pub documents_reviewed:  u64,
  pub documents_approved:  u64,
  /// Currently the join date; actual activity is not tracked.
  pub last_active:         DateTime<Utc>,
}
