//! Change events emitted by the store after every successful mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use tokio::sync::broadcast;
use uuid::Uuid;

/// The tables a view can watch.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Table {
  DocumentRequests,
  Announcements,
  Staff,
  Complaints,
  Profiles,
}

impl Table {
  pub fn as_str(self) -> &'static str { self.into() }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
  Insert,
  Update,
  Delete,
}

/// A row in `table` was inserted, updated or deleted.
///
/// Events carry no row data; subscribers refetch whatever they display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
  pub table:  Table,
  pub kind:   ChangeKind,
  pub row_id: Uuid,
  pub at:     DateTime<Utc>,
}

impl ChangeEvent {
  pub fn new(table: Table, kind: ChangeKind, row_id: Uuid) -> Self {
    Self { table, kind, row_id, at: Utc::now() }
  }
}

/// Receiving half of a store's change feed.
pub type ChangeFeed = broadcast::Receiver<ChangeEvent>;
