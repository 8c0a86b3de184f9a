//! Raw store rows → view models.
//!
//! Joined profile objects are untyped. A joined name is used only when the
//! join is a JSON object whose `name` field is a string; any other shape
//! reads as "no name" and never fails the row. Timestamps and enum columns,
//! on the other hand, must parse.

use chrono::{DateTime, Utc};
use panchayat_core::{
  announcement::{Announcement, AnnouncementRow},
  complaint::{Complaint, ComplaintRow, ComplaintStatus},
  document::{DocumentRequest, DocumentRow, DocumentStatus, DocumentType},
  staff::{StaffMember, StaffRow},
};
use serde_json::{Map, Value};

use crate::{PortalError, Result};

/// Name used in metrics when the staff profile join is unusable.
pub const UNKNOWN_NAME: &str = "Unknown";

pub fn joined_name(join: Option<&Value>) -> Option<String> {
  match join? {
    Value::Object(map) => map.get("name")?.as_str().map(str::to_owned),
    _ => None,
  }
}

fn timestamp(table: &'static str, field: &str, raw: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(raw)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| PortalError::malformed(table, format!("{field} {raw:?}: {e}")))
}

fn string_list(value: Option<Value>) -> Vec<String> {
  match value {
    Some(Value::Array(items)) => items
      .into_iter()
      .filter_map(|v| match v {
        Value::String(s) => Some(s),
        _ => None,
      })
      .collect(),
    _ => Vec::new(),
  }
}

fn object(value: Option<Value>) -> Map<String, Value> {
  match value {
    Some(Value::Object(map)) => map,
    _ => Map::new(),
  }
}

pub fn document(row: DocumentRow) -> Result<DocumentRequest> {
  const T: &str = "document_requests";
  let document_type =
    DocumentType::parse(&row.document_type).map_err(|e| PortalError::malformed(T, e.to_string()))?;
  let status =
    DocumentStatus::parse(&row.status).map_err(|e| PortalError::malformed(T, e.to_string()))?;

  Ok(DocumentRequest {
    id: row.id,
    requester_id: row.user_id,
    requester_name: joined_name(row.profiles.as_ref()),
    document_type,
    purpose: row.purpose,
    status,
    created_at: timestamp(T, "created_at", &row.created_at)?,
    updated_at: timestamp(T, "updated_at", &row.updated_at)?,
    attachments: string_list(row.attachments),
    verified_by: row.verified_by,
    verified_by_name: joined_name(row.verified_profiles.as_ref()),
    approved_by: row.approved_by,
    approved_by_name: joined_name(row.approved_profiles.as_ref()),
    rejection_reason: row.rejection_reason,
    additional_notes: row.additional_notes,
    form_details: object(row.form_details),
  })
}

pub fn announcement(row: AnnouncementRow) -> Result<Announcement> {
  Ok(Announcement {
    date:      timestamp("announcements", "created_at", &row.created_at)?,
    link:      Some(format!("/announcements/{}", row.id)),
    id:        row.id,
    title:     row.title,
    content:   row.content,
    category:  row.category,
    important: row.important,
  })
}

pub fn staff_member(row: StaffRow) -> Result<StaffMember> {
  Ok(StaffMember {
    joined_at: timestamp("staff", "joined_at", &row.joined_at)?,
    name:      joined_name(row.profiles.as_ref()),
    id:        row.id,
    user_id:   row.user_id,
    is_active: row.is_active,
  })
}

pub fn complaint(row: ComplaintRow) -> Result<Complaint> {
  const T: &str = "complaints";
  Ok(Complaint {
    status: ComplaintStatus::parse(&row.status).map_err(|e| PortalError::malformed(T, e.to_string()))?,
    created_at: timestamp(T, "created_at", &row.created_at)?,
    updated_at: timestamp(T, "updated_at", &row.updated_at)?,
    id: row.id,
    user_id: row.user_id,
    title: row.title,
    description: row.description,
    assigned_to: row.assigned_to,
  })
}
