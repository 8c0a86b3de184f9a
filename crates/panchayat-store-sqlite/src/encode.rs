//! Encoding and decoding helpers between core row types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-precision RFC 3339 strings so that
//! lexicographic order is chronological. UUIDs are stored as hyphenated
//! lowercase strings. JSON columns and joined profiles are handed back as
//! [`serde_json::Value`]; interpreting them is the caller's job.

use chrono::{DateTime, SecondsFormat, Utc};
use panchayat_core::{
  announcement::AnnouncementRow,
  complaint::ComplaintRow,
  document::DocumentRow,
  staff::{Profile, Role, StaffRow},
};
use rusqlite::types::Value as SqlValue;
use serde_json::Value;
use uuid::Uuid;

use crate::Result;

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn decode_opt_uuid(s: Option<String>) -> Result<Option<Uuid>> {
  s.as_deref().map(decode_uuid).transpose()
}

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_json(s: Option<String>) -> Result<Option<Value>> {
  Ok(s.as_deref().map(serde_json::from_str).transpose()?)
}

/// Owned SQL text, or NULL.
pub fn sql_opt_uuid(id: Option<Uuid>) -> SqlValue {
  id.map_or(SqlValue::Null, |id| SqlValue::Text(encode_uuid(id)))
}

pub fn sql_opt_text(s: Option<String>) -> SqlValue { s.map_or(SqlValue::Null, SqlValue::Text) }

// ─── Profiles ────────────────────────────────────────────────────────────────

pub struct RawProfile {
  pub id:   String,
  pub name: String,
  pub role: String,
}

impl RawProfile {
  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile { id: decode_uuid(&self.id)?, name: self.name, role: Role::parse(&self.role)? })
  }
}

// ─── Document requests ───────────────────────────────────────────────────────

/// Column list shared by every document read. The three joins are rendered
/// as JSON objects, or NULL when the referenced profile does not exist.
pub const DOCUMENT_SELECT: &str = "
  SELECT
    d.id, d.user_id, d.document_type, d.purpose, d.status,
    d.created_at, d.updated_at, d.attachments,
    d.verified_by, d.approved_by, d.rejection_reason,
    d.additional_notes, d.form_details,
    CASE WHEN p.id IS NULL THEN NULL ELSE json_object('name', p.name) END,
    CASE WHEN v.id IS NULL THEN NULL ELSE json_object('name', v.name) END,
    CASE WHEN a.id IS NULL THEN NULL ELSE json_object('name', a.name) END
  FROM document_requests d
  LEFT JOIN profiles p ON p.id = d.user_id
  LEFT JOIN profiles v ON v.id = d.verified_by
  LEFT JOIN profiles a ON a.id = d.approved_by";

pub struct RawDocument {
  pub id:                String,
  pub user_id:           String,
  pub document_type:     String,
  pub purpose:           String,
  pub status:            String,
  pub created_at:        String,
  pub updated_at:        String,
  pub attachments:       Option<String>,
  pub verified_by:       Option<String>,
  pub approved_by:       Option<String>,
  pub rejection_reason:  Option<String>,
  pub additional_notes:  Option<String>,
  pub form_details:      Option<String>,
  pub profiles:          Option<String>,
  pub verified_profiles: Option<String>,
  pub approved_profiles: Option<String>,
}

impl RawDocument {
  /// Read one row produced by [`DOCUMENT_SELECT`].
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                row.get(0)?,
      user_id:           row.get(1)?,
      document_type:     row.get(2)?,
      purpose:           row.get(3)?,
      status:            row.get(4)?,
      created_at:        row.get(5)?,
      updated_at:        row.get(6)?,
      attachments:       row.get(7)?,
      verified_by:       row.get(8)?,
      approved_by:       row.get(9)?,
      rejection_reason:  row.get(10)?,
      additional_notes:  row.get(11)?,
      form_details:      row.get(12)?,
      profiles:          row.get(13)?,
      verified_profiles: row.get(14)?,
      approved_profiles: row.get(15)?,
    })
  }

  pub fn into_row(self) -> Result<DocumentRow> {
    Ok(DocumentRow {
      id:                decode_uuid(&self.id)?,
      user_id:           decode_uuid(&self.user_id)?,
      document_type:     self.document_type,
      purpose:           self.purpose,
      status:            self.status,
      created_at:        self.created_at,
      updated_at:        self.updated_at,
      attachments:       decode_json(self.attachments)?,
      verified_by:       decode_opt_uuid(self.verified_by)?,
      approved_by:       decode_opt_uuid(self.approved_by)?,
      rejection_reason:  self.rejection_reason,
      additional_notes:  self.additional_notes,
      form_details:      decode_json(self.form_details)?,
      profiles:          decode_json(self.profiles)?,
      verified_profiles: decode_json(self.verified_profiles)?,
      approved_profiles: decode_json(self.approved_profiles)?,
    })
  }
}

// ─── Announcements ───────────────────────────────────────────────────────────

pub const ANNOUNCEMENT_SELECT: &str = "
  SELECT id, title, content, category, important, created_by, created_at, updated_at
  FROM announcements";

pub struct RawAnnouncement {
  pub id:         String,
  pub title:      String,
  pub content:    String,
  pub category:   String,
  pub important:  bool,
  pub created_by: Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawAnnouncement {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      title:      row.get(1)?,
      content:    row.get(2)?,
      category:   row.get(3)?,
      important:  row.get(4)?,
      created_by: row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_row(self) -> Result<AnnouncementRow> {
    Ok(AnnouncementRow {
      id:         decode_uuid(&self.id)?,
      title:      self.title,
      content:    self.content,
      category:   self.category,
      important:  self.important,
      created_by: decode_opt_uuid(self.created_by)?,
      created_at: self.created_at,
      updated_at: self.updated_at,
    })
  }
}

// ─── Staff ───────────────────────────────────────────────────────────────────

pub const STAFF_SELECT: &str = "
  SELECT
    s.id, s.user_id, s.is_active, s.joined_at,
    CASE WHEN p.id IS NULL THEN NULL ELSE json_object('name', p.name) END
  FROM staff s
  LEFT JOIN profiles p ON p.id = s.user_id";

pub struct RawStaff {
  pub id:        String,
  pub user_id:   String,
  pub is_active: bool,
  pub joined_at: String,
  pub profiles:  Option<String>,
}

impl RawStaff {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:        row.get(0)?,
      user_id:   row.get(1)?,
      is_active: row.get(2)?,
      joined_at: row.get(3)?,
      profiles:  row.get(4)?,
    })
  }

  pub fn into_row(self) -> Result<StaffRow> {
    Ok(StaffRow {
      id:        decode_uuid(&self.id)?,
      user_id:   decode_uuid(&self.user_id)?,
      is_active: self.is_active,
      joined_at: self.joined_at,
      profiles:  decode_json(self.profiles)?,
    })
  }
}

// ─── Complaints ──────────────────────────────────────────────────────────────

pub const COMPLAINT_SELECT: &str = "
  SELECT id, user_id, title, description, status, assigned_to, created_at, updated_at
  FROM complaints";

pub struct RawComplaint {
  pub id:          String,
  pub user_id:     String,
  pub title:       String,
  pub description: String,
  pub status:      String,
  pub assigned_to: Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawComplaint {
  pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:          row.get(0)?,
      user_id:     row.get(1)?,
      title:       row.get(2)?,
      description: row.get(3)?,
      status:      row.get(4)?,
      assigned_to: row.get(5)?,
      created_at:  row.get(6)?,
      updated_at:  row.get(7)?,
    })
  }

  pub fn into_row(self) -> Result<ComplaintRow> {
    Ok(ComplaintRow {
      id:          decode_uuid(&self.id)?,
      user_id:     decode_uuid(&self.user_id)?,
      title:       self.title,
      description: self.description,
      status:      self.status,
      assigned_to: decode_opt_uuid(self.assigned_to)?,
      created_at:  self.created_at,
      updated_at:  self.updated_at,
    })
  }
}
