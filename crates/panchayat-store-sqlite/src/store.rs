//! [`SqliteStore`], the SQLite implementation of [`PortalStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};
use tokio::sync::broadcast;
use uuid::Uuid;

use panchayat_core::{
  announcement::{AnnouncementDraft, AnnouncementPatch, AnnouncementRow},
  complaint::{ComplaintPatch, ComplaintQuery, ComplaintRow, ComplaintStatus, NewComplaint},
  document::{DocumentPatch, DocumentQuery, DocumentRow, DocumentStatus, NewDocumentRequest},
  realtime::{ChangeEvent, ChangeFeed, ChangeKind, Table},
  staff::{NewProfile, Profile, Role, StaffRow},
  store::PortalStore,
};

use crate::{
  Error, Result,
  encode::{
    ANNOUNCEMENT_SELECT, COMPLAINT_SELECT, DOCUMENT_SELECT, RawAnnouncement, RawComplaint,
    RawDocument, RawProfile, RawStaff, STAFF_SELECT, encode_dt, encode_uuid, sql_opt_text,
    sql_opt_uuid,
  },
  schema::SCHEMA,
};

/// Capacity of the change feed. Receivers further behind than this observe
/// `RecvError::Lagged`.
const FEED_CAPACITY: usize = 256;

// ─── Store ───────────────────────────────────────────────────────────────────

/// A portal store backed by a single SQLite file.
///
/// Cloning is cheap; the connection and the change feed are shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn:    tokio_rusqlite::Connection,
  changes: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::with_connection(conn).await
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::with_connection(conn).await
  }

  async fn with_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let (changes, _) = broadcast::channel(FEED_CAPACITY);
    let store = Self { conn, changes };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Send one event to every current subscriber. Having none is not an error.
  fn publish(&self, table: Table, kind: ChangeKind, row_id: Uuid) {
    tracing::debug!(table = table.as_str(), ?kind, %row_id, "row changed");
    let _ = self.changes.send(ChangeEvent::new(table, kind, row_id));
  }

  async fn fetch_document(&self, id: Uuid) -> Result<Option<DocumentRow>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!("{DOCUMENT_SELECT} WHERE d.id = ?1");
        Ok(conn.query_row(&sql, rusqlite::params![id_str], RawDocument::read).optional()?)
      })
      .await?;
    raw.map(RawDocument::into_row).transpose()
  }

  /// Insert `profile` under its own id unless a profile with that id exists.
  /// An existing profile keeps its name and role. Returns whether a row was
  /// inserted.
  pub async fn ensure_profile(&self, profile: &Profile) -> Result<bool> {
    let id_str   = encode_uuid(profile.id);
    let name     = profile.name.clone();
    let role_str = profile.role.as_str();

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO profiles (id, name, role) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, role_str],
        )?;
        Ok(n > 0)
      })
      .await?;

    if inserted {
      self.publish(Table::Profiles, ChangeKind::Insert, profile.id);
    }
    Ok(inserted)
  }
}

// ─── PortalStore impl ────────────────────────────────────────────────────────

impl PortalStore for SqliteStore {
  type Error = Error;

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn add_profile(&self, input: NewProfile) -> Result<Profile> {
    let profile = Profile { id: Uuid::new_v4(), name: input.name, role: input.role };

    let id_str   = encode_uuid(profile.id);
    let name     = profile.name.clone();
    let role_str = profile.role.as_str();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO profiles (id, name, role) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, role_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Table::Profiles, ChangeKind::Insert, profile.id);
    Ok(profile)
  }

  async fn get_profile(&self, id: Uuid) -> Result<Option<Profile>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, name, role FROM profiles WHERE id = ?1",
              rusqlite::params![id_str],
              |r| Ok(RawProfile { id: r.get(0)?, name: r.get(1)?, role: r.get(2)? }),
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawProfile::into_profile).transpose()
  }

  async fn set_profile_role(&self, id: Uuid, role: Role) -> Result<bool> {
    let id_str   = encode_uuid(id);
    let role_str = role.as_str();
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET role = ?2 WHERE id = ?1",
          rusqlite::params![id_str, role_str],
        )?)
      })
      .await?;

    if n > 0 {
      self.publish(Table::Profiles, ChangeKind::Update, id);
    }
    Ok(n > 0)
  }

  // ── Document requests ─────────────────────────────────────────────────────

  async fn list_documents<'a>(&'a self, query: &'a DocumentQuery) -> Result<Vec<DocumentRow>> {
    let user_id     = query.user_id.map(encode_uuid);
    let status      = query.status.map(DocumentStatus::as_str);
    let doc_type    = query.document_type.map(|t| t.as_str());
    let verified_by = query.verified_by.map(encode_uuid);
    let approved_by = query.approved_by.map(encode_uuid);

    let raws: Vec<RawDocument> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{DOCUMENT_SELECT}
           WHERE (?1 IS NULL OR d.user_id = ?1)
             AND (?2 IS NULL OR d.status = ?2)
             AND (?3 IS NULL OR d.document_type = ?3)
             AND (?4 IS NULL OR d.verified_by = ?4)
             AND (?5 IS NULL OR d.approved_by = ?5)
           ORDER BY d.created_at DESC, d.rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![user_id, status, doc_type, verified_by, approved_by],
            RawDocument::read,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_row).collect()
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<DocumentRow>> {
    self.fetch_document(id).await
  }

  async fn insert_document(&self, input: NewDocumentRequest) -> Result<DocumentRow> {
    let id  = Uuid::new_v4();
    let now = encode_dt(Utc::now());

    let id_str           = encode_uuid(id);
    let user_id_str      = encode_uuid(input.requester_id);
    let doc_type         = input.document_type.as_str();
    let purpose          = input.purpose;
    let attachments_json = serde_json::to_string(&input.attachments)?;
    let notes            = input.additional_notes;
    let details_json     = serde_json::to_string(&input.form_details)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO document_requests (
             id, user_id, document_type, purpose, status,
             created_at, updated_at, attachments, additional_notes, form_details
           ) VALUES (?1, ?2, ?3, ?4, 'pending', ?5, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            user_id_str,
            doc_type,
            purpose,
            now,
            attachments_json,
            notes,
            details_json,
          ],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Table::DocumentRequests, ChangeKind::Insert, id);

    self
      .fetch_document(id)
      .await?
      .ok_or(Error::MissingAfterInsert(id))
  }

  async fn update_document(&self, id: Uuid, patch: DocumentPatch) -> Result<bool> {
    let mut sets: Vec<&'static str> = vec!["status = ?", "updated_at = ?"];
    let mut values: Vec<SqlValue> = vec![
      SqlValue::Text(patch.status.as_str().to_owned()),
      SqlValue::Text(encode_dt(patch.updated_at)),
    ];
    if let Some(verified_by) = patch.verified_by {
      sets.push("verified_by = ?");
      values.push(sql_opt_uuid(verified_by));
    }
    if let Some(approved_by) = patch.approved_by {
      sets.push("approved_by = ?");
      values.push(sql_opt_uuid(approved_by));
    }
    if let Some(reason) = patch.rejection_reason {
      sets.push("rejection_reason = ?");
      values.push(sql_opt_text(reason));
    }

    let mut sql = format!("UPDATE document_requests SET {} WHERE id = ?", sets.join(", "));
    values.push(SqlValue::Text(encode_uuid(id)));
    if let Some(expected) = patch.expected_status {
      sql.push_str(" AND status = ?");
      values.push(SqlValue::Text(expected.as_str().to_owned()));
    }

    let n = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(values))?))
      .await?;

    if n > 0 {
      self.publish(Table::DocumentRequests, ChangeKind::Update, id);
    }
    Ok(n > 0)
  }

  async fn count_documents<'a>(&'a self, query: &'a DocumentQuery) -> Result<u64> {
    let user_id     = query.user_id.map(encode_uuid);
    let status      = query.status.map(DocumentStatus::as_str);
    let doc_type    = query.document_type.map(|t| t.as_str());
    let verified_by = query.verified_by.map(encode_uuid);
    let approved_by = query.approved_by.map(encode_uuid);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM document_requests
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR status = ?2)
             AND (?3 IS NULL OR document_type = ?3)
             AND (?4 IS NULL OR verified_by = ?4)
             AND (?5 IS NULL OR approved_by = ?5)",
          rusqlite::params![user_id, status, doc_type, verified_by, approved_by],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }

  // ── Announcements ─────────────────────────────────────────────────────────

  async fn list_announcements(&self, category: Option<String>) -> Result<Vec<AnnouncementRow>> {
    let raws: Vec<RawAnnouncement> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{ANNOUNCEMENT_SELECT}
           WHERE (?1 IS NULL OR category = ?1)
           ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![category], RawAnnouncement::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAnnouncement::into_row).collect()
  }

  async fn get_announcement(&self, id: Uuid) -> Result<Option<AnnouncementRow>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!("{ANNOUNCEMENT_SELECT} WHERE id = ?1");
        Ok(conn.query_row(&sql, rusqlite::params![id_str], RawAnnouncement::read).optional()?)
      })
      .await?;
    raw.map(RawAnnouncement::into_row).transpose()
  }

  async fn insert_announcement(&self, input: AnnouncementDraft) -> Result<AnnouncementRow> {
    let now = encode_dt(Utc::now());
    let row = AnnouncementRow {
      id:         Uuid::new_v4(),
      title:      input.title,
      content:    input.content,
      category:   input.category,
      important:  input.important,
      created_by: input.created_by,
      created_at: now.clone(),
      updated_at: now,
    };

    let id_str     = encode_uuid(row.id);
    let title      = row.title.clone();
    let content    = row.content.clone();
    let category   = row.category.clone();
    let important  = row.important;
    let created_by = row.created_by.map(encode_uuid);
    let at_str     = row.created_at.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO announcements (
             id, title, content, category, important, created_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
          rusqlite::params![id_str, title, content, category, important, created_by, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Table::Announcements, ChangeKind::Insert, row.id);
    Ok(row)
  }

  async fn update_announcement(&self, id: Uuid, patch: AnnouncementPatch) -> Result<bool> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(patch.updated_at);

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE announcements
           SET title = ?2, content = ?3, category = ?4, important = ?5, updated_at = ?6
           WHERE id = ?1",
          rusqlite::params![
            id_str,
            patch.title,
            patch.content,
            patch.category,
            patch.important,
            at_str,
          ],
        )?)
      })
      .await?;

    if n > 0 {
      self.publish(Table::Announcements, ChangeKind::Update, id);
    }
    Ok(n > 0)
  }

  async fn delete_announcement(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM announcements WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if n > 0 {
      self.publish(Table::Announcements, ChangeKind::Delete, id);
    }
    Ok(n > 0)
  }

  // ── Staff ─────────────────────────────────────────────────────────────────

  async fn list_staff(&self) -> Result<Vec<StaffRow>> {
    let raws: Vec<RawStaff> = self
      .conn
      .call(|conn| {
        let sql = format!("{STAFF_SELECT} ORDER BY s.joined_at DESC, s.rowid DESC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawStaff::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawStaff::into_row).collect()
  }

  /// Insert a staff row for an existing profile and promote a citizen
  /// profile to `staff`, in one transaction.
  async fn add_staff(&self, user_id: Uuid) -> Result<StaffRow> {
    let id       = Uuid::new_v4();
    let id_str   = encode_uuid(id);
    let user_str = encode_uuid(user_id);
    let at_str   = encode_dt(Utc::now());

    let raw: Option<RawStaff> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row("SELECT 1 FROM profiles WHERE id = ?1", rusqlite::params![user_str], |_| {
            Ok(())
          })
          .optional()?
          .is_some();
        if !exists {
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO staff (id, user_id, is_active, joined_at) VALUES (?1, ?2, 1, ?3)",
          rusqlite::params![id_str, user_str, at_str],
        )?;
        tx.execute(
          "UPDATE profiles SET role = 'staff' WHERE id = ?1 AND role = 'citizen'",
          rusqlite::params![user_str],
        )?;

        let sql = format!("{STAFF_SELECT} WHERE s.id = ?1");
        let raw = tx.query_row(&sql, rusqlite::params![id_str], RawStaff::read)?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    let row = raw.ok_or(Error::ProfileNotFound(user_id))?.into_row()?;
    self.publish(Table::Staff, ChangeKind::Insert, row.id);
    self.publish(Table::Profiles, ChangeKind::Update, user_id);
    Ok(row)
  }

  async fn set_staff_active(&self, id: Uuid, is_active: bool) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE staff SET is_active = ?2 WHERE id = ?1",
          rusqlite::params![id_str, is_active],
        )?)
      })
      .await?;

    if n > 0 {
      self.publish(Table::Staff, ChangeKind::Update, id);
    }
    Ok(n > 0)
  }

  async fn delete_staff(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM staff WHERE id = ?1", rusqlite::params![id_str])?)
      })
      .await?;

    if n > 0 {
      self.publish(Table::Staff, ChangeKind::Delete, id);
    }
    Ok(n > 0)
  }

  // ── Complaints ────────────────────────────────────────────────────────────

  async fn list_complaints<'a>(&'a self, query: &'a ComplaintQuery) -> Result<Vec<ComplaintRow>> {
    let user_id     = query.user_id.map(encode_uuid);
    let assigned_to = query.assigned_to.map(encode_uuid);
    let status      = query.status.map(ComplaintStatus::as_str);

    let raws: Vec<RawComplaint> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "{COMPLAINT_SELECT}
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR assigned_to = ?2)
             AND (?3 IS NULL OR status = ?3)
           ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![user_id, assigned_to, status], RawComplaint::read)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComplaint::into_row).collect()
  }

  async fn insert_complaint(&self, input: NewComplaint) -> Result<ComplaintRow> {
    let now = encode_dt(Utc::now());
    let row = ComplaintRow {
      id:          Uuid::new_v4(),
      user_id:     input.user_id,
      title:       input.title,
      description: input.description,
      status:      ComplaintStatus::Open.as_str().to_owned(),
      assigned_to: None,
      created_at:  now.clone(),
      updated_at:  now,
    };

    let id_str      = encode_uuid(row.id);
    let user_str    = encode_uuid(row.user_id);
    let title       = row.title.clone();
    let description = row.description.clone();
    let at_str      = row.created_at.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO complaints (
             id, user_id, title, description, status, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, 'open', ?5, ?5)",
          rusqlite::params![id_str, user_str, title, description, at_str],
        )?;
        Ok(())
      })
      .await?;

    self.publish(Table::Complaints, ChangeKind::Insert, row.id);
    Ok(row)
  }

  async fn update_complaint(&self, id: Uuid, patch: ComplaintPatch) -> Result<bool> {
    let mut sets: Vec<&'static str> = vec!["updated_at = ?"];
    let mut values: Vec<SqlValue> = vec![SqlValue::Text(encode_dt(patch.updated_at))];
    if let Some(status) = patch.status {
      sets.push("status = ?");
      values.push(SqlValue::Text(status.as_str().to_owned()));
    }
    if let Some(assigned_to) = patch.assigned_to {
      sets.push("assigned_to = ?");
      values.push(sql_opt_uuid(assigned_to));
    }
    let sql = format!("UPDATE complaints SET {} WHERE id = ?", sets.join(", "));
    values.push(SqlValue::Text(encode_uuid(id)));

    let n = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(values))?))
      .await?;

    if n > 0 {
      self.publish(Table::Complaints, ChangeKind::Update, id);
    }
    Ok(n > 0)
  }

  async fn count_complaints<'a>(&'a self, query: &'a ComplaintQuery) -> Result<u64> {
    let user_id     = query.user_id.map(encode_uuid);
    let assigned_to = query.assigned_to.map(encode_uuid);
    let status      = query.status.map(ComplaintStatus::as_str);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM complaints
           WHERE (?1 IS NULL OR user_id = ?1)
             AND (?2 IS NULL OR assigned_to = ?2)
             AND (?3 IS NULL OR status = ?3)",
          rusqlite::params![user_id, assigned_to, status],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }

  // ── Realtime ──────────────────────────────────────────────────────────────

  fn subscribe(&self) -> ChangeFeed { self.changes.subscribe() }
}
