//! The `PortalStore` and `ObjectStore` traits.
//!
//! These are the only contracts between the portal and its backing services.
//! Storage backends (e.g. `panchayat-store-sqlite`) implement them; the
//! data-access layer (`panchayat-api`) depends on the traits, never on a
//! concrete backend.
//!
//! `PortalStore` speaks in raw rows. Every method is one round trip; joins are
//! part of the query, not assembled by callers.

use std::future::Future;

use uuid::Uuid;

use crate::{
  announcement::{AnnouncementDraft, AnnouncementPatch, AnnouncementRow},
  complaint::{ComplaintPatch, ComplaintQuery, ComplaintRow, NewComplaint},
  document::{DocumentPatch, DocumentQuery, DocumentRow, NewDocumentRequest},
  realtime::ChangeFeed,
  staff::{NewProfile, Profile, Role, StaffRow},
};

// ─── Row store ───────────────────────────────────────────────────────────────

/// Abstraction over the hosted row store.
///
/// Partial updates and deletes return `true` when a row matched. Every
/// successful mutation that touches a row publishes one
/// [`ChangeEvent`](crate::realtime::ChangeEvent) on the change feed.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait PortalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Profiles ──────────────────────────────────────────────────────────

  fn add_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  fn get_profile(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  fn set_profile_role(
    &self,
    id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Document requests ─────────────────────────────────────────────────

  /// Rows matching every set field of `query`, newest first, with the
  /// requester, verifier and approver profile joins.
  fn list_documents<'a>(
    &'a self,
    query: &'a DocumentQuery,
  ) -> impl Future<Output = Result<Vec<DocumentRow>, Self::Error>> + Send + 'a;

  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<DocumentRow>, Self::Error>> + Send + '_;

  /// Insert with status `pending`; the store assigns id and timestamps.
  fn insert_document(
    &self,
    input: NewDocumentRequest,
  ) -> impl Future<Output = Result<DocumentRow, Self::Error>> + Send + '_;

  /// Partial update keyed by id. With `patch.expected_status` set, the row is
  /// only written while it is still in that status.
  fn update_document(
    &self,
    id: Uuid,
    patch: DocumentPatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Count-only selection.
  fn count_documents<'a>(
    &'a self,
    query: &'a DocumentQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Announcements ─────────────────────────────────────────────────────

  fn list_announcements(
    &self,
    category: Option<String>,
  ) -> impl Future<Output = Result<Vec<AnnouncementRow>, Self::Error>> + Send + '_;

  fn get_announcement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AnnouncementRow>, Self::Error>> + Send + '_;

  fn insert_announcement(
    &self,
    input: AnnouncementDraft,
  ) -> impl Future<Output = Result<AnnouncementRow, Self::Error>> + Send + '_;

  fn update_announcement(
    &self,
    id: Uuid,
    patch: AnnouncementPatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_announcement(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Staff ─────────────────────────────────────────────────────────────

  /// All staff rows with the profile name join.
  fn list_staff(&self) -> impl Future<Output = Result<Vec<StaffRow>, Self::Error>> + Send + '_;

  fn add_staff(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<StaffRow, Self::Error>> + Send + '_;

  fn set_staff_active(
    &self,
    id: Uuid,
    is_active: bool,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_staff(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Complaints ────────────────────────────────────────────────────────

  fn list_complaints<'a>(
    &'a self,
    query: &'a ComplaintQuery,
  ) -> impl Future<Output = Result<Vec<ComplaintRow>, Self::Error>> + Send + 'a;

  fn insert_complaint(
    &self,
    input: NewComplaint,
  ) -> impl Future<Output = Result<ComplaintRow, Self::Error>> + Send + '_;

  fn update_complaint(
    &self,
    id: Uuid,
    patch: ComplaintPatch,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn count_complaints<'a>(
    &'a self,
    query: &'a ComplaintQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Realtime ──────────────────────────────────────────────────────────

  /// A new receiver on the change feed. Events published before this call
  /// are not delivered.
  fn subscribe(&self) -> ChangeFeed;
}

// ─── Object store ────────────────────────────────────────────────────────────

/// Abstraction over a bucketed object store with public URLs.
pub trait ObjectStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `bytes` at `path` inside `bucket` and return its public URL.
  fn upload<'a>(
    &'a self,
    bucket: &'a str,
    path: &'a str,
    bytes: Vec<u8>,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  fn delete<'a>(
    &'a self,
    bucket: &'a str,
    path: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
