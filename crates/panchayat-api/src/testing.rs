//! Shared setup for controller tests.

use std::sync::Arc;

use panchayat_core::{
  staff::{NewProfile, Role},
  store::PortalStore,
};
use panchayat_store_sqlite::SqliteStore;
use uuid::Uuid;

use crate::{
  AnnouncementController, ComplaintController, DocumentController, StaffController,
  notify::RecordingNotifier,
};

pub struct Fixture {
  pub store:         Arc<SqliteStore>,
  pub notices:       Arc<RecordingNotifier>,
  pub documents:     DocumentController<SqliteStore>,
  pub announcements: AnnouncementController<SqliteStore>,
  pub staff:         StaffController<SqliteStore>,
  pub complaints:    ComplaintController<SqliteStore>,
  /// "Meena Devi", a citizen.
  pub citizen:       Uuid,
  /// "Officer Rao", a citizen until added to staff.
  pub officer:       Uuid,
  /// "Sarpanch Kumar", an admin.
  pub admin:         Uuid,
}

impl Fixture {
  pub async fn new() -> Self {
    let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
    let notices = Arc::new(RecordingNotifier::new());

    let mut ids = Vec::new();
    for (name, role) in
      [("Meena Devi", Role::Citizen), ("Officer Rao", Role::Citizen), ("Sarpanch Kumar", Role::Admin)]
    {
      let profile = store
        .add_profile(NewProfile { name: name.into(), role })
        .await
        .expect("profile");
      ids.push(profile.id);
    }

    Self {
      documents: DocumentController::new(store.clone(), notices.clone()),
      announcements: AnnouncementController::new(store.clone(), notices.clone()),
      staff: StaffController::new(store.clone(), notices.clone()),
      complaints: ComplaintController::new(store.clone(), notices.clone()),
      citizen: ids[0],
      officer: ids[1],
      admin: ids[2],
      store,
      notices,
    }
  }
}
