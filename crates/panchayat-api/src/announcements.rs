//! Announcements: public notices managed by admins.

use std::sync::Arc;

use chrono::Utc;
use panchayat_core::{
  announcement::{Announcement, AnnouncementDraft, AnnouncementPatch},
  store::PortalStore,
};
use uuid::Uuid;

use crate::{
  PortalError, Result, normalize,
  notify::{Notice, Notifier, report},
};

pub struct AnnouncementController<S> {
  store:    Arc<S>,
  notifier: Arc<dyn Notifier>,
}

impl<S> Clone for AnnouncementController<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone(), notifier: self.notifier.clone() } }
}

impl<S: PortalStore> AnnouncementController<S> {
  pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self { Self { store, notifier } }

  /// Newest first, optionally restricted to one category.
  pub async fn list(&self, category: Option<String>) -> Result<Vec<Announcement>> {
    let result: Result<Vec<Announcement>> = async {
      let rows = self.store.list_announcements(category).await.map_err(PortalError::store)?;
      rows.into_iter().map(normalize::announcement).collect()
    }
    .await;
    report(&*self.notifier, "Failed to fetch announcements", result)
  }

  pub async fn get_by_id(&self, id: Uuid) -> Result<Announcement> {
    let result: Result<Announcement> = async {
      let row = self
        .store
        .get_announcement(id)
        .await
        .map_err(PortalError::store)?
        .ok_or_else(|| PortalError::NotFound(format!("announcement {id}")))?;
      normalize::announcement(row)
    }
    .await;
    report(&*self.notifier, "Failed to fetch announcement", result)
  }

  pub async fn create(&self, draft: AnnouncementDraft) -> Result<Announcement> {
    let result: Result<Announcement> = async {
      draft.validate()?;
      let row = self.store.insert_announcement(draft).await.map_err(PortalError::store)?;
      normalize::announcement(row)
    }
    .await;
    let created = report(&*self.notifier, "Failed to create announcement", result)?;
    self
      .notifier
      .notify(Notice::success("Announcement published", created.title.clone()));
    Ok(created)
  }

  /// Replace the editable fields of an announcement.
  pub async fn update(&self, id: Uuid, draft: AnnouncementDraft) -> Result<()> {
    let result: Result<()> = async {
      draft.validate()?;
      let patch = AnnouncementPatch {
        title:      draft.title,
        content:    draft.content,
        category:   draft.category,
        important:  draft.important,
        updated_at: Utc::now(),
      };
      let matched = self.store.update_announcement(id, patch).await.map_err(PortalError::store)?;
      if !matched {
        return Err(PortalError::NotFound(format!("announcement {id}")));
      }
      Ok(())
    }
    .await;
    report(&*self.notifier, "Failed to update announcement", result)?;
    self.notifier.notify(Notice::success("Announcement updated", ""));
    Ok(())
  }

  pub async fn delete(&self, id: Uuid) -> Result<()> {
    let result: Result<()> = async {
      let matched = self.store.delete_announcement(id).await.map_err(PortalError::store)?;
      if !matched {
        return Err(PortalError::NotFound(format!("announcement {id}")));
      }
      Ok(())
    }
    .await;
    report(&*self.notifier, "Failed to delete announcement", result)?;
    self.notifier.notify(Notice::success("Announcement deleted", ""));
    Ok(())
  }
}
