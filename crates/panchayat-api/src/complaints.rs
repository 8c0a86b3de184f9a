//! Citizen complaints.

use std::sync::Arc;

use chrono::Utc;
use panchayat_core::{
  complaint::{Complaint, ComplaintPatch, ComplaintQuery, ComplaintStatus, NewComplaint},
  store::PortalStore,
};
use uuid::Uuid;

use crate::{
  PortalError, Result, normalize,
  notify::{Notice, Notifier, report},
};

pub struct ComplaintController<S> {
  store:    Arc<S>,
  notifier: Arc<dyn Notifier>,
}

impl<S> Clone for ComplaintController<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone(), notifier: self.notifier.clone() } }
}

impl<S: PortalStore> ComplaintController<S> {
  pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self { Self { store, notifier } }

  pub async fn list(&self, query: &ComplaintQuery) -> Result<Vec<Complaint>> {
    let result: Result<Vec<Complaint>> = async {
      let rows = self.store.list_complaints(query).await.map_err(PortalError::store)?;
      rows.into_iter().map(normalize::complaint).collect()
    }
    .await;
    report(&*self.notifier, "Failed to fetch complaints", result)
  }

  /// File a new complaint. It starts out `open` and unassigned.
  pub async fn file(&self, input: NewComplaint) -> Result<Complaint> {
    let result: Result<Complaint> = async {
      input.validate()?;
      let row = self.store.insert_complaint(input).await.map_err(PortalError::store)?;
      normalize::complaint(row)
    }
    .await;
    let complaint = report(&*self.notifier, "Failed to file complaint", result)?;
    self.notifier.notify(Notice::success("Complaint filed", complaint.title.clone()));
    Ok(complaint)
  }

  /// Change status and/or assignment. `assigned_to: Some(None)` unassigns.
  pub async fn update(
    &self,
    id: Uuid,
    status: Option<ComplaintStatus>,
    assigned_to: Option<Option<Uuid>>,
  ) -> Result<()> {
    let result: Result<()> = async {
      if status.is_none() && assigned_to.is_none() {
        return Err(PortalError::Validation("nothing to update".into()));
      }
      let patch = ComplaintPatch { status, assigned_to, updated_at: Utc::now() };
      let matched = self.store.update_complaint(id, patch).await.map_err(PortalError::store)?;
      if !matched {
        return Err(PortalError::NotFound(format!("complaint {id}")));
      }
      Ok(())
    }
    .await;
    report(&*self.notifier, "Failed to update complaint", result)?;
    self.notifier.notify(Notice::success("Complaint updated", ""));
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::Fixture;

  #[tokio::test]
  async fn file_assign_and_resolve() {
    let fx = Fixture::new().await;
    let c = fx
      .complaints
      .file(NewComplaint {
        user_id:     fx.citizen,
        title:       "Handpump not working".into(),
        description: "Ward 4, near the school".into(),
      })
      .await
      .unwrap();
    assert_eq!(c.status, ComplaintStatus::Open);
    assert_eq!(c.assigned_to, None);

    fx.complaints
      .update(c.id, Some(ComplaintStatus::Resolved), Some(Some(fx.officer)))
      .await
      .unwrap();

    let query = ComplaintQuery { assigned_to: Some(fx.officer), ..ComplaintQuery::default() };
    let listed = fx.complaints.list(&query).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, ComplaintStatus::Resolved);
  }

  #[tokio::test]
  async fn empty_update_is_refused() {
    let fx = Fixture::new().await;
    let err = fx.complaints.update(Uuid::new_v4(), None, None).await.unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
  }

  #[tokio::test]
  async fn blank_title_is_refused() {
    let fx = Fixture::new().await;
    let err = fx
      .complaints
      .file(NewComplaint { user_id: fx.citizen, title: "  ".into(), description: String::new() })
      .await
      .unwrap_err();
    assert!(matches!(err, PortalError::Validation(_)));
  }
}
