//! Staff membership and performance metrics.

use std::sync::Arc;

use futures::future::try_join_all;
use panchayat_core::{
  complaint::{ComplaintQuery, ComplaintStatus},
  document::DocumentQuery,
  staff::{Role, StaffMember, StaffPerformance},
  store::PortalStore,
};
use uuid::Uuid;

use crate::{
  PortalError, Result,
  error::RemovalStep,
  normalize::{self, UNKNOWN_NAME},
  notify::{Notice, Notifier, report},
};

pub struct StaffController<S> {
  store:    Arc<S>,
  notifier: Arc<dyn Notifier>,
}

impl<S> Clone for StaffController<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone(), notifier: self.notifier.clone() } }
}

impl<S: PortalStore> StaffController<S> {
  pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self { Self { store, notifier } }

  pub async fn list(&self) -> Result<Vec<StaffMember>> {
    report(&*self.notifier, "Failed to fetch staff members", self.fetch_members().await)
  }

  async fn fetch_members(&self) -> Result<Vec<StaffMember>> {
    let rows = self.store.list_staff().await.map_err(PortalError::store)?;
    rows.into_iter().map(normalize::staff_member).collect()
  }

  /// Make the profile `user_id` a staff member.
  pub async fn add_member(&self, user_id: Uuid) -> Result<StaffMember> {
    let result: Result<StaffMember> = async {
      let row = self.store.add_staff(user_id).await.map_err(PortalError::store)?;
      normalize::staff_member(row)
    }
    .await;
    let member = report(&*self.notifier, "Failed to add staff member", result)?;
    self.notifier.notify(Notice::success(
      "Staff member added",
      member.name.clone().unwrap_or_else(|| UNKNOWN_NAME.to_owned()),
    ));
    Ok(member)
  }

  /// Flip a member's active flag. `currently_active` is the state the caller
  /// last saw; the negation of it is written. Returns the new state.
  pub async fn toggle_status(&self, staff_id: Uuid, currently_active: bool) -> Result<bool> {
    let next = !currently_active;
    let result: Result<()> = async {
      let matched = self.store.set_staff_active(staff_id, next).await.map_err(PortalError::store)?;
      if !matched {
        return Err(PortalError::NotFound(format!("staff member {staff_id}")));
      }
      Ok(())
    }
    .await;
    report(&*self.notifier, "Failed to update staff status", result)?;
    let state = if next { "activated" } else { "deactivated" };
    self.notifier.notify(Notice::success("Staff status updated", format!("Staff member {state}")));
    Ok(next)
  }

  /// Delete the staff row, then reset the member's profile role to citizen.
  ///
  /// The two writes are separate. A failure names the step that failed; if
  /// it is [`RemovalStep::ResetRole`] the staff row is already gone and the
  /// profile still carries its elevated role.
  pub async fn remove_member(&self, staff_id: Uuid, user_id: Uuid) -> Result<()> {
    let result: Result<()> = async {
      let deleted = self
        .store
        .delete_staff(staff_id)
        .await
        .map_err(|e| removal_failed(RemovalStep::DeleteStaff, PortalError::store(e)))?;
      if !deleted {
        return Err(PortalError::NotFound(format!("staff member {staff_id}")));
      }

      let reset = self
        .store
        .set_profile_role(user_id, Role::Citizen)
        .await
        .map_err(|e| removal_failed(RemovalStep::ResetRole, PortalError::store(e)))?;
      if !reset {
        return Err(removal_failed(
          RemovalStep::ResetRole,
          PortalError::NotFound(format!("profile {user_id}")),
        ));
      }
      Ok(())
    }
    .await;
    report(&*self.notifier, "Failed to remove staff member", result)?;
    self.notifier.notify(Notice::success("Staff member removed", ""));
    Ok(())
  }

  /// Review counts for every staff member.
  ///
  /// One staff query, then three count queries per member, all members in
  /// parallel. Any failure fails the whole computation.
  pub async fn compute_performance(&self) -> Result<Vec<StaffPerformance>> {
    report(
      &*self.notifier,
      "Failed to fetch staff performance data",
      self.fetch_performance().await,
    )
  }

  async fn fetch_performance(&self) -> Result<Vec<StaffPerformance>> {
    let members = self.fetch_members().await?;
    let per_member = members.into_iter().map(|member| async move {
      let resolved = ComplaintQuery {
        assigned_to: Some(member.user_id),
        status: Some(ComplaintStatus::Resolved),
        ..ComplaintQuery::default()
      };
      let verified = DocumentQuery { verified_by: Some(member.user_id), ..DocumentQuery::default() };
      let approved = DocumentQuery { approved_by: Some(member.user_id), ..DocumentQuery::default() };

      let (complaints_resolved, documents_reviewed, documents_approved) = futures::try_join!(
        self.store.count_complaints(&resolved),
        self.store.count_documents(&verified),
        self.store.count_documents(&approved),
      )
      .map_err(PortalError::store)?;

      Ok::<_, PortalError>(StaffPerformance {
        staff_id: member.user_id,
        staff_name: member.name.unwrap_or_else(|| UNKNOWN_NAME.to_owned()),
        complaints_resolved,
        documents_reviewed,
        documents_approved,
        last_active: member.joined_at,
      })
    });
    try_join_all(per_member).await
  }
}

fn removal_failed(failed_step: RemovalStep, source: PortalError) -> PortalError {
  PortalError::StaffRemoval { failed_step, source: Box::new(source) }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use panchayat_core::{
    complaint::{ComplaintPatch, NewComplaint},
    document::{DocumentType, NewDocumentRequest},
    staff::NewProfile,
  };

  use super::*;
  use crate::testing::Fixture;

  async fn resolve_complaint(fx: &Fixture, assignee: Uuid) {
    let c = fx
      .store
      .insert_complaint(NewComplaint {
        user_id:     fx.citizen,
        title:       "Drain blocked".into(),
        description: String::new(),
      })
      .await
      .unwrap();
    fx.store
      .update_complaint(c.id, ComplaintPatch {
        status:      Some(ComplaintStatus::Resolved),
        assigned_to: Some(Some(assignee)),
        updated_at:  Utc::now(),
      })
      .await
      .unwrap();
  }

  #[tokio::test]
  async fn performance_counts_per_member() {
    let fx = Fixture::new().await;
    fx.staff.add_member(fx.officer).await.unwrap();

    for _ in 0..3 {
      resolve_complaint(&fx, fx.officer).await;
    }
    // An open complaint assigned to the officer does not count.
    let open = fx
      .complaints
      .file(NewComplaint { user_id: fx.citizen, title: "Pothole".into(), description: String::new() })
      .await
      .unwrap();
    fx.complaints.update(open.id, None, Some(Some(fx.officer))).await.unwrap();

    let mut verified = Vec::new();
    for _ in 0..2 {
      let doc = fx
        .documents
        .submit(NewDocumentRequest::new(fx.citizen, DocumentType::Income, "scholarship"))
        .await
        .unwrap();
      verified.push(fx.documents.verify(&doc, fx.officer).await.unwrap());
    }
    fx.documents.approve(&verified[0], fx.officer).await.unwrap();

    let report = fx.staff.compute_performance().await.unwrap();
    assert_eq!(report.len(), 1);
    let entry = &report[0];
    assert_eq!(entry.staff_id, fx.officer);
    assert_eq!(entry.staff_name, "Officer Rao");
    assert_eq!(
      (entry.complaints_resolved, entry.documents_reviewed, entry.documents_approved),
      (3, 2, 1)
    );
  }

  #[tokio::test]
  async fn performance_uses_join_date_and_zero_counts() {
    let fx = Fixture::new().await;
    let member = fx.staff.add_member(fx.admin).await.unwrap();

    let report = fx.staff.compute_performance().await.unwrap();
    assert_eq!(report[0].last_active, member.joined_at);
    assert_eq!(
      (report[0].complaints_resolved, report[0].documents_reviewed, report[0].documents_approved),
      (0, 0, 0)
    );
  }

  #[tokio::test]
  async fn performance_is_empty_without_staff() {
    let fx = Fixture::new().await;
    assert!(fx.staff.compute_performance().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn toggle_writes_negation() {
    let fx = Fixture::new().await;
    let member = fx.staff.add_member(fx.officer).await.unwrap();
    assert!(member.is_active);

    assert!(!fx.staff.toggle_status(member.id, true).await.unwrap());
    assert!(!fx.staff.list().await.unwrap()[0].is_active);
    assert!(fx.staff.toggle_status(member.id, false).await.unwrap());
    assert!(fx.staff.list().await.unwrap()[0].is_active);

    assert!(matches!(
      fx.staff.toggle_status(Uuid::new_v4(), true).await,
      Err(PortalError::NotFound(_))
    ));
  }

  #[tokio::test]
  async fn remove_member_resets_role() {
    let fx = Fixture::new().await;
    let member = fx.staff.add_member(fx.officer).await.unwrap();

    fx.staff.remove_member(member.id, fx.officer).await.unwrap();
    assert!(fx.staff.list().await.unwrap().is_empty());
    let profile = fx.store.get_profile(fx.officer).await.unwrap().unwrap();
    assert_eq!(profile.role, Role::Citizen);
  }

  #[tokio::test]
  async fn remove_member_reports_failed_role_reset() {
    let fx = Fixture::new().await;
    let member = fx.staff.add_member(fx.officer).await.unwrap();

    // The staff row points at the officer, but the caller names a profile
    // that does not exist, so the second step finds nothing to reset.
    let err = fx.staff.remove_member(member.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(
      err,
      PortalError::StaffRemoval { failed_step: RemovalStep::ResetRole, .. }
    ));
    // The first step already happened.
    assert!(fx.staff.list().await.unwrap().is_empty());
    assert_eq!(fx.notices.errors(), 1);
  }

  #[tokio::test]
  async fn remove_unknown_member_changes_nothing() {
    let fx = Fixture::new().await;
    fx.staff.add_member(fx.officer).await.unwrap();

    let err = fx.staff.remove_member(Uuid::new_v4(), fx.officer).await.unwrap_err();
    assert!(matches!(err, PortalError::NotFound(_)));
    assert_eq!(fx.staff.list().await.unwrap().len(), 1);
    let profile = fx.store.get_profile(fx.officer).await.unwrap().unwrap();
    assert_eq!(profile.role, Role::Staff);
  }

  #[tokio::test]
  async fn empty_profile_name_is_kept() {
    let fx = Fixture::new().await;
    let nameless = fx
      .store
      .add_profile(NewProfile { name: String::new(), role: Role::Citizen })
      .await
      .unwrap();
    fx.staff.add_member(nameless.id).await.unwrap();

    let report = fx.staff.compute_performance().await.unwrap();
    assert_eq!(report[0].staff_name, "");
  }
}
