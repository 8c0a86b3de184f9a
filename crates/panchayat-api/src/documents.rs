//! Document requests: listing, submission and the review workflow.

use std::sync::Arc;

use chrono::Utc;
use panchayat_core::{
  document::{
    DocumentFilter, DocumentPatch, DocumentQuery, DocumentRequest, DocumentStatus,
    NewDocumentRequest,
  },
  store::PortalStore,
  workflow::{self, Transition},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  PortalError, Result, normalize,
  notify::{Notice, Notifier, report},
};

/// How a workflow transition is written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionMode {
  /// Unconditional write keyed by id. Two reviewers acting on the same
  /// snapshot both succeed and the later write wins.
  #[default]
  LastWriteWins,
  /// The write only applies while the row is still in the status the caller
  /// saw; otherwise the transition fails with [`PortalError::StaleState`].
  CompareAndSwap,
}

pub struct DocumentController<S> {
  store:    Arc<S>,
  notifier: Arc<dyn Notifier>,
  mode:     TransitionMode,
}

impl<S> Clone for DocumentController<S> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), notifier: self.notifier.clone(), mode: self.mode }
  }
}

impl<S: PortalStore> DocumentController<S> {
  pub fn new(store: Arc<S>, notifier: Arc<dyn Notifier>) -> Self {
    Self { store, notifier, mode: TransitionMode::default() }
  }

  pub fn with_mode(mut self, mode: TransitionMode) -> Self {
    self.mode = mode;
    self
  }

  pub fn mode(&self) -> TransitionMode { self.mode }

  // ── Reads ───────────────────────────────────────────────────────────────

  /// All requests matching `filter`, newest first.
  pub async fn list(&self, filter: &DocumentFilter) -> Result<Vec<DocumentRequest>> {
    let query = filter.to_query();
    report(&*self.notifier, "Failed to fetch documents", self.fetch(&query, filter).await)
  }

  /// The requests submitted by `user_id` that match `filter`.
  pub async fn list_for_user(
    &self,
    user_id: Uuid,
    filter: &DocumentFilter,
  ) -> Result<Vec<DocumentRequest>> {
    let query = DocumentQuery { user_id: Some(user_id), ..filter.to_query() };
    report(&*self.notifier, "Failed to fetch your documents", self.fetch(&query, filter).await)
  }

  async fn fetch(&self, query: &DocumentQuery, filter: &DocumentFilter) -> Result<Vec<DocumentRequest>> {
    let rows = self.store.list_documents(query).await.map_err(PortalError::store)?;
    let mut docs = rows.into_iter().map(normalize::document).collect::<Result<Vec<_>>>()?;
    docs.retain(|d| filter.matches(d));
    Ok(docs)
  }

  pub async fn get_by_id(&self, id: Uuid) -> Result<DocumentRequest> {
    let result: Result<DocumentRequest> = async {
      let row = self
        .store
        .get_document(id)
        .await
        .map_err(PortalError::store)?
        .ok_or_else(|| PortalError::NotFound(format!("document {id}")))?;
      normalize::document(row)
    }
    .await;
    report(&*self.notifier, "Failed to fetch document", result)
  }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Submit a new request. It starts out `pending`.
  pub async fn submit(&self, input: NewDocumentRequest) -> Result<DocumentRequest> {
    let result: Result<DocumentRequest> = async {
      input.validate()?;
      let row = self.store.insert_document(input).await.map_err(PortalError::store)?;
      normalize::document(row)
    }
    .await;
    let doc = report(&*self.notifier, "Failed to submit document request", result)?;
    self.notifier.notify(Notice::success(
      "Request submitted",
      format!("Your {} request has been submitted", doc.document_type.title()),
    ));
    Ok(doc)
  }

  /// Set `status` on a request in a single partial update.
  ///
  /// Records `staff_id` as verifier or approver when the status calls for it
  /// and `reason` when rejecting; columns the new status forbids are cleared.
  /// No precondition is checked; the workflow operations below are the
  /// guarded entry points.
  pub async fn update_status(
    &self,
    id: Uuid,
    status: DocumentStatus,
    staff_id: Uuid,
    reason: Option<String>,
  ) -> Result<()> {
    let result: Result<()> = async {
      check_actor(staff_id)?;
      let reason = match status {
        DocumentStatus::Rejected => {
          let reason = reason.as_deref().map(str::trim).unwrap_or_default();
          if reason.is_empty() {
            return Err(panchayat_core::Error::EmptyRejectionReason.into());
          }
          Some(reason.to_owned())
        }
        _ => None,
      };
      let patch = DocumentPatch::settle(status, staff_id, reason, Utc::now());
      self.write(id, patch).await
    }
    .await;
    report(&*self.notifier, "Failed to update document status", result)?;
    self
      .notifier
      .notify(Notice::success("Status updated", format!("Document marked as {status}")));
    Ok(())
  }

  // ── Workflow ────────────────────────────────────────────────────────────

  /// `pending → verified`.
  pub async fn verify(&self, doc: &DocumentRequest, staff_id: Uuid) -> Result<DocumentRequest> {
    self.transition(doc, Transition::Verify, staff_id).await
  }

  /// `verified → approved`.
  pub async fn approve(&self, doc: &DocumentRequest, staff_id: Uuid) -> Result<DocumentRequest> {
    self.transition(doc, Transition::Approve, staff_id).await
  }

  /// `pending | verified → rejected`. Blank reasons are refused.
  pub async fn reject(
    &self,
    doc: &DocumentRequest,
    staff_id: Uuid,
    reason: &str,
  ) -> Result<DocumentRequest> {
    let transition = Transition::Reject { reason: reason.to_owned() };
    self.transition(doc, transition, staff_id).await
  }

  /// Check `transition` against the caller's snapshot, write it, and return
  /// the snapshot with the change applied locally.
  async fn transition(
    &self,
    doc: &DocumentRequest,
    transition: Transition,
    staff_id: Uuid,
  ) -> Result<DocumentRequest> {
    let action = transition.action();
    let result: Result<DocumentRequest> = async {
      check_actor(staff_id)?;
      let mut patch = workflow::plan(doc.status, &transition, staff_id, Utc::now())?;
      if self.mode == TransitionMode::CompareAndSwap {
        patch = patch.expecting(doc.status);
      }
      self.write(doc.id, patch.clone()).await?;

      let mut updated = doc.clone();
      patch.apply(&mut updated);
      Ok(updated)
    }
    .await;

    let updated = report(&*self.notifier, &format!("Failed to {} document", action.as_str()), result)?;
    tracing::info!(document = %doc.id, %staff_id, status = %updated.status, "document transitioned");
    self.notifier.notify(Notice::success(
      "Document updated",
      format!("{} request is now {}", updated.document_type.title(), updated.status),
    ));
    Ok(updated)
  }

  async fn write(&self, id: Uuid, patch: DocumentPatch) -> Result<()> {
    let expected = patch.expected_status;
    let matched = self.store.update_document(id, patch).await.map_err(PortalError::store)?;
    match (matched, expected) {
      (true, _) => Ok(()),
      (false, Some(expected)) => Err(PortalError::StaleState { id, expected }),
      (false, None) => Err(PortalError::NotFound(format!("document {id}"))),
    }
  }
}

fn check_actor(staff_id: Uuid) -> Result<()> {
  if staff_id.is_nil() {
    return Err(PortalError::Validation("staff identity is required".into()));
  }
  Ok(())
}
