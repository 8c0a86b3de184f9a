//! Document requests: a citizen's application for an official certificate.
//!
//! Two shapes exist for every request. [`DocumentRow`] is what the store hands
//! back: snake_case columns, timestamp strings and untyped joined profile
//! objects. [`DocumentRequest`] is the typed view model the rest of the system
//! works with; the conversion happens once, in the data-access layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString, IntoStaticStr, VariantArray};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Enums ───────────────────────────────────────────────────────────────────

/// The certificate a citizen is applying for.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
  VariantArray,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentType {
  Birth,
  Death,
  Marriage,
  Income,
  Residence,
  Other,
}

impl DocumentType {
  pub fn as_str(self) -> &'static str { self.into() }

  /// Parse the stored discriminant. Matching is exact and case-sensitive.
  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownDiscriminant {
      kind:  "document type",
      value: s.to_owned(),
    })
  }

  /// Human-readable title, e.g. `"Birth Certificate"`.
  pub fn title(self) -> String {
    let name = self.as_str();
    let mut chars = name.chars();
    let head: String = chars.next().map(|c| c.to_uppercase().collect()).unwrap_or_default();
    format!("{head}{} Certificate", chars.as_str())
  }
}

/// Where a request sits in the review workflow.
///
/// See [`crate::workflow`] for the permitted transitions.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
  VariantArray,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DocumentStatus {
  Pending,
  Verified,
  Approved,
  Rejected,
}

impl DocumentStatus {
  pub fn as_str(self) -> &'static str { self.into() }

  pub fn parse(s: &str) -> Result<Self> {
    s.parse().map_err(|_| Error::UnknownDiscriminant {
      kind:  "document status",
      value: s.to_owned(),
    })
  }

  /// `approved` and `rejected` have no outgoing transitions.
  pub fn is_terminal(self) -> bool { matches!(self, Self::Approved | Self::Rejected) }
}

// ─── View model ──────────────────────────────────────────────────────────────

/// A document request as presented to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRequest {
  pub id:               Uuid,
  pub requester_id:     Uuid,
  /// Denormalised from the requester's profile; `None` when the join is
  /// missing or malformed.
  pub requester_name:   Option<String>,
  pub document_type:    DocumentType,
  pub purpose:          String,
  pub status:           DocumentStatus,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
  /// Ordered file URLs.
  pub attachments:      Vec<String>,
  pub verified_by:      Option<Uuid>,
  pub verified_by_name: Option<String>,
  pub approved_by:      Option<Uuid>,
  pub approved_by_name: Option<String>,
  pub rejection_reason: Option<String>,
  pub additional_notes: Option<String>,
  /// Type-specific fields, e.g. the date of birth for a birth certificate.
  pub form_details:     Map<String, Value>,
}

impl DocumentRequest {
  /// Check the actor/reason fields against the current status.
  ///
  /// - `verified_by` set implies status is verified or approved
  /// - `approved_by` set implies status is approved
  /// - `rejection_reason` is set exactly when status is rejected
  pub fn check_invariants(&self) -> Result<()> {
    use DocumentStatus::*;

    if self.verified_by.is_some() && !matches!(self.status, Verified | Approved) {
      return Err(Error::Invariant(format!(
        "document {} has a verifier but is {}",
        self.id, self.status
      )));
    }
    if self.approved_by.is_some() && self.status != Approved {
      return Err(Error::Invariant(format!(
        "document {} has an approver but is {}",
        self.id, self.status
      )));
    }
    match (self.status, &self.rejection_reason) {
      (Rejected, None) => Err(Error::Invariant(format!(
        "document {} is rejected without a reason",
        self.id
      ))),
      (Rejected, Some(_)) | (_, None) => Ok(()),
      (status, Some(_)) => Err(Error::Invariant(format!(
        "document {} carries a rejection reason but is {status}",
        self.id
      ))),
    }
  }
}

/// Everything a citizen supplies when submitting a request.
///
/// The store assigns `id`, timestamps and the initial `pending` status.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocumentRequest {
  pub requester_id:     Uuid,
  pub document_type:    DocumentType,
  pub purpose:          String,
  #[serde(default)]
  pub attachments:      Vec<String>,
  pub additional_notes: Option<String>,
  #[serde(default)]
  pub form_details:     Map<String, Value>,
}

impl NewDocumentRequest {
  pub fn new(requester_id: Uuid, document_type: DocumentType, purpose: impl Into<String>) -> Self {
    Self {
      requester_id,
      document_type,
      purpose: purpose.into(),
      attachments: Vec::new(),
      additional_notes: None,
      form_details: Map::new(),
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.purpose.trim().is_empty() {
      return Err(Error::Validation("purpose is required".into()));
    }
    Ok(())
  }
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// Caller-side filter over a document list.
///
/// `status` and `document_type` are exact matches and are pushed down to the
/// store as `eq` filters. `search` is a case-insensitive substring match over
/// the type, the purpose and the requester name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFilter {
  pub status:        Option<DocumentStatus>,
  #[serde(rename = "type")]
  pub document_type: Option<DocumentType>,
  pub search:        Option<String>,
}

impl DocumentFilter {
  pub fn matches(&self, doc: &DocumentRequest) -> bool {
    if self.status.is_some_and(|s| s != doc.status) {
      return false;
    }
    if self.document_type.is_some_and(|t| t != doc.document_type) {
      return false;
    }
    match self.search.as_deref().map(str::trim) {
      None | Some("") => true,
      Some(term) => {
        let term = term.to_lowercase();
        doc.document_type.as_str().contains(&term)
          || doc.purpose.to_lowercase().contains(&term)
          || doc
            .requester_name
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&term))
      }
    }
  }

  /// The part of this filter the store can evaluate.
  pub fn to_query(&self) -> DocumentQuery {
    DocumentQuery {
      status: self.status,
      document_type: self.document_type,
      ..DocumentQuery::default()
    }
  }
}

// ─── Store shapes ────────────────────────────────────────────────────────────

/// A `document_requests` row as returned by the store, joins included.
#[derive(Debug, Clone, Default)]
pub struct DocumentRow {
  pub id:                Uuid,
  pub user_id:           Uuid,
  pub document_type:     String,
  pub purpose:           String,
  pub status:            String,
  /// RFC 3339.
  pub created_at:        String,
  pub updated_at:        String,
  pub attachments:       Option<Value>,
  pub verified_by:       Option<Uuid>,
  pub approved_by:       Option<Uuid>,
  pub rejection_reason:  Option<String>,
  pub additional_notes:  Option<String>,
  pub form_details:      Option<Value>,
  /// `profiles:user_id(name)`
  pub profiles:          Option<Value>,
  /// `profiles:verified_by(name)`
  pub verified_profiles: Option<Value>,
  /// `profiles:approved_by(name)`
  pub approved_profiles: Option<Value>,
}

/// Equality filters over `document_requests`. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentQuery {
  pub user_id:       Option<Uuid>,
  pub status:        Option<DocumentStatus>,
  pub document_type: Option<DocumentType>,
  pub verified_by:   Option<Uuid>,
  pub approved_by:   Option<Uuid>,
}

/// A partial update of one document, produced by [`crate::workflow::plan`].
///
/// For the `Option<Option<_>>` fields the outer `None` leaves the column
/// untouched and `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPatch {
  pub status:           DocumentStatus,
  pub verified_by:      Option<Option<Uuid>>,
  pub approved_by:      Option<Option<Uuid>>,
  pub rejection_reason: Option<Option<String>>,
  pub updated_at:       DateTime<Utc>,
  /// When set, the store writes only if the row is still in this status.
  pub expected_status:  Option<DocumentStatus>,
}

impl DocumentPatch {
  /// The update that moves a request to `status` on behalf of `actor`.
  ///
  /// Every actor and reason column the target status constrains is written,
  /// so the row is consistent whatever it held before:
  ///
  /// | status   | verified_by | approved_by | rejection_reason |
  /// |----------|-------------|-------------|------------------|
  /// | pending  | cleared     | cleared     | cleared          |
  /// | verified | `actor`     | cleared     | cleared          |
  /// | approved | kept        | `actor`     | cleared          |
  /// | rejected | cleared     | cleared     | `reason`         |
  ///
  /// `reason` is only read for `rejected`; callers validate it.
  pub fn settle(
    status: DocumentStatus,
    actor:  Uuid,
    reason: Option<String>,
    now:    DateTime<Utc>,
  ) -> Self {
    use DocumentStatus::*;
    let (verified_by, approved_by, rejection_reason) = match status {
      Pending => (Some(None), Some(None), Some(None)),
      Verified => (Some(Some(actor)), Some(None), Some(None)),
      Approved => (None, Some(Some(actor)), Some(None)),
      Rejected => (Some(None), Some(None), Some(reason)),
    };
    DocumentPatch {
      status,
      verified_by,
      approved_by,
      rejection_reason,
      updated_at: now,
      expected_status: None,
    }
  }

  /// Make the write conditional on the row still being in `status`.
  pub fn expecting(mut self, status: DocumentStatus) -> Self {
    self.expected_status = Some(status);
    self
  }

  /// Apply the patch to a local snapshot. Names of cleared actors are
  /// dropped; names of newly set actors are unknown until the next fetch.
  pub fn apply(&self, doc: &mut DocumentRequest) {
    doc.status = self.status;
    doc.updated_at = self.updated_at;
    if let Some(v) = self.verified_by {
      if doc.verified_by != v {
        doc.verified_by_name = None;
      }
      doc.verified_by = v;
    }
    if let Some(a) = self.approved_by {
      if doc.approved_by != a {
        doc.approved_by_name = None;
      }
      doc.approved_by = a;
    }
    if let Some(r) = &self.rejection_reason {
      doc.rejection_reason = r.clone();
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn doc(status: DocumentStatus, ty: DocumentType) -> DocumentRequest {
    DocumentRequest {
      id: Uuid::new_v4(),
      requester_id: Uuid::new_v4(),
      requester_name: Some("Sunita Patil".into()),
      document_type: ty,
      purpose: "School admission".into(),
      status,
      created_at: Utc::now(),
      updated_at: Utc::now(),
      attachments: vec![],
      verified_by: None,
      verified_by_name: None,
      approved_by: None,
      approved_by_name: None,
      rejection_reason: (status == DocumentStatus::Rejected).then(|| "blurry scan".into()),
      additional_notes: None,
      form_details: Map::new(),
    }
  }

  #[test]
  fn type_parse_is_exact() {
    assert_eq!(DocumentType::parse("birth").unwrap(), DocumentType::Birth);
    assert!(DocumentType::parse("Birth").is_err());
    assert!(DocumentType::parse("passport").is_err());
  }

  #[test]
  fn type_title() {
    assert_eq!(DocumentType::Marriage.title(), "Marriage Certificate");
    assert_eq!(DocumentType::Other.title(), "Other Certificate");
  }

  #[test]
  fn terminal_statuses() {
    assert!(DocumentStatus::Approved.is_terminal());
    assert!(DocumentStatus::Rejected.is_terminal());
    assert!(!DocumentStatus::Pending.is_terminal());
    assert!(!DocumentStatus::Verified.is_terminal());
  }

  #[test]
  fn filter_requires_both_status_and_type() {
    let filter = DocumentFilter {
      status:        Some(DocumentStatus::Rejected),
      document_type: Some(DocumentType::Birth),
      search:        None,
    };
    assert!(filter.matches(&doc(DocumentStatus::Rejected, DocumentType::Birth)));
    assert!(!filter.matches(&doc(DocumentStatus::Rejected, DocumentType::Death)));
    assert!(!filter.matches(&doc(DocumentStatus::Pending, DocumentType::Birth)));
  }

  #[test]
  fn filter_search_is_case_insensitive() {
    let d = doc(DocumentStatus::Pending, DocumentType::Income);
    let by_name = DocumentFilter { search: Some("SUNITA".into()), ..Default::default() };
    let by_type = DocumentFilter { search: Some("inc".into()), ..Default::default() };
    let miss = DocumentFilter { search: Some("pension".into()), ..Default::default() };
    assert!(by_name.matches(&d));
    assert!(by_type.matches(&d));
    assert!(!miss.matches(&d));
  }

  #[test]
  fn invariant_flags_stray_reason() {
    let mut d = doc(DocumentStatus::Pending, DocumentType::Birth);
    assert!(d.check_invariants().is_ok());
    d.rejection_reason = Some("left over".into());
    assert!(matches!(d.check_invariants(), Err(Error::Invariant(_))));
  }

  #[test]
  fn invariant_flags_approver_on_verified() {
    let mut d = doc(DocumentStatus::Verified, DocumentType::Birth);
    d.verified_by = Some(Uuid::new_v4());
    assert!(d.check_invariants().is_ok());
    d.approved_by = Some(Uuid::new_v4());
    assert!(d.check_invariants().is_err());
  }

  #[test]
  fn settled_patch_overwrites_leftover_columns() {
    let officer = Uuid::new_v4();
    for status in DocumentStatus::VARIANTS.iter().copied() {
      let mut d = doc(DocumentStatus::Approved, DocumentType::Birth);
      d.verified_by = Some(Uuid::new_v4());
      d.approved_by = Some(Uuid::new_v4());
      d.rejection_reason = Some("left over".into());

      DocumentPatch::settle(status, officer, Some("wrong ward".into()), Utc::now()).apply(&mut d);
      assert_eq!(d.status, status);
      d.check_invariants().unwrap();
    }
  }
}
