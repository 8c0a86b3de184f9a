//! Announcements published by the panchayat office.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Categories the portal styles specially. The category field itself is an
/// open string; anything else is shown with neutral styling.
pub const KNOWN_CATEGORIES: &[&str] = &[
  "health",
  "infrastructure",
  "public_works",
  "governance",
  "education",
  "agriculture",
  "emergency",
  "event",
];

/// Number of characters shown in a card preview before truncation.
pub const PREVIEW_CHARS: usize = 120;

pub fn is_known_category(category: &str) -> bool {
  KNOWN_CATEGORIES.contains(&category.to_lowercase().as_str())
}

/// An announcement as presented to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
  pub id:        Uuid,
  pub title:     String,
  /// Free text; paragraphs are separated by blank lines.
  pub content:   String,
  /// Creation time.
  pub date:      DateTime<Utc>,
  pub category:  String,
  pub important: bool,
  pub link:      Option<String>,
}

impl Announcement {
  /// The first [`PREVIEW_CHARS`] characters, with `...` when truncated.
  pub fn preview(&self) -> String {
    if self.content.chars().count() > PREVIEW_CHARS {
      let head: String = self.content.chars().take(PREVIEW_CHARS).collect();
      format!("{head}...")
    } else {
      self.content.clone()
    }
  }

  pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
    self
      .content
      .split("\n\n")
      .map(str::trim)
      .filter(|p| !p.is_empty())
  }
}

/// Fields an admin supplies when creating or editing an announcement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnouncementDraft {
  pub title:      String,
  pub content:    String,
  pub category:   String,
  #[serde(default)]
  pub important:  bool,
  #[serde(default)]
  pub created_by: Option<Uuid>,
}

impl AnnouncementDraft {
  pub fn validate(&self) -> Result<()> {
    if self.title.trim().is_empty() {
      return Err(Error::Validation("title is required".into()));
    }
    if self.content.trim().is_empty() {
      return Err(Error::Validation("content is required".into()));
    }
    if self.category.trim().is_empty() {
      return Err(Error::Validation("category is required".into()));
    }
    Ok(())
  }
}

/// An `announcements` row as returned by the store.
#[derive(Debug, Clone, Default)]
pub struct AnnouncementRow {
  pub id:         Uuid,
  pub title:      String,
  pub content:    String,
  pub category:   String,
  pub important:  bool,
  pub created_by: Option<Uuid>,
  /// RFC 3339.
  pub created_at: String,
  pub updated_at: String,
}

/// Editable announcement fields plus the new modification time.
#[derive(Debug, Clone)]
pub struct AnnouncementPatch {
  pub title:      String,
  pub content:    String,
  pub category:   String,
  pub important:  bool,
  pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn announcement(content: &str) -> Announcement {
    Announcement {
      id:        Uuid::new_v4(),
      title:     "Water supply".into(),
      content:   content.into(),
      date:      Utc::now(),
      category:  "infrastructure".into(),
      important: false,
      link:      None,
    }
  }

  #[test]
  fn short_content_is_not_truncated() {
    assert_eq!(announcement("Tap repairs on Monday.").preview(), "Tap repairs on Monday.");
  }

  #[test]
  fn long_content_is_truncated() {
    let body = "अ".repeat(200);
    let preview = announcement(&body).preview();
    assert!(preview.ends_with("..."));
    assert_eq!(preview.chars().count(), PREVIEW_CHARS + 3);
  }

  #[test]
  fn paragraphs_skip_blank_runs() {
    let a = announcement("First.\n\n\n\nSecond.\n\n");
    assert_eq!(a.paragraphs().collect::<Vec<_>>(), vec!["First.", "Second."]);
  }

  #[test]
  fn known_categories_ignore_case() {
    assert!(is_known_category("Health"));
    assert!(is_known_category("public_works"));
    assert!(!is_known_category("taxation"));
  }

  #[test]
  fn draft_requires_title() {
    let draft = AnnouncementDraft {
      title:      " ".into(),
      content:    "Body".into(),
      category:   "event".into(),
      important:  false,
      created_by: None,
    };
    assert!(matches!(draft.validate(), Err(Error::Validation(_))));
  }
}
