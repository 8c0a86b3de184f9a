//! User-facing notices.
//!
//! Every controller operation reports its outcome through a [`Notifier`]:
//! failures always, successful mutations too. Notices are informational and
//! never change what the operation returns.

use std::sync::Mutex;

use serde::Serialize;

use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub title:   String,
  pub message: String,
}

impl Notice {
  pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Success, title: title.into(), message: message.into() }
  }

  pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Error, title: title.into(), message: message.into() }
  }
}

pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

/// Writes notices to the `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
  fn notify(&self, notice: Notice) {
    match notice.level {
      NoticeLevel::Success => tracing::info!(title = %notice.title, "{}", notice.message),
      NoticeLevel::Error => tracing::warn!(title = %notice.title, "{}", notice.message),
    }
  }
}

/// Keeps every notice in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
  notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
  pub fn new() -> Self { Self::default() }

  pub fn notices(&self) -> Vec<Notice> {
    self.notices.lock().map(|n| n.clone()).unwrap_or_default()
  }

  /// Drain and return the recorded notices.
  pub fn take(&self) -> Vec<Notice> {
    self.notices.lock().map(|mut n| std::mem::take(&mut *n)).unwrap_or_default()
  }

  pub fn errors(&self) -> usize {
    self.notices().iter().filter(|n| n.level == NoticeLevel::Error).count()
  }
}

impl Notifier for RecordingNotifier {
  fn notify(&self, notice: Notice) {
    if let Ok(mut n) = self.notices.lock() {
      n.push(notice);
    }
  }
}

/// Pass `result` through, logging and notifying on failure.
pub(crate) fn report<T>(notifier: &dyn Notifier, failure: &str, result: Result<T>) -> Result<T> {
  if let Err(e) = &result {
    tracing::error!(error = %e, "{failure}");
    notifier.notify(Notice::error("Error", format!("{failure}: {e}")));
  }
  result
}
