//! Live views: keep a fetched snapshot in step with the store's change feed.
//!
//! A [`LiveView`] owns a background bridge task. The bridge performs the
//! initial fetch, then refetches in full whenever an event arrives for one of
//! the watched tables. Events for other tables are ignored. A refetch that is
//! still running when the next one starts is aborted, and every published
//! snapshot carries a generation number that only grows, so an older
//! response can never replace a newer one.
//!
//! Dropping or [unmounting](LiveView::unmount) the view stops the bridge and
//! any fetch it has in flight.

use std::{
  collections::HashSet,
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
};

use panchayat_core::realtime::{ChangeFeed, Table};
use tokio::{
  sync::{broadcast::error::RecvError, watch},
  task::JoinHandle,
};

use crate::Result;

/// Tables watched by the document list.
pub const DOCUMENTS_VIEW: &[Table] = &[Table::DocumentRequests];
/// Tables watched by the announcement list.
pub const ANNOUNCEMENTS_VIEW: &[Table] = &[Table::Announcements];
/// Staff metrics derive from complaints and document requests.
pub const STAFF_PERFORMANCE_VIEW: &[Table] = &[Table::Complaints, Table::DocumentRequests];

/// The latest outcome of a live view.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState<T> {
  /// Number of the fetch that produced this state; 0 before the first one
  /// completes, 1 for the initial fetch.
  pub generation: u64,
  /// Data from the most recent successful fetch.
  pub data:       Option<T>,
  /// Error of the most recent fetch, if it failed.
  pub error:      Option<String>,
}

impl<T> Default for ViewState<T> {
  fn default() -> Self { Self { generation: 0, data: None, error: None } }
}

pub struct LiveView<T> {
  state:   watch::Receiver<ViewState<T>>,
  started: Arc<AtomicU64>,
  task:    JoinHandle<()>,
}

impl<T> LiveView<T>
where
  T: Clone + Send + Sync + 'static,
{
  /// Start watching `tables` on `feed`, using `fetch` to load the view.
  pub fn mount<F, Fut>(feed: ChangeFeed, tables: &[Table], fetch: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
  {
    let (tx, rx) = watch::channel(ViewState::default());
    let started = Arc::new(AtomicU64::new(0));
    let bridge = Bridge {
      watched: tables.iter().copied().collect(),
      fetch:   Arc::new(fetch),
      state:   Arc::new(tx),
      started: started.clone(),
    };
    let task = tokio::spawn(bridge.run(feed));
    Self { state: rx, started, task }
  }

  /// The current snapshot.
  pub fn state(&self) -> ViewState<T> { self.state.borrow().clone() }

  /// A receiver that is notified on every new snapshot.
  pub fn subscribe(&self) -> watch::Receiver<ViewState<T>> { self.state.clone() }

  /// Fetches started after the initial one.
  pub fn refetch_count(&self) -> u64 { self.started.load(Ordering::SeqCst).saturating_sub(1) }

  /// Wait until a snapshot of at least `generation` is published. `None` if
  /// the bridge stopped first.
  pub async fn wait_for_generation(&self, generation: u64) -> Option<ViewState<T>> {
    let mut rx = self.state.clone();
    let state = rx.wait_for(|s| s.generation >= generation).await.ok()?.clone();
    Some(state)
  }

  /// Wait until `pred` holds for a published snapshot. `None` if the bridge
  /// stopped first.
  pub async fn wait_until(&self, pred: impl FnMut(&ViewState<T>) -> bool) -> Option<ViewState<T>> {
    let mut rx = self.state.clone();
    let state = rx.wait_for(pred).await.ok()?.clone();
    Some(state)
  }

  /// Resolve once the bridge has stopped, which happens when the change feed
  /// closes. The last fetch is allowed to land first.
  pub async fn stopped(&self) {
    let mut rx = self.state.clone();
    while rx.changed().await.is_ok() {}
  }

  pub fn is_running(&self) -> bool { !self.task.is_finished() }

  /// Stop the bridge and abort any fetch in flight.
  pub fn unmount(self) {}
}

impl<T> Drop for LiveView<T> {
  fn drop(&mut self) { self.task.abort(); }
}

// ─── Bridge ──────────────────────────────────────────────────────────────────

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
  fn drop(&mut self) { self.0.abort(); }
}

struct Bridge<T, F> {
  watched: HashSet<Table>,
  fetch:   Arc<F>,
  state:   Arc<watch::Sender<ViewState<T>>>,
  started: Arc<AtomicU64>,
}

impl<T, F, Fut> Bridge<T, F>
where
  T: Clone + Send + Sync + 'static,
  F: Fn() -> Fut + Send + Sync + 'static,
  Fut: Future<Output = Result<T>> + Send + 'static,
{
  async fn run(self, mut feed: ChangeFeed) {
    let mut in_flight = self.spawn_fetch();

    loop {
      match feed.recv().await {
        Ok(event) if self.watched.contains(&event.table) => {
          tracing::trace!(table = event.table.as_str(), row = %event.row_id, "refetching view");
        }
        Ok(_) => continue,
        Err(RecvError::Lagged(missed)) => {
          tracing::warn!(missed, "change feed lagged; refetching view");
        }
        Err(RecvError::Closed) => break,
      }
      // Replacing the guard aborts the superseded fetch.
      in_flight = self.spawn_fetch();
    }

    let _ = (&mut in_flight.0).await;
  }

  fn spawn_fetch(&self) -> AbortOnDrop {
    let generation = self.started.fetch_add(1, Ordering::SeqCst) + 1;
    let fetch = self.fetch.clone();
    let state = self.state.clone();

    AbortOnDrop(tokio::spawn(async move {
      let outcome = fetch().await;
      if let Err(e) = &outcome {
        tracing::warn!(generation, error = %e, "view fetch failed");
      }
      state.send_if_modified(|s| {
        if generation <= s.generation {
          return false;
        }
        s.generation = generation;
        match outcome {
          Ok(data) => {
            s.data = Some(data);
            s.error = None;
          }
          Err(e) => s.error = Some(e.to_string()),
        }
        true
      });
    }))
  }
}
