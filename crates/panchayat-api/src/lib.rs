//! The portal's data-access layer.
//!
//! One controller per entity family, each generic over a
//! [`PortalStore`](panchayat_core::store::PortalStore) handed in at
//! construction. Controllers turn raw store rows into view models, enforce
//! the document workflow, and report every outcome through a
//! [`Notifier`]. [`realtime::LiveView`] keeps a fetched view current by
//! refetching on change events.
//!
//! ```rust,ignore
//! let store = Arc::new(SqliteStore::open("portal.db").await?);
//! let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
//! let documents = DocumentController::new(store.clone(), notifier.clone());
//! let pending = documents.list(&DocumentFilter::default()).await?;
//! ```

pub mod announcements;
pub mod complaints;
pub mod documents;
pub mod error;
pub mod normalize;
pub mod notify;
pub mod realtime;
pub mod staff;
pub mod storage;

#[cfg(test)]
mod testing;

pub use announcements::AnnouncementController;
pub use complaints::ComplaintController;
pub use documents::{DocumentController, TransitionMode};
pub use error::{PortalError, RemovalStep, Result};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use realtime::{LiveView, ViewState};
pub use staff::StaffController;
pub use storage::{FileUpload, StorageController};
