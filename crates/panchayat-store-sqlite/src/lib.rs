//! SQLite backend for the Panchayat portal.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every successful mutation is echoed on
//! a [`tokio::sync::broadcast`] change feed. A directory-backed
//! [`FsObjectStore`] covers the object-store boundary.

mod encode;
mod objects;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use objects::FsObjectStore;
pub use store::SqliteStore;
