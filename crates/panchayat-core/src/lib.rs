//! Core types and trait definitions for the Panchayat citizen-services portal.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! hosted row store, the object store and the realtime feed are reached
//! through the traits in [`store`]; everything else depends on this crate.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod announcement;
pub mod complaint;
pub mod document;
pub mod error;
pub mod realtime;
pub mod staff;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};
