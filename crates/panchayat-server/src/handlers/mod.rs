//! Route handlers, one module per resource.

pub mod announcements;
pub mod complaints;
pub mod documents;
pub mod staff;
pub mod uploads;

use axum::Json;
use serde_json::{Value, json};

/// Liveness probe.
pub async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }
