//! JSON REST and server-push API for fieldrelay.
//!
//! Exposes an axum [`Router`] backed by a shared [`Relay`]. CORS, tracing
//! and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", fieldrelay_api::api_router(relay.clone()))
//! ```

pub mod coordinates;
pub mod error;
pub mod health;
pub mod notifications;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, patch, post},
};
use fieldrelay_core::Relay;

pub use error::ApiError;

/// Build a fully-materialised API router over `relay`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router(relay: Arc<Relay>) -> Router<()> {
  Router::new()
    // Liveness
    .route("/health", get(health::health))
    .route("/test", get(health::test))
    // Coordinates
    .route("/receive-coordinates", post(coordinates::receive))
    .route("/get-coordinates", get(coordinates::latest))
    .route("/get-coordinates/{farmer_id}", get(coordinates::by_farmer))
    .route("/get-all-coordinates", get(coordinates::all))
    .route("/clear-coordinates", delete(coordinates::clear))
    // Notifications
    .route("/visit-request", post(notifications::create))
    .route("/notifications", get(notifications::list))
    .route("/notifications/stream", get(notifications::stream))
    .route("/notifications/{id}", patch(notifications::update))
    .with_state(relay)
}

// ─── Integration tests ────────────────────────────────────────────────────────
