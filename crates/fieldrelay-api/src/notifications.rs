//! Handlers for visit requests and the notification push stream.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/visit-request` | Body: [`VisitRequest`]; returns 201 + id |
//! | `GET`   | `/notifications` | Every notification, oldest first |
//! | `PATCH` | `/notifications/{id}` | Body: `{"status":"..."}` |
//! | `GET`   | `/notifications/stream` | `text/event-stream`, one frame per create/update |

use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::{
    IntoResponse,
    sse::{Event, KeepAlive, Sse},
  },
};
use fieldrelay_core::{
  Relay,
  notification::{Notification, VisitRequest},
};
use serde::{Deserialize, Serialize};
use tokio_stream::{Stream, StreamExt as _};
use uuid::Uuid;

use crate::error::ApiError;

const NOT_FOUND: &str = "Notification not found";

/// Interval between SSE comment frames on an idle stream.
const STREAM_KEEP_ALIVE: Duration = Duration::from_secs(15);

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
  pub message:    &'static str,
  pub request_id: Uuid,
}

/// `POST /visit-request` — returns 201 + the new notification id.
pub async fn create(
  State(relay): State<Arc<Relay>>,
  body: Result<Json<VisitRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
  let Json(request) = body?;
  let notification = relay.create_notification(request)?;
  tracing::info!(
    id = %notification.id,
    farmer_id = %notification.farmer_id,
    village = %notification.village,
    "new visit request"
  );
  Ok((
    StatusCode::CREATED,
    Json(Submitted {
      message:    "Visit request submitted successfully",
      request_id: notification.id,
    }),
  ))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /notifications`
pub async fn list(State(relay): State<Arc<Relay>>) -> Json<Vec<Notification>> {
  Json(relay.notifications())
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Updated {
  pub message:      &'static str,
  pub notification: Notification,
}

/// `PATCH /notifications/{id}` — body: `{"status":"approved"}`
///
/// The id is resolved before the body is looked at, so an unknown id is
/// always 404.
pub async fn update(
  State(relay): State<Arc<Relay>>,
  Path(id): Path<String>,
  body: Result<Json<UpdateBody>, JsonRejection>,
) -> Result<Json<Updated>, ApiError> {
  // Ids are always UUIDs, so anything else cannot match a record.
  let id = Uuid::parse_str(&id)
    .ok()
    .filter(|id| relay.has_notification(*id))
    .ok_or_else(|| ApiError::NotFound(NOT_FOUND.to_owned()))?;

  let Json(body) = body?;
  let status = body
    .status
    .filter(|s| !s.is_empty())
    .ok_or_else(|| ApiError::BadRequest("Missing required field: status".to_owned()))?;

  let notification = relay.update_notification_status(id, status.into())?;
  tracing::info!(id = %notification.id, status = %notification.status, "notification updated");
  Ok(Json(Updated {
    message: "Notification updated successfully",
    notification,
  }))
}

// ─── Stream ──────────────────────────────────────────────────────────────────

/// `GET /notifications/stream`
///
/// Registers a subscriber for the lifetime of the response. When the client
/// disconnects axum drops the stream, which deregisters the subscriber.
pub async fn stream(
  State(relay): State<Arc<Relay>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  let subscription = relay.subscribe();
  tracing::info!(
    subscriber = %subscription.id(),
    open = relay.subscriber_count(),
    "push subscriber connected"
  );
  let events = subscription.map(|frame| Ok(Event::default().data(frame)));

  Sse::new(events).keep_alive(
    KeepAlive::new()
      .interval(STREAM_KEEP_ALIVE)
      .text("keep-alive"),
  )
}
