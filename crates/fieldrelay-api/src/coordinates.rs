//! Handlers for the coordinate endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/receive-coordinates` | Body: [`NewSubmission`] |
//! | `GET`    | `/get-coordinates/{farmerId}` | Every submission for one farmer |
//! | `GET`    | `/get-coordinates` | Latest submission |
//! | `GET`    | `/get-all-coordinates` | Every submission |
//! | `DELETE` | `/clear-coordinates` | Empties the store |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use fieldrelay_core::{
  Relay,
  coordinate::{CoordinateSubmission, NewSubmission},
};
use serde::Serialize;

use crate::error::ApiError;

// ─── Receive ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Received {
  pub message: &'static str,
  pub data:    CoordinateSubmission,
}

/// `POST /receive-coordinates`
pub async fn receive(
  State(relay): State<Arc<Relay>>,
  body: Result<Json<NewSubmission>, JsonRejection>,
) -> Result<Json<Received>, ApiError> {
  let Json(input) = body?;
  let data = relay.receive_coordinates(input)?;
  tracing::info!(
    farmer_id = %data.farmer_id,
    points = data.coordinates.len(),
    area = data.area,
    "received coordinates"
  );
  Ok(Json(Received {
    message: "Coordinates and area received successfully",
    data,
  }))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /get-coordinates/{farmerId}`
pub async fn by_farmer(
  State(relay): State<Arc<Relay>>,
  Path(farmer_id): Path<String>,
) -> Result<Json<Vec<CoordinateSubmission>>, ApiError> {
  if farmer_id.trim().is_empty() {
    return Err(ApiError::BadRequest("Farmer ID is required".to_owned()));
  }
  Ok(Json(relay.coordinates_for_farmer(&farmer_id)?))
}

/// `GET /get-coordinates`
pub async fn latest(
  State(relay): State<Arc<Relay>>,
) -> Result<Json<CoordinateSubmission>, ApiError> {
  Ok(Json(relay.latest_coordinates()?))
}

/// `GET /get-all-coordinates`
pub async fn all(
  State(relay): State<Arc<Relay>>,
) -> Result<Json<Vec<CoordinateSubmission>>, ApiError> {
  Ok(Json(relay.all_coordinates()?))
}

// ─── Clear ───────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct Cleared {
  pub message: String,
}

/// `DELETE /clear-coordinates`
pub async fn clear(State(relay): State<Arc<Relay>>) -> Json<Cleared> {
  let count = relay.clear_coordinates();
  tracing::info!(count, "cleared coordinates");
  Json(Cleared {
    message: format!("Cleared {count} coordinate entries"),
  })
}
