//! Farmer coordinate submissions and the append-only store that holds them.
//!
//! A submission is an immutable polygon report: at least three points plus
//! the area the farmer computed for it. Points are kept exactly as the
//! client sent them, extra fields included. Submissions are never edited;
//! the only way to remove one is to clear the whole store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Minimum number of points a polygon must carry.
pub const MIN_POINTS: usize = 3;

pub(crate) const MISSING_FIELDS: &str =
  "Missing required fields: farmerId, coordinates, or area";
pub(crate) const TOO_FEW_POINTS: &str =
  "Coordinates must be an array with at least 3 points";
pub(crate) const NONE_FOR_FARMER: &str =
  "No coordinates found for this farmer ID";
pub(crate) const NONE_YET: &str = "No coordinates received yet";

// ─── Types ───────────────────────────────────────────────────────────────────

/// A stored polygon report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateSubmission {
  pub farmer_id:   String,
  /// Polygon vertices, normally `{lat, lng}` objects. Not checked beyond
  /// their count.
  pub coordinates: Vec<Value>,
  pub area:        f64,
  /// Set by the store when the submission is accepted.
  pub received_at: DateTime<Utc>,
}

/// Unvalidated input for [`CoordinateStore::receive`].
///
/// Every field is optional so that presence can be checked here rather than
/// by the deserializer. `coordinates` stays a raw JSON value until it has
/// been shown to be an array of at least [`MIN_POINTS`] elements.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
  pub farmer_id:   Option<String>,
  pub coordinates: Option<Value>,
  pub area:        Option<f64>,
}

impl NewSubmission {
  /// Check presence and shape, returning the parts of a submission.
  ///
  /// An empty `farmerId` and an `area` of zero count as absent.
  fn validate(self) -> Result<(String, Vec<Value>, f64)> {
    let (Some(farmer_id), Some(coordinates), Some(area)) =
      (self.farmer_id, self.coordinates, self.area)
    else {
      return Err(Error::Validation(MISSING_FIELDS.to_owned()));
    };
    if farmer_id.is_empty() || area == 0.0 {
      return Err(Error::Validation(MISSING_FIELDS.to_owned()));
    }

    match coordinates {
      Value::Array(points) if points.len() >= MIN_POINTS => Ok((farmer_id, points, area)),
      _ => Err(Error::Validation(TOO_FEW_POINTS.to_owned())),
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Append-only, insertion-ordered list of submissions.
///
/// Grows without bound; nothing is evicted until [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct CoordinateStore {
  entries: Vec<CoordinateSubmission>,
}

impl CoordinateStore {
  pub fn new() -> Self { Self::default() }

  /// Validate `input` and append it with a server-assigned `received_at`.
  pub fn receive(&mut self, input: NewSubmission) -> Result<CoordinateSubmission> {
    let (farmer_id, coordinates, area) = input.validate()?;
    let entry = CoordinateSubmission {
      farmer_id,
      coordinates,
      area,
      received_at: Utc::now(),
    };
    self.entries.push(entry.clone());
    Ok(entry)
  }

  /// All submissions for `farmer_id`, oldest first.
  pub fn get_by_farmer(&self, farmer_id: &str) -> Result<Vec<CoordinateSubmission>> {
    let matches: Vec<_> = self
      .entries
      .iter()
      .filter(|e| e.farmer_id == farmer_id)
      .cloned()
      .collect();
    if matches.is_empty() {
      return Err(Error::NotFound(NONE_FOR_FARMER.to_owned()));
    }
    Ok(matches)
  }

  /// The most recently received submission across all farmers.
  pub fn get_latest(&self) -> Result<CoordinateSubmission> {
    self
      .entries
      .last()
      .cloned()
      .ok_or_else(|| Error::NotFound(NONE_YET.to_owned()))
  }

  pub fn get_all(&self) -> Result<Vec<CoordinateSubmission>> {
    if self.entries.is_empty() {
      return Err(Error::NotFound(NONE_YET.to_owned()));
    }
    Ok(self.entries.clone())
  }

  /// Drop every submission and return how many there were.
  pub fn clear(&mut self) -> usize {
    let count = self.entries.len();
    self.entries.clear();
    count
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
