//! Visit-request notifications.
//!
//! A notification is created when a farmer asks for a field visit. Its
//! `status` starts as `pending` and can later be set to any caller-supplied
//! string; nothing else about the record ever changes.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{Error, Result};

pub(crate) const MISSING_FIELDS: &str = "Missing required fields";
pub(crate) const NOT_FOUND: &str = "Notification not found";

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status of a notification.
///
/// Only `pending` has meaning to the server. Any other value is stored and
/// echoed back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationStatus {
  Pending,
  Other(String),
}

impl NotificationStatus {
  pub fn as_str(&self) -> &str {
    match self {
      Self::Pending => "pending",
      Self::Other(s) => s,
    }
  }
}

impl From<String> for NotificationStatus {
  fn from(s: String) -> Self {
    if s == "pending" { Self::Pending } else { Self::Other(s) }
  }
}

impl From<&str> for NotificationStatus {
  fn from(s: &str) -> Self { Self::from(s.to_owned()) }
}

impl From<NotificationStatus> for String {
  fn from(status: NotificationStatus) -> Self {
    match status {
      NotificationStatus::Pending => "pending".to_owned(),
      NotificationStatus::Other(s) => s,
    }
  }
}

impl std::fmt::Display for NotificationStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The `type` discriminant carried on every notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  VisitRequest,
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
  /// UUIDv7; time-ordered and unique within the process.
  pub id:               Uuid,
  pub farmer_id:        String,
  pub farmer_name:      String,
  pub village:          String,
  pub location_details: String,
  /// `None` (serialized as `null`) when the submitted value was not a
  /// recognisable date.
  pub preferred_date:   Option<DateTime<Utc>>,
  pub status:           NotificationStatus,
  pub created_at:       DateTime<Utc>,
  /// Absent until the first status change.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at:       Option<DateTime<Utc>>,
  #[serde(rename = "type")]
  pub kind:             NotificationKind,
}

/// Unvalidated body of a visit request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRequest {
  pub farmer_id:        Option<String>,
  pub farmer_name:      Option<String>,
  pub village:          Option<String>,
  pub location_details: Option<String>,
  /// A date string or epoch milliseconds.
  pub preferred_date:   Option<Value>,
}

/// Local date-time layouts tried after RFC 3339. They carry no offset and
/// are read as UTC.
const NAIVE_LAYOUTS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
];

/// Best-effort interpretation of a `preferredDate` value.
///
/// Strings may be RFC 3339, a zone-less date-time such as the
/// `2026-11-02T09:00` an HTML `datetime-local` input sends, or a bare
/// `YYYY-MM-DD` (midnight UTC). Numbers are epoch milliseconds. Anything
/// else yields `None`; it is never an error.
pub fn parse_preferred_date(raw: &Value) -> Option<DateTime<Utc>> {
  match raw {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().map(|f| f as i64))
      .and_then(DateTime::from_timestamp_millis),
    Value::String(s) => parse_date_str(s.trim()),
    _ => None,
  }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
    return Some(ts.with_timezone(&Utc));
  }
  if let Some(dt) = NAIVE_LAYOUTS
    .iter()
    .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
  {
    return Some(dt.and_utc());
  }
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|dt| dt.and_utc())
}

fn required(field: Option<String>) -> Result<String> {
  field
    .filter(|s| !s.is_empty())
    .ok_or_else(|| Error::Validation(MISSING_FIELDS.to_owned()))
}

/// Presence as the web client understands it: `null`, `""`, `0` and `false`
/// count as absent.
fn required_value(field: Option<Value>) -> Result<Value> {
  let present = match &field {
    None | Some(Value::Null) | Some(Value::Bool(false)) => false,
    Some(Value::String(s)) => !s.is_empty(),
    Some(Value::Number(n)) => n.as_f64() != Some(0.0),
    Some(_) => true,
  };
  field
    .filter(|_| present)
    .ok_or_else(|| Error::Validation(MISSING_FIELDS.to_owned()))
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Insertion-ordered list of notifications. Records are never removed.
#[derive(Debug, Default)]
pub struct NotificationStore {
  entries: Vec<Notification>,
}

impl NotificationStore {
  pub fn new() -> Self { Self::default() }

  /// Validate `request` and append a new `pending` notification.
  pub fn create(&mut self, request: VisitRequest) -> Result<Notification> {
    let farmer_id = required(request.farmer_id)?;
    let farmer_name = required(request.farmer_name)?;
    let village = required(request.village)?;
    let location_details = required(request.location_details)?;
    let preferred_date = parse_preferred_date(&required_value(request.preferred_date)?);

    let notification = Notification {
      id: Uuid::now_v7(),
      farmer_id,
      farmer_name,
      village,
      location_details,
      preferred_date,
      status: NotificationStatus::Pending,
      created_at: Utc::now(),
      updated_at: None,
      kind: NotificationKind::VisitRequest,
    };
    self.entries.push(notification.clone());
    Ok(notification)
  }

  pub fn list_all(&self) -> Vec<Notification> { self.entries.clone() }

  pub fn contains(&self, id: Uuid) -> bool { self.entries.iter().any(|n| n.id == id) }

  /// Overwrite the status of `id` and stamp `updated_at`.
  pub fn update_status(
    &mut self,
    id: Uuid,
    status: NotificationStatus,
  ) -> Result<Notification> {
    let notification = self
      .entries
      .iter_mut()
      .find(|n| n.id == id)
      .ok_or_else(|| Error::NotFound(NOT_FOUND.to_owned()))?;
    notification.status = status;
    notification.updated_at = Some(Utc::now());
    Ok(notification.clone())
  }

  pub fn len(&self) -> usize { self.entries.len() }

  pub fn is_empty(&self) -> bool { self.entries.is_empty() }
}
