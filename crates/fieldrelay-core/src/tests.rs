//! Tests for the stores and the `Relay` fan-out.

use serde_json::{Value, json};
use uuid::Uuid;

use crate::{
  Error, Relay,
  coordinate::{CoordinateStore, NewSubmission},
  notification::{NotificationStatus, NotificationStore, VisitRequest, parse_preferred_date},
};

fn triangle() -> Value {
  json!([
    { "lat": 0.0, "lng": 0.0 },
    { "lat": 1.0, "lng": 0.0 },
    { "lat": 1.0, "lng": 1.0 },
  ])
}

fn submission(farmer_id: &str) -> NewSubmission {
  NewSubmission {
    farmer_id:   Some(farmer_id.to_owned()),
    coordinates: Some(triangle()),
    area:        Some(12.5),
  }
}

fn visit(farmer_id: &str) -> VisitRequest {
  VisitRequest {
    farmer_id:        Some(farmer_id.to_owned()),
    farmer_name:      Some("Asha".to_owned()),
    village:          Some("Rampur".to_owned()),
    location_details: Some("North field, near the well".to_owned()),
    preferred_date:   Some(json!("2026-11-02")),
  }
}

// ─── Coordinate store ────────────────────────────────────────────────────────

#[test]
fn receive_then_latest_returns_same_entry() {
  let mut store = CoordinateStore::new();
  let stored = store.receive(submission("F1")).unwrap();
  assert_eq!(stored.farmer_id, "F1");
  assert_eq!(stored.coordinates.len(), 3);
  assert_eq!(stored.coordinates[1], json!({ "lat": 1.0, "lng": 0.0 }));
  assert_eq!(store.get_latest().unwrap(), stored);
}

#[test]
fn latest_tracks_most_recent_across_farmers() {
  let mut store = CoordinateStore::new();
  store.receive(submission("F1")).unwrap();
  let second = store.receive(submission("F2")).unwrap();
  assert_eq!(store.get_latest().unwrap(), second);
}

#[test]
fn get_by_farmer_filters_in_insertion_order() {
  let mut store = CoordinateStore::new();
  let a = store.receive(submission("F1")).unwrap();
  store.receive(submission("F2")).unwrap();
  let b = store.receive(submission("F1")).unwrap();

  let found = store.get_by_farmer("F1").unwrap();
  assert_eq!(found, vec![a, b]);
}

#[test]
fn get_by_unknown_farmer_is_not_found() {
  let mut store = CoordinateStore::new();
  store.receive(submission("F1")).unwrap();
  for id in ["F2", "f1", ""] {
    assert!(matches!(store.get_by_farmer(id), Err(Error::NotFound(_))));
  }
}

#[test]
fn empty_store_reads_are_not_found() {
  let store = CoordinateStore::new();
  assert!(matches!(store.get_latest(), Err(Error::NotFound(_))));
  assert!(matches!(store.get_all(), Err(Error::NotFound(_))));
}

#[test]
fn clear_reports_prior_count_and_empties() {
  let mut store = CoordinateStore::new();
  for _ in 0..4 {
    store.receive(submission("F1")).unwrap();
  }
  assert_eq!(store.clear(), 4);
  assert!(store.is_empty());
  assert!(matches!(store.get_latest(), Err(Error::NotFound(_))));
  assert!(matches!(store.get_all(), Err(Error::NotFound(_))));
  assert!(matches!(store.get_by_farmer("F1"), Err(Error::NotFound(_))));
  assert_eq!(store.clear(), 0);
}

#[test]
fn fewer_than_three_points_rejected() {
  let points = triangle().as_array().unwrap().clone();
  let mut store = CoordinateStore::new();
  for n in 0..3 {
    let input = NewSubmission {
      coordinates: Some(Value::Array(points[..n].to_vec())),
      ..submission("F1")
    };
    match store.receive(input) {
      Err(Error::Validation(msg)) => assert!(msg.contains("at least 3"), "{msg}"),
      other => panic!("{n} points: expected validation error, got {other:?}"),
    }
  }
  assert!(store.is_empty());

  let input = NewSubmission {
    coordinates: Some(Value::Array(points)),
    ..submission("F1")
  };
  assert!(store.receive(input).is_ok());
}

#[test]
fn non_array_coordinates_rejected() {
  let mut store = CoordinateStore::new();
  let input = NewSubmission {
    coordinates: Some(json!({ "lat": 1, "lng": 2 })),
    ..submission("F1")
  };
  assert!(matches!(store.receive(input), Err(Error::Validation(_))));
}

#[test]
fn points_are_stored_as_sent() {
  let mut store = CoordinateStore::new();
  let points = json!([
    { "lat": 12.9, "lng": 77.5, "accuracy": 5 },
    { "lat": "12.91", "lng": "77.51" },
    { "lat": 12.92, "lng": 77.52, "source": "gps" },
  ]);
  let input = NewSubmission {
    coordinates: Some(points.clone()),
    ..submission("F1")
  };
  let stored = store.receive(input).unwrap();
  assert_eq!(Value::Array(stored.coordinates.clone()), points);
  assert_eq!(store.get_latest().unwrap().coordinates[0]["accuracy"], 5);
}

#[test]
fn missing_or_falsy_fields_rejected() {
  let mut store = CoordinateStore::new();
  let cases = [
    NewSubmission { farmer_id: None, ..submission("F1") },
    NewSubmission { farmer_id: Some(String::new()), ..submission("F1") },
    NewSubmission { coordinates: None, ..submission("F1") },
    NewSubmission { area: None, ..submission("F1") },
    NewSubmission { area: Some(0.0), ..submission("F1") },
  ];
  for input in cases {
    match store.receive(input) {
      Err(Error::Validation(msg)) => assert!(msg.starts_with("Missing required fields")),
      other => panic!("expected validation error, got {other:?}"),
    }
  }
  assert!(store.is_empty());
}

// ─── Notification store ──────────────────────────────────────────────────────

#[test]
fn create_assigns_pending_and_visit_request_type() {
  let mut store = NotificationStore::new();
  let n = store.create(visit("F1")).unwrap();
  assert_eq!(n.status, NotificationStatus::Pending);
  assert!(n.updated_at.is_none());

  let value = serde_json::to_value(&n).unwrap();
  assert_eq!(value["type"], "visit_request");
  assert_eq!(value["status"], "pending");
  assert_eq!(value["farmerName"], "Asha");
  assert!(value.get("updatedAt").is_none());
  assert_eq!(value["id"], n.id.to_string());
}

#[test]
fn create_ids_are_unique() {
  let mut store = NotificationStore::new();
  let ids: Vec<Uuid> = (0..100).map(|_| store.create(visit("F1")).unwrap().id).collect();
  let mut deduped = ids.clone();
  deduped.sort();
  deduped.dedup();
  assert_eq!(deduped.len(), ids.len());
}

#[test]
fn create_rejects_missing_fields() {
  let mut store = NotificationStore::new();
  let cases = [
    VisitRequest { farmer_id: None, ..visit("F1") },
    VisitRequest { farmer_name: Some(String::new()), ..visit("F1") },
    VisitRequest { village: None, ..visit("F1") },
    VisitRequest { location_details: None, ..visit("F1") },
    VisitRequest { preferred_date: None, ..visit("F1") },
  ];
  for request in cases {
    match store.create(request) {
      Err(Error::Validation(msg)) => assert_eq!(msg, "Missing required fields"),
      other => panic!("expected validation error, got {other:?}"),
    }
  }
  assert!(store.is_empty());
}

#[test]
fn preferred_date_formats() {
  let parse = |v: Value| parse_preferred_date(&v).map(|d| d.to_rfc3339());
  assert_eq!(parse(json!("2026-11-02")).as_deref(), Some("2026-11-02T00:00:00+00:00"));
  assert_eq!(
    parse(json!("2026-11-02T10:30:00+05:30")).as_deref(),
    Some("2026-11-02T05:00:00+00:00")
  );
  // HTML datetime-local
  assert_eq!(parse(json!("2026-11-02T09:00")).as_deref(), Some("2026-11-02T09:00:00+00:00"));
  assert_eq!(parse(json!("2026-11-02 09:00:00")).as_deref(), Some("2026-11-02T09:00:00+00:00"));
  assert_eq!(parse(json!(1793577600000_i64)).as_deref(), Some("2026-11-02T00:00:00+00:00"));
  assert_eq!(parse(json!("next tuesday")), None);
  assert_eq!(parse(json!(true)), None);
}

#[test]
fn unparseable_preferred_date_is_stored_as_null() {
  let mut store = NotificationStore::new();
  let request = VisitRequest {
    preferred_date: Some(json!("Nov 2, 2026")),
    ..visit("F1")
  };
  let n = store.create(request).unwrap();
  assert!(n.preferred_date.is_none());
  let value = serde_json::to_value(&n).unwrap();
  assert!(value["preferredDate"].is_null());
}

#[test]
fn falsy_preferred_date_counts_as_missing() {
  let mut store = NotificationStore::new();
  for raw in [json!(null), json!(""), json!(0), json!(false)] {
    let request = VisitRequest {
      preferred_date: Some(raw),
      ..visit("F1")
    };
    assert!(matches!(store.create(request), Err(Error::Validation(_))));
  }
}

#[test]
fn update_status_touches_only_status_and_updated_at() {
  let mut store = NotificationStore::new();
  let original = store.create(visit("F1")).unwrap();
  let updated = store
    .update_status(original.id, NotificationStatus::from("approved"))
    .unwrap();

  assert_eq!(updated.status.as_str(), "approved");
  assert!(updated.updated_at.is_some());

  let mut before = serde_json::to_value(&original).unwrap();
  let mut after = serde_json::to_value(&updated).unwrap();
  for v in [&mut before, &mut after] {
    let obj = v.as_object_mut().unwrap();
    obj.remove("status");
    obj.remove("updatedAt");
  }
  assert_eq!(before, after);
  assert_eq!(store.list_all(), vec![updated]);
}

#[test]
fn update_unknown_id_is_not_found() {
  let mut store = NotificationStore::new();
  store.create(visit("F1")).unwrap();
  match store.update_status(Uuid::now_v7(), "approved".into()) {
    Err(Error::NotFound(msg)) => assert_eq!(msg, "Notification not found"),
    other => panic!("expected not found, got {other:?}"),
  }
}

#[test]
fn pending_status_round_trips_as_enum() {
  let status: NotificationStatus = serde_json::from_value(json!("pending")).unwrap();
  assert_eq!(status, NotificationStatus::Pending);
  let status: NotificationStatus = serde_json::from_value(json!("rejected")).unwrap();
  assert_eq!(status, NotificationStatus::Other("rejected".to_owned()));
}

// ─── Relay fan-out ───────────────────────────────────────────────────────────

#[test]
fn subscriber_before_event_gets_exactly_one_frame() {
  let relay = Relay::new();
  let mut sub = relay.subscribe();
  let n = relay.create_notification(visit("F1")).unwrap();

  let frame = sub.try_recv().expect("one frame");
  let pushed: Value = serde_json::from_str(&frame).unwrap();
  assert_eq!(pushed, serde_json::to_value(&n).unwrap());
  assert!(sub.try_recv().is_none());
}

#[test]
fn subscriber_after_event_gets_nothing() {
  let relay = Relay::new();
  relay.create_notification(visit("F1")).unwrap();
  let mut late = relay.subscribe();
  assert!(late.try_recv().is_none());
}

#[test]
fn updates_are_broadcast_in_mutation_order() {
  let relay = Relay::new();
  let mut sub = relay.subscribe();
  let n = relay.create_notification(visit("F1")).unwrap();
  relay.update_notification_status(n.id, "approved".into()).unwrap();
  relay.update_notification_status(n.id, "completed".into()).unwrap();

  let statuses: Vec<String> = std::iter::from_fn(|| sub.try_recv())
    .map(|f| serde_json::from_str::<Value>(&f).unwrap()["status"].as_str().unwrap().to_owned())
    .collect();
  assert_eq!(statuses, ["pending", "approved", "completed"]);
}

#[test]
fn failed_update_broadcasts_nothing() {
  let relay = Relay::new();
  let mut sub = relay.subscribe();
  assert!(relay.update_notification_status(Uuid::now_v7(), "approved".into()).is_err());
  assert!(relay.create_notification(VisitRequest::default()).is_err());
  assert!(sub.try_recv().is_none());
}

#[test]
fn mutations_return_their_record_whatever_happens_to_delivery() {
  let relay = Relay::new();
  let gone = relay.subscribe();
  let mut kept = relay.subscribe();
  relay.disconnect_subscribers();
  drop(gone);
  assert!(kept.try_recv().is_none());

  let n = relay.create_notification(visit("F1")).unwrap();
  assert!(relay.has_notification(n.id));
  let updated = relay.update_notification_status(n.id, "approved".into()).unwrap();
  assert_eq!(updated.status.as_str(), "approved");
  assert_eq!(relay.notifications(), vec![updated]);
  assert!(!relay.has_notification(Uuid::now_v7()));
}

#[test]
fn coordinates_are_not_broadcast() {
  let relay = Relay::new();
  let mut sub = relay.subscribe();
  relay.receive_coordinates(submission("F1")).unwrap();
  assert!(sub.try_recv().is_none());
  assert_eq!(relay.coordinate_count(), 1);
}

#[test]
fn disconnect_subscribers_empties_registry() {
  let relay = Relay::new();
  let _a = relay.subscribe();
  let _b = relay.subscribe();
  assert_eq!(relay.subscriber_count(), 2);
  assert_eq!(relay.disconnect_subscribers(), 2);
  assert_eq!(relay.subscriber_count(), 0);
}
