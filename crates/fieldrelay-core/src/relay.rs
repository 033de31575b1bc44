//! The application-state object shared by every request handler.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::{
  Result,
  coordinate::{CoordinateStore, CoordinateSubmission, NewSubmission},
  notification::{Notification, NotificationStatus, NotificationStore, VisitRequest},
  subscriber::{SubscriberRegistry, Subscription},
};

/// Owns all process-wide state: both stores and the subscriber registry.
///
/// Each store sits behind its own lock. Every operation runs to completion
/// under that lock and never awaits while holding it. Notification
/// mutations broadcast before releasing the lock, so subscribers observe
/// events in exactly the order the store changed.
#[derive(Debug)]
pub struct Relay {
  coordinates:   Mutex<CoordinateStore>,
  notifications: Mutex<NotificationStore>,
  subscribers:   SubscriberRegistry,
  started_at:    Instant,
}

impl Default for Relay {
  fn default() -> Self { Self::new() }
}

impl Relay {
  pub fn new() -> Self {
    Self {
      coordinates:   Mutex::new(CoordinateStore::new()),
      notifications: Mutex::new(NotificationStore::new()),
      subscribers:   SubscriberRegistry::new(),
      started_at:    Instant::now(),
    }
  }

  /// Time since this relay was constructed.
  pub fn uptime(&self) -> Duration { self.started_at.elapsed() }

  // ── Coordinates ───────────────────────────────────────────────────────

  pub fn receive_coordinates(&self, input: NewSubmission) -> Result<CoordinateSubmission> {
    self.coordinates.lock().receive(input)
  }

  pub fn coordinates_for_farmer(&self, farmer_id: &str) -> Result<Vec<CoordinateSubmission>> {
    self.coordinates.lock().get_by_farmer(farmer_id)
  }

  pub fn latest_coordinates(&self) -> Result<CoordinateSubmission> {
    self.coordinates.lock().get_latest()
  }

  pub fn all_coordinates(&self) -> Result<Vec<CoordinateSubmission>> {
    self.coordinates.lock().get_all()
  }

  pub fn clear_coordinates(&self) -> usize { self.coordinates.lock().clear() }

  pub fn coordinate_count(&self) -> usize { self.coordinates.lock().len() }

  // ── Notifications ─────────────────────────────────────────────────────

  /// Store a new visit request and push it to every subscriber.
  pub fn create_notification(&self, request: VisitRequest) -> Result<Notification> {
    let mut store = self.notifications.lock();
    let notification = store.create(request)?;
    self.publish(&notification);
    Ok(notification)
  }

  /// Whether a notification with `id` exists. Notifications are never
  /// removed, so a `true` answer stays true.
  pub fn has_notification(&self, id: Uuid) -> bool {
    self.notifications.lock().contains(id)
  }

  pub fn notifications(&self) -> Vec<Notification> {
    self.notifications.lock().list_all()
  }

  /// Change the status of `id` and push the updated record.
  pub fn update_notification_status(
    &self,
    id: Uuid,
    status: NotificationStatus,
  ) -> Result<Notification> {
    let mut store = self.notifications.lock();
    let notification = store.update_status(id, status)?;
    self.publish(&notification);
    Ok(notification)
  }

  /// Push `notification` to subscribers. The store has already changed, so
  /// a failure here is logged and never reported to the caller.
  fn publish(&self, notification: &Notification) {
    match self.subscribers.broadcast(notification) {
      Ok(delivered) => tracing::debug!(
        notification = %notification.id,
        status = %notification.status,
        delivered,
        "notification broadcast"
      ),
      Err(e) => tracing::warn!(
        notification = %notification.id,
        error = %e,
        "notification broadcast failed"
      ),
    }
  }

  // ── Subscribers ───────────────────────────────────────────────────────

  pub fn subscribe(&self) -> Subscription { self.subscribers.subscribe() }

  pub fn subscriber_count(&self) -> usize { self.subscribers.len() }

  /// End every open push stream. Used on shutdown.
  pub fn disconnect_subscribers(&self) -> usize { self.subscribers.close_all() }
}
