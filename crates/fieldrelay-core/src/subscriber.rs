//! Registry of open push connections and best-effort broadcast.
//!
//! Each subscriber owns one unbounded channel. [`SubscriberRegistry::broadcast`]
//! serializes an event once and pushes the resulting frame into every
//! channel registered at that moment. Delivery is at-most-once: there is no
//! acknowledgment, no retry, and no replay for subscribers that arrive later.

use std::{
  pin::Pin,
  sync::Arc,
  task::{Context, Poll},
};

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::Stream;
use uuid::Uuid;

use crate::Result;

/// One serialized event, shared by every subscriber it is sent to.
pub type Frame = Arc<str>;

#[derive(Debug)]
struct Subscriber {
  id:     Uuid,
  sender: mpsc::UnboundedSender<Frame>,
}

/// Shared membership list of open push connections.
///
/// Cheap to clone; clones share the same list.
#[derive(Debug, Clone, Default)]
pub struct SubscriberRegistry {
  subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl SubscriberRegistry {
  pub fn new() -> Self { Self::default() }

  /// Register a new subscriber and hand back its receiving end.
  pub fn subscribe(&self) -> Subscription {
    let (sender, receiver) = mpsc::unbounded_channel();
    let id = Uuid::now_v7();
    self.subscribers.lock().push(Subscriber { id, sender });
    tracing::debug!(subscriber = %id, "subscriber registered");
    Subscription {
      id,
      receiver,
      registry: self.clone(),
    }
  }

  /// Remove `id` from the registry. Returns `false` if it was not present.
  pub fn unsubscribe(&self, id: Uuid) -> bool {
    let mut subscribers = self.subscribers.lock();
    let before = subscribers.len();
    subscribers.retain(|s| s.id != id);
    let removed = subscribers.len() != before;
    if removed {
      tracing::debug!(subscriber = %id, "subscriber removed");
    }
    removed
  }

  /// Send `event` as JSON to every current subscriber.
  ///
  /// Works on a snapshot of the membership list. A subscriber whose channel
  /// is closed is dropped from the registry; the others still receive the
  /// frame. Returns the number of subscribers the frame was delivered to.
  pub fn broadcast<T: Serialize>(&self, event: &T) -> Result<usize> {
    let frame: Frame = serde_json::to_string(event)?.into();
    let snapshot: Vec<(Uuid, mpsc::UnboundedSender<Frame>)> = self
      .subscribers
      .lock()
      .iter()
      .map(|s| (s.id, s.sender.clone()))
      .collect();

    let mut delivered = 0;
    let mut dead = Vec::new();
    for (id, sender) in snapshot {
      match sender.send(Arc::clone(&frame)) {
        Ok(()) => delivered += 1,
        Err(_) => dead.push(id),
      }
    }

    if !dead.is_empty() {
      tracing::debug!(count = dead.len(), "dropping closed subscribers");
      self.subscribers.lock().retain(|s| !dead.contains(&s.id));
    }
    Ok(delivered)
  }

  /// Drop every subscriber, ending their streams. Returns how many there
  /// were.
  pub fn close_all(&self) -> usize {
    let mut subscribers = self.subscribers.lock();
    let count = subscribers.len();
    subscribers.clear();
    count
  }

  pub fn len(&self) -> usize { self.subscribers.lock().len() }

  pub fn is_empty(&self) -> bool { self.subscribers.lock().is_empty() }
}

/// The receiving half of a registered subscriber.
///
/// Yields frames as a [`Stream`]. The stream ends once the registry drops
/// the subscriber. Dropping the `Subscription` deregisters it.
#[derive(Debug)]
pub struct Subscription {
  id:       Uuid,
  receiver: mpsc::UnboundedReceiver<Frame>,
  registry: SubscriberRegistry,
}

impl Subscription {
  pub fn id(&self) -> Uuid { self.id }

  /// Wait for the next frame. `None` once the registry has closed us.
  pub async fn recv(&mut self) -> Option<Frame> { self.receiver.recv().await }

  /// Take a frame if one is already queued.
  pub fn try_recv(&mut self) -> Option<Frame> { self.receiver.try_recv().ok() }
}

impl Stream for Subscription {
  type Item = Frame;

  fn poll_next(
    mut self: Pin<&mut Self>,
    cx: &mut Context<'_>,
  ) -> Poll<Option<Self::Item>> {
    self.receiver.poll_recv(cx)
  }
}

impl Drop for Subscription {
  fn drop(&mut self) { self.registry.unsubscribe(self.id); }
}
