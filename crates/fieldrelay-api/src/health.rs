//! Liveness endpoints: `GET /health` and `GET /test`.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use fieldrelay_core::Relay;
use serde::Serialize;

/// Process memory as reported by the OS. Fields are `null` where the
/// platform does not expose them.
#[derive(Debug, Serialize)]
pub struct MemoryUsage {
  /// Resident set size in bytes.
  pub rss:       Option<usize>,
  /// Virtual memory size in bytes.
  pub r#virtual: Option<usize>,
}

impl MemoryUsage {
  fn current() -> Self {
    let stats = memory_stats::memory_stats();
    Self {
      rss:       stats.as_ref().map(|s| s.physical_mem),
      r#virtual: stats.as_ref().map(|s| s.virtual_mem),
    }
  }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
  pub status:       &'static str,
  pub timestamp:    DateTime<Utc>,
  /// Seconds since the relay was created.
  pub uptime:       f64,
  pub memory_usage: MemoryUsage,
}

/// `GET /health` — always 200 while the process is serving.
pub async fn health(State(relay): State<Arc<Relay>>) -> Json<Health> {
  Json(Health {
    status:       "OK",
    timestamp:    Utc::now(),
    uptime:       relay.uptime().as_secs_f64(),
    memory_usage: MemoryUsage::current(),
  })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
  pub message:             &'static str,
  pub timestamp:           DateTime<Utc>,
  pub received_data_count: usize,
}

/// `GET /test`
pub async fn test(State(relay): State<Arc<Relay>>) -> Json<TestResponse> {
  Json(TestResponse {
    message:             "Backend server running",
    timestamp:           Utc::now(),
    received_data_count: relay.coordinate_count(),
  })
}
