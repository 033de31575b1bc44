//! Periodic self-ping that keeps free-tier hosts from idling the service.
//!
//! Every `interval` the scheduler sends `GET {base_url}/api/health`. The
//! outcome is logged and otherwise ignored; nothing is retried. The task
//! runs until its [`CancellationToken`] is cancelled.

use std::time::Duration;

use anyhow::Context as _;
use chrono::Utc;
use reqwest::{Client, StatusCode, Url};
use tokio::{
  task::JoinHandle,
  time::{Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Clone)]
pub struct KeepAliveConfig {
  /// Base URL of this service, without a trailing slash.
  pub base_url: String,
  pub interval: Duration,
  /// Upper bound on a single ping.
  pub timeout:  Duration,
}

/// Transport selected from the base URL scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
  Http,
  Https,
}

/// Result of a single ping.
#[derive(Debug)]
pub enum PingOutcome {
  /// The server answered, with any status.
  Reached(StatusCode),
  Failed(String),
  /// The base URL is not `http` or `https`; nothing was sent.
  Skipped,
}

#[derive(Debug, Clone)]
pub struct KeepAlive {
  client: Client,
  config: KeepAliveConfig,
}

impl KeepAlive {
  pub fn new(config: KeepAliveConfig) -> anyhow::Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build keep-alive HTTP client")?;
    Ok(Self { client, config })
  }

  /// The health URL and the transport it needs, if the scheme is supported.
  pub fn target(&self) -> Option<(Url, Transport)> {
    let url = Url::parse(&format!("{}{HEALTH_PATH}", self.config.base_url)).ok()?;
    let transport = match url.scheme() {
      "http" => Transport::Http,
      "https" => Transport::Https,
      _ => return None,
    };
    Some((url, transport))
  }

  /// Send one ping and log the outcome.
  pub async fn ping(&self) -> PingOutcome {
    let Some((url, transport)) = self.target() else {
      tracing::warn!(
        base_url = %self.config.base_url,
        "keep-alive ping skipped: base URL is not http or https"
      );
      return PingOutcome::Skipped;
    };

    match self.client.get(url).send().await {
      Ok(resp) => {
        let status = resp.status();
        tracing::info!(status = status.as_u16(), ?transport, "keep-alive ping successful");
        PingOutcome::Reached(status)
      }
      Err(e) => {
        tracing::warn!(error = %e, ?transport, "keep-alive ping failed");
        PingOutcome::Failed(e.to_string())
      }
    }
  }

  /// Ping every interval until `cancel` fires. The first ping happens one
  /// interval after start.
  pub async fn run(self, cancel: CancellationToken) {
    let interval = self.config.interval;
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    tracing::info!(
      every_secs = interval.as_secs(),
      target = %self.config.base_url,
      "keep-alive scheduler started"
    );
    loop {
      tokio::select! {
        _ = cancel.cancelled() => break,
        _ = ticker.tick() => {
          tracing::info!(at = %Utc::now().to_rfc3339(), "running keep-alive ping");
          tokio::select! {
            _ = cancel.cancelled() => break,
            _ = self.ping() => {}
          }
        }
      }
    }
    tracing::info!("keep-alive scheduler stopped");
  }
}

/// Spawn [`KeepAlive::run`] on the current runtime.
pub fn spawn(keepalive: KeepAlive, cancel: CancellationToken) -> JoinHandle<()> {
  tokio::spawn(keepalive.run(cancel))
}
