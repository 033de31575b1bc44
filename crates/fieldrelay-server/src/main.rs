//! fieldrelay server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) plus the
//! environment, then serves the relay API on `/api` until Ctrl-C or SIGTERM.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use fieldrelay_core::Relay;
use fieldrelay_server::{
  ServerConfig,
  keepalive::{self, KeepAlive},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Farmer coordinate and visit-request relay")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Disable the periodic self-ping regardless of configuration.
  #[arg(long)]
  no_keepalive: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let config = ServerConfig::load(&cli.config)?;

  let relay = Arc::new(Relay::new());
  let app = fieldrelay_server::app(relay.clone(), &config)?;

  let address = config.bind_address();
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  let base = config.base_url();
  tracing::info!("Server running on {address}");
  tracing::info!("Test endpoint: GET {base}/api/test");
  tracing::info!("Receive coordinates: POST {base}/api/receive-coordinates");
  tracing::info!("Get coordinates: GET {base}/api/get-coordinates");
  tracing::info!("Visit request endpoint: POST {base}/api/visit-request");
  tracing::info!("Notifications endpoint: GET {base}/api/notifications");
  tracing::info!("Health check endpoint: GET {base}/api/health");

  let cancel = CancellationToken::new();
  let pinger = if config.keepalive_enabled && !cli.no_keepalive {
    let keepalive = KeepAlive::new(config.keepalive())?;
    Some(keepalive::spawn(keepalive, cancel.clone()))
  } else {
    tracing::info!("keep-alive scheduler disabled");
    None
  };

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal(relay, cancel.clone()))
    .await
    .context("server error")?;

  cancel.cancel();
  if let Some(handle) = pinger {
    handle.await.context("keep-alive task panicked")?;
  }
  tracing::info!("shutdown complete");
  Ok(())
}

/// Resolve on Ctrl-C or SIGTERM, then stop background work and close push
/// streams so graceful shutdown is not held open by them.
async fn shutdown_signal(relay: Arc<Relay>, cancel: CancellationToken) {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      tracing::error!(error = %e, "failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => {
        sig.recv().await;
      }
      Err(e) => {
        tracing::error!(error = %e, "failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };
  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }

  tracing::info!("shutdown signal received");
  cancel.cancel();
  let closed = relay.disconnect_subscribers();
  tracing::info!(closed, "closed push streams");
}
