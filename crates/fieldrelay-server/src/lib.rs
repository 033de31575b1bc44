//! HTTP server assembly for fieldrelay.
//!
//! Wraps [`fieldrelay_api::api_router`] with CORS and request tracing, and
//! provides the configuration and keep-alive pieces the binary needs.

pub mod keepalive;
pub mod settings;

use std::sync::Arc;

use anyhow::Context as _;
use axum::{
  Router,
  http::{HeaderValue, Method},
};
use fieldrelay_core::Relay;
use tower_http::{
  cors::{AllowHeaders, AllowOrigin, CorsLayer},
  trace::TraceLayer,
};

pub use settings::ServerConfig;

/// Credentialed CORS restricted to `origins`. A trailing `/` on an origin is
/// ignored since browsers never send one.
pub fn cors_layer(origins: &[String]) -> anyhow::Result<CorsLayer> {
  let origins = origins
    .iter()
    .map(|o| {
      HeaderValue::from_str(o.trim_end_matches('/'))
        .with_context(|| format!("invalid CORS origin {o:?}"))
    })
    .collect::<anyhow::Result<Vec<_>>>()?;

  Ok(
    CorsLayer::new()
      .allow_origin(AllowOrigin::list(origins))
      .allow_credentials(true)
      .allow_methods([
        Method::GET,
        Method::HEAD,
        Method::POST,
        Method::PUT,
        Method::PATCH,
        Method::DELETE,
      ])
      .allow_headers(AllowHeaders::mirror_request()),
  )
}

/// The full application: `/api/*` routes behind CORS and tracing.
pub fn app(relay: Arc<Relay>, config: &ServerConfig) -> anyhow::Result<Router> {
  Ok(
    Router::new()
      .nest("/api", fieldrelay_api::api_router(relay))
      .layer(cors_layer(&config.cors_origins)?)
      .layer(TraceLayer::new_for_http()),
  )
}
