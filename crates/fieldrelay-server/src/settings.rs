//! Runtime configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. Built-in defaults ([`ServerConfig::default`]).
//! 2. The TOML file passed with `--config` (optional).
//! 3. `FIELDRELAY_*` environment variables, e.g. `FIELDRELAY_PORT=8080` or
//!    `FIELDRELAY_CORS_ORIGINS=https://a.example,https://b.example`.
//! 4. The platform variables `PORT` and `APP_URL`, which hosting providers
//!    set and which always win.

use std::{path::Path, time::Duration};

use anyhow::Context as _;
use config::{Config, ConfigBuilder, builder::DefaultState};
use serde::Deserialize;

use crate::keepalive::KeepAliveConfig;

/// Origins allowed to make credentialed cross-origin requests by default.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
  "http://localhost:5173",
  "http://localhost:5175",
  "https://nabard-visitor-frontend.vercel.app",
  "https://nabard-visitor-frontend-git-main-manas-chaturvedis-projects.vercel.app",
  "https://nabard-sigma.vercel.app",
];

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  /// Public base URL of this service, used as the keep-alive target.
  /// Defaults to `http://localhost:{port}`.
  pub app_url:                 Option<String>,
  pub keepalive_enabled:       bool,
  pub keepalive_interval_secs: u64,
  pub keepalive_timeout_secs:  u64,
  pub cors_origins:            Vec<String>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                    "0.0.0.0".to_owned(),
      port:                    5000,
      app_url:                 None,
      keepalive_enabled:       true,
      keepalive_interval_secs: 14 * 60,
      keepalive_timeout_secs:  30,
      cors_origins:            DEFAULT_CORS_ORIGINS.iter().map(|s| (*s).to_owned()).collect(),
    }
  }
}

impl ServerConfig {
  /// Load from `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("FIELDRELAY")
          .try_parsing(true)
          .list_separator(",")
          .with_list_parse_key("cors_origins"),
      )
      .set_override_option("port", std::env::var("PORT").ok())
      .context("invalid PORT")?
      .set_override_option("app_url", std::env::var("APP_URL").ok())
      .context("invalid APP_URL")?;
    Self::from_builder(builder)
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn bind_address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn base_url(&self) -> String {
    match &self.app_url {
      Some(url) => url.trim_end_matches('/').to_owned(),
      None => format!("http://localhost:{}", self.port),
    }
  }

  pub fn keepalive(&self) -> KeepAliveConfig {
    KeepAliveConfig {
      base_url: self.base_url(),
      interval: Duration::from_secs(self.keepalive_interval_secs),
      timeout:  Duration::from_secs(self.keepalive_timeout_secs),
    }
  }
}
