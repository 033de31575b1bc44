//! Error types for `fieldrelay-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required field was absent or malformed.
  #[error("{0}")]
  Validation(String),

  /// The store is empty or no record matched.
  #[error("{0}")]
  NotFound(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
