//! Error type for `annal-blob-fs`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// A storage path that escapes the root (absolute, empty, or `..`).
  #[error("invalid blob path: {0:?}")]
  InvalidPath(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
