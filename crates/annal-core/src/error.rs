//! Error types for `annal-core`.

use thiserror::Error;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  #[error("archive not found: {0}")]
  ArchiveNotFound(String),

  #[error("store error: {0}")]
  Store(#[source] BoxedError),

  #[error("blob store error: {0}")]
  Blob(#[source] BoxedError),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Wrap a storage backend error.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  /// Wrap a blob backend error.
  pub fn blob(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Blob(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
