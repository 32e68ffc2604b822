//! Error type for `annal-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("unknown origin: {0:?}")]
  UnknownOrigin(String),

  #[error("unknown paper type: {0:?}")]
  UnknownPaperType(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("archive not found: {0}")]
  ArchiveNotFound(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
