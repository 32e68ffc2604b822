//! Collaborator traits: the document store, the role store, and the blob
//! store.
//!
//! The traits are implemented by backends (`annal-store-sqlite`,
//! `annal-blob-fs`). Higher layers depend on these abstractions, never on a
//! concrete backend. Identifiers are opaque strings assigned by the document
//! store on insert.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use bytes::Bytes;

use crate::{record::ArchiveRecord, session::Role};

// ─── Document store ──────────────────────────────────────────────────────────

pub trait ArchiveStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Collection scan: every archive record.
  fn list_archives(
    &self,
  ) -> impl Future<Output = Result<Vec<ArchiveRecord>, Self::Error>> + Send + '_;

  /// Fetch one record by identifier. Returns `None` if not found.
  fn get_archive<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<ArchiveRecord>, Self::Error>> + Send + 'a;

  /// Insert a new record. The `id` field of `record` is ignored; the store
  /// assigns and returns the identifier.
  fn insert_archive<'a>(
    &'a self,
    record: &'a ArchiveRecord,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Overwrite an existing record by its identifier.
  fn update_archive<'a>(
    &'a self,
    record: &'a ArchiveRecord,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Remove a record by identifier.
  fn delete_archive<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Role store ──────────────────────────────────────────────────────────────

/// Per-email role records: `"admin"` or `"viewer"`; any other value or
/// absence implies no role.
pub trait RoleStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn get_role<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Role>, Self::Error>> + Send + 'a;

  fn set_role<'a>(
    &'a self,
    email: &'a str,
    role: Role,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  fn clear_role<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Blob store ──────────────────────────────────────────────────────────────

/// A file the user has selected but which has not been uploaded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
  pub bytes:        Bytes,
  /// File extension without the dot, e.g. "pdf".
  pub extension:    String,
  pub content_type: String,
}

impl PendingUpload {
  pub fn pdf(bytes: Bytes) -> Self {
    Self {
      bytes,
      extension: "pdf".to_owned(),
      content_type: "application/pdf".to_owned(),
    }
  }
}

pub trait BlobStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Store `upload` under `path` (with a display filename hint for the
  /// backend's metadata) and return the public retrieval URL.
  fn upload<'a>(
    &'a self,
    path: &'a str,
    upload: &'a PendingUpload,
    filename_hint: &'a str,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Delete by retrieval URL. Deleting an object that is already absent is
  /// an expected, non-fatal case and must succeed.
  fn delete<'a>(
    &'a self,
    url: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
