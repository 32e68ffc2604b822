//! Filesystem backend for the annal blob store.
//!
//! PDF bytes live under a root directory, served statically by the server
//! under a public URL prefix; the retrieval URL for an object is simply
//! `{public_base}/{path}`. Upload metadata (content type, display filename,
//! sha-256 content hash) is recorded in a sidecar under `.meta/` so the
//! store stays inspectable without a database.

pub mod error;

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use tokio::fs;

use annal_core::store::{BlobStore, PendingUpload};

pub use error::{Error, Result};

// ─── Metadata ────────────────────────────────────────────────────────────────

/// Sidecar metadata written next to every stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobMeta {
  pub content_type: String,
  /// Display filename hint supplied by the caller.
  pub filename:     String,
  /// SHA-256 hex digest of the stored bytes.
  pub content_hash: String,
}

// ─── Store ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FsBlobStore {
  root:        PathBuf,
  /// Public URL prefix under which `root` is served, e.g. `/files`.
  public_base: String,
}

impl FsBlobStore {
  pub fn new(root: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
    let public_base: String = public_base.into();
    Self {
      root:        root.into(),
      public_base: public_base.trim_end_matches('/').to_owned(),
    }
  }

  pub fn root(&self) -> &Path { &self.root }

  /// Resolve a storage path under the root, rejecting anything that could
  /// escape it.
  fn disk_path(&self, path: &str) -> Result<PathBuf> {
    let rel = Path::new(path);
    let well_formed = !path.is_empty()
      && rel.components().all(|c| matches!(c, Component::Normal(_)));
    if !well_formed {
      return Err(Error::InvalidPath(path.to_owned()));
    }
    Ok(self.root.join(rel))
  }

  fn meta_path(&self, path: &str) -> PathBuf {
    self.root.join(".meta").join(format!("{path}.json"))
  }

  /// The storage path a retrieval URL refers to, if it is one of ours.
  fn path_for_url<'a>(&self, url: &'a str) -> Option<&'a str> {
    url
      .strip_prefix(&self.public_base)
      .and_then(|rest| rest.strip_prefix('/'))
      .filter(|rest| !rest.is_empty())
  }
}

impl BlobStore for FsBlobStore {
  type Error = Error;

  async fn upload(
    &self,
    path: &str,
    upload: &PendingUpload,
    filename_hint: &str,
  ) -> Result<String> {
    let disk = self.disk_path(path)?;
    if let Some(parent) = disk.parent() {
      fs::create_dir_all(parent).await?;
    }
    fs::write(&disk, &upload.bytes).await?;

    let meta = BlobMeta {
      content_type: upload.content_type.clone(),
      filename:     filename_hint.to_owned(),
      content_hash: hex::encode(Sha256::digest(&upload.bytes)),
    };
    let meta_disk = self.meta_path(path);
    if let Some(parent) = meta_disk.parent() {
      fs::create_dir_all(parent).await?;
    }
    fs::write(&meta_disk, serde_json::to_vec_pretty(&meta)?).await?;

    tracing::debug!(path, hash = %meta.content_hash, "stored blob");
    Ok(format!("{}/{}", self.public_base, path))
  }

  async fn delete(&self, url: &str) -> Result<()> {
    // A reference we did not issue (e.g. a legacy absolute URL) is treated
    // like an already-absent object.
    let Some(path) = self.path_for_url(url) else {
      tracing::warn!(url, "delete of a foreign blob reference; ignoring");
      return Ok(());
    };
    let disk = self.disk_path(path)?;

    match fs::remove_file(&disk).await {
      Ok(()) => {}
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => return Err(e.into()),
    }
    let _ = fs::remove_file(self.meta_path(path)).await;
    Ok(())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use bytes::Bytes;

  use super::*;

  fn store(dir: &tempfile::TempDir) -> FsBlobStore {
    FsBlobStore::new(dir.path(), "/files")
  }

  fn pdf() -> PendingUpload {
    PendingUpload::pdf(Bytes::from_static(b"%PDF-1.4 test"))
  }

  #[tokio::test]
  async fn upload_writes_bytes_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    let url = s
      .upload("pdfs/DSE Pastpaper/2012D Q1.pdf", &pdf(), "2012D Q1.pdf")
      .await
      .unwrap();
    assert_eq!(url, "/files/pdfs/DSE Pastpaper/2012D Q1.pdf");

    let bytes =
      std::fs::read(dir.path().join("pdfs/DSE Pastpaper/2012D Q1.pdf"))
        .unwrap();
    assert_eq!(bytes, b"%PDF-1.4 test");

    let meta: BlobMeta = serde_json::from_slice(
      &std::fs::read(
        dir.path().join(".meta/pdfs/DSE Pastpaper/2012D Q1.pdf.json"),
      )
      .unwrap(),
    )
    .unwrap();
    assert_eq!(meta.content_type, "application/pdf");
    assert_eq!(meta.filename, "2012D Q1.pdf");
    assert_eq!(meta.content_hash.len(), 64);
  }

  #[tokio::test]
  async fn delete_is_benign_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    // Never uploaded: still Ok.
    s.delete("/files/pdfs/none.pdf").await.unwrap();
    // Foreign reference: still Ok.
    s.delete("https://elsewhere.example/x.pdf").await.unwrap();
  }

  #[tokio::test]
  async fn delete_removes_uploaded_object() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    let url = s.upload("pdfs/q.pdf", &pdf(), "q.pdf").await.unwrap();
    assert!(dir.path().join("pdfs/q.pdf").exists());

    s.delete(&url).await.unwrap();
    assert!(!dir.path().join("pdfs/q.pdf").exists());
  }

  #[tokio::test]
  async fn traversal_paths_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let s = store(&dir);

    let err = s.upload("../escape.pdf", &pdf(), "escape.pdf").await;
    assert!(matches!(err, Err(Error::InvalidPath(_))));
    let err = s.upload("/absolute.pdf", &pdf(), "a.pdf").await;
    assert!(matches!(err, Err(Error::InvalidPath(_))));
  }
}
