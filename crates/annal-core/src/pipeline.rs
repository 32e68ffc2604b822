//! The mutation pipeline: validate, upload, persist, and update local state.
//!
//! Both operations are driven by handlers that await each step sequentially;
//! nothing here retries, and every failure is terminal to its operation.

use chrono::Utc;

use crate::{
  catalog::Catalog,
  error::{Error, Result},
  form::Draft,
  paths,
  record::{ArchiveRecord, PaperType},
  session::Session,
  store::{ArchiveStore, BlobStore, PendingUpload},
};

// ─── Requests and outcomes ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SaveTarget {
  Create,
  Update { id: String },
}

#[derive(Debug)]
pub struct SaveRequest {
  pub target:       SaveTarget,
  pub draft:        Draft,
  /// Newly selected question PDF, if any.
  pub question_pdf: Option<PendingUpload>,
  /// Newly selected answer-key PDF, if any.
  pub answer_pdf:   Option<PendingUpload>,
}

/// Why a submission was refused without any side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum RejectReason {
  #[strum(serialize = "acting identity is not an admin")]
  NotAdmin,
  #[strum(serialize = "title must not be empty")]
  TitleRequired,
  #[strum(serialize = "origin must be chosen")]
  OriginRequired,
  #[strum(serialize = "paper type must be chosen")]
  PaperTypeRequired,
}

/// Validation failures are a quiet no-op, not an error: nothing was
/// uploaded, persisted, or cached.
#[derive(Debug)]
pub enum SaveOutcome {
  Saved(ArchiveRecord),
  Rejected(RejectReason),
}

#[derive(Debug, PartialEq)]
pub enum DeleteOutcome {
  Deleted,
  Rejected(RejectReason),
}

// ─── Save ────────────────────────────────────────────────────────────────────

/// Create or update one archive record.
///
/// In order: validate; upload any newly selected PDFs to their derived
/// paths; recompute the derived booleans; stamp `updated_at`/`updated_by`;
/// persist (capturing the storage-assigned id on create); union the record's
/// facet values into the taxonomy and update the in-memory list.
pub async fn save_archive<S, B>(
  store: &S,
  blobs: &B,
  catalog: &mut Catalog,
  actor: &Session,
  request: SaveRequest,
) -> Result<SaveOutcome>
where
  S: ArchiveStore,
  B: BlobStore,
{
  if !actor.is_admin {
    return Ok(SaveOutcome::Rejected(RejectReason::NotAdmin));
  }
  let draft = &request.draft;
  if draft.title.trim().is_empty() {
    return Ok(SaveOutcome::Rejected(RejectReason::TitleRequired));
  }
  let Some(origin) = draft.origin else {
    return Ok(SaveOutcome::Rejected(RejectReason::OriginRequired));
  };
  let Some(paper_type) = draft.paper_type else {
    return Ok(SaveOutcome::Rejected(RejectReason::PaperTypeRequired));
  };

  let mut record = ArchiveRecord {
    id: match &request.target {
      SaveTarget::Update { id } => id.clone(),
      SaveTarget::Create => String::new(),
    },
    title: draft.title.clone(),
    origin,
    year: draft.year.clone(),
    paper_type,
    // Parent topics are a DBQ concept; essays carry them per sub-question.
    topic: match paper_type {
      PaperType::Essay => Default::default(),
      PaperType::Dbq => draft.topic.clone(),
    },
    file_url: draft.file_url.clone(),
    has_file: false,
    answer_file_url: draft.answer_file_url.clone(),
    has_answer: false,
    updated_at: String::new(),
    updated_by: String::new(),
    sub_questions: draft.sub_questions.clone(),
  };

  let origin_name = origin.to_string();
  if let Some(upload) = &request.question_pdf {
    let path =
      paths::question_pdf_path(&origin_name, &record.title, &upload.extension);
    let hint = format!(
      "{}.{}",
      paths::sanitize_component(&record.title),
      upload.extension
    );
    let url = blobs.upload(&path, upload, &hint).await.map_err(Error::blob)?;
    record.file_url = Some(url);
  }
  if let Some(upload) = &request.answer_pdf {
    let path =
      paths::answer_pdf_path(&origin_name, &record.title, &upload.extension);
    let hint = format!(
      "{} answer.{}",
      paths::sanitize_component(&record.title),
      upload.extension
    );
    let url = blobs.upload(&path, upload, &hint).await.map_err(Error::blob)?;
    record.answer_file_url = Some(url);
  }

  record.refresh_derived();
  record.updated_at = Utc::now().to_rfc3339();
  record.updated_by = actor.email.clone();

  match &request.target {
    SaveTarget::Update { .. } => {
      store.update_archive(&record).await.map_err(Error::store)?;
    }
    SaveTarget::Create => {
      record.id = store.insert_archive(&record).await.map_err(Error::store)?;
    }
  }

  catalog.absorb(record.clone());
  Ok(SaveOutcome::Saved(record))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// Remove a record and its stored files.
///
/// File removal failures (including not-found) are logged and tolerated;
/// failure to remove the record itself is fatal and propagates.
pub async fn delete_archive<S, B>(
  store: &S,
  blobs: &B,
  catalog: &mut Catalog,
  actor: &Session,
  id: &str,
) -> Result<DeleteOutcome>
where
  S: ArchiveStore,
  B: BlobStore,
{
  if !actor.is_admin {
    return Ok(DeleteOutcome::Rejected(RejectReason::NotAdmin));
  }

  let record = match catalog.get(id) {
    Some(record) => record.clone(),
    None => store
      .get_archive(id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ArchiveNotFound(id.to_owned()))?,
  };

  for url in [&record.file_url, &record.answer_file_url].into_iter().flatten()
  {
    if let Err(e) = blobs.delete(url).await {
      tracing::warn!(error = %e, %url, "could not delete stored file (it may not exist)");
    }
  }

  store.delete_archive(id).await.map_err(Error::store)?;
  catalog.remove(id);
  Ok(DeleteOutcome::Deleted)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::collections::HashMap;
  use std::sync::Mutex;

  use bytes::Bytes;

  use super::*;
  use crate::record::{Origin, PaperType, SubQuestion, TagList};

  // ── In-memory fakes ───────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  enum FakeError {
    #[error("record missing: {0}")]
    Missing(String),
    #[error("backend down")]
    Down,
  }

  #[derive(Default)]
  struct MemStore {
    records: Mutex<Vec<ArchiveRecord>>,
    broken:  bool,
  }

  impl ArchiveStore for MemStore {
    type Error = FakeError;

    async fn list_archives(&self) -> Result<Vec<ArchiveRecord>, FakeError> {
      Ok(self.records.lock().unwrap().clone())
    }

    async fn get_archive(
      &self,
      id: &str,
    ) -> Result<Option<ArchiveRecord>, FakeError> {
      Ok(self.records.lock().unwrap().iter().find(|r| r.id == id).cloned())
    }

    async fn insert_archive(
      &self,
      record: &ArchiveRecord,
    ) -> Result<String, FakeError> {
      let id = uuid::Uuid::new_v4().to_string();
      let mut stored = record.clone();
      stored.id = id.clone();
      self.records.lock().unwrap().push(stored);
      Ok(id)
    }

    async fn update_archive(
      &self,
      record: &ArchiveRecord,
    ) -> Result<(), FakeError> {
      let mut records = self.records.lock().unwrap();
      match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => {
          *existing = record.clone();
          Ok(())
        }
        None => Err(FakeError::Missing(record.id.clone())),
      }
    }

    async fn delete_archive(&self, id: &str) -> Result<(), FakeError> {
      if self.broken {
        return Err(FakeError::Down);
      }
      self.records.lock().unwrap().retain(|r| r.id != id);
      Ok(())
    }
  }

  /// Blob store over a map; `rejecting` makes uploads fail, `flaky_delete`
  /// makes deletes fail.
  #[derive(Default)]
  struct MemBlobs {
    objects:      Mutex<HashMap<String, Vec<u8>>>,
    rejecting:    bool,
    flaky_delete: bool,
  }

  impl BlobStore for MemBlobs {
    type Error = FakeError;

    async fn upload(
      &self,
      path: &str,
      upload: &PendingUpload,
      _filename_hint: &str,
    ) -> Result<String, FakeError> {
      if self.rejecting {
        return Err(FakeError::Down);
      }
      self
        .objects
        .lock()
        .unwrap()
        .insert(path.to_owned(), upload.bytes.to_vec());
      Ok(format!("/files/{path}"))
    }

    async fn delete(&self, url: &str) -> Result<(), FakeError> {
      if self.flaky_delete {
        return Err(FakeError::Down);
      }
      // Absent objects are fine.
      let path = url.trim_start_matches("/files/");
      self.objects.lock().unwrap().remove(path);
      Ok(())
    }
  }

  fn dbq_draft(title: &str) -> Draft {
    let mut draft = Draft::blank("2021");
    draft.set_title(title);
    if draft.origin.is_none() {
      draft.origin = Some(Origin::Quiz);
    }
    if draft.paper_type.is_none() {
      draft.set_paper_type(PaperType::Dbq);
    }
    draft
  }

  fn create_request(draft: Draft) -> SaveRequest {
    SaveRequest {
      target:       SaveTarget::Create,
      draft,
      question_pdf: None,
      answer_pdf:   None,
    }
  }

  // ── Save ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn non_admin_save_is_a_no_op() {
    let store = MemStore::default();
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();

    let outcome = save_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::viewer("v@example.com"),
      create_request(dbq_draft("2012D Q1")),
    )
    .await
    .unwrap();

    assert!(matches!(
      outcome,
      SaveOutcome::Rejected(RejectReason::NotAdmin)
    ));
    assert!(store.records.lock().unwrap().is_empty());
    assert!(catalog.is_empty());
  }

  #[tokio::test]
  async fn empty_title_is_a_no_op() {
    let store = MemStore::default();
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();

    let mut draft = dbq_draft("2012D Q1");
    draft.title = "   ".into();
    let outcome = save_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::admin("a@example.com"),
      create_request(draft),
    )
    .await
    .unwrap();

    assert!(matches!(
      outcome,
      SaveOutcome::Rejected(RejectReason::TitleRequired)
    ));
  }

  #[tokio::test]
  async fn create_assigns_id_stamps_and_caches() {
    let store = MemStore::default();
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();

    let outcome = save_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::admin("a@example.com"),
      create_request(dbq_draft("2012D Q1")),
    )
    .await
    .unwrap();

    let SaveOutcome::Saved(record) = outcome else {
      panic!("expected a save");
    };
    assert!(!record.id.is_empty());
    assert_eq!(record.updated_by, "a@example.com");
    assert!(
      chrono::DateTime::parse_from_rfc3339(&record.updated_at).is_ok(),
      "updated_at must be RFC 3339: {}",
      record.updated_at
    );
    assert_eq!(catalog.records().first().map(|r| r.id.as_str()), Some(record.id.as_str()));
    assert_eq!(store.records.lock().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn uploads_land_on_the_derived_paths() {
    let store = MemStore::default();
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();

    let mut request = create_request(dbq_draft("2012D Q1"));
    request.question_pdf =
      Some(PendingUpload::pdf(Bytes::from_static(b"%PDF-1.4 q")));
    request.answer_pdf =
      Some(PendingUpload::pdf(Bytes::from_static(b"%PDF-1.4 a")));

    let outcome = save_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::admin("a@example.com"),
      request,
    )
    .await
    .unwrap();

    let SaveOutcome::Saved(record) = outcome else {
      panic!("expected a save");
    };
    assert_eq!(
      record.file_url.as_deref(),
      Some("/files/pdfs/DSE Pastpaper/2012D Q1.pdf")
    );
    assert_eq!(
      record.answer_file_url.as_deref(),
      Some("/files/pdfs/DSE Pastpaper/answer/2012D Q1 answer.pdf")
    );
    assert!(record.has_file);
    assert!(record.has_answer);

    let objects = blobs.objects.lock().unwrap();
    assert!(objects.contains_key("pdfs/DSE Pastpaper/2012D Q1.pdf"));
    assert!(
      objects.contains_key("pdfs/DSE Pastpaper/answer/2012D Q1 answer.pdf")
    );
  }

  #[tokio::test]
  async fn upload_failure_persists_nothing() {
    let store = MemStore::default();
    let blobs = MemBlobs { rejecting: true, ..MemBlobs::default() };
    let mut catalog = Catalog::new();

    let mut request = create_request(dbq_draft("2012D Q1"));
    request.question_pdf =
      Some(PendingUpload::pdf(Bytes::from_static(b"%PDF-1.4")));

    let result = save_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::admin("a@example.com"),
      request,
    )
    .await;

    assert!(matches!(result, Err(Error::Blob(_))));
    assert!(store.records.lock().unwrap().is_empty());
    assert!(catalog.is_empty());
  }

  #[tokio::test]
  async fn update_overwrites_in_place_and_unions_taxonomy() {
    let store = MemStore::default();
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();
    let admin = Session::admin("a@example.com");

    let mut draft = dbq_draft("2012D Q1");
    draft.topic = TagList::from(&["Japan (1900-1945)"][..]);
    draft.sub_questions[0].source_type = TagList::from(&["Cartoon"][..]);
    let SaveOutcome::Saved(created) = save_archive(
      &store,
      &blobs,
      &mut catalog,
      &admin,
      create_request(draft.clone()),
    )
    .await
    .unwrap() else {
      panic!("expected a save");
    };

    // Edit without touching the facet fields.
    draft.sub_questions[0].content = "Study Source A.".into();
    let outcome = save_archive(
      &store,
      &blobs,
      &mut catalog,
      &admin,
      SaveRequest {
        target:       SaveTarget::Update { id: created.id.clone() },
        draft,
        question_pdf: None,
        answer_pdf:   None,
      },
    )
    .await
    .unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved(_)));

    assert_eq!(catalog.len(), 1);
    let topics = catalog.taxonomy().topics();
    assert_eq!(
      topics.iter().filter(|t| *t == "Japan (1900-1945)").count(),
      1
    );
    let sources = catalog.taxonomy().source_types();
    assert_eq!(sources.iter().filter(|t| *t == "Cartoon").count(), 1);
  }

  #[tokio::test]
  async fn essay_save_clears_parent_topic() {
    let store = MemStore::default();
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();

    let mut draft = Draft::blank("2019");
    draft.set_title("2019E Q2");
    // Simulate a legacy draft that still carries a parent topic.
    draft.topic = TagList::from(&["Cold War"][..]);

    let SaveOutcome::Saved(record) = save_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::admin("a@example.com"),
      create_request(draft),
    )
    .await
    .unwrap() else {
      panic!("expected a save");
    };
    assert_eq!(record.paper_type, PaperType::Essay);
    assert!(record.topic.is_empty());
  }

  // ── Delete ────────────────────────────────────────────────────────────

  fn seeded(
    store: &MemStore,
    catalog: &mut Catalog,
    file_url: Option<&str>,
  ) -> ArchiveRecord {
    let record = ArchiveRecord {
      id: "r1".into(),
      title: "2012D Q1".into(),
      origin: Origin::DsePastpaper,
      year: "2012".into(),
      paper_type: PaperType::Dbq,
      topic: TagList::default(),
      file_url: file_url.map(str::to_owned),
      has_file: file_url.is_some(),
      answer_file_url: None,
      has_answer: false,
      updated_at: String::new(),
      updated_by: String::new(),
      sub_questions: vec![SubQuestion::blank("a")],
    };
    store.records.lock().unwrap().push(record.clone());
    catalog.absorb(record.clone());
    record
  }

  #[tokio::test]
  async fn delete_removes_record_and_files() {
    let store = MemStore::default();
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();
    seeded(&store, &mut catalog, Some("/files/pdfs/x/y.pdf"));
    blobs
      .objects
      .lock()
      .unwrap()
      .insert("pdfs/x/y.pdf".into(), b"%PDF".to_vec());

    let outcome = delete_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::admin("a@example.com"),
      "r1",
    )
    .await
    .unwrap();

    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(store.records.lock().unwrap().is_empty());
    assert!(catalog.is_empty());
    assert!(blobs.objects.lock().unwrap().is_empty());
  }

  #[tokio::test]
  async fn file_delete_failure_is_tolerated() {
    let store = MemStore::default();
    let blobs = MemBlobs { flaky_delete: true, ..MemBlobs::default() };
    let mut catalog = Catalog::new();
    seeded(&store, &mut catalog, Some("/files/pdfs/x/y.pdf"));

    let outcome = delete_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::admin("a@example.com"),
      "r1",
    )
    .await
    .unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert!(catalog.is_empty());
  }

  #[tokio::test]
  async fn record_delete_failure_is_fatal() {
    let store = MemStore { broken: true, ..MemStore::default() };
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();
    seeded(&store, &mut catalog, None);

    let result = delete_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::admin("a@example.com"),
      "r1",
    )
    .await;
    assert!(matches!(result, Err(Error::Store(_))));
    // The optimistic list is untouched on a fatal delete failure.
    assert_eq!(catalog.len(), 1);
  }

  #[tokio::test]
  async fn non_admin_delete_is_rejected() {
    let store = MemStore::default();
    let blobs = MemBlobs::default();
    let mut catalog = Catalog::new();
    seeded(&store, &mut catalog, None);

    let outcome = delete_archive(
      &store,
      &blobs,
      &mut catalog,
      &Session::viewer("v@example.com"),
      "r1",
    )
    .await
    .unwrap();
    assert_eq!(outcome, DeleteOutcome::Rejected(RejectReason::NotAdmin));
    assert_eq!(catalog.len(), 1);
  }
}
