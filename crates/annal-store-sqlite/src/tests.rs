//! Integration tests for `SqliteStore` against an in-memory database.

use annal_core::{
  record::{ArchiveRecord, Origin, PaperType, SubQuestion, TagList},
  session::Role,
  store::{ArchiveStore, RoleStore},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn dbq_record(title: &str, year: &str) -> ArchiveRecord {
  ArchiveRecord {
    id: String::new(),
    title: title.to_owned(),
    origin: Origin::DsePastpaper,
    year: year.to_owned(),
    paper_type: PaperType::Dbq,
    topic: TagList::from(&["Cold War"][..]),
    file_url: None,
    has_file: false,
    answer_file_url: None,
    has_answer: false,
    updated_at: "2024-05-01T10:00:00+00:00".to_owned(),
    updated_by: "a@example.com".to_owned(),
    sub_questions: vec![
      SubQuestion {
        marks: "7".to_owned(),
        question_type: TagList::from(&["Attitude"][..]),
        source_type: TagList::from(&["Cartoon"][..]),
        ..SubQuestion::blank("a")
      },
      SubQuestion::blank("b"),
    ],
  }
}

// ─── Archives ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_assigns_an_opaque_id() {
  let s = store().await;
  let id = s.insert_archive(&dbq_record("2012D Q1", "2012")).await.unwrap();
  assert!(!id.is_empty());

  let fetched = s.get_archive(&id).await.unwrap().unwrap();
  assert_eq!(fetched.id, id);
  assert_eq!(fetched.title, "2012D Q1");
  assert_eq!(fetched.origin, Origin::DsePastpaper);
  assert_eq!(fetched.paper_type, PaperType::Dbq);
}

#[tokio::test]
async fn get_missing_returns_none() {
  let s = store().await;
  assert!(s.get_archive("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn sub_questions_round_trip_in_order() {
  let s = store().await;
  let record = dbq_record("2013D Q2", "2013");
  let id = s.insert_archive(&record).await.unwrap();

  let fetched = s.get_archive(&id).await.unwrap().unwrap();
  assert_eq!(fetched.sub_questions.len(), 2);
  assert_eq!(fetched.sub_questions[0].label, "a");
  assert_eq!(fetched.sub_questions[0].marks, "7");
  assert_eq!(
    fetched.sub_questions[0].source_type.as_slice(),
    &["Cartoon".to_owned()]
  );
  assert_eq!(fetched.sub_questions[1].label, "b");
  // Local keys survive the round trip — the UI diffs on them.
  assert_eq!(fetched.sub_questions[0].key, record.sub_questions[0].key);
}

#[tokio::test]
async fn list_returns_everything() {
  let s = store().await;
  s.insert_archive(&dbq_record("2012D Q1", "2012")).await.unwrap();
  s.insert_archive(&dbq_record("2013D Q2", "2013")).await.unwrap();

  let all = s.list_archives().await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn update_overwrites_by_id() {
  let s = store().await;
  let mut record = dbq_record("2012D Q1", "2012");
  record.id = s.insert_archive(&record).await.unwrap();

  record.title = "2012D Q1 (revised)".to_owned();
  record.sub_questions.push(SubQuestion::blank("c"));
  s.update_archive(&record).await.unwrap();

  let fetched = s.get_archive(&record.id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "2012D Q1 (revised)");
  assert_eq!(fetched.sub_questions.len(), 3);
}

#[tokio::test]
async fn update_unknown_id_errors() {
  let s = store().await;
  let mut record = dbq_record("2012D Q1", "2012");
  record.id = "missing".to_owned();
  let err = s.update_archive(&record).await.unwrap_err();
  assert!(matches!(err, crate::Error::ArchiveNotFound(_)));
}

#[tokio::test]
async fn delete_removes_the_row() {
  let s = store().await;
  let id = s.insert_archive(&dbq_record("2012D Q1", "2012")).await.unwrap();
  s.delete_archive(&id).await.unwrap();
  assert!(s.get_archive(&id).await.unwrap().is_none());

  // Deleting again is a quiet no-op at the SQL level.
  s.delete_archive(&id).await.unwrap();
}

#[tokio::test]
async fn legacy_string_topic_is_coerced_on_read() {
  let s = store().await;
  let id = s.insert_archive(&dbq_record("2012D Q1", "2012")).await.unwrap();

  // Simulate a legacy row whose topic column holds a bare string.
  let raw_id = id.clone();
  s.conn
    .call(move |conn| {
      conn.execute(
        "UPDATE archives SET topic = ?2 WHERE archive_id = ?1",
        rusqlite::params![raw_id, "Cold War"],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let fetched = s.get_archive(&id).await.unwrap().unwrap();
  assert_eq!(fetched.topic.as_slice(), &["Cold War".to_owned()]);
}

// ─── Roles ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn role_set_get_clear() {
  let s = store().await;
  assert_eq!(s.get_role("v@example.com").await.unwrap(), None);

  s.set_role("v@example.com", Role::Viewer).await.unwrap();
  assert_eq!(s.get_role("v@example.com").await.unwrap(), Some(Role::Viewer));

  // Upsert promotes in place.
  s.set_role("v@example.com", Role::Admin).await.unwrap();
  assert_eq!(s.get_role("v@example.com").await.unwrap(), Some(Role::Admin));

  s.clear_role("v@example.com").await.unwrap();
  assert_eq!(s.get_role("v@example.com").await.unwrap(), None);
}

#[tokio::test]
async fn unknown_role_string_reads_as_no_role() {
  let s = store().await;
  s.conn
    .call(|conn| {
      conn.execute(
        "INSERT INTO user_roles (email, role) VALUES ('x@example.com', 'owner')",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  assert_eq!(s.get_role("x@example.com").await.unwrap(), None);
}
