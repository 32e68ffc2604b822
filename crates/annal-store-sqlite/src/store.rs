//! [`SqliteStore`] — the SQLite implementation of [`ArchiveStore`] and
//! [`RoleStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use annal_core::{
  record::ArchiveRecord,
  session::Role,
  store::{ArchiveStore, RoleStore},
};

use crate::{
  encode::{
    decode_role, encode_origin, encode_paper_type, encode_role,
    encode_sub_questions, encode_tag_list, RawArchive,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An archive store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

}

// ─── ArchiveStore impl ───────────────────────────────────────────────────────

impl ArchiveStore for SqliteStore {
  type Error = Error;

  async fn list_archives(&self) -> Result<Vec<ArchiveRecord>> {
    let raws: Vec<RawArchive> = self
      .conn
      .call(|conn| {
        let sql = format!("SELECT {} FROM archives", RawArchive::COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawArchive::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawArchive::into_record).collect()
  }

  async fn get_archive(&self, id: &str) -> Result<Option<ArchiveRecord>> {
    let id = id.to_owned();
    let raw: Option<RawArchive> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM archives WHERE archive_id = ?1",
          RawArchive::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id], RawArchive::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawArchive::into_record).transpose()
  }

  async fn insert_archive(&self, record: &ArchiveRecord) -> Result<String> {
    let id              = Uuid::new_v4().to_string();
    let title           = record.title.clone();
    let origin          = encode_origin(record.origin);
    let year            = record.year.clone();
    let paper_type      = encode_paper_type(record.paper_type);
    let topic           = encode_tag_list(&record.topic)?;
    let file_url        = record.file_url.clone();
    let has_file        = record.has_file;
    let answer_file_url = record.answer_file_url.clone();
    let has_answer      = record.has_answer;
    let updated_at      = record.updated_at.clone();
    let updated_by      = record.updated_by.clone();
    let sub_questions   = encode_sub_questions(&record.sub_questions)?;

    let id_for_insert = id.clone();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO archives (
             archive_id, title, origin, year, paper_type, topic,
             file_url, has_file, answer_file_url, has_answer,
             updated_at, updated_by, sub_questions
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            id_for_insert,
            title,
            origin,
            year,
            paper_type,
            topic,
            file_url,
            has_file,
            answer_file_url,
            has_answer,
            updated_at,
            updated_by,
            sub_questions,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(id)
  }

  async fn update_archive(&self, record: &ArchiveRecord) -> Result<()> {
    let id              = record.id.clone();
    let title           = record.title.clone();
    let origin          = encode_origin(record.origin);
    let year            = record.year.clone();
    let paper_type      = encode_paper_type(record.paper_type);
    let topic           = encode_tag_list(&record.topic)?;
    let file_url        = record.file_url.clone();
    let has_file        = record.has_file;
    let answer_file_url = record.answer_file_url.clone();
    let has_answer      = record.has_answer;
    let updated_at      = record.updated_at.clone();
    let updated_by      = record.updated_by.clone();
    let sub_questions   = encode_sub_questions(&record.sub_questions)?;

    let id_for_check = id.clone();
    let changed: usize = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE archives SET
             title = ?2, origin = ?3, year = ?4, paper_type = ?5, topic = ?6,
             file_url = ?7, has_file = ?8, answer_file_url = ?9,
             has_answer = ?10, updated_at = ?11, updated_by = ?12,
             sub_questions = ?13
           WHERE archive_id = ?1",
          rusqlite::params![
            id_for_check,
            title,
            origin,
            year,
            paper_type,
            topic,
            file_url,
            has_file,
            answer_file_url,
            has_answer,
            updated_at,
            updated_by,
            sub_questions,
          ],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ArchiveNotFound(id));
    }
    Ok(())
  }

  async fn delete_archive(&self, id: &str) -> Result<()> {
    let id = id.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM archives WHERE archive_id = ?1",
          rusqlite::params![id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── RoleStore impl ──────────────────────────────────────────────────────────

impl RoleStore for SqliteStore {
  type Error = Error;

  async fn get_role(&self, email: &str) -> Result<Option<Role>> {
    let email = email.to_owned();
    let raw: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT role FROM user_roles WHERE email = ?1",
              rusqlite::params![email],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.as_deref().and_then(decode_role))
  }

  async fn set_role(&self, email: &str, role: Role) -> Result<()> {
    let email = email.to_owned();
    let role_str = encode_role(role);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_roles (email, role) VALUES (?1, ?2)
           ON CONFLICT (email) DO UPDATE SET role = excluded.role",
          rusqlite::params![email, role_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn clear_role(&self, email: &str) -> Result<()> {
    let email = email.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM user_roles WHERE email = ?1",
          rusqlite::params![email],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
