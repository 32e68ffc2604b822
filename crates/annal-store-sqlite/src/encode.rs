//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Facet lists and sub-questions are stored as compact JSON. Legacy rows may
//! hold a bare string where a JSON list is expected; decoding routes every
//! such column through the single coercion rule so the rest of the system
//! only ever sees canonical lists.

use std::str::FromStr as _;

use annal_core::{
  record::{ArchiveRecord, Origin, PaperType, SubQuestion, TagList},
  session::Role,
};

use crate::{Error, Result};

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_origin(origin: Origin) -> String { origin.to_string() }

pub fn decode_origin(s: &str) -> Result<Origin> {
  Origin::from_str(s).map_err(|_| Error::UnknownOrigin(s.to_owned()))
}

pub fn encode_paper_type(paper: PaperType) -> String { paper.to_string() }

pub fn decode_paper_type(s: &str) -> Result<PaperType> {
  PaperType::from_str(s).map_err(|_| Error::UnknownPaperType(s.to_owned()))
}

pub fn encode_role(role: Role) -> String { role.to_string() }

/// Any value other than "admin"/"viewer" implies no role, rather than an
/// error — unknown role strings in the table must not break sign-in.
pub fn decode_role(s: &str) -> Option<Role> { Role::from_str(s).ok() }

// ─── Facet lists ─────────────────────────────────────────────────────────────

pub fn encode_tag_list(tags: &TagList) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

/// Decode a column that should hold a JSON list but may hold a bare legacy
/// string (or anything else). Non-JSON content is treated as one raw string
/// and fed through the coercion rule.
pub fn decode_tag_list(raw: &str) -> TagList {
  let value = serde_json::from_str::<serde_json::Value>(raw)
    .unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()));
  TagList::coerce(&value)
}

// ─── Sub-questions ───────────────────────────────────────────────────────────

pub fn encode_sub_questions(subs: &[SubQuestion]) -> Result<String> {
  Ok(serde_json::to_string(subs)?)
}

pub fn decode_sub_questions(raw: &str) -> Result<Vec<SubQuestion>> {
  Ok(serde_json::from_str(raw)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `archives` row.
pub struct RawArchive {
  pub archive_id:      String,
  pub title:           String,
  pub origin:          String,
  pub year:            String,
  pub paper_type:      String,
  pub topic:           String,
  pub file_url:        Option<String>,
  pub has_file:        bool,
  pub answer_file_url: Option<String>,
  pub has_answer:      bool,
  pub updated_at:      String,
  pub updated_by:      String,
  pub sub_questions:   String,
}

impl RawArchive {
  pub const COLUMNS: &'static str = "archive_id, title, origin, year, \
     paper_type, topic, file_url, has_file, answer_file_url, has_answer, \
     updated_at, updated_by, sub_questions";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      archive_id:      row.get(0)?,
      title:           row.get(1)?,
      origin:          row.get(2)?,
      year:            row.get(3)?,
      paper_type:      row.get(4)?,
      topic:           row.get(5)?,
      file_url:        row.get(6)?,
      has_file:        row.get(7)?,
      answer_file_url: row.get(8)?,
      has_answer:      row.get(9)?,
      updated_at:      row.get(10)?,
      updated_by:      row.get(11)?,
      sub_questions:   row.get(12)?,
    })
  }

  pub fn into_record(self) -> Result<ArchiveRecord> {
    Ok(ArchiveRecord {
      id:              self.archive_id,
      title:           self.title,
      origin:          decode_origin(&self.origin)?,
      year:            self.year,
      paper_type:      decode_paper_type(&self.paper_type)?,
      topic:           decode_tag_list(&self.topic),
      file_url:        self.file_url,
      has_file:        self.has_file,
      answer_file_url: self.answer_file_url,
      has_answer:      self.has_answer,
      updated_at:      self.updated_at,
      updated_by:      self.updated_by,
      sub_questions:   decode_sub_questions(&self.sub_questions)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn legacy_bare_string_topic_coerces() {
    assert_eq!(
      decode_tag_list("Cold War").as_slice(),
      &["Cold War".to_owned()]
    );
    assert_eq!(
      decode_tag_list("[\"A\",\"B\"]").as_slice(),
      &["A".to_owned(), "B".to_owned()]
    );
    assert!(decode_tag_list("null").is_empty());
    assert!(decode_tag_list("").is_empty());
  }

  #[test]
  fn unknown_role_is_no_role() {
    assert_eq!(decode_role("admin"), Some(Role::Admin));
    assert_eq!(decode_role("viewer"), Some(Role::Viewer));
    assert_eq!(decode_role("owner"), None);
  }
}
