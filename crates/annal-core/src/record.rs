//! Archive record types — one exam paper and its ordered sub-questions.
//!
//! A parent record carries the paper-level metadata (title, origin, year,
//! paper type, the question/answer PDF references) and owns a non-empty
//! ordered list of sub-questions. Sub-questions have no identity beyond a
//! locally-unique key used for list diffing.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ─── Origin ──────────────────────────────────────────────────────────────────

/// Where an exam paper came from. Closed set; the wire strings are load-bearing
/// because existing stored documents use them verbatim.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum Origin {
  #[serde(rename = "DSE Pastpaper")]
  #[strum(serialize = "DSE Pastpaper")]
  DsePastpaper,
  #[serde(rename = "Internal School Exam")]
  #[strum(serialize = "Internal School Exam")]
  InternalSchoolExam,
  #[serde(rename = "Mock Examination")]
  #[strum(serialize = "Mock Examination")]
  MockExamination,
  #[serde(rename = "Quiz")]
  #[strum(serialize = "Quiz")]
  Quiz,
  #[serde(rename = "Exercise")]
  #[strum(serialize = "Exercise")]
  Exercise,
}

impl Origin {
  pub const ALL: [Origin; 5] = [
    Origin::DsePastpaper,
    Origin::InternalSchoolExam,
    Origin::MockExamination,
    Origin::Quiz,
    Origin::Exercise,
  ];
}

// ─── PaperType ───────────────────────────────────────────────────────────────

/// The two mutually exclusive paper categories. The paper type decides which
/// fields are semantically active and how sub-question labels are generated.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
pub enum PaperType {
  #[serde(rename = "Paper 1 (DBQ)")]
  #[strum(serialize = "Paper 1 (DBQ)")]
  Dbq,
  #[serde(rename = "Paper 2 (Essay)")]
  #[strum(serialize = "Paper 2 (Essay)")]
  Essay,
}

impl PaperType {
  pub const ALL: [PaperType; 2] = [PaperType::Dbq, PaperType::Essay];

  /// The auto-generated label for the sub-question at `index`:
  /// letters ascending from 'a' for DBQ papers, numerals from "1" for essays.
  pub fn label_for(self, index: usize) -> String {
    match self {
      PaperType::Dbq => char::from_u32('a' as u32 + index as u32)
        .map(String::from)
        .unwrap_or_default(),
      PaperType::Essay => (index + 1).to_string(),
    }
  }
}

/// Label rule as a total function: a record with no paper type chosen yet
/// gets an empty label.
pub fn sub_label(index: usize, paper: Option<PaperType>) -> String {
  paper.map(|p| p.label_for(index)).unwrap_or_default()
}

// ─── TagList ─────────────────────────────────────────────────────────────────

/// Canonical list-of-tags type produced by the single coercion rule.
///
/// Legacy documents stored facet fields (`topic`, `questionType`,
/// `sourceType`) as either a bare string or a list of strings.
/// Deserialisation collapses every raw shape into one canonical list: an
/// array passes through, a non-empty string becomes a one-element list, and
/// anything else (null, absent, numbers, ...) becomes empty. The rule is
/// idempotent, so every consumer can normalise unconditionally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TagList(Vec<String>);

impl TagList {
  pub fn new(tags: Vec<String>) -> Self { Self(tags) }

  /// The coercion rule itself, usable on raw JSON values.
  pub fn coerce(value: &serde_json::Value) -> Self {
    match value {
      serde_json::Value::Array(items) => Self(
        items
          .iter()
          .filter_map(|v| v.as_str().map(str::to_owned))
          .collect(),
      ),
      serde_json::Value::String(s) if !s.is_empty() => Self(vec![s.clone()]),
      _ => Self(Vec::new()),
    }
  }

  pub fn iter(&self) -> std::slice::Iter<'_, String> { self.0.iter() }

  pub fn first(&self) -> Option<&str> { self.0.first().map(String::as_str) }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn len(&self) -> usize { self.0.len() }

  pub fn as_slice(&self) -> &[String] { &self.0 }

  pub fn contains(&self, tag: &str) -> bool { self.0.iter().any(|t| t == tag) }

  pub fn push(&mut self, tag: String) { self.0.push(tag); }

  pub fn clear(&mut self) { self.0.clear(); }
}

impl<'de> Deserialize<'de> for TagList {
  fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
    let value = serde_json::Value::deserialize(de)?;
    Ok(Self::coerce(&value))
  }
}

impl From<Vec<String>> for TagList {
  fn from(tags: Vec<String>) -> Self { Self(tags) }
}

impl From<&[&str]> for TagList {
  fn from(tags: &[&str]) -> Self {
    Self(tags.iter().map(|t| (*t).to_owned()).collect())
  }
}

impl<'a> IntoIterator for &'a TagList {
  type IntoIter = std::slice::Iter<'a, String>;
  type Item = &'a String;

  fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

// ─── SubQuestion ─────────────────────────────────────────────────────────────

/// One gradable question unit within a parent record.
///
/// `topic` is meaningful only on essay papers, `source_type` and `marks` only
/// on DBQ papers; the inactive fields are simply left empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubQuestion {
  /// Locally-unique key for list diffing. Legacy documents used numeric
  /// timestamps here; those decode to their decimal string form.
  #[serde(rename = "id", deserialize_with = "de_stringly_key")]
  pub key:           String,
  pub label:         String,
  pub question_type: TagList,
  pub content:       String,
  pub topic:         TagList,
  pub source_type:   TagList,
  /// Numeric string; empty when not applicable (essay papers).
  #[serde(deserialize_with = "de_stringly")]
  pub marks:         String,
}

impl SubQuestion {
  /// A fresh, empty sub-question with the given label and a new local key.
  pub fn blank(label: &str) -> Self {
    Self {
      key: Uuid::new_v4().to_string(),
      label: label.to_owned(),
      ..Self::default()
    }
  }
}

impl Default for SubQuestion {
  fn default() -> Self {
    Self {
      key:           Uuid::new_v4().to_string(),
      label:         String::new(),
      question_type: TagList::default(),
      content:       String::new(),
      topic:         TagList::default(),
      source_type:   TagList::default(),
      marks:         String::new(),
    }
  }
}

// ─── ArchiveRecord ───────────────────────────────────────────────────────────

/// One exam-paper-level document with shared metadata, owning an ordered,
/// non-empty list of sub-questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
  /// Opaque identifier assigned by the document store on insert.
  #[serde(default)]
  pub id:              String,
  pub title:           String,
  pub origin:          Origin,
  /// Numeric string, or one of the sentinel years ("SP", "PP").
  #[serde(deserialize_with = "de_stringly", default)]
  pub year:            String,
  pub paper_type:      PaperType,
  /// Paper-level topics; meaningful only for DBQ papers and cleared when the
  /// paper type is the essay style.
  #[serde(default)]
  pub topic:           TagList,
  #[serde(default)]
  pub file_url:        Option<String>,
  #[serde(default)]
  pub has_file:        bool,
  #[serde(default)]
  pub answer_file_url: Option<String>,
  #[serde(default)]
  pub has_answer:      bool,
  /// RFC 3339 timestamp of the last write. Kept as a string because legacy
  /// documents may carry anything here; consumers parse leniently.
  #[serde(default)]
  pub updated_at:      String,
  #[serde(default)]
  pub updated_by:      String,
  pub sub_questions:   Vec<SubQuestion>,
}

impl ArchiveRecord {
  /// The `has_file`/`has_answer` derivation: a non-empty URL.
  /// The URL is the source of truth; the booleans are never authoritative.
  pub fn derives_present(url: &Option<String>) -> bool {
    url.as_deref().is_some_and(|u| !u.is_empty())
  }

  /// Recompute the derived booleans from the stored URLs.
  pub fn refresh_derived(&mut self) {
    self.has_file = Self::derives_present(&self.file_url);
    self.has_answer = Self::derives_present(&self.answer_file_url);
  }
}

// ─── Lenient decoders ────────────────────────────────────────────────────────

/// Accept a string or a number (stringified); anything else is empty.
fn de_stringly<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
  let value = serde_json::Value::deserialize(de)?;
  Ok(match value {
    serde_json::Value::String(s) => s,
    serde_json::Value::Number(n) => n.to_string(),
    _ => String::new(),
  })
}

/// As [`de_stringly`], but an unusable value gets a fresh key instead of "".
fn de_stringly_key<'de, D: Deserializer<'de>>(
  de: D,
) -> Result<String, D::Error> {
  let key = de_stringly(de)?;
  if key.is_empty() {
    Ok(Uuid::new_v4().to_string())
  } else {
    Ok(key)
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
