//! Record filter/sort engine.
//!
//! Flattens parent/sub-question pairs, applies the multi-select facet
//! filters and the free-text search, and sorts by the chosen key. The engine
//! is a pure function of (records, filters, search, sort) — no hidden state,
//! no I/O — which is what makes it cheap to test exhaustively.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::record::{ArchiveRecord, Origin, PaperType, SubQuestion};

// ─── Marks buckets ───────────────────────────────────────────────────────────

/// A selectable marks filter value: a literal numeral, the combined "7/8"
/// bucket, or the open-ended "9+" bucket.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(from = "String", into = "String")]
pub enum MarksBucket {
  SevenOrEight,
  NinePlus,
  Exact(String),
}

impl MarksBucket {
  /// Whether a sub-question's marks value satisfies this bucket.
  ///
  /// "9+" requires the value to parse numerically; non-numeric marks never
  /// satisfy it (deliberately permissive, matching the historical behavior).
  pub fn matches(&self, marks: &str) -> bool {
    match self {
      MarksBucket::SevenOrEight => marks == "7" || marks == "8",
      MarksBucket::NinePlus => {
        marks.trim().parse::<u32>().is_ok_and(|m| m >= 9)
      }
      MarksBucket::Exact(v) => marks == v,
    }
  }
}

impl From<String> for MarksBucket {
  fn from(s: String) -> Self {
    match s.as_str() {
      "7/8" => MarksBucket::SevenOrEight,
      "9+" => MarksBucket::NinePlus,
      _ => MarksBucket::Exact(s),
    }
  }
}

impl From<&str> for MarksBucket {
  fn from(s: &str) -> Self { Self::from(s.to_owned()) }
}

impl From<MarksBucket> for String {
  fn from(b: MarksBucket) -> Self {
    match b {
      MarksBucket::SevenOrEight => "7/8".to_owned(),
      MarksBucket::NinePlus => "9+".to_owned(),
      MarksBucket::Exact(v) => v,
    }
  }
}

// ─── Sort keys ───────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  Default,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortKey {
  #[default]
  YearDesc,
  YearAsc,
  TitleAsc,
  UpdatedDesc,
  TopicAsc,
  QuestionTypeAsc,
}

// ─── FilterState ─────────────────────────────────────────────────────────────

/// One selected-value set per facet. An empty set means "no constraint".
/// The sets are mutually independent; nothing here clears anything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterState {
  pub origins:        BTreeSet<Origin>,
  pub years:          BTreeSet<String>,
  pub paper_types:    BTreeSet<PaperType>,
  pub question_types: BTreeSet<String>,
  pub source_types:   BTreeSet<String>,
  pub marks:          BTreeSet<MarksBucket>,
  pub topics:         BTreeSet<String>,
}

impl FilterState {
  pub fn is_empty(&self) -> bool {
    self.origins.is_empty()
      && self.years.is_empty()
      && self.paper_types.is_empty()
      && self.question_types.is_empty()
      && self.source_types.is_empty()
      && self.marks.is_empty()
      && self.topics.is_empty()
  }

  /// Display gating only: the question-type facet is offered once a paper
  /// type is selected. Selections are never cleared by this rule.
  pub fn question_type_facet_enabled(&self) -> bool {
    !self.paper_types.is_empty()
  }

  /// Display gating only: the DBQ-only source-type facet is offered while
  /// the paper-type selection includes the DBQ style.
  pub fn source_type_facet_enabled(&self) -> bool {
    self.paper_types.contains(&PaperType::Dbq)
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// One surviving (parent, sub-question) pair. The key is unique within a
/// result set: parent identifier + the child's local key.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionHit<'a> {
  pub key:    String,
  pub parent: &'a ArchiveRecord,
  pub child:  &'a SubQuestion,
}

/// Flatten, filter, and sort.
pub fn filter_and_sort<'a>(
  records: &'a [ArchiveRecord],
  filters: &FilterState,
  search: &str,
  sort: SortKey,
) -> Vec<QuestionHit<'a>> {
  let term = search.trim().to_lowercase();

  let mut hits = Vec::new();
  for parent in records {
    if !parent_passes(parent, filters) {
      continue;
    }
    for child in &parent.sub_questions {
      if !child_passes(parent, child, filters) {
        continue;
      }
      if !term.is_empty() && !search_corpus(parent, child).contains(&term) {
        continue;
      }
      hits.push(QuestionHit {
        key: format!("{}_{}", parent.id, child.key),
        parent,
        child,
      });
    }
  }

  sort_hits(&mut hits, sort);
  hits
}

/// Parent-level gate over origin, year, and paper type.
fn parent_passes(record: &ArchiveRecord, filters: &FilterState) -> bool {
  (filters.origins.is_empty() || filters.origins.contains(&record.origin))
    && (filters.years.is_empty() || filters.years.contains(&record.year))
    && (filters.paper_types.is_empty()
      || filters.paper_types.contains(&record.paper_type))
}

/// Child-level gate over question type, source type, topic, and marks.
fn child_passes(
  parent: &ArchiveRecord,
  child: &SubQuestion,
  filters: &FilterState,
) -> bool {
  let question_type_ok = filters.question_types.is_empty()
    || child.question_type.iter().any(|t| filters.question_types.contains(t));

  let source_type_ok = filters.source_types.is_empty()
    || child.source_type.iter().any(|t| filters.source_types.contains(t));

  // Topic matches against the union of parent and child topics.
  let topic_ok = filters.topics.is_empty()
    || parent
      .topic
      .iter()
      .chain(child.topic.iter())
      .any(|t| filters.topics.contains(t));

  let marks_ok = filters.marks.is_empty()
    || filters.marks.iter().any(|bucket| bucket.matches(&child.marks));

  question_type_ok && source_type_ok && topic_ok && marks_ok
}

/// The lowercased haystack the free-text gate matches against: parent title
/// and topics, child topics, question types, source types, and content.
pub fn search_corpus(parent: &ArchiveRecord, child: &SubQuestion) -> String {
  let mut corpus = String::with_capacity(64);
  let parts = std::iter::once(parent.title.as_str())
    .chain(parent.topic.iter().map(String::as_str))
    .chain(child.topic.iter().map(String::as_str))
    .chain(child.question_type.iter().map(String::as_str))
    .chain(child.source_type.iter().map(String::as_str))
    .chain(std::iter::once(child.content.as_str()));
  for part in parts {
    corpus.push_str(part);
    corpus.push(' ');
  }
  corpus.to_lowercase()
}

fn sort_hits(hits: &mut [QuestionHit<'_>], sort: SortKey) {
  match sort {
    SortKey::YearDesc => {
      hits.sort_by(|a, b| year_value(b.parent).cmp(&year_value(a.parent)));
    }
    SortKey::YearAsc => {
      hits.sort_by(|a, b| year_value(a.parent).cmp(&year_value(b.parent)));
    }
    SortKey::TitleAsc => {
      hits.sort_by(|a, b| a.parent.title.cmp(&b.parent.title));
    }
    SortKey::UpdatedDesc => {
      hits.sort_by(|a, b| updated_value(b.parent).cmp(&updated_value(a.parent)));
    }
    SortKey::TopicAsc => {
      hits.sort_by(|a, b| first_topic(a).cmp(first_topic(b)));
    }
    SortKey::QuestionTypeAsc => {
      hits.sort_by(|a, b| {
        a.child
          .question_type
          .first()
          .unwrap_or("")
          .cmp(b.child.question_type.first().unwrap_or(""))
      });
    }
  }
}

fn year_value(record: &ArchiveRecord) -> i64 {
  record.year.trim().parse().unwrap_or(0)
}

/// Millisecond timestamp of the last write; missing/unparseable is epoch 0.
fn updated_value(record: &ArchiveRecord) -> i64 {
  chrono::DateTime::parse_from_rfc3339(&record.updated_at)
    .map(|dt| dt.timestamp_millis())
    .unwrap_or(0)
}

/// First entry of the parent-or-child topic list, empty string if none.
fn first_topic<'a>(hit: &QuestionHit<'a>) -> &'a str {
  if let Some(topic) = hit.parent.topic.first() {
    topic
  } else {
    hit.child.topic.first().unwrap_or("")
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use crate::record::TagList;

  fn sub(key: &str, marks: &str, qtype: &[&str], topic: &[&str]) -> SubQuestion {
    SubQuestion {
      key: key.to_owned(),
      label: String::new(),
      question_type: TagList::from(qtype),
      content: String::new(),
      topic: TagList::from(topic),
      source_type: TagList::default(),
      marks: marks.to_owned(),
    }
  }

  fn paper(
    id: &str,
    year: &str,
    paper_type: PaperType,
    topic: &[&str],
    subs: Vec<SubQuestion>,
  ) -> ArchiveRecord {
    ArchiveRecord {
      id: id.to_owned(),
      title: format!("{year} paper"),
      origin: Origin::DsePastpaper,
      year: year.to_owned(),
      paper_type,
      topic: TagList::from(topic),
      file_url: None,
      has_file: false,
      answer_file_url: None,
      has_answer: false,
      updated_at: String::new(),
      updated_by: String::new(),
      sub_questions: subs,
    }
  }

  fn fixture() -> Vec<ArchiveRecord> {
    vec![
      paper(
        "A",
        "2021",
        PaperType::Dbq,
        &["Cold War"],
        vec![
          sub("a", "7", &["Attitude"], &[]),
          sub("b", "8", &["View"], &[]),
          sub("c", "12", &["Do you agree?"], &[]),
        ],
      ),
      paper(
        "B",
        "2019",
        PaperType::Essay,
        &[],
        vec![sub("1", "", &["To what extent"], &["Cold War"])],
      ),
    ]
  }

  #[test]
  fn no_filters_returns_every_pair() {
    let records = fixture();
    let hits =
      filter_and_sort(&records, &FilterState::default(), "", SortKey::YearDesc);
    assert_eq!(hits.len(), 4);
    assert_eq!(hits[0].key, "A_a");
  }

  #[test]
  fn engine_is_pure() {
    let records = fixture();
    let filters = FilterState {
      topics: BTreeSet::from(["Cold War".to_owned()]),
      ..FilterState::default()
    };
    let first: Vec<String> =
      filter_and_sort(&records, &filters, "war", SortKey::TitleAsc)
        .into_iter()
        .map(|h| h.key)
        .collect();
    let second: Vec<String> =
      filter_and_sort(&records, &filters, "war", SortKey::TitleAsc)
        .into_iter()
        .map(|h| h.key)
        .collect();
    assert_eq!(first, second);
  }

  #[test]
  fn adding_a_selection_never_grows_the_result() {
    let records = fixture();
    let mut filters = FilterState::default();
    let all =
      filter_and_sort(&records, &filters, "", SortKey::YearDesc).len();

    filters.paper_types.insert(PaperType::Dbq);
    let narrowed =
      filter_and_sort(&records, &filters, "", SortKey::YearDesc).len();
    assert!(narrowed <= all);

    filters.marks.insert(MarksBucket::from("7/8"));
    let narrower =
      filter_and_sort(&records, &filters, "", SortKey::YearDesc).len();
    assert!(narrower <= narrowed);
  }

  #[test]
  fn paper_type_filter_scenario() {
    // A DBQ-only filter keeps exactly A's three sub-questions.
    let records = fixture();
    let filters = FilterState {
      paper_types: BTreeSet::from([PaperType::Dbq]),
      ..FilterState::default()
    };
    let hits = filter_and_sort(&records, &filters, "", SortKey::YearDesc);
    assert_eq!(
      hits.iter().map(|h| h.key.as_str()).collect::<Vec<_>>(),
      ["A_a", "A_b", "A_c"]
    );
  }

  #[test]
  fn marks_bucket_semantics() {
    let eight = MarksBucket::from("8");
    let seven_eight = MarksBucket::from("7/8");
    let nine_plus = MarksBucket::from("9+");
    let seven = MarksBucket::from("7");

    assert!(seven_eight.matches("8"));
    assert!(eight.matches("8"));
    assert!(!seven.matches("8"));
    assert!(!nine_plus.matches("8"));

    assert!(nine_plus.matches("10"));
    assert!(!seven_eight.matches("10"));
    assert!(!MarksBucket::from("10").matches("12"));

    // Non-numeric marks never satisfy "9+".
    assert!(!nine_plus.matches("n/a"));
  }

  #[test]
  fn search_is_case_insensitive_substring() {
    let records = fixture();
    let hits = filter_and_sort(
      &records,
      &FilterState::default(),
      "cold war",
      SortKey::YearDesc,
    );
    // Parent topic on A matches all three of A's children; child topic on B
    // matches its single child.
    assert_eq!(hits.len(), 4);

    let none = filter_and_sort(
      &records,
      &FilterState::default(),
      "decolonisation",
      SortKey::YearDesc,
    );
    assert!(none.is_empty());
  }

  #[test]
  fn year_sorts_numerically_both_ways() {
    let records = fixture();
    let desc =
      filter_and_sort(&records, &FilterState::default(), "", SortKey::YearDesc);
    assert_eq!(desc.first().map(|h| h.parent.id.as_str()), Some("A"));

    let asc =
      filter_and_sort(&records, &FilterState::default(), "", SortKey::YearAsc);
    assert_eq!(asc.first().map(|h| h.parent.id.as_str()), Some("B"));
  }

  #[test]
  fn updated_desc_treats_garbage_as_epoch() {
    let mut records = fixture();
    records[0].updated_at = "not a timestamp".into();
    records[1].updated_at = "2024-05-01T10:00:00+00:00".into();
    let hits = filter_and_sort(
      &records,
      &FilterState::default(),
      "",
      SortKey::UpdatedDesc,
    );
    assert_eq!(hits.first().map(|h| h.parent.id.as_str()), Some("B"));
  }

  #[test]
  fn facet_display_gating() {
    let mut filters = FilterState::default();
    assert!(!filters.question_type_facet_enabled());
    assert!(!filters.source_type_facet_enabled());

    filters.paper_types.insert(PaperType::Essay);
    assert!(filters.question_type_facet_enabled());
    assert!(!filters.source_type_facet_enabled());

    filters.paper_types.insert(PaperType::Dbq);
    assert!(filters.source_type_facet_enabled());
  }
}
