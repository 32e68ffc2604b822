//! Facet taxonomy — the distinct known values for every filterable dimension.
//!
//! The taxonomy is rebuilt from the full record collection on every
//! successful fetch and incrementally unioned (never rescanned, never pruned
//! except by explicit admin action) after every create/update. Everything is
//! kept in ordered sets so extraction is deterministic and idempotent.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::record::{ArchiveRecord, PaperType};

// ─── Seed vocabulary ─────────────────────────────────────────────────────────

/// Synthetic year tokens for the specimen and practice papers. Always present
/// in the year facet and always sorted first, in this order.
pub const SENTINEL_YEARS: [&str; 2] = ["SP", "PP"];

pub const SEED_TOPICS: [&str; 8] = [
  "Japan (1900-1945)",
  "China (Modernization)",
  "Cold War",
  "First World War",
  "Second World War",
  "International Cooperation",
  "Hong Kong (Political)",
  "Hong Kong (Social)",
];

pub const SEED_DBQ_QUESTION_TYPES: [&str; 8] = [
  "Attitude",
  "View",
  "Message/Cartoon Analysis",
  "Utility/Usefulness",
  "Comparison (Source vs Source)",
  "Single Factor Relative Importance",
  "Do you agree?",
  "Trace and Explain",
];

pub const SEED_ESSAY_QUESTION_TYPES: [&str; 5] = [
  "Dual Factor Relative Importance",
  "To what extent",
  "Trace and Explain",
  "Significance",
  "Comparison (Factor vs Factor)",
];

// ─── FacetTaxonomy ───────────────────────────────────────────────────────────

/// Distinct facet values observed in the data, plus the seed vocabulary.
/// Question types are partitioned by the paper type of the record they were
/// observed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetTaxonomy {
  topics:         BTreeSet<String>,
  source_types:   BTreeSet<String>,
  question_types: BTreeMap<PaperType, BTreeSet<String>>,
  years:          BTreeSet<String>,
}

impl Default for FacetTaxonomy {
  fn default() -> Self { Self::seeded() }
}

impl FacetTaxonomy {
  /// The taxonomy before any data has been observed: seed topics, seed
  /// question types per paper type, the sentinel years, no source types.
  pub fn seeded() -> Self {
    let mut question_types = BTreeMap::new();
    question_types.insert(
      PaperType::Dbq,
      SEED_DBQ_QUESTION_TYPES.iter().map(|s| (*s).to_owned()).collect(),
    );
    question_types.insert(
      PaperType::Essay,
      SEED_ESSAY_QUESTION_TYPES.iter().map(|s| (*s).to_owned()).collect(),
    );
    Self {
      topics: SEED_TOPICS.iter().map(|s| (*s).to_owned()).collect(),
      source_types: BTreeSet::new(),
      question_types,
      years: SENTINEL_YEARS.iter().map(|s| (*s).to_owned()).collect(),
    }
  }

  /// Full extraction: a single pass over `records` on top of the seeds.
  pub fn rebuild(records: &[ArchiveRecord]) -> Self {
    let mut taxonomy = Self::seeded();
    for record in records {
      taxonomy.absorb(record);
    }
    taxonomy
  }

  /// Union every facet value carried by one record into the taxonomy.
  /// Used incrementally after a create/update to avoid a full rescan.
  pub fn absorb(&mut self, record: &ArchiveRecord) {
    for tag in &record.topic {
      self.insert_nonempty_topic(tag);
    }
    if !record.year.is_empty() {
      self.years.insert(record.year.clone());
    }
    for sq in &record.sub_questions {
      for tag in &sq.topic {
        self.insert_nonempty_topic(tag);
      }
      for tag in &sq.source_type {
        if !tag.is_empty() {
          self.source_types.insert(tag.clone());
        }
      }
      let bucket = self.question_types.entry(record.paper_type).or_default();
      for tag in &sq.question_type {
        if !tag.is_empty() {
          bucket.insert(tag.clone());
        }
      }
    }
  }

  fn insert_nonempty_topic(&mut self, tag: &str) {
    if !tag.is_empty() {
      self.topics.insert(tag.to_owned());
    }
  }

  // ── Creatable-select proposals ────────────────────────────────────────

  /// Propose a novel topic typed by the user. Returns whether it was new.
  pub fn propose_topic(&mut self, value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && self.topics.insert(value.to_owned())
  }

  pub fn propose_source_type(&mut self, value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && self.source_types.insert(value.to_owned())
  }

  pub fn propose_question_type(
    &mut self,
    paper: PaperType,
    value: &str,
  ) -> bool {
    let value = value.trim();
    !value.is_empty()
      && self.question_types.entry(paper).or_default().insert(value.to_owned())
  }

  // ── Materialised views ────────────────────────────────────────────────

  pub fn topics(&self) -> Vec<String> { self.topics.iter().cloned().collect() }

  pub fn source_types(&self) -> Vec<String> {
    self.source_types.iter().cloned().collect()
  }

  pub fn question_types(&self, paper: PaperType) -> Vec<String> {
    self
      .question_types
      .get(&paper)
      .map(|set| set.iter().cloned().collect())
      .unwrap_or_default()
  }

  /// Years sorted for display: the sentinels first (SP, then PP), then every
  /// observed year descending, numeric-aware.
  pub fn years(&self) -> Vec<String> {
    let mut out: Vec<String> =
      SENTINEL_YEARS.iter().map(|s| (*s).to_owned()).collect();
    let mut rest: Vec<&String> = self
      .years
      .iter()
      .filter(|y| !SENTINEL_YEARS.contains(&y.as_str()))
      .collect();
    rest.sort_by(|a, b| {
      year_sort_value(b)
        .cmp(&year_sort_value(a))
        .then_with(|| b.cmp(a))
    });
    out.extend(rest.into_iter().cloned());
    out
  }

  /// Snapshot of every facet list, for serialisation.
  pub fn view(&self) -> TaxonomyView {
    TaxonomyView {
      topics:               self.topics(),
      source_types:         self.source_types(),
      dbq_question_types:   self.question_types(PaperType::Dbq),
      essay_question_types: self.question_types(PaperType::Essay),
      years:                self.years(),
    }
  }
}

fn year_sort_value(year: &str) -> i64 { year.trim().parse().unwrap_or(0) }

/// Serialisable snapshot of the taxonomy.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyView {
  pub topics:               Vec<String>,
  pub source_types:         Vec<String>,
  pub dbq_question_types:   Vec<String>,
  pub essay_question_types: Vec<String>,
  pub years:                Vec<String>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
