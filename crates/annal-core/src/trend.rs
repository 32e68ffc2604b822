//! Topic trend analysis over the DSE DBQ subset.
//!
//! Builds a year × question-slot grid of topic tags and classifies the raw
//! tags into a fixed category set for the aggregate counters.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
  record::{ArchiveRecord, Origin, PaperType},
  taxonomy::SENTINEL_YEARS,
};

// ─── Question slots ──────────────────────────────────────────────────────────

/// The four DBQ question slots, detected from the record title.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  strum::Display,
)]
pub enum QuestionSlot {
  Q1,
  Q2,
  Q3,
  Q4,
}

impl QuestionSlot {
  pub const ALL: [QuestionSlot; 4] =
    [QuestionSlot::Q1, QuestionSlot::Q2, QuestionSlot::Q3, QuestionSlot::Q4];

  /// First matching "Q1".."Q4" substring wins, in that priority order.
  /// A title with none is excluded from the grid.
  pub fn from_title(title: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|slot| title.contains(&slot.to_string()))
  }
}

// ─── Categories ──────────────────────────────────────────────────────────────

/// The fixed category set for the aggregate counters.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Serialize,
  strum::Display,
)]
pub enum TopicCategory {
  #[strum(serialize = "First World War")]
  FirstWorldWar,
  #[strum(serialize = "Second World War")]
  SecondWorldWar,
  #[strum(serialize = "Cold War")]
  ColdWar,
  #[strum(serialize = "Hong Kong")]
  HongKong,
  #[strum(serialize = "China")]
  China,
  #[strum(serialize = "Japan")]
  Japan,
  #[strum(serialize = "International Cooperation")]
  InternationalCooperation,
}

/// Keyword groups in priority order. A tag matching several groups counts
/// only toward the first; "Hong Kong (…)" therefore never counts as China.
const KEYWORD_GROUPS: [(TopicCategory, &[&str]); 7] = [
  (TopicCategory::FirstWorldWar, &["first world war", "ww1"]),
  (TopicCategory::SecondWorldWar, &["second world war", "ww2"]),
  (TopicCategory::ColdWar, &["cold war"]),
  (TopicCategory::HongKong, &["hong kong", "hk"]),
  (TopicCategory::China, &["china"]),
  (TopicCategory::Japan, &["japan"]),
  (TopicCategory::InternationalCooperation, &["international", "cooperation"]),
];

impl TopicCategory {
  pub const ALL: [TopicCategory; 7] = [
    TopicCategory::FirstWorldWar,
    TopicCategory::SecondWorldWar,
    TopicCategory::ColdWar,
    TopicCategory::HongKong,
    TopicCategory::China,
    TopicCategory::Japan,
    TopicCategory::InternationalCooperation,
  ];

  /// Classify one raw tag by case-insensitive substring match.
  pub fn classify(tag: &str) -> Option<Self> {
    let t = tag.to_lowercase();
    KEYWORD_GROUPS
      .iter()
      .find(|(_, keywords)| keywords.iter().any(|k| t.contains(k)))
      .map(|(category, _)| *category)
  }
}

// ─── TrendGrid ───────────────────────────────────────────────────────────────

/// Year × question-slot grid of normalised topic lists.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendGrid {
  years: Vec<String>,
  cells: BTreeMap<(String, QuestionSlot), Vec<String>>,
}

impl TrendGrid {
  /// Build from the DSE-pastpaper DBQ subset of `records`. The sentinel
  /// years are present even when no data landed on them.
  pub fn build(records: &[ArchiveRecord]) -> Self {
    let mut observed: BTreeSet<String> = BTreeSet::new();
    let mut cells = BTreeMap::new();

    let subset = records.iter().filter(|r| {
      r.origin == Origin::DsePastpaper && r.paper_type == PaperType::Dbq
    });
    for record in subset {
      observed.insert(record.year.clone());
      let Some(slot) = QuestionSlot::from_title(&record.title) else {
        continue;
      };
      cells
        .insert((record.year.clone(), slot), record.topic.as_slice().to_vec());
    }

    // Year axis: SP, PP, then everything observed, ascending numeric-aware.
    let mut years: Vec<String> =
      SENTINEL_YEARS.iter().map(|s| (*s).to_owned()).collect();
    let mut rest: Vec<String> = observed
      .into_iter()
      .filter(|y| !SENTINEL_YEARS.contains(&y.as_str()))
      .collect();
    rest.sort_by(|a, b| {
      year_sort_value(a).cmp(&year_sort_value(b)).then_with(|| a.cmp(b))
    });
    years.extend(rest);

    Self { years, cells }
  }

  pub fn years(&self) -> &[String] { &self.years }

  pub fn cell(&self, year: &str, slot: QuestionSlot) -> &[String] {
    self
      .cells
      .get(&(year.to_owned(), slot))
      .map(Vec::as_slice)
      .unwrap_or(&[])
  }

  /// Aggregate counts per category: every populated cell contributes at most
  /// one increment per category, no matter how many of its tags match it.
  pub fn category_totals(&self) -> BTreeMap<TopicCategory, usize> {
    let mut totals: BTreeMap<TopicCategory, usize> =
      TopicCategory::ALL.into_iter().map(|c| (c, 0)).collect();

    for topics in self.cells.values() {
      let mut in_this_cell = BTreeSet::new();
      for tag in topics {
        if let Some(category) = TopicCategory::classify(tag) {
          in_this_cell.insert(category);
        }
      }
      for category in in_this_cell {
        *totals.entry(category).or_insert(0) += 1;
      }
    }
    totals
  }

  /// Serialisable snapshot: year axis, cells keyed year → slot → tags, and
  /// the aggregate counters.
  pub fn view(&self) -> TrendView {
    let mut cells: BTreeMap<String, BTreeMap<String, Vec<String>>> =
      BTreeMap::new();
    for ((year, slot), topics) in &self.cells {
      cells
        .entry(year.clone())
        .or_default()
        .insert(slot.to_string(), topics.clone());
    }
    TrendView {
      years: self.years.clone(),
      questions: QuestionSlot::ALL.iter().map(|q| q.to_string()).collect(),
      cells,
      totals: self
        .category_totals()
        .into_iter()
        .map(|(c, n)| (c.to_string(), n))
        .collect(),
    }
  }
}

fn year_sort_value(year: &str) -> i64 { year.trim().parse().unwrap_or(0) }

#[derive(Debug, Clone, Serialize)]
pub struct TrendView {
  pub years:     Vec<String>,
  pub questions: Vec<String>,
  pub cells:     BTreeMap<String, BTreeMap<String, Vec<String>>>,
  pub totals:    BTreeMap<String, usize>,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
