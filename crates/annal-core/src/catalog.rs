//! The in-memory record list and its taxonomy.
//!
//! The catalog is populated by one full fetch after authentication and then
//! kept current only through the mutation pipeline's optimistic updates —
//! there is no subscription or cache invalidation beyond that. Signing out
//! discards it entirely.

use crate::{record::ArchiveRecord, taxonomy::FacetTaxonomy};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
  records:  Vec<ArchiveRecord>,
  taxonomy: FacetTaxonomy,
}

impl Catalog {
  pub fn new() -> Self { Self::default() }

  pub fn records(&self) -> &[ArchiveRecord] { &self.records }

  pub fn taxonomy(&self) -> &FacetTaxonomy { &self.taxonomy }

  /// Mutable taxonomy access for creatable-select proposals.
  pub fn taxonomy_mut(&mut self) -> &mut FacetTaxonomy { &mut self.taxonomy }

  pub fn get(&self, id: &str) -> Option<&ArchiveRecord> {
    self.records.iter().find(|r| r.id == id)
  }

  pub fn len(&self) -> usize { self.records.len() }

  pub fn is_empty(&self) -> bool { self.records.is_empty() }

  /// Install the result of a successful full fetch; the taxonomy is rebuilt
  /// from scratch.
  pub fn replace_all(&mut self, records: Vec<ArchiveRecord>) {
    self.taxonomy = FacetTaxonomy::rebuild(&records);
    self.records = records;
  }

  /// Reflect a successful create/update without a re-fetch: replace in place
  /// if the id is known, otherwise prepend (newest first). The taxonomy is
  /// unioned, never recomputed.
  pub fn absorb(&mut self, record: ArchiveRecord) {
    self.taxonomy.absorb(&record);
    match self.records.iter_mut().find(|r| r.id == record.id) {
      Some(existing) => *existing = record,
      None => self.records.insert(0, record),
    }
  }

  pub fn remove(&mut self, id: &str) {
    self.records.retain(|r| r.id != id);
  }

  /// Sign-out: drop all cached records and derived state immediately.
  pub fn clear(&mut self) {
    self.records.clear();
    self.taxonomy = FacetTaxonomy::seeded();
  }
}
