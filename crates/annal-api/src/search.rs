//! Handler for `GET /search`.
//!
//! Query params map onto [`FilterState`] facets; multi-select facets are
//! accepted as comma-separated strings. The handler runs the pure
//! filter/sort engine over the cached record list and returns the flattened
//! (parent, sub-question) pairs.

use std::collections::BTreeSet;
use std::str::FromStr as _;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::{Deserialize, Serialize};

use annal_core::{
  filter::{filter_and_sort, FilterState, MarksBucket, SortKey},
  record::{ArchiveRecord, Origin, PaperType, SubQuestion},
  store::{ArchiveStore, BlobStore, RoleStore},
};

use crate::{auth::CurrentUser, error::ApiError, AppState};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
  /// Free-text search term.
  pub q:             Option<String>,
  /// Comma-separated origin strings, e.g. `DSE Pastpaper,Quiz`.
  pub origin:        Option<String>,
  /// Comma-separated year strings.
  pub year:          Option<String>,
  /// Comma-separated paper-type strings.
  pub paper_type:    Option<String>,
  pub question_type: Option<String>,
  pub source_type:   Option<String>,
  /// Comma-separated marks buckets: literals, `7/8`, `9+`.
  pub marks:         Option<String>,
  pub topic:         Option<String>,
  pub sort:          Option<SortKey>,
}

/// Split a comma-separated multi-select param into trimmed values.
fn split_values(raw: &Option<String>) -> impl Iterator<Item = &str> {
  raw
    .as_deref()
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|v| !v.is_empty())
}

impl SearchParams {
  fn filter_state(&self) -> Result<FilterState, ApiError> {
    let mut origins = BTreeSet::new();
    for value in split_values(&self.origin) {
      origins.insert(Origin::from_str(value).map_err(|_| {
        ApiError::BadRequest(format!("unknown origin: {value:?}"))
      })?);
    }

    let mut paper_types = BTreeSet::new();
    for value in split_values(&self.paper_type) {
      paper_types.insert(PaperType::from_str(value).map_err(|_| {
        ApiError::BadRequest(format!("unknown paper type: {value:?}"))
      })?);
    }

    Ok(FilterState {
      origins,
      paper_types,
      years: split_values(&self.year).map(str::to_owned).collect(),
      question_types: split_values(&self.question_type)
        .map(str::to_owned)
        .collect(),
      source_types: split_values(&self.source_type)
        .map(str::to_owned)
        .collect(),
      marks: split_values(&self.marks).map(MarksBucket::from).collect(),
      topics: split_values(&self.topic).map(str::to_owned).collect(),
    })
  }
}

/// One flattened result pair on the wire.
#[derive(Debug, Serialize)]
pub struct SearchHit {
  pub key:    String,
  pub parent: ArchiveRecord,
  pub child:  SubQuestion,
}

/// `GET /search[?q=...][&origin=...][&paperType=...][&marks=...][&sort=...]`
pub async fn handler<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
  Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SearchHit>>, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_authorized() {
    return Err(ApiError::Forbidden("no role assigned".into()));
  }

  let filters = params.filter_state()?;
  let search = params.q.as_deref().unwrap_or_default();
  let sort = params.sort.unwrap_or_default();

  let catalog = state.catalog.read().await;
  let hits = filter_and_sort(catalog.records(), &filters, search, sort)
    .into_iter()
    .map(|hit| SearchHit {
      key:    hit.key,
      parent: hit.parent.clone(),
      child:  hit.child.clone(),
    })
    .collect();
  Ok(Json(hits))
}
