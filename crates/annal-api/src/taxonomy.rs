//! Handlers for `/taxonomy`.
//!
//! `GET` returns the materialised facet vocabularies. `POST` is the
//! creatable-select path: an admin proposes a novel value, which is
//! deduplicated into the relevant set (sets are never pruned here).

use axum::{
  Json,
  extract::State,
};
use serde::Deserialize;

use annal_core::{
  record::PaperType,
  store::{ArchiveStore, BlobStore, RoleStore},
  taxonomy::TaxonomyView,
};

use crate::{auth::CurrentUser, error::ApiError, AppState};

/// `GET /taxonomy`
pub async fn get_handler<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<TaxonomyView>, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_authorized() {
    return Err(ApiError::Forbidden("no role assigned".into()));
  }
  let catalog = state.catalog.read().await;
  Ok(Json(catalog.taxonomy().view()))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "facet", rename_all = "camelCase")]
pub enum ProposalBody {
  #[serde(rename_all = "camelCase")]
  Topic { value: String },
  #[serde(rename_all = "camelCase")]
  SourceType { value: String },
  #[serde(rename_all = "camelCase")]
  QuestionType { paper_type: PaperType, value: String },
}

/// `POST /taxonomy` — body: `{"facet":"topic","value":"Decolonisation"}`
pub async fn propose<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<ProposalBody>,
) -> Result<Json<TaxonomyView>, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_admin {
    return Err(ApiError::Forbidden("taxonomy changes require admin".into()));
  }

  let mut catalog = state.catalog.write().await;
  let taxonomy = catalog.taxonomy_mut();
  match body {
    ProposalBody::Topic { value } => {
      taxonomy.propose_topic(&value);
    }
    ProposalBody::SourceType { value } => {
      taxonomy.propose_source_type(&value);
    }
    ProposalBody::QuestionType { paper_type, value } => {
      taxonomy.propose_question_type(paper_type, &value);
    }
  }
  Ok(Json(catalog.taxonomy().view()))
}
