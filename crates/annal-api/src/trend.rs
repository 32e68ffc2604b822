//! Handler for `GET /trend` — the DSE DBQ topic trend grid.

use axum::{
  Json,
  extract::State,
};

use annal_core::{
  store::{ArchiveStore, BlobStore, RoleStore},
  trend::{TrendGrid, TrendView},
};

use crate::{auth::CurrentUser, error::ApiError, AppState};

/// `GET /trend`
pub async fn handler<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<TrendView>, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_authorized() {
    return Err(ApiError::Forbidden("no role assigned".into()));
  }
  let catalog = state.catalog.read().await;
  Ok(Json(TrendGrid::build(catalog.records()).view()))
}
