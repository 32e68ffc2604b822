//! Handlers for `/roles/:email` — explicit admin role administration.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use serde::Deserialize;

use annal_core::{
  session::Role,
  store::{ArchiveStore, BlobStore, RoleStore},
};

use crate::{auth::CurrentUser, error::ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SetRoleBody {
  pub role: Role,
}

/// `PUT /roles/:email` — body: `{"role":"viewer"}`
pub async fn set<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
  Path(email): Path<String>,
  Json(body): Json<SetRoleBody>,
) -> Result<StatusCode, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_admin {
    return Err(ApiError::Forbidden("role changes require admin".into()));
  }
  state
    .store
    .set_role(&email, body.role)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /roles/:email`
pub async fn clear<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
  Path(email): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_admin {
    return Err(ApiError::Forbidden("role changes require admin".into()));
  }
  state
    .store
    .clear_role(&email)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
