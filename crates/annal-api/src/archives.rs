//! Handlers for `/archives` endpoints.
//!
//! | Method   | Path                | Notes |
//! |----------|---------------------|-------|
//! | `GET`    | `/archives`         | Cached list; viewer or admin |
//! | `POST`   | `/archives`         | Create; admin only |
//! | `POST`   | `/archives/refresh` | Full re-fetch + taxonomy rebuild |
//! | `GET`    | `/archives/:id`     | 404 if not found |
//! | `PUT`    | `/archives/:id`     | Update; admin only |
//! | `DELETE` | `/archives/:id`     | Delete record + stored files |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Deserialize;
use serde_json::json;

use annal_core::{
  form::Draft,
  pipeline::{
    delete_archive, save_archive, DeleteOutcome, RejectReason, SaveOutcome,
    SaveRequest, SaveTarget,
  },
  record::ArchiveRecord,
  store::{ArchiveStore, BlobStore, PendingUpload, RoleStore},
};

use crate::{auth::CurrentUser, error::ApiError, AppState};

// ─── Request bodies ──────────────────────────────────────────────────────────

/// A base64-encoded file travelling inside the save request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
  pub data:         String,
  #[serde(default = "default_extension")]
  pub extension:    String,
  #[serde(default = "default_content_type")]
  pub content_type: String,
}

fn default_extension() -> String { "pdf".to_owned() }

fn default_content_type() -> String { "application/pdf".to_owned() }

impl FilePayload {
  fn into_upload(self) -> Result<PendingUpload, ApiError> {
    let bytes = B64
      .decode(self.data.as_bytes())
      .map_err(|_| ApiError::BadRequest("file data is not base64".into()))?;
    Ok(PendingUpload {
      bytes:        bytes.into(),
      extension:    self.extension,
      content_type: self.content_type,
    })
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveBody {
  #[serde(flatten)]
  pub draft:        Draft,
  pub question_pdf: Option<FilePayload>,
  pub answer_pdf:   Option<FilePayload>,
}

impl SaveBody {
  fn into_request(self, target: SaveTarget) -> Result<SaveRequest, ApiError> {
    Ok(SaveRequest {
      target,
      draft: self.draft,
      question_pdf: self.question_pdf.map(FilePayload::into_upload).transpose()?,
      answer_pdf: self.answer_pdf.map(FilePayload::into_upload).transpose()?,
    })
  }
}

fn reject(reason: RejectReason) -> ApiError {
  match reason {
    RejectReason::NotAdmin => ApiError::Forbidden(reason.to_string()),
    _ => ApiError::BadRequest(reason.to_string()),
  }
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// `GET /archives`
pub async fn list<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<ArchiveRecord>>, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_authorized() {
    return Err(ApiError::Forbidden("no role assigned".into()));
  }
  let catalog = state.catalog.read().await;
  Ok(Json(catalog.records().to_vec()))
}

/// `GET /archives/:id`
pub async fn get_one<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<Json<ArchiveRecord>, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_authorized() {
    return Err(ApiError::Forbidden("no role assigned".into()));
  }

  if let Some(record) = state.catalog.read().await.get(&id) {
    return Ok(Json(record.clone()));
  }
  let record = state
    .store
    .get_archive(&id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("archive {id} not found")))?;
  Ok(Json(record))
}

/// `POST /archives/refresh` — full fetch + taxonomy rebuild.
///
/// A fetch failure is logged and leaves the current list untouched; the
/// caller sees the cached state either way.
pub async fn refresh<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  if !user.is_authorized() {
    return Err(ApiError::Forbidden("no role assigned".into()));
  }

  match state.store.list_archives().await {
    Ok(records) => {
      let mut catalog = state.catalog.write().await;
      catalog.replace_all(records);
      Ok(Json(json!({ "count": catalog.len() })))
    }
    Err(e) => {
      tracing::error!(error = %e, "archive fetch failed; keeping cached list");
      let catalog = state.catalog.read().await;
      Ok(Json(json!({ "count": catalog.len() })))
    }
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// `POST /archives`
pub async fn create<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
  Json(body): Json<SaveBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  let request = body.into_request(SaveTarget::Create)?;
  let mut catalog = state.catalog.write().await;
  let outcome = save_archive(
    state.store.as_ref(),
    state.blobs.as_ref(),
    &mut catalog,
    &user,
    request,
  )
  .await?;

  match outcome {
    SaveOutcome::Saved(record) => Ok((StatusCode::CREATED, Json(record))),
    SaveOutcome::Rejected(reason) => Err(reject(reason)),
  }
}

/// `PUT /archives/:id`
pub async fn update<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
  Json(body): Json<SaveBody>,
) -> Result<Json<ArchiveRecord>, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  let request = body.into_request(SaveTarget::Update { id })?;
  let mut catalog = state.catalog.write().await;
  let outcome = save_archive(
    state.store.as_ref(),
    state.blobs.as_ref(),
    &mut catalog,
    &user,
    request,
  )
  .await?;

  match outcome {
    SaveOutcome::Saved(record) => Ok(Json(record)),
    SaveOutcome::Rejected(reason) => Err(reject(reason)),
  }
}

/// `DELETE /archives/:id`
pub async fn delete_one<S, B>(
  State(state): State<AppState<S, B>>,
  CurrentUser(user): CurrentUser,
  Path(id): Path<String>,
) -> Result<StatusCode, ApiError>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  let mut catalog = state.catalog.write().await;
  let outcome = delete_archive(
    state.store.as_ref(),
    state.blobs.as_ref(),
    &mut catalog,
    &user,
    &id,
  )
  .await?;

  match outcome {
    DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
    DeleteOutcome::Rejected(reason) => Err(reject(reason)),
  }
}
