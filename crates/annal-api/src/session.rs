//! Handler for `GET /session` — who am I, and what can I do.
//!
//! Deliberately available to unauthorized identities: the client uses it to
//! decide between the admin, viewer, and unauthorized screens.

use axum::Json;

use annal_core::{
  session::Session,
  store::{ArchiveStore, BlobStore, RoleStore},
};

use crate::auth::CurrentUser;

/// `GET /session`
pub async fn handler<S, B>(CurrentUser(user): CurrentUser) -> Json<Session>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  Json(user)
}
