//! JSON REST API for the annal pastpaper archive.
//!
//! Exposes an axum [`Router`] backed by any document store implementing
//! [`ArchiveStore`] + [`RoleStore`] and any [`BlobStore`]. TLS and transport
//! concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", annal_api::api_router(state))
//! ```

pub mod archives;
pub mod auth;
pub mod error;
pub mod roles;
pub mod search;
pub mod session;
pub mod taxonomy;
pub mod trend;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use tokio::sync::RwLock;

use annal_core::{
  catalog::Catalog,
  store::{ArchiveStore, BlobStore, RoleStore},
};

pub use auth::AuthConfig;
pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
///
/// The catalog is the single in-memory record list + taxonomy; handlers that
/// mutate take the write lock for the whole operation, which also serialises
/// concurrent submissions the way the original single-threaded UI did.
pub struct AppState<S, B> {
  pub store:   Arc<S>,
  pub blobs:   Arc<B>,
  pub catalog: Arc<RwLock<Catalog>>,
  pub auth:    Arc<AuthConfig>,
}

impl<S, B> Clone for AppState<S, B> {
  fn clone(&self) -> Self {
    Self {
      store:   Arc::clone(&self.store),
      blobs:   Arc::clone(&self.blobs),
      catalog: Arc::clone(&self.catalog),
      auth:    Arc::clone(&self.auth),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
pub fn api_router<S, B>(state: AppState<S, B>) -> Router<()>
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Archives
    .route(
      "/archives",
      get(archives::list::<S, B>).post(archives::create::<S, B>),
    )
    .route("/archives/refresh", post(archives::refresh::<S, B>))
    .route(
      "/archives/{id}",
      get(archives::get_one::<S, B>)
        .put(archives::update::<S, B>)
        .delete(archives::delete_one::<S, B>),
    )
    // Derived views
    .route("/search", get(search::handler::<S, B>))
    .route(
      "/taxonomy",
      get(taxonomy::get_handler::<S, B>).post(taxonomy::propose::<S, B>),
    )
    .route("/trend", get(trend::handler::<S, B>))
    // Identity
    .route("/session", get(session::handler::<S, B>))
    .route(
      "/roles/{email}",
      put(roles::set::<S, B>).delete(roles::clear::<S, B>),
    )
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
