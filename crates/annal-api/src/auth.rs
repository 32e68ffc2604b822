//! HTTP Basic-auth extractor with role resolution.
//!
//! The external identity provider is out of scope here: requests arrive with
//! Basic credentials whose username is the authenticated email and whose
//! password is the shared instance secret (argon2 PHC hash in config).
//! Once the secret checks out, the email is resolved to a [`Session`] via
//! the role store; an unauthorized user still authenticates fine — the data
//! routes then refuse them.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use annal_core::{
  session::{resolve_session, Session},
  store::{ArchiveStore, BlobStore, RoleStore},
};

use crate::{error::ApiError, AppState};

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// The authenticated identity's resolved capabilities.
pub struct CurrentUser(pub Session);

/// Pull `(email, password)` out of a Basic authorization header.
fn basic_credentials(headers: &HeaderMap) -> Result<(String, String), ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds =
    std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (email, password) =
    creds.split_once(':').ok_or(ApiError::Unauthorized)?;
  Ok((email.to_owned(), password.to_owned()))
}

/// Verify the shared instance secret.
pub fn verify_secret(
  password: &str,
  config: &AuthConfig,
) -> Result<(), ApiError> {
  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;
  Ok(())
}

impl<S, B> FromRequestParts<AppState<S, B>> for CurrentUser
where
  S: ArchiveStore + RoleStore + Clone + Send + Sync + 'static,
  B: BlobStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, B>,
  ) -> Result<Self, Self::Rejection> {
    let (email, password) = basic_credentials(&parts.headers)?;
    verify_secret(&password, &state.auth)?;

    let display_name = parts
      .headers
      .get("x-display-name")
      .and_then(|v| v.to_str().ok())
      .map(str::to_owned);

    let session =
      resolve_session(state.store.as_ref(), &email, display_name).await;
    Ok(CurrentUser(session))
  }
}
