//! Session/role resolution.
//!
//! The identity provider is an external collaborator; all the core consumes
//! is the authenticated email (and display name). Roles come from per-email
//! records in the document store, with one hardcoded super-admin fallback so
//! the instance can never lock itself out.

use serde::{Deserialize, Serialize};

use crate::store::RoleStore;

/// Fallback super admin: always an admin, independent of the role store.
pub const SUPER_ADMIN_EMAIL: &str = "ethanng.520021231@gmail.com";

// ─── Role ────────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Viewer,
}

// ─── Session ─────────────────────────────────────────────────────────────────

/// The resolved capabilities of one authenticated identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub email:        String,
  pub display_name: Option<String>,
  pub is_admin:     bool,
  pub is_viewer:    bool,
}

impl Session {
  pub fn is_authorized(&self) -> bool { self.is_admin || self.is_viewer }

  /// An admin session without a role lookup — test and tooling convenience.
  pub fn admin(email: &str) -> Self {
    Self {
      email:        email.to_owned(),
      display_name: None,
      is_admin:     true,
      is_viewer:    false,
    }
  }

  pub fn viewer(email: &str) -> Self {
    Self {
      email:        email.to_owned(),
      display_name: None,
      is_admin:     false,
      is_viewer:    true,
    }
  }
}

/// Map an authenticated email to its capabilities.
///
/// A role-lookup failure is logged and treated as "no role found": the user
/// is not blocked from signing in, they are simply rendered unauthorized.
pub async fn resolve_session<R: RoleStore>(
  roles: &R,
  email: &str,
  display_name: Option<String>,
) -> Session {
  let mut is_admin = email == SUPER_ADMIN_EMAIL;
  let mut is_viewer = false;

  match roles.get_role(email).await {
    Ok(Some(Role::Admin)) => is_admin = true,
    Ok(Some(Role::Viewer)) => is_viewer = true,
    Ok(None) => {}
    Err(e) => {
      tracing::warn!(error = %e, email, "role lookup failed; treating as no role");
    }
  }

  Session { email: email.to_owned(), display_name, is_admin, is_viewer }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
