//! Identities and the [`IdentityProvider`] seam.
//!
//! Sessions, passwords and token issuance live outside this crate. The
//! engine only ever sees a resolved [`Identity`].

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub user_id:  Uuid,
  pub is_admin: bool,
}

impl Identity {
  pub fn user(user_id: Uuid) -> Self { Self { user_id, is_admin: false } }

  pub fn admin(user_id: Uuid) -> Self { Self { user_id, is_admin: true } }

  /// Fail with [`Error::Permission`] unless this identity is an admin.
  pub fn require_admin(&self) -> Result<()> {
    if self.is_admin {
      Ok(())
    } else {
      Err(Error::Permission(self.user_id))
    }
  }
}

/// A registered user, as held by an identity backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub user_id:    Uuid,
  pub name:       String,
  pub is_admin:   bool,
  pub created_at: DateTime<Utc>,
}

impl User {
  pub fn identity(&self) -> Identity {
    Identity { user_id: self.user_id, is_admin: self.is_admin }
  }
}

/// Resolves opaque auth tokens to identities.
pub trait IdentityProvider: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up the identity behind `token`. Returns `None` for unknown tokens.
  fn resolve<'a>(
    &'a self,
    token: &'a str,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + 'a;
}

/// Resolve `token` or fail with [`Error::UserNotFound`].
pub async fn resolve_identity<I>(provider: &I, token: &str) -> Result<Identity>
where
  I: IdentityProvider,
{
  provider
    .resolve(token)
    .await
    .map_err(Error::store)?
    .ok_or(Error::UserNotFound)
}
