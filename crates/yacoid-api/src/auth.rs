//! `authtoken` header extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use yacoid_core::{
  Error, identity::Identity, identity::IdentityProvider, store::DefinitionStore,
};

use crate::{AppState, error::ApiError};

/// Header carrying the caller's opaque auth token.
pub const AUTH_TOKEN_HEADER: &str = "authtoken";

/// The resolved identity of the caller. A missing or unknown token is
/// refused with `USER_NOT_FOUND`.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

impl<S, I> FromRequestParts<AppState<S, I>> for Caller
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, I>,
  ) -> Result<Self, Self::Rejection> {
    let token = parts
      .headers
      .get(AUTH_TOKEN_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or(Error::UserNotFound)?;

    let identity = state.moderation.resolve(token).await?;
    Ok(Caller(identity))
  }
}
