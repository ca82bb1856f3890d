//! Handlers for `/authors` and `/sources`.
//!
//! Any authenticated caller may create either; a source must name at least
//! one existing author.

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
};
use uuid::Uuid;
use yacoid_core::{
  Error,
  identity::IdentityProvider,
  source::{Author, NewAuthor, NewSource, Source},
  store::DefinitionStore,
};

use crate::{AppState, auth::Caller, error::ApiError};

// ─── Authors ──────────────────────────────────────────────────────────────────

/// `POST /authors`, body: `{"first_name":"...","last_name":"..."}`.
pub async fn create_author<S, I>(
  State(state): State<AppState<S, I>>,
  Caller(identity): Caller,
  body: Result<Json<NewAuthor>, JsonRejection>,
) -> Result<(StatusCode, Json<Author>), ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Json(input) = body?;
  let author = state.moderation.create_author(input, &identity).await?;
  Ok((StatusCode::CREATED, Json(author)))
}

/// `GET /authors/{id}`
pub async fn get_author<S, I>(
  State(state): State<AppState<S, I>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Author>, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Path(id) = id?;
  let author = state
    .moderation
    .store()
    .get_author(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::AuthorNotFound(id))?;
  Ok(Json(author))
}

// ─── Sources ──────────────────────────────────────────────────────────────────

/// `POST /sources`, body: `{"authors":["<uuid>", ...]}`.
pub async fn create_source<S, I>(
  State(state): State<AppState<S, I>>,
  Caller(identity): Caller,
  body: Result<Json<NewSource>, JsonRejection>,
) -> Result<(StatusCode, Json<Source>), ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Json(input) = body?;
  let source = state.moderation.create_source(input, &identity).await?;
  Ok((StatusCode::CREATED, Json(source)))
}

/// `GET /sources/{id}`
pub async fn get_source<S, I>(
  State(state): State<AppState<S, I>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Source>, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Path(id) = id?;
  let source = state
    .moderation
    .store()
    .get_source(id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::SourceNotFound(id))?;
  Ok(Json(source))
}
