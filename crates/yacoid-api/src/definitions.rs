//! Handlers for `/definitions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/definitions/{id}` | Single definition with its rejection log |
//! | `POST` | `/definitions/submit` | Body: [`DefinitionDraft`]; returns 201 + stored definition |
//! | `POST` | `/definitions/{id}/approve` | Admin only; returns 204 |
//! | `POST` | `/definitions/{id}/reject` | Admin only; body: `{"content":"..."}`; returns 201 + rejection |
//! | `POST` | `/definitions/{id}/change` | Submitter only; body: [`DefinitionPatch`]; returns 204 |
//! | `GET`  | `/definitions/newest` | Optional `limit`, `approved` |
//! | `GET`  | `/definitions/page_count` | Optional `page_size`, `approved` |
//! | `POST` | `/definitions/page` | Body: [`PageBody`] |

use axum::{
  Json,
  extract::{
    Path, Query, State,
    rejection::{JsonRejection, PathRejection, QueryRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use yacoid_core::{
  definition::{Definition, DefinitionDraft, DefinitionPatch, Rejection},
  identity::IdentityProvider,
  store::{DefinitionFilter, DefinitionSort, DefinitionStore},
};

use crate::{AppState, auth::Caller, error::ApiError};

// ─── Reads ────────────────────────────────────────────────────────────────────

/// `GET /definitions/{id}`
pub async fn get_one<S, I>(
  State(state): State<AppState<S, I>>,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Definition>, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Path(id) = id?;
  Ok(Json(state.listing.get_by_id(id).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct NewestParams {
  pub limit:    Option<usize>,
  /// Restrict to approved (`true`) or pending (`false`) definitions.
  pub approved: Option<bool>,
}

/// `GET /definitions/newest[?limit=N][&approved=true]`
pub async fn newest<S, I>(
  State(state): State<AppState<S, I>>,
  params: Result<Query<NewestParams>, QueryRejection>,
) -> Result<Json<Vec<Definition>>, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Query(params) = params?;
  let limit = params.limit.unwrap_or(state.config.newest_limit);
  let filter = DefinitionFilter { approved: params.approved, ..Default::default() };
  Ok(Json(state.listing.get_newest(limit, filter).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct PageCountParams {
  pub page_size: Option<usize>,
  pub approved:  Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PageCount {
  pub count: u64,
}

/// `GET /definitions/page_count[?page_size=N][&approved=true]`
pub async fn page_count<S, I>(
  State(state): State<AppState<S, I>>,
  params: Result<Query<PageCountParams>, QueryRejection>,
) -> Result<Json<PageCount>, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Query(params) = params?;
  let page_size = params.page_size.unwrap_or(state.config.default_page_size);
  let filter = DefinitionFilter { approved: params.approved, ..Default::default() };
  let count = state.listing.get_page_count(page_size, &filter).await?;
  Ok(Json(PageCount { count }))
}

/// JSON body accepted by `POST /definitions/page`.
#[derive(Debug, Deserialize)]
pub struct PageBody {
  pub page_size: Option<usize>,
  /// 1-based.
  #[serde(default = "first_page")]
  pub page:      usize,
  #[serde(default)]
  pub filter:    DefinitionFilter,
  #[serde(default)]
  pub sort:      DefinitionSort,
}

fn first_page() -> usize { 1 }

/// `POST /definitions/page`
pub async fn page<S, I>(
  State(state): State<AppState<S, I>>,
  body: Result<Json<PageBody>, JsonRejection>,
) -> Result<Json<Vec<Definition>>, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Json(body) = body?;
  let page_size = body.page_size.unwrap_or(state.config.default_page_size);
  let definitions = state
    .listing
    .get_page(page_size, body.page, body.filter, body.sort)
    .await?;
  Ok(Json(definitions))
}

// ─── Transitions ──────────────────────────────────────────────────────────────

/// `POST /definitions/submit`: returns 201 + the stored definition.
pub async fn submit<S, I>(
  State(state): State<AppState<S, I>>,
  Caller(identity): Caller,
  body: Result<Json<DefinitionDraft>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Json(draft) = body?;
  let definition = state.moderation.submit(draft, &identity).await?;
  Ok((StatusCode::CREATED, Json(definition)))
}

/// `POST /definitions/{id}/approve`
pub async fn approve<S, I>(
  State(state): State<AppState<S, I>>,
  Caller(identity): Caller,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<StatusCode, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Path(id) = id?;
  state.moderation.approve(id, &identity).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  /// The reason shown to the submitter.
  pub content: String,
}

/// `POST /definitions/{id}/reject`: returns 201 + the appended rejection.
pub async fn reject<S, I>(
  State(state): State<AppState<S, I>>,
  Caller(identity): Caller,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<RejectBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Rejection>), ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let rejection = state.moderation.reject(id, &identity, &body.content).await?;
  Ok((StatusCode::CREATED, Json(rejection)))
}

/// `POST /definitions/{id}/change`. Only the fields present in the body are
/// written.
pub async fn change<S, I>(
  State(state): State<AppState<S, I>>,
  Caller(identity): Caller,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<DefinitionPatch>, JsonRejection>,
) -> Result<StatusCode, ApiError>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  let Path(id) = id?;
  let Json(patch) = body?;
  state.moderation.edit(id, &identity, patch).await?;
  Ok(StatusCode::NO_CONTENT)
}
