//! JSON REST API for YACOID.
//!
//! Exposes an axum [`Router`] backed by any [`DefinitionStore`] and
//! [`IdentityProvider`]. Callers authenticate with an opaque token in the
//! `authtoken` header; TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", yacoid_api::api_router(state))
//! ```

pub mod auth;
pub mod definitions;
pub mod error;
pub mod sources;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use yacoid_core::{
  identity::IdentityProvider, lifecycle::Moderation, listing::Listing, store::DefinitionStore,
};

pub use error::{ApiError, status_for};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Defaults applied when a listing request leaves a size unspecified.
#[derive(Debug, Clone, Copy)]
pub struct ApiConfig {
  pub default_page_size: usize,
  pub newest_limit:      usize,
}

impl Default for ApiConfig {
  fn default() -> Self { Self { default_page_size: 4, newest_limit: 4 } }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S, I> {
  pub moderation: Moderation<S, I>,
  pub listing:    Listing<S>,
  pub config:     Arc<ApiConfig>,
}

impl<S, I> AppState<S, I>
where
  S: DefinitionStore,
{
  pub fn new(store: Arc<S>, identities: Arc<I>, config: ApiConfig) -> Self {
    Self {
      moderation: Moderation::new(store.clone(), identities),
      listing:    Listing::new(store),
      config:     Arc::new(config),
    }
  }
}

impl<S, I> Clone for AppState<S, I> {
  fn clone(&self) -> Self {
    Self {
      moderation: self.moderation.clone(),
      listing:    self.listing.clone(),
      config:     self.config.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, I>(state: AppState<S, I>) -> Router<()>
where
  S: DefinitionStore + 'static,
  I: IdentityProvider + 'static,
{
  Router::new()
    // Definitions: reads
    .route("/definitions/newest", get(definitions::newest::<S, I>))
    .route("/definitions/page_count", get(definitions::page_count::<S, I>))
    .route("/definitions/page", post(definitions::page::<S, I>))
    .route("/definitions/{id}", get(definitions::get_one::<S, I>))
    // Definitions: transitions
    .route("/definitions/submit", post(definitions::submit::<S, I>))
    .route("/definitions/{id}/approve", post(definitions::approve::<S, I>))
    .route("/definitions/{id}/reject", post(definitions::reject::<S, I>))
    .route("/definitions/{id}/change", post(definitions::change::<S, I>))
    // Provenance
    .route("/authors", post(sources::create_author::<S, I>))
    .route("/authors/{id}", get(sources::get_author::<S, I>))
    .route("/sources", post(sources::create_source::<S, I>))
    .route("/sources/{id}", get(sources::get_source::<S, I>))
    .with_state(state)
}
