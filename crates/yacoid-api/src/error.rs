//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure leaves the API as `{"error": CODE, "message": text}`, where
//! `CODE` is the stable [`ErrorKind`] string.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use yacoid_core::{Error, ErrorKind};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Domain(#[from] Error),

  /// The request could not be decoded into the handler's input type.
  #[error("malformed request: {0}")]
  Malformed(String),
}

impl ApiError {
  pub fn kind(&self) -> ErrorKind {
    match self {
      ApiError::Domain(e) => e.kind(),
      ApiError::Malformed(_) => ErrorKind::InvalidInput,
    }
  }
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
    ErrorKind::UserNotFound => StatusCode::UNAUTHORIZED,
    ErrorKind::DefinitionNotFound
    | ErrorKind::SourceNotFound
    | ErrorKind::AuthorNotFound => StatusCode::NOT_FOUND,
    ErrorKind::NotEnoughPermissions | ErrorKind::BelongsToAnotherUser => StatusCode::FORBIDDEN,
    ErrorKind::AlreadyApproved | ErrorKind::RejectionNotAnsweredYet => StatusCode::CONFLICT,
    ErrorKind::StoreError => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let kind = self.kind();
    let status = status_for(kind);
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    } else {
      tracing::debug!(code = kind.code(), error = %self, "request refused");
    }
    (status, Json(json!({ "error": kind.code(), "message": self.to_string() }))).into_response()
  }
}

impl From<JsonRejection> for ApiError {
  fn from(r: JsonRejection) -> Self { ApiError::Malformed(r.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(r: QueryRejection) -> Self { ApiError::Malformed(r.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(r: PathRejection) -> Self { ApiError::Malformed(r.body_text()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transition_refusals_are_client_errors() {
    for kind in [
      ErrorKind::InvalidInput,
      ErrorKind::UserNotFound,
      ErrorKind::DefinitionNotFound,
      ErrorKind::NotEnoughPermissions,
      ErrorKind::BelongsToAnotherUser,
      ErrorKind::AlreadyApproved,
      ErrorKind::RejectionNotAnsweredYet,
    ] {
      assert!(status_for(kind).is_client_error(), "{kind}");
    }
    assert_eq!(status_for(ErrorKind::StoreError), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn malformed_requests_report_invalid_input() {
    let err = ApiError::Malformed("expected a number".into());
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(status_for(err.kind()), StatusCode::BAD_REQUEST);
  }
}
