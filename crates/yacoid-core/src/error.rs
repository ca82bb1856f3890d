//! Error types for `yacoid-core`.
//!
//! Every [`Error`] variant maps to exactly one [`ErrorKind`], whose string
//! form is the stable machine-readable code handed to clients.

use serde::Serialize;
use strum::{Display, IntoStaticStr};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {}", .0.join(", "))]
  Validation(Vec<String>),

  #[error("no user for the supplied auth token")]
  UserNotFound,

  #[error("definition not found: {0}")]
  DefinitionNotFound(Uuid),

  #[error("source not found: {0}")]
  SourceNotFound(Uuid),

  #[error("author not found: {0}")]
  AuthorNotFound(Uuid),

  #[error("user {0} lacks admin privilege")]
  Permission(Uuid),

  #[error("definition {definition} was submitted by another user than {user}")]
  Ownership { definition: Uuid, user: Uuid },

  #[error("definition {0} is already approved")]
  AlreadyApproved(Uuid),

  #[error("definition {0} has a rejection the author has not answered yet")]
  RejectionNotAnsweredYet(Uuid),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  /// Build a [`Error::Validation`] from a single message.
  pub fn invalid(message: impl Into<String>) -> Self {
    Self::Validation(vec![message.into()])
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) => ErrorKind::InvalidInput,
      Self::UserNotFound => ErrorKind::UserNotFound,
      Self::DefinitionNotFound(_) => ErrorKind::DefinitionNotFound,
      Self::SourceNotFound(_) => ErrorKind::SourceNotFound,
      Self::AuthorNotFound(_) => ErrorKind::AuthorNotFound,
      Self::Permission(_) => ErrorKind::NotEnoughPermissions,
      Self::Ownership { .. } => ErrorKind::BelongsToAnotherUser,
      Self::AlreadyApproved(_) => ErrorKind::AlreadyApproved,
      Self::RejectionNotAnsweredYet(_) => ErrorKind::RejectionNotAnsweredYet,
      Self::Store(_) => ErrorKind::StoreError,
    }
  }
}

// ─── ErrorKind ───────────────────────────────────────────────────────────────

/// The stable, machine-readable classification of an [`Error`].
///
/// The `Display`/`&'static str` form is the wire code. Codes are part of the
/// public contract and must never be renamed.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize,
)]
pub enum ErrorKind {
  #[strum(serialize = "INVALID_INPUT")]
  #[serde(rename = "INVALID_INPUT")]
  InvalidInput,
  #[strum(serialize = "USER_NOT_FOUND")]
  #[serde(rename = "USER_NOT_FOUND")]
  UserNotFound,
  #[strum(serialize = "DEFINITION_NOT_FOUND")]
  #[serde(rename = "DEFINITION_NOT_FOUND")]
  DefinitionNotFound,
  #[strum(serialize = "SOURCE_NOT_FOUND")]
  #[serde(rename = "SOURCE_NOT_FOUND")]
  SourceNotFound,
  #[strum(serialize = "AUTHOR_NOT_FOUND")]
  #[serde(rename = "AUTHOR_NOT_FOUND")]
  AuthorNotFound,
  #[strum(serialize = "NOT_ENOUGH_PERMISSIONS")]
  #[serde(rename = "NOT_ENOUGH_PERMISSIONS")]
  NotEnoughPermissions,
  #[strum(serialize = "DEFINITION_BELONGS_TO_ANOTHER_USER")]
  #[serde(rename = "DEFINITION_BELONGS_TO_ANOTHER_USER")]
  BelongsToAnotherUser,
  #[strum(serialize = "DEFINITION_ALREADY_APPROVED")]
  #[serde(rename = "DEFINITION_ALREADY_APPROVED")]
  AlreadyApproved,
  #[strum(serialize = "DEFINITION_REJECTION_NOT_ANSWERED_YET")]
  #[serde(rename = "DEFINITION_REJECTION_NOT_ANSWERED_YET")]
  RejectionNotAnsweredYet,
  #[strum(serialize = "STORE_ERROR")]
  #[serde(rename = "STORE_ERROR")]
  StoreError,
}

impl ErrorKind {
  pub fn code(self) -> &'static str { self.into() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn codes_are_stable() {
    let id = Uuid::nil();
    assert_eq!(
      Error::AlreadyApproved(id).kind().code(),
      "DEFINITION_ALREADY_APPROVED"
    );
    assert_eq!(
      Error::RejectionNotAnsweredYet(id).kind().to_string(),
      "DEFINITION_REJECTION_NOT_ANSWERED_YET"
    );
    assert_eq!(
      Error::Ownership { definition: id, user: id }.kind().code(),
      "DEFINITION_BELONGS_TO_ANOTHER_USER"
    );
    assert_eq!(Error::invalid("x").kind().code(), "INVALID_INPUT");
  }

  #[test]
  fn serialised_kind_matches_code() {
    let json = serde_json::to_string(&ErrorKind::NotEnoughPermissions).unwrap();
    assert_eq!(json, "\"NOT_ENOUGH_PERMISSIONS\"");
  }
}
