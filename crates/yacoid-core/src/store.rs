//! The `DefinitionStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `yacoid-store-sqlite`).
//! Higher layers depend on this abstraction, not on any concrete backend.
//!
//! # Guarded writes
//!
//! Every state transition after submission is expressed as a write paired
//! with a [`Guard`]. The backend must evaluate the guard against the current
//! stored state and apply the write in one atomic step; two concurrent
//! writers can never both pass a guard against the same stale state. The
//! engine also checks the guard beforehand, but only to produce an early,
//! precise error; the backend's evaluation is the one that counts.
//!
//! The engine stamps `rejected_at` and revision times before the write is
//! issued, and the ledger compares those stamps. A backend must therefore
//! apply writes in the order they were issued by the engines sharing it.
//! Two independent backends writing the same database can commit out of
//! stamp order.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  definition::{Approval, Definition, DefinitionPatch, Rejection},
  ledger,
  source::{Author, Source},
};

// ─── Guards ──────────────────────────────────────────────────────────────────

/// Preconditions a guarded write must satisfy at the moment it is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Guard {
  /// The definition must not be approved.
  pub pending:            bool,
  /// The definition must have been submitted by this user.
  pub owner:              Option<Uuid>,
  /// The definition must have no outstanding rejection.
  pub rejection_answered: bool,
}

impl Guard {
  /// `approved = false`.
  pub fn pending() -> Self { Self { pending: true, ..Self::default() } }

  pub fn owned_by(self, user_id: Uuid) -> Self {
    Self { owner: Some(user_id), ..self }
  }

  pub fn rejection_answered(self) -> Self {
    Self { rejection_answered: true, ..self }
  }

  /// Evaluate the guard against a definition's current state.
  ///
  /// Clauses are checked in a fixed order (approval, ownership, ledger) so a
  /// definition violating several always reports the same one.
  pub fn check(&self, definition: &Definition) -> Result<(), GuardViolation> {
    if self.pending && definition.approved {
      return Err(GuardViolation::Approved);
    }
    if let Some(owner) = self.owner
      && definition.submitted_by != owner
    {
      return Err(GuardViolation::NotOwner);
    }
    if self.rejection_answered
      && ledger::has_outstanding_rejection(
        &definition.rejection_log,
        definition.last_submit_change_at,
      )
    {
      return Err(GuardViolation::RejectionOutstanding);
    }
    Ok(())
  }
}

/// The guard clause that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardViolation {
  Approved,
  NotOwner,
  RejectionOutstanding,
}

/// Result of a guarded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
  Applied,
  /// No definition with the given id exists.
  Missing,
  /// The definition exists but the guard failed; nothing was written.
  Blocked(GuardViolation),
}

// ─── Updates ─────────────────────────────────────────────────────────────────

/// A field-level write to an existing definition. The rejection log is never
/// written through this type; see [`DefinitionStore::append_rejection_if`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionUpdate {
  /// Set `approved`, `approved_by` and `approved_at` together.
  Approve(Approval),
  /// Write the set fields of a non-empty patch and bump
  /// `last_submit_change_at`.
  Revise {
    patch: DefinitionPatch,
    at:    DateTime<Utc>,
  },
}

// ─── Query types ─────────────────────────────────────────────────────────────

/// Filter over stored definitions. Every field is optional; set fields are
/// combined with logical AND. Set-valued fields match when the definition's
/// value is a member of the set (or, for `tags` and `authors`, when the two
/// sets intersect). An empty set-valued field is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionFilter {
  /// Case-insensitive substring of the title.
  pub title:            Option<String>,
  /// Case-insensitive substring of the content.
  pub content:          Option<String>,
  pub publishing_dates: Vec<DateTime<Utc>>,
  /// Any author of the definition's source.
  pub authors:          Vec<Uuid>,
  pub sources:          Vec<Uuid>,
  pub tags:             Vec<String>,
  /// Visibility policy. `Some(true)` restricts to approved definitions.
  pub approved:         Option<bool>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
  #[default]
  SubmittedAt,
  LastSubmitChangeAt,
  PublishingDate,
  Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  Asc,
  #[default]
  Desc,
}

/// Sort order for listings. Ties are broken by `definition_id` so pages are
/// stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionSort {
  pub field:     SortField,
  pub direction: SortDirection,
}

impl DefinitionSort {
  pub fn newest_first() -> Self { Self::default() }
}

/// Parameters for [`DefinitionStore::list_definitions`].
#[derive(Debug, Clone, Default)]
pub struct DefinitionQuery {
  pub filter: DefinitionFilter,
  pub sort:   DefinitionSort,
  pub offset: usize,
  pub limit:  Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a YACOID storage backend.
///
/// Definitions are never deleted, and rejection logs only grow.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait DefinitionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Definitions: writes ──────────────────────────────────────────────

  /// Persist a freshly submitted definition.
  fn insert_definition(
    &self,
    definition: Definition,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Atomically: if `id` exists and `guard` holds, apply `update`.
  fn update_if(
    &self,
    id: Uuid,
    guard: Guard,
    update: DefinitionUpdate,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  /// Atomically: if `id` exists and `guard` holds, append `rejection` to its
  /// rejection log. Existing entries are never rewritten.
  fn append_rejection_if(
    &self,
    id: Uuid,
    guard: Guard,
    rejection: Rejection,
  ) -> impl Future<Output = Result<WriteOutcome, Self::Error>> + Send + '_;

  // ── Definitions: reads ───────────────────────────────────────────────

  /// Retrieve a definition with its full rejection log. `None` if absent.
  fn get_definition(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Definition>, Self::Error>> + Send + '_;

  /// Retrieve every existing definition among `ids`, in the order given.
  /// Unknown ids are skipped.
  fn get_definitions<'a>(
    &'a self,
    ids: &'a [Uuid],
  ) -> impl Future<Output = Result<Vec<Definition>, Self::Error>> + Send + 'a;

  fn list_definitions<'a>(
    &'a self,
    query: &'a DefinitionQuery,
  ) -> impl Future<Output = Result<Vec<Definition>, Self::Error>> + Send + 'a;

  fn count_definitions<'a>(
    &'a self,
    filter: &'a DefinitionFilter,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  // ── Sources & authors ─────────────────────────────────────────────────

  fn insert_author(
    &self,
    author: Author,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_author(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Author>, Self::Error>> + Send + '_;

  fn insert_source(
    &self,
    source: Source,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn get_source(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Source>, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, Utc};

  use super::*;
  use crate::definition::DefinitionDraft;

  fn pending(owner: Uuid) -> Definition {
    let draft = DefinitionDraft::new("Title", "Body", Uuid::new_v4(), Utc::now())
      .with_tags(["a", "b"]);
    Definition::submitted(draft, owner, Utc::now())
  }

  #[test]
  fn guard_reports_approval_first() {
    let owner = Uuid::new_v4();
    let mut def = pending(owner);
    def.approved = true;
    def.approval = Some(Approval { approved_by: Uuid::new_v4(), approved_at: Utc::now() });
    let guard = Guard::pending().owned_by(Uuid::new_v4()).rejection_answered();
    assert_eq!(guard.check(&def), Err(GuardViolation::Approved));
  }

  #[test]
  fn guard_checks_owner() {
    let owner = Uuid::new_v4();
    let def = pending(owner);
    assert_eq!(Guard::pending().owned_by(owner).check(&def), Ok(()));
    assert_eq!(
      Guard::pending().owned_by(Uuid::new_v4()).check(&def),
      Err(GuardViolation::NotOwner)
    );
  }

  #[test]
  fn guard_checks_ledger() {
    let mut def = pending(Uuid::new_v4());
    def.rejection_log.push(Rejection {
      rejection_id: Uuid::new_v4(),
      rejected_by:  Uuid::new_v4(),
      rejected_at:  def.last_submit_change_at + Duration::seconds(1),
      content:      "cite a source".into(),
    });
    assert_eq!(Guard::pending().check(&def), Ok(()));
    assert_eq!(
      Guard::pending().rejection_answered().check(&def),
      Err(GuardViolation::RejectionOutstanding)
    );
  }
}
