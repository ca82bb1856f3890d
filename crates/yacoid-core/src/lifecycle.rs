//! The definition lifecycle engine.
//!
//! ```text
//!   submit ──► Pending ──approve──► Approved (terminal, read-only)
//!                │  ▲
//!         reject │  │ edit (owner only; answers the rejection)
//!                ▼  │
//!        Pending, rejection outstanding ──approve──► Approved
//! ```
//!
//! Each transition is checked locally for a precise error and then written
//! through one guarded store operation that re-checks the same guard
//! atomically. State preconditions (existence, approval, ownership) are
//! checked before the request's own input is validated. Nothing is cached between calls; the store is the only source
//! of truth.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  clock::{Clock, SystemClock},
  definition::{Approval, Definition, DefinitionDraft, DefinitionPatch, Rejection},
  identity::{Identity, IdentityProvider, resolve_identity},
  store::{DefinitionStore, DefinitionUpdate, Guard, GuardViolation, WriteOutcome},
};

/// Runs moderation transitions against a store.
///
/// Cloning is cheap; the store and identity provider are reference-counted.
pub struct Moderation<S, I, C = SystemClock> {
  pub(crate) store:      Arc<S>,
  pub(crate) identities: Arc<I>,
  pub(crate) clock:      C,
}

impl<S, I, C: Clone> Clone for Moderation<S, I, C> {
  fn clone(&self) -> Self {
    Self {
      store:      self.store.clone(),
      identities: self.identities.clone(),
      clock:      self.clock.clone(),
    }
  }
}

impl<S, I> Moderation<S, I, SystemClock> {
  pub fn new(store: Arc<S>, identities: Arc<I>) -> Self {
    Self { store, identities, clock: SystemClock }
  }
}

impl<S, I, C> Moderation<S, I, C> {
  /// Replace the time source.
  pub fn with_clock<C2>(self, clock: C2) -> Moderation<S, I, C2> {
    Moderation { store: self.store, identities: self.identities, clock }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }
}

impl<S, I, C> Moderation<S, I, C>
where
  S: DefinitionStore,
  I: IdentityProvider,
  C: Clock,
{
  // ── Transitions ───────────────────────────────────────────────────────

  /// Submit a new definition. Always legal for an authenticated identity;
  /// the referenced source must exist.
  pub async fn submit(&self, draft: DefinitionDraft, identity: &Identity) -> Result<Definition> {
    let draft = draft.normalize()?;
    self.require_source(draft.source).await?;

    let definition = Definition::submitted(draft, identity.user_id, self.clock.now());
    self
      .store
      .insert_definition(definition.clone())
      .await
      .map_err(Error::store)?;

    tracing::info!(
      definition_id = %definition.definition_id,
      by = %identity.user_id,
      "definition submitted"
    );
    Ok(definition)
  }

  /// Approve a pending definition. Admin only; terminal.
  pub async fn approve(&self, id: Uuid, identity: &Identity) -> Result<()> {
    identity.require_admin()?;
    let guard = Guard::pending();
    let current = self.load(id).await?;
    violation_to_error(id, identity, guard.check(&current))?;

    let approval = Approval { approved_by: identity.user_id, approved_at: self.clock.now() };
    let outcome = self
      .store
      .update_if(id, guard, DefinitionUpdate::Approve(approval))
      .await
      .map_err(Error::store)?;
    settle(id, identity, outcome)?;

    tracing::info!(definition_id = %id, by = %identity.user_id, "definition approved");
    Ok(())
  }

  /// Reject a pending definition with a reason. Admin only. Refused while a
  /// previous rejection is still unanswered by the author.
  pub async fn reject(&self, id: Uuid, identity: &Identity, reason: &str) -> Result<Rejection> {
    identity.require_admin()?;
    let guard = Guard::pending().rejection_answered();
    let current = self.load(id).await?;
    violation_to_error(id, identity, guard.check(&current))?;

    let reason = reason.trim();
    if reason.is_empty() {
      return Err(Error::invalid("rejection reason must not be blank"));
    }

    let rejection = Rejection {
      rejection_id: Uuid::new_v4(),
      rejected_by:  identity.user_id,
      rejected_at:  self.clock.now(),
      content:      reason.to_owned(),
    };
    let outcome = self
      .store
      .append_rejection_if(id, guard, rejection.clone())
      .await
      .map_err(Error::store)?;
    settle(id, identity, outcome)?;

    tracing::info!(
      definition_id = %id,
      by = %identity.user_id,
      rejections = current.rejection_log.len() + 1,
      "definition rejected"
    );
    Ok(rejection)
  }

  /// Revise a pending definition. Only its submitter may do this, admin or
  /// not. An empty patch writes nothing and does not answer a rejection.
  pub async fn edit(&self, id: Uuid, identity: &Identity, patch: DefinitionPatch) -> Result<()> {
    let guard = Guard::pending().owned_by(identity.user_id);
    let current = self.load(id).await?;
    violation_to_error(id, identity, guard.check(&current))?;

    let patch = patch.normalize()?;
    if patch.is_empty() {
      tracing::debug!(definition_id = %id, "empty edit ignored");
      return Ok(());
    }
    if let Some(&source) = patch.source.as_set() {
      self.require_source(source).await?;
    }

    let update = DefinitionUpdate::Revise { patch, at: self.clock.now() };
    let outcome = self
      .store
      .update_if(id, guard, update)
      .await
      .map_err(Error::store)?;
    settle(id, identity, outcome)?;

    tracing::info!(
      definition_id = %id,
      by = %identity.user_id,
      answered = current.has_outstanding_rejection(),
      "definition revised"
    );
    Ok(())
  }

  // ── Token entry points ────────────────────────────────────────────────

  pub async fn resolve(&self, token: &str) -> Result<Identity> {
    resolve_identity(self.identities.as_ref(), token).await
  }

  pub async fn submit_with_token(&self, draft: DefinitionDraft, token: &str) -> Result<Definition> {
    let identity = self.resolve(token).await?;
    self.submit(draft, &identity).await
  }

  pub async fn approve_with_token(&self, id: Uuid, token: &str) -> Result<()> {
    let identity = self.resolve(token).await?;
    self.approve(id, &identity).await
  }

  pub async fn reject_with_token(&self, id: Uuid, token: &str, reason: &str) -> Result<Rejection> {
    let identity = self.resolve(token).await?;
    self.reject(id, &identity, reason).await
  }

  pub async fn edit_with_token(&self, id: Uuid, token: &str, patch: DefinitionPatch) -> Result<()> {
    let identity = self.resolve(token).await?;
    self.edit(id, &identity, patch).await
  }

  // ── Helpers ───────────────────────────────────────────────────────────

  async fn load(&self, id: Uuid) -> Result<Definition> {
    self
      .store
      .get_definition(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DefinitionNotFound(id))
  }

  async fn require_source(&self, id: Uuid) -> Result<()> {
    self
      .store
      .get_source(id)
      .await
      .map_err(Error::store)?
      .map(|_| ())
      .ok_or(Error::SourceNotFound(id))
  }
}

fn violation_to_error(
  id: Uuid,
  identity: &Identity,
  check: Result<(), GuardViolation>,
) -> Result<()> {
  check.map_err(|violation| match violation {
    GuardViolation::Approved => Error::AlreadyApproved(id),
    GuardViolation::NotOwner => Error::Ownership { definition: id, user: identity.user_id },
    GuardViolation::RejectionOutstanding => Error::RejectionNotAnsweredYet(id),
  })
}

/// Turn a store write outcome into the caller-facing result.
fn settle(id: Uuid, identity: &Identity, outcome: WriteOutcome) -> Result<()> {
  match outcome {
    WriteOutcome::Applied => Ok(()),
    WriteOutcome::Missing => Err(Error::DefinitionNotFound(id)),
    WriteOutcome::Blocked(violation) => {
      // The local check passed, so another writer got in between.
      tracing::warn!(definition_id = %id, ?violation, "guarded write lost a race");
      violation_to_error(id, identity, Err(violation))
    }
  }
}
