//! Definition types, the moderated unit of the YACOID store.
//!
//! A definition is submitted by a user, may be rejected and revised any
//! number of times, and finally approved by an administrator. Once approved
//! it is read-only forever.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::{Error, Result, ledger};

// ─── Field ───────────────────────────────────────────────────────────────────

/// A sparse-update slot: either "leave as is" or "replace with this value".
///
/// `Set(String::new())` and `Set(BTreeSet::new())` are explicit values and
/// are distinct from `Unset`. When deserialised with `#[serde(default)]`, a
/// missing key becomes `Unset` and any present value becomes `Set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
  Unset,
  Set(T),
}

impl<T> Field<T> {
  pub fn is_set(&self) -> bool { matches!(self, Self::Set(_)) }

  pub fn as_set(&self) -> Option<&T> {
    match self {
      Self::Set(v) => Some(v),
      Self::Unset => None,
    }
  }

  pub fn into_set(self) -> Option<T> {
    match self {
      Self::Set(v) => Some(v),
      Self::Unset => None,
    }
  }

  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Field<U> {
    match self {
      Self::Set(v) => Field::Set(f(v)),
      Self::Unset => Field::Unset,
    }
  }
}

impl<T> Default for Field<T> {
  fn default() -> Self { Self::Unset }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
  fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
    T::deserialize(d).map(Field::Set)
  }
}

// ─── Approval & rejection ────────────────────────────────────────────────────

/// Who approved a definition and when. Both halves exist together or not at
/// all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
  pub approved_by: Uuid,
  pub approved_at: DateTime<Utc>,
}

/// One administrator's refusal of a definition in its then-current form.
/// Immutable once appended to a definition's rejection log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
  pub rejection_id: Uuid,
  pub rejected_by:  Uuid,
  /// Server-assigned.
  pub rejected_at:  DateTime<Utc>,
  /// Free-text reason; never blank.
  pub content:      String,
}

// ─── Definition ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
  pub definition_id:         Uuid,
  pub submitted_by:          Uuid,
  pub submitted_at:          DateTime<Utc>,
  /// Bumped on the initial submit and on every accepted edit.
  pub last_submit_change_at: DateTime<Utc>,
  /// Authoritative approval flag; always equal to `approval.is_some()`.
  pub approved:              bool,
  pub approval:              Option<Approval>,
  pub title:                 String,
  pub content:               String,
  pub source:                Uuid,
  pub publishing_date:       DateTime<Utc>,
  pub tags:                  BTreeSet<String>,
  /// Append-only; ordered by `rejected_at`.
  pub rejection_log:         Vec<Rejection>,
}

impl Definition {
  /// Build a freshly submitted, pending definition.
  pub fn submitted(
    draft: DefinitionDraft,
    submitted_by: Uuid,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      definition_id: Uuid::new_v4(),
      submitted_by,
      submitted_at: now,
      last_submit_change_at: now,
      approved: false,
      approval: None,
      title: draft.title,
      content: draft.content,
      source: draft.source,
      publishing_date: draft.publishing_date,
      tags: draft.tags,
      rejection_log: Vec::new(),
    }
  }

  /// True while the latest rejection has not been answered by an edit.
  pub fn has_outstanding_rejection(&self) -> bool {
    ledger::has_outstanding_rejection(
      &self.rejection_log,
      self.last_submit_change_at,
    )
  }

  /// Apply a patch in memory. Returns `false` if the patch was empty and
  /// nothing (including the change timestamp) was touched.
  pub fn apply_patch(&mut self, patch: DefinitionPatch, at: DateTime<Utc>) -> bool {
    if patch.is_empty() {
      return false;
    }
    if let Field::Set(title) = patch.title {
      self.title = title;
    }
    if let Field::Set(content) = patch.content {
      self.content = content;
    }
    if let Field::Set(source) = patch.source {
      self.source = source;
    }
    if let Field::Set(tags) = patch.tags {
      self.tags = tags;
    }
    self.last_submit_change_at = at;
    true
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::lifecycle::Moderation::submit`]. Identity, timestamps
/// and approval state are always assigned by the engine.
#[derive(Debug, Clone, Deserialize)]
pub struct DefinitionDraft {
  pub title:           String,
  pub content:         String,
  pub source:          Uuid,
  pub publishing_date: DateTime<Utc>,
  #[serde(default)]
  pub tags:            BTreeSet<String>,
}

impl DefinitionDraft {
  pub fn new(
    title: impl Into<String>,
    content: impl Into<String>,
    source: Uuid,
    publishing_date: DateTime<Utc>,
  ) -> Self {
    Self {
      title: title.into(),
      content: content.into(),
      source,
      publishing_date,
      tags: BTreeSet::new(),
    }
  }

  pub fn with_tags<I, T>(mut self, tags: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    self.tags = tags.into_iter().map(Into::into).collect();
    self
  }

  /// Trim text fields and check that every required field has content.
  pub fn normalize(mut self) -> Result<Self> {
    let mut problems = Vec::new();
    self.title = required_text("title", self.title, &mut problems);
    self.content = required_text("content", self.content, &mut problems);
    self.tags = normalize_tags(self.tags, &mut problems);
    if problems.is_empty() {
      Ok(self)
    } else {
      Err(Error::Validation(problems))
    }
  }
}

/// The editable subset of a pending definition. Absent fields stay as they
/// are; `publishing_date` and provenance fields cannot be changed here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DefinitionPatch {
  #[serde(default)]
  pub title:   Field<String>,
  #[serde(default)]
  pub content: Field<String>,
  #[serde(default)]
  pub source:  Field<Uuid>,
  #[serde(default)]
  pub tags:    Field<BTreeSet<String>>,
}

impl DefinitionPatch {
  pub fn is_empty(&self) -> bool {
    !(self.title.is_set()
      || self.content.is_set()
      || self.source.is_set()
      || self.tags.is_set())
  }

  pub fn normalize(self) -> Result<Self> {
    let mut problems = Vec::new();
    let patch = Self {
      title:   self.title.map(|t| required_text("title", t, &mut problems)),
      content: self
        .content
        .map(|c| required_text("content", c, &mut problems)),
      source:  self.source,
      tags:    self.tags.map(|t| normalize_tags(t, &mut problems)),
    };
    if problems.is_empty() {
      Ok(patch)
    } else {
      Err(Error::Validation(problems))
    }
  }
}

fn required_text(name: &str, value: String, problems: &mut Vec<String>) -> String {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    problems.push(format!("{name} must not be blank"));
  }
  trimmed.to_owned()
}

fn normalize_tags(tags: BTreeSet<String>, problems: &mut Vec<String>) -> BTreeSet<String> {
  let normalized: BTreeSet<String> = tags.iter().map(|t| t.trim().to_owned()).collect();
  if normalized.iter().any(String::is_empty) {
    problems.push("tags must not contain blank entries".to_owned());
  }
  normalized
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn draft() -> DefinitionDraft {
    DefinitionDraft::new(
      "Entropy",
      "A measure of disorder.",
      Uuid::new_v4(),
      Utc.with_ymd_and_hms(1865, 1, 1, 0, 0, 0).unwrap(),
    )
  }

  #[test]
  fn patch_missing_keys_are_unset() {
    let patch: DefinitionPatch =
      serde_json::from_str(r#"{"content":"new body"}"#).unwrap();
    assert_eq!(patch.title, Field::Unset);
    assert_eq!(patch.content, Field::Set("new body".to_owned()));
    assert!(!patch.tags.is_set());
  }

  #[test]
  fn patch_explicit_empty_tags_are_set() {
    let patch: DefinitionPatch = serde_json::from_str(r#"{"tags":[]}"#).unwrap();
    assert_eq!(patch.tags, Field::Set(BTreeSet::new()));
    assert!(!patch.is_empty());
  }

  #[test]
  fn empty_patch_touches_nothing() {
    let now = Utc::now();
    let mut def = Definition::submitted(draft(), Uuid::new_v4(), now);
    let before = def.clone();
    let changed = def.apply_patch(DefinitionPatch::default(), now + chrono::Duration::hours(1));
    assert!(!changed);
    assert_eq!(def, before);
  }

  #[test]
  fn patch_bumps_change_timestamp() {
    let now = Utc::now();
    let later = now + chrono::Duration::minutes(5);
    let mut def = Definition::submitted(draft(), Uuid::new_v4(), now);
    let patch = DefinitionPatch {
      title: Field::Set("Entropy (thermodynamics)".into()),
      ..Default::default()
    };
    assert!(def.apply_patch(patch, later));
    assert_eq!(def.title, "Entropy (thermodynamics)");
    assert_eq!(def.last_submit_change_at, later);
    assert_eq!(def.submitted_at, now);
  }

  #[test]
  fn draft_requires_title_and_content() {
    let mut d = draft();
    d.title = "   ".into();
    d.content = String::new();
    let err = d.normalize().unwrap_err();
    assert!(matches!(err, Error::Validation(ref p) if p.len() == 2), "{err}");
  }

  #[test]
  fn draft_tags_default_to_empty_and_are_trimmed() {
    let d: DefinitionDraft = serde_json::from_value(serde_json::json!({
      "title": "t",
      "content": "c",
      "source": Uuid::nil(),
      "publishing_date": "2020-01-01T00:00:00Z",
    }))
    .unwrap();
    assert!(d.tags.is_empty());

    let d = draft().with_tags([" physics", "physics "]).normalize().unwrap();
    assert_eq!(d.tags.into_iter().collect::<Vec<_>>(), vec!["physics"]);
  }

  #[test]
  fn patch_rejects_blank_title() {
    let patch = DefinitionPatch {
      title: Field::Set(" ".into()),
      ..Default::default()
    };
    assert!(matches!(patch.normalize(), Err(Error::Validation(_))));
  }

  #[test]
  fn new_submission_is_pending_and_clean() {
    let now = Utc::now();
    let def = Definition::submitted(draft(), Uuid::new_v4(), now);
    assert!(!def.approved);
    assert!(def.approval.is_none());
    assert!(def.rejection_log.is_empty());
    assert_eq!(def.submitted_at, def.last_submit_change_at);
    assert!(!def.has_outstanding_rejection());
  }
}
