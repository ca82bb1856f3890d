//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that SQL string
//! comparison matches chronological order. Tag sets are stored as compact
//! JSON arrays. UUIDs are stored as hyphenated lowercase strings.

use std::collections::BTreeSet;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;
use yacoid_core::{
  definition::{Approval, Definition, Rejection},
  identity::User,
  source::Author,
};

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &BTreeSet<String>) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<BTreeSet<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawDefinition::from_row`].
pub const DEFINITION_COLUMNS: &str = "
  d.definition_id, d.submitted_by, d.submitted_at, d.last_submit_change_at,
  d.approved, d.approved_by, d.approved_at,
  d.title, d.content, d.source_id, d.publishing_date, d.tags";

/// Raw values read directly from a `definitions` row.
pub struct RawDefinition {
  pub definition_id:         String,
  pub submitted_by:          String,
  pub submitted_at:          String,
  pub last_submit_change_at: String,
  pub approved:              bool,
  pub approved_by:           Option<String>,
  pub approved_at:           Option<String>,
  pub title:                 String,
  pub content:               String,
  pub source_id:             String,
  pub publishing_date:       String,
  pub tags:                  String,
}

impl RawDefinition {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      definition_id:         row.get(0)?,
      submitted_by:          row.get(1)?,
      submitted_at:          row.get(2)?,
      last_submit_change_at: row.get(3)?,
      approved:              row.get(4)?,
      approved_by:           row.get(5)?,
      approved_at:           row.get(6)?,
      title:                 row.get(7)?,
      content:               row.get(8)?,
      source_id:             row.get(9)?,
      publishing_date:       row.get(10)?,
      tags:                  row.get(11)?,
    })
  }

  /// Decode into a [`Definition`] with the given (already ordered) log.
  pub fn into_definition(self, rejection_log: Vec<Rejection>) -> Result<Definition> {
    let approval = match (self.approved_by, self.approved_at) {
      (Some(by), Some(at)) => Some(Approval {
        approved_by: decode_uuid(&by)?,
        approved_at: decode_dt(&at)?,
      }),
      (None, None) => None,
      _ => {
        return Err(Error::Corrupt(format!(
          "definition {} has a half-set approval",
          self.definition_id
        )));
      }
    };
    if approval.is_some() != self.approved {
      return Err(Error::Corrupt(format!(
        "definition {} approval flag disagrees with approval metadata",
        self.definition_id
      )));
    }

    Ok(Definition {
      definition_id: decode_uuid(&self.definition_id)?,
      submitted_by: decode_uuid(&self.submitted_by)?,
      submitted_at: decode_dt(&self.submitted_at)?,
      last_submit_change_at: decode_dt(&self.last_submit_change_at)?,
      approved: self.approved,
      approval,
      title: self.title,
      content: self.content,
      source: decode_uuid(&self.source_id)?,
      publishing_date: decode_dt(&self.publishing_date)?,
      tags: decode_tags(&self.tags)?,
      rejection_log,
    })
  }
}

/// Column list matching [`RawRejection::from_row`].
pub const REJECTION_COLUMNS: &str =
  "r.definition_id, r.rejection_id, r.rejected_by, r.rejected_at, r.content";

/// Raw values read from a `rejections` row, plus its owning definition.
pub struct RawRejection {
  pub definition_id: String,
  pub rejection_id:  String,
  pub rejected_by:   String,
  pub rejected_at:   String,
  pub content:       String,
}

impl RawRejection {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      definition_id: row.get(0)?,
      rejection_id:  row.get(1)?,
      rejected_by:   row.get(2)?,
      rejected_at:   row.get(3)?,
      content:       row.get(4)?,
    })
  }

  pub fn into_rejection(self) -> Result<Rejection> {
    Ok(Rejection {
      rejection_id: decode_uuid(&self.rejection_id)?,
      rejected_by:  decode_uuid(&self.rejected_by)?,
      rejected_at:  decode_dt(&self.rejected_at)?,
      content:      self.content,
    })
  }
}

pub struct RawAuthor {
  pub author_id:    String,
  pub first_name:   String,
  pub last_name:    String,
  pub submitted_by: String,
  pub submitted_at: String,
}

impl RawAuthor {
  pub fn into_author(self) -> Result<Author> {
    Ok(Author {
      author_id:    decode_uuid(&self.author_id)?,
      first_name:   self.first_name,
      last_name:    self.last_name,
      submitted_by: decode_uuid(&self.submitted_by)?,
      submitted_at: decode_dt(&self.submitted_at)?,
    })
  }
}

pub struct RawUser {
  pub user_id:    String,
  pub name:       String,
  pub is_admin:   bool,
  pub created_at: String,
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:    decode_uuid(&self.user_id)?,
      name:       self.name,
      is_admin:   self.is_admin,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let base = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    let a = encode_dt(base);
    let b = encode_dt(base + Duration::nanoseconds(1));
    let c = encode_dt(base + Duration::milliseconds(250));
    assert_eq!(a.len(), b.len());
    assert!(a < b && b < c, "{a} {b} {c}");
    assert_eq!(decode_dt(&b).unwrap(), base + Duration::nanoseconds(1));
  }
}
