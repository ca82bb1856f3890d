//! Translation of [`DefinitionFilter`] and [`DefinitionSort`] into SQL.
//!
//! Only fixed SQL fragments are ever interpolated; every user-supplied value
//! travels as a positional parameter.

use rusqlite::types::Value;
use yacoid_core::store::{DefinitionFilter, DefinitionSort, SortDirection, SortField};

use crate::encode::{encode_dt, encode_uuid};

/// A `WHERE` clause (possibly empty) over the `definitions d` alias, with its
/// parameters in order.
pub struct WhereClause {
  pub sql:    String,
  pub params: Vec<Value>,
}

pub fn where_clause(filter: &DefinitionFilter) -> WhereClause {
  let mut conds: Vec<String> = Vec::new();
  let mut params: Vec<Value> = Vec::new();

  if let Some(title) = &filter.title {
    conds.push("d.title LIKE ? ESCAPE '\\'".to_owned());
    params.push(Value::Text(like_pattern(title)));
  }
  if let Some(content) = &filter.content {
    conds.push("d.content LIKE ? ESCAPE '\\'".to_owned());
    params.push(Value::Text(like_pattern(content)));
  }
  if !filter.publishing_dates.is_empty() {
    conds.push(format!(
      "d.publishing_date IN ({})",
      placeholders(filter.publishing_dates.len())
    ));
    params.extend(
      filter
        .publishing_dates
        .iter()
        .map(|d| Value::Text(encode_dt(*d))),
    );
  }
  if !filter.authors.is_empty() {
    conds.push(format!(
      "d.source_id IN (SELECT sa.source_id FROM source_authors sa WHERE sa.author_id IN ({}))",
      placeholders(filter.authors.len())
    ));
    params.extend(filter.authors.iter().map(|a| Value::Text(encode_uuid(*a))));
  }
  if !filter.sources.is_empty() {
    conds.push(format!("d.source_id IN ({})", placeholders(filter.sources.len())));
    params.extend(filter.sources.iter().map(|s| Value::Text(encode_uuid(*s))));
  }
  if !filter.tags.is_empty() {
    conds.push(format!(
      "EXISTS (SELECT 1 FROM json_each(d.tags) t WHERE t.value IN ({}))",
      placeholders(filter.tags.len())
    ));
    params.extend(filter.tags.iter().map(|t| Value::Text(t.clone())));
  }
  if let Some(approved) = filter.approved {
    conds.push("d.approved = ?".to_owned());
    params.push(Value::Integer(i64::from(approved)));
  }

  let sql = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  WhereClause { sql, params }
}

pub fn order_by(sort: DefinitionSort) -> String {
  let column = match sort.field {
    SortField::SubmittedAt => "d.submitted_at",
    SortField::LastSubmitChangeAt => "d.last_submit_change_at",
    SortField::PublishingDate => "d.publishing_date",
    SortField::Title => "d.title COLLATE NOCASE",
  };
  let dir = match sort.direction {
    SortDirection::Asc => "ASC",
    SortDirection::Desc => "DESC",
  };
  format!("ORDER BY {column} {dir}, d.definition_id {dir}")
}

pub fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

/// `%needle%` with LIKE metacharacters escaped.
fn like_pattern(needle: &str) -> String {
  let mut out = String::with_capacity(needle.len() + 2);
  out.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn empty_filter_has_no_where() {
    let w = where_clause(&DefinitionFilter::default());
    assert!(w.sql.is_empty());
    assert!(w.params.is_empty());
  }

  #[test]
  fn conditions_are_anded_with_matching_params() {
    let filter = DefinitionFilter {
      title: Some("50%".into()),
      sources: vec![Uuid::nil(), Uuid::new_v4()],
      approved: Some(true),
      ..Default::default()
    };
    let w = where_clause(&filter);
    assert_eq!(w.sql.matches(" AND ").count(), 2);
    assert_eq!(w.sql.matches('?').count(), w.params.len());
    assert_eq!(w.params[0], Value::Text("%50\\%%".into()));
    assert_eq!(w.params[3], Value::Integer(1));
  }

  #[test]
  fn sort_is_stable() {
    let sql = order_by(DefinitionSort::default());
    assert_eq!(sql, "ORDER BY d.submitted_at DESC, d.definition_id DESC");
  }
}
