//! Sources and authors: referenced, never owned, by definitions.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  clock::Clock,
  identity::{Identity, IdentityProvider},
  lifecycle::Moderation,
  store::DefinitionStore,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
  pub author_id:    Uuid,
  pub first_name:   String,
  pub last_name:    String,
  pub submitted_by: Uuid,
  pub submitted_at: DateTime<Utc>,
}

/// A work definitions can cite. Always has at least one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
  pub source_id:    Uuid,
  pub authors:      Vec<Uuid>,
  pub submitted_by: Uuid,
  pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAuthor {
  pub first_name: String,
  pub last_name:  String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSource {
  pub authors: Vec<Uuid>,
}

impl<S, I, C> Moderation<S, I, C>
where
  S: DefinitionStore,
  I: IdentityProvider,
  C: Clock,
{
  pub async fn create_author(&self, input: NewAuthor, identity: &Identity) -> Result<Author> {
    let first_name = input.first_name.trim().to_owned();
    let last_name = input.last_name.trim().to_owned();
    let mut problems = Vec::new();
    if first_name.is_empty() {
      problems.push("first_name must not be blank".to_owned());
    }
    if last_name.is_empty() {
      problems.push("last_name must not be blank".to_owned());
    }
    if !problems.is_empty() {
      return Err(Error::Validation(problems));
    }

    let author = Author {
      author_id: Uuid::new_v4(),
      first_name,
      last_name,
      submitted_by: identity.user_id,
      submitted_at: self.clock.now(),
    };
    self
      .store
      .insert_author(author.clone())
      .await
      .map_err(Error::store)?;
    tracing::info!(author_id = %author.author_id, by = %identity.user_id, "author created");
    Ok(author)
  }

  pub async fn create_source(&self, input: NewSource, identity: &Identity) -> Result<Source> {
    let mut seen = HashSet::new();
    let mut authors = input.authors;
    authors.retain(|id| seen.insert(*id));
    if authors.is_empty() {
      return Err(Error::invalid("a source needs at least one author"));
    }
    for &author_id in &authors {
      self
        .store
        .get_author(author_id)
        .await
        .map_err(Error::store)?
        .ok_or(Error::AuthorNotFound(author_id))?;
    }

    let source = Source {
      source_id: Uuid::new_v4(),
      authors,
      submitted_by: identity.user_id,
      submitted_at: self.clock.now(),
    };
    self
      .store
      .insert_source(source.clone())
      .await
      .map_err(Error::store)?;
    tracing::info!(source_id = %source.source_id, by = %identity.user_id, "source created");
    Ok(source)
  }
}
