//! Read-only listing service.
//!
//! Visibility (approved-only vs. everything) is not decided here; callers
//! express it through [`DefinitionFilter::approved`].

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  definition::Definition,
  store::{DefinitionFilter, DefinitionQuery, DefinitionSort, DefinitionStore},
};

pub struct Listing<S> {
  store: Arc<S>,
}

impl<S> Clone for Listing<S> {
  fn clone(&self) -> Self { Self { store: self.store.clone() } }
}

impl<S: DefinitionStore> Listing<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn get_by_id(&self, id: Uuid) -> Result<Definition> {
    self
      .store
      .get_definition(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::DefinitionNotFound(id))
  }

  /// Definitions for every known id, in request order; unknown ids are
  /// skipped.
  pub async fn get_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Definition>> {
    self.store.get_definitions(ids).await.map_err(Error::store)
  }

  /// The `limit` most recently submitted definitions matching `filter`.
  pub async fn get_newest(&self, limit: usize, filter: DefinitionFilter) -> Result<Vec<Definition>> {
    let query = DefinitionQuery {
      filter,
      sort: DefinitionSort::newest_first(),
      offset: 0,
      limit: Some(limit),
    };
    self.store.list_definitions(&query).await.map_err(Error::store)
  }

  /// One page of results. `page_number` is 1-based.
  pub async fn get_page(
    &self,
    page_size: usize,
    page_number: usize,
    filter: DefinitionFilter,
    sort: DefinitionSort,
  ) -> Result<Vec<Definition>> {
    check_page_size(page_size)?;
    if page_number == 0 {
      return Err(Error::invalid("page numbers start at 1"));
    }
    let query = DefinitionQuery {
      filter,
      sort,
      offset: (page_number - 1).saturating_mul(page_size),
      limit: Some(page_size),
    };
    tracing::debug!(page_size, page_number, "listing page");
    self.store.list_definitions(&query).await.map_err(Error::store)
  }

  /// Number of pages of `page_size` needed to show everything matching
  /// `filter`. Zero matches means zero pages.
  pub async fn get_page_count(&self, page_size: usize, filter: &DefinitionFilter) -> Result<u64> {
    check_page_size(page_size)?;
    let total = self.store.count_definitions(filter).await.map_err(Error::store)?;
    Ok(page_count(total, page_size as u64))
  }
}

fn check_page_size(page_size: usize) -> Result<()> {
  if page_size == 0 {
    Err(Error::invalid("page size must be at least 1"))
  } else {
    Ok(())
  }
}

fn page_count(total: u64, page_size: u64) -> u64 { total.div_ceil(page_size) }

#[cfg(test)]
mod tests {
  use super::page_count;

  #[test]
  fn page_count_rounds_up() {
    assert_eq!(page_count(0, 4), 0);
    assert_eq!(page_count(4, 4), 1);
    assert_eq!(page_count(5, 4), 2);
    assert_eq!(page_count(1, 1), 1);
  }
}
