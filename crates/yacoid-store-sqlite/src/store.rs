//! [`SqliteStore`], the SQLite implementation of [`DefinitionStore`].

use std::{collections::HashMap, path::Path};

use rusqlite::{OptionalExtension as _, TransactionBehavior, params_from_iter, types::Value};
use uuid::Uuid;
use yacoid_core::{
  definition::{Definition, Rejection},
  source::{Author, Source},
  store::{
    DefinitionFilter, DefinitionQuery, DefinitionStore, DefinitionUpdate, Guard, WriteOutcome,
  },
};

use crate::{
  Error, Result,
  encode::{
    DEFINITION_COLUMNS, REJECTION_COLUMNS, RawAuthor, RawDefinition, RawRejection, decode_dt,
    decode_uuid, encode_dt, encode_tags, encode_uuid,
  },
  query::{order_by, placeholders, where_clause},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A YACOID store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. Every call
/// runs on that one connection's thread in submission order, which keeps
/// commit order equal to timestamp order. Do not open a second `SqliteStore`
/// on the same file while one is serving writes.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `write` inside an immediate transaction after `guard` passed
  /// against the definition's current state, which `write` receives.
  async fn guarded<F>(&self, id: Uuid, guard: Guard, write: F) -> Result<WriteOutcome>
  where
    F: FnOnce(&rusqlite::Connection, Definition) -> Result<()> + Send + 'static,
  {
    let id_str = encode_uuid(id);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current =
          fetch_definitions(&*tx, "WHERE d.definition_id = ?", vec![Value::Text(id_str)])?
            .pop();
        let Some(current) = current else {
          return Ok(WriteOutcome::Missing);
        };
        if let Err(violation) = guard.check(&current) {
          // Dropping `tx` rolls back; nothing was written anyway.
          return Ok(WriteOutcome::Blocked(violation));
        }

        write(&*tx, current)?;
        tx.commit()?;
        Ok(WriteOutcome::Applied)
      })
      .await?;

    Ok(outcome)
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

/// Select definitions (`definitions d`) matching `tail` and attach their
/// rejection logs.
fn fetch_definitions(
  conn: &rusqlite::Connection,
  tail: &str,
  params: Vec<Value>,
) -> Result<Vec<Definition>> {
  let sql = format!("SELECT {DEFINITION_COLUMNS} FROM definitions d {tail}");
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(params), RawDefinition::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let ids: Vec<&str> = raws.iter().map(|r| r.definition_id.as_str()).collect();
  let mut logs = fetch_rejection_logs(conn, &ids)?;

  raws
    .into_iter()
    .map(|raw| {
      let log = logs.remove(&raw.definition_id).unwrap_or_default();
      raw.into_definition(log)
    })
    .collect()
}

/// Rejection logs keyed by definition id, each ordered by `rejected_at`.
fn fetch_rejection_logs(
  conn: &rusqlite::Connection,
  ids: &[&str],
) -> Result<HashMap<String, Vec<Rejection>>> {
  let mut logs: HashMap<String, Vec<Rejection>> = HashMap::new();
  if ids.is_empty() {
    return Ok(logs);
  }

  let sql = format!(
    "SELECT {REJECTION_COLUMNS} FROM rejections r
     WHERE r.definition_id IN ({})
     ORDER BY r.rejected_at, r.rowid",
    placeholders(ids.len())
  );
  let mut stmt = conn.prepare(&sql)?;
  let raws = stmt
    .query_map(params_from_iter(ids.iter()), RawRejection::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  for raw in raws {
    let definition_id = raw.definition_id.clone();
    logs.entry(definition_id).or_default().push(raw.into_rejection()?);
  }
  Ok(logs)
}

fn apply_update(
  conn: &rusqlite::Connection,
  current: Definition,
  update: DefinitionUpdate,
) -> Result<()> {
  let id = encode_uuid(current.definition_id);
  let changed = match update {
    DefinitionUpdate::Approve(approval) => conn.execute(
      "UPDATE definitions
       SET approved = 1, approved_by = ?1, approved_at = ?2
       WHERE definition_id = ?3 AND approved = 0",
      rusqlite::params![
        encode_uuid(approval.approved_by),
        encode_dt(approval.approved_at),
        id,
      ],
    )?,
    DefinitionUpdate::Revise { patch, at } => {
      let mut next = current;
      if !next.apply_patch(patch, at) {
        return Ok(());
      }
      conn.execute(
        "UPDATE definitions
         SET title = ?1, content = ?2, source_id = ?3, tags = ?4, last_submit_change_at = ?5
         WHERE definition_id = ?6 AND approved = 0",
        rusqlite::params![
          next.title,
          next.content,
          encode_uuid(next.source),
          encode_tags(&next.tags)?,
          encode_dt(next.last_submit_change_at),
          id,
        ],
      )?
    }
  };

  if changed != 1 {
    return Err(Error::Corrupt(format!("guarded update of {id} changed {changed} rows")));
  }
  Ok(())
}

// ─── DefinitionStore impl ────────────────────────────────────────────────────

impl DefinitionStore for SqliteStore {
  type Error = Error;

  // ── Definitions: writes ──────────────────────────────────────────────────

  async fn insert_definition(&self, definition: Definition) -> Result<()> {
    let id_str       = encode_uuid(definition.definition_id);
    let by_str       = encode_uuid(definition.submitted_by);
    let at_str       = encode_dt(definition.submitted_at);
    let changed_str  = encode_dt(definition.last_submit_change_at);
    let source_str   = encode_uuid(definition.source);
    let published    = encode_dt(definition.publishing_date);
    let tags_str     = encode_tags(&definition.tags)?;
    let title        = definition.title;
    let content      = definition.content;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO definitions (
             definition_id, submitted_by, submitted_at, last_submit_change_at,
             approved, approved_by, approved_at,
             title, content, source_id, publishing_date, tags
           ) VALUES (?1, ?2, ?3, ?4, 0, NULL, NULL, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            by_str,
            at_str,
            changed_str,
            title,
            content,
            source_str,
            published,
            tags_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn update_if(
    &self,
    id:     Uuid,
    guard:  Guard,
    update: DefinitionUpdate,
  ) -> Result<WriteOutcome> {
    self
      .guarded(id, guard, move |conn, current| apply_update(conn, current, update))
      .await
  }

  async fn append_rejection_if(
    &self,
    id:        Uuid,
    guard:     Guard,
    rejection: Rejection,
  ) -> Result<WriteOutcome> {
    let rej_id_str = encode_uuid(rejection.rejection_id);
    let by_str     = encode_uuid(rejection.rejected_by);
    let at_str     = encode_dt(rejection.rejected_at);
    let content    = rejection.content;

    self
      .guarded(id, guard, move |conn, current| {
        conn.execute(
          "INSERT INTO rejections (rejection_id, definition_id, rejected_by, rejected_at, content)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            rej_id_str,
            encode_uuid(current.definition_id),
            by_str,
            at_str,
            content,
          ],
        )?;
        Ok(())
      })
      .await
  }

  // ── Definitions: reads ───────────────────────────────────────────────────

  async fn get_definition(&self, id: Uuid) -> Result<Option<Definition>> {
    let id_str = encode_uuid(id);

    let definition = self
      .conn
      .call(move |conn| {
        Ok(
          fetch_definitions(conn, "WHERE d.definition_id = ?", vec![Value::Text(id_str)])?
            .pop(),
        )
      })
      .await?;
    Ok(definition)
  }

  async fn get_definitions(&self, ids: &[Uuid]) -> Result<Vec<Definition>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let tail = format!("WHERE d.definition_id IN ({})", placeholders(ids.len()));
    let params: Vec<Value> = ids.iter().map(|id| Value::Text(encode_uuid(*id))).collect();

    let found = self
      .conn
      .call(move |conn| Ok(fetch_definitions(conn, &tail, params)?))
      .await?;

    let mut by_id: HashMap<Uuid, Definition> =
      found.into_iter().map(|d| (d.definition_id, d)).collect();
    Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
  }

  async fn list_definitions(&self, query: &DefinitionQuery) -> Result<Vec<Definition>> {
    let filter = where_clause(&query.filter);
    let order = order_by(query.sort);
    let limit = query.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);

    let tail = format!("{} {order} LIMIT ? OFFSET ?", filter.sql);
    let mut params = filter.params;
    params.push(Value::Integer(limit));
    params.push(Value::Integer(offset));

    let definitions = self
      .conn
      .call(move |conn| Ok(fetch_definitions(conn, &tail, params)?))
      .await?;
    Ok(definitions)
  }

  async fn count_definitions(&self, filter: &DefinitionFilter) -> Result<u64> {
    let filter = where_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM definitions d {}", filter.sql);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, params_from_iter(filter.params), |row| row.get(0))?)
      })
      .await?;
    Ok(u64::try_from(count).unwrap_or(0))
  }

  // ── Sources & authors ─────────────────────────────────────────────────────

  async fn insert_author(&self, author: Author) -> Result<()> {
    let id_str = encode_uuid(author.author_id);
    let by_str = encode_uuid(author.submitted_by);
    let at_str = encode_dt(author.submitted_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO authors (author_id, first_name, last_name, submitted_by, submitted_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, author.first_name, author.last_name, by_str, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_author(&self, id: Uuid) -> Result<Option<Author>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAuthor> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT author_id, first_name, last_name, submitted_by, submitted_at
               FROM authors WHERE author_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawAuthor {
                  author_id:    row.get(0)?,
                  first_name:   row.get(1)?,
                  last_name:    row.get(2)?,
                  submitted_by: row.get(3)?,
                  submitted_at: row.get(4)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAuthor::into_author).transpose()
  }

  async fn insert_source(&self, source: Source) -> Result<()> {
    let id_str  = encode_uuid(source.source_id);
    let by_str  = encode_uuid(source.submitted_by);
    let at_str  = encode_dt(source.submitted_at);
    let authors: Vec<String> = source.authors.iter().copied().map(encode_uuid).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO sources (source_id, submitted_by, submitted_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, by_str, at_str],
        )?;
        for (position, author) in authors.iter().enumerate() {
          tx.execute(
            "INSERT INTO source_authors (source_id, author_id, position) VALUES (?1, ?2, ?3)",
            rusqlite::params![id_str, author, position as i64],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn get_source(&self, id: Uuid) -> Result<Option<Source>> {
    let id_str = encode_uuid(id);

    let raw: Option<(String, String, Vec<String>)> = self
      .conn
      .call(move |conn| {
        let row: Option<(String, String)> = conn
          .query_row(
            "SELECT submitted_by, submitted_at FROM sources WHERE source_id = ?1",
            rusqlite::params![id_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;
        let Some((by, at)) = row else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT author_id FROM source_authors WHERE source_id = ?1 ORDER BY position",
        )?;
        let authors = stmt
          .query_map(rusqlite::params![id_str], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(Some((by, at, authors)))
      })
      .await?;

    raw
      .map(|(by, at, authors)| -> Result<Source> {
        Ok(Source {
          source_id:    id,
          authors:      authors.iter().map(|a| decode_uuid(a)).collect::<Result<_>>()?,
          submitted_by: decode_uuid(&by)?,
          submitted_at: decode_dt(&at)?,
        })
      })
      .transpose()
  }
}
