//! [`SqliteStore`] — the SQLite implementation of [`ValueStore`] and
//! [`RecordStore`].

use std::path::Path;

use polyglot_core::{
  GroupId, RecordId, RecordSchema, RowId, TranslationRow,
  schema::ID_COLUMN,
  store::{Attributes, JoinedRow, RecordStore, Scope, StoredRecord, ValueStore},
};
use rusqlite::{OptionalExtension as _, params_from_iter, types::Value as SqlValue};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{RawJoinedRow, RawRecord, encode_attributes, quote, record_columns},
  schema::{ALLOCATE_GROUP_ID, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A translation store and host-record store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// run serially on the connection's thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
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

  /// Create the host table for `schema` if it does not exist yet.
  ///
  /// Plain columns are left untyped so they keep whatever storage class they
  /// are written with; translatable columns hold integer group ids.
  pub async fn register(&self, schema: &RecordSchema) -> Result<()> {
    let mut definitions = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote(ID_COLUMN))];
    definitions.extend(schema.columns().iter().map(|column| quote(column)));
    definitions.extend(
      schema
        .translatable()
        .iter()
        .map(|field| format!("{} INTEGER", quote(field))),
    );

    let sql = format!(
      "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
      quote(schema.table()),
      definitions.join(",\n  ")
    );

    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;

    debug!(table = schema.table(), "registered host table");
    Ok(())
  }

  /// All rows of the translations table, ordered by id. Intended for
  /// inspection and tests.
  pub async fn all_translations(&self) -> Result<Vec<TranslationRow>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT id, group_id, locale, value FROM translations ORDER BY id",
        )?;
        let rows = stmt
          .query_map([], read_translation)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

fn read_translation(row: &rusqlite::Row<'_>) -> rusqlite::Result<TranslationRow> {
  Ok(TranslationRow {
    id:       row.get(0)?,
    group_id: row.get(1)?,
    locale:   row.get(2)?,
    value:    row.get(3)?,
  })
}

/// Read `id` and the `width` columns after it as a [`RawRecord`].
fn read_record(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<RawRecord> {
  let values = (1..=width)
    .map(|index| row.get::<_, SqlValue>(index))
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(RawRecord { id: row.get(0)?, values })
}

fn select_list(columns: &[String]) -> String {
  std::iter::once(quote(ID_COLUMN))
    .chain(columns.iter().map(|column| quote(column)))
    .map(|column| format!("h.{column}"))
    .collect::<Vec<_>>()
    .join(", ")
}

// ─── ValueStore impl ─────────────────────────────────────────────────────────

impl ValueStore for SqliteStore {
  type Error = Error;

  async fn allocate_group_id(&self) -> Result<GroupId> {
    let group_id = self
      .conn
      .call(|conn| Ok(conn.query_row(ALLOCATE_GROUP_ID, [], |row| row.get(0))?))
      .await?;
    Ok(group_id)
  }

  async fn max_group_id(&self) -> Result<GroupId> {
    let group_id = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COALESCE(MAX(group_id), 0) FROM translations",
          [],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(group_id)
  }

  async fn insert(&self, group_id: GroupId, locale: &str, value: &str) -> Result<TranslationRow> {
    let locale = locale.to_owned();
    let value  = value.to_owned();

    let row = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO translations (group_id, locale, value) VALUES (?1, ?2, ?3)",
          rusqlite::params![group_id, locale, value],
        )?;
        Ok(TranslationRow {
          id: conn.last_insert_rowid(),
          group_id,
          locale,
          value,
        })
      })
      .await?;
    Ok(row)
  }

  async fn update(&self, row_id: RowId, value: &str) -> Result<()> {
    let value = value.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE translations SET value = ?1 WHERE id = ?2",
          rusqlite::params![value, row_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete(&self, row_id: RowId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM translations WHERE id = ?1",
          rusqlite::params![row_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_one(&self, group_id: GroupId, locale: &str) -> Result<Option<TranslationRow>> {
    let locale = locale.to_owned();
    let row = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT id, group_id, locale, value FROM translations
             WHERE group_id = ?1 AND locale = ?2
             ORDER BY id LIMIT 1",
            rusqlite::params![group_id, locale],
            read_translation,
          )
          .optional()?)
      })
      .await?;
    Ok(row)
  }

  async fn exists_any(&self, group_id: GroupId) -> Result<bool> {
    let exists = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT EXISTS (SELECT 1 FROM translations WHERE group_id = ?1)",
          rusqlite::params![group_id],
          |row| row.get(0),
        )?)
      })
      .await?;
    Ok(exists)
  }

  async fn rows_in_group(&self, group_id: GroupId) -> Result<Vec<TranslationRow>> {
    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, group_id, locale, value FROM translations
           WHERE group_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![group_id], read_translation)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn insert_record(&self, schema: &RecordSchema, attributes: &Attributes) -> Result<RecordId> {
    let (columns, values) = encode_attributes(schema, attributes)?;
    let table = quote(schema.table());

    let sql = if columns.is_empty() {
      format!("INSERT INTO {table} DEFAULT VALUES")
    } else {
      let placeholders = (1..=values.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
      format!(
        "INSERT INTO {table} ({}) VALUES ({placeholders})",
        columns.join(", ")
      )
    };

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(&sql, params_from_iter(values))?;
        Ok(conn.last_insert_rowid())
      })
      .await?;
    Ok(id)
  }

  async fn update_record(
    &self,
    schema:     &RecordSchema,
    id:         RecordId,
    attributes: &Attributes,
  ) -> Result<bool> {
    let (columns, mut values) = encode_attributes(schema, attributes)?;
    let table = quote(schema.table());

    // With nothing to write, an update only has to confirm the row exists.
    let sql = if columns.is_empty() {
      format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE \"id\" = ?1)")
    } else {
      let assignments = columns
        .iter()
        .enumerate()
        .map(|(index, column)| format!("{column} = ?{}", index + 1))
        .collect::<Vec<_>>()
        .join(", ");
      format!(
        "UPDATE {table} SET {assignments} WHERE \"id\" = ?{}",
        values.len() + 1
      )
    };
    let read_only = columns.is_empty();
    values.push(SqlValue::Integer(id));

    let found = self
      .conn
      .call(move |conn| {
        if read_only {
          Ok(conn.query_row(&sql, params_from_iter(values), |row| row.get(0))?)
        } else {
          Ok(conn.execute(&sql, params_from_iter(values))? > 0)
        }
      })
      .await?;
    Ok(found)
  }

  async fn find_record(&self, schema: &RecordSchema, id: RecordId) -> Result<Option<StoredRecord>> {
    let columns = record_columns(schema);
    let width   = columns.len();
    let sql     = format!(
      "SELECT {} FROM {} AS h WHERE h.\"id\" = ?1",
      select_list(&columns),
      quote(schema.table())
    );

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params![id], |row| read_record(row, width))
          .optional()?)
      })
      .await?;

    raw.map(|raw| raw.into_stored(&columns)).transpose()
  }

  async fn delete_record(&self, schema: &RecordSchema, id: RecordId) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE \"id\" = ?1", quote(schema.table()));
    let found = self
      .conn
      .call(move |conn| Ok(conn.execute(&sql, rusqlite::params![id])? > 0))
      .await?;
    Ok(found)
  }

  async fn fetch_joined(
    &self,
    schema: &RecordSchema,
    field:  &str,
    locale: &str,
    scope:  Scope,
  ) -> Result<Vec<JoinedRow>> {
    if !schema.is_translatable(field) {
      return Err(Error::NotTranslatable(field.to_owned(), schema.table().to_owned()));
    }

    let mut params = vec![SqlValue::Text(locale.to_owned())];
    let (filter, limit) = match scope {
      Scope::First => (String::new(), "LIMIT 1"),
      Scope::Id(id) => {
        params.push(SqlValue::Integer(id));
        ("WHERE h.\"id\" = ?2".to_owned(), "")
      }
      Scope::Ids(ids) if ids.is_empty() => return Ok(Vec::new()),
      Scope::Ids(ids) => {
        let placeholders = (2..ids.len() + 2)
          .map(|index| format!("?{index}"))
          .collect::<Vec<_>>()
          .join(", ");
        params.extend(ids.into_iter().map(SqlValue::Integer));
        (format!("WHERE h.\"id\" IN ({placeholders})"), "")
      }
      Scope::All => (String::new(), ""),
    };

    let columns = record_columns(schema);
    let width   = columns.len();
    // The subquery picks one row per host even if a (group, locale) pair was
    // ever written twice.
    let sql = format!(
      "SELECT {select}, t.id, t.group_id, t.locale, t.value
       FROM {table} AS h
       LEFT JOIN translations AS t ON t.id = (
         SELECT MIN(id) FROM translations
         WHERE group_id = h.{field} AND locale = ?1
       )
       {filter}
       ORDER BY h.\"id\"
       {limit}",
      select = select_list(&columns),
      table  = quote(schema.table()),
      field  = quote(field),
    );

    let raws: Vec<RawJoinedRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(params), |row| {
            Ok(RawJoinedRow {
              record:         read_record(row, width)?,
              translation_id: row.get(width + 1)?,
              group_id:       row.get(width + 2)?,
              locale:         row.get(width + 3)?,
              value:          row.get(width + 4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(|raw| raw.into_joined(&columns)).collect()
  }
}
