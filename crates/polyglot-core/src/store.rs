//! The collaborator traits the engine is written against.
//!
//! [`ValueStore`] persists translation rows; [`RecordStore`] persists host
//! records. Backends (e.g. `polyglot-store-sqlite`) usually implement both.
//! Neither trait is expected to enforce the engine's invariants; uniqueness
//! of `(group_id, locale)` and the non-empty-group rule are upheld by the
//! callers in this crate.

use std::future::Future;

use serde_json::{Map, Value};

use crate::{
  schema::RecordSchema,
  translation::{GroupId, RecordId, RowId, TranslationRow},
};

/// Raw attribute bag of a host record. Translatable columns hold an integer
/// group id or `null`.
pub type Attributes = Map<String, Value>;

// ─── Query types ─────────────────────────────────────────────────────────────

/// Which host rows an eager join covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
  /// The row with the lowest id.
  First,
  Id(RecordId),
  Ids(Vec<RecordId>),
  All,
}

/// A host row as read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
  pub id:         RecordId,
  pub attributes: Attributes,
}

/// One result of [`RecordStore::fetch_joined`]: the host row plus the
/// translation row matched for the requested field and locale, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRow {
  pub record:      StoredRecord,
  pub translation: Option<TranslationRow>,
}

// ─── Traits ──────────────────────────────────────────────────────────────────

/// Persistence of individual translation rows.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes.
pub trait ValueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Reserve a fresh group id.
  ///
  /// The id is one past both the largest id handed out so far and the largest
  /// `group_id` present in the table, and is recorded atomically so two
  /// callers never receive the same value.
  fn allocate_group_id(
    &self,
  ) -> impl Future<Output = Result<GroupId, Self::Error>> + Send + '_;

  /// Largest `group_id` in the table, or 0 when it is empty.
  fn max_group_id(
    &self,
  ) -> impl Future<Output = Result<GroupId, Self::Error>> + Send + '_;

  fn insert<'a>(
    &'a self,
    group_id: GroupId,
    locale: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<TranslationRow, Self::Error>> + Send + 'a;

  fn update<'a>(
    &'a self,
    row_id: RowId,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete a single row. This is a raw delete; see
  /// [`crate::translations::delete_row`] for the placeholder-aware variant.
  fn delete(
    &self,
    row_id: RowId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn find_one<'a>(
    &'a self,
    group_id: GroupId,
    locale: &'a str,
  ) -> impl Future<Output = Result<Option<TranslationRow>, Self::Error>> + Send + 'a;

  fn exists_any(
    &self,
    group_id: GroupId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Every row of a group, ordered by row id.
  fn rows_in_group(
    &self,
    group_id: GroupId,
  ) -> impl Future<Output = Result<Vec<TranslationRow>, Self::Error>> + Send + '_;
}

/// Persistence of host records described by a [`RecordSchema`].
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert a row and return its id. Attributes missing from the bag are
  /// stored as `NULL`.
  fn insert_record<'a>(
    &'a self,
    schema: &'a RecordSchema,
    attributes: &'a Attributes,
  ) -> impl Future<Output = Result<RecordId, Self::Error>> + Send + 'a;

  /// Overwrite the given attributes. Returns `false` if no row has `id`.
  fn update_record<'a>(
    &'a self,
    schema: &'a RecordSchema,
    id: RecordId,
    attributes: &'a Attributes,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn find_record<'a>(
    &'a self,
    schema: &'a RecordSchema,
    id: RecordId,
  ) -> impl Future<Output = Result<Option<StoredRecord>, Self::Error>> + Send + 'a;

  /// Returns `false` if no row had `id`.
  fn delete_record<'a>(
    &'a self,
    schema: &'a RecordSchema,
    id: RecordId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// One outer join of the host table against the translations table on
  /// `host.field = group_id AND locale = :locale`, restricted by `scope` and
  /// ordered by host id.
  fn fetch_joined<'a>(
    &'a self,
    schema: &'a RecordSchema,
    field: &'a str,
    locale: &'a str,
    scope: Scope,
  ) -> impl Future<Output = Result<Vec<JoinedRow>, Self::Error>> + Send + 'a;
}
