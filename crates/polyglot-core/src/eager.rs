//! Eager loading of one translatable field in one locale.
//!
//! Instead of one lookup per record per access, a single outer join fetches
//! every host row together with its translation row, and each record's cache
//! is seeded from the result.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tracing::debug;

use crate::{
  Result,
  error::store_error,
  lifecycle::Repository,
  record::Record,
  store::{RecordStore, Scope, ValueStore},
  translation::RecordId,
};

impl<S> Repository<S>
where
  S: ValueStore + RecordStore,
{
  /// The first record (lowest id) with `field` preloaded in `locale`.
  pub async fn first_with_translation(
    &self,
    field: &str,
    locale: &str,
  ) -> Result<Option<Record>> {
    let records = self.with_translation(Scope::First, field, locale).await?;
    Ok(records.into_iter().next())
  }

  pub async fn find_with_translation(
    &self,
    id: RecordId,
    field: &str,
    locale: &str,
  ) -> Result<Option<Record>> {
    let records = self.with_translation(Scope::Id(id), field, locale).await?;
    Ok(records.into_iter().next())
  }

  pub async fn all_with_translation(
    &self,
    field: &str,
    locale: &str,
  ) -> Result<Vec<Record>> {
    self.with_translation(Scope::All, field, locale).await
  }

  /// Preload `field` in `locale` into already-loaded records in one query.
  /// Unsaved records, records without a group for `field`, and records whose
  /// group id differs from the stored one are skipped. Locales a record has
  /// already resolved stay cached.
  pub async fn load_translations(
    &self,
    records: &mut [Record],
    field: &str,
    locale: &str,
  ) -> Result<()> {
    let field = self.schema.translation_key(field)?;
    let ids: Vec<RecordId> = records.iter().filter_map(Record::id).collect();
    if ids.is_empty() {
      return Ok(());
    }

    let rows = self
      .store
      .fetch_joined(&self.schema, field, locale, Scope::Ids(ids))
      .await
      .map_err(store_error)?;
    debug!(table = self.schema.table(), field, locale, rows = rows.len(), "eager-loaded translations");

    let mut fetched: HashMap<RecordId, _> = rows
      .into_iter()
      .map(|row| {
        let joined_on = row.record.attributes.get(field).and_then(Value::as_i64);
        (row.record.id, (joined_on, row.translation))
      })
      .collect();

    for record in records.iter_mut() {
      let Some((joined_on, translation)) = record.id().and_then(|id| fetched.remove(&id))
      else {
        continue;
      };
      // An unsaved group id means the join looked at a different group.
      if let Some(group_id) = record.translation_id(field)?
        && joined_on == Some(group_id)
      {
        record.preload(group_id, locale, translation);
      }
    }
    Ok(())
  }

  async fn with_translation(
    &self,
    scope: Scope,
    field: &str,
    locale: &str,
  ) -> Result<Vec<Record>> {
    let field = self.schema.translation_key(field)?;
    let rows = self
      .store
      .fetch_joined(&self.schema, field, locale, scope)
      .await
      .map_err(store_error)?;
    debug!(table = self.schema.table(), field, locale, rows = rows.len(), "eager-loaded translations");

    rows
      .into_iter()
      .map(|row| Record::from_joined(Arc::clone(&self.schema), field, locale, row))
      .collect()
  }
}
