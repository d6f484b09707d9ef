//! [`Translations`] — the in-memory view of one translation group.
//!
//! Rows are loaded per locale on first access and memoized for the lifetime
//! of the aggregate, absence included. A fresh aggregate bound to the same
//! group re-reads from the store; there is no cross-instance invalidation.
//!
//! # Non-empty groups
//!
//! Every group that has been handed to a host record keeps at least one row.
//! Deleting the last real row inserts a placeholder (`locale = "xx"`, empty
//! value); inserting the first real row deletes it again.

use std::collections::{HashMap, hash_map::Entry};

use tracing::debug;

use crate::{
  Error, Result,
  error::store_error,
  store::ValueStore,
  translation::{GroupId, PLACEHOLDER_LOCALE, TranslationRow},
};

#[derive(Debug, Clone, Default)]
pub struct Translations {
  group_id: Option<GroupId>,
  /// `None` entries record a lookup that found nothing.
  loaded:   HashMap<String, Option<TranslationRow>>,
}

impl Translations {
  /// An aggregate without a group id. One is allocated on the first write.
  pub fn detached() -> Self { Self::default() }

  /// An aggregate for an existing group; rows load on demand.
  pub fn bound(group_id: GroupId) -> Self {
    Self {
      group_id: Some(group_id),
      loaded:   HashMap::new(),
    }
  }

  /// An aggregate whose entry for `locale` is already known, as produced by
  /// an eager join. `row: None` memoizes that the locale has no row.
  pub fn preloaded(
    group_id: GroupId,
    locale: &str,
    row: Option<TranslationRow>,
  ) -> Self {
    let mut translations = Self::bound(group_id);
    translations.preload(locale, row);
    translations
  }

  /// Merge one eagerly fetched entry into the memo. A row replaces the entry
  /// for its locale; an absence is only recorded for a locale never loaded.
  pub fn preload(&mut self, locale: &str, row: Option<TranslationRow>) {
    match row {
      Some(row) => self.attach(row),
      None => {
        self.loaded.entry(locale.to_owned()).or_insert(None);
      }
    }
  }

  /// Allocate a new group right away.
  pub async fn allocate<S: ValueStore>(store: &S) -> Result<Self> {
    let mut translations = Self::detached();
    translations.ensure_group_id(store).await?;
    Ok(translations)
  }

  pub fn group_id(&self) -> Option<GroupId> { self.group_id }

  /// The group id, allocating one if this aggregate is still detached.
  pub async fn ensure_group_id<S: ValueStore>(
    &mut self,
    store: &S,
  ) -> Result<GroupId> {
    if let Some(group_id) = self.group_id {
      return Ok(group_id);
    }

    let group_id = store.allocate_group_id().await.map_err(store_error)?;
    debug!(group_id, "allocated translation group");

    self.group_id = Some(group_id);
    // A group that was just allocated has no rows, placeholder included.
    self.loaded.insert(PLACEHOLDER_LOCALE.to_owned(), None);
    Ok(group_id)
  }

  /// The memoized entry for `locale`, without touching the store.
  pub fn cached(&self, locale: &str) -> Option<&TranslationRow> {
    self.loaded.get(locale).and_then(Option::as_ref)
  }

  /// The row for `locale`, querying the store only on the first request.
  pub async fn get<S: ValueStore>(
    &mut self,
    store: &S,
    locale: &str,
  ) -> Result<Option<&TranslationRow>> {
    Ok(self.load(store, locale).await?.as_ref())
  }

  pub async fn has<S: ValueStore>(
    &mut self,
    store: &S,
    locale: &str,
  ) -> Result<bool> {
    Ok(self.get(store, locale).await?.is_some())
  }

  /// Write `value` for `locale`, updating the existing row in place or
  /// inserting a new one.
  pub async fn set<S: ValueStore>(
    &mut self,
    store: &S,
    locale: &str,
    value: &str,
  ) -> Result<()> {
    if locale == PLACEHOLDER_LOCALE {
      return Err(Error::ReservedLocale(locale.to_owned()));
    }

    let group_id = self.ensure_group_id(store).await?;
    let existing = self.load(store, locale).await?.as_ref().map(|row| row.id);

    match existing {
      Some(row_id) => {
        store.update(row_id, value).await.map_err(store_error)?;
        if let Some(row) = self.loaded.get_mut(locale).and_then(Option::as_mut) {
          row.value = value.to_owned();
        }
      }
      None => {
        let row = store
          .insert(group_id, locale, value)
          .await
          .map_err(store_error)?;
        self.loaded.insert(locale.to_owned(), Some(row));
        self.clear_placeholder(store).await?;
      }
    }
    Ok(())
  }

  /// Apply [`Translations::set`] for every `(locale, value)` pair.
  pub async fn set_many<S, I, L, V>(&mut self, store: &S, entries: I) -> Result<()>
  where
    S: ValueStore,
    I: IntoIterator<Item = (L, V)>,
    L: AsRef<str>,
    V: AsRef<str>,
  {
    for (locale, value) in entries {
      self.set(store, locale.as_ref(), value.as_ref()).await?;
    }
    Ok(())
  }

  /// Resolve the value in `locale`, trying `fallback` once on a miss.
  pub async fn in_locale<S: ValueStore>(
    &mut self,
    store: &S,
    locale: &str,
    fallback: Option<&str>,
  ) -> Result<&str> {
    let resolved = if self.has(store, locale).await? {
      locale
    } else if let Some(fallback) = fallback
      && self.has(store, fallback).await?
    {
      fallback
    } else {
      return Err(Error::TranslationNotFound {
        group_id: self.group_id,
        locale:   locale.to_owned(),
      });
    };

    Ok(self.cached(resolved).map(|row| row.value.as_str()).unwrap_or_default())
  }

  /// Adopt a pre-fetched row as the cached entry for its locale. The row is
  /// rebound to this group; a detached aggregate takes the row's group.
  pub fn attach(&mut self, mut row: TranslationRow) {
    match self.group_id {
      Some(group_id) => row.group_id = group_id,
      None => self.group_id = Some(row.group_id),
    }
    self.loaded.insert(row.locale.clone(), Some(row));
  }

  /// Delete the row for `locale`, keeping the group non-empty. Returns
  /// `false` if there was no such row.
  pub async fn remove<S: ValueStore>(
    &mut self,
    store: &S,
    locale: &str,
  ) -> Result<bool> {
    let Some(row) = self.load(store, locale).await?.take() else {
      return Ok(false);
    };

    if let Some(placeholder) = delete_row(store, &row).await? {
      self.loaded.insert(PLACEHOLDER_LOCALE.to_owned(), Some(placeholder));
    }
    Ok(true)
  }

  /// Make sure the group exists and holds at least one row, allocating and
  /// inserting a placeholder as needed.
  pub async fn ensure_non_empty<S: ValueStore>(
    &mut self,
    store: &S,
  ) -> Result<GroupId> {
    let group_id = self.ensure_group_id(store).await?;
    if store.exists_any(group_id).await.map_err(store_error)? {
      return Ok(group_id);
    }

    let placeholder = insert_placeholder(store, group_id).await?;
    self.loaded.insert(PLACEHOLDER_LOCALE.to_owned(), Some(placeholder));
    Ok(group_id)
  }

  async fn load<S: ValueStore>(
    &mut self,
    store: &S,
    locale: &str,
  ) -> Result<&mut Option<TranslationRow>> {
    let group_id = self.group_id;
    match self.loaded.entry(locale.to_owned()) {
      Entry::Occupied(entry) => Ok(entry.into_mut()),
      Entry::Vacant(entry) => {
        let row = match group_id {
          Some(group_id) => {
            store.find_one(group_id, locale).await.map_err(store_error)?
          }
          None => None,
        };
        Ok(entry.insert(row))
      }
    }
  }

  async fn clear_placeholder<S: ValueStore>(&mut self, store: &S) -> Result<()> {
    if let Some(placeholder) = self.load(store, PLACEHOLDER_LOCALE).await?.take() {
      store.delete(placeholder.id).await.map_err(store_error)?;
      debug!(group_id = placeholder.group_id, "removed placeholder row");
    }
    Ok(())
  }
}

// ─── Row deletion ────────────────────────────────────────────────────────────

/// Delete one row. If it was a real row and the group is left empty, insert
/// and return a placeholder. Deleting the placeholder itself never does.
pub async fn delete_row<S: ValueStore>(
  store: &S,
  row: &TranslationRow,
) -> Result<Option<TranslationRow>> {
  store.delete(row.id).await.map_err(store_error)?;

  if row.is_placeholder()
    || store.exists_any(row.group_id).await.map_err(store_error)?
  {
    return Ok(None);
  }

  insert_placeholder(store, row.group_id).await.map(Some)
}

/// Delete every row of a group, one [`delete_row`] at a time. Returns the
/// number of rows deleted.
///
/// The last real row leaves a placeholder behind, which nothing owns once the
/// host record is gone.
pub async fn delete_group<S: ValueStore>(
  store: &S,
  group_id: GroupId,
) -> Result<usize> {
  let rows = store.rows_in_group(group_id).await.map_err(store_error)?;
  for row in &rows {
    delete_row(store, row).await?;
  }
  debug!(group_id, deleted = rows.len(), "deleted translation group");
  Ok(rows.len())
}

async fn insert_placeholder<S: ValueStore>(
  store: &S,
  group_id: GroupId,
) -> Result<TranslationRow> {
  let row = store
    .insert(group_id, PLACEHOLDER_LOCALE, "")
    .await
    .map_err(store_error)?;
  debug!(group_id, "inserted placeholder row");
  Ok(row)
}
