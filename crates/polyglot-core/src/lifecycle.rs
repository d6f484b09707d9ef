//! Record lifecycle — create, update and delete with translation handling.
//!
//! [`Repository`] pairs a store with one [`RecordSchema`]. Translatable fields
//! are stripped from create/update payloads, so the host table only ever sees
//! group ids, and are applied through [`Record::set`] once the host row
//! exists. Deleting a record cascades to every group it references.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
  Error, Result,
  error::store_error,
  locale::LocaleContext,
  record::{Record, TranslationInput},
  schema::{AttributeKey, RecordSchema},
  store::{Attributes, RecordStore, ValueStore},
  translation::RecordId,
  translations::delete_group,
};

/// Host records of one schema, persisted in `S`.
///
/// Cloning is cheap; the store and schema are reference-counted.
#[derive(Debug)]
pub struct Repository<S> {
  pub(crate) store:  Arc<S>,
  pub(crate) schema: Arc<RecordSchema>,
}

impl<S> Clone for Repository<S> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      schema: Arc::clone(&self.schema),
    }
  }
}

impl<S> Repository<S>
where
  S: ValueStore + RecordStore,
{
  pub fn new(store: Arc<S>, schema: RecordSchema) -> Self {
    Self {
      store,
      schema: Arc::new(schema),
    }
  }

  pub fn store(&self) -> &S { &self.store }

  pub fn schema(&self) -> &Arc<RecordSchema> { &self.schema }

  /// A new, unsaved record.
  pub fn build(&self) -> Record { Record::new(Arc::clone(&self.schema)) }

  /// Insert a record from `payload`.
  ///
  /// Each translatable field may be a string (stored in the active locale),
  /// an object of locale → string, or `null`; `null` and `{}` allocate a
  /// placeholder-only group. Translatable fields left out stay unset.
  pub async fn create(&self, ctx: &LocaleContext, payload: Attributes) -> Result<Record> {
    let mut record = self.build();
    let inputs = self.split_payload(&mut record, payload)?;

    let id = self
      .store
      .insert_record(&self.schema, record.attributes())
      .await
      .map_err(store_error)?;
    record.set_id(id);

    self.apply_inputs(ctx, &mut record, inputs).await?;
    debug!(table = self.schema.table(), id, "created record");
    Ok(record)
  }

  pub async fn find(&self, id: RecordId) -> Result<Option<Record>> {
    let stored = self
      .store
      .find_record(&self.schema, id)
      .await
      .map_err(store_error)?;
    Ok(stored.map(|stored| Record::from_stored(Arc::clone(&self.schema), stored)))
  }

  /// Persist the record's raw attributes, inserting it if it is unsaved.
  pub async fn save(&self, record: &mut Record) -> Result<()> {
    let Some(id) = record.id() else {
      let id = self
        .store
        .insert_record(record.schema(), record.attributes())
        .await
        .map_err(store_error)?;
      record.set_id(id);
      return Ok(());
    };

    let found = self
      .store
      .update_record(record.schema(), id, record.attributes())
      .await
      .map_err(store_error)?;
    if found { Ok(()) } else { Err(Error::RecordNotFound(id)) }
  }

  /// Apply `payload` to an existing record and save it. Plain attributes are
  /// overwritten; translatable ones are written through their groups.
  /// `null` or `{}` leaves a field that already has a group unchanged.
  pub async fn update(
    &self,
    ctx: &LocaleContext,
    record: &mut Record,
    payload: Attributes,
  ) -> Result<()> {
    let inputs = self.split_payload(record, payload)?;
    self.apply_inputs(ctx, record, inputs).await
  }

  /// Delete the host row, then every translation row of each of its groups.
  pub async fn delete(&self, record: Record) -> Result<()> {
    if let Some(id) = record.id() {
      let found = self
        .store
        .delete_record(record.schema(), id)
        .await
        .map_err(store_error)?;
      if !found {
        warn!(table = record.schema().table(), id, "record already deleted");
      }
    }

    for field in record.schema().translatable() {
      if let Some(group_id) = record.translation_id(field)? {
        delete_group(&*self.store, group_id).await?;
      }
    }
    Ok(())
  }

  /// Write plain attributes onto `record` and collect translatable inputs.
  fn split_payload(
    &self,
    record: &mut Record,
    payload: Attributes,
  ) -> Result<Vec<(String, TranslationInput)>> {
    let mut inputs = Vec::new();
    for (key, value) in payload {
      match self.schema.classify(&key) {
        AttributeKey::Translated(field) | AttributeKey::Group(field) => {
          inputs.push((field.to_owned(), TranslationInput::try_from(value)?));
        }
        AttributeKey::Plain(column) => record.set_attribute(column, value)?,
      }
    }
    Ok(inputs)
  }

  async fn apply_inputs(
    &self,
    ctx: &LocaleContext,
    record: &mut Record,
    inputs: Vec<(String, TranslationInput)>,
  ) -> Result<()> {
    for (field, input) in inputs {
      record.set(&*self.store, ctx, &field, input).await?;
    }
    self.save(record).await
  }
}
