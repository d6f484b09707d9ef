//! [`Record`] — a host record whose translatable columns hold group ids.
//!
//! Plain columns are read and written directly. Translatable fields resolve
//! through a per-record cache of [`Translations`], keyed by group id, so
//! repeated access to one field on one loaded record never re-resolves.

use std::{collections::{BTreeMap, HashMap}, sync::Arc};

use serde_json::Value;

use crate::{
  Error, Result,
  locale::LocaleContext,
  schema::{AttributeKey, RecordSchema},
  store::{Attributes, JoinedRow, StoredRecord, ValueStore},
  translation::{GroupId, RecordId, TranslationRow},
  translations::Translations,
};

// ─── Write input ─────────────────────────────────────────────────────────────

/// A value written to a translatable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationInput {
  /// Stored under the active locale.
  Scalar(String),
  /// Stored under each given locale; the active locale is ignored.
  Locales(BTreeMap<String, String>),
  /// Allocates an empty (placeholder-only) group if the field has none.
  Null,
}

impl TranslationInput {
  async fn apply<S: ValueStore>(
    self,
    translations: &mut Translations,
    store: &S,
    locale: &str,
  ) -> Result<()> {
    match self {
      Self::Scalar(value) => translations.set(store, locale, &value).await,
      Self::Locales(entries) if !entries.is_empty() => {
        translations.set_many(store, entries).await
      }
      Self::Locales(_) | Self::Null => {
        translations.ensure_non_empty(store).await.map(drop)
      }
    }
  }
}

impl From<&str> for TranslationInput {
  fn from(value: &str) -> Self { Self::Scalar(value.to_owned()) }
}

impl From<String> for TranslationInput {
  fn from(value: String) -> Self { Self::Scalar(value) }
}

impl From<BTreeMap<String, String>> for TranslationInput {
  fn from(entries: BTreeMap<String, String>) -> Self { Self::Locales(entries) }
}

impl<const N: usize> From<[(&str, &str); N]> for TranslationInput {
  fn from(entries: [(&str, &str); N]) -> Self {
    Self::Locales(
      entries
        .into_iter()
        .map(|(locale, value)| (locale.to_owned(), value.to_owned()))
        .collect(),
    )
  }
}

impl<T: Into<TranslationInput>> From<Option<T>> for TranslationInput {
  fn from(value: Option<T>) -> Self { value.map_or(Self::Null, Into::into) }
}

impl TryFrom<Value> for TranslationInput {
  type Error = Error;

  fn try_from(value: Value) -> Result<Self> {
    match value {
      Value::Null => Ok(Self::Null),
      Value::String(text) => Ok(Self::Scalar(text)),
      Value::Object(entries) => entries
        .into_iter()
        .map(|(locale, value)| match value {
          Value::String(text) => Ok((locale, text)),
          other => Err(Error::InvalidTranslationValue(format!(
            "{other} for locale {locale:?}"
          ))),
        })
        .collect::<Result<_>>()
        .map(Self::Locales),
      other => Err(Error::InvalidTranslationValue(other.to_string())),
    }
  }
}

// ─── Generic access ──────────────────────────────────────────────────────────

/// Result of [`Record::get`].
#[derive(Debug)]
pub enum Attribute<'r> {
  /// A translatable field resolved in the active locale.
  Text(String),
  /// The `_field` form: the field's aggregate.
  Translations(&'r mut Translations),
  /// A plain column; `None` if it has no value or is undeclared.
  Plain(Option<&'r Value>),
}

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Record {
  schema:       Arc<RecordSchema>,
  id:           Option<RecordId>,
  attributes:   Attributes,
  translations: HashMap<GroupId, Translations>,
}

impl Record {
  /// A new, unsaved record with every translatable field unset.
  pub fn new(schema: Arc<RecordSchema>) -> Self {
    let attributes = schema
      .translatable()
      .iter()
      .map(|field| (field.clone(), Value::Null))
      .collect();
    Self {
      schema,
      id: None,
      attributes,
      translations: HashMap::new(),
    }
  }

  pub fn from_stored(schema: Arc<RecordSchema>, stored: StoredRecord) -> Self {
    let mut record = Self::new(schema);
    record.id = Some(stored.id);
    record.attributes.extend(stored.attributes);
    record
  }

  /// Rebuild a record from an eager join on `field` in `locale`, seeding its
  /// cache with the joined row (or its absence).
  pub fn from_joined(
    schema: Arc<RecordSchema>,
    field: &str,
    locale: &str,
    joined: JoinedRow,
  ) -> Result<Self> {
    let mut record = Self::from_stored(schema, joined.record);
    if let Some(group_id) = record.translation_id(field)? {
      record.cache(Translations::preloaded(group_id, locale, joined.translation));
    }
    Ok(record)
  }

  pub fn schema(&self) -> &Arc<RecordSchema> { &self.schema }

  pub fn id(&self) -> Option<RecordId> { self.id }

  pub(crate) fn set_id(&mut self, id: RecordId) { self.id = Some(id); }

  /// Raw attributes; translatable fields appear as group ids.
  pub fn attributes(&self) -> &Attributes { &self.attributes }

  pub fn attribute(&self, key: &str) -> Option<&Value> {
    self.attributes.get(key).filter(|value| !value.is_null())
  }

  /// Write a plain column.
  pub fn set_attribute(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
    if !self.schema.is_column(key) {
      let reason = if self.schema.translation_key(key).is_ok() {
        "translatable fields are written with Record::set"
      } else {
        "not a column of this record"
      };
      return Err(Error::InvalidAttribute {
        key:    key.to_owned(),
        reason: reason.to_owned(),
      });
    }
    self.attributes.insert(key.to_owned(), value.into());
    Ok(())
  }

  pub fn is_translatable(&self, key: &str) -> bool { self.schema.is_translatable(key) }

  pub fn is_translation(&self, key: &str) -> bool { self.schema.is_translation(key) }

  /// `true` for every translatable key, written or not; otherwise whether the
  /// plain attribute has a value.
  pub fn is_set(&self, key: &str) -> bool {
    match self.schema.classify(key) {
      AttributeKey::Translated(_) | AttributeKey::Group(_) => true,
      AttributeKey::Plain(key) => self.attribute(key).is_some(),
    }
  }

  /// The group id stored for a translatable field, `None` before the first
  /// write.
  pub fn translation_id(&self, key: &str) -> Result<Option<GroupId>> {
    let field = self.schema.translation_key(key)?;
    match self.attributes.get(field) {
      None | Some(Value::Null) => Ok(None),
      Some(value) => value.as_i64().map(Some).ok_or_else(|| Error::InvalidAttribute {
        key:    field.to_owned(),
        reason: format!("expected a translation group id, found {value}"),
      }),
    }
  }

  /// The cached aggregate of a field, if one has been resolved.
  pub fn cached_translations(&self, key: &str) -> Option<&Translations> {
    let group_id = self.translation_id(key).ok().flatten()?;
    self.translations.get(&group_id)
  }

  /// The aggregate of a translatable field. A field without a group gets a
  /// new one, holding just a placeholder, whose id is written back.
  pub async fn translations<S: ValueStore>(
    &mut self,
    store: &S,
    key: &str,
  ) -> Result<&mut Translations> {
    let field = self.schema.translation_key(key)?;

    let group_id = match self.translation_id(field)? {
      Some(group_id) => group_id,
      None => {
        let mut translations = Translations::allocate(store).await?;
        let group_id = translations.ensure_non_empty(store).await?;
        self.attributes.insert(field.to_owned(), Value::from(group_id));
        self.cache(translations);
        group_id
      }
    };

    Ok(
      self
        .translations
        .entry(group_id)
        .or_insert_with(|| Translations::bound(group_id)),
    )
  }

  /// Resolve a translatable field in `ctx`.
  pub async fn value<S: ValueStore>(
    &mut self,
    store: &S,
    ctx: &LocaleContext,
    key: &str,
  ) -> Result<String> {
    let Some(group_id) = self.translation_id(key)? else {
      return Err(Error::TranslationNotFound {
        group_id: None,
        locale:   ctx.locale.clone(),
      });
    };

    let translations = self
      .translations
      .entry(group_id)
      .or_insert_with(|| Translations::bound(group_id));
    translations
      .in_locale(store, &ctx.locale, ctx.fallback())
      .await
      .map(str::to_owned)
  }

  /// Write a translatable field. Scalars go to the active locale of `ctx`.
  pub async fn set<S: ValueStore>(
    &mut self,
    store: &S,
    ctx: &LocaleContext,
    key: &str,
    input: impl Into<TranslationInput>,
  ) -> Result<()> {
    let field = self.schema.translation_key(key)?;

    let mut translations = match self.translation_id(field)? {
      Some(group_id) => self
        .translations
        .remove(&group_id)
        .unwrap_or_else(|| Translations::bound(group_id)),
      None => Translations::detached(),
    };

    let applied = input.into().apply(&mut translations, store, &ctx.locale).await;

    // Keep whatever was allocated, even if a later write failed.
    if let Some(group_id) = translations.group_id() {
      self.attributes.insert(field.to_owned(), Value::from(group_id));
      self.translations.insert(group_id, translations);
    }
    applied
  }

  /// Dispatch on the key form: resolved text, aggregate, or plain value.
  pub async fn get<S: ValueStore>(
    &mut self,
    store: &S,
    ctx: &LocaleContext,
    key: &str,
  ) -> Result<Attribute<'_>> {
    match self.schema.classify(key) {
      AttributeKey::Translated(field) => {
        self.value(store, ctx, field).await.map(Attribute::Text)
      }
      AttributeKey::Group(field) => {
        self.translations(store, field).await.map(Attribute::Translations)
      }
      AttributeKey::Plain(key) => Ok(Attribute::Plain(self.attribute(key))),
    }
  }

  /// Resolve or write the next access in `locale` instead of the ambient
  /// context. The returned handle is consumed by that one access.
  pub fn translate_to(
    &mut self,
    locale: impl Into<String>,
    fallback: Option<&str>,
  ) -> TranslateTo<'_> {
    TranslateTo {
      record:  self,
      context: LocaleContext {
        locale:   locale.into(),
        fallback: fallback.map(str::to_owned),
      },
    }
  }

  pub(crate) fn cache(&mut self, translations: Translations) {
    if let Some(group_id) = translations.group_id() {
      self.translations.insert(group_id, translations);
    }
  }

  /// Merge an eagerly fetched entry into the cached aggregate of `group_id`,
  /// keeping every locale it already memoized.
  pub(crate) fn preload(
    &mut self,
    group_id: GroupId,
    locale: &str,
    row: Option<TranslationRow>,
  ) {
    self
      .translations
      .entry(group_id)
      .or_insert_with(|| Translations::bound(group_id))
      .preload(locale, row);
  }
}

// ─── One-shot locale override ────────────────────────────────────────────────

/// A record viewed in a specific locale for exactly one access.
#[derive(Debug)]
pub struct TranslateTo<'r> {
  record:  &'r mut Record,
  context: LocaleContext,
}

impl TranslateTo<'_> {
  pub fn context(&self) -> &LocaleContext { &self.context }

  pub async fn value<S: ValueStore>(self, store: &S, key: &str) -> Result<String> {
    self.record.value(store, &self.context, key).await
  }

  pub async fn set<S: ValueStore>(
    self,
    store: &S,
    key: &str,
    input: impl Into<TranslationInput>,
  ) -> Result<()> {
    self.record.set(store, &self.context, key, input).await
  }
}
