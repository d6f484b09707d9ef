//! Error types for `polyglot-core`.

use thiserror::Error;

use crate::translation::{GroupId, RecordId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("'{0}' is not a valid translatable key")]
  KeyNotTranslatable(String),

  /// Neither the requested locale nor the fallback has a row. `group_id` is
  /// `None` when the field was never written.
  #[error("no translation found for locale {locale:?} (group id: {group_id:?})")]
  TranslationNotFound {
    group_id: Option<GroupId>,
    locale:   String,
  },

  #[error("locale {0:?} is reserved for the placeholder row")]
  ReservedLocale(String),

  #[error("invalid record schema: {0}")]
  InvalidSchema(String),

  #[error("invalid attribute {key:?}: {reason}")]
  InvalidAttribute { key: String, reason: String },

  #[error("translatable value must be a string, an object of strings, or null; got {0}")]
  InvalidTranslationValue(String),

  #[error("record not found: {0}")]
  RecordNotFound(RecordId),

  #[error("configuration error: {0}")]
  Config(#[from] config::ConfigError),

  /// A failure reported by a store backend, passed through untouched.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn store_error<E>(err: E) -> Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  Error::Store(Box::new(err))
}
