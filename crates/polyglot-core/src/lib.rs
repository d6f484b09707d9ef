//! Core types and trait definitions for per-locale record fields.
//!
//! A translatable column stores an integer group id instead of text; the
//! group's `(locale, value)` rows live in a separate table. This crate holds
//! the resolution engine and the collaborator traits it runs against. It is
//! deliberately free of database dependencies.

pub mod eager;
pub mod error;
pub mod lifecycle;
pub mod locale;
pub mod record;
pub mod schema;
pub mod store;
pub mod translation;
pub mod translations;

pub use error::{Error, Result};
pub use lifecycle::Repository;
pub use locale::{LocaleContext, LocaleSettings};
pub use record::{Attribute, Record, TranslateTo, TranslationInput};
pub use schema::{AttributeKey, RecordSchema};
pub use translation::{GroupId, PLACEHOLDER_LOCALE, RecordId, RowId, TranslationRow};
pub use translations::Translations;
