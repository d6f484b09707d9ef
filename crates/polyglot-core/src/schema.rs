//! Per-type descriptors of host tables.
//!
//! A schema names the table, its plain columns, and the columns whose values
//! are translation group ids. It is built once when a host type is registered
//! and shared behind an `Arc` by every [`crate::record::Record`] of that type.

use crate::{Error, Result};

/// Prefix that selects the [`crate::translations::Translations`] aggregate of
/// a translatable field rather than its resolved value (`_name` vs `name`).
pub const GROUP_PREFIX: char = '_';

/// Column every host table carries as its primary key.
pub const ID_COLUMN: &str = "id";

// ─── Key dispatch ────────────────────────────────────────────────────────────

/// What an attribute key refers to on a record of a given schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKey<'k> {
  /// A translatable field; reads resolve to text in the active locale.
  Translated(&'k str),
  /// The `_field` form of a translatable field; reads yield its aggregate.
  Group(&'k str),
  /// Anything else, including undeclared keys.
  Plain(&'k str),
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSchema {
  table:        String,
  columns:      Vec<String>,
  translatable: Vec<String>,
}

impl RecordSchema {
  pub fn builder(table: impl Into<String>) -> RecordSchemaBuilder {
    RecordSchemaBuilder {
      table:        table.into(),
      columns:      Vec::new(),
      translatable: Vec::new(),
    }
  }

  pub fn table(&self) -> &str { &self.table }

  /// Plain (non-translatable) columns, excluding `id`.
  pub fn columns(&self) -> &[String] { &self.columns }

  pub fn translatable(&self) -> &[String] { &self.translatable }

  pub fn is_translatable(&self, key: &str) -> bool {
    self.translatable.iter().any(|field| field == key)
  }

  /// `true` for the `_field` form of a translatable field.
  pub fn is_translation(&self, key: &str) -> bool {
    key
      .strip_prefix(GROUP_PREFIX)
      .is_some_and(|field| self.is_translatable(field))
  }

  pub fn is_column(&self, key: &str) -> bool {
    self.columns.iter().any(|column| column == key)
  }

  pub fn classify<'k>(&self, key: &'k str) -> AttributeKey<'k> {
    if self.is_translatable(key) {
      return AttributeKey::Translated(key);
    }
    match key.strip_prefix(GROUP_PREFIX) {
      Some(field) if self.is_translatable(field) => AttributeKey::Group(field),
      _ => AttributeKey::Plain(key),
    }
  }

  /// Normalise either form of a translatable key to the field name.
  pub fn translation_key<'k>(&self, key: &'k str) -> Result<&'k str> {
    match self.classify(key) {
      AttributeKey::Translated(field) | AttributeKey::Group(field) => Ok(field),
      AttributeKey::Plain(_) => Err(Error::KeyNotTranslatable(key.to_owned())),
    }
  }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordSchemaBuilder {
  table:        String,
  columns:      Vec<String>,
  translatable: Vec<String>,
}

impl RecordSchemaBuilder {
  pub fn column(mut self, name: impl Into<String>) -> Self {
    self.columns.push(name.into());
    self
  }

  pub fn translatable(mut self, name: impl Into<String>) -> Self {
    self.translatable.push(name.into());
    self
  }

  pub fn build(self) -> Result<RecordSchema> {
    check_identifier(&self.table)?;

    let mut seen: Vec<&str> = Vec::new();
    for name in self.columns.iter().chain(&self.translatable) {
      check_identifier(name)?;
      if name == ID_COLUMN {
        return Err(Error::InvalidSchema(format!(
          "column name {ID_COLUMN:?} is reserved"
        )));
      }
      if seen.contains(&name.as_str()) {
        return Err(Error::InvalidSchema(format!(
          "column {name:?} declared more than once"
        )));
      }
      seen.push(name);
    }

    Ok(RecordSchema {
      table:        self.table,
      columns:      self.columns,
      translatable: self.translatable,
    })
  }
}

/// Names end up spliced into SQL, so only plain identifiers are accepted.
fn check_identifier(name: &str) -> Result<()> {
  let mut chars = name.chars();
  let valid = chars
    .next()
    .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

  if valid {
    Ok(())
  } else {
    Err(Error::InvalidSchema(format!("{name:?} is not a valid identifier")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn days() -> RecordSchema {
    RecordSchema::builder("days")
      .column("weekend")
      .translatable("name")
      .build()
      .unwrap()
  }

  #[test]
  fn classify_distinguishes_value_and_group_forms() {
    let schema = days();
    assert_eq!(schema.classify("name"), AttributeKey::Translated("name"));
    assert_eq!(schema.classify("_name"), AttributeKey::Group("name"));
    assert_eq!(schema.classify("weekend"), AttributeKey::Plain("weekend"));
    assert_eq!(schema.classify("_weekend"), AttributeKey::Plain("_weekend"));
    assert_eq!(schema.classify("invalid"), AttributeKey::Plain("invalid"));
  }

  #[test]
  fn translatable_predicates() {
    let schema = days();
    assert!(schema.is_translatable("name"));
    assert!(!schema.is_translatable("weekend"));
    assert!(!schema.is_translatable("invalid"));
    assert!(schema.is_translation("_name"));
    assert!(!schema.is_translation("weekend"));
    assert!(!schema.is_translation("_invalid"));
  }

  #[test]
  fn translation_key_accepts_both_forms() {
    let schema = days();
    assert_eq!(schema.translation_key("name").unwrap(), "name");
    assert_eq!(schema.translation_key("_name").unwrap(), "name");
    assert!(matches!(
      schema.translation_key("invalid"),
      Err(Error::KeyNotTranslatable(key)) if key == "invalid"
    ));
  }

  #[test]
  fn build_rejects_bad_names() {
    let reserved = RecordSchema::builder("days").column("id").build();
    assert!(matches!(reserved, Err(Error::InvalidSchema(_))));

    let injected = RecordSchema::builder("days; DROP TABLE x").build();
    assert!(matches!(injected, Err(Error::InvalidSchema(_))));

    let duplicate = RecordSchema::builder("days")
      .column("name")
      .translatable("name")
      .build();
    assert!(matches!(duplicate, Err(Error::InvalidSchema(_))));
  }
}
