//! Encoding and decoding helpers between attribute values and SQLite columns.
//!
//! Attributes are JSON values. Scalars map onto SQLite's native storage
//! classes; booleans are stored as 0/1 and come back as integers; arrays and
//! objects are stored as compact JSON text and come back as strings.

use polyglot_core::{
  RecordSchema, TranslationRow,
  store::{Attributes, JoinedRow, StoredRecord},
};
use rusqlite::types::Value as SqlValue;
use serde_json::{Number, Value};

use crate::{Error, Result};

// ─── Identifiers ─────────────────────────────────────────────────────────────

/// Quote an identifier. Schema names are validated as plain identifiers when
/// the schema is built, so no escaping is needed.
pub fn quote(ident: &str) -> String { format!("\"{ident}\"") }

/// Every stored column of a host table after `id`: plain columns, then
/// translatable ones.
pub fn record_columns(schema: &RecordSchema) -> Vec<String> {
  schema
    .columns()
    .iter()
    .chain(schema.translatable())
    .cloned()
    .collect()
}

// ─── Values ──────────────────────────────────────────────────────────────────

pub fn encode_value(value: &Value) -> Result<SqlValue> {
  Ok(match value {
    Value::Null => SqlValue::Null,
    Value::Bool(flag) => SqlValue::Integer(i64::from(*flag)),
    Value::Number(number) => match number.as_i64() {
      Some(int) => SqlValue::Integer(int),
      None => SqlValue::Real(number.as_f64().unwrap_or_default()),
    },
    Value::String(text) => SqlValue::Text(text.clone()),
    Value::Array(_) | Value::Object(_) => SqlValue::Text(serde_json::to_string(value)?),
  })
}

pub fn decode_value(column: &str, value: SqlValue) -> Result<Value> {
  match value {
    SqlValue::Null => Ok(Value::Null),
    SqlValue::Integer(int) => Ok(Value::from(int)),
    SqlValue::Real(real) => Number::from_f64(real)
      .map(Value::Number)
      .ok_or_else(|| Error::UnsupportedValue(column.to_owned())),
    SqlValue::Text(text) => Ok(Value::String(text)),
    SqlValue::Blob(_) => Err(Error::UnsupportedValue(column.to_owned())),
  }
}

/// Split an attribute bag into quoted column names and bound values,
/// rejecting keys the schema does not declare.
pub fn encode_attributes(
  schema: &RecordSchema,
  attributes: &Attributes,
) -> Result<(Vec<String>, Vec<SqlValue>)> {
  let mut columns = Vec::with_capacity(attributes.len());
  let mut values = Vec::with_capacity(attributes.len());

  for (key, value) in attributes {
    if !schema.is_column(key) && !schema.is_translatable(key) {
      return Err(Error::UnknownColumn {
        table:  schema.table().to_owned(),
        column: key.clone(),
      });
    }
    columns.push(quote(key));
    values.push(encode_value(value)?);
  }

  Ok((columns, values))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a host row, in [`record_columns`] order.
pub struct RawRecord {
  pub id:     i64,
  pub values: Vec<SqlValue>,
}

impl RawRecord {
  pub fn into_stored(self, columns: &[String]) -> Result<StoredRecord> {
    let attributes: Attributes = columns
      .iter()
      .zip(self.values)
      .map(|(column, value)| Ok((column.clone(), decode_value(column, value)?)))
      .collect::<Result<_>>()?;

    Ok(StoredRecord { id: self.id, attributes })
  }
}

/// A host row plus the nullable translation columns of the outer join.
pub struct RawJoinedRow {
  pub record:         RawRecord,
  pub translation_id: Option<i64>,
  pub group_id:       Option<i64>,
  pub locale:         Option<String>,
  pub value:          Option<String>,
}

impl RawJoinedRow {
  pub fn into_joined(self, columns: &[String]) -> Result<JoinedRow> {
    let translation = match (self.translation_id, self.group_id, self.locale) {
      (Some(id), Some(group_id), Some(locale)) => Some(TranslationRow {
        id,
        group_id,
        locale,
        value: self.value.unwrap_or_default(),
      }),
      _ => None,
    };

    Ok(JoinedRow {
      record: self.record.into_stored(columns)?,
      translation,
    })
  }
}
