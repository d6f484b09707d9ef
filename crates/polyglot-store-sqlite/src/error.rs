//! Error type for `polyglot-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The attribute bag named a column the schema does not declare.
  #[error("table {table:?} has no column {column:?}")]
  UnknownColumn { table: String, column: String },

  /// A column held a value with no JSON counterpart (e.g. a blob).
  #[error("unsupported value in column {0:?}")]
  UnsupportedValue(String),

  #[error("{0:?} is not a translatable field of table {1:?}")]
  NotTranslatable(String, String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
