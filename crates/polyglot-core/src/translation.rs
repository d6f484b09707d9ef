//! Stored translation rows and the id types shared across the crate.
//!
//! A host record never stores translated text; each translatable column holds
//! a group id, and the group's rows live in a separate table.

use serde::{Deserialize, Serialize};

/// Key shared by every row of one translation group.
pub type GroupId = i64;

/// Store-assigned identifier of a single translation row.
pub type RowId = i64;

/// Primary key of a host record.
pub type RecordId = i64;

/// Locale of the row that keeps an otherwise empty group non-empty.
pub const PLACEHOLDER_LOCALE: &str = "xx";

/// One locale-specific value of a translation group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRow {
  pub id:       RowId,
  pub group_id: GroupId,
  pub locale:   String,
  pub value:    String,
}

impl TranslationRow {
  pub fn is_placeholder(&self) -> bool { self.locale == PLACEHOLDER_LOCALE }
}
