//! SQL schema for the polyglot SQLite store.
//!
//! Executed once at connection startup. Host tables are not part of it; they
//! are created per [`RecordSchema`](polyglot_core::RecordSchema) by
//! [`SqliteStore::register`](crate::SqliteStore::register).

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS` / `OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per (group, locale). (group_id, locale) is kept unique by the
-- engine, not by a constraint.
CREATE TABLE IF NOT EXISTS translations (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    group_id  INTEGER NOT NULL,
    locale    TEXT    NOT NULL,   -- 'xx' marks the placeholder row
    value     TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS translations_group_locale_idx
    ON translations(group_id, locale);

-- Last group id handed out. Allocation bumps it past MAX(group_id) in a
-- single statement.
CREATE TABLE IF NOT EXISTS group_sequence (
    id             INTEGER PRIMARY KEY CHECK (id = 1),
    last_group_id  INTEGER NOT NULL
);

INSERT OR IGNORE INTO group_sequence (id, last_group_id) VALUES (1, 0);

PRAGMA user_version = 1;
";

/// Bump the sequence and return the new group id.
pub const ALLOCATE_GROUP_ID: &str = "
UPDATE group_sequence
   SET last_group_id = MAX(
         last_group_id,
         (SELECT COALESCE(MAX(group_id), 0) FROM translations)
       ) + 1
 WHERE id = 1
RETURNING last_group_id";
