//! SQL schema for the Surge SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Current state, one row per URL. Updated in place on every observation.
CREATE TABLE IF NOT EXISTS items (
    item_id     TEXT PRIMARY KEY,
    url         TEXT NOT NULL UNIQUE,
    title       TEXT NOT NULL,
    author      TEXT NOT NULL,
    uses_count  INTEGER NOT NULL DEFAULT 0 CHECK (uses_count >= 0),
    category    TEXT NOT NULL,
    created_at  TEXT NOT NULL,   -- fixed-width RFC 3339 UTC
    updated_at  TEXT NOT NULL
);

-- Snapshots are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS snapshots (
    snapshot_id TEXT PRIMARY KEY,
    item_id     TEXT NOT NULL REFERENCES items(item_id),
    uses_count  INTEGER NOT NULL CHECK (uses_count >= 0),
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS items_category_idx     ON items(category, updated_at);
CREATE INDEX IF NOT EXISTS snapshots_item_time_idx ON snapshots(item_id, recorded_at);

PRAGMA user_version = 1;
";
