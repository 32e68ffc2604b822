//! SQL schema for the annal SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS archives (
    archive_id      TEXT PRIMARY KEY,
    title           TEXT NOT NULL,
    origin          TEXT NOT NULL,   -- one of the five origin strings
    year            TEXT NOT NULL DEFAULT '',
    paper_type      TEXT NOT NULL,   -- 'Paper 1 (DBQ)' | 'Paper 2 (Essay)'
    topic           TEXT NOT NULL DEFAULT '[]',  -- JSON list, or a bare legacy string
    file_url        TEXT,
    has_file        INTEGER NOT NULL DEFAULT 0,  -- derived from file_url at write
    answer_file_url TEXT,
    has_answer      INTEGER NOT NULL DEFAULT 0,
    updated_at      TEXT NOT NULL DEFAULT '',    -- ISO 8601 UTC
    updated_by      TEXT NOT NULL DEFAULT '',
    sub_questions   TEXT NOT NULL DEFAULT '[]'   -- JSON list of sub-question objects
);

CREATE TABLE IF NOT EXISTS user_roles (
    email TEXT PRIMARY KEY,
    role  TEXT NOT NULL              -- 'admin' | 'viewer'
);

CREATE INDEX IF NOT EXISTS archives_origin_idx ON archives(origin);
CREATE INDEX IF NOT EXISTS archives_year_idx   ON archives(year);

PRAGMA user_version = 1;
";
