//! SQL schema for the YACOID SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Backing table for the token identity provider.
CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    is_admin    INTEGER NOT NULL DEFAULT 0,
    auth_token  TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS authors (
    author_id     TEXT PRIMARY KEY,
    first_name    TEXT NOT NULL,
    last_name     TEXT NOT NULL,
    submitted_by  TEXT NOT NULL,
    submitted_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sources (
    source_id     TEXT PRIMARY KEY,
    submitted_by  TEXT NOT NULL,
    submitted_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS source_authors (
    source_id  TEXT NOT NULL REFERENCES sources(source_id),
    author_id  TEXT NOT NULL REFERENCES authors(author_id),
    position   INTEGER NOT NULL,
    PRIMARY KEY (source_id, author_id)
);

-- Timestamps are fixed-width RFC 3339 (nanosecond precision, `Z` suffix) so
-- that string comparison orders them chronologically.
CREATE TABLE IF NOT EXISTS definitions (
    definition_id          TEXT PRIMARY KEY,
    submitted_by           TEXT NOT NULL,
    submitted_at           TEXT NOT NULL,
    last_submit_change_at  TEXT NOT NULL,
    approved               INTEGER NOT NULL DEFAULT 0,
    approved_by            TEXT,
    approved_at            TEXT,
    title                  TEXT NOT NULL,
    content                TEXT NOT NULL,
    source_id              TEXT NOT NULL REFERENCES sources(source_id),
    publishing_date        TEXT NOT NULL,
    tags                   TEXT NOT NULL DEFAULT '[]',   -- JSON array, sorted
    CHECK (
         (approved = 0 AND approved_by IS NULL     AND approved_at IS NULL)
      OR (approved = 1 AND approved_by IS NOT NULL AND approved_at IS NOT NULL)
    )
);

-- Approved definitions are frozen.
CREATE TRIGGER IF NOT EXISTS definitions_frozen_after_approval
BEFORE UPDATE ON definitions
WHEN OLD.approved = 1
BEGIN
    SELECT RAISE(ABORT, 'definition is approved');
END;

-- Rejection logs are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS rejections (
    rejection_id   TEXT PRIMARY KEY,
    definition_id  TEXT NOT NULL REFERENCES definitions(definition_id),
    rejected_by    TEXT NOT NULL,
    rejected_at    TEXT NOT NULL,
    content        TEXT NOT NULL CHECK (length(trim(content)) > 0)
);

CREATE TRIGGER IF NOT EXISTS rejections_no_update
BEFORE UPDATE ON rejections
BEGIN
    SELECT RAISE(ABORT, 'rejections are append-only');
END;

CREATE TRIGGER IF NOT EXISTS rejections_no_delete
BEFORE DELETE ON rejections
BEGIN
    SELECT RAISE(ABORT, 'rejections are append-only');
END;

CREATE INDEX IF NOT EXISTS definitions_submitted_idx ON definitions(submitted_at);
CREATE INDEX IF NOT EXISTS definitions_source_idx    ON definitions(source_id);
CREATE INDEX IF NOT EXISTS rejections_definition_idx ON rejections(definition_id, rejected_at);
CREATE INDEX IF NOT EXISTS source_authors_author_idx ON source_authors(author_id);

PRAGMA user_version = 1;
";
