//! SQL schema for the Panchayat SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    id    TEXT PRIMARY KEY,
    name  TEXT NOT NULL,
    role  TEXT NOT NULL DEFAULT 'citizen'   -- 'citizen' | 'staff' | 'admin'
);

-- Actor columns are not foreign keys; a missing join reads as unknown.
CREATE TABLE IF NOT EXISTS document_requests (
    id                TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL,
    document_type     TEXT NOT NULL,
    purpose           TEXT NOT NULL,
    status            TEXT NOT NULL DEFAULT 'pending',
    created_at        TEXT NOT NULL,   -- RFC 3339 UTC, fixed precision
    updated_at        TEXT NOT NULL,
    attachments       TEXT NOT NULL DEFAULT '[]',
    verified_by       TEXT,
    approved_by       TEXT,
    rejection_reason  TEXT,
    additional_notes  TEXT,
    form_details      TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS announcements (
    id          TEXT PRIMARY KEY,
    title       TEXT NOT NULL,
    content     TEXT NOT NULL,
    category    TEXT NOT NULL,
    important   INTEGER NOT NULL DEFAULT 0,
    created_by  TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS staff (
    id         TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL UNIQUE REFERENCES profiles(id),
    is_active  INTEGER NOT NULL DEFAULT 1,
    joined_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS complaints (
    id           TEXT PRIMARY KEY,
    user_id      TEXT NOT NULL,
    title        TEXT NOT NULL,
    description  TEXT NOT NULL DEFAULT '',
    status       TEXT NOT NULL DEFAULT 'open',
    assigned_to  TEXT,
    created_at   TEXT NOT NULL,
    updated_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_user_idx      ON document_requests(user_id);
CREATE INDEX IF NOT EXISTS documents_verifier_idx  ON document_requests(verified_by);
CREATE INDEX IF NOT EXISTS documents_approver_idx  ON document_requests(approved_by);
CREATE INDEX IF NOT EXISTS documents_created_idx   ON document_requests(created_at);
CREATE INDEX IF NOT EXISTS complaints_assignee_idx ON complaints(assigned_to, status);

PRAGMA user_version = 1;
";
