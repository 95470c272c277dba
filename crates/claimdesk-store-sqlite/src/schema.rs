//! SQL schema for the Claimdesk SQLite store.
//!
//! Executed at every open, so a fresh database is migrated at startup.
//! Future migrations will be gated on `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id        TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash  TEXT NOT NULL,        -- argon2 PHC string
    policy_number  TEXT NOT NULL,
    member_since   TEXT NOT NULL         -- YYYY-MM-DD
);

-- Claims are never deleted.
CREATE TABLE IF NOT EXISTS claims (
    claim_id          TEXT PRIMARY KEY,
    user_id           TEXT NOT NULL REFERENCES users(user_id),
    user_name         TEXT NOT NULL,
    policy_number     TEXT NOT NULL,
    claim_type        TEXT NOT NULL,
    description       TEXT NOT NULL,
    incident_date     TEXT NOT NULL,
    estimated_amount  REAL NOT NULL,
    status            TEXT NOT NULL,
    status_history    TEXT NOT NULL DEFAULT '[]',   -- JSON array, append-only
    folder_id         TEXT,
    files             TEXT NOT NULL DEFAULT '[]',   -- JSON array of StoredFile
    extraction        TEXT,                         -- opaque JSON or NULL
    process_key       TEXT,
    workflow_status   TEXT,
    risk_score        REAL,
    workflow_degraded INTEGER NOT NULL DEFAULT 0,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS claims_user_idx   ON claims(user_id);
CREATE INDEX IF NOT EXISTS claims_status_idx ON claims(status);
CREATE INDEX IF NOT EXISTS claims_folder_idx ON claims(folder_id);

PRAGMA user_version = 1;
";
