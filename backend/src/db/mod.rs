//! SQLite access layer.
//!
//! Connections are opened per operation; the schema is created once at
//! startup. Batch progress has a single writer (the updater task in
//! `job_controller`) while status polling reads concurrently, so plain
//! last-write-wins updates are sufficient.

use crate::config::AppConfig;
use rusqlite::Connection;
use std::time::Duration;

pub mod batches;
pub mod certificates;
pub mod templates;

pub fn open(config: &AppConfig) -> Result<Connection, rusqlite::Error> {
    let conn = Connection::open(&config.database_path)?;
    // Status polls read while the updater task writes; wait for a held
    // lock instead of failing fast.
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(conn)
}

pub fn init_schema(config: &AppConfig) -> Result<(), rusqlite::Error> {
    let conn = open(config)?;
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS templates (
            id            TEXT PRIMARY KEY,
            owner_id      TEXT NOT NULL,
            name          TEXT NOT NULL,
            description   TEXT,
            template_type TEXT NOT NULL,
            file_path     TEXT NOT NULL,
            placeholders  TEXT NOT NULL,
            created_at    TEXT NOT NULL,
            updated_at    TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS batches (
            id                       TEXT PRIMARY KEY,
            owner_id                 TEXT NOT NULL,
            template_id              TEXT NOT NULL,
            name                     TEXT NOT NULL,
            status                   TEXT NOT NULL,
            total_certificates       INTEGER NOT NULL,
            processed_certificates   INTEGER NOT NULL DEFAULT 0,
            generated_certificates   INTEGER NOT NULL DEFAULT 0,
            mappings                 TEXT NOT NULL,
            zip_path                 TEXT,
            error                    TEXT,
            created_at               TEXT NOT NULL,
            updated_at               TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS certificates (
            id             TEXT PRIMARY KEY,
            owner_id       TEXT NOT NULL,
            batch_id       TEXT NOT NULL,
            recipient_name TEXT NOT NULL,
            row_data       TEXT NOT NULL,
            status         TEXT NOT NULL,
            pdf_path       TEXT,
            error          TEXT,
            created_at     TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_certificates_batch
            ON certificates (batch_id);",
    )?;
    Ok(())
}

/// Map a text column that must hold a known enum value.
pub(crate) fn column_parse_error(
    index: usize,
    value: &str,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        index,
        rusqlite::types::Type::Text,
        format!("unexpected value '{}'", value).into(),
    )
}
