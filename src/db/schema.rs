// Database schema — table creation.
//
// A `schema_version` table records which schema revision the file was
// created with, so later revisions can migrate in place.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema revision.
pub const SCHEMA_VERSION: i64 = 1;

/// Create all tables if they don't exist yet.
///
/// Idempotent; runs on every `initialize`.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Banks whose app reviews are analyzed
        CREATE TABLE IF NOT EXISTS banks (
            bank_id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,          -- short code used in the review table, e.g. 'CBE'
            bank_name TEXT NOT NULL,
            app_package_id TEXT                 -- Play Store package, null for unknown banks
        );

        -- Enriched reviews; fully replaced on every load
        CREATE TABLE IF NOT EXISTS reviews (
            review_id INTEGER PRIMARY KEY,      -- 1-based row number in the source table
            bank_id INTEGER REFERENCES banks(bank_id),
            review_text TEXT NOT NULL,
            rating INTEGER,                     -- 1 to 5
            review_date TEXT,                   -- YYYY-MM-DD
            sentiment_label TEXT,
            sentiment_score REAL,               -- 0.0 to 1.0
            keywords TEXT NOT NULL DEFAULT '[]',-- JSON array, highest weight first
            identified_themes TEXT NOT NULL,    -- comma-joined labels, or 'Other'
            source TEXT,
            loaded_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Load bookkeeping (last load time, source table path)
        CREATE TABLE IF NOT EXISTS load_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_reviews_bank
            ON reviews(bank_id);

        CREATE INDEX IF NOT EXISTS idx_reviews_sentiment
            ON reviews(sentiment_label);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Highest schema revision recorded in the file, or `None` for a database
/// this crate hasn't touched yet.
pub fn stored_version(conn: &Connection) -> Result<Option<i64>> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(None);
    }
    let version: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Count the number of tables in the database (useful for load confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_tables_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();
    }

    #[test]
    fn test_table_count() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        // schema_version, banks, reviews, load_state
        assert_eq!(table_count(&conn).unwrap(), 4i64);
    }

    #[test]
    fn test_schema_version_recorded_once() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        create_tables(&conn).unwrap();

        let versions: Vec<i64> = conn
            .prepare("SELECT version FROM schema_version ORDER BY version")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(versions, vec![SCHEMA_VERSION]);
    }

    #[test]
    fn test_stored_version() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(stored_version(&conn).unwrap(), None);
        create_tables(&conn).unwrap();
        assert_eq!(stored_version(&conn).unwrap(), Some(SCHEMA_VERSION));
    }
}
