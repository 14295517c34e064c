// SQLite store for enriched reviews, written by `themescope load`.
//
// rusqlite is built with "bundled", so no system SQLite is needed. The file
// lives at THEMESCOPE_DB_PATH (default ./themescope.db) and is rebuilt from
// the enriched table on every load; nothing else writes to it.

pub mod queries;
pub mod schema;

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

/// Open the load target, creating the file, its directory and any missing
/// tables. A database stamped with a newer schema than this build knows is
/// refused rather than written to.
pub fn initialize(db_path: impl AsRef<Path>) -> Result<Connection> {
    let db_path = db_path.as_ref();
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for {}", db_path.display()))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    if let Some(found) = schema::stored_version(&conn)? {
        if found > schema::SCHEMA_VERSION {
            anyhow::bail!(
                "{} has schema version {found}, newer than this build's {}. Point THEMESCOPE_DB_PATH at a fresh file.",
                db_path.display(),
                schema::SCHEMA_VERSION
            );
        }
    }
    schema::create_tables(&conn)?;

    debug!(path = %db_path.display(), "Database ready");
    Ok(conn)
}
