// Database layer — SQLite storage for post mappings, edit lineage, content
// fingerprints, and sync state.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever GIRDER_DB_PATH points
// (defaults to ./girder.db).

pub mod models;
pub mod queries;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use traits::Database;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;

use sqlite::SqliteDatabase;

/// Open (or create) the database, run migrations, and wrap it in the
/// Database trait.
///
/// This is the main entry point — called by `girder init` and usable by any
/// command that should work on a fresh checkout.
pub fn initialize_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    // Create parent directories if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory for database: {}", db_path))?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    // WAL keeps the file consistent across the loop's frequent small writes
    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(Arc::new(SqliteDatabase::new(conn)))
}

/// Open an existing database (fails if it doesn't exist yet).
pub fn open_sqlite(db_path: &str) -> Result<Arc<dyn Database>> {
    if !Path::new(db_path).exists() {
        anyhow::bail!("Database not found at {}. Run `girder init` first.", db_path);
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(Arc::new(SqliteDatabase::new(conn)))
}
