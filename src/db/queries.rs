// Database queries — CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{MirroredThread, PostRef};

// --- Sync state ---

/// Get a sync state value by key (e.g., "last_seen_id").
pub fn get_sync_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM sync_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a sync state value (upsert).
pub fn set_sync_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Post mappings ---

/// Save the mirrored thread for a source post (upsert).
///
/// The upsert preserves created_at so the edit sweep's recency ordering
/// reflects when the post was first mirrored, not last re-mirrored.
pub fn save_post_mapping(conn: &Connection, source_id: &str, thread: &[PostRef]) -> Result<()> {
    let thread_json = serde_json::to_string(thread)?;
    conn.execute(
        "INSERT INTO post_mappings (source_id, thread_json, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(source_id) DO UPDATE SET
            thread_json = ?2,
            updated_at = datetime('now')",
        params![source_id, thread_json],
    )?;
    Ok(())
}

/// Load the mirrored thread for a source post, if one exists.
pub fn get_post_mapping(conn: &Connection, source_id: &str) -> Result<Option<MirroredThread>> {
    let mut stmt = conn.prepare("SELECT thread_json FROM post_mappings WHERE source_id = ?1")?;
    let json: Option<String> = stmt
        .query_row(params![source_id], |row| row.get(0))
        .optional()?;

    match json {
        Some(json) => {
            let thread: MirroredThread = serde_json::from_str(&json)?;
            Ok(Some(thread))
        }
        None => Ok(None),
    }
}

/// The most recently mirrored source post ids, newest first.
/// These are the candidates the edit sweep re-checks.
pub fn recent_mapped_ids(conn: &Connection, limit: u32) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT source_id FROM post_mappings ORDER BY created_at DESC, source_id DESC LIMIT ?1",
    )?;
    let ids = stmt
        .query_map(params![limit], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(ids)
}

/// Count mirrored posts (for status display).
pub fn mapping_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM post_mappings", [], |row| row.get(0))?;
    Ok(count)
}

// --- Edit lineage ---

/// Record that `edit_id` is an edit of `original_id` (upsert).
pub fn mark_edit(conn: &Connection, edit_id: &str, original_id: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO edit_lineage (edit_id, original_id)
         VALUES (?1, ?2)
         ON CONFLICT(edit_id) DO UPDATE SET original_id = ?2",
        params![edit_id, original_id],
    )?;
    Ok(())
}

/// Look up the original id an edited post descends from.
pub fn get_edit_original(conn: &Connection, edit_id: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT original_id FROM edit_lineage WHERE edit_id = ?1")?;
    let result = stmt
        .query_row(params![edit_id], |row| row.get(0))
        .optional()?;
    Ok(result)
}

// --- Content fingerprints ---

/// Store the fingerprint of a post's current normalized content (upsert).
pub fn save_fingerprint(conn: &Connection, source_id: &str, fingerprint: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO content_fingerprints (source_id, fingerprint, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(source_id) DO UPDATE SET
            fingerprint = ?2,
            updated_at = datetime('now')",
        params![source_id, fingerprint],
    )?;
    Ok(())
}

/// Load the stored fingerprint for a source post, if any.
pub fn get_fingerprint(conn: &Connection, source_id: &str) -> Result<Option<String>> {
    let mut stmt =
        conn.prepare("SELECT fingerprint FROM content_fingerprints WHERE source_id = ?1")?;
    let result = stmt
        .query_row(params![source_id], |row| row.get(0))
        .optional()?;
    Ok(result)
}
