// Database trait — backend-agnostic async interface for all DB operations.
//
// Implementor: SqliteDatabase (wraps rusqlite). All methods are async so the
// sync rusqlite backend (via Mutex) fits behind the same interface as any
// future native-async backend.
//
// The trait mirrors the queries.rs function signatures, so callers hold an
// `Arc<dyn Database>` and never touch a Connection directly.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{MirroredThread, PostRef};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Lifecycle ---

    /// Count the number of user-created tables in the database.
    async fn table_count(&self) -> Result<i64>;

    // --- Sync state ---

    /// Get a sync state value by key (e.g., "last_seen_id").
    async fn get_sync_state(&self, key: &str) -> Result<Option<String>>;

    /// Set a sync state value (upsert).
    async fn set_sync_state(&self, key: &str, value: &str) -> Result<()>;

    // --- Post mappings ---

    /// Save the mirrored thread for a source post (overwrites on re-mirror).
    async fn save_post_mapping(&self, source_id: &str, thread: &[PostRef]) -> Result<()>;

    /// Load the mirrored thread for a source post.
    async fn get_post_mapping(&self, source_id: &str) -> Result<Option<MirroredThread>>;

    /// The most recently mirrored source ids, newest first.
    async fn recent_mapped_ids(&self, limit: u32) -> Result<Vec<String>>;

    /// Count mirrored posts.
    async fn mapping_count(&self) -> Result<i64>;

    // --- Edit lineage ---

    /// Record that `edit_id` is an edit of `original_id`.
    async fn mark_edit(&self, edit_id: &str, original_id: &str) -> Result<()>;

    /// Look up the original id an edited post descends from.
    async fn get_edit_original(&self, edit_id: &str) -> Result<Option<String>>;

    // --- Content fingerprints ---

    /// Store the fingerprint of a post's current normalized content.
    async fn save_fingerprint(&self, source_id: &str, fingerprint: &str) -> Result<()>;

    /// Load the stored fingerprint for a source post.
    async fn get_fingerprint(&self, source_id: &str) -> Result<Option<String>>;
}
