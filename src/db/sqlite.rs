// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Send.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// The lock is never held across .await points.
//
// The free functions in queries.rs remain usable against a Connection
// directly, which keeps the inline tests simple.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{MirroredThread, PostRef};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }

    async fn get_sync_state(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_sync_state(&conn, key)
    }

    async fn set_sync_state(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::set_sync_state(&conn, key, value)
    }

    async fn save_post_mapping(&self, source_id: &str, thread: &[PostRef]) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_post_mapping(&conn, source_id, thread)
    }

    async fn get_post_mapping(&self, source_id: &str) -> Result<Option<MirroredThread>> {
        let conn = self.conn.lock().await;
        super::queries::get_post_mapping(&conn, source_id)
    }

    async fn recent_mapped_ids(&self, limit: u32) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        super::queries::recent_mapped_ids(&conn, limit)
    }

    async fn mapping_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::queries::mapping_count(&conn)
    }

    async fn mark_edit(&self, edit_id: &str, original_id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::mark_edit(&conn, edit_id, original_id)
    }

    async fn get_edit_original(&self, edit_id: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_edit_original(&conn, edit_id)
    }

    async fn save_fingerprint(&self, source_id: &str, fingerprint: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::save_fingerprint(&conn, source_id, fingerprint)
    }

    async fn get_fingerprint(&self, source_id: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        super::queries::get_fingerprint(&conn, source_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    async fn test_db() -> SqliteDatabase {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        SqliteDatabase::new(conn)
    }

    fn make_ref(n: u32) -> PostRef {
        PostRef {
            uri: format!("at://did:plc:me/app.bsky.feed.post/{n}"),
            cid: format!("bafy{n}"),
        }
    }

    #[tokio::test]
    async fn test_trait_sync_state_roundtrip() {
        let db = test_db().await;
        assert_eq!(db.get_sync_state("last_seen_id").await.unwrap(), None);
        db.set_sync_state("last_seen_id", "114321").await.unwrap();
        assert_eq!(
            db.get_sync_state("last_seen_id").await.unwrap(),
            Some("114321".to_string())
        );
        // Upsert overwrites
        db.set_sync_state("last_seen_id", "114400").await.unwrap();
        assert_eq!(
            db.get_sync_state("last_seen_id").await.unwrap(),
            Some("114400".to_string())
        );
    }

    #[tokio::test]
    async fn test_trait_post_mapping_roundtrip() {
        let db = test_db().await;
        assert!(db.get_post_mapping("100").await.unwrap().is_none());

        let thread = vec![make_ref(1), make_ref(2), make_ref(3)];
        db.save_post_mapping("100", &thread).await.unwrap();

        let loaded = db.get_post_mapping("100").await.unwrap().unwrap();
        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded, thread);
        // Order must survive the JSON roundtrip — replies chain off the last
        assert_eq!(loaded.last().unwrap().uri, make_ref(3).uri);
    }

    #[tokio::test]
    async fn test_trait_post_mapping_overwrite() {
        let db = test_db().await;
        db.save_post_mapping("100", &[make_ref(1), make_ref(2)])
            .await
            .unwrap();
        db.save_post_mapping("100", &[make_ref(9)]).await.unwrap();

        let loaded = db.get_post_mapping("100").await.unwrap().unwrap();
        assert_eq!(loaded, vec![make_ref(9)]);
        assert_eq!(db.mapping_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_trait_recent_mapped_ids() {
        let db = test_db().await;
        // created_at has second granularity, so the secondary source_id
        // ordering decides within a burst
        db.save_post_mapping("101", &[make_ref(1)]).await.unwrap();
        db.save_post_mapping("102", &[make_ref(2)]).await.unwrap();
        db.save_post_mapping("103", &[make_ref(3)]).await.unwrap();

        let ids = db.recent_mapped_ids(2).await.unwrap();
        assert_eq!(ids, vec!["103".to_string(), "102".to_string()]);
    }

    #[tokio::test]
    async fn test_trait_edit_lineage_roundtrip() {
        let db = test_db().await;
        assert!(db.get_edit_original("200").await.unwrap().is_none());
        db.mark_edit("200", "100").await.unwrap();
        assert_eq!(
            db.get_edit_original("200").await.unwrap(),
            Some("100".to_string())
        );
    }

    #[tokio::test]
    async fn test_trait_fingerprint_roundtrip() {
        let db = test_db().await;
        assert!(db.get_fingerprint("100").await.unwrap().is_none());
        db.save_fingerprint("100", "abc123").await.unwrap();
        assert_eq!(
            db.get_fingerprint("100").await.unwrap(),
            Some("abc123".to_string())
        );
        db.save_fingerprint("100", "def456").await.unwrap();
        assert_eq!(
            db.get_fingerprint("100").await.unwrap(),
            Some("def456".to_string())
        );
    }

    #[tokio::test]
    async fn test_trait_table_count() {
        let db = test_db().await;
        let count = db.table_count().await.unwrap();
        assert_eq!(count, 5);
    }
}
