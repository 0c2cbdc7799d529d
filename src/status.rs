// System status display — shows DB stats, cursor position, last edit check.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::db::Database;
use crate::sync::runner::{CURSOR_KEY, LAST_EDIT_CHECK_KEY};

/// Display bridge status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_path: &str) -> Result<()> {
    if !Path::new(db_path).exists() {
        println!("Database: not initialized");
        println!("\nRun `girder init` to set up the database.");
        return Ok(());
    }

    // Database file size
    let file_size = std::fs::metadata(db_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_path, file_size);

    let mirrored = db.mapping_count().await?;
    println!("Mirrored posts: {}", mirrored);

    match db.get_sync_state(CURSOR_KEY).await? {
        Some(cursor) => println!("Cursor: last seen source post {}", cursor),
        None => {
            println!("Cursor: none yet");
            println!("  Run `girder run` to start mirroring");
        }
    }

    match db.get_sync_state(LAST_EDIT_CHECK_KEY).await? {
        Some(checked) => println!("Last edit check: {}", checked),
        None => println!("Last edit check: never"),
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
