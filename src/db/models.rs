// Data models — Rust structs that map to database rows.
//
// These are the types that flow through the application. They're separate
// from the database queries so other modules can use them without depending
// on rusqlite directly.

use serde::{Deserialize, Serialize};

/// A reference to a single destination post.
///
/// Always carried as an explicit two-field record — never as a
/// delimiter-joined string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRef {
    pub uri: String,
    pub cid: String,
}

/// The ordered destination posts that mirror one source post.
///
/// Length ≥ 1; order is posting order, which is also reply-chain order.
/// Replies to the source post attach to the *last* element.
pub type MirroredThread = Vec<PostRef>;
