// SourceClient trait — the capability set the reconciliation loop needs
// from the source platform.
//
// Implementor: MastodonClient. The trait seam keeps the loop testable
// against mock sources.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A source post after content normalization — the unit the loop processes.
#[derive(Debug, Clone)]
pub struct SourcePost {
    /// Platform-assigned opaque id (monotonic-ish).
    pub id: String,
    /// Plain text after transformation.
    pub content: String,
    /// "public" or anything else; only public posts are mirrored.
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub edited_at: Option<DateTime<Utc>>,
    /// Parent post id when this is a reply.
    pub reply_to_id: Option<String>,
    pub hashtags: Vec<String>,
    /// Id of the reblogged post — reblogs are recognized and skipped.
    pub reblog_of: Option<String>,
    /// Platform-supplied edit origin, when the platform reports one.
    pub original_id: Option<String>,
    pub author: PostAuthor,
}

/// Identity fields used by the cross-platform parent resolver.
#[derive(Debug, Clone, Default)]
pub struct PostAuthor {
    pub username: String,
    pub instance: String,
    pub display_name: String,
}

impl SourcePost {
    pub fn is_public(&self) -> bool {
        self.visibility == "public"
    }
}

#[async_trait]
pub trait SourceClient: Send + Sync {
    /// Fetch the account's recent posts, newest first.
    ///
    /// `since_id` bounds the fetch to posts after the watermark;
    /// `since_time` drops posts created before it (used to avoid
    /// backfilling history on a fresh cursor).
    async fn fetch_recent_posts(
        &self,
        since_id: Option<&str>,
        since_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<SourcePost>>;

    /// Fetch a single post, including author identity fields.
    async fn fetch_post(&self, id: &str) -> Result<SourcePost>;

    /// Fetch the subset of `known_ids` that was edited after `since`.
    ///
    /// Per-id lookup failures are logged and skipped, never fatal.
    async fn fetch_edited_posts(
        &self,
        known_ids: &[String],
        since: DateTime<Utc>,
    ) -> Result<HashMap<String, SourcePost>>;
}
