// DestinationClient trait — the capability set the bridge needs from the
// destination platform.
//
// Implementor: BskyClient. The executor and resolver work against this
// trait, which is what makes rollback and heuristic-chain behavior
// testable with mock destinations.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::PostRef;

/// A destination post as seen in feeds and search results — just the
/// fields the parent resolver inspects.
#[derive(Debug, Clone)]
pub struct FeedPost {
    pub uri: String,
    pub cid: String,
    pub text: String,
    /// External-link embed target, when the post carries one. Bridged posts
    /// link back to their source, which is what the resolver matches on.
    pub external_url: Option<String>,
    pub author_display_name: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl FeedPost {
    /// Whether the post's link or text mentions `needle` (a source post id).
    pub fn references(&self, needle: &str) -> bool {
        self.external_url
            .as_deref()
            .is_some_and(|url| url.contains(needle))
            || self.text.contains(needle)
    }

    pub fn post_ref(&self) -> PostRef {
        PostRef {
            uri: self.uri.clone(),
            cid: self.cid.clone(),
        }
    }
}

#[async_trait]
pub trait DestinationClient: Send + Sync {
    /// Create a top-level post; returns its reference.
    async fn create_post(&self, text: &str) -> Result<PostRef>;

    /// Create a reply to `parent`; returns the new post's reference.
    async fn create_reply(&self, text: &str, parent: &PostRef) -> Result<PostRef>;

    /// Delete a post by its at:// URI.
    async fn delete_post(&self, uri: &str) -> Result<()>;

    /// Resolve a handle to its DID. An unknown handle is `None`, not an
    /// error — resolver strategies probe speculative handles.
    async fn resolve_handle(&self, handle: &str) -> Result<Option<String>>;

    /// Fetch an account's recent posts, newest first.
    async fn fetch_author_feed(&self, actor: &str, limit: u32) -> Result<Vec<FeedPost>>;

    /// Full-text post search.
    async fn search_posts(&self, query: &str, limit: u32) -> Result<Vec<FeedPost>>;
}
