// Thread-parent resolution — locating a bridged post on the destination.
//
// When a source post replies to something girder never mirrored (usually a
// post by another account bridged over ActivityPub), the destination-side
// counterpart has to be found heuristically. The heuristics are an ordered
// list of independent strategies, tried in order with early exit; a
// strategy that errors is logged and treated as a miss so the chain always
// runs to completion.

pub mod strategies;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::bluesky::traits::DestinationClient;
use crate::db::models::PostRef;
use crate::mastodon::traits::SourcePost;

/// Everything a strategy may inspect about the parent being located.
pub struct ResolveContext<'a> {
    /// The parent's id on the source platform.
    pub post_id: &'a str,
    pub username: &'a str,
    pub instance: &'a str,
    /// The parent's normalized content.
    pub content: &'a str,
    pub display_name: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> ResolveContext<'a> {
    /// Build a context from a fetched source post.
    pub fn from_post(post: &'a SourcePost) -> Self {
        Self {
            post_id: &post.id,
            username: &post.author.username,
            instance: &post.author.instance,
            content: &post.content,
            display_name: &post.author.display_name,
            created_at: post.created_at,
        }
    }
}

/// One way of locating a bridged post. Returns `Ok(None)` on a miss —
/// a miss is an expected outcome, not an error.
#[async_trait]
pub trait ResolveStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn resolve(
        &self,
        dest: &dyn DestinationClient,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<PostRef>>;
}

/// The ordered fallback chain.
pub struct ParentResolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl ParentResolver {
    /// The default chain: canonical bridge handle, alternate handle
    /// formats, post-id search, then content matching.
    pub fn new() -> Self {
        Self {
            strategies: vec![
                Box::new(strategies::CanonicalBridgeHandle),
                Box::new(strategies::AlternateBridgeHandles),
                Box::new(strategies::PostIdSearch),
                Box::new(strategies::ContentMatch),
            ],
        }
    }

    /// Try each strategy in order; the first match wins.
    ///
    /// `None` means the chain is exhausted and the caller must treat the
    /// reply as unresolvable.
    pub async fn resolve(
        &self,
        dest: &dyn DestinationClient,
        ctx: &ResolveContext<'_>,
    ) -> Option<PostRef> {
        for strategy in &self.strategies {
            match strategy.resolve(dest, ctx).await {
                Ok(Some(found)) => {
                    info!(
                        strategy = strategy.name(),
                        parent_id = ctx.post_id,
                        uri = %found.uri,
                        "Resolved thread parent"
                    );
                    return Some(found);
                }
                Ok(None) => {
                    debug!(strategy = strategy.name(), parent_id = ctx.post_id, "No match");
                }
                Err(e) => {
                    warn!(
                        strategy = strategy.name(),
                        parent_id = ctx.post_id,
                        error = %e,
                        "Resolver strategy failed"
                    );
                }
            }
        }
        None
    }
}

impl Default for ParentResolver {
    fn default() -> Self {
        Self::new()
    }
}
