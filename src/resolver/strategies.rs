// The individual parent-location heuristics.
//
// Accounts bridged from the fediverse appear on Bluesky under predictable
// Bridgy Fed handles, and their posts carry a link back to the source post.
// The strategies exploit that, falling back to search when handle
// derivation fails.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::bluesky::traits::{DestinationClient, FeedPost};
use crate::db::models::PostRef;

use super::{ResolveContext, ResolveStrategy};

/// How many of a candidate account's posts to scan for the source link.
const FEED_SCAN_LIMIT: u32 = 100;
/// Result cap for the post-id search.
const SEARCH_LIMIT: u32 = 20;
/// Result cap for the content search (wider — more false candidates).
const CONTENT_SEARCH_LIMIT: u32 = 30;
/// Longest content prefix used as a search query, in chars.
pub const CONTENT_PREFIX_MAX: usize = 30;
/// Candidate timestamps must fall within this window of the source post.
const MATCH_WINDOW_SECS: i64 = 24 * 60 * 60;

/// The standard Bridgy Fed handle for a fediverse account.
pub fn canonical_bridge_handle(username: &str, instance: &str) -> String {
    format!("{username}.{instance}.ap.brid.gy")
}

/// Handle formats some bridged accounts end up under instead.
pub fn alternate_bridge_handles(username: &str, instance: &str) -> Vec<String> {
    vec![
        format!("{username}.{instance}.ap.bridgy.fed"),
        format!("{username}_{instance}.ap.brid.gy"),
        format!("{username}-{instance}.ap.brid.gy"),
    ]
}

/// Resolve a handle and scan that account's recent posts for one that
/// references the source post id.
async fn find_in_author_feed(
    dest: &dyn DestinationClient,
    handle: &str,
    post_id: &str,
) -> Result<Option<PostRef>> {
    let Some(did) = dest.resolve_handle(handle).await? else {
        debug!(handle = handle, "Handle does not resolve");
        return Ok(None);
    };

    let feed = dest.fetch_author_feed(&did, FEED_SCAN_LIMIT).await?;
    Ok(feed
        .iter()
        .find(|post| post.references(post_id))
        .map(FeedPost::post_ref))
}

/// Strategy a: the canonical Bridgy Fed handle.
pub struct CanonicalBridgeHandle;

#[async_trait]
impl ResolveStrategy for CanonicalBridgeHandle {
    fn name(&self) -> &'static str {
        "canonical-bridge-handle"
    }

    async fn resolve(
        &self,
        dest: &dyn DestinationClient,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<PostRef>> {
        if ctx.username.is_empty() || ctx.instance.is_empty() {
            return Ok(None);
        }
        let handle = canonical_bridge_handle(ctx.username, ctx.instance);
        find_in_author_feed(dest, &handle, ctx.post_id).await
    }
}

/// Strategy b: alternate handle formats, tried the same way.
pub struct AlternateBridgeHandles;

#[async_trait]
impl ResolveStrategy for AlternateBridgeHandles {
    fn name(&self) -> &'static str {
        "alternate-bridge-handles"
    }

    async fn resolve(
        &self,
        dest: &dyn DestinationClient,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<PostRef>> {
        if ctx.username.is_empty() || ctx.instance.is_empty() {
            return Ok(None);
        }

        for handle in alternate_bridge_handles(ctx.username, ctx.instance) {
            match find_in_author_feed(dest, &handle, ctx.post_id).await {
                Ok(Some(found)) => return Ok(Some(found)),
                Ok(None) => {}
                Err(e) => {
                    debug!(handle = %handle, error = %e, "Handle variant lookup failed");
                }
            }
        }
        Ok(None)
    }
}

/// Strategy c: full-text search for an `instance/postId`-shaped string.
pub struct PostIdSearch;

#[async_trait]
impl ResolveStrategy for PostIdSearch {
    fn name(&self) -> &'static str {
        "post-id-search"
    }

    async fn resolve(
        &self,
        dest: &dyn DestinationClient,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<PostRef>> {
        if ctx.instance.is_empty() {
            return Ok(None);
        }

        let query = format!("{}/{}", ctx.instance, ctx.post_id);
        let results = dest.search_posts(&query, SEARCH_LIMIT).await?;

        Ok(results
            .iter()
            .find(|post| post.references(ctx.post_id))
            .map(FeedPost::post_ref))
    }
}

/// Strategy d: search by a content prefix, then confirm candidates by
/// author identity, text, and timestamp.
pub struct ContentMatch;

#[async_trait]
impl ResolveStrategy for ContentMatch {
    fn name(&self) -> &'static str {
        "content-match"
    }

    async fn resolve(
        &self,
        dest: &dyn DestinationClient,
        ctx: &ResolveContext<'_>,
    ) -> Result<Option<PostRef>> {
        let prefix = search_prefix(ctx.content, CONTENT_PREFIX_MAX);
        if prefix.is_empty() {
            return Ok(None);
        }

        let results = dest.search_posts(&prefix, CONTENT_SEARCH_LIMIT).await?;

        Ok(results
            .iter()
            .find(|candidate| {
                is_candidate_match(candidate, &prefix, ctx.display_name, ctx.created_at)
            })
            .map(FeedPost::post_ref))
    }
}

/// The leading words of `content`, up to `max_chars`, never cutting a word.
///
/// Falls back to a raw char prefix when the first word alone is longer
/// than the cap.
pub fn search_prefix(content: &str, max_chars: usize) -> String {
    let content = content.trim();
    if content.chars().count() <= max_chars {
        return content.to_string();
    }

    let mut prefix = String::new();
    let mut used = 0;
    for word in content.split_whitespace() {
        let word_len = word.chars().count();
        let sep = usize::from(!prefix.is_empty());
        if used + sep + word_len > max_chars {
            break;
        }
        if sep == 1 {
            prefix.push(' ');
        }
        prefix.push_str(word);
        used += sep + word_len;
    }

    if prefix.is_empty() {
        content.chars().take(max_chars).collect()
    } else {
        prefix
    }
}

/// A candidate matches only when all three hold: display names agree by
/// exact or substring containment (either direction), candidate text and
/// the content prefix are mutually substring-compatible, and the candidate
/// was created within ±24h of the source post.
pub fn is_candidate_match(
    candidate: &FeedPost,
    prefix: &str,
    display_name: &str,
    created_at: DateTime<Utc>,
) -> bool {
    let Some(candidate_name) = candidate.author_display_name.as_deref() else {
        return false;
    };
    if candidate_name.is_empty() || display_name.is_empty() {
        return false;
    }
    let name_ok = candidate_name == display_name
        || candidate_name.contains(display_name)
        || display_name.contains(candidate_name);

    let text_ok = !candidate.text.is_empty()
        && (candidate.text.contains(prefix) || prefix.contains(candidate.text.as_str()));

    let time_ok = candidate
        .created_at
        .is_some_and(|t| (t - created_at).num_seconds().abs() < MATCH_WINDOW_SECS);

    name_ok && text_ok && time_ok
}
