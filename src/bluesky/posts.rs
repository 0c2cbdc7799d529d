// DestinationClient operations — record creation/deletion, feed and search
// lookups, mapped onto XRPC calls.
//
// Reply references carry the immediate predecessor as both root and parent;
// the chains girder produces are shallow enough that threading renders
// identically either way.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::models::PostRef;

use super::client::BskyClient;
use super::traits::{DestinationClient, FeedPost};

const POST_COLLECTION: &str = "app.bsky.feed.post";

impl BskyClient {
    async fn create_record(&self, record: PostRecord<'_>) -> Result<PostRef> {
        let session = self.ensure_session().await?;
        let request = CreateRecordRequest {
            repo: &session.did,
            collection: POST_COLLECTION,
            record,
        };

        let resp: CreateRecordResponse = self
            .xrpc_post("com.atproto.repo.createRecord", &request)
            .await?;

        Ok(PostRef {
            uri: resp.uri,
            cid: resp.cid,
        })
    }
}

#[async_trait]
impl DestinationClient for BskyClient {
    async fn create_post(&self, text: &str) -> Result<PostRef> {
        let record = PostRecord {
            record_type: POST_COLLECTION,
            text,
            created_at: Utc::now().to_rfc3339(),
            reply: None,
        };
        self.create_record(record)
            .await
            .context("Failed to create post")
    }

    async fn create_reply(&self, text: &str, parent: &PostRef) -> Result<PostRef> {
        let record = PostRecord {
            record_type: POST_COLLECTION,
            text,
            created_at: Utc::now().to_rfc3339(),
            reply: Some(ReplyRef {
                root: parent.clone(),
                parent: parent.clone(),
            }),
        };
        self.create_record(record)
            .await
            .context("Failed to create reply")
    }

    async fn delete_post(&self, uri: &str) -> Result<()> {
        let session = self.ensure_session().await?;

        // at://did:plc:xxx/app.bsky.feed.post/rkey → rkey
        let rkey = uri
            .rsplit('/')
            .next()
            .filter(|r| !r.is_empty())
            .with_context(|| format!("Cannot extract record key from {uri}"))?;

        let request = DeleteRecordRequest {
            repo: &session.did,
            collection: POST_COLLECTION,
            rkey,
        };

        let _: serde_json::Value = self
            .xrpc_post("com.atproto.repo.deleteRecord", &request)
            .await
            .with_context(|| format!("Failed to delete post {uri}"))?;
        Ok(())
    }

    async fn resolve_handle(&self, handle: &str) -> Result<Option<String>> {
        self.resolve_handle_opt(handle).await
    }

    async fn fetch_author_feed(&self, actor: &str, limit: u32) -> Result<Vec<FeedPost>> {
        let limit = limit.to_string();
        let resp: AuthorFeedResponse = self
            .xrpc_get(
                "app.bsky.feed.getAuthorFeed",
                &[("actor", actor), ("limit", &limit)],
            )
            .await
            .with_context(|| format!("Failed to fetch author feed for {actor}"))?;

        Ok(resp.feed.into_iter().map(|item| item.post.into()).collect())
    }

    async fn search_posts(&self, query: &str, limit: u32) -> Result<Vec<FeedPost>> {
        let limit = limit.to_string();
        let resp: SearchPostsResponse = self
            .xrpc_get("app.bsky.feed.searchPosts", &[("q", query), ("limit", &limit)])
            .await
            .context("Post search failed")?;

        Ok(resp.posts.into_iter().map(FeedPost::from).collect())
    }
}

// -- Serde types for com.atproto.repo records --

#[derive(Serialize)]
struct PostRecord<'a> {
    #[serde(rename = "$type")]
    record_type: &'a str,
    text: &'a str,
    #[serde(rename = "createdAt")]
    created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply: Option<ReplyRef>,
}

#[derive(Serialize)]
struct ReplyRef {
    root: PostRef,
    parent: PostRef,
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    record: PostRecord<'a>,
}

#[derive(Deserialize)]
struct CreateRecordResponse {
    uri: String,
    cid: String,
}

#[derive(Serialize)]
struct DeleteRecordRequest<'a> {
    repo: &'a str,
    collection: &'a str,
    rkey: &'a str,
}

// -- Serde types for feed and search views --

#[derive(Deserialize)]
struct AuthorFeedResponse {
    feed: Vec<FeedItem>,
}

#[derive(Deserialize)]
struct FeedItem {
    post: PostView,
}

#[derive(Deserialize)]
struct SearchPostsResponse {
    posts: Vec<PostView>,
}

#[derive(Deserialize)]
struct PostView {
    uri: String,
    cid: String,
    #[serde(default)]
    author: AuthorView,
    #[serde(default)]
    record: RecordView,
}

#[derive(Deserialize, Default)]
struct AuthorView {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Deserialize, Default)]
struct RecordView {
    #[serde(default)]
    text: String,
    #[serde(rename = "createdAt")]
    created_at: Option<String>,
    #[serde(default)]
    embed: Option<EmbedView>,
}

#[derive(Deserialize)]
struct EmbedView {
    external: Option<ExternalView>,
}

#[derive(Deserialize)]
struct ExternalView {
    #[serde(default)]
    uri: String,
}

impl From<PostView> for FeedPost {
    fn from(view: PostView) -> Self {
        let external_url = view
            .record
            .embed
            .and_then(|e| e.external)
            .map(|x| x.uri)
            .filter(|u| !u.is_empty());

        let created_at = view
            .record
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc));

        FeedPost {
            uri: view.uri,
            cid: view.cid,
            text: view.record.text,
            external_url,
            author_display_name: view.author.display_name,
            created_at,
        }
    }
}
