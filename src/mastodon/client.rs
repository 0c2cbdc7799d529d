// Mastodon REST client — bearer-token HTTP against a single instance.
//
// A thin reqwest wrapper with a generic GET helper; response types live at
// the bottom of the file. Statuses are converted to SourcePost on the way
// out, which is where content normalization happens.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::content::transform;

use super::traits::{PostAuthor, SourceClient, SourcePost};

/// Authenticated client for one Mastodon account.
pub struct MastodonClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    filter_hashtags: Vec<String>,
    /// Cached verify_credentials result — the account id never changes.
    account: Mutex<Option<AccountInfo>>,
}

/// The identity fields `girder check` displays and the client caches.
#[derive(Debug, Clone)]
pub struct AccountInfo {
    pub id: String,
    pub acct: String,
    pub display_name: String,
}

impl MastodonClient {
    /// Create a client for the given instance.
    ///
    /// The server URL may omit its scheme; https is assumed.
    pub fn new(server: &str, access_token: &str, filter_hashtags: Vec<String>) -> Result<Self> {
        if server.is_empty() {
            anyhow::bail!("Mastodon server URL is required");
        }
        if access_token.is_empty() {
            anyhow::bail!("Mastodon access token is required");
        }

        let base_url = if server.starts_with("http") {
            server.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", server.trim_end_matches('/'))
        };

        let http = reqwest::Client::builder()
            .user_agent("girder/0.1 (mastodon-to-bluesky bridge)")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            access_token: access_token.to_string(),
            filter_hashtags,
            account: Mutex::new(None),
        })
    }

    /// Make a GET request to an API path and deserialize the response.
    async fn api_get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        debug!(path = path, "Mastodon GET request");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Mastodon request failed: {path}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Mastodon {path} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize {path} response"))
    }

    /// Verify the access token and return (caching) the account identity.
    pub async fn verify_credentials(&self) -> Result<AccountInfo> {
        if let Some(cached) = self.account.lock().await.as_ref() {
            return Ok(cached.clone());
        }

        let account: Account = self
            .api_get("/api/v1/accounts/verify_credentials", &[])
            .await
            .context("Mastodon credential verification failed")?;

        let info = AccountInfo {
            id: account.id,
            acct: account.acct,
            display_name: account.display_name,
        };
        *self.account.lock().await = Some(info.clone());
        Ok(info)
    }

    /// Hostname of the configured instance (scheme and path stripped).
    fn server_host(&self) -> String {
        let host = self
            .base_url
            .strip_prefix("https://")
            .or_else(|| self.base_url.strip_prefix("http://"))
            .unwrap_or(&self.base_url);
        match host.find('/') {
            Some(slash) => host[..slash].to_string(),
            None => host.to_string(),
        }
    }

    /// Convert a raw status into a normalized SourcePost.
    fn convert(&self, status: Status) -> SourcePost {
        let hashtags: Vec<String> = status.tags.iter().map(|t| t.name.clone()).collect();
        let is_reply = status.in_reply_to_id.is_some();
        let content = transform::normalize(&status.content, &self.filter_hashtags, is_reply);

        SourcePost {
            content,
            visibility: status.visibility,
            created_at: status.created_at,
            edited_at: status.edited_at,
            reply_to_id: status.in_reply_to_id,
            hashtags,
            reblog_of: status.reblog.map(|r| r.id),
            // Mastodon edits statuses in place: an edited post keeps its id,
            // so the edit origin is the post itself.
            original_id: status.edited_at.map(|_| status.id.clone()),
            author: PostAuthor {
                username: status.account.username,
                instance: instance_from_acct(&status.account.acct, &self.server_host()),
                display_name: status.account.display_name,
            },
            id: status.id,
        }
    }
}

#[async_trait]
impl SourceClient for MastodonClient {
    async fn fetch_recent_posts(
        &self,
        since_id: Option<&str>,
        since_time: Option<DateTime<Utc>>,
    ) -> Result<Vec<SourcePost>> {
        let account = self.verify_credentials().await?;

        let mut params: Vec<(&str, &str)> = vec![("limit", "40")];
        if let Some(id) = since_id {
            params.push(("since_id", id));
        }

        let path = format!("/api/v1/accounts/{}/statuses", account.id);
        let statuses: Vec<Status> = self.api_get(&path, &params).await?;

        let posts = statuses
            .into_iter()
            .filter(|s| match since_time {
                Some(t) => s.created_at >= t,
                None => true,
            })
            .map(|s| self.convert(s))
            .collect();

        Ok(posts)
    }

    async fn fetch_post(&self, id: &str) -> Result<SourcePost> {
        let status: Status = self.api_get(&format!("/api/v1/statuses/{id}"), &[]).await?;
        Ok(self.convert(status))
    }

    async fn fetch_edited_posts(
        &self,
        known_ids: &[String],
        since: DateTime<Utc>,
    ) -> Result<HashMap<String, SourcePost>> {
        let mut edited = HashMap::new();

        for id in known_ids {
            let post = match self.fetch_post(id).await {
                Ok(post) => post,
                Err(e) => {
                    warn!(post_id = %id, error = %e, "Failed to re-fetch post for edit check");
                    continue;
                }
            };

            if post.edited_at.is_some_and(|t| t > since) {
                edited.insert(id.clone(), post);
            }
        }

        Ok(edited)
    }
}

/// Extract the instance hostname from an `acct` field.
///
/// Remote accounts carry it as `user@instance`; local accounts carry a bare
/// username, in which case the configured server's host applies.
fn instance_from_acct(acct: &str, default_host: &str) -> String {
    match acct.split_once('@') {
        Some((_, instance)) if !instance.is_empty() => instance.to_string(),
        _ => default_host.to_string(),
    }
}

// -- Serde types for the Mastodon REST API --

#[derive(Debug, Deserialize)]
struct Account {
    id: String,
    acct: String,
    #[serde(default)]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Status {
    id: String,
    content: String,
    visibility: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    edited_at: Option<DateTime<Utc>>,
    #[serde(default)]
    in_reply_to_id: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
    #[serde(default)]
    reblog: Option<Box<Status>>,
    account: StatusAccount,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StatusAccount {
    username: String,
    acct: String,
    #[serde(default)]
    display_name: String,
}
