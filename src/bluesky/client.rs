// AT Protocol XRPC client — authenticated HTTP against a PDS.
//
// Session state is an explicit value with an expiry, checked before every
// call: `ensure_session` reuses a live session, refreshes an expired one,
// and falls back to a fresh login when the refresh token is rejected.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

/// Default PDS endpoint.
pub const DEFAULT_PDS_URL: &str = "https://bsky.social";

/// An authenticated session with its expiry.
///
/// The PDS issues tokens that last about two hours; `valid_until` is set
/// conservatively to one hour so a refresh always lands before rejection.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_jwt: String,
    pub refresh_jwt: String,
    pub did: String,
    pub valid_until: DateTime<Utc>,
}

/// Authenticated XRPC client for one Bluesky account.
pub struct BskyClient {
    http: reqwest::Client,
    pds_url: String,
    identifier: String,
    app_password: String,
    session: Mutex<Option<Session>>,
}

impl BskyClient {
    /// Create a client pointing at the given PDS.
    pub fn new(pds_url: &str, identifier: &str, app_password: &str) -> Result<Self> {
        if identifier.is_empty() {
            anyhow::bail!("Bluesky identifier is required");
        }
        if app_password.is_empty() {
            anyhow::bail!("Bluesky app password is required");
        }

        let http = reqwest::Client::builder()
            .user_agent("girder/0.1 (mastodon-to-bluesky bridge)")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            pds_url: pds_url.trim_end_matches('/').to_string(),
            identifier: identifier.to_string(),
            app_password: app_password.to_string(),
            session: Mutex::new(None),
        })
    }

    /// Return a live session, creating or refreshing one as needed.
    ///
    /// This is the precondition check that runs before every authenticated
    /// call. The lock also serializes concurrent session creation, though
    /// the bridge only ever has one logical worker.
    pub async fn ensure_session(&self) -> Result<Session> {
        let mut guard = self.session.lock().await;

        if let Some(session) = guard.as_ref() {
            if Utc::now() < session.valid_until {
                return Ok(session.clone());
            }
        }

        let refreshed = match guard.as_ref() {
            Some(expired) => match self.refresh_session(&expired.refresh_jwt).await {
                Ok(session) => Some(session),
                Err(e) => {
                    debug!(error = %e, "Session refresh failed, re-authenticating");
                    None
                }
            },
            None => None,
        };

        let session = match refreshed {
            Some(session) => session,
            None => self.create_session().await?,
        };

        *guard = Some(session.clone());
        Ok(session)
    }

    /// Log in with the identifier and app password.
    async fn create_session(&self) -> Result<Session> {
        let url = format!("{}/xrpc/com.atproto.server.createSession", self.pds_url);
        let body = CreateSessionRequest {
            identifier: &self.identifier,
            password: &self.app_password,
        };

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Session creation request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Bluesky authentication failed with {status}: {body}");
        }

        let resp: SessionResponse = response
            .json()
            .await
            .context("Failed to deserialize session response")?;

        debug!(did = %resp.did, "Created Bluesky session");
        Ok(resp.into_session())
    }

    /// Exchange the refresh token for a new session.
    async fn refresh_session(&self, refresh_jwt: &str) -> Result<Session> {
        let url = format!("{}/xrpc/com.atproto.server.refreshSession", self.pds_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(refresh_jwt)
            .send()
            .await
            .context("Session refresh request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Session refresh failed with {status}: {body}");
        }

        let resp: SessionResponse = response
            .json()
            .await
            .context("Failed to deserialize refreshed session")?;

        debug!(did = %resp.did, "Refreshed Bluesky session");
        Ok(resp.into_session())
    }

    /// Make an authenticated GET request to an XRPC endpoint.
    ///
    /// `nsid` is the XRPC method name (e.g. "app.bsky.feed.getAuthorFeed").
    pub async fn xrpc_get<T: DeserializeOwned>(
        &self,
        nsid: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let session = self.ensure_session().await?;
        let url = format!("{}/xrpc/{}", self.pds_url, nsid);

        debug!(nsid = nsid, "XRPC GET request");

        let response = self
            .http
            .get(&url)
            .query(params)
            .bearer_auth(&session.access_jwt)
            .send()
            .await
            .with_context(|| format!("XRPC request failed: {nsid}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("XRPC {nsid} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize {nsid} response"))
    }

    /// Make an authenticated POST request to an XRPC endpoint.
    pub async fn xrpc_post<B: Serialize, T: DeserializeOwned>(
        &self,
        nsid: &str,
        body: &B,
    ) -> Result<T> {
        let session = self.ensure_session().await?;
        let url = format!("{}/xrpc/{}", self.pds_url, nsid);

        debug!(nsid = nsid, "XRPC POST request");

        let response = self
            .http
            .post(&url)
            .json(body)
            .bearer_auth(&session.access_jwt)
            .send()
            .await
            .with_context(|| format!("XRPC request failed: {nsid}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("XRPC {nsid} returned {status}: {body}");
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to deserialize {nsid} response"))
    }

    /// Resolve a handle to its DID.
    ///
    /// The PDS answers 400 for unknown handles — resolver strategies probe
    /// speculative handles, so that's a miss rather than an error.
    pub async fn resolve_handle_opt(&self, handle: &str) -> Result<Option<String>> {
        let session = self.ensure_session().await?;
        let url = format!("{}/xrpc/com.atproto.identity.resolveHandle", self.pds_url);

        let response = self
            .http
            .get(&url)
            .query(&[("handle", handle)])
            .bearer_auth(&session.access_jwt)
            .send()
            .await
            .with_context(|| format!("Failed to resolve handle {handle}"))?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Handle resolution returned {status}: {body}");
        }

        let resp: ResolveHandleResponse = response
            .json()
            .await
            .context("Failed to deserialize handle resolution response")?;

        Ok(Some(resp.did))
    }
}

// -- Serde types for session management --

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionResponse {
    access_jwt: String,
    refresh_jwt: String,
    did: String,
}

impl SessionResponse {
    fn into_session(self) -> Session {
        Session {
            access_jwt: self.access_jwt,
            refresh_jwt: self.refresh_jwt,
            did: self.did,
            valid_until: Utc::now() + Duration::hours(1),
        }
    }
}

#[derive(Deserialize)]
struct ResolveHandleResponse {
    did: String,
}
