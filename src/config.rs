use std::env;
use std::time::Duration;

use anyhow::Result;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    /// Mastodon instance URL (scheme optional, https assumed).
    pub mastodon_server: String,
    pub mastodon_access_token: String,
    /// Bluesky handle or email used to create sessions.
    pub bluesky_identifier: String,
    /// App password — girder writes posts, so this is required for `run`.
    pub bluesky_app_password: String,
    /// PDS endpoint (defaults to https://bsky.social).
    pub bluesky_pds_url: String,
    pub db_path: String,
    /// Seconds between new-post polls. Edit checks run at twice this interval.
    pub poll_interval_secs: u64,
    /// Milliseconds between successive parts of a multi-part thread.
    pub part_delay_ms: u64,
    /// Hashtags that gate mirroring and are removed from mirrored text.
    /// Empty means mirror every public post.
    pub filter_hashtags: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only the paths and intervals have defaults — the account credentials
    /// are required for anything beyond `init` and `status`.
    pub fn load() -> Result<Self> {
        let poll_interval_secs = env::var("GIRDER_POLL_INTERVAL")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&v| v > 0)
            .unwrap_or(60);

        let part_delay_ms = env::var("GIRDER_PART_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(500);

        // Comma-separated, leading '#' optional: "updates, #public" → [updates, public]
        let filter_hashtags = env::var("GIRDER_FILTER_HASHTAGS")
            .unwrap_or_default()
            .split(',')
            .map(|t| t.trim().trim_start_matches('#').to_string())
            .filter(|t| !t.is_empty())
            .collect();

        Ok(Self {
            mastodon_server: env::var("MASTODON_SERVER").unwrap_or_default(),
            mastodon_access_token: env::var("MASTODON_ACCESS_TOKEN").unwrap_or_default(),
            bluesky_identifier: env::var("BLUESKY_IDENTIFIER").unwrap_or_default(),
            bluesky_app_password: env::var("BLUESKY_APP_PASSWORD").unwrap_or_default(),
            bluesky_pds_url: env::var("BLUESKY_PDS_URL")
                .unwrap_or_else(|_| crate::bluesky::client::DEFAULT_PDS_URL.to_string()),
            db_path: env::var("GIRDER_DB_PATH").unwrap_or_else(|_| "./girder.db".to_string()),
            poll_interval_secs,
            part_delay_ms,
            filter_hashtags,
        })
    }

    /// Check that the Mastodon side is configured.
    /// Call this before any operation that reads the source account.
    pub fn require_mastodon(&self) -> Result<()> {
        if self.mastodon_server.is_empty() {
            anyhow::bail!(
                "MASTODON_SERVER not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        if self.mastodon_access_token.is_empty() {
            anyhow::bail!(
                "MASTODON_ACCESS_TOKEN not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Check that Bluesky credentials are configured.
    /// Call this before any operation that writes to the destination.
    pub fn require_bluesky(&self) -> Result<()> {
        if self.bluesky_identifier.is_empty() {
            anyhow::bail!(
                "BLUESKY_IDENTIFIER not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        if self.bluesky_app_password.is_empty() {
            anyhow::bail!(
                "BLUESKY_APP_PASSWORD not set. Create an app password at\n\
                 Settings → App Passwords and add it to your .env file."
            );
        }
        Ok(())
    }

    /// Interval between new-post polls.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Interval between edit checks — half the frequency of new-post polls.
    pub fn edit_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs * 2)
    }

    /// Pause between successive parts of a multi-part thread.
    pub fn part_delay(&self) -> Duration {
        Duration::from_millis(self.part_delay_ms)
    }
}
