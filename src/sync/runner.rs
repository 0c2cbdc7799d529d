// The reconciliation loop — two polling schedules driving one sequential
// worker.
//
// New-post polling and edit checking run on independent timers; whichever
// fires is handled to completion before the loop selects again, so a
// cancellation signal is only ever observed between ticks, never mid-post.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::bluesky::traits::DestinationClient;
use crate::content::split::{split, MAX_POST_LEN};
use crate::db::models::PostRef;
use crate::db::Database;
use crate::mastodon::traits::{SourceClient, SourcePost};
use crate::resolver::{ParentResolver, ResolveContext};

use super::executor::CrossPoster;
use super::tracker::{self, Classification};

/// Sync-state key holding the last-seen source post id.
pub const CURSOR_KEY: &str = "last_seen_id";
/// Sync-state key holding the last edit-check timestamp (RFC 3339).
pub const LAST_EDIT_CHECK_KEY: &str = "last_edit_check";

/// How many recently mirrored posts each edit sweep re-checks.
const EDIT_CHECK_WINDOW: u32 = 10;

/// Tunables the loop needs; everything else lives in the collaborators.
pub struct BridgeSettings {
    pub poll_interval: Duration,
    pub edit_interval: Duration,
    pub part_delay: Duration,
    /// When non-empty, only posts carrying one of these hashtags
    /// (case-insensitive) are mirrored.
    pub filter_hashtags: Vec<String>,
}

/// What `process_post` did with a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A thread was created (or re-created) on the destination.
    Mirrored,
    /// Deliberately not mirrored: reblog, non-public, filtered, unchanged,
    /// empty, or unresolvable parent.
    Skipped,
}

/// The single logical worker that reconciles source posts onto the
/// destination.
pub struct Bridge {
    source: Arc<dyn SourceClient>,
    dest: Arc<dyn DestinationClient>,
    db: Arc<dyn Database>,
    resolver: ParentResolver,
    settings: BridgeSettings,
    /// First-run backfill guard: with no cursor, only posts created after
    /// this instant are mirrored.
    started_at: DateTime<Utc>,
}

impl Bridge {
    pub fn new(
        source: Arc<dyn SourceClient>,
        dest: Arc<dyn DestinationClient>,
        db: Arc<dyn Database>,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            source,
            dest,
            db,
            resolver: ParentResolver::new(),
            settings,
            started_at: Utc::now(),
        }
    }

    /// Run until a shutdown signal arrives.
    ///
    /// Cancellation is cooperative: the signal is observed at the select
    /// point, so an in-flight batch finishes its current post but not the
    /// rest of the batch's tick.
    pub async fn run(&self) -> Result<()> {
        info!(
            poll_secs = self.settings.poll_interval.as_secs(),
            edit_secs = self.settings.edit_interval.as_secs(),
            "Starting bridge loop"
        );

        let mut post_tick = tokio::time::interval(self.settings.poll_interval);
        let mut edit_tick = tokio::time::interval(self.settings.edit_interval);
        post_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        edit_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping");
                    break;
                }
                _ = post_tick.tick() => {
                    if let Err(e) = self.run_new_post_cycle().await {
                        warn!(error = %e, "New-post cycle failed");
                    }
                }
                _ = edit_tick.tick() => {
                    if let Err(e) = self.run_edit_cycle().await {
                        warn!(error = %e, "Edit cycle failed");
                    }
                }
            }
        }

        Ok(())
    }

    /// One new-post pass and one edit pass (the `--once` mode).
    pub async fn run_once(&self) -> Result<()> {
        self.run_new_post_cycle().await?;
        self.run_edit_cycle().await
    }

    /// Fetch posts beyond the cursor and mirror them oldest-first.
    ///
    /// The watermark advances past every post that was mirrored or
    /// deliberately skipped. A transport/creation failure stops the batch
    /// *without* advancing past the failed post, so the next tick retries
    /// it; deliberate skips never come back.
    pub async fn run_new_post_cycle(&self) -> Result<()> {
        let cursor = self.db.get_sync_state(CURSOR_KEY).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read cursor, fetching without one");
            None
        });

        // Without a cursor this is a first run — don't backfill history.
        let since_time = if cursor.is_none() {
            Some(self.started_at)
        } else {
            None
        };

        let posts = self
            .source
            .fetch_recent_posts(cursor.as_deref(), since_time)
            .await?;

        if posts.is_empty() {
            return Ok(());
        }

        info!(count = posts.len(), "Found new posts");

        let mut watermark = cursor.clone();
        // The feed is newest-first; mirror in chronological order.
        for post in posts.iter().rev() {
            match self.process_post(post).await {
                Ok(outcome) => {
                    debug!(post_id = %post.id, outcome = ?outcome, "Processed post");
                    watermark = Some(post.id.clone());
                }
                Err(e) => {
                    warn!(
                        post_id = %post.id,
                        error = %e,
                        "Failed to process post, will retry next cycle"
                    );
                    break;
                }
            }
        }

        if watermark != cursor {
            if let Some(id) = &watermark {
                if let Err(e) = self.db.set_sync_state(CURSOR_KEY, id).await {
                    warn!(error = %e, "Failed to persist cursor");
                }
            }
        }

        Ok(())
    }

    /// Re-check the most recently mirrored posts for edits.
    pub async fn run_edit_cycle(&self) -> Result<()> {
        let ids = self.db.recent_mapped_ids(EDIT_CHECK_WINDOW).await?;
        if ids.is_empty() {
            return Ok(());
        }

        let since = match self.db.get_sync_state(LAST_EDIT_CHECK_KEY).await {
            Ok(Some(ts)) => DateTime::parse_from_rfc3339(&ts)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or(DateTime::UNIX_EPOCH),
            Ok(None) => DateTime::UNIX_EPOCH,
            Err(e) => {
                warn!(error = %e, "Failed to read edit-check timestamp");
                DateTime::UNIX_EPOCH
            }
        };

        debug!(candidates = ids.len(), "Checking recent posts for edits");

        let edited = self.source.fetch_edited_posts(&ids, since).await?;
        if !edited.is_empty() {
            info!(count = edited.len(), "Found edited posts");
        }

        let mut edited_ids: Vec<&String> = edited.keys().collect();
        edited_ids.sort();
        for id in edited_ids {
            if let Err(e) = self.process_post(&edited[id]).await {
                warn!(post_id = %id, error = %e, "Failed to process edited post");
            }
        }

        if let Err(e) = self
            .db
            .set_sync_state(LAST_EDIT_CHECK_KEY, &Utc::now().to_rfc3339())
            .await
        {
            warn!(error = %e, "Failed to persist edit-check timestamp");
        }

        Ok(())
    }

    /// Decide whether and how to mirror one post.
    ///
    /// `Err` means a transport/creation failure worth retrying; every
    /// deliberate non-action returns `Ok(Skipped)`.
    pub async fn process_post(&self, post: &SourcePost) -> Result<Outcome> {
        if let Some(reblogged) = &post.reblog_of {
            debug!(post_id = %post.id, reblog_of = %reblogged, "Skipping reblog");
            return Ok(Outcome::Skipped);
        }

        if !post.is_public() {
            debug!(
                post_id = %post.id,
                visibility = %post.visibility,
                "Skipping non-public post"
            );
            return Ok(Outcome::Skipped);
        }

        if !self.settings.filter_hashtags.is_empty() {
            let gated = post.hashtags.iter().any(|tag| {
                self.settings
                    .filter_hashtags
                    .iter()
                    .any(|f| f.eq_ignore_ascii_case(tag))
            });
            if !gated {
                debug!(post_id = %post.id, "Skipping post without a filter hashtag");
                return Ok(Outcome::Skipped);
            }
        }

        if post.content.is_empty() {
            debug!(post_id = %post.id, "Skipping post with no text content");
            return Ok(Outcome::Skipped);
        }

        // State reads are best-effort: on failure the post classifies as
        // new, and duplicates stay bounded by the fingerprint written after.
        let stored = self.db.get_fingerprint(&post.id).await.unwrap_or_else(|e| {
            warn!(post_id = %post.id, error = %e, "Failed to read fingerprint");
            None
        });
        let lineage = self
            .db
            .get_edit_original(&post.id)
            .await
            .unwrap_or_else(|e| {
                warn!(post_id = %post.id, error = %e, "Failed to read edit lineage");
                None
            });

        let classification = tracker::classify(post, stored.as_deref(), lineage.as_deref());

        let original_id = match &classification {
            Classification::Unchanged => {
                debug!(post_id = %post.id, "Content unchanged, skipping");
                return Ok(Outcome::Skipped);
            }
            Classification::New => None,
            Classification::Edited { original_id } => {
                info!(
                    post_id = %post.id,
                    original_id = %original_id,
                    "Content changed, re-mirroring"
                );
                self.delete_previous_thread(original_id).await;
                Some(original_id.clone())
            }
        };

        let parent = match &post.reply_to_id {
            Some(parent_id) => match self.resolve_parent(parent_id).await {
                Some(parent) => Some(parent),
                None => {
                    info!(
                        post_id = %post.id,
                        parent_id = %parent_id,
                        "Cannot find parent to reply to, skipping post"
                    );
                    return Ok(Outcome::Skipped);
                }
            },
            None => None,
        };

        let parts = split(&post.content, MAX_POST_LEN);
        let poster = CrossPoster::new(self.dest.as_ref(), self.settings.part_delay);
        let thread = poster.publish(&parts, parent.as_ref()).await?;

        info!(post_id = %post.id, parts = thread.len(), "Mirrored post");
        self.persist_mirror(post, original_id.as_deref(), &thread).await;

        Ok(Outcome::Mirrored)
    }

    /// Write the mapping and fingerprint — under both ids on an edit whose
    /// ids differ. Failures are logged, never fatal: the next cycle redoes
    /// at most one post's work.
    async fn persist_mirror(&self, post: &SourcePost, original_id: Option<&str>, thread: &[PostRef]) {
        let fingerprint = tracker::fingerprint(&post.content);

        if let Err(e) = self.db.save_post_mapping(&post.id, thread).await {
            warn!(post_id = %post.id, error = %e, "Failed to save post mapping");
        }
        if let Err(e) = self.db.save_fingerprint(&post.id, &fingerprint).await {
            warn!(post_id = %post.id, error = %e, "Failed to save fingerprint");
        }

        if let Some(original_id) = original_id {
            if original_id != post.id {
                if let Err(e) = self.db.save_post_mapping(original_id, thread).await {
                    warn!(post_id = %original_id, error = %e, "Failed to save original-id mapping");
                }
                if let Err(e) = self.db.save_fingerprint(original_id, &fingerprint).await {
                    warn!(post_id = %original_id, error = %e, "Failed to save original-id fingerprint");
                }
                if let Err(e) = self.db.mark_edit(&post.id, original_id).await {
                    warn!(post_id = %post.id, error = %e, "Failed to record edit lineage");
                }
            }
        }
    }

    /// Best-effort deletion of the thread previously mirrored for
    /// `original_id`. Delete failures are logged and skipped.
    async fn delete_previous_thread(&self, original_id: &str) {
        let thread = match self.db.get_post_mapping(original_id).await {
            Ok(Some(thread)) => thread,
            Ok(None) => return,
            Err(e) => {
                warn!(post_id = %original_id, error = %e, "Failed to load previous thread");
                return;
            }
        };

        info!(
            post_id = %original_id,
            parts = thread.len(),
            "Deleting previously mirrored parts"
        );

        for part in &thread {
            if let Err(e) = self.dest.delete_post(&part.uri).await {
                warn!(uri = %part.uri, error = %e, "Failed to delete outdated part");
            }
        }
    }

    /// Find the destination post a reply should attach to.
    ///
    /// The local mapping is authoritative — a hit there skips the heuristic
    /// chain entirely. A miss means the parent was authored by someone else
    /// (or never mirrored), so the parent's identity is fetched from the
    /// source and the chain runs.
    async fn resolve_parent(&self, parent_id: &str) -> Option<PostRef> {
        match self.db.get_post_mapping(parent_id).await {
            Ok(Some(thread)) => {
                if let Some(last) = thread.last() {
                    debug!(
                        parent_id = %parent_id,
                        uri = %last.uri,
                        "Parent found in local mapping"
                    );
                    return Some(last.clone());
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(parent_id = %parent_id, error = %e, "Failed to read parent mapping");
            }
        }

        let parent_post = match self.source.fetch_post(parent_id).await {
            Ok(post) => post,
            Err(e) => {
                warn!(parent_id = %parent_id, error = %e, "Failed to fetch parent post");
                return None;
            }
        };

        let ctx = ResolveContext::from_post(&parent_post);
        self.resolver.resolve(self.dest.as_ref(), &ctx).await
    }
}
