// Cross-post executor — create the parts of one thread, in order, with
// rollback on partial failure.
//
// Part 0 is a top-level post unless an external parent was resolved; every
// later part replies to the immediately preceding created part. A failed
// creation deletes whatever was already created (best-effort) and surfaces
// the original error, so no mapping is written and the next cycle can
// attempt the whole post again.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::bluesky::traits::DestinationClient;
use crate::db::models::PostRef;

pub struct CrossPoster<'a> {
    dest: &'a dyn DestinationClient,
    /// Pause between successive creations, respecting destination burst
    /// limits.
    part_delay: Duration,
}

impl<'a> CrossPoster<'a> {
    pub fn new(dest: &'a dyn DestinationClient, part_delay: Duration) -> Self {
        Self { dest, part_delay }
    }

    /// Create every part in order, chained as replies.
    ///
    /// Returns the ordered references of the created posts. On failure at
    /// part k, parts 0..k are deleted best-effort and the creation error is
    /// returned.
    pub async fn publish(
        &self,
        parts: &[String],
        parent: Option<&PostRef>,
    ) -> Result<Vec<PostRef>> {
        let mut created: Vec<PostRef> = Vec::with_capacity(parts.len());
        let mut previous: Option<PostRef> = parent.cloned();

        for (i, part) in parts.iter().enumerate() {
            if i > 0 && !self.part_delay.is_zero() {
                tokio::time::sleep(self.part_delay).await;
            }

            let result = match &previous {
                None => self.dest.create_post(part).await,
                Some(parent_ref) => self.dest.create_reply(part, parent_ref).await,
            };

            let post_ref = match result {
                Ok(post_ref) => post_ref,
                Err(e) => {
                    warn!(
                        part = i + 1,
                        total = parts.len(),
                        error = %e,
                        "Part creation failed, rolling back thread"
                    );
                    self.rollback(&created).await;
                    return Err(e)
                        .with_context(|| format!("Failed to create part {}/{}", i + 1, parts.len()));
                }
            };

            debug!(
                part = i + 1,
                total = parts.len(),
                uri = %post_ref.uri,
                "Created part"
            );

            created.push(post_ref.clone());
            previous = Some(post_ref);
        }

        Ok(created)
    }

    /// Delete already-created parts after a mid-thread failure. Deletion
    /// errors are logged and skipped — forward progress matters more than a
    /// clean rollback.
    async fn rollback(&self, created: &[PostRef]) {
        for post in created {
            if let Err(e) = self.dest.delete_post(&post.uri).await {
                warn!(uri = %post.uri, error = %e, "Rollback deletion failed");
            }
        }
    }
}
