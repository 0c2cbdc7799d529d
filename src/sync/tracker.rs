// Dedup/edit tracking — content fingerprints and the mirror/skip decision.
//
// A post is re-mirrored only when its normalized content actually changed.
// The platform's edit timestamp selects *candidates* for the edit sweep but
// never forces a re-post of identical content, and a post we have no local
// record of is always treated as new — we mirror what we see.

use sha2::{Digest, Sha256};

use crate::mastodon::traits::SourcePost;

/// What the reconciliation loop should do with an observed post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Never mirrored before: post fresh.
    New,
    /// Content identical to what's already mirrored: do nothing.
    Unchanged,
    /// Content changed: delete the old thread for `original_id`, re-mirror,
    /// and record the mapping under both ids when they differ.
    Edited { original_id: String },
}

/// SHA-256 of normalized content, hex-encoded.
pub fn fingerprint(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Classify a post against its stored fingerprint and edit lineage.
///
/// Pure: callers load the stored state, this decides. Calling it twice with
/// unchanged content yields `Unchanged` both times.
pub fn classify(
    post: &SourcePost,
    stored_fingerprint: Option<&str>,
    lineage_original: Option<&str>,
) -> Classification {
    let current = fingerprint(&post.content);

    match stored_fingerprint {
        Some(stored) if stored == current => Classification::Unchanged,
        Some(_) => Classification::Edited {
            original_id: original_id_for(post, lineage_original),
        },
        None => match lineage_original {
            // Known as an edit of an earlier post even though no
            // fingerprint survived — re-mirror against the original.
            Some(original) => Classification::Edited {
                original_id: original.to_string(),
            },
            None => Classification::New,
        },
    }
}

/// The id whose previous thread an edit replaces: the platform-supplied
/// original reference when present and distinct, else the lineage entry,
/// else the post's own id (in-place self-edit).
fn original_id_for(post: &SourcePost, lineage_original: Option<&str>) -> String {
    if let Some(original) = post.original_id.as_deref() {
        if original != post.id {
            return original.to_string();
        }
    }
    if let Some(original) = lineage_original {
        return original.to_string();
    }
    post.id.clone()
}
