// Unit tests for parent-resolution heuristics.
//
// The pure helpers (handle derivation, search prefix, candidate matching)
// are tested directly; chain ordering and early exit are tested against a
// scripted mock destination.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Mutex;

use girder::bluesky::traits::{DestinationClient, FeedPost};
use girder::db::models::PostRef;
use girder::resolver::strategies::{
    alternate_bridge_handles, canonical_bridge_handle, is_candidate_match, search_prefix,
    CONTENT_PREFIX_MAX,
};
use girder::resolver::{ParentResolver, ResolveContext};

fn feed_post(uri: &str, text: &str) -> FeedPost {
    FeedPost {
        uri: uri.to_string(),
        cid: format!("cid-{}", uri.rsplit('/').next().unwrap_or("x")),
        text: text.to_string(),
        external_url: None,
        author_display_name: None,
        created_at: None,
    }
}

// ============================================================
// Handle derivation
// ============================================================

#[test]
fn canonical_handle_format() {
    assert_eq!(
        canonical_bridge_handle("alice", "example.social"),
        "alice.example.social.ap.brid.gy"
    );
}

#[test]
fn alternate_handle_formats() {
    let handles = alternate_bridge_handles("alice", "example.social");
    assert_eq!(
        handles,
        vec![
            "alice.example.social.ap.bridgy.fed".to_string(),
            "alice_example.social.ap.brid.gy".to_string(),
            "alice-example.social.ap.brid.gy".to_string(),
        ]
    );
}

// ============================================================
// Search prefix
// ============================================================

#[test]
fn short_content_is_its_own_prefix() {
    assert_eq!(search_prefix("short post", CONTENT_PREFIX_MAX), "short post");
}

#[test]
fn prefix_respects_word_boundaries() {
    let content = "the quick brown fox jumps over the lazy dog again and again";
    let prefix = search_prefix(content, CONTENT_PREFIX_MAX);
    assert!(prefix.chars().count() <= CONTENT_PREFIX_MAX);
    assert_eq!(prefix, "the quick brown fox jumps over");
    assert!(content.starts_with(&prefix));
}

#[test]
fn oversized_first_word_falls_back_to_char_prefix() {
    let content = "a".repeat(50);
    let prefix = search_prefix(&content, CONTENT_PREFIX_MAX);
    assert_eq!(prefix, "a".repeat(CONTENT_PREFIX_MAX));
}

#[test]
fn prefix_trims_surrounding_whitespace() {
    assert_eq!(search_prefix("  short post  ", CONTENT_PREFIX_MAX), "short post");
}

// ============================================================
// Candidate matching
// ============================================================

fn candidate(text: &str, display_name: Option<&str>, hours_offset: i64) -> FeedPost {
    let created = Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap() + Duration::hours(hours_offset);
    FeedPost {
        uri: "at://did:plc:x/app.bsky.feed.post/1".to_string(),
        cid: "cid1".to_string(),
        text: text.to_string(),
        external_url: None,
        author_display_name: display_name.map(|s| s.to_string()),
        created_at: Some(created),
    }
}

fn source_time() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 14, 12, 0, 0).unwrap()
}

#[test]
fn candidate_matches_on_all_three_criteria() {
    let c = candidate("hello world, longer text follows", Some("Alice"), 1);
    assert!(is_candidate_match(&c, "hello world", "Alice", source_time()));
}

#[test]
fn candidate_display_name_substring_matches_both_directions() {
    let c = candidate("hello world", Some("Alice"), 0);
    assert!(is_candidate_match(&c, "hello world", "Alice (she/her)", source_time()));

    let c = candidate("hello world", Some("Alice (she/her)"), 0);
    assert!(is_candidate_match(&c, "hello world", "Alice", source_time()));
}

#[test]
fn candidate_name_mismatch_rejects() {
    let c = candidate("hello world", Some("Mallory"), 0);
    assert!(!is_candidate_match(&c, "hello world", "Alice", source_time()));
}

#[test]
fn candidate_missing_display_name_rejects() {
    let c = candidate("hello world", None, 0);
    assert!(!is_candidate_match(&c, "hello world", "Alice", source_time()));
}

#[test]
fn candidate_text_mismatch_rejects() {
    let c = candidate("entirely different words", Some("Alice"), 0);
    assert!(!is_candidate_match(&c, "hello world", "Alice", source_time()));
}

#[test]
fn truncated_candidate_text_still_matches() {
    // Candidate shorter than the prefix, contained within it
    let c = candidate("hello", Some("Alice"), 0);
    assert!(is_candidate_match(&c, "hello world", "Alice", source_time()));
}

#[test]
fn candidate_outside_time_window_rejects() {
    let c = candidate("hello world", Some("Alice"), 25);
    assert!(!is_candidate_match(&c, "hello world", "Alice", source_time()));

    let c = candidate("hello world", Some("Alice"), -25);
    assert!(!is_candidate_match(&c, "hello world", "Alice", source_time()));
}

#[test]
fn candidate_inside_time_window_matches_either_side() {
    let c = candidate("hello world", Some("Alice"), 23);
    assert!(is_candidate_match(&c, "hello world", "Alice", source_time()));

    let c = candidate("hello world", Some("Alice"), -23);
    assert!(is_candidate_match(&c, "hello world", "Alice", source_time()));
}

// ============================================================
// Chain behavior against a scripted destination
// ============================================================

/// A destination whose lookups are scripted per test.
#[derive(Default)]
struct ScriptedDest {
    /// Handle → DID for handles that resolve.
    handles: Vec<(String, String)>,
    /// DID → posts in that account's feed.
    feeds: Vec<(String, Vec<FeedPost>)>,
    /// Posts returned for any search query.
    search_results: Vec<FeedPost>,
    /// Queries seen, for asserting call order.
    log: Mutex<Vec<String>>,
}

#[async_trait]
impl DestinationClient for ScriptedDest {
    async fn create_post(&self, _text: &str) -> Result<PostRef> {
        unreachable!("resolver never creates posts")
    }

    async fn create_reply(&self, _text: &str, _parent: &PostRef) -> Result<PostRef> {
        unreachable!("resolver never creates posts")
    }

    async fn delete_post(&self, _uri: &str) -> Result<()> {
        unreachable!("resolver never deletes posts")
    }

    async fn resolve_handle(&self, handle: &str) -> Result<Option<String>> {
        self.log.lock().unwrap().push(format!("resolve:{handle}"));
        Ok(self
            .handles
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, did)| did.clone()))
    }

    async fn fetch_author_feed(&self, actor: &str, _limit: u32) -> Result<Vec<FeedPost>> {
        self.log.lock().unwrap().push(format!("feed:{actor}"));
        Ok(self
            .feeds
            .iter()
            .find(|(did, _)| did == actor)
            .map(|(_, posts)| posts.clone())
            .unwrap_or_default())
    }

    async fn search_posts(&self, query: &str, _limit: u32) -> Result<Vec<FeedPost>> {
        self.log.lock().unwrap().push(format!("search:{query}"));
        Ok(self.search_results.clone())
    }
}

fn ctx<'a>() -> ResolveContext<'a> {
    ResolveContext {
        post_id: "114000",
        username: "alice",
        instance: "example.social",
        content: "hello world from the fediverse",
        display_name: "Alice",
        created_at: source_time(),
    }
}

#[tokio::test]
async fn canonical_handle_match_short_circuits() {
    let mut linked = feed_post("at://did:plc:bridge/app.bsky.feed.post/aaa", "hello world");
    linked.external_url = Some("https://example.social/@alice/114000".to_string());

    let dest = ScriptedDest {
        handles: vec![(
            "alice.example.social.ap.brid.gy".to_string(),
            "did:plc:bridge".to_string(),
        )],
        feeds: vec![("did:plc:bridge".to_string(), vec![linked.clone()])],
        ..Default::default()
    };

    let resolver = ParentResolver::new();
    let found = resolver.resolve(&dest, &ctx()).await.expect("should resolve");
    assert_eq!(found, linked.post_ref());

    // First strategy hit — no search calls were made.
    let log = dest.log.lock().unwrap();
    assert!(log.iter().all(|entry| !entry.starts_with("search:")));
}

#[tokio::test]
async fn exhausted_chain_returns_none() {
    let dest = ScriptedDest::default();
    let resolver = ParentResolver::new();
    assert!(resolver.resolve(&dest, &ctx()).await.is_none());

    // Every handle variant and both searches were attempted.
    let log = dest.log.lock().unwrap();
    assert_eq!(
        log.iter().filter(|e| e.starts_with("resolve:")).count(),
        4,
        "expected all four handle probes: {log:?}"
    );
    assert_eq!(
        log.iter().filter(|e| e.starts_with("search:")).count(),
        2,
        "expected post-id and content searches: {log:?}"
    );
}

#[tokio::test]
async fn post_id_search_finds_linking_post() {
    let mut linking = feed_post("at://did:plc:other/app.bsky.feed.post/bbb", "via bridge");
    linking.text = "mirrored from example.social/114000".to_string();

    let dest = ScriptedDest {
        search_results: vec![linking.clone()],
        ..Default::default()
    };

    let resolver = ParentResolver::new();
    let found = resolver.resolve(&dest, &ctx()).await.expect("should resolve");
    assert_eq!(found, linking.post_ref());
}

#[tokio::test]
async fn content_match_requires_identity_confirmation() {
    // The search returns a candidate with matching text but the wrong
    // author; the chain must exhaust instead of accepting it.
    let mut impostor = feed_post("at://did:plc:x/app.bsky.feed.post/ccc", "hello world from the fediverse");
    impostor.author_display_name = Some("Mallory".to_string());
    impostor.created_at = Some(source_time());

    let dest = ScriptedDest {
        search_results: vec![impostor],
        ..Default::default()
    };

    let resolver = ParentResolver::new();
    assert!(resolver.resolve(&dest, &ctx()).await.is_none());
}
