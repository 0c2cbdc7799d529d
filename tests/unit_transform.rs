// Unit tests for content normalization.
//
// The transformer is a pure function, so these cover the full matrix:
// break conversion, tag stripping, entity decoding, filter-hashtag
// removal, reply-mention stripping, and whitespace collapsing.

use girder::content::transform::normalize;

fn no_tags() -> Vec<String> {
    Vec::new()
}

fn tags(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

// ============================================================
// Markup stripping
// ============================================================

#[test]
fn plain_text_passes_through() {
    assert_eq!(normalize("just words", &no_tags(), false), "just words");
}

#[test]
fn br_tags_become_newlines() {
    assert_eq!(
        normalize("<p>line one<br>line two<br />line three</p>", &no_tags(), false),
        "line one\nline two\nline three"
    );
}

#[test]
fn paragraph_boundaries_become_blank_lines() {
    assert_eq!(
        normalize("<p>first</p><p>second</p>", &no_tags(), false),
        "first\n\nsecond"
    );
}

#[test]
fn inline_tags_are_stripped() {
    assert_eq!(
        normalize(
            "<p>see <a href=\"https://example.com\"><span>the link</span></a> here</p>",
            &no_tags(),
            false
        ),
        "see the link here"
    );
}

#[test]
fn entities_are_decoded() {
    assert_eq!(
        normalize("<p>ham &amp; eggs &lt;3 &#39;quoted&#39;</p>", &no_tags(), false),
        "ham & eggs <3 'quoted'"
    );
}

// ============================================================
// Filter hashtag removal
// ============================================================

#[test]
fn filter_hashtag_is_removed_mid_text() {
    // The canonical scenario: "Hello #test world" with filter `test`
    assert_eq!(
        normalize("<p>Hello #test world</p>", &tags(&["test"]), false),
        "Hello world"
    );
}

#[test]
fn filter_hashtag_removal_is_case_insensitive() {
    assert_eq!(
        normalize("Hello #Test world", &tags(&["test"]), false),
        "Hello world"
    );
}

#[test]
fn filter_hashtag_at_end_is_removed() {
    assert_eq!(
        normalize("Hello world #test", &tags(&["test"]), false),
        "Hello world"
    );
}

#[test]
fn hashtag_alone_on_a_line_removes_the_line() {
    assert_eq!(
        normalize("above\n#test\nbelow", &tags(&["test"]), false),
        "above\nbelow"
    );
}

#[test]
fn other_hashtags_are_kept() {
    assert_eq!(
        normalize("keep #other drop #test", &tags(&["test"]), false),
        "keep #other drop"
    );
}

#[test]
fn hashtag_prefix_of_longer_tag_is_kept() {
    // #testing must not be eaten by the filter tag `test`
    assert_eq!(
        normalize("still #testing things", &tags(&["test"]), false),
        "still #testing things"
    );
}

#[test]
fn multiple_filter_hashtags_are_all_removed() {
    assert_eq!(
        normalize("a #one b #two c", &tags(&["one", "two"]), false),
        "a b c"
    );
}

// ============================================================
// Reply mention stripping
// ============================================================

#[test]
fn leading_mention_is_stripped_from_replies() {
    assert_eq!(
        normalize("@alice hello there", &no_tags(), true),
        "Hello there"
    );
}

#[test]
fn leading_mention_with_domain_is_stripped() {
    assert_eq!(
        normalize("@alice@example.social hello there", &no_tags(), true),
        "Hello there"
    );
}

#[test]
fn multiple_leading_mentions_are_stripped() {
    assert_eq!(
        normalize("@alice @bob@example.social sounds good", &no_tags(), true),
        "Sounds good"
    );
}

#[test]
fn capitalization_only_applies_to_lowercase_letters() {
    assert_eq!(normalize("@alice 2nd attempt", &no_tags(), true), "2nd attempt");
}

#[test]
fn mentions_are_kept_when_not_a_reply() {
    assert_eq!(
        normalize("@alice hello there", &no_tags(), false),
        "@alice hello there"
    );
}

#[test]
fn mid_text_mentions_are_kept_in_replies() {
    assert_eq!(
        normalize("agreed with @bob on this", &no_tags(), true),
        "agreed with @bob on this"
    );
}

// ============================================================
// Whitespace collapsing
// ============================================================

#[test]
fn runs_of_blank_lines_collapse_to_one() {
    assert_eq!(normalize("a\n\n\n\n\nb", &no_tags(), false), "a\n\nb");
}

#[test]
fn surrounding_whitespace_is_trimmed() {
    assert_eq!(normalize("  padded  \n", &no_tags(), false), "padded");
}

#[test]
fn inline_space_runs_collapse() {
    assert_eq!(normalize("wide    gap", &no_tags(), false), "wide gap");
}

#[test]
fn empty_input_yields_empty_output() {
    assert_eq!(normalize("", &no_tags(), false), "");
}

// ============================================================
// Combined
// ============================================================

#[test]
fn full_mastodon_status_normalizes() {
    let raw = "<p>@friend@pals.example good point about <a href=\"#\">#rust</a></p>\
               <p>more below #mirror</p>";
    assert_eq!(
        normalize(raw, &tags(&["mirror"]), true),
        "Good point about #rust\n\nmore below"
    );
}
