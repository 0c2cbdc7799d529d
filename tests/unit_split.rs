// Unit tests for length-constrained splitting.
//
// Covers the splitter's contract: identity under the limit, every part
// within the limit after suffixing, lossless rejoining, deterministic
// output, and multi-byte safety.

use girder::content::split::{split, MAX_POST_LEN};

/// Build ASCII filler of exactly `len` chars with a space every 6th char.
fn spaced_text(len: usize) -> String {
    let mut text = "abcde ".repeat(len / 6 + 1);
    text.truncate(len);
    text
}

/// Strip the ` (i/total)` suffix the splitter appended to part `i`.
fn strip_part_suffix(part: &str, i: usize, total: usize) -> String {
    let suffix = format!(" ({}/{})", i + 1, total);
    part.strip_suffix(&suffix)
        .unwrap_or_else(|| panic!("part {} missing suffix {:?}: {:?}", i + 1, suffix, part))
        .to_string()
}

// ============================================================
// Identity under the limit
// ============================================================

#[test]
fn short_text_is_returned_unchanged() {
    let text = "A perfectly ordinary post.";
    assert_eq!(split(text, MAX_POST_LEN), vec![text.to_string()]);
}

#[test]
fn text_exactly_at_the_limit_is_one_part() {
    let text = spaced_text(300);
    let parts = split(&text, MAX_POST_LEN);
    assert_eq!(parts, vec![text]);
}

#[test]
fn empty_text_is_one_empty_part() {
    assert_eq!(split("", MAX_POST_LEN), vec![String::new()]);
}

#[test]
fn one_char_over_the_limit_splits() {
    let text = spaced_text(301);
    let parts = split(&text, MAX_POST_LEN);
    assert!(parts.len() >= 2);
}

// ============================================================
// The 650-char scenario
// ============================================================

#[test]
fn six_hundred_fifty_chars_yields_three_parts() {
    let text = spaced_text(650);
    let parts = split(&text, MAX_POST_LEN);

    assert_eq!(parts.len(), 3);
    assert!(parts[0].ends_with("(1/3)"));
    assert!(parts[1].ends_with("(2/3)"));
    assert!(parts[2].ends_with("(3/3)"));
    for part in &parts {
        assert!(part.chars().count() <= MAX_POST_LEN, "part too long: {part:?}");
    }
}

// ============================================================
// Every part within the limit
// ============================================================

#[test]
fn all_parts_fit_after_suffixing() {
    for len in [301, 450, 650, 900, 2000, 5000] {
        let text = spaced_text(len);
        let parts = split(&text, MAX_POST_LEN);
        assert!(!parts.is_empty());
        for part in &parts {
            assert!(
                part.chars().count() <= MAX_POST_LEN,
                "len {len}: part exceeds limit: {part:?}"
            );
        }
    }
}

#[test]
fn unbroken_text_is_hard_cut_within_the_limit() {
    let text = "x".repeat(700);
    let parts = split(&text, MAX_POST_LEN);

    assert_eq!(parts.len(), 3);
    for part in &parts {
        assert!(part.chars().count() <= MAX_POST_LEN);
    }

    // No spaces were consumed, so plain concatenation restores the input.
    let total = parts.len();
    let rejoined: String = parts
        .iter()
        .enumerate()
        .map(|(i, p)| strip_part_suffix(p, i, total))
        .collect();
    assert_eq!(rejoined, text);
}

// ============================================================
// Lossless rejoining
// ============================================================

#[test]
fn rejoining_parts_reconstructs_the_input() {
    for len in [450, 650, 1200] {
        let text = spaced_text(len);
        let parts = split(&text, MAX_POST_LEN);
        let total = parts.len();

        // Each cut consumed exactly one space; restore it when joining.
        let rejoined = parts
            .iter()
            .enumerate()
            .map(|(i, p)| strip_part_suffix(p, i, total))
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, text, "rejoin mismatch at len {len}");
    }
}

// ============================================================
// Determinism and multi-byte safety
// ============================================================

#[test]
fn split_is_deterministic() {
    let text = spaced_text(1000);
    assert_eq!(split(&text, MAX_POST_LEN), split(&text, MAX_POST_LEN));
}

#[test]
fn multibyte_text_never_panics_and_respects_char_limit() {
    let text = "é".repeat(400);
    let parts = split(&text, MAX_POST_LEN);

    assert_eq!(parts.len(), 2);
    for part in &parts {
        assert!(part.chars().count() <= MAX_POST_LEN);
    }

    let total = parts.len();
    let rejoined: String = parts
        .iter()
        .enumerate()
        .map(|(i, p)| strip_part_suffix(p, i, total))
        .collect();
    assert_eq!(rejoined, text);
}

#[test]
fn parts_break_at_spaces_when_available() {
    let text = spaced_text(650);
    let parts = split(&text, MAX_POST_LEN);
    let total = parts.len();

    for (i, part) in parts.iter().enumerate() {
        let body = strip_part_suffix(part, i, total);
        assert!(!body.starts_with(' '), "part starts with the cut space: {body:?}");
        assert!(!body.ends_with(' '), "part carries the cut space: {body:?}");
    }
}
