// Markup normalization — strip HTML, drop filter hashtags, clean up replies.
//
// Mastodon statuses arrive as HTML. The transformation here is deterministic:
// the same input always yields the same plain text, which is what the content
// fingerprint hashes and the splitter consumes.

use std::sync::LazyLock;

use regex_lite::Regex;
use scraper::Html;

static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>").unwrap());
static PARA_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</p>\s*<p[^>]*>").unwrap());
static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:@[\w.-]+(?:@[\w.-]+)?[\s,:;]*)+").unwrap());
static INLINE_WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// Normalize raw markup-bearing content into plain text.
///
/// Steps, in order: convert break markup to newlines, strip remaining tags
/// and decode entities, remove filter hashtags, strip leading reply
/// mentions (when `is_reply`), collapse whitespace.
pub fn normalize(raw: &str, filter_hashtags: &[String], is_reply: bool) -> String {
    let text = convert_breaks(raw);
    let text = strip_markup(&text);
    let text = remove_filter_hashtags(&text, filter_hashtags);
    let text = if is_reply {
        strip_leading_mentions(&text)
    } else {
        text
    };
    collapse_whitespace(&text)
}

/// Replace `<br>` variants with `\n` and paragraph boundaries with `\n\n`
/// before tag stripping discards them.
fn convert_breaks(input: &str) -> String {
    let text = BR_RE.replace_all(input, "\n");
    PARA_RE.replace_all(&text, "\n\n").into_owned()
}

/// Strip all remaining tags and decode HTML entities by parsing the input
/// as an HTML fragment and collecting its text nodes.
fn strip_markup(input: &str) -> String {
    let fragment = Html::parse_fragment(input);
    fragment.root_element().text().collect()
}

/// Remove every occurrence of each filter hashtag, case-insensitively.
///
/// Adjacent inline whitespace is consumed with the tag; a line that held
/// nothing but removed hashtags disappears entirely.
fn remove_filter_hashtags(text: &str, tags: &[String]) -> String {
    if tags.is_empty() {
        return text.to_string();
    }

    let patterns: Vec<Regex> = tags
        .iter()
        .filter_map(|tag| Regex::new(&format!(r"(?i)[ \t]*#{}\b", escape_tag(tag))).ok())
        .collect();

    let mut lines = Vec::new();
    for line in text.split('\n') {
        let mut cleaned = line.to_string();
        for re in &patterns {
            cleaned = re.replace_all(&cleaned, "").into_owned();
        }
        if cleaned.trim().is_empty() && !line.trim().is_empty() {
            continue;
        }
        lines.push(cleaned);
    }
    lines.join("\n")
}

/// Escape a hashtag for literal use inside a regex pattern.
fn escape_tag(tag: &str) -> String {
    let mut escaped = String::with_capacity(tag.len());
    for c in tag.chars() {
        if !c.is_alphanumeric() && c != '_' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Strip a leading run of `@mention` tokens from each line that begins with
/// one, then capitalize the first remaining character if it was lowercase.
fn strip_leading_mentions(text: &str) -> String {
    text.split('\n')
        .map(|line| {
            let stripped = MENTION_RE.replace(line, "");
            if stripped.len() != line.len() {
                capitalize_first(stripped.trim_start())
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_lowercase() => c.to_uppercase().chain(chars).collect(),
        _ => s.to_string(),
    }
}

/// Collapse inline whitespace runs, trim line edges, squeeze 3+ newlines
/// down to 2, and trim the whole text.
fn collapse_whitespace(text: &str) -> String {
    let text = INLINE_WS_RE.replace_all(text, " ");
    let trimmed: Vec<&str> = text.split('\n').map(|l| l.trim_matches([' ', '\t'])).collect();
    let joined = trimmed.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}
