// Length-constrained splitting — cut normalized text into destination-sized
// parts with ` (i/total)` position suffixes.
//
// The cut search operates on char positions, never byte offsets, so
// multi-byte text is never split inside a scalar value.

/// Bluesky's per-post character limit.
pub const MAX_POST_LEN: usize = 300;

/// Split `text` into parts of at most `max_len` chars each.
///
/// Text at or under the limit comes back as a single unsuffixed part.
/// Longer text is cut at spaces where possible, each part suffixed with
/// ` (i/total)`. The suffix reserve is sized from an up-front part-count
/// estimate so appending the real suffix never pushes a part over the
/// limit; any part that somehow still exceeds it is truncated with an
/// ellipsis as a last resort.
///
/// Deterministic: the same input produces the same parts on every call.
pub fn split(text: &str, max_len: usize) -> Vec<String> {
    debug_assert!(max_len >= 20);

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_len {
        return vec![text.to_string()];
    }

    // Reserve space for the worst-case suffix at the estimated part count.
    let estimated_total = chars.len().div_ceil(max_len - 10);
    let reserve = suffix(estimated_total, estimated_total).chars().count();
    let effective = max_len - reserve;

    let mut raw_parts: Vec<String> = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let remaining = chars.len() - pos;
        if remaining <= effective {
            raw_parts.push(chars[pos..].iter().collect());
            break;
        }

        // Largest prefix that ends at a space.
        let mut cut = effective;
        while cut > 0 && chars[pos + cut] != ' ' {
            cut -= 1;
        }

        // No space in the back half of the window: scan forward from the
        // midpoint, falling back to a hard cut at the window boundary.
        if cut < effective / 2 {
            cut = effective / 2;
            while cut < effective && chars[pos + cut] != ' ' {
                cut += 1;
            }
            if chars[pos + cut] != ' ' {
                cut = effective;
            }
        }

        raw_parts.push(chars[pos..pos + cut].iter().collect());
        pos += cut;

        // The cut space separates parts; don't carry it into the next one.
        if pos < chars.len() && chars[pos] == ' ' {
            pos += 1;
        }
    }

    // Suffix with the actual final total, not the estimate.
    let total = raw_parts.len();
    let mut parts: Vec<String> = raw_parts
        .into_iter()
        .enumerate()
        .map(|(i, part)| format!("{}{}", part, suffix(i + 1, total)))
        .collect();

    // Last-resort safety net.
    for part in &mut parts {
        if part.chars().count() > max_len {
            let truncated: String = part.chars().take(max_len - 1).collect();
            *part = format!("{truncated}…");
        }
    }

    parts
}

fn suffix(i: usize, total: usize) -> String {
    format!(" ({i}/{total})")
}
