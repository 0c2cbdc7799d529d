// Content pipeline — turns raw Mastodon markup into Bluesky-ready text.
//
// `transform` normalizes markup to plain text; `split` cuts normalized
// text into parts that fit the destination's length limit. Both are pure
// functions with no network or state access.

pub mod split;
pub mod transform;
