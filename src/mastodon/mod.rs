// Mastodon API client — credential verification and status fetching.
//
// Built on reqwest against the Mastodon REST API. The client converts raw
// statuses into normalized SourcePost values on the way out.

pub mod client;
pub mod traits;

pub use client::MastodonClient;
pub use traits::{PostAuthor, SourceClient, SourcePost};
