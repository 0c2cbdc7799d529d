// Bluesky API client — session management, record creation, lookups.
//
// Built on reqwest against AT Protocol XRPC. `client` owns transport and
// session handling; `posts` implements the DestinationClient operations.

pub mod client;
pub mod posts;
pub mod traits;

pub use client::BskyClient;
pub use traits::{DestinationClient, FeedPost};
