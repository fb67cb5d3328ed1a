//! Feed retrieval and parsing.
//!
//! - [`fetcher`] - single-shot HTTP retrieval with a size-capped body read
//! - [`parser`] - RSS/Atom parsing via `feed-rs` into [`FeedItem`]
//!
//! The fetcher runs once per invocation and does not retry; a fetch failure
//! aborts the whole poll.

mod fetcher;
mod parser;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_feed, FeedItem};
