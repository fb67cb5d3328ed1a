//! feedgate — poll a syndication feed, dedup entries against a persistent
//! seen-cache, and publish exactly the newly-seen entries to a message bus.
//!
//! One invocation runs the pipeline once: fetch → classify → publish. The
//! dedup cache guarantees an entry is emitted at most once across repeated
//! polls of the same feed, within a bounded retention window. The binary in
//! `main.rs` is a thin shim that decodes the invocation payload and drives
//! [`pipeline::Pipeline::run`].

pub mod bus;
pub mod config;
pub mod dedup;
pub mod feed;
pub mod payload;
pub mod pipeline;

pub use bus::{BusError, HttpBus, MessageBus, PublishError};
pub use config::Config;
pub use dedup::{DedupStore, SqliteStore, StoreError};
pub use feed::{FeedItem, FetchError};
pub use payload::FeedPayload;
pub use pipeline::{InvocationReport, Pipeline, PipelineError, PipelineOptions};
