//! Orchestrator for one invocation: fetch → classify → publish.
//!
//! Stages run strictly in sequence; concurrency exists only inside the
//! classify and publish stages, each of which joins all of its per-item work
//! before the pipeline advances. A fetch failure aborts before classification
//! begins. Store failures are absorbed per-item inside classification
//! (fail-closed). Publish failures are aggregated and become the invocation's
//! terminal error, after every attempt has resolved; cache writes already
//! made are never undone.

use crate::bus::{publish_all, MessageBus, PublishError};
use crate::dedup::{classify_new, DedupStore};
use crate::feed::{fetch_feed, FetchError};
use crate::payload::FeedPayload;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Terminal error for one invocation.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to fetch feed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("invocation exceeded its deadline")]
    DeadlineExceeded,
}

/// What one successful invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationReport {
    /// Items the feed presented.
    pub fetched: usize,
    /// Items classified new and published.
    pub published: usize,
}

/// Tuning knobs for one pipeline instance.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Timeout for the feed GET.
    pub fetch_timeout: Duration,
    /// Cap on the feed document size.
    pub max_feed_bytes: usize,
    /// Bound on per-item fan-out in the classify and publish stages.
    pub max_in_flight: usize,
    /// How long a seen-record suppresses re-emission.
    pub retention: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            max_feed_bytes: 10 * 1024 * 1024,
            max_in_flight: 16,
            retention: Duration::from_secs(30 * 24 * 3600),
        }
    }
}

/// The dedup-and-publish pipeline. Clients are constructed once at process
/// start and injected; the pipeline itself holds no per-invocation state,
/// so one instance serves any number of sequential invocations.
pub struct Pipeline {
    client: reqwest::Client,
    store: Arc<dyn DedupStore>,
    bus: Arc<dyn MessageBus>,
    opts: PipelineOptions,
}

impl Pipeline {
    pub fn new(
        client: reqwest::Client,
        store: Arc<dyn DedupStore>,
        bus: Arc<dyn MessageBus>,
        opts: PipelineOptions,
    ) -> Self {
        Self {
            client,
            store,
            bus,
            opts,
        }
    }

    /// Run one invocation end to end.
    pub async fn run(&self, payload: &FeedPayload) -> Result<InvocationReport, PipelineError> {
        tracing::info!(
            feed = %payload.feed,
            cache = %payload.cache_path,
            topic = %payload.topic_id,
            "Starting poll"
        );

        let items = fetch_feed(
            &self.client,
            &payload.feed,
            self.opts.fetch_timeout,
            self.opts.max_feed_bytes,
        )
        .await?;
        let fetched = items.len();
        tracing::info!(stage = "fetch", items = fetched, "Feed fetched");

        let new_items = classify_new(
            self.store.clone(),
            &payload.cache_path,
            items,
            self.opts.retention,
            self.opts.max_in_flight,
        )
        .await;
        let published = new_items.len();
        tracing::info!(
            stage = "classify",
            new = published,
            seen = fetched - published,
            "Items classified"
        );

        publish_all(
            self.bus.clone(),
            &payload.topic_id,
            &payload.cache_path,
            &payload.feed,
            &new_items,
            self.opts.max_in_flight,
        )
        .await?;
        tracing::info!(stage = "publish", published = published, "Poll complete");

        Ok(InvocationReport { fetched, published })
    }

    /// Run one invocation under an externally supplied deadline.
    ///
    /// On expiry the in-flight stages are dropped; cache writes that already
    /// completed stand.
    pub async fn run_with_deadline(
        &self,
        payload: &FeedPayload,
        deadline: Option<Duration>,
    ) -> Result<InvocationReport, PipelineError> {
        match deadline {
            Some(limit) => tokio::time::timeout(limit, self.run(payload))
                .await
                .map_err(|_| PipelineError::DeadlineExceeded)?,
            None => self.run(payload).await,
        }
    }
}
