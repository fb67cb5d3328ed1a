//! Message bus client and the publisher stage.
//!
//! [`MessageBus`] is the seam to the broker; [`HttpBus`] is the production
//! implementation. [`publish_all`] fans the newly-seen items out over the bus
//! and aggregates per-message failures into a single [`PublishError`].

mod http;

pub use http::HttpBus;

use crate::feed::FeedItem;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Per-message delivery failure from the broker.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("broker returned status {0}")]
    Status(u16),
    #[error("unusable broker response: {0}")]
    Response(String),
}

/// Aggregate publish failure for one invocation.
#[derive(Debug, Error)]
#[error("{failed} of {total} messages did not publish successfully")]
pub struct PublishError {
    pub failed: usize,
    pub total: usize,
}

/// Broker interface consumed by the publisher. Implementations must be safe
/// for concurrent use; one invocation issues many publishes in flight.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish one message, blocking until the broker acknowledges it.
    /// Returns the broker-assigned message id.
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        attributes: &HashMap<String, String>,
    ) -> Result<String, BusError>;
}

/// Publish every item as one message on `topic`, concurrently (bounded by
/// `max_in_flight`), and wait for all of them to reach a terminal state.
///
/// Message body is the serialized item; attributes are `origin` (the cache
/// namespace) and `feed` (the source URL). Individual failures are not
/// retried and never surface early: the error, if any, is reported once after
/// every attempt has resolved, carrying the failed/total counts. Retry is the
/// caller's business via re-invocation, which the dedup cache makes safe.
pub async fn publish_all(
    bus: Arc<dyn MessageBus>,
    topic: &str,
    origin: &str,
    feed_url: &str,
    items: &[FeedItem],
    max_in_flight: usize,
) -> Result<(), PublishError> {
    if items.is_empty() {
        return Ok(());
    }

    let attributes = HashMap::from([
        ("origin".to_string(), origin.to_string()),
        ("feed".to_string(), feed_url.to_string()),
    ]);
    let total = items.len();
    let failures = Arc::new(AtomicUsize::new(0));

    // collect() is the join barrier: no publish outlives the invocation
    stream::iter(items.iter())
        .map(|item| {
            let bus = bus.clone();
            let attributes = &attributes;
            let failures = failures.clone();
            async move {
                let payload = match serde_json::to_vec(item) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(guid = %item.guid, error = %e, "Failed to serialize item for publish");
                        failures.fetch_add(1, Ordering::Relaxed);
                        return;
                    }
                };

                match bus.publish(topic, &payload, attributes).await {
                    Ok(message_id) => {
                        tracing::info!(guid = %item.guid, message_id = %message_id, "Published item");
                    }
                    Err(e) => {
                        // The item is already recorded as seen; a failure here
                        // loses it unless an operator replays it
                        tracing::warn!(guid = %item.guid, error = %e, "Failed to publish item");
                        failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        })
        .buffer_unordered(max_in_flight.max(1))
        .collect::<()>()
        .await;

    let failed = failures.load(Ordering::Relaxed);
    if failed > 0 {
        return Err(PublishError { failed, total });
    }
    Ok(())
}
