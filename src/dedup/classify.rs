use crate::dedup::fingerprint::fingerprint;
use crate::dedup::store::DedupStore;
use crate::feed::FeedItem;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

/// Split fetched items into the newly-seen subset, recording each one in the
/// cache as a side effect.
///
/// Items are checked concurrently (bounded by `max_in_flight`) and the result
/// carries no ordering guarantee. The check-then-insert per item is not
/// atomic: a feed carrying the same identifier twice can classify both copies
/// as new within one invocation. The insert itself is first-seen-wins, so the
/// cache never holds more than one record per fingerprint.
///
/// Fail-closed policy: if the existence check errors, the item is treated as
/// already seen and skipped without an insert attempt. If the insert errors,
/// the item is also skipped — it was not durably recorded, so emitting it
/// would risk a duplicate on the next poll. Every skip is logged with the
/// item's guid.
///
/// Cache writes are not rolled back if the subsequent publish fails; an item
/// is remembered as seen even when its emission is lost.
pub async fn classify_new(
    store: Arc<dyn DedupStore>,
    namespace: &str,
    items: Vec<FeedItem>,
    retention: Duration,
    max_in_flight: usize,
) -> Vec<FeedItem> {
    let expires_at = chrono::Utc::now().timestamp() + retention.as_secs() as i64;

    stream::iter(items.into_iter())
        .map(|item| {
            let store = store.clone();
            async move {
                let fp = fingerprint(&item.guid);

                match store.exists(namespace, &fp).await {
                    Err(e) => {
                        tracing::warn!(
                            guid = %item.guid,
                            fingerprint = %fp,
                            error = %e,
                            "Dedup check failed, treating item as seen (fail-closed)"
                        );
                        return None;
                    }
                    Ok(true) => {
                        tracing::debug!(guid = %item.guid, "Item already in cache, skipping");
                        return None;
                    }
                    Ok(false) => {}
                }

                let payload = match serde_json::to_string(&item) {
                    Ok(p) => p,
                    Err(e) => {
                        tracing::warn!(guid = %item.guid, error = %e, "Failed to serialize item, skipping");
                        return None;
                    }
                };

                if let Err(e) = store.insert(namespace, &fp, &payload, expires_at).await {
                    tracing::warn!(
                        guid = %item.guid,
                        fingerprint = %fp,
                        error = %e,
                        "Cache write failed, skipping item (fail-closed)"
                    );
                    return None;
                }

                tracing::info!(guid = %item.guid, fingerprint = %fp, "New item recorded in cache");
                Some(item)
            }
        })
        .buffer_unordered(max_in_flight.max(1))
        .filter_map(|item| async move { item })
        .collect()
        .await
}
