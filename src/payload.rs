//! Decoded invocation payload.
//!
//! The outer transport envelope (how the invocation arrives) is not this
//! crate's concern; by the time the pipeline runs, the payload has been
//! decoded into this struct. Field names follow the wire format (camelCase).

use serde::Deserialize;

/// One poll request: which feed to read, where to publish, and which
/// cache namespace to dedup against.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPayload {
    /// Source feed URL.
    pub feed: String,
    /// Destination topic on the message bus.
    pub topic_id: String,
    /// Namespace in the dedup store (also published as the `origin` attribute).
    pub cache_path: String,
    /// Feed format hint. Passed through unused; the parser sniffs the format.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl FeedPayload {
    /// Decode a payload from its JSON wire form.
    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_payload() {
        let json = r#"{
            "feed": "https://example.com/rss.xml",
            "topicId": "new-items",
            "cachePath": "example-feed",
            "type": "rss"
        }"#;
        let payload = FeedPayload::decode(json.as_bytes()).unwrap();
        assert_eq!(payload.feed, "https://example.com/rss.xml");
        assert_eq!(payload.topic_id, "new-items");
        assert_eq!(payload.cache_path, "example-feed");
        assert_eq!(payload.kind.as_deref(), Some("rss"));
    }

    #[test]
    fn test_decode_without_type_hint() {
        let json = r#"{"feed": "https://a.example/f", "topicId": "t", "cachePath": "c"}"#;
        let payload = FeedPayload::decode(json.as_bytes()).unwrap();
        assert!(payload.kind.is_none());
    }

    #[test]
    fn test_decode_missing_field_is_error() {
        let json = r#"{"feed": "https://a.example/f"}"#;
        assert!(FeedPayload::decode(json.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(FeedPayload::decode(b"not json").is_err());
    }
}
