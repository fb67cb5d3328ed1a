use crate::bus::{BusError, MessageBus};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

/// Message bus reached over HTTP: one POST per message to
/// `{base}/topics/{topic}:publish`, body carrying the base64 payload and its
/// attributes, response carrying the broker-assigned message id.
#[derive(Clone)]
pub struct HttpBus {
    client: reqwest::Client,
    base_url: Url,
}

#[derive(Deserialize)]
struct PublishResponse {
    #[serde(rename = "messageId")]
    message_id: Option<String>,
}

impl HttpBus {
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, url::ParseError> {
        let base_url = Url::parse(base_url)?;
        Ok(Self { client, base_url })
    }

    fn topic_url(&self, topic: &str) -> String {
        format!(
            "{}/topics/{}:publish",
            self.base_url.as_str().trim_end_matches('/'),
            topic
        )
    }
}

#[async_trait]
impl MessageBus for HttpBus {
    async fn publish(
        &self,
        topic: &str,
        payload: &[u8],
        attributes: &HashMap<String, String>,
    ) -> Result<String, BusError> {
        let body = serde_json::json!({
            "data": STANDARD.encode(payload),
            "attributes": attributes,
        });

        let response = self
            .client
            .post(self.topic_url(topic))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BusError::Status(status.as_u16()));
        }

        let parsed: PublishResponse = response
            .json()
            .await
            .map_err(|e| BusError::Response(e.to_string()))?;

        parsed
            .message_id
            .ok_or_else(|| BusError::Response("missing messageId in response".to_string()))
    }
}
