//! Direct Brevo conversations API channel.
//!
//! Highest-priority path: posting straight to the conversation avoids
//! the Make.com round trip, but only works when the message carries a
//! live visitor id and an agent id can be resolved for the sender.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

use crate::config::BrevoConfig;
use crate::error::SinkError;
use crate::sinks::{ChannelKind, DeliveryChannel, OutboundReply, read_lenient, request_error};

const BREVO_API_URL: &str = "https://api.brevo.com/v3/conversations/messages";

/// Direct call to the Brevo conversations API.
pub struct BrevoDirect {
    config: BrevoConfig,
    client: reqwest::Client,
    timeout: Duration,
}

impl BrevoDirect {
    pub fn new(config: BrevoConfig, timeout: Duration) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl DeliveryChannel for BrevoDirect {
    fn kind(&self) -> ChannelKind {
        ChannelKind::BrevoDirect
    }

    fn wants(&self, reply: &OutboundReply) -> bool {
        if self.config.api_key.is_none() {
            return false;
        }
        if !reply.has_valid_visitor_id() {
            debug!(
                message_id = %reply.message_id,
                "No usable visitor id, skipping direct Brevo channel"
            );
            return false;
        }
        self.config.agent_for(&reply.sent_by).is_some()
    }

    async fn deliver(&self, reply: &OutboundReply) -> Result<Value, SinkError> {
        let name = self.kind().as_str();
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(SinkError::NotConfigured { name })?;
        let agent_id = self
            .config
            .agent_for(&reply.sent_by)
            .ok_or(SinkError::NotConfigured { name })?;

        let payload = json!({
            "visitorId": reply.visitor_id,
            "text": reply.response_text,
            "agentId": agent_id,
        });

        let response = self
            .client
            .post(BREVO_API_URL)
            .header("api-key", api_key.expose_secret())
            .header("User-Agent", "Hormur-Support/2.0")
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(name, self.timeout, e))?;

        read_lenient(name, response).await
    }
}
