//! Make.com webhook sink.
//!
//! One struct covers every Make.com scenario — the routes construct it
//! with the webhook URL for their concern. As a [`DeliveryChannel`] it
//! is the middle-priority reply path; routes also call [`MakeWebhook::post`]
//! directly for their one-shot forwards (datastore updates, B2B
//! opportunities, urgent alerts, message retrieval).

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use std::time::Duration;

use crate::error::SinkError;
use crate::sinks::{ChannelKind, DeliveryChannel, OutboundReply, read_lenient, request_error};

/// A single Make.com webhook endpoint.
pub struct MakeWebhook {
    name: &'static str,
    url: String,
    source_tag: &'static str,
    client: reqwest::Client,
    timeout: Duration,
}

impl MakeWebhook {
    pub fn new(name: &'static str, url: String, source_tag: &'static str, timeout: Duration) -> Self {
        Self {
            name,
            url,
            source_tag,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// POST a payload to the webhook, lenient about the response body.
    pub async fn post(&self, payload: &Value) -> Result<Value, SinkError> {
        let response = self
            .client
            .post(&self.url)
            .header("User-Agent", "Hormur-Support-App/2.0")
            .header("X-Hormur-Source", self.source_tag)
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(self.name, self.timeout, e))?;

        read_lenient(self.name, response).await
    }
}

/// Wire shape the send-response Make.com scenario expects.
///
/// The `use_brevo_direct` flag tells the scenario whether the direct
/// channel was viable; when the reconciler reaches this channel the
/// direct path has already failed or been skipped, so the scenario
/// should take its standard route.
pub fn reply_payload(reply: &OutboundReply) -> Value {
    let has_visitor = reply.has_valid_visitor_id();
    json!({
        "message_id": reply.message_id,
        "original_message_id": reply.original_message_id,
        "response_text": reply.response_text,
        "sent_by": reply.sent_by,
        "sent_at": Utc::now().to_rfc3339(),

        "platform": "Hormur",
        "version": "2.0",

        "category": reply.category.as_deref().unwrap_or("general"),
        "priority": reply.priority.as_deref().unwrap_or("medium"),
        "channel": reply.channel.as_deref().unwrap_or("email"),

        "visitor_id": reply.visitor_id,
        "has_visitor_id": has_visitor,
        "use_brevo_direct": false,
        "routing_method": if has_visitor { "brevo_via_makecom" } else { "standard_makecom" },

        "user_modifications": reply.user_modifications,
        "original_ai_response": reply.original_ai_response,
        "brevo_contact_id": reply.brevo_contact_id,

        "workflow_timestamp": Utc::now().timestamp_millis(),
    })
}

#[async_trait]
impl DeliveryChannel for MakeWebhook {
    fn kind(&self) -> ChannelKind {
        ChannelKind::MakeWebhook
    }

    fn wants(&self, _reply: &OutboundReply) -> bool {
        true
    }

    async fn deliver(&self, reply: &OutboundReply) -> Result<Value, SinkError> {
        self.post(&reply_payload(reply)).await
    }
}
