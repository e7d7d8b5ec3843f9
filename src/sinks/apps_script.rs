//! Google Apps Script spreadsheet endpoint.
//!
//! Last-resort reply channel and the sheet-update path. The script is
//! opaque: it expects the shared API key both as a header and inside
//! the payload, and sometimes answers with an HTML error page instead
//! of JSON, so responses are parsed leniently.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::ExposeSecret;
use serde_json::{Value, json};
use std::time::Duration;

use crate::config::AppsScriptConfig;
use crate::error::SinkError;
use crate::sinks::{ChannelKind, DeliveryChannel, OutboundReply, read_lenient, request_error};

/// Spreadsheet-backed script sink.
pub struct AppsScriptSink {
    config: AppsScriptConfig,
    client: reqwest::Client,
    timeout: Duration,
}

impl AppsScriptSink {
    pub fn new(config: AppsScriptConfig, timeout: Duration) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// POST an action payload to the script. The shared key is merged
    /// into the payload because the script checks both places.
    pub async fn post(&self, mut payload: Value) -> Result<Value, SinkError> {
        let name = ChannelKind::AppsScript.as_str();
        let url = self
            .config
            .url
            .as_ref()
            .ok_or(SinkError::NotConfigured { name })?;
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or(SinkError::NotConfigured { name })?;

        if let Some(obj) = payload.as_object_mut() {
            obj.insert("api_key".into(), json!(api_key.expose_secret()));
        }

        let response = self
            .client
            .post(url)
            .header("X-API-Key", api_key.expose_secret())
            .header("User-Agent", "Hormur-Support/2.0")
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| request_error(name, self.timeout, e))?;

        read_lenient(name, response).await
    }
}

#[async_trait]
impl DeliveryChannel for AppsScriptSink {
    fn kind(&self) -> ChannelKind {
        ChannelKind::AppsScript
    }

    fn wants(&self, _reply: &OutboundReply) -> bool {
        self.config.is_configured()
    }

    // The sheet tracks every outbound reply regardless of which
    // channel carried it.
    fn is_recorder(&self) -> bool {
        true
    }

    async fn deliver(&self, reply: &OutboundReply) -> Result<Value, SinkError> {
        self.post(json!({
            "action": "send_response",
            "message_id": reply.message_id,
            "response_text": reply.response_text,
            "sent_by": reply.sent_by,
            "timestamp": Utc::now().to_rfc3339(),
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn unconfigured_sink_declines_replies() {
        let sink = AppsScriptSink::new(AppsScriptConfig::default(), Duration::from_secs(30));
        assert!(!sink.wants(&OutboundReply::default()));
    }

    #[test]
    fn configured_sink_accepts_any_reply() {
        let config = AppsScriptConfig {
            url: Some("https://script.google.com/macros/s/x/exec".into()),
            api_key: Some(SecretString::from("hormur-key")),
        };
        let sink = AppsScriptSink::new(config, Duration::from_secs(30));
        assert!(sink.wants(&OutboundReply::default()));
    }

    #[tokio::test]
    async fn post_without_config_is_not_configured_error() {
        let sink = AppsScriptSink::new(AppsScriptConfig::default(), Duration::from_secs(30));
        let err = sink.post(json!({"action": "get"})).await.unwrap_err();
        assert!(matches!(err, SinkError::NotConfigured { .. }));
    }
}
