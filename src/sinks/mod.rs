//! Outbound delivery channels.
//!
//! A *sink* is an external system that stores or forwards a message; a
//! *channel* is one network path to it, with its own timeout and
//! failure mode. Channels are independently-failing and best-effort —
//! the reconciler decides what a failure means for the request.

pub mod apps_script;
pub mod brevo;
pub mod make;

pub use apps_script::AppsScriptSink;
pub use brevo::BrevoDirect;
pub use make::MakeWebhook;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SinkError;

/// Which delivery path a channel represents. The string forms are the
/// per-channel keys reported back to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    BrevoDirect,
    MakeWebhook,
    AppsScript,
}

impl ChannelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrevoDirect => "brevo_direct",
            Self::MakeWebhook => "make_com",
            Self::AppsScript => "google_apps_script",
        }
    }
}

/// A reply on its way out, already validated and sanitized.
#[derive(Debug, Clone, Default)]
pub struct OutboundReply {
    pub message_id: String,
    pub original_message_id: Option<String>,
    /// Sanitized reply text (see [`crate::sanitize::sanitize_text`]).
    pub response_text: String,
    /// Operator address the reply is signed by.
    pub sent_by: String,
    pub visitor_id: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub channel: Option<String>,
    pub user_modifications: bool,
    pub original_ai_response: Option<String>,
    pub brevo_contact_id: Option<String>,
}

impl OutboundReply {
    /// Whether the reply carries a visitor id the direct channel can use.
    pub fn has_valid_visitor_id(&self) -> bool {
        self.visitor_id
            .as_deref()
            .is_some_and(crate::sanitize::is_valid_visitor_id)
    }
}

/// One configured path to an external sink.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    fn kind(&self) -> ChannelKind;

    /// Whether this channel applies to the reply at all. A `false`
    /// here records the channel as skipped, not failed.
    fn wants(&self, reply: &OutboundReply) -> bool;

    /// Whether this channel records rather than reaches the customer.
    /// A recorder still runs after another channel has delivered, to
    /// keep its store in sync; delivery channels are skipped once one
    /// of them accepted, so the customer never gets the reply twice.
    fn is_recorder(&self) -> bool {
        false
    }

    /// Attempt delivery. The sink's JSON response (or a lenient
    /// wrapper around a non-JSON body) comes back on success.
    async fn deliver(&self, reply: &OutboundReply) -> Result<Value, SinkError>;
}

/// Read a response body, tolerating sinks that answer with plain text.
///
/// Make.com scenarios often answer `Accepted` rather than JSON; a 2xx
/// with an unparseable body still counts as success.
pub(crate) async fn read_lenient(
    name: &'static str,
    response: reqwest::Response,
) -> Result<Value, SinkError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| SinkError::Request {
        name,
        reason: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(SinkError::Upstream {
            name,
            status: status.as_u16(),
            body: text,
        });
    }

    Ok(serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({ "raw": text })))
}

/// Map a reqwest error on `name` to the right `SinkError`.
pub(crate) fn request_error(
    name: &'static str,
    timeout: std::time::Duration,
    err: reqwest::Error,
) -> SinkError {
    if err.is_timeout() {
        SinkError::Timeout { name, timeout }
    } else {
        SinkError::Request {
            name,
            reason: err.to_string(),
        }
    }
}
