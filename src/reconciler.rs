//! Multi-channel delivery reconciliation.
//!
//! Attempts a reply through an ordered set of channels (direct Brevo
//! call, Make.com webhook, Apps Script endpoint) and aggregates their
//! outcomes. A channel failure is logged and recorded, never fatal:
//! the next channel is attempted regardless. The overall delivery
//! succeeds if *any* channel accepted the payload.
//!
//! The first acceptance stops further *delivery* channels — the
//! customer must never receive the same reply twice — but recorder
//! channels (the spreadsheet) still run to stay in sync.
//!
//! The result is a discriminated union; only the transport layer maps
//! it onto status codes, so the fail-soft routes and the standard-HTTP
//! routes can share this code.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::SinkError;
use crate::sinks::{ChannelKind, DeliveryChannel, OutboundReply};

/// What happened on one channel.
#[derive(Debug)]
pub struct ChannelOutcome {
    pub kind: ChannelKind,
    /// False when `wants()` declined (channel skipped, not failed).
    pub attempted: bool,
    pub ok: bool,
    /// Sink response on success, error rendering on failure.
    pub detail: Value,
}

/// Aggregated delivery outcome.
#[derive(Debug)]
pub enum DeliveryResult {
    /// At least one channel accepted the payload.
    Delivered { outcomes: Vec<ChannelOutcome> },
    /// Every applicable channel failed (or none applied).
    Failed { outcomes: Vec<ChannelOutcome> },
    /// Input validation failed; no channel was attempted.
    Rejected { missing: Vec<String> },
}

impl DeliveryResult {
    pub fn delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }

    pub fn outcomes(&self) -> &[ChannelOutcome] {
        match self {
            Self::Delivered { outcomes } | Self::Failed { outcomes } => outcomes,
            Self::Rejected { .. } => &[],
        }
    }

    /// Per-channel success flags for the response body, keyed the way
    /// the dashboard expects (`make_com`, `google_apps_script`, plus
    /// `brevo_direct`).
    pub fn channel_flags(&self) -> Value {
        let flag = |kind: ChannelKind| {
            self.outcomes()
                .iter()
                .any(|o| o.kind == kind && o.ok)
        };
        json!({
            "brevo_direct": flag(ChannelKind::BrevoDirect),
            "make_com": flag(ChannelKind::MakeWebhook),
            "google_apps_script": flag(ChannelKind::AppsScript),
        })
    }

    /// Detailed per-channel report for the response body.
    pub fn channel_report(&self) -> Value {
        let report: Vec<Value> = self
            .outcomes()
            .iter()
            .map(|o| {
                json!({
                    "channel": o.kind.as_str(),
                    "attempted": o.attempted,
                    "ok": o.ok,
                    "detail": o.detail,
                })
            })
            .collect();
        json!(report)
    }
}

/// Tries each configured channel in priority order.
pub struct Reconciler {
    channels: Vec<Arc<dyn DeliveryChannel>>,
}

impl Reconciler {
    /// Channels in the order given — callers list them by priority.
    pub fn new(channels: Vec<Arc<dyn DeliveryChannel>>) -> Self {
        Self { channels }
    }

    /// Attempt delivery through every applicable channel.
    pub async fn deliver(&self, reply: &OutboundReply) -> DeliveryResult {
        let mut outcomes = Vec::with_capacity(self.channels.len());
        let mut any_ok = false;

        for channel in &self.channels {
            let kind = channel.kind();

            if any_ok && !channel.is_recorder() {
                info!(
                    message_id = %reply.message_id,
                    channel = kind.as_str(),
                    "Reply already delivered, skipping channel"
                );
                outcomes.push(ChannelOutcome {
                    kind,
                    attempted: false,
                    ok: false,
                    detail: json!({"skipped": true, "already_delivered": true}),
                });
                continue;
            }

            if !channel.wants(reply) {
                info!(
                    message_id = %reply.message_id,
                    channel = kind.as_str(),
                    "Channel skipped"
                );
                outcomes.push(ChannelOutcome {
                    kind,
                    attempted: false,
                    ok: false,
                    detail: json!({"skipped": true}),
                });
                continue;
            }

            match channel.deliver(reply).await {
                Ok(detail) => {
                    info!(
                        message_id = %reply.message_id,
                        channel = kind.as_str(),
                        "Channel accepted reply"
                    );
                    any_ok = true;
                    outcomes.push(ChannelOutcome {
                        kind,
                        attempted: true,
                        ok: true,
                        detail,
                    });
                }
                Err(err) => {
                    warn!(
                        message_id = %reply.message_id,
                        channel = kind.as_str(),
                        error = %err,
                        "Channel failed, trying next"
                    );
                    outcomes.push(ChannelOutcome {
                        kind,
                        attempted: true,
                        ok: false,
                        detail: error_detail(&err),
                    });
                }
            }
        }

        if any_ok {
            DeliveryResult::Delivered { outcomes }
        } else {
            DeliveryResult::Failed { outcomes }
        }
    }
}

fn error_detail(err: &SinkError) -> Value {
    match err {
        SinkError::Upstream { status, body, .. } => {
            json!({"error": err.to_string(), "status": status, "body": body})
        }
        _ => json!({"error": err.to_string()}),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Scripted channel for reconciler tests.
    struct StubChannel {
        kind: ChannelKind,
        wants: bool,
        recorder: bool,
        result: Result<Value, fn() -> SinkError>,
        calls: AtomicUsize,
    }

    impl StubChannel {
        fn ok(kind: ChannelKind) -> Self {
            Self {
                kind,
                wants: true,
                recorder: false,
                result: Ok(json!({"accepted": true})),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(kind: ChannelKind, err: fn() -> SinkError) -> Self {
            Self {
                kind,
                wants: true,
                recorder: false,
                result: Err(err),
                calls: AtomicUsize::new(0),
            }
        }

        fn declining(kind: ChannelKind) -> Self {
            Self {
                kind,
                wants: false,
                recorder: false,
                result: Ok(json!({})),
                calls: AtomicUsize::new(0),
            }
        }

        fn recording(mut self) -> Self {
            self.recorder = true;
            self
        }
    }

    #[async_trait]
    impl DeliveryChannel for StubChannel {
        fn kind(&self) -> ChannelKind {
            self.kind
        }
        fn wants(&self, _reply: &OutboundReply) -> bool {
            self.wants
        }
        fn is_recorder(&self) -> bool {
            self.recorder
        }
        async fn deliver(&self, _reply: &OutboundReply) -> Result<Value, SinkError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.result {
                Ok(v) => Ok(v.clone()),
                Err(make) => Err(make()),
            }
        }
    }

    fn reply() -> OutboundReply {
        OutboundReply {
            message_id: "m1".into(),
            response_text: "Bonjour".into(),
            sent_by: "eleonore@hormur.com".into(),
            ..Default::default()
        }
    }

    fn upstream_502() -> SinkError {
        SinkError::Upstream {
            name: "make_com",
            status: 500,
            body: "scenario error".into(),
        }
    }

    fn timed_out() -> SinkError {
        SinkError::Timeout {
            name: "brevo_direct",
            timeout: Duration::from_secs(15),
        }
    }

    #[tokio::test]
    async fn one_success_is_enough() {
        let reconciler = Reconciler::new(vec![
            Arc::new(StubChannel::failing(ChannelKind::BrevoDirect, timed_out)),
            Arc::new(StubChannel::ok(ChannelKind::MakeWebhook)),
            Arc::new(StubChannel::failing(ChannelKind::AppsScript, upstream_502).recording()),
        ]);
        let result = reconciler.deliver(&reply()).await;
        assert!(result.delivered());
        let flags = result.channel_flags();
        assert_eq!(flags["brevo_direct"], false);
        assert_eq!(flags["make_com"], true);
        assert_eq!(flags["google_apps_script"], false);
    }

    #[tokio::test]
    async fn failure_does_not_abort_later_channels() {
        let failing = Arc::new(StubChannel::failing(ChannelKind::BrevoDirect, timed_out));
        let make = Arc::new(StubChannel::ok(ChannelKind::MakeWebhook));
        let gas = Arc::new(StubChannel::ok(ChannelKind::AppsScript).recording());
        let reconciler = Reconciler::new(vec![failing.clone(), make.clone(), gas.clone()]);

        reconciler.deliver(&reply()).await;
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert_eq!(make.calls.load(Ordering::SeqCst), 1);
        assert_eq!(gas.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn first_acceptance_stops_further_delivery_channels() {
        // Two delivery channels both willing to accept: the second
        // must never fire, or the customer gets the reply twice.
        let brevo = Arc::new(StubChannel::ok(ChannelKind::BrevoDirect));
        let make = Arc::new(StubChannel::ok(ChannelKind::MakeWebhook));
        let reconciler = Reconciler::new(vec![brevo.clone(), make.clone()]);

        let result = reconciler.deliver(&reply()).await;
        assert!(result.delivered());
        assert_eq!(brevo.calls.load(Ordering::SeqCst), 1);
        assert_eq!(make.calls.load(Ordering::SeqCst), 0);

        let flags = result.channel_flags();
        assert_eq!(flags["brevo_direct"], true);
        assert_eq!(flags["make_com"], false);
        let make_outcome = &result.outcomes()[1];
        assert!(!make_outcome.attempted);
        assert_eq!(make_outcome.detail["already_delivered"], true);
    }

    #[tokio::test]
    async fn recorder_still_runs_after_delivery() {
        let make = Arc::new(StubChannel::ok(ChannelKind::MakeWebhook));
        let gas = Arc::new(StubChannel::ok(ChannelKind::AppsScript).recording());
        let reconciler = Reconciler::new(vec![make.clone(), gas.clone()]);

        let result = reconciler.deliver(&reply()).await;
        assert_eq!(gas.calls.load(Ordering::SeqCst), 1);
        let flags = result.channel_flags();
        assert_eq!(flags["make_com"], true);
        assert_eq!(flags["google_apps_script"], true);
    }

    #[tokio::test]
    async fn declined_channel_is_skipped_not_attempted() {
        let brevo = Arc::new(StubChannel::declining(ChannelKind::BrevoDirect));
        let make = Arc::new(StubChannel::ok(ChannelKind::MakeWebhook));
        let reconciler = Reconciler::new(vec![brevo.clone(), make.clone()]);

        let result = reconciler.deliver(&reply()).await;
        assert!(result.delivered());
        assert_eq!(brevo.calls.load(Ordering::SeqCst), 0);
        let brevo_outcome = &result.outcomes()[0];
        assert!(!brevo_outcome.attempted);
        assert!(!brevo_outcome.ok);
    }

    #[tokio::test]
    async fn total_failure_reports_all_channels_false() {
        let reconciler = Reconciler::new(vec![
            Arc::new(StubChannel::failing(ChannelKind::MakeWebhook, upstream_502)),
            Arc::new(StubChannel::failing(ChannelKind::AppsScript, upstream_502)),
        ]);
        let result = reconciler.deliver(&reply()).await;
        assert!(!result.delivered());
        let flags = result.channel_flags();
        assert_eq!(flags["make_com"], false);
        assert_eq!(flags["google_apps_script"], false);
    }

    #[tokio::test]
    async fn upstream_error_detail_carries_status_and_body() {
        let reconciler = Reconciler::new(vec![Arc::new(StubChannel::failing(
            ChannelKind::MakeWebhook,
            upstream_502,
        ))]);
        let result = reconciler.deliver(&reply()).await;
        let outcome = &result.outcomes()[0];
        assert_eq!(outcome.detail["status"], 500);
        assert_eq!(outcome.detail["body"], "scenario error");
    }
}
