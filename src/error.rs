//! Error types for the Hormur router.
//!
//! Configuration never hard-fails (absent endpoints degrade at the
//! point of use), so the only typed failure domain is the outbound
//! sinks.

use std::time::Duration;

/// Errors from an outbound delivery channel.
///
/// A `SinkError` never aborts the overall request on its own — the
/// reconciler records it and moves on to the next channel; routes with
/// standard HTTP semantics translate it to a 502.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Sink {name} is not configured")]
    NotConfigured { name: &'static str },

    #[error("Request to {name} failed: {reason}")]
    Request { name: &'static str, reason: String },

    #[error("{name} returned {status}: {body}")]
    Upstream {
        name: &'static str,
        status: u16,
        body: String,
    },

    #[error("{name} timed out after {timeout:?}")]
    Timeout {
        name: &'static str,
        timeout: Duration,
    },
}

impl SinkError {
    /// Upstream HTTP status, when the sink responded at all.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }
}
