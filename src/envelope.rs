//! The message envelope — the one entity that flows through every handler.
//!
//! Created upstream by the external classifier, mutated by whichever
//! handler is invoked, never deleted here (archival is a status flag).
//! Wire field names match what the dashboard already consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A classified customer message and its response metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEnvelope {
    /// Assigned upstream; required for most operations.
    pub id: String,
    /// Sender address.
    pub from: String,
    pub subject: String,
    pub content: String,
    pub received_at: DateTime<Utc>,
    pub status: Status,
    pub category: Category,
    pub priority: Priority,
    /// Classifier certainty, 0–100.
    pub confidence: u8,
    #[serde(default)]
    pub spam_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    /// One-line classifier verdict shown in the dashboard.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_classification: Option<String>,
    /// Suggested reply text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(default)]
    pub urls: Vec<String>,
    /// Delivery channel correlation id (Brevo).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brevo_contact_id: Option<String>,
    /// Long-lived session id for the direct Brevo channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visitor_id: Option<String>,
    /// Source channel: email, instagram, messenger.
    pub channel: String,
    #[serde(default)]
    pub needs_human_review: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
}

// ── Category ────────────────────────────────────────────────────────

/// Hormur audience category assigned by the classifier.
///
/// Unknown strings normalize to `General` — the classifier vocabulary
/// has drifted over time and the router must not reject on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Artiste,
    Hote,
    Spectateur,
    Partenariat,
    Spam,
    #[serde(other)]
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Artiste => "artiste",
            Self::Hote => "hote",
            Self::Spectateur => "spectateur",
            Self::Partenariat => "partenariat",
            Self::Spam => "spam",
            Self::General => "general",
        }
    }
}

// ── Priority ────────────────────────────────────────────────────────

/// Message priority. Ordering is by urgency: `High > Medium > Low`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Numeric rank for sorting, higher is more urgent.
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

// ── Status ──────────────────────────────────────────────────────────

/// Canonical message lifecycle status.
///
/// The handlers this replaces disagreed on vocabulary (`pending` vs
/// `queued`, `sent` vs `auto-sent` vs `sent_to_brevo`). This is the
/// canonical set; [`Status::from_legacy`] maps every variant seen in
/// the wild onto it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "pending", alias = "queued")]
    Pending,
    #[serde(rename = "auto-sent", alias = "auto_sent")]
    AutoSent,
    #[serde(rename = "manual-review", alias = "pending_manual_review")]
    ManualReview,
    #[serde(rename = "spam", alias = "blocked_as_spam")]
    Spam,
    #[serde(rename = "sent", alias = "sent_to_brevo")]
    Sent,
    #[serde(rename = "archived")]
    Archived,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::AutoSent => "auto-sent",
            Self::ManualReview => "manual-review",
            Self::Spam => "spam",
            Self::Sent => "sent",
            Self::Archived => "archived",
        }
    }

    /// Normalize a legacy status string to the canonical set.
    pub fn from_legacy(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" => Some(Self::Pending),
            "auto-sent" | "auto_sent" | "auto_sent_monitored" => Some(Self::AutoSent),
            "manual-review" | "manual_review" | "pending_manual_review" => {
                Some(Self::ManualReview)
            }
            "spam" | "blocked_as_spam" => Some(Self::Spam),
            "sent" | "sent_to_brevo" => Some(Self::Sent),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}
