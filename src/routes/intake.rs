//! Intake routes for classified messages.
//!
//! These endpoints receive the classifier's verdicts: auto-sent
//! replies to monitor, B2B opportunities, urgent alerts, and the three
//! logging endpoints (manual review, pending queue, spam). B2B and
//! urgent forward to their Make.com scenario best-effort; a webhook
//! failure is logged but never fails the intake.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use tracing::{info, warn};
use uuid::Uuid;

use crate::qualify::{
    EstimatedValue, OpportunitySignals, canned_reply, conversion_probability,
    estimated_monthly_value, priority_score, recommended_actions,
};
use crate::routes::{AppState, missing_fields};
use crate::sinks::MakeWebhook;
use crate::validate::require;

// ── /api/auto-send/log ──────────────────────────────────────────────

/// Record an already-sent automatic reply for the 30-minute
/// correction window. Nothing is sent from here.
pub async fn log_auto_send(Json(body): Json<Value>) -> Response {
    let check = require(&body, &["ai_response", "from_email", "original_message"]);
    if !check.ok() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Données manquantes pour le monitoring auto-send",
                "required": ["ai_response", "from_email", "original_message"],
                "missing": check.missing,
                "note": "La réponse a déjà été envoyée; cette route enregistre pour monitoring/correction",
            })),
        )
            .into_response();
    }

    let monitoring_id = format!("monitor_{}", Uuid::new_v4().simple());
    let correction_deadline = (Utc::now() + Duration::minutes(30)).to_rfc3339();
    let response_length = body["ai_response"].as_str().map(str::len).unwrap_or(0);

    info!(
        monitoring_id = %monitoring_id,
        from = body["from_email"].as_str().unwrap_or_default(),
        confidence = body["confidence"].as_u64().unwrap_or(0),
        "Auto-send logged for monitoring"
    );

    Json(json!({
        "success": true,
        "message": "Données auto-send enregistrées pour monitoring",
        "timestamp": Utc::now().to_rfc3339(),
        "platform": "Hormur",
        "data": {
            "monitoring_id": monitoring_id,
            "message_id": body.get("message_id").cloned()
                .unwrap_or_else(|| json!(format!("auto_{}", Uuid::new_v4().simple()))),
            "original_message_id": body.get("original_message_id").cloned().unwrap_or(Value::Null),
            "from_email": body["from_email"],
            "subject": body.get("subject").cloned().unwrap_or(Value::Null),
            "category": body.get("category").cloned().unwrap_or(Value::Null),
            "priority": body.get("priority").cloned().unwrap_or(Value::Null),
            "sent_by": body.get("signature_type").cloned().unwrap_or(json!("auto")),
            "status": "auto_sent_monitored",
            "sent_via": "brevo_direct",
            "monitoring_active": true,
            "correction_available": true,
            "correction_deadline": correction_deadline,
            "response_length": response_length,
            "confidence": body.get("confidence").cloned().unwrap_or(json!(0)),
        },
        "metrics": {
            "urls_included_count": body.get("urls_included")
                .and_then(Value::as_array)
                .map(Vec::len)
                .unwrap_or(0),
            "monitoring_duration": "30_minutes",
        },
    }))
    .into_response()
}

// ── /api/b2b-opportunity ────────────────────────────────────────────

/// Qualify a B2B opportunity and hand it to the sales pipeline.
pub async fn b2b_opportunity(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let check = require(&body, &["from_email", "subject", "original_message"]);
    if !check.ok() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Données manquantes pour opportunité B2B",
                "required": ["from_email", "subject", "original_message"],
                "missing": check.missing,
            })),
        )
            .into_response();
    }

    let signals = OpportunitySignals::from_body(&body);
    let value = signals.value();
    let opportunity_id = format!("b2b_{}", Uuid::new_v4().simple());
    let follow_up_deadline =
        (Utc::now() + Duration::hours(value.follow_up_hours())).to_rfc3339();

    let forward = json!({
        "opportunity_id": opportunity_id,
        "message_id": body.get("message_id").cloned().unwrap_or(Value::Null),
        "classification": "B2B_OPPORTUNITY",
        "opportunity_type": body.get("opportunity_type").cloned().unwrap_or(json!("abonnement")),
        "category": signals.category.as_deref().unwrap_or("entreprise"),
        "from_email": body["from_email"],
        "subject": body["subject"],
        "original_message": body["original_message"],
        "estimated_value": value.as_str(),
        "business_indicators": signals.business_indicators,
        "response": body
            .get("response")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| canned_reply(signals.category.as_deref()).to_string()),
        "signature_type": body.get("signature_type").cloned().unwrap_or(json!("martin")),
        "sales_priority": if value == EstimatedValue::High { "urgent" } else { "normal" },
        "follow_up_deadline": follow_up_deadline,
        "assigned_to": "martin",
        "status": "identified",
        "platform": "Hormur",
        "created_at": Utc::now().to_rfc3339(),
    });

    let forwarded = forward_best_effort(&state.b2b_sink, &forward, "B2B opportunity").await;

    info!(
        opportunity_id = %opportunity_id,
        estimated_value = value.as_str(),
        forwarded,
        "B2B opportunity identified"
    );

    Json(json!({
        "success": true,
        "message": "Opportunité B2B identifiée et assignée à l'équipe commerciale",
        "timestamp": Utc::now().to_rfc3339(),
        "platform": "Hormur",
        "data": {
            "opportunity_id": opportunity_id,
            "message_id": body.get("message_id").cloned().unwrap_or(Value::Null),
            "opportunity_type": body.get("opportunity_type").cloned().unwrap_or(json!("abonnement")),
            "estimated_value": value.as_str(),
            "status": "identified",
            "sales_priority": if value == EstimatedValue::High { "urgent" } else { "normal" },
            "assigned_to": "martin",
            "follow_up_deadline": follow_up_deadline,
            "meeting_suggested": true,
            "sales_notification": if forwarded { "sent" } else { "pending" },
        },
        "qualification": {
            "estimated_value": value.as_str(),
            "priority_score": priority_score(&signals),
            "recommended_actions": recommended_actions(&signals),
        },
        "metrics": {
            "estimated_monthly_value": estimated_monthly_value(&signals),
            "conversion_probability": conversion_probability(&signals),
        },
    }))
    .into_response()
}

// ── /api/urgent-alert ───────────────────────────────────────────────

/// Register a critical alert and notify the on-call scenario.
pub async fn urgent_alert(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let check = require(&body, &["from_email", "subject", "alert_reason"]);
    if !check.ok() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "Données critiques manquantes pour alerte urgente",
                "required": ["from_email", "subject", "alert_reason"],
                "missing": check.missing,
            })),
        )
            .into_response();
    }

    let alert_id = format!("urgent_{}", Uuid::new_v4().simple());
    let response_deadline = (Utc::now() + Duration::minutes(15)).to_rfc3339();

    let forward = json!({
        "alert_id": alert_id,
        "message_id": body.get("message_id").cloned().unwrap_or(Value::Null),
        "classification": "URGENT_ALERT",
        "alert_type": body.get("category").cloned().unwrap_or(json!("general")),
        "severity": "critical",
        "from_email": body["from_email"],
        "subject": body["subject"],
        "original_message": body.get("original_message").cloned().unwrap_or(Value::Null),
        "alert_reason": body["alert_reason"],
        "escalation_level": "immediate",
        "response_deadline": response_deadline,
        "platform": "Hormur",
        "alert_triggered_at": Utc::now().to_rfc3339(),
    });

    let forwarded = forward_best_effort(&state.urgent_sink, &forward, "urgent alert").await;

    warn!(
        alert_id = %alert_id,
        alert_reason = body["alert_reason"].as_str().unwrap_or_default(),
        forwarded,
        "Urgent alert registered"
    );

    Json(json!({
        "success": true,
        "message": "Alerte urgente enregistrée et équipe notifiée",
        "timestamp": Utc::now().to_rfc3339(),
        "platform": "Hormur",
        "data": {
            "alert_id": alert_id,
            "message_id": body.get("message_id").cloned().unwrap_or(Value::Null),
            "alert_type": body.get("category").cloned().unwrap_or(json!("general")),
            "severity": "critical",
            "status": "active",
            "immediate_action_required": true,
            "response_deadline": response_deadline,
            "team_notified": forwarded,
            "escalation_triggered": true,
        },
    }))
    .into_response()
}

// ── Logging endpoints ───────────────────────────────────────────────

/// Acknowledge a message routed to manual validation.
pub async fn manual_review(Json(body): Json<Value>) -> Response {
    let check = require(&body, &["from_email", "subject"]);
    if !check.ok() {
        return missing_fields(&check, &["from_email", "subject"]);
    }

    info!(
        from = body["from_email"].as_str().unwrap_or_default(),
        escalation_reason = body.get("escalation_reason").and_then(|v| v.as_str()).unwrap_or(""),
        "Message queued for manual review"
    );

    Json(json!({
        "success": true,
        "message": "Message reçu pour validation manuelle",
        "timestamp": Utc::now().to_rfc3339(),
        "data": {
            "message_id": body.get("message_id").cloned().unwrap_or(json!("unknown")),
            "from": body["from_email"],
            "subject": body["subject"],
            "category": body.get("category").cloned().unwrap_or(Value::Null),
            "confidence": body.get("confidence").cloned().unwrap_or(Value::Null),
            "status": "manual-review",
        },
    }))
    .into_response()
}

/// Acknowledge a message waiting for clarification.
pub async fn pending_queue(Json(body): Json<Value>) -> Response {
    let check = require(&body, &["from_email", "subject"]);
    if !check.ok() {
        return missing_fields(&check, &["from_email", "subject"]);
    }

    info!(
        from = body["from_email"].as_str().unwrap_or_default(),
        clarification_needed = body.get("clarification_needed").and_then(|v| v.as_str()).unwrap_or(""),
        "Message queued pending clarification"
    );

    Json(json!({
        "success": true,
        "message": "Message mis en file d'attente",
        "timestamp": Utc::now().to_rfc3339(),
        "data": {
            "message_id": body.get("message_id").cloned().unwrap_or(json!("unknown")),
            "from": body.get("from_email").cloned().unwrap_or(Value::Null),
            "subject": body.get("subject").cloned().unwrap_or(Value::Null),
            "classification": body.get("classification").cloned().unwrap_or(Value::Null),
            "clarification_needed": body.get("clarification_needed").cloned().unwrap_or(Value::Null),
            "priority": body.get("priority").cloned().unwrap_or(json!("normal")),
            "status": "pending",
            "queued_at": Utc::now().to_rfc3339(),
        },
    }))
    .into_response()
}

/// Log a blocked spam message. No reply goes out for these.
pub async fn spam_log(Json(body): Json<Value>) -> Response {
    let check = require(&body, &["from_email", "subject"]);
    if !check.ok() {
        return missing_fields(&check, &["from_email", "subject"]);
    }

    info!(
        from = body["from_email"].as_str().unwrap_or_default(),
        spam_score = body.get("spam_score").and_then(|v| v.as_u64()).unwrap_or(0),
        "Spam blocked"
    );

    Json(json!({
        "success": true,
        "message": "Spam bloqué et loggé",
        "timestamp": Utc::now().to_rfc3339(),
        "data": {
            "message_id": body.get("message_id").cloned().unwrap_or(json!("unknown")),
            "from": body.get("from_email").cloned().unwrap_or(Value::Null),
            "subject": body.get("subject").cloned().unwrap_or(Value::Null),
            "spam_score": body.get("spam_score").cloned().unwrap_or(Value::Null),
            "spam_indicators": body.get("spam_indicators").cloned().unwrap_or(Value::Null),
            "channel": body.get("channel").cloned().unwrap_or(Value::Null),
            "status": "spam",
            "blocked_at": Utc::now().to_rfc3339(),
        },
    }))
    .into_response()
}

/// Forward a payload to an optional webhook. Failures only warn.
async fn forward_best_effort(
    sink: &Option<std::sync::Arc<MakeWebhook>>,
    payload: &Value,
    what: &str,
) -> bool {
    let Some(sink) = sink else {
        return false;
    };
    match sink.post(payload).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = %e, "Failed to forward {what} to Make.com");
            false
        }
    }
}
